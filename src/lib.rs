pub mod ast;
pub mod builder;
pub mod config;
pub mod error;
pub mod flatten;
pub mod form;
pub mod json;
pub mod parser;
pub mod query;
pub mod surface;
pub mod transport;
pub mod tree;
pub mod validate;

pub use ast::{FieldEntry, PathSegment};
pub use config::{Messages, Options, Settings};
pub use error::CodecError;
pub use form::{Form, FormEvent, SubmitAction, CUSTOM_ERROR_ID, SERIALIZE_ERROR_ID};
pub use surface::{Field, FormSurface, MemorySurface};
pub use transport::{
    Payload, RecordingTransport, SubmitFailure, SubmitOutcome, SubmitRequest, Transport,
};
pub use tree::FormValue;
pub use validate::{canonical_id, Constraints, FieldError, FieldKind, Rule};

// ── Core API ───────────────────────────────────────────────────────

/// Encode flat `(name, value)` entries into a nested value tree.
pub fn encode(entries: &[FieldEntry]) -> Result<FormValue, CodecError> {
    builder::build(entries)
}

/// Decode a nested value tree into flat `(name, value)` entries.
pub fn decode(tree: &FormValue) -> Result<Vec<FieldEntry>, CodecError> {
    flatten::flatten(tree)
}

/// Encode a urlencoded query string straight into a value tree.
pub fn encode_query(input: &str) -> Result<FormValue, CodecError> {
    encode(&query::parse_query_string(input)?)
}

/// Decode a value tree into a urlencoded query string.
pub fn decode_query(tree: &FormValue) -> Result<String, CodecError> {
    Ok(query::to_query_string(&decode(tree)?))
}
