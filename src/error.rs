/// An error raised by the path codec.
///
/// Each variant carries a stable machine-readable code (see [`CodecError::code`])
/// alongside its human-readable message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// A field name that does not follow the `key(.key|[n]|[])*` grammar.
    #[error("Invalid field name \"{name}\" at offset {offset}: {message}")]
    InvalidPath {
        name: String,
        message: String,
        /// 0-based byte offset of the offending character in `name`
        offset: usize,
    },

    /// A tree node addressed both as an object and as an array, or a scalar
    /// used where a container is needed (and vice versa).
    #[error("Field \"{name}\": \"{at}\" is {found} but is used as {expected}")]
    NodeKindConflict {
        name: String,
        /// Rendered path of the conflicting node
        at: String,
        expected: &'static str,
        found: &'static str,
    },

    /// An object key that cannot be written back as a field name.
    #[error("Key \"{key}\" cannot be rendered as a field name")]
    UnrenderableKey { key: String },

    /// An array index that would grow its array past the allowed gap.
    #[error("Field \"{name}\": index {index} is too far past the end of an array of length {len}")]
    IndexTooLarge {
        name: String,
        index: usize,
        len: usize,
    },

    #[error("Value tree root must be an object, found {found}")]
    RootNotObject { found: &'static str },

    #[error("Invalid query string: {0}")]
    InvalidQuery(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
}

impl CodecError {
    pub fn invalid_path(name: &str, message: impl Into<String>, offset: usize) -> Self {
        CodecError::InvalidPath {
            name: name.to_string(),
            message: message.into(),
            offset,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            CodecError::InvalidPath { .. } => "invalid-path",
            CodecError::NodeKindConflict { .. } => "node-kind-conflict",
            CodecError::UnrenderableKey { .. } => "unrenderable-key",
            CodecError::IndexTooLarge { .. } => "index-too-large",
            CodecError::RootNotObject { .. } => "root-not-object",
            CodecError::InvalidQuery(_) => "invalid-query",
            CodecError::InvalidJson(_) => "invalid-json",
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::InvalidJson(err.to_string())
    }
}
