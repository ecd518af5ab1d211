use crate::ast::{FieldEntry, PathSegment};
use crate::error::CodecError;
use crate::parser::is_plain_key;
use crate::tree::FormValue;

/// Decode a value tree into flat `(name, value)` assignments, depth first.
///
/// Object properties render as `parent.key`, array elements as
/// `parent[index]`; every scalar leaf yields one entry. Empty containers
/// yield nothing. The root must be an object (`Null` flattens to nothing).
pub fn flatten(tree: &FormValue) -> Result<Vec<FieldEntry>, CodecError> {
    let mut entries = Vec::new();
    match tree {
        FormValue::Null => {}
        FormValue::Object(_) => {
            let mut path = Vec::new();
            walk(tree, &mut path, &mut entries)?;
        }
        other => {
            return Err(CodecError::RootNotObject {
                found: other.kind_name(),
            })
        }
    }
    Ok(entries)
}

fn walk(
    node: &FormValue,
    path: &mut Vec<PathSegment>,
    entries: &mut Vec<FieldEntry>,
) -> Result<(), CodecError> {
    match node {
        FormValue::Object(map) => {
            for (key, child) in map {
                if !is_plain_key(key) {
                    return Err(CodecError::UnrenderableKey { key: key.clone() });
                }
                path.push(PathSegment::Key(key.clone()));
                walk(child, path, entries)?;
                path.pop();
            }
        }
        FormValue::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                path.push(PathSegment::Index(i));
                walk(child, path, entries)?;
                path.pop();
            }
        }
        scalar => entries.push(FieldEntry {
            name: render_path(path),
            value: scalar.clone(),
        }),
    }
    Ok(())
}

/// Render path segments back into a field name; the exact inverse of
/// [`crate::parser::parse_path`].
pub fn render_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathSegment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
            PathSegment::Append => out.push_str("[]"),
        }
    }
    out
}
