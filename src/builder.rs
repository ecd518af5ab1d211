use crate::ast::{FieldEntry, PathSegment};
use crate::error::CodecError;
use crate::flatten::render_path;
use crate::parser::parse_path;
use crate::tree::FormValue;

/// Most `Null` placeholders a single `[n]` may add past the end of an array.
pub const MAX_INDEX_GAP: usize = 1024;

/// Encode flat field entries into one nested value tree.
///
/// Entries are applied in order: `[]` pushes a new array slot, `[n]` grows
/// the array with `Null` placeholders up to `n` (at most [`MAX_INDEX_GAP`]
/// past the current end), and a repeated path without
/// `[]` is overwritten (last write wins). With no entries the result is an
/// empty object.
pub fn build(entries: &[FieldEntry]) -> Result<FormValue, CodecError> {
    let mut root = FormValue::object();
    for entry in entries {
        insert(&mut root, entry)?;
    }
    Ok(root)
}

/// Apply a single entry to an existing tree.
pub fn insert(root: &mut FormValue, entry: &FieldEntry) -> Result<(), CodecError> {
    let path = parse_path(&entry.name)?;
    log::trace!("insert {} ({} segments)", entry.name, path.len());

    let mut current = root;
    for depth in 0..path.len() {
        current = child_slot(current, &path, depth, &entry.name)?;
    }

    if !current.is_scalar() {
        return Err(CodecError::NodeKindConflict {
            name: entry.name.clone(),
            at: entry.name.clone(),
            expected: "a scalar",
            found: current.kind_name(),
        });
    }
    *current = entry.value.clone();
    Ok(())
}

/// Descend from `node` through `path[depth]`, shaping `node` into an object
/// or array on first touch.
fn child_slot<'a>(
    node: &'a mut FormValue,
    path: &[PathSegment],
    depth: usize,
    name: &str,
) -> Result<&'a mut FormValue, CodecError> {
    let segment = &path[depth];

    if matches!(node, FormValue::Null) {
        *node = if segment.is_array_access() {
            FormValue::Array(Vec::new())
        } else {
            FormValue::object()
        };
    }

    match (node, segment) {
        (FormValue::Object(map), PathSegment::Key(key)) => Ok(map.entry(key.clone()).or_default()),
        (FormValue::Array(items), PathSegment::Index(index)) => {
            let (index, len) = (*index, items.len());
            if len <= index {
                let too_large = || CodecError::IndexTooLarge {
                    name: name.to_string(),
                    index,
                    len,
                };
                if index - len > MAX_INDEX_GAP {
                    return Err(too_large());
                }
                let new_len = index.checked_add(1).ok_or_else(too_large)?;
                items.resize(new_len, FormValue::Null);
            }
            Ok(&mut items[index])
        }
        (FormValue::Array(items), PathSegment::Append) => {
            let index = items.len();
            items.push(FormValue::Null);
            Ok(&mut items[index])
        }
        (other, segment) => Err(CodecError::NodeKindConflict {
            name: name.to_string(),
            at: render_parent(path, depth),
            expected: if segment.is_array_access() {
                "an array"
            } else {
                "an object"
            },
            found: other.kind_name(),
        }),
    }
}

fn render_parent(path: &[PathSegment], depth: usize) -> String {
    if depth == 0 {
        "<root>".to_string()
    } else {
        render_path(&path[..depth])
    }
}
