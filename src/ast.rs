//! Intermediate representation shared by the parser, the builder and the flattener.

use crate::tree::FormValue;

/// One step of a parsed field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// `name` or `.name`: object property access.
    Key(String),
    /// `[n]`: array element access.
    Index(usize),
    /// `[]`: push a new array slot.
    Append,
}

impl PathSegment {
    /// Whether this segment addresses an array node.
    pub fn is_array_access(&self) -> bool {
        matches!(self, PathSegment::Index(_) | PathSegment::Append)
    }
}

/// A `(name, value)` pair extracted from one form control, or produced by
/// flattening a value tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry {
    pub name: String,
    pub value: FormValue,
}

impl FieldEntry {
    pub fn new(name: impl Into<String>, value: impl Into<FormValue>) -> Self {
        FieldEntry {
            name: name.into(),
            value: value.into(),
        }
    }
}
