use crate::ast::FieldEntry;
use crate::validate::{Constraints, FieldError, FieldKind};
use crate::tree::FormValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Fields ──────────────────────────────────────────────────────────

/// One form control as seen by the engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Field {
    pub name: Option<String>,
    pub kind: FieldKind,
    /// Current value; for checkboxes and radios, the `value` attribute.
    pub value: String,
    /// Checked state of checkboxes and radios.
    pub checked: bool,
    pub id: Option<String>,
    pub title: Option<String>,
    pub disabled: bool,
    pub constraints: Constraints,
}

impl Field {
    pub fn new(kind: FieldKind, name: &str) -> Self {
        Field {
            name: Some(name.to_string()),
            kind,
            ..Field::default()
        }
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Human-facing name: title, then name, then id.
    pub fn label(&self) -> String {
        self.title
            .as_ref()
            .or(self.name.as_ref())
            .or(self.id.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    /// The entry this control contributes to serialization, if any.
    ///
    /// Disabled, unnamed and button-like controls contribute nothing. A
    /// checkbox without a value attribute contributes its checked state; one
    /// with a value contributes that value only while checked. Radios
    /// contribute only when checked.
    pub fn entry(&self) -> Option<FieldEntry> {
        let name = self.name.as_deref().filter(|n| !n.is_empty())?;
        if self.disabled || self.kind.is_button_like() {
            return None;
        }
        let value = match self.kind {
            FieldKind::Checkbox if self.value.is_empty() => FormValue::Bool(self.checked),
            FieldKind::Checkbox | FieldKind::Radio if !self.checked => return None,
            _ => FormValue::String(self.value.clone()),
        };
        Some(FieldEntry::new(name, value))
    }

    /// Assign a decoded value following the control's kind.
    ///
    /// Checkboxes take a presence flag (or match their value when they have
    /// one), radios are checked when their value matches, other controls take
    /// the literal text. Returns `false` when the value does not fit the control.
    pub fn assign(&mut self, value: &FormValue) -> bool {
        match self.kind {
            FieldKind::Checkbox => {
                self.checked = match value {
                    FormValue::String(s) if !self.value.is_empty() => *s == self.value,
                    other => other.is_truthy(),
                };
                true
            }
            FieldKind::Radio => {
                self.checked = value.to_field_text().is_some_and(|text| text == self.value);
                true
            }
            kind if kind.is_button_like() => false,
            _ => match value.to_field_text() {
                Some(text) => {
                    self.value = text;
                    true
                }
                None => false,
            },
        }
    }

    /// Reset to the empty state.
    pub fn reset(&mut self) {
        match self.kind {
            FieldKind::Checkbox | FieldKind::Radio => self.checked = false,
            kind if kind.is_button_like() => {}
            _ => self.value.clear(),
        }
    }
}

// ── Surface trait ───────────────────────────────────────────────────

/// The form a [`crate::form::Form`] is attached to.
///
/// Implementors expose their controls in document order; enumeration,
/// population and clearing are provided on top of that. Presentation hooks
/// default to no-ops.
pub trait FormSurface {
    fn fields(&self) -> &[Field];
    fn fields_mut(&mut self) -> &mut [Field];

    /// Submission URL.
    fn action(&self) -> &str;
    /// Submission method (`GET`, `POST`, ...).
    fn method(&self) -> &str;

    /// Field entries in document order.
    fn enumerate(&self) -> Vec<FieldEntry> {
        self.fields().iter().filter_map(Field::entry).collect()
    }

    /// Assign `value` to every control named `name`. Returns whether any
    /// control accepted it.
    fn apply(&mut self, name: &str, value: &FormValue) -> bool {
        let mut applied = false;
        for field in self.fields_mut() {
            if field.name.as_deref() == Some(name) {
                applied |= field.assign(value);
            }
        }
        applied
    }

    fn clear(&mut self) {
        for field in self.fields_mut() {
            field.reset();
        }
    }

    /// Show (`Some`) or hide (`None`) the error attached to a control.
    fn show_error(&mut self, _index: usize, _error: Option<&FieldError>) {}

    fn focus(&mut self, _index: usize) {}
}

/// In-memory form used by the CLI and tests. Records what the presentation
/// hooks were asked to display.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySurface {
    pub action: String,
    pub method: String,
    pub fields: Vec<Field>,
    #[serde(skip)]
    pub shown_errors: BTreeMap<usize, FieldError>,
    #[serde(skip)]
    pub focused: Option<usize>,
}

impl MemorySurface {
    pub fn new(action: &str, method: &str) -> Self {
        MemorySurface {
            action: action.to_string(),
            method: method.to_string(),
            ..MemorySurface::default()
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Index of the first control named `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.as_deref() == Some(name))
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.index_of(name).map(|i| &self.fields[i])
    }
}

impl FormSurface for MemorySurface {
    fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut [Field] {
        &mut self.fields
    }

    fn action(&self) -> &str {
        &self.action
    }

    fn method(&self) -> &str {
        if self.method.is_empty() {
            "GET"
        } else {
            &self.method
        }
    }

    fn show_error(&mut self, index: usize, error: Option<&FieldError>) {
        match error {
            Some(err) => {
                self.shown_errors.insert(index, err.clone());
            }
            None => {
                self.shown_errors.remove(&index);
            }
        }
    }

    fn focus(&mut self, index: usize) {
        self.focused = Some(index);
    }
}
