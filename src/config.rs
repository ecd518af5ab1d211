use crate::transport::SubmitFailure;
use crate::tree::FormValue;
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::OnceLock;

pub const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

// ── Settings ────────────────────────────────────────────────────────

/// Plain-data options of a form, loadable from JSON (camelCase keys).
/// Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Never let the submit event through, even when the form is valid.
    pub disable_submit: bool,
    /// Expected response type, forwarded to the transport.
    pub data_type: String,
    /// Request content type; a JSON content type sends the value tree as JSON.
    pub content_type: String,
    /// Submit through the transport instead of the native submission.
    pub ajax_submit: bool,
    pub clear_on_success: bool,
    pub show_errors: bool,
    /// Base CSS class for error state (`error`, `error-required`, ...).
    pub error_class: String,
    pub messages: Messages,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            disable_submit: false,
            data_type: "json".to_string(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            ajax_submit: true,
            clear_on_success: false,
            show_errors: true,
            error_class: "error".to_string(),
            messages: Messages::default(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON object.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn sends_json(&self) -> bool {
        self.content_type.contains("json")
    }
}

// ── Messages ────────────────────────────────────────────────────────

/// Message templates keyed by rule name, with `{{placeholder}}` substitution.
///
/// Deserializing merges the given templates over the defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Messages(BTreeMap<String, String>);

impl Default for Messages {
    fn default() -> Self {
        let defaults = [
            ("required", "Please fill out this field"),
            ("pattern", "Please match the requested format"),
            ("email", "Please enter an email address"),
            ("date", "Please enter a date"),
            ("time", "Please enter a time"),
            ("emailMultiple", "Multiple email address is not allowed"),
            ("url", "Please enter an URL"),
            ("number", "Please enter a number"),
            ("minlength", "Text must be at least {{count}} characters"),
            ("maxlength", "Text must be at most {{count}} characters"),
            ("min", "Value must be greater than or equal to {{min}}"),
            ("max", "Value must be less than or equal to {{max}}"),
            ("sameAs", "Value must match {{item}}"),
        ];
        Messages(
            defaults
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for Messages {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let overrides = BTreeMap::<String, String>::deserialize(deserializer)?;
        let mut messages = Messages::default();
        messages.0.extend(overrides);
        Ok(messages)
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid regex"))
}

impl Messages {
    /// The raw template for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.0.insert(key.into(), template.into());
    }

    /// Render the template for `key`, substituting `{{name}}` from `params`.
    /// Unknown placeholders are kept verbatim; an unknown key renders as itself.
    pub fn render(&self, key: &str, params: &[(&str, String)]) -> String {
        let template = match self.get(key) {
            Some(t) => t,
            None => return key.to_string(),
        };
        placeholder_regex()
            .replace_all(template, |caps: &Captures| {
                params
                    .iter()
                    .find(|(name, _)| *name == &caps[1])
                    .map(|(_, value)| value.clone())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

// ── Options ─────────────────────────────────────────────────────────

/// Per-field custom check: receives the field value, returns an error message
/// or `None` when the value is acceptable.
pub type FieldValidator = Box<dyn Fn(&str) -> Option<String>>;

/// Everything a form is attached with: settings plus behavioral hooks.
pub struct Options {
    pub settings: Settings,
    /// Form-level predicate over the serialized tree, run by `validate`.
    pub is_valid: Box<dyn Fn(&FormValue) -> bool>,
    /// Custom checks keyed by canonical field id.
    pub validations: HashMap<String, FieldValidator>,
    pub on_submit_success: Box<dyn FnMut(&serde_json::Value)>,
    pub on_submit_error: Box<dyn FnMut(&SubmitFailure)>,
    pub on_submit_complete: Box<dyn FnMut()>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            settings: Settings::default(),
            is_valid: Box::new(|_| true),
            validations: HashMap::new(),
            on_submit_success: Box::new(|_| {}),
            on_submit_error: Box::new(|_| {}),
            on_submit_complete: Box::new(|| {}),
        }
    }
}

impl Options {
    pub fn with_settings(settings: Settings) -> Self {
        Options {
            settings,
            ..Options::default()
        }
    }

    /// Register a custom check for the field with canonical id `id`.
    pub fn validation(
        mut self,
        id: impl Into<String>,
        check: impl Fn(&str) -> Option<String> + 'static,
    ) -> Self {
        self.validations.insert(id.into(), Box::new(check));
        self
    }

    pub fn is_valid(mut self, predicate: impl Fn(&FormValue) -> bool + 'static) -> Self {
        self.is_valid = Box::new(predicate);
        self
    }

    pub fn on_submit_success(mut self, hook: impl FnMut(&serde_json::Value) + 'static) -> Self {
        self.on_submit_success = Box::new(hook);
        self
    }

    pub fn on_submit_error(mut self, hook: impl FnMut(&SubmitFailure) + 'static) -> Self {
        self.on_submit_error = Box::new(hook);
        self
    }

    pub fn on_submit_complete(mut self, hook: impl FnMut() + 'static) -> Self {
        self.on_submit_complete = Box::new(hook);
        self
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.validations.keys().collect();
        ids.sort();
        f.debug_struct("Options")
            .field("settings", &self.settings)
            .field("validations", &ids)
            .finish_non_exhaustive()
    }
}
