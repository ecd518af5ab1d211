use crate::config::{FieldValidator, Messages};
use crate::surface::Field;
use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::OnceLock;

// ── Field kinds ─────────────────────────────────────────────────────

/// The kind of a form control, as given by its tag and `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Search,
    Tel,
    Hidden,
    Password,
    Email,
    Url,
    Number,
    Date,
    Month,
    Time,
    Checkbox,
    Radio,
    Select,
    Textarea,
    Button,
    Submit,
    Reset,
    Image,
}

impl FieldKind {
    /// Map an `<input type="...">` value to a kind. Unknown types are text.
    pub fn from_type(type_attr: &str) -> Self {
        match type_attr.trim().to_ascii_lowercase().as_str() {
            "search" => FieldKind::Search,
            "tel" => FieldKind::Tel,
            "hidden" => FieldKind::Hidden,
            "password" => FieldKind::Password,
            "email" => FieldKind::Email,
            "url" => FieldKind::Url,
            "number" => FieldKind::Number,
            "date" => FieldKind::Date,
            "month" => FieldKind::Month,
            "time" => FieldKind::Time,
            "checkbox" => FieldKind::Checkbox,
            "radio" => FieldKind::Radio,
            "select" => FieldKind::Select,
            "textarea" => FieldKind::Textarea,
            "button" => FieldKind::Button,
            "submit" => FieldKind::Submit,
            "reset" => FieldKind::Reset,
            "image" => FieldKind::Image,
            _ => FieldKind::Text,
        }
    }

    /// Buttons carry no value and are never checked.
    pub fn is_button_like(self) -> bool {
        matches!(
            self,
            FieldKind::Button | FieldKind::Submit | FieldKind::Reset | FieldKind::Image
        )
    }

    /// Rules that apply to this kind, in evaluation order. The custom
    /// callback always runs after these.
    pub fn rules(self) -> &'static [Rule] {
        use Rule::*;
        match self {
            FieldKind::Text | FieldKind::Search | FieldKind::Tel | FieldKind::Password => {
                &[Required, Pattern, MinLength, MaxLength, SameAs]
            }
            FieldKind::Textarea => &[Required, MinLength, MaxLength],
            FieldKind::Email => &[
                Required,
                EmailMultiple,
                Email,
                Pattern,
                MinLength,
                MaxLength,
                SameAs,
            ],
            FieldKind::Url => &[Required, Url, Pattern, MinLength, MaxLength, SameAs],
            FieldKind::Number => &[Required, Number, Min, Max],
            FieldKind::Date | FieldKind::Month => &[Required, DatePattern, DateInvalid, Min, Max],
            FieldKind::Time => &[Required, TimePattern, TimeInvalid, Min, Max],
            FieldKind::Checkbox | FieldKind::Radio | FieldKind::Select => &[Required],
            FieldKind::Hidden
            | FieldKind::Button
            | FieldKind::Submit
            | FieldKind::Reset
            | FieldKind::Image => &[],
        }
    }
}

/// Declared constraints of a control (HTML attributes and `data-*` options).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Constraints {
    pub required: bool,
    pub pattern: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min: Option<String>,
    pub max: Option<String>,
    /// Another field (by id, `#` optional, or by name) this one must equal.
    pub same_as: Option<String>,
    /// Email fields: accept a comma-separated list.
    pub multiple: bool,
}

// ── Rules and errors ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Required,
    Pattern,
    EmailMultiple,
    Email,
    Url,
    Number,
    DatePattern,
    DateInvalid,
    TimePattern,
    TimeInvalid,
    MinLength,
    MaxLength,
    Min,
    Max,
    SameAs,
    Custom,
    /// Reported by the server after a submission.
    Server,
}

impl Rule {
    /// Message key, also the `key` of a reported error.
    pub fn key(self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Pattern => "pattern",
            Rule::EmailMultiple => "emailMultiple",
            Rule::Email => "email",
            Rule::Url => "url",
            Rule::Number => "number",
            Rule::DatePattern | Rule::DateInvalid => "date",
            Rule::TimePattern | Rule::TimeInvalid => "time",
            Rule::MinLength => "minlength",
            Rule::MaxLength => "maxlength",
            Rule::Min => "min",
            Rule::Max => "max",
            Rule::SameAs => "sameAs",
            Rule::Custom => "custom",
            Rule::Server => "server",
        }
    }

    /// Suffix of the per-rule CSS class (`error-<suffix>`).
    pub fn class_suffix(self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Pattern => "pattern",
            Rule::EmailMultiple => "email-multiple",
            Rule::Email => "email",
            Rule::Url => "url",
            Rule::Number => "number",
            Rule::DatePattern => "date-pattern",
            Rule::DateInvalid => "date-invalid",
            Rule::TimePattern => "time-pattern",
            Rule::TimeInvalid => "time-invalid",
            Rule::MinLength => "min-length",
            Rule::MaxLength => "max-length",
            Rule::Min => "min",
            Rule::Max => "max",
            Rule::SameAs => "same-as",
            Rule::Custom => "custom",
            Rule::Server => "server",
        }
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

/// A failed check: the rule that failed and the rendered message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    #[serde(rename = "key")]
    pub rule: Rule,
    pub label: String,
}

impl FieldError {
    pub fn new(rule: Rule, label: impl Into<String>) -> Self {
        FieldError {
            rule,
            label: label.into(),
        }
    }

    pub fn key(&self) -> &'static str {
        self.rule.key()
    }

    /// `error-required`, `error-min-length`, ... for the given base class.
    pub fn class_name(&self, error_class: &str) -> String {
        format!("{}-{}", error_class, self.rule.class_suffix())
    }
}

// ── Canonical ids ───────────────────────────────────────────────────

/// Camel-case a field name into the id used for the error cache:
/// `input-text` → `inputText`, `foo.bar[0].name` → `fooBar0Name`.
///
/// Underscores and whitespace are word breaks too, so `user_id` and
/// `user id` both give `userId`.
pub fn canonical_id(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if matches!(ch, '-' | '_' | '.' | '[' | ']') || ch.is_whitespace() {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

// ── Checking ────────────────────────────────────────────────────────

/// What a rule sees of the field under check.
struct Subject<'a> {
    field: &'a Field,
    /// Effective value: the checked radio of the group, a checked checkbox's value, ...
    value: String,
    /// Whether `required` is satisfied.
    present: bool,
    fields: &'a [Field],
    messages: &'a Messages,
}

/// Check the field at `index` against its kind's rules, then the custom
/// callback. Evaluation stops at the first failure, so the result holds at
/// most one error.
pub fn check_field(
    fields: &[Field],
    index: usize,
    messages: &Messages,
    custom: Option<&FieldValidator>,
) -> Vec<FieldError> {
    let field = match fields.get(index) {
        Some(f) => f,
        None => return Vec::new(),
    };
    let value = effective_value(fields, field);
    let present = match field.kind {
        FieldKind::Checkbox => field.checked,
        FieldKind::Radio => radio_group(fields, field).any(|f| f.checked),
        _ => !value.is_empty(),
    };
    let subject = Subject {
        field,
        value,
        present,
        fields,
        messages,
    };

    for rule in field.kind.rules() {
        if let Some(err) = evaluate(*rule, &subject) {
            return vec![err];
        }
    }

    if let Some(check) = custom {
        if let Some(message) = check(subject.value.as_str()) {
            if !message.is_empty() {
                return vec![FieldError::new(Rule::Custom, message)];
            }
        }
    }

    Vec::new()
}

/// The value a field contributes to its checks.
pub fn effective_value(fields: &[Field], field: &Field) -> String {
    match field.kind {
        FieldKind::Radio => radio_group(fields, field)
            .find(|f| f.checked)
            .map(|f| f.value.clone())
            .unwrap_or_default(),
        FieldKind::Checkbox if field.checked => {
            if field.value.is_empty() {
                "on".to_string()
            } else {
                field.value.clone()
            }
        }
        FieldKind::Checkbox => String::new(),
        _ => field.value.clone(),
    }
}

/// Radios sharing `field`'s name (just `field` itself when it has none).
fn radio_group<'a>(fields: &'a [Field], field: &'a Field) -> impl Iterator<Item = &'a Field> + 'a {
    fields.iter().filter(move |f| {
        f.kind == FieldKind::Radio
            && match (&f.name, &field.name) {
                (Some(a), Some(b)) => a == b,
                _ => std::ptr::eq(*f, field),
            }
    })
}

fn evaluate(rule: Rule, s: &Subject) -> Option<FieldError> {
    let c = &s.field.constraints;

    if rule == Rule::Required {
        return if c.required && !s.present {
            failure(rule, s.messages, &[])
        } else {
            None
        };
    }
    // Every other rule only judges a value that is there
    if s.value.is_empty() {
        return None;
    }
    let value = s.value.as_str();

    match rule {
        Rule::Pattern => {
            let pattern = c.pattern.as_deref()?;
            match Regex::new(&format!("^(?:{})$", pattern)) {
                Ok(re) if !re.is_match(value) => failure(rule, s.messages, &[]),
                Ok(_) => None,
                Err(e) => {
                    log::warn!("Ignoring invalid pattern \"{}\": {}", pattern, e);
                    None
                }
            }
        }
        Rule::EmailMultiple => {
            if !c.multiple && value.contains(',') {
                failure(rule, s.messages, &[])
            } else {
                None
            }
        }
        Rule::Email => {
            let all_valid = if c.multiple {
                value.split(',').all(|part| email_regex().is_match(part.trim()))
            } else {
                email_regex().is_match(value)
            };
            if all_valid {
                None
            } else {
                failure(rule, s.messages, &[])
            }
        }
        Rule::Url => {
            if url_regex().is_match(value) {
                None
            } else {
                failure(rule, s.messages, &[])
            }
        }
        Rule::Number => match value.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => None,
            _ => failure(rule, s.messages, &[]),
        },
        Rule::DatePattern => {
            let re = if s.field.kind == FieldKind::Month {
                month_shape_regex()
            } else {
                date_shape_regex()
            };
            if re.is_match(value) {
                None
            } else {
                failure(rule, s.messages, &[])
            }
        }
        Rule::DateInvalid => match parse_ordinal(s.field.kind, value) {
            Some(_) => None,
            None => failure(rule, s.messages, &[]),
        },
        Rule::TimePattern => {
            if time_shape_regex().is_match(value) {
                None
            } else {
                failure(rule, s.messages, &[])
            }
        }
        Rule::TimeInvalid => match parse_time(value) {
            Some(_) => None,
            None => failure(rule, s.messages, &[]),
        },
        Rule::MinLength => {
            let min = c.min_length?;
            if value.chars().count() < min {
                failure(rule, s.messages, &[("count", min.to_string())])
            } else {
                None
            }
        }
        Rule::MaxLength => {
            let max = c.max_length?;
            if value.chars().count() > max {
                failure(rule, s.messages, &[("count", max.to_string())])
            } else {
                None
            }
        }
        Rule::Min => {
            let (limit, label) = bound(s.field.kind, c.min.as_deref()?)?;
            let actual = parse_ordinal(s.field.kind, value)?;
            if actual < limit {
                failure(rule, s.messages, &[("min", label)])
            } else {
                None
            }
        }
        Rule::Max => {
            let (limit, label) = bound(s.field.kind, c.max.as_deref()?)?;
            let actual = parse_ordinal(s.field.kind, value)?;
            if actual > limit {
                failure(rule, s.messages, &[("max", label)])
            } else {
                None
            }
        }
        Rule::SameAs => {
            let target = c.same_as.as_deref()?;
            let other = match find_field(s.fields, target) {
                Some(f) => f,
                None => {
                    log::warn!("sameAs target \"{}\" not found", target);
                    return None;
                }
            };
            if other.value == value {
                None
            } else {
                failure(rule, s.messages, &[("item", other.label())])
            }
        }
        Rule::Required | Rule::Custom | Rule::Server => None,
    }
}

fn failure(rule: Rule, messages: &Messages, params: &[(&str, String)]) -> Option<FieldError> {
    Some(FieldError::new(rule, messages.render(rule.key(), params)))
}

/// Look a field up by id (`#id` or `id`), falling back to its name.
fn find_field<'a>(fields: &'a [Field], target: &str) -> Option<&'a Field> {
    let id = target.strip_prefix('#').unwrap_or(target);
    fields
        .iter()
        .find(|f| f.id.as_deref() == Some(id))
        .or_else(|| fields.iter().find(|f| f.name.as_deref() == Some(target)))
}

// ── Value shapes ────────────────────────────────────────────────────

/// A comparable reading of a number, date, month or time value.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
enum Ordinal {
    Number(f64),
    Date(NaiveDate),
    Time(NaiveTime),
}

fn parse_ordinal(kind: FieldKind, value: &str) -> Option<Ordinal> {
    match kind {
        FieldKind::Number => value.trim().parse::<f64>().ok().map(Ordinal::Number),
        FieldKind::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .map(Ordinal::Date),
        FieldKind::Month => NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d")
            .ok()
            .map(Ordinal::Date),
        FieldKind::Time => parse_time(value).map(Ordinal::Time),
        _ => None,
    }
}

/// Parse a min/max bound and the label it is reported with. Month bounds
/// are reported as the first day of the month.
fn bound(kind: FieldKind, raw: &str) -> Option<(Ordinal, String)> {
    let parsed = match parse_ordinal(kind, raw) {
        Some(p) => p,
        None => {
            log::warn!("Ignoring unparsable bound \"{}\" on a {:?} field", raw, kind);
            return None;
        }
    };
    let label = match parsed {
        Ordinal::Date(d) if kind == FieldKind::Month => d.format("%Y-%m-%d").to_string(),
        _ => raw.to_string(),
    };
    Some((parsed, label))
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid regex"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(
        &RE,
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"^[a-zA-Z][a-zA-Z0-9+.\-]*://[^\s/?#]+\S*$")
}

fn date_shape_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"^\d{4}-\d{2}-\d{2}$")
}

fn month_shape_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"^\d{4}-\d{2}$")
}

fn time_shape_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"^\d{2}:\d{2}(:\d{2}(\.\d{1,3})?)?$")
}
