use std::collections::BTreeMap;

/// Encoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `application/x-www-form-urlencoded` query string.
    Form(String),
    /// JSON text of the value tree.
    Json(String),
}

impl Payload {
    pub fn as_str(&self) -> &str {
        match self {
            Payload::Form(body) | Payload::Json(body) => body,
        }
    }
}

/// Everything the transport needs to send one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitRequest {
    pub url: String,
    pub method: String,
    pub data_type: String,
    pub content_type: String,
    pub payload: Payload,
}

/// Sends submissions. The result is delivered later through
/// [`crate::form::Form::complete`].
pub trait Transport {
    fn send(&mut self, request: &SubmitRequest);
}

/// A transport that only records what it was asked to send.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    pub sent: Vec<SubmitRequest>,
}

impl Transport for RecordingTransport {
    fn send(&mut self, request: &SubmitRequest) {
        self.sent.push(request.clone());
    }
}

/// A failed submission as reported by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitFailure {
    pub status: u16,
    /// Raw response body, if any.
    pub body: Option<String>,
}

impl SubmitFailure {
    pub fn new(status: u16, body: Option<&str>) -> Self {
        SubmitFailure {
            status,
            body: body.map(str::to_string),
        }
    }

    /// The body read as a field-name → message map, when it is a JSON object
    /// whose values are all strings.
    pub fn field_errors(&self) -> Option<BTreeMap<String, String>> {
        let body = self.body.as_deref()?;
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        let object = value.as_object()?;
        object
            .iter()
            .map(|(name, message)| Some((name.clone(), message.as_str()?.to_string())))
            .collect()
    }
}

/// How a submission ended; delivered exactly once per request.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Success(serde_json::Value),
    Failure(SubmitFailure),
}
