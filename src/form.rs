use crate::builder::build;
use crate::config::Options;
use crate::error::CodecError;
use crate::flatten::flatten;
use crate::query::to_query_string;
use crate::surface::FormSurface;
use crate::transport::{Payload, SubmitOutcome, SubmitRequest, Transport};
use crate::tree::FormValue;
use crate::validate::{canonical_id, check_field, FieldError, FieldKind, Rule};
use std::collections::{BTreeMap, BTreeSet};

/// Error-cache id recorded when the form-level `is_valid` predicate fails.
pub const CUSTOM_ERROR_ID: &str = "$$custom";

/// Error-cache id recorded when `validate` cannot serialize the form (for
/// instance two fields give one name conflicting shapes). `is_valid` is not
/// run in that case.
pub const SERIALIZE_ERROR_ID: &str = "$$serialize";

/// A user interaction routed to the form. Field events carry the index of
/// the target control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEvent {
    /// A key was released inside a control.
    Input(usize),
    Change(usize),
    FocusOut(usize),
    Submit,
}

/// What should happen to a submit event once the form has handled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitAction {
    /// Stop the submission (invalid form, or submission disabled).
    Prevented,
    /// Let the native submission go ahead.
    Native,
    /// The form was handed to the transport; stop the native submission.
    Ajax,
}

/// An enhanced form: the surface it is attached to, plus everything the
/// engine tracks about it.
pub struct Form<S: FormSurface, T: Transport> {
    surface: S,
    transport: T,
    options: Options,
    /// Canonical ids of fields whose last check failed.
    errors: BTreeSet<String>,
    field_errors: BTreeMap<String, Vec<FieldError>>,
    dirty: bool,
    dirty_fields: BTreeSet<usize>,
    submitted: bool,
    /// The submission in flight, if any.
    pending: Option<SubmitRequest>,
}

impl<S: FormSurface, T: Transport> Form<S, T> {
    pub fn attach(surface: S, transport: T, options: Options) -> Self {
        log::debug!(
            "attaching form ({} fields, action \"{}\")",
            surface.fields().len(),
            surface.action()
        );
        Form {
            surface,
            transport,
            options,
            errors: BTreeSet::new(),
            field_errors: BTreeMap::new(),
            dirty: false,
            dirty_fields: BTreeSet::new(),
            submitted: false,
            pending: None,
        }
    }

    /// Detach from the surface, dropping all per-form state, and hand the
    /// surface and transport back.
    pub fn destroy(self) -> (S, T) {
        log::debug!("destroying form ({} cached errors)", self.errors.len());
        (self.surface, self.transport)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    // ── Serialization ───────────────────────────────────────────────

    /// Serialize the current field values into a value tree.
    pub fn to_json(&self) -> Result<FormValue, CodecError> {
        build(&self.surface.enumerate())
    }

    /// Populate fields from a value tree. Returns how many entries found a
    /// matching control.
    pub fn from_json(&mut self, tree: &FormValue) -> Result<usize, CodecError> {
        let mut applied = 0;
        for entry in flatten(tree)? {
            if self.surface.apply(&entry.name, &entry.value) {
                applied += 1;
            } else {
                log::debug!("no field accepts \"{}\"", entry.name);
            }
        }
        Ok(applied)
    }

    // ── Validation ──────────────────────────────────────────────────

    /// Canonical id of the control at `index`: from its name, else its id
    /// attribute, else its position.
    pub fn field_id(&self, index: usize) -> String {
        let field = self.surface.fields().get(index);
        let source = field
            .and_then(|f| f.name.as_deref().filter(|n| !n.is_empty()))
            .or_else(|| field.and_then(|f| f.id.as_deref().filter(|i| !i.is_empty())));
        match source {
            Some(s) => canonical_id(s),
            None => format!("field{}", index),
        }
    }

    /// Check one control and update the error cache. Returns the errors
    /// found (at most one).
    pub fn check(&mut self, index: usize) -> Vec<FieldError> {
        let id = self.field_id(index);
        let errors = check_field(
            self.surface.fields(),
            index,
            &self.options.settings.messages,
            self.options.validations.get(&id),
        );
        self.record(index, id, &errors);
        errors
    }

    fn record(&mut self, index: usize, id: String, errors: &[FieldError]) {
        if self.options.settings.show_errors {
            self.surface.show_error(index, errors.first());
        }
        if errors.is_empty() {
            self.errors.remove(&id);
            self.field_errors.remove(&id);
        } else {
            self.errors.insert(id.clone());
            self.field_errors.insert(id, errors.to_vec());
        }
    }

    /// Check every control (each radio group once) and the form-level
    /// predicate. Focuses the first invalid control.
    pub fn validate(&mut self) -> bool {
        let targets: Vec<usize> = {
            let mut groups = BTreeSet::new();
            self.surface
                .fields()
                .iter()
                .enumerate()
                .filter(|(_, f)| !f.kind.is_button_like() && !f.disabled)
                .filter(|(_, f)| match (&f.kind, &f.name) {
                    (FieldKind::Radio, Some(name)) => groups.insert(name.clone()),
                    _ => true,
                })
                .map(|(i, _)| i)
                .collect()
        };

        let mut first_invalid = None;
        for index in targets {
            if !self.check(index).is_empty() && first_invalid.is_none() {
                first_invalid = Some(index);
            }
        }

        let custom_ok = match self.to_json() {
            Ok(tree) => {
                self.errors.remove(SERIALIZE_ERROR_ID);
                let ok = (self.options.is_valid)(&tree);
                if ok {
                    self.errors.remove(CUSTOM_ERROR_ID);
                } else {
                    self.errors.insert(CUSTOM_ERROR_ID.to_string());
                }
                ok
            }
            Err(e) => {
                log::warn!("cannot serialize form for validation: {}", e);
                self.errors.insert(SERIALIZE_ERROR_ID.to_string());
                false
            }
        };

        if let Some(index) = first_invalid {
            self.surface.focus(index);
        }
        first_invalid.is_none() && custom_ok
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The error cache: canonical ids whose last check failed.
    pub fn errors(&self) -> &BTreeSet<String> {
        &self.errors
    }

    /// Errors currently attached to the field with canonical id `id`.
    pub fn field_errors(&self, id: &str) -> &[FieldError] {
        self.field_errors.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn show_server_errors(&mut self, messages: &BTreeMap<String, String>) {
        for (name, message) in messages {
            let id = canonical_id(name);
            let error = FieldError::new(Rule::Server, message.as_str());
            log::debug!("server rejected {}: {}", name, message);

            let index = self
                .surface
                .fields()
                .iter()
                .position(|f| f.name.as_deref() == Some(name.as_str()));
            if let (Some(index), true) = (index, self.options.settings.show_errors) {
                self.surface.show_error(index, Some(&error));
            }
            self.errors.insert(id.clone());
            self.field_errors.insert(id, vec![error]);
        }
    }

    // ── Submission ──────────────────────────────────────────────────

    /// Hand the form to the transport. A no-op returning `Ok(false)` while a
    /// previous submission has not completed.
    pub fn submit(&mut self) -> Result<bool, CodecError> {
        if self.pending.is_some() {
            log::debug!("submission already in flight, ignoring submit");
            return Ok(false);
        }

        let settings = &self.options.settings;
        let payload = if settings.sends_json() {
            Payload::Json(self.to_json()?.to_json())
        } else {
            Payload::Form(to_query_string(&self.surface.enumerate()))
        };
        let request = SubmitRequest {
            url: self.surface.action().to_string(),
            method: self.surface.method().to_string(),
            data_type: settings.data_type.clone(),
            content_type: settings.content_type.clone(),
            payload,
        };

        log::debug!("submitting {} {}", request.method, request.url);
        self.submitted = true;
        self.transport.send(&request);
        self.pending = Some(request);
        Ok(true)
    }

    pub fn validate_and_submit(&mut self) -> Result<bool, CodecError> {
        if self.validate() {
            self.submit()
        } else {
            Ok(false)
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_request(&self) -> Option<&SubmitRequest> {
        self.pending.as_ref()
    }

    /// Deliver the result of the submission in flight.
    ///
    /// The pending request is released before any hook runs, so a new
    /// submission is accepted afterwards whatever the outcome. Field-shaped
    /// failure bodies are surfaced as field errors. Returns `false` (and does
    /// nothing) when no submission is in flight.
    pub fn complete(&mut self, outcome: SubmitOutcome) -> bool {
        let request = match self.pending.take() {
            Some(request) => request,
            None => {
                log::warn!("submission outcome received with nothing in flight");
                return false;
            }
        };

        match outcome {
            SubmitOutcome::Success(payload) => {
                log::debug!("{} {} succeeded", request.method, request.url);
                (self.options.on_submit_success)(&payload);
                if self.options.settings.clear_on_success {
                    self.clear();
                }
            }
            SubmitOutcome::Failure(failure) => {
                log::debug!(
                    "{} {} failed with status {}",
                    request.method,
                    request.url,
                    failure.status
                );
                if let Some(messages) = failure.field_errors() {
                    self.show_server_errors(&messages);
                }
                (self.options.on_submit_error)(&failure);
            }
        }

        (self.options.on_submit_complete)();
        true
    }

    /// Reset every control, the error cache and the dirty/submitted state.
    pub fn clear(&mut self) {
        self.surface.clear();
        for index in 0..self.surface.fields().len() {
            self.surface.show_error(index, None);
        }
        self.errors.clear();
        self.field_errors.clear();
        self.dirty = false;
        self.dirty_fields.clear();
        self.submitted = false;
    }

    // ── Events ──────────────────────────────────────────────────────

    /// Route a user interaction. Submit events report what should happen
    /// to the native submission.
    pub fn handle(&mut self, event: FormEvent) -> Option<SubmitAction> {
        match event {
            FormEvent::Input(index) | FormEvent::FocusOut(index) => {
                if self.is_checkable(index) {
                    self.check(index);
                }
                None
            }
            FormEvent::Change(index) => {
                if self.is_checkable(index) {
                    self.dirty = true;
                    self.dirty_fields.insert(index);
                    self.check(index);
                }
                None
            }
            FormEvent::Submit => Some(self.on_submit()),
        }
    }

    fn is_checkable(&self, index: usize) -> bool {
        self.surface
            .fields()
            .get(index)
            .is_some_and(|f| !f.kind.is_button_like() && !f.disabled)
    }

    fn on_submit(&mut self) -> SubmitAction {
        self.submitted = true;
        if !self.validate() {
            return SubmitAction::Prevented;
        }
        if self.options.settings.ajax_submit {
            return match self.submit() {
                Ok(true) => SubmitAction::Ajax,
                Ok(false) => SubmitAction::Prevented,
                Err(e) => {
                    log::warn!("cannot submit form: {}", e);
                    SubmitAction::Prevented
                }
            };
        }
        if self.options.settings.disable_submit {
            SubmitAction::Prevented
        } else {
            SubmitAction::Native
        }
    }

    // ── Presentation state ──────────────────────────────────────────

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_field_dirty(&self, index: usize) -> bool {
        self.dirty_fields.contains(&index)
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Classes the form element should carry.
    pub fn form_classes(&self) -> Vec<String> {
        let mut classes = Vec::new();
        if self.has_errors() {
            classes.push(self.options.settings.error_class.clone());
        }
        if self.dirty {
            classes.push("dirty".to_string());
        }
        if self.submitted {
            classes.push("submitted".to_string());
        }
        classes
    }

    /// Classes the control at `index` should carry.
    pub fn field_classes(&self, index: usize) -> Vec<String> {
        let error_class = &self.options.settings.error_class;
        let mut classes = Vec::new();
        if let Some(error) = self.field_errors(&self.field_id(index)).first() {
            classes.push(error_class.clone());
            classes.push(error.class_name(error_class));
        }
        if self.is_field_dirty(index) {
            classes.push("dirty".to_string());
        }
        classes
    }
}
