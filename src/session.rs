//! Form session: the editing state machine that ties the core together.
//!
//! A session starts in `Loading` with inert fields. When the one-shot record
//! fetch resolves, the record is mapped into the baseline snapshot and the
//! session moves to `Editing`. Every field event updates the snapshot, runs the
//! tracker reducer and recomputes the full error report. A submit either
//! returns to `Editing` (invalid snapshot or transport failure) or reaches
//! `Submitted`.
//!
//! Events are processed one at a time by [`FormSession::dispatch`]; the session
//! owns its snapshot and flags exclusively.

use serde::{Deserialize, Serialize};

use crate::assemble::assemble;
use crate::error::{FormError, MappingError, TransportError};
use crate::fields::{FieldKind, FieldName, FieldValue, FormValues};
use crate::mapper::to_form_values;
use crate::schema::{ErrorReport, Schema};
use crate::task::{TaskRecord, TaskTemplate, TaskUpdatePayload};
use crate::tracker::{self, TouchEvent, TouchState};

/// Lifecycle of one editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Loading,
    Editing,
    Submitting,
    Submitted,
}

/// Outbound write collaborator.
pub trait Transport {
    fn send(&mut self, payload: &TaskUpdatePayload) -> Result<(), TransportError>;
}

/// Hosting environment hook that asks the user before navigating away.
pub trait UnloadPrompt {
    fn arm(&mut self);
    fn disarm(&mut self);
}

/// For hosts that never navigate away.
#[derive(Debug, Default)]
pub struct NoUnloadPrompt;

impl UnloadPrompt for NoUnloadPrompt {
    fn arm(&mut self) {}
    fn disarm(&mut self) {}
}

/// A user action against the form, as scripted by the CLI `replay` command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormEvent {
    /// New raw input for a field, parsed with [`FieldValue::parse`].
    Change { field: FieldName, value: String },
    Blur { field: FieldName },
    /// Select a template by id; `null` clears the selection.
    Template { id: Option<u64> },
    Reset,
    Submit,
}

/// Result of a submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; every error is now visible.
    Rejected(ErrorReport),
    /// The payload was sent successfully.
    Sent(TaskUpdatePayload),
    /// The transport reported a failure; the form is editable again.
    Failed(TransportError),
}

/// One editing session over a single task.
pub struct FormSession<P: UnloadPrompt = NoUnloadPrompt> {
    schema: Schema,
    templates: Vec<TaskTemplate>,
    phase: Phase,
    values: FormValues,
    baseline: FormValues,
    touch: TouchState,
    report: ErrorReport,
    submitted: bool,
    selected_template: Option<u64>,
    load_error: Option<MappingError>,
    transport_error: Option<TransportError>,
    unload: P,
    unload_armed: bool,
}

impl FormSession<NoUnloadPrompt> {
    pub fn new(schema: Schema, templates: Vec<TaskTemplate>) -> Self {
        Self::with_unload_prompt(schema, templates, NoUnloadPrompt)
    }
}

impl<P: UnloadPrompt> FormSession<P> {
    pub fn with_unload_prompt(schema: Schema, templates: Vec<TaskTemplate>, unload: P) -> Self {
        let values = FormValues::default();
        let report = schema.validate(&values);
        Self {
            schema,
            templates,
            phase: Phase::Loading,
            baseline: values.clone(),
            values,
            touch: TouchState::default(),
            report,
            submitted: false,
            selected_template: None,
            load_error: None,
            transport_error: None,
            unload,
            unload_armed: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn baseline(&self) -> &FormValues {
        &self.baseline
    }

    pub fn touch(&self) -> &TouchState {
        &self.touch
    }

    /// The report for the current snapshot, regardless of visibility.
    pub fn report(&self) -> &ErrorReport {
        &self.report
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn selected_template(&self) -> Option<u64> {
        self.selected_template
    }

    pub fn load_error(&self) -> Option<&MappingError> {
        self.load_error.as_ref()
    }

    pub fn transport_error(&self) -> Option<&TransportError> {
        self.transport_error.as_ref()
    }

    pub fn unload_prompt(&self) -> &P {
        &self.unload
    }

    /// True while navigating away should be confirmed.
    pub fn needs_unload_confirmation(&self) -> bool {
        self.touch.any_changed()
    }

    /// The field's errors joined for display, if they should be shown.
    pub fn visible_error(&self, field: FieldName) -> Option<String> {
        if tracker::should_show_error(&self.touch, field, self.submitted) {
            self.report.joined(field)
        } else {
            None
        }
    }

    /// Accept the one-shot fetch result.
    ///
    /// A mapping failure leaves the session in `Loading` with the error
    /// recorded, so the host can show a load failure.
    pub fn receive_record(&mut self, record: &TaskRecord) -> Result<(), FormError> {
        if self.phase != Phase::Loading {
            tracing::warn!(task_id = record.id, phase = ?self.phase, "ignoring second task record");
            return Err(FormError::AlreadyLoaded);
        }
        match to_form_values(record) {
            Ok(values) => {
                tracing::info!(task_id = record.id, "task record loaded");
                self.load_error = None;
                self.baseline = values.clone();
                self.values = values;
                self.touch = tracker::reset();
                self.recompute();
                self.phase = Phase::Editing;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(task_id = record.id, error = %e, "failed to map task record");
                self.load_error = Some(e.clone());
                Err(e.into())
            }
        }
    }

    fn ensure_editing(&self) -> Result<(), FormError> {
        if self.phase == Phase::Editing {
            Ok(())
        } else {
            Err(FormError::Inert(self.phase))
        }
    }

    fn recompute(&mut self) {
        self.report = self.schema.validate(&self.values);
    }

    /// Keep the unload prompt armed exactly while any field is changed.
    fn sync_unload_prompt(&mut self) {
        let wanted = self.touch.any_changed();
        if wanted != self.unload_armed {
            if wanted {
                self.unload.arm();
            } else {
                self.unload.disarm();
            }
            self.unload_armed = wanted;
            tracing::debug!(armed = wanted, "unload prompt");
        }
    }

    /// Text beyond the input limit is cut.
    fn clamp(&self, field: FieldName, value: FieldValue) -> FieldValue {
        match value {
            FieldValue::Text(text) => FieldValue::Text(self.clamp_text(field, text)),
            value => value,
        }
    }

    fn clamp_text(&self, field: FieldName, text: String) -> String {
        match self.schema.input_limit(field) {
            Some(limit) if text.chars().count() > limit => text.chars().take(limit).collect(),
            _ => text,
        }
    }

    /// Set a field's value from the user.
    pub fn set_value(&mut self, field: FieldName, value: FieldValue) -> Result<(), FormError> {
        self.ensure_editing()?;
        let value = self.clamp(field, value);
        self.values.set(field, value.clone())?;
        let touch = std::mem::take(&mut self.touch);
        self.touch = tracker::on_value_change(touch, field, &value, &self.baseline);
        self.recompute();
        self.sync_unload_prompt();
        tracing::debug!(%field, valid = self.report.is_valid(), "value changed");
        Ok(())
    }

    pub fn blur(&mut self, field: FieldName) -> Result<(), FormError> {
        self.ensure_editing()?;
        let touch = std::mem::take(&mut self.touch);
        self.touch = tracker::on_blur(touch, field);
        Ok(())
    }

    /// Overwrite title and description from a template and mark both changed.
    ///
    /// A cleared selection or an unknown id blanks both fields.
    pub fn apply_template(&mut self, id: Option<u64>) -> Result<(), FormError> {
        self.ensure_editing()?;
        self.selected_template = id;
        let template = id.and_then(|id| self.templates.iter().find(|t| t.id == id));
        let (title, description) = template
            .map(|t| (t.title.clone(), t.description.clone()))
            .unwrap_or_default();
        tracing::debug!(template = ?id, found = template.is_some(), "applying template");
        self.values.title = self.clamp_text(FieldName::Title, title);
        self.values.description = self.clamp_text(FieldName::Description, description);
        self.touch = std::mem::take(&mut self.touch)
            .reduce(TouchEvent::MarkedChanged(FieldName::Title))
            .reduce(TouchEvent::MarkedChanged(FieldName::Description));
        self.recompute();
        self.sync_unload_prompt();
        Ok(())
    }

    /// Return to the baseline snapshot and clear all flags. A previous submit
    /// attempt stays on record.
    pub fn reset(&mut self) -> Result<(), FormError> {
        self.ensure_editing()?;
        self.values = self.baseline.clone();
        self.touch = tracker::reset();
        self.selected_template = None;
        self.recompute();
        self.sync_unload_prompt();
        Ok(())
    }

    /// Validate and, if clean, assemble the payload and hand it to `transport`.
    pub fn submit<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<SubmitOutcome, FormError> {
        self.ensure_editing()?;
        self.phase = Phase::Submitting;
        self.submitted = true;
        self.recompute();

        if !self.report.is_valid() {
            self.phase = Phase::Editing;
            tracing::info!(
                invalid = self.report.invalid_fields().count(),
                "submit rejected by validation"
            );
            return Ok(SubmitOutcome::Rejected(self.report.clone()));
        }

        let payload = match assemble(&self.values) {
            Ok(payload) => payload,
            Err(e) => {
                self.phase = Phase::Editing;
                return Err(e.into());
            }
        };

        match transport.send(&payload) {
            Ok(()) => {
                tracing::info!("task update sent");
                self.transport_error = None;
                self.phase = Phase::Submitted;
                // the saved snapshot is the new baseline
                self.baseline = self.values.clone();
                self.touch = tracker::reset();
                self.sync_unload_prompt();
                Ok(SubmitOutcome::Sent(payload))
            }
            Err(e) => {
                tracing::warn!(error = %e, "task update failed");
                self.transport_error = Some(e.clone());
                self.phase = Phase::Editing;
                Ok(SubmitOutcome::Failed(e))
            }
        }
    }

    /// Process one scripted event.
    pub fn dispatch<T: Transport + ?Sized>(
        &mut self,
        event: FormEvent,
        transport: &mut T,
    ) -> Result<Option<SubmitOutcome>, FormError> {
        match event {
            FormEvent::Change { field, value } => {
                let value = if field.kind() == FieldKind::Text {
                    FieldValue::Text(value)
                } else {
                    FieldValue::parse(field, &value)?
                };
                self.set_value(field, value)?;
            }
            FormEvent::Blur { field } => self.blur(field)?,
            FormEvent::Template { id } => self.apply_template(id)?,
            FormEvent::Reset => self.reset()?,
            FormEvent::Submit => return self.submit(transport).map(Some),
        }
        Ok(None)
    }
}

impl<P: UnloadPrompt> Drop for FormSession<P> {
    fn drop(&mut self) {
        if self.unload_armed {
            self.unload.disarm();
            self.unload_armed = false;
        }
    }
}
