//! Dirty and touch tracking for form fields.
//!
//! Each field carries two sticky flags: `changed` (its value has differed from
//! the baseline at some point) and `touched` (the user has left the field at
//! least once). Both only go back to false on an explicit reset. The state is
//! updated by a pure reducer so the stickiness rules can be tested on their own.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::fields::{FieldName, FieldValue, FormValues};

/// Flags for a single field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FieldFlags {
    pub changed: bool,
    pub touched: bool,
}

/// Input to [`TouchState::reduce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEvent {
    /// A field received a new value; `differs` compares it to the baseline.
    ValueChanged { field: FieldName, differs: bool },
    /// The field was overwritten on the user's behalf (template selection).
    MarkedChanged(FieldName),
    Blurred(FieldName),
    Reset,
}

/// Per-field flags for one editing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TouchState {
    flags: BTreeMap<FieldName, FieldFlags>,
}

impl Default for TouchState {
    fn default() -> Self {
        Self {
            flags: FieldName::ALL.into_iter().map(|f| (f, FieldFlags::default())).collect(),
        }
    }
}

impl TouchState {
    pub fn flags(&self, field: FieldName) -> FieldFlags {
        self.flags.get(&field).copied().unwrap_or_default()
    }

    pub fn is_changed(&self, field: FieldName) -> bool {
        self.flags(field).changed
    }

    pub fn is_touched(&self, field: FieldName) -> bool {
        self.flags(field).touched
    }

    /// Apply one event. Flags are only ever raised, except by `Reset`.
    pub fn reduce(mut self, event: TouchEvent) -> Self {
        match event {
            TouchEvent::ValueChanged { field, differs } => {
                if differs {
                    self.flags.entry(field).or_default().changed = true;
                }
            }
            TouchEvent::MarkedChanged(field) => {
                self.flags.entry(field).or_default().changed = true;
            }
            TouchEvent::Blurred(field) => {
                self.flags.entry(field).or_default().touched = true;
            }
            TouchEvent::Reset => return Self::default(),
        }
        self
    }

    /// True iff any field has been changed; gates the unload prompt.
    pub fn any_changed(&self) -> bool {
        self.flags.values().any(|f| f.changed)
    }

    pub fn changed_fields(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.flags.iter().filter(|(_, f)| f.changed).map(|(n, _)| *n)
    }
}

/// Record a new value for `field`, comparing it with the baseline snapshot.
pub fn on_value_change(
    state: TouchState,
    field: FieldName,
    new_value: &FieldValue,
    baseline: &FormValues,
) -> TouchState {
    let differs = baseline.get(field) != *new_value;
    state.reduce(TouchEvent::ValueChanged { field, differs })
}

pub fn on_blur(state: TouchState, field: FieldName) -> TouchState {
    state.reduce(TouchEvent::Blurred(field))
}

/// Errors are shown once the field was touched or changed, or after any
/// submit attempt.
pub fn should_show_error(state: &TouchState, field: FieldName, submitted: bool) -> bool {
    let flags = state.flags(field);
    flags.touched || flags.changed || submitted
}

pub fn reset() -> TouchState {
    TouchState::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> FormValues {
        FormValues {
            title: "Debug".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_initial_state_is_all_false() {
        let state = reset();
        for field in FieldName::ALL {
            assert_eq!(state.flags(field), FieldFlags::default());
            assert!(!should_show_error(&state, field, false));
        }
        assert!(!state.any_changed());
    }

    #[test]
    fn test_change_to_baseline_value_does_not_mark() {
        let state = on_value_change(reset(), FieldName::Title, &FieldValue::Text("Debug".into()), &baseline());
        assert!(!state.is_changed(FieldName::Title));
    }

    #[test]
    fn test_changed_is_sticky_after_reverting() {
        let base = baseline();
        let state = on_value_change(reset(), FieldName::Title, &FieldValue::Text("Debu".into()), &base);
        assert!(state.is_changed(FieldName::Title));
        let state = on_value_change(state, FieldName::Title, &FieldValue::Text("Debug".into()), &base);
        assert!(state.is_changed(FieldName::Title));
        assert!(state.any_changed());
        assert!(!state.is_changed(FieldName::Description));
        assert!(!state.is_touched(FieldName::Title));
    }

    #[test]
    fn test_blur_is_sticky_and_independent() {
        let state = on_blur(reset(), FieldName::EndCondition);
        let state = on_blur(state, FieldName::EndCondition);
        assert!(state.is_touched(FieldName::EndCondition));
        assert!(!state.is_changed(FieldName::EndCondition));
        assert!(!state.any_changed());
        assert!(should_show_error(&state, FieldName::EndCondition, false));
        assert!(!should_show_error(&state, FieldName::Title, false));
    }

    #[test]
    fn test_submitted_shows_every_field() {
        let state = reset();
        assert!(FieldName::ALL.iter().all(|f| should_show_error(&state, *f, true)));
    }

    #[test]
    fn test_marked_changed_and_reset() {
        let state = reset()
            .reduce(TouchEvent::MarkedChanged(FieldName::Title))
            .reduce(TouchEvent::MarkedChanged(FieldName::Description));
        assert_eq!(
            state.changed_fields().collect::<Vec<_>>(),
            vec![FieldName::Title, FieldName::Description]
        );
        let state = state.reduce(TouchEvent::Reset);
        assert!(!state.any_changed());
        assert_eq!(state, TouchState::default());
    }
}
