//! Submission assembly: valid snapshot in, partial-update payload out.

use crate::error::{FormError, MappingError};
use crate::fields::FormValues;
use crate::mapper::to_update_payload;
use crate::schema::Schema;
use crate::task::TaskUpdatePayload;

/// Build the payload for a snapshot the caller has already validated.
///
/// Calling this on a snapshot with validation errors is a caller bug; use
/// [`assemble_checked`] when the snapshot's validity is not already known.
pub fn assemble(values: &FormValues) -> Result<TaskUpdatePayload, MappingError> {
    to_update_payload(values)
}

/// Validate, then assemble. An invalid snapshot is refused with
/// [`FormError::SubmissionGuard`].
pub fn assemble_checked(schema: &Schema, values: &FormValues) -> Result<TaskUpdatePayload, FormError> {
    let report = schema.validate(values);
    if !report.is_valid() {
        let invalid = report.invalid_fields().count();
        tracing::warn!(invalid, "refusing to assemble invalid snapshot");
        return Err(FormError::SubmissionGuard(invalid));
    }
    Ok(assemble(values)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Patch;
    use chrono::NaiveDate;

    fn valid_values() -> FormValues {
        FormValues {
            title: "Deploy".into(),
            description: "Deploy to prod".into(),
            assigned_user_id: Some("1".into()),
            approving_user_id: None,
            involved_user_ids: vec!["1".into(), "3".into()],
            start_date: NaiveDate::from_ymd_opt(2024, 1, 2),
            end_date: None,
            end_condition: "Green build".into(),
        }
    }

    #[test]
    fn test_assembles_valid_snapshot() {
        let payload = assemble_checked(&Schema::default(), &valid_values()).unwrap();
        assert_eq!(payload.title, Patch::Value("Deploy".into()));
        assert_eq!(payload.approving_user_id, Patch::Null);
        assert_eq!(payload.involved_user_ids, Patch::Value(vec![1, 3]));
        assert_eq!(payload.start_date, Patch::Value("2024-01-02".into()));
        assert_eq!(payload.end_date, Patch::Null);
        assert_eq!(payload.end_condition, Patch::Value("Green build".into()));
        assert_eq!(payload, assemble(&valid_values()).unwrap());
    }

    #[test]
    fn test_refuses_invalid_snapshot() {
        let mut values = valid_values();
        values.title.clear();
        values.end_condition.clear();
        assert_eq!(
            assemble_checked(&Schema::default(), &values),
            Err(FormError::SubmissionGuard(2))
        );
    }
}
