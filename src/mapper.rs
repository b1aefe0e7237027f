//! Conversion between wire task records and form values.
//!
//! Missing optional wire fields become the form's empty representation, user
//! references become string identifiers, and dates are parsed from and
//! formatted to the fixed `YYYY-MM-DD` wire format. Going back, blank text and
//! absent selectors become explicit nulls in the partial-update payload.

use chrono::NaiveDate;

use crate::error::MappingError;
use crate::fields::{FieldName, FormValues};
use crate::task::{Patch, TaskRecord, TaskUpdatePayload};

/// Wire date format: zero-padded, four-digit year.
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a strict `YYYY-MM-DD` date.
///
/// Input that chrono would accept but that does not format back to the same
/// text (missing padding, extra digits) is rejected.
pub fn parse_wire_date(field: &str, raw: &str) -> Result<NaiveDate, MappingError> {
    NaiveDate::parse_from_str(raw, WIRE_DATE_FORMAT)
        .ok()
        .filter(|d| format_wire_date(*d) == raw)
        .ok_or_else(|| MappingError::InvalidDate {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

pub fn format_wire_date(date: NaiveDate) -> String {
    date.format(WIRE_DATE_FORMAT).to_string()
}

fn parse_optional_date(field: FieldName, raw: Option<&str>) -> Result<Option<NaiveDate>, MappingError> {
    raw.map(|s| parse_wire_date(field.as_str(), s)).transpose()
}

fn invalid_user_id(field: FieldName, raw: &str) -> MappingError {
    MappingError::InvalidUserId {
        field: field.as_str().to_string(),
        value: raw.to_string(),
    }
}

/// Normalise typed user id text (`"01"`, `"+1"`) to its canonical decimal form.
pub fn canonical_user_id(field: FieldName, raw: &str) -> Result<String, MappingError> {
    raw.parse::<u64>()
        .map(|id| id.to_string())
        .map_err(|_| invalid_user_id(field, raw))
}

/// Only canonical decimal text is accepted, so two ids that compare unequal
/// in the form never become the same number on the wire.
fn parse_user_id(field: FieldName, raw: &str) -> Result<u64, MappingError> {
    raw.parse::<u64>()
        .ok()
        .filter(|id| id.to_string() == raw)
        .ok_or_else(|| invalid_user_id(field, raw))
}

/// Blank text clears the field on the wire.
fn text_patch(value: &str) -> Patch<String> {
    if value.is_empty() {
        Patch::Null
    } else {
        Patch::Value(value.to_string())
    }
}

/// Convert a fetched record into the snapshot that seeds the form.
pub fn to_form_values(record: &TaskRecord) -> Result<FormValues, MappingError> {
    Ok(FormValues {
        title: record.title.clone(),
        description: record.description.clone().unwrap_or_default(),
        assigned_user_id: record.assigned_user.as_ref().map(|u| u.id.to_string()),
        approving_user_id: record.approving_user.as_ref().map(|u| u.id.to_string()),
        involved_user_ids: record.involved_users.iter().map(|u| u.id.to_string()).collect(),
        start_date: parse_optional_date(FieldName::StartDate, record.start_date.as_deref())?,
        end_date: parse_optional_date(FieldName::EndDate, record.end_date.as_deref())?,
        end_condition: record.end_condition.clone().unwrap_or_default(),
    })
}

/// Convert a validated snapshot into a partial-update payload.
///
/// Does not re-validate. The only failure is a selector holding a non-numeric
/// identifier, which cannot happen for values produced by [`to_form_values`].
pub fn to_update_payload(values: &FormValues) -> Result<TaskUpdatePayload, MappingError> {
    let assigned_user_id = values
        .assigned_user_id
        .as_deref()
        .map(|id| parse_user_id(FieldName::AssignedUserId, id))
        .transpose()?;
    let approving_user_id = values
        .approving_user_id
        .as_deref()
        .map(|id| parse_user_id(FieldName::ApprovingUserId, id))
        .transpose()?;
    let involved_user_ids = values
        .involved_user_ids
        .iter()
        .map(|id| parse_user_id(FieldName::InvolvedUserIds, id))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TaskUpdatePayload {
        title: Patch::Value(values.title.clone()),
        description: text_patch(&values.description),
        assigned_user_id: Patch::nullable(assigned_user_id),
        approving_user_id: Patch::nullable(approving_user_id),
        involved_user_ids: Patch::Value(involved_user_ids),
        start_date: Patch::nullable(values.start_date.map(format_wire_date)),
        end_date: Patch::nullable(values.end_date.map(format_wire_date)),
        end_condition: text_patch(&values.end_condition),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::User;
    use proptest::prelude::*;

    fn user(id: u64) -> User {
        User { id, name: format!("user-{id}") }
    }

    fn debug_record() -> TaskRecord {
        TaskRecord {
            id: 1,
            title: "Debug".to_string(),
            description: None,
            assigned_user: Some(user(3)),
            approving_user: None,
            involved_users: vec![user(1), user(2)],
            start_date: Some("2023-05-12".to_string()),
            end_date: None,
            end_condition: None,
        }
    }

    #[test]
    fn test_missing_optionals_map_to_empty_form_values() {
        let values = to_form_values(&debug_record()).unwrap();
        assert_eq!(values.title, "Debug");
        assert_eq!(values.description, "");
        assert_eq!(values.assigned_user_id.as_deref(), Some("3"));
        assert_eq!(values.approving_user_id, None);
        assert_eq!(values.involved_user_ids, vec!["1", "2"]);
        assert_eq!(values.start_date, NaiveDate::from_ymd_opt(2023, 5, 12));
        assert_eq!(values.end_date, None);
        assert_eq!(values.end_condition, "");
    }

    #[test]
    fn test_malformed_dates_are_mapping_errors() {
        for bad in ["2023-5-12", "2023/05/12", "2023-02-30", "23-05-12", "", "2023-05-12T00:00"] {
            let mut record = debug_record();
            record.end_date = Some(bad.to_string());
            let err = to_form_values(&record).unwrap_err();
            assert_eq!(
                err,
                MappingError::InvalidDate { field: "endDate".into(), value: bad.into() },
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_blank_text_and_absent_selectors_become_null() {
        let values = to_form_values(&debug_record()).unwrap();
        let payload = to_update_payload(&values).unwrap();
        assert_eq!(payload.title, Patch::Value("Debug".to_string()));
        assert_eq!(payload.description, Patch::Null);
        assert_eq!(payload.assigned_user_id, Patch::Value(3));
        assert_eq!(payload.approving_user_id, Patch::Null);
        assert_eq!(payload.involved_user_ids, Patch::Value(vec![1, 2]));
        assert_eq!(payload.start_date, Patch::Value("2023-05-12".to_string()));
        assert_eq!(payload.end_date, Patch::Null);
        assert_eq!(payload.end_condition, Patch::Null);
    }

    #[test]
    fn test_non_numeric_user_id_is_rejected() {
        let values = FormValues {
            title: "x".into(),
            approving_user_id: Some("bob".into()),
            involved_user_ids: vec!["1".into()],
            ..Default::default()
        };
        assert!(matches!(
            to_update_payload(&values),
            Err(MappingError::InvalidUserId { .. })
        ));
    }

    #[test]
    fn test_non_canonical_user_id_is_rejected() {
        for raw in ["01", "+1", " 1"] {
            let values = FormValues {
                title: "x".into(),
                assigned_user_id: Some(raw.into()),
                involved_user_ids: vec!["1".into()],
                ..Default::default()
            };
            assert_eq!(
                to_update_payload(&values).unwrap_err(),
                MappingError::InvalidUserId { field: "assignedUserId".into(), value: raw.into() },
                "{raw} should be rejected"
            );
        }
        assert_eq!(canonical_user_id(FieldName::AssignedUserId, "+01").unwrap(), "1");
        assert!(canonical_user_id(FieldName::AssignedUserId, "-1").is_err());
    }

    fn arb_date() -> impl Strategy<Value = NaiveDate> {
        (1i32..=9999, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn arb_record() -> impl Strategy<Value = TaskRecord> {
        (
            "[A-Za-z]{1,8}",
            "[a-z ]{1,20}",
            any::<u64>(),
            any::<u64>(),
            prop::collection::vec(any::<u64>(), 1..4),
            arb_date(),
            arb_date(),
            "[a-z]{1,12}",
        )
            .prop_map(|(title, desc, a, v, involved, start, end, cond)| TaskRecord {
                id: 7,
                title,
                description: Some(desc),
                assigned_user: Some(user(a)),
                approving_user: Some(user(v)),
                involved_users: involved.into_iter().map(user).collect(),
                start_date: Some(format_wire_date(start)),
                end_date: Some(format_wire_date(end)),
                end_condition: Some(cond),
            })
    }

    proptest! {
        #[test]
        fn prop_non_blank_fields_round_trip(record in arb_record()) {
            let payload = to_update_payload(&to_form_values(&record).unwrap()).unwrap();
            prop_assert_eq!(payload.title.value(), Some(&record.title));
            prop_assert_eq!(payload.description.value(), record.description.as_ref());
            prop_assert_eq!(payload.assigned_user_id.value(), record.assigned_user.as_ref().map(|u| &u.id));
            prop_assert_eq!(payload.approving_user_id.value(), record.approving_user.as_ref().map(|u| &u.id));
            let involved: Vec<u64> = record.involved_users.iter().map(|u| u.id).collect();
            prop_assert_eq!(payload.involved_user_ids.value(), Some(&involved));
            prop_assert_eq!(payload.start_date.value(), record.start_date.as_ref());
            prop_assert_eq!(payload.end_date.value(), record.end_date.as_ref());
            prop_assert_eq!(payload.end_condition.value(), record.end_condition.as_ref());
        }
    }
}
