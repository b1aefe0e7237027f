//! Field names and value types for the task editing form.
//!
//! This module defines the fixed set of form fields, the kind of value each one
//! holds, and the `FormValues` snapshot that the rest of the crate operates on.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{FormError, MappingError};
use crate::mapper::{canonical_user_id, parse_wire_date};

/// Every editable field of the task form, in display order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    Title,
    Description,
    AssignedUserId,
    ApprovingUserId,
    InvolvedUserIds,
    StartDate,
    EndDate,
    EndCondition,
}

/// The shape of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text; the empty string means "no value".
    Text,
    /// Single selector; `None` is the absent marker.
    Choice,
    /// Ordered multi selector.
    Choices,
    /// Calendar date or absent.
    Date,
}

impl FieldName {
    pub const ALL: [FieldName; 8] = [
        FieldName::Title,
        FieldName::Description,
        FieldName::AssignedUserId,
        FieldName::ApprovingUserId,
        FieldName::InvolvedUserIds,
        FieldName::StartDate,
        FieldName::EndDate,
        FieldName::EndCondition,
    ];

    /// Name of the field as used in error reports and event scripts.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::Title => "title",
            FieldName::Description => "description",
            FieldName::AssignedUserId => "assignedUserId",
            FieldName::ApprovingUserId => "approvingUserId",
            FieldName::InvolvedUserIds => "involvedUserIds",
            FieldName::StartDate => "startDate",
            FieldName::EndDate => "endDate",
            FieldName::EndCondition => "endCondition",
        }
    }

    /// Human label for terminal output.
    pub fn label(self) -> &'static str {
        match self {
            FieldName::Title => "Title",
            FieldName::Description => "Description",
            FieldName::AssignedUserId => "Assigned user",
            FieldName::ApprovingUserId => "Approver",
            FieldName::InvolvedUserIds => "Involved users",
            FieldName::StartDate => "Start date",
            FieldName::EndDate => "End date",
            FieldName::EndCondition => "End condition",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            FieldName::Title | FieldName::Description | FieldName::EndCondition => FieldKind::Text,
            FieldName::AssignedUserId | FieldName::ApprovingUserId => FieldKind::Choice,
            FieldName::InvolvedUserIds => FieldKind::Choices,
            FieldName::StartDate | FieldName::EndDate => FieldKind::Date,
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = FormError;

    /// Accepts the camelCase report name or the kebab-case CLI spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldName::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .or_else(|| <FieldName as ValueEnum>::from_str(s, true).ok())
            .ok_or_else(|| FormError::UnknownField(s.to_string()))
    }
}

/// A single field's value, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Choice(Option<String>),
    Choices(Vec<String>),
    Date(Option<NaiveDate>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Choice(_) => FieldKind::Choice,
            FieldValue::Choices(_) => FieldKind::Choices,
            FieldValue::Date(_) => FieldKind::Date,
        }
    }

    /// Parse raw input text into the value kind expected by `field`.
    ///
    /// Selectors and dates treat `""` as absent, multi selectors split on commas.
    /// User ids are stored in canonical decimal form and a multi selector keeps
    /// the first occurrence of each id.
    pub fn parse(field: FieldName, raw: &str) -> Result<Self, MappingError> {
        let value = match field.kind() {
            FieldKind::Text => FieldValue::Text(raw.to_string()),
            FieldKind::Choice => {
                let raw = raw.trim();
                FieldValue::Choice(if raw.is_empty() {
                    None
                } else {
                    Some(canonical_user_id(field, raw)?)
                })
            }
            FieldKind::Choices => {
                let mut ids: Vec<String> = Vec::new();
                for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    let id = canonical_user_id(field, part)?;
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                FieldValue::Choices(ids)
            }
            FieldKind::Date => {
                let raw = raw.trim();
                if raw.is_empty() {
                    FieldValue::Date(None)
                } else {
                    FieldValue::Date(Some(parse_wire_date(field.as_str(), raw)?))
                }
            }
        };
        Ok(value)
    }
}

/// Snapshot of every editable field at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormValues {
    pub title: String,
    pub description: String,
    pub assigned_user_id: Option<String>,
    pub approving_user_id: Option<String>,
    pub involved_user_ids: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub end_condition: String,
}

impl FormValues {
    /// Current value of `field`.
    pub fn get(&self, field: FieldName) -> FieldValue {
        match field {
            FieldName::Title => FieldValue::Text(self.title.clone()),
            FieldName::Description => FieldValue::Text(self.description.clone()),
            FieldName::AssignedUserId => FieldValue::Choice(self.assigned_user_id.clone()),
            FieldName::ApprovingUserId => FieldValue::Choice(self.approving_user_id.clone()),
            FieldName::InvolvedUserIds => FieldValue::Choices(self.involved_user_ids.clone()),
            FieldName::StartDate => FieldValue::Date(self.start_date),
            FieldName::EndDate => FieldValue::Date(self.end_date),
            FieldName::EndCondition => FieldValue::Text(self.end_condition.clone()),
        }
    }

    /// Replace the value of `field`, rejecting a value of the wrong kind.
    pub fn set(&mut self, field: FieldName, value: FieldValue) -> Result<(), FormError> {
        match (field, value) {
            (FieldName::Title, FieldValue::Text(v)) => self.title = v,
            (FieldName::Description, FieldValue::Text(v)) => self.description = v,
            (FieldName::EndCondition, FieldValue::Text(v)) => self.end_condition = v,
            (FieldName::AssignedUserId, FieldValue::Choice(v)) => self.assigned_user_id = v,
            (FieldName::ApprovingUserId, FieldValue::Choice(v)) => self.approving_user_id = v,
            (FieldName::InvolvedUserIds, FieldValue::Choices(v)) => self.involved_user_ids = v,
            (FieldName::StartDate, FieldValue::Date(v)) => self.start_date = v,
            (FieldName::EndDate, FieldValue::Date(v)) => self.end_date = v,
            (field, value) => {
                return Err(FormError::FieldKind {
                    field,
                    expected: field.kind(),
                    found: value.kind(),
                })
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_name_parsing() {
        assert_eq!("title".parse::<FieldName>().unwrap(), FieldName::Title);
        assert_eq!("assignedUserId".parse::<FieldName>().unwrap(), FieldName::AssignedUserId);
        assert_eq!("end-condition".parse::<FieldName>().unwrap(), FieldName::EndCondition);
        assert!("owner".parse::<FieldName>().is_err());
    }

    #[test]
    fn test_get_set_round_trip_per_field() {
        let mut values = FormValues::default();
        values.set(FieldName::Title, FieldValue::Text("Debug".into())).unwrap();
        values
            .set(FieldName::InvolvedUserIds, FieldValue::Choices(vec!["1".into(), "2".into()]))
            .unwrap();
        assert_eq!(values.get(FieldName::Title), FieldValue::Text("Debug".into()));
        assert_eq!(values.involved_user_ids, vec!["1", "2"]);
    }

    #[test]
    fn test_set_rejects_wrong_kind() {
        let mut values = FormValues::default();
        let err = values.set(FieldName::StartDate, FieldValue::Text("soon".into())).unwrap_err();
        assert!(matches!(err, FormError::FieldKind { field: FieldName::StartDate, .. }));
        assert_eq!(values, FormValues::default());
    }

    #[test]
    fn test_parse_raw_values() {
        assert_eq!(
            FieldValue::parse(FieldName::AssignedUserId, "").unwrap(),
            FieldValue::Choice(None)
        );
        assert_eq!(
            FieldValue::parse(FieldName::InvolvedUserIds, "1, 3,").unwrap(),
            FieldValue::Choices(vec!["1".into(), "3".into()])
        );
        assert_eq!(
            FieldValue::parse(FieldName::EndDate, "2023-05-12").unwrap(),
            FieldValue::Date(NaiveDate::from_ymd_opt(2023, 5, 12))
        );
        assert!(FieldValue::parse(FieldName::EndDate, "12/05/2023").is_err());
        assert_eq!(
            FieldValue::parse(FieldName::Description, "  padded ").unwrap(),
            FieldValue::Text("  padded ".into())
        );
    }

    #[test]
    fn test_user_ids_are_canonical() {
        assert_eq!(
            FieldValue::parse(FieldName::AssignedUserId, " 01 ").unwrap(),
            FieldValue::Choice(Some("1".into()))
        );
        assert_eq!(
            FieldValue::parse(FieldName::ApprovingUserId, "+1").unwrap(),
            FieldValue::Choice(Some("1".into()))
        );
        assert_eq!(
            FieldValue::parse(FieldName::InvolvedUserIds, "1,01,+2, 1").unwrap(),
            FieldValue::Choices(vec!["1".into(), "2".into()])
        );
        assert_eq!(
            FieldValue::parse(FieldName::AssignedUserId, "bob").unwrap_err(),
            MappingError::InvalidUserId { field: "assignedUserId".into(), value: "bob".into() }
        );
        assert!(FieldValue::parse(FieldName::InvolvedUserIds, "1,x").is_err());
    }
}
