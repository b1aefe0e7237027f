//! Validation schema for the task form.
//!
//! Validation is a table of independent rules evaluated in full, in order, on
//! every call. Each rule reads the whole snapshot and attaches at most one
//! message to one field, so a condition that must surface on two fields is
//! simply listed twice with different targets. Nothing short-circuits and
//! nothing is cached: the report is a pure function of the snapshot and the
//! schema's configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fields::{FieldName, FormValues};

/// Message texts used by the rules.
///
/// Passed to the schema explicitly so two schemas in one process can word
/// their errors differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Messages {
    pub required: String,
    /// `{max}` is replaced by the limit.
    pub too_long: String,
    pub user_conflict: String,
    pub end_condition_required: String,
    pub date_order: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            required: "Required".to_string(),
            too_long: "String must contain at most {max} character(s)".to_string(),
            user_conflict: "Assigned user and approver must be different".to_string(),
            end_condition_required: "If the end date is undetermined, end conditions are required."
                .to_string(),
            date_order: "Start date must not be after the end date".to_string(),
        }
    }
}

impl Messages {
    pub fn too_long(&self, max: usize) -> String {
        self.too_long.replace("{max}", &max.to_string())
    }
}

/// Tunable parts of the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub title_max_len: usize,
    pub description_max_len: usize,
    /// Whether a task may be saved without an assignee.
    pub assignee_nullable: bool,
    /// Reject a start date later than the end date.
    pub enforce_date_order: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            title_max_len: 8,
            description_max_len: 20,
            assignee_nullable: false,
            enforce_date_order: false,
        }
    }
}

/// Per-field error messages for one snapshot.
///
/// Every field has an entry; an empty list means the field is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorReport {
    errors: BTreeMap<FieldName, Vec<String>>,
}

impl Default for ErrorReport {
    fn default() -> Self {
        Self {
            errors: FieldName::ALL.into_iter().map(|f| (f, Vec::new())).collect(),
        }
    }
}

impl ErrorReport {
    pub fn messages(&self, field: FieldName) -> &[String] {
        self.errors.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, field: FieldName, message: &str) -> bool {
        self.messages(field).iter().any(|m| m == message)
    }

    /// Messages for `field` joined for display, or `None` if it is valid.
    pub fn joined(&self, field: FieldName) -> Option<String> {
        let messages = self.messages(field);
        if messages.is_empty() {
            None
        } else {
            Some(messages.join(", "))
        }
    }

    /// True iff every field's list is empty, i.e. the snapshot may be submitted.
    pub fn is_valid(&self) -> bool {
        self.errors.values().all(Vec::is_empty)
    }

    pub fn invalid_fields(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.errors
            .iter()
            .filter(|(_, m)| !m.is_empty())
            .map(|(f, _)| *f)
    }

    fn push(&mut self, field: FieldName, message: String) {
        self.errors.entry(field).or_default().push(message);
    }
}

/// One validation rule.
pub struct Rule {
    pub name: &'static str,
    /// Fields whose values the predicate reads.
    pub reads: &'static [FieldName],
    /// Field the message is attached to.
    pub attach: FieldName,
    check: fn(&Schema, &FormValues) -> Option<String>,
}

impl Rule {
    pub fn check(&self, schema: &Schema, values: &FormValues) -> Option<String> {
        (self.check)(schema, values)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn users_conflict(values: &FormValues) -> bool {
    matches!(
        (&values.assigned_user_id, &values.approving_user_id),
        (Some(a), Some(b)) if a == b
    )
}

fn dates_out_of_order(schema: &Schema, values: &FormValues) -> bool {
    schema.config.enforce_date_order
        && matches!((values.start_date, values.end_date), (Some(s), Some(e)) if s > e)
}

const RULES: &[Rule] = &[
    Rule {
        name: "title-required",
        reads: &[FieldName::Title],
        attach: FieldName::Title,
        check: |s, v| v.title.is_empty().then(|| s.messages.required.clone()),
    },
    Rule {
        name: "title-max-length",
        reads: &[FieldName::Title],
        attach: FieldName::Title,
        check: |s, v| {
            (char_len(&v.title) > s.config.title_max_len)
                .then(|| s.messages.too_long(s.config.title_max_len))
        },
    },
    Rule {
        name: "description-max-length",
        reads: &[FieldName::Description],
        attach: FieldName::Description,
        check: |s, v| {
            (char_len(&v.description) > s.config.description_max_len)
                .then(|| s.messages.too_long(s.config.description_max_len))
        },
    },
    Rule {
        name: "assignee-required",
        reads: &[FieldName::AssignedUserId],
        attach: FieldName::AssignedUserId,
        check: |s, v| {
            (!s.config.assignee_nullable && v.assigned_user_id.is_none())
                .then(|| s.messages.required.clone())
        },
    },
    Rule {
        name: "involved-users-required",
        reads: &[FieldName::InvolvedUserIds],
        attach: FieldName::InvolvedUserIds,
        check: |s, v| v.involved_user_ids.is_empty().then(|| s.messages.required.clone()),
    },
    Rule {
        name: "assignee-differs-from-approver",
        reads: &[FieldName::AssignedUserId, FieldName::ApprovingUserId],
        attach: FieldName::AssignedUserId,
        check: |s, v| users_conflict(v).then(|| s.messages.user_conflict.clone()),
    },
    Rule {
        name: "approver-differs-from-assignee",
        reads: &[FieldName::AssignedUserId, FieldName::ApprovingUserId],
        attach: FieldName::ApprovingUserId,
        check: |s, v| users_conflict(v).then(|| s.messages.user_conflict.clone()),
    },
    Rule {
        name: "end-condition-without-end-date",
        reads: &[FieldName::EndDate, FieldName::EndCondition],
        attach: FieldName::EndCondition,
        check: |s, v| {
            (v.end_date.is_none() && v.end_condition.is_empty())
                .then(|| s.messages.end_condition_required.clone())
        },
    },
    Rule {
        name: "start-date-not-after-end-date",
        reads: &[FieldName::StartDate, FieldName::EndDate],
        attach: FieldName::StartDate,
        check: |s, v| dates_out_of_order(s, v).then(|| s.messages.date_order.clone()),
    },
    Rule {
        name: "end-date-not-before-start-date",
        reads: &[FieldName::StartDate, FieldName::EndDate],
        attach: FieldName::EndDate,
        check: |s, v| dates_out_of_order(s, v).then(|| s.messages.date_order.clone()),
    },
];

/// The task form's validation schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub config: SchemaConfig,
    pub messages: Messages,
}

impl Schema {
    pub fn new(config: SchemaConfig, messages: Messages) -> Self {
        Self { config, messages }
    }

    pub fn rules(&self) -> &'static [Rule] {
        RULES
    }

    /// Run every rule against the snapshot and collect the messages.
    pub fn validate(&self, values: &FormValues) -> ErrorReport {
        let mut report = ErrorReport::default();
        for rule in RULES {
            if let Some(message) = rule.check(self, values) {
                report.push(rule.attach, message);
            }
        }
        report
    }

    /// Whether the field should carry a required marker for this snapshot.
    pub fn is_required(&self, field: FieldName, values: &FormValues) -> bool {
        match field {
            FieldName::Title | FieldName::InvolvedUserIds => true,
            FieldName::AssignedUserId => !self.config.assignee_nullable,
            FieldName::EndCondition => values.end_date.is_none(),
            _ => false,
        }
    }

    /// Longest text an input accepts: one past the limit, so the length
    /// error can still be seen.
    pub fn input_limit(&self, field: FieldName) -> Option<usize> {
        match field {
            FieldName::Title => Some(self.config.title_max_len + 1),
            FieldName::Description => Some(self.config.description_max_len + 1),
            _ => None,
        }
    }
}
