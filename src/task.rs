//! Wire records exchanged with the task API, and task templates.
//!
//! `TaskRecord` is the read model returned by the fetch collaborator.
//! `TaskUpdatePayload` is the partial-update write model in which every field is
//! tri-state (see [`Patch`]). Key names follow the API exactly, including its
//! historical `assingned` spelling.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A user reference as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
}

/// A task as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "user_assingned_to", skip_serializing_if = "Option::is_none")]
    pub assigned_user: Option<User>,
    #[serde(default, rename = "user_verified_by", skip_serializing_if = "Option::is_none")]
    pub approving_user: Option<User>,
    #[serde(default, rename = "user_involved_array")]
    pub involved_users: Vec<User>,
    /// `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_condition: Option<String>,
}

/// Tri-state field of a partial update.
///
/// `Absent` is omitted from the serialized payload, `Null` serializes as JSON
/// `null` and clears the field, `Value` sets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    /// `Null` for `None`, `Value` otherwise.
    pub fn nullable(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Value(v) => serializer.serialize_some(v),
            Patch::Absent | Patch::Null => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    // Only reached when the key is present; missing keys take `Default`.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Patch::nullable)
    }
}

/// Partial update sent to the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdatePayload {
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub title: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub description: Patch<String>,
    #[serde(default, rename = "user_id_assingned_to", skip_serializing_if = "Patch::is_absent")]
    pub assigned_user_id: Patch<u64>,
    #[serde(default, rename = "user_id_verified_by", skip_serializing_if = "Patch::is_absent")]
    pub approving_user_id: Patch<u64>,
    #[serde(default, rename = "user_id_involved_array", skip_serializing_if = "Patch::is_absent")]
    pub involved_user_ids: Patch<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub start_date: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub end_date: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub end_condition: Patch<String>,
}

/// A template that pre-fills title and description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Templates used when the configuration does not provide any.
pub fn builtin_templates() -> Vec<TaskTemplate> {
    vec![
        TaskTemplate {
            id: 1,
            title: "Deploy".to_string(),
            description: "Deploy to prod".to_string(),
        },
        TaskTemplate {
            id: 2,
            title: "Manual test".to_string(),
            description: String::new(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_uses_api_key_names() {
        let json = r#"{
            "id": 1,
            "title": "Debug",
            "user_assingned_to": {"id": 3, "name": "Charlie"},
            "start_date": "2023-05-12",
            "user_involved_array": [{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}]
        }"#;
        let record: TaskRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.assigned_user.as_ref().map(|u| u.id), Some(3));
        assert_eq!(record.approving_user, None);
        assert_eq!(record.involved_users.len(), 2);
        assert_eq!(record.end_date, None);
    }

    #[test]
    fn test_patch_serialization_is_tri_state() {
        let payload = TaskUpdatePayload {
            title: Patch::Value("Deploy".into()),
            description: Patch::Null,
            ..Default::default()
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({"title": "Deploy", "description": null}));
    }

    #[test]
    fn test_patch_deserialization_distinguishes_null_from_missing() {
        let payload: TaskUpdatePayload =
            serde_json::from_str(r#"{"end_date": null, "user_id_verified_by": 2}"#).unwrap();
        assert_eq!(payload.end_date, Patch::Null);
        assert_eq!(payload.approving_user_id, Patch::Value(2));
        assert_eq!(payload.title, Patch::Absent);
    }
}
