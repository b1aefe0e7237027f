//! Error types shared by the form core.
//!
//! Validation failures are not errors: they are reported through
//! [`ErrorReport`](crate::schema::ErrorReport). The types here cover bad
//! upstream data, misuse of the session by its collaborator, and transport
//! failures reported back by the collaborator.

use thiserror::Error;

use crate::fields::{FieldKind, FieldName};
use crate::session::Phase;

/// The wire record could not be converted to or from form values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// A date was not a valid calendar date in `YYYY-MM-DD` form.
    #[error("invalid date for {field}: {value:?} (expected YYYY-MM-DD)")]
    InvalidDate { field: String, value: String },
    /// A user identifier in the form layer was not numeric.
    #[error("invalid user id for {field}: {value:?}")]
    InvalidUserId { field: String, value: String },
}

/// Misuse of the form session or the core by its caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("field {field} holds {expected:?} values, got {found:?}")]
    FieldKind {
        field: FieldName,
        expected: FieldKind,
        found: FieldKind,
    },

    /// Field events arrived while the form was not editable.
    #[error("form is not editable while {0:?}")]
    Inert(Phase),

    /// A second record arrived for a one-shot load.
    #[error("task record already loaded")]
    AlreadyLoaded,

    /// `assemble` was asked for a payload from a snapshot that fails validation.
    #[error("refusing to assemble an invalid snapshot ({0} field(s) with errors)")]
    SubmissionGuard(usize),

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

/// The outbound write failed; reported by the transport collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("transport failed: {0}")]
pub struct TransportError(pub String);
