//! # taskform - validation and synchronisation core for a task edit form
//!
//! The crate holds the logic behind a multi-field task editing form, leaving
//! widgets, layout and networking to the host:
//!
//! - **Field Mapper** ([`mapper`]): wire task record to form values and back,
//!   including strict `YYYY-MM-DD` dates and "blank clears the field" payloads.
//! - **Validation Schema** ([`schema`]): per-field and cross-field rules,
//!   evaluated in full on every snapshot into an [`schema::ErrorReport`].
//! - **Dirty/Touch Tracker** ([`tracker`]): sticky `changed` and `touched`
//!   flags that decide when an error is shown.
//! - **Submission Assembler** ([`assemble`]): valid snapshot to partial-update
//!   payload.
//! - **Form session** ([`session`]): the `Loading -> Editing -> Submitting ->
//!   Submitted` state machine the host drives with events.
//!
//! ## Example
//!
//! ```no_run
//! use taskform::fields::{FieldName, FieldValue};
//! use taskform::schema::Schema;
//! use taskform::session::FormSession;
//! use taskform::task::{builtin_templates, TaskRecord};
//!
//! # fn fetch() -> TaskRecord { unimplemented!() }
//! let mut session = FormSession::new(Schema::default(), builtin_templates());
//! session.receive_record(&fetch())?;
//! session.set_value(FieldName::Title, FieldValue::Text("Deploy".into()))?;
//! if let Some(error) = session.visible_error(FieldName::EndCondition) {
//!     eprintln!("End condition: {error}");
//! }
//! # Ok::<(), taskform::error::FormError>(())
//! ```

pub mod assemble;
pub mod config;
pub mod error;
pub mod fields;
pub mod mapper;
pub mod schema;
pub mod session;
pub mod task;
pub mod tracker;
