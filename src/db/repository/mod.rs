//! Repository layer — entity-scoped database operations.
//!
//! Free functions over a `rusqlite::Connection`, one sub-module per entity.
//! Conditional updates (claim, cancel, transition) return how they resolved
//! instead of read-then-write, so concurrent callers cannot both win.

mod appointment;
mod booking;
mod medical_history;
mod prescription;
mod user;

use uuid::Uuid;

use super::DatabaseError;

pub use appointment::*;
pub use booking::*;
pub use medical_history::*;
pub use prescription::*;
pub use user::*;

pub(crate) fn parse_uuid(field: &str, s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|_| DatabaseError::InvalidValue {
        field: field.into(),
        value: s.into(),
    })
}

pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    field: &str,
    s: &str,
) -> Result<T, DatabaseError> {
    serde_json::from_str(s).map_err(|_| DatabaseError::InvalidValue {
        field: field.into(),
        value: s.into(),
    })
}
