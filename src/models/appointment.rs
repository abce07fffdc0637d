use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use uuid::Uuid;

use super::enums::{AppointmentStatus, Priority};

/// A scheduled clinical encounter, created exactly once from a pending
/// booking by the triage assignment operation. `booking_id` is unique:
/// no booking ever yields two appointments.
#[derive(Debug, Clone, Serialize)]
pub struct Appointment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub priority: Priority,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
