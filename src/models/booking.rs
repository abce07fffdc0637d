use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use uuid::Uuid;

use super::enums::{BookingStatus, Priority};
use super::user::PatientSummary;

/// A patient's unscheduled care request, awaiting triage.
#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub symptoms: String,
    /// Specialty the patient asked for, if any.
    pub looking_for: Option<String>,
    pub priority: Priority,
    pub preferred_date: Option<NaiveDate>,
    pub preferred_time: Option<String>,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Booking joined with its patient, for the triage review queue.
#[derive(Debug, Clone, Serialize)]
pub struct PendingBooking {
    #[serde(flatten)]
    pub booking: Booking,
    pub patient: PatientSummary,
}
