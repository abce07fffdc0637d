//! Triage assignment: converts a pending booking into a scheduled
//! appointment plus a medical-history upsert.
//!
//! All writes run inside one transaction guarded by an atomic claim on the
//! booking row (pending → assigned, conditional on the previous status).
//! Either the claim, the history upsert and the appointment insert all
//! commit, or none do — a retry can never leave a booking `assigned`
//! without an appointment, nor mint a second appointment for one booking.

use chrono::Utc;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::lifecycle::{self, LifecycleError};
use crate::models::enums::{AppointmentStatus, Priority};
use crate::models::{Appointment, MedicalHistory, TriageData};

/// Fallback slot when the patient expressed no time preference.
const DEFAULT_APPOINTMENT_TIME: &str = "09:00";

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Booking not found")]
    BookingNotFound,

    #[error("Booking already processed")]
    AlreadyProcessed,

    #[error("Invalid doctor selection")]
    InvalidDoctor,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<LifecycleError> for TriageError {
    fn from(_: LifecycleError) -> Self {
        TriageError::AlreadyProcessed
    }
}

/// Triage staff input for processing one booking.
#[derive(Debug)]
pub struct TriageRequest {
    pub doctor_id: Uuid,
    pub vitals: Option<serde_json::Value>,
    pub priority: Priority,
    pub notes: Option<String>,
}

/// Outcome of a successful assignment.
#[derive(Debug)]
pub struct TriageOutcome {
    pub appointment: Appointment,
    pub medical_history: MedicalHistory,
}

/// Assign a doctor to a pending booking.
///
/// Runs as a single transaction: validate booking and doctor, claim the
/// booking, upsert the patient's medical history, insert the appointment.
pub fn process_triage(
    conn: &mut Connection,
    booking_id: &Uuid,
    triage_id: &Uuid,
    request: &TriageRequest,
) -> Result<TriageOutcome, TriageError> {
    let tx = conn.transaction().map_err(DatabaseError::from)?;

    let booking = db::get_booking(&tx, booking_id)?.ok_or(TriageError::BookingNotFound)?;
    lifecycle::require_pending(booking.status)?;

    let doctor = db::get_doctor(&tx, &request.doctor_id)?.ok_or(TriageError::InvalidDoctor)?;

    // The conditional claim is the concurrency guard: if another triage
    // actor got here first, zero rows change and we bail out.
    if !db::claim_booking(&tx, booking_id)? {
        return Err(TriageError::AlreadyProcessed);
    }

    let triage_data = TriageData {
        vitals: request.vitals.clone(),
        triage_id: *triage_id,
        triage_date: Utc::now().naive_utc(),
        priority: request.priority,
        notes: request.notes.clone(),
    };
    db::upsert_triage_data(&tx, &booking.patient_id, &doctor.id, &triage_data)?;

    let now = Utc::now().naive_utc();
    let appointment = Appointment {
        id: Uuid::new_v4(),
        booking_id: booking.id,
        patient_id: booking.patient_id,
        doctor_id: doctor.id,
        date: booking.preferred_date.unwrap_or_else(|| now.date()),
        time: booking
            .preferred_time
            .clone()
            .unwrap_or_else(|| DEFAULT_APPOINTMENT_TIME.into()),
        status: AppointmentStatus::Scheduled,
        reason: Some(booking.symptoms.clone()),
        priority: request.priority,
        notes: request.notes.clone(),
        created_at: now,
        updated_at: now,
    };
    db::insert_appointment(&tx, &appointment)?;

    let medical_history = db::get_medical_history(&tx, &booking.patient_id)?
        .ok_or_else(|| DatabaseError::NotFound {
            entity_type: "medical_history".into(),
            id: booking.patient_id.to_string(),
        })?;

    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(
        booking_id = %booking.id,
        doctor_id = %doctor.id,
        patient_id = %booking.patient_id,
        "triage assignment committed"
    );

    Ok(TriageOutcome {
        appointment,
        medical_history,
    })
}
