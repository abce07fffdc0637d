//! Doctor routes: the schedule, appointment status updates, patient
//! records, and prescription issuance.
//!
//! Every patient-scoped route runs the same access check first: the
//! doctor must hold a scheduled or completed appointment with that
//! patient.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse};
use crate::auth::AuthUser;
use crate::db::{self, MedicalHistoryUpdate};
use crate::lifecycle;
use crate::models::enums::AppointmentStatus;
use crate::models::{Immunization, MedicationItem, Prescription, Surgery};

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordsUpdateRequest {
    pub allergies: Option<Vec<String>>,
    pub chronic_conditions: Option<Vec<String>>,
    pub surgeries: Option<Vec<Surgery>>,
    pub family_history: Option<String>,
    pub immunizations: Option<Vec<Immunization>>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PrescriptionRequest {
    pub appointment_id: Uuid,
    pub medications: Vec<MedicationItem>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
}

/// Same payload with the patient addressed in the body instead of the
/// path.
#[derive(Debug, Deserialize)]
pub struct DirectPrescriptionRequest {
    pub patient_id: Uuid,
    #[serde(flatten)]
    pub prescription: PrescriptionRequest,
}

fn ensure_treats(
    conn: &Connection,
    doctor_id: &Uuid,
    patient_id: &Uuid,
) -> Result<(), ApiError> {
    if db::doctor_treats_patient(conn, doctor_id, patient_id)? {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "No scheduled or completed appointment with this patient".into(),
        ))
    }
}

/// GET /api/doctor/appointments
pub async fn list_appointments(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ScheduleQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.db.conn()?;
    let appointments =
        db::list_doctor_appointments(&conn, &user.id, query.status, query.date)?;
    Ok(Json(ApiResponse::list(appointments)))
}

/// PUT /api/doctor/appointments/:id/status (PATCH also accepted)
///
/// Valid targets are completed, cancelled, and no-show. The update is a
/// conditional write so two racing updates cannot both succeed.
pub async fn update_appointment_status(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target = AppointmentStatus::from_str(&body.status)
        .ok()
        .filter(|s| *s != AppointmentStatus::Scheduled)
        .ok_or_else(|| {
            ApiError::BadRequest(
                "Status must be one of: completed, cancelled, no-show".into(),
            )
        })?;

    let conn = ctx.db.conn()?;
    let current = db::get_appointment(&conn, &appointment_id)?
        .filter(|a| a.doctor_id == user.id)
        .ok_or_else(|| ApiError::NotFound("Appointment not found".into()))?;
    lifecycle::validate_appointment_transition(current.status, target)?;

    // Lost the race against another update
    let updated = db::transition_appointment(&conn, &appointment_id, &user.id, target)?
        .ok_or_else(|| ApiError::Conflict("Appointment already finalized".into()))?;

    tracing::info!(
        appointment_id = %updated.id,
        status = updated.status.as_str(),
        "appointment status updated"
    );
    Ok(Json(ApiResponse::new(updated)))
}

/// GET /api/doctor/patients
pub async fn list_patients(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.db.conn()?;
    let patients = db::list_doctor_patients(&conn, &user.id)?;
    Ok(Json(ApiResponse::list(patients)))
}

/// GET /api/doctor/patients/:id
pub async fn patient_details(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.db.conn()?;
    ensure_treats(&conn, &user.id, &patient_id)?;
    let patient = db::get_user(&conn, &patient_id)?
        .ok_or_else(|| ApiError::NotFound("Patient not found".into()))?;
    Ok(Json(ApiResponse::new(patient)))
}

/// GET /api/doctor/patients/:id/records
pub async fn patient_records(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.db.conn()?;
    ensure_treats(&conn, &user.id, &patient_id)?;
    let history = db::get_medical_history(&conn, &patient_id)?
        .ok_or_else(|| ApiError::NotFound("No medical history on file".into()))?;
    Ok(Json(ApiResponse::new(history)))
}

/// PUT /api/doctor/patients/:id/records — amend list fields, diagnosis,
/// and treatment. Omitted fields are left untouched.
pub async fn update_patient_records(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<Uuid>,
    Json(body): Json<RecordsUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let update = MedicalHistoryUpdate {
        allergies: body.allergies,
        chronic_conditions: body.chronic_conditions,
        surgeries: body.surgeries,
        family_history: body.family_history,
        immunizations: body.immunizations,
        diagnosis: body.diagnosis,
        treatment: body.treatment,
    };

    let conn = ctx.db.conn()?;
    ensure_treats(&conn, &user.id, &patient_id)?;
    let history = db::update_medical_history(&conn, &patient_id, &update)?
        .ok_or_else(|| ApiError::NotFound("No medical history on file".into()))?;

    tracing::info!(patient_id = %patient_id, "medical history updated");
    Ok(Json(ApiResponse::new(history)))
}

/// POST /api/doctor/patients/:id/prescriptions
///
/// Issuance requires a scheduled appointment linking this doctor and
/// patient; completed appointments no longer qualify.
pub async fn add_prescription(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<Uuid>,
    Json(body): Json<PrescriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    issue_prescription_for(&ctx, user, patient_id, body)
}

/// POST /api/doctor/prescriptions — same operation with the patient
/// named in the body.
pub async fn issue_prescription(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<DirectPrescriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    issue_prescription_for(&ctx, user, body.patient_id, body.prescription)
}

fn issue_prescription_for(
    ctx: &ApiContext,
    user: AuthUser,
    patient_id: Uuid,
    body: PrescriptionRequest,
) -> Result<(StatusCode, Json<ApiResponse<Prescription>>), ApiError> {
    if body.medications.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one medication is required".into(),
        ));
    }
    for item in &body.medications {
        if item.name.trim().is_empty()
            || item.dosage.trim().is_empty()
            || item.frequency.trim().is_empty()
        {
            return Err(ApiError::BadRequest(
                "Each medication needs a name, dosage, and frequency".into(),
            ));
        }
    }

    let conn = ctx.db.conn()?;
    let appointment =
        db::get_active_appointment(&conn, &body.appointment_id, &user.id, &patient_id)?
            .ok_or_else(|| {
                ApiError::Forbidden(
                    "No scheduled appointment with this patient".into(),
                )
            })?;

    let prescription = Prescription {
        id: Uuid::new_v4(),
        appointment_id: appointment.id,
        patient_id,
        doctor_id: user.id,
        medications: body.medications,
        diagnosis: body.diagnosis,
        notes: body.notes,
        date: Utc::now().naive_utc(),
        is_active: true,
    };
    db::insert_prescription(&conn, &prescription)?;

    tracing::info!(
        prescription_id = %prescription.id,
        appointment_id = %appointment.id,
        "prescription issued"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::new(prescription))))
}
