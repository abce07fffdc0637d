//! Triage-staff routes: the pending queue, doctor and patient lookup,
//! medical history intake, and the assignment operation itself.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{paginate, ApiContext, ApiResponse, PageQuery};
use crate::auth::AuthUser;
use crate::db::{self, MedicalHistoryUpdate};
use crate::models::enums::{Priority, Role};
use crate::models::{Appointment, Immunization, MedicalHistory, Surgery};
use crate::triage::{self, TriageRequest};

#[derive(Debug, Deserialize)]
pub struct ProcessBookingRequest {
    pub doctor_id: Uuid,
    pub vitals: Option<serde_json::Value>,
    pub priority: Priority,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DoctorListQuery {
    pub department: Option<String>,
}

/// Intake fields triage staff may record; diagnosis and treatment stay
/// with the doctor routes.
#[derive(Debug, Deserialize)]
pub struct HistoryIntakeRequest {
    pub allergies: Option<Vec<String>>,
    pub chronic_conditions: Option<Vec<String>>,
    pub surgeries: Option<Vec<Surgery>>,
    pub family_history: Option<String>,
    pub immunizations: Option<Vec<Immunization>>,
}

#[derive(Debug, Serialize)]
pub struct AssignmentData {
    pub appointment: Appointment,
    pub medical_history: MedicalHistory,
}

/// GET /api/triage/bookings — pending bookings with patient details,
/// oldest first.
pub async fn pending_bookings(
    State(ctx): State<ApiContext>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.db.conn()?;
    let bookings = db::list_pending_with_patient(&conn, page.limit, page.offset())?;
    let total = db::count_pending(&conn)?;

    let count = bookings.len();
    Ok(Json(ApiResponse::paginated(
        bookings,
        count,
        paginate(page.page, page.limit, total),
    )))
}

/// GET /api/triage/doctors
pub async fn list_doctors(
    State(ctx): State<ApiContext>,
    Query(query): Query<DoctorListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.db.conn()?;
    let doctors = db::list_doctors(&conn, query.department.as_deref())?;
    Ok(Json(ApiResponse::list(doctors)))
}

/// GET /api/triage/patients
pub async fn list_patients(
    State(ctx): State<ApiContext>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.db.conn()?;
    let patients = db::list_users_by_role(&conn, Role::Patient, None, page.limit, page.offset())?;
    let total = db::count_users_by_role(&conn, Role::Patient, None)?;

    let count = patients.len();
    Ok(Json(ApiResponse::paginated(
        patients,
        count,
        paginate(page.page, page.limit, total),
    )))
}

/// PUT /api/triage/medical-history/:patient_id — record intake details.
///
/// The record itself is created by assignment, so this 404s until the
/// patient has been through triage once.
pub async fn update_medical_history(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<Uuid>,
    Json(body): Json<HistoryIntakeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let update = MedicalHistoryUpdate {
        allergies: body.allergies,
        chronic_conditions: body.chronic_conditions,
        surgeries: body.surgeries,
        family_history: body.family_history,
        immunizations: body.immunizations,
        diagnosis: None,
        treatment: None,
    };

    let conn = ctx.db.conn()?;
    let history = db::update_medical_history(&conn, &patient_id, &update)?.ok_or_else(|| {
        ApiError::NotFound("No medical history on file; process a booking first".into())
    })?;

    tracing::info!(patient_id = %patient_id, "medical history intake recorded");
    Ok(Json(ApiResponse::new(history)))
}

/// POST /api/triage/process/:booking_id — assign a doctor.
/// Also routed as POST /api/triage/bookings/:id/process.
///
/// Runs the whole assignment as one transaction; a booking that was
/// already processed comes back as 409.
pub async fn process_booking(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Path(booking_id): Path<Uuid>,
    Json(body): Json<ProcessBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = TriageRequest {
        doctor_id: body.doctor_id,
        vitals: body.vitals,
        priority: body.priority,
        notes: body.notes,
    };

    let mut conn = ctx.db.conn()?;
    let outcome = triage::process_triage(&mut conn, &booking_id, &user.id, &request)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(AssignmentData {
            appointment: outcome.appointment,
            medical_history: outcome.medical_history,
        })),
    ))
}
