//! Patient-facing routes: bookings, appointments, prescriptions, the
//! patient's own medical history, and the dashboard summary.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{paginate, ApiContext, ApiResponse, PageQuery};
use crate::auth::AuthUser;
use crate::db;
use crate::models::enums::{AppointmentStatus, BookingStatus, Priority};
use crate::models::{Appointment, Booking, DoctorSummary, Prescription};

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub symptoms: String,
    pub looking_for: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    pub preferred_date: Option<NaiveDate>,
    pub preferred_time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentListQuery {
    pub status: Option<AppointmentStatus>,
    /// When true, only appointments from today onwards.
    #[serde(default)]
    pub upcoming: bool,
    pub limit: Option<u32>,
}

/// POST /api/patient/bookings
pub async fn create_booking(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.symptoms.trim().is_empty() {
        return Err(ApiError::BadRequest("Symptoms are required".into()));
    }

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: Uuid::new_v4(),
        patient_id: user.id,
        symptoms: body.symptoms,
        looking_for: body.looking_for,
        priority: body.priority.unwrap_or(Priority::Medium),
        preferred_date: body.preferred_date,
        preferred_time: body.preferred_time,
        status: BookingStatus::Pending,
        notes: body.notes,
        created_at: now,
        updated_at: now,
    };

    let conn = ctx.db.conn()?;
    db::insert_booking(&conn, &booking)?;
    tracing::info!(booking_id = %booking.id, patient_id = %user.id, "booking created");

    Ok((StatusCode::CREATED, Json(ApiResponse::new(booking))))
}

/// GET /api/patient/bookings
pub async fn list_bookings(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<BookingListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.db.conn()?;
    let bookings = db::list_patient_bookings(&conn, &user.id, query.status)?;
    Ok(Json(ApiResponse::list(bookings)))
}

/// PUT /api/patient/bookings/:id/cancel (PATCH also accepted)
///
/// Only the owning patient can cancel, and only while the booking is
/// still pending. Anything else is indistinguishable from a missing
/// booking on purpose.
pub async fn cancel_booking(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.db.conn()?;
    let booking = db::cancel_booking(&conn, &booking_id, &user.id)?.ok_or_else(|| {
        ApiError::NotFound("Booking not found or cannot be cancelled".into())
    })?;
    tracing::info!(booking_id = %booking.id, "booking cancelled");
    Ok(Json(ApiResponse::new(booking)))
}

/// GET /api/patient/appointments
pub async fn list_appointments(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let upcoming_after = query.upcoming.then(|| Utc::now().naive_utc().date());
    let conn = ctx.db.conn()?;
    let appointments = db::list_patient_appointments(
        &conn,
        &user.id,
        query.status,
        upcoming_after,
        query.limit,
    )?;
    Ok(Json(ApiResponse::list(appointments)))
}

/// GET /api/patient/prescriptions
pub async fn list_prescriptions(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.db.conn()?;
    let prescriptions =
        db::list_patient_prescriptions(&conn, &user.id, page.limit, page.offset())?;
    let total = db::count_patient_prescriptions(&conn, &user.id)?;

    let count = prescriptions.len();
    Ok(Json(ApiResponse::paginated(
        prescriptions,
        count,
        paginate(page.page, page.limit, total),
    )))
}

/// GET /api/patient/medical-history
pub async fn medical_history(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.db.conn()?;
    let history = db::get_medical_history(&conn, &user.id)?
        .ok_or_else(|| ApiError::NotFound("No medical history on file".into()))?;
    Ok(Json(ApiResponse::new(history)))
}

/// GET /api/patient/doctors — every doctor this patient has been linked
/// to through the medical history or an appointment.
pub async fn list_doctors(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.db.conn()?;
    let mut doctors = Vec::new();
    for id in db::list_patient_doctor_ids(&conn, &user.id)? {
        if let Some(doctor) = db::get_doctor(&conn, &id)? {
            doctors.push(DoctorSummary {
                id: doctor.id,
                name: doctor.name,
                specialization: doctor.specialization,
                department: doctor.department,
            });
        }
    }
    Ok(Json(ApiResponse::list(doctors)))
}

#[derive(Debug, Serialize)]
pub struct DashboardData {
    pub upcoming_appointments: Vec<Appointment>,
    pub recent_prescriptions: Vec<Prescription>,
    pub pending_bookings: Vec<Booking>,
    pub allergies: Vec<String>,
    pub conditions: Vec<String>,
}

/// GET /api/patient/dashboard — the next three scheduled appointments,
/// latest three prescriptions and pending bookings, plus the allergy
/// and condition lists.
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let today = Utc::now().naive_utc().date();
    let conn = ctx.db.conn()?;

    let upcoming_appointments = db::list_patient_appointments(
        &conn,
        &user.id,
        Some(AppointmentStatus::Scheduled),
        Some(today),
        Some(3),
    )?;
    let recent_prescriptions = db::list_patient_prescriptions(&conn, &user.id, 3, 0)?;
    let mut pending_bookings =
        db::list_patient_bookings(&conn, &user.id, Some(BookingStatus::Pending))?;
    pending_bookings.truncate(3);
    let (allergies, conditions) = db::get_medical_history(&conn, &user.id)?
        .map(|h| (h.allergies, h.chronic_conditions))
        .unwrap_or_default();

    Ok(Json(ApiResponse::new(DashboardData {
        upcoming_appointments,
        recent_prescriptions,
        pending_bookings,
        allergies,
        conditions,
    })))
}
