//! Admin routes: user management and clinic-wide oversight.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{paginate, ApiContext, ApiResponse, PageQuery};
use crate::auth;
use crate::db;
use crate::models::enums::{AppointmentStatus, Role};
use crate::models::User;

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Role,
    pub search: Option<String>,
    #[serde(default = "crate::api::types::default_page")]
    pub page: u32,
    #[serde(default = "crate::api::types::default_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct CreateStaffRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub specialization: Option<String>,
    pub department: Option<String>,
    pub qualifications: Option<String>,
    pub license_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentOversightQuery {
    pub status: Option<AppointmentStatus>,
    #[serde(default = "crate::api::types::default_page")]
    pub page: u32,
    #[serde(default = "crate::api::types::default_limit")]
    pub limit: u32,
}

#[derive(Debug, Serialize)]
pub struct ClinicStats {
    pub pending_bookings: i64,
    pub appointments: AppointmentStats,
    pub users: UserStats,
}

#[derive(Debug, Serialize)]
pub struct AppointmentStats {
    pub total: i64,
    pub scheduled: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub no_show: i64,
}

#[derive(Debug, Serialize)]
pub struct UserStats {
    pub patients: i64,
    pub doctors: i64,
    pub triage: i64,
}

/// GET /api/admin/users
pub async fn list_users(
    State(ctx): State<ApiContext>,
    Query(query): Query<UserListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let conn = ctx.db.conn()?;
    let users = db::list_users_by_role(
        &conn,
        query.role,
        query.search.as_deref(),
        page.limit,
        page.offset(),
    )?;
    let total = db::count_users_by_role(&conn, query.role, query.search.as_deref())?;

    let count = users.len();
    Ok(Json(ApiResponse::paginated(
        users,
        count,
        paginate(page.page, page.limit, total),
    )))
}

/// POST /api/admin/users — create a staff account.
pub async fn create_staff(
    State(ctx): State<ApiContext>,
    Json(body): Json<CreateStaffRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !body.role.is_staff() {
        return Err(ApiError::BadRequest(
            "Role must be one of: doctor, triage, admin".into(),
        ));
    }
    if body.name.trim().is_empty() || body.email.trim().is_empty() {
        return Err(ApiError::BadRequest("Name and email are required".into()));
    }
    if body.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }

    let password_hash = auth::hash_password(&body.password)?;
    let conn = ctx.db.conn()?;

    if db::email_exists(&conn, &body.email)? {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let now = Utc::now().naive_utc();
    let user = User {
        id: Uuid::new_v4(),
        name: body.name,
        email: body.email,
        password_hash,
        role: body.role,
        date_of_birth: None,
        gender: None,
        phone_number: None,
        address: None,
        blood_group: None,
        emergency_contact_name: None,
        emergency_contact_number: None,
        specialization: body.specialization,
        department: body.department,
        qualifications: body.qualifications,
        license_number: body.license_number,
        created_at: now,
        updated_at: now,
    };
    db::insert_user(&conn, &user)?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "staff account created");
    Ok((StatusCode::CREATED, Json(ApiResponse::new(user))))
}

/// GET /api/admin/appointments — clinic-wide appointment listing.
pub async fn list_appointments(
    State(ctx): State<ApiContext>,
    Query(query): Query<AppointmentOversightQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let conn = ctx.db.conn()?;
    let appointments =
        db::list_appointments_by_status(&conn, query.status, page.limit, page.offset())?;
    let total = db::count_appointments_by_status(&conn, query.status)?;

    let count = appointments.len();
    Ok(Json(ApiResponse::paginated(
        appointments,
        count,
        paginate(page.page, page.limit, total),
    )))
}

/// GET /api/admin/stats — dashboard counters.
pub async fn stats(State(ctx): State<ApiContext>) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.db.conn()?;
    let stats = ClinicStats {
        pending_bookings: db::count_pending(&conn)?,
        appointments: AppointmentStats {
            total: db::count_appointments_by_status(&conn, None)?,
            scheduled: db::count_appointments_by_status(
                &conn,
                Some(AppointmentStatus::Scheduled),
            )?,
            completed: db::count_appointments_by_status(
                &conn,
                Some(AppointmentStatus::Completed),
            )?,
            cancelled: db::count_appointments_by_status(
                &conn,
                Some(AppointmentStatus::Cancelled),
            )?,
            no_show: db::count_appointments_by_status(
                &conn,
                Some(AppointmentStatus::NoShow),
            )?,
        },
        users: UserStats {
            patients: db::count_users_by_role(&conn, Role::Patient, None)?,
            doctors: db::count_users_by_role(&conn, Role::Doctor, None)?,
            triage: db::count_users_by_role(&conn, Role::Triage, None)?,
        },
    };
    Ok(Json(ApiResponse::new(stats)))
}
