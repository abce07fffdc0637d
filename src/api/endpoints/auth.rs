//! Registration, login, and the current-user lookup.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse};
use crate::auth::{self, AuthUser};
use crate::db;
use crate::models::enums::{Gender, Role};
use crate::models::User;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub blood_group: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthData {
    pub token: String,
    pub user: User,
}

/// POST /api/auth/register — self-service signup, always a patient.
/// Staff accounts are created through the admin routes.
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
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
        role: Role::Patient,
        date_of_birth: body.date_of_birth,
        gender: body.gender,
        phone_number: body.phone_number,
        address: body.address,
        blood_group: body.blood_group,
        emergency_contact_name: body.emergency_contact_name,
        emergency_contact_number: body.emergency_contact_number,
        specialization: None,
        department: None,
        qualifications: None,
        license_number: None,
        created_at: now,
        updated_at: now,
    };
    db::insert_user(&conn, &user)?;

    let token = ctx.tokens.issue(user.id, user.role)?;
    tracing::info!(user_id = %user.id, "patient registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(AuthData { token, user })),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.db.conn()?;

    // Same error for unknown email and wrong password
    let user = db::get_user_by_email(&conn, &body.email)?
        .ok_or_else(|| ApiError::BadRequest("Invalid email or password".into()))?;
    if !auth::verify_password(&body.password, &user.password_hash)? {
        return Err(ApiError::BadRequest("Invalid email or password".into()));
    }

    let token = ctx.tokens.issue(user.id, user.role)?;
    tracing::info!(user_id = %user.id, role = user.role.as_str(), "login");

    Ok(Json(ApiResponse::new(AuthData { token, user })))
}

/// GET /api/auth/me — profile of the authenticated caller.
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.db.conn()?;
    let user = db::get_user(&conn, &user.id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(ApiResponse::new(user)))
}
