//! Bearer token authentication and role gates.
//!
//! `require_auth` extracts `Authorization: Bearer <token>`, verifies it,
//! and injects `AuthUser` into request extensions. The role gates run
//! after it and reject callers whose role does not match the route group.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::AuthUser;
use crate::models::enums::Role;

/// Require a valid bearer token.
///
/// Accesses `ApiContext` from request extensions (injected by the
/// Extension layer). On success, injects `AuthUser` for handlers.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let claims = ctx.tokens.verify(token)?;

    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        role: claims.role,
    });
    Ok(next.run(req).await)
}

async fn require_role(
    req: Request<axum::body::Body>,
    next: Next,
    role: Role,
    denial: &str,
) -> Response {
    let Some(user) = req.extensions().get::<AuthUser>().copied() else {
        return ApiError::Unauthorized.into_response();
    };
    if user.role != role {
        tracing::warn!(user_id = %user.id, actual = user.role.as_str(), "role gate denied");
        return ApiError::Forbidden(denial.into()).into_response();
    }
    next.run(req).await
}

pub async fn require_patient(req: Request<axum::body::Body>, next: Next) -> Response {
    require_role(req, next, Role::Patient, "Patients only").await
}

pub async fn require_triage(req: Request<axum::body::Body>, next: Next) -> Response {
    require_role(req, next, Role::Triage, "Triage staff only").await
}

pub async fn require_doctor(req: Request<axum::body::Body>, next: Next) -> Response {
    require_role(req, next, Role::Doctor, "Doctors only").await
}

pub async fn require_admin(req: Request<axum::body::Body>, next: Next) -> Response {
    require_role(req, next, Role::Admin, "Admins only").await
}
