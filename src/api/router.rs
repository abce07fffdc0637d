//! API router.
//!
//! Four role-gated route groups plus the open auth routes, all nested
//! under `/api/`. Middleware stack (outermost → innermost):
//! Extension(ApiContext) → require_auth → role gate → handler.
//!
//! Handlers use `State<ApiContext>` (provided via `with_state`);
//! middleware reads `Extension<ApiContext>` injected as the outermost
//! layer.

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

pub fn api_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let open = Router::new()
        .route("/auth/register", post(endpoints::auth::register))
        .route("/auth/login", post(endpoints::auth::login))
        .with_state(ctx.clone())
        .layer(axum::Extension(ctx.clone()));

    // Any authenticated role
    let authed = Router::new()
        .route("/auth/me", get(endpoints::auth::me))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    let patient = Router::new()
        .route("/bookings", post(endpoints::patient::create_booking))
        .route("/bookings", get(endpoints::patient::list_bookings))
        .route(
            "/bookings/:id/cancel",
            put(endpoints::patient::cancel_booking).patch(endpoints::patient::cancel_booking),
        )
        .route("/appointments", get(endpoints::patient::list_appointments))
        .route(
            "/prescriptions",
            get(endpoints::patient::list_prescriptions),
        )
        .route(
            "/medical-history",
            get(endpoints::patient::medical_history),
        )
        .route("/doctors", get(endpoints::patient::list_doctors))
        .route("/dashboard", get(endpoints::patient::dashboard))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_patient))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    let triage = Router::new()
        .route("/bookings", get(endpoints::triage::pending_bookings))
        // Assignment answers on both path shapes
        .route(
            "/process/:booking_id",
            post(endpoints::triage::process_booking),
        )
        .route(
            "/bookings/:id/process",
            post(endpoints::triage::process_booking),
        )
        .route("/doctors", get(endpoints::triage::list_doctors))
        .route("/patients", get(endpoints::triage::list_patients))
        .route(
            "/medical-history/:patient_id",
            put(endpoints::triage::update_medical_history),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_triage))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    let doctor = Router::new()
        .route("/appointments", get(endpoints::doctor::list_appointments))
        .route(
            "/appointments/:id/status",
            put(endpoints::doctor::update_appointment_status)
                .patch(endpoints::doctor::update_appointment_status),
        )
        .route("/patients", get(endpoints::doctor::list_patients))
        .route("/patients/:id", get(endpoints::doctor::patient_details))
        .route(
            "/patients/:id/records",
            get(endpoints::doctor::patient_records),
        )
        .route(
            "/patients/:id/records",
            put(endpoints::doctor::update_patient_records),
        )
        .route(
            "/patients/:id/prescriptions",
            post(endpoints::doctor::add_prescription),
        )
        .route(
            "/prescriptions",
            post(endpoints::doctor::issue_prescription),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_doctor))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    let admin = Router::new()
        .route("/users", get(endpoints::admin::list_users))
        .route("/users", post(endpoints::admin::create_staff))
        .route("/appointments", get(endpoints::admin::list_appointments))
        .route("/stats", get(endpoints::admin::stats))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_admin))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", open)
        .nest("/api", authed)
        .nest("/api/patient", patient)
        .nest("/api/triage", triage)
        .nest("/api/doctor", doctor)
        .nest("/api/admin", admin)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, Utc};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::TokenSigner;
    use crate::db::{self, Db};
    use crate::models::enums::Role;
    use crate::models::User;

    fn test_ctx() -> ApiContext {
        let db = Db::open_in_memory().unwrap();
        let tokens = Arc::new(TokenSigner::new(
            b"router-test-secret".to_vec(),
            Duration::hours(10),
        ));
        ApiContext::new(db, tokens)
    }

    fn seed_user(ctx: &ApiContext, name: &str, role: Role) -> (Uuid, String) {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();
        let conn = ctx.db.conn().unwrap();
        db::insert_user(
            &conn,
            &User {
                id,
                name: name.into(),
                email: format!("{}@clinic.test", name.to_lowercase().replace(' ', ".")),
                password_hash: "$pbkdf2-sha256$seed".into(),
                role,
                date_of_birth: None,
                gender: None,
                phone_number: None,
                address: None,
                blood_group: None,
                emergency_contact_name: None,
                emergency_contact_number: None,
                specialization: None,
                department: None,
                qualifications: None,
                license_number: None,
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
        let token = ctx.tokens.issue(id, role).unwrap();
        (id, token)
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn response_json(response: axum::http::Response<Body>) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 65536).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn send(
        ctx: &ApiContext,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let app = api_router(ctx.clone());
        let response = app.oneshot(request(method, uri, token, body)).await.unwrap();
        let status = response.status();
        (status, response_json(response).await)
    }

    // ── Auth ──

    #[tokio::test]
    async fn register_then_login() {
        let ctx = test_ctx();
        let (status, json) = send(
            &ctx,
            "POST",
            "/api/auth/register",
            None,
            Some(serde_json::json!({
                "name": "Ada Lovelace",
                "email": "ada@clinic.test",
                "password": "correct-horse"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["user"]["role"], "patient");
        assert!(json["data"]["user"].get("password_hash").is_none());
        let token = json["data"]["token"].as_str().unwrap().to_string();

        let (status, json) = send(
            &ctx,
            "POST",
            "/api/auth/login",
            None,
            Some(serde_json::json!({
                "email": "ada@clinic.test",
                "password": "correct-horse"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["data"]["token"].is_string());

        // The registration token works for /auth/me
        let (status, json) = send(&ctx, "GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["email"], "ada@clinic.test");
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let ctx = test_ctx();
        let body = serde_json::json!({
            "name": "Ada",
            "email": "ada@clinic.test",
            "password": "correct-horse"
        });
        let (status, _) = send(&ctx, "POST", "/api/auth/register", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, json) = send(&ctx, "POST", "/api/auth/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn login_wrong_password_rejected() {
        let ctx = test_ctx();
        send(
            &ctx,
            "POST",
            "/api/auth/register",
            None,
            Some(serde_json::json!({
                "name": "Ada",
                "email": "ada@clinic.test",
                "password": "correct-horse"
            })),
        )
        .await;

        let (status, json) = send(
            &ctx,
            "POST",
            "/api/auth/login",
            None,
            Some(serde_json::json!({
                "email": "ada@clinic.test",
                "password": "wrong"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid email or password");
    }

    #[tokio::test]
    async fn short_password_rejected() {
        let ctx = test_ctx();
        let (status, _) = send(
            &ctx,
            "POST",
            "/api/auth/register",
            None,
            Some(serde_json::json!({
                "name": "Ada",
                "email": "ada@clinic.test",
                "password": "short"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // ── Role gates ──

    #[tokio::test]
    async fn protected_routes_require_token() {
        let ctx = test_ctx();
        let app = api_router(ctx);
        let response = app
            .oneshot(request("GET", "/api/patient/bookings", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_role_is_forbidden() {
        let ctx = test_ctx();
        let (_, patient_token) = seed_user(&ctx, "Pat", Role::Patient);

        for uri in [
            "/api/triage/bookings",
            "/api/doctor/appointments",
            "/api/admin/stats",
        ] {
            let (status, json) = send(&ctx, "GET", uri, Some(&patient_token), None).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
            assert_eq!(json["success"], false);
        }
    }

    #[tokio::test]
    async fn garbage_token_rejected() {
        let ctx = test_ctx();
        let (status, _) = send(
            &ctx,
            "GET",
            "/api/patient/bookings",
            Some("not-a-token"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // ── Booking → triage → appointment lifecycle ──

    async fn create_booking(ctx: &ApiContext, token: &str) -> Uuid {
        let (status, json) = send(
            ctx,
            "POST",
            "/api/patient/bookings",
            Some(token),
            Some(serde_json::json!({
                "symptoms": "persistent cough",
                "looking_for": "cardiologist",
                "priority": "high",
                "preferred_date": "2026-09-01",
                "preferred_time": "10:30"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["status"], "pending");
        assert_eq!(json["data"]["looking_for"], "cardiologist");
        json["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn full_care_flow() {
        let ctx = test_ctx();
        let (_patient_id, patient_token) = seed_user(&ctx, "Pat Ient", Role::Patient);
        let (doctor_id, doctor_token) = seed_user(&ctx, "Doc Grey", Role::Doctor);
        let (_, triage_token) = seed_user(&ctx, "Tri Age", Role::Triage);

        let booking_id = create_booking(&ctx, &patient_token).await;

        // Triage sees the booking in the queue
        let (status, json) =
            send(&ctx, "GET", "/api/triage/bookings", Some(&triage_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 1);
        assert_eq!(json["data"][0]["patient"]["name"], "Pat Ient");

        // Assign the doctor
        let (status, json) = send(
            &ctx,
            "POST",
            &format!("/api/triage/bookings/{booking_id}/process"),
            Some(&triage_token),
            Some(serde_json::json!({
                "doctor_id": doctor_id,
                "vitals": {"bp": "120/80", "pulse": 72},
                "priority": "high",
                "notes": "expedite"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["appointment"]["status"], "scheduled");
        assert_eq!(json["data"]["appointment"]["date"], "2026-09-01");
        assert_eq!(json["data"]["appointment"]["time"], "10:30");
        assert_eq!(json["data"]["medical_history"]["triage_data"]["vitals"]["pulse"], 72);
        let appointment_id = json["data"]["appointment"]["id"].as_str().unwrap().to_string();

        // Booking now shows as assigned to the patient
        let (_, json) =
            send(&ctx, "GET", "/api/patient/bookings", Some(&patient_token), None).await;
        assert_eq!(json["data"][0]["status"], "assigned");

        // Doctor sees the appointment on their schedule
        let (_, json) = send(
            &ctx,
            "GET",
            "/api/doctor/appointments?status=scheduled",
            Some(&doctor_token),
            None,
        )
        .await;
        assert_eq!(json["count"], 1);

        // Doctor completes it
        let (status, json) = send(
            &ctx,
            "PUT",
            &format!("/api/doctor/appointments/{appointment_id}/status"),
            Some(&doctor_token),
            Some(serde_json::json!({"status": "completed"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "completed");

        // A second status update conflicts
        let (status, _) = send(
            &ctx,
            "PUT",
            &format!("/api/doctor/appointments/{appointment_id}/status"),
            Some(&doctor_token),
            Some(serde_json::json!({"status": "no-show"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        // Reprocessing the booking conflicts too, on the short path form
        let (status, json) = send(
            &ctx,
            "POST",
            &format!("/api/triage/process/{booking_id}"),
            Some(&triage_token),
            Some(serde_json::json!({"doctor_id": doctor_id, "priority": "low"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["message"], "Invalid or already processed booking");
    }

    #[tokio::test]
    async fn booking_requires_symptoms() {
        let ctx = test_ctx();
        let (_, patient_token) = seed_user(&ctx, "Pat", Role::Patient);
        let (status, _) = send(
            &ctx,
            "POST",
            "/api/patient/bookings",
            Some(&patient_token),
            Some(serde_json::json!({"symptoms": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cancel_booking_then_cancel_again() {
        let ctx = test_ctx();
        let (_, patient_token) = seed_user(&ctx, "Pat", Role::Patient);
        let booking_id = create_booking(&ctx, &patient_token).await;

        let uri = format!("/api/patient/bookings/{booking_id}/cancel");
        let (status, json) = send(&ctx, "PUT", &uri, Some(&patient_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "cancelled");

        let (status, _) = send(&ctx, "PUT", &uri, Some(&patient_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cannot_cancel_another_patients_booking() {
        let ctx = test_ctx();
        let (_, owner_token) = seed_user(&ctx, "Owner", Role::Patient);
        let (_, other_token) = seed_user(&ctx, "Other", Role::Patient);
        let booking_id = create_booking(&ctx, &owner_token).await;

        let (status, _) = send(
            &ctx,
            "PATCH",
            &format!("/api/patient/bookings/{booking_id}/cancel"),
            Some(&other_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn triage_with_invalid_doctor_rejected() {
        let ctx = test_ctx();
        let (_, patient_token) = seed_user(&ctx, "Pat", Role::Patient);
        let (not_doctor, _) = seed_user(&ctx, "Nurse", Role::Triage);
        let (_, triage_token) = seed_user(&ctx, "Tri", Role::Triage);
        let booking_id = create_booking(&ctx, &patient_token).await;

        let (status, _) = send(
            &ctx,
            "POST",
            &format!("/api/triage/bookings/{booking_id}/process"),
            Some(&triage_token),
            Some(serde_json::json!({"doctor_id": not_doctor, "priority": "medium"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_status_target_rejected() {
        let ctx = test_ctx();
        let (_, doctor_token) = seed_user(&ctx, "Doc", Role::Doctor);
        let id = Uuid::new_v4();
        for status_value in ["scheduled", "pending", "done"] {
            let (status, _) = send(
                &ctx,
                "PATCH",
                &format!("/api/doctor/appointments/{id}/status"),
                Some(&doctor_token),
                Some(serde_json::json!({"status": status_value})),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{status_value}");
        }
    }

    // ── Records access and prescriptions ──

    async fn scheduled_appointment(
        ctx: &ApiContext,
        patient_token: &str,
        triage_token: &str,
        doctor_id: Uuid,
    ) -> (Uuid, Uuid) {
        let booking_id = create_booking(ctx, patient_token).await;
        let (status, json) = send(
            ctx,
            "POST",
            &format!("/api/triage/bookings/{booking_id}/process"),
            Some(triage_token),
            Some(serde_json::json!({"doctor_id": doctor_id, "priority": "medium"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let appointment_id = json["data"]["appointment"]["id"].as_str().unwrap().parse().unwrap();
        let patient_id = json["data"]["appointment"]["patient_id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        (appointment_id, patient_id)
    }

    #[tokio::test]
    async fn records_require_treatment_link() {
        let ctx = test_ctx();
        let (_, patient_token) = seed_user(&ctx, "Pat", Role::Patient);
        let (_, triage_token) = seed_user(&ctx, "Tri", Role::Triage);
        let (doctor_id, doctor_token) = seed_user(&ctx, "Doc", Role::Doctor);
        let (_, stranger_token) = seed_user(&ctx, "Stranger", Role::Doctor);

        let (_, patient_id) =
            scheduled_appointment(&ctx, &patient_token, &triage_token, doctor_id).await;

        // Treating doctor can read details and records
        let (status, _) = send(
            &ctx,
            "GET",
            &format!("/api/doctor/patients/{patient_id}"),
            Some(&doctor_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(
            &ctx,
            "GET",
            &format!("/api/doctor/patients/{patient_id}/records"),
            Some(&doctor_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // A doctor with no appointment link cannot
        for uri in [
            format!("/api/doctor/patients/{patient_id}"),
            format!("/api/doctor/patients/{patient_id}/records"),
        ] {
            let (status, _) = send(&ctx, "GET", &uri, Some(&stranger_token), None).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        }
    }

    #[tokio::test]
    async fn records_survive_completed_appointment() {
        let ctx = test_ctx();
        let (_, patient_token) = seed_user(&ctx, "Pat", Role::Patient);
        let (_, triage_token) = seed_user(&ctx, "Tri", Role::Triage);
        let (doctor_id, doctor_token) = seed_user(&ctx, "Doc", Role::Doctor);

        let (appointment_id, patient_id) =
            scheduled_appointment(&ctx, &patient_token, &triage_token, doctor_id).await;
        send(
            &ctx,
            "PATCH",
            &format!("/api/doctor/appointments/{appointment_id}/status"),
            Some(&doctor_token),
            Some(serde_json::json!({"status": "completed"})),
        )
        .await;

        let (status, _) = send(
            &ctx,
            "GET",
            &format!("/api/doctor/patients/{patient_id}/records"),
            Some(&doctor_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn update_records_flows_to_patient_view() {
        let ctx = test_ctx();
        let (_, patient_token) = seed_user(&ctx, "Pat", Role::Patient);
        let (_, triage_token) = seed_user(&ctx, "Tri", Role::Triage);
        let (doctor_id, doctor_token) = seed_user(&ctx, "Doc", Role::Doctor);

        let (_, patient_id) =
            scheduled_appointment(&ctx, &patient_token, &triage_token, doctor_id).await;

        let (status, json) = send(
            &ctx,
            "PUT",
            &format!("/api/doctor/patients/{patient_id}/records"),
            Some(&doctor_token),
            Some(serde_json::json!({
                "allergies": ["penicillin"],
                "diagnosis": "bronchitis",
                "treatment": "rest and fluids"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["diagnosis"], "bronchitis");

        let (status, json) = send(
            &ctx,
            "GET",
            "/api/patient/medical-history",
            Some(&patient_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["allergies"][0], "penicillin");
        // Triage block from assignment is still present
        assert!(json["data"]["triage_data"].is_object());
    }

    #[tokio::test]
    async fn prescription_requires_scheduled_appointment() {
        let ctx = test_ctx();
        let (_, patient_token) = seed_user(&ctx, "Pat", Role::Patient);
        let (_, triage_token) = seed_user(&ctx, "Tri", Role::Triage);
        let (doctor_id, doctor_token) = seed_user(&ctx, "Doc", Role::Doctor);

        let (appointment_id, patient_id) =
            scheduled_appointment(&ctx, &patient_token, &triage_token, doctor_id).await;

        let meds = serde_json::json!({
            "appointment_id": appointment_id,
            "medications": [{
                "name": "Amoxicillin",
                "dosage": "500mg",
                "frequency": "3x daily",
                "duration": "7 days"
            }],
            "diagnosis": "bacterial infection"
        });

        // Issues against the scheduled appointment
        let (status, json) = send(
            &ctx,
            "POST",
            &format!("/api/doctor/patients/{patient_id}/prescriptions"),
            Some(&doctor_token),
            Some(meds.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["is_active"], true);

        // Patient sees it, paginated
        let (status, json) = send(
            &ctx,
            "GET",
            "/api/patient/prescriptions",
            Some(&patient_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 1);
        assert_eq!(json["pagination"]["total"], 1);

        // After completion the appointment no longer qualifies
        send(
            &ctx,
            "PATCH",
            &format!("/api/doctor/appointments/{appointment_id}/status"),
            Some(&doctor_token),
            Some(serde_json::json!({"status": "completed"})),
        )
        .await;
        let (status, _) = send(
            &ctx,
            "POST",
            &format!("/api/doctor/patients/{patient_id}/prescriptions"),
            Some(&doctor_token),
            Some(meds),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn prescription_requires_medications() {
        let ctx = test_ctx();
        let (_, patient_token) = seed_user(&ctx, "Pat", Role::Patient);
        let (_, triage_token) = seed_user(&ctx, "Tri", Role::Triage);
        let (doctor_id, doctor_token) = seed_user(&ctx, "Doc", Role::Doctor);
        let (appointment_id, patient_id) =
            scheduled_appointment(&ctx, &patient_token, &triage_token, doctor_id).await;

        let (status, _) = send(
            &ctx,
            "POST",
            &format!("/api/doctor/patients/{patient_id}/prescriptions"),
            Some(&doctor_token),
            Some(serde_json::json!({
                "appointment_id": appointment_id,
                "medications": []
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn prescription_route_with_patient_in_body() {
        let ctx = test_ctx();
        let (_, patient_token) = seed_user(&ctx, "Pat", Role::Patient);
        let (_, triage_token) = seed_user(&ctx, "Tri", Role::Triage);
        let (doctor_id, doctor_token) = seed_user(&ctx, "Doc", Role::Doctor);
        let (appointment_id, patient_id) =
            scheduled_appointment(&ctx, &patient_token, &triage_token, doctor_id).await;

        let (status, json) = send(
            &ctx,
            "POST",
            "/api/doctor/prescriptions",
            Some(&doctor_token),
            Some(serde_json::json!({
                "patient_id": patient_id,
                "appointment_id": appointment_id,
                "medications": [{
                    "name": "Ibuprofen",
                    "dosage": "200mg",
                    "frequency": "2x daily"
                }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["patient_id"], patient_id.to_string());
        assert_eq!(json["data"]["doctor_id"], doctor_id.to_string());
    }

    // ── Patient dashboard and linked doctors ──

    #[tokio::test]
    async fn patient_sees_linked_doctors() {
        let ctx = test_ctx();
        let (_, patient_token) = seed_user(&ctx, "Pat", Role::Patient);
        let (_, triage_token) = seed_user(&ctx, "Tri", Role::Triage);
        let (doctor_id, _) = seed_user(&ctx, "Doc Grey", Role::Doctor);

        // No links yet
        let (status, json) =
            send(&ctx, "GET", "/api/patient/doctors", Some(&patient_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 0);

        scheduled_appointment(&ctx, &patient_token, &triage_token, doctor_id).await;

        let (_, json) =
            send(&ctx, "GET", "/api/patient/doctors", Some(&patient_token), None).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["data"][0]["name"], "Doc Grey");
    }

    #[tokio::test]
    async fn patient_dashboard_aggregates() {
        let ctx = test_ctx();
        let (_, patient_token) = seed_user(&ctx, "Pat", Role::Patient);
        let (_, triage_token) = seed_user(&ctx, "Tri", Role::Triage);
        let (doctor_id, _) = seed_user(&ctx, "Doc", Role::Doctor);

        // One booking becomes a future appointment, another stays pending
        let future = (Utc::now() + Duration::days(30)).naive_utc().date();
        let (status, json) = send(
            &ctx,
            "POST",
            "/api/patient/bookings",
            Some(&patient_token),
            Some(serde_json::json!({
                "symptoms": "migraine",
                "preferred_date": future.to_string(),
                "preferred_time": "11:00"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let booking_id = json["data"]["id"].as_str().unwrap().to_string();
        let (status, _) = send(
            &ctx,
            "POST",
            &format!("/api/triage/process/{booking_id}"),
            Some(&triage_token),
            Some(serde_json::json!({"doctor_id": doctor_id, "priority": "medium"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        create_booking(&ctx, &patient_token).await;

        let (status, json) =
            send(&ctx, "GET", "/api/patient/dashboard", Some(&patient_token), None).await;
        assert_eq!(status, StatusCode::OK);
        let data = &json["data"];
        assert_eq!(data["upcoming_appointments"].as_array().unwrap().len(), 1);
        assert_eq!(data["pending_bookings"].as_array().unwrap().len(), 1);
        assert_eq!(data["recent_prescriptions"].as_array().unwrap().len(), 0);
        assert_eq!(data["allergies"].as_array().unwrap().len(), 0);
        assert_eq!(data["conditions"].as_array().unwrap().len(), 0);
    }

    // ── Triage queue pagination ──

    #[tokio::test]
    async fn pending_queue_is_paginated_oldest_first() {
        let ctx = test_ctx();
        let (_, patient_token) = seed_user(&ctx, "Pat", Role::Patient);
        let (_, triage_token) = seed_user(&ctx, "Tri", Role::Triage);

        for _ in 0..12 {
            create_booking(&ctx, &patient_token).await;
        }

        let (status, json) = send(
            &ctx,
            "GET",
            "/api/triage/bookings?page=1&limit=10",
            Some(&triage_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 10);
        assert_eq!(json["pagination"]["total"], 12);
        assert_eq!(json["pagination"]["next"]["page"], 2);
        assert!(json["pagination"].get("prev").is_none());

        let (_, json) = send(
            &ctx,
            "GET",
            "/api/triage/bookings?page=2&limit=10",
            Some(&triage_token),
            None,
        )
        .await;
        assert_eq!(json["count"], 2);
        assert!(json["pagination"].get("next").is_none());
        assert_eq!(json["pagination"]["prev"]["page"], 1);
    }

    #[tokio::test]
    async fn triage_patient_roster_is_paginated() {
        let ctx = test_ctx();
        let (_, triage_token) = seed_user(&ctx, "Tri", Role::Triage);
        for name in ["Ada One", "Bob Two", "Cy Three"] {
            seed_user(&ctx, name, Role::Patient);
        }

        let (status, json) = send(
            &ctx,
            "GET",
            "/api/triage/patients?page=1&limit=2",
            Some(&triage_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 2);
        assert_eq!(json["pagination"]["total"], 3);
        assert_eq!(json["data"][0]["name"], "Ada One");
        assert!(json["data"][0].get("password_hash").is_none());

        let (_, json) = send(
            &ctx,
            "GET",
            "/api/triage/patients?page=2&limit=2",
            Some(&triage_token),
            None,
        )
        .await;
        assert_eq!(json["count"], 1);
    }

    #[tokio::test]
    async fn triage_intake_amends_medical_history() {
        let ctx = test_ctx();
        let (patient_id, patient_token) = seed_user(&ctx, "Pat", Role::Patient);
        let (_, triage_token) = seed_user(&ctx, "Tri", Role::Triage);
        let (doctor_id, _) = seed_user(&ctx, "Doc", Role::Doctor);

        let uri = format!("/api/triage/medical-history/{patient_id}");
        let body = serde_json::json!({
            "allergies": ["latex"],
            "family_history": "asthma"
        });

        // No record until a booking has been processed
        let (status, _) = send(&ctx, "PUT", &uri, Some(&triage_token), Some(body.clone())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        scheduled_appointment(&ctx, &patient_token, &triage_token, doctor_id).await;

        let (status, json) = send(&ctx, "PUT", &uri, Some(&triage_token), Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["allergies"][0], "latex");
        assert_eq!(json["data"]["family_history"], "asthma");

        // The intake details reach the patient's own view
        let (_, json) = send(
            &ctx,
            "GET",
            "/api/patient/medical-history",
            Some(&patient_token),
            None,
        )
        .await;
        assert_eq!(json["data"]["allergies"][0], "latex");
    }

    // ── Admin ──

    #[tokio::test]
    async fn admin_creates_staff_and_reads_stats() {
        let ctx = test_ctx();
        let (_, admin_token) = seed_user(&ctx, "Root", Role::Admin);

        let (status, json) = send(
            &ctx,
            "POST",
            "/api/admin/users",
            Some(&admin_token),
            Some(serde_json::json!({
                "name": "Dr New",
                "email": "new@clinic.test",
                "password": "hire-me-please",
                "role": "doctor",
                "specialization": "Cardiology",
                "department": "Cardiology"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["role"], "doctor");

        // Patients cannot be created through this route
        let (status, _) = send(
            &ctx,
            "POST",
            "/api/admin/users",
            Some(&admin_token),
            Some(serde_json::json!({
                "name": "Sneaky",
                "email": "sneaky@clinic.test",
                "password": "hire-me-please",
                "role": "patient"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = send(&ctx, "GET", "/api/admin/stats", Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["users"]["doctors"], 1);

        let (status, json) = send(
            &ctx,
            "GET",
            "/api/admin/users?role=doctor",
            Some(&admin_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 1);
        assert_eq!(json["data"][0]["name"], "Dr New");
    }

    #[tokio::test]
    async fn triage_lists_doctors_by_department() {
        let ctx = test_ctx();
        let (_, admin_token) = seed_user(&ctx, "Root", Role::Admin);
        let (_, triage_token) = seed_user(&ctx, "Tri", Role::Triage);

        for (name, dept) in [("Dr A", "Cardiology"), ("Dr B", "Oncology")] {
            let (status, _) = send(
                &ctx,
                "POST",
                "/api/admin/users",
                Some(&admin_token),
                Some(serde_json::json!({
                    "name": name,
                    "email": format!("{}@clinic.test", name.to_lowercase().replace(' ', ".")),
                    "password": "hire-me-please",
                    "role": "doctor",
                    "department": dept
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, json) = send(
            &ctx,
            "GET",
            "/api/triage/doctors?department=Cardiology",
            Some(&triage_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 1);
        assert_eq!(json["data"][0]["name"], "Dr A");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let ctx = test_ctx();
        let app = api_router(ctx);
        let response = app
            .oneshot(request("GET", "/api/nonexistent", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
