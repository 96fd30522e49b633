//! Route registration
//!
//! Every mutating route is wrapped by the audit interception layer with its
//! own entity type, entity-id extractor and optional before-state fetcher.

use super::audit::{self, json_scalar, AuditLayerState, AuditRoute, PathParams};
use super::dto::{AttendanceDto, EnrollmentDto};
use super::handlers;
use super::openapi;
use crate::domain::{AuditRecorder, Services};
use axum::{
    middleware,
    routing::{delete, get, post, put, MethodRouter},
    Extension, Router,
};
use serde_json::Value;
use std::sync::Arc;

/// Register all REST routes
pub fn register_routes(router: Router, services: Arc<Services>) -> Router {
    let auditing = Auditing {
        recorder: services.audit.clone(),
        body_limit: services.config.audit_body_limit,
    };

    let enrollment = AuditRoute::new("enrollment").entity_id(enrollment_entity_id);
    let enrollment_with_snapshot = enrollment.clone().snapshot({
        let services = services.clone();
        move |params| enrollment_snapshot(services.clone(), params)
    });
    let attendance = AuditRoute::new("attendance");
    let attendance_with_snapshot = attendance.clone().snapshot({
        let services = services.clone();
        move |params| attendance_snapshot(services.clone(), params)
    });

    router
        // Catalog
        .route(
            "/classes",
            auditing.wrap(post(handlers::create_class), AuditRoute::new("class")),
        )
        .route("/classes", get(handlers::list_classes))
        .route("/classes/{id}", get(handlers::get_class))
        .route("/classes/{id}/seats", get(handlers::class_seats))
        .route("/classes/{id}/enrollments", get(handlers::class_enrollments))
        .route(
            "/students",
            auditing.wrap(post(handlers::create_student), AuditRoute::new("student")),
        )
        .route("/students", get(handlers::list_students))
        .route("/students/{id}", get(handlers::get_student))
        .route("/students/{id}/enrollments", get(handlers::student_enrollments))
        // Enrollments
        .route(
            "/enrollments",
            auditing.wrap(post(handlers::create_enrollment), enrollment),
        )
        .route(
            "/enrollments/{student_id}/{class_id}",
            get(handlers::get_enrollment),
        )
        .route(
            "/enrollments/{student_id}/{class_id}",
            auditing.wrap(
                delete(handlers::delete_enrollment),
                enrollment_with_snapshot.clone(),
            ),
        )
        .route(
            "/enrollments/{student_id}/{class_id}/cancel",
            auditing.wrap(
                post(handlers::cancel_enrollment),
                enrollment_with_snapshot.clone(),
            ),
        )
        .route(
            "/enrollments/{student_id}/{class_id}/transfer",
            auditing.wrap(post(handlers::transfer_enrollment), enrollment_with_snapshot),
        )
        // Attendance
        .route(
            "/attendance",
            auditing.wrap(post(handlers::record_attendance), attendance),
        )
        .route("/attendance", get(handlers::list_attendance))
        .route(
            "/attendance/bulk",
            auditing.wrap(
                post(handlers::record_attendance_bulk),
                AuditRoute::new("attendance").entity_id(class_day_entity_id),
            ),
        )
        .route("/attendance/report", get(handlers::attendance_report))
        .route("/attendance/{id}", get(handlers::get_attendance))
        .route(
            "/attendance/{id}",
            auditing.wrap(
                put(handlers::update_attendance).delete(handlers::delete_attendance),
                attendance_with_snapshot,
            ),
        )
        // Audit trail
        .route("/audit-logs", get(handlers::list_audit_logs))
        .route("/audit-logs/stats", get(handlers::audit_stats))
        .route("/audit-logs/{id}", get(handlers::get_audit_log))
        .route(
            "/audit-logs/actor/{actor_id}",
            get(handlers::audit_logs_by_actor),
        )
        .route(
            "/audit-logs/entity/{entity_type}/{entity_id}",
            get(handlers::audit_logs_by_entity),
        )
        .route("/openapi.json", get(openapi::openapi_json))
        .layer(Extension(services))
}

struct Auditing {
    recorder: AuditRecorder,
    body_limit: usize,
}

impl Auditing {
    fn wrap(&self, method_router: MethodRouter, route: AuditRoute) -> MethodRouter {
        let state = AuditLayerState::new(route, self.recorder.clone(), self.body_limit);
        method_router.layer(middleware::from_fn_with_state(state, audit::audit_mutation))
    }
}

// ===== Entity ids =====

/// `student_id:class_id`, from the response body first so a transfer names
/// its new pair, else from the path
fn enrollment_entity_id(params: &PathParams, body: Option<&Value>) -> Option<String> {
    let from_body = body.and_then(|b| {
        let student = json_scalar(b.get("student_id")?)?;
        let class = json_scalar(b.get("class_id")?)?;
        Some(format!("{student}:{class}"))
    });
    from_body.or_else(|| {
        let student = params.get("student_id")?;
        let class = params.get("class_id")?;
        Some(format!("{student}:{class}"))
    })
}

/// `class_id@date` for a whole class-day
fn class_day_entity_id(_params: &PathParams, body: Option<&Value>) -> Option<String> {
    let body = body?;
    let class = json_scalar(body.get("class_id")?)?;
    let date = json_scalar(body.get("date")?)?;
    Some(format!("{class}@{date}"))
}

// ===== Before-state fetchers =====

async fn enrollment_snapshot(services: Arc<Services>, params: PathParams) -> Option<Value> {
    let student_id = params.get("student_id")?.parse().ok()?;
    let class_id = params.get("class_id")?.parse().ok()?;
    let enrollment = services.enrollments.get(student_id, class_id).await.ok()?;
    serde_json::to_value(EnrollmentDto::from(enrollment)).ok()
}

async fn attendance_snapshot(services: Arc<Services>, params: PathParams) -> Option<Value> {
    let id = params.get("id")?.parse().ok()?;
    let record = services.attendance.get(id).await.ok()?;
    serde_json::to_value(AttendanceDto::from(record)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> PathParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn enrollment_id_prefers_body_pair() {
        let path = params(&[("student_id", "1"), ("class_id", "2")]);
        let body = json!({ "student_id": 1, "class_id": 5 });

        assert_eq!(
            enrollment_entity_id(&path, Some(&body)).as_deref(),
            Some("1:5")
        );
        assert_eq!(enrollment_entity_id(&path, None).as_deref(), Some("1:2"));
        assert_eq!(enrollment_entity_id(&PathParams::new(), None), None);
    }

    #[test]
    fn class_day_id_joins_class_and_date() {
        let body = json!({ "class_id": 3, "date": "2024-05-01", "items": [] });
        assert_eq!(
            class_day_entity_id(&PathParams::new(), Some(&body)).as_deref(),
            Some("3@2024-05-01")
        );
    }
}
