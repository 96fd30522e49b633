//! Audit interception layer
//!
//! Axum middleware that wraps mutating routes and hands one entry per
//! successful request to the [`AuditRecorder`]. Handlers stay free of any
//! audit code: the before-state is fetched through a per-route callback
//! ahead of the handler, the after-state is the JSON body the handler
//! produced.

use crate::contract::{Actor, AuditAction, NewAuditLog};
use crate::domain::AuditRecorder;
use axum::{
    body::{Body, HttpBody},
    extract::{ConnectInfo, FromRequestParts, Path, Request, State},
    http::{header, request::Parts, Method},
    middleware::Next,
    response::Response,
};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

/// Matched route parameters, by name
pub type PathParams = HashMap<String, String>;

/// Derives the audited entity id from the route parameters and the response body
pub type EntityIdFn = Arc<dyn Fn(&PathParams, Option<&Value>) -> Option<String> + Send + Sync>;

/// Loads the entity state before the handler mutates it
pub type SnapshotFn = Arc<dyn Fn(PathParams) -> BoxFuture<'static, Option<Value>> + Send + Sync>;

/// Per-route audit configuration
#[derive(Clone)]
pub struct AuditRoute {
    entity_type: String,
    entity_id: EntityIdFn,
    snapshot: Option<SnapshotFn>,
}

impl AuditRoute {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: Arc::new(default_entity_id),
            snapshot: None,
        }
    }

    pub fn entity_id<F>(mut self, extract: F) -> Self
    where
        F: Fn(&PathParams, Option<&Value>) -> Option<String> + Send + Sync + 'static,
    {
        self.entity_id = Arc::new(extract);
        self
    }

    pub fn snapshot<F, Fut>(mut self, fetch: F) -> Self
    where
        F: Fn(PathParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<Value>> + Send + 'static,
    {
        self.snapshot = Some(Arc::new(move |params| Box::pin(fetch(params))));
        self
    }
}

/// Path parameter `id`, else the `id` field of the response body
pub fn default_entity_id(params: &PathParams, body: Option<&Value>) -> Option<String> {
    params
        .get("id")
        .cloned()
        .or_else(|| body.and_then(|b| b.get("id")).and_then(json_scalar))
}

/// Render a JSON string or number as a plain id
pub fn json_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// HTTP verb to audit action. `None` means the request is not audited.
pub fn action_for(method: &Method) -> Option<AuditAction> {
    match *method {
        Method::POST => Some(AuditAction::Create),
        Method::PUT | Method::PATCH => Some(AuditAction::Update),
        Method::DELETE => Some(AuditAction::Delete),
        _ => None,
    }
}

/// One-shot holder of the entry being built for a request.
///
/// `complete` yields the entry at most once, so a request can never produce
/// a second audit row.
pub struct PendingAudit {
    entry: Mutex<Option<NewAuditLog>>,
}

impl PendingAudit {
    pub fn new(entry: NewAuditLog) -> Self {
        Self {
            entry: Mutex::new(Some(entry)),
        }
    }

    pub fn complete(&self) -> Option<NewAuditLog> {
        self.entry.lock().take()
    }
}

// ===== Mutation middleware =====

#[derive(Clone)]
pub struct AuditLayerState {
    pub route: AuditRoute,
    pub recorder: AuditRecorder,
    pub body_limit: usize,
}

impl AuditLayerState {
    pub fn new(route: AuditRoute, recorder: AuditRecorder, body_limit: usize) -> Self {
        Self {
            route,
            recorder,
            body_limit,
        }
    }
}

/// Middleware for create/update/delete routes
pub async fn audit_mutation(
    State(state): State<AuditLayerState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(action) = action_for(request.method()) else {
        return next.run(request).await;
    };

    let (mut parts, body) = request.into_parts();
    let params = Path::<PathParams>::from_request_parts(&mut parts, &())
        .await
        .map(|Path(params)| params)
        .unwrap_or_default();
    let actor_id = parts.extensions.get::<Actor>().map(|actor| actor.id);
    let (origin_address, origin_agent) = origin(&parts);

    let before_state = match &state.route.snapshot {
        Some(fetch) => fetch(params.clone()).await,
        None => None,
    };

    let pending = PendingAudit::new(
        NewAuditLog::new(action, state.route.entity_type.clone())
            .with_actor(actor_id)
            .with_origin(origin_address, origin_agent),
    );

    let response = next.run(Request::from_parts(parts, body)).await;
    if !response.status().is_success() {
        tracing::debug!(
            status = %response.status(),
            entity_type = %state.route.entity_type,
            "request not successful, skipping audit"
        );
        return response;
    }

    let (response, after_state) = capture_json(response, state.body_limit).await;
    let entity_id = (state.route.entity_id)(&params, after_state.as_ref());

    if let Some(entry) = pending.complete() {
        state.recorder.record(
            entry
                .with_entity_id(entity_id)
                .with_states(before_state, after_state),
        );
    }
    response
}

// ===== Session middleware =====

#[derive(Clone)]
pub struct SessionAuditState {
    pub action: AuditAction,
    /// Body field that must be present and truthy, e.g. `token` or `success`
    pub success_field: String,
    pub recorder: AuditRecorder,
    pub body_limit: usize,
}

impl SessionAuditState {
    pub fn login(recorder: AuditRecorder, body_limit: usize) -> Self {
        Self {
            action: AuditAction::Login,
            success_field: "token".to_string(),
            recorder,
            body_limit,
        }
    }

    pub fn logout(recorder: AuditRecorder, body_limit: usize) -> Self {
        Self {
            action: AuditAction::Logout,
            success_field: "success".to_string(),
            recorder,
            body_limit,
        }
    }
}

/// Middleware for login/logout routes
pub async fn audit_session(
    State(state): State<SessionAuditState>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let actor_id = parts.extensions.get::<Actor>().map(|actor| actor.id);
    let (origin_address, origin_agent) = origin(&parts);
    let pending = PendingAudit::new(
        NewAuditLog::new(state.action, "user").with_origin(origin_address, origin_agent),
    );

    let response = next.run(Request::from_parts(parts, body)).await;
    if !response.status().is_success() {
        return response;
    }

    let (response, body) = capture_json(response, state.body_limit).await;
    let field = state.success_field.as_str();
    let Some(body) = body.filter(|b| b.get(field).is_some_and(is_truthy)) else {
        return response;
    };

    let user = body.get("user").cloned();
    let actor_id = actor_id.or_else(|| {
        user.as_ref()
            .and_then(|u| u.get("id"))
            .and_then(Value::as_i64)
            .and_then(|id| i32::try_from(id).ok())
    });

    if let Some(entry) = pending.complete() {
        state.recorder.record(
            entry
                .with_actor(actor_id)
                .with_entity_id(actor_id.map(|id| id.to_string()))
                .with_states(None, user),
        );
    }
    response
}

// ===== Helpers =====

/// First `X-Forwarded-For` hop, else the socket peer; plus the `User-Agent`
fn origin(parts: &Parts) -> (Option<String>, Option<String>) {
    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    let address = forwarded.or_else(|| {
        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    });
    let agent = parts
        .headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    (address, agent)
}

/// Buffer a bounded response body and parse it as JSON.
///
/// Bodies without a known size within `limit` are passed through untouched.
async fn capture_json(response: Response, limit: usize) -> (Response, Option<Value>) {
    let within_limit = response
        .body()
        .size_hint()
        .upper()
        .is_some_and(|upper| upper <= limit as u64);
    if !within_limit {
        return (response, None);
    }

    let (parts, body) = response.into_parts();
    match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => {
            let value = serde_json::from_slice::<Value>(&bytes).ok();
            (Response::from_parts(parts, Body::from(bytes)), value)
        }
        Err(e) => {
            tracing::error!(
                status = %parts.status,
                error = %e,
                "failed to buffer response body for audit"
            );
            (bodiless(parts), None)
        }
    }
}

/// The handler's response head without its body. The status stands: the
/// operation has already committed.
fn bodiless(mut parts: axum::http::response::Parts) -> Response {
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::empty())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn verbs_map_to_actions() {
        assert_eq!(action_for(&Method::POST), Some(AuditAction::Create));
        assert_eq!(action_for(&Method::PUT), Some(AuditAction::Update));
        assert_eq!(action_for(&Method::PATCH), Some(AuditAction::Update));
        assert_eq!(action_for(&Method::DELETE), Some(AuditAction::Delete));
        assert_eq!(action_for(&Method::GET), None);
        assert_eq!(action_for(&Method::HEAD), None);
    }

    #[test]
    fn lost_body_keeps_committed_status() {
        let response = Response::builder()
            .status(StatusCode::CREATED)
            .header(header::CONTENT_LENGTH, "42")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::empty())
            .unwrap();
        let (parts, _) = response.into_parts();

        let response = bodiless(parts);
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn pending_audit_completes_once() {
        let pending = PendingAudit::new(NewAuditLog::new(AuditAction::Create, "class"));
        assert!(pending.complete().is_some());
        assert!(pending.complete().is_none());
    }

    #[test]
    fn default_entity_id_prefers_path_param() {
        let mut params = PathParams::new();
        params.insert("id".to_string(), "12".to_string());
        let body = json!({ "id": 99 });

        assert_eq!(default_entity_id(&params, Some(&body)).as_deref(), Some("12"));
        assert_eq!(
            default_entity_id(&PathParams::new(), Some(&body)).as_deref(),
            Some("99")
        );
        assert_eq!(default_entity_id(&PathParams::new(), None), None);
    }

    #[test]
    fn truthiness_follows_json_values() {
        assert!(is_truthy(&json!("abc")));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&Value::Null));
    }

    #[test]
    fn origin_prefers_first_forwarded_hop() {
        let request = axum::http::Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header(header::USER_AGENT, "curl/8.0")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();

        let (address, agent) = origin(&parts);
        assert_eq!(address.as_deref(), Some("203.0.113.7"));
        assert_eq!(agent.as_deref(), Some("curl/8.0"));
    }

    #[test]
    fn origin_falls_back_to_peer_address() {
        let mut request = axum::http::Request::builder().body(()).unwrap();
        let peer: SocketAddr = "192.0.2.4:5555".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        let (parts, _) = request.into_parts();

        let (address, agent) = origin(&parts);
        assert_eq!(address.as_deref(), Some("192.0.2.4"));
        assert_eq!(agent, None);
    }
}
