//! Gateway actor resolution
//!
//! Token verification happens upstream. The gateway forwards the verified
//! identity in `X-Actor-Id` / `X-Actor-Role`; this middleware turns them into
//! an [`Actor`] request extension for the audit layer and handlers.

use crate::contract::Actor;
use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

pub async fn resolve_gateway_actor(mut request: Request, next: Next) -> Response {
    if let Some(actor) = actor_from_headers(request.headers()) {
        request.extensions_mut().insert(actor);
    }
    next.run(request).await
}

/// `None` when the id header is missing or not an integer
pub fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let id = headers
        .get(ACTOR_ID_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<i32>()
        .map_err(|e| tracing::warn!(error = %e, "ignoring malformed actor id header"))
        .ok()?;
    let role = headers
        .get(ACTOR_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("staff")
        .to_string();
    Some(Actor { id, role })
}
