use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::app::errors::session_error_to_response;
use crate::body::ParsedBody;
use crate::context::PrincipalContext;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    Json(json!({
        "principal_id": principal.principal_id().to_string(),
        "roles": principal.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "permissions": principal.permissions().iter().map(|p| p.as_str()).collect::<Vec<_>>(),
    }))
}

pub async fn echo(body: ParsedBody) -> Json<Value> {
    Json(json!({
        "kind": body.kind(),
        "body": body.into_value(),
    }))
}

/// Drop the session and everything stored in it.
pub async fn logout(session: Session) -> Response {
    match session.flush().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => session_error_to_response(err),
    }
}
