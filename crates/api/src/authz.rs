use axum::http::StatusCode;
use axum::response::Response;
use tower_sessions::Session;

use plinth_auth::{Principal, RouteSecurity, SecurityPolicy};

use crate::app::errors::{authz_error_to_response, json_error, session_error_to_response};
use crate::session;

/// Decide whether a request may reach a handler guarded by `policy`.
///
/// Public routes never touch the session. For every other policy the
/// principal is loaded from the session and handed to `security`; the
/// returned principal is the one the handler will see.
pub async fn authorize_request(
    security: &dyn RouteSecurity,
    policy: &SecurityPolicy,
    session: Option<&Session>,
) -> Result<Option<Principal>, Response> {
    let principal = if policy.requires_principal() {
        let Some(session) = session else {
            tracing::error!(%policy, "guarded route reached without a session layer");
            return Err(json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "session_unavailable",
                "sessions are not initialized",
            ));
        };
        session::load_principal(session)
            .await
            .map_err(session_error_to_response)?
    } else {
        None
    };

    if let Err(err) = security.check(policy, principal.as_ref()) {
        tracing::debug!(%policy, error = %err, "request refused");
        return Err(authz_error_to_response(err));
    }

    Ok(principal)
}
