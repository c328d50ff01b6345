use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use plinth_auth::AuthzError;

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    if err.is_unauthenticated() {
        json_error(StatusCode::UNAUTHORIZED, "unauthorized", err.to_string())
    } else {
        json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
    }
}

pub fn session_error_to_response(err: tower_sessions::session::Error) -> axum::response::Response {
    tracing::error!(error = %err, "session store failure");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "session_error",
        "session could not be loaded",
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;

    async fn body(res: axum::response::Response) -> Value {
        serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn unauthenticated_maps_to_401() {
        let res = authz_error_to_response(AuthzError::Unauthenticated);
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body(res).await["error"], "unauthorized");
    }

    #[tokio::test]
    async fn missing_grants_map_to_403_with_the_reason() {
        let res = authz_error_to_response(AuthzError::MissingRole("editor".into()));
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body = body(res).await;
        assert_eq!(body["error"], "forbidden");
        assert_eq!(body["message"], "forbidden: missing role 'editor'");

        let res = authz_error_to_response(AuthzError::MissingPermission("docs.write".into()));
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
