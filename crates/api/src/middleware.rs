use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN,
        },
        HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use plinth_auth::{RouteSecurity, SecurityPolicy};
use plinth_core::ApiConfig;

use crate::authz::authorize_request;
use crate::context::PrincipalContext;

pub const ALLOWED_METHODS: &str = "GET,PATCH,PUT,POST,DELETE";
pub const ALLOWED_HEADERS: &str = "Content-Type";

// ─────────────────────────────────────────────────────────────────────────────
// Security guard
// ─────────────────────────────────────────────────────────────────────────────

/// Per-route guard state: the shared security implementation and the
/// policy of the route it wraps.
#[derive(Clone)]
pub struct GuardState {
    pub security: Arc<dyn RouteSecurity>,
    pub policy: Arc<SecurityPolicy>,
}

impl GuardState {
    pub fn new(security: Arc<dyn RouteSecurity>, policy: SecurityPolicy) -> Self {
        Self {
            security,
            policy: Arc::new(policy),
        }
    }
}

pub async fn security_guard(
    State(state): State<GuardState>,
    mut req: Request,
    next: Next,
) -> Response {
    let session = req.extensions().get::<Session>().cloned();

    match authorize_request(state.security.as_ref(), &state.policy, session.as_ref()).await {
        Ok(Some(principal)) => {
            req.extensions_mut().insert(PrincipalContext::new(principal));
            next.run(req).await
        }
        Ok(None) => next.run(req).await,
        Err(refused) => refused,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CORS
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct CorsState {
    api: Arc<ApiConfig>,
    fallback: HeaderValue,
}

impl CorsState {
    /// Fails when the joined origin list is not a valid header value.
    pub fn from_config(api: &ApiConfig) -> Result<Self, axum::http::header::InvalidHeaderValue> {
        Ok(Self {
            api: Arc::new(api.clone()),
            fallback: HeaderValue::from_str(&api.origins_header())?,
        })
    }

    fn allow_origin(&self, origin: Option<&HeaderValue>) -> HeaderValue {
        origin
            .filter(|value| {
                value
                    .to_str()
                    .is_ok_and(|origin| self.api.allows_origin(origin))
            })
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Adds the CORS headers to every response and answers preflight requests.
pub async fn cors_headers(State(cors): State<CorsState>, req: Request, next: Next) -> Response {
    let allow_origin = cors.allow_origin(req.headers().get(ORIGIN));

    let mut res = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    let headers = res.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    res
}

// ─────────────────────────────────────────────────────────────────────────────
// Request tracing
// ─────────────────────────────────────────────────────────────────────────────

/// Client address for request logs.
///
/// Behind a trusted proxy this is the first `X-Forwarded-For` entry,
/// otherwise the peer address of the connection.
pub fn client_addr(req: &Request, trust_proxy: bool) -> Option<String> {
    if trust_proxy {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());
        if let Some(client) = forwarded {
            return Some(client.to_string());
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn api(origins: &[&str]) -> ApiConfig {
        ApiConfig {
            origins: origins.iter().map(|o| o.to_string()).collect(),
            bind_addr: [127, 0, 0, 1].into(),
            port: 0,
            base_url: "/rest".to_string(),
        }
    }

    #[test]
    fn allowed_origin_is_echoed_and_others_get_the_list() {
        let cors = CorsState::from_config(&api(&["http://a.test", "http://b.test"])).unwrap();

        let echoed = cors.allow_origin(Some(&HeaderValue::from_static("http://b.test")));
        assert_eq!(echoed, "http://b.test");

        let refused = cors.allow_origin(Some(&HeaderValue::from_static("http://evil.test")));
        assert_eq!(refused, "http://a.test,http://b.test");

        assert_eq!(cors.allow_origin(None), "http://a.test,http://b.test");
    }

    #[test]
    fn origins_that_cannot_be_a_header_are_rejected() {
        assert!(CorsState::from_config(&api(&["http://a.test\n"])).is_err());
    }

    #[test]
    fn forwarded_for_is_used_only_behind_a_trusted_proxy() {
        let mut req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 1], 4000))));

        assert_eq!(client_addr(&req, true).as_deref(), Some("203.0.113.7"));
        assert_eq!(client_addr(&req, false).as_deref(), Some("10.0.0.1"));
    }
}
