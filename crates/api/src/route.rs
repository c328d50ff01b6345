//! Route descriptors: the table an application hands to the host.

use std::collections::HashMap;

use axum::handler::Handler;
use axum::routing::{MethodFilter, MethodRouter};
use thiserror::Error;

use plinth_auth::SecurityPolicy;
use plinth_core::RouteMethod;

type Endpoint = Box<dyn FnOnce(MethodFilter) -> MethodRouter + Send>;

/// One application route: `(path, method, handler, policy)`.
///
/// `path` is relative to the API base URL. `method` is kept as written so
/// that a descriptor with an unrecognized method can be skipped when the
/// table is mounted.
pub struct RouteDescriptor {
    path: String,
    method: String,
    policy: SecurityPolicy,
    endpoint: Endpoint,
}

impl RouteDescriptor {
    pub fn new<H, T>(
        path: impl Into<String>,
        method: impl Into<String>,
        handler: H,
        policy: SecurityPolicy,
    ) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self {
            path: path.into(),
            method: method.into(),
            policy,
            endpoint: Box::new(move |filter| axum::routing::on(filter, handler)),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    pub fn recognized_method(&self) -> Option<RouteMethod> {
        RouteMethod::recognize(&self.method)
    }

    pub(crate) fn into_method_router(self, method: RouteMethod) -> MethodRouter {
        (self.endpoint)(method_filter(method))
    }
}

impl core::fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutePathError {
    #[error("route '{0}' has a parameter without a name")]
    UnnamedParameter(String),

    #[error("route '{0}' has a wildcard before its last segment")]
    MisplacedWildcard(String),

    #[error("route '{path}' names parameter '{requested}' where '{existing}' is already registered")]
    ConflictingParameter {
        path: String,
        existing: String,
        requested: String,
    },
}

/// Parameter names already claimed by mounted paths.
///
/// The router needs every path sharing a prefix to use the same name for a
/// parameter in the same position, and every parameter or wildcard to be
/// named; paths are checked here before they reach it.
#[derive(Debug, Default)]
pub(crate) struct PathParams {
    // normalized prefix before the segment -> segment as written (`:id`, `*rest`)
    slots: HashMap<String, String>,
}

impl PathParams {
    pub(crate) fn admit(&mut self, path: &str) -> Result<(), RoutePathError> {
        let segments: Vec<&str> = path.split('/').collect();
        let mut prefix = String::new();
        let mut claimed = Vec::new();

        for (index, segment) in segments.iter().enumerate() {
            if index > 0 {
                prefix.push('/');
            }

            let kind = segment.chars().next();
            if !matches!(kind, Some(':' | '*')) {
                prefix.push_str(segment);
                continue;
            }

            if segment.len() == 1 {
                return Err(RoutePathError::UnnamedParameter(path.to_string()));
            }
            if kind == Some('*') && index + 1 != segments.len() {
                return Err(RoutePathError::MisplacedWildcard(path.to_string()));
            }

            match self.slots.get(&prefix) {
                Some(existing) if existing != segment => {
                    return Err(RoutePathError::ConflictingParameter {
                        path: path.to_string(),
                        existing: existing.clone(),
                        requested: segment.to_string(),
                    });
                }
                Some(_) => {}
                None => claimed.push((prefix.clone(), segment.to_string())),
            }
            prefix.push_str("{}");
        }

        self.slots.extend(claimed);
        Ok(())
    }
}

fn method_filter(method: RouteMethod) -> MethodFilter {
    match method {
        RouteMethod::Get => MethodFilter::GET,
        RouteMethod::Post => MethodFilter::POST,
        RouteMethod::Put => MethodFilter::PUT,
        RouteMethod::Patch => MethodFilter::PATCH,
        RouteMethod::Delete => MethodFilter::DELETE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn noop() {}

    #[test]
    fn method_is_kept_as_written() {
        let route = RouteDescriptor::new("/a", " PATCH ", noop, SecurityPolicy::Public);
        assert_eq!(route.method(), " PATCH ");
        assert_eq!(route.recognized_method(), Some(RouteMethod::Patch));
    }

    #[test]
    fn unknown_and_lower_case_methods_are_not_recognized() {
        for method in ["get", "OPTIONS", "HEAD", "FETCH", ""] {
            let route = RouteDescriptor::new("/a", method, noop, SecurityPolicy::Public);
            assert_eq!(route.recognized_method(), None, "{method:?}");
        }
    }

    #[test]
    fn parameters_must_be_named() {
        let mut params = PathParams::default();
        assert_eq!(
            params.admit("/rest/files/*"),
            Err(RoutePathError::UnnamedParameter("/rest/files/*".to_string()))
        );
        assert_eq!(
            params.admit("/rest/users/:"),
            Err(RoutePathError::UnnamedParameter("/rest/users/:".to_string()))
        );
        assert!(params.admit("/rest/files/*path").is_ok());
    }

    #[test]
    fn wildcards_only_end_a_path() {
        let mut params = PathParams::default();
        assert_eq!(
            params.admit("/rest/files/*path/meta"),
            Err(RoutePathError::MisplacedWildcard("/rest/files/*path/meta".to_string()))
        );
    }

    #[test]
    fn same_slot_must_keep_its_parameter_name() {
        let mut params = PathParams::default();
        params.admit("/rest/users/:id").unwrap();
        params.admit("/rest/users/:id/posts").unwrap();
        params.admit("/rest/users/me").unwrap();

        assert_eq!(
            params.admit("/rest/users/:userId"),
            Err(RoutePathError::ConflictingParameter {
                path: "/rest/users/:userId".to_string(),
                existing: ":id".to_string(),
                requested: ":userId".to_string(),
            })
        );
        assert!(params.admit("/rest/users/:userId/posts").is_err());
        assert!(params.admit("/rest/users/*rest").is_err());
        assert!(params.admit("/rest/orders/:userId").is_ok());
    }

    #[test]
    fn rejected_paths_claim_nothing() {
        let mut params = PathParams::default();
        assert!(params.admit("/rest/a/:x/*").is_err());
        assert!(params.admit("/rest/a/:y").is_ok());
    }

    #[test]
    fn debug_shows_the_route_but_not_the_handler() {
        let route = RouteDescriptor::new("/users", "GET", noop, SecurityPolicy::Authenticated);
        let rendered = format!("{route:?}");
        assert!(rendered.contains("/users"));
        assert!(rendered.contains("Authenticated"));
    }
}
