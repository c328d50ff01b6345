//! The service host: router under construction, installed middleware and
//! the running server.

use std::collections::HashSet;
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    middleware::from_fn_with_state,
    Router,
};
use thiserror::Error;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

use plinth_auth::RouteSecurity;
use plinth_core::{AppConfig, RouteMethod, API_BASE_URL};
use plinth_swagger::SwaggerDocument;

use crate::body::BODY_LIMIT;
use crate::middleware::{self, CorsState, GuardState};
use crate::route::{PathParams, RouteDescriptor};
use crate::session::SessionSettings;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("allowed origins are not a valid header value: {0}")]
    InvalidOrigins(#[from] axum::http::header::InvalidHeaderValue),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("server is already listening on {0}")]
    AlreadyListening(SocketAddr),

    #[error("server failed: {0}")]
    Serve(#[source] io::Error),

    #[error("server task did not finish: {0}")]
    Join(#[from] tokio::task::JoinError),
}

type Stack = Arc<dyn Fn(Router) -> Router + Send + Sync>;

struct Running {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<io::Result<()>>,
}

pub struct Host {
    config: Arc<AppConfig>,
    security: Arc<dyn RouteSecurity>,
    routes: Router,
    mounted: HashSet<(String, RouteMethod)>,
    params: PathParams,
    swagger: Option<Router>,
    middleware: Option<Stack>,
    running: Option<Running>,
}

impl Host {
    pub fn new(config: AppConfig, security: impl RouteSecurity) -> Self {
        Self {
            config: Arc::new(config),
            security: Arc::new(security),
            routes: Router::new(),
            mounted: HashSet::new(),
            params: PathParams::default(),
            swagger: None,
            middleware: None,
            running: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Install sessions over `store`, body limits, CORS headers and request
    /// tracing. Calling it again replaces the previous installation.
    pub fn initialize<S>(&mut self, store: S) -> Result<(), HostError>
    where
        S: SessionStore + Clone,
    {
        let settings = SessionSettings::from_config(&self.config);
        let cors = CorsState::from_config(&self.config.api)?;
        let trust_proxy = settings.trust_proxy;

        tracing::info!(
            environment = self.config.environment.as_str(),
            secure_cookies = settings.cookie_secure,
            trust_proxy,
            always_save = settings.always_save,
            save_uninitialized = settings.save_uninitialized,
            "installing session, body and CORS middleware"
        );

        self.middleware = Some(Arc::new(move |router: Router| {
            settings
                .apply(router.layer(DefaultBodyLimit::max(BODY_LIMIT)), store.clone())
                .layer(from_fn_with_state(cors.clone(), middleware::cors_headers))
                .layer(
                    TraceLayer::new_for_http().make_span_with(move |req: &Request<Body>| {
                        let client = middleware::client_addr(req, trust_proxy).unwrap_or_default();
                        tracing::info_span!(
                            "request",
                            method = %req.method(),
                            uri = %req.uri(),
                            client = %client,
                        )
                    }),
                )
        }));
        Ok(())
    }

    /// Register every descriptor with a recognized method under the API base
    /// URL, wrapped in the security guard for its policy.
    ///
    /// Returns how many routes were mounted. A path and method that is
    /// already mounted keeps its first handler. Paths the router cannot
    /// hold (unnamed parameters, a parameter renamed in a slot another path
    /// already uses) are skipped.
    pub fn mount_routes(&mut self, routes: impl IntoIterator<Item = RouteDescriptor>) -> usize {
        let mut count = 0;

        for route in routes {
            let Some(method) = route.recognized_method() else {
                continue;
            };

            let path = format!("{API_BASE_URL}{}", route.path());
            if let Err(err) = self.params.admit(&path) {
                tracing::warn!(error = %err, "skipping {method} {path}");
                continue;
            }
            if !self.mounted.insert((path.clone(), method)) {
                tracing::warn!("handler for {method} {path} is already mounted; skipping");
                continue;
            }

            let guard = GuardState::new(self.security.clone(), route.policy().clone());
            let endpoint = route
                .into_method_router(method)
                .route_layer(from_fn_with_state(guard, middleware::security_guard));

            self.routes = std::mem::take(&mut self.routes).route(&path, endpoint);
            tracing::info!("mounted handler for: {method} {path}");
            count += 1;
        }

        count
    }

    pub fn host_swagger(&mut self, document: Arc<SwaggerDocument>, ui_dir: &Path) {
        self.swagger = Some(plinth_swagger::host(document, ui_dir));
    }

    /// The application router with every installed layer applied.
    pub fn router(&self) -> Router {
        let mut app = self.routes.clone();
        if let Some(swagger) = &self.swagger {
            app = app.merge(swagger.clone());
        }
        match &self.middleware {
            Some(stack) => stack(app),
            None => app,
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.addr)
    }

    /// Bind the configured address and start serving in the background.
    pub async fn listen(&mut self) -> Result<SocketAddr, HostError> {
        if let Some(addr) = self.local_addr() {
            return Err(HostError::AlreadyListening(addr));
        }

        let addr = self.config.api.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| HostError::Bind { addr, source })?;
        let local = listener
            .local_addr()
            .map_err(|source| HostError::Bind { addr, source })?;

        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();
        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = signal.await;
                })
                .await
        });

        tracing::info!("listening on port: {}.", local.port());
        self.running = Some(Running {
            addr: local,
            shutdown,
            task,
        });
        Ok(local)
    }

    /// Stop accepting connections and wait for in-flight requests.
    /// Does nothing when the server is not running.
    pub async fn close(&mut self) -> Result<(), HostError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        let _ = running.shutdown.send(());
        running.task.await?.map_err(HostError::Serve)?;
        tracing::info!(addr = %running.addr, "server closed");
        Ok(())
    }
}
