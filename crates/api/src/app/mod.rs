//! Application wiring: swagger document, host and route table.
//!
//! - `routes/`: the bundled route table and its handlers
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use thiserror::Error;
use tower_sessions::SessionStore;

use plinth_auth::RouteSecurity;
use plinth_core::AppConfig;
use plinth_swagger::{SwaggerDocument, SwaggerError};

use crate::host::{Host, HostError};
use crate::route::RouteDescriptor;

pub mod errors;
pub mod routes;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Swagger(#[from] SwaggerError),

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Base document merged with every fragment under the configured directory.
pub fn swagger_document(config: &AppConfig) -> Result<SwaggerDocument, SwaggerError> {
    let mut document = SwaggerDocument::from_config(config);
    let merged = document.initialize(&config.swagger.fragments_dir)?;
    tracing::info!(
        fragments = merged,
        dir = %config.swagger.fragments_dir.display(),
        "swagger document assembled"
    );
    Ok(document)
}

/// Build a ready-to-listen host: middleware over `store`, `routes` mounted
/// and the swagger endpoints hosted.
pub fn build_host<S>(
    config: AppConfig,
    security: impl RouteSecurity,
    store: S,
    routes: impl IntoIterator<Item = RouteDescriptor>,
) -> Result<Host, BootstrapError>
where
    S: SessionStore + Clone,
{
    let document = Arc::new(swagger_document(&config)?);
    let ui_dir = config.swagger.ui_dir.clone();

    let mut host = Host::new(config, security);
    host.initialize(store)?;
    let mounted = host.mount_routes(routes);
    host.host_swagger(document, &ui_dir);

    tracing::debug!(routes = mounted, "host assembled");
    Ok(host)
}
