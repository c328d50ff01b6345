//! HTTP hosting of the merged document and the documentation UI.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::services::ServeDir;

use crate::document::SwaggerDocument;

pub const SWAGGER_URI_PATH: &str = "/swagger";
pub const DISCOVER_PATH: &str = "/swagger/discover";

/// Router serving the document at `/swagger/discover` and the static UI
/// under `/swagger/`. Directory requests, including `/swagger/` itself,
/// resolve to the directory's `index.html`.
pub fn host(document: Arc<SwaggerDocument>, ui_dir: &Path) -> Router {
    tracing::info!(
        ui_dir = %ui_dir.display(),
        "Mounting '{DISCOVER_PATH}' and '{SWAGGER_URI_PATH}/*'."
    );

    Router::new()
        .route(DISCOVER_PATH, get(discover))
        .with_state(document)
        .nest_service(SWAGGER_URI_PATH, ServeDir::new(ui_dir))
}

async fn discover(State(document): State<Arc<SwaggerDocument>>) -> Response {
    Json(document.as_ref()).into_response()
}
