//! `plinth-swagger` — Swagger 2.0 document assembled from per-module fragments.
//!
//! Modules ship their documentation next to their code as `*.swagger.json` /
//! `*.swagger.yaml` files. At startup the host walks a directory, merges every
//! fragment into one [`SwaggerDocument`] and serves it read-only.

pub mod document;
pub mod error;
pub mod fragment;
pub mod http;

pub use document::{Info, License, PathItem, SwaggerDocument};
pub use error::{SwaggerError, SwaggerResult};
pub use fragment::{discover, is_fragment, Fragment};
pub use http::{host, DISCOVER_PATH, SWAGGER_URI_PATH};
