//! The aggregate Swagger 2.0 document.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use plinth_core::{AppConfig, INTERNAL_NAME};

use crate::error::SwaggerResult;
use crate::fragment::{self, Fragment};

/// Operations of one URI keyed by lower-case HTTP method.
pub type PathItem = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub version: String,
    pub title: String,
    pub license: License,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwaggerDocument {
    pub swagger: String,
    pub info: Info,
    pub host: String,
    pub base_path: String,
    pub schemes: Vec<String>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub paths: BTreeMap<String, PathItem>,
    pub definitions: BTreeMap<String, Value>,
}

impl SwaggerDocument {
    /// Base document: no paths, only the response schemas shared by every
    /// module (`Error`, `ServerError`, `Unauthorized`).
    pub fn new(host: impl Into<String>, base_path: impl Into<String>) -> Self {
        Self {
            swagger: "2.0".to_string(),
            info: Info {
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: INTERNAL_NAME.to_string(),
                license: License {
                    name: env!("CARGO_PKG_LICENSE").to_string(),
                },
            },
            host: host.into(),
            base_path: base_path.into(),
            schemes: vec!["http".to_string()],
            consumes: vec!["application/json".to_string()],
            produces: vec!["application/json".to_string()],
            paths: BTreeMap::new(),
            definitions: global_definitions(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.swagger.host.clone(), config.api.base_url.clone())
    }

    /// Discover every fragment under `dir` and merge them in discovery order.
    ///
    /// Returns the number of fragments merged. The first unreadable or
    /// malformed fragment aborts the whole process with an error.
    pub fn initialize(&mut self, dir: &Path) -> SwaggerResult<usize> {
        let files = fragment::discover(dir)?;

        for file in &files {
            let fragment = Fragment::load(file)?;
            tracing::debug!(fragment = %file.display(), "merging swagger fragment");
            self.merge(fragment);
        }

        Ok(files.len())
    }

    /// Merge one fragment into the document.
    ///
    /// Paths are combined per URI: methods new to a URI are added next to the
    /// existing ones, a method already present is replaced. Definitions are
    /// combined per name, the later fragment replacing the earlier schema.
    pub fn merge(&mut self, fragment: Fragment) {
        if let Some(paths) = fragment.paths {
            for (uri, operations) in paths {
                let methods: Vec<&str> = operations.keys().map(String::as_str).collect();
                tracing::info!(
                    "Mounted Swagger path '{uri}' with methods: {}",
                    methods.join(",")
                );
                self.paths.entry(uri).or_default().extend(operations);
            }
        }

        if let Some(definitions) = fragment.definitions {
            let names: Vec<&str> = definitions.keys().map(String::as_str).collect();
            tracing::info!("Mounted Swagger definitions for: {}", names.join(","));
            self.definitions.extend(definitions);
        }
    }
}

fn global_definitions() -> BTreeMap<String, Value> {
    let message_only = || {
        json!({
            "required": ["message"],
            "properties": {
                "message": { "type": "string" }
            }
        })
    };

    BTreeMap::from([
        (
            "Error".to_string(),
            json!({
                "required": ["code", "message"],
                "properties": {
                    "code": { "type": "integer", "format": "int32" },
                    "message": { "type": "string" }
                }
            }),
        ),
        ("ServerError".to_string(), message_only()),
        ("Unauthorized".to_string(), message_only()),
    ])
}
