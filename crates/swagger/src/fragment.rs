//! Documentation fragment discovery and loading.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use walkdir::WalkDir;

use crate::document::PathItem;
use crate::error::{SwaggerError, SwaggerResult};

static FRAGMENT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.swagger\.(json|ya?ml)$").expect("fragment pattern is a valid regex")
});

/// A partial document contributed by one module.
///
/// Both sections are optional; a fragment may document only schemas or
/// only paths.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Fragment {
    #[serde(default)]
    pub paths: Option<BTreeMap<String, PathItem>>,

    #[serde(default)]
    pub definitions: Option<BTreeMap<String, Value>>,
}

impl Fragment {
    /// Load a fragment, choosing JSON or YAML by extension.
    pub fn load(path: &Path) -> SwaggerResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| SwaggerError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let parse_error = |message: String| SwaggerError::Parse {
            path: path.to_path_buf(),
            message,
        };

        if is_yaml(path) {
            serde_yaml::from_str(&raw).map_err(|e| parse_error(e.to_string()))
        } else {
            serde_json::from_str(&raw).map_err(|e| parse_error(e.to_string()))
        }
    }
}

/// Whether a file name follows the fragment naming convention.
pub fn is_fragment(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| FRAGMENT_NAME.is_match(name))
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Recursively collect every fragment under `root`.
///
/// Entries are visited in file-name order so the merge order, and therefore
/// which definition wins a name clash, does not depend on the filesystem.
pub fn discover(root: &Path) -> SwaggerResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| SwaggerError::Walk {
            path: root.to_path_buf(),
            source,
        })?;

        if entry.file_type().is_file() && is_fragment(entry.path()) {
            files.push(entry.into_path());
        }
    }

    tracing::debug!(root = %root.display(), count = files.len(), "discovered swagger fragments");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn fragment_names_are_matched_case_insensitively() {
        assert!(is_fragment(Path::new("users/users.swagger.json")));
        assert!(is_fragment(Path::new("Users.Swagger.JSON")));
        assert!(is_fragment(Path::new("docs/a.swagger.yaml")));
        assert!(is_fragment(Path::new("docs/a.swagger.yml")));

        assert!(!is_fragment(Path::new("users.json")));
        assert!(!is_fragment(Path::new("users.swagger.json.bak")));
        assert!(!is_fragment(Path::new("swagger.json")));
    }

    #[test]
    fn discover_walks_nested_directories_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/nested")).unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("b/nested/z.swagger.json"), "{}").unwrap();
        fs::write(dir.path().join("a/y.swagger.yaml"), "{}").unwrap();
        fs::write(dir.path().join("a/readme.md"), "ignored").unwrap();
        fs::write(dir.path().join("root.swagger.json"), "{}").unwrap();

        let found: Vec<PathBuf> = discover(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            found,
            vec![
                PathBuf::from("a/y.swagger.yaml"),
                PathBuf::from("b/nested/z.swagger.json"),
                PathBuf::from("root.swagger.json"),
            ]
        );
    }

    #[test]
    fn discover_fails_for_a_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, SwaggerError::Walk { .. }));
    }

    #[test]
    fn load_reads_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();

        let json = dir.path().join("users.swagger.json");
        fs::write(
            &json,
            r#"{"paths": {"/users": {"get": {"summary": "list"}}}}"#,
        )
        .unwrap();
        let fragment = Fragment::load(&json).unwrap();
        assert!(fragment.paths.unwrap().contains_key("/users"));
        assert!(fragment.definitions.is_none());

        let yaml = dir.path().join("models.swagger.yml");
        fs::write(&yaml, "definitions:\n  User:\n    type: object\n").unwrap();
        let fragment = Fragment::load(&yaml).unwrap();
        assert!(fragment.paths.is_none());
        assert!(fragment.definitions.unwrap().contains_key("User"));
    }

    #[test]
    fn load_rejects_malformed_fragments() {
        let dir = tempfile::tempdir().unwrap();

        let broken = dir.path().join("broken.swagger.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            Fragment::load(&broken).unwrap_err(),
            SwaggerError::Parse { .. }
        ));

        let wrong_shape = dir.path().join("shape.swagger.json");
        fs::write(&wrong_shape, r#"{"paths": {"/users": "get"}}"#).unwrap();
        assert!(matches!(
            Fragment::load(&wrong_shape).unwrap_err(),
            SwaggerError::Parse { .. }
        ));
    }
}
