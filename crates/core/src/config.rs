//! Process configuration resolved from environment variables.
//!
//! Everything here is computed once at startup into an [`AppConfig`] value that
//! is then passed explicitly to whoever needs it. Resolution is a pure function
//! over a key lookup so it can be exercised without touching the process
//! environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};

pub const EXTERNAL_NAME: &str = "Plinth MicroService";
pub const INTERNAL_NAME: &str = "Plinth MicroService";

/// Prefix every application route is mounted under.
pub const API_BASE_URL: &str = "/rest";

const PRODUCTION_PORT: u16 = 80;
const LOCAL_ORIGINS: [&str; 2] = ["http://localhost", "https://localhost"];
const DEV_SESSION_SECRET: &str = "plinth-insecure-development-secret";

const DEFAULT_STORE_HOST: &str = "localhost:27017";
const DEFAULT_STORE_DATABASE: &str = "plinth";
const DEFAULT_FRAGMENTS_DIR: &str = "swagger";
const DEFAULT_UI_DIR: &str = "swagger_ui";
const DEFAULT_SWAGGER_HOST: &str = "localhost:24601";

// ─────────────────────────────────────────────────────────────────────────────
// Environment
// ─────────────────────────────────────────────────────────────────────────────

/// Deployment environment, selected by `NODE_ENV`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    /// Only the exact value `production` selects production.
    pub fn from_node_env(value: Option<&str>) -> Self {
        match value {
            Some("production") => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
        }
    }
}

/// Output format of the tracing subscriber.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(ConfigError::invalid(
                "LOG_FORMAT",
                format!("expected 'json' or 'pretty', got '{other}'"),
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP surface settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Origins allowed to call the API from a browser.
    pub origins: Vec<String>,
    pub bind_addr: IpAddr,
    /// `0` lets the OS pick a port.
    pub port: u16,
    pub base_url: String,
}

impl ApiConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Allowed origins joined the way they are advertised when the request
    /// origin is not one of them.
    pub fn origins_header(&self) -> String {
        self.origins.join(",")
    }

    pub fn allows_origin(&self, origin: &str) -> bool {
        self.origins.iter().any(|allowed| allowed == origin)
    }
}

/// Session cookie and store settings.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub secret: String,
    /// `true` when no secret was configured and the development default is used.
    pub default_secret: bool,
    pub store_host: String,
    pub database: String,
}

impl SessionConfig {
    /// Connection URL of the external session store.
    pub fn store_url(&self) -> String {
        format!(
            "mongodb://{}/?authSource={}&w=1",
            self.store_host, self.database
        )
    }
}

impl core::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("default_secret", &self.default_secret)
            .field("store_host", &self.store_host)
            .field("database", &self.database)
            .finish()
    }
}

/// Where documentation fragments and the documentation UI live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwaggerConfig {
    pub fragments_dir: PathBuf,
    pub ui_dir: PathBuf,
    /// Host advertised in the generated document.
    pub host: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// AppConfig
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub swagger: SwaggerConfig,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup.
    ///
    /// Production and development differ in three places: the origin list
    /// (development always adds the localhost pair), the port (production is
    /// fixed at 80) and the session secret (required in production).
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::from_node_env(lookup("NODE_ENV").as_deref());

        let api = ApiConfig {
            origins: resolve_origins(environment, lookup("CORS_ORIGINS").as_deref()),
            bind_addr: match non_empty(lookup("BIND_ADDR")) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|e| ConfigError::invalid("BIND_ADDR", format!("{e}")))?,
                None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            },
            port: resolve_port(environment, lookup("DEV_PORT"))?,
            base_url: API_BASE_URL.to_string(),
        };

        let (secret, default_secret) = match non_empty(lookup("SESSION_SECRET")) {
            Some(secret) => (secret, false),
            None if environment.is_production() => {
                return Err(ConfigError::Missing("SESSION_SECRET"));
            }
            None => (DEV_SESSION_SECRET.to_string(), true),
        };

        let session = SessionConfig {
            secret,
            default_secret,
            store_host: non_empty(lookup("SESSION_STORE_HOST"))
                .unwrap_or_else(|| DEFAULT_STORE_HOST.to_string()),
            database: non_empty(lookup("SESSION_STORE_DATABASE"))
                .unwrap_or_else(|| DEFAULT_STORE_DATABASE.to_string()),
        };

        let swagger = SwaggerConfig {
            fragments_dir: non_empty(lookup("SWAGGER_FRAGMENTS_DIR"))
                .unwrap_or_else(|| DEFAULT_FRAGMENTS_DIR.to_string())
                .into(),
            ui_dir: non_empty(lookup("SWAGGER_UI_DIR"))
                .unwrap_or_else(|| DEFAULT_UI_DIR.to_string())
                .into(),
            host: non_empty(lookup("SWAGGER_HOST"))
                .unwrap_or_else(|| DEFAULT_SWAGGER_HOST.to_string()),
        };

        let log_format = match non_empty(lookup("LOG_FORMAT")) {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            environment,
            api,
            session,
            swagger,
            log_format,
        })
    }

    /// Log the resolved configuration (never the session secret).
    ///
    /// Resolution itself does not log, so this is the first place a
    /// subscriber built from `log_format` sees the configuration.
    pub fn log_config(&self) {
        if self.session.default_secret {
            tracing::warn!("SESSION_SECRET not set; using insecure development default");
        }
        tracing::info!(
            environment = self.environment.as_str(),
            addr = %self.api.socket_addr(),
            origins = ?self.api.origins,
            store_host = %self.session.store_host,
            fragments_dir = %self.swagger.fragments_dir.display(),
            ui_dir = %self.swagger.ui_dir.display(),
            "configuration loaded"
        );
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn resolve_origins(environment: Environment, configured: Option<&str>) -> Vec<String> {
    let mut origins: Vec<String> = configured
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();

    if !environment.is_production() {
        origins.extend(LOCAL_ORIGINS.iter().map(|origin| origin.to_string()));
    }

    origins
}

fn resolve_port(environment: Environment, dev_port: Option<String>) -> ConfigResult<u16> {
    if environment.is_production() {
        return Ok(PRODUCTION_PORT);
    }

    match non_empty(dev_port) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::invalid("DEV_PORT", format!("'{raw}': {e}"))),
        None => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> ConfigResult<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn development_adds_localhost_origins() {
        let cfg = config(&[("CORS_ORIGINS", "https://app.example.com,https://admin.example.com")])
            .unwrap();

        assert_eq!(cfg.environment, Environment::Development);
        assert_eq!(
            cfg.api.origins,
            vec![
                "https://app.example.com",
                "https://admin.example.com",
                "http://localhost",
                "https://localhost",
            ]
        );
    }

    #[test]
    fn production_uses_exactly_the_configured_origins() {
        let cfg = config(&[
            ("NODE_ENV", "production"),
            ("CORS_ORIGINS", "https://app.example.com"),
            ("SESSION_SECRET", "s3cret"),
        ])
        .unwrap();

        assert_eq!(cfg.environment, Environment::Production);
        assert_eq!(cfg.api.origins, vec!["https://app.example.com"]);
    }

    #[test]
    fn development_without_configured_origins_still_allows_localhost() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.api.origins, vec!["http://localhost", "https://localhost"]);
        assert_eq!(cfg.api.origins_header(), "http://localhost,https://localhost");
    }

    #[test]
    fn origin_matching_is_exact() {
        let cfg = config(&[("CORS_ORIGINS", "http://app.test")]).unwrap();
        assert!(cfg.api.allows_origin("http://app.test"));
        assert!(cfg.api.allows_origin("https://localhost"));
        assert!(!cfg.api.allows_origin("http://app.test/"));
        assert!(!cfg.api.allows_origin("http://app.test.evil"));
    }

    #[test]
    fn production_port_is_fixed() {
        let cfg = config(&[
            ("NODE_ENV", "production"),
            ("DEV_PORT", "3000"),
            ("SESSION_SECRET", "s3cret"),
        ])
        .unwrap();
        assert_eq!(cfg.api.port, 80);
    }

    #[test]
    fn development_port_comes_from_dev_port() {
        let cfg = config(&[("DEV_PORT", "3000")]).unwrap();
        assert_eq!(cfg.api.port, 3000);

        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.api.port, 0);
    }

    #[test]
    fn invalid_dev_port_is_rejected() {
        let err = config(&[("DEV_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "DEV_PORT", .. }));
    }

    #[test]
    fn production_requires_a_session_secret() {
        let err = config(&[("NODE_ENV", "production")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("SESSION_SECRET"));
    }

    #[test]
    fn development_falls_back_to_a_flagged_default_secret() {
        let cfg = config(&[]).unwrap();
        assert!(cfg.session.default_secret);
        assert_eq!(cfg.session.secret, DEV_SESSION_SECRET);

        let cfg = config(&[("SESSION_SECRET", "s3cret")]).unwrap();
        assert!(!cfg.session.default_secret);
    }

    #[test]
    fn log_format_is_resolved_once_and_validated() {
        assert_eq!(config(&[]).unwrap().log_format, LogFormat::Json);
        assert_eq!(
            config(&[("LOG_FORMAT", "pretty")]).unwrap().log_format,
            LogFormat::Pretty
        );
        assert!(matches!(
            config(&[("LOG_FORMAT", "xml")]),
            Err(ConfigError::InvalidValue { key: "LOG_FORMAT", .. })
        ));
    }

    #[test]
    fn store_url_carries_auth_source_and_write_concern() {
        let cfg = config(&[
            ("SESSION_STORE_HOST", "db.internal:27017"),
            ("SESSION_STORE_DATABASE", "admin"),
        ])
        .unwrap();
        assert_eq!(
            cfg.session.store_url(),
            "mongodb://db.internal:27017/?authSource=admin&w=1"
        );
    }

    #[test]
    fn debug_output_redacts_the_secret() {
        let cfg = config(&[("SESSION_SECRET", "hunter2")]).unwrap();
        let rendered = format!("{:?}", cfg.session);
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("PRETTY".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    proptest! {
        #[test]
        fn production_origins_never_gain_localhost(
            origins in proptest::collection::vec("https://[a-z]{1,12}\\.example", 0..5)
        ) {
            let joined = origins.join(",");
            let cfg = config(&[
                ("NODE_ENV", "production"),
                ("CORS_ORIGINS", joined.as_str()),
                ("SESSION_SECRET", "s3cret"),
            ])
            .unwrap();
            prop_assert_eq!(cfg.api.origins, origins);
        }

        #[test]
        fn development_origins_always_end_with_localhost_pair(
            origins in proptest::collection::vec("https://[a-z]{1,12}\\.example", 0..5)
        ) {
            let joined = origins.join(",");
            let cfg = config(&[("CORS_ORIGINS", joined.as_str())]).unwrap();
            let n = cfg.api.origins.len();
            prop_assert_eq!(n, origins.len() + 2);
            prop_assert_eq!(&cfg.api.origins[n - 2..], &["http://localhost".to_string(), "https://localhost".to_string()][..]);
        }
    }
}
