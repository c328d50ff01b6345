//! Session settings and principal storage.
//!
//! Sessions are handled by `tower-sessions`; the store is chosen by the
//! binary and handed to [`crate::Host::initialize`].

use axum::Router;
use sha2::{Digest, Sha512};
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::{Session, SessionManagerLayer, SessionStore};

use plinth_auth::Principal;
use plinth_core::AppConfig;

/// Session key holding the authenticated [`Principal`].
pub const PRINCIPAL_KEY: &str = "principal";

pub const COOKIE_NAME: &str = "plinth.sid";

#[derive(Clone)]
pub struct SessionSettings {
    pub cookie_secure: bool,
    pub trust_proxy: bool,
    /// Write the session back on every request even when unchanged. The
    /// session layer only saves modified sessions, so this stays `false`.
    pub always_save: bool,
    /// Sessions are only persisted once something is stored in them.
    pub save_uninitialized: bool,
    pub store_url: String,
    key: Key,
}

impl SessionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let production = config.environment.is_production();
        Self {
            cookie_secure: production,
            trust_proxy: production,
            always_save: false,
            save_uninitialized: false,
            store_url: config.session.store_url(),
            key: signing_key(&config.session.secret),
        }
    }

    /// Wrap `router` in a session layer over `store`, signing the cookie
    /// with the configured key.
    pub fn apply<S>(&self, router: Router, store: S) -> Router
    where
        S: SessionStore + Clone,
    {
        router.layer(
            SessionManagerLayer::new(store)
                .with_name(COOKIE_NAME)
                .with_secure(self.cookie_secure)
                .with_http_only(true)
                .with_same_site(SameSite::Lax)
                .with_signed(self.key.clone()),
        )
    }
}

impl core::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("cookie_secure", &self.cookie_secure)
            .field("trust_proxy", &self.trust_proxy)
            .field("always_save", &self.always_save)
            .field("save_uninitialized", &self.save_uninitialized)
            .field("store_url", &self.store_url)
            .finish_non_exhaustive()
    }
}

/// Cookie signing key: SHA-512 of the secret, so any secret length works.
pub fn signing_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

pub async fn load_principal(
    session: &Session,
) -> Result<Option<Principal>, tower_sessions::session::Error> {
    session.get::<Principal>(PRINCIPAL_KEY).await
}

pub async fn store_principal(
    session: &Session,
    principal: &Principal,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(PRINCIPAL_KEY, principal).await
}
