//! `plinth-auth` — route authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and session storage: the
//! API layer loads a [`Principal`] from wherever it lives and asks a
//! [`RouteSecurity`] implementation whether a [`SecurityPolicy`] admits it.

pub mod authorize;
pub mod permissions;
pub mod policy;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, PolicyGuard, RouteSecurity};
pub use permissions::Permission;
pub use policy::{PolicyParseError, SecurityPolicy};
pub use principal::{Principal, PrincipalId};
pub use roles::Role;
