//! HTTP host for Plinth services: sessions, CORS, guarded route mounting and
//! the Swagger endpoints.

pub mod app;
pub mod authz;
pub mod body;
pub mod context;
pub mod host;
pub mod middleware;
pub mod route;
pub mod session;

pub use body::ParsedBody;
pub use context::PrincipalContext;
pub use host::{Host, HostError};
pub use route::RouteDescriptor;
pub use session::SessionSettings;
