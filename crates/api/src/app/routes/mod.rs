//! Route table of the bundled service.

use plinth_auth::SecurityPolicy;

use crate::route::RouteDescriptor;

pub mod system;

pub fn routes() -> Vec<RouteDescriptor> {
    vec![
        RouteDescriptor::new("/health", "GET", system::health, SecurityPolicy::Public),
        RouteDescriptor::new("/whoami", "GET", system::whoami, SecurityPolicy::Authenticated),
        RouteDescriptor::new("/echo", "POST", system::echo, SecurityPolicy::Public),
        RouteDescriptor::new("/session", "DELETE", system::logout, SecurityPolicy::Authenticated),
    ]
}
