use std::collections::HashMap;

use thiserror::Error;

use crate::{Permission, Principal, Role, SecurityPolicy};

static ADMIN_GRANT: Permission = Permission::WILDCARD;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: missing role '{0}'")]
    MissingRole(String),

    #[error("forbidden: missing permission '{0}'")]
    MissingPermission(String),
}

impl AuthzError {
    /// `true` when the caller should authenticate rather than be refused.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }
}

/// Route-level authorization contract.
///
/// The API layer wraps every mounted handler with a check against the route's
/// policy. Implementations must be pure: no IO, no panics.
pub trait RouteSecurity: Send + Sync + 'static {
    fn check(
        &self,
        policy: &SecurityPolicy,
        principal: Option<&Principal>,
    ) -> Result<(), AuthzError>;
}

/// Default [`RouteSecurity`] implementation.
///
/// Effective permissions are the principal's explicit permissions plus
/// whatever its roles are mapped to. The `admin` role is mapped to the
/// wildcard permission and satisfies every role check.
#[derive(Debug, Clone, Default)]
pub struct PolicyGuard {
    role_permissions: HashMap<Role, Vec<Permission>>,
}

impl PolicyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a role to the permissions it confers.
    pub fn grant(mut self, role: Role, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.role_permissions
            .entry(role)
            .or_default()
            .extend(permissions);
        self
    }

    fn effective_permissions<'a>(&'a self, principal: &'a Principal) -> Vec<&'a Permission> {
        let mut perms: Vec<&Permission> = principal.permissions.iter().collect();

        for role in &principal.roles {
            if role.is_admin() {
                perms.push(&ADMIN_GRANT);
            }
            if let Some(granted) = self.role_permissions.get(role) {
                perms.extend(granted);
            }
        }

        perms
    }
}

impl RouteSecurity for PolicyGuard {
    fn check(
        &self,
        policy: &SecurityPolicy,
        principal: Option<&Principal>,
    ) -> Result<(), AuthzError> {
        if !policy.requires_principal() {
            return Ok(());
        }

        let principal = principal.ok_or(AuthzError::Unauthenticated)?;

        match policy {
            SecurityPolicy::Public | SecurityPolicy::Authenticated => Ok(()),
            SecurityPolicy::Role(role) => {
                if principal.has_role(role) {
                    Ok(())
                } else {
                    Err(AuthzError::MissingRole(role.as_str().to_string()))
                }
            }
            SecurityPolicy::Permission(required) => {
                if self
                    .effective_permissions(principal)
                    .iter()
                    .any(|held| held.grants(required))
                {
                    Ok(())
                } else {
                    Err(AuthzError::MissingPermission(required.as_str().to_string()))
                }
            }
        }
    }
}
