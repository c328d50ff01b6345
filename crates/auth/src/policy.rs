//! Security policies attached to route descriptors.

use core::str::FromStr;

use thiserror::Error;

use crate::{Permission, Role};

/// What a request must satisfy before a route handler runs.
///
/// Policies are written as short identifiers in route tables:
///
/// | identifier          | meaning                                   |
/// |---------------------|-------------------------------------------|
/// | `public`            | no check                                  |
/// | `authenticated`     | a principal is present in the session     |
/// | `role:<name>`       | the principal holds the role              |
/// | `permission:<name>` | the principal holds (or is granted) it    |
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SecurityPolicy {
    Public,
    Authenticated,
    Role(Role),
    Permission(Permission),
}

impl SecurityPolicy {
    pub fn role(name: impl Into<String>) -> Self {
        Self::Role(Role::new(name.into()))
    }

    pub fn permission(name: impl Into<String>) -> Self {
        Self::Permission(Permission::new(name.into()))
    }

    /// Public routes are the only ones that never look at the session.
    pub fn requires_principal(&self) -> bool {
        !matches!(self, Self::Public)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyParseError {
    #[error("unknown security policy '{0}'")]
    Unknown(String),

    #[error("security policy '{0}' is missing a name after ':'")]
    MissingName(String),
}

impl FromStr for SecurityPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "public" => return Ok(Self::Public),
            "authenticated" => return Ok(Self::Authenticated),
            _ => {}
        }

        let Some((kind, name)) = s.split_once(':') else {
            return Err(PolicyParseError::Unknown(s.to_string()));
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(PolicyParseError::MissingName(s.to_string()));
        }

        match kind {
            "role" => Ok(Self::role(name)),
            "permission" => Ok(Self::permission(name)),
            _ => Err(PolicyParseError::Unknown(s.to_string())),
        }
    }
}

impl core::fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Public => f.write_str("public"),
            Self::Authenticated => f.write_str("authenticated"),
            Self::Role(role) => write!(f, "role:{role}"),
            Self::Permission(permission) => write!(f, "permission:{permission}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_policy_form() {
        assert_eq!("public".parse::<SecurityPolicy>().unwrap(), SecurityPolicy::Public);
        assert_eq!(
            "authenticated".parse::<SecurityPolicy>().unwrap(),
            SecurityPolicy::Authenticated
        );
        assert_eq!(
            "role:editor".parse::<SecurityPolicy>().unwrap(),
            SecurityPolicy::role("editor")
        );
        assert_eq!(
            "permission:docs.read".parse::<SecurityPolicy>().unwrap(),
            SecurityPolicy::permission("docs.read")
        );
    }

    #[test]
    fn display_is_the_inverse_of_parse() {
        for raw in ["public", "authenticated", "role:editor", "permission:docs.read"] {
            let policy: SecurityPolicy = raw.parse().unwrap();
            assert_eq!(policy.to_string(), raw);
        }
    }

    #[test]
    fn rejects_unknown_and_incomplete_policies() {
        assert_eq!(
            "nobody".parse::<SecurityPolicy>().unwrap_err(),
            PolicyParseError::Unknown("nobody".to_string())
        );
        assert_eq!(
            "group:ops".parse::<SecurityPolicy>().unwrap_err(),
            PolicyParseError::Unknown("group:ops".to_string())
        );
        assert_eq!(
            "role:".parse::<SecurityPolicy>().unwrap_err(),
            PolicyParseError::MissingName("role:".to_string())
        );
    }
}
