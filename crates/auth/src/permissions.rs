use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier, dot-separated (e.g. `"docs.read"`).
///
/// Two wildcard forms are understood when a permission is *held*:
/// `"*"` grants everything and `"docs.*"` grants every permission under the
/// `docs.` prefix. A required permission is always matched literally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }

    /// Whether holding `self` satisfies a requirement for `required`.
    pub fn grants(&self, required: &Permission) -> bool {
        if self.is_wildcard() || self == required {
            return true;
        }

        match self.as_str().strip_suffix(".*") {
            Some(prefix) => required
                .as_str()
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('.') && rest.len() > 1),
            None => false,
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_grants_everything() {
        assert!(Permission::WILDCARD.grants(&Permission::new("docs.read")));
    }

    #[test]
    fn prefix_wildcard_grants_nested_permissions_only() {
        let held = Permission::new("docs.*");
        assert!(held.grants(&Permission::new("docs.read")));
        assert!(held.grants(&Permission::new("docs.pages.write")));
        assert!(!held.grants(&Permission::new("docs")));
        assert!(!held.grants(&Permission::new("docsx.read")));
        assert!(!held.grants(&Permission::new("users.read")));
    }

    #[test]
    fn exact_match_grants() {
        let held = Permission::new("users.read");
        assert!(held.grants(&Permission::new("users.read")));
        assert!(!held.grants(&Permission::new("users.write")));
    }
}
