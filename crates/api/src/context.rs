use plinth_auth::{Permission, Principal, PrincipalId, Role};

/// Principal context for a request (the identity loaded from the session).
///
/// Inserted into request extensions by the security guard for every route
/// whose policy requires a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal.principal_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.principal.roles
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.principal.permissions
    }
}
