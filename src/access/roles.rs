use super::PermissionChecker;
use async_trait::async_trait;
use std::collections::HashSet;

/// A fixed set of granted roles, e.g. the roles of the current caller.
#[derive(Debug, Clone, Default)]
pub struct StaticRoles {
    roles: HashSet<String>,
}

impl StaticRoles {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Grants no roles; every gated profile is denied.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionChecker for StaticRoles {
    async fn can_access(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}
