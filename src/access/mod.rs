//! Role-based access checks for gated profiles
//!
//! Role evaluation belongs to the embedding application; the render service
//! only needs a yes/no answer for a role name.

pub mod mock;
pub mod roles;

pub use mock::MockPermissionChecker;
pub use roles::StaticRoles;

use async_trait::async_trait;

#[async_trait]
pub trait PermissionChecker: Send + Sync {
    async fn can_access(&self, role: &str) -> bool;
}
