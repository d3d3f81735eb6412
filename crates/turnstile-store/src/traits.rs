//! Repository traits
//!
//! Defines the read interface the authentication core needs from the
//! external user and authorization stores.

use async_trait::async_trait;
use turnstile_core::types::{Permission, User};
use turnstile_core::Result;

/// User store
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up a user by exact (case-sensitive) username
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
}

/// Authorization store
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Permission of a user within a specific organization
    async fn get_permission(&self, user_id: &str, organization_id: &str)
        -> Result<Option<Permission>>;

    /// Default permission: the one held at the user's leaf organization
    async fn get_leaf_org_permission(&self, user_id: &str) -> Result<Option<Permission>>;
}
