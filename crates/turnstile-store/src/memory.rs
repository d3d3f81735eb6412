//! In-memory repository

use crate::traits::{PermissionRepository, UserRepository};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;
use turnstile_core::types::{Organization, Permission, User};
use turnstile_core::{Error, Result};

#[derive(Default)]
struct Inner {
    /// Keyed by username
    users: HashMap<String, User>,
    organizations: HashMap<String, Organization>,
    /// Keyed by (user_id, organization_id)
    permissions: HashMap<(String, String), Permission>,
}

/// Repository backed by process memory
#[derive(Default)]
pub struct MemoryRepository {
    inner: RwLock<Inner>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user
    pub fn insert_user(&self, user: User) {
        self.inner.write().users.insert(user.username.clone(), user);
    }

    /// Insert or replace an organization
    pub fn insert_organization(&self, organization: Organization) {
        self.inner
            .write()
            .organizations
            .insert(organization.id.clone(), organization);
    }

    /// Insert or replace the permission a user holds in an organization
    pub fn grant_permission(&self, permission: Permission) -> Result<()> {
        let mut inner = self.inner.write();

        if !inner.organizations.contains_key(&permission.organization_id) {
            return Err(Error::Repository(format!(
                "unknown organization {}",
                permission.organization_id
            )));
        }

        inner.permissions.insert(
            (permission.user_id.clone(), permission.organization_id.clone()),
            permission,
        );
        Ok(())
    }

    /// Distance from the root of the hierarchy, None on a broken chain
    fn depth(organizations: &HashMap<String, Organization>, id: &str) -> Option<usize> {
        let mut depth = 0;
        let mut current = organizations.get(id)?;

        while let Some(parent_id) = &current.parent_id {
            // cycle guard
            if depth > organizations.len() {
                return None;
            }
            current = organizations.get(parent_id)?;
            depth += 1;
        }

        Some(depth)
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.inner.read().users.get(username).cloned())
    }
}

#[async_trait]
impl PermissionRepository for MemoryRepository {
    async fn get_permission(
        &self,
        user_id: &str,
        organization_id: &str,
    ) -> Result<Option<Permission>> {
        Ok(self
            .inner
            .read()
            .permissions
            .get(&(user_id.to_string(), organization_id.to_string()))
            .cloned())
    }

    async fn get_leaf_org_permission(&self, user_id: &str) -> Result<Option<Permission>> {
        let inner = self.inner.read();

        let mut best: Option<(usize, &Permission)> = None;
        for ((uid, org_id), permission) in inner.permissions.iter() {
            if uid != user_id {
                continue;
            }

            let Some(depth) = Self::depth(&inner.organizations, org_id) else {
                debug!(organization = %org_id, "Skipping organization with broken hierarchy");
                continue;
            };

            let better = match best {
                None => true,
                Some((best_depth, best_perm)) => {
                    depth > best_depth
                        || (depth == best_depth
                            && permission.organization_id < best_perm.organization_id)
                }
            };

            if better {
                best = Some((depth, permission));
            }
        }

        Ok(best.map(|(_, p)| p.clone()))
    }
}
