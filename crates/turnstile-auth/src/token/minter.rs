//! Session token issuance

use crate::token::claims::SessionClaims;
use crate::token::key::SigningKey;
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use std::sync::Arc;
use tracing::debug;
use turnstile_core::config::TokenConfig;
use turnstile_core::types::Permission;
use turnstile_core::{Error, Result, DEFAULT_TOKEN_TTL_SECS, TOKEN_ISSUER};
use turnstile_store::{PermissionRepository, UserRepository};

/// Issues session tokens for authenticated users
#[derive(Clone)]
pub struct TokenMinter {
    key: SigningKey,
    ttl_seconds: u64,
    users: Arc<dyn UserRepository>,
    permissions: Arc<dyn PermissionRepository>,
}

impl TokenMinter {
    pub fn new(
        key: SigningKey,
        users: Arc<dyn UserRepository>,
        permissions: Arc<dyn PermissionRepository>,
    ) -> Self {
        Self {
            key,
            ttl_seconds: DEFAULT_TOKEN_TTL_SECS,
            users,
            permissions,
        }
    }

    pub fn from_config(
        config: &TokenConfig,
        users: Arc<dyn UserRepository>,
        permissions: Arc<dyn PermissionRepository>,
    ) -> Result<Self> {
        config.validate()?;
        let key = SigningKey::from_config(config)?;
        Ok(Self::new(key, users, permissions).with_ttl(config.ttl_seconds))
    }

    pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    /// Mint a token for `username`.
    ///
    /// With an organization id the permission held in that organization is
    /// embedded, otherwise the one at the user's leaf organization.
    pub async fn mint(&self, username: &str, organization_id: Option<&str>) -> Result<String> {
        let user = self
            .users
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| Error::UserNotFound(username.to_string()))?;

        let permission = match organization_id.filter(|id| !id.is_empty()) {
            Some(org_id) => self.permissions.get_permission(&user.id, org_id).await?,
            None => self.permissions.get_leaf_org_permission(&user.id).await?,
        }
        .ok_or_else(|| Error::PermissionsNotFound(username.to_string()))?;

        debug!(
            username = %username,
            organization = %permission.organization_id,
            "Minting session token"
        );

        self.sign(permission)
    }

    fn sign(&self, permission: Permission) -> Result<String> {
        let expires_at = i64::try_from(self.ttl_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| {
                Error::TokenSigning(format!(
                    "token lifetime of {} seconds is out of range",
                    self.ttl_seconds
                ))
            })?;

        let claims = SessionClaims {
            iss: TOKEN_ISSUER.to_string(),
            exp: expires_at.timestamp(),
            permissions: Some(permission),
        };

        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &self.key.encoding_key())
            .map_err(|e| Error::TokenSigning(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenValidator;
    use turnstile_core::types::{Organization, Role, User};
    use turnstile_store::MemoryRepository;

    fn minter_with(repo: Arc<MemoryRepository>, key: SigningKey) -> TokenMinter {
        TokenMinter::new(key, repo.clone(), repo)
    }

    fn seeded() -> (Arc<MemoryRepository>, User) {
        let repo = Arc::new(MemoryRepository::new());
        repo.insert_organization(Organization::root("acme", "Acme"));
        repo.insert_organization(Organization::child("acme-it", "Acme IT", "acme"));

        let user = User::new("bob", "Bob", "Jones");
        repo.insert_user(user.clone());
        (repo, user)
    }

    #[tokio::test]
    async fn test_mint_uses_leaf_org_by_default() {
        let (repo, user) = seeded();
        repo.grant_permission(Permission::new(&user.id, "acme").with_role(Role::Reader))
            .unwrap();
        let leaf = Permission::new(&user.id, "acme-it").with_role(Role::TicketAdmin);
        repo.grant_permission(leaf.clone()).unwrap();

        let key = SigningKey::new("test-key").unwrap();
        let token = minter_with(repo, key.clone()).mint("bob", None).await.unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = TokenValidator::new(key).validate(&token).unwrap();
        let now = Utc::now().timestamp();

        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert!((claims.exp - (now + 3600)).abs() <= 5);
        assert_eq!(claims.permissions, Some(leaf));
    }

    #[tokio::test]
    async fn test_mint_empty_org_means_default() {
        let (repo, user) = seeded();
        let leaf = Permission::new(&user.id, "acme-it");
        repo.grant_permission(leaf.clone()).unwrap();

        let key = SigningKey::new("test-key").unwrap();
        let token = minter_with(repo, key.clone()).mint("bob", Some("")).await.unwrap();

        let claims = TokenValidator::new(key).validate(&token).unwrap();
        assert_eq!(claims.permissions, Some(leaf));
    }

    #[tokio::test]
    async fn test_mint_for_specific_org() {
        let (repo, user) = seeded();
        let root = Permission::new(&user.id, "acme").with_role(Role::Admin);
        repo.grant_permission(root.clone()).unwrap();
        repo.grant_permission(Permission::new(&user.id, "acme-it")).unwrap();

        let key = SigningKey::new("test-key").unwrap();
        let token = minter_with(repo, key.clone())
            .mint("bob", Some("acme"))
            .await
            .unwrap();

        let claims = TokenValidator::new(key).validate(&token).unwrap();
        assert_eq!(claims.permissions, Some(root));
    }

    #[tokio::test]
    async fn test_mint_unknown_user() {
        let (repo, _) = seeded();
        let minter = minter_with(repo, SigningKey::new("k").unwrap());

        let err = minter.mint("mallory", None).await.unwrap_err();
        assert!(matches!(err, Error::UserNotFound(name) if name == "mallory"));
    }

    #[tokio::test]
    async fn test_mint_without_permissions() {
        let (repo, _) = seeded();
        let minter = minter_with(repo, SigningKey::new("k").unwrap());

        assert!(matches!(
            minter.mint("bob", None).await,
            Err(Error::PermissionsNotFound(_))
        ));
        assert!(matches!(
            minter.mint("bob", Some("acme")).await,
            Err(Error::PermissionsNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_oversized_ttl_is_an_error() {
        let (repo, user) = seeded();
        repo.grant_permission(Permission::new(&user.id, "acme")).unwrap();

        for ttl in [10_000_000_000_000, i64::MAX as u64, u64::MAX] {
            let minter = minter_with(repo.clone(), SigningKey::new("k").unwrap()).with_ttl(ttl);
            assert!(matches!(
                minter.mint("bob", None).await,
                Err(Error::TokenSigning(_))
            ));
        }

        let config = TokenConfig {
            signing_key: Some("k".to_string()),
            ttl_seconds: 10_000_000_000_000,
            ..Default::default()
        };
        let result = TokenMinter::from_config(&config, repo.clone(), repo);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_custom_ttl() {
        let (repo, user) = seeded();
        repo.grant_permission(Permission::new(&user.id, "acme")).unwrap();

        let key = SigningKey::new("k").unwrap();
        let token = minter_with(repo, key.clone())
            .with_ttl(600)
            .mint("bob", None)
            .await
            .unwrap();

        let claims = TokenValidator::new(key).validate(&token).unwrap();
        assert!((claims.exp - (Utc::now().timestamp() + 600)).abs() <= 5);
    }

    #[tokio::test]
    async fn test_from_config_requires_key() {
        let (repo, _) = seeded();
        let result = TokenMinter::from_config(&TokenConfig::default(), repo.clone(), repo);

        assert!(matches!(result, Err(Error::SigningKeyNotInitialized)));
    }
}
