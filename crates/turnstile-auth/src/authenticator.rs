//! Directory authentication across an ordered server list
//!
//! Servers are tried one at a time, in configured order:
//! - the first successful bind wins and a session token is minted
//! - a credential rejection stops the loop immediately
//! - any other failure moves on to the next server

use crate::ldap::{BindRequest, DirectoryBinder, DirectoryError, LdapBinder};
use crate::token::TokenMinter;
use std::sync::Arc;
use tracing::{debug, info, warn};
use turnstile_core::config::{DirectoryConfig, TurnstileConfig};
use turnstile_core::types::User;
use turnstile_core::{Error, Result};
use turnstile_store::{PermissionRepository, UserRepository};

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Signed session token
    pub token: String,
    /// Directory groups, empty unless group lookup is configured
    pub groups: Vec<String>,
}

/// Authenticates users against the configured directory servers
pub struct Authenticator {
    config: DirectoryConfig,
    binder: Arc<dyn DirectoryBinder>,
    minter: TokenMinter,
}

impl Authenticator {
    pub fn new(
        config: DirectoryConfig,
        binder: Arc<dyn DirectoryBinder>,
        minter: TokenMinter,
    ) -> Self {
        Self {
            config,
            binder,
            minter,
        }
    }

    /// Authenticator backed by real LDAP servers
    pub fn from_config(
        config: &TurnstileConfig,
        users: Arc<dyn UserRepository>,
        permissions: Arc<dyn PermissionRepository>,
    ) -> Result<Self> {
        let minter = TokenMinter::from_config(&config.token, users, permissions)?;

        Ok(Self::new(
            config.directory.clone(),
            Arc::new(LdapBinder::new()),
            minter,
        ))
    }

    /// Verify `password` for `user` and mint a session token.
    ///
    /// `organization_id` selects the embedded permission; `None` or an
    /// empty id selects the user's leaf organization.
    pub async fn authenticate(
        &self,
        user: &User,
        password: &str,
        organization_id: Option<&str>,
    ) -> Result<Session> {
        if user.username.is_empty() || password.is_empty() {
            return Err(Error::EmptyCredentials);
        }

        let groups = match self.bind_any(user, password).await {
            Ok(groups) => groups,
            Err(e) => {
                warn!("failed login for [{}]: {}", user.username, e);
                return Err(e);
            }
        };

        let token = self.minter.mint(&user.username, organization_id).await?;

        info!(username = %user.username, "User authenticated");
        Ok(Session { token, groups })
    }

    async fn bind_any(&self, user: &User, password: &str) -> Result<Vec<String>> {
        if self.config.servers.is_empty() {
            return Err(Error::NoDirectoryServers);
        }

        let request = BindRequest {
            username: &user.username,
            password,
            first_name: &user.first_name,
            last_name: &user.last_name,
        };

        let mut last_error: Option<DirectoryError> = None;

        for server in &self.config.servers {
            debug!(server = %server, username = %user.username, "Attempting directory bind");

            match self.binder.bind(&self.config, server, &request).await {
                Ok(groups) => {
                    debug!(server = %server, "Directory bind succeeded");
                    return Ok(groups);
                }
                Err(e) if e.is_terminal() => {
                    return Err(Error::InvalidCredentials);
                }
                Err(e) => {
                    warn!(server = %server, "Directory server failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(e) if e.is_connectivity() => Error::DirectoryUnavailable,
            Some(e) => Error::Directory(e.to_string()),
            None => Error::NoDirectoryServers,
        })
    }
}
