//! LDAP bind implementation
//!
//! Opens an LDAPS connection to one server, binds as
//! `CN=<first> <last>,<base_dn>` and optionally reads the user's group
//! memberships. The connection is unbound before returning on every path.

use crate::ldap::types::*;
use async_trait::async_trait;
use ldap3::{
    ldap_escape, Ldap, LdapConnAsync, LdapConnSettings, LdapError, LdapResult, Scope, SearchEntry,
};
use std::time::Duration;
use tracing::{debug, warn};
use turnstile_core::config::DirectoryConfig;

/// Binds against real directory servers over LDAPS
#[derive(Debug, Clone, Copy, Default)]
pub struct LdapBinder;

impl LdapBinder {
    pub fn new() -> Self {
        Self
    }

    /// LDAPS URL for a configured server
    pub fn server_url(config: &DirectoryConfig, server: &str) -> String {
        format!("ldaps://{}:{}", server, config.tls_port)
    }

    /// Create LDAP connection with proper TLS settings
    async fn create_connection(
        &self,
        config: &DirectoryConfig,
        server: &str,
    ) -> Result<Ldap, DirectoryError> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let settings = LdapConnSettings::new()
            .set_conn_timeout(timeout)
            .set_no_tls_verify(config.skip_tls_verify);

        let url = Self::server_url(config, server);
        debug!("Connecting to LDAP server: {}", url);

        let unreachable = |message: String| DirectoryError::Unreachable {
            server: server.to_string(),
            message,
        };

        // conn_timeout covers the TCP connect only, not the TLS handshake
        let (conn, ldap) =
            tokio::time::timeout(timeout, LdapConnAsync::with_settings(settings, &url))
                .await
                .map_err(|e| unreachable(format!("connection timed out: {}", e)))?
                .map_err(|e| unreachable(e.to_string()))?;

        ldap3::drive!(conn);

        Ok(ldap)
    }

    async fn bind_user(
        &self,
        ldap: &mut Ldap,
        config: &DirectoryConfig,
        server: &str,
        request: &BindRequest<'_>,
    ) -> Result<Vec<String>, DirectoryError> {
        let user_dn = config.user_dn(request.first_name, request.last_name);
        debug!("Binding as: {}", user_dn);

        let result = ldap
            .with_timeout(Duration::from_secs(config.timeout_seconds))
            .simple_bind(&user_dn, request.password)
            .await;

        classify_bind(server, result)?;

        if !config.group_lookup_enabled() {
            return Ok(Vec::new());
        }

        self.get_user_groups(ldap, config, request.username).await
    }

    /// Read group memberships of the bound user
    async fn get_user_groups(
        &self,
        ldap: &mut Ldap,
        config: &DirectoryConfig,
        username: &str,
    ) -> Result<Vec<String>, DirectoryError> {
        let (filter, attribute) = match (
            config.build_group_filter(&ldap_escape(username)),
            config.member_of_attribute.as_deref(),
        ) {
            (Some(f), Some(a)) => (f, a),
            _ => return Ok(Vec::new()),
        };

        debug!("Searching groups with filter: {}", filter);

        let (rs, _res) = ldap
            .search(&config.base_dn, Scope::Subtree, &filter, vec![attribute])
            .await
            .map_err(|e| DirectoryError::GroupLookup(e.to_string()))?
            .success()
            .map_err(|e| DirectoryError::GroupLookup(e.to_string()))?;

        let mut groups = Vec::new();
        for result in rs {
            let entry = SearchEntry::construct(result);
            if let Some(values) = entry.attrs.get(attribute) {
                groups.extend(values.iter().cloned());
            }
        }

        if groups.is_empty() {
            return Err(DirectoryError::NoGroups(username.to_string()));
        }

        debug!("Found {} groups for user", groups.len());
        Ok(groups)
    }
}

/// Map a simple bind result onto the directory outcome.
///
/// rc 49 is the only terminal outcome. Timeouts count as connectivity
/// failures, every other error is retryable on the next server.
fn classify_bind(
    server: &str,
    result: Result<LdapResult, LdapError>,
) -> Result<(), DirectoryError> {
    match result {
        Ok(res) if res.rc == 0 => Ok(()),
        Ok(res) if res.rc == LDAP_INVALID_CREDENTIALS => Err(DirectoryError::InvalidCredentials),
        Ok(res) => Err(DirectoryError::BindFailed {
            server: server.to_string(),
            message: format!("bind failed with code {}: {}", res.rc, res.text),
        }),
        Err(e @ LdapError::Timeout { .. }) => Err(DirectoryError::Unreachable {
            server: server.to_string(),
            message: e.to_string(),
        }),
        Err(e) => Err(DirectoryError::BindFailed {
            server: server.to_string(),
            message: e.to_string(),
        }),
    }
}

#[async_trait]
impl DirectoryBinder for LdapBinder {
    async fn bind(
        &self,
        config: &DirectoryConfig,
        server: &str,
        request: &BindRequest<'_>,
    ) -> Result<Vec<String>, DirectoryError> {
        let mut ldap = self.create_connection(config, server).await?;

        let result = self.bind_user(&mut ldap, config, server, request).await;

        if let Err(e) = ldap.unbind().await {
            warn!(server = %server, "LDAP unbind failed: {}", e);
        }

        result
    }
}
