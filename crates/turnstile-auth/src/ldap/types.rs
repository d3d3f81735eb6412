//! Directory bind types

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use turnstile_core::config::DirectoryConfig;

/// LDAP result code for a rejected bind
pub const LDAP_INVALID_CREDENTIALS: u32 = 49;

/// Credentials for one bind attempt
#[derive(Clone, Copy)]
pub struct BindRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

impl fmt::Debug for BindRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

/// Outcome of a failed bind attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// The directory rejected the credentials
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Connection, TLS handshake or timeout failure
    #[error("error while contacting directory server {server} - {message}")]
    Unreachable { server: String, message: String },

    /// Bind failed for a reason other than a plain rejection
    #[error("error while contacting directory server {server}, likely invalid credentials - {message}")]
    BindFailed { server: String, message: String },

    /// Group search succeeded but matched nothing
    #[error("could not find any groups {0} was a member of")]
    NoGroups(String),

    /// Group search itself failed
    #[error("error while looking up user groups - {0}")]
    GroupLookup(String),
}

impl DirectoryError {
    /// Terminal failures stop the server loop
    pub fn is_terminal(&self) -> bool {
        matches!(self, DirectoryError::InvalidCredentials)
    }

    /// Connectivity failures are reported as a generic connect error
    pub fn is_connectivity(&self) -> bool {
        matches!(self, DirectoryError::Unreachable { .. })
    }
}

/// A single bind against a single directory server
#[async_trait]
pub trait DirectoryBinder: Send + Sync {
    /// Bind as the user and return their groups (empty unless group
    /// lookup is configured).
    async fn bind(
        &self,
        config: &DirectoryConfig,
        server: &str,
        request: &BindRequest<'_>,
    ) -> Result<Vec<String>, DirectoryError>;
}
