//! Error types for Turnstile

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Configuration Errors
    #[error("signing key not initialized for authentication")]
    SigningKeyNotInitialized,

    #[error("no directory servers found in the configuration")]
    NoDirectoryServers,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Credential Errors
    #[error("Both a username and password must be provided")]
    EmptyCredentials,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("could not connect to LDAP server")]
    DirectoryUnavailable,

    #[error("{0}")]
    Directory(String),

    // Lookup Errors
    #[error("could not find user {0}")]
    UserNotFound(String),

    #[error("could not find permissions for user {0}")]
    PermissionsNotFound(String),

    #[error("Repository error: {0}")]
    Repository(String),

    // Token Errors
    #[error("empty JWT passed")]
    EmptyToken,

    #[error("improperly formatted JWT")]
    ImproperlyFormattedToken,

    #[error("Non-token passed")]
    MalformedToken,

    #[error("Token is either expired or not active yet")]
    TokenExpired,

    #[error("Non-claim based JWT given")]
    NonClaimToken,

    #[error("Could not handle token")]
    UnhandledToken,

    #[error("could not recover permissions from token: {0}")]
    TokenPayload(String),

    #[error("could not sign token: {0}")]
    TokenSigning(String),

    // Internal Errors
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification callers can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Process misconfiguration, never retried
    Configuration,
    /// Malformed credential input
    Credentials,
    /// Directory rejected the credentials
    InvalidCredentials,
    /// No directory server could be reached
    Unavailable,
    /// User or permission lookup came back empty
    NotFound,
    /// Token could not be issued or accepted
    Token,
    Internal,
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::SigningKeyNotInitialized => "SigningKeyNotInitialized",
            Error::NoDirectoryServers => "NoDirectoryServers",
            Error::InvalidConfig(_) => "InvalidConfiguration",
            Error::EmptyCredentials => "EmptyCredentials",
            Error::InvalidCredentials => "InvalidCredentials",
            Error::DirectoryUnavailable => "DirectoryUnavailable",
            Error::Directory(_) => "DirectoryError",
            Error::UserNotFound(_) => "UserNotFound",
            Error::PermissionsNotFound(_) => "PermissionsNotFound",
            Error::Repository(_) => "InternalError",
            Error::EmptyToken => "EmptyToken",
            Error::ImproperlyFormattedToken => "ImproperlyFormattedToken",
            Error::MalformedToken => "MalformedToken",
            Error::TokenExpired => "TokenExpired",
            Error::NonClaimToken => "NonClaimToken",
            Error::UnhandledToken => "InvalidToken",
            Error::TokenPayload(_) => "InvalidTokenPayload",
            Error::TokenSigning(_) => "InternalError",
            Error::InternalError(_) => "InternalError",
            Error::Other(_) => "InternalError",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::SigningKeyNotInitialized
            | Error::NoDirectoryServers
            | Error::InvalidConfig(_) => ErrorKind::Configuration,

            Error::EmptyCredentials => ErrorKind::Credentials,

            Error::InvalidCredentials => ErrorKind::InvalidCredentials,

            Error::DirectoryUnavailable | Error::Directory(_) => ErrorKind::Unavailable,

            Error::UserNotFound(_) | Error::PermissionsNotFound(_) => ErrorKind::NotFound,

            Error::EmptyToken
            | Error::ImproperlyFormattedToken
            | Error::MalformedToken
            | Error::TokenExpired
            | Error::NonClaimToken
            | Error::UnhandledToken
            | Error::TokenPayload(_)
            | Error::TokenSigning(_) => ErrorKind::Token,

            Error::Repository(_) | Error::InternalError(_) | Error::Other(_) => {
                ErrorKind::Internal
            }
        }
    }
}
