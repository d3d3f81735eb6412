//! Turnstile Core Library
//!
//! Core types, configuration and errors shared by the Turnstile
//! directory authentication crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::TurnstileConfig;
pub use error::{Error, ErrorKind, Result};

/// Issuer stamped into every session token
pub const TOKEN_ISSUER: &str = "turnstile";

/// Session token lifetime (1 hour)
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Longest accepted session token lifetime (1 day)
pub const MAX_TOKEN_TTL_SECS: u64 = 86_400;

/// Default LDAPS port
pub const DEFAULT_LDAPS_PORT: u16 = 636;

/// Default directory connection/bind timeout
pub const DEFAULT_DIRECTORY_TIMEOUT_SECS: u64 = 10;
