//! Session token claim set

use serde::{Deserialize, Serialize};
use turnstile_core::types::Permission;

/// Name of the claim holding the embedded permission object
pub const PERMISSIONS_CLAIM: &str = "Permissions";

/// Claims carried by a session token
///
/// `permissions` must stay the last field: the validator recovers it by
/// slicing the decoded body up to the closing brace of the claim object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Issuer
    pub iss: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Authorization scope
    #[serde(rename = "Permissions", default)]
    pub permissions: Option<Permission>,
}
