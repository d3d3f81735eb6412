//! Directory authentication and session tokens for Turnstile
//!
//! Credentials are checked against an ordered list of LDAP/Active Directory
//! servers; a successful bind yields a signed session token carrying the
//! user's authorization scope.

pub mod authenticator;
pub mod ldap;
pub mod token;

pub use authenticator::{Authenticator, Session};
pub use ldap::{BindRequest, DirectoryBinder, DirectoryError, LdapBinder};
pub use token::{SessionClaims, SigningKey, TokenMinter, TokenValidator, PERMISSIONS_CLAIM};
