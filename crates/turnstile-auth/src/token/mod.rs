//! Session tokens
//!
//! HS256-signed JWTs carrying the user's [`Permission`] as a claim.
//!
//! [`Permission`]: turnstile_core::types::Permission

mod claims;
mod key;
mod minter;
mod validator;

pub use claims::{SessionClaims, PERMISSIONS_CLAIM};
pub use key::SigningKey;
pub use minter::TokenMinter;
pub use validator::TokenValidator;
