//! Core types for Turnstile

mod permission;
mod user;

pub use permission::*;
pub use user::*;
