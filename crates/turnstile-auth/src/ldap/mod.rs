//! LDAP/Active Directory bind module
//!
//! One bind attempt per call against a single server, over LDAPS.
//! Failover across servers is the caller's job.

mod client;
mod types;

pub use client::LdapBinder;
pub use types::*;
