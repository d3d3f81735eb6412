//! User and permission storage for Turnstile
//!
//! The authentication core only reads from these stores. Production
//! deployments plug in their own backend; an in-memory backend is provided
//! for embedding and tests.

pub mod memory;
pub mod traits;

pub use memory::MemoryRepository;
pub use traits::*;
