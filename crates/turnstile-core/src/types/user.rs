//! User types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity record read from the user store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Unique, compared case-sensitively
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            created_at: Utc::now(),
        }
    }
}
