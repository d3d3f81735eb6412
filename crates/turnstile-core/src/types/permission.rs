//! Authorization scope types
//!
//! A [`Permission`] describes what a user may do inside one organization.
//! It is embedded verbatim as a JSON object in session tokens, so every
//! field must survive a serialize/parse round trip unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Roles a permission can grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Reader,
    Reporter,
    VulnerabilityAdmin,
    TicketAdmin,
    ExceptionAdmin,
    AssetAdmin,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Admin,
        Role::Manager,
        Role::Reader,
        Role::Reporter,
        Role::VulnerabilityAdmin,
        Role::TicketAdmin,
        Role::ExceptionAdmin,
        Role::AssetAdmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Reader => "reader",
            Role::Reporter => "reporter",
            Role::VulnerabilityAdmin => "vulnerability_admin",
            Role::TicketAdmin => "ticket_admin",
            Role::ExceptionAdmin => "exception_admin",
            Role::AssetAdmin => "asset_admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization scope of a user within an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub user_id: String,
    pub organization_id: String,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub manager: bool,
    #[serde(default)]
    pub reader: bool,
    #[serde(default)]
    pub reporter: bool,
    #[serde(default)]
    pub vulnerability_admin: bool,
    #[serde(default)]
    pub ticket_admin: bool,
    #[serde(default)]
    pub exception_admin: bool,
    #[serde(default)]
    pub asset_admin: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Permission {
    /// Permission with no roles granted
    pub fn new(user_id: impl Into<String>, organization_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            organization_id: organization_id.into(),
            admin: false,
            manager: false,
            reader: false,
            reporter: false,
            vulnerability_admin: false,
            ticket_admin: false,
            exception_admin: false,
            asset_admin: false,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        *self.flag_mut(role) = true;
        self
    }

    pub fn grants(&self, role: Role) -> bool {
        match role {
            Role::Admin => self.admin,
            Role::Manager => self.manager,
            Role::Reader => self.reader,
            Role::Reporter => self.reporter,
            Role::VulnerabilityAdmin => self.vulnerability_admin,
            Role::TicketAdmin => self.ticket_admin,
            Role::ExceptionAdmin => self.exception_admin,
            Role::AssetAdmin => self.asset_admin,
        }
    }

    /// Granted roles, in declaration order
    pub fn roles(&self) -> Vec<Role> {
        Role::ALL.into_iter().filter(|r| self.grants(*r)).collect()
    }

    fn flag_mut(&mut self, role: Role) -> &mut bool {
        match role {
            Role::Admin => &mut self.admin,
            Role::Manager => &mut self.manager,
            Role::Reader => &mut self.reader,
            Role::Reporter => &mut self.reporter,
            Role::VulnerabilityAdmin => &mut self.vulnerability_admin,
            Role::TicketAdmin => &mut self.ticket_admin,
            Role::ExceptionAdmin => &mut self.exception_admin,
            Role::AssetAdmin => &mut self.asset_admin,
        }
    }
}

/// Node in the organization hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    /// None for a root organization
    pub parent_id: Option<String>,
}

impl Organization {
    pub fn root(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
        }
    }

    pub fn child(
        id: impl Into<String>,
        name: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: Some(parent_id.into()),
        }
    }
}
