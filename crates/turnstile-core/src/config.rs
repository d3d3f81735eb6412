//! Configuration for Turnstile

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnstileConfig {
    #[serde(default)]
    pub directory: DirectoryConfig,

    #[serde(default)]
    pub token: TokenConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TurnstileConfig {
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::InvalidConfig(format!("Failed to read config: {}", e)))?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::InvalidConfig(format!("Failed to parse config: {}", e)))
    }

    pub fn from_env() -> Self {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Ok(servers) = std::env::var("TURNSTILE_DIRECTORY_SERVERS") {
            config.directory.servers = split_server_list(&servers);
        }
        if let Ok(port) = std::env::var("TURNSTILE_DIRECTORY_TLS_PORT") {
            if let Ok(p) = port.parse() {
                config.directory.tls_port = p;
            }
        }
        if let Ok(base_dn) = std::env::var("TURNSTILE_DIRECTORY_BASE_DN") {
            config.directory.base_dn = base_dn;
        }
        if std::env::var("TURNSTILE_DIRECTORY_SKIP_TLS_VERIFY")
            .map(|v| v == "true")
            .unwrap_or(false)
        {
            config.directory.skip_tls_verify = true;
        }
        if let Ok(timeout) = std::env::var("TURNSTILE_DIRECTORY_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                config.directory.timeout_seconds = t;
            }
        }
        if let Ok(filter) = std::env::var("TURNSTILE_DIRECTORY_GROUP_FILTER") {
            config.directory.group_search_filter = Some(filter);
        }
        if let Ok(attribute) = std::env::var("TURNSTILE_DIRECTORY_MEMBER_OF") {
            config.directory.member_of_attribute = Some(attribute);
        }
        if let Ok(key) = std::env::var("TURNSTILE_SIGNING_KEY") {
            config.token.signing_key = Some(key);
        }
        if let Ok(ttl) = std::env::var("TURNSTILE_TOKEN_TTL_SECS") {
            if let Ok(t) = ttl.parse() {
                config.token.ttl_seconds = t;
            }
        }
        if let Ok(leeway) = std::env::var("TURNSTILE_TOKEN_LEEWAY_SECS") {
            if let Ok(l) = leeway.parse() {
                config.token.leeway_seconds = l;
            }
        }
        if let Ok(level) = std::env::var("TURNSTILE_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("TURNSTILE_LOG_FORMAT") {
            config.logging.format = format;
        }

        config
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.directory.validate()?;
        self.token.validate()
    }
}

fn split_server_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Directory (LDAP/Active Directory) configuration
///
/// Read once at start-up and shared read-only by every authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Directory servers, tried in order
    #[serde(default)]
    pub servers: Vec<String>,

    /// LDAPS port
    #[serde(default = "default_tls_port")]
    pub tls_port: u16,

    /// Base naming context the user DN is built under
    /// Example: "OU=Users,DC=example,DC=com"
    #[serde(default)]
    pub base_dn: String,

    /// Skip TLS certificate verification (not recommended for production)
    #[serde(default)]
    pub skip_tls_verify: bool,

    /// Connection and bind timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Group membership search filter
    /// Use {username} as placeholder
    /// Example: "(sAMAccountName={username})"
    #[serde(default)]
    pub group_search_filter: Option<String>,

    /// Attribute holding group memberships
    /// Example: "memberOf"
    #[serde(default)]
    pub member_of_attribute: Option<String>,
}

fn default_tls_port() -> u16 {
    crate::DEFAULT_LDAPS_PORT
}

fn default_timeout() -> u64 {
    crate::DEFAULT_DIRECTORY_TIMEOUT_SECS
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            tls_port: default_tls_port(),
            base_dn: String::new(),
            skip_tls_verify: false,
            timeout_seconds: default_timeout(),
            group_search_filter: None,
            member_of_attribute: None,
        }
    }
}

impl DirectoryConfig {
    /// Build the bind DN for a user
    pub fn user_dn(&self, first_name: &str, last_name: &str) -> String {
        format!("CN={} {},{}", first_name, last_name, self.base_dn)
    }

    /// Build group search filter with username substitution
    pub fn build_group_filter(&self, username: &str) -> Option<String> {
        self.group_search_filter
            .as_ref()
            .map(|f| f.replace("{username}", username))
    }

    /// Group lookup runs only when both the filter and attribute are set
    pub fn group_lookup_enabled(&self) -> bool {
        self.group_search_filter.is_some() && self.member_of_attribute.is_some()
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.servers.is_empty() {
            return Err(crate::Error::NoDirectoryServers);
        }

        if self.servers.iter().any(|s| s.trim().is_empty()) {
            return Err(crate::Error::InvalidConfig(
                "Directory server address cannot be empty".into(),
            ));
        }

        if self.base_dn.is_empty() {
            return Err(crate::Error::InvalidConfig("Base DN is required".into()));
        }

        if self.timeout_seconds == 0 {
            return Err(crate::Error::InvalidConfig(
                "Directory timeout must be greater than zero".into(),
            ));
        }

        if let Some(filter) = &self.group_search_filter {
            if !filter.contains("{username}") {
                return Err(crate::Error::InvalidConfig(
                    "Group search filter must contain {username} placeholder".into(),
                ));
            }
        }

        Ok(())
    }
}

/// Session token configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Shared HMAC secret used to sign and verify tokens
    #[serde(default)]
    pub signing_key: Option<String>,

    /// Token lifetime in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,

    /// Clock skew tolerated when checking expiry
    #[serde(default)]
    pub leeway_seconds: u64,
}

fn default_ttl() -> u64 {
    crate::DEFAULT_TOKEN_TTL_SECS
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            signing_key: None,
            ttl_seconds: default_ttl(),
            leeway_seconds: 0,
        }
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("signing_key", &self.signing_key.as_ref().map(|_| "<redacted>"))
            .field("ttl_seconds", &self.ttl_seconds)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl TokenConfig {
    pub fn validate(&self) -> crate::Result<()> {
        match &self.signing_key {
            Some(key) if !key.is_empty() => {}
            _ => return Err(crate::Error::SigningKeyNotInitialized),
        }

        if self.ttl_seconds == 0 {
            return Err(crate::Error::InvalidConfig(
                "Token TTL must be greater than zero".into(),
            ));
        }

        if self.ttl_seconds > crate::MAX_TOKEN_TTL_SECS {
            return Err(crate::Error::InvalidConfig(format!(
                "Token TTL cannot exceed {} seconds",
                crate::MAX_TOKEN_TTL_SECS
            )));
        }

        if self.leeway_seconds > crate::MAX_TOKEN_TTL_SECS {
            return Err(crate::Error::InvalidConfig(format!(
                "Token leeway cannot exceed {} seconds",
                crate::MAX_TOKEN_TTL_SECS
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
