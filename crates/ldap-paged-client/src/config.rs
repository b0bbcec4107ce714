//! LDAP client configuration
//!
//! Configuration for connecting to a directory server and running paged
//! searches against it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use ldap_paged::{PagingError, PagingResult, SearchRequest, SearchScope};

/// Timeouts for the connection and for individual operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Connection timeout in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Timeout for each search or release request in seconds.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_secs: u64,
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_operation_timeout() -> u64 {
    60
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connection_timeout_secs: default_connection_timeout(),
            operation_timeout_secs: default_operation_timeout(),
        }
    }
}

impl ConnectionSettings {
    /// Get connection timeout as Duration.
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Get operation timeout as Duration.
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

/// TLS settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsSettings {
    /// Whether to verify the server certificate.
    #[serde(default = "default_true")]
    pub verify_certificate: bool,
}

fn default_true() -> bool {
    true
}

impl Default for TlsSettings {
    fn default() -> Self {
        Self {
            verify_certificate: true,
        }
    }
}

/// Configuration for [`LdapDirectory`](crate::LdapDirectory).
#[derive(Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    /// LDAP server hostname or IP address.
    pub host: String,

    /// LDAP server port (389 for LDAP, 636 for LDAPS).
    #[serde(default = "default_ldap_port")]
    pub port: u16,

    /// Use SSL/TLS (LDAPS).
    #[serde(default)]
    pub use_ssl: bool,

    /// Use STARTTLS upgrade on plain LDAP connection.
    #[serde(default)]
    pub use_starttls: bool,

    /// Base DN for searches (e.g., "dc=example,dc=com").
    pub base_dn: String,

    /// Bind DN; anonymous bind when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_dn: Option<String>,

    /// Bind password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,

    /// Connection timeouts.
    #[serde(default)]
    pub connection: ConnectionSettings,

    /// TLS settings.
    #[serde(default)]
    pub tls: TlsSettings,

    /// Default search scope.
    #[serde(default)]
    pub scope: SearchScope,

    /// Page size for search operations.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Stop paging after this many pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
}

impl std::fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("use_starttls", &self.use_starttls)
            .field("base_dn", &self.base_dn)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field("connection", &self.connection)
            .field("tls", &self.tls)
            .field("scope", &self.scope)
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

fn default_ldap_port() -> u16 {
    389
}

fn default_page_size() -> u32 {
    1000
}

impl LdapConfig {
    /// Create a config for an anonymous connection.
    pub fn new(host: impl Into<String>, base_dn: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_ldap_port(),
            use_ssl: false,
            use_starttls: false,
            base_dn: base_dn.into(),
            bind_dn: None,
            bind_password: None,
            connection: ConnectionSettings::default(),
            tls: TlsSettings::default(),
            scope: SearchScope::default(),
            page_size: default_page_size(),
            max_pages: None,
        }
    }

    /// Parse a config from JSON.
    pub fn from_json(json: &str) -> PagingResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| PagingError::invalid_configuration(format!("invalid LDAP config: {e}")))
    }

    /// Bind with a DN and password.
    #[must_use]
    pub fn with_credentials(
        mut self,
        bind_dn: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.bind_dn = Some(bind_dn.into());
        self.bind_password = Some(password.into());
        self
    }

    /// Set the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enable SSL (LDAPS).
    #[must_use]
    pub fn with_ssl(mut self) -> Self {
        self.use_ssl = true;
        self.port = 636;
        self
    }

    /// Enable STARTTLS.
    #[must_use]
    pub fn with_starttls(mut self) -> Self {
        self.use_starttls = true;
        self
    }

    /// Set the page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Limit the number of pages per search.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Get the LDAP URL.
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// A search request below `base_dn` with this config's paging defaults.
    pub fn search_request(&self, filter: impl Into<String>) -> SearchRequest {
        let request = SearchRequest::new(self.base_dn.clone())
            .with_filter(filter)
            .with_scope(self.scope)
            .with_page_size(self.page_size);
        match self.max_pages {
            Some(max) => request.with_max_pages(max),
            None => request,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> PagingResult<()> {
        if self.host.is_empty() {
            return Err(PagingError::invalid_configuration("host is required"));
        }

        if self.base_dn.is_empty() {
            return Err(PagingError::invalid_configuration("base_dn is required"));
        }

        if self.use_ssl && self.use_starttls {
            return Err(PagingError::invalid_configuration(
                "cannot use both SSL and STARTTLS",
            ));
        }

        if self.bind_password.is_some() && self.bind_dn.is_none() {
            return Err(PagingError::invalid_configuration(
                "bind_password requires bind_dn",
            ));
        }

        if self.page_size == 0 {
            return Err(PagingError::invalid_configuration(
                "page_size must be greater than 0",
            ));
        }

        if !self.tls.verify_certificate && (self.use_ssl || self.use_starttls) {
            tracing::warn!(
                host = %self.host,
                "TLS certificate verification is disabled"
            );
        }

        Ok(())
    }

    /// Create a redacted copy for logging.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.bind_password.is_some() {
            config.bind_password = Some("***REDACTED***".to_string());
        }
        config
    }
}
