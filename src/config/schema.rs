//! Configuration schema definitions.
//!
//! `ManagementConfig` is the on-disk shape (TOML, kebab-case keys). The
//! builder never sees it directly: the `http-interface` section is normalized
//! into an [`EndpointConfig`] first.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::validation::ValidationError;

/// Root configuration for the management process.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ManagementConfig {
    /// Running mode of the owning process.
    pub running_mode: RunningMode,

    /// Kind of process hosting the endpoint.
    pub process_type: ProcessType,

    /// Node name used by the remoting endpoint of the upgrade channel.
    pub node_name: Option<String>,

    /// Console slot served by the endpoint, if any.
    pub console_slot: Option<String>,

    /// The HTTP management interface resource.
    pub http_interface: HttpInterfaceConfig,

    /// Named socket bindings (`name = "address:port"`).
    pub socket_bindings: BTreeMap<String, String>,

    /// Named TLS contexts.
    pub ssl_contexts: BTreeMap<String, TlsConfig>,

    /// Legacy security realms.
    pub security_realms: BTreeMap<String, CredentialsConfig>,

    /// HTTP authentication factories.
    pub http_authentication_factories: BTreeMap<String, CredentialsConfig>,

    /// SASL authentication factories, used by the upgrade channel only.
    pub sasl_authentication_factories: BTreeMap<String, SaslFactoryConfig>,

    pub shutdown: ShutdownConfig,

    pub timeouts: TimeoutConfig,

    pub observability: ObservabilityConfig,
}

/// Plain binding used when the file has no `[http-interface]` section.
pub const DEFAULT_SOCKET_BINDING: &str = "management-http";

impl Default for ManagementConfig {
    fn default() -> Self {
        let mut socket_bindings = BTreeMap::new();
        socket_bindings.insert(DEFAULT_SOCKET_BINDING.to_string(), "127.0.0.1:9990".to_string());

        Self {
            running_mode: RunningMode::default(),
            process_type: ProcessType::default(),
            node_name: None,
            console_slot: None,
            http_interface: HttpInterfaceConfig {
                socket_binding: Some(DEFAULT_SOCKET_BINDING.to_string()),
                ..HttpInterfaceConfig::default()
            },
            socket_bindings,
            ssl_contexts: BTreeMap::new(),
            security_realms: BTreeMap::new(),
            http_authentication_factories: BTreeMap::new(),
            sasl_authentication_factories: BTreeMap::new(),
            shutdown: ShutdownConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunningMode {
    #[default]
    Normal,
    AdminOnly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessType {
    #[default]
    Server,
    EmbeddedServer,
}

/// Raw attributes of the HTTP management interface.
///
/// Neither binding has a default here: a file that declares the section
/// names its listeners explicitly, plain, secure or both.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpInterfaceConfig {
    pub socket_binding: Option<String>,
    pub secure_socket_binding: Option<String>,
    pub console_enabled: bool,
    pub http_upgrade_enabled: bool,
    pub http_authentication_factory: Option<String>,
    pub security_realm: Option<String>,
    pub ssl_context: Option<String>,
    pub sasl_authentication_factory: Option<String>,
    /// CORS allow-list, passed through unvalidated.
    pub allowed_origins: Vec<String>,
    /// Forwarded verbatim to the upgrade channel.
    pub connector_options: BTreeMap<String, String>,
}

impl Default for HttpInterfaceConfig {
    fn default() -> Self {
        Self {
            socket_binding: None,
            secure_socket_binding: None,
            console_enabled: true,
            http_upgrade_enabled: false,
            http_authentication_factory: None,
            security_realm: None,
            ssl_context: None,
            sasl_authentication_factory: None,
            allowed_origins: Vec::new(),
            connector_options: BTreeMap::new(),
        }
    }
}

/// TLS certificate material for a named SSL context.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Bearer credentials accepted by a realm or an authentication factory.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CredentialsConfig {
    pub bearer_tokens: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SaslFactoryConfig {
    pub mechanisms: Vec<String>,
}

/// Drain behaviour when the process is asked to terminate.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ShutdownConfig {
    /// Upper bound on the drain in seconds; 0 waits without bound.
    pub drain_timeout_secs: u64,
}

impl ShutdownConfig {
    pub fn drain_timeout(&self) -> Option<Duration> {
        match self.drain_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TimeoutConfig {
    /// Management request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9991".to_string(),
        }
    }
}

/// Transport listeners of the endpoint. At least one is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listeners {
    Plain(String),
    Secure(String),
    Both { plain: String, secure: String },
}

impl Listeners {
    pub fn from_names(
        plain: Option<String>,
        secure: Option<String>,
    ) -> Result<Self, ValidationError> {
        match (plain, secure) {
            (Some(plain), Some(secure)) => Ok(Listeners::Both { plain, secure }),
            (Some(plain), None) => Ok(Listeners::Plain(plain)),
            (None, Some(secure)) => Ok(Listeners::Secure(secure)),
            (None, None) => Err(ValidationError::NoSocketBinding),
        }
    }

    pub fn socket_binding(&self) -> Option<&str> {
        match self {
            Listeners::Plain(plain) | Listeners::Both { plain, .. } => Some(plain),
            Listeners::Secure(_) => None,
        }
    }

    pub fn secure_socket_binding(&self) -> Option<&str> {
        match self {
            Listeners::Secure(secure) | Listeners::Both { secure, .. } => Some(secure),
            Listeners::Plain(_) => None,
        }
    }
}

/// Whether and how the bundled console is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsoleMode {
    NoConsole,
    Console,
    AdminOnly,
}

impl ConsoleMode {
    pub fn derive(console_enabled: bool, admin_only: bool) -> Self {
        match (console_enabled, admin_only) {
            (false, _) => ConsoleMode::NoConsole,
            (true, true) => ConsoleMode::AdminOnly,
            (true, false) => ConsoleMode::Console,
        }
    }
}

/// Normalized, immutable configuration of the management endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub listeners: Listeners,
    pub console_enabled: bool,
    pub admin_only: bool,
    pub http_upgrade_enabled: bool,
    pub http_authentication_factory: Option<String>,
    pub security_realm: Option<String>,
    pub ssl_context: Option<String>,
    pub sasl_authentication_factory: Option<String>,
    pub allowed_origins: Vec<String>,
    pub connector_options: BTreeMap<String, String>,
}

impl EndpointConfig {
    /// Normalize the interface attributes for the given running mode.
    pub fn from_interface(
        interface: &HttpInterfaceConfig,
        running_mode: RunningMode,
    ) -> Result<Self, ValidationError> {
        let listeners = Listeners::from_names(
            interface.socket_binding.clone(),
            interface.secure_socket_binding.clone(),
        )?;

        Ok(Self {
            listeners,
            console_enabled: interface.console_enabled,
            admin_only: running_mode == RunningMode::AdminOnly,
            http_upgrade_enabled: interface.http_upgrade_enabled,
            http_authentication_factory: interface.http_authentication_factory.clone(),
            security_realm: interface.security_realm.clone(),
            ssl_context: interface.ssl_context.clone(),
            sasl_authentication_factory: interface.sasl_authentication_factory.clone(),
            allowed_origins: interface.allowed_origins.clone(),
            connector_options: interface.connector_options.clone(),
        })
    }

    /// Endpoint listening on a single plain binding, everything else off.
    pub fn plain(socket_binding: impl Into<String>) -> Self {
        Self {
            listeners: Listeners::Plain(socket_binding.into()),
            console_enabled: false,
            admin_only: false,
            http_upgrade_enabled: false,
            http_authentication_factory: None,
            security_realm: None,
            ssl_context: None,
            sasl_authentication_factory: None,
            allowed_origins: Vec::new(),
            connector_options: BTreeMap::new(),
        }
    }

    pub fn socket_binding(&self) -> Option<&str> {
        self.listeners.socket_binding()
    }

    pub fn secure_socket_binding(&self) -> Option<&str> {
        self.listeners.secure_socket_binding()
    }

    pub fn console_mode(&self) -> ConsoleMode {
        ConsoleMode::derive(self.console_enabled, self.admin_only)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_mode_table() {
        assert_eq!(ConsoleMode::derive(false, false), ConsoleMode::NoConsole);
        assert_eq!(ConsoleMode::derive(false, true), ConsoleMode::NoConsole);
        assert_eq!(ConsoleMode::derive(true, false), ConsoleMode::Console);
        assert_eq!(ConsoleMode::derive(true, true), ConsoleMode::AdminOnly);
    }

    #[test]
    fn listeners_require_a_binding() {
        assert!(matches!(
            Listeners::from_names(None, None),
            Err(ValidationError::NoSocketBinding)
        ));

        let both = Listeners::from_names(Some("a".into()), Some("b".into())).unwrap();
        assert_eq!(both.socket_binding(), Some("a"));
        assert_eq!(both.secure_socket_binding(), Some("b"));
    }

    #[test]
    fn admin_only_follows_running_mode() {
        let interface = ManagementConfig::default().http_interface;
        let endpoint = EndpointConfig::from_interface(&interface, RunningMode::AdminOnly).unwrap();
        assert!(endpoint.admin_only);
        assert_eq!(endpoint.console_mode(), ConsoleMode::AdminOnly);
    }

    #[test]
    fn drain_timeout_zero_is_unbounded() {
        let config = ShutdownConfig { drain_timeout_secs: 0 };
        assert_eq!(config.drain_timeout(), None);
        assert_eq!(
            ShutdownConfig::default().drain_timeout(),
            Some(Duration::from_secs(30))
        );
    }
}
