//! Startup orchestration.
//!
//! Installs the service graph, then resolves the names it references into
//! live values: listener addresses, TLS material and credentials. Any failure
//! is fatal; listeners start last, in `http::server`.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

use crate::config::{EndpointConfig, ManagementConfig};
use crate::container::{CapabilityRegistry, InstallError, ServiceContainer};
use crate::graph::wiring::{authentication_source, AuthenticationSource};
use crate::graph::{install_http_management, BuildEnvironment, InstallOutcome};
use crate::management::auth::AuthPolicy;
use crate::management::model::ModelController;
use crate::management::ConsoleSettings;
use crate::net::binding::{BindingError, SocketBindings};
use crate::net::tls::load_tls_config;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error("ssl context '{0}' is not defined")]
    UnknownSslContext(String),

    #[error("secure socket binding '{0}' has no ssl context")]
    MissingSslContext(String),

    #[error("authentication source '{0}' is not defined")]
    UnknownAuthenticationSource(String),

    #[error("TLS setup failed: {0}")]
    Tls(#[source] std::io::Error),
}

/// A TLS listener ready to bind.
#[derive(Clone)]
pub struct SecureListener {
    pub addr: SocketAddr,
    pub tls: RustlsConfig,
}

/// Everything the endpoint server needs, resolved from names.
#[derive(Clone)]
pub struct EndpointRuntime {
    pub plain_addr: Option<SocketAddr>,
    pub secure: Option<SecureListener>,
    pub auth: AuthPolicy,
    pub console: ConsoleSettings,
    pub allowed_origins: Vec<String>,
    pub controller: Arc<dyn ModelController>,
    pub request_timeout: Duration,
}

impl EndpointRuntime {
    /// Plain-HTTP runtime with no authentication, console or CORS.
    pub fn plain(addr: SocketAddr, controller: Arc<dyn ModelController>) -> Self {
        Self {
            plain_addr: Some(addr),
            secure: None,
            auth: AuthPolicy::Unsecured,
            console: ConsoleSettings {
                mode: crate::config::ConsoleMode::NoConsole,
                slot: None,
            },
            allowed_origins: Vec::new(),
            controller,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Install the HTTP management services into a container built from `config`.
pub fn install_services(
    config: &ManagementConfig,
    endpoint: &EndpointConfig,
) -> Result<(ServiceContainer, InstallOutcome), InstallError> {
    let env = BuildEnvironment::from_config(config);
    let mut container = ServiceContainer::new(CapabilityRegistry::from_config(config));
    let outcome = install_http_management(endpoint, &env, &mut container)?;
    Ok((container, outcome))
}

/// Resolve the endpoint's named references into a runnable runtime.
pub async fn assemble(
    config: &ManagementConfig,
    endpoint: &EndpointConfig,
    controller: Arc<dyn ModelController>,
) -> Result<EndpointRuntime, StartupError> {
    let bindings = SocketBindings::new(config.socket_bindings.clone());

    let plain_addr = endpoint
        .socket_binding()
        .map(|name| bindings.resolve(name))
        .transpose()?;

    let secure = match endpoint.secure_socket_binding() {
        Some(name) => {
            let addr = bindings.resolve(name)?;
            let ssl = endpoint
                .ssl_context
                .as_deref()
                .ok_or_else(|| StartupError::MissingSslContext(name.to_string()))?;
            let material = config
                .ssl_contexts
                .get(ssl)
                .ok_or_else(|| StartupError::UnknownSslContext(ssl.to_string()))?;
            let tls = load_tls_config(Path::new(&material.cert_path), Path::new(&material.key_path))
                .await
                .map_err(StartupError::Tls)?;
            Some(SecureListener { addr, tls })
        }
        None => None,
    };

    Ok(EndpointRuntime {
        plain_addr,
        secure,
        auth: resolve_auth(config, endpoint)?,
        console: ConsoleSettings {
            mode: endpoint.console_mode(),
            slot: config.console_slot.clone(),
        },
        allowed_origins: endpoint.allowed_origins.clone(),
        controller,
        request_timeout: Duration::from_secs(config.timeouts.request_secs),
    })
}

/// Credentials follow the same precedence as the service graph.
pub fn resolve_auth(config: &ManagementConfig, endpoint: &EndpointConfig) -> Result<AuthPolicy, StartupError> {
    let (name, credentials) = match authentication_source(endpoint) {
        AuthenticationSource::HttpAuthenticationFactory(name) => {
            (name, config.http_authentication_factories.get(name))
        }
        AuthenticationSource::SecurityRealm(name) => (name, config.security_realms.get(name)),
        AuthenticationSource::Unsecured => return Ok(AuthPolicy::Unsecured),
    };

    let credentials = credentials.ok_or_else(|| StartupError::UnknownAuthenticationSource(name.to_string()))?;
    Ok(AuthPolicy::bearer(name, credentials.bearer_tokens.iter().cloned()))
}
