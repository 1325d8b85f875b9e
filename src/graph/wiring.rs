//! Conditional wiring rules.
//!
//! Pure decision table over an [`EndpointConfig`]: which optional capabilities
//! the endpoint service requires. Precedence:
//! - an HTTP authentication factory overrides a security realm
//! - TLS is independent of authentication

use std::fmt;

use crate::config::{EndpointConfig, Listeners};
use crate::graph::descriptor::{capabilities, CapabilityRequirement, ConnectorIdentity, InjectionSlot};

/// Where the endpoint's HTTP authentication comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationSource<'a> {
    HttpAuthenticationFactory(&'a str),
    SecurityRealm(&'a str),
    Unsecured,
}

/// Informational findings produced while wiring; never errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    UnsecuredInterface,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::UnsecuredInterface => f.write_str(
                "HTTP management interface is not secured: no http-authentication-factory or security-realm configured",
            ),
        }
    }
}

/// Conditional requirements of the endpoint service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wiring {
    pub requirements: Vec<CapabilityRequirement>,
    pub advisory: Option<Advisory>,
}

pub fn authentication_source(config: &EndpointConfig) -> AuthenticationSource<'_> {
    match (
        config.http_authentication_factory.as_deref(),
        config.security_realm.as_deref(),
    ) {
        (Some(factory), _) => AuthenticationSource::HttpAuthenticationFactory(factory),
        (None, Some(realm)) => AuthenticationSource::SecurityRealm(realm),
        (None, None) => AuthenticationSource::Unsecured,
    }
}

pub fn listener_requirements(listeners: &Listeners) -> Vec<CapabilityRequirement> {
    let plain = listeners.socket_binding().map(|name| {
        CapabilityRequirement::qualified(capabilities::SOCKET_BINDING, name, InjectionSlot::SocketBinding)
    });
    let secure = listeners.secure_socket_binding().map(|name| {
        CapabilityRequirement::qualified(
            capabilities::SOCKET_BINDING,
            name,
            InjectionSlot::SecureSocketBinding,
        )
    });
    plain.into_iter().chain(secure).collect()
}

pub fn authentication_requirement(source: AuthenticationSource<'_>) -> Option<CapabilityRequirement> {
    match source {
        AuthenticationSource::HttpAuthenticationFactory(factory) => Some(CapabilityRequirement::qualified(
            capabilities::HTTP_AUTHENTICATION_FACTORY,
            factory,
            InjectionSlot::HttpAuthenticationFactory,
        )),
        AuthenticationSource::SecurityRealm(realm) => Some(CapabilityRequirement::qualified(
            capabilities::SECURITY_REALM,
            realm,
            InjectionSlot::SecurityRealm,
        )),
        AuthenticationSource::Unsecured => None,
    }
}

pub fn tls_requirement(config: &EndpointConfig) -> Option<CapabilityRequirement> {
    config.ssl_context.as_deref().map(|ssl| {
        CapabilityRequirement::qualified(capabilities::SSL_CONTEXT, ssl, InjectionSlot::SslContext)
    })
}

/// Plain connector whenever a plain binding exists (or no secure one does).
pub fn connector_identity(listeners: &Listeners) -> ConnectorIdentity {
    match listeners {
        Listeners::Plain(_) | Listeners::Both { .. } => ConnectorIdentity::Http,
        Listeners::Secure(_) => ConnectorIdentity::Https,
    }
}

/// Resolve every conditional requirement of the endpoint, in wiring order:
/// listeners, authentication, TLS.
pub fn resolve(config: &EndpointConfig) -> Wiring {
    let source = authentication_source(config);
    let mut requirements = listener_requirements(&config.listeners);
    requirements.extend(authentication_requirement(source));
    requirements.extend(tls_requirement(config));

    let advisory = match source {
        AuthenticationSource::Unsecured => Some(Advisory::UnsecuredInterface),
        _ => None,
    };

    Wiring {
        requirements,
        advisory,
    }
}
