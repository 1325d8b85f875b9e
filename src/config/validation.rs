//! Configuration validation.
//!
//! Serde handles the syntax; this pass checks that every name the
//! `http-interface` references is defined elsewhere in the file. All errors
//! are collected, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ManagementConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one of socket-binding or secure-socket-binding must be set")]
    NoSocketBinding,

    #[error("socket binding '{0}' is not defined")]
    UnknownSocketBinding(String),

    #[error("socket binding '{name}' has an invalid address '{address}'")]
    InvalidBindAddress { name: String, address: String },

    #[error("ssl context '{0}' is not defined")]
    UnknownSslContext(String),

    #[error("secure-socket-binding '{0}' requires an ssl-context")]
    SecureBindingWithoutSslContext(String),

    #[error("http authentication factory '{0}' is not defined")]
    UnknownAuthenticationFactory(String),

    #[error("security realm '{0}' is not defined")]
    UnknownSecurityRealm(String),

    #[error("sasl authentication factory '{0}' is not defined")]
    UnknownSaslFactory(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ManagementConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let interface = &config.http_interface;

    for (name, address) in &config.socket_bindings {
        if address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidBindAddress {
                name: name.clone(),
                address: address.clone(),
            });
        }
    }

    if interface.socket_binding.is_none() && interface.secure_socket_binding.is_none() {
        errors.push(ValidationError::NoSocketBinding);
    }

    for binding in [&interface.socket_binding, &interface.secure_socket_binding]
        .into_iter()
        .flatten()
    {
        if !config.socket_bindings.contains_key(binding) {
            errors.push(ValidationError::UnknownSocketBinding(binding.clone()));
        }
    }

    match (&interface.secure_socket_binding, &interface.ssl_context) {
        (Some(secure), None) => {
            errors.push(ValidationError::SecureBindingWithoutSslContext(secure.clone()));
        }
        (_, Some(ssl)) if !config.ssl_contexts.contains_key(ssl) => {
            errors.push(ValidationError::UnknownSslContext(ssl.clone()));
        }
        _ => {}
    }

    if let Some(factory) = &interface.http_authentication_factory {
        if !config.http_authentication_factories.contains_key(factory) {
            errors.push(ValidationError::UnknownAuthenticationFactory(factory.clone()));
        }
    }

    if let Some(realm) = &interface.security_realm {
        if !config.security_realms.contains_key(realm) {
            errors.push(ValidationError::UnknownSecurityRealm(realm.clone()));
        }
    }

    if let Some(sasl) = &interface.sasl_authentication_factory {
        if !config.sasl_authentication_factories.contains_key(sasl) {
            errors.push(ValidationError::UnknownSaslFactory(sasl.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
