//! Capabilities available to an install batch.

use std::collections::BTreeSet;

use crate::config::ManagementConfig;
use crate::graph::descriptor::capabilities;

/// Set of resolvable capability names (`capability` or `capability.qualifier`).
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    capabilities: BTreeSet<String>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the capabilities every server process provides.
    pub fn with_process_builtins() -> Self {
        let mut registry = Self::new();
        for capability in capabilities::PROCESS_BUILTINS {
            registry.register(capability);
        }
        registry
    }

    /// Built-ins plus every named resource defined by the configuration file.
    pub fn from_config(config: &ManagementConfig) -> Self {
        let mut registry = Self::with_process_builtins();
        for name in config.socket_bindings.keys() {
            registry.register_qualified(capabilities::SOCKET_BINDING, name);
        }
        for name in config.ssl_contexts.keys() {
            registry.register_qualified(capabilities::SSL_CONTEXT, name);
        }
        for name in config.security_realms.keys() {
            registry.register_qualified(capabilities::SECURITY_REALM, name);
        }
        for name in config.http_authentication_factories.keys() {
            registry.register_qualified(capabilities::HTTP_AUTHENTICATION_FACTORY, name);
        }
        for name in config.sasl_authentication_factories.keys() {
            registry.register_qualified(capabilities::SASL_AUTHENTICATION_FACTORY, name);
        }
        registry
    }

    pub fn register(&mut self, capability: &str) {
        self.capabilities.insert(capability.to_string());
    }

    pub fn register_qualified(&mut self, capability: &str, qualifier: &str) {
        self.capabilities.insert(format!("{capability}.{qualifier}"));
    }

    pub fn contains(&self, resolved_name: &str) -> bool {
        self.capabilities.contains(resolved_name)
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}
