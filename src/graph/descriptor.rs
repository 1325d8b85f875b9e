//! Declarative service descriptors.
//!
//! Descriptors never hold live values. A requirement names a capability (and
//! optionally a dynamic qualifier such as a socket binding name) plus the slot
//! of the target service that receives the resolved value.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::config::ConsoleMode;

/// Capability names resolved by the service container.
pub mod capabilities {
    pub const SOCKET_BINDING: &str = "network.socket-binding";
    pub const SOCKET_BINDING_MANAGER: &str = "management.socket-binding-manager";
    pub const HTTP_AUTHENTICATION_FACTORY: &str = "security.http-authentication-factory";
    pub const SASL_AUTHENTICATION_FACTORY: &str = "security.sasl-authentication-factory";
    pub const SECURITY_REALM: &str = "security.realm";
    pub const SSL_CONTEXT: &str = "security.ssl-context";
    pub const MODEL_CONTROLLER: &str = "management.model-controller";
    pub const PROCESS_STATE: &str = "management.process-state";
    pub const HTTP_LISTENER_REGISTRY: &str = "remoting.http-listener-registry";
    pub const MANAGEMENT_EXECUTOR: &str = "management.executor";
    pub const SERVER_EXECUTOR: &str = "server.executor";
    pub const CHANNEL_REGISTRY: &str = "management.channel-registry";

    /// Capabilities every server process provides before the interface is added.
    pub const PROCESS_BUILTINS: &[&str] = &[
        SOCKET_BINDING_MANAGER,
        MODEL_CONTROLLER,
        PROCESS_STATE,
        HTTP_LISTENER_REGISTRY,
        MANAGEMENT_EXECUTOR,
        SERVER_EXECUTOR,
        CHANNEL_REGISTRY,
    ];
}

/// Dotted service identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn append(&self, segment: &str) -> Self {
        Self(format!("{}.{}", self.0, segment))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Field of the dependent service that receives a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InjectionSlot {
    ModelController,
    SocketBindingManager,
    ProcessState,
    ListenerRegistry,
    RequestProcessor,
    Worker,
    ManagementExecutor,
    SocketBinding,
    SecureSocketBinding,
    HttpAuthenticationFactory,
    SecurityRealm,
    SslContext,
    ServerExecutor,
    ChannelRegistry,
    Endpoint,
    RemotingEndpoint,
    SaslAuthenticationFactory,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CapabilityRequirement {
    pub capability: String,
    pub qualifier: Option<String>,
    pub slot: InjectionSlot,
}

impl CapabilityRequirement {
    pub fn new(capability: &str, slot: InjectionSlot) -> Self {
        Self {
            capability: capability.to_string(),
            qualifier: None,
            slot,
        }
    }

    pub fn qualified(capability: &str, qualifier: &str, slot: InjectionSlot) -> Self {
        Self {
            capability: capability.to_string(),
            qualifier: Some(qualifier.to_string()),
            slot,
        }
    }

    /// Requirement on another service of the same install batch.
    pub fn service(name: &ServiceName, slot: InjectionSlot) -> Self {
        Self::new(name.as_str(), slot)
    }

    /// Name the container resolves: `capability` or `capability.qualifier`.
    pub fn resolved_name(&self) -> String {
        match &self.qualifier {
            Some(qualifier) => format!("{}.{}", self.capability, qualifier),
            None => self.capability.clone(),
        }
    }
}

/// Listener identity the upgrade channel registers against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorIdentity {
    Http,
    Https,
}

impl ConnectorIdentity {
    pub fn name(&self) -> &'static str {
        match self {
            ConnectorIdentity::Http => "management-http",
            ConnectorIdentity::Https => "management-https",
        }
    }
}

impl fmt::Display for ConnectorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSettings {
    pub console_mode: ConsoleMode,
    pub console_slot: Option<String>,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeSettings {
    pub remoting_connector: String,
    pub listener: ConnectorIdentity,
    pub connector_options: BTreeMap<String, String>,
    pub security_realm: Option<String>,
    pub sasl_authentication_factory: Option<String>,
}

/// What a descriptor instantiates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceKind {
    RequestTracking,
    ManagementWorker,
    Endpoint(EndpointSettings),
    ShutdownGuard,
    RemotingEndpoint { node_name: String },
    UpgradeChannel(UpgradeSettings),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: ServiceName,
    pub kind: ServiceKind,
    pub dependencies: BTreeSet<CapabilityRequirement>,
    /// Skipped by the installer when a service of this name already exists.
    pub optional: bool,
}

impl ServiceDescriptor {
    pub fn new(name: ServiceName, kind: ServiceKind) -> Self {
        Self {
            name,
            kind,
            dependencies: BTreeSet::new(),
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn requires(mut self, requirement: CapabilityRequirement) -> Self {
        self.dependencies.insert(requirement);
        self
    }

    pub fn requires_all(mut self, requirements: impl IntoIterator<Item = CapabilityRequirement>) -> Self {
        self.dependencies.extend(requirements);
        self
    }

    pub fn requirement_for(&self, slot: InjectionSlot) -> Option<&CapabilityRequirement> {
        self.dependencies.iter().find(|r| r.slot == slot)
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.dependencies.iter().any(|r| r.capability == capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_names_append_segments() {
        let base = ServiceName::new("management.http");
        assert_eq!(base.append("requests").as_str(), "management.http.requests");
        assert_eq!(base.to_string(), "management.http");
    }

    #[test]
    fn resolved_name_includes_qualifier() {
        let plain = CapabilityRequirement::new(capabilities::MODEL_CONTROLLER, InjectionSlot::ModelController);
        assert_eq!(plain.resolved_name(), "management.model-controller");

        let qualified = CapabilityRequirement::qualified(
            capabilities::SOCKET_BINDING,
            "management-http",
            InjectionSlot::SocketBinding,
        );
        assert_eq!(qualified.resolved_name(), "network.socket-binding.management-http");
    }

    #[test]
    fn same_binding_in_two_slots_is_two_requirements() {
        let descriptor = ServiceDescriptor::new(ServiceName::new("svc"), ServiceKind::ShutdownGuard)
            .requires(CapabilityRequirement::qualified(
                capabilities::SOCKET_BINDING,
                "x",
                InjectionSlot::SocketBinding,
            ))
            .requires(CapabilityRequirement::qualified(
                capabilities::SOCKET_BINDING,
                "x",
                InjectionSlot::SecureSocketBinding,
            ));
        assert_eq!(descriptor.dependencies.len(), 2);
    }
}
