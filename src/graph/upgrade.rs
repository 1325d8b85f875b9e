//! HTTP upgrade channel to the native remoting protocol.
//!
//! Only wired when `http-upgrade-enabled` is set. The channel rides on one of
//! the endpoint's listeners and has its own handshake authentication, which is
//! why it takes the SASL factory rather than the HTTP one.

use crate::config::EndpointConfig;
use crate::graph::descriptor::{
    capabilities, CapabilityRequirement, ConnectorIdentity, InjectionSlot, ServiceDescriptor,
    ServiceKind, ServiceName, UpgradeSettings,
};
use crate::graph::wiring::connector_identity;

pub const UPGRADE_REGISTRY: &str = "remoting.http-upgrade";
pub const REMOTING_ENDPOINT: &str = "management.remoting.endpoint";
pub const REMOTING_CONNECTOR: &str = "http-remoting-connector";
pub const DEFAULT_NODE_NAME: &str = "localhost";

/// Identifiers exposed as additional outputs of the install operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeOutputs {
    pub channel_service: ServiceName,
    pub connector: ConnectorIdentity,
}

#[derive(Debug, Clone)]
pub struct UpgradeChannel {
    pub descriptors: Vec<ServiceDescriptor>,
    pub outputs: UpgradeOutputs,
}

#[derive(Debug, Clone, Default)]
pub struct UpgradeChannelInstaller {
    node_name: Option<String>,
}

impl UpgradeChannelInstaller {
    pub fn new(node_name: Option<String>) -> Self {
        Self { node_name }
    }

    pub fn install(&self, config: &EndpointConfig, endpoint: &ServiceName) -> UpgradeChannel {
        let connector = connector_identity(&config.listeners);
        let remoting_endpoint = ServiceName::new(REMOTING_ENDPOINT);
        let channel_service = ServiceName::new(UPGRADE_REGISTRY).append(connector.name());

        let node_name = self
            .node_name
            .clone()
            .unwrap_or_else(|| DEFAULT_NODE_NAME.to_string());

        // Shared with the native interface; installed by whichever comes first.
        let endpoint_descriptor = ServiceDescriptor::new(
            remoting_endpoint.clone(),
            ServiceKind::RemotingEndpoint { node_name },
        )
        .optional();

        let handshake_auth = match (
            config.sasl_authentication_factory.as_deref(),
            config.security_realm.as_deref(),
        ) {
            (Some(sasl), _) => Some(CapabilityRequirement::qualified(
                capabilities::SASL_AUTHENTICATION_FACTORY,
                sasl,
                InjectionSlot::SaslAuthenticationFactory,
            )),
            (None, Some(realm)) => Some(CapabilityRequirement::qualified(
                capabilities::SECURITY_REALM,
                realm,
                InjectionSlot::SecurityRealm,
            )),
            (None, None) => None,
        };

        let channel_descriptor = ServiceDescriptor::new(
            channel_service.clone(),
            ServiceKind::UpgradeChannel(UpgradeSettings {
                remoting_connector: REMOTING_CONNECTOR.to_string(),
                listener: connector,
                connector_options: config.connector_options.clone(),
                security_realm: config.security_realm.clone(),
                sasl_authentication_factory: config.sasl_authentication_factory.clone(),
            }),
        )
        .requires(CapabilityRequirement::service(endpoint, InjectionSlot::Endpoint))
        .requires(CapabilityRequirement::service(
            &remoting_endpoint,
            InjectionSlot::RemotingEndpoint,
        ))
        .requires(CapabilityRequirement::new(
            capabilities::HTTP_LISTENER_REGISTRY,
            InjectionSlot::ListenerRegistry,
        ))
        .requires_all(handshake_auth);

        tracing::debug!(
            channel = %channel_service,
            connector = %connector,
            options = config.connector_options.len(),
            "Wiring HTTP upgrade channel"
        );

        UpgradeChannel {
            descriptors: vec![endpoint_descriptor, channel_descriptor],
            outputs: UpgradeOutputs {
                channel_service,
                connector,
            },
        }
    }
}
