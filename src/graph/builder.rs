//! Capability graph builder.
//!
//! Turns an [`EndpointConfig`] into the ordered descriptor batch that
//! instantiates the management endpoint. Total over validated input: there is
//! no failure path here, only the unsecured-interface advisory.

use crate::config::{EndpointConfig, ManagementConfig, ProcessType, RunningMode};
use crate::graph::descriptor::{
    capabilities, CapabilityRequirement, EndpointSettings, InjectionSlot, ServiceDescriptor,
    ServiceKind, ServiceName,
};
use crate::graph::upgrade::{UpgradeChannelInstaller, UpgradeOutputs};
use crate::graph::wiring::{self, Advisory};

pub const HTTP_MANAGEMENT: &str = "management.http";
pub const MANAGEMENT_WORKER: &str = "management.worker";

pub fn endpoint_service() -> ServiceName {
    ServiceName::new(HTTP_MANAGEMENT)
}

pub fn request_tracking_service() -> ServiceName {
    endpoint_service().append("requests")
}

pub fn shutdown_guard_service() -> ServiceName {
    endpoint_service().append("shutdown")
}

pub fn worker_service() -> ServiceName {
    ServiceName::new(MANAGEMENT_WORKER)
}

/// Process-wide facts the builder would otherwise look up globally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnvironment {
    pub node_name: Option<String>,
    pub console_slot: Option<String>,
    pub running_mode: RunningMode,
    pub process_type: ProcessType,
}

impl BuildEnvironment {
    pub fn from_config(config: &ManagementConfig) -> Self {
        Self {
            node_name: config.node_name.clone(),
            console_slot: config.console_slot.clone(),
            running_mode: config.running_mode,
            process_type: config.process_type,
        }
    }

    /// An embedded server booted admin-only gets no HTTP management runtime.
    pub fn requires_runtime(&self) -> bool {
        !(self.process_type == ProcessType::EmbeddedServer
            && self.running_mode == RunningMode::AdminOnly)
    }
}

/// Output of a build: the descriptor batch and what it exposes.
#[derive(Debug, Clone)]
pub struct GraphPlan {
    pub descriptors: Vec<ServiceDescriptor>,
    pub advisories: Vec<Advisory>,
    pub outputs: Vec<ServiceName>,
    pub upgrade: Option<UpgradeOutputs>,
}

impl GraphPlan {
    pub fn descriptor(&self, name: &ServiceName) -> Option<&ServiceDescriptor> {
        self.descriptors.iter().find(|d| &d.name == name)
    }

    pub fn endpoint(&self) -> Option<&ServiceDescriptor> {
        self.descriptor(&endpoint_service())
    }
}

pub struct CapabilityGraphBuilder<'a> {
    env: &'a BuildEnvironment,
}

impl<'a> CapabilityGraphBuilder<'a> {
    pub fn new(env: &'a BuildEnvironment) -> Self {
        Self { env }
    }

    pub fn build(&self, config: &EndpointConfig) -> GraphPlan {
        log_listeners(config);

        let endpoint = endpoint_service();
        let requests = request_tracking_service();
        let worker = worker_service();

        let request_tracking = ServiceDescriptor::new(requests.clone(), ServiceKind::RequestTracking);

        // Shared with the native interface.
        let worker_descriptor = ServiceDescriptor::new(worker.clone(), ServiceKind::ManagementWorker).optional();

        let wiring = wiring::resolve(config);
        let endpoint_descriptor = ServiceDescriptor::new(
            endpoint.clone(),
            ServiceKind::Endpoint(EndpointSettings {
                console_mode: config.console_mode(),
                console_slot: self.env.console_slot.clone(),
                allowed_origins: config.allowed_origins.clone(),
            }),
        )
        .requires(CapabilityRequirement::new(
            capabilities::MODEL_CONTROLLER,
            InjectionSlot::ModelController,
        ))
        .requires(CapabilityRequirement::new(
            capabilities::SOCKET_BINDING_MANAGER,
            InjectionSlot::SocketBindingManager,
        ))
        .requires(CapabilityRequirement::new(
            capabilities::PROCESS_STATE,
            InjectionSlot::ProcessState,
        ))
        .requires(CapabilityRequirement::new(
            capabilities::HTTP_LISTENER_REGISTRY,
            InjectionSlot::ListenerRegistry,
        ))
        .requires(CapabilityRequirement::service(&requests, InjectionSlot::RequestProcessor))
        .requires(CapabilityRequirement::service(&worker, InjectionSlot::Worker))
        .requires(CapabilityRequirement::new(
            capabilities::MANAGEMENT_EXECUTOR,
            InjectionSlot::ManagementExecutor,
        ))
        .requires_all(wiring.requirements);

        let advisories: Vec<Advisory> = wiring.advisory.into_iter().collect();
        for advisory in &advisories {
            tracing::warn!(advisory = ?advisory, "{}", advisory);
        }

        // Keeps the process alive until management requests drain.
        let shutdown_guard = ServiceDescriptor::new(shutdown_guard_service(), ServiceKind::ShutdownGuard)
            .requires(CapabilityRequirement::service(&requests, InjectionSlot::RequestProcessor))
            .requires(CapabilityRequirement::new(
                capabilities::SERVER_EXECUTOR,
                InjectionSlot::ServerExecutor,
            ))
            .requires(CapabilityRequirement::new(
                capabilities::CHANNEL_REGISTRY,
                InjectionSlot::ChannelRegistry,
            ))
            .requires(CapabilityRequirement::service(&endpoint, InjectionSlot::Endpoint));

        let mut descriptors = vec![request_tracking, worker_descriptor, endpoint_descriptor, shutdown_guard];
        let mut outputs = vec![endpoint.clone()];
        let mut upgrade = None;

        if config.http_upgrade_enabled {
            let channel = UpgradeChannelInstaller::new(self.env.node_name.clone()).install(config, &endpoint);
            descriptors.extend(channel.descriptors);
            outputs.push(channel.outputs.channel_service.clone());
            upgrade = Some(channel.outputs);
        }

        GraphPlan {
            descriptors,
            advisories,
            outputs,
            upgrade,
        }
    }
}

fn log_listeners(config: &EndpointConfig) {
    match (config.socket_binding(), config.secure_socket_binding()) {
        (Some(plain), Some(secure)) => tracing::info!(
            socket_binding = plain,
            secure_socket_binding = secure,
            "Creating HTTP management service on socket and secure socket"
        ),
        (Some(plain), None) => {
            tracing::info!(socket_binding = plain, "Creating HTTP management service on socket")
        }
        (None, Some(secure)) => tracing::info!(
            secure_socket_binding = secure,
            "Creating HTTP management service on secure socket"
        ),
        (None, None) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_descriptor_order() {
        let env = BuildEnvironment::default();
        let plan = CapabilityGraphBuilder::new(&env).build(&EndpointConfig::plain("http"));

        let names: Vec<&str> = plan.descriptors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "management.http.requests",
                "management.worker",
                "management.http",
                "management.http.shutdown",
            ]
        );
        assert_eq!(plan.outputs, vec![endpoint_service()]);
        assert!(plan.upgrade.is_none());
    }

    #[test]
    fn endpoint_carries_console_settings() {
        let env = BuildEnvironment {
            console_slot: Some("main".into()),
            ..Default::default()
        };
        let mut config = EndpointConfig::plain("http");
        config.console_enabled = true;
        config.allowed_origins = vec!["http://a".into(), "http://b".into()];

        let plan = CapabilityGraphBuilder::new(&env).build(&config);
        let ServiceKind::Endpoint(settings) = &plan.endpoint().unwrap().kind else {
            panic!("expected endpoint kind");
        };
        assert_eq!(settings.console_slot.as_deref(), Some("main"));
        assert_eq!(settings.allowed_origins, vec!["http://a", "http://b"]);
    }

    #[test]
    fn shutdown_guard_depends_on_endpoint_and_tracker() {
        let env = BuildEnvironment::default();
        let plan = CapabilityGraphBuilder::new(&env).build(&EndpointConfig::plain("http"));
        let guard = plan.descriptor(&shutdown_guard_service()).unwrap();

        assert!(guard.has_capability(HTTP_MANAGEMENT));
        assert!(guard.has_capability(request_tracking_service().as_str()));
    }

    #[test]
    fn upgrade_adds_outputs() {
        let env = BuildEnvironment::default();
        let mut config = EndpointConfig::plain("http");
        config.http_upgrade_enabled = true;

        let plan = CapabilityGraphBuilder::new(&env).build(&config);
        assert_eq!(plan.descriptors.len(), 6);
        assert_eq!(plan.outputs.len(), 2);
        assert_eq!(plan.outputs[1].as_str(), "remoting.http-upgrade.management-http");
    }

    #[test]
    fn embedded_admin_only_needs_no_runtime() {
        let embedded = BuildEnvironment {
            process_type: ProcessType::EmbeddedServer,
            running_mode: RunningMode::AdminOnly,
            ..Default::default()
        };
        assert!(!embedded.requires_runtime());

        let server = BuildEnvironment {
            running_mode: RunningMode::AdminOnly,
            ..Default::default()
        };
        assert!(server.requires_runtime());
    }
}
