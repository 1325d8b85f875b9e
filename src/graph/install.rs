//! The install operation of the HTTP management interface.

use crate::config::EndpointConfig;
use crate::container::{InstallError, ServiceTarget};
use crate::graph::builder::{BuildEnvironment, CapabilityGraphBuilder};
use crate::graph::descriptor::ServiceName;
use crate::graph::upgrade::UpgradeOutputs;
use crate::graph::wiring::Advisory;

/// What the install operation exposes to its caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Endpoint service, plus the upgrade channel when enabled.
    pub services: Vec<ServiceName>,
    /// Services installed by this operation, in start order.
    pub start_order: Vec<ServiceName>,
    pub advisories: Vec<Advisory>,
    pub upgrade: Option<UpgradeOutputs>,
}

impl InstallOutcome {
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

pub fn install_http_management<T: ServiceTarget>(
    config: &EndpointConfig,
    env: &BuildEnvironment,
    target: &mut T,
) -> Result<InstallOutcome, InstallError> {
    if !env.requires_runtime() {
        tracing::debug!("Embedded admin-only process, HTTP management runtime not installed");
        return Ok(InstallOutcome::default());
    }

    let plan = CapabilityGraphBuilder::new(env).build(config);
    let start_order = target.install_batch(plan.descriptors)?;

    tracing::info!(
        services = ?plan.outputs.iter().map(ServiceName::as_str).collect::<Vec<_>>(),
        installed = start_order.len(),
        "HTTP management interface installed"
    );

    Ok(InstallOutcome {
        services: plan.outputs,
        start_order,
        advisories: plan.advisories,
        upgrade: plan.upgrade,
    })
}
