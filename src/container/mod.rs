//! Reference service container.
//!
//! # Data Flow
//! ```text
//! GraphPlan.descriptors
//!     → skip optional descriptors already installed
//!     → reject duplicate names
//!     → resolve every requirement (batch sibling | installed | registry)
//!     → topological order over sibling dependencies
//!     → commit (all or nothing)
//! ```
//!
//! Errors are reported to the caller unchanged; nothing here retries.

pub mod registry;

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use thiserror::Error;

use crate::graph::descriptor::{ServiceDescriptor, ServiceName};

pub use registry::CapabilityRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstallError {
    #[error("service '{0}' is already installed")]
    DuplicateService(ServiceName),

    #[error("service '{service}' requires capability '{capability}' which is not available")]
    UnresolvedCapability { service: ServiceName, capability: String },

    #[error("dependency cycle between services: {0:?}")]
    DependencyCycle(Vec<ServiceName>),
}

/// Installs descriptor batches. Implemented by the process' service container.
pub trait ServiceTarget {
    fn is_installed(&self, name: &ServiceName) -> bool;

    /// Install a batch, returning the names actually installed in start order.
    fn install_batch(&mut self, batch: Vec<ServiceDescriptor>) -> Result<Vec<ServiceName>, InstallError>;
}

#[derive(Debug, Default)]
pub struct ServiceContainer {
    registry: CapabilityRegistry,
    installed: BTreeMap<ServiceName, ServiceDescriptor>,
    start_order: Vec<ServiceName>,
}

impl ServiceContainer {
    pub fn new(registry: CapabilityRegistry) -> Self {
        Self {
            registry,
            installed: BTreeMap::new(),
            start_order: Vec::new(),
        }
    }

    pub fn get(&self, name: &ServiceName) -> Option<&ServiceDescriptor> {
        self.installed.get(name)
    }

    /// Every installed service in the order it would be started.
    pub fn start_order(&self) -> &[ServiceName] {
        &self.start_order
    }

    fn resolves(&self, batch: &HashMap<String, usize>, resolved: &str) -> bool {
        batch.contains_key(resolved)
            || self.installed.contains_key(&ServiceName::new(resolved))
            || self.registry.contains(resolved)
    }
}

impl ServiceTarget for ServiceContainer {
    fn is_installed(&self, name: &ServiceName) -> bool {
        self.installed.contains_key(name)
    }

    fn install_batch(&mut self, batch: Vec<ServiceDescriptor>) -> Result<Vec<ServiceName>, InstallError> {
        let mut accepted: Vec<ServiceDescriptor> = Vec::with_capacity(batch.len());
        let mut index: HashMap<String, usize> = HashMap::new();

        for descriptor in batch {
            let taken = self.is_installed(&descriptor.name) || index.contains_key(descriptor.name.as_str());
            if taken {
                if descriptor.optional {
                    tracing::debug!(service = %descriptor.name, "Optional service already present, skipping");
                    continue;
                }
                return Err(InstallError::DuplicateService(descriptor.name));
            }
            index.insert(descriptor.name.as_str().to_string(), accepted.len());
            accepted.push(descriptor);
        }

        for descriptor in &accepted {
            for requirement in &descriptor.dependencies {
                let resolved = requirement.resolved_name();
                if !self.resolves(&index, &resolved) {
                    return Err(InstallError::UnresolvedCapability {
                        service: descriptor.name.clone(),
                        capability: resolved,
                    });
                }
            }
        }

        let order = topological_order(&accepted, &index)?;

        let mut slots: Vec<Option<ServiceDescriptor>> = accepted.into_iter().map(Some).collect();
        let mut names = Vec::with_capacity(order.len());
        for position in order {
            if let Some(descriptor) = slots[position].take() {
                tracing::debug!(
                    service = %descriptor.name,
                    dependencies = descriptor.dependencies.len(),
                    "Service installed"
                );
                names.push(descriptor.name.clone());
                self.start_order.push(descriptor.name.clone());
                self.installed.insert(descriptor.name.clone(), descriptor);
            }
        }

        Ok(names)
    }
}

/// Kahn's algorithm over dependencies between batch siblings; ties keep batch order.
fn topological_order(
    batch: &[ServiceDescriptor],
    index: &HashMap<String, usize>,
) -> Result<Vec<usize>, InstallError> {
    let mut in_degree = vec![0usize; batch.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); batch.len()];

    for (position, descriptor) in batch.iter().enumerate() {
        let siblings: HashSet<usize> = descriptor
            .dependencies
            .iter()
            .filter_map(|r| index.get(&r.resolved_name()).copied())
            .filter(|&sibling| sibling != position)
            .collect();
        in_degree[position] = siblings.len();
        for sibling in siblings {
            dependents[sibling].push(position);
        }
    }

    let mut ready: VecDeque<usize> = (0..batch.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(batch.len());

    while let Some(position) = ready.pop_front() {
        order.push(position);
        let mut unlocked = Vec::new();
        for &dependent in &dependents[position] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                unlocked.push(dependent);
            }
        }
        unlocked.sort_unstable();
        ready.extend(unlocked);
    }

    if order.len() != batch.len() {
        let stuck = (0..batch.len())
            .filter(|i| in_degree[*i] > 0)
            .map(|i| batch[i].name.clone())
            .collect();
        return Err(InstallError::DependencyCycle(stuck));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::descriptor::{CapabilityRequirement, InjectionSlot, ServiceKind};

    fn svc(name: &str) -> ServiceDescriptor {
        ServiceDescriptor::new(ServiceName::new(name), ServiceKind::RequestTracking)
    }

    fn on(name: &str) -> CapabilityRequirement {
        CapabilityRequirement::service(&ServiceName::new(name), InjectionSlot::Endpoint)
    }

    #[test]
    fn orders_dependents_after_dependencies() {
        let mut container = ServiceContainer::default();
        let order = container
            .install_batch(vec![svc("c").requires(on("b")), svc("b").requires(on("a")), svc("a")])
            .unwrap();
        let names: Vec<&str> = order.iter().map(ServiceName::as_str).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn unresolved_capability_rejects_whole_batch() {
        let mut container = ServiceContainer::default();
        let err = container
            .install_batch(vec![
                svc("a"),
                svc("b").requires(CapabilityRequirement::qualified(
                    "network.socket-binding",
                    "missing",
                    InjectionSlot::SocketBinding,
                )),
            ])
            .unwrap_err();

        assert_eq!(
            err,
            InstallError::UnresolvedCapability {
                service: ServiceName::new("b"),
                capability: "network.socket-binding.missing".into(),
            }
        );
        assert!(!container.is_installed(&ServiceName::new("a")));
    }

    #[test]
    fn optional_duplicates_are_skipped() {
        let mut container = ServiceContainer::default();
        container.install_batch(vec![svc("worker")]).unwrap();

        let order = container
            .install_batch(vec![svc("worker").optional(), svc("endpoint").requires(on("worker"))])
            .unwrap();
        assert_eq!(order, vec![ServiceName::new("endpoint")]);
    }

    #[test]
    fn mandatory_duplicates_fail() {
        let mut container = ServiceContainer::default();
        container.install_batch(vec![svc("a")]).unwrap();
        assert_eq!(
            container.install_batch(vec![svc("a")]),
            Err(InstallError::DuplicateService(ServiceName::new("a")))
        );
    }

    #[test]
    fn cycles_are_detected() {
        let mut container = ServiceContainer::default();
        let err = container
            .install_batch(vec![svc("a").requires(on("b")), svc("b").requires(on("a"))])
            .unwrap_err();
        assert!(matches!(err, InstallError::DependencyCycle(names) if names.len() == 2));
    }
}
