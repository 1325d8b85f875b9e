//! Service graph of the HTTP management interface.
//!
//! # Data Flow
//! ```text
//! EndpointConfig
//!     → builder.rs (fixed descriptor order: requests, worker, endpoint, shutdown guard)
//!         → wiring.rs (listeners, authentication, TLS requirements)
//!         → upgrade.rs (only when http-upgrade-enabled)
//!     → GraphPlan (declarative descriptors + advisories + outputs)
//!     → install.rs → ServiceTarget::install_batch
//! ```
//!
//! # Design Decisions
//! - Output is pure data; nothing here holds resolved values
//! - Process-wide facts arrive through `BuildEnvironment`, not global lookups
//! - Optional attributes are matched as sum types so precedence is exhaustive

pub mod builder;
pub mod descriptor;
pub mod install;
pub mod upgrade;
pub mod wiring;

pub use builder::{BuildEnvironment, CapabilityGraphBuilder, GraphPlan};
pub use descriptor::{CapabilityRequirement, ConnectorIdentity, InjectionSlot, ServiceDescriptor, ServiceKind, ServiceName};
pub use install::{install_http_management, InstallOutcome};
pub use upgrade::{UpgradeChannelInstaller, UpgradeOutputs};
pub use wiring::{Advisory, AuthenticationSource};
