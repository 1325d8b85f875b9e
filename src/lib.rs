//! HTTP management interface library.
//!
//! Installs the management endpoint as a graph of declarative service
//! descriptors and keeps the process alive until management requests drain.

pub mod config;
pub mod container;
pub mod graph;
pub mod http;
pub mod lifecycle;
pub mod management;
pub mod net;
pub mod observability;

pub use config::{EndpointConfig, ManagementConfig};
pub use graph::{install_http_management, CapabilityGraphBuilder};
pub use http::ManagementHttpServer;
pub use lifecycle::ShutdownGate;
