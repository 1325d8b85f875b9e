//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Install service graph → Resolve bindings/TLS/credentials → EndpointRuntime
//!
//! Shutdown (shutdown.rs):
//!     begin_shutdown → reject new requests → drain in-flight → Terminated
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → begin the management drain
//! ```
//!
//! # Design Decisions
//! - Listeners stop only after the drain resolves
//! - The drain has an optional deadline; past it shutdown is forced

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Admission, DrainOutcome, Phase, RequestPermit, ShutdownGate, ShutdownHandle};
