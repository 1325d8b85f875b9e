//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → admission gate (503 once shutdown begins)
//!     → management routes
//! ```

pub mod request;
pub mod server;

pub use request::{MakeManagementRequestId, X_REQUEST_ID};
pub use server::ManagementHttpServer;
