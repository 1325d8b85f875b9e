//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! socket-binding / secure-socket-binding name
//!     → binding.rs (name → SocketAddr)
//!     → tls.rs (ssl-context → rustls server config, secure listener only)
//!     → Hand off to HTTP layer
//! ```

pub mod binding;
pub mod tls;
