//! Domain layer for ws-tcp-bridge.
//!
//! The domain layer contains pure types that have no dependencies on I/O,
//! networking, or external frameworks.
//!
//! # What belongs in the domain layer?
//!
//! - Configuration structures
//! - The process-wide run state (single-shot gate and shutdown flag)
//! - Session identity types
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `TcpStream`, or `WebSocket` types
//! - File I/O or environment variable reading

pub mod config;
pub mod run_state;
pub mod session;

pub use config::{BridgeConfig, TlsPaths};
pub use run_state::{RunState, ShutdownGuard};
pub use session::SessionId;
