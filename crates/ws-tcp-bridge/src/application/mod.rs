//! Application layer for ws-tcp-bridge.
//!
//! The application layer knows *what* to do with a request, but delegates
//! *how* to do it to the infrastructure layer.
//!
//! # Responsibilities
//!
//! - Deciding whether a request is ignored, served from disk, or upgraded
//! - Validating the WebSocket opening handshake and building the `101` reply
//! - Defining the `BridgeError` type for per-request and startup failures
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or listening for connections (that is infrastructure)
//! - Tokio task spawning
//! - WebSocket framing (handled by tokio-tungstenite)

pub mod dispatch;
pub mod error;
pub mod handshake;

pub use dispatch::{route_request, wants_upgrade, Route};
pub use error::BridgeError;
pub use handshake::{rejection_status, switching_protocols, validate_upgrade};
