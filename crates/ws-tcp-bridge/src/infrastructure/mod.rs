//! Infrastructure layer for ws-tcp-bridge.
//!
//! The infrastructure layer handles all I/O: accepting HTTP(S) connections,
//! serving files, completing WebSocket upgrades and relaying bytes to the
//! TCP target.
//!
//! # Responsibilities
//!
//! - Binding the listener and running the accept loop
//! - TLS termination when a certificate is configured
//! - Handing plain requests to the file-serving collaborator
//! - Opening the TCP connection to the target for each session
//! - Running the two relay directions of each session
//!
//! # What does NOT belong here?
//!
//! - Routing and handshake decisions (that is the application layer)
//! - Configuration parsing (that is done in `main.rs`)

pub mod server;
pub mod session;
pub mod static_files;
pub mod target_conn;
pub mod tls;

pub use server::{run_server, serve};
pub use session::{bridge_websocket, run_session, RelayStats, RELAY_BUFFER_SIZE};
