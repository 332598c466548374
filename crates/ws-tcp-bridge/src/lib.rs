//! ws-tcp-bridge library crate.
//!
//! This crate relays a single WebSocket connection to a single raw TCP
//! connection so that a WebSocket-only client (typically a browser) can talk
//! to an arbitrary TCP service.  Binary frames from the client become raw
//! bytes on the TCP socket; raw bytes from the TCP socket become binary frames.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browser (binary WebSocket frames)
//!         ↕
//! [ws-tcp-bridge]
//!   ├── domain/           Pure types: BridgeConfig, RunState, SessionId
//!   ├── application/      Routing + handshake decisions, BridgeError
//!   └── infrastructure/
//!         ├── server/       Accept loop, TLS, HTTP dispatch (hyper)
//!         ├── static_files/ File-serving collaborator (tower-http ServeDir)
//!         ├── target_conn/  TCP dial to the configured target
//!         ├── tls/          PEM certificate + key loading (rustls)
//!         └── session/      Bridge supervisor and the two relay directions
//!         ↕
//! TCP service (raw bytes)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O (no sockets, no async, no frameworks).
//! - `application` depends on `domain` and on HTTP/WebSocket *types* only.
//! - `infrastructure` depends on all other layers plus `tokio`, `hyper`,
//!   `tokio-tungstenite`, `tower-http` and `tokio-rustls`.

/// Domain layer: pure configuration and run-state types (no I/O).
pub mod domain;

/// Application layer: request routing and handshake validation.
pub mod application;

/// Infrastructure layer: HTTP server, TLS, file serving and the byte relay.
pub mod infrastructure;
