//! TCP connection to the bridged target service.
//!
//! Each WebSocket session gets its own TCP connection to the target.  The
//! target never learns that the bytes it reads arrived as WebSocket frames.
//!
//! # Portability note
//!
//! This module uses only the `tokio::net::TcpStream` API, which works
//! identically on Windows, Linux, and macOS.

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::debug;

use crate::application::BridgeError;

/// A TCP connection to the target, already split into halves.
///
/// The two halves go to the two relay directions: the byte pipe owns
/// `read_half`, the frame unwrapper owns `write_half`.  Because each half has
/// exactly one owner, each is released exactly once.
pub struct TargetConnection {
    /// Read half: target → WebSocket.
    pub read_half: OwnedReadHalf,
    /// Write half: WebSocket → target.
    pub write_half: OwnedWriteHalf,
}

impl TargetConnection {
    /// Opens a TCP connection to `target` (`host:port`, resolved if needed).
    ///
    /// There is no retry: a refused or unreachable target ends the attempt and
    /// the client must reconnect.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Dial`] if name resolution or the TCP handshake
    /// fails.
    pub async fn connect(target: &str) -> Result<Self, BridgeError> {
        let stream = TcpStream::connect(target)
            .await
            .map_err(|source| BridgeError::Dial {
                target: target.to_string(),
                source,
            })?;

        // Relay chunks are small and latency-sensitive (terminal and VNC
        // traffic), so don't let Nagle hold them back.
        if let Err(e) = stream.set_nodelay(true) {
            debug!("could not disable Nagle on connection to {target}: {e}");
        }

        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            read_half,
            write_half,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
