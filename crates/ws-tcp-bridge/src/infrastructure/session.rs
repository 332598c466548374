//! One bridged session: WebSocket client ↔ TCP target.
//!
//! A session runs two independent relay directions:
//!
//! ```text
//!            ┌──────────── byte pipe (spawned task) ───────────┐
//! TCP read ──┤ read ≤ RELAY_BUFFER_SIZE bytes → one Binary frame├──→ WS sink
//!            └──────────────────────────────────────────────────┘
//!            ┌──────────── frame unwrapper (inline) ────────────┐
//! WS stream ─┤ one message → its payload bytes                  ├──→ TCP write
//!            └──────────────────────────────────────────────────┘
//! ```
//!
//! # Teardown
//!
//! Both directions share one [`CancellationToken`].  Whichever direction ends
//! first (EOF, I/O error, close frame) cancels it, and every blocking read or
//! write in the other direction is raced against `cancelled()`, so the peer
//! exits at its current await point instead of waiting for its next I/O call
//! to fail.  Each direction then closes only the half it owns: the pipe
//! closes the WebSocket sink, the unwrapper shuts down the TCP write half.
//! Errors from closing something the remote already closed are expected and
//! only logged.
//!
//! # Framing
//!
//! No reassembly: one TCP read becomes one WebSocket frame, so a message the
//! target wrote in one call may reach the client as several frames.

use std::fmt::Display;
use std::net::SocketAddr;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::domain::SessionId;
use crate::infrastructure::target_conn::TargetConnection;

/// Upper bound on the bytes carried by one outgoing WebSocket frame.
pub const RELAY_BUFFER_SIZE: usize = 1024;

/// Byte counts forwarded by each direction of a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// TCP → WebSocket.
    pub to_client: u64,
    /// WebSocket → TCP.
    pub to_target: u64,
}

// ── Session entry point ───────────────────────────────────────────────────────

/// Dials `target` for a freshly upgraded WebSocket and relays until either
/// side goes away.
///
/// A dial failure closes the WebSocket and returns without creating a
/// session.  Nothing here returns an error: every per-session failure ends
/// the session and is logged.
pub async fn bridge_websocket<S>(mut ws: WebSocketStream<S>, target: &str, peer: SocketAddr)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let id = SessionId::new();
    debug!("session {id}: received connection from {peer}");

    let target_conn = match TargetConnection::connect(target).await {
        Ok(conn) => conn,
        Err(e) => {
            error!("session {id}: {e}");
            if let Err(e) = ws.close(None).await {
                debug!("session {id}: closing WebSocket after dial failure: {e}");
            }
            return;
        }
    };
    debug!("session {id}: connected to target {target}");

    let stats = run_session(id, ws, target_conn).await;

    debug!(
        "session {id}: closed connection from {peer} ({} bytes to client, {} bytes to target)",
        stats.to_client, stats.to_target
    );
}

/// Bridge supervisor: owns both connections for the lifetime of the session.
///
/// Spawns the byte pipe, runs the frame unwrapper on the calling task, then
/// cancels the pipe and waits for it so both halves of both connections have
/// been released by the time this returns.
pub async fn run_session<S>(
    id: SessionId,
    ws: WebSocketStream<S>,
    target: TargetConnection,
) -> RelayStats
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (ws_tx, ws_rx) = ws.split();
    let cancel = CancellationToken::new();

    let pipe = tokio::spawn(pipe_tcp_to_ws(
        id,
        target.read_half,
        ws_tx,
        cancel.clone(),
    ));

    let to_target = unwrap_ws_to_tcp(id, ws_rx, target.write_half, cancel.clone()).await;

    cancel.cancel();
    let to_client = match pipe.await {
        Ok(n) => n,
        Err(e) => {
            warn!("session {id}: byte pipe task failed: {e}");
            0
        }
    };

    RelayStats {
        to_client,
        to_target,
    }
}

// ── TCP → WebSocket ───────────────────────────────────────────────────────────

/// Byte pipe: forwards TCP bytes to the client, one binary frame per read.
///
/// Ends on EOF, read error, send error, or cancellation; always cancels the
/// session and closes the sink on the way out.  Returns the bytes forwarded.
pub async fn pipe_tcp_to_ws<R, W>(
    id: SessionId,
    mut tcp_rx: R,
    mut ws_tx: W,
    cancel: CancellationToken,
) -> u64
where
    R: AsyncRead + Unpin,
    W: Sink<WsMessage> + Unpin,
    W::Error: Display,
{
    let mut buf = [0u8; RELAY_BUFFER_SIZE];
    let mut forwarded = 0u64;

    loop {
        let n = tokio::select! {
            _ = cancel.cancelled() => break,
            read = tcp_rx.read(&mut buf) => match read {
                Ok(0) => {
                    debug!("session {id}: target closed the connection (EOF)");
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    debug!("session {id}: read from target failed: {e}");
                    break;
                }
            },
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = ws_tx.send(WsMessage::Binary(buf[..n].to_vec())) => {
                if let Err(e) = sent {
                    debug!("session {id}: send to client failed: {e}");
                    break;
                }
            }
        }
        forwarded += n as u64;
    }

    cancel.cancel();
    if let Err(e) = ws_tx.close().await {
        debug!("session {id}: WebSocket already closed: {e}");
    }
    forwarded
}

// ── WebSocket → TCP ───────────────────────────────────────────────────────────

/// Frame unwrapper: writes each client message's payload to the target.
///
/// Binary payloads are the contract; text payloads are forwarded unchanged
/// but logged, since the client is expected to speak binary.  Control frames
/// are skipped (tungstenite answers pings itself).  Ends on close frame,
/// stream end, read error, write error, or cancellation; always cancels the
/// session and shuts down the TCP write half on the way out.  Returns the
/// bytes forwarded.
pub async fn unwrap_ws_to_tcp<R, E, W>(
    id: SessionId,
    mut ws_rx: R,
    mut tcp_tx: W,
    cancel: CancellationToken,
) -> u64
where
    R: Stream<Item = Result<WsMessage, E>> + Unpin,
    E: Display,
    W: AsyncWrite + Unpin,
{
    let mut forwarded = 0u64;

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = ws_rx.next() => next,
        };

        let payload = match next {
            Some(Ok(WsMessage::Binary(data))) => data,
            Some(Ok(WsMessage::Text(text))) => {
                warn!("session {id}: non-binary message received; forwarding as-is");
                text.into_bytes()
            }
            Some(Ok(WsMessage::Close(_))) => {
                debug!("session {id}: client sent Close");
                break;
            }
            Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => continue,
            Some(Err(e)) => {
                debug!("session {id}: read from client failed: {e}");
                break;
            }
            None => {
                debug!("session {id}: client stream ended");
                break;
            }
        };

        // `write_all` fails with `WriteZero` if the socket stops accepting
        // bytes, which ends the session.  An empty payload writes nothing.
        tokio::select! {
            _ = cancel.cancelled() => break,
            written = tcp_tx.write_all(&payload) => {
                if let Err(e) = written {
                    debug!("session {id}: write to target failed: {e}");
                    break;
                }
            }
        }
        forwarded += payload.len() as u64;
    }

    cancel.cancel();
    if let Err(e) = tcp_tx.shutdown().await {
        debug!("session {id}: target already closed: {e}");
    }
    forwarded
}

// ── Tests ─────────────────────────────────────────────────────────────────────
