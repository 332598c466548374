//! HTTP server: accept loop, optional TLS, and the session dispatcher.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming connections, wrapping them in TLS when configured.
//! 3. Serving HTTP/1.1 on each connection with upgrades enabled.
//! 4. Dispatching every request (all paths) to one of: ignore, the static
//!    file collaborator, or WebSocket upgrade + session.
//! 5. Stopping the accept loop when the `running` flag is cleared, either by
//!    Ctrl+C or by the end of the single-shot session.
//!
//! # Scalability
//!
//! Each accepted connection runs in its own Tokio task, and each upgraded
//! session's byte pipe in one more.  The accept loop never blocks on a
//! session.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tokio_tungstenite::tungstenite::protocol::Role;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error, info};

use crate::application::{
    rejection_status, route_request, switching_protocols, validate_upgrade, BridgeError, Route,
};
use crate::domain::{BridgeConfig, RunState, ShutdownGuard};
use crate::infrastructure::session::bridge_websocket;
use crate::infrastructure::static_files::{BridgeBody, StaticFiles};
use crate::infrastructure::tls::load_tls_acceptor;

/// How often the accept loop re-checks the `running` flag while idle.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `config.listen_addr` and serves until `state` stops running.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the TLS material is
/// unusable.  Both are fatal startup failures.
pub async fn run_server(config: BridgeConfig, state: Arc<RunState>) -> anyhow::Result<()> {
    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind listener on {bind_addr}"))?;

    serve(listener, config, state).await
}

/// Serves on an already-bound listener until `state` stops running.
///
/// Split from [`run_server`] so callers can bind port `0` and learn the real
/// address first.
///
/// # Errors
///
/// Returns an error if the TLS material cannot be loaded.
pub async fn serve(
    listener: TcpListener,
    config: BridgeConfig,
    state: Arc<RunState>,
) -> anyhow::Result<()> {
    let tls = match &config.tls {
        Some(paths) => Some(load_tls_acceptor(paths).context("failed to load TLS material")?),
        None => None,
    };

    let local_addr = listener
        .local_addr()
        .context("listener has no local address")?;
    log_settings(&config, local_addr);

    let dispatcher = Dispatcher {
        files: config.web_root.as_ref().map(StaticFiles::new),
        config: Arc::new(config),
        state: Arc::clone(&state),
    };

    loop {
        if !state.is_running() {
            info!("shutdown requested; stopping accept loop");
            break;
        }

        // A short timeout on `accept()` lets the loop notice the flag even
        // when no client is connecting.
        match timeout(ACCEPT_POLL_INTERVAL, listener.accept()).await {
            Ok(Ok((stream, peer))) => {
                debug!("accepted connection from {peer}");
                let dispatcher = dispatcher.clone();
                let tls = tls.clone();
                tokio::spawn(async move {
                    handle_connection(stream, peer, tls, dispatcher).await;
                });
            }
            Ok(Err(e)) => {
                // Transient (e.g. too many open files); keep serving.
                error!("accept error: {e}");
            }
            Err(_) => {}
        }
    }

    Ok(())
}

fn log_settings(config: &BridgeConfig, local_addr: SocketAddr) {
    info!("WebSocket server settings:");
    info!(" - listen on {local_addr}");
    if config.tls_enabled() {
        info!(" - SSL/TLS support");
    } else {
        info!(" - no SSL/TLS support (no cert file)");
    }
    info!(" - proxying {}", config.target_addr);
    if let Some(root) = &config.web_root {
        info!(" - serving files from {}", root.display());
    }
    if config.run_once {
        info!(" - single-shot: exiting after the first session");
    }
}

// ── Per-connection handling ───────────────────────────────────────────────────

async fn handle_connection(
    stream: tokio::net::TcpStream,
    peer: SocketAddr,
    tls: Option<TlsAcceptor>,
    dispatcher: Dispatcher,
) {
    match tls {
        Some(acceptor) => match acceptor.accept(stream).await {
            Ok(tls_stream) => serve_http(tls_stream, peer, dispatcher).await,
            Err(e) => debug!("{peer}: TLS handshake failed: {e}"),
        },
        None => serve_http(stream, peer, dispatcher).await,
    }
}

/// Runs HTTP/1.1 on one connection, keeping upgrades possible.
async fn serve_http<S>(stream: S, peer: SocketAddr, dispatcher: Dispatcher)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let service = service_fn(move |req: Request<Incoming>| {
        let dispatcher = dispatcher.clone();
        async move { Ok::<_, Infallible>(dispatcher.dispatch(req, peer).await) }
    });

    if let Err(e) = http1::Builder::new()
        .serve_connection(TokioIo::new(stream), service)
        .with_upgrades()
        .await
    {
        debug!("{peer}: HTTP connection ended with error: {e}");
    }
}

// ── Session dispatcher ────────────────────────────────────────────────────────

/// Routes each request; cheap to clone (all shared state is behind `Arc`).
#[derive(Clone)]
struct Dispatcher {
    config: Arc<BridgeConfig>,
    state: Arc<RunState>,
    files: Option<StaticFiles>,
}

impl Dispatcher {
    async fn dispatch(&self, req: Request<Incoming>, peer: SocketAddr) -> Response<BridgeBody> {
        let route = route_request(
            req.headers(),
            self.files.is_some(),
            self.state.is_exiting(),
        );

        match route {
            Route::Ignore => {
                debug!("{peer}: shutting down; ignoring {} {}", req.method(), req.uri());
                empty_response(StatusCode::OK)
            }
            Route::ServeFile => match &self.files {
                Some(files) => {
                    debug!("{peer}: serving file {}", req.uri());
                    files.serve(req).await
                }
                None => empty_response(StatusCode::NOT_FOUND),
            },
            Route::Upgrade => self.upgrade(req, peer),
        }
    }

    /// Answers the opening handshake and hands the connection to a session.
    ///
    /// The `101` response has to be returned before hyper releases the
    /// connection, so the session itself runs on a spawned task.
    fn upgrade(&self, mut req: Request<Incoming>, peer: SocketAddr) -> Response<BridgeBody> {
        if !self.state.try_begin_session() {
            // Lost the race for the single-shot slot.
            debug!("{peer}: single-shot session already taken; ignoring request");
            return empty_response(StatusCode::OK);
        }

        // From here on, however this request ends, a single-shot process stops.
        let shutdown = self
            .state
            .run_once()
            .then(|| ShutdownGuard::new(Arc::clone(&self.state)));
        if shutdown.is_some() {
            info!("run once: exiting after this connection");
        }

        let accept = match validate_upgrade(&req) {
            Ok(accept) => accept,
            Err(e) => {
                error!("{peer}: error accepting websocket: {e}");
                return empty_response(rejection_status(&e));
            }
        };

        let on_upgrade = hyper::upgrade::on(&mut req);
        let target = self.config.target_addr.clone();
        tokio::spawn(async move {
            let _shutdown = shutdown;
            let upgraded = match on_upgrade.await {
                Ok(upgraded) => upgraded,
                Err(e) => {
                    error!("{peer}: {}", BridgeError::Upgrade(e.to_string()));
                    return;
                }
            };
            let ws = WebSocketStream::from_raw_socket(TokioIo::new(upgraded), Role::Server, None)
                .await;
            bridge_websocket(ws, &target, peer).await;
        });

        switching_protocols(accept)
    }
}

fn empty_response(status: StatusCode) -> Response<BridgeBody> {
    let mut response = Response::new(BridgeBody::default());
    *response.status_mut() = status;
    response
}
