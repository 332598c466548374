//! WebSocket opening handshake (RFC 6455 §4.2).
//!
//! [`validate_upgrade`] checks the client's request and derives the
//! `Sec-WebSocket-Accept` value; [`switching_protocols`] builds the `101`
//! reply.  Taking over the connection afterwards is the infrastructure
//! layer's job.
//!
//! Browsers attach an `Origin` header to every WebSocket request.  When it is
//! present its host must equal the request's `Host`, which stops a page on
//! another site from opening a tunnel through a visitor's browser.  Non-browser
//! clients usually send no `Origin` and are not affected.

use hyper::http::header::{
    CONNECTION, HOST, ORIGIN, SEC_WEBSOCKET_ACCEPT, SEC_WEBSOCKET_KEY, SEC_WEBSOCKET_VERSION,
    UPGRADE,
};
use hyper::http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Response, StatusCode};
use tokio_tungstenite::tungstenite::handshake::derive_accept_key;

use super::error::BridgeError;

/// The only protocol version RFC 6455 defines.
const WEBSOCKET_VERSION: &str = "13";

/// Validates an opening handshake and returns the `Sec-WebSocket-Accept` value.
///
/// # Errors
///
/// Returns the first negotiation failure found, in the order method,
/// `Connection`, `Upgrade`, `Sec-WebSocket-Version`, `Sec-WebSocket-Key`,
/// `Origin`.
pub fn validate_upgrade<B>(req: &Request<B>) -> Result<HeaderValue, BridgeError> {
    if req.method() != Method::GET {
        return Err(BridgeError::NotGet(req.method().to_string()));
    }

    let headers = req.headers();
    if !header_has_token(headers, &CONNECTION, "upgrade") {
        return Err(BridgeError::MissingConnectionUpgrade);
    }
    if !header_has_token(headers, &UPGRADE, "websocket") {
        return Err(BridgeError::MissingUpgradeHeader);
    }

    let version = headers
        .get(SEC_WEBSOCKET_VERSION)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).trim().to_string())
        .unwrap_or_default();
    if version != WEBSOCKET_VERSION {
        return Err(BridgeError::UnsupportedVersion(version));
    }

    let key = headers
        .get(SEC_WEBSOCKET_KEY)
        .map(|v| v.as_bytes())
        .filter(|k| !k.is_empty())
        .ok_or(BridgeError::MissingKey)?;

    check_same_origin(headers)?;

    HeaderValue::from_str(&derive_accept_key(key)).map_err(|_| BridgeError::InvalidKey)
}

/// Builds the `101 Switching Protocols` response for an accepted handshake.
pub fn switching_protocols<B: Default>(accept: HeaderValue) -> Response<B> {
    let mut response = Response::new(B::default());
    *response.status_mut() = StatusCode::SWITCHING_PROTOCOLS;
    let headers = response.headers_mut();
    headers.insert(CONNECTION, HeaderValue::from_static("Upgrade"));
    headers.insert(UPGRADE, HeaderValue::from_static("websocket"));
    headers.insert(SEC_WEBSOCKET_ACCEPT, accept);
    response
}

/// Maps a negotiation failure to the HTTP status the client receives.
pub fn rejection_status(err: &BridgeError) -> StatusCode {
    match err {
        BridgeError::NotGet(_) => StatusCode::METHOD_NOT_ALLOWED,
        BridgeError::CrossOrigin { .. } => StatusCode::FORBIDDEN,
        _ => StatusCode::BAD_REQUEST,
    }
}

/// `true` if any comma-separated token of any `name` header equals `token`,
/// ignoring ASCII case.
fn header_has_token(headers: &HeaderMap, name: &HeaderName, token: &str) -> bool {
    headers.get_all(name).iter().any(|value| {
        String::from_utf8_lossy(value.as_bytes())
            .split(',')
            .any(|t| t.trim().eq_ignore_ascii_case(token))
    })
}

fn check_same_origin(headers: &HeaderMap) -> Result<(), BridgeError> {
    let Some(origin) = headers.get(ORIGIN) else {
        return Ok(());
    };
    let origin = String::from_utf8_lossy(origin.as_bytes()).to_string();
    let host = headers
        .get(HOST)
        .map(|h| String::from_utf8_lossy(h.as_bytes()).to_string())
        .unwrap_or_default();

    // "scheme://host[:port][/...]" → "host[:port]"
    let origin_host = origin
        .split_once("://")
        .map(|(_, rest)| rest.split('/').next().unwrap_or(rest))
        .unwrap_or("");

    if !origin_host.is_empty() && origin_host.eq_ignore_ascii_case(&host) {
        Ok(())
    } else {
        Err(BridgeError::CrossOrigin { origin, host })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
