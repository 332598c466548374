//! Error taxonomy for the bridge.
//!
//! Per-session failures (negotiation, dial, upgrade) are logged where they
//! happen and never leave the connection task.  Only [`BridgeError::Tls`]
//! surfaces at startup, where `main` turns it into a non-zero exit.

use thiserror::Error;

/// Errors that can end a request or stop the bridge from starting.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The upgrade request did not use the GET method.
    #[error("websocket upgrade requires GET, got {0}")]
    NotGet(String),

    /// `Connection` did not carry the `upgrade` token.
    #[error("'Connection' header does not contain 'upgrade'")]
    MissingConnectionUpgrade,

    /// `Upgrade` did not carry the `websocket` token.
    #[error("'Upgrade' header does not contain 'websocket'")]
    MissingUpgradeHeader,

    /// `Sec-WebSocket-Version` was absent or not 13.
    #[error("unsupported websocket version {0:?}")]
    UnsupportedVersion(String),

    /// `Sec-WebSocket-Key` was absent or empty.
    #[error("missing 'Sec-WebSocket-Key' header")]
    MissingKey,

    /// The derived accept key could not be placed in a header.
    #[error("invalid 'Sec-WebSocket-Key' header")]
    InvalidKey,

    /// A browser page from another origin tried to open the socket.
    #[error("origin {origin:?} does not match host {host:?}")]
    CrossOrigin { origin: String, host: String },

    /// The `101` response went out but the connection could not be taken over.
    #[error("protocol upgrade failed: {0}")]
    Upgrade(String),

    /// The TCP target refused or could not be reached.
    #[error("failed to connect to target {target}: {source}")]
    Dial {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// Certificate or key material is missing or unusable.
    #[error("invalid TLS material: {0}")]
    Tls(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dial_error_mentions_target() {
        let err = BridgeError::Dial {
            target: "127.0.0.1:9".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        };
        assert!(err.to_string().contains("127.0.0.1:9"));
    }

    #[test]
    fn test_cross_origin_message_names_both_hosts() {
        let err = BridgeError::CrossOrigin {
            origin: "evil.example".into(),
            host: "bridge.local:8080".into(),
        };
        let text = err.to_string();
        assert!(text.contains("evil.example"));
        assert!(text.contains("bridge.local:8080"));
    }
}
