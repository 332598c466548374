//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for all runtime settings.
//! It is populated from CLI arguments in `main.rs` and then shared, read-only,
//! by every connection task.
//!
//! Addresses are kept as `host:port` strings rather than `SocketAddr` because
//! both the listen address and the target may name a host that still has to
//! be resolved (`localhost:5900`, `vnc.internal:5900`).

use std::path::PathBuf;

/// Paths to the PEM files used for TLS termination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    /// Certificate chain, leaf first.
    pub cert: PathBuf,
    /// Private key matching the leaf certificate (PKCS#1, PKCS#8 or SEC1).
    pub key: PathBuf,
}

/// All runtime configuration for the bridge.
///
/// Build this struct once at startup and wrap it in an `Arc` so it can be
/// shared cheaply across all connection tasks.  Nothing mutates it after
/// the listener is bound; in particular no session can override the target.
///
/// # Example
///
/// ```rust
/// use ws_tcp_bridge::domain::BridgeConfig;
///
/// let cfg = BridgeConfig::new("127.0.0.1:8080", "127.0.0.1:5900").with_run_once(true);
/// assert!(cfg.run_once);
/// assert!(!cfg.tls_enabled());
/// assert!(!cfg.file_serving_enabled());
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Address the HTTP/WebSocket listener binds to.
    pub listen_addr: String,

    /// `host:port` of the TCP service every session is bridged to.
    pub target_addr: String,

    /// TLS material; `None` means plaintext HTTP.
    pub tls: Option<TlsPaths>,

    /// Directory served to plain (non-upgrade) requests.
    ///
    /// When `None` every request is treated as an upgrade attempt.
    pub web_root: Option<PathBuf>,

    /// Serve exactly one session, then stop the process.
    pub run_once: bool,
}

impl BridgeConfig {
    /// Plaintext, no file serving, multi-session configuration.
    pub fn new(listen_addr: impl Into<String>, target_addr: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            target_addr: target_addr.into(),
            tls: None,
            web_root: None,
            run_once: false,
        }
    }

    pub fn with_tls(mut self, tls: TlsPaths) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn with_web_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.web_root = Some(dir.into());
        self
    }

    pub fn with_run_once(mut self, run_once: bool) -> Self {
        self.run_once = run_once;
        self
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    pub fn file_serving_enabled(&self) -> bool {
        self.web_root.is_some()
    }

    /// The address to hand to `TcpListener::bind`.
    ///
    /// An empty host (`:8080`) means "every interface", so it is expanded to
    /// `0.0.0.0:8080`.  Anything else is returned unchanged.
    pub fn bind_addr(&self) -> String {
        normalize_listen_addr(&self.listen_addr)
    }
}

fn normalize_listen_addr(addr: &str) -> String {
    match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => addr.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_plaintext_without_file_serving() {
        // Arrange / Act
        let cfg = BridgeConfig::new("0.0.0.0:8080", "127.0.0.1:9000");
        // Assert
        assert!(!cfg.tls_enabled());
        assert!(!cfg.file_serving_enabled());
        assert!(!cfg.run_once);
        assert_eq!(cfg.target_addr, "127.0.0.1:9000");
    }

    #[test]
    fn test_with_web_root_enables_file_serving() {
        let cfg = BridgeConfig::new("0.0.0.0:8080", "127.0.0.1:9000").with_web_root("./public");
        assert!(cfg.file_serving_enabled());
        assert_eq!(cfg.web_root, Some(PathBuf::from("./public")));
    }

    #[test]
    fn test_with_tls_enables_tls() {
        let cfg = BridgeConfig::new("0.0.0.0:8443", "127.0.0.1:9000").with_tls(TlsPaths {
            cert: "cert.pem".into(),
            key: "key.pem".into(),
        });
        assert!(cfg.tls_enabled());
    }

    #[test]
    fn test_bind_addr_expands_empty_host() {
        let cfg = BridgeConfig::new(":8080", "127.0.0.1:9000");
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_bind_addr_keeps_explicit_host() {
        let cfg = BridgeConfig::new("localhost:8080", "127.0.0.1:9000");
        assert_eq!(cfg.bind_addr(), "localhost:8080");
    }

    #[test]
    fn test_config_can_be_cloned() {
        // Cloneability is required so an Arc<BridgeConfig> can be shared
        // across connection tasks.
        let cfg = BridgeConfig::new("127.0.0.1:1", "127.0.0.1:2").with_run_once(true);
        let cloned = cfg.clone();
        assert_eq!(cfg.listen_addr, cloned.listen_addr);
        assert_eq!(cfg.target_addr, cloned.target_addr);
        assert_eq!(cfg.run_once, cloned.run_once);
    }
}
