//! ws-tcp-bridge: entry point.
//!
//! Accepts WebSocket connections on one HTTP(S) listener and relays each of
//! them, byte for byte, to a fixed TCP target.  Lets a browser talk to a
//! VNC server, a serial-over-TCP console, or any other raw TCP service.
//!
//! # Usage
//!
//! ```text
//! ws-tcp-bridge [OPTIONS] <LISTEN> <TARGET>
//!
//! Arguments:
//!   <LISTEN>  Address to listen on, e.g. 0.0.0.0:8080 or :8080
//!   <TARGET>  TCP service to bridge to, e.g. 127.0.0.1:5900
//!
//! Options:
//!   -v, --verbose      Log per-connection events
//!       --cert <PATH>  TLS certificate chain (PEM)
//!       --key <PATH>   TLS private key (PEM)
//!       --web <DIR>    Serve files from DIR to non-WebSocket requests
//!       --run-once     Handle a single WebSocket connection and exit
//!   -h, --help         Print help
//! ```
//!
//! The long options may also be written with a single dash (`-cert`,
//! `-web`, `-run-once`, ...).
//!
//! # Environment variable overrides
//!
//! | Variable             | Description                   |
//! |----------------------|-------------------------------|
//! | `WS_TCP_BRIDGE_CERT` | TLS certificate chain (PEM)   |
//! | `WS_TCP_BRIDGE_KEY`  | TLS private key (PEM)         |
//! | `WS_TCP_BRIDGE_WEB`  | Directory to serve files from |
//! | `RUST_LOG`           | Overrides the `-v` log filter |

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ws_tcp_bridge::domain::{BridgeConfig, RunState, TlsPaths};
use ws_tcp_bridge::infrastructure::run_server;

/// Long options that are also accepted with a single leading dash.
const SINGLE_DASH_LONG_OPTIONS: &[&str] = &["cert", "key", "web", "run-once", "help", "verbose"];

// ── CLI argument definitions ──────────────────────────────────────────────────

/// WebSocket to TCP bridge.
///
/// Every WebSocket connection accepted on LISTEN is relayed to TARGET: binary
/// frames become raw bytes and raw bytes become binary frames.
#[derive(Debug, Parser)]
#[command(
    name = "ws-tcp-bridge",
    about = "Relays WebSocket connections to a raw TCP service",
    version
)]
struct Cli {
    /// Address to listen on, e.g. `0.0.0.0:8080` or `:8080`.
    listen: String,

    /// TCP service every session is bridged to, e.g. `127.0.0.1:5900`.
    target: String,

    /// Log per-connection events (connect, disconnect, file served).
    #[arg(short, long)]
    verbose: bool,

    /// TLS certificate chain in PEM format; enables HTTPS/WSS.
    #[arg(long, value_name = "PATH", env = "WS_TCP_BRIDGE_CERT", requires = "key")]
    cert: Option<PathBuf>,

    /// TLS private key in PEM format.
    #[arg(long, value_name = "PATH", env = "WS_TCP_BRIDGE_KEY", requires = "cert")]
    key: Option<PathBuf>,

    /// Serve files from DIR to requests that are not WebSocket upgrades.
    #[arg(long, value_name = "DIR", env = "WS_TCP_BRIDGE_WEB")]
    web: Option<PathBuf>,

    /// Handle a single WebSocket connection and exit.
    #[arg(long = "run-once")]
    run_once: bool,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`BridgeConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the listen or target address is empty.
    fn into_bridge_config(self) -> anyhow::Result<BridgeConfig> {
        if self.listen.trim().is_empty() {
            anyhow::bail!("listen address must not be empty");
        }
        if self.target.trim().is_empty() {
            anyhow::bail!("target address must not be empty");
        }

        let mut config = BridgeConfig::new(self.listen, self.target).with_run_once(self.run_once);
        if let (Some(cert), Some(key)) = (self.cert, self.key) {
            config = config.with_tls(TlsPaths { cert, key });
        }
        if let Some(dir) = self.web {
            config = config.with_web_root(dir);
        }
        Ok(config)
    }
}

/// Rewrites `-cert` style options to `--cert` so clap recognises them.
///
/// Only the names in [`SINGLE_DASH_LONG_OPTIONS`] are touched, with or
/// without an attached `=value`.  Everything after a bare `--` is left alone.
fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen_terminator = false;
    args.into_iter()
        .map(|arg| {
            if seen_terminator {
                return arg;
            }
            if arg == "--" {
                seen_terminator = true;
                return arg;
            }
            match arg.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split('=').next().unwrap_or(rest);
                    if SINGLE_DASH_LONG_OPTIONS.contains(&name) {
                        format!("-{arg}")
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// 1. Parse CLI arguments (`-h` prints usage and exits 0 here).
/// 2. Initialise `tracing_subscriber`: `info` by default, `debug` for this
///    crate with `-v`, or whatever `RUST_LOG` says.
/// 3. Spawn a Ctrl+C handler that clears the shared `running` flag.
/// 4. Run the server until the flag is cleared (Ctrl+C, or the end of the
///    single-shot session).
///
/// Bind failures and bad TLS material end the process with a non-zero code.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args()));

    let default_filter = if cli.verbose {
        "info,ws_tcp_bridge=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = cli.into_bridge_config().context("invalid configuration")?;
    let state = Arc::new(RunState::new(config.run_once));

    let state_for_signal = Arc::clone(&state);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; shutting down");
                state_for_signal.request_shutdown();
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    if let Err(e) = run_server(config, Arc::clone(&state)).await {
        error!("{e:#}");
        return Err(e);
    }

    if state.run_once() {
        info!("run once: good bye");
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positionals_are_listen_then_target() {
        let cli = Cli::parse_from(["ws-tcp-bridge", ":8080", "127.0.0.1:9000"]);
        assert_eq!(cli.listen, ":8080");
        assert_eq!(cli.target, "127.0.0.1:9000");
        assert!(!cli.verbose);
        assert!(!cli.run_once);
    }

    #[test]
    fn test_missing_target_is_rejected() {
        let result = Cli::try_parse_from(["ws-tcp-bridge", ":8080"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_help_flag_is_display_help() {
        let err = Cli::try_parse_from(["ws-tcp-bridge", "-h"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_short_verbose_flag() {
        let cli = Cli::parse_from(["ws-tcp-bridge", "-v", ":8080", "127.0.0.1:9000"]);
        assert!(cli.verbose);
    }

    #[test]
    fn test_normalize_rewrites_single_dash_long_options() {
        // Arrange
        let raw = args(&[
            "ws-tcp-bridge",
            "-cert",
            "c.pem",
            "-key=k.pem",
            "-web",
            "./public",
            "-run-once",
            "-v",
        ]);

        // Act
        let normalized = normalize_args(raw);

        // Assert: long names gain a dash, the short flag is untouched
        assert_eq!(
            normalized,
            args(&[
                "ws-tcp-bridge",
                "--cert",
                "c.pem",
                "--key=k.pem",
                "--web",
                "./public",
                "--run-once",
                "-v",
            ])
        );
    }

    #[test]
    fn test_normalize_leaves_values_and_terminator_alone() {
        let raw = args(&["ws-tcp-bridge", "--", "-web", ":8080"]);
        assert_eq!(normalize_args(raw.clone()), raw);
    }

    #[test]
    fn test_single_dash_options_parse_after_normalizing() {
        let cli = Cli::parse_from(normalize_args(args(&[
            "ws-tcp-bridge",
            "-web",
            "./public",
            "-run-once",
            ":8080",
            "127.0.0.1:9000",
        ])));
        assert_eq!(cli.web, Some(PathBuf::from("./public")));
        assert!(cli.run_once);
    }

    #[test]
    fn test_cert_without_key_is_rejected() {
        let result = Cli::try_parse_from([
            "ws-tcp-bridge",
            "--cert",
            "c.pem",
            ":8080",
            "127.0.0.1:9000",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_into_bridge_config_maps_every_option() {
        // Arrange
        let cli = Cli::parse_from([
            "ws-tcp-bridge",
            "--cert",
            "c.pem",
            "--key",
            "k.pem",
            "--web",
            "./public",
            "--run-once",
            "0.0.0.0:8443",
            "10.0.0.5:5900",
        ]);

        // Act
        let config = cli.into_bridge_config().unwrap();

        // Assert
        assert_eq!(config.listen_addr, "0.0.0.0:8443");
        assert_eq!(config.target_addr, "10.0.0.5:5900");
        assert_eq!(
            config.tls,
            Some(TlsPaths {
                cert: PathBuf::from("c.pem"),
                key: PathBuf::from("k.pem"),
            })
        );
        assert_eq!(config.web_root, Some(PathBuf::from("./public")));
        assert!(config.run_once);
    }

    #[test]
    fn test_into_bridge_config_defaults_to_plain_multi_session() {
        let cli = Cli::parse_from(["ws-tcp-bridge", ":8080", "127.0.0.1:9000"]);
        let config = cli.into_bridge_config().unwrap();
        assert!(!config.tls_enabled());
        assert!(!config.file_serving_enabled());
        assert!(!config.run_once);
    }

    #[test]
    fn test_into_bridge_config_empty_target_is_error() {
        let cli = Cli {
            listen: ":8080".to_string(),
            target: "  ".to_string(),
            verbose: false,
            cert: None,
            key: None,
            web: None,
            run_once: false,
        };
        assert!(cli.into_bridge_config().is_err());
    }
}
