//! TLS termination.
//!
//! Loads a PEM certificate chain and private key into a rustls
//! [`ServerConfig`] and wraps it in a [`TlsAcceptor`].  This runs once at
//! startup; any problem with the files is fatal for the process.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

use crate::application::BridgeError;
use crate::domain::TlsPaths;

/// Builds a TLS acceptor from the configured certificate and key files.
///
/// # Errors
///
/// Returns an error if either file cannot be read, contains no usable PEM
/// item, or the key does not match the certificate.
pub fn load_tls_acceptor(paths: &TlsPaths) -> anyhow::Result<TlsAcceptor> {
    let certs = load_certs(&paths.cert)?;
    let key = load_private_key(&paths.key)?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .context("TLS provider rejected the default protocol versions")?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| BridgeError::Tls(e.to_string()))
        .with_context(|| {
            format!(
                "certificate {} does not match key {}",
                paths.cert.display(),
                paths.key.display()
            )
        })?;

    // Only HTTP/1.1 carries the WebSocket upgrade here.
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn load_certs(path: &Path) -> anyhow::Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open certificate file {}", path.display()))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("failed to parse certificate file {}", path.display()))?;

    if certs.is_empty() {
        return Err(BridgeError::Tls(format!("no certificates found in {}", path.display())).into());
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> anyhow::Result<PrivateKeyDer<'static>> {
    let file =
        File::open(path).with_context(|| format!("failed to open key file {}", path.display()))?;
    let key = rustls_pemfile::private_key(&mut BufReader::new(file))
        .with_context(|| format!("failed to parse key file {}", path.display()))?;

    key.ok_or_else(|| BridgeError::Tls(format!("no private key found in {}", path.display())).into())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
