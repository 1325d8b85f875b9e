//! TLS configuration and certificate loading.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

/// Load a rustls server configuration from PEM certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, io::Error> {
    check_pem_material(cert_path, key_path)?;
    RustlsConfig::from_pem_file(cert_path, key_path).await
}

/// Fail early, with the offending path, when the files hold no usable PEM items.
fn check_pem_material(cert_path: &Path, key_path: &Path) -> Result<(), io::Error> {
    let mut certs = BufReader::new(open(cert_path, "Certificate")?);
    let count = rustls_pemfile::certs(&mut certs).collect::<Result<Vec<_>, _>>()?.len();
    if count == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("No certificates found in {:?}", cert_path),
        ));
    }

    let mut key = BufReader::new(open(key_path, "Private key")?);
    if rustls_pemfile::private_key(&mut key)?.is_none() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("No private key found in {:?}", key_path),
        ));
    }

    tracing::debug!(cert = ?cert_path, certificates = count, "TLS material checked");
    Ok(())
}

fn open(path: &Path, what: &str) -> Result<File, io::Error> {
    File::open(path).map_err(|e| {
        io::Error::new(e.kind(), format!("{} file {:?} unreadable: {}", what, path, e))
    })
}
