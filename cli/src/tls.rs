use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use sha2::{Digest, Sha256};

/// Certificate and key locations for `serve --tls`.
#[derive(Debug, Clone)]
pub struct CertPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl CertPaths {
    /// Resolve paths, filling any missing one from `<data dir>/tls/`.
    pub fn resolve(cert: Option<PathBuf>, key: Option<PathBuf>) -> Result<Self> {
        let dir = || -> Result<PathBuf> {
            let proj_dirs = directories::ProjectDirs::from("", "", "recipebox")
                .context("Could not determine home directory")?;
            let dir = proj_dirs.data_dir().join("tls");
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create TLS directory: {}", dir.display()))?;
            Ok(dir)
        };
        let cert = match cert {
            Some(path) => path,
            None => dir()?.join("cert.pem"),
        };
        let key = match key {
            Some(path) => path,
            None => dir()?.join("key.pem"),
        };
        Ok(Self { cert, key })
    }

    /// Reuse an existing pair or generate a self-signed one covering `host`.
    /// Returns the SHA-256 fingerprint of the certificate.
    pub fn ensure(&self, host: &str) -> Result<String> {
        match (self.cert.exists(), self.key.exists()) {
            (true, true) => fingerprint_from_pem_file(&self.cert),
            (false, false) => {
                tracing::info!(cert = %self.cert.display(), "generating self-signed TLS certificate");
                generate_self_signed_cert(&self.cert, &self.key, host)
            }
            (true, false) => bail!("TLS key is missing: {}", self.key.display()),
            (false, true) => bail!("TLS certificate is missing: {}", self.cert.display()),
        }
    }
}

/// Subject names for a self-signed certificate: loopback plus the bind host.
fn subject_names(host: &str) -> Vec<String> {
    let mut names = vec!["localhost".to_string(), "127.0.0.1".to_string()];
    let host = host.trim();
    if !host.is_empty() && host != "0.0.0.0" && !names.iter().any(|n| n == host) {
        names.push(host.to_string());
    }
    names
}

fn generate_self_signed_cert(cert_path: &Path, key_path: &Path, host: &str) -> Result<String> {
    let mut params = rcgen::CertificateParams::new(subject_names(host))
        .context("failed to create certificate params")?;
    params
        .distinguished_name
        .push(rcgen::DnType::CommonName, "RecipeBox self-signed");
    params
        .distinguished_name
        .push(rcgen::DnType::OrganizationName, "RecipeBox");

    let key_pair = rcgen::KeyPair::generate().context("failed to generate key pair")?;
    let cert = params
        .self_signed(&key_pair)
        .context("failed to generate self-signed certificate")?;

    std::fs::write(cert_path, cert.pem())
        .with_context(|| format!("Failed to write certificate to {}", cert_path.display()))?;
    std::fs::write(key_path, key_pair.serialize_pem())
        .with_context(|| format!("Failed to write private key to {}", key_path.display()))?;

    Ok(sha256_fingerprint(cert.der()))
}

/// Colon-separated uppercase hex, as browsers display it.
fn sha256_fingerprint(der: &[u8]) -> String {
    Sha256::digest(der)
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

fn fingerprint_from_pem_file(cert_path: &Path) -> Result<String> {
    let pem_data = std::fs::read(cert_path)
        .with_context(|| format!("Failed to read certificate from {}", cert_path.display()))?;
    let mut reader = std::io::BufReader::new(pem_data.as_slice());
    let certs: Vec<_> =
        rustls_pemfile::certs(&mut reader).collect::<std::result::Result<_, _>>()?;
    let cert = certs.first().context("No certificate found in PEM file")?;
    Ok(sha256_fingerprint(cert.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(dir: &tempfile::TempDir) -> CertPaths {
        CertPaths::resolve(
            Some(dir.path().join("cert.pem")),
            Some(dir.path().join("key.pem")),
        )
        .unwrap()
    }

    #[test]
    fn test_ensure_generates_pem_pair() {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = paths(&tmp);

        let fingerprint = paths.ensure("127.0.0.1").unwrap();

        let cert = std::fs::read_to_string(&paths.cert).unwrap();
        assert!(cert.contains("BEGIN CERTIFICATE"));
        let key = std::fs::read_to_string(&paths.key).unwrap();
        assert!(key.contains("BEGIN PRIVATE KEY"));

        let parts: Vec<&str> = fingerprint.split(':').collect();
        assert_eq!(parts.len(), 32);
        assert!(parts.iter().all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit())));
    }

    #[test]
    fn test_ensure_reuses_existing_pair() {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = paths(&tmp);

        let first = paths.ensure("0.0.0.0").unwrap();
        let second = paths.ensure("0.0.0.0").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_ensure_rejects_half_pair() {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = paths(&tmp);
        std::fs::write(&paths.cert, "not a cert").unwrap();

        let err = paths.ensure("localhost").unwrap_err();
        assert!(err.to_string().contains("TLS key is missing"));
    }

    #[test]
    fn test_subject_names() {
        assert_eq!(subject_names("0.0.0.0"), vec!["localhost", "127.0.0.1"]);
        assert_eq!(subject_names("localhost"), vec!["localhost", "127.0.0.1"]);
        assert_eq!(
            subject_names("192.168.1.20"),
            vec!["localhost", "127.0.0.1", "192.168.1.20"]
        );
    }
}
