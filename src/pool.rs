//! Certificate pools and root trust store assembly

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::bundle::CERTIFICATE_TAG;
use crate::cert::Certificate;
use crate::error::VerifyError;

/// An immutable set of certificates, deduplicated by DER bytes and queried
/// by issuer name during path building.
///
/// Two pools exist per validation: intermediates (candidates, not
/// inherently trusted) and roots (trusted a priori).
#[derive(Debug, Clone, Default)]
pub struct CertificatePool {
    certs: Vec<Certificate>,
}

impl CertificatePool {
    /// Build a pool from a full certificate set in one shot.
    pub fn from_certs(certs: impl IntoIterator<Item = Certificate>) -> Self {
        let mut seen: HashSet<Vec<u8>> = HashSet::new();
        let mut unique = Vec::new();
        for cert in certs {
            if seen.insert(cert.der().to_vec()) {
                unique.push(cert);
            }
        }
        Self { certs: unique }
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    /// Byte-identical membership check.
    pub fn contains(&self, cert: &Certificate) -> bool {
        self.certs.iter().any(|c| c.der() == cert.der())
    }

    /// Candidates whose subject name matches the given certificate's
    /// issuer name. Name matching only; signature checks are the caller's.
    pub(crate) fn issuer_candidates<'a>(
        &'a self,
        cert: &'a Certificate,
    ) -> impl Iterator<Item = &'a Certificate> {
        self.certs
            .iter()
            .filter(move |c| c.subject_der() == cert.issuer_der())
    }
}

/// Resolve a root-source specifier into a trusted pool.
///
/// The specifier is a single file, a comma-separated file list, or a
/// directory whose regular files all contribute their certificate blocks.
pub fn load_root_pool(spec: &str) -> Result<CertificatePool, VerifyError> {
    let mut certs = Vec::new();

    if spec.contains(',') {
        for part in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            read_certs_from_file(Path::new(part), &mut certs)?;
        }
    } else {
        let path = Path::new(spec);
        let meta = fs::metadata(path).map_err(|e| root_load(path, e.to_string()))?;
        if meta.is_dir() {
            let entries = fs::read_dir(path).map_err(|e| root_load(path, e.to_string()))?;
            for entry in entries {
                let entry = entry.map_err(|e| root_load(path, e.to_string()))?;
                let file_type = entry.file_type().map_err(|e| root_load(path, e.to_string()))?;
                if !file_type.is_file() {
                    continue;
                }
                read_certs_from_file(&entry.path(), &mut certs)?;
            }
            if certs.is_empty() {
                return Err(root_load(path, "directory contains no certificates"));
            }
        } else {
            read_certs_from_file(path, &mut certs)?;
        }
    }

    debug!(roots = certs.len(), spec, "assembled root pool");
    Ok(CertificatePool::from_certs(certs))
}

fn read_certs_from_file(path: &Path, out: &mut Vec<Certificate>) -> Result<(), VerifyError> {
    let data = fs::read(path).map_err(|e| root_load(path, e.to_string()))?;
    let blocks =
        pem::parse_many(&data).map_err(|e| root_load(path, format!("invalid PEM: {e}")))?;

    let mut found = 0usize;
    for block in &blocks {
        if block.tag() != CERTIFICATE_TAG {
            continue;
        }
        let cert =
            Certificate::from_der(block.contents()).map_err(|e| root_load(path, e.to_string()))?;
        out.push(cert);
        found += 1;
    }

    if found == 0 {
        return Err(root_load(path, "no PEM certificate blocks"));
    }
    Ok(())
}

fn root_load(path: &Path, detail: impl Into<String>) -> VerifyError {
    VerifyError::RootLoad {
        path: path.to_path_buf(),
        detail: detail.into(),
    }
}

/// The platform default trust store.
///
/// Certificates the parser rejects are skipped rather than failing the
/// whole load; the platform stores routinely carry oddities.
pub fn system_root_pool() -> CertificatePool {
    let loaded = rustls_native_certs::load_native_certs();
    for err in &loaded.errors {
        warn!("native root store: {err}");
    }
    let certs = loaded.certs.into_iter().filter_map(|der| {
        match Certificate::from_der(der.as_ref()) {
            Ok(cert) => Some(cert),
            Err(e) => {
                warn!("skipping unparseable native root: {e}");
                None
            }
        }
    });
    let pool = CertificatePool::from_certs(certs);
    debug!(roots = pool.len(), "loaded platform trust store");
    pool
}
