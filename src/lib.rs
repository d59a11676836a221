//! # certpath
//!
//! Certificate acquisition, trust-pool assembly, and RFC 5280-style path
//! validation for a single leaf certificate, plus a lifetime-usage
//! ("verdancy") metric.
//!
//! The crate takes a certificate source (a PEM bundle on disk, or a TLS
//! endpoint whose presented chain is harvested over a verification-free
//! handshake) and validates the leaf against caller-supplied or platform
//! trust anchors. Argument parsing, usage text, and exit codes belong to
//! the front end; this crate exposes the typed core underneath.
//!
//! ```no_run
//! use certpath::{CertificateSource, VerifyOptions};
//!
//! let source = CertificateSource::parse("https://example.com");
//! let options = VerifyOptions {
//!     host: Some("example.com".to_string()),
//!     ..Default::default()
//! };
//! let chain = certpath::verify(&source, &options)?;
//! println!("trusted, {} certificates deep", chain.len());
//! # Ok::<(), certpath::VerifyError>(())
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod bundle;
pub mod cert;
pub mod error;
pub mod fetch;
pub mod pool;
pub mod source;
pub mod validate;
pub mod verdancy;

use std::fs;
use std::time::Duration;

use tracing::debug;

pub use cert::{Certificate, KeyUsagePurpose};
pub use error::{ConnectionErrorKind, PolicyViolation, VerifyError};
pub use pool::{load_root_pool, system_root_pool, CertificatePool};
pub use source::CertificateSource;
pub use validate::{validate_path, RequiredUsages, ValidationPolicy};
pub use verdancy::{lifetime_usage, VerdancyLevel, VerdancyReport};

/// Options threaded in from the front end, already parsed and validated
/// for count and type.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Hostname the leaf must match.
    pub host: Option<String>,
    /// Explicit SNI override for remote sources.
    pub server_name: Option<String>,
    /// Root-source specifier; empty or unset means the platform store.
    pub roots: Option<String>,
    /// Transport timeout for remote sources.
    pub timeout: Option<Duration>,
}

/// Resolve a source into its leaf certificate and intermediate pool.
///
/// For a remote source the first presented certificate is the leaf and the
/// entire presented chain seeds the intermediate pool; pool deduplication
/// and the path builder's seen-set make the duplicated leaf harmless.
pub fn load_source(
    source: &CertificateSource,
    options: &VerifyOptions,
) -> Result<(Certificate, CertificatePool), VerifyError> {
    match source {
        CertificateSource::Local(path) => {
            let data = fs::read(path).map_err(|e| {
                VerifyError::MalformedInput(format!("{}: {e}", path.display()))
            })?;
            let (leaf, intermediates) = bundle::split_bundle(&data)?;
            Ok((leaf, CertificatePool::from_certs(intermediates)))
        }
        CertificateSource::Remote { host, port } => {
            let fetch_options = fetch::FetchOptions {
                server_name: options.server_name.clone(),
                timeout: options.timeout,
            };
            let chain = fetch::fetch_peer_certificates(host, *port, &fetch_options)?;
            let leaf = chain.first().cloned().ok_or(VerifyError::EmptyPeerChain)?;
            Ok((leaf, CertificatePool::from_certs(chain)))
        }
    }
}

/// Full verification flow: resolve the source, assemble trust anchors, and
/// run path validation. Returns the ordered chain from leaf to root.
pub fn verify(
    source: &CertificateSource,
    options: &VerifyOptions,
) -> Result<Vec<Certificate>, VerifyError> {
    let (leaf, intermediates) = load_source(source, options)?;

    let roots = match options.roots.as_deref().filter(|s| !s.is_empty()) {
        Some(spec) => Some(load_root_pool(spec)?),
        None => None,
    };
    debug!(
        leaf = %leaf.subject(),
        intermediates = intermediates.len(),
        custom_roots = roots.is_some(),
        "starting path validation"
    );

    let policy = ValidationPolicy {
        expected_hostname: options.host.clone(),
        required_usages: RequiredUsages::Any,
    };
    validate_path(&leaf, &intermediates, roots.as_ref(), &policy)
}

/// Lifetime-usage flow: resolve the source and measure how far the leaf
/// has progressed through its validity window. Independent of trust pools.
pub fn measure_verdancy(
    source: &CertificateSource,
    options: &VerifyOptions,
) -> Result<VerdancyReport, VerifyError> {
    let (leaf, _intermediates) = load_source(source, options)?;
    lifetime_usage(&leaf)
}
