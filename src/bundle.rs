//! PEM bundle decomposition: one leaf plus trailing intermediates

use tracing::debug;

use crate::cert::Certificate;
use crate::error::VerifyError;

pub(crate) const CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Split a PEM buffer into its leaf certificate and intermediate pool.
///
/// The first CERTIFICATE block is the leaf; every later CERTIFICATE block
/// becomes an intermediate. Blocks of any other type (private keys, CSRs)
/// are skipped by design.
pub fn split_bundle(data: &[u8]) -> Result<(Certificate, Vec<Certificate>), VerifyError> {
    let blocks = pem::parse_many(data).map_err(|e| VerifyError::MalformedInput(e.to_string()))?;

    let mut leaf: Option<Certificate> = None;
    let mut intermediates = Vec::new();
    let mut skipped = 0usize;

    for block in &blocks {
        if block.tag() != CERTIFICATE_TAG {
            skipped += 1;
            continue;
        }
        if leaf.is_none() {
            leaf = Some(Certificate::from_der(block.contents())?);
        } else {
            let cert = Certificate::from_der(block.contents())
                .map_err(|e| VerifyError::IntermediateParse(e.to_string()))?;
            intermediates.push(cert);
        }
    }

    if skipped > 0 {
        debug!(skipped, "ignored non-certificate PEM blocks");
    }

    let leaf = leaf.ok_or(VerifyError::NoCertificateFound)?;
    debug!(
        subject = %leaf.subject(),
        intermediates = intermediates.len(),
        "decomposed PEM bundle"
    );
    Ok((leaf, intermediates))
}
