//! RFC 5280-style certification path discovery and policy checks

use std::collections::HashSet;
use std::net::IpAddr;
use std::time::SystemTime;

use tracing::{debug, info, warn};

use crate::cert::{Certificate, KeyUsagePurpose};
use crate::error::{PolicyViolation, VerifyError};
use crate::pool::{self, CertificatePool};

/// Which extended key usages the leaf must support.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequiredUsages {
    /// Any usage is acceptable (the default).
    #[default]
    Any,
    /// Every listed purpose must be allowed by the leaf.
    All(Vec<KeyUsagePurpose>),
}

/// Policy parameters applied once a path is structurally complete.
#[derive(Debug, Clone, Default)]
pub struct ValidationPolicy {
    pub expected_hostname: Option<String>,
    pub required_usages: RequiredUsages,
}

/// Build and check a certification path from `leaf` to a trusted root.
///
/// `roots` of `None` means the platform default trust store. Validation is
/// all-or-nothing: the fully ordered chain on success, a specific failure
/// kind otherwise.
pub fn validate_path(
    leaf: &Certificate,
    intermediates: &CertificatePool,
    roots: Option<&CertificatePool>,
    policy: &ValidationPolicy,
) -> Result<Vec<Certificate>, VerifyError> {
    let system_pool;
    let roots = match roots {
        Some(pool) => pool,
        None => {
            system_pool = pool::system_root_pool();
            &system_pool
        }
    };

    let chain = build_path(leaf, intermediates, roots)?;
    apply_policy(&chain, policy, SystemTime::now())?;
    info!(depth = chain.len(), leaf = %leaf.subject(), "certification path validated");
    Ok(chain)
}

/// Single-path discovery with pooled candidates. The root pool is
/// consulted first at every step; a root match always terminates the
/// search, even if an intermediate could also have issued the current
/// certificate.
fn build_path(
    leaf: &Certificate,
    intermediates: &CertificatePool,
    roots: &CertificatePool,
) -> Result<Vec<Certificate>, VerifyError> {
    let mut chain = vec![leaf.clone()];
    let mut seen: HashSet<Vec<u8>> = HashSet::from([leaf.der().to_vec()]);
    let mut current = leaf.clone();

    loop {
        // A certificate that is itself in the root pool is trusted as-is.
        if roots.contains(&current) {
            debug!(subject = %current.subject(), "current certificate is a trusted root");
            return Ok(chain);
        }

        if let Some(root) = roots
            .issuer_candidates(&current)
            .find(|root| current.verify_signed_by(root))
        {
            debug!(root = %root.subject(), "path terminates at trusted root");
            chain.push(root.clone());
            return Ok(chain);
        }

        let mut reselected: Option<&Certificate> = None;
        let mut next: Option<&Certificate> = None;
        for candidate in intermediates.issuer_candidates(&current) {
            if !current.verify_signed_by(candidate) {
                continue;
            }
            if seen.contains(candidate.der()) {
                reselected.get_or_insert(candidate);
                continue;
            }
            next = Some(candidate);
            break;
        }

        match next {
            Some(candidate) => {
                seen.insert(candidate.der().to_vec());
                chain.push(candidate.clone());
                current = candidate.clone();
            }
            None => {
                // A self-issued dead end is an exhausted search; looping
                // back to an earlier, different link is a genuine cycle.
                if let Some(prev) = reselected {
                    if prev.der() != current.der() {
                        return Err(VerifyError::CycleDetected {
                            subject: current.subject().to_string(),
                        });
                    }
                }
                return Err(VerifyError::PathNotFound {
                    subject: current.subject().to_string(),
                });
            }
        }
    }
}

fn apply_policy(
    chain: &[Certificate],
    policy: &ValidationPolicy,
    now: SystemTime,
) -> Result<(), PolicyViolation> {
    for (depth, cert) in chain.iter().enumerate() {
        if now < cert.not_before() {
            return Err(PolicyViolation::NotYetValid {
                subject: cert.subject().to_string(),
            });
        }
        if now > cert.not_after() {
            return Err(PolicyViolation::Expired {
                subject: cert.subject().to_string(),
            });
        }

        if depth > 0 {
            if !cert.is_ca() {
                return Err(PolicyViolation::NotACertificateAuthority {
                    subject: cert.subject().to_string(),
                });
            }
            if !cert.may_sign_certificates() {
                return Err(PolicyViolation::KeyUsageMismatch {
                    subject: cert.subject().to_string(),
                });
            }
            // `depth - 1` CA certificates sit between this issuer and the leaf.
            if let Some(limit) = cert.path_len_constraint() {
                if (depth - 1) as u32 > limit {
                    return Err(PolicyViolation::PathLengthExceeded {
                        subject: cert.subject().to_string(),
                    });
                }
            }
        }
    }

    let leaf = &chain[0];
    if let Some(hostname) = &policy.expected_hostname {
        verify_hostname(leaf, hostname)?;
    }
    if let RequiredUsages::All(purposes) = &policy.required_usages {
        for purpose in purposes {
            if !leaf.allows_usage(*purpose) {
                return Err(PolicyViolation::KeyUsageMismatch {
                    subject: leaf.subject().to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Match a hostname against the leaf's subject alternative names, with the
/// subject CN as a legacy fallback.
fn verify_hostname(cert: &Certificate, hostname: &str) -> Result<(), PolicyViolation> {
    if let Ok(ip) = hostname.parse::<IpAddr>() {
        if cert.san_ip_addresses().contains(&ip) {
            return Ok(());
        }
        return Err(PolicyViolation::HostnameMismatch {
            hostname: hostname.to_string(),
            subject: cert.subject().to_string(),
        });
    }

    for san in cert.san_dns_names() {
        if match_hostname(hostname, san) {
            return Ok(());
        }
    }

    if let Some(cn) = cert.subject_common_name() {
        if match_hostname(hostname, cn) {
            warn!("hostname matched via subject CN; subject alternative names should be preferred");
            return Ok(());
        }
    }

    Err(PolicyViolation::HostnameMismatch {
        hostname: hostname.to_string(),
        subject: cert.subject().to_string(),
    })
}

/// Case-insensitive DNS name comparison with support for a single-label
/// left-most wildcard.
fn match_hostname(hostname: &str, pattern: &str) -> bool {
    let hostname = hostname.to_ascii_lowercase();
    let pattern = pattern.to_ascii_lowercase();

    if hostname == pattern {
        return true;
    }

    if let Some(suffix) = pattern.strip_prefix("*.") {
        if let Some(prefix) = hostname.strip_suffix(suffix) {
            // The wildcard covers exactly one label.
            return prefix.len() > 1
                && prefix.ends_with('.')
                && !prefix[..prefix.len() - 1].contains('.');
        }
    }

    false
}
