//! Error taxonomy for certificate acquisition and path validation

use std::path::PathBuf;

/// Transport-level failure kinds surfaced by the remote fetcher.
///
/// All of these reach the caller as [`VerifyError::Connection`]; the split
/// exists for diagnostics only.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionErrorKind {
    #[error("DNS resolution failed: {0}")]
    Dns(String),
    #[error("connection refused: {0}")]
    Refused(String),
    #[error("TLS handshake failed: {0}")]
    Handshake(String),
}

/// A policy check failed over an otherwise structurally complete path.
#[derive(Debug, thiserror::Error)]
pub enum PolicyViolation {
    #[error("certificate '{subject}' has expired")]
    Expired { subject: String },
    #[error("certificate '{subject}' is not yet valid")]
    NotYetValid { subject: String },
    #[error("hostname '{hostname}' does not match any subject alternative name or the subject CN of '{subject}'")]
    HostnameMismatch { hostname: String, subject: String },
    #[error("certificate '{subject}' does not allow the required key usage")]
    KeyUsageMismatch { subject: String },
    #[error("path length constraint exceeded at '{subject}'")]
    PathLengthExceeded { subject: String },
    #[error("certificate '{subject}' appears as an issuer but is not a CA")]
    NotACertificateAuthority { subject: String },
}

/// Every failure this crate can report.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("input contains an invalid PEM block: {0}")]
    MalformedInput(String),
    #[error("input contains no PEM certificate blocks")]
    NoCertificateFound,
    #[error("failure assembling the intermediate pool: {0}")]
    IntermediateParse(String),
    #[error("failed to load root pool from '{}': {detail}", .path.display())]
    RootLoad { path: PathBuf, detail: String },
    #[error("connection to {addr} failed: {kind}")]
    Connection {
        addr: String,
        kind: ConnectionErrorKind,
    },
    #[error("peer presented an empty certificate chain")]
    EmptyPeerChain,
    #[error("issuer loop detected while building a path at '{subject}'")]
    CycleDetected { subject: String },
    #[error("no certification path to a trusted root from '{subject}'")]
    PathNotFound { subject: String },
    #[error("policy violation: {0}")]
    Policy(#[from] PolicyViolation),
    #[error("degenerate validity window: notBefore is not earlier than notAfter")]
    DegenerateValidityWindow,
}
