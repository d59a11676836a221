//! Certificate source resolution: local bundle path or remote TLS endpoint

use std::path::PathBuf;

pub const DEFAULT_TLS_PORT: u16 = 443;

/// Where the leaf certificate comes from, decided once at the boundary.
///
/// Everything downstream consumes the tagged variant; nothing re-sniffs
/// the original string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateSource {
    /// A filesystem path to a PEM bundle.
    Local(PathBuf),
    /// A TLS endpoint whose presented chain supplies the certificates.
    Remote { host: String, port: u16 },
}

impl CertificateSource {
    /// Classify a certificate-source string.
    ///
    /// Anything with a `scheme://` prefix is remote; the path component of
    /// a URL is dropped and only host[:port] is kept, with 443 as the
    /// default port. Everything else is a local path.
    pub fn parse(input: &str) -> Self {
        let Some(idx) = input.find("://") else {
            return CertificateSource::Local(PathBuf::from(input));
        };

        let rest = &input[idx + 3..];
        let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port_str)) => match port_str.parse::<u16>() {
                Ok(port) => (host.to_string(), port),
                // Not a port (e.g. part of an IPv6 literal); keep as-is.
                Err(_) => (authority.to_string(), DEFAULT_TLS_PORT),
            },
            None => (authority.to_string(), DEFAULT_TLS_PORT),
        };

        CertificateSource::Remote { host, port }
    }
}
