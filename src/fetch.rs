//! Remote peer certificate acquisition over a one-shot TLS handshake

use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, ClientConnection, DigitallySignedStruct, SignatureScheme, StreamOwned};
use tracing::{debug, info};

use crate::cert::Certificate;
use crate::error::{ConnectionErrorKind, VerifyError};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// SNI override; defaults to the connect host.
    pub server_name: Option<String>,
    /// Transport timeout; a default applies when unset.
    pub timeout: Option<Duration>,
}

/// Connect to `host:port`, complete a handshake that accepts whatever the
/// peer presents, and return the presented chain leaf-first.
///
/// Trust decisions are deliberately not made here: the caller re-runs path
/// validation with its own pools afterwards. The TCP stream and TLS
/// session are owned values and are released on every exit path.
pub fn fetch_peer_certificates(
    host: &str,
    port: u16,
    options: &FetchOptions,
) -> Result<Vec<Certificate>, VerifyError> {
    let addr = format!("{host}:{port}");

    let mut resolved = (host, port)
        .to_socket_addrs()
        .map_err(|e| connection(&addr, ConnectionErrorKind::Dns(e.to_string())))?;
    let target = resolved
        .next()
        .ok_or_else(|| connection(&addr, ConnectionErrorKind::Dns("no addresses resolved".into())))?;
    debug!(%addr, %target, "resolved remote endpoint");

    let sni = options.server_name.as_deref().unwrap_or(host);
    let server_name = ServerName::try_from(sni.to_string()).map_err(|e| {
        connection(
            &addr,
            ConnectionErrorKind::Handshake(format!("invalid server name '{sni}': {e}")),
        )
    })?;

    let timeout = options.timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
    let stream = TcpStream::connect_timeout(&target, timeout)
        .map_err(|e| connection(&addr, ConnectionErrorKind::Refused(e.to_string())))?;
    stream
        .set_read_timeout(Some(timeout))
        .and_then(|()| stream.set_write_timeout(Some(timeout)))
        .map_err(|e| connection(&addr, ConnectionErrorKind::Handshake(e.to_string())))?;

    let config = permissive_client_config()
        .map_err(|e| connection(&addr, ConnectionErrorKind::Handshake(e.to_string())))?;
    let conn = ClientConnection::new(Arc::new(config), server_name)
        .map_err(|e| connection(&addr, ConnectionErrorKind::Handshake(e.to_string())))?;

    let mut tls = StreamOwned::new(conn, stream);
    while tls.conn.is_handshaking() {
        tls.conn
            .complete_io(&mut tls.sock)
            .map_err(|e| connection(&addr, ConnectionErrorKind::Handshake(e.to_string())))?;
    }

    let peer = tls.conn.peer_certificates().unwrap_or(&[]);
    if peer.is_empty() {
        // A compliant server always presents at least the leaf.
        return Err(VerifyError::EmptyPeerChain);
    }

    let mut chain = Vec::with_capacity(peer.len());
    for der in peer {
        chain.push(Certificate::from_der(der.as_ref())?);
    }
    info!(%addr, presented = chain.len(), "fetched peer certificate chain");
    Ok(chain)
}

fn connection(addr: &str, kind: ConnectionErrorKind) -> VerifyError {
    VerifyError::Connection {
        addr: addr.to_string(),
        kind,
    }
}

fn permissive_client_config() -> Result<ClientConfig, rustls::Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    Ok(ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
        .with_no_client_auth())
}

/// Accepts any peer chain during the harvesting handshake. Handshake
/// signatures are still verified so the session itself is well-formed.
#[derive(Debug)]
struct AcceptAnyServerCert;

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &rustls::crypto::ring::default_provider().signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &rustls::crypto::ring::default_provider().signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
