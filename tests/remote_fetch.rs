//! Remote fetcher failure modes that need no reachable TLS server.

use std::net::TcpListener;
use std::time::Duration;

use certpath::fetch::{fetch_peer_certificates, FetchOptions};
use certpath::{ConnectionErrorKind, VerifyError};

fn short_timeout() -> FetchOptions {
    FetchOptions {
        server_name: None,
        timeout: Some(Duration::from_secs(2)),
    }
}

#[test]
fn unresolvable_host_is_a_dns_error() {
    // .invalid is reserved and never resolves.
    let err = fetch_peer_certificates("no-such-host.invalid", 443, &short_timeout()).unwrap_err();
    match err {
        VerifyError::Connection { addr, kind } => {
            assert!(addr.starts_with("no-such-host.invalid"));
            assert!(matches!(kind, ConnectionErrorKind::Dns(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn closed_port_is_a_refused_error() {
    // Port 1 on loopback is about as closed as it gets.
    let err = fetch_peer_certificates("127.0.0.1", 1, &short_timeout()).unwrap_err();
    match err {
        VerifyError::Connection { kind, .. } => {
            assert!(matches!(kind, ConnectionErrorKind::Refused(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_tls_peer_is_a_handshake_error() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();

    // Accept one connection and drop it mid-handshake.
    let server = std::thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            drop(stream);
        }
    });

    let err = fetch_peer_certificates("127.0.0.1", port, &short_timeout()).unwrap_err();
    match err {
        VerifyError::Connection { kind, .. } => {
            assert!(matches!(kind, ConnectionErrorKind::Handshake(_)));
        }
        other => panic!("unexpected error: {other}"),
    }

    server.join().ok();
}

#[test]
fn sni_override_accepts_ip_literals() {
    // An IP-literal SNI must not be rejected before the transport phase;
    // the connect itself still fails on the closed port.
    let options = FetchOptions {
        server_name: Some("192.0.2.1".to_string()),
        timeout: Some(Duration::from_secs(2)),
    };
    let err = fetch_peer_certificates("127.0.0.1", 1, &options).unwrap_err();
    assert!(matches!(
        err,
        VerifyError::Connection {
            kind: ConnectionErrorKind::Refused(_),
            ..
        }
    ));
}
