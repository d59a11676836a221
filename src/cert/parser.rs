//! Internal X.509 field extraction

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::warn;
use x509_parser::prelude::*;

use super::{Certificate, KeyUsagePurpose};
use crate::error::VerifyError;

pub(super) fn parse_certificate(der: &[u8]) -> Result<Certificate, VerifyError> {
    let (rem, cert) = X509Certificate::from_der(der)
        .map_err(|e| VerifyError::MalformedInput(format!("DER certificate parse failed: {e}")))?;
    if !rem.is_empty() {
        warn!(trailing = rem.len(), "certificate DER carries trailing bytes");
    }

    let subject = cert.subject().to_string();
    let issuer = cert.issuer().to_string();
    let subject_der = cert.subject().as_raw().to_vec();
    let issuer_der = cert.issuer().as_raw().to_vec();
    let subject_cn = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(ToOwned::to_owned);

    let (san_dns_names, san_ip_addresses) = extract_subject_alt_names(&cert);

    let (is_ca, path_len_constraint) = match cert.basic_constraints() {
        Ok(Some(bc)) => (bc.value.ca, bc.value.path_len_constraint),
        Ok(None) => (false, None),
        Err(e) => {
            warn!(subject = %subject, "unreadable BasicConstraints extension: {e}");
            (false, None)
        }
    };

    let (key_usage_present, key_cert_sign) = match cert.key_usage() {
        Ok(Some(ku)) => (true, ku.value.key_cert_sign()),
        _ => (false, false),
    };

    let ext_key_usage = match cert.extended_key_usage() {
        Ok(Some(eku)) => Some(collect_eku_purposes(eku.value)),
        _ => None,
    };

    let not_before = asn1_to_system_time(&cert.validity().not_before);
    let not_after = asn1_to_system_time(&cert.validity().not_after);

    Ok(Certificate {
        der: der.to_vec(),
        subject,
        issuer,
        subject_der,
        issuer_der,
        subject_cn,
        san_dns_names,
        san_ip_addresses,
        is_ca,
        path_len_constraint,
        key_usage_present,
        key_cert_sign,
        ext_key_usage,
        not_before,
        not_after,
    })
}

fn extract_subject_alt_names(cert: &X509Certificate<'_>) -> (Vec<String>, Vec<IpAddr>) {
    let mut dns_names = Vec::new();
    let mut ip_addresses = Vec::new();

    let san = match cert.subject_alternative_name() {
        Ok(Some(san)) => san,
        Ok(None) => return (dns_names, ip_addresses),
        Err(e) => {
            warn!("unreadable SubjectAltName extension: {e}");
            return (dns_names, ip_addresses);
        }
    };

    for name in &san.value.general_names {
        match name {
            GeneralName::DNSName(dns) => dns_names.push((*dns).to_string()),
            GeneralName::IPAddress(bytes) => match bytes.len() {
                4 => {
                    let mut octets = [0u8; 4];
                    octets.copy_from_slice(bytes);
                    ip_addresses.push(IpAddr::V4(Ipv4Addr::from(octets)));
                }
                16 => {
                    let mut octets = [0u8; 16];
                    octets.copy_from_slice(bytes);
                    ip_addresses.push(IpAddr::V6(Ipv6Addr::from(octets)));
                }
                n => warn!(len = n, "ignoring SAN iPAddress of unexpected length"),
            },
            // Other GeneralName forms play no part in hostname policy.
            _ => {}
        }
    }

    (dns_names, ip_addresses)
}

fn collect_eku_purposes(eku: &ExtendedKeyUsage<'_>) -> Vec<KeyUsagePurpose> {
    let mut purposes = Vec::new();
    if eku.any {
        purposes.push(KeyUsagePurpose::Any);
    }
    if eku.server_auth {
        purposes.push(KeyUsagePurpose::ServerAuth);
    }
    if eku.client_auth {
        purposes.push(KeyUsagePurpose::ClientAuth);
    }
    if eku.code_signing {
        purposes.push(KeyUsagePurpose::CodeSigning);
    }
    if eku.email_protection {
        purposes.push(KeyUsagePurpose::EmailProtection);
    }
    if eku.time_stamping {
        purposes.push(KeyUsagePurpose::TimeStamping);
    }
    if eku.ocsp_signing {
        purposes.push(KeyUsagePurpose::OcspSigning);
    }
    purposes
}

fn asn1_to_system_time(t: &ASN1Time) -> SystemTime {
    let secs = t.timestamp();
    if secs >= 0 {
        UNIX_EPOCH + Duration::from_secs(secs as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs())
    }
}
