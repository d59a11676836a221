//! Owned certificate representation and parsing entry points

mod parser;

use std::net::IpAddr;
use std::time::SystemTime;

use x509_parser::prelude::{FromDer, X509Certificate};

use crate::error::VerifyError;

/// Extended key usage purposes relevant to validation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyUsagePurpose {
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    TimeStamping,
    OcspSigning,
    /// The anyExtendedKeyUsage OID.
    Any,
}

/// Immutable parsed view of a single X.509 certificate.
///
/// The raw DER is retained so the issuer's signature over the signed
/// payload can be verified later; everything else is flattened into owned
/// fields at parse time. Equality is DER-byte equality, which is also the
/// identity used for pool deduplication and cycle detection.
#[derive(Debug, Clone)]
pub struct Certificate {
    pub(crate) der: Vec<u8>,
    pub(crate) subject: String,
    pub(crate) issuer: String,
    pub(crate) subject_der: Vec<u8>,
    pub(crate) issuer_der: Vec<u8>,
    pub(crate) subject_cn: Option<String>,
    pub(crate) san_dns_names: Vec<String>,
    pub(crate) san_ip_addresses: Vec<IpAddr>,
    pub(crate) is_ca: bool,
    pub(crate) path_len_constraint: Option<u32>,
    pub(crate) key_usage_present: bool,
    pub(crate) key_cert_sign: bool,
    /// `None` means the certificate carries no EKU extension, which leaves
    /// every usage acceptable.
    pub(crate) ext_key_usage: Option<Vec<KeyUsagePurpose>>,
    pub(crate) not_before: SystemTime,
    pub(crate) not_after: SystemTime,
}

impl Certificate {
    /// Decode a single DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, VerifyError> {
        parser::parse_certificate(der)
    }

    /// Decode the first CERTIFICATE block of a PEM buffer.
    pub fn from_pem(pem_data: &[u8]) -> Result<Self, VerifyError> {
        let blocks = pem::parse_many(pem_data)
            .map_err(|e| VerifyError::MalformedInput(e.to_string()))?;
        let block = blocks
            .iter()
            .find(|b| b.tag() == crate::bundle::CERTIFICATE_TAG)
            .ok_or(VerifyError::NoCertificateFound)?;
        Self::from_der(block.contents())
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub(crate) fn subject_der(&self) -> &[u8] {
        &self.subject_der
    }

    pub(crate) fn issuer_der(&self) -> &[u8] {
        &self.issuer_der
    }

    pub fn subject_common_name(&self) -> Option<&str> {
        self.subject_cn.as_deref()
    }

    pub fn san_dns_names(&self) -> &[String] {
        &self.san_dns_names
    }

    pub fn san_ip_addresses(&self) -> &[IpAddr] {
        &self.san_ip_addresses
    }

    pub fn is_ca(&self) -> bool {
        self.is_ca
    }

    pub fn path_len_constraint(&self) -> Option<u32> {
        self.path_len_constraint
    }

    pub fn not_before(&self) -> SystemTime {
        self.not_before
    }

    pub fn not_after(&self) -> SystemTime {
        self.not_after
    }

    /// Subject and issuer name are byte-identical.
    pub fn is_self_issued(&self) -> bool {
        self.subject_der == self.issuer_der
    }

    /// KeyUsage discipline for CA members of a path: a present KeyUsage
    /// extension must include keyCertSign.
    pub(crate) fn may_sign_certificates(&self) -> bool {
        !self.key_usage_present || self.key_cert_sign
    }

    /// Whether the certificate's EKU set admits the given purpose.
    pub fn allows_usage(&self, purpose: KeyUsagePurpose) -> bool {
        match &self.ext_key_usage {
            None => true,
            Some(usages) => {
                usages.contains(&KeyUsagePurpose::Any) || usages.contains(&purpose)
            }
        }
    }

    /// Cryptographically verify that `issuer` signed this certificate.
    pub(crate) fn verify_signed_by(&self, issuer: &Certificate) -> bool {
        let Ok((_, me)) = X509Certificate::from_der(&self.der) else {
            return false;
        };
        let Ok((_, signer)) = X509Certificate::from_der(&issuer.der) else {
            return false;
        };
        me.verify_signature(Some(signer.public_key())).is_ok()
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

#[cfg(test)]
mod tests {
    use super::*;

    use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};

    fn self_signed(cn: &str) -> (Certificate, String) {
        let key = KeyPair::generate().expect("key generation");
        let mut params = CertificateParams::new(vec!["test.example".to_string()]).expect("params");
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, cn);
        params.distinguished_name = dn;
        let cert = params.self_signed(&key).expect("self-signed");
        (
            Certificate::from_der(cert.der().as_ref()).expect("parse"),
            cert.pem(),
        )
    }

    #[test]
    fn from_pem_skips_leading_non_certificate_blocks() {
        let key = KeyPair::generate().expect("key generation");
        let (parsed, pem_text) = self_signed("pem-entry");
        let mixed = format!("{}{pem_text}", key.serialize_pem());
        let reparsed = Certificate::from_pem(mixed.as_bytes()).expect("parse pem");
        assert_eq!(reparsed, parsed);
        assert_eq!(reparsed.subject_common_name(), Some("pem-entry"));
    }

    #[test]
    fn self_signed_certificates_are_self_issued_and_verify_themselves() {
        let (cert, _) = self_signed("loopback");
        assert!(cert.is_self_issued());
        assert!(cert.verify_signed_by(&cert));

        let (other, _) = self_signed("stranger");
        assert!(!cert.verify_signed_by(&other));
    }

    #[test]
    fn absent_eku_extension_allows_everything() {
        let (cert, _) = self_signed("open");
        assert!(cert.allows_usage(KeyUsagePurpose::ServerAuth));
        assert!(cert.allows_usage(KeyUsagePurpose::CodeSigning));
    }
}
