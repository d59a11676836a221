//! rcgen-backed fixtures shared by the integration tests.

#![allow(dead_code)]

use certpath::Certificate;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa,
    Issuer, KeyPair,
};

/// A CA usable both as a parsed certificate and as a signer.
pub struct TestCa {
    pub cert: Certificate,
    pub pem: String,
    pub issuer: Issuer<'static, KeyPair>,
}

pub fn set_cn(params: &mut CertificateParams, cn: &str) {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, cn);
    params.distinguished_name = dn;
}

pub fn ca_params(cn: &str, constraint: BasicConstraints) -> CertificateParams {
    let mut params = CertificateParams::new(Vec::new()).expect("CA params");
    params.is_ca = IsCa::Ca(constraint);
    set_cn(&mut params, cn);
    params
}

/// Self-signed CA.
pub fn new_ca(cn: &str, constraint: BasicConstraints) -> TestCa {
    let key = KeyPair::generate().expect("key generation");
    let params = ca_params(cn, constraint);
    let cert = params.clone().self_signed(&key).expect("self-signed CA");
    TestCa {
        cert: Certificate::from_der(cert.der().as_ref()).expect("parse CA"),
        pem: cert.pem(),
        issuer: Issuer::new(params, key),
    }
}

/// CA signed by `parent`.
pub fn new_intermediate(cn: &str, parent: &TestCa, constraint: BasicConstraints) -> TestCa {
    let key = KeyPair::generate().expect("key generation");
    let params = ca_params(cn, constraint);
    let cert = params
        .clone()
        .signed_by(&key, &parent.issuer)
        .expect("signed intermediate");
    TestCa {
        cert: Certificate::from_der(cert.der().as_ref()).expect("parse intermediate"),
        pem: cert.pem(),
        issuer: Issuer::new(params, key),
    }
}

pub fn leaf_params(cn: &str, dns_names: &[&str]) -> CertificateParams {
    let names: Vec<String> = dns_names.iter().map(|s| (*s).to_string()).collect();
    let mut params = CertificateParams::new(names).expect("leaf params");
    set_cn(&mut params, cn);
    params
}

/// End-entity certificate signed by `parent`.
pub fn new_leaf(cn: &str, dns_names: &[&str], parent: &TestCa) -> (Certificate, String) {
    new_leaf_from_params(leaf_params(cn, dns_names), parent)
}

/// End-entity certificate restricted to the given extended key usages.
pub fn new_leaf_with_eku(
    cn: &str,
    dns_names: &[&str],
    usages: Vec<ExtendedKeyUsagePurpose>,
    parent: &TestCa,
) -> (Certificate, String) {
    let mut params = leaf_params(cn, dns_names);
    params.extended_key_usages = usages;
    new_leaf_from_params(params, parent)
}

pub fn new_leaf_from_params(params: CertificateParams, parent: &TestCa) -> (Certificate, String) {
    let key = KeyPair::generate().expect("key generation");
    let cert = params.signed_by(&key, &parent.issuer).expect("signed leaf");
    (
        Certificate::from_der(cert.der().as_ref()).expect("parse leaf"),
        cert.pem(),
    )
}
