//! TLS support with a throwaway self-signed certificate
//!
//! A fresh key and certificate are generated on every start, so clients
//! verify the server by comparing the printed SHA-256 fingerprint.

use chrono::{Datelike, Days, NaiveDate, Utc};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, SerialNumber};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use tokio_rustls::TlsAcceptor;

const ORGANIZATION: &str = "pshs";

/// Certificate validity in days, starting at today's midnight UTC
const VALIDITY_DAYS: u64 = 2;

const FINGERPRINT_BYTES_PER_LINE: usize = 16;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("certificate generation failed: {0}")]
    Generate(#[from] rcgen::Error),
    #[error("TLS configuration failed: {0}")]
    Config(#[from] rustls::Error),
    #[error("certificate date out of range")]
    Date,
}

/// Self-signed certificate and its private key
pub struct SelfSigned {
    pub cert: CertificateDer<'static>,
    key: PrivatePkcs8KeyDer<'static>,
}

impl SelfSigned {
    /// SHA-256 digest of the DER certificate
    pub fn fingerprint(&self) -> [u8; 32] {
        Sha256::digest(self.cert.as_ref()).into()
    }

    pub fn acceptor(&self) -> Result<TlsAcceptor, TlsError> {
        let config = rustls::ServerConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(
            vec![self.cert.clone()],
            PrivateKeyDer::Pkcs8(self.key.clone_key()),
        )?;

        Ok(TlsAcceptor::from(Arc::new(config)))
    }
}

/// Issue a certificate for `common_name`, usually the advertised address
pub fn issue_self_signed_cert(common_name: &str) -> Result<SelfSigned, TlsError> {
    let mut params = CertificateParams::new(vec![common_name.to_string()])?;

    let mut name = DistinguishedName::new();
    name.push(DnType::OrganizationName, ORGANIZATION);
    name.push(DnType::CommonName, common_name);
    params.distinguished_name = name;

    // Semi-random serial number to avoid repetitions
    let now = Utc::now();
    params.serial_number = Some(SerialNumber::from_slice(&now.timestamp().to_be_bytes()));

    let today = now.date_naive();
    let expiry = today
        .checked_add_days(Days::new(VALIDITY_DAYS))
        .ok_or(TlsError::Date)?;
    let (year, month, day) = ymd(today)?;
    params.not_before = rcgen::date_time_ymd(year, month, day);
    let (year, month, day) = ymd(expiry)?;
    params.not_after = rcgen::date_time_ymd(year, month, day);

    let key_pair = KeyPair::generate()?;
    let cert = params.self_signed(&key_pair)?;

    Ok(SelfSigned {
        cert: cert.der().clone(),
        key: PrivatePkcs8KeyDer::from(key_pair.serialize_der()),
    })
}

fn ymd(date: NaiveDate) -> Result<(i32, u8, u8), TlsError> {
    let month = u8::try_from(date.month()).map_err(|_| TlsError::Date)?;
    let day = u8::try_from(date.day()).map_err(|_| TlsError::Date)?;
    Ok((date.year(), month, day))
}

/// Uppercase hex pairs, 16 per line
pub fn format_fingerprint(digest: &[u8]) -> Vec<String> {
    digest
        .chunks(FINGERPRINT_BYTES_PER_LINE)
        .map(|line| {
            line.iter()
                .map(|b| format!("{b:02X}"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}
