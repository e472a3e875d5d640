//! Shared helpers for key ring integration tests.

use ebics_keyring::{
    Certificate,
    CertificateType,
    KeyRing,
    KeyRingStore,
    KeyRole,
    Passphrase,
    ScryptAesGcm,
};
use log::LevelFilter;
use rstest::fixture;
use simplelog::{Config, TestLogger};
use testresult::TestResult;

/// The passphrase used by all test key rings.
pub const PASSPHRASE: &str = "test";

/// A low scrypt work factor to keep tests fast.
pub const TEST_LOG_N: u8 = 8;

/// A PKCS#1 encoded 2048 bit RSA public key.
pub const PUBLIC_KEY: &str = "-----BEGIN RSA PUBLIC KEY-----
MIIBCgKCAQEA+xGZ/wcz9ugFpP07Nspo6U17l0YhFiFpxxU4pTk3Lifz9R3zsIsu
ERwta7+fWIfxOo208ett/jhskiVodSEt3QBGh4XBipyWopKwZ93HHaDVZAALi/2A
+xTBtWdEo7XGUujKDvC2/aZKukfjpOiUI8AhLAfjmlcD/UZ1QPh0mHsglRNCmpCw
mwSXA9VNmhz+PiB+Dml4WWnKW/VHo2ujTXxq7+efMU4H2fny3Se3KYOsFPFGZ1TN
QSYlFuShWrHPtiLmUdPoP6CV2mML1tk+l7DIIqXrQhLUKDACeM5roMx0kLhUWB8P
+0uj1CNlNN4JRZlC7xFfqiMbFRU9Z4N6YwIDAQAB
-----END RSA PUBLIC KEY-----";

/// Initializes logging to the test output.
///
/// Only the first call installs the logger, subsequent calls are no-ops.
pub fn setup_logging() {
    let _ = TestLogger::init(LevelFilter::Trace, Config::default());
}

/// Creates a [`KeyRingStore`] with a low work factor for `path`.
pub fn test_store(path: impl AsRef<std::path::Path>) -> KeyRingStore {
    setup_logging();
    KeyRingStore::with_cipher(path, Passphrase::from(PASSPHRASE), ScryptAesGcm::new(TEST_LOG_N))
}

/// A key ring with user and bank certificates and versions.
#[fixture]
pub fn populated_key_ring() -> TestResult<KeyRing> {
    let mut key_ring = KeyRing::new(Passphrase::from(PASSPHRASE));
    key_ring.set_certificate(
        KeyRole::UserAuthentication,
        Certificate::new(
            CertificateType::Authentication,
            PUBLIC_KEY.to_string(),
            Some("private authentication key".to_string()),
            None,
        ),
    )?;
    key_ring.set_certificate(
        KeyRole::UserEncryption,
        Certificate::new(
            CertificateType::Encryption,
            PUBLIC_KEY.to_string(),
            Some("private encryption key".to_string()),
            None,
        ),
    )?;
    key_ring.set_certificate(
        KeyRole::BankAuthentication,
        Certificate::new(
            CertificateType::Authentication,
            PUBLIC_KEY.to_string(),
            None,
            Some(vec![0x30, 0x82, 0x00, 0xff]),
        ),
    )?;
    key_ring.set_version(KeyRole::BankAuthentication, "X002");
    key_ring.set_version(KeyRole::BankEncryption, "E002");
    Ok(key_ring)
}
