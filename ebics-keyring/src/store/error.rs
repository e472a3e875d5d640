use std::path::PathBuf;

/// An error that may occur when loading or saving a [`KeyRing`][`crate::KeyRing`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred at a path.
    #[error("I/O error at {path} while {context}: {source}")]
    IoPath {
        /// The path at which the error occurred.
        path: PathBuf,
        /// The context in which the error occurred.
        ///
        /// This is meant to complete the sentence "I/O error at path {path} while ".
        context: &'static str,
        /// The error source.
        source: std::io::Error,
    },

    /// The key ring file is not a valid key ring envelope.
    #[error("The key ring file {path} is not a valid key ring envelope:\n{source}")]
    EnvelopeRead {
        /// The path of the key ring file.
        path: PathBuf,
        /// The error source.
        source: serde_json::Error,
    },

    /// The key ring envelope uses an unsupported format version.
    #[error("The key ring file {path} uses unsupported format version {version:?}")]
    UnsupportedVersion {
        /// The path of the key ring file.
        path: PathBuf,
        /// The version found in the envelope.
        version: Option<u32>,
    },

    /// The key ring envelope was written with a different cipher.
    #[error(
        "The key ring file {path} is encrypted with cipher {actual:?}, but {expected} is configured"
    )]
    UnsupportedCipher {
        /// The path of the key ring file.
        path: PathBuf,
        /// The name of the configured cipher.
        expected: String,
        /// The cipher name found in the envelope.
        actual: Option<String>,
    },

    /// The encrypted payload of a key ring envelope is not valid base64.
    #[error("The encrypted payload of key ring file {path} is not valid base64: {source}")]
    Base64Decode {
        /// The path of the key ring file.
        path: PathBuf,
        /// The error source.
        source: base64ct::Error,
    },

    /// The decrypted key ring document can not be deserialized.
    #[error("The decrypted key ring document of {path} is invalid:\n{source}")]
    DocumentRead {
        /// The path of the key ring file.
        path: PathBuf,
        /// The error source.
        source: serde_json::Error,
    },

    /// The decrypted key ring document holds certificate content that is not valid base64.
    #[error("The certificate content for {role} in key ring file {path} is not valid base64: {source}")]
    CertificateContentDecode {
        /// The path of the key ring file.
        path: PathBuf,
        /// The role of the certificate.
        role: crate::KeyRole,
        /// The error source.
        source: base64ct::Error,
    },

    /// The decrypted key ring document holds a certificate that does not fit its role.
    #[error("The key ring file {path} holds an invalid certificate:\n{source}")]
    InvalidCertificate {
        /// The path of the key ring file.
        path: PathBuf,
        /// The error source.
        source: crate::keyring::Error,
    },

    /// A key ring document or envelope can not be serialized.
    #[error("Unable to serialize key ring data: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The encrypted payload is too short to hold key derivation parameters, nonce and tag.
    #[error("The encrypted key ring payload is truncated ({length} bytes)")]
    TruncatedCiphertext {
        /// The length of the encrypted payload.
        length: usize,
    },

    /// The scrypt work factor of an encrypted payload exceeds the accepted maximum.
    #[error("The scrypt work factor 2^{log_n} exceeds the maximum of 2^{max}")]
    UnsupportedWorkFactor {
        /// The work factor exponent found in the payload.
        log_n: u8,
        /// The highest accepted work factor exponent.
        max: u8,
    },

    /// The encryption key can not be derived from the passphrase.
    #[error("Unable to derive the key ring encryption key while {context}")]
    KeyDerivation {
        /// The context in which the error occurred.
        ///
        /// This is meant to complete the sentence "Unable to derive the key ring encryption key
        /// while ".
        context: &'static str,
    },

    /// The key ring can not be encrypted.
    #[error("Unable to encrypt the key ring")]
    Encrypt,

    /// The key ring can not be decrypted.
    ///
    /// This happens if the passphrase is wrong or the payload has been tampered with.
    #[error("Unable to decrypt the key ring: wrong passphrase or corrupted data")]
    Decrypt,
}
