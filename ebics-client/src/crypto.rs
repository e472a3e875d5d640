//! Cryptographic primitives used when building EBICS requests.

use ebics_keyring::{
    RsaPublicKeyParts,
    key::{self, private_key_from_pem},
};
use rand::{RngCore, rngs::OsRng};
use rsa::{
    pkcs1v15::SigningKey,
    signature::{SignatureEncoding, Signer},
};
use sha2::{Digest, Sha256};

/// The number of random bytes in a nonce.
pub const NONCE_LENGTH: usize = 16;

/// An error that may occur when using a [`CryptoService`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Key material can not be decoded.
    #[error("Key error: {0}")]
    Key(#[from] key::Error),

    /// Random data can not be generated.
    #[error("Unable to generate random data: {0}")]
    Random(#[from] rand::Error),

    /// Data can not be signed.
    #[error("Signing failed: {0}")]
    Sign(#[from] rsa::signature::Error),
}

/// The cryptographic operations needed to build EBICS requests.
///
/// All operations except [`CryptoService::generate_nonce`] are pure functions of their input.
pub trait CryptoService {
    /// Generates a fresh nonce of [`NONCE_LENGTH`] random bytes as uppercase hexadecimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if the random number generator fails.
    fn generate_nonce(&self) -> Result<String, Error>;

    /// Returns the SHA-256 digest of `data`.
    fn calculate_hash(&self, data: &[u8]) -> Vec<u8>;

    /// Returns the SHA-256 digest of the public key in `public_key` (PEM).
    ///
    /// The digest is calculated over the ASCII string `"{exponent} {modulus}"`, in which both
    /// values are lowercase hexadecimal without leading zeros.
    ///
    /// # Errors
    ///
    /// Returns an error if `public_key` is not a valid PEM encoded RSA public key.
    fn calculate_digest(&self, public_key: &str) -> Result<Vec<u8>, Error>;

    /// Signs `data` using RSASSA-PKCS1-v1_5 with SHA-256 and the PEM encoded `private_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if `private_key` is not a valid PEM encoded RSA private key or signing
    /// fails.
    fn sign_with_private_key(&self, data: &[u8], private_key: &str) -> Result<Vec<u8>, Error>;
}

impl<C: CryptoService + ?Sized> CryptoService for &C {
    fn generate_nonce(&self) -> Result<String, Error> {
        (**self).generate_nonce()
    }

    fn calculate_hash(&self, data: &[u8]) -> Vec<u8> {
        (**self).calculate_hash(data)
    }

    fn calculate_digest(&self, public_key: &str) -> Result<Vec<u8>, Error> {
        (**self).calculate_digest(public_key)
    }

    fn sign_with_private_key(&self, data: &[u8], private_key: &str) -> Result<Vec<u8>, Error> {
        (**self).sign_with_private_key(data, private_key)
    }
}

/// Returns the canonical textual form of an RSA public key used for key digests.
fn digest_input(parts: &RsaPublicKeyParts) -> String {
    let exponent = hex::encode(parts.exponent());
    let modulus = hex::encode(parts.modulus());
    format!(
        "{} {}",
        exponent.trim_start_matches('0'),
        modulus.trim_start_matches('0')
    )
}

/// A [`CryptoService`] using the operating system's random number generator and RSA keys in
/// software.
#[derive(Clone, Copy, Debug, Default)]
pub struct RsaCryptoService;

impl CryptoService for RsaCryptoService {
    fn generate_nonce(&self) -> Result<String, Error> {
        let mut nonce = [0u8; NONCE_LENGTH];
        OsRng.try_fill_bytes(&mut nonce)?;
        Ok(hex::encode_upper(nonce))
    }

    fn calculate_hash(&self, data: &[u8]) -> Vec<u8> {
        Sha256::digest(data).to_vec()
    }

    fn calculate_digest(&self, public_key: &str) -> Result<Vec<u8>, Error> {
        let parts = RsaPublicKeyParts::from_pem(public_key)?;
        Ok(self.calculate_hash(digest_input(&parts).as_bytes()))
    }

    fn sign_with_private_key(&self, data: &[u8], private_key: &str) -> Result<Vec<u8>, Error> {
        let signing_key = SigningKey::<Sha256>::new(private_key_from_pem(private_key)?);
        Ok(signing_key.try_sign(data)?.to_vec())
    }
}
