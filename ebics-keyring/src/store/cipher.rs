use aes_gcm::{
    Aes256Gcm,
    Key,
    KeyInit,
    Nonce,
    aead::{Aead, Payload},
};
use rand::{RngCore, rngs::OsRng};
use scrypt::Params;

use super::Error;
use crate::Passphrase;

/// The length of the random scrypt salt in bytes.
const SALT_LENGTH: usize = 16;

/// The length of the AES-GCM nonce in bytes.
const NONCE_LENGTH: usize = 12;

/// The length of the AES-GCM authentication tag in bytes.
const TAG_LENGTH: usize = 16;

/// The length of the derived AES-256 key in bytes.
const KEY_LENGTH: usize = 32;

/// The length of the authenticated header (`log_n ‖ salt`) in bytes.
const HEADER_LENGTH: usize = 1 + SALT_LENGTH;

/// The highest accepted scrypt work factor exponent.
///
/// With the recommended block size this bounds key derivation to 1 GiB of memory.
pub const MAX_LOG_N: u8 = Params::RECOMMENDED_LOG_N + 3;

/// Symmetric encryption of serialized key rings keyed by a passphrase.
pub trait KeyRingCipher {
    /// Returns the name of the cipher as recorded in key ring files.
    fn name(&self) -> &str;

    /// Encrypts `plaintext` with a key derived from `passphrase`.
    ///
    /// # Errors
    ///
    /// Returns an error if key derivation or encryption fails.
    fn encrypt(&self, plaintext: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>, Error>;

    /// Decrypts `data` previously returned by [`KeyRingCipher::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is malformed, the passphrase is wrong or the data has been
    /// tampered with.
    fn decrypt(&self, data: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>, Error>;
}

/// AES-256-GCM with a key derived by scrypt.
///
/// The encrypted output is laid out as `log_n ‖ salt ‖ nonce ‖ ciphertext ‖ tag`, with
/// `log_n ‖ salt` authenticated as associated data.
/// Decryption reads the scrypt work factor from the data, so files written with a different
/// `log_n` stay readable.
/// Work factors above [`MAX_LOG_N`] are rejected before any key is derived.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ScryptAesGcm {
    log_n: u8,
}

impl ScryptAesGcm {
    /// The name of the cipher in key ring files.
    pub const NAME: &str = "scrypt-aes256gcm";

    /// Creates a new [`ScryptAesGcm`] that encrypts using the scrypt work factor `2^log_n`.
    pub fn new(log_n: u8) -> Self {
        Self { log_n }
    }

    /// Returns the scrypt work factor exponent used for encryption.
    pub fn log_n(&self) -> u8 {
        self.log_n
    }

    fn derive_key(
        passphrase: &Passphrase,
        salt: &[u8],
        log_n: u8,
    ) -> Result<[u8; KEY_LENGTH], Error> {
        if log_n > MAX_LOG_N {
            return Err(Error::UnsupportedWorkFactor {
                log_n,
                max: MAX_LOG_N,
            });
        }
        let params = Params::new(log_n, Params::RECOMMENDED_R, Params::RECOMMENDED_P, KEY_LENGTH)
            .map_err(|_| Error::KeyDerivation {
                context: "creating scrypt parameters",
            })?;
        let mut key = [0u8; KEY_LENGTH];
        scrypt::scrypt(
            passphrase.expose_borrowed().as_bytes(),
            salt,
            &params,
            &mut key,
        )
        .map_err(|_| Error::KeyDerivation {
            context: "running scrypt",
        })?;
        Ok(key)
    }
}

impl Default for ScryptAesGcm {
    fn default() -> Self {
        Self::new(Params::RECOMMENDED_LOG_N)
    }
}

impl KeyRingCipher for ScryptAesGcm {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn encrypt(&self, plaintext: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>, Error> {
        let mut salt = [0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut salt);
        let mut nonce = [0u8; NONCE_LENGTH];
        OsRng.fill_bytes(&mut nonce);

        let key = Self::derive_key(passphrase, &salt, self.log_n)?;
        let mut data =
            Vec::with_capacity(HEADER_LENGTH + NONCE_LENGTH + plaintext.len() + TAG_LENGTH);
        data.push(self.log_n);
        data.extend_from_slice(&salt);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: &data,
                },
            )
            .map_err(|_| Error::Encrypt)?;

        data.extend_from_slice(&nonce);
        data.extend_from_slice(&ciphertext);
        Ok(data)
    }

    fn decrypt(&self, data: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>, Error> {
        if data.len() < HEADER_LENGTH + NONCE_LENGTH + TAG_LENGTH {
            return Err(Error::TruncatedCiphertext { length: data.len() });
        }
        let (header, rest) = data.split_at(HEADER_LENGTH);
        let (nonce, ciphertext) = rest.split_at(NONCE_LENGTH);

        let key = Self::derive_key(passphrase, &header[1..], header[0])?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: header,
                },
            )
            .map_err(|_| Error::Decrypt)
    }
}
