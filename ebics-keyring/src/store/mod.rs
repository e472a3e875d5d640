//! Encrypted persistence of [`KeyRing`]s.
//!
//! A key ring is stored as a single JSON file:
//!
//! ```json
//! {
//!   "version": 1,
//!   "cipher": "scrypt-aes256gcm",
//!   "data": "<base64 encoded encrypted key ring document>"
//! }
//! ```
//!
//! A missing file, a file containing only whitespace and an envelope without `data` all denote
//! "no key ring yet" and load as an empty [`KeyRing`].
//! Anything else that can not be read, decrypted or deserialized is an error.

mod cipher;
mod error;

use std::{
    collections::BTreeMap,
    fs::{create_dir_all, read},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use base64ct::{Base64, Encoding};
pub use cipher::{KeyRingCipher, MAX_LOG_N, ScryptAesGcm};
pub use error::Error;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::{Certificate, CertificateType, KeyRing, KeyRole, Passphrase};

/// The format version of key ring envelopes.
pub const ENVELOPE_VERSION: u32 = 1;

/// The outer, unencrypted layer of a key ring file.
#[derive(Debug, Default, Deserialize, Serialize)]
struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cipher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<String>,
}

/// A certificate as stored in the encrypted key ring document.
#[derive(Debug, Deserialize, Serialize)]
struct StoredCertificate {
    #[serde(rename = "type")]
    certificate_type: CertificateType,
    public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    private_key: Option<String>,
    /// Base64 encoded X.509 certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

impl From<&Certificate> for StoredCertificate {
    fn from(value: &Certificate) -> Self {
        Self {
            certificate_type: value.certificate_type(),
            public_key: value.public_key().to_string(),
            private_key: value.private_key().map(ToString::to_string),
            content: value.content().map(Base64::encode_string),
        }
    }
}

/// The encrypted inner layer of a key ring file.
#[derive(Debug, Default, Deserialize, Serialize)]
struct KeyRingDocument {
    #[serde(default)]
    certificates: BTreeMap<KeyRole, StoredCertificate>,
    #[serde(default)]
    versions: BTreeMap<KeyRole, String>,
}

impl From<&KeyRing> for KeyRingDocument {
    fn from(value: &KeyRing) -> Self {
        Self {
            certificates: value
                .certificates()
                .map(|(role, certificate)| (role, StoredCertificate::from(certificate)))
                .collect(),
            versions: value
                .versions()
                .map(|(role, version)| (role, version.to_string()))
                .collect(),
        }
    }
}

impl KeyRingDocument {
    /// Creates a [`KeyRing`] protected by `password` from the document.
    fn into_key_ring(self, path: &Path, password: Passphrase) -> Result<KeyRing, Error> {
        let mut key_ring = KeyRing::new(password);
        for (role, stored) in self.certificates {
            let content = stored
                .content
                .map(|content| Base64::decode_vec(&content))
                .transpose()
                .map_err(|source| Error::CertificateContentDecode {
                    path: path.to_path_buf(),
                    role,
                    source,
                })?;
            let certificate = Certificate::new(
                stored.certificate_type,
                stored.public_key,
                stored.private_key,
                content,
            );
            key_ring
                .set_certificate(role, certificate)
                .map_err(|source| Error::InvalidCertificate {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        for (role, version) in self.versions {
            key_ring.set_version(role, version);
        }
        Ok(key_ring)
    }
}

/// Loads and saves a [`KeyRing`] at a path, encrypted with a passphrase.
///
/// The store itself holds no key ring state: every [`KeyRingStore::load`] reads the file anew
/// and every [`KeyRingStore::save`] replaces it atomically.
#[derive(Debug)]
pub struct KeyRingStore<C = ScryptAesGcm> {
    path: PathBuf,
    password: Passphrase,
    cipher: C,
}

impl KeyRingStore {
    /// Creates a new [`KeyRingStore`] for `path` using the default [`ScryptAesGcm`] cipher.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ebics_keyring::{KeyRingStore, Passphrase};
    ///
    /// let store = KeyRingStore::new("/var/lib/ebics/keyring.json", Passphrase::from("secret"));
    /// let key_ring = store.load()?;
    /// store.save(&key_ring)?;
    /// # Ok::<(), ebics_keyring::Error>(())
    /// ```
    pub fn new(path: impl AsRef<Path>, password: Passphrase) -> Self {
        Self::with_cipher(path, password, ScryptAesGcm::default())
    }
}

impl<C: KeyRingCipher> KeyRingStore<C> {
    /// Creates a new [`KeyRingStore`] for `path` using a specific `cipher`.
    pub fn with_cipher(path: impl AsRef<Path>, password: Passphrase, cipher: C) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            password,
            cipher,
        }
    }

    /// Returns the path of the key ring file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn empty_key_ring(&self) -> KeyRing {
        KeyRing::new(self.password.clone())
    }

    /// Loads the [`KeyRing`] from the key ring file.
    ///
    /// If the file does not exist, is empty or holds an envelope without data, an empty
    /// [`KeyRing`] protected by the store password is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * the file can not be read,
    /// * the file is not a valid envelope,
    /// * the envelope version or cipher is not supported,
    /// * the data can not be decrypted using the store password,
    /// * or the decrypted document is invalid.
    pub fn load(&self) -> Result<KeyRing, crate::Error> {
        let path = &self.path;
        let bytes = match read(path) {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                info!("No key ring file at {path:?}, starting with an empty key ring");
                return Ok(self.empty_key_ring());
            }
            Err(source) => {
                return Err(Error::IoPath {
                    path: path.clone(),
                    context: "reading the key ring file",
                    source,
                }
                .into());
            }
        };

        if bytes.trim_ascii().is_empty() {
            info!("The key ring file {path:?} is empty, starting with an empty key ring");
            return Ok(self.empty_key_ring());
        }

        let envelope: Envelope =
            serde_json::from_slice(&bytes).map_err(|source| Error::EnvelopeRead {
                path: path.clone(),
                source,
            })?;
        let Some(data) = envelope.data else {
            info!("The key ring file {path:?} holds no data, starting with an empty key ring");
            return Ok(self.empty_key_ring());
        };

        if envelope.version != Some(ENVELOPE_VERSION) {
            return Err(Error::UnsupportedVersion {
                path: path.clone(),
                version: envelope.version,
            }
            .into());
        }
        if envelope.cipher.as_deref() != Some(self.cipher.name()) {
            return Err(Error::UnsupportedCipher {
                path: path.clone(),
                expected: self.cipher.name().to_string(),
                actual: envelope.cipher,
            }
            .into());
        }

        let encrypted = Base64::decode_vec(&data).map_err(|source| Error::Base64Decode {
            path: path.clone(),
            source,
        })?;
        let plaintext = self.cipher.decrypt(&encrypted, &self.password)?;
        trace!("Decrypted key ring document of {path:?}");
        let document: KeyRingDocument =
            serde_json::from_slice(&plaintext).map_err(|source| Error::DocumentRead {
                path: path.clone(),
                source,
            })?;

        let key_ring = document.into_key_ring(path, self.password.clone())?;
        debug!(
            "Loaded key ring with roles {:?} from {path:?}",
            key_ring.certificates().map(|(role, _)| role).collect::<Vec<_>>()
        );
        Ok(key_ring)
    }

    /// Saves `key_ring` to the key ring file, encrypted with the key ring's own password.
    ///
    /// The parent directory is created if it does not exist.
    /// The file is written to a temporary file in the same directory first and then moved into
    /// place, so that an existing key ring is never left half written.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * the key ring can not be serialized or encrypted,
    /// * the parent directory can not be created,
    /// * or the file can not be written.
    pub fn save(&self, key_ring: &KeyRing) -> Result<(), crate::Error> {
        let path = &self.path;
        let plaintext =
            serde_json::to_vec(&KeyRingDocument::from(key_ring)).map_err(Error::Serialize)?;
        let encrypted = self.cipher.encrypt(&plaintext, key_ring.password())?;
        let envelope = Envelope {
            version: Some(ENVELOPE_VERSION),
            cipher: Some(self.cipher.name().to_string()),
            data: Some(Base64::encode_string(&encrypted)),
        };
        let bytes = serde_json::to_vec_pretty(&envelope).map_err(Error::Serialize)?;

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        create_dir_all(&parent).map_err(|source| Error::IoPath {
            path: parent.clone(),
            context: "creating the key ring directory",
            source,
        })?;

        let mut file = NamedTempFile::new_in(&parent).map_err(|source| Error::IoPath {
            path: parent.clone(),
            context: "creating a temporary key ring file",
            source,
        })?;
        file.write_all(&bytes).map_err(|source| Error::IoPath {
            path: file.path().to_path_buf(),
            context: "writing the temporary key ring file",
            source,
        })?;
        file.as_file().sync_all().map_err(|source| Error::IoPath {
            path: file.path().to_path_buf(),
            context: "syncing the temporary key ring file",
            source,
        })?;
        file.persist(path).map_err(|error| Error::IoPath {
            path: path.clone(),
            context: "moving the temporary key ring file into place",
            source: error.error,
        })?;

        debug!("Saved key ring to {path:?}");
        Ok(())
    }
}
