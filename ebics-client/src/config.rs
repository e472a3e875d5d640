//! Configuration of an EBICS client.
//!
//! The configuration is a TOML file describing the bank, the subscriber and the location of the
//! key ring:
//!
//! ```toml
//! [bank]
//! host_id = "EBIXHOST"
//! certified = false
//!
//! [user]
//! partner_id = "PARTNER"
//! user_id = "USER"
//!
//! [key_ring]
//! path = "/var/lib/ebics/keyring.json"
//! ```

use std::{
    fs::{File, create_dir_all, read_to_string},
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};

use ebics_keyring::{KeyRingStore, Passphrase};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{BankSettings, UserSettings, bank::Bank};

/// An error that may occur when handling a [`ClientConfig`].
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

    /// A TOML document can not be read.
    #[error("TOML read error for {path} while {context}:\n{source}")]
    TomlRead {
        /// The path of the TOML document (empty if not read from a file).
        path: PathBuf,
        /// The context in which the error occurred.
        ///
        /// This is meant to complete the sentence "TOML read error for {path} while ".
        context: &'static str,
        /// The error source.
        source: Box<toml::de::Error>,
    },

    /// A TOML document can not be written.
    #[error("TOML write error for {path} while {context}:\n{source}")]
    TomlWrite {
        /// The path of the TOML document.
        path: PathBuf,
        /// The context in which the error occurred.
        ///
        /// This is meant to complete the sentence "TOML write error for {path} while ".
        context: &'static str,
        /// The error source.
        source: toml::ser::Error,
    },

    /// The configured host ID is empty.
    #[error("The bank host ID must not be empty")]
    EmptyHostId,
}

/// Settings of the key ring used by an EBICS client.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct KeyRingSettings {
    path: PathBuf,
}

impl KeyRingSettings {
    /// Creates new [`KeyRingSettings`] for a key ring file at `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the path of the key ring file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The configuration of an EBICS client.
///
/// # Examples
///
/// ```
/// use ebics_client::{Bank, ClientConfig, User};
///
/// # fn main() -> testresult::TestResult {
/// let config: ClientConfig = r#"
/// [bank]
/// host_id = "EBIXHOST"
///
/// [key_ring]
/// path = "keyring.json"
/// "#
/// .parse()?;
///
/// assert_eq!(config.bank().host_id(), "EBIXHOST");
/// assert!(!config.bank().is_certified());
/// assert_eq!(config.user().user_id(), None);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ClientConfig {
    bank: BankSettings,
    #[serde(default)]
    user: UserSettings,
    key_ring: KeyRingSettings,
}

impl ClientConfig {
    /// Creates a new [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the host ID of `bank` is empty.
    pub fn new(
        bank: BankSettings,
        user: UserSettings,
        key_ring: KeyRingSettings,
    ) -> Result<Self, crate::Error> {
        let config = Self {
            bank,
            user,
            key_ring,
        };
        config.validate()?;
        Ok(config)
    }

    /// Creates a new [`ClientConfig`] from the TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * the file can not be read,
    /// * the file is not a valid client configuration,
    /// * or the host ID is empty.
    pub fn new_from_file(path: &Path) -> Result<Self, crate::Error> {
        debug!("Reading client configuration from {path:?}");
        let config: Self = toml::from_str(&read_to_string(path).map_err(|source| {
            Error::IoPath {
                path: path.to_path_buf(),
                context: "reading it to string",
                source,
            }
        })?)
        .map_err(|source| Error::TomlRead {
            path: path.to_path_buf(),
            context: "reading it as an EBICS client configuration",
            source: Box::new(source),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration to a TOML file at `path`.
    ///
    /// The parent directory is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * the configuration can not be serialized,
    /// * the parent directory can not be created,
    /// * or the file can not be written.
    pub fn store(&self, path: &Path) -> Result<(), crate::Error> {
        let contents = toml::to_string_pretty(self).map_err(|source| Error::TomlWrite {
            path: path.to_path_buf(),
            context: "serializing an EBICS client configuration",
            source,
        })?;

        if let Some(parent) = path.parent() {
            create_dir_all(parent).map_err(|source| Error::IoPath {
                path: parent.to_path_buf(),
                context: "creating the parent directory for an EBICS client configuration",
                source,
            })?;
        }
        let mut output = File::create(path).map_err(|source| Error::IoPath {
            path: path.to_path_buf(),
            context: "creating an EBICS client configuration file",
            source,
        })?;
        write!(output, "{contents}").map_err(|source| Error::IoPath {
            path: path.to_path_buf(),
            context: "writing to the EBICS client configuration file",
            source,
        })?;
        debug!("Wrote client configuration to {path:?}");
        Ok(())
    }

    /// Returns the [`BankSettings`].
    pub fn bank(&self) -> &BankSettings {
        &self.bank
    }

    /// Returns the [`UserSettings`].
    pub fn user(&self) -> &UserSettings {
        &self.user
    }

    /// Returns the [`KeyRingSettings`].
    pub fn key_ring(&self) -> &KeyRingSettings {
        &self.key_ring
    }

    /// Returns a [`KeyRingStore`] for the configured key ring file, using `password`.
    pub fn key_ring_store(&self, password: Passphrase) -> KeyRingStore {
        KeyRingStore::new(self.key_ring.path(), password)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.bank.host_id().trim().is_empty() {
            return Err(Error::EmptyHostId);
        }
        Ok(())
    }
}

impl FromStr for ClientConfig {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(s).map_err(|source| Error::TomlRead {
            path: PathBuf::new(),
            context: "reading an EBICS client configuration",
            source: Box::new(source),
        })?;
        config.validate()?;
        Ok(config)
    }
}
