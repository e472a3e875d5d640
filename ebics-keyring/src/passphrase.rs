//! Passphrase handling.

use std::{fmt::Display, str::FromStr};

use secrecy::{ExposeSecret, SecretString};

/// An error that may occur when creating a passphrase.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unable to convert string slice to Passphrase
    #[error("Unable to convert string to passphrase")]
    Passphrase,
}

/// A secret passphrase protecting a [`KeyRing`][`crate::KeyRing`] at rest.
///
/// The passphrase is held by a [`SecretString`], which guarantees zeroing of memory on
/// destruct.
/// It can not be serialized, so it never ends up in a file in clear.
/// Two passphrases are equal if their secrets are equal.
#[derive(Clone, Debug, Default)]
pub struct Passphrase(SecretString);

impl Passphrase {
    /// Creates a new [`Passphrase`] from owned [`String`]
    ///
    /// # Examples
    /// ```
    /// use ebics_keyring::Passphrase;
    ///
    /// let passphrase = Passphrase::new("passphrase".to_string());
    /// ```
    pub fn new(passphrase: String) -> Self {
        Self(SecretString::new(passphrase.into()))
    }

    /// Exposes the secret passphrase as borrowed [`str`]
    pub fn expose_borrowed(&self) -> &str {
        self.0.expose_secret()
    }
}

impl PartialEq for Passphrase {
    fn eq(&self, other: &Self) -> bool {
        self.expose_borrowed() == other.expose_borrowed()
    }
}

impl Eq for Passphrase {}

impl Display for Passphrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl FromStr for Passphrase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(SecretString::from(s.to_string())))
    }
}

impl From<&str> for Passphrase {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}
