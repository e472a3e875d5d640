//! The in-memory key ring of an EBICS subscriber.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Certificate, CertificateType, Passphrase};

/// An error that may occur when modifying a [`KeyRing`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A certificate does not fit the role it is assigned to.
    #[error(
        "A certificate of type {certificate_type} can not be used as {role} certificate (expected type {expected})"
    )]
    CertificateTypeMismatch {
        /// The role the certificate should be assigned to.
        role: KeyRole,
        /// The type of the rejected certificate.
        certificate_type: CertificateType,
        /// The certificate type required by `role`.
        expected: CertificateType,
    },
}

/// The role of a certificate in a [`KeyRing`].
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum KeyRole {
    /// The electronic signature key of the user.
    UserSignature,
    /// The authentication key of the user.
    UserAuthentication,
    /// The encryption key of the user.
    UserEncryption,
    /// The authentication key of the bank.
    BankAuthentication,
    /// The encryption key of the bank.
    BankEncryption,
}

impl KeyRole {
    /// All roles, in the order in which they are stored.
    pub const ALL: [KeyRole; 5] = [
        KeyRole::UserSignature,
        KeyRole::UserAuthentication,
        KeyRole::UserEncryption,
        KeyRole::BankAuthentication,
        KeyRole::BankEncryption,
    ];

    /// Returns the [`CertificateType`] a certificate must have to fill the role.
    pub fn certificate_type(self) -> CertificateType {
        match self {
            KeyRole::UserSignature => CertificateType::Signature,
            KeyRole::UserAuthentication | KeyRole::BankAuthentication => {
                CertificateType::Authentication
            }
            KeyRole::UserEncryption | KeyRole::BankEncryption => CertificateType::Encryption,
        }
    }
}

/// A source of role-tagged certificates and their key versions.
///
/// Request and order data builders only read certificates, so they depend on this trait rather
/// than on [`KeyRing`] directly.
pub trait CertificateProvider {
    /// Returns the certificate for `role`, if any.
    fn certificate(&self, role: KeyRole) -> Option<&Certificate>;

    /// Returns the key version (e.g. `X002`) of the certificate for `role`, if any.
    fn version(&self, role: KeyRole) -> Option<&str>;
}

/// Up to five role-tagged certificates and the password protecting them at rest.
///
/// Two key rings are equal if password, certificates and versions are equal.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct KeyRing {
    password: Passphrase,
    certificates: BTreeMap<KeyRole, Certificate>,
    versions: BTreeMap<KeyRole, String>,
}

impl KeyRing {
    /// Creates a new, empty [`KeyRing`] protected by `password`.
    pub fn new(password: Passphrase) -> Self {
        Self {
            password,
            ..Default::default()
        }
    }

    /// Returns the password protecting the key ring.
    pub fn password(&self) -> &Passphrase {
        &self.password
    }

    /// Sets the password protecting the key ring.
    pub fn set_password(&mut self, password: Passphrase) {
        self.password = password;
    }

    /// Sets the certificate for `role` and returns the one it replaces.
    ///
    /// # Errors
    ///
    /// Returns an error if the type of `certificate` does not match
    /// [`KeyRole::certificate_type`].
    pub fn set_certificate(
        &mut self,
        role: KeyRole,
        certificate: Certificate,
    ) -> Result<Option<Certificate>, Error> {
        let expected = role.certificate_type();
        if certificate.certificate_type() != expected {
            return Err(Error::CertificateTypeMismatch {
                role,
                certificate_type: certificate.certificate_type(),
                expected,
            });
        }
        Ok(self.certificates.insert(role, certificate))
    }

    /// Removes and returns the certificate for `role`.
    pub fn remove_certificate(&mut self, role: KeyRole) -> Option<Certificate> {
        self.certificates.remove(&role)
    }

    /// Sets the key version (e.g. `X002`, `E002` or `A006`) for `role`.
    pub fn set_version(&mut self, role: KeyRole, version: impl Into<String>) {
        self.versions.insert(role, version.into());
    }

    /// Returns an iterator over all present certificates and their roles.
    pub fn certificates(&self) -> impl Iterator<Item = (KeyRole, &Certificate)> {
        self.certificates
            .iter()
            .map(|(role, certificate)| (*role, certificate))
    }

    /// Returns an iterator over all set key versions and their roles.
    pub fn versions(&self) -> impl Iterator<Item = (KeyRole, &str)> {
        self.versions
            .iter()
            .map(|(role, version)| (*role, version.as_str()))
    }

    /// Returns `true` if the key ring holds neither certificates nor versions.
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty() && self.versions.is_empty()
    }
}

impl CertificateProvider for KeyRing {
    fn certificate(&self, role: KeyRole) -> Option<&Certificate> {
        self.certificates.get(&role)
    }

    fn version(&self, role: KeyRole) -> Option<&str> {
        self.versions.get(&role).map(String::as_str)
    }
}
