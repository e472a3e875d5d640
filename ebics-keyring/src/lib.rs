#![doc = include_str!("../README.md")]

pub mod certificate;
mod error;
pub mod key;
pub mod keyring;
pub mod passphrase;
pub mod store;

pub use certificate::{Certificate, CertificateType, X509View};
pub use error::Error;
pub use key::{MIN_RSA_BIT_LENGTH, RsaPublicKeyParts};
pub use keyring::{CertificateProvider, KeyRing, KeyRole};
pub use passphrase::Passphrase;
pub use store::{KeyRingCipher, KeyRingStore, ScryptAesGcm};
