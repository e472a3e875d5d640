use ebics_keyring::{CertificateType, KeyRole};

use crate::OrderType;

/// An error that may occur when building EBICS requests.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A certificate can not be used.
    #[error("Certificate error: {0}")]
    Certificate(#[from] ebics_keyring::certificate::Error),

    /// The X.509 content of a certificate is required but missing.
    #[error("Certificate X509 is empty. The bank requires an X.509 certificate for the {certificate_type} key.")]
    CertificateX509Empty {
        /// The type of the certificate without X.509 content.
        certificate_type: CertificateType,
    },

    /// Order data can not be compressed.
    #[error("Unable to compress order data: {0}")]
    Compression(#[source] std::io::Error),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::Error),

    /// A cryptographic operation failed.
    #[error("Cryptographic error: {0}")]
    Crypto(#[from] crate::crypto::Error),

    /// A key ring error.
    #[error("Key ring error: {0}")]
    KeyRing(#[from] ebics_keyring::Error),

    /// The key ring holds no certificate for a role.
    #[error("The key ring holds no {role} certificate")]
    MissingCertificate {
        /// The role without certificate.
        role: KeyRole,
    },

    /// The certificate for a role has no private key.
    #[error("The {role} certificate has no private key")]
    MissingPrivateKey {
        /// The role of the certificate without private key.
        role: KeyRole,
    },

    /// An order type can not be used for the requested operation.
    #[error("Order type {order_type} can not be used for {context}")]
    UnsupportedOrderType {
        /// The rejected order type.
        order_type: OrderType,
        /// The operation for which the order type was rejected.
        ///
        /// This is meant to complete the sentence "Order type {order_type} can not be used for ".
        context: &'static str,
    },

    /// An XML error.
    #[error("XML error: {0}")]
    Xml(#[from] crate::xml::Error),
}
