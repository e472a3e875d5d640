//! Certificates and their X.509 view.

use std::fmt::Debug;

use openssl::{error::ErrorStack, nid::Nid, x509::X509};
use serde::{Deserialize, Serialize};

use crate::key::{self, RsaPublicKeyParts};

/// An error that may occur when working with a [`Certificate`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The raw certificate content can not be read as X.509 certificate.
    #[error("X.509 certificate error while {context}:\n{source}")]
    X509 {
        /// The context in which the error occurred.
        ///
        /// This is meant to complete the sentence "X.509 certificate error while ".
        context: &'static str,
        /// The source error.
        source: ErrorStack,
    },

    /// The issuer of an X.509 certificate has no common name.
    #[error("The issuer of the X.509 certificate has no common name")]
    MissingIssuerCommonName,

    /// The key material of a certificate is invalid.
    #[error("Key error: {0}")]
    Key(#[from] key::Error),
}

/// The type of a [`Certificate`].
///
/// Describes what the key of a certificate is used for.
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
pub enum CertificateType {
    /// Authentication of requests (`X` key).
    #[serde(rename = "X")]
    #[strum(to_string = "X")]
    Authentication,

    /// Encryption of order data (`E` key).
    #[serde(rename = "E")]
    #[strum(to_string = "E")]
    Encryption,

    /// Electronic signatures of orders (`A` key).
    #[serde(rename = "A")]
    #[strum(to_string = "A")]
    Signature,
}

/// A key pair with optional X.509 certificate content.
///
/// Certificates are immutable values: all getters return exactly what was passed in on
/// construction.
#[derive(Clone, Eq, PartialEq)]
pub struct Certificate {
    certificate_type: CertificateType,
    public_key: String,
    private_key: Option<String>,
    content: Option<Vec<u8>>,
}

impl Certificate {
    /// Creates a new [`Certificate`].
    ///
    /// `public_key` and `private_key` are PEM encoded keys, `content` is a PEM or DER encoded
    /// X.509 certificate.
    ///
    /// # Examples
    ///
    /// ```
    /// use ebics_keyring::{Certificate, CertificateType};
    ///
    /// let certificate = Certificate::new(
    ///     CertificateType::Authentication,
    ///     "public key".to_string(),
    ///     None,
    ///     None,
    /// );
    /// assert_eq!(certificate.public_key(), "public key");
    /// assert!(certificate.to_x509()?.is_none());
    /// # Ok::<(), ebics_keyring::certificate::Error>(())
    /// ```
    pub fn new(
        certificate_type: CertificateType,
        public_key: String,
        private_key: Option<String>,
        content: Option<Vec<u8>>,
    ) -> Self {
        Self {
            certificate_type,
            public_key,
            private_key,
            content,
        }
    }

    /// Creates a new [`Certificate`] with a freshly generated RSA key pair of `bit_length`.
    ///
    /// The created certificate has no X.509 content.
    ///
    /// # Errors
    ///
    /// Returns an error if `bit_length` is shorter than [`key::MIN_RSA_BIT_LENGTH`] or the key
    /// pair can not be generated.
    pub fn generate(certificate_type: CertificateType, bit_length: usize) -> Result<Self, Error> {
        let (public_key, private_key) = key::generate_pem_key_pair(bit_length)?;
        Ok(Self::new(
            certificate_type,
            public_key,
            Some(private_key),
            None,
        ))
    }

    /// Returns the type of the certificate.
    pub fn certificate_type(&self) -> CertificateType {
        self.certificate_type
    }

    /// Returns the PEM encoded public key.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Returns the PEM encoded private key, if any.
    pub fn private_key(&self) -> Option<&str> {
        self.private_key.as_deref()
    }

    /// Returns the raw X.509 certificate content, if any.
    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    /// Returns the modulus and exponent of the public key.
    ///
    /// # Errors
    ///
    /// Returns an error if the public key can not be decoded.
    pub fn public_key_parts(&self) -> Result<RsaPublicKeyParts, Error> {
        Ok(RsaPublicKeyParts::from_pem(&self.public_key)?)
    }

    /// Parses the raw certificate content into an [`X509View`].
    ///
    /// Returns `Ok(None)` if the certificate has no content.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is present but not a valid X.509 certificate.
    pub fn to_x509(&self) -> Result<Option<X509View>, Error> {
        let Some(content) = self.content() else {
            return Ok(None);
        };
        X509View::parse(content).map(Some)
    }
}

impl Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("certificate_type", &self.certificate_type)
            .field("public_key", &self.public_key)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("content", &self.content.as_ref().map(Vec::len))
            .finish()
    }
}

/// The parts of an X.509 certificate used in key exchange order data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct X509View {
    issuer_name: String,
    serial_number: String,
}

impl X509View {
    /// Creates a new [`X509View`] from its parts.
    pub fn new(issuer_name: String, serial_number: String) -> Self {
        Self {
            issuer_name,
            serial_number,
        }
    }

    /// Parses a PEM or DER encoded X.509 certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * `content` is not a valid X.509 certificate,
    /// * the issuer has no UTF-8 representable common name,
    /// * or the serial number can not be converted to decimal.
    pub fn parse(content: &[u8]) -> Result<Self, Error> {
        let x509 = if content.trim_ascii_start().starts_with(b"-----BEGIN") {
            X509::from_pem(content)
        } else {
            X509::from_der(content)
        }
        .map_err(|source| Error::X509 {
            context: "decoding the certificate",
            source,
        })?;

        let issuer_name = x509
            .issuer_name()
            .entries_by_nid(Nid::COMMONNAME)
            .next()
            .ok_or(Error::MissingIssuerCommonName)?
            .data()
            .as_utf8()
            .map_err(|source| Error::X509 {
                context: "reading the issuer common name",
                source,
            })?
            .to_string();

        let serial_number = x509
            .serial_number()
            .to_bn()
            .and_then(|serial| serial.to_dec_str())
            .map_err(|source| Error::X509 {
                context: "converting the serial number to decimal",
                source,
            })?
            .to_string();

        Ok(Self {
            issuer_name,
            serial_number,
        })
    }

    /// Returns the common name of the certificate issuer.
    pub fn issuer_name(&self) -> &str {
        &self.issuer_name
    }

    /// Returns the serial number as decimal string.
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use testresult::TestResult;

    use super::*;

    const CERTIFICATE: &str = "-----BEGIN CERTIFICATE-----
MIIFkTCCBPqgAwIBAgIgATFR4s38D0w+myn6PrQZ5hxApNXHM0ZG9gj+tvD3TEQw
DQYJKoZIhvcNAQELBQAwRDELMAkGA1UEBgwCVVMxFjAUBgNVBAoMDUdlb1RydXN0
IEluYy4xHTAbBgNVBAMMFEdlb1RydXN0IFNTTCBDQSAtIEczMB4XDTIwMDMyMTAw
MDAwMFoXDTIxMDMyMjAwMDAwMFowazELMAkGA1UEBgwCRlIxFzAVBgNVBAgMDlNl
aW5lLWV0LU1hcm5lMQ4wDAYDVQQHDAVNZWx1bjEdMBsGA1UECgwURWxjaW1haSBJ
bmZvcm1hdGlxdWUxFDASBgNVBAMMCyoud2ViYW5rLmZyMIGfMA0GCSqGSIb3DQEB
AQUAA4GNADCBiQKBgQCMwexPODeJcwskuyIjIqQ2pDkI6k4HEVnpfGOdc4x9jF0c
FYn4pdwJ9Mdz6GqgoHLjWH2D1rKH1jEsOFT9ks+QyHRtKG/q9lyCrzuBo6cYTXU8
Mgi9USM+Z70J4NVSFKObOCz/3eJrz4fDe955DEMqhc+VkmXlyOOdiKy7Pi2bbwID
AQABo4IDSzCCA0cwHQYDVR0OBBYEFEQCpSXQ8qCNe7wAST1u7l+xWfk3MCEGA1Ud
EQQaMBiCCyoud2ViYW5rLmZyggl3ZWJhbmsuZnIwCQYDVR0TBAIwADAOBgNVHQ8B
Af8EBAMCBaAwKwYDVR0fBCQwIjAgoB6gHIYaaHR0cDovL2duLnN5bWNiLmNvbS9n
bi5jcmwwgZ0GA1UdIASBlTCBkjCBjwYGZ4EMAQICMIGEMD8GCCsGAQUFBwIBFjNo
dHRwczovL3d3dy5nZW90cnVzdC5jb20vcmVzb3VyY2VzL3JlcG9zaXRvcnkvbGVn
YWwwQQYIKwYBBQUHAgIwNQwzaHR0cHM6Ly93d3cuZ2VvdHJ1c3QuY29tL3Jlc291
cmNlcy9yZXBvc2l0b3J5L2xlZ2FsMB0GA1UdJQQWMBQGCCsGAQUFBwMBBggrBgEF
BQcDAjBXBggrBgEFBQcBAQRLMEkwHwYIKwYBBQUHMAGGE2h0dHA6Ly9nbi5zeW1j
ZC5jb20wJgYIKwYBBQUHMAKGGmh0dHA6Ly9nbi5zeW1jYi5jb20vZ24uY3J0MIIB
gAYKKwYBBAHWeQIEAgSCAXAEggFsAWoAdwDd6x0reg1PpiCLga2BaHB+Lo6dAdVc
iI09EcTNtuy+zAAAAV0IlzKdAAAEAwBIMEYCIQCAmBAT3jrrGQzLqiWr7XG9Ma31
E5dyCZ1QiG3gQTiDXgIhANk2NhwptVTq1o3+6efZYeWwOCmEyBBfMAse3u+sj9si
AHYApLkJkLQYWBSHuxOizGdwCjw1mAT5G9+443fNDsgN3BAAAAFdCJcy0AAABAMA
RzBFAiBPH7a68j1F5NiI70iLzmqh63V1z7LnxFPjAA70Lg4JqQIhAJGE7aQlbF5J
8/Uvb9DbgjcwYsyf/+bCF0njea7h72fyAHcA7ku9t3XOYLrhQmkfq+GeZqMPfl+w
ctiDAMR7iXqo/csAAAFdCJc0lwAABAMASDBGAiEAz50rc4sEvmcbOn89K3fJFpvz
kAPePPr2DlOoZ2sy6GQCIQCcMy79mKrIFY7f6WLcv3+GLcFwdfvisCYDc5fWM3Eg
oTAfBgNVHSMEGDAWgBREAqUl0PKgjXu8AEk9bu5fsVn5NzANBgkqhkiG9w0BAQsF
AAOBgQAxGXciJF/M2YjL0bGlTnY6kWXLycc/7Jinid9wed+5DiTzBFaVDyOzVAMl
r5tsKbt8WSCVQ8X5Sj9rfUzTm0bZgYpkUPgeGCjygvNSSwX06Z5gvO22Dl7FwBuQ
qMhfNZS+QyoxgBs18dvl82RtCY8EZXP/jMdHu1gHlFQD6wZyHQ==
-----END CERTIFICATE-----";

    const ISSUER_NAME: &str = "GeoTrust SSL CA - G3";

    const SERIAL_NUMBER: &str =
        "539453510852155194065233908413342789156542395956670254476154968597583055940";

    #[test]
    fn getters_without_private_key_and_content() -> TestResult {
        let certificate = Certificate::new(
            CertificateType::Authentication,
            "test2".to_string(),
            None,
            None,
        );

        assert_eq!(
            certificate.certificate_type(),
            CertificateType::Authentication
        );
        assert_eq!(certificate.public_key(), "test2");
        assert_eq!(certificate.private_key(), None);
        assert_eq!(certificate.content(), None);
        assert_eq!(certificate.to_x509()?, None);
        Ok(())
    }

    #[test]
    fn getters_without_content() -> TestResult {
        let certificate = Certificate::new(
            CertificateType::Encryption,
            "test2".to_string(),
            Some("test3".to_string()),
            None,
        );

        assert_eq!(certificate.certificate_type(), CertificateType::Encryption);
        assert_eq!(certificate.public_key(), "test2");
        assert_eq!(certificate.private_key(), Some("test3"));
        assert_eq!(certificate.content(), None);
        assert_eq!(certificate.to_x509()?, None);
        Ok(())
    }

    #[test]
    fn getters_with_pem_content() -> TestResult {
        let certificate = Certificate::new(
            CertificateType::Signature,
            "test2".to_string(),
            Some("test3".to_string()),
            Some(CERTIFICATE.as_bytes().to_vec()),
        );

        assert_eq!(certificate.public_key(), "test2");
        assert_eq!(certificate.private_key(), Some("test3"));
        assert_eq!(certificate.content(), Some(CERTIFICATE.as_bytes()));

        let x509 = certificate.to_x509()?.ok_or("X.509 view is missing")?;
        assert_eq!(x509.issuer_name(), ISSUER_NAME);
        assert_eq!(x509.serial_number(), SERIAL_NUMBER);
        // repeated parsing yields the same view
        assert_eq!(certificate.to_x509()?, Some(x509));
        Ok(())
    }

    #[test]
    fn x509_view_from_der() -> TestResult {
        let der = X509::from_pem(CERTIFICATE.as_bytes())?.to_der()?;

        let x509 = X509View::parse(&der)?;
        assert_eq!(
            x509,
            X509View::new(ISSUER_NAME.to_string(), SERIAL_NUMBER.to_string())
        );
        Ok(())
    }

    #[rstest]
    #[case::garbage(b"not a certificate".as_slice())]
    #[case::broken_pem(b"-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----".as_slice())]
    fn malformed_content_fails(#[case] content: &[u8]) -> TestResult {
        let certificate = Certificate::new(
            CertificateType::Authentication,
            "test2".to_string(),
            None,
            Some(content.to_vec()),
        );

        assert!(matches!(certificate.to_x509(), Err(Error::X509 { .. })));
        Ok(())
    }

    #[test]
    fn debug_redacts_private_key() -> TestResult {
        let certificate = Certificate::new(
            CertificateType::Authentication,
            "public".to_string(),
            Some("very secret".to_string()),
            None,
        );

        assert!(!format!("{certificate:?}").contains("very secret"));
        Ok(())
    }

    #[rstest]
    #[case(CertificateType::Authentication, "X")]
    #[case(CertificateType::Encryption, "E")]
    #[case(CertificateType::Signature, "A")]
    fn certificate_type_names(
        #[case] certificate_type: CertificateType,
        #[case] name: &str,
    ) -> TestResult {
        assert_eq!(certificate_type.to_string(), name);
        assert_eq!(name.parse::<CertificateType>()?, certificate_type);
        Ok(())
    }
}
