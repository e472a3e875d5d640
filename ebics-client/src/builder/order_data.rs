use base64ct::{Base64, Encoding};
use chrono::{DateTime, Utc};
use ebics_keyring::{Certificate, CertificateProvider, KeyRole, X509View};
use log::debug;

use super::{format_timestamp, subscriber_elements};
use crate::{
    Bank,
    Error,
    OrderData,
    User,
    xml::{EBICS_NAMESPACE, Element, SIGNATURE_NAMESPACE, XMLDSIG_NAMESPACE},
};

/// Builds the order data documents of the key initialisation orders `HIA` and `INI`.
///
/// If the [`Bank`] is certified, every public key is accompanied by the issuer and serial
/// number of its X.509 certificate.
/// A certificate without X.509 content is an error in that case.
#[derive(Clone, Copy, Debug, Default)]
pub struct OrderDataBuilder;

impl OrderDataBuilder {
    /// Creates a new [`OrderDataBuilder`].
    pub fn new() -> Self {
        Self
    }

    /// Builds the `HIARequestOrderData` document announcing the subscriber's authentication and
    /// encryption keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use ebics_client::{BankSettings, OrderDataBuilder, UserSettings};
    /// use ebics_keyring::{Certificate, CertificateType, KeyRing};
    ///
    /// # fn main() -> testresult::TestResult {
    /// let authentication = Certificate::generate(CertificateType::Authentication, 2048)?;
    /// let encryption = Certificate::generate(CertificateType::Encryption, 2048)?;
    /// let order_data = OrderDataBuilder::new().build_key_exchange_order_data(
    ///     &BankSettings::new("EBIXHOST".to_string(), false),
    ///     &UserSettings::default(),
    ///     &KeyRing::default(),
    ///     &authentication,
    ///     &encryption,
    ///     &Utc::now(),
    /// )?;
    ///
    /// assert_eq!(order_data.root().name(), "HIARequestOrderData");
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * a public key can not be decoded,
    /// * the X.509 content of a certificate can not be parsed,
    /// * or the bank is certified and a certificate has no X.509 content.
    ///
    /// The authentication certificate is checked before the encryption certificate.
    pub fn build_key_exchange_order_data(
        &self,
        bank: &impl Bank,
        user: &impl User,
        key_ring: &impl CertificateProvider,
        authentication: &Certificate,
        encryption: &Certificate,
        timestamp: &DateTime<Utc>,
    ) -> Result<OrderData, Error> {
        let certified = bank.is_certified();
        debug!("Building HIA order data for host {} (certified: {certified})", bank.host_id());

        let authentication_x509 = x509_for(certified, authentication)?;
        let encryption_x509 = x509_for(certified, encryption)?;
        let timestamp = format_timestamp(timestamp);

        let root = Element::new("HIARequestOrderData")
            .with_attribute("xmlns", EBICS_NAMESPACE)
            .with_attribute("xmlns:ds", XMLDSIG_NAMESPACE)
            .with_child(pub_key_info(
                "AuthenticationPubKeyInfo",
                authentication,
                authentication_x509.as_ref(),
                &timestamp,
                Element::new("AuthenticationVersion")
                    .with_text(key_ring.version(KeyRole::UserAuthentication).unwrap_or_default()),
            )?)
            .with_child(pub_key_info(
                "EncryptionPubKeyInfo",
                encryption,
                encryption_x509.as_ref(),
                &timestamp,
                Element::new("EncryptionVersion")
                    .with_text(key_ring.version(KeyRole::UserEncryption).unwrap_or_default()),
            )?)
            .with_children(subscriber_elements(user));

        Ok(OrderData::new(root))
    }

    /// Builds the `SignaturePubKeyOrderData` document announcing the subscriber's signature key.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * the public key can not be decoded,
    /// * the X.509 content of the certificate can not be parsed,
    /// * or the bank is certified and the certificate has no X.509 content.
    pub fn build_signature_order_data(
        &self,
        bank: &impl Bank,
        user: &impl User,
        key_ring: &impl CertificateProvider,
        signature: &Certificate,
        timestamp: &DateTime<Utc>,
    ) -> Result<OrderData, Error> {
        let certified = bank.is_certified();
        debug!("Building INI order data for host {} (certified: {certified})", bank.host_id());

        let signature_x509 = x509_for(certified, signature)?;
        let timestamp = format_timestamp(timestamp);

        let root = Element::new("SignaturePubKeyOrderData")
            .with_attribute("xmlns", SIGNATURE_NAMESPACE)
            .with_attribute("xmlns:ds", XMLDSIG_NAMESPACE)
            .with_child(pub_key_info(
                "SignaturePubKeyInfo",
                signature,
                signature_x509.as_ref(),
                &timestamp,
                Element::new("SignatureVersion")
                    .with_text(key_ring.version(KeyRole::UserSignature).unwrap_or_default()),
            )?)
            .with_children(subscriber_elements(user));

        Ok(OrderData::new(root))
    }
}

/// Returns the [`X509View`] of `certificate` if the bank is certified.
fn x509_for(certified: bool, certificate: &Certificate) -> Result<Option<X509View>, Error> {
    if !certified {
        return Ok(None);
    }
    match certificate.to_x509()? {
        Some(x509) => Ok(Some(x509)),
        None => Err(Error::CertificateX509Empty {
            certificate_type: certificate.certificate_type(),
        }),
    }
}

fn pub_key_info(
    name: &str,
    certificate: &Certificate,
    x509: Option<&X509View>,
    timestamp: &str,
    version: Element,
) -> Result<Element, Error> {
    let mut info = Element::new(name);
    if let Some(x509) = x509 {
        info.push_child(x509_data(x509));
    }
    let parts = certificate.public_key_parts()?;
    info.push_child(
        Element::new("PubKeyValue")
            .with_child(
                Element::new("ds:RSAKeyValue")
                    .with_child(
                        Element::new("ds:Modulus").with_text(Base64::encode_string(parts.modulus())),
                    )
                    .with_child(
                        Element::new("ds:Exponent")
                            .with_text(Base64::encode_string(parts.exponent())),
                    ),
            )
            .with_child(Element::new("TimeStamp").with_text(timestamp)),
    );
    info.push_child(version);
    Ok(info)
}

fn x509_data(x509: &X509View) -> Element {
    Element::new("ds:X509Data")
        .with_child(
            Element::new("ds:X509IssuerSerial")
                .with_child(Element::new("ds:X509IssuerName").with_text(x509.issuer_name()))
                .with_child(Element::new("ds:X509SerialNumber").with_text(x509.serial_number())),
        )
        .with_child(Element::new("ds:X509Certificate"))
}
