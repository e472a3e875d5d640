use base64ct::{Base64, Encoding};
use chrono::{DateTime, Utc};
use ebics_keyring::{CertificateProvider, KeyRole};
use log::trace;

use super::{DIGEST_ALGORITHM, PRODUCT_LANGUAGE, PRODUCT_NAME, format_timestamp, subscriber_elements};
use crate::{Bank, CryptoService, Error, OrderType, TransactionPhase, User, xml::Element};

/// The security medium reported in request headers.
const SECURITY_MEDIUM: &str = "0000";

/// Builds the `header` element of EBICS requests.
///
/// Every signed header carries a fresh nonce from the [`CryptoService`] and the timestamp it is
/// given.
#[derive(Clone, Debug)]
pub struct HeaderBuilder<C> {
    crypto: C,
}

impl<C: CryptoService> HeaderBuilder<C> {
    /// Creates a new [`HeaderBuilder`].
    pub fn new(crypto: C) -> Self {
        Self { crypto }
    }

    /// Builds the header of a request within a transaction (`ebicsRequest`).
    ///
    /// The static part identifies bank, subscriber and order and refers to the bank keys by
    /// digest, the mutable part carries the transaction `phase`.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * no nonce can be generated,
    /// * the key ring holds no bank authentication or encryption certificate,
    /// * or a digest of the bank keys can not be calculated.
    pub fn build_transaction_header(
        &self,
        bank: &impl Bank,
        user: &impl User,
        key_ring: &impl CertificateProvider,
        order_type: OrderType,
        timestamp: &DateTime<Utc>,
        phase: TransactionPhase,
    ) -> Result<Element, Error> {
        let nonce = self.crypto.generate_nonce()?;
        trace!("Building {order_type} transaction header in phase {phase}");

        let static_header = Element::new("static")
            .with_child(host_id(bank))
            .with_child(Element::new("Nonce").with_text(nonce))
            .with_child(Element::new("Timestamp").with_text(format_timestamp(timestamp)))
            .with_children(subscriber_elements(user))
            .with_child(product())
            .with_child(order_details(order_type, true))
            .with_child(self.bank_pub_key_digests(key_ring)?)
            .with_child(security_medium());

        Ok(header(static_header).with_child(
            Element::new("mutable")
                .with_child(Element::new("TransactionPhase").with_text(phase.to_string())),
        ))
    }

    /// Builds the header of a request that does not refer to bank keys
    /// (`ebicsNoPubKeyDigestsRequest`).
    ///
    /// # Errors
    ///
    /// Returns an error if no nonce can be generated.
    pub fn build_no_pub_key_digests_header(
        &self,
        bank: &impl Bank,
        user: &impl User,
        order_type: OrderType,
        timestamp: &DateTime<Utc>,
    ) -> Result<Element, Error> {
        let nonce = self.crypto.generate_nonce()?;
        trace!("Building {order_type} header without bank key digests");

        let static_header = Element::new("static")
            .with_child(host_id(bank))
            .with_child(Element::new("Nonce").with_text(nonce))
            .with_child(Element::new("Timestamp").with_text(format_timestamp(timestamp)))
            .with_children(subscriber_elements(user))
            .with_child(product())
            .with_child(order_details(order_type, false))
            .with_child(security_medium());

        Ok(header(static_header).with_child(Element::new("mutable")))
    }

    /// Builds the header of an unsigned request (`ebicsUnsecuredRequest`).
    ///
    /// Unsigned requests carry neither nonce nor timestamp.
    pub fn build_unsecured_header(
        &self,
        bank: &impl Bank,
        user: &impl User,
        order_type: OrderType,
    ) -> Element {
        trace!("Building unsecured {order_type} header");

        let static_header = Element::new("static")
            .with_child(host_id(bank))
            .with_children(subscriber_elements(user))
            .with_child(product())
            .with_child(order_details(order_type, false))
            .with_child(security_medium());

        header(static_header).with_child(Element::new("mutable"))
    }

    fn bank_pub_key_digests(&self, key_ring: &impl CertificateProvider) -> Result<Element, Error> {
        let mut digests = Element::new("BankPubKeyDigests");
        for (name, role) in [
            ("Authentication", KeyRole::BankAuthentication),
            ("Encryption", KeyRole::BankEncryption),
        ] {
            let certificate = key_ring
                .certificate(role)
                .ok_or(Error::MissingCertificate { role })?;
            let digest = self.crypto.calculate_digest(certificate.public_key())?;
            digests.push_child(
                Element::new(name)
                    .with_attribute("Version", key_ring.version(role).unwrap_or_default())
                    .with_attribute("Algorithm", DIGEST_ALGORITHM)
                    .with_text(Base64::encode_string(&digest)),
            );
        }
        Ok(digests)
    }
}

fn header(static_header: Element) -> Element {
    Element::new("header")
        .with_attribute("authenticate", "true")
        .with_child(static_header)
}

fn host_id(bank: &impl Bank) -> Element {
    Element::new("HostID").with_text(bank.host_id())
}

fn product() -> Element {
    Element::new("Product")
        .with_attribute("Language", PRODUCT_LANGUAGE)
        .with_text(PRODUCT_NAME)
}

fn order_details(order_type: OrderType, standard_order_params: bool) -> Element {
    let details = Element::new("OrderDetails")
        .with_child(Element::new("OrderType").with_text(order_type.to_string()))
        .with_child(
            Element::new("OrderAttribute").with_text(order_type.order_attribute().to_string()),
        );
    if standard_order_params {
        details.with_child(Element::new("StandardOrderParams"))
    } else {
        details
    }
}

fn security_medium() -> Element {
    Element::new("SecurityMedium").with_text(SECURITY_MEDIUM)
}
