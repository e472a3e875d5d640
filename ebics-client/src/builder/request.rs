use std::io::Write;

use base64ct::{Base64, Encoding};
use chrono::{DateTime, Utc};
use ebics_keyring::{Certificate, CertificateProvider, KeyRole};
use flate2::{Compression, write::ZlibEncoder};
use log::debug;

use super::{AuthSignatureBuilder, HeaderBuilder, OrderDataBuilder};
use crate::{
    Bank,
    CryptoService,
    EnvelopeKind,
    Error,
    OrderData,
    OrderType,
    Request,
    TransactionPhase,
    User,
    xml::{EBICS_NAMESPACE, Element, XMLDSIG_NAMESPACE},
};

/// The EBICS protocol version of all requests.
const PROTOCOL_VERSION: &str = "H004";

/// The revision of the EBICS protocol version.
const PROTOCOL_REVISION: &str = "1";

/// Builds complete EBICS requests, one method per order type.
///
/// Every method is a pure function of its arguments and the [`CryptoService`]: nothing is
/// retained between calls.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use ebics_client::{BankSettings, RequestBuilder, RsaCryptoService, UserSettings};
/// use ebics_keyring::{Certificate, CertificateType, KeyRing, KeyRole};
///
/// # fn main() -> testresult::TestResult {
/// let mut key_ring = KeyRing::default();
/// key_ring.set_certificate(
///     KeyRole::UserAuthentication,
///     Certificate::generate(CertificateType::Authentication, 2048)?,
/// )?;
/// key_ring.set_certificate(
///     KeyRole::UserEncryption,
///     Certificate::generate(CertificateType::Encryption, 2048)?,
/// )?;
///
/// let request = RequestBuilder::new(RsaCryptoService).build_hia(
///     &BankSettings::new("EBIXHOST".to_string(), false),
///     &UserSettings::new(Some("PARTNER".to_string()), Some("USER".to_string())),
///     &key_ring,
///     &Utc::now(),
/// )?;
///
/// assert!(request.to_xml()?.contains("<OrderType>HIA</OrderType>"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct RequestBuilder<C> {
    header: HeaderBuilder<C>,
    auth_signature: AuthSignatureBuilder<C>,
    order_data: OrderDataBuilder,
}

impl<C: CryptoService + Clone> RequestBuilder<C> {
    /// Creates a new [`RequestBuilder`] whose builders share `crypto`.
    pub fn new(crypto: C) -> Self {
        Self::from_parts(
            HeaderBuilder::new(crypto.clone()),
            AuthSignatureBuilder::new(crypto),
        )
    }
}

impl<C: CryptoService> RequestBuilder<C> {
    /// Creates a new [`RequestBuilder`] from a [`HeaderBuilder`] and an [`AuthSignatureBuilder`].
    pub fn from_parts(header: HeaderBuilder<C>, auth_signature: AuthSignatureBuilder<C>) -> Self {
        Self {
            header,
            auth_signature,
            order_data: OrderDataBuilder::new(),
        }
    }

    /// Builds a signed `HPB` request downloading the bank's public keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the header can not be built or the request can not be signed.
    pub fn build_hpb(
        &self,
        bank: &impl Bank,
        user: &impl User,
        key_ring: &impl CertificateProvider,
        timestamp: &DateTime<Utc>,
    ) -> Result<Request, Error> {
        let order_type = OrderType::Hpb;
        debug!("Building {order_type} request for host {}", bank.host_id());

        let root = envelope(order_type.envelope_kind())
            .with_child(
                self.header
                    .build_no_pub_key_digests_header(bank, user, order_type, timestamp)?,
            )
            .with_child(Element::new("body"));
        Ok(Request::new(order_type, self.sign(root, key_ring)?))
    }

    /// Builds the signed initialisation request of the download order `order_type`.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * `order_type` is not a download order,
    /// * the header can not be built,
    /// * or the request can not be signed.
    pub fn build_download(
        &self,
        order_type: OrderType,
        bank: &impl Bank,
        user: &impl User,
        key_ring: &impl CertificateProvider,
        timestamp: &DateTime<Utc>,
    ) -> Result<Request, Error> {
        if !order_type.is_download() {
            return Err(Error::UnsupportedOrderType {
                order_type,
                context: "building a download request",
            });
        }
        debug!("Building {order_type} request for host {}", bank.host_id());

        let root = envelope(order_type.envelope_kind())
            .with_child(self.header.build_transaction_header(
                bank,
                user,
                key_ring,
                order_type,
                timestamp,
                TransactionPhase::Initialisation,
            )?)
            .with_child(Element::new("body"));
        Ok(Request::new(order_type, self.sign(root, key_ring)?))
    }

    /// Builds a signed `HPD` request downloading the bank parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the request can not be built, see [`RequestBuilder::build_download`].
    pub fn build_hpd(
        &self,
        bank: &impl Bank,
        user: &impl User,
        key_ring: &impl CertificateProvider,
        timestamp: &DateTime<Utc>,
    ) -> Result<Request, Error> {
        self.build_download(OrderType::Hpd, bank, user, key_ring, timestamp)
    }

    /// Builds a signed `HKD` request downloading customer and subscriber data.
    ///
    /// # Errors
    ///
    /// Returns an error if the request can not be built, see [`RequestBuilder::build_download`].
    pub fn build_hkd(
        &self,
        bank: &impl Bank,
        user: &impl User,
        key_ring: &impl CertificateProvider,
        timestamp: &DateTime<Utc>,
    ) -> Result<Request, Error> {
        self.build_download(OrderType::Hkd, bank, user, key_ring, timestamp)
    }

    /// Builds a signed `HTD` request downloading subscriber data.
    ///
    /// # Errors
    ///
    /// Returns an error if the request can not be built, see [`RequestBuilder::build_download`].
    pub fn build_htd(
        &self,
        bank: &impl Bank,
        user: &impl User,
        key_ring: &impl CertificateProvider,
        timestamp: &DateTime<Utc>,
    ) -> Result<Request, Error> {
        self.build_download(OrderType::Htd, bank, user, key_ring, timestamp)
    }

    /// Builds a signed `HAA` request downloading the available order types.
    ///
    /// # Errors
    ///
    /// Returns an error if the request can not be built, see [`RequestBuilder::build_download`].
    pub fn build_haa(
        &self,
        bank: &impl Bank,
        user: &impl User,
        key_ring: &impl CertificateProvider,
        timestamp: &DateTime<Utc>,
    ) -> Result<Request, Error> {
        self.build_download(OrderType::Haa, bank, user, key_ring, timestamp)
    }

    /// Builds a signed `PTK` request downloading the customer protocol.
    ///
    /// # Errors
    ///
    /// Returns an error if the request can not be built, see [`RequestBuilder::build_download`].
    pub fn build_ptk(
        &self,
        bank: &impl Bank,
        user: &impl User,
        key_ring: &impl CertificateProvider,
        timestamp: &DateTime<Utc>,
    ) -> Result<Request, Error> {
        self.build_download(OrderType::Ptk, bank, user, key_ring, timestamp)
    }

    /// Builds the unsigned `HIA` request transmitting the user authentication and encryption
    /// keys.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * the key ring holds no user authentication or encryption certificate,
    /// * the order data can not be built,
    /// * or the order data can not be serialized or compressed.
    pub fn build_hia(
        &self,
        bank: &impl Bank,
        user: &impl User,
        key_ring: &impl CertificateProvider,
        timestamp: &DateTime<Utc>,
    ) -> Result<Request, Error> {
        let authentication = required_certificate(key_ring, KeyRole::UserAuthentication)?;
        let encryption = required_certificate(key_ring, KeyRole::UserEncryption)?;
        let order_data = self.order_data.build_key_exchange_order_data(
            bank,
            user,
            key_ring,
            authentication,
            encryption,
            timestamp,
        )?;
        self.build_unsecured(OrderType::Hia, bank, user, &order_data)
    }

    /// Builds the unsigned `INI` request transmitting the user signature key.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * the key ring holds no user signature certificate,
    /// * the order data can not be built,
    /// * or the order data can not be serialized or compressed.
    pub fn build_ini(
        &self,
        bank: &impl Bank,
        user: &impl User,
        key_ring: &impl CertificateProvider,
        timestamp: &DateTime<Utc>,
    ) -> Result<Request, Error> {
        let signature = required_certificate(key_ring, KeyRole::UserSignature)?;
        let order_data =
            self.order_data
                .build_signature_order_data(bank, user, key_ring, signature, timestamp)?;
        self.build_unsecured(OrderType::Ini, bank, user, &order_data)
    }

    fn build_unsecured(
        &self,
        order_type: OrderType,
        bank: &impl Bank,
        user: &impl User,
        order_data: &OrderData,
    ) -> Result<Request, Error> {
        debug!("Building {order_type} request for host {}", bank.host_id());
        let compressed = compress(order_data.to_xml()?.as_bytes())?;

        let root = envelope(order_type.envelope_kind())
            .with_child(self.header.build_unsecured_header(bank, user, order_type))
            .with_child(
                Element::new("body").with_child(
                    Element::new("DataTransfer").with_child(
                        Element::new("OrderData").with_text(Base64::encode_string(&compressed)),
                    ),
                ),
            );
        Ok(Request::new(order_type, root))
    }

    /// Signs the otherwise complete `root` and places the signature after the header.
    fn sign(&self, mut root: Element, key_ring: &impl CertificateProvider) -> Result<Element, Error> {
        let auth_signature = self.auth_signature.build(&root, key_ring)?;
        root.insert_child(1, auth_signature);
        Ok(root)
    }
}

fn envelope(kind: EnvelopeKind) -> Element {
    Element::new(kind.to_string())
        .with_attribute("xmlns", EBICS_NAMESPACE)
        .with_attribute("xmlns:ds", XMLDSIG_NAMESPACE)
        .with_attribute("Version", PROTOCOL_VERSION)
        .with_attribute("Revision", PROTOCOL_REVISION)
}

fn required_certificate(
    key_ring: &impl CertificateProvider,
    role: KeyRole,
) -> Result<&Certificate, Error> {
    key_ring
        .certificate(role)
        .ok_or(Error::MissingCertificate { role })
}

/// Compresses `data` using zlib.
fn compress(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(Error::Compression)?;
    encoder.finish().map_err(Error::Compression)
}
