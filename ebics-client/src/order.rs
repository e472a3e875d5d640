//! EBICS order types and their request properties.

/// The type of an EBICS order.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum OrderType {
    /// Transmission of the subscriber's electronic signature key.
    Ini,
    /// Transmission of the subscriber's authentication and encryption keys.
    Hia,
    /// Download of the bank's authentication and encryption keys.
    Hpb,
    /// Download of bank parameters.
    Hpd,
    /// Download of customer and subscriber data.
    Hkd,
    /// Download of subscriber data.
    Htd,
    /// Download of the order types available to the subscriber.
    Haa,
    /// Download of the customer protocol.
    Ptk,
}

/// The order attribute of a request.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum OrderAttribute {
    /// Order data is transmitted without electronic signature (key initialisation).
    Dznnn,
    /// Download order with identification and authentication signature.
    Dzhnn,
}

/// The kind of request envelope an order is sent in.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum::Display)]
pub enum EnvelopeKind {
    /// Neither signed nor referring to bank keys.
    #[strum(to_string = "ebicsUnsecuredRequest")]
    Unsecured,
    /// Signed, but without digests of the bank keys.
    #[strum(to_string = "ebicsNoPubKeyDigestsRequest")]
    NoPubKeyDigests,
    /// Signed and referring to the bank keys by digest.
    #[strum(to_string = "ebicsRequest")]
    Transaction,
}

impl OrderType {
    /// Returns the [`OrderAttribute`] used for requests of the order type.
    pub fn order_attribute(self) -> OrderAttribute {
        match self {
            OrderType::Ini | OrderType::Hia => OrderAttribute::Dznnn,
            OrderType::Hpb
            | OrderType::Hpd
            | OrderType::Hkd
            | OrderType::Htd
            | OrderType::Haa
            | OrderType::Ptk => OrderAttribute::Dzhnn,
        }
    }

    /// Returns the [`EnvelopeKind`] requests of the order type are sent in.
    pub fn envelope_kind(self) -> EnvelopeKind {
        match self {
            OrderType::Ini | OrderType::Hia => EnvelopeKind::Unsecured,
            OrderType::Hpb => EnvelopeKind::NoPubKeyDigests,
            OrderType::Hpd
            | OrderType::Hkd
            | OrderType::Htd
            | OrderType::Haa
            | OrderType::Ptk => EnvelopeKind::Transaction,
        }
    }

    /// Returns `true` if the order type downloads data within a transaction.
    pub fn is_download(self) -> bool {
        self.envelope_kind() == EnvelopeKind::Transaction
    }
}

/// The phase of an EBICS transaction.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, strum::Display, strum::EnumString)]
pub enum TransactionPhase {
    /// The first request of a transaction.
    #[default]
    Initialisation,
    /// Transfer of order data segments.
    Transfer,
    /// Acknowledgement of a download.
    Receipt,
}
