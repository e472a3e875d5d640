//! The bank side of an EBICS connection.

use serde::{Deserialize, Serialize};

/// A bank an EBICS subscriber communicates with.
pub trait Bank {
    /// Returns the ID of the EBICS host of the bank.
    fn host_id(&self) -> &str;

    /// Returns whether the bank requires X.509 certificates for key exchange.
    fn is_certified(&self) -> bool;
}

/// Static settings of a [`Bank`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BankSettings {
    host_id: String,
    #[serde(default)]
    certified: bool,
}

impl BankSettings {
    /// Creates new [`BankSettings`].
    ///
    /// # Examples
    ///
    /// ```
    /// use ebics_client::{Bank, BankSettings};
    ///
    /// let bank = BankSettings::new("EBIXHOST".to_string(), false);
    /// assert_eq!(bank.host_id(), "EBIXHOST");
    /// assert!(!bank.is_certified());
    /// ```
    pub fn new(host_id: String, certified: bool) -> Self {
        Self { host_id, certified }
    }
}

impl Bank for BankSettings {
    fn host_id(&self) -> &str {
        &self.host_id
    }

    fn is_certified(&self) -> bool {
        self.certified
    }
}
