//! The subscriber side of an EBICS connection.

use serde::{Deserialize, Serialize};

/// An EBICS subscriber.
pub trait User {
    /// Returns the ID of the partner (customer) the subscriber belongs to, if known.
    fn partner_id(&self) -> Option<&str>;

    /// Returns the ID of the subscriber, if known.
    fn user_id(&self) -> Option<&str>;
}

/// Static settings of a [`User`].
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct UserSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    partner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
}

impl UserSettings {
    /// Creates new [`UserSettings`].
    pub fn new(partner_id: Option<String>, user_id: Option<String>) -> Self {
        Self {
            partner_id,
            user_id,
        }
    }
}

impl User for UserSettings {
    fn partner_id(&self) -> Option<&str> {
        self.partner_id.as_deref()
    }

    fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}
