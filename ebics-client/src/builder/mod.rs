//! Builders for EBICS requests and order data.
//!
//! A [`RequestBuilder`] orchestrates the other builders:
//! the [`HeaderBuilder`] creates the request header, the [`OrderDataBuilder`] creates key
//! exchange order data and the [`AuthSignatureBuilder`] signs the finished request.

mod auth_signature;
mod header;
mod order_data;
mod request;

pub use auth_signature::{
    AUTHENTICATED_REFERENCE,
    AuthSignatureBuilder,
    CANONICALIZATION_ALGORITHM,
    SIGNATURE_ALGORITHM,
};
use chrono::{DateTime, Utc};
pub use header::HeaderBuilder;
pub use order_data::OrderDataBuilder;
pub use request::RequestBuilder;

use crate::{User, xml::Element};

/// The name of the product reported in request headers.
pub const PRODUCT_NAME: &str = concat!("ebics-client ", env!("CARGO_PKG_VERSION"));

/// The language of the product reported in request headers.
pub const PRODUCT_LANGUAGE: &str = "de";

/// The digest algorithm of bank key digests and authentication signature references.
pub const DIGEST_ALGORITHM: &str = "http://www.w3.org/2001/04/xmlenc#sha256";

/// Formats `timestamp` as `YYYY-MM-DDTHH:MM:SSZ`.
pub(crate) fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Returns the `PartnerID` and `UserID` elements for `user`.
///
/// Unknown IDs yield empty elements.
pub(crate) fn subscriber_elements(user: &impl User) -> [Element; 2] {
    [
        Element::new("PartnerID").with_text(user.partner_id().unwrap_or_default()),
        Element::new("UserID").with_text(user.user_id().unwrap_or_default()),
    ]
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn timestamp_format() -> TestResult {
        let timestamp = Utc
            .with_ymd_and_hms(2010, 10, 10, 10, 10, 10)
            .single()
            .ok_or("invalid timestamp")?;

        assert_eq!(format_timestamp(&timestamp), "2010-10-10T10:10:10Z");
        Ok(())
    }
}
