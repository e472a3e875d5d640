use base64ct::{Base64, Encoding};
use ebics_keyring::{CertificateProvider, KeyRole};
use log::trace;

use super::DIGEST_ALGORITHM;
use crate::{CryptoService, Error, xml::Element};

/// The canonicalization method of signed info and referenced elements (inclusive C14N 1.0).
pub const CANONICALIZATION_ALGORITHM: &str = "http://www.w3.org/TR/2001/REC-xml-c14n-20010315";

/// The signature method of authentication signatures.
pub const SIGNATURE_ALGORITHM: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";

/// The reference to all elements covered by the authentication signature.
pub const AUTHENTICATED_REFERENCE: &str = "#xpointer(//*[@authenticate='true'])";

/// Builds the `AuthSignature` element of signed EBICS requests.
#[derive(Clone, Debug)]
pub struct AuthSignatureBuilder<C> {
    crypto: C,
}

impl<C: CryptoService> AuthSignatureBuilder<C> {
    /// Creates a new [`AuthSignatureBuilder`].
    pub fn new(crypto: C) -> Self {
        Self { crypto }
    }

    /// Builds the `AuthSignature` element for `request`.
    ///
    /// The digest covers the canonical forms of all elements of `request` with attribute
    /// `authenticate="true"`, concatenated in document order.
    /// The signed info is canonicalized in the namespace scope of the root of `request` and
    /// signed with the private key of the user authentication certificate in `key_ring`.
    ///
    /// `request` must be complete apart from the signature, as any later change to
    /// authenticated elements invalidates it.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * the key ring holds no user authentication certificate or it has no private key,
    /// * or signing fails.
    pub fn build(
        &self,
        request: &Element,
        key_ring: &impl CertificateProvider,
    ) -> Result<Element, Error> {
        let role = KeyRole::UserAuthentication;
        let private_key = key_ring
            .certificate(role)
            .ok_or(Error::MissingCertificate { role })?
            .private_key()
            .ok_or(Error::MissingPrivateKey { role })?;

        let authenticated = request.canonicalize_where("authenticate", "true");
        trace!(
            "Digesting {} authenticated element(s) of {}",
            authenticated.len(),
            request.name()
        );
        let digest = self.crypto.calculate_hash(authenticated.concat().as_bytes());

        let signed_info = Element::new("ds:SignedInfo")
            .with_child(
                Element::new("ds:CanonicalizationMethod")
                    .with_attribute("Algorithm", CANONICALIZATION_ALGORITHM),
            )
            .with_child(
                Element::new("ds:SignatureMethod").with_attribute("Algorithm", SIGNATURE_ALGORITHM),
            )
            .with_child(
                Element::new("ds:Reference")
                    .with_attribute("URI", AUTHENTICATED_REFERENCE)
                    .with_child(
                        Element::new("ds:Transforms").with_child(
                            Element::new("ds:Transform")
                                .with_attribute("Algorithm", CANONICALIZATION_ALGORITHM),
                        ),
                    )
                    .with_child(
                        Element::new("ds:DigestMethod").with_attribute("Algorithm", DIGEST_ALGORITHM),
                    )
                    .with_child(
                        Element::new("ds:DigestValue").with_text(Base64::encode_string(&digest)),
                    ),
            );

        let canonical_signed_info = signed_info.canonicalize_in(&request.namespace_declarations());
        let signature = self
            .crypto
            .sign_with_private_key(canonical_signed_info.as_bytes(), private_key)?;

        Ok(Element::new("AuthSignature")
            .with_child(signed_info)
            .with_child(
                Element::new("ds:SignatureValue").with_text(Base64::encode_string(&signature)),
            ))
    }
}
