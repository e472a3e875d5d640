/// An error that may occur when working with key rings.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A certificate error.
    #[error("Certificate error: {0}")]
    Certificate(#[from] crate::certificate::Error),

    /// An RSA key error.
    #[error("Key error: {0}")]
    Key(#[from] crate::key::Error),

    /// A key ring error.
    #[error("Key ring error: {0}")]
    KeyRing(#[from] crate::keyring::Error),

    /// A passphrase error.
    #[error("Passphrase error: {0}")]
    Passphrase(#[from] crate::passphrase::Error),

    /// A key ring storage error.
    #[error("Key ring storage error: {0}")]
    Store(#[from] crate::store::Error),
}
