#![doc = include_str!("../README.md")]

pub mod bank;
pub mod builder;
pub mod config;
pub mod crypto;
mod document;
mod error;
pub mod order;
pub mod user;
pub mod xml;

pub use bank::{Bank, BankSettings};
pub use builder::{AuthSignatureBuilder, HeaderBuilder, OrderDataBuilder, RequestBuilder};
pub use config::{ClientConfig, KeyRingSettings};
pub use crypto::{CryptoService, RsaCryptoService};
pub use document::{OrderData, Request};
pub use error::Error;
pub use order::{EnvelopeKind, OrderAttribute, OrderType, TransactionPhase};
pub use user::{User, UserSettings};
