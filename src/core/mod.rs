//! Core business logic abstractions

pub mod asset;
pub mod cache;
pub mod config;
pub mod convert;
pub mod currency;
pub mod error;
pub mod log;
pub mod transaction;

// Re-export main types for cleaner imports
pub use asset::{AccountKey, Asset, AssetCategory, CurrencyClassifier};
pub use currency::{RateProvider, RateSource, RateTable};
pub use error::LedgerError;
pub use transaction::{Transaction, TransactionType};
