//! Core business logic abstractions

pub mod config;
pub mod convert;
pub mod currency;
pub mod log;
pub mod rates;
pub mod session;

// Re-export main types for cleaner imports
pub use convert::{ConversionRequest, ConversionResult, UndefinedConversion, convert};
pub use currency::CurrencyCode;
pub use rates::{RateProvider, RateSnapshot, RateTable};
pub use session::{RateSession, RatesState};
