//! Conversion between two currencies of a rate table.
//!
//! Both rates are expressed against the table's anchor currency, so the anchor
//! itself never takes part in the computation:
//!
//! ```text
//! result = amount * rate(target) / rate(source)
//! ```
//!
//! Results are never rounded here. Rounding happens only when a value is
//! displayed.

use crate::core::currency::CurrencyCode;
use crate::core::rates::RateTable;
use thiserror::Error;

/// Why a conversion has no result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UndefinedConversion {
    #[error("rates not loaded")]
    RatesNotLoaded,
    #[error("no rate for source currency {0}")]
    UnknownSource(CurrencyCode),
    #[error("no rate for target currency {0}")]
    UnknownTarget(CurrencyCode),
    #[error("invalid amount {0}")]
    InvalidAmount(f64),
}

pub type ConversionResult = Result<f64, UndefinedConversion>;

/// Converts `amount` of `source` into `target` using `table`.
pub fn convert(
    table: &RateTable,
    amount: f64,
    source: &CurrencyCode,
    target: &CurrencyCode,
) -> ConversionResult {
    if !amount.is_finite() || amount < 0.0 {
        return Err(UndefinedConversion::InvalidAmount(amount));
    }
    if table.is_empty() {
        return Err(UndefinedConversion::RatesNotLoaded);
    }
    let source_rate = table
        .get(source)
        .ok_or_else(|| UndefinedConversion::UnknownSource(source.clone()))?;
    let target_rate = table
        .get(target)
        .ok_or_else(|| UndefinedConversion::UnknownTarget(target.clone()))?;

    if source == target {
        return Ok(amount);
    }
    Ok(amount * target_rate / source_rate)
}

/// The inputs a user changes between recomputations.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub amount: f64,
    pub source: CurrencyCode,
    pub target: CurrencyCode,
}

impl ConversionRequest {
    pub fn new(amount: f64, source: CurrencyCode, target: CurrencyCode) -> Self {
        Self {
            amount,
            source,
            target,
        }
    }

    pub fn evaluate(&self, table: &RateTable) -> ConversionResult {
        convert(table, self.amount, &self.source, &self.target)
    }

    pub fn swapped(&self) -> Self {
        Self::new(self.amount, self.target.clone(), self.source.clone())
    }
}
