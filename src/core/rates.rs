//! Exchange rate tables and the provider abstraction that produces them

use crate::core::currency::CurrencyCode;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Rates for a set of currencies, all expressed against one anchor currency.
///
/// Every rate is strictly positive and finite. A table is never modified once
/// built; a newer fetch produces a new table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: BTreeMap<CurrencyCode, f64>,
}

impl RateTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a table, rejecting any rate that is zero, negative or not finite.
    pub fn new<I>(rates: I) -> Result<Self>
    where
        I: IntoIterator<Item = (CurrencyCode, f64)>,
    {
        let mut table = BTreeMap::new();
        for (code, rate) in rates {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(anyhow!("Invalid rate {} for currency: {}", rate, code));
            }
            table.insert(code, rate);
        }
        Ok(Self { rates: table })
    }

    pub fn get(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Currency codes in alphabetical order.
    pub fn codes(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.rates.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, f64)> {
        self.rates.iter().map(|(code, rate)| (code, *rate))
    }
}

/// A rate table together with the date it was published for.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    pub table: RateTable,
    pub date: NaiveDate,
    /// Anchor currency, when the provider reports one.
    pub base: Option<CurrencyCode>,
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rates(&self) -> Result<RateSnapshot>;
}
