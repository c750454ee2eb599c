use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

use crate::core::currency::CurrencyCode;
use crate::core::rates::{RateProvider, RateSnapshot, RateTable};

// VatComplyProvider implementation for RateProvider
pub struct VatComplyProvider {
    base_url: String,
}

impl VatComplyProvider {
    pub fn new(base_url: &str) -> Self {
        VatComplyProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VatComplyRatesResponse {
    date: String,
    base: Option<String>,
    rates: HashMap<String, f64>,
}

impl VatComplyRatesResponse {
    fn into_snapshot(self) -> Result<RateSnapshot> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .with_context(|| format!("Invalid rate date: {}", self.date))?;

        let base = self
            .base
            .as_deref()
            .map(str::parse::<CurrencyCode>)
            .transpose()?;

        let mut rates: Vec<(CurrencyCode, f64)> = self
            .rates
            .into_iter()
            .filter_map(|(key, rate)| match key.parse::<CurrencyCode>() {
                Ok(code) => Some((code, rate)),
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping unrecognised currency in rates");
                    None
                }
            })
            .collect();

        // The anchor is listed against itself only by some deployments.
        if let Some(base) = &base {
            if !rates.iter().any(|(code, _)| code == base) {
                rates.push((base.clone(), 1.0));
            }
        }

        Ok(RateSnapshot {
            table: RateTable::new(rates)?,
            date,
            base,
        })
    }
}

#[async_trait]
impl RateProvider for VatComplyProvider {
    #[instrument(name = "VatComplyRatesFetch", skip(self))]
    async fn fetch_rates(&self) -> Result<RateSnapshot> {
        let url = format!("{}/rates", self.base_url);
        debug!("Requesting exchange rates from {}", url);

        let client = reqwest::Client::builder().user_agent("tukar/0.1").build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} URL: {}", e, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for URL: {}",
                response.status(),
                url
            ));
        }

        let text = response.text().await?;
        let data: VatComplyRatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response from {}: {}", url, e))?;

        let snapshot = data.into_snapshot()?;
        debug!(
            date = %snapshot.date,
            currencies = snapshot.table.len(),
            "Received exchange rates"
        );
        Ok(snapshot)
    }
}
