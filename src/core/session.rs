//! Holds the rate snapshot in use for the lifetime of a session.
//!
//! A fetch never edits the current table. When it completes it publishes a
//! whole new snapshot. Readers clone an `Arc` and always see a complete table.
//! Each fetch takes a generation number when it starts. A fetch that finishes
//! after a newer one has already been published is discarded.

use crate::core::convert::{ConversionRequest, ConversionResult, convert};
use crate::core::currency::CurrencyCode;
use crate::core::rates::{RateProvider, RateSnapshot, RateTable};
use anyhow::Result;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub enum RatesState {
    NotLoaded,
    Loaded { date: NaiveDate, currencies: usize },
}

#[derive(Default)]
struct Published {
    generation: u64,
    snapshot: Option<Arc<RateSnapshot>>,
}

/// Marks a fetch that has started. Pass it back to [`RateSession::publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

#[derive(Default)]
pub struct RateSession {
    next_generation: AtomicU64,
    published: RwLock<Published>,
}

impl RateSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_fetch(&self) -> FetchTicket {
        FetchTicket(self.next_generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Publishes a snapshot fetched under `ticket`.
    ///
    /// Returns `false` when a newer fetch was published first. In that case
    /// the snapshot is dropped.
    pub fn publish(&self, ticket: FetchTicket, snapshot: RateSnapshot) -> bool {
        let mut published = self.published.write().unwrap_or_else(|e| e.into_inner());
        if ticket.0 <= published.generation {
            debug!(
                ticket = ticket.0,
                current = published.generation,
                "Discarding superseded rate snapshot"
            );
            return false;
        }
        published.generation = ticket.0;
        published.snapshot = Some(Arc::new(snapshot));
        true
    }

    pub fn snapshot(&self) -> Option<Arc<RateSnapshot>> {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .snapshot
            .clone()
    }

    pub fn state(&self) -> RatesState {
        match self.snapshot() {
            Some(snapshot) if !snapshot.table.is_empty() => RatesState::Loaded {
                date: snapshot.date,
                currencies: snapshot.table.len(),
            },
            _ => RatesState::NotLoaded,
        }
    }

    /// Fetches new rates and publishes them.
    ///
    /// On failure the error is logged and returned. The current snapshot stays
    /// in place.
    #[instrument(name = "RateRefresh", skip_all)]
    pub async fn refresh(
        &self,
        provider: &(dyn RateProvider + Send + Sync),
    ) -> Result<RatesState> {
        let ticket = self.begin_fetch();
        match provider.fetch_rates().await {
            Ok(snapshot) => {
                let date = snapshot.date;
                let currencies = snapshot.table.len();
                if self.publish(ticket, snapshot) {
                    info!(%date, currencies, "Loaded exchange rates");
                }
                Ok(self.state())
            }
            Err(e) => {
                error!(error = %e, "Error fetching rates");
                Err(e)
            }
        }
    }

    pub fn convert(
        &self,
        amount: f64,
        source: &CurrencyCode,
        target: &CurrencyCode,
    ) -> ConversionResult {
        match self.snapshot() {
            Some(snapshot) => convert(&snapshot.table, amount, source, target),
            None => convert(&RateTable::empty(), amount, source, target),
        }
    }

    pub fn evaluate(&self, request: &ConversionRequest) -> ConversionResult {
        self.convert(request.amount, &request.source, &request.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::convert::UndefinedConversion;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    fn snapshot(day: u32, usd: f64) -> RateSnapshot {
        RateSnapshot {
            table: RateTable::new([(code("EUR"), 1.0), (code("USD"), usd)]).unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            base: Some(code("EUR")),
        }
    }

    struct MockProvider {
        call_count: AtomicUsize,
        fail: bool,
    }

    impl MockProvider {
        fn new(fail: bool) -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl RateProvider for MockProvider {
        async fn fetch_rates(&self) -> Result<RateSnapshot> {
            let n = self.call_count.fetch_add(1, Ordering::SeqCst) as u32;
            if self.fail {
                Err(anyhow!("connection refused"))
            } else {
                Ok(snapshot(1 + n, 1.1))
            }
        }
    }

    #[test]
    fn test_new_session_is_not_loaded() {
        let session = RateSession::new();
        assert_eq!(session.state(), RatesState::NotLoaded);
        assert!(session.snapshot().is_none());
        assert_eq!(
            session.convert(1.0, &code("EUR"), &code("USD")),
            Err(UndefinedConversion::RatesNotLoaded)
        );
    }

    #[test]
    fn test_publish_replaces_snapshot_wholesale() {
        let session = RateSession::new();
        assert!(session.publish(session.begin_fetch(), snapshot(1, 1.1)));
        let first = session.snapshot().unwrap();

        assert!(session.publish(session.begin_fetch(), snapshot(2, 1.2)));
        let second = session.snapshot().unwrap();

        // Readers holding the old snapshot keep a complete, unchanged table.
        assert_eq!(first.table.get(&code("USD")), Some(1.1));
        assert_eq!(second.table.get(&code("USD")), Some(1.2));
        let converted = session.convert(10.0, &code("EUR"), &code("USD")).unwrap();
        assert!((converted - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_superseded_fetch_is_discarded() {
        let session = RateSession::new();
        let older = session.begin_fetch();
        let newer = session.begin_fetch();

        assert!(session.publish(newer, snapshot(2, 1.2)));
        assert!(!session.publish(older, snapshot(1, 1.1)));

        assert_eq!(
            session.state(),
            RatesState::Loaded {
                date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
                currencies: 2,
            }
        );
        assert_eq!(session.snapshot().unwrap().table.get(&code("USD")), Some(1.2));
    }

    #[test]
    fn test_empty_snapshot_is_not_loaded() {
        let session = RateSession::new();
        let empty = RateSnapshot {
            table: RateTable::empty(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            base: None,
        };
        session.publish(session.begin_fetch(), empty);
        assert_eq!(session.state(), RatesState::NotLoaded);
        assert!(session.snapshot().is_some());
    }

    #[tokio::test]
    async fn test_refresh_publishes_rates() {
        let session = RateSession::new();
        let provider = MockProvider::new(false);

        let state = session.refresh(&provider).await.unwrap();
        assert_eq!(
            state,
            RatesState::Loaded {
                date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                currencies: 2,
            }
        );
        assert_eq!(provider.call_count.load(Ordering::SeqCst), 1);

        let result = session.convert(5.0, &code("USD"), &code("EUR")).unwrap();
        assert!((result - 5.0 / 1.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let session = RateSession::new();
        session
            .refresh(&MockProvider::new(false))
            .await
            .expect("first refresh should succeed");

        let result = session.refresh(&MockProvider::new(true)).await;
        assert_eq!(result.unwrap_err().to_string(), "connection refused");
        assert!(matches!(session.state(), RatesState::Loaded { .. }));
        assert!(session.convert(1.0, &code("EUR"), &code("USD")).is_ok());
    }

    #[tokio::test]
    async fn test_failed_first_refresh_leaves_session_not_loaded() {
        let session = RateSession::new();
        assert!(session.refresh(&MockProvider::new(true)).await.is_err());
        assert_eq!(session.state(), RatesState::NotLoaded);
        assert_eq!(
            session.evaluate(&ConversionRequest::new(1.0, code("EUR"), code("USD"))),
            Err(UndefinedConversion::RatesNotLoaded)
        );
    }
}
