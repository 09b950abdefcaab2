//! Request-scoped memo of reference-rate lookups
//!
//! A calculation may ask for the same tenor more than once (rate composition,
//! reset-rate reporting). The first answer for a tenor, including "unavailable",
//! is pinned for the rest of the request so every lookup sees the same value.
//! A cache is never shared between requests.

use super::{RateProvider, ReferenceRate, Tenor};
use crate::error::{EngineResult, MortgageError};
use std::collections::HashMap;

/// Outcome of the first lookup for a tenor
#[derive(Debug, Clone)]
enum Lookup {
    Found(ReferenceRate),
    Unavailable(String),
}

pub struct RateCache<'a> {
    provider: &'a dyn RateProvider,

    entries: HashMap<Tenor, Lookup>,

    pub hits: u64,
    pub misses: u64,
}

impl<'a> RateCache<'a> {
    pub fn new(provider: &'a dyn RateProvider) -> Self {
        Self {
            provider,
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Latest fixing for the tenor, fetched at most once per cache
    pub fn latest(&mut self, tenor: Tenor) -> EngineResult<ReferenceRate> {
        let lookup = match self.entries.get(&tenor) {
            Some(lookup) => {
                self.hits += 1;
                log::debug!("Rate cache hit for {}", tenor);
                lookup.clone()
            }
            None => {
                self.misses += 1;
                let lookup = match self.provider.latest_rate(tenor) {
                    Ok(Some(rate)) => Lookup::Found(rate),
                    Ok(None) => Lookup::Unavailable("provider returned no data".to_string()),
                    Err(MortgageError::RateUnavailable { reason, .. }) => Lookup::Unavailable(reason),
                    Err(e) => Lookup::Unavailable(e.to_string()),
                };
                if let Lookup::Unavailable(reason) = &lookup {
                    log::warn!("Reference rate for {} unavailable: {}", tenor, reason);
                }
                self.entries.insert(tenor, lookup.clone());
                lookup
            }
        };

        match lookup {
            Lookup::Found(rate) => Ok(rate),
            Lookup::Unavailable(reason) => Err(MortgageError::RateUnavailable {
                tenor: tenor.to_string(),
                reason,
            }),
        }
    }

    /// Number of tenors looked up so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Provider that returns a different rate on every call and counts calls
    struct DriftingProvider {
        calls: AtomicU32,
        fail: bool,
    }

    impl RateProvider for DriftingProvider {
        fn latest_rate(&self, tenor: Tenor) -> EngineResult<Option<ReferenceRate>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail && n == 0 {
                return Err(MortgageError::Data("connection reset".to_string()));
            }
            Ok(Some(ReferenceRate {
                tenor,
                annual_rate_percent: 3.0 + n as f64,
                as_of: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            }))
        }

        fn historical_rates(
            &self,
            _tenor: Tenor,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> EngineResult<Vec<ReferenceRate>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_repeated_lookups_are_consistent() {
        let provider = DriftingProvider { calls: AtomicU32::new(0), fail: false };
        let mut cache = RateCache::new(&provider);

        let first = cache.latest(Tenor::ThreeMonths).unwrap();
        let second = cache.latest(Tenor::ThreeMonths).unwrap();
        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.hits, 1);
        assert_eq!(cache.misses, 1);
        assert!((cache.hit_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_tenors_cached_independently() {
        let provider = DriftingProvider { calls: AtomicU32::new(0), fail: false };
        let mut cache = RateCache::new(&provider);

        cache.latest(Tenor::ThreeMonths).unwrap();
        cache.latest(Tenor::TwelveMonths).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failure_is_pinned_for_the_request() {
        let provider = DriftingProvider { calls: AtomicU32::new(0), fail: true };
        let mut cache = RateCache::new(&provider);

        let err = cache.latest(Tenor::OneMonth).unwrap_err();
        assert_eq!(err.kind(), "RateUnavailableError");
        // The provider would now succeed, but the request keeps its first answer
        let err = cache.latest(Tenor::OneMonth).unwrap_err();
        assert!(err.to_string().contains("connection reset"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
