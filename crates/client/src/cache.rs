//! Keyed, timestamped cache for read-mostly storefront data.
//!
//! The store holds one entry per [`CacheKey`]; entries are replaced whole,
//! never merged, and the timestamp is reset exactly when the value is.
//! Staleness is answered against an injectable [`Clock`] so it can be tested
//! without real time delays.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::types::{AdImage, Banner, Category, ComboOffer, Product, Seller};

/// Default staleness threshold: entries older than this need a refresh.
pub const DEFAULT_STALENESS_THRESHOLD: Duration = Duration::from_secs(600);

/// Cache keys, fixed at compile time.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Categories,
    Sellers,
    Banner,
    ComboOffers,
    SponsoredProducts,
    TrendingProducts,
    SingleAds,
    DoubleAds,
    TripleAds,
    RecentlyViewed,
    Layout,
    SearchSuggestions,
    TrendingSearches,
}

impl CacheKey {
    /// Stable name for logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Categories => "categories",
            Self::Sellers => "sellers",
            Self::Banner => "banner",
            Self::ComboOffers => "combo_offers",
            Self::SponsoredProducts => "sponsored_products",
            Self::TrendingProducts => "trending_products",
            Self::SingleAds => "single_ads",
            Self::DoubleAds => "double_ads",
            Self::TripleAds => "triple_ads",
            Self::RecentlyViewed => "recently_viewed",
            Self::Layout => "layout",
            Self::SearchSuggestions => "search_suggestions",
            Self::TrendingSearches => "trending_searches",
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Products(Vec<Product>),
    Categories(Vec<Category>),
    Sellers(Vec<Seller>),
    Banner(Banner),
    ComboOffers(Vec<ComboOffer>),
    Ads(Vec<AdImage>),
    /// Aggregate blobs the UI consumes verbatim (layout, search data).
    Json(serde_json::Value),
}

/// A cached value plus the instant it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached value.
    pub value: CacheValue,
    /// When the value was last replaced.
    pub stored_at: Instant,
}

/// Time source for staleness decisions.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall clock backed by `Instant::now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Keyed, timestamped in-memory cache.
///
/// Absence of a key is equivalent to an empty value, never an error; an
/// absent key is always stale.
pub struct CacheStore {
    entries: HashMap<CacheKey, CacheEntry>,
    clock: Arc<dyn Clock>,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore {
    /// Create an empty store using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store with an explicit clock (used by tests).
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            clock,
        }
    }

    /// Look up a cached value. No side effects.
    #[must_use]
    pub fn get(&self, key: CacheKey) -> Option<&CacheValue> {
        self.entries.get(&key).map(|entry| &entry.value)
    }

    /// Look up a full entry, timestamp included.
    #[must_use]
    pub fn entry(&self, key: CacheKey) -> Option<&CacheEntry> {
        self.entries.get(&key)
    }

    /// Replace the entry for `key`, resetting its timestamp to now.
    ///
    /// Overwrite semantics: no merging with the previous value.
    pub fn set(&mut self, key: CacheKey, value: CacheValue) {
        debug!(key = key.as_str(), "cache set");
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: self.clock.now(),
            },
        );
    }

    /// Whether the entry for `key` is older than `threshold`.
    ///
    /// An absent key is always stale.
    #[must_use]
    pub fn is_stale(&self, key: CacheKey, threshold: Duration) -> bool {
        self.entries.get(&key).is_none_or(|entry| {
            self.clock.now().saturating_duration_since(entry.stored_at) > threshold
        })
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::test_support::ManualClock;
    use super::*;
    use crate::types::Banner;

    fn banner() -> CacheValue {
        CacheValue::Banner(Banner {
            url: "https://cdn.example.com/banner.png".to_string(),
            link: None,
        })
    }

    #[test]
    fn test_absent_key_is_stale_and_empty() {
        let store = CacheStore::new();
        assert!(store.get(CacheKey::Products).is_none());
        assert!(store.is_stale(CacheKey::Products, DEFAULT_STALENESS_THRESHOLD));
    }

    #[test]
    fn test_staleness_monotonicity() {
        let clock = Arc::new(ManualClock::new());
        let mut store = CacheStore::with_clock(Arc::clone(&clock) as Arc<dyn Clock>);
        let threshold = Duration::from_secs(600);

        store.set(CacheKey::Banner, banner());
        assert!(!store.is_stale(CacheKey::Banner, threshold));

        // At exactly the threshold the entry is still usable.
        clock.advance(Duration::from_secs(600));
        assert!(!store.is_stale(CacheKey::Banner, threshold));

        clock.advance(Duration::from_secs(1));
        assert!(store.is_stale(CacheKey::Banner, threshold));
    }

    #[test]
    fn test_set_resets_timestamp() {
        let clock = Arc::new(ManualClock::new());
        let mut store = CacheStore::with_clock(Arc::clone(&clock) as Arc<dyn Clock>);
        let threshold = Duration::from_secs(600);

        store.set(CacheKey::Banner, banner());
        clock.advance(Duration::from_secs(601));
        assert!(store.is_stale(CacheKey::Banner, threshold));

        store.set(CacheKey::Banner, banner());
        assert!(!store.is_stale(CacheKey::Banner, threshold));
    }

    #[test]
    fn test_set_overwrites_whole_value() {
        let mut store = CacheStore::new();
        store.set(CacheKey::Products, CacheValue::Products(vec![]));
        store.set(CacheKey::Products, banner());
        assert_eq!(store.get(CacheKey::Products), Some(&banner()));
    }
}
