//! Bulk-fetch orchestration for the read-mostly cache.
//!
//! [`DataProvider`] performs one coalesced fetch of the initial-data payload,
//! normalizes it into the fixed cache key set, and applies it without
//! clobbering entries that were updated while the fetch was in flight. A
//! newer refresh supersedes an older one: the older request is aborted and
//! its result, if it arrives anyway, is discarded.

mod normalize;

pub use normalize::{
    DEFAULT_BANNER_IMAGE, DEFAULT_COMBO_IMAGE, DEFAULT_PRODUCT_IMAGE, GENERIC_PLACEHOLDER_URL,
    ImageKind, resolve_image,
};

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use tokio::task::AbortHandle;
use tracing::{instrument, warn};

use crate::api::RemoteClient;
use crate::api::types::InitialData;
use crate::cache::{CacheKey, CacheStore, CacheValue};
use crate::error::ApiError;

/// Source of the bulk initial-data payload.
///
/// The trait seam lets tests drive the provider with a controllable fake.
pub trait InitialDataApi: Send + Sync + 'static {
    /// Fetch the aggregated initial-data payload.
    fn fetch_initial_data(&self) -> impl Future<Output = Result<InitialData, ApiError>> + Send;
}

impl InitialDataApi for RemoteClient {
    fn fetch_initial_data(&self) -> impl Future<Output = Result<InitialData, ApiError>> + Send {
        self.initial_data()
    }
}

struct ProviderState {
    /// Bumped on every refresh; a settled fetch only applies when its
    /// generation is still current (last-writer-wins at the request level).
    generation: u64,
    in_flight: Option<AbortHandle>,
    /// A bulk fetch has succeeded at least once.
    initialized: bool,
    /// The first fetch has settled, success or failure.
    first_settled: bool,
}

/// Owns the cache and keeps it populated from the bulk endpoint.
pub struct DataProvider<A> {
    api: Arc<A>,
    cache: Arc<RwLock<CacheStore>>,
    staleness_threshold: Duration,
    state: Mutex<ProviderState>,
}

impl<A: InitialDataApi> DataProvider<A> {
    /// Create a provider over a fresh cache.
    #[must_use]
    pub fn new(api: Arc<A>, staleness_threshold: Duration) -> Self {
        Self::with_cache(api, CacheStore::new(), staleness_threshold)
    }

    /// Create a provider over an existing cache (used by tests to inject a
    /// deterministic clock).
    #[must_use]
    pub fn with_cache(api: Arc<A>, cache: CacheStore, staleness_threshold: Duration) -> Self {
        Self {
            api,
            cache: Arc::new(RwLock::new(cache)),
            staleness_threshold,
            state: Mutex::new(ProviderState {
                generation: 0,
                in_flight: None,
                initialized: false,
                first_settled: false,
            }),
        }
    }

    /// Fetch the bulk payload and populate the cache.
    ///
    /// Once a fetch has succeeded, non-forced calls are a no-op; `force`
    /// always refetches. Calling while a fetch is in flight aborts the older
    /// request, and only the newest request's result is applied.
    ///
    /// Per key, the fetched value is applied only if the existing entry is
    /// absent, stale, or `force` is set, so a slower bulk response never
    /// clobbers an entry updated while it was in flight.
    ///
    /// # Errors
    ///
    /// Returns the fetch failure; the cache is left untouched. A fetch
    /// superseded by a newer one is not an error and resolves to `Ok`.
    #[instrument(skip(self))]
    pub async fn refresh(&self, force: bool) -> Result<(), ApiError> {
        let (my_generation, task) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if !force && state.initialized {
                return Ok(());
            }

            state.generation += 1;
            if let Some(previous) = state.in_flight.take() {
                previous.abort();
            }

            let api = Arc::clone(&self.api);
            let task = tokio::spawn(async move { api.fetch_initial_data().await });
            state.in_flight = Some(task.abort_handle());
            (state.generation, task)
        };

        let result = match task.await {
            Ok(result) => result,
            Err(join_error) if join_error.is_cancelled() => Err(ApiError::Cancelled),
            Err(join_error) => std::panic::resume_unwind(join_error.into_panic()),
        };

        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.generation != my_generation {
                // Superseded while settling; the newer refresh owns the state.
                return Ok(());
            }
            state.in_flight = None;
            state.first_settled = true;
            if result.is_ok() {
                state.initialized = true;
            }
        }

        match result {
            Ok(data) => {
                self.apply(data, force);
                Ok(())
            }
            Err(error) if error.is_cancelled() => Ok(()),
            Err(error) => {
                warn!(error = %error, "bulk fetch failed; keeping existing cache");
                Err(error)
            }
        }
    }

    fn apply(&self, data: InitialData, force: bool) {
        let entries = normalize::normalize(data);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in entries {
            if force || cache.is_stale(key, self.staleness_threshold) {
                cache.set(key, value);
            }
        }
    }

    /// Replace one cache entry directly, resetting its timestamp.
    ///
    /// This is the write path for page components that receive fresher data
    /// outside the bulk fetch.
    pub fn update(&self, key: CacheKey, value: CacheValue) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(key, value);
    }

    /// Clone the cached value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: CacheKey) -> Option<CacheValue> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Whether the entry for `key` is older than the configured threshold.
    #[must_use]
    pub fn is_stale(&self, key: CacheKey) -> bool {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_stale(key, self.staleness_threshold)
    }

    /// Shared handle to the underlying cache.
    #[must_use]
    pub fn cache(&self) -> Arc<RwLock<CacheStore>> {
        Arc::clone(&self.cache)
    }

    /// True only until the first fetch settles, success or failure. Later
    /// background refresh failures never re-enter the loading state.
    #[must_use]
    pub fn is_initial_loading(&self) -> bool {
        !self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .first_settled
    }

    /// Whether a bulk fetch is currently in flight.
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_flight
            .is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cache::test_support::ManualClock;
    use crate::cache::{Clock, DEFAULT_STALENESS_THRESHOLD};
    use crate::types::Product;
    use shopkit_core::ProductId;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    /// Fake bulk endpoint: each fetch consumes the next queued receiver and
    /// resolves when the test sends on the matching channel. With no queued
    /// receiver, resolves immediately with an empty payload.
    struct FakeApi {
        pending: Mutex<VecDeque<oneshot::Receiver<Result<InitialData, ApiError>>>>,
        calls: AtomicUsize,
    }

    impl FakeApi {
        fn new() -> Self {
            Self {
                pending: Mutex::new(VecDeque::new()),
                calls: AtomicUsize::new(0),
            }
        }

        fn queue(&self) -> oneshot::Sender<Result<InitialData, ApiError>> {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().unwrap().push_back(rx);
            tx
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl InitialDataApi for FakeApi {
        fn fetch_initial_data(
            &self,
        ) -> impl Future<Output = Result<InitialData, ApiError>> + Send {
            let rx = self.pending.lock().unwrap().pop_front();
            self.calls.fetch_add(1, Ordering::SeqCst);
            async move {
                match rx {
                    Some(rx) => rx.await.unwrap_or(Err(ApiError::Cancelled)),
                    None => Ok(InitialData::default()),
                }
            }
        }
    }

    fn payload_with_product(id: &str) -> InitialData {
        serde_json::from_value(serde_json::json!({
            "products": [{"_id": id, "name": "item"}]
        }))
        .unwrap()
    }

    fn cached_product_ids(provider: &DataProvider<FakeApi>) -> Vec<ProductId> {
        match provider.get(CacheKey::Products) {
            Some(CacheValue::Products(products)) => products.into_iter().map(|p| p.id).collect(),
            other => panic!("expected products, got {other:?}"),
        }
    }

    async fn wait_for_calls(api: &FakeApi, count: usize) {
        while api.calls() < count {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_refresh_populates_cache() {
        let api = Arc::new(FakeApi::new());
        let tx = api.queue();
        let provider = DataProvider::new(Arc::clone(&api), DEFAULT_STALENESS_THRESHOLD);

        assert!(provider.is_initial_loading());
        tx.send(Ok(payload_with_product("p1"))).unwrap();
        provider.refresh(false).await.unwrap();

        assert!(!provider.is_initial_loading());
        assert!(!provider.is_fetching());
        assert_eq!(cached_product_ids(&provider), vec![ProductId::new("p1")]);
    }

    #[tokio::test]
    async fn test_newer_refresh_supersedes_older() {
        let api = Arc::new(FakeApi::new());
        let tx1 = api.queue();
        let tx2 = api.queue();
        let provider = Arc::new(DataProvider::new(
            Arc::clone(&api),
            DEFAULT_STALENESS_THRESHOLD,
        ));

        let first = tokio::spawn({
            let provider = Arc::clone(&provider);
            async move { provider.refresh(false).await }
        });
        wait_for_calls(&api, 1).await;

        let second = tokio::spawn({
            let provider = Arc::clone(&provider);
            async move { provider.refresh(false).await }
        });
        wait_for_calls(&api, 2).await;

        tx2.send(Ok(payload_with_product("newer"))).unwrap();
        second.await.unwrap().unwrap();

        // The first request was aborted; its sender finds no receiver, and
        // its refresh resolves Ok without touching the cache.
        let _ = tx1.send(Ok(payload_with_product("older")));
        first.await.unwrap().unwrap();

        assert_eq!(cached_product_ids(&provider), vec![ProductId::new("newer")]);
    }

    #[tokio::test]
    async fn test_fresh_direct_update_is_not_clobbered() {
        let api = Arc::new(FakeApi::new());
        let tx = api.queue();
        let clock = Arc::new(ManualClock::new());
        let provider = Arc::new(DataProvider::with_cache(
            Arc::clone(&api),
            CacheStore::with_clock(Arc::clone(&clock) as Arc<dyn Clock>),
            DEFAULT_STALENESS_THRESHOLD,
        ));

        let refresh = tokio::spawn({
            let provider = Arc::clone(&provider);
            async move { provider.refresh(false).await }
        });
        wait_for_calls(&api, 1).await;

        // A direct update lands while the bulk fetch is in flight.
        let fresh = Product {
            id: ProductId::new("fresh"),
            name: "fresh".to_string(),
            image: "https://cdn.example.com/fresh.png".to_string(),
            images: vec![],
            price: rust_decimal::Decimal::ZERO,
            discount: rust_decimal::Decimal::ZERO,
            stock: 1,
            category: None,
            sizes: vec![],
            colors: vec![],
        };
        provider.update(CacheKey::Products, CacheValue::Products(vec![fresh]));

        tx.send(Ok(payload_with_product("slow-bulk"))).unwrap();
        refresh.await.unwrap().unwrap();

        // The bulk value for products is discarded; other keys were applied.
        assert_eq!(cached_product_ids(&provider), vec![ProductId::new("fresh")]);
        assert!(provider.get(CacheKey::Banner).is_some());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cache_and_settles_loading() {
        let api = Arc::new(FakeApi::new());
        let tx = api.queue();
        let provider = DataProvider::new(Arc::clone(&api), DEFAULT_STALENESS_THRESHOLD);

        tx.send(Err(ApiError::Remote {
            status: 500,
            message: "boom".to_string(),
        }))
        .unwrap();

        let err = provider.refresh(false).await.unwrap_err();
        assert!(matches!(err, ApiError::Remote { status: 500, .. }));
        assert!(provider.get(CacheKey::Products).is_none());
        // Failure still settles the initial-loading state.
        assert!(!provider.is_initial_loading());

        // A failed first fetch does not count as initialized; the next
        // non-forced refresh fetches again.
        provider.refresh(false).await.unwrap();
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn test_initialized_provider_short_circuits_unforced_refresh() {
        let api = Arc::new(FakeApi::new());
        let provider = DataProvider::new(Arc::clone(&api), DEFAULT_STALENESS_THRESHOLD);

        provider.refresh(false).await.unwrap();
        assert_eq!(api.calls(), 1);

        provider.refresh(false).await.unwrap();
        assert_eq!(api.calls(), 1);

        provider.refresh(true).await.unwrap();
        assert_eq!(api.calls(), 2);
    }
}
