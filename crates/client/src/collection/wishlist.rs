//! Wishlist controller.
//!
//! The wishlist keys on product alone. Its one compound operation, moving an
//! entry into the cart, pairs a cart create with a wishlist delete and rolls
//! the wishlist back if either half fails.

use std::future::Future;

use tracing::instrument;

use shopkit_core::{LineKey, ProductId};

use crate::api::RemoteClient;
use crate::api::types::{Ack, LineAddRequest, WishlistAddRequest, WishlistEntryData};
use crate::collection::cart::LineItemApi;
use crate::collection::{LineItem, OptimisticCollection};
use crate::error::ApiError;
use crate::types::{LineProduct, WishlistEntry};

impl LineItem for WishlistEntry {
    type Key = ProductId;

    fn key(&self) -> ProductId {
        self.product_id.clone()
    }
}

impl From<WishlistEntryData> for WishlistEntry {
    fn from(data: WishlistEntryData) -> Self {
        Self {
            product_id: data.product_id,
            product: LineProduct {
                name: data.product.name,
                price: data.product.price,
                images: data.product.images,
                stock: data.product.quantity,
                discount: data.product.discount,
            },
        }
    }
}

/// Remote endpoints backing the wishlist.
pub trait WishlistApi: Send + Sync {
    /// Fetch the full wishlist.
    fn fetch(&self) -> impl Future<Output = Result<Vec<WishlistEntryData>, ApiError>> + Send;

    /// Add a product.
    fn add(&self, product_id: ProductId) -> impl Future<Output = Result<Ack, ApiError>> + Send;

    /// Remove a product.
    fn remove(&self, product_id: ProductId) -> impl Future<Output = Result<Ack, ApiError>> + Send;
}

impl WishlistApi for RemoteClient {
    fn fetch(&self) -> impl Future<Output = Result<Vec<WishlistEntryData>, ApiError>> + Send {
        self.fetch_wishlist()
    }

    async fn add(&self, product_id: ProductId) -> Result<Ack, ApiError> {
        self.add_wishlist_entry(&WishlistAddRequest { product_id })
            .await
    }

    async fn remove(&self, product_id: ProductId) -> Result<Ack, ApiError> {
        self.remove_wishlist_entry(&product_id).await
    }
}

/// Controller for the wishlist page.
pub struct WishlistController<W, C> {
    api: W,
    cart_api: C,
    entries: OptimisticCollection<WishlistEntry>,
}

impl<W: WishlistApi, C: LineItemApi> WishlistController<W, C> {
    /// Create a controller with an empty wishlist; call [`Self::load`] to
    /// populate it.
    pub fn new(api: W, cart_api: C) -> Self {
        Self {
            api,
            cart_api,
            entries: OptimisticCollection::new(),
        }
    }

    /// Fetch the wishlist from the server.
    ///
    /// # Errors
    ///
    /// Returns the fetch failure; the collection is not modified on failure.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<(), ApiError> {
        let entries = self.api.fetch().await?;
        self.entries
            .replace(entries.into_iter().map(Into::into).collect());
        Ok(())
    }

    /// Current wishlist entries.
    #[must_use]
    pub fn entries(&self) -> &[WishlistEntry] {
        self.entries.items()
    }

    /// Add a product to the wishlist.
    ///
    /// # Errors
    ///
    /// `Validation` when the product is already wishlisted or has a mutation
    /// in flight; otherwise the remote failure after rollback.
    #[instrument(skip(self, entry), fields(product_id = %entry.product_id))]
    pub async fn add(&mut self, entry: WishlistEntry) -> Result<(), ApiError> {
        let product_id = entry.product_id.clone();
        if self.entries.contains(&product_id) {
            return Err(ApiError::Validation(
                "product is already in the wishlist".to_string(),
            ));
        }

        let snapshot = self.entries.begin(&product_id)?;
        self.entries.push_item(entry);

        let result = self.api.add(product_id.clone()).await;
        self.settle(&product_id, snapshot, result).await
    }

    /// Remove a product from the wishlist.
    ///
    /// # Errors
    ///
    /// `Validation` when the product is not wishlisted or has a mutation in
    /// flight; otherwise the remote failure after rollback.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&mut self, product_id: &ProductId) -> Result<(), ApiError> {
        if !self.entries.contains(product_id) {
            return Err(ApiError::Validation(
                "product is not in the wishlist".to_string(),
            ));
        }

        let snapshot = self.entries.begin(product_id)?;
        self.entries.remove_item(product_id);

        let result = self.api.remove(product_id.clone()).await;
        self.settle(product_id, snapshot, result).await
    }

    /// Move a wishlist entry into the cart with quantity 1, choosing a size
    /// and color when the product has variants.
    ///
    /// The cart create and wishlist delete run concurrently; if either half
    /// fails the wishlist rolls back and the error surfaces. The cart page
    /// refetches on mount, so the cart collection itself is not tracked here.
    ///
    /// # Errors
    ///
    /// `Validation` when the product is not wishlisted, out of stock, or has
    /// a mutation in flight; otherwise the first remote failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn move_to_cart(
        &mut self,
        product_id: &ProductId,
        size: Option<String>,
        color: Option<String>,
    ) -> Result<(), ApiError> {
        let Some(entry) = self.entries.get(product_id) else {
            return Err(ApiError::Validation(
                "product is not in the wishlist".to_string(),
            ));
        };
        if entry.product.stock < 1 {
            return Err(ApiError::Validation(
                "this product is out of stock".to_string(),
            ));
        }

        let key = LineKey::new(product_id.clone(), size, color);
        let snapshot = self.entries.begin(product_id)?;
        self.entries.remove_item(product_id);

        let add_request = LineAddRequest {
            product_id: key.product_id,
            quantity: 1,
            size: key.size,
            color: key.color,
        };
        let (add_result, remove_result) = tokio::join!(
            self.cart_api.add(add_request),
            self.api.remove(product_id.clone()),
        );

        let result = add_result.and(remove_result);
        self.settle(product_id, snapshot, result).await
    }

    /// Reconcile a wishlist mutation: refetch on success, restore the
    /// snapshot on failure. The pending flag clears on every path.
    async fn settle(
        &mut self,
        product_id: &ProductId,
        snapshot: Vec<WishlistEntry>,
        result: Result<Ack, ApiError>,
    ) -> Result<(), ApiError> {
        match result {
            Ok(_) => {
                let refetch = self.api.fetch().await;
                self.entries.finish(product_id);
                match refetch {
                    Ok(entries) => {
                        self.entries
                            .replace(entries.into_iter().map(Into::into).collect());
                        Ok(())
                    }
                    // The mutation was accepted; keep the optimistic state
                    // and surface the refetch failure.
                    Err(error) => Err(error),
                }
            }
            Err(error) => {
                self.entries.restore(snapshot);
                self.entries.finish(product_id);
                Err(error)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::types::{CartLineData, LineProductData, LineRemoveRequest, LineUpdateRequest};
    use rust_decimal::Decimal;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn entry_data(product_id: &str, stock: i64) -> WishlistEntryData {
        WishlistEntryData {
            product_id: ProductId::new(product_id),
            product: LineProductData {
                name: product_id.to_string(),
                price: Decimal::from(15),
                images: vec![],
                quantity: stock,
                discount: Decimal::ZERO,
            },
        }
    }

    #[derive(Default)]
    struct FakeWishlistApi {
        entries: Mutex<Vec<WishlistEntryData>>,
        fail_mutations: AtomicBool,
    }

    impl FakeWishlistApi {
        fn with_entries(entries: Vec<WishlistEntryData>) -> Self {
            Self {
                entries: Mutex::new(entries),
                ..Self::default()
            }
        }
    }

    impl WishlistApi for FakeWishlistApi {
        async fn fetch(&self) -> Result<Vec<WishlistEntryData>, ApiError> {
            Ok(self.entries.lock().unwrap().clone())
        }

        async fn add(&self, product_id: ProductId) -> Result<Ack, ApiError> {
            if self.fail_mutations.load(Ordering::SeqCst) {
                return Err(ApiError::Remote {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            let mut entries = self.entries.lock().unwrap();
            if !entries.iter().any(|e| e.product_id == product_id) {
                entries.push(entry_data(product_id.as_str(), 10));
            }
            Ok(Ack::default())
        }

        async fn remove(&self, product_id: ProductId) -> Result<Ack, ApiError> {
            if self.fail_mutations.load(Ordering::SeqCst) {
                return Err(ApiError::Remote {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            self.entries
                .lock()
                .unwrap()
                .retain(|e| e.product_id != product_id);
            Ok(Ack::default())
        }
    }

    /// Cart side of the move; only `add` matters here.
    #[derive(Default)]
    struct FakeCartApi {
        adds: Mutex<Vec<LineAddRequest>>,
        fail_add: AtomicBool,
        calls: AtomicUsize,
    }

    impl LineItemApi for FakeCartApi {
        async fn fetch(&self) -> Result<Vec<CartLineData>, ApiError> {
            Ok(vec![])
        }

        async fn add(&self, request: LineAddRequest) -> Result<Ack, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_add.load(Ordering::SeqCst) {
                return Err(ApiError::Remote {
                    status: 409,
                    message: "stock changed".to_string(),
                });
            }
            self.adds.lock().unwrap().push(request);
            Ok(Ack::default())
        }

        async fn update(
            &self,
            _product_id: ProductId,
            _request: LineUpdateRequest,
        ) -> Result<Ack, ApiError> {
            Ok(Ack::default())
        }

        async fn remove(
            &self,
            _product_id: ProductId,
            _request: LineRemoveRequest,
        ) -> Result<Ack, ApiError> {
            Ok(Ack::default())
        }
    }

    async fn controller(
        entries: Vec<WishlistEntryData>,
    ) -> WishlistController<FakeWishlistApi, FakeCartApi> {
        let mut controller = WishlistController::new(
            FakeWishlistApi::with_entries(entries),
            FakeCartApi::default(),
        );
        controller.load().await.unwrap();
        controller
    }

    #[tokio::test]
    async fn test_remove_entry() {
        let mut controller = controller(vec![entry_data("p1", 5), entry_data("p2", 5)]).await;

        controller.remove(&ProductId::new("p1")).await.unwrap();
        assert_eq!(controller.entries().len(), 1);
        assert_eq!(controller.entries()[0].product_id, ProductId::new("p2"));
    }

    #[tokio::test]
    async fn test_failed_remove_rolls_back() {
        let mut controller = controller(vec![entry_data("p1", 5)]).await;
        controller.api.fail_mutations.store(true, Ordering::SeqCst);

        let err = controller.remove(&ProductId::new("p1")).await.unwrap_err();
        assert!(matches!(err, ApiError::Remote { .. }));
        assert_eq!(controller.entries().len(), 1);
        assert!(!controller.entries.is_pending(&ProductId::new("p1")));
    }

    #[tokio::test]
    async fn test_duplicate_add_rejected_without_network() {
        let mut controller = controller(vec![entry_data("p1", 5)]).await;

        let entry = WishlistEntry::from(entry_data("p1", 5));
        let err = controller.add(entry).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(controller.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_move_to_cart_success() {
        let mut controller = controller(vec![entry_data("p1", 5)]).await;

        controller
            .move_to_cart(&ProductId::new("p1"), Some("M".to_string()), None)
            .await
            .unwrap();

        assert!(controller.entries().is_empty());
        let adds = controller.cart_api.adds.lock().unwrap();
        assert_eq!(adds.len(), 1);
        assert_eq!(adds[0].quantity, 1);
        assert_eq!(adds[0].size.as_deref(), Some("M"));
    }

    #[tokio::test]
    async fn test_move_to_cart_rolls_back_when_cart_add_fails() {
        let mut controller = controller(vec![entry_data("p1", 5)]).await;
        controller.cart_api.fail_add.store(true, Ordering::SeqCst);

        let err = controller
            .move_to_cart(&ProductId::new("p1"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Remote { .. }));

        // The entry stays wishlisted and the key is usable again.
        assert_eq!(controller.entries().len(), 1);
        assert!(!controller.entries.is_pending(&ProductId::new("p1")));
    }

    #[tokio::test]
    async fn test_move_to_cart_out_of_stock_rejected() {
        let mut controller = controller(vec![entry_data("p1", 0)]).await;

        let err = controller
            .move_to_cart(&ProductId::new("p1"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(controller.cart_api.calls.load(Ordering::SeqCst), 0);
        assert_eq!(controller.entries().len(), 1);
    }
}
