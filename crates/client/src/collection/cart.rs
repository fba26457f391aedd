//! Cart and saved-for-later controller.
//!
//! Owns the two line-item collections a cart page displays and applies the
//! optimistic mutation contract to every operation. Moving a line between
//! the collections is two concurrent remote calls treated as a single unit:
//! either both succeed, or both collections roll back to their snapshots.

use std::future::Future;

use tracing::instrument;

use shopkit_core::{LineKey, ProductId};

use crate::api::RemoteClient;
use crate::api::types::{Ack, CartLineData, LineAddRequest, LineRemoveRequest, LineUpdateRequest};
use crate::collection::{LineItem, OptimisticCollection, Snapshot};
use crate::error::ApiError;
use crate::types::{CartLine, LineProduct};

impl LineItem for CartLine {
    type Key = LineKey;

    fn key(&self) -> LineKey {
        self.key.clone()
    }
}

impl From<CartLineData> for CartLine {
    fn from(data: CartLineData) -> Self {
        Self {
            key: LineKey::new(data.product_id, data.size, data.color),
            quantity: data.quantity,
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

/// Remote endpoints for one cart-shaped collection.
///
/// The cart and saved-for-later collections share this shape under different
/// paths; tests drive the controller with in-memory fakes.
pub trait LineItemApi: Send + Sync {
    /// Fetch the full collection.
    fn fetch(&self) -> impl Future<Output = Result<Vec<CartLineData>, ApiError>> + Send;

    /// Create a line.
    fn add(&self, request: LineAddRequest) -> impl Future<Output = Result<Ack, ApiError>> + Send;

    /// Update quantity/size/color on an existing line.
    fn update(
        &self,
        product_id: ProductId,
        request: LineUpdateRequest,
    ) -> impl Future<Output = Result<Ack, ApiError>> + Send;

    /// Delete a line, disambiguated by size/color.
    fn remove(
        &self,
        product_id: ProductId,
        request: LineRemoveRequest,
    ) -> impl Future<Output = Result<Ack, ApiError>> + Send;
}

/// `/cart` endpoints of a [`RemoteClient`].
#[derive(Clone)]
pub struct CartEndpoints(pub RemoteClient);

impl LineItemApi for CartEndpoints {
    fn fetch(&self) -> impl Future<Output = Result<Vec<CartLineData>, ApiError>> + Send {
        self.0.fetch_cart()
    }

    async fn add(&self, request: LineAddRequest) -> Result<Ack, ApiError> {
        self.0.add_cart_line(&request).await
    }

    async fn update(
        &self,
        product_id: ProductId,
        request: LineUpdateRequest,
    ) -> Result<Ack, ApiError> {
        self.0.update_cart_line(&product_id, &request).await
    }

    async fn remove(
        &self,
        product_id: ProductId,
        request: LineRemoveRequest,
    ) -> Result<Ack, ApiError> {
        self.0.remove_cart_line(&product_id, &request).await
    }
}

/// `/saved-for-later` endpoints of a [`RemoteClient`].
#[derive(Clone)]
pub struct SavedForLaterEndpoints(pub RemoteClient);

impl LineItemApi for SavedForLaterEndpoints {
    fn fetch(&self) -> impl Future<Output = Result<Vec<CartLineData>, ApiError>> + Send {
        self.0.fetch_saved_for_later()
    }

    async fn add(&self, request: LineAddRequest) -> Result<Ack, ApiError> {
        self.0.add_saved_line(&request).await
    }

    async fn update(
        &self,
        product_id: ProductId,
        request: LineUpdateRequest,
    ) -> Result<Ack, ApiError> {
        // The backend exposes no PUT for saved-for-later; quantity changes
        // happen after the line moves back to the cart.
        let _ = (product_id, request);
        Err(ApiError::Validation(
            "saved items cannot be updated in place".to_string(),
        ))
    }

    async fn remove(
        &self,
        product_id: ProductId,
        request: LineRemoveRequest,
    ) -> Result<Ack, ApiError> {
        self.0.remove_saved_line(&product_id, &request).await
    }
}

/// Controller for the cart page's two collections.
pub struct CartController<C, S> {
    cart_api: C,
    saved_api: S,
    cart: OptimisticCollection<CartLine>,
    saved: OptimisticCollection<CartLine>,
}

impl<C: LineItemApi, S: LineItemApi> CartController<C, S> {
    /// Create a controller with empty collections; call [`Self::load`] to
    /// populate them.
    pub fn new(cart_api: C, saved_api: S) -> Self {
        Self {
            cart_api,
            saved_api,
            cart: OptimisticCollection::new(),
            saved: OptimisticCollection::new(),
        }
    }

    /// Fetch both collections from the server.
    ///
    /// # Errors
    ///
    /// Returns the first fetch failure; neither collection is modified on
    /// failure.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<(), ApiError> {
        let (cart, saved) = tokio::join!(self.cart_api.fetch(), self.saved_api.fetch());
        let cart = cart?;
        let saved = saved?;
        self.cart.replace(cart.into_iter().map(Into::into).collect());
        self.saved.replace(saved.into_iter().map(Into::into).collect());
        Ok(())
    }

    /// Current cart lines.
    #[must_use]
    pub fn cart_lines(&self) -> &[CartLine] {
        self.cart.items()
    }

    /// Current saved-for-later lines.
    #[must_use]
    pub fn saved_lines(&self) -> &[CartLine] {
        self.saved.items()
    }

    /// Cart subtotal after per-line discounts.
    #[must_use]
    pub fn subtotal(&self) -> rust_decimal::Decimal {
        self.cart.items().iter().map(CartLine::total).sum()
    }

    /// Add a line to the cart. Adding a key that already exists merges by
    /// summing quantities, keeping the collection uniquely keyed.
    ///
    /// # Errors
    ///
    /// `Validation` when the quantity is out of bounds, the merged quantity
    /// would exceed stock, or the key has a mutation in flight; otherwise
    /// the remote failure after rollback.
    #[instrument(skip(self, product), fields(key = %key))]
    pub async fn add(
        &mut self,
        key: LineKey,
        quantity: i64,
        product: LineProduct,
    ) -> Result<(), ApiError> {
        validate_quantity(quantity, product.stock)?;

        let existing = self.cart.get(&key).map(|line| line.quantity);
        let merged = existing.map(|current| current + quantity);
        if let Some(merged) = merged {
            validate_quantity(merged, product.stock)?;
        }

        let snapshot = self.cart.begin(&key)?;
        match merged {
            Some(merged) => {
                self.cart.update_item(&key, |line| line.quantity = merged);
                let request = LineUpdateRequest {
                    quantity: merged,
                    size: key.size.clone(),
                    color: key.color.clone(),
                };
                let result = self.cart_api.update(key.product_id.clone(), request).await;
                self.settle_cart(&key, snapshot, result).await
            }
            None => {
                self.cart.push_item(CartLine {
                    key: key.clone(),
                    quantity,
                    product,
                });
                let request = LineAddRequest {
                    product_id: key.product_id.clone(),
                    quantity,
                    size: key.size.clone(),
                    color: key.color.clone(),
                };
                let result = self.cart_api.add(request).await;
                self.settle_cart(&key, snapshot, result).await
            }
        }
    }

    /// Change the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// `Validation` when the line is missing, the quantity is not in
    /// `1..=stock`, or the key has a mutation in flight; otherwise the
    /// remote failure after rollback. The stock bound is a client-side
    /// convenience check; the server may still reject, and rollback applies
    /// there too.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn update_quantity(&mut self, key: &LineKey, quantity: i64) -> Result<(), ApiError> {
        let line = self
            .cart
            .get(key)
            .ok_or_else(|| ApiError::Validation("item is not in the cart".to_string()))?;
        validate_quantity(quantity, line.product.stock)?;

        let snapshot = self.cart.begin(key)?;
        self.cart.update_item(key, |line| line.quantity = quantity);

        let request = LineUpdateRequest {
            quantity,
            size: key.size.clone(),
            color: key.color.clone(),
        };
        let result = self.cart_api.update(key.product_id.clone(), request).await;
        self.settle_cart(key, snapshot, result).await
    }

    /// Change the size of a cart line, rekeying it.
    ///
    /// # Errors
    ///
    /// `Validation` when the line is missing, a line with the target size
    /// already exists, or either key has a mutation in flight; otherwise the
    /// remote failure after rollback.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn update_size(
        &mut self,
        key: &LineKey,
        new_size: Option<String>,
    ) -> Result<(), ApiError> {
        let line = self
            .cart
            .get(key)
            .ok_or_else(|| ApiError::Validation("item is not in the cart".to_string()))?;
        let quantity = line.quantity;

        let new_key = LineKey::new(key.product_id.clone(), new_size.clone(), key.color.clone());
        if new_key == *key {
            return Ok(());
        }
        // Rekeying onto an existing line would need a merge plus a second
        // delete, which the PUT endpoint cannot express atomically.
        if self.cart.contains(&new_key) || self.cart.is_pending(&new_key) {
            return Err(ApiError::Validation(
                "that size is already in the cart".to_string(),
            ));
        }

        let snapshot = self.cart.begin(key)?;
        self.cart
            .update_item(key, |line| line.key.size = new_size.clone());

        let request = LineUpdateRequest {
            quantity,
            size: new_size,
            color: key.color.clone(),
        };
        let result = self.cart_api.update(key.product_id.clone(), request).await;
        self.settle_cart(key, snapshot, result).await
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// `Validation` when the line is missing or pending; otherwise the
    /// remote failure after rollback.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn remove(&mut self, key: &LineKey) -> Result<(), ApiError> {
        if !self.cart.contains(key) {
            return Err(ApiError::Validation("item is not in the cart".to_string()));
        }

        let snapshot = self.cart.begin(key)?;
        self.cart.remove_item(key);

        let request = LineRemoveRequest {
            size: key.size.clone(),
            color: key.color.clone(),
        };
        let result = self.cart_api.remove(key.product_id.clone(), request).await;
        self.settle_cart(key, snapshot, result).await
    }

    /// Move a cart line to saved-for-later.
    ///
    /// # Errors
    ///
    /// `Validation` when the line is missing or either collection has a
    /// pending mutation on the key; otherwise the first remote failure after
    /// both collections roll back.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn save_for_later(&mut self, key: &LineKey) -> Result<(), ApiError> {
        let Some(line) = self.cart.get(key).cloned() else {
            return Err(ApiError::Validation("item is not in the cart".to_string()));
        };
        self.move_line(key, &line, Direction::CartToSaved).await
    }

    /// Move a saved-for-later line back into the cart.
    ///
    /// # Errors
    ///
    /// `Validation` when the line is missing, out of stock, or either
    /// collection has a pending mutation on the key; otherwise the first
    /// remote failure after both collections roll back.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn move_to_cart(&mut self, key: &LineKey) -> Result<(), ApiError> {
        let Some(line) = self.saved.get(key).cloned() else {
            return Err(ApiError::Validation(
                "item is not in saved for later".to_string(),
            ));
        };
        if line.product.stock < line.quantity {
            return Err(ApiError::Validation(
                "not enough stock to move this item to the cart".to_string(),
            ));
        }
        self.move_line(key, &line, Direction::SavedToCart).await
    }

    /// A line exists in at most one of {cart, saved-for-later}; the move is
    /// a concurrent create-in-target + delete-from-source pair reconciled as
    /// one unit.
    async fn move_line(
        &mut self,
        key: &LineKey,
        line: &CartLine,
        direction: Direction,
    ) -> Result<(), ApiError> {
        let (source, target) = match direction {
            Direction::CartToSaved => (&mut self.cart, &mut self.saved),
            Direction::SavedToCart => (&mut self.saved, &mut self.cart),
        };

        let source_snapshot = source.begin(key)?;
        let target_snapshot = match target.begin(key) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                source.finish(key);
                return Err(error);
            }
        };

        source.remove_item(key);
        if target.contains(key) {
            let added = line.quantity;
            target.update_item(key, |existing| existing.quantity += added);
        } else {
            target.push_item(line.clone());
        }

        let add_request = LineAddRequest {
            product_id: key.product_id.clone(),
            quantity: line.quantity,
            size: key.size.clone(),
            color: key.color.clone(),
        };
        let remove_request = LineRemoveRequest {
            size: key.size.clone(),
            color: key.color.clone(),
        };

        let (add_result, remove_result) = match direction {
            Direction::CartToSaved => tokio::join!(
                self.saved_api.add(add_request),
                self.cart_api.remove(key.product_id.clone(), remove_request),
            ),
            Direction::SavedToCart => tokio::join!(
                self.cart_api.add(add_request),
                self.saved_api.remove(key.product_id.clone(), remove_request),
            ),
        };

        if let Err(error) = add_result.and(remove_result) {
            // Either half failing rolls back the pair; the server may have
            // applied one side, and the next authoritative fetch wins.
            self.restore_both(key, source_snapshot, target_snapshot, direction);
            return Err(error);
        }

        let refetch = tokio::join!(self.cart_api.fetch(), self.saved_api.fetch());
        self.cart.finish(key);
        self.saved.finish(key);
        let (cart, saved) = refetch;
        let cart = cart?;
        let saved = saved?;
        self.cart.replace(cart.into_iter().map(Into::into).collect());
        self.saved.replace(saved.into_iter().map(Into::into).collect());
        Ok(())
    }

    fn restore_both(
        &mut self,
        key: &LineKey,
        source_snapshot: Snapshot<CartLine>,
        target_snapshot: Snapshot<CartLine>,
        direction: Direction,
    ) {
        let (source, target) = match direction {
            Direction::CartToSaved => (&mut self.cart, &mut self.saved),
            Direction::SavedToCart => (&mut self.saved, &mut self.cart),
        };
        source.restore(source_snapshot);
        target.restore(target_snapshot);
        source.finish(key);
        target.finish(key);
    }

    /// Reconcile a single-collection cart mutation: refetch on success,
    /// restore the snapshot on failure. The pending flag clears on every
    /// path.
    async fn settle_cart(
        &mut self,
        key: &LineKey,
        snapshot: Snapshot<CartLine>,
        result: Result<Ack, ApiError>,
    ) -> Result<(), ApiError> {
        match result {
            Ok(_) => {
                let refetch = self.cart_api.fetch().await;
                self.cart.finish(key);
                match refetch {
                    Ok(lines) => {
                        self.cart.replace(lines.into_iter().map(Into::into).collect());
                        Ok(())
                    }
                    // The server accepted the mutation; keep the optimistic
                    // state and surface the refetch failure.
                    Err(error) => Err(error),
                }
            }
            Err(error) => {
                self.cart.restore(snapshot);
                self.cart.finish(key);
                Err(error)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    CartToSaved,
    SavedToCart,
}

fn validate_quantity(quantity: i64, stock: i64) -> Result<(), ApiError> {
    if quantity < 1 {
        return Err(ApiError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }
    if quantity > stock {
        return Err(ApiError::Validation(format!(
            "only {stock} left in stock"
        )));
    }
    Ok(())
}
