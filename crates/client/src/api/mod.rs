//! Storefront REST API client.
//!
//! [`RemoteClient`] is a thin `reqwest` wrapper: it attaches the bearer token,
//! enforces an explicit request timeout, and maps response statuses into the
//! [`ApiError`] taxonomy. It carries no retry or backoff logic of its own.

pub mod types;

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use shopkit_core::ProductId;
use tracing::instrument;

use crate::auth::TokenStore;
use crate::config::ClientConfig;
use crate::error::ApiError;

use types::{
    Ack, CartLineData, InitialData, LineAddRequest, LineRemoveRequest, LineUpdateRequest,
    WishlistAddRequest, WishlistEntryData,
};

/// Client for the storefront REST backend.
#[derive(Clone)]
pub struct RemoteClient {
    inner: Arc<RemoteClientInner>,
}

struct RemoteClientInner {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

/// Whether a request requires the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    /// Token required; missing token short-circuits without a round-trip.
    Required,
    /// Token attached when present (personalization), absent otherwise.
    Optional,
}

impl RemoteClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        if let Some(token) = &config.bearer_token {
            tokens.store(token.clone());
        }

        Ok(Self {
            inner: Arc::new(RemoteClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                tokens,
            }),
        })
    }

    /// Execute a request and decode the JSON response.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
        auth: Auth,
    ) -> Result<T, ApiError> {
        let url = format!("{}{path}", self.inner.base_url);
        let mut request = self.inner.client.request(method, &url);

        match (auth, self.inner.tokens.token()) {
            (_, Some(token)) => {
                request = request.bearer_auth(token.expose_secret());
            }
            (Auth::Required, None) => return Err(ApiError::Auth),
            (Auth::Optional, None) => {}
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            // Token is no longer valid; drop it so the UI redirects to login.
            self.inner.tokens.clear();
            return Err(ApiError::Auth);
        }

        // Read the body as text first for better error diagnostics.
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                url = %url,
                body = %response_text.chars().take(500).collect::<String>(),
                "backend returned non-success status"
            );
            return Err(ApiError::Remote {
                status: status.as_u16(),
                message: extract_error_message(&response_text),
            });
        }

        match serde_json::from_str(&response_text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    url = %url,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "failed to parse backend response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }

    // =========================================================================
    // Bulk Read
    // =========================================================================

    /// Fetch the aggregated initial-data payload.
    ///
    /// Public endpoint; the token is attached when present so the backend can
    /// include personalized fields (recently viewed).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload cannot be parsed.
    #[instrument(skip(self))]
    pub async fn initial_data(&self) -> Result<InitialData, ApiError> {
        self.execute(Method::GET, "/initial-data", None::<&()>, Auth::Optional)
            .await
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Fetch the full cart collection.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` when not signed in, or the request failure.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> Result<Vec<CartLineData>, ApiError> {
        self.execute(Method::GET, "/cart", None::<&()>, Auth::Required)
            .await
    }

    /// Add a line to the cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` when not signed in, or the request failure.
    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    pub async fn add_cart_line(&self, request: &LineAddRequest) -> Result<Ack, ApiError> {
        self.execute(Method::POST, "/cart", Some(request), Auth::Required)
            .await
    }

    /// Update quantity/size/color on an existing cart line.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` when not signed in, or the request failure.
    #[instrument(skip(self, request), fields(product_id = %product_id))]
    pub async fn update_cart_line(
        &self,
        product_id: &ProductId,
        request: &LineUpdateRequest,
    ) -> Result<Ack, ApiError> {
        self.execute(
            Method::PUT,
            &format!("/cart/{product_id}"),
            Some(request),
            Auth::Required,
        )
        .await
    }

    /// Remove a cart line; the body carries size/color to disambiguate the
    /// composite key.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` when not signed in, or the request failure.
    #[instrument(skip(self, request), fields(product_id = %product_id))]
    pub async fn remove_cart_line(
        &self,
        product_id: &ProductId,
        request: &LineRemoveRequest,
    ) -> Result<Ack, ApiError> {
        self.execute(
            Method::DELETE,
            &format!("/cart/{product_id}"),
            Some(request),
            Auth::Required,
        )
        .await
    }

    // =========================================================================
    // Saved For Later
    // =========================================================================

    /// Fetch the saved-for-later collection.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` when not signed in, or the request failure.
    #[instrument(skip(self))]
    pub async fn fetch_saved_for_later(&self) -> Result<Vec<CartLineData>, ApiError> {
        self.execute(Method::GET, "/saved-for-later", None::<&()>, Auth::Required)
            .await
    }

    /// Add a line to saved-for-later.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` when not signed in, or the request failure.
    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    pub async fn add_saved_line(&self, request: &LineAddRequest) -> Result<Ack, ApiError> {
        self.execute(Method::POST, "/saved-for-later", Some(request), Auth::Required)
            .await
    }

    /// Remove a saved-for-later line.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` when not signed in, or the request failure.
    #[instrument(skip(self, request), fields(product_id = %product_id))]
    pub async fn remove_saved_line(
        &self,
        product_id: &ProductId,
        request: &LineRemoveRequest,
    ) -> Result<Ack, ApiError> {
        self.execute(
            Method::DELETE,
            &format!("/saved-for-later/{product_id}"),
            Some(request),
            Auth::Required,
        )
        .await
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Fetch the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` when not signed in, or the request failure.
    #[instrument(skip(self))]
    pub async fn fetch_wishlist(&self) -> Result<Vec<WishlistEntryData>, ApiError> {
        self.execute(Method::GET, "/wishlist", None::<&()>, Auth::Required)
            .await
    }

    /// Add a product to the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` when not signed in, or the request failure.
    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    pub async fn add_wishlist_entry(&self, request: &WishlistAddRequest) -> Result<Ack, ApiError> {
        self.execute(Method::POST, "/wishlist", Some(request), Auth::Required)
            .await
    }

    /// Remove a product from the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` when not signed in, or the request failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_wishlist_entry(&self, product_id: &ProductId) -> Result<Ack, ApiError> {
        self.execute(
            Method::DELETE,
            &format!("/wishlist/{product_id}"),
            None::<&()>,
            Auth::Required,
        )
        .await
    }
}

/// Pull the server's `message` field out of an error body, falling back to a
/// generic message when the body is not the expected shape.
fn extract_error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "Something went wrong, please try again".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_message_from_json_body() {
        assert_eq!(
            extract_error_message(r#"{"message": "Out of stock"}"#),
            "Out of stock"
        );
    }

    #[test]
    fn test_extract_error_message_fallback() {
        let fallback = "Something went wrong, please try again";
        assert_eq!(extract_error_message("<html>502</html>"), fallback);
        assert_eq!(extract_error_message(r#"{"message": ""}"#), fallback);
        assert_eq!(extract_error_message("{}"), fallback);
    }
}
