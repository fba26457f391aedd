//! Wire types for the storefront REST backend.
//!
//! Every field of the bulk payload may be absent; absence deserializes to an
//! empty collection or `None`, never an error. These shapes are converted
//! into the domain types in [`crate::types`] by the provider's normalization
//! step, so nothing outside `api` and `provider` should touch them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopkit_core::{CategoryId, OfferId, ProductId, SellerId};

// =============================================================================
// Bulk Payload (`GET /initial-data`)
// =============================================================================

/// The aggregated initial-data payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InitialData {
    pub products: Vec<ProductData>,
    pub categories: Vec<CategoryData>,
    pub sellers: Vec<SellerData>,
    pub combo_offers: Vec<ComboOfferData>,
    pub ads: Vec<AdData>,
    pub banner: Option<BannerData>,
    pub sponsored_products: Vec<ProductData>,
    pub trending_products: Vec<ProductData>,
    pub recently_viewed: Vec<ProductData>,
    pub search_suggestions: Option<serde_json::Value>,
    pub trending_searches: Option<serde_json::Value>,
    pub layout: Option<serde_json::Value>,
}

/// A product as the backend sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductData {
    #[serde(rename = "_id")]
    pub id: Option<ProductId>,
    pub name: String,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub price: Decimal,
    pub discount: Decimal,
    /// Units in stock.
    pub quantity: i64,
    pub category: Option<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
}

/// A category tile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryData {
    #[serde(rename = "_id")]
    pub id: Option<CategoryId>,
    pub name: String,
    pub image: Option<String>,
}

/// A marketplace seller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SellerData {
    #[serde(rename = "_id")]
    pub id: Option<SellerId>,
    pub shop_name: String,
    pub logo: Option<String>,
}

/// An ad slot, discriminated by `type`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdData {
    /// `"Single Ad"`, `"Double Ad"`, or `"Triple Ad"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub images: Vec<AdImageData>,
}

/// One creative inside an ad slot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdImageData {
    pub url: Option<String>,
    pub link: Option<String>,
}

/// The hero banner.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BannerData {
    pub url: Option<String>,
    pub link: Option<String>,
}

/// A combo offer as the backend sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComboOfferData {
    #[serde(rename = "_id")]
    pub id: Option<OfferId>,
    pub name: String,
    pub image: Option<String>,
    pub price: Decimal,
    pub products: Vec<ProductData>,
}

// =============================================================================
// Line-Item Collections
// =============================================================================

/// A cart or saved-for-later line as the backend sends it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineData {
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub product: LineProductData,
}

/// A wishlist entry as the backend sends it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntryData {
    pub product_id: ProductId,
    pub product: LineProductData,
}

/// Product details embedded in a line item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineProductData {
    pub name: String,
    pub price: Decimal,
    pub images: Vec<String>,
    /// Units in stock.
    pub quantity: i64,
    pub discount: Decimal,
}

// =============================================================================
// Mutation Requests
// =============================================================================

/// Body for `POST /cart` and `POST /saved-for-later`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineAddRequest {
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Body for `PUT /cart/{product_id}`: the new quantity plus the size/color
/// pair that disambiguates the composite key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineUpdateRequest {
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Body for `DELETE /cart/{product_id}`: size/color disambiguation only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRemoveRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Body for `POST /wishlist`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistAddRequest {
    pub product_id: ProductId,
}

/// Generic mutation acknowledgement.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Ack {
    pub message: Option<String>,
}
