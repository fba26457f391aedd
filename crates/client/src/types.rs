//! Domain types for the storefront client.
//!
//! These are the normalized shapes held in the cache and the collections,
//! separate from the raw wire types in [`crate::api::types`]. Normalization
//! fills defaults (placeholder images, absent fields) so consumers never see
//! partial data.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopkit_core::{CategoryId, LineKey, OfferId, ProductId, SellerId, apply_discount_percent};

// =============================================================================
// Catalog Types
// =============================================================================

/// A product as shown in listings and grids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Primary image URL (placeholder-substituted, never empty).
    pub image: String,
    /// Additional image URLs.
    pub images: Vec<String>,
    /// Current price.
    pub price: Decimal,
    /// Discount percentage (0 when not on sale).
    pub discount: Decimal,
    /// Units in stock.
    pub stock: i64,
    /// Category name, if the backend assigned one.
    pub category: Option<String>,
    /// Available sizes.
    pub sizes: Vec<String>,
    /// Available colors.
    pub colors: Vec<String>,
}

impl Product {
    /// Price after the product's discount.
    #[must_use]
    pub fn sale_price(&self) -> Decimal {
        apply_discount_percent(self.price, self.discount)
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category ID.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Category tile image URL.
    pub image: String,
}

/// A marketplace seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seller {
    /// Seller ID.
    pub id: SellerId,
    /// Shop display name.
    pub shop_name: String,
    /// Shop logo URL.
    pub logo: String,
}

/// The hero banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    /// Banner image URL (default-substituted).
    pub url: String,
    /// Click-through target.
    pub link: Option<String>,
}

/// One creative inside an ad slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdImage {
    /// Creative image URL.
    pub url: String,
    /// Click-through target.
    pub link: Option<String>,
}

/// A bundle of products sold together at a combined price.
///
/// Only offers with a valid ID and at least two constituent products
/// survive normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboOffer {
    /// Offer ID.
    pub id: OfferId,
    /// Bundle display name.
    pub name: String,
    /// Bundle image URL (placeholder-substituted).
    pub image: String,
    /// Combined price for the bundle.
    pub price: Decimal,
    /// Products in the bundle (two or more).
    pub products: Vec<Product>,
}

// =============================================================================
// Line Item Types
// =============================================================================

/// Product details embedded in a cart or wishlist line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineProduct {
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Decimal,
    /// Image URLs.
    pub images: Vec<String>,
    /// Units in stock, as last reported by the server. Client-side quantity
    /// validation uses this figure; the server remains authoritative.
    pub stock: i64,
    /// Discount percentage.
    pub discount: Decimal,
}

/// A line in the cart or saved-for-later collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Composite key: (product, size, color).
    pub key: LineKey,
    /// Quantity selected.
    pub quantity: i64,
    /// Embedded product details.
    pub product: LineProduct,
}

impl CartLine {
    /// Line total after discount.
    #[must_use]
    pub fn total(&self) -> Decimal {
        let unit = apply_discount_percent(self.product.price, self.product.discount);
        (unit * Decimal::from(self.quantity)).round_dp(2)
    }
}

/// An entry in the wishlist, keyed by product alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistEntry {
    /// Product ID.
    pub product_id: ProductId,
    /// Embedded product details.
    pub product: LineProduct,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_cart_line_total_applies_discount() {
        let line = CartLine {
            key: LineKey::new("p1", Some("M".to_string()), None),
            quantity: 3,
            product: LineProduct {
                name: "Tee".to_string(),
                price: Decimal::from_str("20.00").unwrap(),
                images: vec![],
                stock: 10,
                discount: Decimal::from_str("10").unwrap(),
            },
        };
        // 20.00 * 0.9 * 3
        assert_eq!(line.total(), Decimal::from_str("54.00").unwrap());
    }
}
