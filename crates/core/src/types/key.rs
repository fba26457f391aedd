//! Composite line keys for cart-like collections.

use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;

/// Uniquely identifies a line item within a cart or saved-for-later
/// collection: the same product in a different size or color is a
/// different line.
///
/// Wishlists key on `ProductId` alone and do not use this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    /// Product the line refers to.
    pub product_id: ProductId,
    /// Selected size, if the product has sizes.
    pub size: Option<String>,
    /// Selected color, if the product has colors.
    pub color: Option<String>,
}

impl LineKey {
    /// Create a new line key.
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        size: Option<String>,
        color: Option<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            size,
            color,
        }
    }
}

impl std::fmt::Display for LineKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.product_id,
            self.size.as_deref().unwrap_or("-"),
            self.color.as_deref().unwrap_or("-"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_product_different_variant_is_different_key() {
        let a = LineKey::new("p1", Some("M".to_string()), Some("red".to_string()));
        let b = LineKey::new("p1", Some("L".to_string()), Some("red".to_string()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_equal_keys_hash_equal() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(LineKey::new("p1", None, None));
        assert!(set.contains(&LineKey::new("p1", None, None)));
    }

    #[test]
    fn test_display() {
        let key = LineKey::new("p1", Some("M".to_string()), None);
        assert_eq!(key.to_string(), "p1/M/-");
    }
}
