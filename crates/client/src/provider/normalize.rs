//! Normalization of the bulk payload into the fixed cache key set.
//!
//! The backend's shapes are partial and heterogeneous; normalization fills
//! image defaults, splits ad slots by their `type` discriminator, and drops
//! malformed combo offers. Malformed records are excluded silently, never
//! treated as errors.

use tracing::debug;

use crate::api::types::{
    AdData, AdImageData, BannerData, CategoryData, ComboOfferData, InitialData, ProductData,
    SellerData,
};
use crate::cache::{CacheKey, CacheValue};
use crate::types::{AdImage, Banner, Category, ComboOffer, Product, Seller};

/// The generic placeholder the legacy backend stores for missing images.
pub const GENERIC_PLACEHOLDER_URL: &str = "https://via.placeholder.com/150";

/// Default image shown for products with no real image.
pub const DEFAULT_PRODUCT_IMAGE: &str = "https://cdn.shopkit.dev/defaults/product.png";

/// Default image shown for combo offers with no real image.
pub const DEFAULT_COMBO_IMAGE: &str = "https://cdn.shopkit.dev/defaults/combo-offer.png";

/// Default image shown for banners and ad creatives with no real image.
pub const DEFAULT_BANNER_IMAGE: &str = "https://cdn.shopkit.dev/defaults/banner.png";

/// Ad slot discriminator values used by the backend.
const SINGLE_AD: &str = "Single Ad";
const DOUBLE_AD: &str = "Double Ad";
const TRIPLE_AD: &str = "Triple Ad";

/// Image category, selecting which default replaces a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Product,
    ComboOffer,
    Banner,
}

impl ImageKind {
    const fn default_url(self) -> &'static str {
        match self {
            Self::Product => DEFAULT_PRODUCT_IMAGE,
            Self::ComboOffer => DEFAULT_COMBO_IMAGE,
            Self::Banner => DEFAULT_BANNER_IMAGE,
        }
    }
}

/// Substitute absent, empty, or known-placeholder image URLs with the fixed
/// default for the image's category.
#[must_use]
pub fn resolve_image(url: Option<&str>, kind: ImageKind) -> String {
    match url {
        Some(url) if !url.is_empty() && url != GENERIC_PLACEHOLDER_URL => url.to_string(),
        _ => kind.default_url().to_string(),
    }
}

/// Normalize the bulk payload into cache entries.
///
/// Every key in the fixed set is produced on every call; a field absent from
/// the payload yields an empty value for its key.
pub(crate) fn normalize(data: InitialData) -> Vec<(CacheKey, CacheValue)> {
    let (single_ads, double_ads, triple_ads) = split_ads(data.ads);

    vec![
        (
            CacheKey::Products,
            CacheValue::Products(normalize_products(data.products)),
        ),
        (
            CacheKey::Categories,
            CacheValue::Categories(
                data.categories
                    .into_iter()
                    .filter_map(normalize_category)
                    .collect(),
            ),
        ),
        (
            CacheKey::Sellers,
            CacheValue::Sellers(data.sellers.into_iter().filter_map(normalize_seller).collect()),
        ),
        (
            CacheKey::Banner,
            CacheValue::Banner(normalize_banner(data.banner)),
        ),
        (
            CacheKey::ComboOffers,
            CacheValue::ComboOffers(
                data.combo_offers
                    .into_iter()
                    .filter_map(normalize_combo_offer)
                    .collect(),
            ),
        ),
        (
            CacheKey::SponsoredProducts,
            CacheValue::Products(normalize_products(data.sponsored_products)),
        ),
        (
            CacheKey::TrendingProducts,
            CacheValue::Products(normalize_products(data.trending_products)),
        ),
        (CacheKey::SingleAds, CacheValue::Ads(single_ads)),
        (CacheKey::DoubleAds, CacheValue::Ads(double_ads)),
        (CacheKey::TripleAds, CacheValue::Ads(triple_ads)),
        (
            CacheKey::RecentlyViewed,
            CacheValue::Products(normalize_products(data.recently_viewed)),
        ),
        (
            CacheKey::Layout,
            CacheValue::Json(data.layout.unwrap_or_default()),
        ),
        (
            CacheKey::SearchSuggestions,
            CacheValue::Json(data.search_suggestions.unwrap_or_default()),
        ),
        (
            CacheKey::TrendingSearches,
            CacheValue::Json(data.trending_searches.unwrap_or_default()),
        ),
    ]
}

fn normalize_products(products: Vec<ProductData>) -> Vec<Product> {
    products.into_iter().filter_map(normalize_product).collect()
}

/// Records without a usable ID are dropped silently.
fn normalize_product(product: ProductData) -> Option<Product> {
    let id = product.id.filter(|id| !id.is_empty())?;
    Some(Product {
        id,
        name: product.name,
        image: resolve_image(product.image.as_deref(), ImageKind::Product),
        images: product
            .images
            .into_iter()
            .map(|url| resolve_image(Some(&url), ImageKind::Product))
            .collect(),
        price: product.price,
        discount: product.discount,
        stock: product.quantity,
        category: product.category,
        sizes: product.sizes,
        colors: product.colors,
    })
}

fn normalize_category(category: CategoryData) -> Option<Category> {
    let id = category.id.filter(|id| !id.is_empty())?;
    Some(Category {
        id,
        name: category.name,
        image: resolve_image(category.image.as_deref(), ImageKind::Product),
    })
}

fn normalize_seller(seller: SellerData) -> Option<Seller> {
    let id = seller.id.filter(|id| !id.is_empty())?;
    Some(Seller {
        id,
        shop_name: seller.shop_name,
        logo: resolve_image(seller.logo.as_deref(), ImageKind::Product),
    })
}

fn normalize_banner(banner: Option<BannerData>) -> Banner {
    let banner = banner.unwrap_or_default();
    Banner {
        url: resolve_image(banner.url.as_deref(), ImageKind::Banner),
        link: banner.link,
    }
}

/// Offers need a valid ID and at least two constituent products; anything
/// else is dropped. Nested product images get the same substitution as
/// top-level products.
fn normalize_combo_offer(offer: ComboOfferData) -> Option<ComboOffer> {
    let id = offer.id.filter(|id| !id.is_empty())?;
    let products = normalize_products(offer.products);
    if products.len() < 2 {
        debug!(offer_id = %id, "dropping combo offer with fewer than two products");
        return None;
    }
    Some(ComboOffer {
        id,
        name: offer.name,
        image: resolve_image(offer.image.as_deref(), ImageKind::ComboOffer),
        price: offer.price,
        products,
    })
}

/// Split ad slots into per-type creative lists. A missing type yields an
/// empty list; an unknown type is ignored.
fn split_ads(ads: Vec<AdData>) -> (Vec<AdImage>, Vec<AdImage>, Vec<AdImage>) {
    let mut single = Vec::new();
    let mut double = Vec::new();
    let mut triple = Vec::new();

    for ad in ads {
        let target = match ad.kind.as_str() {
            SINGLE_AD => &mut single,
            DOUBLE_AD => &mut double,
            TRIPLE_AD => &mut triple,
            other => {
                debug!(kind = other, "ignoring ad slot with unknown type");
                continue;
            }
        };
        target.extend(ad.images.into_iter().map(normalize_ad_image));
    }

    (single, double, triple)
}

fn normalize_ad_image(image: AdImageData) -> AdImage {
    AdImage {
        url: resolve_image(image.url.as_deref(), ImageKind::Banner),
        link: image.link,
    }
}
