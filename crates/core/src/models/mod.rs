//! Shared domain models.

use serde::{Deserialize, Serialize};

/// Identifier assigned to a product by the catalog endpoint.
pub type ProductId = u64;

/// Catalog entry as returned by the products endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier within a catalog snapshot.
    pub id: ProductId,
    /// Display name, also the field searched by the catalog filter.
    pub title: String,
    /// Price in coins. The endpoint reports decimals (e.g. `109.95`).
    pub price: f64,
    /// Long-form description.
    #[serde(default)]
    pub description: String,
    /// Catalog category label.
    #[serde(default)]
    pub category: String,
    /// Image URL.
    #[serde(default)]
    pub image: String,
    /// Customer rating, when the endpoint supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
}

/// Aggregated customer rating attached to a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// Average score.
    pub rate: f64,
    /// Number of ratings behind the average.
    pub count: u64,
}

impl Product {
    /// Whole-coin cost charged by the ledger: the price rounded up.
    ///
    /// Returns `None` when the price is negative or not finite.
    pub fn cost(&self) -> Option<u64> {
        if !self.price.is_finite() || self.price < 0.0 {
            return None;
        }
        Some(self.price.ceil() as u64)
    }

    /// Case-insensitive substring match against the title.
    ///
    /// `needle` must already be lowercased.
    pub fn title_contains(&self, needle: &str) -> bool {
        needle.is_empty() || self.title.to_lowercase().contains(needle)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_rounds_decimal_prices_up() {
        assert_eq!(fixtures::product(1, "Bag", 109.95).cost(), Some(110));
        assert_eq!(fixtures::product(2, "Shirt", 22.0).cost(), Some(22));
        assert_eq!(fixtures::product(3, "Free", 0.0).cost(), Some(0));
        assert_eq!(fixtures::product(4, "Broken", -1.0).cost(), None);
        assert_eq!(fixtures::product(5, "Broken", f64::NAN).cost(), None);
    }

    #[test]
    fn decodes_endpoint_payload() {
        let raw = r#"{
            "id": 1,
            "title": "Fjallraven - Foldsack No. 1 Backpack",
            "price": 109.95,
            "description": "Your perfect pack",
            "category": "men's clothing",
            "image": "https://fakestoreapi.com/img/81fPKd-2AYL._AC_SL1500_.jpg",
            "rating": { "rate": 3.9, "count": 120 },
            "extra": true
        }"#;
        let product: Product = serde_json::from_str(raw).unwrap();
        assert_eq!(product.id, 1);
        assert_eq!(product.category, "men's clothing");
        assert_eq!(
            product.rating,
            Some(Rating {
                rate: 3.9,
                count: 120
            })
        );
    }

    #[test]
    fn title_match_ignores_case() {
        let product = fixtures::product(1, "Mens Casual Slim Fit", 15.99);
        assert!(product.title_contains("slim"));
        assert!(product.title_contains(""));
        assert!(!product.title_contains("jacket"));
    }
}
