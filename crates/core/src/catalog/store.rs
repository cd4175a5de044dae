use std::{collections::HashSet, sync::Arc};

use parking_lot::RwLock;
use tracing::{info, warn};

use super::source::{CatalogSource, FetchError};
use crate::models::{Product, ProductId};

/// Thread-safe holder of the fetched catalog and the active search term.
///
/// Cloning yields another handle to the same state. The filtered view is
/// never stored; it is recomputed from the product list and the term on
/// every read.
#[derive(Clone)]
pub struct CatalogStore {
    source: Arc<dyn CatalogSource>,
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    products: Vec<Product>,
    search_term: String,
}

impl CatalogStore {
    /// Create an empty store backed by `source`.
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Fetch the catalog and replace the current product list.
    ///
    /// On failure the previous list is kept. The lock is not held while the
    /// request is in flight, so overlapping loads resolve last-writer-wins.
    pub async fn load_catalog(&self) -> Result<Vec<Product>, FetchError> {
        let products = match self.source.fetch_products().await {
            Ok(products) => products,
            Err(err) => {
                warn!(error = %err, "Catalog fetch failed; keeping previous products");
                return Err(err);
            }
        };
        validate(&products)?;

        let mut inner = self.inner.write();
        inner.products = products.clone();
        info!(
            total = products.len(),
            search_term = %inner.search_term,
            "Catalog loaded"
        );
        Ok(products)
    }

    /// Replace the active search term.
    pub fn set_search_term(&self, term: impl Into<String>) {
        self.inner.write().search_term = term.into();
    }

    /// Current search term.
    pub fn search_term(&self) -> String {
        self.inner.read().search_term.clone()
    }

    /// Every product from the last successful fetch, in endpoint order.
    pub fn all_products(&self) -> Vec<Product> {
        self.inner.read().products.clone()
    }

    /// Products whose title matches the current search term.
    pub fn filtered_products(&self) -> Vec<Product> {
        let inner = self.inner.read();
        filter_products(&inner.products, &inner.search_term)
    }

    /// Look up a loaded product without touching the network.
    pub fn cached(&self, id: ProductId) -> Option<Product> {
        self.inner
            .read()
            .products
            .iter()
            .find(|product| product.id == id)
            .cloned()
    }

    /// Resolve a product from the loaded catalog, falling back to the detail endpoint.
    pub async fn product(&self, id: ProductId) -> Result<Product, FetchError> {
        if let Some(product) = self.cached(id) {
            return Ok(product);
        }
        let product = self.source.fetch_product(id).await?;
        if product.id != id {
            return Err(FetchError::InvalidData(format!(
                "requested product {id} but received {}",
                product.id
            )));
        }
        validate(std::slice::from_ref(&product))?;
        Ok(product)
    }
}

/// Filter `products` by a case-insensitive substring match on the title.
///
/// An empty term matches everything.
pub fn filter_products(products: &[Product], term: &str) -> Vec<Product> {
    let needle = term.to_lowercase();
    products
        .iter()
        .filter(|product| product.title_contains(&needle))
        .cloned()
        .collect()
}

fn validate(products: &[Product]) -> Result<(), FetchError> {
    let mut seen = HashSet::with_capacity(products.len());
    for product in products {
        if !seen.insert(product.id) {
            return Err(FetchError::InvalidData(format!(
                "duplicate product id {}",
                product.id
            )));
        }
        if product.cost().is_none() {
            return Err(FetchError::InvalidData(format!(
                "product {} has invalid price {}",
                product.id, product.price
            )));
        }
    }
    Ok(())
}
