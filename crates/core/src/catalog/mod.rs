//! Product catalog retrieval and search.

/// Catalog providers and fetch errors.
pub mod source;
/// In-memory catalog state with the derived search view.
pub mod store;

pub use source::{CatalogSource, FetchError, HttpCatalogSource};
pub use store::{filter_products, CatalogStore};
