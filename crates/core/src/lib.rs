#![warn(clippy::all, missing_docs)]

//! Core state for the storefront demo.
//!
//! This crate hosts the product catalog and its search view, the inventory
//! ledger with the virtual coin balance, the display preference, the reward
//! draw, and the key-value persistence they write through. Frontends drive
//! it through [`Storefront`].

pub mod catalog;
pub mod config;
pub mod ledger;
pub mod models;
pub mod preferences;
pub mod reward;
pub mod storage;
pub mod storefront;

pub use catalog::{CatalogSource, CatalogStore, FetchError, HttpCatalogSource};
pub use config::AppConfig;
pub use ledger::{
    BuyError, InventoryLedger, LedgerSnapshot, Receipt, RebuyPolicy, SellError, STARTING_BALANCE,
};
pub use models::{Product, ProductId, Rating};
pub use preferences::{PreferenceStore, ThemeMode};
pub use reward::{DrawSource, Prize, RewardDraw, RngSource};
pub use storage::{FileStore, KeyValueStore, MemoryStore, PersistenceError, SharedStore};
pub use storefront::{RewardOutcome, Storefront, StorefrontError};
