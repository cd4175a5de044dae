//! Facade owning one instance of every store.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::{
    catalog::{CatalogSource, CatalogStore, FetchError, HttpCatalogSource},
    config::AppConfig,
    ledger::{BuyError, InventoryLedger, Receipt, SellError},
    models::{Product, ProductId},
    preferences::{PreferenceStore, ThemeMode},
    reward::{Prize, RewardDraw},
    storage::{FileStore, PersistenceError, SharedStore},
};

/// Errors surfaced by [`Storefront`] operations.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Catalog retrieval failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// Purchase rejected.
    #[error(transparent)]
    Buy(#[from] BuyError),
    /// Sale rejected.
    #[error(transparent)]
    Sell(#[from] SellError),
    /// Storage failed outside of a buy or sell.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Result of claiming a minigame reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardOutcome {
    /// Prize drawn.
    pub prize: Prize,
    /// Balance after crediting the prize.
    pub balance: u64,
}

/// Catalog, ledger, preferences and reward draw for one user session.
pub struct Storefront {
    catalog: CatalogStore,
    ledger: InventoryLedger,
    preferences: PreferenceStore,
    rewards: RewardDraw,
}

impl Storefront {
    /// Open persisted state under the configured data directory and
    /// connect to the configured catalog endpoint.
    pub fn open(config: &AppConfig) -> Result<Self, StorefrontError> {
        let store: SharedStore = Arc::new(FileStore::open(&config.data_dir)?);
        let source = Arc::new(HttpCatalogSource::from_config(config)?);
        let rewards = match config.reward_seed {
            Some(seed) => RewardDraw::seeded(seed),
            None => RewardDraw::from_entropy(),
        };

        let storefront = Self::from_parts(store, source, rewards)?;
        Ok(storefront.with_rebuy_policy(config))
    }

    /// Assemble a storefront from explicit collaborators.
    pub fn from_parts(
        store: SharedStore,
        source: Arc<dyn CatalogSource>,
        rewards: RewardDraw,
    ) -> Result<Self, StorefrontError> {
        let ledger = InventoryLedger::initialize(store.clone())?;
        let preferences = PreferenceStore::load(store)?;
        Ok(Self {
            catalog: CatalogStore::new(source),
            ledger,
            preferences,
            rewards,
        })
    }

    fn with_rebuy_policy(mut self, config: &AppConfig) -> Self {
        self.ledger = self.ledger.with_policy(config.rebuy_policy);
        self
    }

    /// Shared catalog handle, e.g. for refreshing from another task.
    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Read access to the ledger.
    pub fn ledger(&self) -> &InventoryLedger {
        &self.ledger
    }

    /// Re-fetch the catalog. The previous list survives a failure.
    pub async fn refresh_catalog(&self) -> Result<usize, StorefrontError> {
        let products = self.catalog.load_catalog().await?;
        Ok(products.len())
    }

    /// Set the search term and return the matching products.
    pub fn search(&self, term: &str) -> Vec<Product> {
        self.catalog.set_search_term(term);
        self.catalog.filtered_products()
    }

    /// Products matching the current search term.
    pub fn products(&self) -> Vec<Product> {
        self.catalog.filtered_products()
    }

    /// Resolve one product for a detail view.
    pub async fn product(&self, id: ProductId) -> Result<Product, StorefrontError> {
        Ok(self.catalog.product(id).await?)
    }

    /// Buy the product with `id`.
    pub async fn buy(&mut self, id: ProductId) -> Result<Receipt, StorefrontError> {
        let product = self.catalog.product(id).await?;
        Ok(self.ledger.buy(&product)?)
    }

    /// Sell an owned product back.
    pub fn sell(&mut self, id: ProductId) -> Result<Receipt, StorefrontError> {
        Ok(self.ledger.sell(id)?)
    }

    /// Owned products in purchase order.
    pub fn owned(&self) -> &[Product] {
        self.ledger.owned()
    }

    /// Current coin balance.
    pub fn balance(&self) -> u64 {
        self.ledger.balance()
    }

    /// Clear ownership and restore the starting balance.
    pub fn reset(&mut self) -> Result<(), StorefrontError> {
        Ok(self.ledger.reset()?)
    }

    /// Draw a prize and credit it to the ledger.
    pub fn claim_reward(&mut self) -> Result<RewardOutcome, StorefrontError> {
        let prize = self.rewards.draw();
        let balance = self.ledger.credit(prize.coins())?;
        info!(prize = %prize, balance, "Reward claimed");
        Ok(RewardOutcome { prize, balance })
    }

    /// Current display preference.
    pub fn theme(&self) -> ThemeMode {
        self.preferences.mode()
    }

    /// Persist a display preference.
    pub fn set_theme(&mut self, mode: ThemeMode) -> Result<(), StorefrontError> {
        Ok(self.preferences.set_mode(mode)?)
    }

    /// Flip the display preference.
    pub fn toggle_theme(&mut self) -> Result<ThemeMode, StorefrontError> {
        Ok(self.preferences.toggle()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::store::testing::StaticSource,
        ledger::STARTING_BALANCE,
        models::fixtures::product,
        reward::DrawSource,
        storage::{KeyValueStore, MemoryStore, COIN_BALANCE_KEY},
    };
    use tempfile::tempdir;

    struct Always(usize);

    impl DrawSource for Always {
        fn pick(&mut self, _len: usize) -> usize {
            self.0
        }
    }

    fn storefront(store: SharedStore, prize_index: usize) -> Storefront {
        let source = Arc::new(StaticSource::with(vec![
            product(1, "Backpack", 109.95),
            product(2, "Slim Fit T-Shirt", 22.3),
            product(3, "Cotton Jacket", 55.99),
        ]));
        Storefront::from_parts(store, source, RewardDraw::new(Always(prize_index))).unwrap()
    }

    #[tokio::test]
    async fn buy_resolves_through_catalog() {
        let mut shop = storefront(Arc::new(MemoryStore::new()), 0);
        assert_eq!(shop.refresh_catalog().await.unwrap(), 3);

        let receipt = shop.buy(1).await.unwrap();
        assert_eq!(receipt.amount, 110);
        assert_eq!(shop.balance(), 390);
        assert_eq!(shop.owned().len(), 1);

        assert!(matches!(
            shop.buy(99).await,
            Err(StorefrontError::Fetch(FetchError::NotFound(99)))
        ));
        assert_eq!(shop.balance(), 390);
    }

    #[tokio::test]
    async fn search_narrows_products() {
        let shop = storefront(Arc::new(MemoryStore::new()), 0);
        shop.refresh_catalog().await.unwrap();
        assert_eq!(shop.search("JACKET").len(), 1);
        assert_eq!(shop.products().len(), 1);
        assert_eq!(shop.search("").len(), 3);
    }

    #[tokio::test]
    async fn sell_unowned_is_reported() {
        let mut shop = storefront(Arc::new(MemoryStore::new()), 0);
        assert!(matches!(
            shop.sell(42),
            Err(StorefrontError::Sell(SellError::NotOwned(42)))
        ));
        assert_eq!(shop.balance(), STARTING_BALANCE);
    }

    #[test]
    fn reward_is_credited_and_persisted() {
        let store = Arc::new(MemoryStore::new());
        let mut shop = storefront(store.clone(), 1);
        let outcome = shop.claim_reward().unwrap();
        assert_eq!(outcome.prize, Prize::Silver);
        assert_eq!(outcome.balance, 550);
        assert_eq!(store.get(COIN_BALANCE_KEY).unwrap().as_deref(), Some("550"));
    }

    #[tokio::test]
    async fn state_survives_reopen() -> anyhow::Result<()> {
        let dir = tempdir()?;
        {
            let store: SharedStore = Arc::new(FileStore::open(dir.path())?);
            let mut shop = storefront(store, 2);
            shop.refresh_catalog().await?;
            shop.buy(2).await?;
            shop.claim_reward()?;
            shop.set_theme(ThemeMode::Dark)?;
        }

        let store: SharedStore = Arc::new(FileStore::open(dir.path())?);
        let mut shop = storefront(store, 2);
        assert_eq!(shop.balance(), 500 - 23 + 20);
        assert_eq!(shop.owned()[0].id, 2);
        assert_eq!(shop.theme(), ThemeMode::Dark);
        assert_eq!(shop.toggle_theme()?, ThemeMode::Light);

        shop.reset()?;
        assert!(shop.owned().is_empty());
        assert_eq!(shop.balance(), STARTING_BALANCE);
        Ok(())
    }

    #[test]
    fn open_uses_configured_directory() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let config = AppConfig {
            data_dir: dir.path().join("data"),
            reward_seed: Some(3),
            rebuy_policy: crate::ledger::RebuyPolicy::Reject,
            ..AppConfig::default()
        };
        let shop = Storefront::open(&config)?;
        assert_eq!(shop.balance(), STARTING_BALANCE);
        assert_eq!(shop.ledger().policy(), crate::ledger::RebuyPolicy::Reject);
        assert!(dir.path().join("data").join(crate::storage::file::STORAGE_FILE).is_file());
        Ok(())
    }
}
