//! Ownership and coin balance bookkeeping.
//!
//! Every mutation follows the same sequence: compute the next state, write
//! both persisted keys in one batch, and only then swap the in-memory state.
//! A failed write leaves the ledger exactly as it was.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    models::{Product, ProductId},
    storage::{
        self, KeyValueStore, KeyValueStoreExt, PersistenceError, SharedStore, COIN_BALANCE_KEY,
        OWNED_PRODUCTS_KEY,
    },
};

/// Balance granted on first run and after a reset.
pub const STARTING_BALANCE: u64 = 500;

/// How a purchase of an already-owned product is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebuyPolicy {
    /// Charge the price again; ownership stays a single entry.
    #[default]
    Charge,
    /// Refuse the purchase without charging.
    Reject,
}

/// Persisted copy of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Owned products in purchase order.
    pub owned: Vec<Product>,
    /// Coin balance.
    pub balance: u64,
}

impl Default for LedgerSnapshot {
    fn default() -> Self {
        Self {
            owned: Vec::new(),
            balance: STARTING_BALANCE,
        }
    }
}

impl LedgerSnapshot {
    /// Read a snapshot from storage.
    ///
    /// Returns `Ok(None)` unless both keys are present.
    pub fn load(store: &SharedStore) -> Result<Option<Self>, PersistenceError> {
        let owned = store.get_json::<Vec<Product>>(OWNED_PRODUCTS_KEY)?;
        let balance = store.get(COIN_BALANCE_KEY)?;
        match (owned, balance) {
            (Some(owned), Some(raw)) => Ok(Some(Self {
                owned,
                balance: parse_balance(&raw)?,
            })),
            _ => Ok(None),
        }
    }

    /// Write both keys in a single batch.
    pub fn persist(&self, store: &SharedStore) -> Result<(), PersistenceError> {
        store.set_many(&[
            (OWNED_PRODUCTS_KEY, storage::encode(OWNED_PRODUCTS_KEY, &self.owned)?),
            (COIN_BALANCE_KEY, self.balance.to_string()),
        ])
    }

    fn position(&self, id: ProductId) -> Option<usize> {
        self.owned.iter().position(|product| product.id == id)
    }
}

// Older snapshots stored fractional balances; round those down.
fn parse_balance(raw: &str) -> Result<u64, PersistenceError> {
    let corrupt = |reason: String| PersistenceError::Corrupt {
        key: COIN_BALANCE_KEY.to_string(),
        reason,
    };
    let trimmed = raw.trim().trim_matches('"');
    if let Ok(value) = trimmed.parse::<u64>() {
        return Ok(value);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value.floor() as u64),
        Ok(value) => Err(corrupt(format!("balance {value} out of range"))),
        Err(err) => Err(corrupt(err.to_string())),
    }
}

/// Confirmation of a completed buy or sell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    /// Product that changed hands.
    pub product_id: ProductId,
    /// Coins charged (buy) or refunded (sell).
    pub amount: u64,
    /// Balance after the transition.
    pub balance: u64,
    /// When the transition was committed.
    pub at: DateTime<Utc>,
}

/// Reasons a purchase can fail.
#[derive(Debug, Error)]
pub enum BuyError {
    /// The balance does not cover the price.
    #[error("insufficient funds: price {price}, balance {balance}")]
    InsufficientFunds {
        /// Coin cost of the product.
        price: u64,
        /// Balance at the time of the attempt.
        balance: u64,
    },
    /// The product is already owned and the rebuy policy refuses it.
    #[error("product {0} is already owned")]
    AlreadyOwned(ProductId),
    /// The product's price cannot be charged.
    #[error("product {id} has invalid price {price}")]
    InvalidPrice {
        /// Product id.
        id: ProductId,
        /// Price as received.
        price: f64,
    },
    /// Writing the new state failed; nothing changed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Reasons a sale can fail.
#[derive(Debug, Error)]
pub enum SellError {
    /// The product is not in the owned set.
    #[error("product {0} is not owned")]
    NotOwned(ProductId),
    /// Writing the new state failed; nothing changed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Tracks owned products and the coin balance.
pub struct InventoryLedger {
    store: SharedStore,
    state: LedgerSnapshot,
    policy: RebuyPolicy,
}

impl InventoryLedger {
    /// Restore the ledger from storage, seeding defaults on first run.
    pub fn initialize(store: SharedStore) -> Result<Self, PersistenceError> {
        let snapshot = LedgerSnapshot::load(&store)?;
        Self::restore(store, snapshot)
    }

    /// Build the ledger from an explicit snapshot.
    ///
    /// With `None` the defaults are written to storage before returning.
    pub fn restore(
        store: SharedStore,
        snapshot: Option<LedgerSnapshot>,
    ) -> Result<Self, PersistenceError> {
        let state = match snapshot {
            Some(snapshot) => {
                let snapshot = dedupe(snapshot);
                info!(
                    owned = snapshot.owned.len(),
                    balance = snapshot.balance,
                    "Ledger restored"
                );
                snapshot
            }
            None => {
                let snapshot = LedgerSnapshot::default();
                snapshot.persist(&store)?;
                info!(balance = snapshot.balance, "Ledger initialised with defaults");
                snapshot
            }
        };

        Ok(Self {
            store,
            state,
            policy: RebuyPolicy::default(),
        })
    }

    /// Use `policy` for purchases of already-owned products.
    pub fn with_policy(mut self, policy: RebuyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Active rebuy policy.
    pub fn policy(&self) -> RebuyPolicy {
        self.policy
    }

    /// Current coin balance.
    pub fn balance(&self) -> u64 {
        self.state.balance
    }

    /// Owned products in purchase order.
    pub fn owned(&self) -> &[Product] {
        &self.state.owned
    }

    /// Whether `id` is currently owned.
    pub fn owns(&self, id: ProductId) -> bool {
        self.state.position(id).is_some()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state.clone()
    }

    /// Charge the product's cost and record ownership.
    pub fn buy(&mut self, product: &Product) -> Result<Receipt, BuyError> {
        let price = product.cost().ok_or(BuyError::InvalidPrice {
            id: product.id,
            price: product.price,
        })?;
        let owned = self.owns(product.id);
        if owned && self.policy == RebuyPolicy::Reject {
            return Err(BuyError::AlreadyOwned(product.id));
        }
        if self.state.balance < price {
            return Err(BuyError::InsufficientFunds {
                price,
                balance: self.state.balance,
            });
        }

        let mut next = self.state.clone();
        next.balance -= price;
        if !owned {
            next.owned.push(product.clone());
        }
        self.commit(next)?;

        info!(
            product_id = product.id,
            price,
            balance = self.state.balance,
            rebuy = owned,
            "Product bought"
        );
        Ok(self.receipt(product.id, price))
    }

    /// Remove the product from the owned set and refund its cost.
    pub fn sell(&mut self, id: ProductId) -> Result<Receipt, SellError> {
        let index = self.state.position(id).ok_or(SellError::NotOwned(id))?;

        let mut next = self.state.clone();
        let product = next.owned.remove(index);
        let refund = product.cost().unwrap_or_default();
        next.balance = next.balance.saturating_add(refund);
        self.commit(next)?;

        info!(
            product_id = id,
            refund,
            balance = self.state.balance,
            "Product sold"
        );
        Ok(self.receipt(id, refund))
    }

    /// Drop all owned products and restore the starting balance.
    pub fn reset(&mut self) -> Result<(), PersistenceError> {
        self.commit(LedgerSnapshot::default())?;
        info!(balance = self.state.balance, "Ledger reset");
        Ok(())
    }

    /// Add coins to the balance. Returns the new balance.
    pub fn credit(&mut self, amount: u64) -> Result<u64, PersistenceError> {
        let mut next = self.state.clone();
        next.balance = next.balance.saturating_add(amount);
        self.commit(next)?;
        info!(amount, balance = self.state.balance, "Coins credited");
        Ok(self.state.balance)
    }

    fn commit(&mut self, next: LedgerSnapshot) -> Result<(), PersistenceError> {
        next.persist(&self.store)?;
        self.state = next;
        Ok(())
    }

    fn receipt(&self, product_id: ProductId, amount: u64) -> Receipt {
        Receipt {
            product_id,
            amount,
            balance: self.state.balance,
            at: Utc::now(),
        }
    }
}

fn dedupe(mut snapshot: LedgerSnapshot) -> LedgerSnapshot {
    let mut seen = HashSet::with_capacity(snapshot.owned.len());
    let before = snapshot.owned.len();
    snapshot.owned.retain(|product| seen.insert(product.id));
    if snapshot.owned.len() != before {
        warn!(
            dropped = before - snapshot.owned.len(),
            "Duplicate owned products dropped from snapshot"
        );
    }
    snapshot
}
