//! Display preference persistence.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::storage::{self, KeyValueStore, PersistenceError, SharedStore, PREFERENCE_MODE_KEY};

/// Two-valued display preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Light palette.
    #[default]
    Light,
    /// Dark palette.
    Dark,
}

impl ThemeMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Literal used in storage and user-facing text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Parse the storage literal, accepting it with or without JSON quotes.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().trim_matches('"') {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Holds the current display preference and writes it through on change.
pub struct PreferenceStore {
    store: SharedStore,
    mode: ThemeMode,
}

impl PreferenceStore {
    /// Load the stored preference. An absent or unrecognised value yields the default.
    pub fn load(store: SharedStore) -> Result<Self, PersistenceError> {
        let mode = match store.get(PREFERENCE_MODE_KEY)? {
            Some(raw) => ThemeMode::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "Unrecognised preference mode; using default");
                ThemeMode::default()
            }),
            None => ThemeMode::default(),
        };
        Ok(Self { store, mode })
    }

    /// Current mode.
    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    /// Persist and apply `mode`.
    pub fn set_mode(&mut self, mode: ThemeMode) -> Result<(), PersistenceError> {
        let encoded = storage::encode(PREFERENCE_MODE_KEY, &mode)?;
        self.store.set(PREFERENCE_MODE_KEY, &encoded)?;
        self.mode = mode;
        info!(mode = %mode, "Preference mode updated");
        Ok(())
    }

    /// Switch to the other mode and return it.
    pub fn toggle(&mut self) -> Result<ThemeMode, PersistenceError> {
        let next = self.mode.toggled();
        self.set_mode(next)?;
        Ok(next)
    }
}
