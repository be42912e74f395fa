//! Static lookup tables: phobias and manias.
//!
//! Loaded once at startup from JSON files shaped like
//! `{"phobias": {"1": "...", "2": "..."}}`, read-only afterwards.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::{info, warn};

use crate::common::error::ConfigError;
use crate::dice::Dice;

/// Id -> description table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    entries: BTreeMap<u32, String>,
}

impl LookupTable {
    /// Parse a table stored under `key` in a JSON document.
    pub fn from_json(content: &str, key: &str) -> Result<Self, String> {
        let mut document: HashMap<String, BTreeMap<String, String>> =
            serde_json::from_str(content).map_err(|e| e.to_string())?;
        let raw = document
            .remove(key)
            .ok_or_else(|| format!("missing top-level key '{}'", key))?;

        let mut entries = BTreeMap::new();
        for (id, text) in raw {
            let id: u32 = id
                .trim()
                .parse()
                .map_err(|_| format!("entry id '{}' is not a number", id))?;
            entries.insert(id, text);
        }
        Ok(Self { entries })
    }

    /// Load a table from disk.
    pub fn load(path: impl AsRef<Path>, key: &str) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ResourceError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content, key).map_err(|message| ConfigError::ResourceError {
            path: path.display().to_string(),
            message,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pick an entry uniformly at random, returning its id and text.
    pub fn pick(&self, dice: &dyn Dice) -> Option<(u32, &str)> {
        if self.is_empty() {
            return None;
        }
        let index = dice.roll(self.entries.len() as u32) as usize - 1;
        self.entries
            .iter()
            .nth(index)
            .map(|(id, text)| (*id, text.as_str()))
    }
}

/// All static tables used by the insanity commands.
#[derive(Debug, Clone, Default)]
pub struct ResourceTables {
    pub phobias: LookupTable,
    pub manias: LookupTable,
}

impl ResourceTables {
    /// Load both tables. A missing or broken file is logged and leaves that
    /// table empty; the commands still answer without the detail line.
    pub fn load(phobias_path: impl AsRef<Path>, manias_path: impl AsRef<Path>) -> Self {
        let phobias = LookupTable::load(phobias_path, "phobias").unwrap_or_else(|e| {
            warn!("{}", e);
            LookupTable::default()
        });
        let manias = LookupTable::load(manias_path, "manias").unwrap_or_else(|e| {
            warn!("{}", e);
            LookupTable::default()
        });

        info!(
            "Loaded {} phobias and {} manias",
            phobias.len(),
            manias.len()
        );
        Self { phobias, manias }
    }
}
