//! Building definitions, runtime state and raw production.
//!
//! Definitions are immutable after loading. Each one gets exactly one
//! [`BuildingState`] holding its count, unlock flag and the last computed
//! production snapshot. Raw production is computed here; scaling by the
//! [`crate::modifiers::ModifierTable`] happens in
//! [`crate::step::Economy::apply_building_production`].

use crate::config::ConfigError;
use crate::resources::{ResourceAmount, ResourceLedger};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Broad grouping used by content and UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingCategory {
    #[default]
    Production,
    Storage,
    Military,
    Research,
}

/// Static building definition loaded from scenario data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingDef {
    /// Unique key used by effects and commands.
    pub code: String,
    #[serde(default)]
    pub category: BuildingCategory,
    /// Per-tick output of a single building.
    #[serde(default)]
    pub production: Vec<ResourceAmount>,
    /// Cost paid on construction.
    #[serde(default)]
    pub required: Vec<ResourceAmount>,
    /// Unlock state at load.
    #[serde(default)]
    pub unlocked: bool,
}

/// Mutable per-building state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingState {
    pub count: u32,
    pub unlocked: bool,
    /// Raw output from the most recent [`BuildingEntry::apply_production`].
    pub last_production: Vec<ResourceAmount>,
}

/// A definition paired with its runtime state.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingEntry {
    pub def: BuildingDef,
    pub state: BuildingState,
}

impl BuildingEntry {
    pub fn new(def: BuildingDef) -> Self {
        let state = BuildingState {
            count: 0,
            unlocked: def.unlocked,
            last_production: Vec::new(),
        };
        Self { def, state }
    }

    pub fn code(&self) -> &str {
        &self.def.code
    }

    /// Raw output for `count` buildings: base rate × count per entry.
    pub fn calculate_production(&self, count: u32) -> Vec<ResourceAmount> {
        self.def
            .production
            .iter()
            .map(|entry| ResourceAmount::new(entry.kind, entry.amount.saturating_mul(count as i64)))
            .collect()
    }

    /// Compute output for the current count and store it as the snapshot.
    pub fn apply_production(&mut self) -> Vec<ResourceAmount> {
        let produced = self.calculate_production(self.state.count);
        self.state.last_production = produced.clone();
        produced
    }
}

/// Recoverable failure of a building action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildingError {
    #[error("Unknown building: {0}")]
    UnknownBuilding(String),
    #[error("Building {0} is locked")]
    Locked(String),
    #[error("Insufficient resources to construct {0}")]
    InsufficientResources(String),
    #[error("No {0} left to demolish")]
    NoneToDemolish(String),
}

/// Registry capability used by building-granting effects and conditions.
pub trait BuildingRegistry {
    fn lookup(&self, code: &str) -> Option<&BuildingEntry>;

    /// Add `by` to a building's count. Returns `false` for unknown codes.
    fn increment_count(&mut self, code: &str, by: u32) -> bool;

    /// Returns `false` for unknown codes.
    fn set_unlocked(&mut self, code: &str, unlocked: bool) -> bool;

    /// Codes that are unlocked but not yet built, in catalog order.
    fn unlocked_idle_codes(&self) -> Vec<String>;
}

/// All buildings of a session, in definition order.
#[derive(Debug, Clone, Default)]
pub struct BuildingCatalog {
    entries: Vec<BuildingEntry>,
    by_code: HashMap<String, usize>,
}

impl BuildingCatalog {
    /// Create one runtime entry per definition. Codes must be unique.
    pub fn load(defs: Vec<BuildingDef>) -> Result<Self, ConfigError> {
        let mut catalog = Self::default();
        for def in defs {
            if catalog.by_code.contains_key(&def.code) {
                return Err(ConfigError::DuplicateBuilding(def.code));
            }
            catalog.by_code.insert(def.code.clone(), catalog.entries.len());
            catalog.entries.push(BuildingEntry::new(def));
        }
        log::debug!("Loaded {} building definitions", catalog.entries.len());
        Ok(catalog)
    }

    pub fn get(&self, code: &str) -> Option<&BuildingEntry> {
        self.by_code.get(code).map(|&i| &self.entries[i])
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut BuildingEntry> {
        let index = *self.by_code.get(code)?;
        Some(&mut self.entries[index])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildingEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BuildingEntry> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build one unit: the building must be unlocked and its cost is paid
    /// atomically from `ledger`.
    pub fn construct(&mut self, code: &str, ledger: &mut ResourceLedger) -> Result<(), BuildingError> {
        let entry = self
            .get_mut(code)
            .ok_or_else(|| BuildingError::UnknownBuilding(code.to_string()))?;
        if !entry.state.unlocked {
            return Err(BuildingError::Locked(code.to_string()));
        }
        if !ledger.try_spend(&entry.def.required) {
            return Err(BuildingError::InsufficientResources(code.to_string()));
        }
        entry.state.count += 1;
        log::debug!("Constructed {} (now {})", code, entry.state.count);
        Ok(())
    }

    /// Remove one unit. Construction costs are not refunded.
    pub fn demolish(&mut self, code: &str) -> Result<(), BuildingError> {
        let entry = self
            .get_mut(code)
            .ok_or_else(|| BuildingError::UnknownBuilding(code.to_string()))?;
        if entry.state.count == 0 {
            return Err(BuildingError::NoneToDemolish(code.to_string()));
        }
        entry.state.count -= 1;
        log::debug!("Demolished {} (now {})", code, entry.state.count);
        Ok(())
    }
}

impl BuildingRegistry for BuildingCatalog {
    fn lookup(&self, code: &str) -> Option<&BuildingEntry> {
        self.get(code)
    }

    fn increment_count(&mut self, code: &str, by: u32) -> bool {
        match self.get_mut(code) {
            Some(entry) => {
                entry.state.count = entry.state.count.saturating_add(by);
                true
            }
            None => false,
        }
    }

    fn set_unlocked(&mut self, code: &str, unlocked: bool) -> bool {
        match self.get_mut(code) {
            Some(entry) => {
                entry.state.unlocked = unlocked;
                true
            }
            None => false,
        }
    }

    fn unlocked_idle_codes(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.state.unlocked && e.state.count == 0)
            .map(|e| e.def.code.clone())
            .collect()
    }
}
