use crate::{CharmDef, ConsumableDef};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CharmInstance {
    pub id: String,
    pub name: String,
    /// Behaviour key in the charm registry when it differs from `id`.
    #[serde(default)]
    pub behavior: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    /// `None` means unlimited.
    #[serde(default)]
    pub uses: Option<u32>,
    #[serde(default)]
    pub params: HashMap<String, f64>,
}

fn default_active() -> bool {
    true
}

impl CharmInstance {
    pub fn new(id: impl Into<String>, name: impl Into<String>, uses: Option<u32>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            behavior: None,
            active: true,
            uses,
            params: HashMap::new(),
        }
    }

    pub fn from_def(def: &CharmDef) -> Self {
        Self {
            id: def.id.clone(),
            name: def.name.clone(),
            behavior: def.behavior.clone(),
            active: true,
            uses: def.uses,
            params: def.params.clone(),
        }
    }

    pub fn with_param(mut self, key: &str, value: f64) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    pub fn behavior_id(&self) -> &str {
        self.behavior.as_deref().unwrap_or(&self.id)
    }

    /// Active and not out of uses.
    pub fn is_usable(&self) -> bool {
        self.active && self.uses.map_or(true, |uses| uses > 0)
    }

    pub fn consume_use(&mut self) {
        if let Some(uses) = self.uses.as_mut() {
            *uses = uses.saturating_sub(1);
        }
    }

    pub fn param_or(&self, key: &str, default: f64) -> f64 {
        self.params.get(key).copied().unwrap_or(default)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsumableInstance {
    pub id: String,
    pub name: String,
    pub uses: u32,
}

impl ConsumableInstance {
    pub fn from_def(def: &ConsumableDef) -> Self {
        Self {
            id: def.id.clone(),
            name: def.name.clone(),
            uses: def.uses.max(1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Inventory {
    pub charm_slots: usize,
    pub consumable_slots: usize,
    pub charms: Vec<CharmInstance>,
    pub consumables: Vec<ConsumableInstance>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("no charm slots")]
    NoCharmSlots,
    #[error("no consumable slots")]
    NoConsumableSlots,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self::with_slots(5, 3)
    }

    /// Create a new inventory with explicit initial slot counts.
    pub fn with_slots(charm_slots: usize, consumable_slots: usize) -> Self {
        Self {
            charm_slots,
            consumable_slots,
            charms: Vec::new(),
            consumables: Vec::new(),
        }
    }

    pub fn add_charm(&mut self, charm: CharmInstance) -> Result<(), InventoryError> {
        if self.charms.len() >= self.charm_slots {
            return Err(InventoryError::NoCharmSlots);
        }
        self.charms.push(charm);
        Ok(())
    }

    pub fn add_consumable(&mut self, item: ConsumableInstance) -> Result<(), InventoryError> {
        if self.consumables.len() >= self.consumable_slots {
            return Err(InventoryError::NoConsumableSlots);
        }
        self.consumables.push(item);
        Ok(())
    }

    pub fn charm(&self, id: &str) -> Option<&CharmInstance> {
        self.charms.iter().find(|charm| charm.id == id)
    }

    /// Spends one use of the consumable at `index`, dropping it when empty.
    pub fn spend_consumable(&mut self, index: usize) -> Option<ConsumableInstance> {
        let item = self.consumables.get_mut(index)?;
        item.uses = item.uses.saturating_sub(1);
        let snapshot = item.clone();
        if snapshot.uses == 0 {
            self.consumables.remove(index);
        }
        Some(snapshot)
    }
}
