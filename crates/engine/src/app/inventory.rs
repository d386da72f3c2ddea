use std::collections::BTreeMap;

use tracing::warn;

/// Stackable item container keyed by item id. Quantities are never zero or
/// negative: an id is present only while at least one unit is held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    items: BTreeMap<String, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, item_id: &str) -> bool {
        self.items.contains_key(item_id)
    }

    pub fn count(&self, item_id: &str) -> u32 {
        self.items.get(item_id).copied().unwrap_or(0)
    }

    pub fn add(&mut self, item_id: &str, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let held = self.items.entry(item_id.to_string()).or_insert(0);
        *held = held.saturating_add(quantity);
    }

    /// Removes `quantity` units. Fails without mutating when the id is
    /// unknown or fewer units are held.
    pub fn remove(&mut self, item_id: &str, quantity: u32) -> bool {
        let held = self.count(item_id);
        if held == 0 || quantity > held {
            warn!(
                item_id,
                held,
                requested = quantity,
                "inventory_remove_rejected"
            );
            return false;
        }
        let remaining = held - quantity;
        if remaining == 0 {
            self.items.remove(item_id);
        } else {
            self.items.insert(item_id.to_string(), remaining);
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.items.iter().map(|(id, qty)| (id.as_str(), *qty))
    }

    /// `(item_id, quantity)` rows in id order, for UI mirrors.
    pub fn rows(&self) -> Vec<(String, u32)> {
        self.items
            .iter()
            .map(|(id, qty)| (id.clone(), *qty))
            .collect()
    }
}
