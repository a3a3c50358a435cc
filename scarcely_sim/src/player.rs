// The player: position, needs, inventory, and the collapse state machine.
//
// Needs (hunger, thirst, warmth) rise over time and are always clamped to
// `[0, max_need]`. The worst need drives the speed formula and the critical
// timer: while any need is maxed the timer accumulates; otherwise it decays.
// Crossing the critical threshold collapses the player, who then ignores
// movement until the collapse timer runs out and needs reset to the
// recovery levels.
//
// `carry_weight` is derived from the inventory and recomputed after every
// inventory mutation (`recalc_carry_weight()`). The one exception is the
// relief applied when an NPC exchange completes (`sim.rs`), which adjusts it
// directly and lasts until the next mutation.
//
// The player only knows its own rules. Messages, drops into the world, and
// event emission are orchestrated by `sim.rs`.
//
// See also: `config.rs` for `NeedParams`, `SpeedParams`, `CollapseParams`,
// `items.rs` for `NeedDeltas`.

use crate::config::{CollapseParams, NeedParams, PlayerDefaults, SpeedParams};
use crate::items::NeedDeltas;
use crate::types::{ItemId, ItemKind};
use crate::world::WorldItem;
use serde::{Deserialize, Serialize};

/// One carried item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub weight: f64,
}

impl From<&WorldItem> for InventoryItem {
    fn from(item: &WorldItem) -> Self {
        Self {
            id: item.id.clone(),
            kind: item.kind,
            weight: item.weight,
        }
    }
}

/// Returned when adding to an inventory that has no free slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("inventory is full ({capacity} slots)")]
pub struct InventoryFull {
    pub capacity: usize,
}

/// Behavioral state of the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerMode {
    Active,
    Collapsed,
}

fn default_name() -> String {
    PlayerDefaults::default().name
}

fn default_max_inventory() -> usize {
    PlayerDefaults::default().max_inventory
}

fn default_base_speed() -> f64 {
    PlayerDefaults::default().base_speed
}

fn default_min_speed() -> f64 {
    PlayerDefaults::default().min_speed
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub hunger: f64,
    #[serde(default)]
    pub thirst: f64,
    #[serde(default)]
    pub warmth: f64,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default = "default_max_inventory")]
    pub max_inventory: usize,
    #[serde(default)]
    pub carry_weight: f64,
    #[serde(default = "default_base_speed")]
    pub base_speed: f64,
    #[serde(default = "default_min_speed")]
    pub min_speed: f64,
    #[serde(default)]
    pub is_collapsed: bool,
    #[serde(default)]
    pub collapse_timer: f64,
    #[serde(default)]
    pub critical_timer: f64,
}

impl Default for Player {
    fn default() -> Self {
        Self::new(&PlayerDefaults::default())
    }
}

impl Player {
    /// A fresh player at the origin with zeroed needs.
    pub fn new(defaults: &PlayerDefaults) -> Self {
        Self {
            name: defaults.name.clone(),
            x: 0.0,
            y: 0.0,
            hunger: 0.0,
            thirst: 0.0,
            warmth: 0.0,
            inventory: Vec::new(),
            max_inventory: defaults.max_inventory,
            carry_weight: 0.0,
            base_speed: defaults.base_speed,
            min_speed: defaults.min_speed,
            is_collapsed: false,
            collapse_timer: 0.0,
            critical_timer: 0.0,
        }
    }

    pub fn mode(&self) -> PlayerMode {
        if self.is_collapsed {
            PlayerMode::Collapsed
        } else {
            PlayerMode::Active
        }
    }

    pub fn worst_need(&self) -> f64 {
        self.hunger.max(self.thirst).max(self.warmth)
    }

    // -----------------------------------------------------------------------
    // Movement
    // -----------------------------------------------------------------------

    /// Movement speed in world units per second.
    ///
    /// `max(min_speed, base_speed - weight_factor * carry_weight)` scaled by
    /// `1 - burden - strain * strain_weight - severe`, where burden grows
    /// with carry weight up to a cap and severe is the strain excess above
    /// the severe threshold.
    pub fn movement_speed(&self, params: &SpeedParams, max_need: f64) -> f64 {
        let unburdened =
            (self.base_speed - params.weight_factor * self.carry_weight).max(self.min_speed);
        let burden = (self.carry_weight * params.burden_per_weight).min(params.burden_cap);
        let strain = self.worst_need() / max_need;
        let severe = (strain - params.severe_threshold).max(0.0) * params.severe_weight;
        unburdened * (1.0 - burden - strain * params.strain_weight - severe)
    }

    /// Move along the unit direction `(dx, dy)`.
    pub fn move_by(&mut self, (dx, dy): (f64, f64), speed: f64, dt: f64) {
        self.x += dx * speed * dt;
        self.y += dy * speed * dt;
    }

    // -----------------------------------------------------------------------
    // Needs
    // -----------------------------------------------------------------------

    /// Advance needs by `dt` seconds. `cold_multiplier` scales warmth for
    /// the current biome.
    pub fn drift_needs(&mut self, dt: f64, cold_multiplier: f64, params: &NeedParams) {
        let max = params.max_need;
        self.hunger = (self.hunger + params.hunger_rate * dt).clamp(0.0, max);
        self.thirst = (self.thirst + params.thirst_rate * dt).clamp(0.0, max);
        self.warmth = (self.warmth + params.warmth_rate * dt * cold_multiplier).clamp(0.0, max);
    }

    /// Update the critical timer for a `dt`-second step. Returns `true` when
    /// the timer has reached the collapse threshold.
    pub fn track_critical(&mut self, dt: f64, max_need: f64, params: &CollapseParams) -> bool {
        if self.worst_need() >= max_need {
            self.critical_timer += dt;
        } else {
            self.critical_timer = (self.critical_timer - dt * params.critical_decay).max(0.0);
        }
        self.critical_timer >= params.critical_threshold
    }

    /// Apply an item's need deltas, clamping each need.
    pub fn apply_effect(&mut self, effect: &NeedDeltas, max_need: f64) {
        self.hunger = (self.hunger + effect.hunger).clamp(0.0, max_need);
        self.thirst = (self.thirst + effect.thirst).clamp(0.0, max_need);
        self.warmth = (self.warmth + effect.warmth).clamp(0.0, max_need);
    }

    // -----------------------------------------------------------------------
    // Collapse
    // -----------------------------------------------------------------------

    /// Enter the collapsed state. Returns `false` (and changes nothing) if
    /// already collapsed.
    pub fn begin_collapse(&mut self, params: &CollapseParams) -> bool {
        if self.is_collapsed {
            return false;
        }
        self.is_collapsed = true;
        self.collapse_timer = params.duration;
        self.critical_timer = 0.0;
        true
    }

    /// Leave the collapsed state with needs reset to the recovery levels.
    pub fn recover(&mut self, params: &CollapseParams) {
        self.is_collapsed = false;
        self.hunger = params.recovery.hunger;
        self.thirst = params.recovery.thirst;
        self.warmth = params.recovery.warmth;
    }

    // -----------------------------------------------------------------------
    // Inventory
    // -----------------------------------------------------------------------

    /// Sum of carried weights rounded to two decimals, floored at zero.
    pub fn recalc_carry_weight(&mut self) {
        // `sum()` of no floats is -0.0; fold from +0.0 so an empty pack saves as 0.
        let total = self.inventory.iter().fold(0.0_f64, |acc, item| acc + item.weight);
        self.carry_weight = ((total * 100.0).round() / 100.0).max(0.0);
    }

    pub fn is_full(&self) -> bool {
        self.inventory.len() >= self.max_inventory
    }

    /// Append `item` if a slot is free.
    pub fn add_item(&mut self, item: InventoryItem) -> Result<(), InventoryFull> {
        if self.is_full() {
            return Err(InventoryFull {
                capacity: self.max_inventory,
            });
        }
        self.inventory.push(item);
        self.recalc_carry_weight();
        Ok(())
    }

    /// Remove the item with `id`. Unknown ids return `None`.
    pub fn remove_item(&mut self, id: &ItemId) -> Option<InventoryItem> {
        let index = self.inventory.iter().position(|item| &item.id == id)?;
        let item = self.inventory.remove(index);
        self.recalc_carry_weight();
        Some(item)
    }

    /// Id of the heaviest carried item. The first one wins ties.
    pub fn heaviest_item(&self) -> Option<&ItemId> {
        let mut heaviest: Option<&InventoryItem> = None;
        for item in &self.inventory {
            if heaviest.is_none_or(|best| item.weight > best.weight) {
                heaviest = Some(item);
            }
        }
        heaviest.map(|item| &item.id)
    }
}
