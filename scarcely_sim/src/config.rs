// Data-driven game configuration.
//
// All tunable simulation parameters live here in `GameConfig`, loaded from
// JSON by the host. The sim never uses magic numbers; it reads from the
// config. Every struct is `#[serde(default)]`, so a partial config file
// (say, just `{"needs": {"thirst_rate": 10.0}}`) overrides only what it
// names.
//
// Parameters are grouped into nested sub-structs: `WorldParams` (chunk grid
// and spawning), `NeedParams`, `SpeedParams`, `CollapseParams`,
// `DropParams`, `MessageParams`, and `PlayerDefaults`. Per-kind item data
// (weight and need deltas) lives in `ItemKindData` entries keyed by
// `ItemKind` in the `items` map; see `items.rs`.
//
// See also: `sim.rs` which holds the `GameConfig` alongside `SimState`,
// `chunk_gen.rs` which reads `WorldParams`, `player.rs` which reads the need,
// speed, and collapse groups.
//
// **Critical constraint: determinism.** Config values feed directly into
// generation. Changing `world` spawn parameters changes the shape of every
// existing save's unexplored chunks.

use crate::items::{ItemKindData, NeedDeltas};
use crate::types::{Biome, ItemKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Parameter groups
// ---------------------------------------------------------------------------

/// Chunk grid, streaming, and spawn parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldParams {
    /// Side length of a square chunk in world units.
    pub chunk_size: f64,
    /// Chebyshev radius, in chunks, around the player's chunk that is kept
    /// generated and live. Entities are culled beyond
    /// `chunk_size * (view_radius + 1)` on either axis.
    pub view_radius: i32,
    /// Distance within which interact picks up items and talks to NPCs.
    pub interact_radius: f64,
    /// Minimum items spawned per chunk.
    pub min_items_per_chunk: usize,
    /// Maximum items spawned per chunk (inclusive).
    pub max_items_per_chunk: usize,
    /// A chunk spawns an NPC when its draw is strictly above this.
    pub npc_spawn_threshold: f64,
    /// Full width of the NPC's placement jitter around the chunk center.
    pub npc_jitter: f64,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            chunk_size: 96.0,
            view_radius: 2,
            interact_radius: 14.0,
            min_items_per_chunk: 1,
            max_items_per_chunk: 3,
            npc_spawn_threshold: 0.94,
            npc_jitter: 24.0,
        }
    }
}

impl WorldParams {
    /// Axis-aligned distance beyond which active entities are culled.
    pub fn cull_margin(&self) -> f64 {
        self.chunk_size * f64::from(self.view_radius + 1)
    }
}

/// Warmth decay multiplier per biome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColdMultipliers {
    pub icy: f64,
    pub forest: f64,
    pub steppe: f64,
}

impl Default for ColdMultipliers {
    fn default() -> Self {
        Self {
            icy: 1.25,
            forest: 0.75,
            steppe: 0.6,
        }
    }
}

impl ColdMultipliers {
    pub fn for_biome(&self, biome: Biome) -> f64 {
        match biome {
            Biome::Icy => self.icy,
            Biome::Forest => self.forest,
            Biome::Steppe => self.steppe,
        }
    }
}

/// Need growth rates, in points per second.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedParams {
    pub hunger_rate: f64,
    pub thirst_rate: f64,
    /// Base warmth rate, scaled by the current biome's multiplier.
    pub warmth_rate: f64,
    pub cold_multipliers: ColdMultipliers,
    /// Upper bound of every need. A need at this value is critical.
    pub max_need: f64,
}

impl Default for NeedParams {
    fn default() -> Self {
        Self {
            hunger_rate: 6.0,
            thirst_rate: 8.0,
            warmth_rate: 4.0,
            cold_multipliers: ColdMultipliers::default(),
            max_need: 100.0,
        }
    }
}

/// Coefficients of the movement speed formula.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedParams {
    /// Speed lost per unit of carry weight, before the `min_speed` floor.
    pub weight_factor: f64,
    /// Burden penalty per unit of carry weight.
    pub burden_per_weight: f64,
    /// Cap of the burden penalty.
    pub burden_cap: f64,
    /// Weight of need strain (worst need / max) in the speed multiplier.
    pub strain_weight: f64,
    /// Need strain above which the severe penalty kicks in.
    pub severe_threshold: f64,
    /// Weight of the strain excess above `severe_threshold`.
    pub severe_weight: f64,
}

impl Default for SpeedParams {
    fn default() -> Self {
        Self {
            weight_factor: 5.0,
            burden_per_weight: 0.02,
            burden_cap: 0.35,
            strain_weight: 0.35,
            severe_threshold: 0.7,
            severe_weight: 0.2,
        }
    }
}

/// Critical-need tracking, collapse, and recovery.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollapseParams {
    /// Seconds at a maxed-out need before collapsing.
    pub critical_threshold: f64,
    /// Rate (relative to dt) at which the critical timer decays while no need
    /// is maxed.
    pub critical_decay: f64,
    /// Seconds spent collapsed.
    pub duration: f64,
    /// Time scale applied to need drift while collapsed.
    pub collapsed_time_scale: f64,
    /// Need values restored on recovery.
    pub recovery: NeedLevels,
}

impl Default for CollapseParams {
    fn default() -> Self {
        Self {
            critical_threshold: 5.0,
            critical_decay: 0.5,
            duration: 5.0,
            collapsed_time_scale: 0.3,
            recovery: NeedLevels {
                hunger: 40.0,
                thirst: 40.0,
                warmth: 45.0,
            },
        }
    }
}

/// Absolute values for the three needs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedLevels {
    pub hunger: f64,
    pub thirst: f64,
    pub warmth: f64,
}

/// Placement of dropped items around the player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropParams {
    pub min_distance: f64,
    /// Width of the uniform distance spread added to `min_distance`.
    pub distance_spread: f64,
}

impl Default for DropParams {
    fn default() -> Self {
        Self {
            min_distance: 10.0,
            distance_spread: 6.0,
        }
    }
}

/// System message durations and dialogue tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageParams {
    /// Seconds a regular system message stays up.
    pub default_ttl: f64,
    /// Seconds the collapse and recovery messages stay up.
    pub alert_ttl: f64,
    /// Worst need above which NPCs add the fraying line.
    pub needy_threshold: f64,
    /// Carry weight lifted off the player when an exchange completes.
    pub conversation_relief: f64,
}

impl Default for MessageParams {
    fn default() -> Self {
        Self {
            default_ttl: 4.0,
            alert_ttl: 6.0,
            needy_threshold: 70.0,
            conversation_relief: 0.15,
        }
    }
}

/// Stats given to a new player and to loaded players missing them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerDefaults {
    pub name: String,
    pub base_speed: f64,
    pub min_speed: f64,
    pub max_inventory: usize,
}

impl Default for PlayerDefaults {
    fn default() -> Self {
        Self {
            name: "wanderer".to_string(),
            base_speed: 52.0,
            min_speed: 12.0,
            max_inventory: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Top-level game configuration. Loaded from JSON, with every field
/// defaulted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Upper bound of a single step's delta time, in seconds. Longer frames
    /// are clamped, not caught up.
    pub max_dt: f64,

    pub world: WorldParams,
    pub needs: NeedParams,
    pub speed: SpeedParams,
    pub collapse: CollapseParams,
    pub drop: DropParams,
    pub messages: MessageParams,
    pub player: PlayerDefaults,

    /// Per-kind weight and need deltas. Keyed by `ItemKind`.
    pub items: BTreeMap<ItemKind, ItemKindData>,
}

impl Default for GameConfig {
    fn default() -> Self {
        let mut items = BTreeMap::new();
        items.insert(
            ItemKind::Forage,
            ItemKindData {
                weight: 1.0,
                effect: NeedDeltas {
                    hunger: -18.0,
                    ..NeedDeltas::default()
                },
            },
        );
        items.insert(
            ItemKind::Water,
            ItemKindData {
                weight: 1.5,
                effect: NeedDeltas {
                    thirst: -22.0,
                    ..NeedDeltas::default()
                },
            },
        );
        items.insert(
            ItemKind::Ember,
            ItemKindData {
                weight: 2.0,
                effect: NeedDeltas {
                    warmth: -28.0,
                    ..NeedDeltas::default()
                },
            },
        );
        items.insert(
            ItemKind::Keepsake,
            ItemKindData {
                weight: 0.5,
                effect: NeedDeltas {
                    hunger: -5.0,
                    thirst: -5.0,
                    warmth: -5.0,
                },
            },
        );

        Self {
            max_dt: 0.25,
            world: WorldParams::default(),
            needs: NeedParams::default(),
            speed: SpeedParams::default(),
            collapse: CollapseParams::default(),
            drop: DropParams::default(),
            messages: MessageParams::default(),
            player: PlayerDefaults::default(),
            items,
        }
    }
}

impl GameConfig {
    /// Weight of one item of `kind`. Kinds missing from the table weigh
    /// nothing.
    pub fn item_weight(&self, kind: ItemKind) -> f64 {
        self.items.get(&kind).map_or(0.0, |data| data.weight)
    }
}
