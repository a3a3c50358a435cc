// Deterministic chunk generation.
//
// Given a world seed and chunk coordinates, derives the chunk's palette,
// biome, item spawns, and optional NPC spawn from a fresh `StreamRng` seeded
// by `hash_coords(seed, cx, cy)`. Generation is a pure function: no state
// outside the arguments is read or written. The caller (`world.rs`) caches
// the result for the lifetime of the save and initializes NPC progress.
//
// Draw order, one `next_f64` per bullet:
// - palette index `floor(r * 5)`
// - chill, classified into a `Biome`
// - item count `min + floor(r * (max - min + 1))`
// - per item: kind `floor(r * 4)`, then x, then y within the chunk bounds
// - NPC roll against the spawn threshold; on success x, y (jittered around
//   the chunk center), then template `floor(r * 3)`
//
// See also: `world.rs` for the chunk cache and streaming, `dialogue.rs` for
// the template table NPCs index into, `config.rs` for `WorldParams`.
//
// **Critical constraint: determinism.** The draw order above is part of the
// save format. Reordering, adding, or skipping a draw changes every chunk of
// every world. New procedural features must draw from a separate stream.

use crate::config::GameConfig;
use crate::dialogue::TEMPLATES;
use crate::prng::StreamRng;
use crate::types::{Biome, ChunkCoord, ItemId, ItemKind, NpcId, WorldSeed};
use crate::world::{Npc, WorldItem};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Palettes
// ---------------------------------------------------------------------------

/// Palette table as `[ground, accent, light, mood, haze]` hex colors.
pub const PALETTE_TABLE: [[&str; 5]; 5] = [
    ["#0b0d11", "#1f2430", "#f5e5c8", "#ca9a6a", "#303742"],
    ["#0f1115", "#1a1d26", "#d8e0e0", "#7ac9c2", "#2b3140"],
    ["#0a0b0e", "#171a21", "#f0e0c0", "#c6787d", "#272b34"],
    ["#0a0c10", "#181e2c", "#d9d2ed", "#8694f2", "#242a39"],
    ["#0f0f10", "#242121", "#f3d9c0", "#e3a56a", "#312a28"],
];

/// Five colors a renderer uses to tint one chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub ground: String,
    pub accent: String,
    pub light: String,
    pub mood: String,
    pub haze: String,
}

impl Palette {
    /// Palette at `index` in `PALETTE_TABLE`.
    ///
    /// Panics if `index >= PALETTE_TABLE.len()`.
    pub fn from_table(index: usize) -> Self {
        let [ground, accent, light, mood, haze] = PALETTE_TABLE[index];
        Self {
            ground: ground.to_string(),
            accent: accent.to_string(),
            light: light.to_string(),
            mood: mood.to_string(),
            haze: haze.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// A generated chunk. Immutable once generated; the world's active entity
/// lists hold copies of `items` and `npcs`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub key: ChunkCoord,
    pub palette: Palette,
    pub biome: Biome,
    #[serde(default)]
    pub items: Vec<WorldItem>,
    #[serde(default)]
    pub npcs: Vec<Npc>,
}

/// Generate the chunk at `coord` for `seed`.
pub fn generate_chunk(seed: &WorldSeed, coord: ChunkCoord, config: &GameConfig) -> Chunk {
    let params = &config.world;
    let size = params.chunk_size;
    let mut rng = StreamRng::for_coords(seed.as_str(), coord.cx, coord.cy);

    let palette = Palette::from_table(rng.pick_index(PALETTE_TABLE.len()));
    let biome = Biome::from_chill(rng.next_f64());

    let min_items = params.min_items_per_chunk;
    let spread = params.max_items_per_chunk.saturating_sub(min_items) + 1;
    let count = min_items + rng.pick_index(spread);

    let origin_x = f64::from(coord.cx) * size;
    let origin_y = f64::from(coord.cy) * size;
    let mut items = Vec::with_capacity(count);
    for i in 0..count {
        let kind = ItemKind::ALL[rng.pick_index(ItemKind::ALL.len())];
        let x = origin_x + rng.next_f64() * size;
        let y = origin_y + rng.next_f64() * size;
        items.push(WorldItem {
            id: ItemId::generated(coord, i),
            kind,
            x,
            y,
            weight: config.item_weight(kind),
        });
    }

    let mut npcs = Vec::new();
    if rng.exceeds(params.npc_spawn_threshold) {
        let jitter = params.npc_jitter;
        let x = (f64::from(coord.cx) + 0.5) * size + (rng.next_f64() - 0.5) * jitter;
        let y = (f64::from(coord.cy) + 0.5) * size + (rng.next_f64() - 0.5) * jitter;
        let template = rng.pick_index(TEMPLATES.len());
        npcs.push(Npc {
            id: NpcId::for_chunk(coord),
            x,
            y,
            template,
        });
    }

    Chunk {
        key: coord,
        palette,
        biome,
        items,
        npcs,
    }
}
