// Chunk cache, active entity lists, and streaming around the player.
//
// `World` owns everything spatial: the permanent cache of generated chunks
// (keyed by `ChunkCoord` in a `BTreeMap`), the active item and NPC lists the
// player can interact with, per-NPC progress (`NpcState`), and the single
// active dialogue. It also carries the streaming bookkeeping that lets an
// area come back after it was culled:
//
// - `live_chunks`: chunks whose generated entities are currently pushed into
//   the active lists. A chunk in view that is not live is materialized and
//   marked; chunks outside the view radius are un-marked.
// - `consumed_items`: generated item ids that were picked up. They are
//   skipped on re-materialization so an item never respawns.
// - `drop_serial`: counter that makes dropped item ids unique per save.
// - `rng`: the session stream used for drop offsets. Derived from the seed
//   on first use and persisted from then on.
//
// Culling is an axis-aligned box test against
// `chunk_size * (view_radius + 1)`. It only touches the active lists, never
// the chunk cache or `npc_states`, and never removes an entity inside the
// interaction radius.
//
// See also: `chunk_gen.rs` for generation, `sim.rs` which calls
// `stream_around()` and `cull_far()` each active step, `save.rs` for the
// normalization of loaded worlds.
//
// **Critical constraint: determinism.** Streaming iterates chunks in a fixed
// order (X outer, Y inner), which fixes the order of the active lists and
// therefore which NPC answers an interact. Use only ordered collections.

use crate::chunk_gen::{Chunk, generate_chunk};
use crate::config::GameConfig;
use crate::dialogue::ActiveDialogue;
use crate::prng::StreamRng;
use crate::types::{Biome, ChunkCoord, ItemId, ItemKind, NpcId, WorldSeed, distance};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// An item lying in the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldItem {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub weight: f64,
}

/// A wandering NPC. Stationary once spawned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub id: NpcId,
    pub x: f64,
    pub y: f64,
    /// Index into `dialogue::TEMPLATES`. Out-of-range values fall back to
    /// template 0.
    #[serde(default)]
    pub template: usize,
}

/// Persistent progress with one NPC, kept whether or not the NPC is loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcState {
    /// Completed exchanges. Only ever increases.
    pub encounters: u32,
    /// Whether the keepsake was offered. Only ever goes false to true.
    pub gifted: bool,
}

/// What a call to `World::stream_around()` changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StreamReport {
    /// Chunks generated for the first time, with their biome.
    pub discovered: Vec<(ChunkCoord, Biome)>,
    /// Chunks whose entities were pushed back into the active lists after
    /// having been culled.
    pub rematerialized: Vec<ChunkCoord>,
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// All spatial state of a save.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct World {
    #[serde(default)]
    pub seed: WorldSeed,
    #[serde(default)]
    pub discovered_chunks: BTreeMap<ChunkCoord, Chunk>,
    #[serde(default)]
    pub items: Vec<WorldItem>,
    #[serde(default)]
    pub npcs: Vec<Npc>,
    #[serde(default)]
    pub npc_states: BTreeMap<NpcId, NpcState>,
    #[serde(default, deserialize_with = "crate::dialogue::deserialize_lenient")]
    pub active_dialogue: Option<ActiveDialogue>,
    #[serde(default)]
    pub live_chunks: BTreeSet<ChunkCoord>,
    #[serde(default)]
    pub consumed_items: BTreeSet<ItemId>,
    #[serde(default)]
    pub drop_serial: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rng: Option<StreamRng>,
}

impl World {
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Look up the chunk at `coord`, generating and caching it first if this
    /// is its first reference. Returns the chunk and whether it was new.
    ///
    /// Generation initializes an `NpcState` for each spawned NPC that does
    /// not already have one. It does not touch the active lists; see
    /// `stream_around()`.
    pub fn ensure_chunk(&mut self, coord: ChunkCoord, config: &GameConfig) -> (&Chunk, bool) {
        let Self {
            seed,
            discovered_chunks,
            npc_states,
            ..
        } = self;
        let mut generated = false;
        let chunk = discovered_chunks.entry(coord).or_insert_with(|| {
            generated = true;
            let chunk = generate_chunk(seed, coord, config);
            for npc in &chunk.npcs {
                npc_states.entry(npc.id.clone()).or_default();
            }
            debug!(
                %coord,
                biome = ?chunk.biome,
                items = chunk.items.len(),
                npcs = chunk.npcs.len(),
                "chunk discovered"
            );
            chunk
        });
        (chunk, generated)
    }

    /// The cached chunk containing world position `(x, y)`, if generated.
    pub fn chunk_at(&self, x: f64, y: f64, config: &GameConfig) -> Option<&Chunk> {
        let coord = ChunkCoord::containing(x, y, config.world.chunk_size);
        self.discovered_chunks.get(&coord)
    }

    /// Biome at world position `(x, y)`, generating its chunk if needed.
    pub fn biome_at(&mut self, x: f64, y: f64, config: &GameConfig) -> Biome {
        let coord = ChunkCoord::containing(x, y, config.world.chunk_size);
        self.ensure_chunk(coord, config).0.biome
    }

    /// Make every chunk within the view radius of `(x, y)` generated and
    /// live, and drop live status from chunks outside it.
    pub fn stream_around(&mut self, x: f64, y: f64, config: &GameConfig) -> StreamReport {
        let center = ChunkCoord::containing(x, y, config.world.chunk_size);
        let radius = config.world.view_radius;
        let mut report = StreamReport::default();

        // Saturating: a far-out position clips the square at the grid edge.
        for cx in center.cx.saturating_sub(radius)..=center.cx.saturating_add(radius) {
            for cy in center.cy.saturating_sub(radius)..=center.cy.saturating_add(radius) {
                let coord = ChunkCoord::new(cx, cy);
                let (chunk, generated) = self.ensure_chunk(coord, config);
                if generated {
                    report.discovered.push((coord, chunk.biome));
                }
                if self.live_chunks.insert(coord) {
                    self.materialize(coord);
                    if !generated {
                        report.rematerialized.push(coord);
                    }
                }
            }
        }

        let radius = radius.unsigned_abs();
        self.live_chunks
            .retain(|coord| coord.chebyshev_distance(center) <= radius);
        report
    }

    /// Push the generated entities of `coord` into the active lists,
    /// skipping consumed items and anything already active.
    fn materialize(&mut self, coord: ChunkCoord) {
        let Some(chunk) = self.discovered_chunks.get(&coord) else {
            return;
        };
        let active_items: BTreeSet<&ItemId> = self.items.iter().map(|item| &item.id).collect();
        let new_items: Vec<WorldItem> = chunk
            .items
            .iter()
            .filter(|item| !self.consumed_items.contains(&item.id))
            .filter(|item| !active_items.contains(&item.id))
            .cloned()
            .collect();
        let active_npcs: BTreeSet<&NpcId> = self.npcs.iter().map(|npc| &npc.id).collect();
        let new_npcs: Vec<Npc> = chunk
            .npcs
            .iter()
            .filter(|npc| !active_npcs.contains(&npc.id))
            .cloned()
            .collect();
        self.items.extend(new_items);
        self.npcs.extend(new_npcs);
    }

    /// Record as consumed every generated item of a cached chunk in view of
    /// `(x, y)` that is not in the active list. Returns how many were added.
    ///
    /// For worlds saved without `live_chunks`: there, an item of a chunk in
    /// view can only be missing because it was picked up.
    pub fn consume_missing_in_view(&mut self, x: f64, y: f64, config: &GameConfig) -> usize {
        let center = ChunkCoord::containing(x, y, config.world.chunk_size);
        let radius = config.world.view_radius.unsigned_abs();
        let active: BTreeSet<&ItemId> = self.items.iter().map(|item| &item.id).collect();
        let missing: Vec<ItemId> = self
            .discovered_chunks
            .iter()
            .filter(|(coord, _)| coord.chebyshev_distance(center) <= radius)
            .flat_map(|(_, chunk)| &chunk.items)
            .map(|item| &item.id)
            .filter(|id| !active.contains(id) && !self.consumed_items.contains(*id))
            .cloned()
            .collect();
        let added = missing.len();
        if added > 0 {
            debug!(added, "recorded missing items in view as consumed");
        }
        self.consumed_items.extend(missing);
        added
    }

    /// Remove active entities outside the cull box around `(x, y)`. Returns
    /// the number of items and NPCs removed.
    pub fn cull_far(&mut self, x: f64, y: f64, config: &GameConfig) -> (usize, usize) {
        let margin = config.world.cull_margin();
        let radius = config.world.interact_radius;
        let keep = |ex: f64, ey: f64| {
            ((ex - x).abs() < margin && (ey - y).abs() < margin)
                || distance(ex, ey, x, y) <= radius
        };

        let (items_before, npcs_before) = (self.items.len(), self.npcs.len());
        self.items.retain(|item| keep(item.x, item.y));
        self.npcs.retain(|npc| keep(npc.x, npc.y));
        let removed = (
            items_before - self.items.len(),
            npcs_before - self.npcs.len(),
        );
        if removed != (0, 0) {
            debug!(items = removed.0, npcs = removed.1, "culled far entities");
        }
        removed
    }

    /// Remove the active item at `index`, recording generated items as
    /// consumed.
    ///
    /// Panics if `index` is out of bounds.
    pub fn take_item(&mut self, index: usize) -> WorldItem {
        let item = self.items.remove(index);
        if !item.id.is_dropped() {
            self.consumed_items.insert(item.id.clone());
        }
        item
    }

    /// Progress with `npc`, created on first access.
    pub fn npc_state_mut(&mut self, npc: &NpcId) -> &mut NpcState {
        self.npc_states.entry(npc.clone()).or_default()
    }

    /// Mint the id for an item dropped from `origin`.
    pub fn next_drop_id(&mut self, origin: &ItemId) -> ItemId {
        self.drop_serial += 1;
        ItemId::dropped(origin, self.drop_serial)
    }

    /// The session random stream. Derived from the world seed on first use.
    pub fn session_rng(&mut self) -> &mut StreamRng {
        let seed = &self.seed;
        self.rng
            .get_or_insert_with(|| StreamRng::for_coords(&format!("{seed}#session"), 0, 0))
    }
}
