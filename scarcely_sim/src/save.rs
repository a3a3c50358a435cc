// Versioned JSON save format: serialization, loading, and normalization.
//
// A save is the camelCase JSON of `SimState` (`{version, player, world}`),
// field-compatible with the browser build's layout. Loading parses into a
// `serde_json::Value` first so the version can be checked before the typed
// parse. Every field the typed parse might miss has a serde default, and a
// single `normalize()` pass afterwards enforces the invariants the rest of
// the sim assumes:
//
// - needs finite and clamped, timers finite and non-negative, coordinates
//   finite;
// - `carry_weight` recomputed from the inventory;
// - an `NpcState` for every known NPC;
// - `live_chunks` only naming cached chunks;
// - picked-up generated items recorded as consumed (older saves never
//   tracked this), and `drop_serial` past every existing dropped id;
// - the active dialogue pointing at a real line.
//
// Loading additionally clears the active dialogue, so a reload always resumes
// with no box on screen. Saves written without `liveChunks` predate the
// streaming bookkeeping; for those, generated items of the chunks in view
// that are missing from the active list are recorded as consumed.
//
// Two entry points:
// - `SimState::from_json()`: strict. Errors on bad JSON, a wrong version, or
//   a save without a seed.
// - `load_or_new()`: never fails. Any problem falls back to a fresh state
//   (logged with `warn!`), and a missing seed is replaced with `fresh_seed`.
//
// The config is not part of the save; the host passes it in on load.
//
// See also: `sim.rs` for `SimState`, `world.rs` and `player.rs` for the
// persisted shapes, the `scarcely_headless` crate for file I/O.

use crate::config::GameConfig;
use crate::dialogue::ActiveDialogue;
use crate::sim::SimState;
use crate::types::ItemId;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Current save format version.
pub const SAVE_VERSION: u32 = 1;

/// Default file name for exported saves.
pub const EXPORT_FILE_NAME: &str = "scarcely-save.json";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported save version {found} (expected {expected})")]
    UnsupportedVersion { found: String, expected: u32 },

    #[error("save has no world seed")]
    MissingSeed,
}

impl SimState {
    /// Serialize the simulation state to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize and normalize a save, attaching `config`.
    pub fn from_json(json: &str, config: GameConfig) -> Result<Self, SaveError> {
        parse_save(json, config, None)
    }

    /// Enforce the invariants of a loaded state. Idempotent.
    pub fn normalize(&mut self) {
        self.version = SAVE_VERSION;
        self.normalize_player();
        self.normalize_world();
    }

    fn normalize_player(&mut self) {
        let max_need = self.config.needs.max_need;
        let defaults = &self.config.player;
        let player = &mut self.player;

        for coord in [&mut player.x, &mut player.y] {
            if !coord.is_finite() {
                warn!("non-finite player coordinate in save; resetting to 0");
                *coord = 0.0;
            }
        }
        for need in [&mut player.hunger, &mut player.thirst, &mut player.warmth] {
            *need = if need.is_finite() {
                need.clamp(0.0, max_need)
            } else {
                0.0
            };
        }
        for timer in [&mut player.collapse_timer, &mut player.critical_timer] {
            if !timer.is_finite() || *timer < 0.0 {
                *timer = 0.0;
            }
        }
        if !player.base_speed.is_finite() {
            player.base_speed = defaults.base_speed;
        }
        if !player.min_speed.is_finite() {
            player.min_speed = defaults.min_speed;
        }
        for item in &mut player.inventory {
            if !item.weight.is_finite() {
                item.weight = 0.0;
            }
        }
        player.recalc_carry_weight();
    }

    fn normalize_world(&mut self) {
        let world = &mut self.world;

        let before = (world.items.len(), world.npcs.len());
        world
            .items
            .retain(|item| item.x.is_finite() && item.y.is_finite());
        world.npcs.retain(|npc| npc.x.is_finite() && npc.y.is_finite());
        if before != (world.items.len(), world.npcs.len()) {
            warn!("dropped entities with non-finite positions from save");
        }

        let known_npcs = world
            .npcs
            .iter()
            .chain(world.discovered_chunks.values().flat_map(|chunk| &chunk.npcs))
            .map(|npc| npc.id.clone())
            .collect::<Vec<_>>();
        for id in known_npcs {
            world.npc_states.entry(id).or_default();
        }

        let discovered = &world.discovered_chunks;
        world
            .live_chunks
            .retain(|coord| discovered.contains_key(coord));

        // Anything carried, or lying around as a dropped copy, was picked up
        // from its origin at some point.
        let carried = self.player.inventory.iter().map(|item| &item.id);
        let dropped = world.items.iter().map(|item| &item.id).filter(|id| id.is_dropped());
        for id in carried.chain(dropped) {
            world.consumed_items.insert(ItemId::new(id.origin()));
        }

        let highest_serial = world
            .items
            .iter()
            .map(|item| &item.id)
            .chain(self.player.inventory.iter().map(|item| &item.id))
            .filter_map(|id| id.drop_serial())
            .max()
            .unwrap_or(0);
        world.drop_serial = world.drop_serial.max(highest_serial);

        let dialogue_ok = match &mut world.active_dialogue {
            None => true,
            Some(ActiveDialogue::SystemMessage { ttl, .. }) => {
                if !ttl.is_finite() {
                    *ttl = 0.0;
                }
                true
            }
            Some(ActiveDialogue::NpcExchange { lines, index, .. }) => {
                *index = (*index).min(lines.len().saturating_sub(1));
                !lines.is_empty()
            }
        };
        if !dialogue_ok {
            world.active_dialogue = None;
        }
    }
}

fn version_of(value: &Value) -> Result<(), SaveError> {
    match value.get("version") {
        Some(version) if version.as_u64() == Some(u64::from(SAVE_VERSION)) => Ok(()),
        found => Err(SaveError::UnsupportedVersion {
            found: found.map_or_else(|| "none".to_string(), Value::to_string),
            expected: SAVE_VERSION,
        }),
    }
}

fn parse_save(
    json: &str,
    config: GameConfig,
    fresh_seed: Option<&str>,
) -> Result<SimState, SaveError> {
    let value: Value = serde_json::from_str(json)?;
    version_of(&value)?;
    let untracked_streaming = value
        .get("world")
        .and_then(|world| world.get("liveChunks"))
        .is_none();
    let mut state: SimState = serde_json::from_value(value)?;
    if state.world.seed.is_empty() {
        let seed = fresh_seed.ok_or(SaveError::MissingSeed)?;
        warn!(seed, "save has no world seed; using a fresh one");
        state.world.seed = seed.into();
    }
    state.config = config;
    state.normalize();
    state.world.active_dialogue = None;
    if untracked_streaming {
        let (x, y) = (state.player.x, state.player.y);
        state.world.consume_missing_in_view(x, y, &state.config);
    }
    debug!(
        chunks = state.world.discovered_chunks.len(),
        items = state.world.items.len(),
        npcs = state.world.npcs.len(),
        "save loaded"
    );
    Ok(state)
}

/// Load a save, or start fresh when there is none or it cannot be used.
///
/// `fresh_seed` seeds the new world on fallback, and replaces a missing seed
/// in an otherwise valid save.
pub fn load_or_new(raw: Option<&str>, config: GameConfig, fresh_seed: &str) -> SimState {
    let Some(raw) = raw else {
        debug!("no save found; starting a new game");
        return SimState::with_config(fresh_seed, config);
    };
    match parse_save(raw, config.clone(), Some(fresh_seed)) {
        Ok(state) => state,
        Err(err) => {
            warn!(%err, "failed to load save; starting a new game");
            SimState::with_config(fresh_seed, config)
        }
    }
}

/// Check that `json` is a save this build can load, without keeping it.
pub fn validate(json: &str) -> Result<(), SaveError> {
    parse_save(json, GameConfig::default(), Some("validate")).map(|_| ())
}
