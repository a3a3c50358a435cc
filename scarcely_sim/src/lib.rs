// scarcely_sim: pure Rust simulation library.
//
// This crate contains all simulation logic for Scarcely: procedural chunk
// streaming, the player's needs and collapse cycle, inventory, NPC
// exchanges, and the versioned save format. It has no rendering or
// platform dependencies and can be tested, benchmarked, and run headless.
//
// Module overview:
// - `sim.rs`:       Top-level SimState, step loop, interaction, backpack actions.
// - `world.rs`:     Chunk cache, active entity lists, streaming and culling, NPC progress.
// - `chunk_gen.rs`: Deterministic per-chunk palette, biome, items, and NPC spawn.
// - `player.rs`:    Needs, speed formula, critical/collapse timers, inventory.
// - `dialogue.rs`:  NPC line selection, system messages, the active dialogue box.
// - `command.rs`:   InputFrame (per-step input) and PlayerAction (backpack commands).
// - `event.rs`:     Narrative SimEvents returned by step() and apply_action().
// - `config.rs`:    GameConfig, every tunable, loadable from partial JSON.
// - `items.rs`:     Per-kind item data (weight, need deltas).
// - `save.rs`:      JSON save/load, version check, normalization, fallback to a fresh game.
// - `snapshot.rs`:  Borrowed render view.
// - `prng`:         Re-exported from `scarcely_prng`. Mulberry32 with coordinate hashing.
// - `types.rs`:     ChunkCoord, seed and entity IDs, Biome, ItemKind.
//
// The companion crate `scarcely_headless` drives this library from the
// command line and owns file I/O and logging setup. This crate never reads
// the clock, the filesystem, or the environment.
//
// **Critical constraint: determinism.** The simulation is a pure function:
// `(state, input, dt) -> (new_state, events)`. All randomness comes from
// Mulberry32 streams seeded from the world seed (re-exported from
// `scarcely_prng`). No `HashMap`, no system time, no OS entropy. Use
// `BTreeMap` for ordered collections.

pub mod chunk_gen;
pub mod command;
pub mod config;
pub mod dialogue;
pub mod event;
pub mod items;
pub mod player;
pub use scarcely_prng as prng;
pub mod save;
pub mod sim;
pub mod snapshot;
pub mod types;
pub mod world;
