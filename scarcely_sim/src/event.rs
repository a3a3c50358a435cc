// Player-visible narrative events emitted by the simulation.
//
// Every call to `SimState::step()` or `apply_action()` returns the events it
// produced, in the order they happened. Events are output only: the sim never
// reads them back, and dropping them changes nothing. Hosts use them for
// logs, sound cues, and UI refreshes (e.g. redraw the backpack list after
// `ItemPickedUp`).
//
// Each event is stamped with the session step counter so a host can
// interleave events from several steps.
//
// See also: `sim.rs` which emits these, `types.rs` for the ID types.

use crate::types::{Biome, ChunkCoord, ItemId, ItemKind, NpcId};
use serde::{Deserialize, Serialize};

/// A narrative event emitted by the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    /// Session step counter at emission. Not persisted across saves.
    pub step: u64,
    pub kind: SimEventKind,
}

/// Types of narrative events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimEventKind {
    /// A chunk was generated for the first time.
    ChunkDiscovered { coord: ChunkCoord, biome: Biome },
    /// A previously culled chunk's entities are back in the active lists.
    ChunkRestored { coord: ChunkCoord },
    /// Far entities were removed from the active lists.
    EntitiesCulled { items: usize, npcs: usize },
    /// An item moved from the world into the backpack.
    ItemPickedUp { item_id: ItemId, kind: ItemKind },
    /// An item in reach stayed on the ground because the backpack is full.
    PickupRefused { item_id: ItemId },
    /// An item was consumed.
    ItemUsed { item_id: ItemId, kind: ItemKind },
    /// An item left the backpack and now lies in the world as `dropped_id`.
    ItemDropped { item_id: ItemId, dropped_id: ItemId },
    /// An NPC exchange began.
    DialogueStarted { npc_id: NpcId },
    /// An NPC exchange ran to its end.
    EncounterCompleted { npc_id: NpcId, encounters: u32 },
    /// An NPC's keepsake went into the backpack.
    KeepsakeReceived { npc_id: NpcId, item_id: ItemId },
    /// The player collapsed, dropping `dropped` if they carried anything.
    Collapsed { dropped: Option<ItemId> },
    /// The player came to after a collapse.
    Recovered,
}
