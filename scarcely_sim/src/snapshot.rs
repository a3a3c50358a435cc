// Read-only render view of the simulation.
//
// `SimState::snapshot()` borrows everything a renderer needs for one frame:
// the player, the active entity lists, the on-screen dialogue line with its
// input hint, the palette and biome under the player, and the session's
// backpack UI state. Nothing is copied and nothing is generated: the
// palette comes from the chunk cache and is `None` before the first step.
//
// `Snapshot` serializes to JSON so a host without Rust bindings can receive
// frames over a pipe.
//
// See also: `sim.rs` for `SimState`, `dialogue.rs` for `prompt()`,
// `chunk_gen.rs` for `Palette`.

use crate::chunk_gen::Palette;
use crate::dialogue::ActiveDialogue;
use crate::player::Player;
use crate::sim::SimState;
use crate::types::{Biome, ItemId, NpcId};
use crate::world::{Npc, WorldItem};
use serde::Serialize;

/// The dialogue box contents.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueView<'a> {
    pub text: &'a str,
    pub prompt: &'static str,
    /// Speaker, or `None` for a system message.
    pub npc_id: Option<&'a NpcId>,
}

impl<'a> From<&'a ActiveDialogue> for DialogueView<'a> {
    fn from(dialogue: &'a ActiveDialogue) -> Self {
        Self {
            text: dialogue.current_line(),
            prompt: dialogue.prompt(),
            npc_id: dialogue.npc_id(),
        }
    }
}

/// Everything a renderer draws for one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<'a> {
    pub player: &'a Player,
    pub items: &'a [WorldItem],
    pub npcs: &'a [Npc],
    pub dialogue: Option<DialogueView<'a>>,
    pub palette: Option<&'a Palette>,
    pub biome: Option<Biome>,
    pub backpack_open: bool,
    pub selected_item: Option<&'a ItemId>,
    pub speed: f64,
}

impl SimState {
    pub fn snapshot(&self) -> Snapshot<'_> {
        let chunk = self
            .world
            .chunk_at(self.player.x, self.player.y, &self.config);
        Snapshot {
            player: &self.player,
            items: &self.world.items,
            npcs: &self.world.npcs,
            dialogue: self.world.active_dialogue.as_ref().map(DialogueView::from),
            palette: chunk.map(|c| &c.palette),
            biome: chunk.map(|c| c.biome),
            backpack_open: self.session.backpack_open,
            selected_item: self.session.selected_item.as_ref(),
            speed: self.last_speed(),
        }
    }
}
