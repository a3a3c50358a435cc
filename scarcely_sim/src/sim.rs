// Core simulation state and tick loop.
//
// `SimState` is the single source of truth for a save. It owns the player,
// the world (chunk cache, active entities, NPC progress, the active
// dialogue), and the game config. The host calls `step(input, dt)` once per
// frame and `apply_action()` for backpack commands; both return the
// narrative events they produced.
//
// ## Step order
//
// Backpack one-shots are applied first, then, depending on the player mode:
//
//   Active:
//     1. Compute speed from carry weight and worst need (before the needs of
//        this step drift).
//     2. Move along the normalized input direction.
//     3. Stream chunks around the new position.
//     4. On interact: advance the active dialogue if there is one, otherwise
//        pick up every item in reach (last to first) and then start an
//        exchange with the first NPC in reach.
//     5. Drift needs, track the critical timer (possibly collapsing), and
//        count down the active system message.
//     6. Cull far entities.
//
//   Collapsed:
//     1. Count the collapse timer down by `dt`.
//     2. Run the needs phase with `dt * collapsed_time_scale`.
//     3. Recover once the timer reaches zero.
//     Movement, streaming, interaction, and culling are skipped; speed is 0.
//
// `dt` is clamped to `[0, max_dt]`. There is no catch-up for long frames.
//
// ## Messages and dialogue
//
// `queue_message()` replaces the active dialogue with a `SystemMessage`.
// Completing an NPC exchange clears the dialogue before running the encounter
// outcome, so the keepsake message (or the backpack-full message) queued by
// the outcome stays on screen.
//
// Session UI state (`SessionUi`: backpack open, selected item) and the last
// computed speed are `#[serde(skip)]`: they belong to the running session,
// not the save.
//
// See also: `world.rs` for streaming and culling, `player.rs` for the need
// model, `dialogue.rs` for line selection, `save.rs` for `to_json()` /
// `from_json()` and normalization, `snapshot.rs` for the render view.
//
// **Critical constraint: determinism.** Given the same save, config, and
// sequence of `(input, dt)` steps and actions, the resulting state is
// identical. All randomness comes from the world's session `StreamRng`. No
// `HashMap`, no system time, no OS entropy.

use crate::command::{InputFrame, PlayerAction};
use crate::config::GameConfig;
use crate::dialogue::{self, ActiveDialogue, Advance, messages};
use crate::event::{SimEvent, SimEventKind};
use crate::player::{InventoryFull, InventoryItem, Player, PlayerMode};
use crate::save::SAVE_VERSION;
use crate::types::{ItemId, ItemKind, NpcId, WorldSeed, distance};
use crate::world::{World, WorldItem};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::{debug, info};

/// Backpack UI state for the running session. Never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionUi {
    pub backpack_open: bool,
    /// Inventory id the backpack has selected. May go stale if the item
    /// leaves the inventory some other way; selected-slot actions on a stale
    /// id are no-ops.
    pub selected_item: Option<ItemId>,
}

/// The complete simulation state.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimState {
    /// Save format version. See `save::SAVE_VERSION`.
    #[serde(default)]
    pub version: u32,

    /// Creation timestamp written by the browser build. Carried through
    /// unchanged; the sim never reads it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default)]
    pub player: Player,

    #[serde(default)]
    pub world: World,

    /// Game configuration. Not serialized; supplied by the host on load.
    #[serde(skip)]
    pub config: GameConfig,

    #[serde(skip)]
    pub session: SessionUi,

    /// Speed computed by the last step.
    #[serde(skip)]
    last_speed: f64,

    /// Steps taken this session. Stamps emitted events.
    #[serde(skip)]
    steps: u64,
}

/// The result of one step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepResult {
    /// Movement speed used this step (0 while collapsed).
    pub speed: f64,
    /// Narrative events emitted during this step, in order.
    pub events: Vec<SimEvent>,
}

impl SimState {
    /// Create a new simulation with default config and the given seed.
    pub fn new(seed: impl Into<WorldSeed>) -> Self {
        Self::with_config(seed, GameConfig::default())
    }

    /// Create a new simulation with the given seed and config. No chunk is
    /// generated until the first step.
    pub fn with_config(seed: impl Into<WorldSeed>, config: GameConfig) -> Self {
        Self {
            version: SAVE_VERSION,
            created_at: None,
            player: Player::new(&config.player),
            world: World::new(seed.into()),
            config,
            session: SessionUi::default(),
            last_speed: 0.0,
            steps: 0,
        }
    }

    pub fn last_speed(&self) -> f64 {
        self.last_speed
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    // -----------------------------------------------------------------------
    // Step
    // -----------------------------------------------------------------------

    /// Advance the simulation by one frame of `dt` seconds.
    pub fn step(&mut self, input: &InputFrame, dt: f64) -> StepResult {
        self.steps += 1;
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.max_dt)
        } else {
            0.0
        };
        let mut events = Vec::new();

        if input.toggle_backpack {
            self.session.backpack_open = !self.session.backpack_open;
        }
        if input.close_backpack {
            self.session.backpack_open = false;
        }

        let speed = match self.player.mode() {
            PlayerMode::Collapsed => {
                self.step_collapsed(dt, &mut events);
                0.0
            }
            PlayerMode::Active => self.step_active(input, dt, &mut events),
        };
        self.last_speed = speed;
        StepResult { speed, events }
    }

    fn step_active(&mut self, input: &InputFrame, dt: f64, events: &mut Vec<SimEvent>) -> f64 {
        let speed = self
            .player
            .movement_speed(&self.config.speed, self.config.needs.max_need);
        let direction = input.direction();
        if direction != (0.0, 0.0) {
            self.player.move_by(direction, speed, dt);
        }

        self.stream(events);

        if input.interact {
            if self.world.active_dialogue.is_some() {
                self.advance_dialogue(events);
            } else {
                self.pick_up_nearby(events);
                self.talk_to_nearby(events);
            }
        }

        self.apply_needs(dt, events);
        self.cull(events);
        speed
    }

    fn step_collapsed(&mut self, dt: f64, events: &mut Vec<SimEvent>) {
        self.player.collapse_timer -= dt;
        self.apply_needs(dt * self.config.collapse.collapsed_time_scale, events);
        if self.player.collapse_timer <= 0.0 {
            self.player.recover(&self.config.collapse);
            self.alert(messages::RECOVERED);
            info!("player recovered");
            self.emit(events, SimEventKind::Recovered);
        }
    }

    fn emit(&self, events: &mut Vec<SimEvent>, kind: SimEventKind) {
        events.push(SimEvent {
            step: self.steps,
            kind,
        });
    }

    // -----------------------------------------------------------------------
    // Streaming
    // -----------------------------------------------------------------------

    fn stream(&mut self, events: &mut Vec<SimEvent>) {
        let report = self
            .world
            .stream_around(self.player.x, self.player.y, &self.config);
        for (coord, biome) in report.discovered {
            self.emit(events, SimEventKind::ChunkDiscovered { coord, biome });
        }
        for coord in report.rematerialized {
            debug!(%coord, "chunk restored");
            self.emit(events, SimEventKind::ChunkRestored { coord });
        }
    }

    fn cull(&mut self, events: &mut Vec<SimEvent>) {
        let (items, npcs) = self
            .world
            .cull_far(self.player.x, self.player.y, &self.config);
        if items > 0 || npcs > 0 {
            self.emit(events, SimEventKind::EntitiesCulled { items, npcs });
        }
    }

    // -----------------------------------------------------------------------
    // Needs and collapse
    // -----------------------------------------------------------------------

    fn apply_needs(&mut self, dt: f64, events: &mut Vec<SimEvent>) {
        let biome = self
            .world
            .biome_at(self.player.x, self.player.y, &self.config);
        let cold = self.config.needs.cold_multipliers.for_biome(biome);
        self.player.drift_needs(dt, cold, &self.config.needs);

        if self
            .player
            .track_critical(dt, self.config.needs.max_need, &self.config.collapse)
        {
            self.collapse(events);
        }

        if self
            .world
            .active_dialogue
            .as_mut()
            .is_some_and(|dialogue| dialogue.tick(dt))
        {
            self.world.active_dialogue = None;
        }
    }

    fn collapse(&mut self, events: &mut Vec<SimEvent>) {
        if !self.player.begin_collapse(&self.config.collapse) {
            return;
        }
        let dropped = self.player.heaviest_item().cloned();
        if let Some(id) = &dropped {
            self.drop_item(id, events);
        }
        self.alert(messages::COLLAPSED);
        info!(dropped = ?dropped.as_ref().map(ItemId::as_str), "player collapsed");
        self.emit(events, SimEventKind::Collapsed { dropped });
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    /// Replace the active dialogue with a system message shown for `ttl`
    /// seconds.
    pub fn queue_message(&mut self, text: impl Into<String>, ttl: f64) {
        self.world.active_dialogue = Some(ActiveDialogue::system(text, ttl));
    }

    fn notify(&mut self, text: &str) {
        self.queue_message(text, self.config.messages.default_ttl);
    }

    fn alert(&mut self, text: &str) {
        self.queue_message(text, self.config.messages.alert_ttl);
    }

    // -----------------------------------------------------------------------
    // Interaction
    // -----------------------------------------------------------------------

    fn pick_up_nearby(&mut self, events: &mut Vec<SimEvent>) {
        let radius = self.config.world.interact_radius;
        let (px, py) = (self.player.x, self.player.y);
        for index in (0..self.world.items.len()).rev() {
            let item = &self.world.items[index];
            if distance(item.x, item.y, px, py) > radius {
                continue;
            }
            let carried = InventoryItem::from(item);
            let (item_id, kind) = (carried.id.clone(), carried.kind);
            if self.add_to_inventory(carried).is_ok() {
                self.world.take_item(index);
                self.emit(events, SimEventKind::ItemPickedUp { item_id, kind });
            } else {
                self.emit(events, SimEventKind::PickupRefused { item_id });
            }
        }
    }

    fn talk_to_nearby(&mut self, events: &mut Vec<SimEvent>) {
        let radius = self.config.world.interact_radius;
        let (px, py) = (self.player.x, self.player.y);
        let Some(npc) = self
            .world
            .npcs
            .iter()
            .find(|npc| distance(npc.x, npc.y, px, py) <= radius)
        else {
            return;
        };
        let (npc_id, template) = (npc.id.clone(), npc.template);
        let state = *self.world.npc_state_mut(&npc_id);
        let lines = dialogue::npc_lines(
            template,
            &state,
            self.player.worst_need(),
            self.config.messages.needy_threshold,
        );
        debug!(npc = %npc_id, encounters = state.encounters, "dialogue started");
        self.world.active_dialogue = Some(ActiveDialogue::exchange(npc_id.clone(), lines));
        self.emit(events, SimEventKind::DialogueStarted { npc_id });
    }

    fn advance_dialogue(&mut self, events: &mut Vec<SimEvent>) {
        let Some(dialogue) = self.world.active_dialogue.as_mut() else {
            return;
        };
        if dialogue.advance() == Advance::Continued {
            return;
        }
        let finished = self.world.active_dialogue.take();
        if let Some(ActiveDialogue::NpcExchange { npc_id, .. }) = finished {
            self.complete_encounter(&npc_id, events);
        }
    }

    fn complete_encounter(&mut self, npc_id: &NpcId, events: &mut Vec<SimEvent>) {
        let state = self.world.npc_state_mut(npc_id);
        state.encounters += 1;
        let encounters = state.encounters;
        let first_gift = !std::mem::replace(&mut state.gifted, true);

        // Direct adjustment; the next inventory mutation recomputes it.
        self.player.carry_weight =
            (self.player.carry_weight - self.config.messages.conversation_relief).max(0.0);

        info!(npc = %npc_id, encounters, "encounter completed");
        self.emit(
            events,
            SimEventKind::EncounterCompleted {
                npc_id: npc_id.clone(),
                encounters,
            },
        );

        if first_gift {
            let item_id = ItemId::keepsake(npc_id);
            let keepsake = InventoryItem {
                id: item_id.clone(),
                kind: ItemKind::Keepsake,
                weight: self.config.item_weight(ItemKind::Keepsake),
            };
            if self.add_to_inventory(keepsake).is_ok() {
                self.notify(messages::KEEPSAKE);
                self.emit(
                    events,
                    SimEventKind::KeepsakeReceived {
                        npc_id: npc_id.clone(),
                        item_id,
                    },
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // Inventory
    // -----------------------------------------------------------------------

    /// Add to the backpack, queueing the matching message either way.
    fn add_to_inventory(&mut self, item: InventoryItem) -> Result<(), InventoryFull> {
        match self.player.add_item(item) {
            Ok(()) => {
                self.notify(messages::PACKED);
                Ok(())
            }
            Err(full) => {
                self.notify(messages::BACKPACK_FULL);
                Err(full)
            }
        }
    }

    fn use_item(&mut self, id: &ItemId, events: &mut Vec<SimEvent>) {
        let Some(item) = self.player.remove_item(id) else {
            return;
        };
        if let Some(data) = self.config.items.get(&item.kind) {
            self.player
                .apply_effect(&data.effect, self.config.needs.max_need);
        }
        self.notify(messages::USED);
        self.emit(
            events,
            SimEventKind::ItemUsed {
                item_id: item.id,
                kind: item.kind,
            },
        );
    }

    /// Drop an inventory item near the player. Returns the id it has on the
    /// ground, or `None` if `id` is not carried.
    fn drop_item(&mut self, id: &ItemId, events: &mut Vec<SimEvent>) -> Option<ItemId> {
        let item = self.player.remove_item(id)?;
        let params = &self.config.drop;
        let rng = self.world.session_rng();
        let angle = rng.next_f64() * TAU;
        let offset = params.min_distance + rng.next_f64() * params.distance_spread;

        let dropped_id = self.world.next_drop_id(&item.id);
        self.world.items.push(WorldItem {
            id: dropped_id.clone(),
            kind: item.kind,
            x: self.player.x + angle.cos() * offset,
            y: self.player.y + angle.sin() * offset,
            weight: item.weight,
        });
        self.notify(messages::DROPPED);
        self.emit(
            events,
            SimEventKind::ItemDropped {
                item_id: item.id,
                dropped_id: dropped_id.clone(),
            },
        );
        Some(dropped_id)
    }

    /// Apply a backpack command. Commands naming an item that is not
    /// carried are no-ops.
    pub fn apply_action(&mut self, action: &PlayerAction) -> Vec<SimEvent> {
        let mut events = Vec::new();
        match action {
            PlayerAction::UseItem { item_id } => self.use_item(item_id, &mut events),
            PlayerAction::DropItem { item_id } => {
                self.drop_item(item_id, &mut events);
            }
            PlayerAction::SelectItem { item_id } => {
                let known = item_id
                    .as_ref()
                    .is_none_or(|id| self.player.inventory.iter().any(|item| &item.id == id));
                if known {
                    self.session.selected_item = item_id.clone();
                }
            }
            PlayerAction::UseSelected => {
                if let Some(id) = self.session.selected_item.take() {
                    self.use_item(&id, &mut events);
                }
            }
            PlayerAction::DropSelected => {
                if let Some(id) = self.session.selected_item.take() {
                    self.drop_item(&id, &mut events);
                }
            }
            PlayerAction::ToggleBackpack => {
                self.session.backpack_open = !self.session.backpack_open;
            }
            PlayerAction::CloseBackpack => self.session.backpack_open = false,
        }
        events
    }
}
