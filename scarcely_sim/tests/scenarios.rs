// End-to-end scenarios driven through the public SimState API.
//
// Each test builds a fresh sim for seed "abc", positions the player, and
// steps it exactly as a host would: one `InputFrame` per step plus the
// occasional `PlayerAction`. The positions used below are where seed "abc"
// places its content:
// - chunk (0,-2) has two items within reach of (88.55, -177.42);
// - chunk (1,0) has its NPC at (137.48, 46.39) with nothing else in reach.
//
// The proptest block checks the universally quantified properties of the
// need model and the inventory over random inputs.

use proptest::prelude::*;
use scarcely_sim::chunk_gen::generate_chunk;
use scarcely_sim::command::{InputFrame, PlayerAction};
use scarcely_sim::config::GameConfig;
use scarcely_sim::dialogue::{TEMPLATES, messages};
use scarcely_sim::event::SimEventKind;
use scarcely_sim::player::{InventoryItem, Player};
use scarcely_sim::prng::{StreamRng, hash_coords};
use scarcely_sim::sim::SimState;
use scarcely_sim::types::{Biome, ChunkCoord, ItemId, ItemKind, NpcId, WorldSeed};

const NPC_POS: (f64, f64) = (137.47644446231425, 46.393220499157906);
const ITEM_PAIR_POS: (f64, f64) = (88.5525082424283, -177.42279139906168);

fn interact() -> InputFrame {
    InputFrame::from_keys([], ["e"])
}

fn idle() -> InputFrame {
    InputFrame::default()
}

fn place(sim: &mut SimState, (x, y): (f64, f64)) {
    sim.player.x = x;
    sim.player.y = y;
    sim.step(&idle(), 0.0);
}

fn line(sim: &SimState) -> Option<&str> {
    sim.snapshot().dialogue.map(|view| view.text)
}

#[test]
fn one_slot_backpack_takes_one_of_two_items() {
    let mut sim = SimState::new("abc");
    sim.player.max_inventory = 1;
    place(&mut sim, ITEM_PAIR_POS);
    let before = sim.world.items.len();

    let result = sim.step(&interact(), 0.0);

    assert_eq!(sim.player.inventory.len(), 1);
    assert_eq!(sim.world.items.len(), before - 1);
    let picked = &sim.player.inventory[0].id;
    assert!(picked.as_str().starts_with("0,-2-item-"));
    let other = if picked.as_str() == "0,-2-item-1" {
        "0,-2-item-2"
    } else {
        "0,-2-item-1"
    };
    assert!(sim.world.items.iter().any(|i| i.id.as_str() == other));

    let refused = result
        .events
        .iter()
        .filter(|e| matches!(e.kind, SimEventKind::PickupRefused { .. }))
        .count();
    assert_eq!(refused, 1);
    assert_eq!(line(&sim), Some(messages::BACKPACK_FULL));
}

#[test]
fn culled_chunk_returns_with_same_ids() {
    let mut sim = SimState::new("abc");
    sim.step(&idle(), 0.0);
    let origin_ids = |sim: &SimState| {
        sim.world
            .items
            .iter()
            .filter(|i| i.id.as_str().starts_with("0,0-"))
            .map(|i| i.id.clone())
            .collect::<Vec<_>>()
    };
    let before = origin_ids(&sim);
    assert_eq!(before, vec![ItemId::new("0,0-item-0")]);
    let cached = sim.world.discovered_chunks[&ChunkCoord::new(0, 0)].clone();

    // Far enough that chunk (0,0) leaves the view square.
    place(&mut sim, (2000.0, 0.0));
    assert!(origin_ids(&sim).is_empty());
    assert!(!sim.world.live_chunks.contains(&ChunkCoord::new(0, 0)));

    place(&mut sim, (0.0, 0.0));
    assert_eq!(origin_ids(&sim), before);
    assert_eq!(sim.world.discovered_chunks[&ChunkCoord::new(0, 0)], cached);
}

#[test]
fn picked_item_stays_gone_after_cull() {
    let mut sim = SimState::new("abc");
    place(&mut sim, (6.0, 60.0));
    sim.step(&interact(), 0.0);
    assert_eq!(sim.player.inventory[0].id.as_str(), "0,0-item-0");

    place(&mut sim, (2000.0, 0.0));
    place(&mut sim, (6.0, 60.0));
    assert!(sim.world.items.iter().all(|i| i.id.as_str() != "0,0-item-0"));
}

#[test]
fn meeting_an_npc_twice() {
    let mut sim = SimState::new("abc");
    place(&mut sim, NPC_POS);
    let npc_id = NpcId::new("1,0-npc");
    let template = &TEMPLATES[1];

    // First meeting: intro lines, then the keepsake.
    sim.step(&interact(), 0.0);
    assert_eq!(line(&sim), Some(template.intro[0]));
    sim.step(&interact(), 0.0);
    assert_eq!(line(&sim), Some(template.intro[1]));
    sim.step(&interact(), 0.0);
    assert_eq!(line(&sim), Some(messages::KEEPSAKE));
    assert_eq!(sim.player.inventory.len(), 1);
    assert_eq!(sim.player.inventory[0].kind, ItemKind::Keepsake);
    assert_eq!(sim.world.npc_states[&npc_id].encounters, 1);

    // Acknowledge the message.
    sim.step(&interact(), 0.0);
    assert!(line(&sim).is_none());

    // Second meeting: followup lines and no second keepsake.
    sim.step(&interact(), 0.0);
    assert_eq!(line(&sim), Some(template.followup[0]));
    sim.step(&interact(), 0.0);
    assert_eq!(line(&sim), Some(template.followup[1]));
    let result = sim.step(&interact(), 0.0);
    assert!(
        !result
            .events
            .iter()
            .any(|e| matches!(e.kind, SimEventKind::KeepsakeReceived { .. }))
    );
    assert_eq!(sim.player.inventory.len(), 1);
    assert_eq!(sim.world.npc_states[&npc_id].encounters, 2);
    assert!(line(&sim).is_none());
}

#[test]
fn npc_progress_survives_cull_and_save() {
    let mut sim = SimState::new("abc");
    place(&mut sim, NPC_POS);
    // Three lines of the exchange, then acknowledge the keepsake message.
    for _ in 0..4 {
        sim.step(&interact(), 0.0);
    }
    place(&mut sim, (-3000.0, 0.0));
    assert!(sim.world.npcs.iter().all(|n| n.id.as_str() != "1,0-npc"));

    let json = sim.to_json().unwrap();
    let mut sim = SimState::from_json(&json, GameConfig::default()).unwrap();
    place(&mut sim, NPC_POS);
    sim.step(&interact(), 0.0);
    assert_eq!(line(&sim), Some(TEMPLATES[1].followup[0]));
}

#[test]
fn needy_player_hears_fraying_line() {
    let mut sim = SimState::new("abc");
    place(&mut sim, NPC_POS);
    sim.player.hunger = 80.0;
    sim.step(&interact(), 0.0);
    sim.step(&interact(), 0.0);
    sim.step(&interact(), 0.0);
    assert_eq!(line(&sim), Some(scarcely_sim::dialogue::FRAYING_LINE));
}

#[test]
fn drop_then_pick_back_up() {
    let mut sim = SimState::new("abc");
    place(&mut sim, (6.0, 60.0));
    sim.step(&interact(), 0.0);
    sim.apply_action(&PlayerAction::DropItem {
        item_id: ItemId::new("0,0-item-0"),
    });
    let dropped = sim.world.items.last().unwrap().clone();
    assert_eq!(dropped.id.as_str(), "0,0-item-0-dropped-1");

    place(&mut sim, (dropped.x, dropped.y));
    sim.step(&interact(), 0.0);
    assert!(sim.player.inventory.iter().any(|i| i.id == dropped.id));
    assert_eq!(sim.player.carry_weight, 1.5);
}

#[test]
fn reference_values() {
    let mut rng = StreamRng::new(42);
    assert_eq!(rng.next_u32(), 2_581_720_956);
    assert_eq!(hash_coords("abc", 0, 0), 4_186_375_630);

    let config = GameConfig::default();
    let seed = WorldSeed::new("abc");
    let origin = generate_chunk(&seed, ChunkCoord::new(0, 0), &config);
    assert_eq!(origin.biome, Biome::Steppe);
    assert_eq!(origin.items.len(), 1);
    assert_eq!(origin.items[0].kind, ItemKind::Water);
    assert!(origin.npcs.is_empty());

    let east = generate_chunk(&seed, ChunkCoord::new(1, 0), &config);
    assert_eq!(east.npcs.len(), 1);
    assert_eq!((east.npcs[0].x, east.npcs[0].y), NPC_POS);
    assert_eq!(east.npcs[0].template, 1);
}

#[test]
fn long_walk_is_deterministic() {
    let walk = || {
        let mut sim = SimState::new("abc");
        let route = ["d", "s", "a", "w"];
        for i in 0..2000 {
            let key = route[(i / 150) % route.len()];
            let pressed: &[&str] = if i % 37 == 0 { &["e"] } else { &[] };
            sim.step(&InputFrame::from_keys([key], pressed.iter().copied()), 0.05);
            if i % 300 == 299 {
                if let Some(id) = sim.player.heaviest_item().cloned() {
                    sim.apply_action(&PlayerAction::UseItem { item_id: id });
                }
            }
        }
        sim.to_json().unwrap()
    };
    assert_eq!(walk(), walk());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn frame_from_bits(bits: u8) -> InputFrame {
    InputFrame {
        up: bits & 1 != 0,
        down: bits & 2 != 0,
        left: bits & 4 != 0,
        right: bits & 8 != 0,
        interact: bits & 16 != 0,
        toggle_backpack: false,
        close_backpack: false,
    }
}

fn rounded_sum(player: &Player) -> f64 {
    let total: f64 = player.inventory.iter().map(|i| i.weight).sum();
    ((total * 100.0).round() / 100.0).max(0.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn needs_stay_in_range(
        steps in prop::collection::vec((any::<u8>(), 0.0f64..0.5, any::<bool>()), 1..200)
    ) {
        let mut sim = SimState::new("abc");
        for (bits, dt, use_item) in steps {
            sim.step(&frame_from_bits(bits), dt);
            if use_item {
                if let Some(id) = sim.player.inventory.first().map(|i| i.id.clone()) {
                    sim.apply_action(&PlayerAction::UseItem { item_id: id });
                }
            }
            for need in [sim.player.hunger, sim.player.thirst, sim.player.warmth] {
                prop_assert!((0.0..=100.0).contains(&need), "need out of range: {need}");
            }
        }
    }

    #[test]
    fn carry_weight_is_rounded_sum(
        ops in prop::collection::vec((any::<bool>(), 0.0f64..5.0, 0usize..8), 1..60)
    ) {
        let mut player = Player::default();
        for (serial, (add, weight, pick)) in ops.into_iter().enumerate() {
            if add {
                let _ = player.add_item(InventoryItem {
                    id: ItemId::new(format!("item-{serial}")),
                    kind: ItemKind::Forage,
                    weight,
                });
            } else if let Some(id) = player.inventory.get(pick).map(|i| i.id.clone()) {
                player.remove_item(&id);
            }
            prop_assert_eq!(player.carry_weight, rounded_sum(&player));
        }
    }

    #[test]
    fn pickup_fails_iff_full(capacity in 0usize..6, attempts in 0usize..10) {
        let mut player = Player::default();
        player.max_inventory = capacity;
        for n in 0..attempts {
            let was_full = player.inventory.len() >= capacity;
            let result = player.add_item(InventoryItem {
                id: ItemId::new(format!("item-{n}")),
                kind: ItemKind::Water,
                weight: 1.5,
            });
            prop_assert_eq!(result.is_err(), was_full);
        }
        prop_assert_eq!(player.inventory.len(), attempts.min(capacity));
    }
}
