// Item kind data: per-kind weight and need effect.
//
// All gameplay differences between item kinds are expressed as data in
// `ItemKindData`, keyed by `ItemKind` in the game config. Inventory and world
// items carry their own `weight` copied at spawn time, so editing the table
// only affects items spawned afterwards.
//
// See also: `config.rs` where the item table lives, `player.rs` which applies
// `NeedDeltas` on use, `types.rs` for the `ItemKind` enum.

use serde::{Deserialize, Serialize};

/// Signed change applied to each need when an item is used. Absent fields
/// are zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedDeltas {
    pub hunger: f64,
    pub thirst: f64,
    pub warmth: f64,
}

/// Data-driven parameters for one item kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemKindData {
    /// Weight added to the player's carry weight per item.
    pub weight: f64,

    /// Need change applied when the item is used.
    #[serde(default)]
    pub effect: NeedDeltas,
}
