// Input and commands that drive the simulation.
//
// Two kinds of external input reach the sim:
// - `InputFrame`: sampled once per step by the host and passed to
//   `SimState::step()`. Directions are held state; `interact`,
//   `toggle_backpack`, and `close_backpack` are one-shots the host sets for
//   exactly one frame.
// - `PlayerAction`: discrete inventory commands from the backpack UI, applied
//   between steps with `SimState::apply_action()`.
//
// `InputFrame::from_keys()` maps lowercase key identifiers (`w/a/s/d`,
// arrow keys, `e`/`enter`, `b`, `escape`) so hosts need no key table of
// their own. Screen-space convention: up is negative Y.
//
// See also: `sim.rs` for `step()` and `apply_action()`, `types.rs` for the ID
// types used here.

use crate::types::ItemId;
use serde::{Deserialize, Serialize};

/// One frame of player input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub interact: bool,
    pub toggle_backpack: bool,
    pub close_backpack: bool,
}

impl InputFrame {
    /// Build a frame from the keys currently held and the keys pressed since
    /// the last frame. Unknown keys are ignored; matching is
    /// case-insensitive.
    pub fn from_keys<'a>(
        held: impl IntoIterator<Item = &'a str>,
        pressed: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut frame = Self::default();
        for key in held {
            match key.to_ascii_lowercase().as_str() {
                "w" | "arrowup" => frame.up = true,
                "s" | "arrowdown" => frame.down = true,
                "a" | "arrowleft" => frame.left = true,
                "d" | "arrowright" => frame.right = true,
                _ => {}
            }
        }
        for key in pressed {
            match key.to_ascii_lowercase().as_str() {
                "e" | "enter" => frame.interact = true,
                "b" => frame.toggle_backpack = true,
                "escape" => frame.close_backpack = true,
                _ => {}
            }
        }
        frame
    }

    /// Movement direction with unit length, or `(0, 0)` when idle.
    /// Opposite keys cancel.
    pub fn direction(&self) -> (f64, f64) {
        let dx = f64::from(i8::from(self.right) - i8::from(self.left));
        let dy = f64::from(i8::from(self.down) - i8::from(self.up));
        if dx == 0.0 && dy == 0.0 {
            return (0.0, 0.0);
        }
        let length = dx.hypot(dy);
        (dx / length, dy / length)
    }
}

/// Inventory commands issued from the backpack UI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Consume an item, applying its need deltas.
    UseItem { item_id: ItemId },
    /// Put an item on the ground near the player.
    DropItem { item_id: ItemId },
    /// Set (or clear) the backpack selection.
    SelectItem { item_id: Option<ItemId> },
    /// Use the selected item, then clear the selection.
    UseSelected,
    /// Drop the selected item, then clear the selection.
    DropSelected,
    ToggleBackpack,
    CloseBackpack,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_frame() {
        let frame = InputFrame::from_keys(["w", "ArrowRight", "q"], ["Enter"]);
        assert!(frame.up && frame.right);
        assert!(!frame.down && !frame.left);
        assert!(frame.interact);
        assert!(!frame.toggle_backpack && !frame.close_backpack);

        let frame = InputFrame::from_keys([], ["b", "Escape"]);
        assert!(frame.toggle_backpack && frame.close_backpack);
    }

    #[test]
    fn held_interact_key_is_not_a_press() {
        let frame = InputFrame::from_keys(["e"], []);
        assert!(!frame.interact);
    }

    #[test]
    fn diagonal_direction_is_normalized() {
        let frame = InputFrame::from_keys(["a", "s"], []);
        let (dx, dy) = frame.direction();
        assert!((dx.hypot(dy) - 1.0).abs() < 1e-12);
        assert!(dx < 0.0 && dy > 0.0);
    }

    #[test]
    fn opposite_keys_cancel() {
        let frame = InputFrame::from_keys(["a", "d", "w"], []);
        assert_eq!(frame.direction(), (0.0, -1.0));
        assert_eq!(InputFrame::default().direction(), (0.0, 0.0));
    }

    #[test]
    fn action_serialization_roundtrip() {
        let action = PlayerAction::SelectItem {
            item_id: Some(ItemId::new("0,0-item-0")),
        };
        let json = serde_json::to_string(&action).unwrap();
        let restored: PlayerAction = serde_json::from_str(&json).unwrap();
        assert_eq!(action, restored);
    }
}
