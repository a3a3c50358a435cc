// Dialogue: NPC line selection, the active dialogue, and system messages.
//
// At most one `ActiveDialogue` is live at a time (held by `World`). It is
// either a `SystemMessage` that expires when its ttl runs out, or an
// `NpcExchange` that only moves when the player interacts. Queueing a new
// message or starting an exchange replaces whatever was live.
//
// Line selection is pure: `npc_lines()` picks the template's intro lines on
// the first meeting and its followup lines afterwards, then appends the
// fraying line when the player's worst need is above the needy threshold.
// Completing an exchange runs the encounter outcome in `sim.rs`.
//
// Saves written by the browser build stored the dialogue as
// `{npcId, lines, index, timer}`; `deserialize_lenient` accepts that shape
// and anything unrecognized loads as no dialogue.
//
// See also: `sim.rs` for `queue_message()` and encounter outcomes,
// `world.rs` for `NpcState`, `snapshot.rs` for the prompt hints.

use crate::types::NpcId;
use crate::world::NpcState;
use serde::{Deserialize, Deserializer, Serialize};
use smallvec::SmallVec;

// ---------------------------------------------------------------------------
// Content tables
// ---------------------------------------------------------------------------

/// Lines spoken by one kind of NPC.
#[derive(Clone, Copy, Debug)]
pub struct DialogueTemplate {
    pub intro: [&'static str; 2],
    pub followup: [&'static str; 2],
}

pub static TEMPLATES: [DialogueTemplate; 3] = [
    DialogueTemplate {
        intro: [
            "\"I keep moving so the cold never catches me.\"",
            "\"Your pack looks heavy. Let your thoughts stay light.\"",
        ],
        followup: [
            "\"We trade warmth for distance. Choose which you need.\"",
            "\"Breath slow. Weight feels lighter when you remember you chose to carry it.\"",
        ],
    },
    DialogueTemplate {
        intro: [
            "\"Silence is the only predator here.\"",
            "\"Listen. Even the wind tells you when to stop and rest.\"",
        ],
        followup: [
            "\"I dropped everything once. Found I only missed the conversations.\"",
            "\"Carry a keepsake. Not for need, but for courage.\"",
        ],
    },
    DialogueTemplate {
        intro: [
            "\"I mark my path by kindness shared.\"",
            "\"Take this story, lighter than food, warmer than fire.\"",
        ],
        followup: [
            "\"Stories travel farther than feet. Leave one with someone else.\"",
            "\"You look tired. Set something down before it sets you down.\"",
        ],
    },
];

/// Appended to an NPC's lines when the player is close to breaking.
pub const FRAYING_LINE: &str = "\"You're fraying. Eat, sip, warm. Your feet will follow.\"";

pub const LISTEN_PROMPT: &str = "Tap E or Enter to listen on";
pub const CONTINUE_PROMPT: &str = "Tap E or Enter to continue";

/// Fixed system message texts.
pub mod messages {
    pub const BACKPACK_FULL: &str = "Backpack is stuffed. Drop something first.";
    pub const PACKED: &str = "Packed away. Heavier already.";
    pub const USED: &str = "You feel lighter for a moment.";
    pub const DROPPED: &str = "It thuds softly onto the ground.";
    pub const COLLAPSED: &str = "Your body quits. The world narrows to breath and cold.";
    pub const RECOVERED: &str = "You come to, aching but alive.";
    pub const KEEPSAKE: &str = "They press a keepsake into your palm.";
}

/// The template at `index`, or template 0 when out of range.
pub fn template_for(index: usize) -> &'static DialogueTemplate {
    TEMPLATES.get(index).unwrap_or(&TEMPLATES[0])
}

/// Line list of a dialogue. Exchanges hold two or three lines.
pub type DialogueLines = SmallVec<[String; 3]>;

/// The lines an NPC speaks in its next exchange.
pub fn npc_lines(
    template: usize,
    state: &NpcState,
    worst_need: f64,
    needy_threshold: f64,
) -> DialogueLines {
    let template = template_for(template);
    let base = if state.encounters > 0 {
        &template.followup
    } else {
        &template.intro
    };
    let mut lines: DialogueLines = base.iter().map(|line| line.to_string()).collect();
    if worst_need > needy_threshold {
        lines.push(FRAYING_LINE.to_string());
    }
    lines
}

// ---------------------------------------------------------------------------
// ActiveDialogue
// ---------------------------------------------------------------------------

/// Result of advancing a dialogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the next line.
    Continued,
    /// Was on its last line; the caller should clear it.
    Finished,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ActiveDialogue {
    /// Transient notice with a countdown in seconds.
    SystemMessage { text: String, ttl: f64 },
    /// Conversation with an NPC, advanced one line per interact.
    NpcExchange {
        #[serde(rename = "npcId")]
        npc_id: NpcId,
        lines: DialogueLines,
        #[serde(default)]
        index: usize,
    },
}

impl ActiveDialogue {
    pub fn system(text: impl Into<String>, ttl: f64) -> Self {
        Self::SystemMessage {
            text: text.into(),
            ttl,
        }
    }

    pub fn exchange(npc_id: NpcId, lines: DialogueLines) -> Self {
        Self::NpcExchange {
            npc_id,
            lines,
            index: 0,
        }
    }

    /// The line currently on screen.
    pub fn current_line(&self) -> &str {
        match self {
            Self::SystemMessage { text, .. } => text,
            Self::NpcExchange { lines, index, .. } => {
                lines.get(*index).map_or("", String::as_str)
            }
        }
    }

    /// Input hint shown under the line.
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::SystemMessage { .. } => CONTINUE_PROMPT,
            Self::NpcExchange { .. } => LISTEN_PROMPT,
        }
    }

    pub fn npc_id(&self) -> Option<&NpcId> {
        match self {
            Self::SystemMessage { .. } => None,
            Self::NpcExchange { npc_id, .. } => Some(npc_id),
        }
    }

    /// Move to the next line. A system message has one line, so advancing
    /// it always finishes.
    pub fn advance(&mut self) -> Advance {
        match self {
            Self::SystemMessage { .. } => Advance::Finished,
            Self::NpcExchange { lines, index, .. } => {
                if *index + 1 < lines.len() {
                    *index += 1;
                    Advance::Continued
                } else {
                    Advance::Finished
                }
            }
        }
    }

    /// Count a system message's ttl down by `dt`. Returns `true` once it has
    /// expired. Exchanges never expire.
    pub fn tick(&mut self, dt: f64) -> bool {
        match self {
            Self::SystemMessage { ttl, .. } => {
                *ttl -= dt;
                *ttl <= 0.0
            }
            Self::NpcExchange { .. } => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient loading
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LegacyDialogue {
    #[serde(rename = "npcId", default)]
    npc_id: Option<NpcId>,
    #[serde(default)]
    lines: Vec<String>,
    #[serde(default)]
    index: usize,
    #[serde(default)]
    timer: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DialogueRepr {
    Current(ActiveDialogue),
    Legacy(LegacyDialogue),
    Unrecognized(#[allow(dead_code)] serde_json::Value),
}

impl DialogueRepr {
    fn into_dialogue(self) -> Option<ActiveDialogue> {
        match self {
            Self::Current(dialogue) => Some(dialogue),
            Self::Legacy(legacy) => {
                let last = legacy.lines.len().checked_sub(1)?;
                let index = legacy.index.min(last);
                Some(match legacy.npc_id {
                    Some(npc_id) => ActiveDialogue::NpcExchange {
                        npc_id,
                        lines: legacy.lines.into_iter().collect(),
                        index,
                    },
                    // A legacy message without a timer expires on the next
                    // step.
                    None => ActiveDialogue::SystemMessage {
                        text: legacy.lines.into_iter().nth(index)?,
                        ttl: legacy.timer.unwrap_or(0.0),
                    },
                })
            }
            Self::Unrecognized(_) => None,
        }
    }
}

/// Deserialize an optional dialogue in either the current or the browser
/// build's shape. Never fails on an object; malformed dialogues load as
/// `None`.
pub(crate) fn deserialize_lenient<'de, D>(
    deserializer: D,
) -> Result<Option<ActiveDialogue>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<DialogueRepr>::deserialize(deserializer)?;
    Ok(repr.and_then(DialogueRepr::into_dialogue))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn met(encounters: u32) -> NpcState {
        NpcState {
            encounters,
            gifted: encounters > 0,
        }
    }

    #[test]
    fn first_meeting_uses_intro() {
        let lines = npc_lines(1, &met(0), 10.0, 70.0);
        assert_eq!(lines.as_slice(), TEMPLATES[1].intro);
        assert!(!lines.spilled());
    }

    #[test]
    fn later_meetings_use_followup() {
        let lines = npc_lines(2, &met(3), 10.0, 70.0);
        assert_eq!(lines.as_slice(), TEMPLATES[2].followup);
    }

    #[test]
    fn needy_player_hears_fraying_line() {
        let lines = npc_lines(0, &met(0), 70.5, 70.0);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], FRAYING_LINE);
        // Exactly at the threshold is not needy.
        assert_eq!(npc_lines(0, &met(0), 70.0, 70.0).len(), 2);
    }

    #[test]
    fn out_of_range_template_falls_back() {
        let lines = npc_lines(9, &met(0), 0.0, 70.0);
        assert_eq!(lines.as_slice(), TEMPLATES[0].intro);
    }

    #[test]
    fn exchange_advances_to_finish() {
        let lines = npc_lines(0, &met(0), 0.0, 70.0);
        let mut dialogue = ActiveDialogue::exchange(NpcId::new("1,0-npc"), lines);
        assert_eq!(dialogue.current_line(), TEMPLATES[0].intro[0]);
        assert_eq!(dialogue.prompt(), LISTEN_PROMPT);
        assert_eq!(dialogue.advance(), Advance::Continued);
        assert_eq!(dialogue.current_line(), TEMPLATES[0].intro[1]);
        assert_eq!(dialogue.advance(), Advance::Finished);
        assert_eq!(dialogue.npc_id().map(NpcId::as_str), Some("1,0-npc"));
    }

    #[test]
    fn system_message_expires() {
        let mut dialogue = ActiveDialogue::system(messages::PACKED, 4.0);
        assert_eq!(dialogue.prompt(), CONTINUE_PROMPT);
        assert!(!dialogue.tick(3.0));
        assert!(dialogue.tick(1.0));
        assert_eq!(dialogue.advance(), Advance::Finished);
    }

    #[test]
    fn exchange_never_expires() {
        let lines = npc_lines(0, &met(0), 0.0, 70.0);
        let mut dialogue = ActiveDialogue::exchange(NpcId::new("n"), lines);
        assert!(!dialogue.tick(1000.0));
    }

    #[test]
    fn serialization_roundtrip() {
        let lines = npc_lines(1, &met(0), 80.0, 70.0);
        let dialogue = ActiveDialogue::exchange(NpcId::new("1,0-npc"), lines);
        let json = serde_json::to_string(&dialogue).unwrap();
        assert!(json.contains(r#""kind":"npcExchange""#));
        assert!(json.contains(r#""npcId":"1,0-npc""#));
        let restored: ActiveDialogue = serde_json::from_str(&json).unwrap();
        assert_eq!(dialogue, restored);
    }

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "deserialize_lenient")]
        dialogue: Option<ActiveDialogue>,
    }

    fn lenient(json: &str) -> Option<ActiveDialogue> {
        serde_json::from_str::<Holder>(json).unwrap().dialogue
    }

    #[test]
    fn lenient_accepts_current_shape() {
        let loaded = lenient(r#"{"dialogue":{"kind":"systemMessage","text":"hi","ttl":2.5}}"#);
        assert_eq!(loaded, Some(ActiveDialogue::system("hi", 2.5)));
    }

    #[test]
    fn lenient_accepts_legacy_shapes() {
        let message =
            lenient(r#"{"dialogue":{"npcId":null,"lines":["Packed away."],"index":0,"timer":1.5}}"#);
        assert_eq!(message, Some(ActiveDialogue::system("Packed away.", 1.5)));

        let exchange = lenient(r#"{"dialogue":{"npcId":"1,0-npc","lines":["a","b"],"index":1}}"#);
        assert_eq!(
            exchange,
            Some(ActiveDialogue::NpcExchange {
                npc_id: NpcId::new("1,0-npc"),
                lines: ["a", "b"].into_iter().map(String::from).collect(),
                index: 1,
            })
        );
    }

    #[test]
    fn lenient_drops_garbage() {
        assert_eq!(lenient(r#"{"dialogue":null}"#), None);
        assert_eq!(lenient(r#"{}"#), None);
        assert_eq!(lenient(r#"{"dialogue":{"lines":[]}}"#), None);
        assert_eq!(lenient(r#"{"dialogue":42}"#), None);
    }
}
