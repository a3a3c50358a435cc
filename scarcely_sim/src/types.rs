// Core types shared across the simulation.
//
// Defines chunk coordinates (`ChunkCoord`), the world seed, entity
// identifiers (string newtypes with one constructor per id source), and the
// small enums (`Biome`, `ItemKind`) that generation and the need model key
// off. All types derive `Serialize`/`Deserialize` for save/load; the JSON
// shapes match the browser build's save layout so old saves still import.
//
// Item ids come from three sources and each has a reserved shape:
// - generated: `"<cx>,<cy>-item-<i>"`
// - dropped:   `"<origin>-dropped-<serial>"` (serial is a per-save counter)
// - keepsake:  `"<npc id>-keepsake"`
//
// See also: `chunk_gen.rs` which mints generated ids, `world.rs` which owns
// the drop serial, `sim.rs` for keepsake gifting.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// Integer coordinates of a chunk in the infinite chunk grid.
///
/// Chunk `(cx, cy)` covers world space `[cx * size, (cx + 1) * size)` on X and
/// the same on Y. Ordered so it can key a `BTreeMap`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
}

impl ChunkCoord {
    pub const fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }

    /// The chunk containing world position `(x, y)`.
    pub fn containing(x: f64, y: f64, chunk_size: f64) -> Self {
        Self {
            cx: (x / chunk_size).floor() as i32,
            cy: (y / chunk_size).floor() as i32,
        }
    }

    /// Chebyshev (king-move) distance between two chunks.
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        self.cx.abs_diff(other.cx).max(self.cy.abs_diff(other.cy))
    }

    /// Parse the `"cx,cy"` key form.
    pub fn parse_key(s: &str) -> Option<Self> {
        let (cx, cy) = s.split_once(',')?;
        Some(Self {
            cx: cx.trim().parse().ok()?,
            cy: cy.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.cx, self.cy)
    }
}

// Serialized as the `"cx,cy"` string so it can be a JSON map key
// (serde_json requires string keys).
impl Serialize for ChunkCoord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChunkCoord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ChunkCoord::parse_key(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid chunk key {s:?}")))
    }
}

/// Euclidean distance between two world positions.
pub fn distance(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    (ax - bx).hypot(ay - by)
}

// ---------------------------------------------------------------------------
// World seed
// ---------------------------------------------------------------------------

/// The opaque seed all procedural generation derives from.
///
/// Stored as text. Integer seeds in a save are accepted and stringified,
/// which hashes identically to the browser build's template-string
/// conversion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WorldSeed(String);

impl WorldSeed {
    pub fn new(seed: impl Into<String>) -> Self {
        Self(seed.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for WorldSeed {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for WorldSeed {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for WorldSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for WorldSeed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Integer(i64),
        }
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(s) => Self(s),
            Repr::Integer(n) => Self(n.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Entity IDs
// ---------------------------------------------------------------------------

const DROP_MARKER: &str = "-dropped-";

/// Identifier of an item, either lying in the world or carried.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id of the `index`-th item spawned by chunk generation.
    pub fn generated(chunk: ChunkCoord, index: usize) -> Self {
        Self(format!("{chunk}-item-{index}"))
    }

    /// Id for an item the player dropped. Built from the item's origin so
    /// repeated pick-up/drop cycles do not grow the id.
    pub fn dropped(origin: &ItemId, serial: u64) -> Self {
        Self(format!("{}{DROP_MARKER}{serial}", origin.origin()))
    }

    /// Id of the keepsake an NPC gifts.
    pub fn keepsake(npc: &NpcId) -> Self {
        Self(format!("{}-keepsake", npc.as_str()))
    }

    /// True if this id was minted by a drop rather than by generation.
    pub fn is_dropped(&self) -> bool {
        self.0.contains(DROP_MARKER)
    }

    /// Numeric suffix of a dropped id. Saves from the browser build used a
    /// millisecond timestamp here.
    pub fn drop_serial(&self) -> Option<u64> {
        let (_, serial) = self.0.rsplit_once(DROP_MARKER)?;
        serial.parse().ok()
    }

    /// The id with any drop suffix removed.
    pub fn origin(&self) -> &str {
        match self.0.split_once(DROP_MARKER) {
            Some((origin, _)) => origin,
            None => &self.0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an NPC. One NPC per chunk at most, so the chunk key is
/// enough to make it unique.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NpcId(String);

impl NpcId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn for_chunk(chunk: ChunkCoord) -> Self {
        Self(format!("{chunk}-npc"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Simulation enums
// ---------------------------------------------------------------------------

/// Environmental tag of a chunk. Drives the warmth decay multiplier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Biome {
    Icy,
    Forest,
    Steppe,
}

impl Biome {
    /// Classify a `chill` draw in [0, 1).
    pub fn from_chill(chill: f64) -> Self {
        if chill > 0.65 {
            Self::Icy
        } else if chill > 0.35 {
            Self::Forest
        } else {
            Self::Steppe
        }
    }
}

/// Kind of item. Declaration order is the generation table order and must
/// not change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Forage,
    Water,
    Ember,
    Keepsake,
}

impl ItemKind {
    /// All kinds in generation table order.
    pub const ALL: [ItemKind; 4] = [
        ItemKind::Forage,
        ItemKind::Water,
        ItemKind::Ember,
        ItemKind::Keepsake,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Forage => "forage",
            Self::Water => "water",
            Self::Ember => "ember",
            Self::Keepsake => "keepsake",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_coord_containing_floors_negative_positions() {
        assert_eq!(ChunkCoord::containing(0.0, 0.0, 96.0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::containing(95.9, 96.0, 96.0), ChunkCoord::new(0, 1));
        assert_eq!(ChunkCoord::containing(-0.1, -96.0, 96.0), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::containing(-96.1, 10.0, 96.0), ChunkCoord::new(-2, 0));
    }

    #[test]
    fn chunk_coord_chebyshev_distance() {
        let a = ChunkCoord::new(0, 0);
        assert_eq!(a.chebyshev_distance(ChunkCoord::new(2, -1)), 2);
        assert_eq!(a.chebyshev_distance(ChunkCoord::new(-3, 3)), 3);
        assert_eq!(a.chebyshev_distance(a), 0);
    }

    #[test]
    fn chunk_coord_key_roundtrip() {
        let coord = ChunkCoord::new(-4, 17);
        assert_eq!(coord.to_string(), "-4,17");
        assert_eq!(ChunkCoord::parse_key("-4,17"), Some(coord));
        assert_eq!(ChunkCoord::parse_key("4;17"), None);
        assert_eq!(ChunkCoord::parse_key("a,b"), None);
    }

    #[test]
    fn chunk_coord_serializes_as_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(ChunkCoord::new(1, -2), 7u32);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"1,-2":7}"#);
        let restored: std::collections::BTreeMap<ChunkCoord, u32> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(restored[&ChunkCoord::new(1, -2)], 7);
    }

    #[test]
    fn world_seed_accepts_integers() {
        let seed: WorldSeed = serde_json::from_str("12345").unwrap();
        assert_eq!(seed.as_str(), "12345");
        let seed: WorldSeed = serde_json::from_str(r#""k3x9""#).unwrap();
        assert_eq!(seed.as_str(), "k3x9");
        assert_eq!(serde_json::to_string(&seed).unwrap(), r#""k3x9""#);
    }

    #[test]
    fn item_id_sources_do_not_collide() {
        let chunk = ChunkCoord::new(0, 0);
        let generated = ItemId::generated(chunk, 1);
        assert_eq!(generated.as_str(), "0,0-item-1");
        assert!(!generated.is_dropped());

        let dropped = ItemId::dropped(&generated, 3);
        assert_eq!(dropped.as_str(), "0,0-item-1-dropped-3");
        assert!(dropped.is_dropped());
        assert_ne!(dropped, generated);

        let keepsake = ItemId::keepsake(&NpcId::for_chunk(chunk));
        assert_eq!(keepsake.as_str(), "0,0-npc-keepsake");
    }

    #[test]
    fn dropping_twice_keeps_the_origin() {
        let generated = ItemId::generated(ChunkCoord::new(2, 3), 0);
        let once = ItemId::dropped(&generated, 1);
        let twice = ItemId::dropped(&once, 2);
        assert_eq!(twice.as_str(), "2,3-item-0-dropped-2");
        assert_eq!(twice.origin(), generated.as_str());
        assert_eq!(twice.drop_serial(), Some(2));
        assert_eq!(generated.drop_serial(), None);
        let legacy = ItemId::new("0,0-item-0-dropped-1712345678901");
        assert_eq!(legacy.drop_serial(), Some(1_712_345_678_901));
    }

    #[test]
    fn biome_thresholds() {
        assert_eq!(Biome::from_chill(0.9), Biome::Icy);
        assert_eq!(Biome::from_chill(0.65), Biome::Forest);
        assert_eq!(Biome::from_chill(0.36), Biome::Forest);
        assert_eq!(Biome::from_chill(0.35), Biome::Steppe);
        assert_eq!(Biome::from_chill(0.0), Biome::Steppe);
    }

    #[test]
    fn item_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ItemKind::Ember).unwrap(), r#""ember""#);
        let kind: ItemKind = serde_json::from_str(r#""keepsake""#).unwrap();
        assert_eq!(kind, ItemKind::Keepsake);
        assert!(ItemKind::ALL.windows(2).all(|w| w[0] < w[1]));
    }
}
