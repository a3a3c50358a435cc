// Deterministic, portable pseudo-random number generator.
//
// Implements Mulberry32, a 32-bit-state mixing generator, plus the
// coordinate seed hash that turns `(world seed, cx, cy)` into a per-chunk
// stream. Hand-rolled so every platform produces the exact same sequence,
// and so worlds saved by the original browser build regenerate identically.
//
// This crate is the single PRNG used across Scarcely: `scarcely_sim` draws
// every chunk from a fresh `StreamRng` keyed by coordinates, and keeps one
// long-lived session stream for non-generation randomness (drop offsets).
//
// **Critical constraint: determinism.** The generator state is a single
// `u32` advanced with wrapping integer arithmetic only. The float output is
// a pure function of the post-mix integer. Do not introduce floating-point
// accumulation into the state, and do not change the draw order of callers
// without accepting that every existing world changes shape.

use serde::{Deserialize, Serialize};

/// Additive constant of the Mulberry32 Weyl sequence.
const WEYL_INCREMENT: u32 = 0x6d2b_79f5;

/// Initial basis of the coordinate hash (before mixing in the length).
const HASH_BASIS: u32 = 1_779_033_703;

/// Per-character multiplier of the coordinate hash.
const HASH_MULTIPLIER: u32 = 3_432_918_353;

/// Mulberry32 PRNG. Infinite, small-state, and not rewindable: the only way
/// to replay a stream is to construct a new one from the same seed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRng {
    state: u32,
}

impl StreamRng {
    /// Create a stream from a raw 32-bit seed.
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Create the stream for one chunk of a world.
    ///
    /// Equivalent to `StreamRng::new(hash_coords(seed, x, y))`.
    pub fn for_coords(seed: &str, x: i32, y: i32) -> Self {
        Self::new(hash_coords(seed, x, y))
    }

    /// Generate the next `u32` in the sequence.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(WEYL_INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Generate a uniform `f64` in [0, 1).
    ///
    /// The full 32-bit output divided by 2^32, so every value is exactly
    /// representable and the mapping is platform-independent.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Pick a uniform index into a table of `len` entries: `floor(r * len)`.
    ///
    /// Panics if `len == 0`.
    pub fn pick_index(&mut self, len: usize) -> usize {
        assert!(len > 0, "pick_index: table must not be empty");
        let idx = (self.next_f64() * len as f64).floor() as usize;
        // r < 1 guarantees idx < len; clamp anyway for huge tables where
        // the float product rounds up.
        idx.min(len - 1)
    }

    /// Draw once and return `true` if the draw is strictly above `threshold`.
    pub fn exceeds(&mut self, threshold: f64) -> bool {
        self.next_f64() > threshold
    }
}

/// Hash a world seed and chunk coordinates into a 32-bit stream seed.
///
/// The key string is `"<seed>:<x>:<y>"`. Each UTF-16 code unit is folded in
/// with a multiply and a 13-bit rotate, so the hash is order-sensitive and
/// adjacent coordinates land on unrelated seeds.
pub fn hash_coords(seed: &str, x: i32, y: i32) -> u32 {
    let key = format!("{seed}:{x}:{y}");
    let units: Vec<u16> = key.encode_utf16().collect();
    let mut h = HASH_BASIS ^ units.len() as u32;
    for unit in units {
        h = (h ^ u32::from(unit)).wrapping_mul(HASH_MULTIPLIER);
        h = h.rotate_left(13);
    }
    h
}
