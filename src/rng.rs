//! Deterministic PRNG with named substreams.
//!
//! The generator is xorshift64*. The master run seed is split into five
//! independently-stepping substreams so that unrelated subsystems cannot
//! perturb each other's sequences: a spawn draw never shifts a choice draw.
//! Mixing streams is a determinism bug, not an optimisation.

use crate::fixed::Fx;
use serde::{Deserialize, Serialize};

const STAR_MULTIPLIER: u64 = 0x2545_F491_4F6C_DD1D;

/// Substream derivation constants, XORed into the high bits of the master seed.
const STREAM_SPAWN: u64 = 0x9E37;
const STREAM_CHOICE: u64 = 0xBB67;
const STREAM_AI: u64 = 0x85EB;
const STREAM_PHASE: u64 = 0xC2B2;
const STREAM_LOOT: u64 = 0x27D4;

/// xorshift64* generator. State must never be zero; a zero seed is remapped
/// to a fixed odd constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    pub fn seeded(seed: u64) -> Self {
        XorShift64 {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(STAR_MULTIPLIER)
    }

    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform draw in `[lo, hi)`. Returns `lo` when the range is empty.
    /// Modulo reduction: the tiny bias is irrelevant next to the requirement
    /// that every implementation consume exactly one draw here.
    pub fn next_range(&mut self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            return lo;
        }
        lo + self.next_u32() % (hi - lo)
    }

    /// Q16.16 draw in `[0, 1)`: the low 16 bits of one `next_u32`.
    pub fn next_fixed_01(&mut self) -> Fx {
        Fx((self.next_u32() & 0xFFFF) as i32)
    }

    pub fn state(&self) -> u64 {
        self.state
    }

    pub fn set_state(&mut self, state: u64) {
        self.state = if state == 0 { 0x9E37_79B9_7F4A_7C15 } else { state };
    }
}

/// The five named substreams owned by the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substreams {
    pub spawn: XorShift64,
    pub choice: XorShift64,
    pub ai: XorShift64,
    pub phase: XorShift64,
    pub loot: XorShift64,
}

impl Substreams {
    pub fn from_master(seed: u64) -> Self {
        Substreams {
            spawn: XorShift64::seeded(seed ^ (STREAM_SPAWN << 48)),
            choice: XorShift64::seeded(seed ^ (STREAM_CHOICE << 48)),
            ai: XorShift64::seeded(seed ^ (STREAM_AI << 48)),
            phase: XorShift64::seeded(seed ^ (STREAM_PHASE << 48)),
            loot: XorShift64::seeded(seed ^ (STREAM_LOOT << 48)),
        }
    }
}
