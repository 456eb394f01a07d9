//! Buffered player input.
//!
//! The façade writes into `pending` at any time between `update` calls; the
//! tick latches `pending` into `current` at step 1 of the tick order, so a
//! whole tick sees one coherent input frame. `previous` exists for edge
//! detection (attack and roll trigger on press, not on hold).

use crate::fixed::Fx;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    pub move_x: Fx,
    pub move_y: Fx,
    pub rolling: bool,
    pub jumping: bool,
    pub light_attack: bool,
    pub heavy_attack: bool,
    pub blocking: bool,
    pub special: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    pub pending: InputFrame,
    pub current: InputFrame,
    pub previous: InputFrame,
}

impl InputState {
    /// Step 1 of the tick order: apply buffered input.
    pub fn latch(&mut self) {
        self.previous = self.current;
        self.current = self.pending;
    }

    pub fn light_pressed(&self) -> bool {
        self.current.light_attack && !self.previous.light_attack
    }

    pub fn heavy_pressed(&self) -> bool {
        self.current.heavy_attack && !self.previous.heavy_attack
    }

    pub fn roll_pressed(&self) -> bool {
        self.current.rolling && !self.previous.rolling
    }

    pub fn jump_pressed(&self) -> bool {
        self.current.jumping && !self.previous.jumping
    }

    pub fn block_pressed(&self) -> bool {
        self.current.blocking && !self.previous.blocking
    }

    pub fn special_pressed(&self) -> bool {
        self.current.special && !self.previous.special
    }

    pub fn special_released(&self) -> bool {
        !self.current.special && self.previous.special
    }

    /// Movement axis clamped to the unit box; diagonals are normalised by the
    /// consumer so axis magnitudes stay raw here.
    pub fn move_axis(&self) -> (Fx, Fx) {
        (
            self.current.move_x.clamp(-Fx::ONE, Fx::ONE),
            self.current.move_y.clamp(-Fx::ONE, Fx::ONE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_moves_pending_to_current() {
        let mut s = InputState::default();
        s.pending.light_attack = true;
        assert!(!s.light_pressed());
        s.latch();
        assert!(s.light_pressed());
        // Held across a second latch: no longer an edge.
        s.latch();
        assert!(!s.light_pressed());
    }

    #[test]
    fn release_edge_detected() {
        let mut s = InputState::default();
        s.pending.special = true;
        s.latch();
        assert!(s.special_pressed());
        s.pending.special = false;
        s.latch();
        assert!(s.special_released());
    }
}
