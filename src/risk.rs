//! Risk-phase curses and their run-wide multipliers.
//!
//! Curses exist only while the Risk phase is live. Their intensities feed a
//! single risk multiplier (gold up, enemy damage up) plus per-curse debuffs
//! the rest of the simulation reads through the getters here, so curse
//! coupling stays in one place.

use crate::balance;
use crate::enums::CurseKind;
use crate::fixed::Fx;
use crate::rng::XorShift64;
use serde::{Deserialize, Serialize};

pub const MAX_CURSES: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurseSlot {
    pub active: bool,
    pub kind: CurseKind,
    pub intensity: Fx,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskState {
    pub curses: [CurseSlot; MAX_CURSES],
    pub risk_level: Fx,
    pub elite_active: bool,
    /// Base gold earned during the phase; the risk bonus settles on exit.
    pub phase_gold: i32,
}

impl RiskState {
    /// Draw 1–3 curses on Risk entry. PHASE substream only.
    pub fn enter(&mut self, risk_level: Fx, phase_rng: &mut XorShift64) {
        *self = RiskState {
            risk_level,
            ..RiskState::default()
        };
        let count = phase_rng.next_range(1, MAX_CURSES as u32 + 1) as usize;
        for slot in self.curses.iter_mut().take(count) {
            let kind = CurseKind::from_u8(phase_rng.next_range(0, 5) as u8);
            // Intensity in [0.3, 1.0], scaled toward 1 by the risk level.
            let base = Fx::milli(300) + phase_rng.next_fixed_01() * Fx::milli(400);
            *slot = CurseSlot {
                active: true,
                kind,
                intensity: (base + risk_level * Fx::milli(300)).clamp01(),
            };
        }
        // The elite flag rides the same stream: likelier at higher risk.
        self.elite_active = phase_rng.next_fixed_01() < Fx::milli(300) + risk_level * Fx::milli(400);
        log::debug!(
            "risk entered: {} curses, elite={}",
            count,
            self.elite_active
        );
    }

    /// Leave the Risk phase: curses dissipate, multipliers return to 1.
    pub fn clear(&mut self) {
        *self = RiskState::default();
    }

    /// Note base gold earned while the phase runs.
    pub fn record_gold(&mut self, amount: i32) {
        self.phase_gold = self.phase_gold.saturating_add(amount.max(0));
    }

    /// Settle the phase's gold bonus: `phase_gold · (multiplier − 1)`,
    /// halved for an escape. Consumes the tracked gold.
    pub fn settle_bonus(&mut self, halved: bool) -> i32 {
        let mut bonus_mult = self.risk_multiplier() - Fx::ONE;
        if halved {
            bonus_mult = bonus_mult * Fx::HALF;
        }
        let bonus = (Fx::int(self.phase_gold) * bonus_mult).floor_int();
        self.phase_gold = 0;
        bonus.max(0)
    }

    fn intensity_of(&self, kind: CurseKind) -> Fx {
        self.curses
            .iter()
            .filter(|c| c.active && c.kind == kind)
            .fold(Fx::ZERO, |acc, c| acc + c.intensity)
    }

    fn total_intensity(&self) -> Fx {
        self.curses
            .iter()
            .filter(|c| c.active)
            .fold(Fx::ZERO, |acc, c| acc + c.intensity)
    }

    /// `1 + 0.5·Σ intensities`, applied to enemy damage live and to gold at
    /// settlement.
    pub fn risk_multiplier(&self) -> Fx {
        Fx::ONE + balance::CURSE_RISK_MULT_STEP * self.total_intensity()
    }

    /// Enemy damage is scaled up while curses run.
    pub fn enemy_damage_mult(&self) -> Fx {
        self.risk_multiplier()
    }

    /// Weakness: the player hits softer.
    pub fn player_damage_mult(&self) -> Fx {
        (Fx::ONE - self.intensity_of(CurseKind::Weakness) * Fx::milli(300)).max(Fx::milli(100))
    }

    /// Fragility: the player bruises easier.
    pub fn player_damage_taken_mult(&self) -> Fx {
        Fx::ONE + self.intensity_of(CurseKind::Fragility) * Fx::HALF
    }

    /// Exhaustion: stamina trickles back.
    pub fn stamina_regen_mult(&self) -> Fx {
        (Fx::ONE - self.intensity_of(CurseKind::Exhaustion) * Fx::HALF).max(Fx::milli(100))
    }

    /// Slowness: walk speed drops.
    pub fn player_speed_mult(&self) -> Fx {
        (Fx::ONE - self.intensity_of(CurseKind::Slowness) * Fx::milli(300)).max(Fx::milli(100))
    }

    /// Blindness: effective weapon reach shrinks.
    pub fn player_reach_mult(&self) -> Fx {
        (Fx::ONE - self.intensity_of(CurseKind::Blindness) * Fx::milli(200)).max(Fx::milli(100))
    }

    pub fn active_curse_count(&self) -> usize {
        self.curses.iter().filter(|c| c.active).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_draws_one_to_three_curses() {
        for seed in 0..20 {
            let mut rng = XorShift64::seeded(seed);
            let mut r = RiskState::default();
            r.enter(Fx::HALF, &mut rng);
            let n = r.active_curse_count();
            assert!((1..=3).contains(&n), "curse count {}", n);
            for c in r.curses.iter().filter(|c| c.active) {
                assert!(c.intensity > Fx::ZERO && c.intensity <= Fx::ONE);
            }
        }
    }

    #[test]
    fn multiplier_tracks_intensities() {
        let mut r = RiskState::default();
        assert_eq!(r.risk_multiplier(), Fx::ONE);
        r.curses[0] = CurseSlot {
            active: true,
            kind: CurseKind::Weakness,
            intensity: Fx::ONE,
        };
        assert_eq!(r.risk_multiplier(), Fx::ONE + Fx::HALF);
        assert!(r.player_damage_mult() < Fx::ONE);
        // An unrelated curse does not touch other getters.
        assert_eq!(r.player_speed_mult(), Fx::ONE);
    }

    #[test]
    fn settlement_pays_the_risk_bonus() {
        let mut r = RiskState::default();
        r.curses[0] = CurseSlot {
            active: true,
            kind: CurseKind::Slowness,
            intensity: Fx::ONE,
        };
        r.record_gold(40);
        let mut escaped = r;
        // Full settlement: 40 · 0.5 = 20. Escape keeps half of that.
        assert_eq!(r.settle_bonus(false), 20);
        assert_eq!(escaped.settle_bonus(true), 10);
        // Settlement consumes the tracked gold.
        assert_eq!(r.settle_bonus(false), 0);
    }

    #[test]
    fn clear_resets_everything() {
        let mut rng = XorShift64::seeded(4);
        let mut r = RiskState::default();
        r.enter(Fx::ONE, &mut rng);
        r.clear();
        assert_eq!(r, RiskState::default());
    }
}
