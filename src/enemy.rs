//! Wolf data model.
//!
//! Enemies live in a fixed 32-slot arena; cross-references (pack membership,
//! plan targets) are slot indices, never pointers, so the whole array
//! serialises as a flat blob. Behaviour lives in `ai`; this module is the
//! state itself plus spawn/bookkeeping helpers.

use crate::balance;
use crate::enums::{modifiers, Emotion, PackRole, WolfKind, WolfState};
use crate::fixed::{Fx, Vec2};
use crate::rng::XorShift64;
use serde::{Deserialize, Serialize};

pub const MAX_ENEMIES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub alive: bool,
    /// Frames to hold a freed slot before reuse.
    pub corpse_cooldown: u8,
    pub kind: WolfKind,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Impulse velocity from hits and collisions; decays each tick and is
    /// added on top of whatever the FSM steers.
    pub knockback_vel: Vec2,
    pub facing: Vec2,
    pub health: Fx,
    pub max_health: Fx,
    pub stamina: Fx,
    pub damage: Fx,
    pub speed: Fx,
    pub detection_range: Fx,
    pub attack_range: Fx,
    pub state: WolfState,
    pub role: PackRole,
    pub emotion: Emotion,
    /// Seconds remaining in the current state.
    pub state_timer: Fx,
    pub attack_cooldown: Fx,
    /// True once the current Attack state's execute point has fired.
    pub attack_done: bool,
    // Attributes, drawn once at spawn.
    pub aggression: Fx,
    pub intelligence: Fx,
    pub coordination: Fx,
    pub morale: Fx,
    pub awareness: Fx,
    // Memory.
    pub player_speed_estimate: Fx,
    pub last_block_time: Fx,
    pub last_roll_time: Fx,
    pub successful_attacks: u32,
    pub failed_attacks: u32,
    /// 0 = lone wolf, otherwise 1-based pack id.
    pub pack_id: u8,
    pub pack_index: u8,
    pub fatigue: Fx,
    /// Escalation modifier bits (`enums::modifiers`).
    pub modifiers: u32,
    /// Animation scalar read by renderers; 1.0 at rest.
    pub body_stretch: Fx,
    /// Wander direction, resampled on Idle/Patrol entry.
    pub wander: Vec2,
    /// Pack plan movement target, valid while `has_plan_target`.
    pub plan_target: Vec2,
    pub has_plan_target: bool,
}

impl Default for Enemy {
    fn default() -> Self {
        Enemy {
            id: 0,
            alive: false,
            corpse_cooldown: 0,
            kind: WolfKind::Normal,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            knockback_vel: Vec2::ZERO,
            facing: Vec2::new(Fx::ONE, Fx::ZERO),
            health: Fx::ZERO,
            max_health: Fx::ZERO,
            stamina: Fx::ZERO,
            damage: Fx::ZERO,
            speed: Fx::ZERO,
            detection_range: Fx::ZERO,
            attack_range: Fx::ZERO,
            state: WolfState::Idle,
            role: PackRole::None,
            emotion: Emotion::Calm,
            state_timer: Fx::ZERO,
            attack_cooldown: Fx::ZERO,
            attack_done: false,
            aggression: Fx::ZERO,
            intelligence: Fx::ZERO,
            coordination: Fx::ZERO,
            morale: Fx::ZERO,
            awareness: Fx::ZERO,
            player_speed_estimate: Fx::ZERO,
            last_block_time: Fx::int(10),
            last_roll_time: Fx::int(10),
            successful_attacks: 0,
            failed_attacks: 0,
            pack_id: 0,
            pack_index: 0,
            fatigue: Fx::ZERO,
            modifiers: 0,
            body_stretch: Fx::ONE,
            wander: Vec2::ZERO,
            plan_target: Vec2::ZERO,
            has_plan_target: false,
        }
    }
}

impl Enemy {
    /// Materialise a wolf of `kind` at `pos`. Attribute draws come from the
    /// SPAWN substream only; ranges per the balance contract:
    /// aggression [0.3, 0.7], intelligence [0.4, 0.8], coordination [0.5, 0.8].
    pub fn spawned(id: u32, kind: WolfKind, pos: Vec2, spawn_rng: &mut XorShift64) -> Enemy {
        let row = balance::wolf_row(kind);
        let aggression = Fx::milli(300) + spawn_rng.next_fixed_01() * Fx::milli(400);
        let intelligence = Fx::milli(400) + spawn_rng.next_fixed_01() * Fx::milli(400);
        let coordination = Fx::milli(500) + spawn_rng.next_fixed_01() * Fx::milli(300);
        Enemy {
            id,
            alive: true,
            kind,
            pos,
            health: row.health,
            max_health: row.health,
            stamina: row.stamina,
            damage: row.damage,
            speed: row.speed,
            detection_range: row.detection_range,
            attack_range: row.attack_range,
            aggression,
            intelligence,
            coordination,
            morale: Fx::milli(700),
            ..Enemy::default()
        }
    }

    pub fn health_fraction(&self) -> Fx {
        if self.max_health.is_zero() {
            Fx::ZERO
        } else {
            self.health / self.max_health
        }
    }

    pub fn success_rate(&self) -> Fx {
        let total = self.successful_attacks + self.failed_attacks;
        if total == 0 {
            Fx::ZERO
        } else {
            Fx::from_ratio(self.successful_attacks as i32, total as i32)
        }
    }

    /// Detection range after emotion modifiers (Fearful wolves watch wider).
    pub fn eff_detection_range(&self) -> Fx {
        match self.emotion {
            Emotion::Fearful => self.detection_range * Fx::milli(1300),
            _ => self.detection_range,
        }
    }

    pub fn eff_attack_range(&self) -> Fx {
        match self.emotion {
            Emotion::Fearful => self.attack_range * Fx::milli(700),
            _ => self.attack_range,
        }
    }

    pub fn eff_speed(&self) -> Fx {
        let base = if self.modifiers & modifiers::SWIFT != 0 {
            self.speed * Fx::milli(1300)
        } else {
            self.speed
        };
        // Fatigue bleeds up to 30% of speed.
        base * (Fx::ONE - self.fatigue * Fx::milli(300))
    }

    pub fn eff_damage(&self) -> Fx {
        let mut d = self.damage;
        match self.emotion {
            Emotion::Confident => d = d * Fx::milli(1100),
            Emotion::Desperate => d = d * Fx::milli(1300),
            _ => {}
        }
        if self.modifiers & modifiers::VENOMOUS != 0 {
            d = d * Fx::milli(1250);
        }
        d
    }

    /// Cooldown multiplier from emotion (Confident wolves reset faster).
    pub fn eff_cooldown_scale(&self) -> Fx {
        match self.emotion {
            Emotion::Confident => Fx::milli(800),
            _ => Fx::ONE,
        }
    }

    /// Apply incoming damage, honouring the Armored modifier. Returns true if
    /// this kills the wolf.
    pub fn take_damage(&mut self, amount: Fx) -> bool {
        let amount = if self.modifiers & modifiers::ARMORED != 0 {
            amount * Fx::milli(600)
        } else {
            amount
        };
        self.health = self.health - amount;
        if self.health <= Fx::ZERO && self.alive {
            self.health = Fx::ZERO;
            self.alive = false;
            self.corpse_cooldown = 1;
            return true;
        }
        false
    }

    /// Parry stun: shove the wolf into Recover for the full stun duration.
    /// The attack cooldown is charged too — leaving Attack always costs one.
    pub fn stun(&mut self, duration: Fx) {
        self.state = WolfState::Recover;
        self.state_timer = duration;
        self.attack_cooldown = duration;
        self.vel = Vec2::ZERO;
        self.body_stretch = Fx::ONE;
        self.attack_done = false;
    }
}

/// Find a free slot honouring the one-frame corpse cooldown. Returns
/// `MAX_ENEMIES` when the arena is full.
pub fn free_slot(enemies: &[Enemy; MAX_ENEMIES]) -> usize {
    enemies
        .iter()
        .position(|e| !e.alive && e.corpse_cooldown == 0)
        .unwrap_or(MAX_ENEMIES)
}

pub fn alive_count(enemies: &[Enemy; MAX_ENEMIES]) -> usize {
    enemies.iter().filter(|e| e.alive).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_draws_attributes_in_range() {
        let mut rng = XorShift64::seeded(7);
        for i in 0..50 {
            let e = Enemy::spawned(i, WolfKind::Normal, Vec2::ZERO, &mut rng);
            assert!(e.aggression >= Fx::milli(300) && e.aggression <= Fx::milli(700));
            assert!(e.intelligence >= Fx::milli(400) && e.intelligence <= Fx::milli(800));
            assert!(e.coordination >= Fx::milli(500) && e.coordination <= Fx::milli(800));
            assert!(e.alive);
            assert_eq!(e.health, e.max_health);
        }
    }

    #[test]
    fn death_sets_corpse_cooldown() {
        let mut rng = XorShift64::seeded(1);
        let mut e = Enemy::spawned(0, WolfKind::Scout, Vec2::ZERO, &mut rng);
        assert!(e.take_damage(Fx::int(1000)));
        assert!(!e.alive);
        assert_eq!(e.corpse_cooldown, 1);
        assert_eq!(e.health, Fx::ZERO);
        // Second overkill is not a second death.
        assert!(!e.take_damage(Fx::int(10)));
    }

    #[test]
    fn armored_modifier_reduces_damage() {
        let mut rng = XorShift64::seeded(2);
        let mut plain = Enemy::spawned(0, WolfKind::Normal, Vec2::ZERO, &mut rng);
        let mut armored = plain;
        armored.modifiers |= modifiers::ARMORED;
        plain.take_damage(Fx::int(10));
        armored.take_damage(Fx::int(10));
        assert!(armored.health > plain.health);
    }

    #[test]
    fn free_slot_respects_corpse_cooldown() {
        let mut arena = [Enemy::default(); MAX_ENEMIES];
        assert_eq!(free_slot(&arena), 0);
        arena[0].corpse_cooldown = 1;
        assert_eq!(free_slot(&arena), 1);
    }
}
