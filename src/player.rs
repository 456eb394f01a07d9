//! Player state: kinematics, resources, combat and ability sub-state.
//!
//! The player is plain data; the combat and ability state machines that drive
//! these fields live in `combat` and `abilities`. Field order is load-bearing:
//! the snapshot codec serialises structs in declaration order.

use crate::balance;
use crate::enums::{AttackKind, AttackState};
use crate::fixed::{Fx, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
    pub attack_state: AttackState,
    pub attack_kind: AttackKind,
    /// Seconds remaining in the current attack sub-state.
    pub attack_timer: Fx,
    /// Enemy slots already struck by the current swing.
    pub hit_mask: u32,
    pub combo_count: u32,
    /// Seconds remaining in the combo window; zero means the chain is broken.
    pub combo_timer: Fx,
    pub block_active: bool,
    /// Seconds since block start; the parry window is measured against this.
    pub block_timer: Fx,
    pub counter_timer: Fx,
    pub armor_value: Fx,
    /// Hit-stagger lockout. Hyperarmor suppresses it.
    pub stagger_timer: Fx,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityState {
    pub bash_charging: bool,
    pub bash_charge: Fx,
    pub bash_active: bool,
    pub bash_timer: Fx,
    pub bash_pos: Vec2,
    pub bash_radius: Fx,
    /// Final damage locked in at release (combo synergy is consumed once).
    pub bash_damage: Fx,
    pub bash_hit_mask: u32,

    pub berserker_active: bool,
    pub berserker_timer: Fx,
    pub berserker_dir: Vec2,
    pub berserker_cooldown: Fx,
    pub berserker_hit_mask: u32,

    pub flow_active: bool,
    pub flow_timer: Fx,
    pub flow_combo: u32,
    pub flow_cooldown: Fx,
    pub flow_hit_mask: u32,
}

/// Run-scoped multipliers accumulated from choices, shop items and forge work.
/// Upgrade-tree scalars are NOT folded in here; they are looked up at point of
/// use so respec refunds stay trivially correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMods {
    pub damage_mult: Fx,
    pub speed_mult: Fx,
    pub armor_bonus: Fx,
    pub stamina_regen_mult: Fx,
    pub gold_mult: Fx,
    pub essence_mult: Fx,
    pub reach_mult: Fx,
    pub max_hp_mult: Fx,
    pub damage_taken_mult: Fx,
}

impl Default for PlayerMods {
    fn default() -> Self {
        PlayerMods {
            damage_mult: Fx::ONE,
            speed_mult: Fx::ONE,
            armor_bonus: Fx::ZERO,
            stamina_regen_mult: Fx::ONE,
            gold_mult: Fx::ONE,
            essence_mult: Fx::ONE,
            reach_mult: Fx::ONE,
            max_hp_mult: Fx::ONE,
            damage_taken_mult: Fx::ONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Impulse velocity from hits and collisions; decays by ground friction
    /// and rides on top of steering, which rewrites `vel` every tick.
    pub knockback_vel: Vec2,
    /// Unit facing vector, defaults to +x.
    pub facing: Vec2,
    pub hp: Fx,
    pub stamina: Fx,
    pub gold: i32,
    pub essence: i32,
    pub grounded: bool,
    pub jump_count: u8,
    /// Scripted jump arc timer; cosmetic height only, no collision effect.
    pub jump_timer: Fx,
    pub wall_sliding: bool,
    pub rolling: bool,
    pub roll_timer: Fx,
    pub roll_cooldown: Fx,
    /// Direction locked in at roll start.
    pub roll_dir: Vec2,
    pub combat: CombatState,
    pub ability: AbilityState,
    pub mods: PlayerMods,
    pub weapon_id: u32,
}

impl Default for Player {
    fn default() -> Self {
        Player::spawned(0)
    }
}

impl Player {
    /// Fresh player at run start: centre of the world, facing +x, full bars.
    pub fn spawned(weapon_id: u32) -> Player {
        Player {
            pos: Vec2::new(Fx::HALF, Fx::HALF),
            vel: Vec2::ZERO,
            knockback_vel: Vec2::ZERO,
            facing: Vec2::new(Fx::ONE, Fx::ZERO),
            hp: Fx::ONE,
            stamina: Fx::ONE,
            gold: 0,
            essence: 0,
            grounded: true,
            jump_count: 0,
            jump_timer: Fx::ZERO,
            wall_sliding: false,
            rolling: false,
            roll_timer: Fx::ZERO,
            roll_cooldown: Fx::ZERO,
            roll_dir: Vec2::new(Fx::ONE, Fx::ZERO),
            combat: CombatState::default(),
            ability: AbilityState::default(),
            mods: PlayerMods::default(),
            weapon_id,
        }
    }

    /// i-frames from any source: roll or flow dash.
    pub fn invulnerable(&self) -> bool {
        self.rolling || self.ability.flow_active
    }

    /// Spend stamina if available; refuses (and leaves the bar untouched)
    /// when the cost exceeds the current reserve.
    pub fn try_spend_stamina(&mut self, cost: Fx) -> bool {
        if self.stamina < cost {
            return false;
        }
        self.stamina = (self.stamina - cost).clamp01();
        true
    }

    pub fn refund_stamina(&mut self, amount: Fx) {
        self.stamina = (self.stamina + amount).clamp01();
    }

    pub fn heal_fraction(&mut self, fraction: Fx) {
        self.hp = (self.hp + fraction).clamp01();
    }

    /// Apply hp damage through the damage-taken modifier, armor and the
    /// max-hp scalar. Returns the post-mitigation amount.
    pub fn apply_damage(&mut self, amount: Fx, upgrade_hp_scalar: Fx) -> Fx {
        let mut dmg = amount * self.mods.damage_taken_mult;
        // A bigger effective health pool shrinks every incoming fraction.
        let pool = self.mods.max_hp_mult * upgrade_hp_scalar;
        if pool > Fx::ZERO {
            dmg = dmg / pool;
        }
        let mitigated = dmg * (Fx::ONE - self.effective_armor());
        self.hp = (self.hp - mitigated).clamp01();
        mitigated
    }

    /// Armor from gear plus run mods, capped below full immunity.
    pub fn effective_armor(&self) -> Fx {
        (self.combat.armor_value + self.mods.armor_bonus).clamp(Fx::ZERO, Fx::milli(750))
    }

    /// Walk speed after run mods; ability code applies its own multipliers.
    pub fn move_speed(&self) -> Fx {
        balance::WALK_SPEED * self.mods.speed_mult
    }

    pub fn award_gold(&mut self, base: i32, mult: Fx) -> i32 {
        let scaled = (Fx::int(base) * self.mods.gold_mult * mult).floor_int().max(0);
        self.gold = self.gold.saturating_add(scaled);
        scaled
    }

    pub fn award_essence(&mut self, base: i32, mult: Fx) -> i32 {
        let scaled = (Fx::int(base) * self.mods.essence_mult * mult)
            .floor_int()
            .max(0);
        self.essence = self.essence.saturating_add(scaled);
        scaled
    }
}
