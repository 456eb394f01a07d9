//! Class abilities: Warden Bash, Raider Berserker Charge, Kensei Flow Dash.
//!
//! The class is the weapon's class. The single `special` input bit drives the
//! ability for the equipped class (press to start, release where relevant);
//! the façade also exposes the explicit start/release/cancel calls, which go
//! through the same entry points here. Every entry point returns a status —
//! 1 on acceptance, 0 when the action is not legal right now.

use crate::balance;
use crate::enums::{ClassId, EffectKey};
use crate::fixed::{Fx, Vec2};
use crate::world::World;

/// Step 5 of the tick order.
pub fn update(world: &mut World, dt: Fx) {
    dispatch_special_input(world);
    tick_cooldowns(world, dt);
    update_bash(world, dt);
    update_berserker(world, dt);
    update_flow_dash(world, dt);
}

fn class_of(world: &World) -> ClassId {
    balance::get().weapon(world.player.weapon_id).class
}

fn dispatch_special_input(world: &mut World) {
    match class_of(world) {
        ClassId::Warden => {
            if world.input.special_pressed() {
                start_charging_bash(world);
            } else if world.input.special_released() {
                release_bash(world);
            }
        }
        ClassId::Raider => {
            if world.input.special_pressed() {
                start_berserker_charge(world);
            }
        }
        ClassId::Kensei => {
            if world.input.special_pressed() {
                execute_flow_dash(world);
            }
        }
    }
}

fn tick_cooldowns(world: &mut World, dt: Fx) {
    let a = &mut world.player.ability;
    if a.berserker_cooldown > Fx::ZERO {
        a.berserker_cooldown = (a.berserker_cooldown - dt).max(Fx::ZERO);
    }
    if a.flow_cooldown > Fx::ZERO {
        a.flow_cooldown = (a.flow_cooldown - dt).max(Fx::ZERO);
    }
}

fn cooldown_scale(world: &World) -> Fx {
    world.upgrades.effect_scalar(EffectKey::CooldownReduction)
}

// ---------------------------------------------------------------------------
// Warden Bash
// ---------------------------------------------------------------------------

pub fn start_charging_bash(world: &mut World) -> i32 {
    if class_of(world) != ClassId::Warden {
        return 0;
    }
    let p = &mut world.player;
    if p.ability.bash_charging || p.ability.bash_active || p.rolling {
        return 0;
    }
    p.ability.bash_charging = true;
    p.ability.bash_charge = Fx::ZERO;
    1
}

pub fn release_bash(world: &mut World) -> i32 {
    if !world.player.ability.bash_charging {
        return 0;
    }
    let charge = world.player.ability.bash_charge;
    let cost = balance::BASH_COST_BASE + balance::BASH_COST_CHARGE * charge;
    world.player.ability.bash_charging = false;
    if !world.player.try_spend_stamina(cost) {
        return 0;
    }

    // Damage is locked in at release; bash-synergy weapons cash in half the
    // combo chain, once.
    let mut damage = balance::BASH_DAMAGE * (Fx::ONE + charge);
    if balance::get().weapon(world.player.weapon_id).bash_synergy {
        let spent = world.player.combat.combo_count / 2;
        if spent > 0 {
            damage = damage * (Fx::ONE + Fx::milli(100) * Fx::int(spent as i32));
            world.player.combat.combo_count -= spent;
        }
    }
    damage =
        damage * world.upgrades.effect_scalar(EffectKey::Damage) * world.player.mods.damage_mult;

    let p = &mut world.player;
    let offset = balance::BASH_BASE_OFFSET + balance::BASH_CHARGE_OFFSET * charge;
    p.ability.bash_pos = p.pos.add(p.facing.scale(offset));
    p.ability.bash_radius = balance::BASH_BASE_RADIUS + balance::BASH_CHARGE_RADIUS * charge;
    p.ability.bash_damage = damage;
    p.ability.bash_active = true;
    p.ability.bash_timer = balance::BASH_ACTIVE;
    p.ability.bash_hit_mask = 0;
    1
}

fn update_bash(world: &mut World, dt: Fx) {
    if world.player.ability.bash_charging {
        let a = &mut world.player.ability;
        a.bash_charge = (a.bash_charge + balance::BASH_CHARGE_RATE * dt).clamp01();
    }
    if !world.player.ability.bash_active {
        return;
    }

    let charge = world.player.ability.bash_charge;
    let damage = world.player.ability.bash_damage;
    let knock = balance::BASH_KNOCK_BASE + balance::BASH_KNOCK_CHARGE * charge;
    let centre = world.player.ability.bash_pos;
    let radius = world.player.ability.bash_radius;
    let facing = world.player.facing;

    for i in 0..crate::enemy::MAX_ENEMIES {
        if world.player.ability.bash_hit_mask & (1 << i) != 0 {
            continue;
        }
        if !world.enemies[i].alive {
            continue;
        }
        let dist = world.enemies[i].pos.sub(centre).length();
        if dist > radius + balance::ENEMY_RADIUS {
            continue;
        }
        world.player.ability.bash_hit_mask |= 1 << i;
        world.damage_enemy(i, damage, facing.scale(knock));
    }

    let a = &mut world.player.ability;
    a.bash_timer = a.bash_timer - dt;
    if a.bash_timer <= Fx::ZERO {
        a.bash_active = false;
        a.bash_timer = Fx::ZERO;
        a.bash_charge = Fx::ZERO;
    }
}

// ---------------------------------------------------------------------------
// Raider Berserker Charge
// ---------------------------------------------------------------------------

pub fn start_berserker_charge(world: &mut World) -> i32 {
    if class_of(world) != ClassId::Raider {
        return 0;
    }
    let p = &mut world.player;
    if p.ability.berserker_active || p.ability.berserker_cooldown > Fx::ZERO || p.rolling {
        return 0;
    }
    if !p.try_spend_stamina(balance::BERSERKER_COST) {
        return 0;
    }
    p.ability.berserker_active = true;
    p.ability.berserker_timer = balance::BERSERKER_DURATION;
    p.ability.berserker_dir = p.facing;
    p.ability.berserker_hit_mask = 0;
    p.combat.block_active = false;
    1
}

pub fn cancel_berserker_charge(world: &mut World) -> i32 {
    if !world.player.ability.berserker_active {
        return 0;
    }
    end_berserker(world);
    1
}

fn end_berserker(world: &mut World) {
    let scale = cooldown_scale(world);
    let a = &mut world.player.ability;
    a.berserker_active = false;
    a.berserker_timer = Fx::ZERO;
    a.berserker_cooldown = balance::BERSERKER_COOLDOWN * scale;
}

fn update_berserker(world: &mut World, dt: Fx) {
    if !world.player.ability.berserker_active {
        return;
    }
    let dir = world.player.ability.berserker_dir;
    // The lunge overrides locomotion for its whole duration.
    world.player.vel = dir.scale(world.player.move_speed() * balance::BERSERKER_SPEED_MULT);

    let damage = balance::BERSERKER_DAMAGE
        * world.upgrades.effect_scalar(EffectKey::Damage)
        * world.player.mods.damage_mult;
    let origin = world.player.pos;
    for i in 0..crate::enemy::MAX_ENEMIES {
        if world.player.ability.berserker_hit_mask & (1 << i) != 0 {
            continue;
        }
        if !world.enemies[i].alive {
            continue;
        }
        let to_enemy = world.enemies[i].pos.sub(origin);
        let dist = to_enemy.length();
        if dist > balance::BERSERKER_RANGE {
            continue;
        }
        let along = if dist.is_zero() { dir } else { to_enemy.normalized() };
        if dir.dot(along) < balance::BERSERKER_CONE_COS {
            continue;
        }
        world.player.ability.berserker_hit_mask |= 1 << i;
        world.damage_enemy(i, damage, dir.scale(balance::BERSERKER_KNOCK));
    }

    world.player.ability.berserker_timer = world.player.ability.berserker_timer - dt;
    if world.player.ability.berserker_timer <= Fx::ZERO {
        end_berserker(world);
    }
}

// ---------------------------------------------------------------------------
// Kensei Flow Dash
// ---------------------------------------------------------------------------

pub fn execute_flow_dash(world: &mut World) -> i32 {
    if class_of(world) != ClassId::Kensei {
        return 0;
    }
    let p = &mut world.player;
    if p.ability.flow_active || p.ability.flow_cooldown > Fx::ZERO || p.rolling {
        return 0;
    }
    if !p.try_spend_stamina(balance::FLOW_DASH_COST) {
        return 0;
    }
    p.ability.flow_active = true;
    p.ability.flow_timer = balance::FLOW_DASH_DURATION;
    p.ability.flow_hit_mask = 0;
    p.combat.block_active = false;
    1
}

fn update_flow_dash(world: &mut World, dt: Fx) {
    if !world.player.ability.flow_active {
        return;
    }
    // Cover FLOW_DASH_DISTANCE over the dash duration; i-frames throughout
    // (Player::invulnerable reads flow_active).
    let dash_speed = balance::FLOW_DASH_DISTANCE / balance::FLOW_DASH_DURATION;
    world.player.vel = world.player.facing.scale(dash_speed);

    let combo = world.player.ability.flow_combo;
    let damage = balance::FLOW_DASH_DAMAGE
        * (Fx::ONE + balance::FLOW_DASH_COMBO_STEP * Fx::int(combo as i32))
        * world.upgrades.effect_scalar(EffectKey::Damage)
        * world.player.mods.damage_mult;
    let origin = world.player.pos;
    let facing = world.player.facing;

    let mut landed = false;
    for i in 0..crate::enemy::MAX_ENEMIES {
        if world.player.ability.flow_hit_mask & (1 << i) != 0 {
            continue;
        }
        if !world.enemies[i].alive {
            continue;
        }
        let dist = world.enemies[i].pos.sub(origin).length();
        if dist > balance::PLAYER_RADIUS + balance::ENEMY_RADIUS + Fx::milli(20) {
            continue;
        }
        world.player.ability.flow_hit_mask |= 1 << i;
        world.damage_enemy(i, damage, facing.scale(Fx::int(4)));
        landed = true;
    }

    let a = &mut world.player.ability;
    if landed {
        // A landed dash ends immediately and may chain: no cooldown.
        a.flow_combo = (a.flow_combo + 1).min(balance::FLOW_DASH_COMBO_CAP);
        a.flow_active = false;
        a.flow_timer = Fx::ZERO;
        return;
    }
    a.flow_timer = a.flow_timer - dt;
    if a.flow_timer <= Fx::ZERO {
        a.flow_active = false;
        a.flow_timer = Fx::ZERO;
        let scale = cooldown_scale(world);
        world.player.ability.flow_cooldown = balance::FLOW_DASH_COOLDOWN * scale;
    }
}

/// Dash-cancel is legal while the dash is live: an attack input may chain.
pub fn can_dash_cancel(world: &World) -> bool {
    world.player.ability.flow_active
}
