//! Player combat state machine.
//!
//! Attack flow: Idle → Windup → Active → Recovery → Idle, timed from the
//! weapon's per-kind table. During Active the hit geometry is a circular
//! sector (half-angle 30°) swept against every live wolf once per swing.
//! Block, parry, roll and stagger all resolve here; the incoming-attack
//! handler is the single entry point wolves use to hit the player.

use crate::balance;
use crate::enums::{AttackKind, AttackState, EffectKey, HitOutcome};
use crate::fixed::{Fx, Vec2};
use crate::player::Player;
use crate::world::World;

/// Step 4 of the tick order.
pub fn update(world: &mut World, dt: Fx) {
    tick_timers(&mut world.player, dt);
    update_roll(world, dt);
    update_block(world, dt);
    start_attacks(world);
    advance_attack(world, dt);
    regen_stamina(world, dt);
}

fn tick_timers(p: &mut Player, dt: Fx) {
    if p.combat.combo_timer > Fx::ZERO {
        p.combat.combo_timer = p.combat.combo_timer - dt;
        if p.combat.combo_timer <= Fx::ZERO {
            p.combat.combo_timer = Fx::ZERO;
            p.combat.combo_count = 0;
        }
    }
    if p.combat.counter_timer > Fx::ZERO {
        p.combat.counter_timer = (p.combat.counter_timer - dt).max(Fx::ZERO);
    }
    if p.combat.stagger_timer > Fx::ZERO {
        p.combat.stagger_timer = (p.combat.stagger_timer - dt).max(Fx::ZERO);
    }
    if p.roll_cooldown > Fx::ZERO {
        p.roll_cooldown = (p.roll_cooldown - dt).max(Fx::ZERO);
    }
}

fn update_roll(world: &mut World, dt: Fx) {
    let p = &mut world.player;
    if p.rolling {
        p.roll_timer = p.roll_timer - dt;
        if p.roll_timer <= Fx::ZERO {
            p.rolling = false;
            p.roll_timer = Fx::ZERO;
            p.roll_cooldown = balance::ROLL_COOLDOWN;
        }
        return;
    }
    let wants_roll = world.input.roll_pressed();
    if !wants_roll
        || p.roll_cooldown > Fx::ZERO
        || p.ability.berserker_active
        || p.ability.flow_active
    {
        return;
    }
    if p.combat.attack_state != AttackState::Idle {
        // A roll can feint a heavy out of its windup; the roll then proceeds.
        let feintable = p.combat.attack_state == AttackState::Windup
            && p.combat.attack_kind == AttackKind::Heavy
            && can_feint_heavy(p);
        if !feintable {
            return;
        }
        let cost = balance::get().weapon(p.weapon_id).timings[AttackKind::Heavy as usize].cost;
        p.refund_stamina(cost * balance::FEINT_REFUND);
        p.combat.attack_state = AttackState::Idle;
        p.combat.attack_timer = Fx::ZERO;
    }
    if !p.try_spend_stamina(balance::ROLL_COST) {
        return;
    }
    let (mx, my) = world.input.move_axis();
    let dir = Vec2::new(mx, my).normalized();
    p.roll_dir = if dir == Vec2::ZERO { p.facing } else { dir };
    p.rolling = true;
    p.roll_timer = balance::ROLL_DURATION;
    p.combat.block_active = false;
}

fn update_block(world: &mut World, dt: Fx) {
    let p = &mut world.player;
    let wants_block = world.input.current.blocking;
    let can_block =
        wants_block && !p.rolling && p.combat.attack_state == AttackState::Idle && p.stamina > Fx::ZERO;

    if can_block && !p.combat.block_active {
        p.combat.block_active = true;
        p.combat.block_timer = Fx::ZERO;
    } else if !can_block {
        p.combat.block_active = false;
    }

    if p.combat.block_active {
        p.combat.block_timer = p.combat.block_timer + dt;
        p.stamina = (p.stamina - balance::BLOCK_DRAIN_PER_S * dt).max(Fx::ZERO);
        if p.stamina.is_zero() {
            p.combat.block_active = false;
        }
    }
}

fn start_attacks(world: &mut World) {
    let light = world.input.light_pressed();
    let heavy = world.input.heavy_pressed();
    if !light && !heavy {
        return;
    }
    let weapon = balance::get().weapon(world.player.weapon_id);
    let p = &mut world.player;

    // A heavy in Windup can be feinted by the opposite attack input.
    if p.combat.attack_state == AttackState::Windup
        && p.combat.attack_kind == AttackKind::Heavy
        && light
        && can_feint_heavy(p)
    {
        let cost = weapon.timings[AttackKind::Heavy as usize].cost;
        p.refund_stamina(cost * balance::FEINT_REFUND);
        p.combat.attack_state = AttackState::Idle;
        p.combat.attack_timer = Fx::ZERO;
        return;
    }

    if p.combat.attack_state != AttackState::Idle
        || p.rolling
        || p.combat.stagger_timer > Fx::ZERO
        || p.ability.bash_charging
    {
        return;
    }
    let kind = if heavy { AttackKind::Heavy } else { AttackKind::Light };
    let timing = weapon.timings[kind as usize];
    if !p.try_spend_stamina(timing.cost) {
        return;
    }
    p.combat.block_active = false;
    p.combat.attack_kind = kind;
    p.combat.attack_state = AttackState::Windup;
    p.combat.attack_timer = timing.windup;
    p.combat.hit_mask = 0;
}

/// Feinting is a committed-weapon tradeoff: hyperarmored weapons cannot
/// cancel a heavy once the windup starts.
pub fn can_feint_heavy(p: &Player) -> bool {
    !balance::get().weapon(p.weapon_id).hyperarmor
}

fn advance_attack(world: &mut World, dt: Fx) {
    if world.player.combat.attack_state == AttackState::Idle {
        return;
    }
    // Stagger interrupts any attack unless hyperarmor is up.
    if world.player.combat.stagger_timer > Fx::ZERO && !has_hyperarmor(&world.player) {
        world.player.combat.attack_state = AttackState::Idle;
        world.player.combat.attack_timer = Fx::ZERO;
        return;
    }

    if world.player.combat.attack_state == AttackState::Active {
        sweep_attack_hitbox(world);
    }

    let weapon = balance::get().weapon(world.player.weapon_id);
    let timing = weapon.timings[world.player.combat.attack_kind as usize];
    let p = &mut world.player;
    p.combat.attack_timer = p.combat.attack_timer - dt;
    if p.combat.attack_timer > Fx::ZERO {
        return;
    }
    match p.combat.attack_state {
        AttackState::Windup => {
            p.combat.attack_state = AttackState::Active;
            p.combat.attack_timer = timing.active;
            p.combat.hit_mask = 0;
        }
        AttackState::Active => {
            p.combat.attack_state = AttackState::Recovery;
            p.combat.attack_timer = timing.recovery;
        }
        AttackState::Recovery => {
            p.combat.attack_state = AttackState::Idle;
            p.combat.attack_timer = Fx::ZERO;
        }
        AttackState::Idle => {}
    }
}

pub fn has_hyperarmor(p: &Player) -> bool {
    balance::get().weapon(p.weapon_id).hyperarmor
        && p.combat.attack_kind == AttackKind::Heavy
        && matches!(
            p.combat.attack_state,
            AttackState::Windup | AttackState::Active
        )
}

/// Current swing damage after weapon, upgrades, run mods, combo and curses.
pub fn attack_damage(world: &World) -> Fx {
    let weapon = balance::get().weapon(world.player.weapon_id);
    let combo_bonus = Fx::ONE
        + balance::COMBO_DAMAGE_STEP
            * Fx::int(world
                .player
                .combat
                .combo_count
                .min(balance::COMBO_DAMAGE_STEP_CAP) as i32);
    weapon.damage
        * world.upgrades.effect_scalar(EffectKey::Damage)
        * world.player.mods.damage_mult
        * combo_bonus
        * world.risk.player_damage_mult()
}

/// Reach of the current swing in world units.
pub fn attack_reach(world: &World) -> Fx {
    let weapon = balance::get().weapon(world.player.weapon_id);
    let timing = weapon.timings[world.player.combat.attack_kind as usize];
    timing.range
        * weapon.reach_mult
        * world.player.mods.reach_mult
        * world.upgrades.effect_scalar(EffectKey::Reach)
        * world.risk.player_reach_mult()
}

fn sweep_attack_hitbox(world: &mut World) {
    let reach = attack_reach(world);
    let mut damage = attack_damage(world);
    let mut knock = balance::PLAYER_KNOCKBACK_FORCE;
    let countering = world.player.combat.counter_timer > Fx::ZERO
        && world.player.combat.attack_kind == AttackKind::Light;
    if countering {
        damage = damage * balance::COUNTER_DAMAGE_MULT;
        knock = knock * Fx::int(2);
    }
    let origin = world.player.pos;
    let facing = world.player.facing;

    let mut landed = false;
    for i in 0..crate::enemy::MAX_ENEMIES {
        if world.player.combat.hit_mask & (1 << i) != 0 {
            continue;
        }
        let e = &world.enemies[i];
        if !e.alive {
            continue;
        }
        let to_enemy = e.pos.sub(origin);
        let dist = to_enemy.length();
        if dist > reach {
            continue;
        }
        let dir = if dist.is_zero() { facing } else { to_enemy.normalized() };
        if facing.dot(dir) < balance::ATTACK_SECTOR_COS {
            continue;
        }
        world.player.combat.hit_mask |= 1 << i;
        landed = true;
        world.damage_enemy(i, damage, facing.scale(knock));
    }

    if landed {
        let p = &mut world.player;
        p.combat.combo_count = (p.combat.combo_count + 1).min(balance::COMBO_CAP);
        p.combat.combo_timer = balance::COMBO_WINDOW;
        if countering {
            p.combat.counter_timer = Fx::ZERO;
        }
    }
}

fn regen_stamina(world: &mut World, dt: Fx) {
    let p = &mut world.player;
    let busy = p.combat.block_active
        || p.rolling
        || p.combat.attack_state != AttackState::Idle
        || p.ability.bash_charging
        || p.ability.berserker_active;
    if busy {
        return;
    }
    let regen = balance::STAMINA_REGEN_PER_S
        * p.mods.stamina_regen_mult
        * world.upgrades.effect_scalar(EffectKey::StaminaMax)
        * world.risk.stamina_regen_mult();
    p.stamina = (p.stamina + regen * dt).clamp01();
}

/// Resolve an attack landing on the player. Returns the outcome tag — the
/// only combat result observable at the façade.
///
/// `origin` is the attacker position; `damage` is pre-mitigation hp fraction;
/// `hp_scalar` is the HP_MAX upgrade product; `taken_mult` folds curse
/// effects (Fragility) in.
pub fn handle_incoming_attack(
    p: &mut Player,
    origin: Vec2,
    damage: Fx,
    hp_scalar: Fx,
    taken_mult: Fx,
) -> HitOutcome {
    if p.invulnerable() {
        return HitOutcome::Ignored;
    }
    let damage = damage * taken_mult;

    if p.combat.block_active {
        let to_attacker = origin.sub(p.pos);
        // Block only counts against attacks from the front half-plane.
        if p.facing.dot(to_attacker) >= Fx::ZERO {
            if p.combat.block_timer <= balance::PARRY_WINDOW {
                p.combat.counter_timer = balance::COUNTER_WINDOW;
                return HitOutcome::Parried;
            }
            let reduction = (balance::BLOCK_BASE_REDUCTION
                + p.effective_armor() * Fx::HALF)
                .clamp(Fx::ZERO, Fx::milli(900));
            p.apply_damage(damage * (Fx::ONE - reduction), hp_scalar);
            return HitOutcome::Blocked;
        }
    }

    if has_hyperarmor(p) {
        // Damage lands but the swing is not interrupted.
        p.apply_damage(damage, hp_scalar);
        return HitOutcome::Hit;
    }

    p.apply_damage(damage, hp_scalar);
    p.combat.stagger_timer = Fx::milli(300);
    HitOutcome::Hit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::HitOutcome;

    fn player() -> Player {
        Player::spawned(0)
    }

    #[test]
    fn roll_grants_iframes() {
        let mut p = player();
        p.rolling = true;
        let out = handle_incoming_attack(&mut p, Vec2::ZERO, Fx::milli(100), Fx::ONE, Fx::ONE);
        assert_eq!(out, HitOutcome::Ignored);
        assert_eq!(p.hp, Fx::ONE);
    }

    #[test]
    fn perfect_parry_within_window() {
        let mut p = player();
        p.combat.block_active = true;
        p.combat.block_timer = Fx::milli(100);
        let origin = Vec2::new(Fx::milli(700), Fx::HALF); // in front of facing +x
        let out = handle_incoming_attack(&mut p, origin, Fx::milli(100), Fx::ONE, Fx::ONE);
        assert_eq!(out, HitOutcome::Parried);
        assert_eq!(p.hp, Fx::ONE);
        assert_eq!(p.combat.counter_timer, balance::COUNTER_WINDOW);
    }

    #[test]
    fn late_block_reduces_damage() {
        let mut p = player();
        p.combat.block_active = true;
        p.combat.block_timer = Fx::milli(500);
        let origin = Vec2::new(Fx::milli(700), Fx::HALF);
        let out = handle_incoming_attack(&mut p, origin, Fx::milli(200), Fx::ONE, Fx::ONE);
        assert_eq!(out, HitOutcome::Blocked);
        assert_eq!(p.hp, Fx::ONE - Fx::milli(100));
    }

    #[test]
    fn block_behind_back_fails() {
        let mut p = player();
        p.combat.block_active = true;
        p.combat.block_timer = Fx::milli(100);
        let origin = Vec2::new(Fx::milli(300), Fx::HALF); // behind facing +x
        let out = handle_incoming_attack(&mut p, origin, Fx::milli(100), Fx::ONE, Fx::ONE);
        assert_eq!(out, HitOutcome::Hit);
        assert!(p.hp < Fx::ONE);
        assert!(p.combat.stagger_timer > Fx::ZERO);
    }

    #[test]
    fn hyperarmor_takes_damage_without_stagger() {
        let mut p = Player::spawned(1); // Flanged Mace: hyperarmor
        p.combat.attack_kind = AttackKind::Heavy;
        p.combat.attack_state = AttackState::Windup;
        let out =
            handle_incoming_attack(&mut p, Vec2::ZERO, Fx::milli(100), Fx::ONE, Fx::ONE);
        assert_eq!(out, HitOutcome::Hit);
        assert!(p.hp < Fx::ONE);
        assert_eq!(p.combat.stagger_timer, Fx::ZERO);
        assert_eq!(p.combat.attack_state, AttackState::Windup);
    }

    #[test]
    fn feint_flag_follows_weapon_commitment() {
        assert!(can_feint_heavy(&Player::spawned(0))); // Longsword
        assert!(!can_feint_heavy(&Player::spawned(3))); // Warhammer
    }
}
