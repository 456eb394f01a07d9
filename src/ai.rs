//! Per-wolf behaviour engine.
//!
//! Each live wolf runs the 12-state FSM independently, slot order 0..31.
//! State selection is a priority cascade evaluated whenever the state timer
//! runs out; entering a state ALWAYS resets the timer, including re-entry
//! into the same state — evaluators that only reset on change stall the pack.
//!
//! Wolves are plain `Copy` data: each update works on a stack copy and writes
//! it back, so the loop can freely touch the player and the AI substream.

use crate::balance;
use crate::combat;
use crate::enemy::{self, Enemy, MAX_ENEMIES};
use crate::enums::{modifiers, Emotion, HitOutcome, WolfState};
use crate::fixed::{Fx, Vec2};
use crate::rng::XorShift64;
use crate::world::World;

/// Step 6 of the tick order.
pub fn update(world: &mut World, dt: Fx) {
    let player_pos = world.player.pos;
    let player_speed = world.player.vel.length();
    let player_rolling = world.player.rolling;
    let allies_alive = enemy::alive_count(&world.enemies) as u32;

    for i in 0..MAX_ENEMIES {
        if !world.enemies[i].alive {
            if world.enemies[i].corpse_cooldown > 0 {
                world.enemies[i].corpse_cooldown -= 1;
            }
            continue;
        }
        let mut e = world.enemies[i];

        update_memory(&mut e, player_pos, player_speed, player_rolling, dt);
        update_emotion(&mut e, player_pos, allies_alive);

        if e.attack_cooldown > Fx::ZERO {
            e.attack_cooldown = (e.attack_cooldown - dt).max(Fx::ZERO);
        }
        e.fatigue = (e.fatigue - Fx::milli(30) * dt).max(Fx::ZERO);
        if e.modifiers & modifiers::REGENERATING != 0 {
            e.health = (e.health + Fx::int(2) * dt).min(e.max_health);
        }

        e.state_timer = e.state_timer - dt;
        if e.state_timer <= Fx::ZERO {
            if e.state == WolfState::Attack {
                finish_attack(&mut e);
            } else {
                let next = evaluate_state(&e, player_pos);
                enter_state(&mut e, next, &mut world.rng.ai);
            }
        }

        execute_state(&mut e, world, player_pos, dt);
        // Steering wrote `vel`; fold in the decaying impulse channel.
        e.knockback_vel = e.knockback_vel.scale(balance::FRICTION_ENEMY);
        e.vel = e.vel.add(e.knockback_vel);
        world.enemies[i] = e;
    }
}

fn update_memory(e: &mut Enemy, player_pos: Vec2, player_speed: Fx, player_rolling: bool, dt: Fx) {
    e.player_speed_estimate =
        e.player_speed_estimate * Fx::milli(900) + player_speed * Fx::milli(100);
    e.last_block_time = e.last_block_time + dt;
    e.last_roll_time = e.last_roll_time + dt;
    if player_rolling && e.pos.sub(player_pos).length() < e.eff_detection_range() {
        e.last_roll_time = Fx::ZERO;
    }
}

/// Emotion cascade. Desperate is checked before Fearful — its condition is a
/// strict subset and would otherwise be unreachable.
fn update_emotion(e: &mut Enemy, player_pos: Vec2, allies_alive: u32) {
    let hp = e.health_fraction();
    let rate = e.success_rate();
    let in_range = e.pos.sub(player_pos).length() < e.eff_attack_range() * Fx::int(2);

    let next = if hp < Fx::milli(200) && allies_alive < 2 {
        Emotion::Desperate
    } else if hp < Fx::milli(300) {
        Emotion::Fearful
    } else if rate > Fx::milli(700) && e.morale > Fx::milli(700) {
        Emotion::Confident
    } else if e.failed_attacks > 5 && rate < Fx::milli(300) {
        Emotion::Frustrated
    } else if e.aggression > Fx::milli(600) && in_range {
        Emotion::Aggressive
    } else {
        Emotion::Calm
    };

    if next != e.emotion {
        // One-shot attribute shifts on entry.
        match next {
            Emotion::Frustrated => {
                e.aggression = (e.aggression + Fx::milli(200)).clamp01();
                e.coordination = e.coordination * Fx::milli(700);
            }
            Emotion::Desperate => {
                e.morale = e.morale * Fx::HALF;
            }
            _ => {}
        }
        e.emotion = next;
    }
}

/// Priority cascade, evaluated only when the state timer has expired.
/// Plan-driven states (Ambush, Flank) carry long timers and are not
/// re-evaluated here until the pack releases them.
fn evaluate_state(e: &Enemy, player_pos: Vec2) -> WolfState {
    let d = e.pos.sub(player_pos).length();
    let hp = e.health_fraction();

    if hp < Fx::milli(300) && e.morale < Fx::milli(400) {
        return WolfState::Retreat;
    }
    if d < e.eff_attack_range() && e.attack_cooldown <= Fx::ZERO && e.stamina > Fx::milli(300) {
        return WolfState::Attack;
    }
    if d < e.eff_attack_range() {
        return WolfState::Strafe;
    }
    if d < e.eff_detection_range() * Fx::milli(700) {
        return WolfState::Approach;
    }
    if d < e.eff_detection_range() {
        return WolfState::Alert;
    }
    if e.state == WolfState::Patrol {
        WolfState::Patrol
    } else {
        WolfState::Idle
    }
}

/// Enter `next`, unconditionally resetting the baseline timer.
pub fn enter_state(e: &mut Enemy, next: WolfState, ai_rng: &mut XorShift64) {
    e.state = next;
    e.body_stretch = Fx::ONE;
    e.state_timer = match next {
        WolfState::Idle => balance::STATE_IDLE,
        WolfState::Patrol => balance::STATE_PATROL,
        WolfState::Investigate => Fx::int(2),
        WolfState::Alert => balance::STATE_ALERT,
        WolfState::Approach => balance::STATE_APPROACH,
        WolfState::Strafe => balance::STATE_STRAFE,
        WolfState::Attack => balance::ATTACK_TOTAL,
        WolfState::Retreat => balance::STATE_RETREAT,
        WolfState::Recover => balance::STATE_RECOVER,
        WolfState::Flee => Fx::int(3),
        // Held until the pack plan or proximity trigger releases it.
        WolfState::Ambush => Fx::int(600),
        WolfState::Flank => Fx::int(3),
    };
    match next {
        WolfState::Idle | WolfState::Patrol => {
            // Wander heading sampled once per state entry, AI substream only.
            let angle = ai_rng.next_fixed_01() * Fx::TWO_PI;
            e.wander = Vec2::from_angle(angle);
        }
        WolfState::Attack => {
            e.attack_done = false;
            e.body_stretch = Fx::milli(800);
            e.fatigue = (e.fatigue + Fx::milli(100)).clamp01();
        }
        WolfState::Alert => {
            e.awareness = (e.awareness + Fx::milli(300)).clamp01();
        }
        _ => {}
    }
}

/// Attack recovery has elapsed: set the cooldown (respecting the recent-block
/// cue) and drop into Strafe.
fn finish_attack(e: &mut Enemy) {
    let mut cooldown =
        Fx::milli(1500) / (Fx::ONE + e.aggression) * e.eff_cooldown_scale();
    if e.last_block_time < Fx::ONE {
        cooldown = cooldown + Fx::HALF;
    }
    e.attack_cooldown = cooldown;
    e.body_stretch = Fx::ONE;
    e.state = WolfState::Strafe;
    e.state_timer = balance::STATE_STRAFE;
}

fn execute_state(e: &mut Enemy, world: &mut World, player_pos: Vec2, dt: Fx) {
    let to_player = player_pos.sub(e.pos);
    let dist = to_player.length();
    let dir = to_player.normalized();

    match e.state {
        WolfState::Idle => {
            e.vel = e.wander.scale(e.eff_speed() * Fx::milli(200));
        }
        WolfState::Patrol => {
            e.vel = e.wander.scale(e.eff_speed() * Fx::HALF);
            e.facing = e.wander;
        }
        WolfState::Investigate => {
            e.vel = dir.scale(e.eff_speed() * Fx::HALF);
            e.facing = dir;
            e.awareness = (e.awareness + Fx::milli(200) * dt).clamp01();
        }
        WolfState::Alert => {
            e.vel = Vec2::ZERO;
            e.facing = dir;
            e.awareness = (e.awareness + Fx::HALF * dt).clamp01();
        }
        WolfState::Approach => {
            let target = if e.has_plan_target { e.plan_target } else { player_pos };
            let to_target = target.sub(e.pos).normalized();
            e.vel = to_target.scale(e.eff_speed());
            e.facing = dir;
        }
        WolfState::Strafe => {
            // Direction is fixed by slot identity: even ids clockwise.
            // Coordinated wolves circle tighter and faster.
            let perp = if e.id & 1 == 0 { dir.perp() } else { dir.perp().scale(-Fx::ONE) };
            let agility = Fx::milli(700) + e.coordination * Fx::milli(300);
            e.vel = perp.scale(e.eff_speed() * agility);
            e.facing = dir;
        }
        WolfState::Attack => {
            run_attack(e, world, player_pos, dir);
        }
        WolfState::Retreat => {
            e.vel = dir.scale(-e.eff_speed());
            e.morale = (e.morale + Fx::milli(50) * dt).clamp01();
        }
        WolfState::Recover => {
            e.vel = Vec2::ZERO;
        }
        WolfState::Flee => {
            e.vel = dir.scale(-(e.eff_speed() * Fx::milli(1200)));
        }
        WolfState::Ambush => {
            e.vel = Vec2::ZERO;
            if dist < balance::AMBUSH_TRIGGER_RANGE {
                // The spring is released locally; the pack coordinator
                // releases everyone else on its next pass.
                e.state = WolfState::Attack;
                e.state_timer = balance::ATTACK_TOTAL;
                e.attack_done = false;
                e.body_stretch = Fx::milli(800);
            }
        }
        WolfState::Flank => {
            let target = if e.has_plan_target { e.plan_target } else { player_pos };
            let to_target = target.sub(e.pos);
            if to_target.length() < balance::PINCER_ARRIVE {
                e.vel = Vec2::ZERO;
            } else {
                e.vel = to_target.normalized().scale(e.eff_speed());
            }
            e.facing = dir;
        }
    }
}

/// Attack phases read off the countdown: anticipation (0.9..0.5], execute
/// once at 0.5, recovery until finish_attack fires.
fn run_attack(e: &mut Enemy, world: &mut World, player_pos: Vec2, dir: Vec2) {
    e.facing = dir;
    let t = e.state_timer;
    let execute_at = balance::ATTACK_TOTAL - balance::ATTACK_ANTICIPATION;

    if t > execute_at {
        // Anticipation crouch.
        e.vel = Vec2::ZERO;
        e.body_stretch = Fx::milli(800);
        return;
    }
    if t > balance::ATTACK_RECOVERY {
        e.vel = Vec2::ZERO;
        e.body_stretch = Fx::milli(1300);
        if !e.attack_done {
            e.attack_done = true;
            resolve_attack(e, world, player_pos);
        }
        return;
    }
    e.body_stretch = Fx::ONE;
    e.vel = Vec2::ZERO;
}

/// The execute point resolves against the player unconditionally; the
/// outcome tag alone decides what the wolf learns from it.
fn resolve_attack(e: &mut Enemy, world: &mut World, player_pos: Vec2) {
    let damage = e.eff_damage() * world.risk.enemy_damage_mult();
    let hp_scalar = world
        .upgrades
        .effect_scalar(crate::enums::EffectKey::HpMax);
    let taken = world.risk.player_damage_taken_mult();
    let outcome =
        combat::handle_incoming_attack(&mut world.player, e.pos, damage, hp_scalar, taken);
    world.last_attack_outcome = outcome.as_i32();

    match outcome {
        HitOutcome::Hit => {
            e.successful_attacks += 1;
            e.morale = (e.morale + Fx::milli(100)).clamp01();
            let away = player_pos.sub(e.pos).normalized();
            crate::physics::apply_knockback(
                &mut world.player.knockback_vel,
                away.scale(Fx::int(2)),
            );
        }
        HitOutcome::Blocked => {
            e.failed_attacks += 1;
            e.last_block_time = Fx::ZERO;
        }
        HitOutcome::Parried => {
            e.failed_attacks += 1;
            e.stun(balance::PARRY_STUN);
        }
        HitOutcome::Ignored => {
            e.failed_attacks += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::WolfKind;

    fn wolf_at(pos: Vec2) -> Enemy {
        let mut rng = XorShift64::seeded(5);
        Enemy::spawned(1, WolfKind::Normal, pos, &mut rng)
    }

    #[test]
    fn cascade_prefers_attack_in_range() {
        let mut e = wolf_at(Vec2::new(Fx::milli(520), Fx::HALF));
        e.attack_cooldown = Fx::ZERO;
        let next = evaluate_state(&e, Vec2::new(Fx::HALF, Fx::HALF));
        assert_eq!(next, WolfState::Attack);
    }

    #[test]
    fn cascade_strafes_while_on_cooldown() {
        let mut e = wolf_at(Vec2::new(Fx::milli(520), Fx::HALF));
        e.attack_cooldown = Fx::ONE;
        let next = evaluate_state(&e, Vec2::new(Fx::HALF, Fx::HALF));
        assert_eq!(next, WolfState::Strafe);
    }

    #[test]
    fn cascade_retreats_when_hurt_and_shaken() {
        let mut e = wolf_at(Vec2::new(Fx::milli(520), Fx::HALF));
        e.health = e.max_health * Fx::milli(200);
        e.morale = Fx::milli(300);
        let next = evaluate_state(&e, Vec2::new(Fx::HALF, Fx::HALF));
        assert_eq!(next, WolfState::Retreat);
    }

    #[test]
    fn cascade_idles_out_of_detection() {
        let e = wolf_at(Vec2::new(Fx::milli(50), Fx::milli(50)));
        let next = evaluate_state(&e, Vec2::new(Fx::milli(950), Fx::milli(950)));
        assert_eq!(next, WolfState::Idle);
    }

    #[test]
    fn enter_state_always_resets_timer() {
        let mut e = wolf_at(Vec2::ZERO);
        let mut rng = XorShift64::seeded(9);
        enter_state(&mut e, WolfState::Strafe, &mut rng);
        e.state_timer = Fx::milli(10);
        // Re-entering the SAME state must still reset the timer.
        enter_state(&mut e, WolfState::Strafe, &mut rng);
        assert_eq!(e.state_timer, balance::STATE_STRAFE);
    }

    #[test]
    fn finish_attack_sets_cooldown_and_strafe() {
        let mut e = wolf_at(Vec2::ZERO);
        e.state = WolfState::Attack;
        finish_attack(&mut e);
        assert_eq!(e.state, WolfState::Strafe);
        assert!(e.attack_cooldown > Fx::ZERO);
    }

    #[test]
    fn recent_block_cue_lengthens_cooldown() {
        let mut cautious = wolf_at(Vec2::ZERO);
        cautious.last_block_time = Fx::milli(500);
        let mut bold = cautious;
        bold.last_block_time = Fx::int(5);
        finish_attack(&mut cautious);
        finish_attack(&mut bold);
        assert!(cautious.attack_cooldown > bold.attack_cooldown);
    }

    #[test]
    fn desperate_wins_over_fearful() {
        let mut e = wolf_at(Vec2::ZERO);
        e.health = e.max_health * Fx::milli(100);
        let morale_before = e.morale;
        update_emotion(&mut e, Vec2::new(Fx::HALF, Fx::HALF), 1);
        assert_eq!(e.emotion, Emotion::Desperate);
        assert!(e.morale < morale_before);
    }

    #[test]
    fn emotion_fearful_at_low_health_with_allies() {
        let mut e = wolf_at(Vec2::ZERO);
        e.health = e.max_health * Fx::milli(250);
        update_emotion(&mut e, Vec2::new(Fx::HALF, Fx::HALF), 5);
        assert_eq!(e.emotion, Emotion::Fearful);
        assert!(e.eff_detection_range() > e.detection_range);
        assert!(e.eff_attack_range() < e.attack_range);
    }
}
