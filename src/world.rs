//! The world: all mutable simulation state plus the tick orchestrator.
//!
//! `advance` runs the fixed 60 Hz accumulator; each `tick` executes the
//! subsystem order exactly as documented on `tick` — reordering it changes
//! RNG consumption and breaks replay compatibility. Field declaration order
//! is the snapshot serialisation order.

use crate::balance;
use crate::enemy::{self, Enemy, MAX_ENEMIES};
use crate::enums::{modifiers, Phase, WolfKind};
use crate::fixed::{Fx, Vec2};
use crate::input::InputState;
use crate::pack::{self, Pack, MAX_PACKS};
use crate::phase::{self, PhaseState};
use crate::physics::{self, BarrelPool};
use crate::player::Player;
use crate::risk::RiskState;
use crate::rng::Substreams;
use crate::shop::ShopState;
use crate::upgrades::UpgradeState;
use crate::{abilities, ai, choices, combat};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub seed: u64,
    pub start_weapon: u32,
    pub time_seconds: Fx,
    pub accumulator: Fx,
    pub frame: u32,
    pub rng: Substreams,
    pub input: InputState,
    pub player: Player,
    pub enemies: [Enemy; MAX_ENEMIES],
    pub next_enemy_id: u32,
    pub barrels: BarrelPool,
    pub packs: [Pack; MAX_PACKS],
    pub phase: PhaseState,
    pub choices: choices::ChoiceState,
    pub risk: RiskState,
    pub shop: ShopState,
    pub upgrades: UpgradeState,
    /// Latest incoming-attack outcome tag (−1/0/1/2); sticky until the next.
    pub last_attack_outcome: i32,
}

impl Default for World {
    fn default() -> Self {
        World::new(0, 0)
    }
}

impl World {
    pub fn new(seed: u64, start_weapon: u32) -> World {
        let mut w = World {
            seed,
            start_weapon,
            time_seconds: Fx::ZERO,
            accumulator: Fx::ZERO,
            frame: 0,
            rng: Substreams::from_master(seed),
            input: InputState::default(),
            player: Player::spawned(start_weapon),
            enemies: [Enemy::default(); MAX_ENEMIES],
            next_enemy_id: 1,
            barrels: BarrelPool::default(),
            packs: [Pack::default(); MAX_PACKS],
            phase: PhaseState::default(),
            choices: choices::ChoiceState::default(),
            risk: RiskState::default(),
            shop: ShopState::default(),
            upgrades: UpgradeState::default(),
            last_attack_outcome: -1,
        };
        w.player.weapon_id = start_weapon.min(9);
        w
    }

    /// Re-init with a new seed, keeping the equipped weapon.
    pub fn reset(&mut self, new_seed: u64) {
        *self = World::new(new_seed, self.player.weapon_id);
    }

    /// Fixed-step accumulator entry point. `dt` is clamped to 0.1 s; unused
    /// remainder is retained across calls. Never reads a wall clock.
    pub fn advance(&mut self, dt: Fx) {
        let dt = dt.clamp(Fx::ZERO, balance::MAX_FRAME_DT);
        self.accumulator = self.accumulator + dt;
        while self.accumulator >= balance::TICK_DT {
            self.accumulator = self.accumulator - balance::TICK_DT;
            self.tick();
        }
    }

    /// One 1/60 s step. Order is exact and must not be reordered:
    /// 1 input latch, 2 phase pre-step, 3 physics, 4 combat, 5 abilities,
    /// 6 enemy AI, 7 pack coordinator, 8 phase post-step, 9 clock.
    fn tick(&mut self) {
        let dt = balance::TICK_DT;
        self.input.latch();
        phase::pre_step(self, dt);
        if phase::world_active(self.phase.current) {
            self.step_physics(dt);
            combat::update(self, dt);
            abilities::update(self, dt);
            ai::update(self, dt);
            pack::update(self, dt);
        }
        phase::post_step(self);
        self.time_seconds = self.time_seconds + dt;
        self.frame = self.frame.wrapping_add(1);
    }

    // -----------------------------------------------------------------------
    // Physics step (tick step 3)
    // -----------------------------------------------------------------------

    fn step_physics(&mut self, dt: Fx) {
        self.apply_locomotion(dt);

        // Integration order: player, barrels, enemies by slot.
        physics::integrate(
            &mut self.player.pos,
            &mut self.player.vel,
            balance::FRICTION_PLAYER,
            dt,
        );
        for b in self.barrels.slots.iter_mut().filter(|b| b.alive) {
            physics::integrate(&mut b.pos, &mut b.vel, balance::FRICTION_BARREL, dt);
        }
        for e in self.enemies.iter_mut().filter(|e| e.alive) {
            physics::integrate(&mut e.pos, &mut e.vel, balance::FRICTION_ENEMY, dt);
        }

        self.separation_pass();

        // Wall clamp, same body order.
        physics::clamp_to_walls(&mut self.player.pos, &mut self.player.vel, balance::PLAYER_RADIUS);
        for b in self.barrels.slots.iter_mut().filter(|b| b.alive) {
            physics::clamp_to_walls(&mut b.pos, &mut b.vel, balance::BARREL_RADIUS);
        }
        for e in self.enemies.iter_mut().filter(|e| e.alive) {
            physics::clamp_to_walls(&mut e.pos, &mut e.vel, balance::ENEMY_RADIUS);
        }

        self.update_wall_slide();
    }

    fn apply_locomotion(&mut self, dt: Fx) {
        // Scripted jump arc; cosmetic height only.
        if self.input.jump_pressed() && self.player.jump_count < balance::MAX_JUMPS {
            self.player.jump_count += 1;
            self.player.jump_timer = balance::JUMP_DURATION;
            self.player.grounded = false;
        }
        if self.player.jump_timer > Fx::ZERO {
            self.player.jump_timer = (self.player.jump_timer - dt).max(Fx::ZERO);
            if self.player.jump_timer.is_zero() {
                self.player.grounded = true;
                self.player.jump_count = 0;
            }
        }

        // Hit impulses ride on top of steering and bleed off with friction.
        self.player.knockback_vel = self.player.knockback_vel.scale(balance::FRICTION_PLAYER);
        let kick = self.player.knockback_vel;

        // Abilities own the velocity while they run.
        if self.player.ability.berserker_active || self.player.ability.flow_active {
            return;
        }
        if self.player.rolling {
            self.player.vel = self
                .player
                .roll_dir
                .scale(self.player.move_speed() * balance::ROLL_SPEED_MULT)
                .add(kick);
            return;
        }

        let (mx, my) = self.input.move_axis();
        let dir = Vec2::new(mx, my).normalized();
        let mut speed = self.player.move_speed() * self.risk.player_speed_mult();
        if self.player.combat.block_active {
            speed = speed * Fx::HALF;
        }
        if matches!(
            self.player.combat.attack_state,
            crate::enums::AttackState::Windup | crate::enums::AttackState::Active
        ) {
            speed = Fx::ZERO;
        }
        self.player.vel = dir.scale(speed).add(kick);
        if dir != Vec2::ZERO && !self.player.combat.block_active {
            self.player.facing = dir;
        }
    }

    /// Pair order is fixed: player–enemy by slot, enemy–enemy (i < j),
    /// barrel–player, barrel–enemy by slot. Impulses land on the knockback
    /// channel for steered bodies so the next steering pass cannot erase
    /// them; barrels take impulses on their real velocity.
    fn separation_pass(&mut self) {
        for i in 0..MAX_ENEMIES {
            if !self.enemies[i].alive {
                continue;
            }
            let e = &mut self.enemies[i];
            physics::resolve_pair(
                &mut self.player.pos,
                &mut self.player.knockback_vel,
                balance::PLAYER_RADIUS,
                balance::PLAYER_MASS,
                &mut e.pos,
                &mut e.knockback_vel,
                balance::ENEMY_RADIUS,
                balance::ENEMY_MASS,
                balance::BODY_RESTITUTION,
            );
        }
        for i in 0..MAX_ENEMIES {
            for j in (i + 1)..MAX_ENEMIES {
                if !self.enemies[i].alive || !self.enemies[j].alive {
                    continue;
                }
                let (left, right) = self.enemies.split_at_mut(j);
                let a = &mut left[i];
                let b = &mut right[0];
                physics::resolve_pair(
                    &mut a.pos,
                    &mut a.knockback_vel,
                    balance::ENEMY_RADIUS,
                    balance::ENEMY_MASS,
                    &mut b.pos,
                    &mut b.knockback_vel,
                    balance::ENEMY_RADIUS,
                    balance::ENEMY_MASS,
                    balance::BODY_RESTITUTION,
                );
            }
        }
        for bi in 0..physics::MAX_BARRELS {
            if !self.barrels.slots[bi].alive {
                continue;
            }
            {
                let b = &mut self.barrels.slots[bi];
                physics::resolve_pair(
                    &mut b.pos,
                    &mut b.vel,
                    balance::BARREL_RADIUS,
                    balance::BARREL_MASS,
                    &mut self.player.pos,
                    &mut self.player.knockback_vel,
                    balance::PLAYER_RADIUS,
                    balance::PLAYER_MASS,
                    balance::BODY_RESTITUTION,
                );
            }
            for ei in 0..MAX_ENEMIES {
                if !self.enemies[ei].alive || !self.barrels.slots[bi].alive {
                    continue;
                }
                let smashing =
                    self.barrels.slots[bi].vel.length() >= balance::BARREL_SMASH_SPEED;
                let hit = {
                    let b = &mut self.barrels.slots[bi];
                    let e = &mut self.enemies[ei];
                    physics::resolve_pair(
                        &mut b.pos,
                        &mut b.vel,
                        balance::BARREL_RADIUS,
                        balance::BARREL_MASS,
                        &mut e.pos,
                        &mut e.knockback_vel,
                        balance::ENEMY_RADIUS,
                        balance::ENEMY_MASS,
                        balance::BODY_RESTITUTION,
                    )
                };
                if hit && smashing {
                    let along = self.barrels.slots[bi].vel.normalized();
                    self.damage_enemy(ei, balance::BARREL_DAMAGE, along.scale(Fx::int(6)));
                    self.barrels.slots[bi].alive = false;
                }
            }
        }
    }

    fn update_wall_slide(&mut self) {
        let p = &self.player;
        let at_x_wall = p.pos.x <= balance::PLAYER_RADIUS
            || p.pos.x >= Fx::ONE - balance::PLAYER_RADIUS;
        let at_y_wall = p.pos.y <= balance::PLAYER_RADIUS
            || p.pos.y >= Fx::ONE - balance::PLAYER_RADIUS;
        let (mx, my) = self.input.move_axis();
        let pushing = (at_x_wall && !mx.is_zero()) || (at_y_wall && !my.is_zero());
        self.player.wall_sliding = pushing && !self.player.grounded;
    }

    // -----------------------------------------------------------------------
    // Damage and rewards
    // -----------------------------------------------------------------------

    /// Single entry point for anything hurting a wolf: knockback, health,
    /// death rewards, pack bookkeeping, Explosive detonation.
    pub fn damage_enemy(&mut self, slot: usize, amount: Fx, knock: Vec2) {
        if slot >= MAX_ENEMIES || !self.enemies[slot].alive {
            return;
        }
        let killed = {
            let e = &mut self.enemies[slot];
            physics::apply_knockback(&mut e.knockback_vel, knock);
            e.take_damage(amount / balance::ENEMY_HEALTH_SCALE)
        };
        if !killed {
            return;
        }
        let e = self.enemies[slot];
        log::debug!("wolf {} ({:?}) down in room {}", e.id, e.kind, self.phase.room_count);

        if e.modifiers & modifiers::EXPLOSIVE != 0 {
            let dist = self.player.pos.sub(e.pos).length();
            if dist < Fx::milli(100) {
                let hp_scalar = self.upgrades.effect_scalar(crate::enums::EffectKey::HpMax);
                self.player.apply_damage(Fx::milli(150), hp_scalar);
            }
        }

        let elite = matches!(e.kind, WolfKind::Alpha | WolfKind::Omega);
        let base = if elite {
            balance::KILL_GOLD * balance::ELITE_REWARD_MULT
        } else {
            balance::KILL_GOLD
        };
        let gold_scalar = self.upgrades.effect_scalar(crate::enums::EffectKey::GoldGain);
        let awarded = self.player.award_gold(base, gold_scalar);
        if self.phase.current == Phase::Risk {
            self.risk.record_gold(awarded);
        }
        let essence_base = if elite {
            balance::KILL_ESSENCE * balance::ELITE_REWARD_MULT
        } else {
            balance::KILL_ESSENCE
        };
        let essence_scalar = self
            .upgrades
            .effect_scalar(crate::enums::EffectKey::EssenceGain);
        self.player.award_essence(essence_base, essence_scalar);

        if e.pack_id != 0 {
            let pid = (e.pack_id - 1) as usize;
            if pid < MAX_PACKS {
                self.packs[pid].roles_dirty = true;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Spawning (SPAWN substream only)
    // -----------------------------------------------------------------------

    fn spawn_position(&mut self) -> Vec2 {
        // Ring placement: edges of the arena, biased away from the centre.
        let x = Fx::milli(150) + self.rng.spawn.next_fixed_01() * Fx::milli(700);
        let side = self.rng.spawn.next_range(0, 2);
        let depth = Fx::milli(80) + self.rng.spawn.next_fixed_01() * Fx::milli(120);
        let y = if side == 0 { depth } else { Fx::ONE - depth };
        // Alternate which axis hugs the wall so packs surround.
        if self.rng.spawn.next_range(0, 2) == 0 {
            Vec2::new(x, y)
        } else {
            Vec2::new(y, x)
        }
    }

    pub fn spawn_wolf_at(&mut self, kind: WolfKind, pos: Vec2) -> usize {
        let slot = enemy::free_slot(&self.enemies);
        if slot == MAX_ENEMIES {
            return MAX_ENEMIES;
        }
        let id = self.next_enemy_id;
        self.next_enemy_id += 1;
        self.enemies[slot] = Enemy::spawned(id, kind, pos, &mut self.rng.spawn);
        slot
    }

    /// Escalation adjustments rolled at spawn: stat multipliers plus
    /// independent 0.2·level chances per modifier.
    fn apply_escalation(&mut self, slot: usize) {
        let level = self.phase.escalation_level;
        if level.is_zero() {
            return;
        }
        let e = &mut self.enemies[slot];
        e.speed = e.speed * (Fx::ONE + balance::ESCALATION_SPEED_MULT * level);
        e.damage = e.damage * (Fx::ONE + balance::ESCALATION_DAMAGE_MULT * level);
        let chance = balance::ESCALATION_MOD_CHANCE * level;
        for m in modifiers::ALL {
            if self.rng.spawn.next_fixed_01() < chance {
                self.enemies[slot].modifiers |= m;
            }
        }
    }

    fn room_spawn_count(&self) -> u32 {
        let room = self.phase.room_count;
        if room >= 1 && room <= balance::EARLY_ROOM_SPAWNS.len() as u32 {
            balance::EARLY_ROOM_SPAWNS[(room - 1) as usize]
        } else {
            let scale = Fx::ONE + self.phase.escalation_level;
            (Fx::int(balance::BASE_SPAWN_COUNT as i32) * scale).floor_int() as u32
        }
    }

    /// Fight-room spawn: composition and positions are a pure function of
    /// (seed, room_count, biome_id) through the SPAWN substream.
    pub fn spawn_room(&mut self) {
        let count = self.room_spawn_count().min(8);
        let mut slots: Vec<usize> = Vec::new();
        for k in 0..count {
            let kind = if k == 0 && count >= 3 {
                WolfKind::Alpha
            } else if k == 3 {
                WolfKind::Scout
            } else if self.rng.spawn.next_range(0, 4) == 0 {
                WolfKind::Hunter
            } else {
                WolfKind::Normal
            };
            let pos = self.spawn_position();
            let slot = self.spawn_wolf_at(kind, pos);
            if slot < MAX_ENEMIES {
                self.apply_escalation(slot);
                slots.push(slot);
            }
        }
        log::debug!("room {} spawned {} wolves", self.phase.room_count, slots.len());
        if slots.len() >= 2 {
            self.form_pack(&slots, self.phase.biome_id % 2 == 1);
        }
    }

    fn form_pack(&mut self, slots: &[usize], has_cover: bool) {
        let pid = pack::free_pack_slot(&self.packs);
        if pid == MAX_PACKS {
            return;
        }
        let mut p = Pack::formed(slots);
        for (i, &slot) in slots.iter().take(pack::MAX_PACK_MEMBERS).enumerate() {
            self.enemies[slot].pack_id = pid as u8 + 1;
            self.enemies[slot].pack_index = i as u8;
        }
        if has_cover {
            p.plan = crate::enums::PackPlan::Ambush;
            p.plan_timer = pack::PLAN_INTERVAL;
        }
        self.packs[pid] = p;
    }

    /// Risk wave: a couple of hunters, plus the elite when the flag is up.
    pub fn spawn_risk_wave(&mut self) {
        let mut slots = Vec::new();
        for _ in 0..2 {
            let pos = self.spawn_position();
            let slot = self.spawn_wolf_at(WolfKind::Hunter, pos);
            if slot < MAX_ENEMIES {
                slots.push(slot);
            }
        }
        if self.risk.elite_active {
            let pos = self.spawn_position();
            let slot = self.spawn_wolf_at(WolfKind::Hunter, pos);
            if slot < MAX_ENEMIES {
                let e = &mut self.enemies[slot];
                e.max_health = e.max_health * balance::ELITE_HEALTH_MULT;
                e.health = e.max_health;
                e.damage = e.damage * balance::ELITE_DAMAGE_MULT;
                slots.push(slot);
            }
        }
        if slots.len() >= 2 {
            self.form_pack(&slots, false);
        }
    }

    /// Escalate wave: scaled spawn count, modifier rolls, and the Omega
    /// miniboss once the escalation level crosses its gate.
    pub fn spawn_escalate_wave(&mut self) {
        let level = self.phase.escalation_level;
        let rate = Fx::ONE + Fx::int(2) * level;
        let count = ((Fx::int(balance::BASE_SPAWN_COUNT as i32) * rate).floor_int() as u32).min(8);
        let mut slots = Vec::new();
        for _ in 0..count {
            let pos = self.spawn_position();
            let slot = self.spawn_wolf_at(WolfKind::Hunter, pos);
            if slot < MAX_ENEMIES {
                self.apply_escalation(slot);
                slots.push(slot);
            }
        }
        if level >= balance::MINIBOSS_ESCALATION_GATE {
            let pos = self.spawn_position();
            let slot = self.spawn_wolf_at(WolfKind::Omega, pos);
            if slot < MAX_ENEMIES {
                let guaranteed =
                    modifiers::ALL[self.rng.spawn.next_range(0, 5) as usize];
                let e = &mut self.enemies[slot];
                e.max_health = e.max_health * balance::MINIBOSS_HEALTH_MULT;
                e.health = e.max_health;
                e.modifiers |= guaranteed;
                slots.push(slot);
            }
        }
        if slots.len() >= 2 {
            self.form_pack(&slots, false);
        }
    }

    pub fn clear_combatants(&mut self) {
        self.enemies = [Enemy::default(); MAX_ENEMIES];
        self.barrels.clear();
        self.packs = [Pack::default(); MAX_PACKS];
    }

    // -----------------------------------------------------------------------
    // Actions (façade entry points; sentinel-return, transactional)
    // -----------------------------------------------------------------------

    pub fn commit_choice(&mut self, id: u32) -> i32 {
        choices::commit(self, id)
    }

    /// Escape the Risk phase: costs half the stamina bar; a PHASE-substream
    /// roll decides whether the halved gold bonus pays out.
    pub fn escape_risk(&mut self) -> i32 {
        if self.phase.current != Phase::Risk {
            return 0;
        }
        if !self.player.try_spend_stamina(balance::ESCAPE_RISK_COST) {
            return 0;
        }
        let rewarded = self.rng.phase.next_fixed_01() < Fx::milli(600);
        let bonus = self.risk.settle_bonus(true);
        if rewarded {
            self.player.gold = self.player.gold.saturating_add(bonus);
        }
        let next = phase::next_after_risk(self);
        phase::transition_to(self, next);
        1
    }

    pub fn exit_cashout(&mut self) -> i32 {
        if self.phase.current != Phase::CashOut {
            return 0;
        }
        phase::transition_to(self, Phase::Explore);
        1
    }

    pub fn spawn_barrel(&mut self, pos: Vec2) -> u32 {
        self.barrels.spawn(pos).unwrap_or(0)
    }

    pub fn throw_barrel(&mut self, handle: u32, vel: Vec2) -> i32 {
        match self.barrels.get_mut(handle) {
            Ok(b) => {
                b.vel = vel.scale(balance::KNOCKBACK_SCALE);
                1
            }
            Err(_) => 0,
        }
    }

    pub fn clear_all_barrels(&mut self) {
        self.barrels.clear();
    }

    /// Debug hook used by external test harnesses: force a phase.
    pub fn force_phase_transition(&mut self, phase_id: i32) -> i32 {
        if !(0..=7).contains(&phase_id) {
            return 0;
        }
        phase::transition_to(self, Phase::from_u8(phase_id as u8));
        1
    }
}
