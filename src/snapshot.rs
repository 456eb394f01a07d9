//! Rollback snapshot codec.
//!
//! A snapshot is a little-endian byte blob: magic, version, then every
//! mutable world field in struct declaration order. No serde, no maps, no
//! padding dependence — two conformant builds produce byte-identical blobs
//! for identical worlds, which is the whole point. Bump `VERSION` whenever
//! any serialised struct changes shape.

use crate::enemy::{Enemy, MAX_ENEMIES};
use crate::enums::{
    AttackKind, AttackState, CurseKind, Emotion, PackPlan, PackRole, Phase, ShopKind, WolfKind,
    WolfState,
};
use crate::error::CoreError;
use crate::fixed::{Fx, Vec2};
use crate::input::InputFrame;
use crate::pack::{Pack, MAX_PACKS, MAX_PACK_MEMBERS};
use crate::physics::{Barrel, MAX_BARRELS};
use crate::player::Player;
use crate::risk::{CurseSlot, MAX_CURSES};
use crate::rng::XorShift64;
use crate::shop::ShopSlot;
use crate::world::World;

pub const MAGIC: [u8; 4] = *b"PKHS";
pub const VERSION: u16 = 1;

struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn new() -> Writer {
        Writer {
            buf: Vec::with_capacity(4096),
        }
    }

    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn bool(&mut self, v: bool) {
        self.buf.push(v as u8);
    }

    fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn fx(&mut self, v: Fx) {
        self.i32(v.0);
    }

    fn vec2(&mut self, v: Vec2) {
        self.fx(v.x);
        self.fx(v.y);
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Reader<'a> {
        Reader { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CoreError> {
        if self.pos + n > self.data.len() {
            return Err(CoreError::SnapshotTruncated {
                need: self.pos + n,
                have: self.data.len(),
            });
        }
        let s = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    fn u8(&mut self) -> Result<u8, CoreError> {
        Ok(self.take(1)?[0])
    }

    fn bool(&mut self) -> Result<bool, CoreError> {
        Ok(self.u8()? != 0)
    }

    fn u16(&mut self) -> Result<u16, CoreError> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn u32(&mut self) -> Result<u32, CoreError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn i32(&mut self) -> Result<i32, CoreError> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn u64(&mut self) -> Result<u64, CoreError> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn fx(&mut self) -> Result<Fx, CoreError> {
        Ok(Fx(self.i32()?))
    }

    fn vec2(&mut self) -> Result<Vec2, CoreError> {
        Ok(Vec2::new(self.fx()?, self.fx()?))
    }
}

fn write_input_frame(w: &mut Writer, f: &InputFrame) {
    w.fx(f.move_x);
    w.fx(f.move_y);
    let bits = (f.rolling as u8)
        | (f.jumping as u8) << 1
        | (f.light_attack as u8) << 2
        | (f.heavy_attack as u8) << 3
        | (f.blocking as u8) << 4
        | (f.special as u8) << 5;
    w.u8(bits);
}

fn read_input_frame(r: &mut Reader) -> Result<InputFrame, CoreError> {
    let move_x = r.fx()?;
    let move_y = r.fx()?;
    let bits = r.u8()?;
    Ok(InputFrame {
        move_x,
        move_y,
        rolling: bits & 1 != 0,
        jumping: bits & 2 != 0,
        light_attack: bits & 4 != 0,
        heavy_attack: bits & 8 != 0,
        blocking: bits & 16 != 0,
        special: bits & 32 != 0,
    })
}

fn write_player(w: &mut Writer, p: &Player) {
    w.vec2(p.pos);
    w.vec2(p.vel);
    w.vec2(p.knockback_vel);
    w.vec2(p.facing);
    w.fx(p.hp);
    w.fx(p.stamina);
    w.i32(p.gold);
    w.i32(p.essence);
    w.bool(p.grounded);
    w.u8(p.jump_count);
    w.fx(p.jump_timer);
    w.bool(p.wall_sliding);
    w.bool(p.rolling);
    w.fx(p.roll_timer);
    w.fx(p.roll_cooldown);
    w.vec2(p.roll_dir);

    w.u8(p.combat.attack_state as u8);
    w.u8(p.combat.attack_kind as u8);
    w.fx(p.combat.attack_timer);
    w.u32(p.combat.hit_mask);
    w.u32(p.combat.combo_count);
    w.fx(p.combat.combo_timer);
    w.bool(p.combat.block_active);
    w.fx(p.combat.block_timer);
    w.fx(p.combat.counter_timer);
    w.fx(p.combat.armor_value);
    w.fx(p.combat.stagger_timer);

    w.bool(p.ability.bash_charging);
    w.fx(p.ability.bash_charge);
    w.bool(p.ability.bash_active);
    w.fx(p.ability.bash_timer);
    w.vec2(p.ability.bash_pos);
    w.fx(p.ability.bash_radius);
    w.fx(p.ability.bash_damage);
    w.u32(p.ability.bash_hit_mask);
    w.bool(p.ability.berserker_active);
    w.fx(p.ability.berserker_timer);
    w.vec2(p.ability.berserker_dir);
    w.fx(p.ability.berserker_cooldown);
    w.u32(p.ability.berserker_hit_mask);
    w.bool(p.ability.flow_active);
    w.fx(p.ability.flow_timer);
    w.u32(p.ability.flow_combo);
    w.fx(p.ability.flow_cooldown);
    w.u32(p.ability.flow_hit_mask);

    w.fx(p.mods.damage_mult);
    w.fx(p.mods.speed_mult);
    w.fx(p.mods.armor_bonus);
    w.fx(p.mods.stamina_regen_mult);
    w.fx(p.mods.gold_mult);
    w.fx(p.mods.essence_mult);
    w.fx(p.mods.reach_mult);
    w.fx(p.mods.max_hp_mult);
    w.fx(p.mods.damage_taken_mult);

    w.u32(p.weapon_id);
}

fn read_player(r: &mut Reader) -> Result<Player, CoreError> {
    let mut p = Player::spawned(0);
    p.pos = r.vec2()?;
    p.vel = r.vec2()?;
    p.knockback_vel = r.vec2()?;
    p.facing = r.vec2()?;
    p.hp = r.fx()?;
    p.stamina = r.fx()?;
    p.gold = r.i32()?;
    p.essence = r.i32()?;
    p.grounded = r.bool()?;
    p.jump_count = r.u8()?;
    p.jump_timer = r.fx()?;
    p.wall_sliding = r.bool()?;
    p.rolling = r.bool()?;
    p.roll_timer = r.fx()?;
    p.roll_cooldown = r.fx()?;
    p.roll_dir = r.vec2()?;

    p.combat.attack_state = AttackState::from_u8(r.u8()?);
    p.combat.attack_kind = AttackKind::from_u8(r.u8()?);
    p.combat.attack_timer = r.fx()?;
    p.combat.hit_mask = r.u32()?;
    p.combat.combo_count = r.u32()?;
    p.combat.combo_timer = r.fx()?;
    p.combat.block_active = r.bool()?;
    p.combat.block_timer = r.fx()?;
    p.combat.counter_timer = r.fx()?;
    p.combat.armor_value = r.fx()?;
    p.combat.stagger_timer = r.fx()?;

    p.ability.bash_charging = r.bool()?;
    p.ability.bash_charge = r.fx()?;
    p.ability.bash_active = r.bool()?;
    p.ability.bash_timer = r.fx()?;
    p.ability.bash_pos = r.vec2()?;
    p.ability.bash_radius = r.fx()?;
    p.ability.bash_damage = r.fx()?;
    p.ability.bash_hit_mask = r.u32()?;
    p.ability.berserker_active = r.bool()?;
    p.ability.berserker_timer = r.fx()?;
    p.ability.berserker_dir = r.vec2()?;
    p.ability.berserker_cooldown = r.fx()?;
    p.ability.berserker_hit_mask = r.u32()?;
    p.ability.flow_active = r.bool()?;
    p.ability.flow_timer = r.fx()?;
    p.ability.flow_combo = r.u32()?;
    p.ability.flow_cooldown = r.fx()?;
    p.ability.flow_hit_mask = r.u32()?;

    p.mods.damage_mult = r.fx()?;
    p.mods.speed_mult = r.fx()?;
    p.mods.armor_bonus = r.fx()?;
    p.mods.stamina_regen_mult = r.fx()?;
    p.mods.gold_mult = r.fx()?;
    p.mods.essence_mult = r.fx()?;
    p.mods.reach_mult = r.fx()?;
    p.mods.max_hp_mult = r.fx()?;
    p.mods.damage_taken_mult = r.fx()?;

    p.weapon_id = r.u32()?;
    Ok(p)
}

fn write_enemy(w: &mut Writer, e: &Enemy) {
    w.u32(e.id);
    w.bool(e.alive);
    w.u8(e.corpse_cooldown);
    w.u8(e.kind as u8);
    w.vec2(e.pos);
    w.vec2(e.vel);
    w.vec2(e.knockback_vel);
    w.vec2(e.facing);
    w.fx(e.health);
    w.fx(e.max_health);
    w.fx(e.stamina);
    w.fx(e.damage);
    w.fx(e.speed);
    w.fx(e.detection_range);
    w.fx(e.attack_range);
    w.u8(e.state as u8);
    w.u8(e.role as u8);
    w.u8(e.emotion as u8);
    w.fx(e.state_timer);
    w.fx(e.attack_cooldown);
    w.bool(e.attack_done);
    w.fx(e.aggression);
    w.fx(e.intelligence);
    w.fx(e.coordination);
    w.fx(e.morale);
    w.fx(e.awareness);
    w.fx(e.player_speed_estimate);
    w.fx(e.last_block_time);
    w.fx(e.last_roll_time);
    w.u32(e.successful_attacks);
    w.u32(e.failed_attacks);
    w.u8(e.pack_id);
    w.u8(e.pack_index);
    w.fx(e.fatigue);
    w.u32(e.modifiers);
    w.fx(e.body_stretch);
    w.vec2(e.wander);
    w.vec2(e.plan_target);
    w.bool(e.has_plan_target);
}

fn read_enemy(r: &mut Reader) -> Result<Enemy, CoreError> {
    let mut e = Enemy::default();
    e.id = r.u32()?;
    e.alive = r.bool()?;
    e.corpse_cooldown = r.u8()?;
    e.kind = WolfKind::from_u8(r.u8()?);
    e.pos = r.vec2()?;
    e.vel = r.vec2()?;
    e.knockback_vel = r.vec2()?;
    e.facing = r.vec2()?;
    e.health = r.fx()?;
    e.max_health = r.fx()?;
    e.stamina = r.fx()?;
    e.damage = r.fx()?;
    e.speed = r.fx()?;
    e.detection_range = r.fx()?;
    e.attack_range = r.fx()?;
    e.state = WolfState::from_u8(r.u8()?);
    e.role = PackRole::from_u8(r.u8()?);
    e.emotion = Emotion::from_u8(r.u8()?);
    e.state_timer = r.fx()?;
    e.attack_cooldown = r.fx()?;
    e.attack_done = r.bool()?;
    e.aggression = r.fx()?;
    e.intelligence = r.fx()?;
    e.coordination = r.fx()?;
    e.morale = r.fx()?;
    e.awareness = r.fx()?;
    e.player_speed_estimate = r.fx()?;
    e.last_block_time = r.fx()?;
    e.last_roll_time = r.fx()?;
    e.successful_attacks = r.u32()?;
    e.failed_attacks = r.u32()?;
    e.pack_id = r.u8()?;
    e.pack_index = r.u8()?;
    e.fatigue = r.fx()?;
    e.modifiers = r.u32()?;
    e.body_stretch = r.fx()?;
    e.wander = r.vec2()?;
    e.plan_target = r.vec2()?;
    e.has_plan_target = r.bool()?;
    Ok(e)
}

fn write_pack(w: &mut Writer, p: &Pack) {
    w.bool(p.active);
    for m in &p.members {
        w.u8(*m);
    }
    w.u8(p.member_count);
    w.u8(p.plan as u8);
    w.fx(p.plan_timer);
    w.fx(p.morale);
    w.u8(p.leader);
    w.bool(p.roles_dirty);
    w.bool(p.dispatched);
}

fn read_pack(r: &mut Reader) -> Result<Pack, CoreError> {
    let mut p = Pack::default();
    p.active = r.bool()?;
    for m in p.members.iter_mut() {
        *m = r.u8()?;
    }
    p.member_count = r.u8()?.min(MAX_PACK_MEMBERS as u8);
    p.plan = PackPlan::from_u8(r.u8()?);
    p.plan_timer = r.fx()?;
    p.morale = r.fx()?;
    p.leader = r.u8()?;
    p.roles_dirty = r.bool()?;
    p.dispatched = r.bool()?;
    Ok(p)
}

/// Serialise the complete world. Infallible: the blob layout is fixed.
pub fn encode(world: &World) -> Vec<u8> {
    let mut w = Writer::new();
    w.buf.extend_from_slice(&MAGIC);
    w.u16(VERSION);

    w.u64(world.seed);
    w.u32(world.start_weapon);
    w.fx(world.time_seconds);
    w.fx(world.accumulator);
    w.u32(world.frame);

    w.u64(world.rng.spawn.state());
    w.u64(world.rng.choice.state());
    w.u64(world.rng.ai.state());
    w.u64(world.rng.phase.state());
    w.u64(world.rng.loot.state());

    write_input_frame(&mut w, &world.input.pending);
    write_input_frame(&mut w, &world.input.current);
    write_input_frame(&mut w, &world.input.previous);

    write_player(&mut w, &world.player);

    for e in &world.enemies {
        write_enemy(&mut w, e);
    }
    w.u32(world.next_enemy_id);

    for b in &world.barrels.slots {
        w.bool(b.alive);
        w.vec2(b.pos);
        w.vec2(b.vel);
    }

    for p in &world.packs {
        write_pack(&mut w, p);
    }

    w.u8(world.phase.current as u8);
    w.u32(world.phase.room_count);
    w.u32(world.phase.biome_id);
    w.fx(world.phase.explore_timer);
    w.fx(world.phase.combat_timer);
    w.fx(world.phase.risk_timer);
    w.fx(world.phase.escalate_timer);
    w.fx(world.phase.escalation_level);
    w.bool(world.phase.loop_risked);
    w.bool(world.phase.loop_escalated);

    for id in &world.choices.offer {
        w.u32(*id);
    }
    w.u32(world.choices.taken_mask);
    w.u32(world.choices.owned_tags);
    w.u32(world.choices.rounds_since_rare);
    w.u32(world.choices.total_offers);
    w.u32(world.choices.choice_count);

    for c in &world.risk.curses {
        w.bool(c.active);
        w.u8(c.kind as u8);
        w.fx(c.intensity);
    }
    w.fx(world.risk.risk_level);
    w.bool(world.risk.elite_active);
    w.i32(world.risk.phase_gold);

    for s in &world.shop.slots {
        w.u8(s.kind as u8);
        w.i32(s.cost);
        w.bool(s.purchased);
    }
    w.u32(world.shop.reroll_count);
    w.u32(world.shop.heal_count);

    for owned in &world.upgrades.owned {
        w.u32(*owned);
    }

    w.i32(world.last_attack_outcome);

    w.buf
}

/// Decode a snapshot. Any defect (magic, version, truncation, trailing
/// garbage) yields an error and the caller's world must stay untouched.
pub fn decode(bytes: &[u8]) -> Result<World, CoreError> {
    let mut r = Reader::new(bytes);
    if r.take(4)? != MAGIC {
        return Err(CoreError::SnapshotBadMagic);
    }
    let version = r.u16()?;
    if version != VERSION {
        return Err(CoreError::SnapshotVersionMismatch { found: version });
    }

    let seed = r.u64()?;
    let start_weapon = r.u32()?;
    let mut world = World::new(seed, start_weapon);
    world.time_seconds = r.fx()?;
    world.accumulator = r.fx()?;
    world.frame = r.u32()?;

    world.rng.spawn = restore_stream(r.u64()?);
    world.rng.choice = restore_stream(r.u64()?);
    world.rng.ai = restore_stream(r.u64()?);
    world.rng.phase = restore_stream(r.u64()?);
    world.rng.loot = restore_stream(r.u64()?);

    world.input.pending = read_input_frame(&mut r)?;
    world.input.current = read_input_frame(&mut r)?;
    world.input.previous = read_input_frame(&mut r)?;

    world.player = read_player(&mut r)?;

    for slot in 0..MAX_ENEMIES {
        world.enemies[slot] = read_enemy(&mut r)?;
    }
    world.next_enemy_id = r.u32()?;

    for slot in 0..MAX_BARRELS {
        world.barrels.slots[slot] = Barrel {
            alive: r.bool()?,
            pos: r.vec2()?,
            vel: r.vec2()?,
        };
    }

    for slot in 0..MAX_PACKS {
        world.packs[slot] = read_pack(&mut r)?;
    }

    world.phase.current = Phase::from_u8(r.u8()?);
    world.phase.room_count = r.u32()?;
    world.phase.biome_id = r.u32()?;
    world.phase.explore_timer = r.fx()?;
    world.phase.combat_timer = r.fx()?;
    world.phase.risk_timer = r.fx()?;
    world.phase.escalate_timer = r.fx()?;
    world.phase.escalation_level = r.fx()?;
    world.phase.loop_risked = r.bool()?;
    world.phase.loop_escalated = r.bool()?;

    for id in world.choices.offer.iter_mut() {
        *id = r.u32()?;
    }
    world.choices.taken_mask = r.u32()?;
    world.choices.owned_tags = r.u32()?;
    world.choices.rounds_since_rare = r.u32()?;
    world.choices.total_offers = r.u32()?;
    world.choices.choice_count = r.u32()?;

    for slot in 0..MAX_CURSES {
        world.risk.curses[slot] = CurseSlot {
            active: r.bool()?,
            kind: CurseKind::from_u8(r.u8()?),
            intensity: r.fx()?,
        };
    }
    world.risk.risk_level = r.fx()?;
    world.risk.elite_active = r.bool()?;
    world.risk.phase_gold = r.i32()?;

    for slot in world.shop.slots.iter_mut() {
        *slot = ShopSlot {
            kind: ShopKind::from_u8(r.u8()?),
            cost: r.i32()?,
            purchased: r.bool()?,
        };
    }
    world.shop.reroll_count = r.u32()?;
    world.shop.heal_count = r.u32()?;

    for owned in world.upgrades.owned.iter_mut() {
        *owned = r.u32()?;
    }

    world.last_attack_outcome = r.i32()?;

    if r.pos != bytes.len() {
        return Err(CoreError::SnapshotTruncated {
            need: r.pos,
            have: bytes.len(),
        });
    }
    Ok(world)
}

fn restore_stream(state: u64) -> XorShift64 {
    let mut s = XorShift64::seeded(1);
    s.set_state(state);
    s
}

impl World {
    /// Opaque rollback snapshot of all mutable state.
    pub fn save_state(&self) -> Vec<u8> {
        encode(self)
    }

    /// Restore from a snapshot. Returns 1 on success; on any defect returns
    /// 0 and leaves the world exactly as it was.
    pub fn load_state(&mut self, bytes: &[u8]) -> i32 {
        match decode(bytes) {
            Ok(world) => {
                *self = world;
                1
            }
            Err(err) => {
                log::warn!("snapshot rejected: {}", err);
                0
            }
        }
    }
}
