//! Pack coordination: roles, plan selection, dispatch.
//!
//! A pack is 2..8 wolves sharing a `pack_id` (1-based pack slot). The
//! coordinator runs after individual AI each tick: it prunes dead members,
//! keeps roles assigned, picks a plan every two seconds and pushes movement
//! targets / state changes onto members. Members remain ordinary wolves —
//! the plan only nudges which state they are in and where they are headed.

use crate::ai;
use crate::balance;
use crate::enums::{PackPlan, PackRole, WolfState};
use crate::fixed::{Fx, Vec2};
use crate::world::World;
use serde::{Deserialize, Serialize};

pub const MAX_PACKS: usize = 4;
pub const MAX_PACK_MEMBERS: usize = 8;

pub const PLAN_INTERVAL: Fx = Fx::int(2);
pub const RETREAT_PLAN_TIME: Fx = Fx::int(3);
pub const REGROUP_PLAN_TIME: Fx = Fx::int(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pack {
    pub active: bool,
    /// Enemy slot indices; only the first `member_count` entries are live.
    pub members: [u8; MAX_PACK_MEMBERS],
    pub member_count: u8,
    pub plan: PackPlan,
    pub plan_timer: Fx,
    /// Aggregate member morale, refreshed each pass.
    pub morale: Fx,
    /// Enemy slot index of the leader.
    pub leader: u8,
    pub roles_dirty: bool,
    /// Set when the current plan's one-shot dispatch has run.
    pub dispatched: bool,
}

impl Default for Pack {
    fn default() -> Self {
        Pack {
            active: false,
            members: [0; MAX_PACK_MEMBERS],
            member_count: 0,
            plan: PackPlan::None,
            plan_timer: Fx::ZERO,
            morale: Fx::ZERO,
            leader: 0,
            roles_dirty: false,
            dispatched: false,
        }
    }
}

impl Pack {
    /// Form a pack over the given enemy slots. Caller sets `pack_id` and
    /// `pack_index` on the members.
    pub fn formed(slots: &[usize]) -> Pack {
        let mut p = Pack {
            active: true,
            member_count: slots.len().min(MAX_PACK_MEMBERS) as u8,
            roles_dirty: true,
            ..Pack::default()
        };
        for (i, s) in slots.iter().take(MAX_PACK_MEMBERS).enumerate() {
            p.members[i] = *s as u8;
        }
        p
    }

    pub fn member_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.members[..self.member_count as usize]
            .iter()
            .map(|&s| s as usize)
    }
}

/// Step 7 of the tick order.
pub fn update(world: &mut World, dt: Fx) {
    for pid in 0..MAX_PACKS {
        if !world.packs[pid].active {
            continue;
        }
        prune(world, pid);
        let mut pack = world.packs[pid];
        if pack.member_count < 2 {
            disband(world, pid);
            continue;
        }

        pack.morale = aggregate_morale(world, &pack);
        if pack.roles_dirty {
            assign_roles(world, &mut pack);
        }

        pack.plan_timer = pack.plan_timer - dt;
        if pack.plan == PackPlan::None || pack.plan_timer <= Fx::ZERO {
            let next = select_plan(world, &pack);
            // Every selection re-issues the cue, so a pack that stays
            // committed keeps launching synchronized waves.
            pack.dispatched = false;
            pack.plan = next;
            pack.plan_timer = match next {
                PackPlan::Retreat => RETREAT_PLAN_TIME,
                PackPlan::Regroup => REGROUP_PLAN_TIME,
                _ => PLAN_INTERVAL,
            };
            log::debug!("pack {} plan -> {:?}", pid + 1, next);
        }

        execute_plan(world, &mut pack);
        world.packs[pid] = pack;
    }
}

/// Drop dead members, compacting the slot list and reindexing survivors.
fn prune(world: &mut World, pid: usize) {
    let pack = world.packs[pid];
    let mut kept = [0u8; MAX_PACK_MEMBERS];
    let mut n = 0u8;
    for slot in pack.member_slots() {
        if world.enemies[slot].alive {
            kept[n as usize] = slot as u8;
            world.enemies[slot].pack_index = n;
            n += 1;
        }
    }
    let p = &mut world.packs[pid];
    if n != p.member_count {
        p.roles_dirty = true;
    }
    p.members = kept;
    p.member_count = n;
}

fn disband(world: &mut World, pid: usize) {
    let pack = world.packs[pid];
    for slot in pack.member_slots() {
        world.enemies[slot].pack_id = 0;
        world.enemies[slot].role = PackRole::None;
        world.enemies[slot].has_plan_target = false;
    }
    world.packs[pid] = Pack::default();
}

fn aggregate_morale(world: &World, pack: &Pack) -> Fx {
    let mut sum = Fx::ZERO;
    for slot in pack.member_slots() {
        sum = sum + world.enemies[slot].morale;
    }
    sum / Fx::int(pack.member_count as i32)
}

/// Leader maximises intelligence·morale; the rest fall through the decision
/// tree on their own attributes.
fn assign_roles(world: &mut World, pack: &mut Pack) {
    let mut best_slot = pack.members[0] as usize;
    let mut best_score = Fx::MIN;
    for slot in pack.member_slots() {
        let e = &world.enemies[slot];
        let score = e.intelligence * e.morale;
        if score > best_score {
            best_score = score;
            best_slot = slot;
        }
    }
    pack.leader = best_slot as u8;
    for slot in pack.member_slots() {
        let e = &mut world.enemies[slot];
        e.role = if slot == best_slot {
            PackRole::Leader
        } else if e.aggression > Fx::milli(600) {
            PackRole::Bruiser
        } else if e.speed > Fx::milli(190) {
            PackRole::Skirmisher
        } else if e.intelligence > Fx::milli(700) {
            PackRole::Support
        } else {
            PackRole::Scout
        };
    }
    pack.roles_dirty = false;
}

fn select_plan(world: &World, pack: &Pack) -> PackPlan {
    // A running retreat decays into a regroup, then back to independent AI.
    if pack.plan == PackPlan::Retreat && pack.plan_timer <= Fx::ZERO {
        return PackPlan::Regroup;
    }
    if pack.plan == PackPlan::Regroup && pack.plan_timer <= Fx::ZERO {
        return PackPlan::None;
    }
    // An ambush holds until sprung (a member left Ambush state).
    if pack.plan == PackPlan::Ambush {
        let still_hidden = pack
            .member_slots()
            .all(|s| world.enemies[s].state == WolfState::Ambush);
        if still_hidden {
            return PackPlan::Ambush;
        }
    }

    let player = world.player.pos;
    let n = pack.member_count as u32;
    let in_range = pack
        .member_slots()
        .filter(|&s| {
            let e = &world.enemies[s];
            e.pos.sub(player).length() < e.attack_range * Fx::milli(1500)
        })
        .count() as u32;
    if in_range >= n.div_ceil(2) {
        return PackPlan::Commit;
    }

    let leader = &world.enemies[pack.leader as usize];
    if leader.health_fraction() < Fx::milli(400) {
        return PackPlan::Retreat;
    }

    if n >= 3 && player_isolated(world) {
        return PackPlan::Pincer;
    }

    if let Some(scout) = pack
        .member_slots()
        .find(|&s| world.enemies[s].role == PackRole::Scout)
    {
        let to_scout = world.enemies[scout].pos.sub(player).normalized();
        if world.player.facing.dot(to_scout) > Fx::ZERO {
            return PackPlan::Distract;
        }
    }

    PackPlan::None
}

/// Centre-field check: no wall within 0.2 world units.
fn player_isolated(world: &World) -> bool {
    let p = world.player.pos;
    let margin = Fx::milli(200);
    p.x > margin && p.x < Fx::ONE - margin && p.y > margin && p.y < Fx::ONE - margin
}

fn execute_plan(world: &mut World, pack: &mut Pack) {
    match pack.plan {
        PackPlan::None => {
            for slot in pack.member_slots() {
                world.enemies[slot].has_plan_target = false;
            }
        }
        PackPlan::Commit => {
            if !pack.dispatched {
                pack.dispatched = true;
                // Leader fires first; followers one frame later per index.
                // Stunned wolves sit the wave out.
                for slot in pack.member_slots() {
                    if world.enemies[slot].state == WolfState::Recover {
                        continue;
                    }
                    let idx = world.enemies[slot].pack_index;
                    ai::enter_state(&mut world.enemies[slot], WolfState::Attack, &mut world.rng.ai);
                    if slot != pack.leader as usize {
                        world.enemies[slot].state_timer = world.enemies[slot].state_timer
                            + balance::TICK_DT * Fx::int(idx as i32);
                    }
                }
            }
        }
        PackPlan::Pincer => {
            let player = world.player.pos;
            if !pack.dispatched {
                pack.dispatched = true;
                let mid = pack.member_count / 2;
                for slot in pack.member_slots() {
                    if world.enemies[slot].state == WolfState::Recover {
                        continue;
                    }
                    let idx = world.enemies[slot].pack_index;
                    let angle = if idx < mid { -Fx::THIRD_PI } else { Fx::THIRD_PI };
                    let target = player.add(Vec2::from_angle(angle).scale(balance::PINCER_OFFSET));
                    let e = &mut world.enemies[slot];
                    e.plan_target = target;
                    e.has_plan_target = true;
                    ai::enter_state(e, WolfState::Approach, &mut world.rng.ai);
                }
            }
            // Promote everyone once every member has reached its post.
            let all_in_place = pack.member_slots().all(|s| {
                let e = &world.enemies[s];
                e.state != WolfState::Approach
                    || e.pos.sub(e.plan_target).length() < balance::PINCER_ARRIVE
            });
            if all_in_place {
                for slot in pack.member_slots() {
                    if world.enemies[slot].state == WolfState::Approach {
                        world.enemies[slot].has_plan_target = false;
                        ai::enter_state(
                            &mut world.enemies[slot],
                            WolfState::Attack,
                            &mut world.rng.ai,
                        );
                    }
                }
                pack.plan = PackPlan::None;
                pack.plan_timer = PLAN_INTERVAL;
            }
        }
        PackPlan::Flank => {
            if !pack.dispatched {
                pack.dispatched = true;
                let player = world.player.pos;
                for slot in pack.member_slots() {
                    if world.enemies[slot].state == WolfState::Recover {
                        continue;
                    }
                    if slot == pack.leader as usize {
                        world.enemies[slot].has_plan_target = false;
                        ai::enter_state(
                            &mut world.enemies[slot],
                            WolfState::Approach,
                            &mut world.rng.ai,
                        );
                        continue;
                    }
                    let idx = world.enemies[slot].pack_index;
                    let angle = if idx & 1 == 0 { Fx::HALF_PI } else { -Fx::HALF_PI };
                    let target = player.add(Vec2::from_angle(angle).scale(balance::PINCER_OFFSET));
                    let e = &mut world.enemies[slot];
                    e.plan_target = target;
                    e.has_plan_target = true;
                    ai::enter_state(e, WolfState::Flank, &mut world.rng.ai);
                }
            }
        }
        PackPlan::Retreat => {
            if !pack.dispatched {
                pack.dispatched = true;
                for slot in pack.member_slots() {
                    if world.enemies[slot].state == WolfState::Recover {
                        continue;
                    }
                    world.enemies[slot].has_plan_target = false;
                    ai::enter_state(&mut world.enemies[slot], WolfState::Retreat, &mut world.rng.ai);
                }
            }
        }
        PackPlan::Distract => {
            if !pack.dispatched {
                pack.dispatched = true;
                let player = world.player.pos;
                let behind = player.sub(world.player.facing.scale(Fx::milli(120)));
                for slot in pack.member_slots() {
                    if world.enemies[slot].state == WolfState::Recover {
                        continue;
                    }
                    let e = &mut world.enemies[slot];
                    if e.role == PackRole::Scout {
                        // The scout taunts in place.
                        e.has_plan_target = false;
                        ai::enter_state(e, WolfState::Strafe, &mut world.rng.ai);
                    } else {
                        e.plan_target = behind;
                        e.has_plan_target = true;
                        ai::enter_state(e, WolfState::Flank, &mut world.rng.ai);
                    }
                }
            }
        }
        PackPlan::Ambush => {
            if !pack.dispatched {
                pack.dispatched = true;
                for slot in pack.member_slots() {
                    if world.enemies[slot].state == WolfState::Recover {
                        continue;
                    }
                    ai::enter_state(&mut world.enemies[slot], WolfState::Ambush, &mut world.rng.ai);
                }
            }
            // Sprung by any member leaving Ambush: everyone commits.
            let sprung = pack
                .member_slots()
                .any(|s| world.enemies[s].state != WolfState::Ambush);
            if sprung {
                for slot in pack.member_slots() {
                    if world.enemies[slot].state == WolfState::Ambush {
                        ai::enter_state(
                            &mut world.enemies[slot],
                            WolfState::Attack,
                            &mut world.rng.ai,
                        );
                    }
                }
                pack.plan = PackPlan::Commit;
                pack.plan_timer = PLAN_INTERVAL;
                pack.dispatched = true;
            }
        }
        PackPlan::Regroup => {
            if !pack.dispatched {
                pack.dispatched = true;
                let rally = world.enemies[pack.leader as usize].pos;
                for slot in pack.member_slots() {
                    if world.enemies[slot].state == WolfState::Recover {
                        continue;
                    }
                    let e = &mut world.enemies[slot];
                    e.plan_target = rally;
                    e.has_plan_target = true;
                    ai::enter_state(e, WolfState::Approach, &mut world.rng.ai);
                }
            }
        }
    }
}

/// Find a free pack slot, or `MAX_PACKS` when all four are live.
pub fn free_pack_slot(packs: &[Pack; MAX_PACKS]) -> usize {
    packs.iter().position(|p| !p.active).unwrap_or(MAX_PACKS)
}
