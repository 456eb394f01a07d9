//! Eight-phase run driver.
//!
//! Transitions are atomic: exit actions for the old phase run, per-phase
//! state is cleared, then the new phase's enter actions run, all inside one
//! `transition_to`. During menu-like phases (Choose, PowerUp, CashOut, Reset)
//! the world is frozen — physics, combat and AI do not step, only sim time
//! advances.

use crate::balance;
use crate::choices;
use crate::enemy;
use crate::enums::Phase;
use crate::fixed::Fx;
use crate::shop;
use crate::world::World;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseState {
    pub current: Phase,
    pub room_count: u32,
    pub biome_id: u32,
    pub explore_timer: Fx,
    pub combat_timer: Fx,
    pub risk_timer: Fx,
    pub escalate_timer: Fx,
    pub escalation_level: Fx,
    /// One Risk / one Escalate per loop (a loop ends at CashOut).
    pub loop_risked: bool,
    pub loop_escalated: bool,
}

impl Default for PhaseState {
    fn default() -> Self {
        PhaseState {
            current: Phase::Explore,
            room_count: 0,
            biome_id: 0,
            explore_timer: Fx::ZERO,
            combat_timer: Fx::ZERO,
            risk_timer: Fx::ZERO,
            escalate_timer: Fx::ZERO,
            escalation_level: Fx::ZERO,
            loop_risked: false,
            loop_escalated: false,
        }
    }
}

/// Phases in which the combat simulation actually steps.
pub fn world_active(phase: Phase) -> bool {
    matches!(
        phase,
        Phase::Explore | Phase::Fight | Phase::Risk | Phase::Escalate
    )
}

/// Step 2 of the tick order: advance the current phase's clock.
pub fn pre_step(world: &mut World, dt: Fx) {
    let p = &mut world.phase;
    match p.current {
        Phase::Explore => p.explore_timer = p.explore_timer + dt,
        Phase::Fight => p.combat_timer = p.combat_timer + dt,
        Phase::Risk => p.risk_timer = p.risk_timer + dt,
        Phase::Escalate => p.escalate_timer = p.escalate_timer + dt,
        _ => {}
    }
}

/// Step 8 of the tick order: completion checks and transitions.
pub fn post_step(world: &mut World) {
    if world.player.hp <= Fx::ZERO && world.phase.current != Phase::Reset {
        transition_to(world, Phase::Reset);
        return;
    }
    let alive = enemy::alive_count(&world.enemies);
    match world.phase.current {
        Phase::Explore => {
            if world.phase.explore_timer >= balance::EXPLORE_DURATION {
                transition_to(world, Phase::Fight);
            }
        }
        Phase::Fight => {
            if alive == 0 && world.phase.combat_timer > balance::FIGHT_MIN_COMBAT_TIME {
                transition_to(world, Phase::Choose);
            }
        }
        Phase::Choose => {} // leaves via commit_choice
        Phase::PowerUp => {
            let next = next_after_powerup(world);
            transition_to(world, next);
        }
        Phase::Risk => {
            if world.phase.risk_timer >= balance::RISK_OBJECTIVE_TIME {
                let bonus = world.risk.settle_bonus(false);
                world.player.gold = world.player.gold.saturating_add(bonus);
                let next = next_after_risk(world);
                transition_to(world, next);
            }
        }
        Phase::Escalate => {
            if alive == 0 && world.phase.escalate_timer >= balance::ESCALATE_MIN_TIME {
                transition_to(world, Phase::CashOut);
            }
        }
        Phase::CashOut => {} // leaves via exit_cashout, or death above
        Phase::Reset => {}   // leaves via reset_run
    }
}

/// PowerUp routing: Escalate once past its gate, else Risk once past its
/// gate, else straight back to Explore.
fn next_after_powerup(world: &World) -> Phase {
    let c = world.choices.choice_count;
    if c >= balance::ESCALATE_GATE_CHOICES && !world.phase.loop_escalated {
        Phase::Escalate
    } else if c >= balance::RISK_GATE_CHOICES && !world.phase.loop_risked {
        Phase::Risk
    } else {
        Phase::Explore
    }
}

pub fn next_after_risk(world: &World) -> Phase {
    if world.choices.choice_count >= balance::ESCALATE_GATE_CHOICES
        && !world.phase.loop_escalated
    {
        Phase::Escalate
    } else {
        Phase::Explore
    }
}

pub fn transition_to(world: &mut World, next: Phase) {
    let prev = world.phase.current;
    if prev == next {
        return;
    }

    // Exit actions.
    match prev {
        Phase::Risk => world.risk.clear(),
        Phase::CashOut => {
            world.shop.clear();
            world.phase.loop_risked = false;
            world.phase.loop_escalated = false;
        }
        _ => {}
    }

    world.phase.current = next;
    log::debug!("phase {:?} -> {:?} (room {})", prev, next, world.phase.room_count);

    // Enter actions; per-phase state is reset before the phase runs.
    match next {
        Phase::Explore => {
            world.phase.explore_timer = Fx::ZERO;
        }
        Phase::Fight => {
            world.phase.combat_timer = Fx::ZERO;
            if prev == Phase::Explore {
                world.phase.room_count += 1;
                world.phase.biome_id = world.phase.room_count / 5 % 3;
            }
            world.spawn_room();
        }
        Phase::Choose => {
            choices::generate(world);
        }
        Phase::PowerUp => {}
        Phase::Risk => {
            world.phase.risk_timer = Fx::ZERO;
            world.phase.loop_risked = true;
            let level = Fx::from_ratio(world.phase.room_count.min(20) as i32, 20);
            let mut risk = world.risk;
            risk.enter(level, &mut world.rng.phase);
            world.risk = risk;
            world.spawn_risk_wave();
        }
        Phase::Escalate => {
            world.phase.escalate_timer = Fx::ZERO;
            world.phase.loop_escalated = true;
            world.phase.escalation_level = escalation_level(world.phase.room_count);
            world.spawn_escalate_wave();
        }
        Phase::CashOut => {
            shop::generate(world);
        }
        Phase::Reset => {
            world.clear_combatants();
        }
    }
}

/// `min(1, (room_count − 15) / 20)`, floored at zero.
pub fn escalation_level(room_count: u32) -> Fx {
    let over = room_count.saturating_sub(balance::ESCALATION_ROOM_FLOOR);
    Fx::from_ratio(over.min(balance::ESCALATION_ROOM_SPAN) as i32, balance::ESCALATION_ROOM_SPAN as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalation_level_ramp() {
        assert_eq!(escalation_level(0), Fx::ZERO);
        assert_eq!(escalation_level(15), Fx::ZERO);
        assert_eq!(escalation_level(25), Fx::HALF);
        assert_eq!(escalation_level(35), Fx::ONE);
        assert_eq!(escalation_level(100), Fx::ONE);
    }

    #[test]
    fn frozen_phases() {
        assert!(world_active(Phase::Explore));
        assert!(world_active(Phase::Fight));
        assert!(world_active(Phase::Risk));
        assert!(world_active(Phase::Escalate));
        assert!(!world_active(Phase::Choose));
        assert!(!world_active(Phase::PowerUp));
        assert!(!world_active(Phase::CashOut));
        assert!(!world_active(Phase::Reset));
    }
}
