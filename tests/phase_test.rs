//! Phase machine, choice pity, shop and upgrade flows.

mod common;

use common::{run_ticks, v2};
use packhunt_core::enums::{Phase, WolfKind};
use packhunt_core::fixed::{Fx, Vec2};
use packhunt_core::{Game, World};

#[test]
fn explore_fight_choose_powerup_explore_cycle() {
    let mut w = World::new(3, 0);

    // Explore runs out into Fight, which spawns room 1.
    run_ticks(&mut w, 130);
    assert_eq!(w.phase.current, Phase::Fight);
    assert_eq!(w.phase.room_count, 1);
    let alive = packhunt_core::enemy::alive_count(&w.enemies);
    assert_eq!(alive, 2);

    // Fight needs both conditions: everything dead AND five combat seconds.
    for i in 0..packhunt_core::enemy::MAX_ENEMIES {
        if w.enemies[i].alive {
            w.damage_enemy(i, Fx::int(100_000), Vec2::ZERO);
        }
    }
    run_ticks(&mut w, 60);
    assert_eq!(w.phase.current, Phase::Fight, "five-second floor holds");
    run_ticks(&mut w, 300);
    assert_eq!(w.phase.current, Phase::Choose);

    // An offer is up; committing it routes through PowerUp back to Explore.
    let offered = w.choices.offer.iter().find(|&&id| id != 0).copied().unwrap();
    assert_eq!(w.commit_choice(9999), 0, "unknown id is a no-op");
    assert_eq!(w.commit_choice(offered), 1);
    assert_eq!(w.phase.current, Phase::PowerUp);
    run_ticks(&mut w, 1);
    assert_eq!(w.phase.current, Phase::Explore);
    assert_eq!(w.choices.choice_count, 1);
}

#[test]
fn world_freezes_during_choose() {
    let mut w = World::new(3, 0);
    run_ticks(&mut w, 130);
    let slot = w.spawn_wolf_at(WolfKind::Normal, v2(0.9, 0.9));
    w.force_phase_transition(Phase::Choose as i32);
    let before = w.enemies[slot];
    run_ticks(&mut w, 120);
    assert_eq!(w.enemies[slot], before, "AI frozen in a menu phase");
    assert!(w.time_seconds > Fx::int(2), "but the sim clock still runs");
}

#[test]
fn player_death_resets_the_run() {
    let mut w = World::new(3, 0);
    run_ticks(&mut w, 10);
    w.player.hp = Fx::ZERO;
    run_ticks(&mut w, 1);
    assert_eq!(w.phase.current, Phase::Reset);
    assert_eq!(packhunt_core::enemy::alive_count(&w.enemies), 0);
    // Reset is inert until the host starts a new run.
    run_ticks(&mut w, 600);
    assert_eq!(w.phase.current, Phase::Reset);
    w.reset(3);
    assert_eq!(w.phase.current, Phase::Explore);
    assert_eq!(w.player.hp, Fx::ONE);
}

#[test]
fn rare_pity_forces_a_rare_within_four_offers() {
    let mut g = Game::new();
    g.init_run(1, 0);

    let mut common_streak = 0u32;
    for _ in 0..16 {
        // Cycle PowerUp -> Choose to regenerate the offer.
        g.force_phase_transition(Phase::PowerUp as i32);
        g.force_phase_transition(Phase::Choose as i32);
        let has_rare = (0..3).any(|s| g.get_choice_rarity(s) >= 1);
        if has_rare {
            common_streak = 0;
        } else {
            common_streak += 1;
        }
        assert!(
            common_streak <= 3,
            "a fourth consecutive common-only offer violates the pity timer"
        );
    }
}

#[test]
fn super_pity_forces_a_legendary_on_the_thirtieth_offer() {
    let mut g = Game::new();
    g.init_run(1, 0);
    for gen in 1..=30 {
        g.force_phase_transition(Phase::PowerUp as i32);
        g.force_phase_transition(Phase::Choose as i32);
        if gen == 30 {
            let has_legendary = (0..3).any(|s| g.get_choice_rarity(s) == 2);
            assert!(has_legendary, "offer 30 must carry a legendary");
        }
    }
}

#[test]
fn offers_are_one_per_archetype_in_canonical_order() {
    let mut g = Game::new();
    g.init_run(77, 0);
    g.force_phase_transition(Phase::Choose as i32);
    assert_eq!(g.get_choice_archetype(0), 0); // Safe
    assert_eq!(g.get_choice_archetype(1), 1); // Spicy
    assert_eq!(g.get_choice_archetype(2), 2); // Weird
    assert_eq!(g.get_choice_archetype(3), -1);
}

#[test]
fn shop_refuses_underfunded_purchases() {
    let mut g = Game::new();
    g.init_run(99, 0);
    g.force_phase_transition(Phase::CashOut as i32);

    let cost = g.get_shop_slot_cost(0);
    assert!(cost > 0);
    assert_eq!(g.get_gold(), 0);
    assert_eq!(g.buy_shop_slot(0), 0);
    assert_eq!(g.get_gold(), 0);
    assert_eq!(g.get_shop_slot_purchased(0), 0);

    g.world_mut().player.gold = 10_000;
    assert_eq!(g.buy_shop_slot(0), 1);
    assert_eq!(g.get_gold(), 10_000 - cost);
    assert_eq!(g.get_shop_slot_purchased(0), 1);
    // A slot sells once.
    assert_eq!(g.buy_shop_slot(0), 0);
    assert_eq!(g.buy_shop_slot(99), 0);
}

#[test]
fn forge_and_heal_prices_grow_per_use() {
    let mut g = Game::new();
    g.init_run(99, 0);
    g.force_phase_transition(Phase::CashOut as i32);
    g.world_mut().player.gold = 10_000;
    g.world_mut().player.essence = 1_000;
    g.world_mut().player.hp = Fx::milli(100);

    // Heal: 50g+5e, then +25g per use.
    let gold0 = g.get_gold();
    assert_eq!(g.buy_heal(), 1);
    assert_eq!(g.get_gold(), gold0 - 50);
    assert!(g.get_hp() > 0.55);
    assert_eq!(g.buy_heal(), 1);
    assert_eq!(g.get_gold(), gold0 - 50 - 75);

    // Reroll: 20g, then +20g per use; the slots re-randomise.
    let gold1 = g.get_gold();
    assert_eq!(g.forge_reroll(), 1);
    assert_eq!(g.get_gold(), gold1 - 20);
    assert_eq!(g.forge_reroll(), 1);
    assert_eq!(g.get_gold(), gold1 - 20 - 40);

    assert_eq!(g.forge_sharpen(), 1);
    assert_eq!(g.forge_reinforce(), 1);
    assert_eq!(g.forge_enchant(), 1);

    // Outside CashOut everything refuses.
    assert_eq!(g.exit_cashout(), 1);
    assert_eq!(g.get_phase(), Phase::Explore as i32);
    assert_eq!(g.buy_heal(), 0);
    assert_eq!(g.forge_sharpen(), 0);
    assert_eq!(g.buy_shop_slot(0), 0);
}

#[test]
fn upgrade_purchase_is_transactional_through_the_facade() {
    let mut g = Game::new();
    g.init_run(99, 0);
    g.upgrade_add_essence(10);
    assert_eq!(g.get_essence(), 10);

    // Node 107 costs 25 (and has prereqs): refused, essence intact.
    assert_eq!(g.upgrade_purchase(107), 0);
    assert_eq!(g.get_essence(), 10);

    // Node 301 is a root costing 8.
    assert_eq!(g.upgrade_can_purchase(301), 1);
    assert_eq!(g.upgrade_purchase(301), 1);
    assert_eq!(g.get_essence(), 2);
    assert_eq!(g.upgrade_can_purchase(301), 0);
    assert_eq!(g.upgrade_owned(301), 1);

    // Effect scalar reflects ownership (301 is reach 1.05).
    let reach = g.upgrade_get_effect_scalar(1);
    assert!((reach - 1.05).abs() < 1e-3);

    // Reset refunds in full and is idempotent.
    g.upgrade_reset_class(2);
    assert_eq!(g.get_essence(), 10);
    assert_eq!(g.upgrade_owned(301), 0);
    g.upgrade_reset_class(2);
    assert_eq!(g.get_essence(), 10);
}

#[test]
fn risk_phase_draws_curses_and_escape_is_stamina_gated() {
    let mut g = Game::new();
    g.init_run(51, 0);
    g.force_phase_transition(Phase::Risk as i32);
    let n = g.get_curse_count();
    assert!((1..=3).contains(&n));
    assert!(g.get_risk_multiplier() > 1.0);
    for i in 0..n as usize {
        assert!(g.get_curse_type(i) >= 0);
        assert!(g.get_curse_intensity(i) > 0.0);
    }
    assert_eq!(g.get_curse_type(3), -1);

    // Too tired to run.
    g.world_mut().player.stamina = Fx::milli(300);
    assert_eq!(g.escape_risk(), 0);
    assert_eq!(g.get_phase(), Phase::Risk as i32);

    g.world_mut().player.stamina = Fx::ONE;
    assert_eq!(g.escape_risk(), 1);
    assert_ne!(g.get_phase(), Phase::Risk as i32);
    assert_eq!(g.get_curse_count(), 0);
    // Escape outside Risk refuses.
    assert_eq!(g.escape_risk(), 0);
}

#[test]
fn risk_objective_settles_the_gold_bonus() {
    let mut w = World::new(51, 0);
    w.force_phase_transition(Phase::Risk as i32);
    let gold0 = w.player.gold;
    // Kill the risk wave: its base gold is tracked for settlement.
    for i in 0..packhunt_core::enemy::MAX_ENEMIES {
        if w.enemies[i].alive {
            w.damage_enemy(i, Fx::int(100_000), Vec2::ZERO);
        }
    }
    let base_earned = w.player.gold - gold0;
    assert!(base_earned > 0);
    assert!(w.risk.phase_gold >= base_earned);
    // Survive the objective timer; the bonus lands on exit.
    run_ticks(&mut w, 13 * 60);
    assert_ne!(w.phase.current, Phase::Risk);
    assert!(w.player.gold > gold0 + base_earned);
}

#[test]
fn escalate_spawns_scaled_wave_and_miniboss() {
    let mut w = World::new(60, 0);
    w.phase.room_count = 35; // escalation level 1.0
    w.player.mods.damage_taken_mult = Fx::ZERO; // survive the wait
    w.force_phase_transition(Phase::Escalate as i32);
    assert_eq!(w.phase.escalation_level, Fx::ONE);

    let omega = w
        .enemies
        .iter()
        .find(|e| e.alive && e.kind == WolfKind::Omega)
        .expect("miniboss spawns at full escalation");
    assert_eq!(omega.max_health, Fx::int(750)); // 150 × 5
    assert_ne!(omega.modifiers, 0, "miniboss carries a guaranteed modifier");

    // Clearing the wave cashes the loop out.
    run_ticks(&mut w, 200);
    for i in 0..packhunt_core::enemy::MAX_ENEMIES {
        if w.enemies[i].alive {
            w.damage_enemy(i, Fx::int(100_000), Vec2::ZERO);
        }
    }
    run_ticks(&mut w, 10);
    assert_eq!(w.phase.current, Phase::CashOut);
}

#[test]
fn powerup_routes_by_progression_gates() {
    // Below both gates: straight back to Explore.
    let mut w = World::new(70, 0);
    w.force_phase_transition(Phase::PowerUp as i32);
    run_ticks(&mut w, 1);
    assert_eq!(w.phase.current, Phase::Explore);

    // Past the risk gate.
    let mut w = World::new(70, 0);
    w.choices.choice_count = 9;
    w.force_phase_transition(Phase::PowerUp as i32);
    run_ticks(&mut w, 1);
    assert_eq!(w.phase.current, Phase::Risk);

    // Past the escalate gate.
    let mut w = World::new(70, 0);
    w.choices.choice_count = 15;
    w.force_phase_transition(Phase::PowerUp as i32);
    run_ticks(&mut w, 1);
    assert_eq!(w.phase.current, Phase::Escalate);

    // Each loop runs Risk only once.
    let mut w = World::new(70, 0);
    w.choices.choice_count = 9;
    w.phase.loop_risked = true;
    w.force_phase_transition(Phase::PowerUp as i32);
    run_ticks(&mut w, 1);
    assert_eq!(w.phase.current, Phase::Explore);
}

#[test]
fn biome_follows_room_progression() {
    let mut w = World::new(80, 0);
    w.player.mods.damage_taken_mult = Fx::ZERO; // isolate the phase machine
    for expected_room in 1..=6u32 {
        // Let Explore expire into Fight, clear, commit, loop.
        while w.phase.current != Phase::Fight {
            run_ticks(&mut w, 30);
        }
        assert_eq!(w.phase.room_count, expected_room);
        assert_eq!(w.phase.biome_id, w.phase.room_count / 5 % 3);
        for i in 0..packhunt_core::enemy::MAX_ENEMIES {
            if w.enemies[i].alive {
                w.damage_enemy(i, Fx::int(100_000), Vec2::ZERO);
            }
        }
        while w.phase.current != Phase::Choose {
            run_ticks(&mut w, 30);
            // Late rooms can respawn mid-wait; keep clearing.
            for i in 0..packhunt_core::enemy::MAX_ENEMIES {
                if w.enemies[i].alive {
                    w.damage_enemy(i, Fx::int(100_000), Vec2::ZERO);
                }
            }
        }
        let offered = w.choices.offer.iter().find(|&&id| id != 0).copied().unwrap();
        assert_eq!(w.commit_choice(offered), 1);
        run_ticks(&mut w, 1);
    }
}
