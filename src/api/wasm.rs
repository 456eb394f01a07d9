//! WASM façade: lifecycle, per-frame input, actions, and the flat scalar
//! query surface.
//!
//! Contract: every getter is pure, returns a primitive, and performs the
//! single `i32 → f32` conversion (`raw / 65536`) at this boundary. Indices
//! out of range return 0 (or the documented sentinel); actions return 1/0
//! status codes and never throw across the boundary.

use crate::balance;
use crate::enemy::MAX_ENEMIES;
use crate::enums::EffectKey;
use crate::fixed::{Fx, Vec2};
use crate::risk::MAX_CURSES;
use crate::world::World;
use crate::{abilities, choices, combat, shop};
use wasm_bindgen::prelude::*;

/// Hook console logging up once per page. Safe to call repeatedly.
#[wasm_bindgen]
pub fn init_logging() {
    let _ = console_log::init_with_level(log::Level::Info);
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&JsValue::from_str(concat!(
        "packhunt core ",
        env!("CARGO_PKG_VERSION"),
        " ready"
    )));
    log::info!("packhunt core {} ready", env!("CARGO_PKG_VERSION"));
}

/// The simulation object. One instance owns one world; instances are fully
/// independent and the host serialises its own access.
#[wasm_bindgen]
pub struct Game {
    world: World,
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

#[wasm_bindgen]
impl Game {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Game {
        Game {
            world: World::new(0, 0),
        }
    }

    // -------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------

    pub fn init_run(&mut self, seed: u64, start_weapon: u32) {
        self.world = World::new(seed, start_weapon);
    }

    pub fn reset_run(&mut self, new_seed: u64) {
        self.world.reset(new_seed);
    }

    /// Advance by `dt` seconds (clamped to 0.1 s, fixed-step accumulator).
    pub fn update(&mut self, dt: f32) {
        self.world.advance(Fx::from_f32(dt));
    }

    // -------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn set_player_input(
        &mut self,
        input_x: f32,
        input_y: f32,
        rolling: i32,
        jumping: i32,
        light_attack: i32,
        heavy_attack: i32,
        blocking: i32,
        special: i32,
    ) {
        let p = &mut self.world.input.pending;
        p.move_x = Fx::from_f32(input_x).clamp(-Fx::ONE, Fx::ONE);
        p.move_y = Fx::from_f32(input_y).clamp(-Fx::ONE, Fx::ONE);
        p.rolling = rolling != 0;
        p.jumping = jumping != 0;
        p.light_attack = light_attack != 0;
        p.heavy_attack = heavy_attack != 0;
        p.blocking = blocking != 0;
        p.special = special != 0;
    }

    pub fn set_blocking(&mut self, blocking: i32) {
        self.world.input.pending.blocking = blocking != 0;
    }

    // -------------------------------------------------------------------
    // Positional queries
    // -------------------------------------------------------------------

    pub fn get_x(&self) -> f32 {
        self.world.player.pos.x.to_f32()
    }

    pub fn get_y(&self) -> f32 {
        self.world.player.pos.y.to_f32()
    }

    pub fn get_vel_x(&self) -> f32 {
        self.world.player.vel.x.to_f32()
    }

    pub fn get_vel_y(&self) -> f32 {
        self.world.player.vel.y.to_f32()
    }

    pub fn get_speed(&self) -> f32 {
        self.world.player.vel.length().to_f32()
    }

    pub fn get_facing_x(&self) -> f32 {
        self.world.player.facing.x.to_f32()
    }

    pub fn get_facing_y(&self) -> f32 {
        self.world.player.facing.y.to_f32()
    }

    // -------------------------------------------------------------------
    // Resources and state flags
    // -------------------------------------------------------------------

    pub fn get_hp(&self) -> f32 {
        self.world.player.hp.to_f32()
    }

    pub fn get_stamina(&self) -> f32 {
        self.world.player.stamina.to_f32()
    }

    pub fn get_gold(&self) -> i32 {
        self.world.player.gold
    }

    pub fn get_essence(&self) -> i32 {
        self.world.player.essence
    }

    pub fn get_is_grounded(&self) -> i32 {
        self.world.player.grounded as i32
    }

    pub fn get_is_rolling(&self) -> i32 {
        self.world.player.rolling as i32
    }

    pub fn get_is_invulnerable(&self) -> i32 {
        self.world.player.invulnerable() as i32
    }

    pub fn get_is_wall_sliding(&self) -> i32 {
        self.world.player.wall_sliding as i32
    }

    pub fn get_jump_count(&self) -> i32 {
        self.world.player.jump_count as i32
    }

    // -------------------------------------------------------------------
    // Combat queries
    // -------------------------------------------------------------------

    pub fn get_attack_state(&self) -> i32 {
        self.world.player.combat.attack_state as i32
    }

    pub fn get_combo_count(&self) -> i32 {
        self.world.player.combat.combo_count as i32
    }

    pub fn get_combo_window_remaining(&self) -> f32 {
        self.world.player.combat.combo_timer.to_f32()
    }

    /// Seconds of perfect-parry window left on the current block; 0 when not
    /// blocking or past the window.
    pub fn get_parry_window(&self) -> f32 {
        if !self.world.player.combat.block_active {
            return 0.0;
        }
        (balance::PARRY_WINDOW - self.world.player.combat.block_timer)
            .max(Fx::ZERO)
            .to_f32()
    }

    pub fn get_counter_window_remaining(&self) -> f32 {
        self.world.player.combat.counter_timer.to_f32()
    }

    pub fn get_can_counter(&self) -> i32 {
        (self.world.player.combat.counter_timer > Fx::ZERO) as i32
    }

    pub fn get_has_hyperarmor(&self) -> i32 {
        combat::has_hyperarmor(&self.world.player) as i32
    }

    pub fn get_armor_value(&self) -> f32 {
        self.world.player.effective_armor().to_f32()
    }

    pub fn get_can_feint_heavy(&self) -> i32 {
        combat::can_feint_heavy(&self.world.player) as i32
    }

    pub fn get_is_blocking(&self) -> i32 {
        self.world.player.combat.block_active as i32
    }

    /// Latest incoming-attack outcome: -1 ignored, 0 hit, 1 blocked,
    /// 2 perfect parry.
    pub fn get_last_attack_result(&self) -> i32 {
        self.world.last_attack_outcome
    }

    pub fn get_weapon_id(&self) -> i32 {
        self.world.player.weapon_id as i32
    }

    // -------------------------------------------------------------------
    // Ability surface
    // -------------------------------------------------------------------

    pub fn start_charging_bash(&mut self) -> i32 {
        abilities::start_charging_bash(&mut self.world)
    }

    pub fn release_bash(&mut self) -> i32 {
        abilities::release_bash(&mut self.world)
    }

    pub fn get_bash_charge(&self) -> f32 {
        self.world.player.ability.bash_charge.to_f32()
    }

    pub fn get_is_bash_charging(&self) -> i32 {
        self.world.player.ability.bash_charging as i32
    }

    pub fn get_is_bash_active(&self) -> i32 {
        self.world.player.ability.bash_active as i32
    }

    pub fn get_bash_x(&self) -> f32 {
        self.world.player.ability.bash_pos.x.to_f32()
    }

    pub fn get_bash_y(&self) -> f32 {
        self.world.player.ability.bash_pos.y.to_f32()
    }

    pub fn get_bash_radius(&self) -> f32 {
        self.world.player.ability.bash_radius.to_f32()
    }

    pub fn start_berserker_charge(&mut self) -> i32 {
        abilities::start_berserker_charge(&mut self.world)
    }

    pub fn cancel_berserker_charge(&mut self) -> i32 {
        abilities::cancel_berserker_charge(&mut self.world)
    }

    pub fn get_is_berserker_active(&self) -> i32 {
        self.world.player.ability.berserker_active as i32
    }

    pub fn get_berserker_timer(&self) -> f32 {
        self.world.player.ability.berserker_timer.to_f32()
    }

    pub fn get_berserker_cooldown(&self) -> f32 {
        self.world.player.ability.berserker_cooldown.to_f32()
    }

    pub fn execute_flow_dash(&mut self) -> i32 {
        abilities::execute_flow_dash(&mut self.world)
    }

    pub fn get_is_flow_dash_active(&self) -> i32 {
        self.world.player.ability.flow_active as i32
    }

    pub fn get_flow_dash_timer(&self) -> f32 {
        self.world.player.ability.flow_timer.to_f32()
    }

    pub fn get_flow_dash_combo(&self) -> i32 {
        self.world.player.ability.flow_combo as i32
    }

    pub fn get_flow_dash_cooldown(&self) -> f32 {
        self.world.player.ability.flow_cooldown.to_f32()
    }

    pub fn get_can_dash_cancel(&self) -> i32 {
        abilities::can_dash_cancel(&self.world) as i32
    }

    // -------------------------------------------------------------------
    // Enemy queries (index out of range -> 0)
    // -------------------------------------------------------------------

    pub fn get_enemy_count(&self) -> i32 {
        crate::enemy::alive_count(&self.world.enemies) as i32
    }

    pub fn get_enemy_x(&self, i: usize) -> f32 {
        self.enemy(i).map_or(0.0, |e| e.pos.x.to_f32())
    }

    pub fn get_enemy_y(&self, i: usize) -> f32 {
        self.enemy(i).map_or(0.0, |e| e.pos.y.to_f32())
    }

    pub fn get_enemy_vx(&self, i: usize) -> f32 {
        self.enemy(i).map_or(0.0, |e| e.vel.x.to_f32())
    }

    pub fn get_enemy_vy(&self, i: usize) -> f32 {
        self.enemy(i).map_or(0.0, |e| e.vel.y.to_f32())
    }

    pub fn get_enemy_type(&self, i: usize) -> i32 {
        self.enemy(i).map_or(0, |e| e.kind as i32)
    }

    pub fn get_enemy_state(&self, i: usize) -> i32 {
        self.enemy(i).map_or(0, |e| e.state as i32)
    }

    pub fn get_enemy_role(&self, i: usize) -> i32 {
        self.enemy(i).map_or(0, |e| e.role as i32)
    }

    pub fn get_enemy_emotion(&self, i: usize) -> i32 {
        self.enemy(i).map_or(0, |e| e.emotion as i32)
    }

    pub fn get_enemy_fatigue(&self, i: usize) -> f32 {
        self.enemy(i).map_or(0.0, |e| e.fatigue.to_f32())
    }

    pub fn get_enemy_health_fraction(&self, i: usize) -> f32 {
        self.enemy(i).map_or(0.0, |e| e.health_fraction().to_f32())
    }

    pub fn get_enemy_body_stretch(&self, i: usize) -> f32 {
        self.enemy(i).map_or(0.0, |e| e.body_stretch.to_f32())
    }

    pub fn get_enemy_pack_id(&self, i: usize) -> i32 {
        self.enemy(i).map_or(0, |e| e.pack_id as i32)
    }

    // -------------------------------------------------------------------
    // Phase queries
    // -------------------------------------------------------------------

    pub fn get_phase(&self) -> i32 {
        self.world.phase.current as i32
    }

    pub fn get_room_count(&self) -> i32 {
        self.world.phase.room_count as i32
    }

    pub fn get_current_biome(&self) -> i32 {
        self.world.phase.biome_id as i32
    }

    pub fn get_time_seconds(&self) -> f32 {
        self.world.time_seconds.to_f32()
    }

    pub fn get_escalation_level(&self) -> f32 {
        self.world.phase.escalation_level.to_f32()
    }

    // -------------------------------------------------------------------
    // Choice surface
    // -------------------------------------------------------------------

    pub fn get_choice_count(&self) -> i32 {
        self.world.choices.choice_count as i32
    }

    pub fn get_choice_id(&self, slot: usize) -> i32 {
        self.world.choices.offer.get(slot).map_or(0, |&id| id as i32)
    }

    pub fn get_choice_rarity(&self, slot: usize) -> i32 {
        choices::offer_rarity(&self.world.choices, slot)
    }

    pub fn get_choice_archetype(&self, slot: usize) -> i32 {
        choices::offer_archetype(&self.world.choices, slot)
    }

    pub fn commit_choice(&mut self, id: u32) -> i32 {
        self.world.commit_choice(id)
    }

    // -------------------------------------------------------------------
    // Risk surface
    // -------------------------------------------------------------------

    pub fn get_curse_count(&self) -> i32 {
        self.world.risk.active_curse_count() as i32
    }

    pub fn get_curse_type(&self, i: usize) -> i32 {
        if i >= MAX_CURSES || !self.world.risk.curses[i].active {
            return -1;
        }
        self.world.risk.curses[i].kind as i32
    }

    pub fn get_curse_intensity(&self, i: usize) -> f32 {
        if i >= MAX_CURSES || !self.world.risk.curses[i].active {
            return 0.0;
        }
        self.world.risk.curses[i].intensity.to_f32()
    }

    pub fn get_risk_multiplier(&self) -> f32 {
        self.world.risk.risk_multiplier().to_f32()
    }

    pub fn get_elite_active(&self) -> i32 {
        self.world.risk.elite_active as i32
    }

    pub fn escape_risk(&mut self) -> i32 {
        self.world.escape_risk()
    }

    // -------------------------------------------------------------------
    // CashOut surface
    // -------------------------------------------------------------------

    pub fn get_shop_slot_kind(&self, i: usize) -> i32 {
        self.world.shop.slots.get(i).map_or(-1, |s| s.kind as i32)
    }

    pub fn get_shop_slot_cost(&self, i: usize) -> i32 {
        self.world.shop.slots.get(i).map_or(0, |s| s.cost)
    }

    pub fn get_shop_slot_purchased(&self, i: usize) -> i32 {
        self.world.shop.slots.get(i).map_or(0, |s| s.purchased as i32)
    }

    pub fn buy_shop_slot(&mut self, i: usize) -> i32 {
        shop::buy_slot(&mut self.world, i)
    }

    pub fn forge_sharpen(&mut self) -> i32 {
        shop::forge_sharpen(&mut self.world)
    }

    pub fn forge_reinforce(&mut self) -> i32 {
        shop::forge_reinforce(&mut self.world)
    }

    pub fn forge_enchant(&mut self) -> i32 {
        shop::forge_enchant(&mut self.world)
    }

    pub fn forge_reroll(&mut self) -> i32 {
        shop::forge_reroll(&mut self.world)
    }

    pub fn buy_heal(&mut self) -> i32 {
        shop::heal(&mut self.world)
    }

    pub fn exit_cashout(&mut self) -> i32 {
        self.world.exit_cashout()
    }

    // -------------------------------------------------------------------
    // Upgrade surface
    // -------------------------------------------------------------------

    pub fn upgrade_can_purchase(&self, id: u32) -> i32 {
        self.world
            .upgrades
            .can_purchase(id, self.world.player.essence)
    }

    pub fn upgrade_purchase(&mut self, id: u32) -> i32 {
        let mut essence = self.world.player.essence;
        let ok = self.world.upgrades.purchase(id, &mut essence);
        self.world.player.essence = essence;
        ok
    }

    pub fn upgrade_get_effect_scalar(&self, effect_id: i32) -> f32 {
        let key = match effect_id {
            0 => EffectKey::Damage,
            1 => EffectKey::Reach,
            2 => EffectKey::StaminaMax,
            3 => EffectKey::HpMax,
            4 => EffectKey::GoldGain,
            5 => EffectKey::EssenceGain,
            6 => EffectKey::CooldownReduction,
            _ => return 1.0,
        };
        self.world.upgrades.effect_scalar(key).to_f32()
    }

    pub fn upgrade_reset_class(&mut self, class_id: i32) {
        if !(0..=2).contains(&class_id) {
            return;
        }
        let class = crate::enums::ClassId::from_u8(class_id as u8);
        let mut essence = self.world.player.essence;
        let mut upgrades = self.world.upgrades;
        upgrades.reset_class(class, &mut essence);
        self.world.upgrades = upgrades;
        self.world.player.essence = essence;
    }

    pub fn upgrade_owned(&self, id: u32) -> i32 {
        self.world.upgrades.owns(id) as i32
    }

    /// Test-harness faucet.
    pub fn upgrade_add_essence(&mut self, amount: i32) {
        self.world.player.essence = self.world.player.essence.saturating_add(amount.max(0));
    }

    // -------------------------------------------------------------------
    // Barrels
    // -------------------------------------------------------------------

    /// Returns the barrel handle, or 0 when the pool is exhausted.
    pub fn spawn_barrel(&mut self, x: f32, y: f32) -> u32 {
        self.world
            .spawn_barrel(Vec2::new(Fx::from_f32(x), Fx::from_f32(y)))
    }

    pub fn throw_barrel(&mut self, handle: u32, vx: f32, vy: f32) -> i32 {
        self.world
            .throw_barrel(handle, Vec2::new(Fx::from_f32(vx), Fx::from_f32(vy)))
    }

    pub fn clear_all_barrels(&mut self) {
        self.world.clear_all_barrels();
    }

    pub fn get_barrel_count(&self) -> i32 {
        self.world.barrels.alive_count() as i32
    }

    // -------------------------------------------------------------------
    // Rollback + debug
    // -------------------------------------------------------------------

    pub fn save_state(&self) -> Vec<u8> {
        self.world.save_state()
    }

    pub fn load_state(&mut self, bytes: &[u8]) -> i32 {
        self.world.load_state(bytes)
    }

    /// Force a phase transition (test harness hook).
    pub fn force_phase_transition(&mut self, phase_id: i32) -> i32 {
        self.world.force_phase_transition(phase_id)
    }

    /// Deterministic debug spawn at an explicit position.
    pub fn spawn_wolf(&mut self, x: f32, y: f32) -> i32 {
        let slot = self.world.spawn_wolf_at(
            crate::enums::WolfKind::Normal,
            Vec2::new(Fx::from_f32(x), Fx::from_f32(y)),
        );
        if slot >= MAX_ENEMIES {
            -1
        } else {
            slot as i32
        }
    }

    /// Structured world dump for tooling; never feeds back into simulation.
    pub fn debug_state_js(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.world).unwrap_or(JsValue::NULL)
    }
}

impl Game {
    fn enemy(&self, i: usize) -> Option<&crate::enemy::Enemy> {
        self.world.enemies.get(i).filter(|e| e.alive)
    }

    /// Native-side access for the CLI and integration tests.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
