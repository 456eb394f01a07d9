//! CashOut shop, forge and healing.
//!
//! Five slots rolled from the LOOT substream, priced off the room counter.
//! Every transaction validates phase, slot and currency before touching the
//! world; failures return 0 with nothing changed.

use crate::balance;
use crate::enums::{tags, Phase, ShopKind};
use crate::fixed::Fx;
use crate::world::World;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopSlot {
    pub kind: ShopKind,
    pub cost: i32,
    pub purchased: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopState {
    pub slots: [ShopSlot; balance::SHOP_SLOTS],
    pub reroll_count: u32,
    pub heal_count: u32,
}

impl ShopState {
    pub fn clear(&mut self) {
        *self = ShopState::default();
    }
}

/// Roll the five slots. Reroll count survives so the reroll price keeps
/// climbing across rerolls within one CashOut.
pub fn generate(world: &mut World) {
    let room = world.phase.room_count;
    let rng = &mut world.rng.loot;
    for slot in world.shop.slots.iter_mut() {
        let kind = ShopKind::from_u8(rng.next_range(0, 5) as u8);
        *slot = ShopSlot {
            kind,
            cost: balance::scaled_cost(balance::shop_base_cost(kind), room),
            purchased: false,
        };
    }
    log::debug!("shop rolled for room {}", room);
}

fn in_cashout(world: &World) -> bool {
    world.phase.current == Phase::CashOut
}

/// Debit gold and essence together, or neither.
fn debit(world: &mut World, gold: i32, essence: i32) -> bool {
    if world.player.gold < gold || world.player.essence < essence {
        return false;
    }
    world.player.gold -= gold;
    world.player.essence -= essence;
    true
}

pub fn buy_slot(world: &mut World, index: usize) -> i32 {
    if !in_cashout(world) || index >= balance::SHOP_SLOTS {
        return 0;
    }
    let slot = world.shop.slots[index];
    if slot.purchased || !debit(world, slot.cost, 0) {
        return 0;
    }
    world.shop.slots[index].purchased = true;
    apply_item(world, slot.kind, slot.cost);
    1
}

fn apply_item(world: &mut World, kind: ShopKind, cost: i32) {
    match kind {
        ShopKind::Weapon => {
            world.player.mods.damage_mult = world.player.mods.damage_mult * Fx::milli(1050);
        }
        ShopKind::Armor => {
            world.player.mods.armor_bonus = world.player.mods.armor_bonus + Fx::milli(50);
        }
        ShopKind::Consumable => {
            world.player.heal_fraction(Fx::milli(250));
        }
        ShopKind::Blessing => {
            world.player.mods.stamina_regen_mult =
                world.player.mods.stamina_regen_mult * Fx::milli(1100);
        }
        ShopKind::Mystery => {
            // Resolves into one of the other items, or the cost back with
            // interest. LOOT substream, one draw.
            match world.rng.loot.next_range(0, 5) {
                0 => apply_item(world, ShopKind::Weapon, cost),
                1 => apply_item(world, ShopKind::Armor, cost),
                2 => apply_item(world, ShopKind::Consumable, cost),
                3 => apply_item(world, ShopKind::Blessing, cost),
                _ => {
                    let refund = cost + cost / 2;
                    world.player.gold = world.player.gold.saturating_add(refund);
                }
            }
        }
    }
}

pub fn forge_sharpen(world: &mut World) -> i32 {
    if !in_cashout(world)
        || !debit(
            world,
            balance::FORGE_SHARPEN_GOLD,
            balance::FORGE_SHARPEN_ESSENCE,
        )
    {
        return 0;
    }
    world.player.mods.damage_mult = world.player.mods.damage_mult * Fx::milli(1040);
    1
}

pub fn forge_reinforce(world: &mut World) -> i32 {
    if !in_cashout(world)
        || !debit(
            world,
            balance::FORGE_REINFORCE_GOLD,
            balance::FORGE_REINFORCE_ESSENCE,
        )
    {
        return 0;
    }
    world.player.mods.armor_bonus = world.player.mods.armor_bonus + Fx::milli(40);
    1
}

/// Enchant brands the weapon with the fire tag: more damage, and the run's
/// tag set picks up FIRE for choice-exclusion purposes.
pub fn forge_enchant(world: &mut World) -> i32 {
    if !in_cashout(world)
        || !debit(
            world,
            balance::FORGE_ENCHANT_GOLD,
            balance::FORGE_ENCHANT_ESSENCE,
        )
    {
        return 0;
    }
    world.player.mods.damage_mult = world.player.mods.damage_mult * Fx::milli(1060);
    world.choices.owned_tags |= tags::FIRE;
    1
}

/// Reroll the shop. Price grows by 20 gold per use within this CashOut.
pub fn forge_reroll(world: &mut World) -> i32 {
    if !in_cashout(world) {
        return 0;
    }
    let cost = balance::FORGE_REROLL_GOLD
        + balance::FORGE_REROLL_GROWTH * world.shop.reroll_count as i32;
    if !debit(world, cost, 0) {
        return 0;
    }
    world.shop.reroll_count += 1;
    generate(world);
    1
}

/// Heal half the bar. Price grows by 25 gold per use within this CashOut.
pub fn heal(world: &mut World) -> i32 {
    if !in_cashout(world) {
        return 0;
    }
    let cost = balance::HEAL_GOLD + balance::HEAL_GROWTH * world.shop.heal_count as i32;
    if !debit(world, cost, balance::HEAL_ESSENCE) {
        return 0;
    }
    world.shop.heal_count += 1;
    world.player.heal_fraction(balance::HEAL_FRACTION);
    1
}
