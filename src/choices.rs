//! Choice generation and commitment.
//!
//! On entering Choose the world samples one entry per archetype from the
//! fixed 18-entry pool, honouring tag exclusions, the per-run rare pity and
//! the global legendary super-pity. Draw order is part of the determinism
//! contract: (1) pity checks, (2) forced-rarity slot draws, (3) archetype
//! pool sampling in canonical order [Safe, Spicy, Weird].

use crate::balance::{self, ChoiceDef, ChoiceEffect};
use crate::enums::{tags, Archetype, Phase, Rarity};
use crate::rng::XorShift64;
use crate::world::World;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceState {
    /// Offered choice ids in canonical order; 0 marks an empty slot.
    pub offer: [u32; 3],
    /// Bit per pool index of entries already taken this run.
    pub taken_mask: u32,
    /// Tags owned by the run; used for conflict exclusion.
    pub owned_tags: u32,
    pub rounds_since_rare: u32,
    /// Total offers generated this run (super-pity counter).
    pub total_offers: u32,
    /// Committed choices this run (progression gates).
    pub choice_count: u32,
}

fn pool_index(id: u32) -> Option<usize> {
    balance::CHOICE_POOL.iter().position(|c| c.id == id)
}

/// Tag conflict: the run owns one side of an exclusion pair and the entry
/// carries the other.
fn conflicts(owned: u32, entry_tags: u32) -> bool {
    tags::EXCLUSION_PAIRS.iter().any(|&(a, b)| {
        (owned & a != 0 && entry_tags & b != 0) || (owned & b != 0 && entry_tags & a != 0)
    })
}

fn eligible(state: &ChoiceState, arch: Archetype) -> Vec<&'static ChoiceDef> {
    balance::CHOICE_POOL
        .iter()
        .enumerate()
        .filter(|(i, c)| {
            c.archetype == arch
                && state.taken_mask & (1 << i) == 0
                && !conflicts(state.owned_tags, c.tags)
        })
        .map(|(_, c)| c)
        .collect()
}

/// Pick from `pool` at exactly `want` rarity, falling back to the nearest
/// rarity below, then anything. One draw per successful pick.
fn sample_rarity(
    pool: &[&'static ChoiceDef],
    want: Rarity,
    rng: &mut XorShift64,
) -> Option<&'static ChoiceDef> {
    for rarity in [want, Rarity::Rare, Rarity::Common] {
        if rarity > want {
            continue;
        }
        let tier: Vec<&'static ChoiceDef> = pool
            .iter()
            .copied()
            .filter(|c| c.rarity == rarity)
            .collect();
        if !tier.is_empty() {
            let idx = rng.next_range(0, tier.len() as u32) as usize;
            return Some(tier[idx]);
        }
    }
    if pool.is_empty() {
        None
    } else {
        let idx = rng.next_range(0, pool.len() as u32) as usize;
        Some(pool[idx])
    }
}

fn roll_rarity(rng: &mut XorShift64) -> Rarity {
    let total = balance::RARITY_WEIGHT_COMMON
        + balance::RARITY_WEIGHT_RARE
        + balance::RARITY_WEIGHT_LEGENDARY;
    let roll = rng.next_range(0, total);
    if roll < balance::RARITY_WEIGHT_COMMON {
        Rarity::Common
    } else if roll < balance::RARITY_WEIGHT_COMMON + balance::RARITY_WEIGHT_RARE {
        Rarity::Rare
    } else {
        Rarity::Legendary
    }
}

/// Generate the three-slot offer on Choose entry. CHOICE substream only.
pub fn generate(world: &mut World) {
    let state = &mut world.choices;
    let rng = &mut world.rng.choice;

    state.total_offers += 1;

    // (1) Pity checks.
    let force_rare = state.rounds_since_rare >= balance::PITY_ROUNDS;
    let force_legendary = state.total_offers % balance::SUPER_PITY_PERIOD == 0;

    // (2) Forced-rarity slot assignment. Each forcing draws its slot even if
    // the draws collide; the legendary wins a collision.
    let rare_slot = if force_rare { Some(rng.next_range(0, 3) as usize) } else { None };
    let legendary_slot = if force_legendary { Some(rng.next_range(0, 3) as usize) } else { None };

    // (3) Sample archetype pools in canonical order.
    let archetypes = [Archetype::Safe, Archetype::Spicy, Archetype::Weird];
    let mut offer = [0u32; 3];
    for (slot, arch) in archetypes.into_iter().enumerate() {
        let pool = eligible(state, arch);
        let forced = if legendary_slot == Some(slot) {
            Some(Rarity::Legendary)
        } else if rare_slot == Some(slot) {
            Some(Rarity::Rare)
        } else {
            None
        };
        let want = forced.unwrap_or_else(|| roll_rarity(rng));
        if let Some(c) = sample_rarity(&pool, want, rng) {
            offer[slot] = c.id;
        }
    }
    state.offer = offer;

    // Pity bookkeeping keyed off what was actually offered.
    let has_rare = offer
        .iter()
        .filter_map(|&id| pool_index(id))
        .any(|i| balance::CHOICE_POOL[i].rarity >= Rarity::Rare);
    if has_rare {
        state.rounds_since_rare = 0;
    } else {
        state.rounds_since_rare += 1;
    }
    log::debug!(
        "choice offer {:?} (rare pity {}, offer #{})",
        offer,
        state.rounds_since_rare,
        state.total_offers
    );
}

/// Commit an offered choice: apply its effect, record tags, advance the run
/// to PowerUp. Unknown or unoffered ids are a no-op returning 0.
pub fn commit(world: &mut World, id: u32) -> i32 {
    if world.phase.current != Phase::Choose {
        return 0;
    }
    if id == 0 || !world.choices.offer.contains(&id) {
        return 0;
    }
    let idx = match pool_index(id) {
        Some(i) => i,
        None => return 0,
    };
    let def = &balance::CHOICE_POOL[idx];
    apply_effect(world, &def.effect);
    world.choices.taken_mask |= 1 << idx;
    world.choices.owned_tags |= def.tags;
    world.choices.choice_count += 1;
    world.choices.offer = [0; 3];
    crate::phase::transition_to(world, Phase::PowerUp);
    1
}

fn apply_effect(world: &mut World, effect: &ChoiceEffect) {
    let mods = &mut world.player.mods;
    match *effect {
        ChoiceEffect::DamageMult(m) => mods.damage_mult = mods.damage_mult * m,
        ChoiceEffect::SpeedMult(m) => mods.speed_mult = mods.speed_mult * m,
        ChoiceEffect::ArmorAdd(a) => mods.armor_bonus = mods.armor_bonus + a,
        ChoiceEffect::HealFraction(f) => world.player.heal_fraction(f),
        ChoiceEffect::StaminaRegenMult(m) => {
            mods.stamina_regen_mult = mods.stamina_regen_mult * m
        }
        ChoiceEffect::GoldGainMult(m) => mods.gold_mult = mods.gold_mult * m,
        ChoiceEffect::EssenceGainMult(m) => mods.essence_mult = mods.essence_mult * m,
        ChoiceEffect::ReachMult(m) => mods.reach_mult = mods.reach_mult * m,
        ChoiceEffect::MaxHpMult(m) => mods.max_hp_mult = mods.max_hp_mult * m,
        ChoiceEffect::GlassCannon { damage, taken } => {
            mods.damage_mult = mods.damage_mult * damage;
            mods.damage_taken_mult = mods.damage_taken_mult * taken;
        }
        ChoiceEffect::Fortune { gold, essence } => {
            mods.gold_mult = mods.gold_mult * gold;
            mods.essence_mult = mods.essence_mult * essence;
        }
    }
}

/// Rarity of an offer slot for the query façade; -1 for an empty slot.
pub fn offer_rarity(state: &ChoiceState, slot: usize) -> i32 {
    state
        .offer
        .get(slot)
        .and_then(|&id| pool_index(id))
        .map(|i| balance::CHOICE_POOL[i].rarity as i32)
        .unwrap_or(-1)
}

/// Archetype of an offer slot; -1 for an empty slot.
pub fn offer_archetype(state: &ChoiceState, slot: usize) -> i32 {
    state
        .offer
        .get(slot)
        .and_then(|&id| pool_index(id))
        .map(|i| balance::CHOICE_POOL[i].archetype as i32)
        .unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_excludes_opposed_tags() {
        assert!(conflicts(tags::FIRE, tags::ICE));
        assert!(conflicts(tags::ICE, tags::FIRE));
        assert!(conflicts(tags::LIGHT, tags::HEAVY));
        assert!(!conflicts(tags::FIRE, tags::HEAVY));
        assert!(!conflicts(0, tags::ICE));
    }

    #[test]
    fn eligible_filters_taken_and_conflicting() {
        let mut state = ChoiceState::default();
        let all_safe = eligible(&state, Archetype::Safe);
        assert_eq!(all_safe.len(), 6);
        // Take pool entry 0 (id 1, Safe).
        state.taken_mask |= 1;
        assert_eq!(eligible(&state, Archetype::Safe).len(), 5);
        // Owning FIRE blocks the ICE spicy entry.
        state.owned_tags = tags::FIRE;
        let spicy = eligible(&state, Archetype::Spicy);
        assert!(spicy.iter().all(|c| c.tags & tags::ICE == 0));
    }

    #[test]
    fn sample_rarity_falls_back_downward() {
        let mut rng = XorShift64::seeded(3);
        let state = ChoiceState::default();
        let pool = eligible(&state, Archetype::Safe);
        // Ask for Legendary repeatedly: always resolves to something.
        for _ in 0..20 {
            let c = sample_rarity(&pool, Rarity::Legendary, &mut rng).unwrap();
            assert_eq!(c.archetype, Archetype::Safe);
        }
        // With only commons available, a Rare request degrades to Common.
        let commons: Vec<_> = pool
            .iter()
            .copied()
            .filter(|c| c.rarity == Rarity::Common)
            .collect();
        let c = sample_rarity(&commons, Rarity::Rare, &mut rng).unwrap();
        assert_eq!(c.rarity, Rarity::Common);
    }

    #[test]
    fn rarity_roll_covers_all_tiers() {
        let mut rng = XorShift64::seeded(11);
        let mut seen = [false; 3];
        for _ in 0..2000 {
            seen[roll_rarity(&mut rng) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
