//! Shared enums for the simulation core.
//!
//! Every enum that crosses the query façade has a stable integer encoding:
//! the discriminant is the value returned to callers and the value written
//! into snapshots. `from_u8` is total — unknown bytes fall back to the first
//! variant so a decoded world is always in-range.

use serde::{Deserialize, Serialize};

/// Coarse run phase. Drives spawns, sub-phase state and UI gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Phase {
    #[default]
    Explore = 0,
    Fight = 1,
    Choose = 2,
    PowerUp = 3,
    Risk = 4,
    Escalate = 5,
    CashOut = 6,
    Reset = 7,
}

impl Phase {
    pub fn from_u8(v: u8) -> Phase {
        match v {
            1 => Phase::Fight,
            2 => Phase::Choose,
            3 => Phase::PowerUp,
            4 => Phase::Risk,
            5 => Phase::Escalate,
            6 => Phase::CashOut,
            7 => Phase::Reset,
            _ => Phase::Explore,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum AttackState {
    #[default]
    Idle = 0,
    Windup = 1,
    Active = 2,
    Recovery = 3,
}

impl AttackState {
    pub fn from_u8(v: u8) -> AttackState {
        match v {
            1 => AttackState::Windup,
            2 => AttackState::Active,
            3 => AttackState::Recovery,
            _ => AttackState::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum AttackKind {
    #[default]
    Light = 0,
    Heavy = 1,
    Special = 2,
}

impl AttackKind {
    pub fn from_u8(v: u8) -> AttackKind {
        match v {
            1 => AttackKind::Heavy,
            2 => AttackKind::Special,
            _ => AttackKind::Light,
        }
    }
}

/// Wolf archetype. Adding a kind means a new stat row in `balance` and a
/// branch wherever spawning composes rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum WolfKind {
    #[default]
    Normal = 0,
    Alpha = 1,
    Scout = 2,
    Hunter = 3,
    Omega = 4,
}

impl WolfKind {
    pub fn from_u8(v: u8) -> WolfKind {
        match v {
            1 => WolfKind::Alpha,
            2 => WolfKind::Scout,
            3 => WolfKind::Hunter,
            4 => WolfKind::Omega,
            _ => WolfKind::Normal,
        }
    }
}

/// Per-wolf behaviour state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum WolfState {
    #[default]
    Idle = 0,
    Patrol = 1,
    Investigate = 2,
    Alert = 3,
    Approach = 4,
    Strafe = 5,
    Attack = 6,
    Retreat = 7,
    Recover = 8,
    Flee = 9,
    Ambush = 10,
    Flank = 11,
}

impl WolfState {
    pub fn from_u8(v: u8) -> WolfState {
        match v {
            1 => WolfState::Patrol,
            2 => WolfState::Investigate,
            3 => WolfState::Alert,
            4 => WolfState::Approach,
            5 => WolfState::Strafe,
            6 => WolfState::Attack,
            7 => WolfState::Retreat,
            8 => WolfState::Recover,
            9 => WolfState::Flee,
            10 => WolfState::Ambush,
            11 => WolfState::Flank,
            _ => WolfState::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum PackRole {
    #[default]
    None = 0,
    Leader = 1,
    Bruiser = 2,
    Skirmisher = 3,
    Support = 4,
    Scout = 5,
}

impl PackRole {
    pub fn from_u8(v: u8) -> PackRole {
        match v {
            1 => PackRole::Leader,
            2 => PackRole::Bruiser,
            3 => PackRole::Skirmisher,
            4 => PackRole::Support,
            5 => PackRole::Scout,
            _ => PackRole::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Emotion {
    #[default]
    Calm = 0,
    Aggressive = 1,
    Fearful = 2,
    Desperate = 3,
    Confident = 4,
    Frustrated = 5,
}

impl Emotion {
    pub fn from_u8(v: u8) -> Emotion {
        match v {
            1 => Emotion::Aggressive,
            2 => Emotion::Fearful,
            3 => Emotion::Desperate,
            4 => Emotion::Confident,
            5 => Emotion::Frustrated,
            _ => Emotion::Calm,
        }
    }
}

/// Coordinated objective for a pack of wolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum PackPlan {
    #[default]
    None = 0,
    Ambush = 1,
    Pincer = 2,
    Retreat = 3,
    Commit = 4,
    Flank = 5,
    Distract = 6,
    Regroup = 7,
}

impl PackPlan {
    pub fn from_u8(v: u8) -> PackPlan {
        match v {
            1 => PackPlan::Ambush,
            2 => PackPlan::Pincer,
            3 => PackPlan::Retreat,
            4 => PackPlan::Commit,
            5 => PackPlan::Flank,
            6 => PackPlan::Distract,
            7 => PackPlan::Regroup,
            _ => PackPlan::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Archetype {
    Safe = 0,
    Spicy = 1,
    Weird = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Rarity {
    Common = 0,
    Rare = 1,
    Legendary = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CurseKind {
    #[default]
    Weakness = 0,
    Fragility = 1,
    Exhaustion = 2,
    Slowness = 3,
    Blindness = 4,
}

impl CurseKind {
    pub fn from_u8(v: u8) -> CurseKind {
        match v {
            1 => CurseKind::Fragility,
            2 => CurseKind::Exhaustion,
            3 => CurseKind::Slowness,
            4 => CurseKind::Blindness,
            _ => CurseKind::Weakness,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ShopKind {
    #[default]
    Weapon = 0,
    Armor = 1,
    Consumable = 2,
    Blessing = 3,
    Mystery = 4,
}

impl ShopKind {
    pub fn from_u8(v: u8) -> ShopKind {
        match v {
            1 => ShopKind::Armor,
            2 => ShopKind::Consumable,
            3 => ShopKind::Blessing,
            4 => ShopKind::Mystery,
            _ => ShopKind::Weapon,
        }
    }
}

/// Closed set of upgrade effect keys. The simulation multiplies the matching
/// runtime value by the owned-node scalar product at point of use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum EffectKey {
    Damage = 0,
    Reach = 1,
    StaminaMax = 2,
    HpMax = 3,
    GoldGain = 4,
    EssenceGain = 5,
    CooldownReduction = 6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ClassId {
    #[default]
    Warden = 0,
    Raider = 1,
    Kensei = 2,
}

impl ClassId {
    pub fn from_u8(v: u8) -> ClassId {
        match v {
            1 => ClassId::Raider,
            2 => ClassId::Kensei,
            _ => ClassId::Warden,
        }
    }
}

/// Outcome tag for an attack landing on the player. The only observable
/// combat outcomes at the façade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    Ignored,
    Hit,
    Blocked,
    Parried,
}

impl HitOutcome {
    pub fn as_i32(self) -> i32 {
        match self {
            HitOutcome::Ignored => -1,
            HitOutcome::Hit => 0,
            HitOutcome::Blocked => 1,
            HitOutcome::Parried => 2,
        }
    }
}

/// Choice tag bitfield.
pub mod tags {
    pub const FIRE: u32 = 1;
    pub const ICE: u32 = 1 << 1;
    pub const HEAVY: u32 = 1 << 2;
    pub const LIGHT: u32 = 1 << 3;
    pub const AREA: u32 = 1 << 4;
    pub const DEFENSE: u32 = 1 << 5;
    pub const MOBILITY: u32 = 1 << 6;

    /// Tags mutually excluded within one run: taking one side of a pair bars
    /// offers carrying the other.
    pub const EXCLUSION_PAIRS: [(u32, u32); 2] = [(FIRE, ICE), (LIGHT, HEAVY)];
}

/// Escalation enemy modifier bitfield, drawn per spawn.
pub mod modifiers {
    pub const ARMORED: u32 = 1;
    pub const SWIFT: u32 = 1 << 1;
    pub const REGENERATING: u32 = 1 << 2;
    pub const EXPLOSIVE: u32 = 1 << 3;
    pub const VENOMOUS: u32 = 1 << 4;

    pub const ALL: [u32; 5] = [ARMORED, SWIFT, REGENERATING, EXPLOSIVE, VENOMOUS];
}
