//! Rigid-body layer: integration, circle separation, wall bounce, barrels.
//!
//! The world is a top-down unit square. Bodies are circles with inverse-mass
//! weighted separation and an elastic impulse along the contact normal. There
//! is no broadphase — at most 1 + 32 + 16 bodies, and iteration order (player,
//! barrels, enemies by slot) is part of the determinism contract.

use crate::balance;
use crate::error::CoreError;
use crate::fixed::{Fx, Vec2};
use serde::{Deserialize, Serialize};

pub const MAX_BARRELS: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Barrel {
    pub alive: bool,
    pub pos: Vec2,
    pub vel: Vec2,
}

/// Fixed-capacity barrel pool. Handles are `slot + 1`; zero is the
/// pool-exhausted sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarrelPool {
    pub slots: [Barrel; MAX_BARRELS],
}

impl BarrelPool {
    pub fn spawn(&mut self, pos: Vec2) -> Result<u32, CoreError> {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if !slot.alive {
                *slot = Barrel {
                    alive: true,
                    pos,
                    vel: Vec2::ZERO,
                };
                return Ok(i as u32 + 1);
            }
        }
        Err(CoreError::BodyPoolExhausted)
    }

    pub fn get_mut(&mut self, handle: u32) -> Result<&mut Barrel, CoreError> {
        let idx = handle.wrapping_sub(1) as usize;
        match self.slots.get_mut(idx) {
            Some(b) if b.alive => Ok(b),
            _ => Err(CoreError::InvalidIndex(format!("barrel handle {}", handle))),
        }
    }

    pub fn clear(&mut self) {
        self.slots = [Barrel::default(); MAX_BARRELS];
    }

    pub fn alive_count(&self) -> usize {
        self.slots.iter().filter(|b| b.alive).count()
    }
}

/// Symplectic Euler step with per-frame friction.
pub fn integrate(pos: &mut Vec2, vel: &mut Vec2, friction: Fx, dt: Fx) {
    *pos = pos.add(vel.scale(dt));
    *vel = vel.scale(friction);
}

/// Clamp a body centre inside the unit square and reflect the velocity
/// component that crossed, scaled by wall restitution.
pub fn clamp_to_walls(pos: &mut Vec2, vel: &mut Vec2, radius: Fx) {
    let lo = radius;
    let hi = Fx::ONE - radius;
    if pos.x < lo {
        pos.x = lo;
        if vel.x < Fx::ZERO {
            vel.x = -(vel.x * balance::WALL_RESTITUTION);
        }
    } else if pos.x > hi {
        pos.x = hi;
        if vel.x > Fx::ZERO {
            vel.x = -(vel.x * balance::WALL_RESTITUTION);
        }
    }
    if pos.y < lo {
        pos.y = lo;
        if vel.y < Fx::ZERO {
            vel.y = -(vel.y * balance::WALL_RESTITUTION);
        }
    } else if pos.y > hi {
        pos.y = hi;
        if vel.y > Fx::ZERO {
            vel.y = -(vel.y * balance::WALL_RESTITUTION);
        }
    }
}

/// Separate two overlapping circles and exchange an elastic impulse.
/// Push-out is inverse-mass weighted; returns whether contact occurred.
#[allow(clippy::too_many_arguments)]
pub fn resolve_pair(
    pa: &mut Vec2,
    va: &mut Vec2,
    ra: Fx,
    ma: Fx,
    pb: &mut Vec2,
    vb: &mut Vec2,
    rb: Fx,
    mb: Fx,
    restitution: Fx,
) -> bool {
    let delta = pb.sub(*pa);
    let dist = delta.length();
    let min_dist = ra + rb;
    if dist >= min_dist {
        return false;
    }
    let normal = if dist.is_zero() {
        // Coincident centres: push along +x so the pass stays total.
        Vec2::new(Fx::ONE, Fx::ZERO)
    } else {
        Vec2::new(delta.x / dist, delta.y / dist)
    };
    let inv_a = if ma > Fx::ZERO { Fx::ONE / ma } else { Fx::ZERO };
    let inv_b = if mb > Fx::ZERO { Fx::ONE / mb } else { Fx::ZERO };
    let total = inv_a + inv_b;
    if total.is_zero() {
        return true;
    }
    let overlap = min_dist - dist;
    *pa = pa.sub(normal.scale(overlap * (inv_a / total)));
    *pb = pb.add(normal.scale(overlap * (inv_b / total)));

    let vn = vb.sub(*va).dot(normal);
    if vn < Fx::ZERO {
        let j = -(Fx::ONE + restitution) * vn / total;
        *va = va.sub(normal.scale(j * inv_a));
        *vb = vb.add(normal.scale(j * inv_b));
    }
    true
}

/// Knockback entry point used by combat hits, bash releases and barrel
/// smashes: `v += (fx, fy) · 0.3`.
pub fn apply_knockback(vel: &mut Vec2, force: Vec2) {
    *vel = vel.add(force.scale(balance::KNOCKBACK_SCALE));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn barrel_pool_handles_and_exhaustion() {
        let mut pool = BarrelPool::default();
        for i in 0..MAX_BARRELS {
            let h = pool.spawn(Vec2::ZERO).unwrap();
            assert_eq!(h, i as u32 + 1);
        }
        assert_eq!(pool.spawn(Vec2::ZERO), Err(CoreError::BodyPoolExhausted));
        assert!(pool.get_mut(0).is_err());
        assert!(pool.get_mut(MAX_BARRELS as u32 + 1).is_err());
        pool.clear();
        assert_eq!(pool.alive_count(), 0);
    }

    #[test]
    fn wall_reflects_crossing_component() {
        let mut pos = Vec2::new(Fx::milli(-50), Fx::HALF);
        let mut vel = Vec2::new(Fx::int(-1), Fx::ZERO);
        clamp_to_walls(&mut pos, &mut vel, Fx::milli(20));
        assert_eq!(pos.x, Fx::milli(20));
        assert!(vel.x > Fx::ZERO);
        // 0.6 restitution
        assert_eq!(vel.x, balance::WALL_RESTITUTION);
    }

    #[test]
    fn corner_stays_inside_unit_square() {
        let mut pos = Vec2::new(Fx::int(2), Fx::int(2));
        let mut vel = Vec2::new(Fx::int(3), Fx::int(3));
        clamp_to_walls(&mut pos, &mut vel, Fx::milli(20));
        assert!(pos.x >= Fx::ZERO && pos.x <= Fx::ONE);
        assert!(pos.y >= Fx::ZERO && pos.y <= Fx::ONE);
        assert!(vel.x < Fx::ZERO && vel.y < Fx::ZERO);
    }

    #[test]
    fn overlapping_pair_is_pushed_apart() {
        let mut pa = Vec2::new(Fx::HALF, Fx::HALF);
        let mut va = Vec2::ZERO;
        let mut pb = Vec2::new(Fx::HALF + Fx::milli(10), Fx::HALF);
        let mut vb = Vec2::ZERO;
        let r = Fx::milli(20);
        let hit = resolve_pair(
            &mut pa, &mut va, r, Fx::ONE, &mut pb, &mut vb, r, Fx::ONE, Fx::milli(400),
        );
        assert!(hit);
        let gap = pb.sub(pa).length();
        assert!(gap + Fx(16) >= r + r, "gap {:?} vs {:?}", gap, r + r);
    }

    #[test]
    fn impulse_transfers_momentum() {
        let mut pa = Vec2::new(Fx::milli(480), Fx::HALF);
        let mut va = Vec2::new(Fx::int(1), Fx::ZERO);
        let mut pb = Vec2::new(Fx::milli(510), Fx::HALF);
        let mut vb = Vec2::ZERO;
        let r = Fx::milli(20);
        resolve_pair(
            &mut pa, &mut va, r, Fx::ONE, &mut pb, &mut vb, r, Fx::ONE, Fx::milli(400),
        );
        assert!(vb.x > Fx::ZERO, "struck body gains forward velocity");
        assert!(va.x < Fx::int(1), "striker sheds velocity");
    }

    #[test]
    fn separated_pair_untouched() {
        let mut pa = Vec2::new(Fx::milli(200), Fx::HALF);
        let mut va = Vec2::ZERO;
        let mut pb = Vec2::new(Fx::milli(800), Fx::HALF);
        let mut vb = Vec2::ZERO;
        let hit = resolve_pair(
            &mut pa,
            &mut va,
            Fx::milli(20),
            Fx::ONE,
            &mut pb,
            &mut vb,
            Fx::milli(20),
            Fx::ONE,
            Fx::milli(400),
        );
        assert!(!hit);
        assert_eq!(pa, Vec2::new(Fx::milli(200), Fx::HALF));
    }
}
