//! Shared helpers for the integration tests: world construction and
//! scripted input driving at the fixed 60 Hz step.

#![allow(dead_code)]

use packhunt_core::fixed::{Fx, Vec2};
use packhunt_core::input::InputFrame;
use packhunt_core::World;

pub const TICK: Fx = Fx::from_ratio(1, 60);

pub fn run_ticks(world: &mut World, n: u32) {
    for _ in 0..n {
        world.advance(TICK);
    }
}

/// Set the buffered input, then advance `n` ticks with it held.
pub fn hold(world: &mut World, n: u32, frame: InputFrame) {
    world.input.pending = frame;
    run_ticks(world, n);
}

pub fn idle_frame() -> InputFrame {
    InputFrame::default()
}

pub fn move_right() -> InputFrame {
    InputFrame {
        move_x: Fx::ONE,
        ..InputFrame::default()
    }
}

pub fn light_attack() -> InputFrame {
    InputFrame {
        light_attack: true,
        ..InputFrame::default()
    }
}

pub fn blocking() -> InputFrame {
    InputFrame {
        blocking: true,
        ..InputFrame::default()
    }
}

/// A canned 60-second trace: 1 s idle, 1 s right, 0.5 s light attack,
/// repeated. 3600 ticks total.
pub fn drive_canned_minute(world: &mut World) {
    let cycle = [
        (60u32, idle_frame()),
        (60, move_right()),
        (30, light_attack()),
    ];
    let mut ticks = 0u32;
    'outer: loop {
        for (n, frame) in cycle {
            let n = n.min(3600 - ticks);
            hold(world, n, frame);
            ticks += n;
            if ticks >= 3600 {
                break 'outer;
            }
        }
    }
}

pub fn fx(v: f32) -> Fx {
    Fx::from_f32(v)
}

pub fn v2(x: f32, y: f32) -> Vec2 {
    Vec2::new(fx(x), fx(y))
}

/// Hammer light attacks with alternating release so every press edges.
pub fn mash_attacks(world: &mut World, ticks: u32) {
    for i in 0..ticks {
        world.input.pending.light_attack = i % 4 < 2;
        run_ticks(world, 1);
    }
}
