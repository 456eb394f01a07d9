//! packhunt-core: deterministic simulation core for a roguelike action game.
//!
//! A headless, fixed-tick world engine. Everything advances from
//! `(seed, input stream)`; the outside sees only flat scalar queries and an
//! opaque rollback snapshot. No wall clock, no floats inside the simulation,
//! no allocation in the query path.

pub mod abilities;
pub mod ai;
pub mod api;
pub mod balance;
pub mod choices;
pub mod combat;
pub mod enemy;
pub mod enums;
pub mod error;
pub mod fixed;
pub mod input;
pub mod pack;
pub mod phase;
pub mod physics;
pub mod player;
pub mod risk;
pub mod rng;
pub mod shop;
pub mod snapshot;
pub mod upgrades;
pub mod world;

pub use api::Game;
pub use error::CoreError;
pub use fixed::{Fx, Vec2};
pub use world::World;
