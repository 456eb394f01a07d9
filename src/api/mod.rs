//! External surfaces. The WASM bindings stay thin — all simulation logic
//! lives in the core modules; this layer converts scalars at the boundary.

pub mod wasm;

pub use wasm::Game;
