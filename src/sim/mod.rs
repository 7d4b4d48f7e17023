//! Simulation module
//!
//! All gameplay physics lives here. This module must stay pure:
//! - Movement is a function of elapsed real time, not of call count
//! - Seeded/injectable RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod autoplay;
pub mod collision;
pub mod engine;
pub mod state;

pub use autoplay::AutoPlayer;
pub use collision::{WallContact, advance_with_walls, reflect_axis};
pub use engine::{Engine, TickReport};
pub use state::{Arena, Creature, CreatureView, Hit};
