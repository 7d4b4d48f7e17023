//! Wall collision for circles in a rectangular arena
//!
//! Axes are handled independently: a creature that reaches a corner flips
//! both velocity components in the same step.

use glam::Vec2;

use super::state::Arena;

/// Which walls were touched during a step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallContact {
    pub x: bool,
    pub y: bool,
}

impl WallContact {
    pub fn any(&self) -> bool {
        self.x || self.y
    }
}

/// Reflect one axis.
///
/// If the prospective coordinate reaches either bound the velocity component
/// is negated and the coordinate clamped into `[lo, hi]`.
#[inline]
pub fn reflect_axis(coord: &mut f32, vel: &mut f32, lo: f32, hi: f32) -> bool {
    if *coord <= lo || *coord >= hi {
        *vel = -*vel;
        *coord = coord.clamp(lo, hi);
        true
    } else {
        false
    }
}

/// Move `pos` by `vel * frames`, bouncing off the arena walls
pub fn advance_with_walls(pos: &mut Vec2, vel: &mut Vec2, radius: f32, frames: f32, arena: &Arena) -> WallContact {
    let mut next = *pos + *vel * frames;
    let lo = arena.min_corner(radius);
    let hi = arena.max_corner(radius);

    let contact = WallContact {
        x: reflect_axis(&mut next.x, &mut vel.x, lo.x, hi.x),
        y: reflect_axis(&mut next.y, &mut vel.y, lo.y, hi.y),
    };
    *pos = next;
    contact
}
