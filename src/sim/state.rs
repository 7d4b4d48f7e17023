//! Arena and creature types
//!
//! Creatures live in the engine's working set; renderers only ever see
//! [`CreatureView`] copies.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, CreatureKind};
use crate::rng::distance;

/// Playfield bounds, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    /// Build an arena that can hold creatures of `radius`.
    ///
    /// Both dimensions must exceed the creature diameter, otherwise no
    /// position satisfies the bounds invariant.
    pub fn new(width: f32, height: f32, radius: f32) -> Result<Self, ConfigError> {
        let fits = |dim: f32| dim.is_finite() && dim > 2.0 * radius;
        if !(radius > 0.0 && fits(width) && fits(height)) {
            return Err(ConfigError::ArenaTooSmall {
                width,
                height,
                radius,
            });
        }
        Ok(Self { width, height })
    }

    /// Lowest legal centre coordinate on both axes for `radius`
    #[inline]
    pub fn min_corner(&self, radius: f32) -> Vec2 {
        Vec2::splat(radius)
    }

    /// Highest legal centre coordinate on both axes for `radius`
    #[inline]
    pub fn max_corner(&self, radius: f32) -> Vec2 {
        Vec2::new(self.width - radius, self.height - radius)
    }

    /// Whether a circle of `radius` at `pos` lies fully inside
    pub fn contains_circle(&self, pos: Vec2, radius: f32) -> bool {
        let lo = self.min_corner(radius);
        let hi = self.max_corner(radius);
        pos.x >= lo.x && pos.x <= hi.x && pos.y >= lo.y && pos.y <= hi.y
    }

    /// Clamp a centre point into the legal band
    #[inline]
    pub fn clamp(&self, pos: Vec2, radius: f32) -> Vec2 {
        pos.clamp(self.min_corner(radius), self.max_corner(radius))
    }
}

/// A live creature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creature {
    pub id: u32,
    pub kind: CreatureKind,
    pub pos: Vec2,
    /// Displacement per reference frame
    pub vel: Vec2,
    pub radius: f32,
    /// Marked by a hit; dropped from the live set at the end of the next tick
    pub eliminated: bool,
}

impl Creature {
    pub fn new(id: u32, kind: CreatureKind, pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            id,
            kind,
            pos,
            vel,
            radius,
            eliminated: false,
        }
    }

    /// Whether `point` falls inside the hit circle (edge inclusive)
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        distance(self.pos, point) <= self.radius
    }

    pub fn view(&self) -> CreatureView {
        CreatureView {
            id: self.id,
            kind: self.kind,
            pos: self.pos,
            radius: self.radius,
        }
    }
}

/// Read-only copy handed to renderers and input helpers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreatureView {
    pub id: u32,
    pub kind: CreatureKind,
    pub pos: Vec2,
    pub radius: f32,
}

/// A successful tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub id: u32,
    pub kind: CreatureKind,
}
