//! Auto-player for the headless demo and end-to-end tests
//!
//! Plays like a careful human: picks the oldest creature that is not a bee,
//! waits a reaction delay, then taps its current centre.

use glam::Vec2;

use super::state::CreatureView;
use crate::config::CreatureKind;

/// Default delay between acquiring a target and tapping it
pub const DEFAULT_REACTION_MS: f64 = 350.0;

#[derive(Debug, Clone)]
pub struct AutoPlayer {
    reaction_ms: f64,
    /// (creature id, time it was acquired)
    target: Option<(u32, f64)>,
}

impl Default for AutoPlayer {
    fn default() -> Self {
        Self::new(DEFAULT_REACTION_MS)
    }
}

impl AutoPlayer {
    pub fn new(reaction_ms: f64) -> Self {
        Self {
            reaction_ms: reaction_ms.max(0.0),
            target: None,
        }
    }

    /// Decide whether to tap this frame, returning the tap point
    pub fn next_tap(&mut self, creatures: &[CreatureView], now_ms: f64) -> Option<Vec2> {
        // Drop a target that has vanished
        if let Some((id, _)) = self.target {
            if !creatures.iter().any(|c| c.id == id) {
                self.target = None;
            }
        }

        if self.target.is_none() {
            let pick = creatures.iter().find(|c| c.kind != CreatureKind::Bee)?;
            self.target = Some((pick.id, now_ms));
        }

        let (id, acquired_at) = self.target?;
        if now_ms - acquired_at < self.reaction_ms {
            return None;
        }
        self.target = None;
        creatures.iter().find(|c| c.id == id).map(|c| c.pos)
    }
}
