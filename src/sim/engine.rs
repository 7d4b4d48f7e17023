//! Simulation engine
//!
//! Owns the live creature set. Each [`Engine::tick`] runs, in order:
//! 1. spawn decision
//! 2. movement with wall reflection for every non-eliminated creature
//! 3. compaction (eliminated creatures are dropped)
//!
//! Taps are resolved between ticks with [`Engine::resolve_tap`]. Both calls
//! must come from the same execution context; the engine does no locking.

use glam::Vec2;
use rand_pcg::Pcg32;

use super::collision::advance_with_walls;
use super::state::{Arena, Creature, CreatureView, Hit};
use crate::config::{ConfigError, CreatureKind, DifficultyProfile};
use crate::consts::{REFERENCE_FPS, REFERENCE_FRAME_MS};
use crate::rng::{RandomSource, seeded, uniform_angle, uniform_in_range, weighted_kind};

/// What a single tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Id of the creature spawned this tick, if any
    pub spawned: Option<u32>,
    /// Eliminated creatures dropped during compaction
    pub removed: usize,
}

/// The creature simulation
#[derive(Debug, Clone)]
pub struct Engine<R = Pcg32> {
    arena: Arena,
    profile: DifficultyProfile,
    /// Live set in spawn order
    creatures: Vec<Creature>,
    next_id: u32,
    last_spawn_ms: f64,
    spawn_interval_ms: f64,
    clock_ms: f64,
    rng: R,
}

impl Engine<Pcg32> {
    /// Engine with the default seeded generator
    pub fn new(arena: Arena, profile: DifficultyProfile, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(arena, profile, seeded(seed))
    }
}

impl<R: RandomSource> Engine<R> {
    /// Engine drawing from a caller-supplied random source
    pub fn with_rng(arena: Arena, profile: DifficultyProfile, mut rng: R) -> Result<Self, ConfigError> {
        check_fit(&arena, profile.hit_radius)?;
        let spawn_interval_ms = profile.spawn_interval(&mut rng);
        Ok(Self {
            arena,
            profile,
            creatures: Vec::new(),
            next_id: 1,
            last_spawn_ms: f64::NEG_INFINITY,
            spawn_interval_ms,
            clock_ms: 0.0,
            rng,
        })
    }

    /// Advance the simulation to `now_ms`, moving creatures by `delta_ms` of real time.
    /// A non-positive delta leaves the live set untouched.
    pub fn tick(&mut self, now_ms: f64, delta_ms: f64) -> TickReport {
        self.clock_ms = self.clock_ms.max(now_ms);
        if delta_ms <= 0.0 {
            return TickReport::default();
        }

        let spawned = self.try_spawn(now_ms);

        let frames = (delta_ms as f32) / REFERENCE_FRAME_MS;
        let arena = self.arena;
        for creature in self.creatures.iter_mut().filter(|c| !c.eliminated) {
            advance_with_walls(&mut creature.pos, &mut creature.vel, creature.radius, frames, &arena);
            debug_assert!(arena.contains_circle(creature.pos, creature.radius));
        }

        let before = self.creatures.len();
        self.creatures.retain(|c| !c.eliminated);

        TickReport {
            spawned,
            removed: before - self.creatures.len(),
        }
    }

    fn try_spawn(&mut self, now_ms: f64) -> Option<u32> {
        if self.live_count() >= self.profile.max_alive {
            return None;
        }
        if now_ms - self.last_spawn_ms < self.spawn_interval_ms {
            return None;
        }

        let radius = self.profile.hit_radius;
        let kind = weighted_kind(&mut self.rng, &self.profile.weights);
        let theta = uniform_angle(&mut self.rng);
        let per_frame = self.profile.speed(&mut self.rng) / REFERENCE_FPS;
        let lo = self.arena.min_corner(radius);
        let hi = self.arena.max_corner(radius);
        let pos = Vec2::new(
            uniform_in_range(&mut self.rng, lo.x, hi.x),
            uniform_in_range(&mut self.rng, lo.y, hi.y),
        );

        let id = self.next_id;
        self.next_id += 1;
        self.creatures
            .push(Creature::new(id, kind, pos, crate::direction(theta) * per_frame, radius));

        self.last_spawn_ms = now_ms;
        self.spawn_interval_ms = self.profile.spawn_interval(&mut self.rng);
        log::trace!("spawned {:?} #{} at ({:.0}, {:.0})", kind, id, pos.x, pos.y);
        Some(id)
    }

    /// Resolve a tap at `point` (arena-local coordinates).
    ///
    /// The first live creature in spawn order whose hit circle contains the
    /// point is eliminated. At most one creature is hit per tap.
    pub fn resolve_tap(&mut self, point: Vec2) -> Option<Hit> {
        let creature = self
            .creatures
            .iter_mut()
            .find(|c| !c.eliminated && c.contains(point))?;
        creature.eliminated = true;
        Some(Hit {
            id: creature.id,
            kind: creature.kind,
        })
    }

    /// Switch tiers. Live creatures keep their velocities; only the next
    /// spawn interval and later spawns follow the new profile.
    pub fn set_profile(&mut self, profile: DifficultyProfile) -> Result<(), ConfigError> {
        check_fit(&self.arena, profile.hit_radius)?;
        self.profile = profile;
        self.spawn_interval_ms = profile.spawn_interval(&mut self.rng);
        Ok(())
    }

    /// Change arena size, pulling creatures back inside the new bounds
    pub fn resize(&mut self, arena: Arena) -> Result<(), ConfigError> {
        check_fit(&arena, self.profile.hit_radius)?;
        self.arena = arena;
        for creature in &mut self.creatures {
            creature.pos = arena.clamp(creature.pos, creature.radius);
        }
        Ok(())
    }

    /// Push the spawn clock forward by time that must not count toward the
    /// current interval (a pause)
    pub fn defer_spawn(&mut self, by_ms: f64) {
        if by_ms > 0.0 {
            self.last_spawn_ms += by_ms;
        }
    }

    /// Drop every creature and restart spawn timing
    pub fn clear(&mut self) {
        self.creatures.clear();
        self.last_spawn_ms = f64::NEG_INFINITY;
    }

    /// Copy of the live set for rendering
    pub fn snapshot(&self) -> Vec<CreatureView> {
        self.creatures
            .iter()
            .filter(|c| !c.eliminated)
            .map(Creature::view)
            .collect()
    }

    /// Live set including creatures eliminated since the last tick
    pub fn creatures(&self) -> &[Creature] {
        &self.creatures
    }

    /// Number of non-eliminated creatures
    pub fn live_count(&self) -> usize {
        self.creatures.iter().filter(|c| !c.eliminated).count()
    }

    pub fn arena(&self) -> Arena {
        self.arena
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    /// Latest timestamp seen by `tick`
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Delay currently scheduled between the last spawn and the next one
    pub fn spawn_interval_ms(&self) -> f64 {
        self.spawn_interval_ms
    }

    /// Insert a creature directly (scripted scenarios and tests)
    pub fn insert(&mut self, kind: CreatureKind, pos: Vec2, vel: Vec2) -> u32 {
        let radius = self.profile.hit_radius;
        let id = self.next_id;
        self.next_id += 1;
        self.creatures
            .push(Creature::new(id, kind, self.arena.clamp(pos, radius), vel, radius));
        id
    }
}

fn check_fit(arena: &Arena, radius: f32) -> Result<(), ConfigError> {
    Arena::new(arena.width, arena.height, radius).map(|_| ())
}
