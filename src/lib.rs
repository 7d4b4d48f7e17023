//! Mosquito Snatch - a timed reflex game
//!
//! Core modules:
//! - `sim`: Simulation engine (spawning, movement, wall reflection, hit tests)
//! - `session`: Play/end state machine, scoring and catch-time statistics
//! - `config`: Difficulty tiers and data-driven game balance
//! - `rng`: Injectable random source and distribution helpers
//! - `ranking`: Result submission and leaderboard contracts
//! - `game`: Frame driver tying the engine and session together
//! - `hud`: HUD text derived from session state
//! - `settings`: Player name validation and saved preferences
//! - `platform`: Clock, viewport sizing and the browser ranking client

pub mod config;
pub mod game;
pub mod hud;
pub mod platform;
pub mod ranking;
pub mod rng;
pub mod session;
pub mod settings;
pub mod sim;

pub use config::{ConfigError, CreatureKind, Difficulty, DifficultyProfile, GameConfig};
pub use game::Game;
pub use ranking::{LeaderboardEntry, RankingError, RankingService, ResultRecord};
pub use session::{Session, SessionPhase};
pub use settings::{PlayerName, Settings};

/// Game configuration constants
pub mod consts {
    /// Total session length
    pub const SESSION_DURATION_MS: u32 = 60_000;
    /// Hit radius shared by every creature
    pub const HIT_RADIUS_PX: f32 = 22.0;

    /// Velocities are stored per reference frame (60 updates per second)
    pub const REFERENCE_FPS: f32 = 60.0;
    /// Duration of one reference frame
    pub const REFERENCE_FRAME_MS: f32 = 1000.0 / REFERENCE_FPS;

    /// Countdown granularity
    pub const COUNTDOWN_STEP_MS: f64 = 100.0;
    /// Largest real delta a single frame may simulate (tab suspend, debugger)
    pub const MAX_FRAME_DELTA_MS: f64 = 250.0;

    /// Leaderboard length returned by the ranking service
    pub const LEADERBOARD_SIZE: usize = 5;
    /// Player name length limits (in characters)
    pub const NAME_MIN_CHARS: usize = 1;
    pub const NAME_MAX_CHARS: usize = 12;

    /// Default arena when the front-end does not size it (desktop layout)
    pub const DEFAULT_ARENA_WIDTH: f32 = 600.0;
    pub const DEFAULT_ARENA_HEIGHT: f32 = 500.0;
}

/// Unit vector for an angle in radians
#[inline]
pub fn direction(theta: f32) -> glam::Vec2 {
    glam::Vec2::new(theta.cos(), theta.sin())
}
