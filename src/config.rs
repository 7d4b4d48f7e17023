//! Difficulty tiers and game balance
//!
//! All tuning lives in [`GameConfig`], which can be loaded from JSON and is
//! validated once at startup. Everything downstream reads resolved
//! [`DifficultyProfile`] values and never mutates shared configuration.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{HIT_RADIUS_PX, SESSION_DURATION_MS};
use crate::rng::{RandomSource, uniform_in_range};

/// Creature kinds, in the fixed order used by weighted draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreatureKind {
    /// Ordinary mosquito
    Common,
    /// Malaria mosquito, worth more
    Malaria,
    /// Bee, costs points when hit
    Bee,
}

impl CreatureKind {
    pub const ALL: [CreatureKind; 3] = [CreatureKind::Common, CreatureKind::Malaria, CreatureKind::Bee];

    pub fn as_str(&self) -> &'static str {
        match self {
            CreatureKind::Common => "common",
            CreatureKind::Malaria => "malaria",
            CreatureKind::Bee => "bee",
        }
    }

    /// Fill colour used by the canvas renderer
    pub fn color(&self) -> &'static str {
        match self {
            CreatureKind::Common => "#3b82f6",
            CreatureKind::Malaria => "#ef4444",
            CreatureKind::Bee => "#fbbf24",
        }
    }
}

/// Difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Human-readable label for the HUD
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per creature kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerKind<T> {
    pub common: T,
    pub malaria: T,
    pub bee: T,
}

impl<T: Copy> PerKind<T> {
    pub fn get(&self, kind: CreatureKind) -> T {
        match kind {
            CreatureKind::Common => self.common,
            CreatureKind::Malaria => self.malaria,
            CreatureKind::Bee => self.bee,
        }
    }

    /// Values paired with their kind, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (CreatureKind, T)> + '_ {
        CreatureKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}

/// Inclusive numeric range, serialized as `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span(pub f32, pub f32);

impl Span {
    #[inline]
    pub fn min(&self) -> f32 {
        self.0
    }

    #[inline]
    pub fn max(&self) -> f32 {
        self.1
    }

    fn is_valid(&self) -> bool {
        self.0.is_finite() && self.1.is_finite() && self.0 >= 0.0 && self.1 >= self.0
    }
}

/// Per-tier tuning table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierTuning {
    /// Delay between spawns, re-rolled after each spawn
    pub interval_ms: Span,
    /// Most creatures alive at once
    pub max_alive: usize,
    /// Creature speed magnitude
    pub speed_px_per_sec: Span,
    /// Relative spawn weights (conventionally summing to 100)
    pub weights: PerKind<f32>,
}

/// Errors detected while building or loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{tier}: spawn weights must be non-negative and sum to more than zero")]
    InvalidWeights { tier: Difficulty },
    #[error("{tier}: {field} range [{min}, {max}] is invalid")]
    InvalidRange {
        tier: Difficulty,
        field: &'static str,
        min: f32,
        max: f32,
    },
    #[error("{tier}: maxAlive must be at least 1")]
    ZeroMaxAlive { tier: Difficulty },
    #[error("hit radius must be positive, got {0}")]
    InvalidHitRadius(f32),
    #[error("session duration must be positive")]
    ZeroDuration,
    #[error("arena {width}x{height} cannot hold a creature of radius {radius}")]
    ArenaTooSmall { width: f32, height: f32, radius: f32 },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Complete game balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub duration_ms: u32,
    pub hit_radius_px: f32,
    pub scores: PerKind<i32>,
    pub easy: TierTuning,
    pub medium: TierTuning,
    pub hard: TierTuning,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            duration_ms: SESSION_DURATION_MS,
            hit_radius_px: HIT_RADIUS_PX,
            scores: PerKind {
                common: 1,
                malaria: 3,
                bee: -5,
            },
            easy: TierTuning {
                interval_ms: Span(900.0, 1100.0),
                max_alive: 5,
                speed_px_per_sec: Span(120.0, 180.0),
                weights: PerKind {
                    common: 70.0,
                    malaria: 20.0,
                    bee: 10.0,
                },
            },
            medium: TierTuning {
                interval_ms: Span(650.0, 850.0),
                max_alive: 7,
                speed_px_per_sec: Span(200.0, 260.0),
                weights: PerKind {
                    common: 65.0,
                    malaria: 25.0,
                    bee: 10.0,
                },
            },
            hard: TierTuning {
                interval_ms: Span(450.0, 600.0),
                max_alive: 9,
                speed_px_per_sec: Span(280.0, 360.0),
                weights: PerKind {
                    common: 60.0,
                    malaria: 28.0,
                    bee: 12.0,
                },
            },
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON tuning file
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every tier and global value; called once at startup
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_ms == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if !(self.hit_radius_px.is_finite() && self.hit_radius_px > 0.0) {
            return Err(ConfigError::InvalidHitRadius(self.hit_radius_px));
        }
        for tier in Difficulty::ALL {
            let tuning = self.tuning(tier);
            check_span(tier, "intervalMs", tuning.interval_ms)?;
            check_span(tier, "speedPxPerSec", tuning.speed_px_per_sec)?;
            if tuning.max_alive == 0 {
                return Err(ConfigError::ZeroMaxAlive { tier });
            }
            let weights_ok = tuning
                .weights
                .iter()
                .all(|(_, w)| w.is_finite() && w >= 0.0);
            let total: f32 = tuning.weights.iter().map(|(_, w)| w).sum();
            if !weights_ok || total <= 0.0 {
                return Err(ConfigError::InvalidWeights { tier });
            }
        }
        Ok(())
    }

    pub fn tuning(&self, tier: Difficulty) -> &TierTuning {
        match tier {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }

    /// Resolve the full profile for a tier
    pub fn profile(&self, tier: Difficulty) -> DifficultyProfile {
        let tuning = self.tuning(tier);
        DifficultyProfile {
            tier,
            interval_ms: tuning.interval_ms,
            max_alive: tuning.max_alive,
            speed_px_per_sec: tuning.speed_px_per_sec,
            weights: tuning.weights,
            scores: self.scores,
            hit_radius: self.hit_radius_px,
            duration_ms: self.duration_ms,
        }
    }
}

fn check_span(tier: Difficulty, field: &'static str, span: Span) -> Result<(), ConfigError> {
    if span.is_valid() {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange {
            tier,
            field,
            min: span.min(),
            max: span.max(),
        })
    }
}

/// Everything the engine and session need to know about one tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyProfile {
    pub tier: Difficulty,
    pub interval_ms: Span,
    pub max_alive: usize,
    pub speed_px_per_sec: Span,
    pub weights: PerKind<f32>,
    pub scores: PerKind<i32>,
    pub hit_radius: f32,
    pub duration_ms: u32,
}

impl DifficultyProfile {
    /// Draw the delay until the next spawn
    pub fn spawn_interval<R: RandomSource + ?Sized>(&self, rng: &mut R) -> f64 {
        uniform_in_range(rng, self.interval_ms.min(), self.interval_ms.max()) as f64
    }

    /// Draw a creature speed in px/s
    pub fn speed<R: RandomSource + ?Sized>(&self, rng: &mut R) -> f32 {
        uniform_in_range(rng, self.speed_px_per_sec.min(), self.speed_px_per_sec.max())
    }

    /// Score delta for eliminating a creature of `kind`
    #[inline]
    pub fn score_for(&self, kind: CreatureKind) -> i32 {
        self.scores.get(kind)
    }
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        GameConfig::default().profile(Difficulty::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::tests::ScriptedSource;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());

        let hard = config.profile(Difficulty::Hard);
        assert_eq!(hard.max_alive, 9);
        assert_eq!(hard.duration_ms, 60_000);
        assert_eq!(hard.score_for(CreatureKind::Bee), -5);
        assert_eq!(hard.score_for(CreatureKind::Malaria), 3);
    }

    #[test]
    fn test_weights_sum_to_hundred() {
        let config = GameConfig::default();
        for tier in Difficulty::ALL {
            let total: f32 = config.tuning(tier).weights.iter().map(|(_, w)| w).sum();
            assert!((total - 100.0).abs() < 0.001, "{tier} sums to {total}");
        }
    }

    #[test]
    fn test_zero_weights_rejected() {
        let mut config = GameConfig::default();
        config.medium.weights = PerKind {
            common: 0.0,
            malaria: 0.0,
            bee: 0.0,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWeights {
                tier: Difficulty::Medium
            })
        ));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = GameConfig::default();
        config.easy.weights.bee = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWeights { tier: Difficulty::Easy })
        ));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut config = GameConfig::default();
        config.hard.speed_px_per_sec = Span(360.0, 280.0);
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidRange {
                field: "speedPxPerSec",
                ..
            }
        ));
        assert!(err.to_string().contains("hard"));
    }

    #[test]
    fn test_zero_max_alive_and_radius_rejected() {
        let mut config = GameConfig::default();
        config.easy.max_alive = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroMaxAlive { .. })));

        let mut config = GameConfig::default();
        config.hit_radius_px = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidHitRadius(_))));

        let mut config = GameConfig::default();
        config.duration_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroDuration)));
    }

    #[test]
    fn test_json_round_trip_uses_wire_names() {
        let json = serde_json::to_string(&GameConfig::default()).unwrap();
        assert!(json.contains("\"intervalMs\":[900.0,1100.0]"));
        assert!(json.contains("\"maxAlive\":5"));
        let parsed = GameConfig::from_json(&json).unwrap();
        assert_eq!(parsed, GameConfig::default());
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        let mut config = GameConfig::default();
        config.easy.interval_ms = Span(-5.0, 10.0);
        let json = serde_json::to_string(&config).unwrap();
        assert!(matches!(
            GameConfig::from_json(&json),
            Err(ConfigError::InvalidRange { .. })
        ));
        assert!(matches!(
            GameConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_jitter_draws_stay_in_range() {
        let profile = GameConfig::default().profile(Difficulty::Easy);
        let mut rng = ScriptedSource::new(&[0.0, 0.5, 0.999]);
        assert_eq!(profile.spawn_interval(&mut rng), 900.0);
        assert!((profile.spawn_interval(&mut rng) - 1000.0).abs() < 0.01);
        assert!(profile.spawn_interval(&mut rng) < 1100.0);

        let mut rng = ScriptedSource::new(&[0.5]);
        assert!((profile.speed(&mut rng) - 150.0).abs() < 0.01);
    }

    #[test]
    fn test_difficulty_names() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str(" med "), Some(Difficulty::Medium));
        assert_eq!(Difficulty::from_str("insane"), None);
        assert_eq!(Difficulty::default(), Difficulty::Medium);
        assert_eq!(
            serde_json::to_string(&Difficulty::Easy).unwrap(),
            "\"easy\""
        );
    }
}
