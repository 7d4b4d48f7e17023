//! Frame driver
//!
//! Ties one [`Engine`] and one [`Session`] to a single callback chain. The
//! front-end calls [`Game::frame`] once per animation frame and
//! [`Game::tap`] for pointer input, always from the same thread.
//!
//! Movement follows real elapsed time (capped per frame); the countdown runs
//! on a fixed 100 ms cadence fed by the uncapped wall-clock delta, so the end
//! of the session lands within one cadence step of the real deadline.

use glam::Vec2;
use rand_pcg::Pcg32;

use crate::config::{ConfigError, Difficulty, GameConfig};
use crate::consts::{COUNTDOWN_STEP_MS, MAX_FRAME_DELTA_MS};
use crate::ranking::{RankingError, RankingService, ResultRecord, SubmitAck};
use crate::rng::{RandomSource, seeded};
use crate::session::{Session, SessionPhase, SubmissionStatus};
use crate::settings::PlayerName;
use crate::sim::{Arena, CreatureView, Engine, Hit};

/// What happened during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub spawned: Option<u32>,
    /// The session ended during this frame
    pub ended: bool,
}

/// One running game: engine, session and timing state
#[derive(Debug, Clone)]
pub struct Game<R = Pcg32> {
    config: GameConfig,
    engine: Engine<R>,
    session: Session,
    paused: bool,
    /// Frame time the current pause began at
    paused_since_ms: Option<f64>,
    /// Set by `stop`; no further frames are processed
    halted: bool,
    last_frame_ms: Option<f64>,
    countdown_accumulator: f64,
}

impl Game<Pcg32> {
    pub fn new(
        config: GameConfig,
        player: PlayerName,
        difficulty: Difficulty,
        arena: Arena,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::with_rng(config, player, difficulty, arena, seeded(seed))
    }
}

impl<R: RandomSource> Game<R> {
    pub fn with_rng(
        config: GameConfig,
        player: PlayerName,
        difficulty: Difficulty,
        arena: Arena,
        rng: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let profile = config.profile(difficulty);
        let engine = Engine::with_rng(arena, profile, rng)?;
        Ok(Self {
            config,
            engine,
            session: Session::new(player, profile),
            paused: false,
            paused_since_ms: None,
            halted: false,
            last_frame_ms: None,
            countdown_accumulator: 0.0,
        })
    }

    /// Start the session and the engine clock
    pub fn start(&mut self, now_ms: f64) -> bool {
        if self.halted || !self.session.start(now_ms) {
            return false;
        }
        self.engine.clear();
        self.paused = false;
        self.paused_since_ms = None;
        self.last_frame_ms = Some(now_ms);
        self.countdown_accumulator = 0.0;
        true
    }

    /// Advance one animation frame
    pub fn frame(&mut self, now_ms: f64) -> FrameReport {
        if self.paused {
            return FrameReport::default();
        }
        if self.halted || !self.session.is_running() {
            self.last_frame_ms = Some(now_ms);
            return FrameReport::default();
        }

        let elapsed = match self.paused_since_ms.take() {
            // First frame after a pause: none of the paused time is simulated
            // or counted toward the next spawn
            Some(since) => {
                self.engine.defer_spawn(now_ms - since);
                0.0
            }
            None => self
                .last_frame_ms
                .map(|prev| (now_ms - prev).max(0.0))
                .unwrap_or(0.0),
        };
        self.last_frame_ms = Some(now_ms);

        let tick = self.engine.tick(now_ms, elapsed.min(MAX_FRAME_DELTA_MS));

        let mut ended = false;
        self.countdown_accumulator += elapsed;
        while self.countdown_accumulator >= COUNTDOWN_STEP_MS {
            self.countdown_accumulator -= COUNTDOWN_STEP_MS;
            if self.session.tick(COUNTDOWN_STEP_MS) {
                ended = true;
                break;
            }
        }
        if ended {
            self.countdown_accumulator = 0.0;
            self.engine.clear();
        }

        FrameReport {
            spawned: tick.spawned,
            ended,
        }
    }

    /// Forward a tap in arena-local coordinates. A hit is scored before this
    /// returns.
    pub fn tap(&mut self, point: Vec2, now_ms: f64) -> Option<Hit> {
        if self.halted || self.paused || !self.session.is_running() {
            return None;
        }
        let hit = self.engine.resolve_tap(point)?;
        self.session.on_hit(hit.kind, now_ms);
        Some(hit)
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }
        log::info!("{}", if paused { "Paused" } else { "Resumed" });
        self.paused = paused;
        if paused && self.session.is_running() {
            self.paused_since_ms = self.last_frame_ms;
        }
    }

    /// Whether the front-end should keep scheduling frames. False before
    /// start, after the session ends and after `stop`.
    pub fn wants_frames(&self) -> bool {
        !self.halted && self.session.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Change tier. Live creatures are untouched; the next spawn interval is
    /// redrawn. An idle session is rebuilt for the new tier, a running one
    /// keeps reporting the tier it started on.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> Result<(), ConfigError> {
        let profile = self.config.profile(difficulty);
        self.engine.set_profile(profile)?;
        if self.session.phase() == SessionPhase::Idle {
            self.session = Session::new(self.session.player().clone(), profile);
        }
        Ok(())
    }

    pub fn resize(&mut self, arena: Arena) -> Result<(), ConfigError> {
        self.engine.resize(arena)
    }

    /// Tear down: halt frame processing and free the live set
    pub fn stop(&mut self) {
        self.halted = true;
        self.engine.clear();
        self.last_frame_ms = None;
        log::info!("Game stopped");
    }

    /// Fresh session for the same player and tier
    pub fn replay(&mut self) {
        let profile = *self.engine.profile();
        self.session = Session::new(self.session.player().clone(), profile);
        self.engine.clear();
        self.halted = false;
        self.paused = false;
        self.paused_since_ms = None;
        self.last_frame_ms = None;
        self.countdown_accumulator = 0.0;
    }

    /// Result for its single submission attempt (async front-ends)
    pub fn take_result(&mut self) -> Option<ResultRecord> {
        self.session.take_result()
    }

    pub fn record_submission(&mut self, outcome: Result<SubmitAck, RankingError>) {
        self.session.record_submission(outcome);
    }

    /// Submit synchronously; a no-op after the first attempt
    pub fn submit_with(&mut self, service: &mut dyn RankingService) -> &SubmissionStatus {
        self.session.submit_with(service)
    }

    /// Render snapshot of the live creatures
    pub fn snapshot(&self) -> Vec<CreatureView> {
        self.engine.snapshot()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn engine(&self) -> &Engine<R> {
        &self.engine
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CreatureKind;
    use crate::consts::REFERENCE_FRAME_MS;
    use crate::ranking::LocalRanking;
    use crate::sim::AutoPlayer;

    fn game(difficulty: Difficulty, seed: u64) -> Game {
        let arena = Arena::new(600.0, 500.0, 22.0).unwrap();
        Game::new(
            GameConfig::default(),
            PlayerName::parse("kim").unwrap(),
            difficulty,
            arena,
            seed,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = GameConfig::default();
        config.hard.max_alive = 0;
        let arena = Arena::new(600.0, 500.0, 22.0).unwrap();
        let result = Game::new(config, PlayerName::parse("kim").unwrap(), Difficulty::Hard, arena, 1);
        assert!(matches!(result, Err(ConfigError::ZeroMaxAlive { .. })));
    }

    #[test]
    fn test_nothing_happens_before_start() {
        let mut g = game(Difficulty::Easy, 1);
        assert_eq!(g.frame(0.0), FrameReport::default());
        assert_eq!(g.frame(5_000.0), FrameReport::default());
        assert!(g.snapshot().is_empty());
        assert_eq!(g.tap(Vec2::new(100.0, 100.0), 5_000.0), None);
        assert_eq!(g.session().phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_full_session_with_autoplayer() {
        let mut g = game(Difficulty::Medium, 2024);
        let mut bot = AutoPlayer::default();
        let frame = REFERENCE_FRAME_MS as f64;

        let start = 10_000.0;
        assert!(g.start(start));
        let mut now = start;
        let mut hits = 0;
        let mut score = 0i64;
        let mut ended_at = None;
        while ended_at.is_none() {
            now += frame;
            let report = g.frame(now);
            if report.ended {
                ended_at = Some(now);
                break;
            }
            if let Some(point) = bot.next_tap(&g.snapshot(), now) {
                if let Some(hit) = g.tap(point, now) {
                    hits += 1;
                    score += g.config().scores.get(hit.kind) as i64;
                }
            }
        }

        let elapsed = ended_at.unwrap() - start;
        assert!((59_990.0..60_000.0 + COUNTDOWN_STEP_MS).contains(&elapsed), "ended after {elapsed}");
        assert_eq!(g.session().phase(), SessionPhase::Ended);
        assert!(g.snapshot().is_empty());
        assert!(hits > 20, "bot only hit {hits}");
        assert_eq!(g.session().score(), score);
        assert_eq!(g.session().caught(), hits);

        let mut ranking = LocalRanking::new();
        assert!(matches!(g.submit_with(&mut ranking), SubmissionStatus::Stored { .. }));
        g.submit_with(&mut ranking);
        assert_eq!(ranking.submission_attempts(), 1);

        // Frozen: further frames and taps do nothing
        assert_eq!(g.frame(now + 1_000.0), FrameReport::default());
        assert!(g.snapshot().is_empty());
    }

    #[test]
    fn test_tap_scores_before_returning() {
        let mut g = game(Difficulty::Easy, 3);
        g.start(0.0);
        g.frame(16.0);
        let target = g.snapshot()[0];
        let hit = g.tap(target.pos, 500.0).unwrap();
        assert_eq!(hit.id, target.id);
        assert_eq!(g.session().score(), g.config().scores.get(hit.kind) as i64);
        assert_eq!(g.session().catch_intervals_ms(), &[500]);
    }

    #[test]
    fn test_pause_freezes_countdown_and_taps() {
        let mut g = game(Difficulty::Easy, 4);
        g.start(0.0);
        g.frame(1_000.0);
        let remaining = g.session().time_remaining_ms();
        let before = g.snapshot();

        g.set_paused(true);
        g.frame(5_000.0);
        g.frame(30_000.0);
        assert_eq!(g.session().time_remaining_ms(), remaining);
        assert_eq!(g.snapshot(), before);
        assert_eq!(g.tap(before[0].pos, 30_000.0), None);

        // Resume does not simulate the paused stretch
        g.set_paused(false);
        g.frame(30_000.0);
        g.frame(30_100.0);
        assert_eq!(g.session().time_remaining_ms(), remaining - 100.0);
    }

    #[test]
    fn test_paused_time_does_not_count_toward_spawns() {
        let mut g = game(Difficulty::Easy, 11);
        g.start(0.0);
        assert_eq!(g.frame(16.0).spawned, Some(1));
        let interval = g.engine().spawn_interval_ms();

        g.set_paused(true);
        g.frame(20_000.0);
        g.set_paused(false);

        assert_eq!(g.frame(50_000.0).spawned, None);
        assert_eq!(g.frame(50_016.0).spawned, None);
        assert_eq!(g.engine().live_count(), 1);
        assert_eq!(g.frame(50_016.0 + interval).spawned, Some(2));
    }

    #[test]
    fn test_slow_frames_still_end_on_time() {
        let mut g = game(Difficulty::Hard, 5);
        g.start(0.0);
        let mut now = 0.0;
        let mut ended_at = None;
        for _ in 0..200 {
            now += 700.0;
            if g.frame(now).ended {
                ended_at = Some(now);
                break;
            }
            for c in g.engine().creatures() {
                assert!(g.engine().arena().contains_circle(c.pos, c.radius));
            }
        }
        assert_eq!(ended_at, Some(60_200.0));
        assert_eq!(g.session().time_remaining_ms(), 0.0);
    }

    #[test]
    fn test_frame_loop_runs_only_while_playing() {
        let mut g = game(Difficulty::Easy, 12);
        assert!(!g.wants_frames());
        g.start(0.0);
        assert!(g.wants_frames());
        g.set_paused(true);
        assert!(g.wants_frames());
        g.set_paused(false);
        g.frame(1.0);
        assert!(g.frame(60_001.0).ended);
        assert!(!g.wants_frames());

        g.replay();
        g.start(70_000.0);
        assert!(g.wants_frames());
        g.stop();
        assert!(!g.wants_frames());
        assert!(!g.start(80_000.0));
    }

    #[test]
    fn test_stop_tears_down() {
        let mut g = game(Difficulty::Easy, 6);
        g.start(0.0);
        g.frame(16.0);
        assert!(!g.snapshot().is_empty());
        g.stop();
        assert!(g.snapshot().is_empty());
        assert_eq!(g.frame(1_000.0), FrameReport::default());
        assert!(g.snapshot().is_empty());
    }

    #[test]
    fn test_replay_builds_fresh_session() {
        let mut g = game(Difficulty::Easy, 7);
        g.start(0.0);
        g.frame(16.0);
        let c = g.snapshot()[0];
        g.tap(c.pos, 100.0);
        g.frame(60_100.0);
        assert_eq!(g.session().phase(), SessionPhase::Ended);
        assert!(!g.start(70_000.0));

        g.replay();
        assert_eq!(g.session().phase(), SessionPhase::Idle);
        assert!(g.start(70_000.0));
        assert_eq!(g.session().score(), 0);
        assert_eq!(g.session().caught(), 0);
    }

    #[test]
    fn test_difficulty_change() {
        let mut g = game(Difficulty::Easy, 8);
        g.set_difficulty(Difficulty::Hard).unwrap();
        assert_eq!(g.session().profile().tier, Difficulty::Hard);

        g.start(0.0);
        g.frame(16.0);
        let before = g.snapshot();
        g.set_difficulty(Difficulty::Easy).unwrap();
        assert_eq!(g.session().profile().tier, Difficulty::Hard);
        assert_eq!(g.engine().profile().tier, Difficulty::Easy);
        assert_eq!(g.snapshot(), before);
    }

    #[test]
    fn test_bee_penalty_through_game() {
        let mut g = game(Difficulty::Easy, 9);
        g.start(0.0);
        g.engine.insert(CreatureKind::Bee, Vec2::new(300.0, 250.0), Vec2::ZERO);
        let hit = g.tap(Vec2::new(300.0, 250.0), 100.0).unwrap();
        assert_eq!(hit.kind, CreatureKind::Bee);
        assert_eq!(g.session().score(), -5);
    }
}
