//! Session state machine
//!
//! `Idle → Running → Ended`. Ended is terminal: a replay needs a new
//! [`Session`]. The result record is built exactly once on entering Ended and
//! handed out for exactly one submission attempt.

use serde::{Deserialize, Serialize};

use crate::config::{CreatureKind, DifficultyProfile};
use crate::ranking::{RankingError, RankingService, ResultRecord, SubmitAck};
use crate::settings::PlayerName;

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Waiting for the player to press start
    Idle,
    /// Countdown active, taps accepted
    Running,
    /// Time is up
    Ended,
}

/// Progress of the single result submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    /// Session has not ended
    NotReady,
    /// Result built, not yet handed out
    Pending,
    /// Handed to a submitter, awaiting the outcome
    InFlight,
    Stored { id: String },
    /// User-visible, non-fatal failure notice
    Failed { message: String },
}

/// One play-through
#[derive(Debug, Clone)]
pub struct Session {
    player: PlayerName,
    profile: DifficultyProfile,
    phase: SessionPhase,
    score: i64,
    time_remaining_ms: f64,
    /// Inter-catch intervals, used for the average only
    catch_intervals_ms: Vec<u64>,
    caught: u32,
    started_at_ms: f64,
    last_catch_ms: Option<f64>,
    result: Option<ResultRecord>,
    submission: SubmissionStatus,
}

impl Session {
    pub fn new(player: PlayerName, profile: DifficultyProfile) -> Self {
        Self {
            player,
            profile,
            phase: SessionPhase::Idle,
            score: 0,
            time_remaining_ms: profile.duration_ms as f64,
            catch_intervals_ms: Vec::new(),
            caught: 0,
            started_at_ms: 0.0,
            last_catch_ms: None,
            result: None,
            submission: SubmissionStatus::NotReady,
        }
    }

    /// Idle → Running. Returns false (and does nothing) from any other phase.
    pub fn start(&mut self, now_ms: f64) -> bool {
        if self.phase != SessionPhase::Idle {
            return false;
        }
        self.phase = SessionPhase::Running;
        self.score = 0;
        self.time_remaining_ms = self.profile.duration_ms as f64;
        self.catch_intervals_ms.clear();
        self.caught = 0;
        self.started_at_ms = now_ms;
        self.last_catch_ms = None;
        log::info!(
            "Session started: {} on {}",
            self.player.as_str(),
            self.profile.tier
        );
        true
    }

    /// Score a hit. Ignored unless Running; returns the applied score delta.
    pub fn on_hit(&mut self, kind: CreatureKind, now_ms: f64) -> Option<i32> {
        if self.phase != SessionPhase::Running {
            return None;
        }
        let delta = self.profile.score_for(kind);
        self.score += delta as i64;
        self.caught += 1;

        match self.last_catch_ms {
            Some(prev) => {
                self.catch_intervals_ms.push((now_ms - prev).max(0.0).round() as u64);
            }
            None => {
                // First catch measures from session start; non-positive samples are dropped
                let elapsed = now_ms - self.started_at_ms;
                if elapsed > 0.0 {
                    self.catch_intervals_ms.push(elapsed.round() as u64);
                }
            }
        }
        self.last_catch_ms = Some(now_ms);
        Some(delta)
    }

    /// Advance the countdown. Returns true on the tick that ends the session.
    pub fn tick(&mut self, elapsed_ms: f64) -> bool {
        if self.phase != SessionPhase::Running || elapsed_ms <= 0.0 {
            return false;
        }
        self.time_remaining_ms -= elapsed_ms;
        if self.time_remaining_ms > 0.0 {
            return false;
        }
        self.time_remaining_ms = 0.0;
        self.phase = SessionPhase::Ended;

        let record = self.build_record();
        log::info!(
            "Session ended: score {} caught {} avg {}ms",
            record.score,
            record.caught,
            record.avg_catch_ms
        );
        self.result = Some(record);
        self.submission = SubmissionStatus::Pending;
        true
    }

    fn build_record(&self) -> ResultRecord {
        ResultRecord {
            name: self.player.as_str().to_string(),
            difficulty: self.profile.tier,
            score: self.score,
            duration_ms: self.profile.duration_ms as u64,
            avg_catch_ms: self.average_catch_ms(),
            caught: self.caught,
        }
    }

    /// Mean of recorded intervals rounded to the nearest ms, 0 with none
    pub fn average_catch_ms(&self) -> u64 {
        if self.catch_intervals_ms.is_empty() {
            return 0;
        }
        let total: u64 = self.catch_intervals_ms.iter().sum();
        (total as f64 / self.catch_intervals_ms.len() as f64).round() as u64
    }

    /// Hand out the result for its one submission attempt.
    ///
    /// Returns `Some` once after the session ends, `None` before and after.
    pub fn take_result(&mut self) -> Option<ResultRecord> {
        if self.submission != SubmissionStatus::Pending {
            return None;
        }
        self.submission = SubmissionStatus::InFlight;
        self.result.clone()
    }

    /// Record the outcome of the attempt started by [`Session::take_result`]
    pub fn record_submission(&mut self, outcome: Result<SubmitAck, RankingError>) {
        if self.submission != SubmissionStatus::InFlight {
            log::warn!("Submission outcome arrived with no attempt in flight");
            return;
        }
        self.submission = match outcome {
            Ok(ack) if ack.stored => {
                log::info!("Result stored as {}", ack.id);
                SubmissionStatus::Stored { id: ack.id }
            }
            Ok(ack) => {
                log::warn!("Ranking service did not store result {}", ack.id);
                SubmissionStatus::Failed {
                    message: crate::ranking::SUBMIT_FAILED.to_string(),
                }
            }
            Err(e) => {
                log::warn!("Failed to submit score: {}", e);
                SubmissionStatus::Failed {
                    message: e.user_message(),
                }
            }
        };
    }

    /// Take the result and submit it synchronously, once
    pub fn submit_with(&mut self, service: &mut dyn RankingService) -> &SubmissionStatus {
        if let Some(record) = self.take_result() {
            let outcome = service.submit(&record);
            self.record_submission(outcome);
        }
        &self.submission
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    /// Every successful hit of any kind. This can exceed
    /// `catch_intervals_ms().len()`, which drops a first catch at or before
    /// the start time.
    pub fn caught(&self) -> u32 {
        self.caught
    }

    pub fn time_remaining_ms(&self) -> f64 {
        self.time_remaining_ms
    }

    pub fn catch_intervals_ms(&self) -> &[u64] {
        &self.catch_intervals_ms
    }

    pub fn player(&self) -> &PlayerName {
        &self.player
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    /// Final record, once the session has ended
    pub fn result(&self) -> Option<&ResultRecord> {
        self.result.as_ref()
    }

    pub fn submission(&self) -> &SubmissionStatus {
        &self.submission
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Difficulty, GameConfig};
    use crate::consts::COUNTDOWN_STEP_MS;
    use crate::ranking::LocalRanking;

    fn session() -> Session {
        let profile = GameConfig::default().profile(Difficulty::Easy);
        Session::new(PlayerName::parse("kim").unwrap(), profile)
    }

    fn run_out(session: &mut Session) -> usize {
        let mut ticks = 0;
        while session.is_running() {
            session.tick(COUNTDOWN_STEP_MS);
            ticks += 1;
        }
        ticks
    }

    #[test]
    fn test_scored_session_scenario() {
        let mut s = session();
        assert!(s.start(0.0));
        assert_eq!(s.on_hit(CreatureKind::Malaria, 500.0), Some(3));
        assert_eq!(s.on_hit(CreatureKind::Common, 1200.0), Some(1));
        assert_eq!(run_out(&mut s), 600);

        assert_eq!(s.phase(), SessionPhase::Ended);
        assert_eq!(s.score(), 4);
        assert_eq!(s.catch_intervals_ms(), &[500, 700]);

        let record = s.result().unwrap();
        assert_eq!(record.avg_catch_ms, 600);
        assert_eq!(record.caught, 2);
        assert_eq!(record.score, 4);
        assert_eq!(record.duration_ms, 60_000);
        assert_eq!(record.name, "kim");
        assert_eq!(record.difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_no_hits_submits_once_with_zeroes() {
        let mut s = session();
        s.start(1_000.0);
        run_out(&mut s);

        let mut ranking = LocalRanking::new();
        assert!(matches!(s.submit_with(&mut ranking), SubmissionStatus::Stored { .. }));
        assert!(matches!(s.submit_with(&mut ranking), SubmissionStatus::Stored { .. }));
        assert_eq!(ranking.submission_attempts(), 1);

        let board = ranking.leaderboard(Difficulty::Easy).unwrap();
        assert_eq!(board.top.len(), 1);
        assert_eq!(board.top[0].score, 0);
        assert_eq!(board.top[0].caught, 0);
        assert_eq!(board.top[0].avg_catch_ms, 0);
    }

    #[test]
    fn test_submission_failure_is_recorded_not_raised() {
        let mut s = session();
        s.start(0.0);
        s.on_hit(CreatureKind::Bee, 250.0);
        run_out(&mut s);

        let mut ranking = LocalRanking::new();
        ranking.fail_submissions(500);
        let status = s.submit_with(&mut ranking).clone();
        assert_eq!(
            status,
            SubmissionStatus::Failed {
                message: "ranking service unavailable".to_string()
            }
        );
        assert_eq!(s.phase(), SessionPhase::Ended);
        assert_eq!(s.score(), -5);

        // No retry
        s.submit_with(&mut ranking);
        assert_eq!(ranking.submission_attempts(), 1);
    }

    #[test]
    fn test_hits_ignored_outside_running() {
        let mut s = session();
        assert_eq!(s.on_hit(CreatureKind::Common, 10.0), None);
        assert!(!s.tick(100.0));
        assert_eq!(s.time_remaining_ms(), 60_000.0);

        s.start(0.0);
        run_out(&mut s);
        assert_eq!(s.on_hit(CreatureKind::Malaria, 70_000.0), None);
        assert_eq!(s.score(), 0);
        assert!(!s.start(80_000.0));
        assert_eq!(s.phase(), SessionPhase::Ended);
    }

    #[test]
    fn test_catch_at_session_start_excluded_from_average() {
        let mut s = session();
        s.start(100.0);
        s.on_hit(CreatureKind::Common, 100.0);
        s.on_hit(CreatureKind::Common, 400.0);
        assert_eq!(s.catch_intervals_ms(), &[300]);
        assert_eq!(s.caught(), 2);
        assert_eq!(s.average_catch_ms(), 300);
    }

    #[test]
    fn test_average_rounds_to_nearest() {
        let mut s = session();
        s.start(0.0);
        s.on_hit(CreatureKind::Common, 100.0);
        s.on_hit(CreatureKind::Common, 201.0);
        // (100 + 101) / 2 = 100.5
        assert_eq!(s.average_catch_ms(), 101);
    }

    #[test]
    fn test_countdown_clamps_to_zero() {
        let mut s = session();
        s.start(0.0);
        assert!(!s.tick(59_950.0));
        assert!(s.tick(120.0));
        assert_eq!(s.time_remaining_ms(), 0.0);
        assert!(!s.tick(100.0));
    }

    #[test]
    fn test_result_handed_out_once() {
        let mut s = session();
        assert!(s.take_result().is_none());
        s.start(0.0);
        run_out(&mut s);
        assert!(s.take_result().is_some());
        assert!(s.take_result().is_none());
        assert_eq!(s.submission(), &SubmissionStatus::InFlight);

        s.record_submission(Ok(SubmitAck {
            stored: true,
            id: "42".into(),
            rank_preview: None,
        }));
        assert_eq!(s.submission(), &SubmissionStatus::Stored { id: "42".into() });

        // Late duplicate outcomes are ignored
        s.record_submission(Err(RankingError::Network("timeout".into())));
        assert_eq!(s.submission(), &SubmissionStatus::Stored { id: "42".into() });
    }
}
