//! HUD text
//!
//! Pure formatting from session state; the browser front-end copies these
//! strings into the DOM and the native demo logs them.

use crate::session::{Session, SessionPhase, SubmissionStatus};

/// Values shown in the side panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudText {
    pub name: String,
    pub difficulty: &'static str,
    /// Whole seconds left, rounded up
    pub time_left: String,
    pub score: String,
    /// Negative scores are drawn in the warning colour
    pub score_negative: bool,
    /// Status line under the arena (game over, submission notices)
    pub status: Option<String>,
}

/// Whole seconds remaining, rounded up so "1" shows until the very end
pub fn seconds_left(time_remaining_ms: f64) -> u32 {
    (time_remaining_ms.max(0.0) / 1000.0).ceil() as u32
}

pub fn submission_notice(status: &SubmissionStatus) -> Option<String> {
    match status {
        SubmissionStatus::NotReady | SubmissionStatus::Pending => None,
        SubmissionStatus::InFlight => Some("Submitting score...".to_string()),
        SubmissionStatus::Stored { .. } => Some("Score submitted!".to_string()),
        SubmissionStatus::Failed { message } => Some(format!("Score submission failed: {message}")),
    }
}

impl HudText {
    pub fn from_session(session: &Session) -> Self {
        let status = match session.phase() {
            SessionPhase::Idle => Some("Press start".to_string()),
            SessionPhase::Running => None,
            SessionPhase::Ended => {
                let mut line = format!("Game over! Final score: {}", session.score());
                if let Some(notice) = submission_notice(session.submission()) {
                    line.push_str(" - ");
                    line.push_str(&notice);
                }
                Some(line)
            }
        };

        Self {
            name: session.player().as_str().to_string(),
            difficulty: session.profile().tier.label(),
            time_left: format!("{}s", seconds_left(session.time_remaining_ms())),
            score: session.score().to_string(),
            score_negative: session.score() < 0,
            status,
        }
    }
}
