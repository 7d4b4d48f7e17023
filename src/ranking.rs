//! Result submission and leaderboard
//!
//! The ranking service is external; this module holds its wire types, the
//! [`RankingService`] seam and an in-memory implementation used by the native
//! build and by tests. The browser build talks HTTP through
//! `platform::web::HttpRanking`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Difficulty;
use crate::consts::LEADERBOARD_SIZE;

/// Generic notices used when the server gives no message
pub const SUBMIT_FAILED: &str = "Failed to submit record";
pub const LEADERBOARD_FAILED: &str = "Failed to fetch leaderboard";

/// Outbound result of one finished session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub name: String,
    pub difficulty: Difficulty,
    pub score: i64,
    pub duration_ms: u64,
    /// Mean inter-catch time, rounded; 0 with no catches
    pub avg_catch_ms: u64,
    pub caught: u32,
}

/// Acknowledgement for a stored record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAck {
    pub stored: bool,
    pub id: String,
    /// Opaque rank preview; not interpreted by the game
    #[serde(default)]
    pub rank_preview: Option<serde_json::Value>,
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub name: String,
    pub score: i64,
    pub duration_ms: u64,
    pub avg_catch_ms: u64,
    pub caught: u32,
    /// Unix timestamp (ms)
    pub created_at: i64,
}

/// Leaderboard response for one tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub difficulty: Difficulty,
    pub top: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Trim to the display size and check rank order.
    ///
    /// Returns a decode error if ranks do not ascend from 1.
    pub fn normalized(mut self) -> Result<Self, RankingError> {
        self.top.truncate(LEADERBOARD_SIZE);
        let ordered = self
            .top
            .iter()
            .enumerate()
            .all(|(i, e)| e.rank == i as u32 + 1);
        if !ordered {
            return Err(RankingError::Malformed("leaderboard ranks out of order".into()));
        }
        Ok(self)
    }
}

/// Failures talking to the ranking service
#[derive(Debug, Error)]
pub enum RankingError {
    /// Non-success status; `message` is the server's text or the generic notice
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RankingError {
    /// One-line text shown to the player
    pub fn user_message(&self) -> String {
        match self {
            RankingError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Build the error for a non-success response, preferring the server's message
pub fn error_from_response(status: u16, body: &str, fallback: &str) -> RankingError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    RankingError::Rejected { status, message }
}

/// The external ranking service, one attempt per call
pub trait RankingService {
    fn submit(&mut self, record: &ResultRecord) -> Result<SubmitAck, RankingError>;
    fn leaderboard(&mut self, difficulty: Difficulty) -> Result<Leaderboard, RankingError>;
}

/// What the leaderboard panel should show
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LeaderboardView {
    #[default]
    Loading,
    Loaded(Vec<LeaderboardEntry>),
    Failed(String),
}

impl LeaderboardView {
    pub fn from_result(result: Result<Leaderboard, RankingError>) -> Self {
        match result.and_then(Leaderboard::normalized) {
            Ok(board) => LeaderboardView::Loaded(board.top),
            Err(e) => {
                log::warn!("Leaderboard unavailable: {}", e);
                LeaderboardView::Failed(e.user_message())
            }
        }
    }

    /// Text lines for a plain-text panel
    pub fn lines(&self) -> Vec<String> {
        match self {
            LeaderboardView::Loading => vec!["Loading...".to_string()],
            LeaderboardView::Failed(message) => vec![message.clone()],
            LeaderboardView::Loaded(entries) if entries.is_empty() => {
                vec!["No records yet.".to_string()]
            }
            LeaderboardView::Loaded(entries) => entries
                .iter()
                .map(|e| format!("{}. {} {}", e.rank, e.name, e.score))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct StoredRecord {
    record: ResultRecord,
    created_at: i64,
}

/// In-memory ranking service
#[derive(Debug, Clone, Default)]
pub struct LocalRanking {
    boards: HashMap<Difficulty, Vec<StoredRecord>>,
    next_id: u64,
    /// Submissions fail with this status while set
    reject_with: Option<u16>,
    submissions: usize,
}

impl LocalRanking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following submission fail with `status`
    pub fn fail_submissions(&mut self, status: u16) {
        self.reject_with = Some(status);
    }

    /// Number of submission attempts seen, successful or not
    pub fn submission_attempts(&self) -> usize {
        self.submissions
    }

    /// Rank a score would get right now (1-indexed)
    pub fn potential_rank(&self, difficulty: Difficulty, score: i64) -> usize {
        let board = self.boards.get(&difficulty).map(Vec::as_slice).unwrap_or(&[]);
        board.iter().take_while(|s| s.record.score >= score).count() + 1
    }
}

impl RankingService for LocalRanking {
    fn submit(&mut self, record: &ResultRecord) -> Result<SubmitAck, RankingError> {
        self.submissions += 1;
        if let Some(status) = self.reject_with {
            return Err(error_from_response(
                status,
                r#"{"message":"ranking service unavailable"}"#,
                SUBMIT_FAILED,
            ));
        }

        let board = self.boards.entry(record.difficulty).or_default();
        // Sorted descending by score; ties keep submission order
        let pos = board
            .iter()
            .position(|s| record.score > s.record.score)
            .unwrap_or(board.len());
        board.insert(
            pos,
            StoredRecord {
                record: record.clone(),
                created_at: self.next_id as i64,
            },
        );

        self.next_id += 1;
        let id = self.next_id.to_string();
        log::info!(
            "Stored record {} for {} ({}, rank {})",
            id,
            record.name,
            record.difficulty,
            pos + 1
        );
        Ok(SubmitAck {
            stored: true,
            id,
            rank_preview: Some(serde_json::json!({ "rank": pos + 1 })),
        })
    }

    fn leaderboard(&mut self, difficulty: Difficulty) -> Result<Leaderboard, RankingError> {
        let top = self
            .boards
            .get(&difficulty)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .take(LEADERBOARD_SIZE)
            .enumerate()
            .map(|(i, s)| LeaderboardEntry {
                rank: i as u32 + 1,
                name: s.record.name.clone(),
                score: s.record.score,
                duration_ms: s.record.duration_ms,
                avg_catch_ms: s.record.avg_catch_ms,
                caught: s.record.caught,
                created_at: s.created_at,
            })
            .collect();
        Ok(Leaderboard { difficulty, top })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, score: i64) -> ResultRecord {
        ResultRecord {
            name: name.to_string(),
            difficulty: Difficulty::Easy,
            score,
            duration_ms: 60_000,
            avg_catch_ms: 600,
            caught: 2,
        }
    }

    #[test]
    fn test_record_wire_format() {
        let json = serde_json::to_value(record("kim", 4)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "kim",
                "difficulty": "easy",
                "score": 4,
                "durationMs": 60000,
                "avgCatchMs": 600,
                "caught": 2
            })
        );
    }

    #[test]
    fn test_ack_without_rank_preview() {
        let ack: SubmitAck = serde_json::from_str(r#"{"stored":true,"id":"abc"}"#).unwrap();
        assert!(ack.stored);
        assert_eq!(ack.id, "abc");
        assert_eq!(ack.rank_preview, None);
    }

    #[test]
    fn test_leaderboard_response_decodes() {
        let body = r#"{"difficulty":"hard","top":[
            {"rank":1,"name":"a","score":30,"durationMs":60000,"avgCatchMs":800,"caught":31,"createdAt":1700000000000},
            {"rank":2,"name":"b","score":-5,"durationMs":60000,"avgCatchMs":0,"caught":1,"createdAt":1700000000001}
        ]}"#;
        let board: Leaderboard = serde_json::from_str(body).unwrap();
        let board = board.normalized().unwrap();
        assert_eq!(board.difficulty, Difficulty::Hard);
        assert_eq!(board.top[1].score, -5);
    }

    #[test]
    fn test_leaderboard_rank_order_checked() {
        let mut board = Leaderboard {
            difficulty: Difficulty::Easy,
            top: Vec::new(),
        };
        let mut ranking = LocalRanking::new();
        ranking.submit(&record("a", 1)).unwrap();
        board.top = ranking.leaderboard(Difficulty::Easy).unwrap().top;
        board.top[0].rank = 3;
        assert!(matches!(board.normalized(), Err(RankingError::Malformed(_))));
    }

    #[test]
    fn test_error_prefers_server_message() {
        let err = error_from_response(400, r#"{"message":"name too long"}"#, SUBMIT_FAILED);
        assert_eq!(err.user_message(), "name too long");
        assert!(matches!(err, RankingError::Rejected { status: 400, .. }));

        let err = error_from_response(502, "<html>bad gateway</html>", SUBMIT_FAILED);
        assert_eq!(err.user_message(), SUBMIT_FAILED);

        let err = error_from_response(500, r#"{"message":""}"#, LEADERBOARD_FAILED);
        assert_eq!(err.user_message(), LEADERBOARD_FAILED);
    }

    #[test]
    fn test_local_ranking_orders_and_truncates() {
        let mut ranking = LocalRanking::new();
        for (name, score) in [("a", 5), ("b", 12), ("c", -3), ("d", 12), ("e", 7), ("f", 1)] {
            assert!(ranking.submit(&record(name, score)).unwrap().stored);
        }
        let board = ranking.leaderboard(Difficulty::Easy).unwrap();
        let names: Vec<_> = board.top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "e", "a", "f"]);
        let ranks: Vec<_> = board.top.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);

        assert!(ranking.leaderboard(Difficulty::Hard).unwrap().top.is_empty());
        assert_eq!(ranking.potential_rank(Difficulty::Easy, 8), 3);
        assert_eq!(ranking.potential_rank(Difficulty::Hard, 0), 1);
    }

    #[test]
    fn test_local_ranking_forced_failure() {
        let mut ranking = LocalRanking::new();
        ranking.fail_submissions(503);
        let err = ranking.submit(&record("a", 1)).unwrap_err();
        assert_eq!(err.user_message(), "ranking service unavailable");
        assert_eq!(ranking.submission_attempts(), 1);
        assert!(ranking.leaderboard(Difficulty::Easy).unwrap().top.is_empty());
    }

    #[test]
    fn test_leaderboard_view_states() {
        assert_eq!(LeaderboardView::default().lines(), vec!["Loading..."]);

        let empty = LeaderboardView::from_result(Ok(Leaderboard {
            difficulty: Difficulty::Easy,
            top: Vec::new(),
        }));
        assert_eq!(empty.lines(), vec!["No records yet."]);

        let failed = LeaderboardView::from_result(Err(error_from_response(500, "", LEADERBOARD_FAILED)));
        assert_eq!(failed, LeaderboardView::Failed(LEADERBOARD_FAILED.to_string()));

        let mut ranking = LocalRanking::new();
        ranking.submit(&record("kim", 9)).unwrap();
        let loaded = LeaderboardView::from_result(ranking.leaderboard(Difficulty::Easy));
        assert_eq!(loaded.lines(), vec!["1. kim 9"]);
    }
}
