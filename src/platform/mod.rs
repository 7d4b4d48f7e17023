//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Monotonic time and seeds
//! - Arena sizing from the viewport
//! - Ranking service endpoints (HTTP client lives in `web`, wasm only)

#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::config::Difficulty;

/// Viewports narrower than this get the compact arena
pub const MOBILE_BREAKPOINT_PX: f32 = 768.0;
/// Horizontal page padding subtracted from the viewport on mobile
const MOBILE_GUTTER_PX: f32 = 32.0;
const MOBILE_MAX_WIDTH: f32 = 400.0;
const MOBILE_HEIGHT: f32 = 400.0;

/// Arena size (CSS pixels) for a viewport width
pub fn arena_size_for_viewport(viewport_width: f32) -> (f32, f32) {
    if viewport_width < MOBILE_BREAKPOINT_PX {
        (
            MOBILE_MAX_WIDTH.min(viewport_width - MOBILE_GUTTER_PX),
            MOBILE_HEIGHT,
        )
    } else {
        (
            crate::consts::DEFAULT_ARENA_WIDTH,
            crate::consts::DEFAULT_ARENA_HEIGHT,
        )
    }
}

/// `POST` target for result records
pub fn record_url(base: &str) -> String {
    format!("{}/api/record", base.trim_end_matches('/'))
}

/// `GET` target for one tier's leaderboard
pub fn leaderboard_url(base: &str, difficulty: Difficulty) -> String {
    format!(
        "{}/api/leaderboard?difficulty={}",
        base.trim_end_matches('/'),
        difficulty.as_str()
    )
}

/// Milliseconds on a monotonic clock
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// Milliseconds on a monotonic clock
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    ORIGIN.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
}

/// Seed for a new session when none is supplied
#[cfg(target_arch = "wasm32")]
pub fn fresh_seed() -> u64 {
    js_sys::Date::now() as u64
}

/// Seed for a new session when none is supplied
#[cfg(not(target_arch = "wasm32"))]
pub fn fresh_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
