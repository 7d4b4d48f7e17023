//! Browser ranking client
//!
//! `fetch`-based counterpart of [`crate::ranking::RankingService`]. Calls are
//! async, so the front-end drives them with `spawn_local` and reports the
//! outcome back through `Game::record_submission`.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use super::{leaderboard_url, record_url};
use crate::config::Difficulty;
use crate::ranking::{
    LEADERBOARD_FAILED, Leaderboard, RankingError, ResultRecord, SUBMIT_FAILED, SubmitAck,
    error_from_response,
};

/// HTTP client for the ranking service
#[derive(Debug, Clone)]
pub struct HttpRanking {
    base_url: String,
}

impl HttpRanking {
    /// An empty base targets the page's own origin
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub async fn submit(&self, record: &ResultRecord) -> Result<SubmitAck, RankingError> {
        let body = serde_json::to_string(record)?;

        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_mode(RequestMode::Cors);
        opts.set_body(&JsValue::from_str(&body));

        let request = Request::new_with_str_and_init(&record_url(&self.base_url), &opts)
            .map_err(network_error)?;
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(network_error)?;

        let (ok, status, text) = send(request).await?;
        if !ok {
            return Err(error_from_response(status, &text, SUBMIT_FAILED));
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn leaderboard(&self, difficulty: Difficulty) -> Result<Leaderboard, RankingError> {
        let opts = RequestInit::new();
        opts.set_method("GET");
        opts.set_mode(RequestMode::Cors);

        let request =
            Request::new_with_str_and_init(&leaderboard_url(&self.base_url, difficulty), &opts)
                .map_err(network_error)?;

        let (ok, status, text) = send(request).await?;
        if !ok {
            return Err(error_from_response(status, &text, LEADERBOARD_FAILED));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

async fn send(request: Request) -> Result<(bool, u16, String), RankingError> {
    let window = web_sys::window().ok_or_else(|| RankingError::Network("no window".into()))?;
    let value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(network_error)?;
    let response: Response = value.dyn_into().map_err(network_error)?;
    let text = JsFuture::from(response.text().map_err(network_error)?)
        .await
        .map_err(network_error)?;
    Ok((
        response.ok(),
        response.status(),
        text.as_string().unwrap_or_default(),
    ))
}

fn network_error(e: JsValue) -> RankingError {
    RankingError::Network(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}
