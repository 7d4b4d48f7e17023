//! Player preferences
//!
//! Persisted separately from anything gameplay-related in LocalStorage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Difficulty;
use crate::consts::{NAME_MAX_CHARS, NAME_MIN_CHARS};

/// Why a player name was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("Please enter a name.")]
    Empty,
    #[error("Names must be at most {max} characters.", max = NAME_MAX_CHARS)]
    TooLong,
}

/// A trimmed player name of 1 to 12 characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerName(String);

impl PlayerName {
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        let name = raw.trim();
        let chars = name.chars().count();
        if chars < NAME_MIN_CHARS {
            return Err(NameError::Empty);
        }
        if chars > NAME_MAX_CHARS {
            return Err(NameError::TooLong);
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PlayerName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PlayerName> for String {
    fn from(name: PlayerName) -> Self {
        name.0
    }
}

/// Saved preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Last name that started a game
    #[serde(default)]
    pub last_name: Option<PlayerName>,
    /// Preferred tier for the start screen
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl Settings {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "mosquito_snatch_settings";

    /// Remember what the player just started with
    pub fn remember(&mut self, name: &PlayerName, difficulty: Difficulty) {
        self.last_name = Some(name.clone());
        self.difficulty = difficulty;
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
