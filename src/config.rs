use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::TokenId;
use crate::timing::TimingContext;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Session configuration. `bos_id` must match the external tokenizer's
/// vocabulary; a wrong sentinel silently produces an invalid seed, which is
/// why it lives here and not in code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bpm: f32,
    pub ticks_per_beat: u16,
    pub time_signature: (u8, u8),
    pub context_window: usize,
    pub bos_id: TokenId,
    pub generate_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            ticks_per_beat: 480,
            time_signature: (4, 4),
            context_window: 512,
            bos_id: 1,
            generate_count: 500,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(ron::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn timing(&self) -> TimingContext {
        TimingContext::from_bpm(self.bpm, self.ticks_per_beat)
    }
}
