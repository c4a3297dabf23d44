use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How hard the engine tries. Each level searches to a fixed depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    Beginner,
    Amateur,
    Club,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Beginner,
        Difficulty::Amateur,
        Difficulty::Club,
        Difficulty::Expert,
    ];

    /// Search depth in plies
    pub fn depth(self) -> u8 {
        match self {
            Difficulty::Beginner => 2,
            Difficulty::Amateur => 3,
            Difficulty::Club => 4,
            Difficulty::Expert => 5,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Difficulty::Beginner => 1,
            Difficulty::Amateur => 2,
            Difficulty::Club => 3,
            Difficulty::Expert => 4,
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self { Difficulty::Amateur }
}

impl TryFrom<u8> for Difficulty {
    type Error = ConfigError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(Difficulty::Beginner),
            2 => Ok(Difficulty::Amateur),
            3 => Ok(Difficulty::Club),
            4 => Ok(Difficulty::Expert),
            _ => Err(ConfigError::InvalidDifficulty(level)),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(difficulty: Difficulty) -> u8 { difficulty.level() }
}

/// Everything the engine can be configured with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub difficulty: Difficulty,
    /// 10 is everything and 0 is nothing
    pub log_level: u8,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<EngineConfig, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
