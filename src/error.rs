use thiserror::Error;

/// Failures of the rules adapter. These are the only errors the `chess`
/// crate can hand us, converted to owned text so they cross threads freely.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("invalid FEN `{fen}`: {reason}")]
    InvalidFen { fen: String, reason: String },
    #[error("`{0}` is not a move in long algebraic notation")]
    MalformedMove(String),
    #[error("move {mv} is not legal in this position")]
    IllegalMove { mv: String },
    #[error("there is no move to take back")]
    EmptyHistory,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("search left the legal move set: {0}")]
    Position(#[from] PositionError),
    #[error("search panicked: {0}")]
    Panicked(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("difficulty must be between 1 and 4, got {0}")]
    InvalidDifficulty(u8),
    #[error("could not read engine config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    #[error("a move is already being computed")]
    Busy,
    #[error("the previous result has not been collected")]
    Unconsumed,
    #[error("could not start the engine worker")]
    Spawn,
}
