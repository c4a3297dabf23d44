mod book;
mod bridge;
mod config;
mod engine;
mod error;
mod js_interface;
mod logger;
mod position;
mod selector;
mod stopwatch;
mod utils;

/// Centipawns, from the side to move's point of view once evaluated
pub type Score = i32;

pub use book::{BookKey, OpeningBook};
pub use bridge::{AsyncEngine, Progress};
pub use config::{Difficulty, EngineConfig};
pub use engine::{
    alphabeta::AlphaBeta,
    default_engine,
    minimax::Minimax,
    weighted_eval::{Features, WeightedEval, Weights},
    BranchInfo, Engine, LayerInfo, SearchOutcome, StaticEvaluator,
};
pub use error::{BridgeError, ConfigError, PositionError, SearchError};
pub use js_interface::JsEngine;
pub use logger::Logger;
pub use position::{DrawReason, Ply, Position, Status};
pub use selector::{
    fallback_move, Decision, DecisionReport, FallbackPick, FallbackReason, MoveSelector, Source,
};

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;
