pub mod alphabeta;
mod branch_info;
mod evaluator;
pub mod minimax;
mod search_result;
pub mod weighted_eval;

pub use branch_info::{BranchInfo, LayerInfo};
pub use evaluator::StaticEvaluator;
pub use search_result::SearchOutcome;

use crate::{error::SearchError, position::Position};

/// A fixed-depth search. Implementors must be shareable between threads,
/// since the selector runs on a worker thread.
pub trait Engine: Send + Sync {
    fn default(static_evaluator: impl StaticEvaluator + 'static) -> Self
    where
        Self: Sized;

    fn name(&self) -> &'static str;

    /// Searches exactly `depth` plies from `position` (less where the game
    /// ends sooner), maximizing when White is to move.
    ///
    /// `position` is scratch space: moves are pushed and popped on it during
    /// the search, and it is left as it was found.
    fn search(&self, position: &mut Position, depth: u8) -> Result<SearchOutcome, SearchError>;
}

/// The engine the selector uses unless told otherwise
pub fn default_engine() -> impl Engine {
    alphabeta::AlphaBeta::default(weighted_eval::WeightedEval::default())
}
