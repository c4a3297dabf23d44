use chess::ChessMove;

use super::BranchInfo;
use crate::Score;

/// What a search found at the root.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// The minimax value of the root, on the evaluator's scale
    pub score: Score,
    /// The first move in enumeration order achieving `score`. `None` when the
    /// root was already terminal.
    pub best_move: Option<ChessMove>,
    pub branch_info: BranchInfo,
}
