use chess::{ChessMove, Color};

use super::{BranchInfo, Engine, SearchOutcome, StaticEvaluator};
use crate::{error::SearchError, logger::Logger, position::Position, Score};

/// Plain minimax over every move, with no pruning. Far slower than
/// [`AlphaBeta`](super::alphabeta::AlphaBeta) but trivially correct, which
/// makes it the reference the pruned search is checked against.
pub struct Minimax {
    static_evaluator: Box<dyn StaticEvaluator>,
    logger: Logger,
}

impl Minimax {
    pub fn new(static_evaluator: impl StaticEvaluator + 'static, log_level: u8) -> Self {
        Minimax {
            static_evaluator: Box::new(static_evaluator),
            logger: Logger::new(log_level),
        }
    }

    fn evaluate_with_cutoff(
        &self, position: &mut Position, cutoff: u8, is_maxing: bool, branch_info: &mut BranchInfo,
    ) -> Result<(Score, Option<ChessMove>), SearchError> {
        branch_info[cutoff as usize].visited += 1;

        if cutoff == 0 || position.is_game_over() {
            return Ok((self.static_evaluator.evaluate(position), None));
        }

        branch_info[cutoff as usize].expanded += 1;

        let mut best: Option<(Score, ChessMove)> = None;
        for mv in position.legal_moves() {
            let mut child = position.play(mv)?;
            let (score, _) =
                self.evaluate_with_cutoff(&mut child, cutoff - 1, !is_maxing, branch_info)?;
            let improves = match best {
                None => true,
                Some((best_score, _)) if is_maxing => score > best_score,
                Some((best_score, _)) => score < best_score,
            };
            if improves {
                best = Some((score, mv));
            }
        }

        Ok(match best {
            Some((score, mv)) => (score, Some(mv)),
            None => (self.static_evaluator.evaluate(position), None),
        })
    }
}

impl Engine for Minimax {
    fn default(static_evaluator: impl StaticEvaluator + 'static) -> Self {
        Minimax::new(static_evaluator, 2)
    }

    fn name(&self) -> &'static str { "minimax" }

    fn search(&self, position: &mut Position, depth: u8) -> Result<SearchOutcome, SearchError> {
        let mut branch_info = BranchInfo::new(depth);
        let is_maxing = position.side_to_move() == Color::White;
        let (score, best_move) =
            self.evaluate_with_cutoff(position, depth, is_maxing, &mut branch_info)?;
        self.logger.log_lazy(6, || branch_info.statistics());
        Ok(SearchOutcome {
            score,
            best_move,
            branch_info,
        })
    }
}
