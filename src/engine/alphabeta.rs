mod bounds;
pub use bounds::Bounds;

#[cfg(test)] mod tests;

use chess::{ChessMove, Color::*};

use super::{evaluator::StaticEvaluator, BranchInfo, Engine, SearchOutcome};
use crate::{error::SearchError, logger::Logger, position::Position, Score};

/// Fixed-depth minimax with alpha-beta pruning.
///
/// Moves are tried in the order the `chess` crate generates them and the
/// best move is only replaced on a strict improvement, so among equally
/// scored moves the first one generated wins.
pub struct AlphaBeta {
    static_evaluator: Box<dyn StaticEvaluator>,
    logger: Logger,
}

impl AlphaBeta {
    /// Using a larger log level may have performance costs
    pub fn new(static_evaluator: impl StaticEvaluator + 'static, log_level: u8) -> Self {
        AlphaBeta {
            static_evaluator: Box::new(static_evaluator),
            logger: Logger::new(log_level),
        }
    }

    /// Gets the best move for the side to move, along with its score, when
    /// searching `depth` plies within `bounds`.
    ///
    /// The maximizer and minimizer are explicit: `is_maxing` flips at every
    /// ply and leaves are scored by the static evaluator as they are.
    ///
    /// `position` is used as scratch space and is back where it started when
    /// this returns, on every path.
    pub fn get_scored_best_move(
        &self, position: &mut Position, depth: u8, bounds: Bounds, is_maxing: bool,
        branch_info: &mut BranchInfo,
    ) -> Result<(Score, Option<ChessMove>), SearchError> {
        branch_info[depth as usize].visited += 1;

        if depth == 0 || position.is_game_over() {
            return Ok((self.static_evaluator.evaluate(position), None));
        }

        branch_info[depth as usize].expanded += 1;

        let mut bounds = bounds;
        let mut best_result: Option<(Score, ChessMove)> = None;

        for mv in position.legal_moves() {
            let (score, _) = {
                let mut child = position.play(mv)?;
                self.get_scored_best_move(&mut child, depth - 1, bounds, !is_maxing, branch_info)?
            };

            // Update the best result found so far
            best_result = match best_result {
                None => Some((score, mv)),
                Some((best_score, _))
                    if (is_maxing && score > best_score) || (!is_maxing && score < best_score) =>
                {
                    Some((score, mv))
                }
                _ => best_result,
            };

            // Update the bounds with this new result
            if is_maxing {
                bounds.raise_alpha(score);
            } else {
                bounds.lower_beta(score);
            }

            if bounds.closed() {
                branch_info[depth as usize].cutoffs += 1;
                break;
            }
        }

        Ok(match best_result {
            Some((score, mv)) => (score, Some(mv)),
            // Game over is checked above, so there is always a move here
            None => (self.static_evaluator.evaluate(position), None),
        })
    }

    fn log_info(&self, branch_info: &BranchInfo) {
        self.logger.log_lazy(6, || branch_info.statistics());
    }
}

impl Engine for AlphaBeta {
    fn default(static_evaluator: impl StaticEvaluator + 'static) -> Self {
        AlphaBeta::new(static_evaluator, 2)
    }

    fn name(&self) -> &'static str { "alpha-beta" }

    fn search(&self, position: &mut Position, depth: u8) -> Result<SearchOutcome, SearchError> {
        let mut logger = self.logger.clone();
        logger.log_lazy(5, || format!("Searching {} plies from:\n{}", depth, position));
        logger.time_start(3, "alpha-beta search");

        let mut branch_info = BranchInfo::new(depth);
        let is_maxing = position.side_to_move() == White;

        let (score, best_move) = self.get_scored_best_move(
            position,
            depth,
            Bounds::widest(),
            is_maxing,
            &mut branch_info,
        )?;

        logger.time_end(3, "alpha-beta search");
        logger.log_lazy(3, || {
            format!(
                "depth {}: {} with score {} after {} nodes",
                depth,
                best_move.map_or("no move".to_string(), |mv| mv.to_string()),
                score,
                branch_info.total_nodes()
            )
        });
        self.log_info(&branch_info);

        Ok(SearchOutcome {
            score,
            best_move,
            branch_info,
        })
    }
}
