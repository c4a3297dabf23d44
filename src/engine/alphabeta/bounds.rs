use crate::Score;

/// The alpha-beta window. `alpha` is the score the maximizer is already
/// guaranteed and `beta` the score the minimizer is already guaranteed.
/// To represent an infinite bound, `None` is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub alpha: Option<Score>,
    pub beta: Option<Score>,
}

impl Bounds {
    pub fn widest() -> Bounds {
        Bounds {
            alpha: None,
            beta: None,
        }
    }
    /// `alpha = max(alpha, score)`
    pub fn raise_alpha(&mut self, score: Score) {
        if self.alpha.map_or(true, |alpha| score > alpha) {
            self.alpha = Some(score);
        }
    }
    /// `beta = min(beta, score)`
    pub fn lower_beta(&mut self, score: Score) {
        if self.beta.map_or(true, |beta| score < beta) {
            self.beta = Some(score);
        }
    }
    /// True once `beta <= alpha`: the rest of the moves at this node can't
    /// change the result.
    pub fn closed(self) -> bool {
        matches!((self.alpha, self.beta), (Some(alpha), Some(beta)) if beta <= alpha)
    }
}
