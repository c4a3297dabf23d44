use crate::{position::Position, Score};

pub trait StaticEvaluator: Send + Sync {
    /// Evaluates `position` without looking ahead.
    ///
    /// The score is relative to the side to move: a positive number favours
    /// whoever is about to move in `position`. Terminal positions get no
    /// special treatment.
    fn evaluate(&self, position: &Position) -> Score;
}
