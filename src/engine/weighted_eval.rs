use chess::{Color::*, Piece, Square, ALL_PIECES};
use serde::{Deserialize, Serialize};

use super::StaticEvaluator;
use crate::{position::Position, Score};

const CENTER: [Square; 4] = [Square::D4, Square::E4, Square::D5, Square::E5];

/// Weights that are multiplied by the corresponding [`Features`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weights {
    /// Value of each piece kind, indexed by `Piece::to_index`
    pub pieces: [Score; 6],
    /// Per legal move landing on a center square
    pub center: Score,
    /// Penalty for the side to move being in check
    pub check: Score,
    /// Per legal move
    pub mobility: Score,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            pieces: [100, 320, 330, 500, 900, 20000],
            center: 10,
            check: 50,
            mobility: 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    /// The number of pieces of each kind for each player
    pub pieces: [[i32; 6]; 2],
    /// The number of legal moves that land on d4, e4, d5 or e5
    pub center_moves: i32,
    /// Whether the side to move is in check
    pub in_check: bool,
    /// The number of legal moves
    pub mobility: i32,
    pub white_to_move: bool,
}

impl Features {
    pub fn from_position(position: &Position) -> Features {
        let board = position.board();

        let mut pieces = [[0; 6]; 2];
        for col in [White, Black] {
            for piece in ALL_PIECES {
                pieces[col.to_index()][piece.to_index()] =
                    (*board.pieces(piece) & *board.color_combined(col)).popcnt() as i32;
            }
        }

        let mut center_moves = 0;
        let mut mobility = 0;
        for mv in position.legal_moves() {
            mobility += 1;
            if CENTER.contains(&mv.get_dest()) {
                center_moves += 1;
            }
        }

        Features {
            pieces,
            center_moves,
            in_check: position.in_check(),
            mobility,
            white_to_move: position.side_to_move() == White,
        }
    }
}

/// Material, center control, king safety and mobility, summed with fixed
/// weights.
#[derive(Default)]
pub struct WeightedEval {
    weights: Weights,
}

impl WeightedEval {
    pub fn new(weights: Weights) -> WeightedEval { WeightedEval { weights } }

    /// The score from White's point of view, whoever is to move.
    ///
    /// The center, check and mobility terms all belong to the side to move,
    /// so they count for White when White is to move and against White
    /// otherwise.
    pub fn white_relative(&self, features: &Features) -> Score {
        let w = &self.weights;

        let mut score = 0;
        for piece in ALL_PIECES {
            let i = piece.to_index();
            score += w.pieces[i]
                * (features.pieces[White.to_index()][i] - features.pieces[Black.to_index()][i]);
        }

        let mover = if features.white_to_move { 1 } else { -1 };
        score += mover * w.center * features.center_moves;
        if features.in_check {
            score -= mover * w.check;
        }
        score += mover * w.mobility * features.mobility;

        score
    }

    pub fn piece_value(&self, piece: Piece) -> Score { self.weights.pieces[piece.to_index()] }
}

impl StaticEvaluator for WeightedEval {
    fn evaluate(&self, position: &Position) -> Score {
        let features = Features::from_position(position);
        let score = self.white_relative(&features);
        if features.white_to_move {
            score
        } else {
            -score
        }
    }
}
