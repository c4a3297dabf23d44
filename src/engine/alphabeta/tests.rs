use chess::Color;

use super::*;
use crate::{
    config::Difficulty,
    engine::{minimax::Minimax, weighted_eval::WeightedEval},
};

const MIDDLEGAMES: [&str; 3] = [
    "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
    "r3k2r/ppp2ppp/2n1bn2/3pp3/1b1PP3/2N1BN2/PPP2PPP/R3KB1R b KQkq - 0 8",
    "6k1/5ppp/8/3q4/8/2N5/5PPP/3R2K1 w - - 0 30",
];

const ROOK_ENDING: &str = "8/8/4k3/8/8/8/8/R3K3 w - - 0 1";

fn alphabeta() -> AlphaBeta { AlphaBeta::new(WeightedEval::default(), 0) }

fn minimax() -> Minimax { Minimax::new(WeightedEval::default(), 0) }

struct Flat;

impl StaticEvaluator for Flat {
    fn evaluate(&self, _position: &Position) -> Score { 0 }
}

#[test]
fn test_pruning_matches_minimax() {
    for fen in MIDDLEGAMES {
        for depth in 1..=3 {
            let mut pos = Position::from_fen(fen).unwrap();
            let pruned = alphabeta().search(&mut pos, depth).unwrap();
            let full = minimax().search(&mut pos, depth).unwrap();
            assert_eq!(pruned.score, full.score, "{} at depth {}", fen, depth);
            assert!(
                pruned.branch_info.total_nodes() <= full.branch_info.total_nodes(),
                "pruning should never visit more nodes"
            );
        }
    }
}

#[test]
fn test_pruning_matches_minimax_in_endgame() {
    let mut pos = Position::from_fen(ROOK_ENDING).unwrap();
    let pruned = alphabeta().search(&mut pos, 4).unwrap();
    let full = minimax().search(&mut pos, 4).unwrap();
    assert_eq!(pruned.score, full.score);
    assert!(pruned.branch_info.total_cutoffs() > 0);
    assert_eq!(full.branch_info.total_cutoffs(), 0);
}

#[test]
fn test_depth_per_difficulty() {
    for difficulty in Difficulty::ALL {
        let mut pos = Position::from_fen(ROOK_ENDING).unwrap();
        let outcome = alphabeta().search(&mut pos, difficulty.depth()).unwrap();
        let info = &outcome.branch_info;
        assert_eq!(info.depth(), difficulty.depth());
        assert_eq!(info.max_ply(), difficulty.depth());
        assert!(info[0].visited > 0, "leaves should be reached at the full depth");
        assert_eq!(info[0].expanded, 0, "nothing is expanded past the horizon");
        assert_eq!(info[difficulty.depth() as usize].visited, 1);
        assert!(pos.is_legal(outcome.best_move.unwrap()));
    }
}

#[test]
fn test_position_restored_after_search() {
    for fen in MIDDLEGAMES {
        let mut pos = Position::from_fen(fen).unwrap();
        let hash = pos.board().get_hash();
        alphabeta().search(&mut pos, 3).unwrap();
        assert_eq!(pos.board().get_hash(), hash);
        assert_eq!(pos.ply_count(), 0);
    }
}

#[test]
fn test_terminal_root() {
    let mut mated = Position::from_fen(
        "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
    )
    .unwrap();
    let outcome = alphabeta().search(&mut mated, 3).unwrap();
    assert_eq!(outcome.best_move, None);
    assert_eq!(outcome.score, WeightedEval::default().evaluate(&mated));
    assert_eq!(outcome.branch_info.total_nodes(), 1);
    assert_eq!(outcome.branch_info.max_ply(), 0);
}

#[test]
fn test_ties_go_to_first_move() {
    let engine = AlphaBeta::new(Flat, 0);
    let mut pos = Position::initial();
    let outcome = engine.search(&mut pos, 2).unwrap();
    assert_eq!(outcome.score, 0);
    assert_eq!(outcome.best_move, pos.legal_moves().next());
    // every reply after the first is cut off once it matches the first
    assert!(outcome.branch_info[1].cutoffs > 0);
}

#[test]
fn test_depth_one_takes_best_static_score() {
    let eval = WeightedEval::default();
    let mut pos = Position::from_fen(MIDDLEGAMES[0]).unwrap();
    let mut expected: Option<(Score, ChessMove)> = None;
    for mv in pos.clone().legal_moves() {
        let child = pos.play(mv).unwrap();
        let score = eval.evaluate(&child);
        if expected.map_or(true, |(best, _)| score > best) {
            expected = Some((score, mv));
        }
    }
    let (score, mv) = expected.unwrap();
    let outcome = alphabeta().search(&mut pos, 1).unwrap();
    assert_eq!(outcome.score, score);
    assert_eq!(outcome.best_move, Some(mv));
}

#[test]
fn test_black_minimizes_at_root() {
    let mut pos = Position::from_fen(MIDDLEGAMES[1]).unwrap();
    assert_eq!(pos.side_to_move(), Color::Black);
    let eval = WeightedEval::default();
    let lowest = pos
        .clone()
        .legal_moves()
        .map(|mv| eval.evaluate(&pos.play(mv).unwrap()))
        .min()
        .unwrap();
    assert_eq!(alphabeta().search(&mut pos, 1).unwrap().score, lowest);
}

#[test]
#[ignore]
fn test_self_game() {
    let white = alphabeta();
    let black = alphabeta();

    let mut pos = Position::initial();

    while pos.status().is_in_progress() && pos.ply_count() < 80 {
        let engine = if pos.side_to_move() == Color::White { &white } else { &black };
        let mut scratch = pos.clone();
        let mv = engine.search(&mut scratch, 2).unwrap().best_move.unwrap();
        pos.push(mv).unwrap();
        println!("{}", pos);
    }
}
