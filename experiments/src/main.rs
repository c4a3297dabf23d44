use chess::Color;
use env_logger::Env;
use minimax_chess::{Difficulty, Logger, MoveSelector, Position, Source, Status};
use rand::{seq::SliceRandom, thread_rng, Rng};
use serde::Serialize;

const LOG_LEVEL: u8 = 1;
const MATCHES: usize = 4;
const MAX_PLIES: usize = 200;

#[derive(Serialize, Default)]
struct MatchReport {
    white: u8,
    black: u8,
    result: String,
    plies: usize,
    book_moves: usize,
    search_moves: usize,
    fallback_moves: usize,
    nodes: u64,
    millis: u64,
}

fn main() {
    let mut logger = Logger::new(LOG_LEVEL);
    let filter = logger.max_facade_level().to_string();
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();
    let selector = MoveSelector::standard(Logger::new(LOG_LEVEL));

    logger.time_start(1, "all matches");
    let mut rng = thread_rng();
    let mut reports = Vec::new();
    for _ in 0..MATCHES {
        let white = *Difficulty::ALL.choose(&mut rng).unwrap_or(&Difficulty::Beginner);
        let black = *Difficulty::ALL.choose(&mut rng).unwrap_or(&Difficulty::Beginner);
        let opening_plies = rng.gen_range(0..=4);
        let report = run_single_match(&selector, white, black, opening_plies, &mut rng);
        println!(
            "{:?} vs {:?}: {} in {} plies",
            white, black, report.result, report.plies
        );
        reports.push(report);
    }
    logger.time_end(1, "all matches");

    match serde_json::to_string_pretty(&reports) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("could not write reports: {}", e),
    }
}

/// Plays one game between two difficulties. The first `opening_plies` moves
/// are random so that repeated matches don't all follow the book.
fn run_single_match(
    selector: &MoveSelector, white: Difficulty, black: Difficulty, opening_plies: usize,
    rng: &mut impl Rng,
) -> MatchReport {
    let mut report = MatchReport {
        white: white.into(),
        black: black.into(),
        ..Default::default()
    };
    let mut position = Position::initial();

    while position.status().is_in_progress() && position.ply_count() < MAX_PLIES {
        let mv = if position.ply_count() < opening_plies {
            let legal: Vec<_> = position.legal_moves().collect();
            legal.choose(rng).copied()
        } else {
            let difficulty = match position.side_to_move() {
                Color::White => white,
                Color::Black => black,
            };
            let decision = selector.decide(&position, difficulty);
            match decision.source {
                Source::Book => report.book_moves += 1,
                Source::Search => report.search_moves += 1,
                Source::Fallback { .. } => report.fallback_moves += 1,
                Source::NoLegalMoves => {}
            }
            report.nodes += decision.branch_info.as_ref().map_or(0, |info| info.total_nodes());
            report.millis += decision.millis;
            decision.chosen
        };
        let Some(mv) = mv else { break };
        if position.push(mv).is_err() {
            break;
        }
    }

    report.plies = position.ply_count();
    report.result = match position.status() {
        Status::InProgress => "unfinished".to_string(),
        Status::Win(Color::White) => "white wins".to_string(),
        Status::Win(Color::Black) => "black wins".to_string(),
        Status::Draw(reason) => format!("draw ({:?})", reason),
    };
    report
}
