use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chess::ChessMove;
use rand::{seq::SliceRandom, Rng};
use serde::Serialize;

use crate::{
    book::OpeningBook,
    config::Difficulty,
    engine::{default_engine, BranchInfo, Engine, SearchOutcome},
    error::SearchError,
    logger::Logger,
    position::Position,
    stopwatch::Stopwatch,
    Score,
};

/// Why the search result was not used
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FallbackReason {
    /// The search returned an error or panicked
    SearchFailed,
    /// The search finished without naming a move
    NoMoveFound,
    /// The search named a move that isn't legal here
    IllegalResult,
}

/// Which tier of the fallback chain produced the move
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FallbackPick {
    Check,
    Capture,
    Random,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Source {
    Book,
    Search,
    Fallback { reason: FallbackReason, pick: FallbackPick },
    NoLegalMoves,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Book => write!(f, "book"),
            Source::Search => write!(f, "search"),
            Source::Fallback { pick, .. } => match pick {
                FallbackPick::Check => write!(f, "fallback (check)"),
                FallbackPick::Capture => write!(f, "fallback (capture)"),
                FallbackPick::Random => write!(f, "fallback (random)"),
            },
            Source::NoLegalMoves => write!(f, "no legal moves"),
        }
    }
}

/// The outcome of one move decision. `chosen` is `None` only when the
/// position has no legal moves.
#[derive(Clone, Debug)]
pub struct Decision {
    pub chosen: Option<ChessMove>,
    pub source: Source,
    pub difficulty: Difficulty,
    /// The search score, when the move came from the search
    pub score: Option<Score>,
    /// Search statistics, whenever a search ran to completion
    pub branch_info: Option<BranchInfo>,
    pub millis: u64,
}

/// A [`Decision`] flattened for display or for crossing into JavaScript
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct DecisionReport {
    pub chosen: Option<String>,
    pub source: String,
    pub difficulty: u8,
    pub score: Option<Score>,
    pub depth: u8,
    pub nodes: u64,
    pub millis: u64,
}

impl Decision {
    pub fn report(&self) -> DecisionReport {
        DecisionReport {
            chosen: self.chosen.map(|mv| mv.to_string()),
            source: self.source.to_string(),
            difficulty: self.difficulty.into(),
            score: self.score,
            depth: self.branch_info.as_ref().map_or(0, BranchInfo::max_ply),
            nodes: self.branch_info.as_ref().map_or(0, BranchInfo::total_nodes),
            millis: self.millis,
        }
    }
}

/// Picks a move for a position: the opening book first, then the search,
/// then a cheap heuristic if the search fails or misbehaves.
///
/// As long as the position has a legal move, a legal move is returned.
pub struct MoveSelector {
    book: Arc<OpeningBook>,
    engine: Box<dyn Engine>,
    logger: Logger,
}

impl MoveSelector {
    pub fn new(book: Arc<OpeningBook>, engine: impl Engine + 'static, logger: Logger) -> Self {
        MoveSelector {
            book,
            engine: Box::new(engine),
            logger,
        }
    }

    /// The built-in opening book and the default alpha-beta engine
    pub fn standard(logger: Logger) -> Self {
        let book = Arc::new(OpeningBook::standard(&logger));
        MoveSelector::new(book, default_engine(), logger)
    }

    pub fn select(&self, position: &Position, difficulty: Difficulty) -> Option<ChessMove> {
        self.decide(position, difficulty).chosen
    }

    pub fn decide(&self, position: &Position, difficulty: Difficulty) -> Decision {
        let stopwatch = Stopwatch::start();
        let decision = |chosen: Option<ChessMove>,
                        source: Source,
                        score: Option<Score>,
                        branch_info: Option<BranchInfo>| Decision {
            chosen,
            source,
            difficulty,
            score,
            branch_info,
            millis: stopwatch.elapsed_millis(),
        };

        let legal: Vec<ChessMove> = position.legal_moves().collect();
        if legal.is_empty() {
            self.logger.log(3, "No legal moves, nothing to decide");
            return decision(None, Source::NoLegalMoves, None, None);
        }

        if let Some(mv) = self.book_move(position, &legal) {
            self.logger.log(3, &format!("Book move {}", mv));
            return decision(Some(mv), Source::Book, None, None);
        }

        let mut scratch = position.clone();
        let (reason, branch_info) = match self.run_search(&mut scratch, difficulty.depth()) {
            Ok(outcome) => match outcome.best_move {
                Some(mv) if legal.contains(&mv) => {
                    return decision(
                        Some(mv),
                        Source::Search,
                        Some(outcome.score),
                        Some(outcome.branch_info),
                    );
                }
                Some(mv) => {
                    self.logger
                        .warn(&format!("{} returned illegal move {}", self.engine.name(), mv));
                    (FallbackReason::IllegalResult, Some(outcome.branch_info))
                }
                None => {
                    self.logger.warn(&format!("{} found no move", self.engine.name()));
                    (FallbackReason::NoMoveFound, Some(outcome.branch_info))
                }
            },
            Err(e) => {
                self.logger.warn(&format!("{} failed: {}", self.engine.name(), e));
                (FallbackReason::SearchFailed, None)
            }
        };

        match fallback_move(position, &legal, &mut rand::thread_rng()) {
            Some((mv, pick)) => {
                self.logger.log(3, &format!("Fallback move {} ({:?})", mv, pick));
                decision(Some(mv), Source::Fallback { reason, pick }, None, branch_info)
            }
            None => decision(None, Source::NoLegalMoves, None, branch_info),
        }
    }

    /// The first book candidate that is legal here
    fn book_move(&self, position: &Position, legal: &[ChessMove]) -> Option<ChessMove> {
        let key = position.book_key();
        self.book.lookup(&key).into_iter().find(|mv| {
            let ok = legal.contains(mv);
            if !ok {
                self.logger.warn(&format!("book move {} is not legal in {}", mv, key));
            }
            ok
        })
    }

    /// Runs the engine with panics turned into [`SearchError::Panicked`]
    fn run_search(&self, scratch: &mut Position, depth: u8) -> Result<SearchOutcome, SearchError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.engine.search(scratch, depth)))
            .unwrap_or_else(|payload| Err(SearchError::Panicked(panic_message(payload))))
    }
}

/// The first checking move, else the first capture, else any legal move
pub fn fallback_move<R: Rng + ?Sized>(
    position: &Position, legal: &[ChessMove], rng: &mut R,
) -> Option<(ChessMove, FallbackPick)> {
    if let Some(&mv) = legal.iter().find(|&&mv| position.gives_check(mv)) {
        return Some((mv, FallbackPick::Check));
    }
    if let Some(&mv) = legal.iter().find(|&&mv| position.is_capture(mv)) {
        return Some((mv, FallbackPick::Capture));
    }
    legal.choose(rng).map(|&mv| (mv, FallbackPick::Random))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
