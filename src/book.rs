use std::collections::HashMap;
use std::fmt;

use chess::{Board, ChessMove};

use crate::{error::PositionError, logger::Logger, position::Position};

/// Opening lines the engine plays without searching, as
/// (first three FEN fields, candidate moves in order of preference).
const STANDARD_LINES: &[(&str, &[&str])] = &[
    (
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq",
        &["e2e4", "d2d4", "g1f3", "c2c4"],
    ),
    (
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq",
        &["e7e5", "c7c5", "e7e6", "c7c6"],
    ),
    (
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq",
        &["g1f3", "b1c3", "f1c4"],
    ),
    (
        "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq",
        &["g1f3", "d2d4", "b1c3"],
    ),
];

/// Identifies a position for book lookup: piece placement, side to move and
/// castling rights, written as the first three FEN fields.
///
/// Move counters and en passant are left out, so reaching a book position by
/// a different move order still finds it.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct BookKey(String);

impl BookKey {
    pub fn from_board(board: &Board) -> BookKey {
        let fen = board.to_string();
        BookKey(fen.split(' ').take(3).collect::<Vec<_>>().join(" "))
    }

    /// Builds a key from FEN text. Only the first three fields are read, so
    /// both full FEN and book-style keys are accepted.
    pub fn from_fen(text: &str) -> Result<BookKey, PositionError> {
        let fields: Vec<&str> = text.split_whitespace().take(3).collect();
        if fields.len() < 3 {
            return Err(PositionError::InvalidFen {
                fen: text.to_string(),
                reason: "expected placement, side to move and castling rights".to_string(),
            });
        }
        Ok(Position::from_fen(&format!("{} -", fields.join(" ")))?.book_key())
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for BookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// A fixed table from [`BookKey`] to candidate moves. Built once and never
/// modified afterwards, so it can be shared between threads freely.
pub struct OpeningBook {
    lines: HashMap<BookKey, Vec<String>>,
    logger: Logger,
}

impl OpeningBook {
    pub fn empty() -> OpeningBook {
        OpeningBook {
            lines: HashMap::new(),
            logger: Logger::silent(),
        }
    }

    /// The built-in repertoire: the starting position, 1.e4, 1.e4 e5 and
    /// 1.e4 c5.
    pub fn standard(logger: &Logger) -> OpeningBook {
        OpeningBook::from_lines(
            STANDARD_LINES
                .iter()
                .map(|&(position, moves)| (position, moves.iter().copied())),
            logger,
        )
    }

    /// Builds a book from (position, moves) pairs. Rows whose position can't
    /// be read are dropped. Move text is kept as given and only parsed on
    /// lookup.
    pub fn from_lines<'a, L, M>(lines: L, logger: &Logger) -> OpeningBook
    where
        L: IntoIterator<Item = (&'a str, M)>,
        M: IntoIterator<Item = &'a str>,
    {
        let mut book = HashMap::new();
        for (position, moves) in lines {
            match BookKey::from_fen(position) {
                Ok(key) => {
                    book.entry(key)
                        .or_insert_with(Vec::new)
                        .extend(moves.into_iter().map(str::to_string));
                }
                Err(e) => logger.warn(&format!("skipping opening book row: {}", e)),
            }
        }
        logger.log(4, &format!("Opening book with {} positions loaded", book.len()));
        OpeningBook {
            lines: book,
            logger: logger.clone(),
        }
    }

    pub fn len(&self) -> usize { self.lines.len() }

    pub fn is_empty(&self) -> bool { self.lines.is_empty() }

    /// The raw candidate text for a position, in order of preference
    pub fn candidates(&self, key: &BookKey) -> &[String] {
        self.lines.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The candidate moves for a position, in order of preference. Entries
    /// that don't parse are skipped. Legality is left to the caller.
    pub fn lookup(&self, key: &BookKey) -> Vec<ChessMove> {
        self.candidates(key)
            .iter()
            .filter_map(|text| match Position::parse_move(text) {
                Ok(mv) => Some(mv),
                Err(e) => {
                    self.logger.warn(&format!("bad opening book entry for {}: {}", key, e));
                    None
                }
            })
            .collect()
    }
}
