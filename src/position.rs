use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

use ansi_term::{Colour, Style};
use chess::{
    BitBoard, Board, BoardStatus, ChessMove, Color, File, MoveGen, Piece, Rank, Square, EMPTY,
};

use crate::book::BookKey;
use crate::error::PositionError;

// python-chess style light/dark split, a1 is dark
const DARK_SQUARES: u64 = 0xAA55_AA55_AA55_AA55;

/// A game position: the `chess` crate's board plus the bits of game history
/// it doesn't track (the halfmove clock and the positions already played, for
/// the seventy-five-move rule and fivefold repetition).
///
/// Moves are made in place with [`Position::push`] and taken back with
/// [`Position::pop`]. Search code should prefer [`Position::play`], which
/// returns a guard that pops when it goes out of scope.
#[derive(Clone)]
pub struct Position {
    board: Board,
    halfmove_clock: u16,
    history: Vec<Undo>,
}

#[derive(Clone, Copy)]
struct Undo {
    board: Board,
    halfmove_clock: u16,
    mv: ChessMove,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    InProgress,
    Win(Color),
    Draw(DrawReason),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DrawReason {
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoves,
    FivefoldRepetition,
}

impl Status {
    pub fn is_in_progress(self) -> bool { matches!(self, Status::InProgress) }
}

impl Position {
    pub fn initial() -> Position {
        Position {
            board: Board::default(),
            halfmove_clock: 0,
            history: Vec::new(),
        }
    }

    /// Loads a position from FEN. Only the first four fields are required; a
    /// missing halfmove clock counts as zero.
    pub fn from_fen(fen: &str) -> Result<Position, PositionError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let invalid = |reason: String| PositionError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };
        if fields.len() < 4 {
            return Err(invalid("expected at least four fields".to_string()));
        }
        let board = Board::from_str(&fields[..4].join(" "))
            .map_err(|e| invalid(format!("{:?}", e)))?;
        let halfmove_clock = match fields.get(4) {
            Some(clock) => clock
                .parse()
                .map_err(|_| invalid(format!("bad halfmove clock `{}`", clock)))?,
            None => 0,
        };
        Ok(Position {
            board,
            halfmove_clock,
            history: Vec::new(),
        })
    }

    pub fn board(&self) -> &Board { &self.board }

    pub fn side_to_move(&self) -> Color { self.board.side_to_move() }

    pub fn halfmove_clock(&self) -> u16 { self.halfmove_clock }

    /// Number of moves pushed since this position was loaded
    pub fn ply_count(&self) -> usize { self.history.len() }

    pub fn piece_at(&self, sq: Square) -> Option<(Piece, Color)> {
        self.board.piece_on(sq).zip(self.board.color_on(sq))
    }

    /// Legal moves in the `chess` crate's native enumeration order
    pub fn legal_moves(&self) -> MoveGen { MoveGen::new_legal(&self.board) }

    pub fn is_legal(&self, mv: ChessMove) -> bool { self.board.legal(mv) }

    pub fn in_check(&self) -> bool { *self.board.checkers() != EMPTY }

    pub fn gives_check(&self, mv: ChessMove) -> bool {
        *self.board.make_move_new(mv).checkers() != EMPTY
    }

    /// True for ordinary captures and en passant
    pub fn is_capture(&self, mv: ChessMove) -> bool {
        self.board.piece_on(mv.get_dest()).is_some()
            || (self.board.piece_on(mv.get_source()) == Some(Piece::Pawn)
                && mv.get_source().get_file() != mv.get_dest().get_file())
    }

    pub fn book_key(&self) -> BookKey { BookKey::from_board(&self.board) }

    /// Applies a legal move in place.
    pub fn push(&mut self, mv: ChessMove) -> Result<(), PositionError> {
        if !self.board.legal(mv) {
            return Err(PositionError::IllegalMove { mv: mv.to_string() });
        }
        let resets_clock =
            self.is_capture(mv) || self.board.piece_on(mv.get_source()) == Some(Piece::Pawn);
        self.history.push(Undo {
            board: self.board,
            halfmove_clock: self.halfmove_clock,
            mv,
        });
        self.board = self.board.make_move_new(mv);
        self.halfmove_clock =
            if resets_clock { 0 } else { self.halfmove_clock.saturating_add(1) };
        Ok(())
    }

    /// Takes back the last pushed move, returning it.
    pub fn pop(&mut self) -> Result<ChessMove, PositionError> {
        let undo = self.history.pop().ok_or(PositionError::EmptyHistory)?;
        self.board = undo.board;
        self.halfmove_clock = undo.halfmove_clock;
        Ok(undo.mv)
    }

    /// Pushes `mv` and returns a guard that derefs to the resulting position
    /// and pops the move again when dropped, whichever way the scope is left.
    pub fn play(&mut self, mv: ChessMove) -> Result<Ply<'_>, PositionError> {
        self.push(mv)?;
        Ok(Ply { position: self })
    }

    pub fn status(&self) -> Status {
        match self.board.status() {
            BoardStatus::Checkmate => return Status::Win(!self.side_to_move()),
            BoardStatus::Stalemate => return Status::Draw(DrawReason::Stalemate),
            BoardStatus::Ongoing => {}
        }
        if self.has_insufficient_material(Color::White)
            && self.has_insufficient_material(Color::Black)
        {
            Status::Draw(DrawReason::InsufficientMaterial)
        } else if self.halfmove_clock >= 150 {
            Status::Draw(DrawReason::SeventyFiveMoves)
        } else if self.repetitions() >= 5 {
            Status::Draw(DrawReason::FivefoldRepetition)
        } else {
            Status::InProgress
        }
    }

    pub fn is_game_over(&self) -> bool { !self.status().is_in_progress() }

    /// Whether `color` could never deliver mate, whatever the opponent does.
    pub fn has_insufficient_material(&self, color: Color) -> bool {
        let b = &self.board;
        let ours = *b.color_combined(color);
        let heavy = *b.pieces(Piece::Pawn) | *b.pieces(Piece::Rook) | *b.pieces(Piece::Queen);
        if ours & heavy != EMPTY {
            return false;
        }
        if ours & *b.pieces(Piece::Knight) != EMPTY {
            // A lone knight can only mate if the opponent has pieces to
            // block its own king in with
            let theirs = *b.color_combined(!color);
            return ours.popcnt() <= 2
                && theirs & !*b.pieces(Piece::King) & !*b.pieces(Piece::Queen) == EMPTY;
        }
        let bishops = *b.pieces(Piece::Bishop);
        if ours & bishops != EMPTY {
            let dark = BitBoard::new(DARK_SQUARES);
            let same_colour = bishops & dark == EMPTY || bishops & !dark == EMPTY;
            return same_colour
                && *b.pieces(Piece::Pawn) == EMPTY
                && *b.pieces(Piece::Knight) == EMPTY;
        }
        true
    }

    /// How many times the current position has occurred since the last
    /// irreversible move, counting itself.
    fn repetitions(&self) -> usize {
        let hash = self.board.get_hash();
        1 + self
            .history
            .iter()
            .rev()
            .take(self.halfmove_clock as usize)
            .filter(|undo| undo.board.get_hash() == hash)
            .count()
    }

    /// Parses a move in long algebraic notation (`e2e4`, `e7e8q`). Legality
    /// is not checked.
    pub fn parse_move(text: &str) -> Result<ChessMove, PositionError> {
        let text = text.trim();
        // the crate's parser ignores anything past the promotion piece
        if text.len() > 5 {
            return Err(PositionError::MalformedMove(text.to_string()));
        }
        ChessMove::from_str(text).map_err(|_| PositionError::MalformedMove(text.to_string()))
    }

    /// The same position with ranks flipped and colours swapped
    #[cfg(test)]
    pub(crate) fn invert_ranks_and_colors(&self) -> Position {
        let mut bb = chess::BoardBuilder::new();
        for sq in chess::ALL_SQUARES {
            if let Some((p, c)) = self.piece_at(sq) {
                let flipped = Square::make_square(
                    Rank::from_index(7 - sq.get_rank().to_index()),
                    sq.get_file(),
                );
                bb.piece(flipped, p, !c);
            }
        }
        bb.side_to_move(!self.side_to_move());
        bb.castle_rights(Color::White, self.board.castle_rights(Color::Black));
        bb.castle_rights(Color::Black, self.board.castle_rights(Color::White));
        Position {
            board: Board::try_from(bb).expect("mirror of a valid board is valid"),
            halfmove_clock: self.halfmove_clock,
            history: Vec::new(),
        }
    }
}

impl Default for Position {
    fn default() -> Self { Position::initial() }
}

/// A move pushed onto a [`Position`]; popped again on drop.
pub struct Ply<'a> {
    position: &'a mut Position,
}

impl Deref for Ply<'_> {
    type Target = Position;

    fn deref(&self) -> &Position { self.position }
}

impl DerefMut for Ply<'_> {
    fn deref_mut(&mut self) -> &mut Position { self.position }
}

impl Drop for Ply<'_> {
    fn drop(&mut self) {
        // `play` pushed exactly one move, so there is always one to pop
        let _ = self.position.pop();
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8 {
                let sq = Square::make_square(Rank::from_index(rank), File::from_index(file));
                let background = if (rank + file) % 2 == 0 {
                    Colour::RGB(181, 136, 99)
                } else {
                    Colour::RGB(240, 217, 181)
                };
                let text = match self.piece_at(sq) {
                    Some((p, c)) => p.to_string(c),
                    None => " ".to_string(),
                };
                write!(
                    f,
                    "{}",
                    Style::new()
                        .on(background)
                        .fg(Colour::Black)
                        .paint(format!(" {} ", text))
                )?;
            }
            writeln!(f)?;
        }
        writeln!(f, "   a  b  c  d  e  f  g  h")?;
        write!(
            f,
            "{} to move",
            if self.side_to_move() == Color::White { "White" } else { "Black" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(text: &str) -> ChessMove { Position::parse_move(text).unwrap() }

    #[test]
    fn test_push_pop_restores_board() {
        let mut pos = Position::initial();
        let before = pos.board().get_hash();
        pos.push(mv("e2e4")).unwrap();
        pos.push(mv("e7e5")).unwrap();
        assert_eq!(pos.ply_count(), 2);
        assert_eq!(pos.pop().unwrap(), mv("e7e5"));
        assert_eq!(pos.pop().unwrap(), mv("e2e4"));
        assert_eq!(pos.board().get_hash(), before);
        assert_eq!(pos.pop(), Err(PositionError::EmptyHistory));
    }

    #[test]
    fn test_illegal_push_is_rejected() {
        let mut pos = Position::initial();
        assert!(matches!(pos.push(mv("e2e5")), Err(PositionError::IllegalMove { .. })));
        assert_eq!(pos.ply_count(), 0);
    }

    #[test]
    fn test_ply_guard_pops_on_early_exit() {
        fn finds_check(pos: &mut Position, moves: &[&str]) -> bool {
            for m in moves {
                let child = pos.play(mv(m)).unwrap();
                if child.in_check() {
                    return true;
                }
            }
            false
        }

        let mut pos = Position::initial();
        {
            let mut child = pos.play(mv("e2e4")).unwrap();
            let grandchild = child.play(mv("e7e5")).unwrap();
            assert_eq!(grandchild.ply_count(), 2);
        }
        assert_eq!(pos.ply_count(), 0);

        let mut rook = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let before = rook.board().get_hash();
        assert!(finds_check(&mut rook, &["e1d1", "a1a8", "a1a2"]));
        assert_eq!(rook.ply_count(), 0);
        assert_eq!(rook.board().get_hash(), before);
    }

    #[test]
    fn test_parse_move() {
        assert_eq!(mv("e7e8q").get_promotion(), Some(Piece::Queen));
        assert_eq!(mv("g1f3").to_string(), "g1f3");
        for bad in ["", "e2", "e2e9", "i2e4", "e7e8k", "e2e4e5"] {
            assert!(Position::parse_move(bad).is_err(), "{} should not parse", bad);
        }
    }

    #[test]
    fn test_from_fen() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 12 40").unwrap();
        assert_eq!(pos.halfmove_clock(), 12);
        assert_eq!(pos.side_to_move(), Color::White);
        assert!(Position::from_fen("4k3/8/8/8").is_err());
        assert!(Position::from_fen("4k3/8/8/8/8/8/8/4K2R w K - x 40").is_err());
    }

    #[test]
    fn test_status() {
        let mated = Position::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap();
        assert_eq!(mated.status(), Status::Win(Color::Black));
        assert_eq!(mated.legal_moves().len(), 0);

        let stalemate = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(stalemate.status(), Status::Draw(DrawReason::Stalemate));

        let bare = Position::from_fen("8/8/4k3/8/8/2K5/8/8 w - - 0 1").unwrap();
        assert_eq!(bare.status(), Status::Draw(DrawReason::InsufficientMaterial));

        let slow = Position::from_fen("8/8/4k3/8/8/2K5/8/R7 w - - 150 100").unwrap();
        assert_eq!(slow.status(), Status::Draw(DrawReason::SeventyFiveMoves));

        assert_eq!(Position::initial().status(), Status::InProgress);
    }

    #[test]
    fn test_insufficient_material() {
        let knight = Position::from_fen("8/8/4k3/8/8/2KN4/8/8 w - - 0 1").unwrap();
        assert!(knight.has_insufficient_material(Color::White));
        let bishops = Position::from_fen("8/8/4k3/8/8/2KBB3/8/8 w - - 0 1").unwrap();
        assert!(!bishops.has_insufficient_material(Color::White));
        let rook = Position::from_fen("8/8/4k3/8/8/2K5/8/R7 w - - 0 1").unwrap();
        assert!(!rook.has_insufficient_material(Color::White));
        assert!(rook.has_insufficient_material(Color::Black));
    }

    #[test]
    fn test_fivefold_repetition() {
        let mut pos = Position::initial();
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
        for _ in 0..4 {
            for m in shuffle {
                assert!(pos.status().is_in_progress());
                pos.push(mv(m)).unwrap();
            }
        }
        assert_eq!(pos.status(), Status::Draw(DrawReason::FivefoldRepetition));
    }

    #[test]
    fn test_capture_and_check_queries() {
        let pos = Position::from_fen("7k/8/8/1p1p4/4p3/2N5/8/K2R4 w - - 0 1").unwrap();
        assert!(pos.is_capture(mv("c3d5")));
        assert!(!pos.is_capture(mv("c3a4")));
        assert!(pos.gives_check(mv("d1h1")));
        assert!(!pos.gives_check(mv("d1d5")));

        let ep = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
        assert!(ep.is_capture(mv("e5d6")));
    }

    #[test]
    fn test_halfmove_clock() {
        let mut pos = Position::initial();
        pos.push(mv("g1f3")).unwrap();
        assert_eq!(pos.halfmove_clock(), 1);
        pos.push(mv("e7e5")).unwrap();
        assert_eq!(pos.halfmove_clock(), 0);
        pos.pop().unwrap();
        assert_eq!(pos.halfmove_clock(), 1);
    }
}
