use std::fmt::Display;

use chess::{ChessMove, Color, File, Rank, Square};
use js_sys::{Array, JsString};
use wasm_bindgen::prelude::*;

use crate::{
    bridge::AsyncEngine,
    config::{Difficulty, EngineConfig},
    engine::weighted_eval::Features,
    logger::Logger,
    position::{Position, Status},
    selector::MoveSelector,
};

fn js_error(e: impl Display) -> JsValue { JsValue::from_str(&e.to_string()) }

fn square(file: usize, rank: usize) -> Square {
    Square::make_square(Rank::from_index(rank), File::from_index(file))
}

/// A game against the engine, driven from JavaScript. The page applies moves
/// and asks for engine moves; the engine result is collected by polling.
#[wasm_bindgen]
pub struct JsEngine {
    position: Position,
    engine: AsyncEngine,
    config: EngineConfig,
}

#[wasm_bindgen]
impl JsEngine {
    /// `config` is an optional JSON [`EngineConfig`]
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<JsEngine, JsValue> {
        crate::utils::set_panic_hook();
        let config = match config {
            Some(json) => EngineConfig::from_json(&json).map_err(js_error)?,
            None => EngineConfig::default(),
        };
        let logger = Logger::new(config.log_level);
        Ok(JsEngine {
            position: Position::initial(),
            engine: AsyncEngine::new(MoveSelector::standard(logger.clone()), logger),
            config,
        })
    }

    pub fn js_load_fen(&mut self, fen: &str) -> Result<(), JsValue> {
        self.position = Position::from_fen(fen).map_err(js_error)?;
        self.engine.invalidate();
        Ok(())
    }

    pub fn js_piece(&self, file: usize, rank: usize) -> Option<JsString> {
        self.position
            .piece_at(square(file, rank))
            .map(|(p, c)| p.to_string(c).into())
    }

    pub fn js_piece_color(&self, file: usize, rank: usize) -> JsString {
        match self.position.piece_at(square(file, rank)) {
            Some((_, Color::White)) => "white".into(),
            Some((_, Color::Black)) => "black".into(),
            _ => "empty".into(),
        }
    }

    /// Every legal move in long algebraic notation
    pub fn js_legal_moves(&self) -> Array {
        self.position
            .legal_moves()
            .map(|mv| JsValue::from(mv.to_string()))
            .collect()
    }

    /// The legal moves from a square, each as `[to_file, to_rank, promotion]`
    pub fn js_moves_from(&self, file: usize, rank: usize) -> Array {
        let from = square(file, rank);
        let js_moves = Array::new();
        for m in self.position.legal_moves().filter(|m| m.get_source() == from) {
            let js_move = Array::new();
            js_move.push(&m.get_dest().get_file().to_index().into());
            js_move.push(&m.get_dest().get_rank().to_index().into());
            js_move.push(&m.get_promotion().map(|p| p.to_index()).into());
            js_moves.push(&js_move);
        }
        js_moves
    }

    /// Plays a move given in long algebraic notation. Any engine result for
    /// the old position is dropped.
    pub fn js_apply_move(&mut self, text: &str) -> Result<(), JsValue> {
        let mv: ChessMove = Position::parse_move(text).map_err(js_error)?;
        self.position.push(mv).map_err(js_error)?;
        self.engine.invalidate();
        Ok(())
    }

    pub fn js_undo(&mut self) -> Result<JsString, JsValue> {
        let mv = self.position.pop().map_err(js_error)?;
        self.engine.invalidate();
        Ok(mv.to_string().into())
    }

    /// Asks the engine for a move in the current position
    pub fn js_request_move(&self) -> Result<(), JsValue> {
        self.engine
            .request(&self.position, self.config.difficulty)
            .map_err(js_error)
    }

    /// The engine's decision as a JSON report, once it is ready. The move is
    /// not played.
    pub fn js_poll_move(&self) -> Result<Option<JsString>, JsValue> {
        match self.engine.poll() {
            Some(decision) => {
                let json = serde_json::to_string(&decision.report()).map_err(js_error)?;
                Ok(Some(json.into()))
            }
            None => Ok(None),
        }
    }

    pub fn js_is_thinking(&self) -> bool { self.engine.is_busy() }

    pub fn js_set_difficulty(&mut self, level: u8) -> Result<(), JsValue> {
        self.config.difficulty = Difficulty::try_from(level).map_err(js_error)?;
        Ok(())
    }

    pub fn js_get_side_to_move(&self) -> JsString {
        match self.position.side_to_move() {
            Color::White => "white".into(),
            Color::Black => "black".into(),
        }
    }

    pub fn js_status(&self) -> JsString { self.position.status().into() }

    /// The evaluation features of the current position, as JSON
    pub fn js_features(&self) -> Result<JsString, JsValue> {
        let features = Features::from_position(&self.position);
        Ok(serde_json::to_string(&features).map_err(js_error)?.into())
    }
}

impl From<Status> for JsString {
    fn from(r: Status) -> JsString {
        match r {
            Status::InProgress => "in progress".into(),
            Status::Win(Color::White) => "white".into(),
            Status::Win(Color::Black) => "black".into(),
            Status::Draw(_) => "draw".into(),
        }
    }
}
