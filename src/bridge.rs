use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::{
    config::Difficulty,
    error::BridgeError,
    logger::Logger,
    position::Position,
    selector::{Decision, MoveSelector},
};

/// The single-slot mailbox between the caller and the worker. Whether a
/// computation is running and whether a result is waiting are one value, so
/// they can't disagree.
#[derive(Debug)]
enum Slot {
    Idle,
    /// A worker is running. With `discard` set its result is thrown away.
    Busy { discard: bool },
    Ready(Decision),
}

/// Where the last request stands, as seen by [`AsyncEngine::progress`]
#[derive(Debug)]
pub enum Progress {
    /// A worker is still running
    Thinking,
    /// The result, now taken out of the mailbox
    Done(Decision),
    /// Nothing is running and nothing is waiting: either no request was made,
    /// the result was invalidated, or the worker died
    Idle,
}

struct Shared {
    slot: Mutex<Slot>,
    done: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        // The slot is only ever replaced whole, so a poisoned lock still holds
        // a consistent value
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn complete(&self, decision: Option<Decision>, logger: &Logger) {
        let mut slot = self.lock();
        let next = match (&*slot, decision) {
            (Slot::Busy { discard: false }, Some(decision)) => Slot::Ready(decision),
            (Slot::Busy { discard: true }, _) => {
                logger.log(4, "Discarding a stale engine result");
                Slot::Idle
            }
            (_, None) => {
                logger.warn("Engine worker died without a result");
                Slot::Idle
            }
            (other, Some(_)) => {
                logger.warn(&format!("Engine result arrived in unexpected state {:?}", other));
                Slot::Idle
            }
        };
        *slot = next;
        self.done.notify_all();
    }
}

/// Runs the [`MoveSelector`] off the caller's thread and hands the result
/// back through a single-slot mailbox. The caller never blocks unless it
/// asks to with [`AsyncEngine::wait`].
///
/// At most one computation is in flight and at most one result is waiting.
/// On wasm32 there are no threads, so a request computes the move before
/// returning and leaves it for the next [`AsyncEngine::poll`].
pub struct AsyncEngine {
    selector: Arc<MoveSelector>,
    shared: Arc<Shared>,
    logger: Logger,
}

impl AsyncEngine {
    pub fn new(selector: MoveSelector, logger: Logger) -> Self {
        AsyncEngine {
            selector: Arc::new(selector),
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot::Idle),
                done: Condvar::new(),
            }),
            logger,
        }
    }

    /// Starts deciding a move for a snapshot of `position`. Rejected while a
    /// computation is running or its result hasn't been collected.
    pub fn request(&self, position: &Position, difficulty: Difficulty) -> Result<(), BridgeError> {
        {
            let mut slot = self.shared.lock();
            match *slot {
                Slot::Busy { .. } => return Err(BridgeError::Busy),
                Slot::Ready(_) => return Err(BridgeError::Unconsumed),
                Slot::Idle => {}
            }
            *slot = Slot::Busy { discard: false };
        }
        self.logger.log(4, &format!("Engine requested at {:?}", difficulty));
        self.start(position.clone(), difficulty)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn start(&self, snapshot: Position, difficulty: Difficulty) -> Result<(), BridgeError> {
        use std::panic::{self, AssertUnwindSafe};

        let selector = Arc::clone(&self.selector);
        let shared = Arc::clone(&self.shared);
        let logger = self.logger.clone();
        let spawned = std::thread::Builder::new()
            .name("engine-worker".to_string())
            .spawn(move || {
                let decide = || selector.decide(&snapshot, difficulty);
                let decision = panic::catch_unwind(AssertUnwindSafe(decide)).ok();
                shared.complete(decision, &logger);
            });

        if let Err(e) = spawned {
            self.logger.warn(&format!("Could not spawn engine worker: {}", e));
            *self.shared.lock() = Slot::Idle;
            return Err(BridgeError::Spawn);
        }
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    fn start(&self, snapshot: Position, difficulty: Difficulty) -> Result<(), BridgeError> {
        let decision = self.selector.decide(&snapshot, difficulty);
        self.shared.complete(Some(decision), &self.logger);
        Ok(())
    }

    /// Takes the waiting result, if there is one
    pub fn poll(&self) -> Option<Decision> {
        match self.progress() {
            Progress::Done(decision) => Some(decision),
            Progress::Thinking | Progress::Idle => None,
        }
    }

    /// Like [`AsyncEngine::poll`], but tells a running computation apart from
    /// one that will never produce a result
    pub fn progress(&self) -> Progress {
        let mut slot = self.shared.lock();
        match std::mem::replace(&mut *slot, Slot::Idle) {
            Slot::Ready(decision) => Progress::Done(decision),
            Slot::Idle => Progress::Idle,
            busy @ Slot::Busy { .. } => {
                *slot = busy;
                Progress::Thinking
            }
        }
    }

    pub fn is_busy(&self) -> bool { matches!(*self.shared.lock(), Slot::Busy { .. }) }

    /// Drops the waiting result, or marks the running computation so its
    /// result is dropped when it finishes. The running computation is not
    /// stopped, so the engine stays busy until it does.
    pub fn invalidate(&self) {
        let mut slot = self.shared.lock();
        if let Slot::Busy { discard } = &mut *slot {
            *discard = true;
        } else {
            *slot = Slot::Idle;
        }
    }

    /// Blocks until no computation is running, then takes the result if one
    /// is waiting
    pub fn wait(&self) -> Option<Decision> {
        let slot = self.shared.lock();
        let mut slot = self
            .shared
            .done
            .wait_while(slot, |slot| matches!(slot, Slot::Busy { .. }))
            .unwrap_or_else(PoisonError::into_inner);
        match std::mem::replace(&mut *slot, Slot::Idle) {
            Slot::Ready(decision) => Some(decision),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::{self, Receiver, Sender};

    use chess::ChessMove;

    use super::*;
    use crate::{
        book::OpeningBook,
        engine::{BranchInfo, Engine, SearchOutcome, StaticEvaluator},
        error::SearchError,
        selector::Source,
    };

    /// Blocks every search until the test lets it through, so the test can
    /// observe the busy state
    struct GatedEngine {
        gate: Mutex<Receiver<()>>,
    }

    impl Engine for GatedEngine {
        fn default(_static_evaluator: impl StaticEvaluator + 'static) -> Self {
            unimplemented!("built with gated_engine")
        }

        fn name(&self) -> &'static str { "gated" }

        fn search(&self, position: &mut Position, depth: u8) -> Result<SearchOutcome, SearchError> {
            self.gate.lock().unwrap().recv().unwrap();
            Ok(SearchOutcome {
                score: 0,
                best_move: position.legal_moves().next(),
                branch_info: BranchInfo::new(depth),
            })
        }
    }

    fn gated_engine() -> (AsyncEngine, Sender<()>) {
        let (open, gate) = mpsc::channel();
        let engine = GatedEngine {
            gate: Mutex::new(gate),
        };
        let selector =
            MoveSelector::new(Arc::new(OpeningBook::empty()), engine, Logger::silent());
        (AsyncEngine::new(selector, Logger::silent()), open)
    }

    /// Blocks until the worker has finished, leaving any result in place
    fn wait_until_settled(engine: &AsyncEngine) {
        let slot = engine.shared.lock();
        drop(engine.shared.done.wait_while(slot, |s| matches!(s, Slot::Busy { .. })));
    }

    fn first_move(position: &Position) -> ChessMove { position.legal_moves().next().unwrap() }

    #[test]
    fn test_request_then_wait() {
        let engine = AsyncEngine::new(MoveSelector::standard(Logger::silent()), Logger::silent());
        let pos = Position::initial();
        engine.request(&pos, Difficulty::Beginner).unwrap();
        let decision = engine.wait().unwrap();
        assert_eq!(decision.source, Source::Book);
        assert!(pos.is_legal(decision.chosen.unwrap()));
        assert!(!engine.is_busy());
        assert!(engine.poll().is_none(), "a result is handed out once");
    }

    #[test]
    fn test_single_slot() {
        let (engine, open) = gated_engine();
        let pos = Position::initial();

        assert!(engine.poll().is_none());
        engine.request(&pos, Difficulty::Beginner).unwrap();
        assert!(engine.is_busy());
        assert_eq!(engine.request(&pos, Difficulty::Beginner), Err(BridgeError::Busy));
        assert!(engine.poll().is_none());

        open.send(()).unwrap();
        let decision = engine.wait().unwrap();
        assert_eq!(decision.chosen, Some(first_move(&pos)));
        assert_eq!(decision.source, Source::Search);

        // a collected result frees the slot
        engine.request(&pos, Difficulty::Beginner).unwrap();
        open.send(()).unwrap();
        wait_until_settled(&engine);
        assert!(!engine.is_busy());
        assert_eq!(engine.request(&pos, Difficulty::Beginner), Err(BridgeError::Unconsumed));
        assert!(engine.poll().is_some());
        assert!(engine.poll().is_none());
    }

    #[test]
    fn test_invalidate_in_flight() {
        let (engine, open) = gated_engine();
        let pos = Position::initial();
        engine.request(&pos, Difficulty::Beginner).unwrap();
        engine.invalidate();
        assert!(engine.is_busy(), "invalidating doesn't stop the worker");
        open.send(()).unwrap();
        assert!(engine.wait().is_none());
        assert!(engine.poll().is_none());
        engine.request(&pos, Difficulty::Beginner).unwrap();
        open.send(()).unwrap();
        assert!(engine.wait().is_some());
    }

    #[test]
    fn test_invalidate_ready() {
        let (engine, open) = gated_engine();
        let pos = Position::initial();
        engine.request(&pos, Difficulty::Beginner).unwrap();
        open.send(()).unwrap();
        wait_until_settled(&engine);
        engine.invalidate();
        assert!(engine.poll().is_none());
        engine.invalidate();
        assert!(engine.request(&pos, Difficulty::Beginner).is_ok());
        open.send(()).unwrap();
        assert!(engine.wait().is_some());
    }

    #[test]
    fn test_progress_reports_idle_when_no_result_is_coming() {
        let (engine, open) = gated_engine();
        let pos = Position::initial();
        assert!(matches!(engine.progress(), Progress::Idle));

        engine.request(&pos, Difficulty::Beginner).unwrap();
        assert!(matches!(engine.progress(), Progress::Thinking));
        engine.invalidate();
        open.send(()).unwrap();
        wait_until_settled(&engine);
        // a driver polling for this result must be able to stop waiting
        assert!(matches!(engine.progress(), Progress::Idle));

        engine.request(&pos, Difficulty::Beginner).unwrap();
        open.send(()).unwrap();
        wait_until_settled(&engine);
        match engine.progress() {
            Progress::Done(decision) => assert_eq!(decision.chosen, Some(first_move(&pos))),
            other => panic!("expected a result, got {:?}", other),
        }
        assert!(matches!(engine.progress(), Progress::Idle));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let (engine, open) = gated_engine();
        let mut pos = Position::initial();
        engine.request(&pos, Difficulty::Beginner).unwrap();
        let expected = first_move(&pos);
        pos.push(expected).unwrap();
        open.send(()).unwrap();
        assert_eq!(engine.wait().unwrap().chosen, Some(expected));
        assert_eq!(pos.ply_count(), 1);
    }

    #[test]
    fn test_no_legal_moves() {
        let engine = AsyncEngine::new(MoveSelector::standard(Logger::silent()), Logger::silent());
        let mated =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        engine.request(&mated, Difficulty::Expert).unwrap();
        let decision = engine.wait().unwrap();
        assert_eq!(decision.chosen, None);
        assert_eq!(decision.source, Source::NoLegalMoves);
    }
}
