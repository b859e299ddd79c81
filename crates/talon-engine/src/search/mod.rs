//! Search algorithms and move ordering.

pub mod control;
pub mod draw;
pub mod heuristics;
pub mod negamax;
pub mod observer;
pub mod ordering;
pub mod thread;
pub mod tt;

use talon_core::{Move, Position};
use tracing::info;

use crate::config::EngineConfig;
use crate::eval::{MaterialScorer, Scorer};
use crate::time::SearchParams;
use control::SearchControl;
use heuristics::{HistoryTable, KillerTable};
use negamax::Searcher;
use observer::SearchObserver;
use tt::TranspositionTable;

/// Deepest ply the search reaches.
pub const MAX_DEPTH: usize = 64;

/// Score of mate at the root; mate in `n` plies scores `MATE - n`.
pub const MATE: i32 = 30_000;

/// Scores at or beyond this are won without being mates.
pub const KNOWN_WIN: i32 = 20_000;

/// Scores at or beyond this, in absolute value, are mates.
pub const VALUE_IS_MATE: i32 = MATE - MAX_DEPTH as i32;

/// Result of a completed search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// [`Move::NONE`] when the root has no legal move.
    pub best_move: Move,
    /// Second move of the principal variation, the expected reply.
    pub ponder_move: Option<Move>,
    pub pv: Vec<Move>,
    /// Centipawns from the side to move at the root.
    pub score: i32,
    pub nodes: u64,
    /// Deepest iteration that completed.
    pub depth: usize,
    pub sel_depth: usize,
}

/// The search engine: tables that outlive a single search plus the scorer.
///
/// One engine serves one search at a time. Run it on a worker with
/// [`SearchThread`](thread::SearchThread) to keep the caller free.
pub struct SearchEngine {
    config: EngineConfig,
    tt: TranspositionTable,
    history: HistoryTable,
    killers: KillerTable,
    scorer: Box<dyn Scorer>,
    control: SearchControl,
}

impl SearchEngine {
    /// Engine with the bundled [`MaterialScorer`].
    pub fn new(config: EngineConfig) -> SearchEngine {
        SearchEngine::with_scorer(config, Box::new(MaterialScorer::new()))
    }

    pub fn with_scorer(config: EngineConfig, scorer: Box<dyn Scorer>) -> SearchEngine {
        info!(hash_mb = config.hash_mb, contempt = config.contempt, "search engine ready");
        SearchEngine {
            tt: TranspositionTable::new(config.hash_mb),
            history: HistoryTable::new(),
            killers: KillerTable::new(),
            scorer,
            control: SearchControl::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A handle on the stop and ponder flags of this engine's searches.
    pub fn control(&self) -> SearchControl {
        self.control.clone()
    }

    /// Forget everything learned so far, as for a new game.
    pub fn clear(&mut self) {
        self.tt.clear();
        self.history.clear();
        self.killers.clear();
    }

    /// Search `pos` under `params`, reporting to `observer`.
    ///
    /// Blocks until the search ends; when pondering or infinite that is
    /// only after [`SearchControl::stop`] (or a ponder hit, for pondering).
    pub fn go(&mut self, pos: &Position, params: &SearchParams, observer: &mut dyn SearchObserver) -> SearchResult {
        self.control.reset(params.ponder);
        self.think(pos, params, observer)
    }

    /// [`SearchEngine::go`] with the control flags already armed.
    pub(crate) fn think(&mut self, pos: &Position, params: &SearchParams, observer: &mut dyn SearchObserver) -> SearchResult {
        Searcher::new(
            pos,
            &mut self.tt,
            &mut self.history,
            &mut self.killers,
            self.scorer.as_mut(),
            &self.control,
            observer,
            params,
            self.config.contempt,
        )
        .run()
    }
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("config", &self.config)
            .field("hashfull", &self.tt.hashfull())
            .finish()
    }
}
