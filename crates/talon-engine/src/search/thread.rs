//! Running a search on a worker thread.

use std::io;
use std::thread::{self, JoinHandle};

use talon_core::Position;
use tracing::{debug, error};

use crate::config::EngineConfig;
use crate::search::control::SearchControl;
use crate::search::observer::SearchObserver;
use crate::search::{SearchEngine, SearchResult};
use crate::time::SearchParams;

/// Worker stack size; the search recurses up to `MAX_DEPTH` plies with a
/// move list on every frame.
const SEARCH_STACK: usize = 64 * 1024 * 1024;

/// Owns a [`SearchEngine`] and lends it to one worker thread at a time.
///
/// While a search runs only the stop and ponder flags are shared with the
/// worker; everything else is handed over when the thread starts and comes
/// back with [`SearchThread::wait`].
pub struct SearchThread {
    config: EngineConfig,
    engine: Option<SearchEngine>,
    control: SearchControl,
    worker: Option<JoinHandle<(SearchEngine, SearchResult)>>,
}

impl SearchThread {
    pub fn new(engine: SearchEngine) -> SearchThread {
        SearchThread {
            config: engine.config().clone(),
            control: engine.control(),
            engine: Some(engine),
            worker: None,
        }
    }

    /// Start searching a copy of `pos`. A search still running is stopped
    /// and joined first.
    pub fn go(&mut self, pos: &Position, params: SearchParams, mut observer: Box<dyn SearchObserver>) -> io::Result<()> {
        self.stop();
        self.wait();

        let mut engine = self.take_engine();
        self.control = engine.control();
        self.control.reset(params.ponder);
        let pos = pos.clone();
        debug!(ponder = params.ponder, infinite = params.infinite, "starting search thread");

        let worker = thread::Builder::new()
            .name("search".to_string())
            .stack_size(SEARCH_STACK)
            .spawn(move || {
                let result = engine.think(&pos, &params, observer.as_mut());
                (engine, result)
            })?;
        self.worker = Some(worker);
        Ok(())
    }

    /// Ask the running search to finish; it still reports its best move.
    pub fn stop(&self) {
        self.control.stop();
    }

    /// The pondered move was played: the search starts its clock.
    pub fn ponder_hit(&self) {
        self.control.ponder_hit();
    }

    pub fn is_searching(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
    }

    /// Block until the worker ends and take the engine back. `None` when no
    /// search was started or the worker died.
    pub fn wait(&mut self) -> Option<SearchResult> {
        let worker = self.worker.take()?;
        match worker.join() {
            Ok((engine, result)) => {
                self.engine = Some(engine);
                Some(result)
            }
            Err(_) => {
                error!("search thread panicked; the engine is rebuilt");
                None
            }
        }
    }

    /// The engine, after waiting for any running search.
    pub fn engine_mut(&mut self) -> &mut SearchEngine {
        self.wait();
        let config = &self.config;
        self.engine.get_or_insert_with(|| SearchEngine::new(config.clone()))
    }

    /// Replace the engine with one built from `config` unless it already
    /// uses exactly that configuration.
    pub fn reconfigure(&mut self, config: EngineConfig) {
        if self.engine_mut().config() == &config {
            return;
        }
        self.engine = Some(SearchEngine::new(config.clone()));
        self.config = config;
    }

    fn take_engine(&mut self) -> SearchEngine {
        match self.engine.take() {
            Some(engine) => engine,
            None => SearchEngine::new(self.config.clone()),
        }
    }
}

impl Drop for SearchThread {
    fn drop(&mut self) {
        self.stop();
        self.wait();
    }
}
