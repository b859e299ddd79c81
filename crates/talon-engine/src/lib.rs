//! Search and evaluation for talon.

pub mod config;
pub mod eval;
pub mod search;
pub mod time;

pub use config::EngineConfig;
pub use eval::{MaterialScorer, NO_VALUE, Scorer};
pub use search::control::SearchControl;
pub use search::observer::{SearchInfo, SearchObserver, SilentObserver};
pub use search::thread::SearchThread;
pub use search::{KNOWN_WIN, MATE, MAX_DEPTH, SearchEngine, SearchResult, VALUE_IS_MATE};
pub use time::SearchParams;
