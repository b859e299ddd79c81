//! Progress reporting out of a running search.

use std::time::Duration;

use talon_core::Move;

use crate::search::{MATE, VALUE_IS_MATE};

/// One progress report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchInfo {
    pub depth: usize,
    pub sel_depth: usize,
    pub time: Duration,
    pub pv: Vec<Move>,
    /// Centipawns from the side to move at the root.
    pub score: i32,
    /// The score only proves the true value is at least this.
    pub lower_bound: bool,
    /// The score only proves the true value is at most this.
    pub upper_bound: bool,
    pub nodes: u64,
    /// Transposition table fill in permille.
    pub hashfull: u32,
    pub nps: u64,
}

impl SearchInfo {
    /// Moves to mate, negative when the side to move is the one mated.
    pub fn mate_in(&self) -> Option<i32> {
        if self.score.abs() <= VALUE_IS_MATE {
            return None;
        }
        let plies = MATE - self.score.abs();
        let moves = (plies + 1) / 2;
        Some(if self.score > 0 { moves } else { -moves })
    }
}

/// Receiver of search progress.
///
/// `on_progress` fires at least once per completed iteration and
/// `on_best_move` exactly once when the search ends.
pub trait SearchObserver: Send {
    fn on_progress(&mut self, info: &SearchInfo);

    /// `best` is [`Move::NONE`] when the root has no legal move.
    fn on_best_move(&mut self, best: Move, ponder: Option<Move>);
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl SearchObserver for SilentObserver {
    fn on_progress(&mut self, _info: &SearchInfo) {}

    fn on_best_move(&mut self, _best: Move, _ponder: Option<Move>) {}
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::SearchInfo;
    use crate::search::MATE;

    fn info(score: i32) -> SearchInfo {
        SearchInfo {
            depth: 1,
            sel_depth: 1,
            time: Duration::ZERO,
            pv: Vec::new(),
            score,
            lower_bound: false,
            upper_bound: false,
            nodes: 0,
            hashfull: 0,
            nps: 0,
        }
    }

    #[test]
    fn mate_distance_in_moves() {
        assert_eq!(info(MATE - 1).mate_in(), Some(1));
        assert_eq!(info(MATE - 3).mate_in(), Some(2));
        assert_eq!(info(MATE - 4).mate_in(), Some(2));
        assert_eq!(info(-(MATE - 2)).mate_in(), Some(-1));
        assert_eq!(info(250).mate_in(), None);
    }
}
