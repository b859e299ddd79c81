//! Time management: turn `go` parameters into a search budget.

use std::time::{Duration, Instant};

use talon_core::{Color, Move};
use tracing::debug;

/// Moves assumed left in the game when the GUI does not say.
const DEFAULT_MOVES_TO_GO: u32 = 25;

/// Everything a `go` command can carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    pub movestogo: Option<u32>,
    /// Maximum iteration depth in plies.
    pub depth: Option<usize>,
    pub nodes: Option<u64>,
    /// Stop once a mate in at most this many moves is found.
    pub mate: Option<u32>,
    pub movetime: Option<Duration>,
    pub infinite: bool,
    pub ponder: bool,
    /// Root moves to consider; empty means all.
    pub searchmoves: Vec<Move>,
}

/// Limits derived from [`SearchParams`] at the start of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    /// Stop instant; `None` thinks until told otherwise.
    pub deadline: Option<Instant>,
    pub nodes: Option<u64>,
    pub depth: Option<usize>,
    /// The engine owns the clock and may stop iterating early.
    pub manage_time: bool,
}

impl SearchParams {
    /// Parameters for a fixed thinking time.
    pub fn movetime(time: Duration) -> SearchParams {
        SearchParams {
            movetime: Some(time),
            ..SearchParams::default()
        }
    }

    /// Parameters for a fixed iteration depth.
    pub fn depth(depth: usize) -> SearchParams {
        SearchParams {
            depth: Some(depth),
            ..SearchParams::default()
        }
    }

    /// Time to spend on this move, `None` for no limit.
    ///
    /// Pondering, infinite, depth, node and mate searches have no limit and
    /// a fixed `movetime` is taken as is. Otherwise the remaining time is
    /// split over the moves to go (25 when unknown), multiplied by four in
    /// `panic`, capped at an eighth of the clock and topped up with the
    /// increment.
    pub fn think_time(&self, turn: Color, panic: bool) -> Option<Duration> {
        if self.ponder || self.infinite || self.depth.is_some() || self.nodes.is_some() || self.mate.is_some() {
            return None;
        }
        if let Some(movetime) = self.movetime {
            return Some(movetime);
        }
        let (remaining, increment) = match turn {
            Color::White => (self.wtime, self.winc),
            Color::Black => (self.btime, self.binc),
        };
        let remaining = remaining.unwrap_or(Duration::ZERO);
        let moves = self.movestogo.filter(|&m| m > 0).unwrap_or(DEFAULT_MOVES_TO_GO);

        let mut time = remaining / moves;
        if panic {
            time *= 4;
        }
        time = time.min(remaining / 8);
        time += increment.unwrap_or(Duration::ZERO);
        debug!(ms = time.as_millis() as u64, panic, "thinking time");
        Some(time)
    }

    /// Whether the engine manages its own clock for these parameters.
    pub fn manages_time(&self) -> bool {
        !(self.ponder
            || self.infinite
            || self.depth.is_some()
            || self.nodes.is_some()
            || self.mate.is_some()
            || self.movetime.is_some())
    }

    /// Budget for a search by `turn` that started at `start`.
    pub fn budget(&self, turn: Color, start: Instant, panic: bool) -> Budget {
        Budget {
            deadline: self.think_time(turn, panic).map(|t| start + t),
            nodes: self.nodes,
            depth: self.depth,
            manage_time: self.manages_time(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use talon_core::Color;

    use super::SearchParams;

    fn clock(wtime: u64, btime: u64, inc: u64) -> SearchParams {
        SearchParams {
            wtime: Some(Duration::from_millis(wtime)),
            btime: Some(Duration::from_millis(btime)),
            winc: Some(Duration::from_millis(inc)),
            binc: Some(Duration::from_millis(inc)),
            ..SearchParams::default()
        }
    }

    #[test]
    fn limits_disable_the_clock() {
        let mut params = clock(60_000, 60_000, 0);
        params.depth = Some(8);
        assert_eq!(params.think_time(Color::White, false), None);
        assert!(!params.manages_time());

        let mut params = clock(60_000, 60_000, 0);
        params.ponder = true;
        assert_eq!(params.think_time(Color::White, false), None);

        let params = SearchParams { infinite: true, ..SearchParams::default() };
        assert_eq!(params.think_time(Color::Black, false), None);

        let params = SearchParams { nodes: Some(1000), ..SearchParams::default() };
        assert_eq!(params.think_time(Color::Black, false), None);
    }

    #[test]
    fn movetime_is_exact() {
        let params = SearchParams::movetime(Duration::from_millis(1500));
        assert_eq!(params.think_time(Color::Black, true), Some(Duration::from_millis(1500)));
        assert!(!params.manages_time());
    }

    #[test]
    fn clock_split_over_default_moves() {
        let params = clock(50_000, 10_000, 0);
        assert_eq!(params.think_time(Color::White, false), Some(Duration::from_millis(2_000)));
        assert_eq!(params.think_time(Color::Black, false), Some(Duration::from_millis(400)));
        assert!(params.manages_time());
    }

    #[test]
    fn movestogo_and_increment() {
        let mut params = clock(60_000, 60_000, 500);
        params.movestogo = Some(20);
        assert_eq!(params.think_time(Color::White, false), Some(Duration::from_millis(3_500)));
    }

    #[test]
    fn panic_quadruples_but_caps_at_an_eighth() {
        let params = clock(100_000, 100_000, 0);
        // 4000 * 4 = 16000, capped at 12500.
        assert_eq!(params.think_time(Color::White, true), Some(Duration::from_millis(12_500)));

        let mut params = clock(100_000, 100_000, 0);
        params.movestogo = Some(40);
        assert_eq!(params.think_time(Color::White, true), Some(Duration::from_millis(10_000)));
    }

    #[test]
    fn budget_deadline_follows_start() {
        let start = Instant::now();
        let budget = SearchParams::movetime(Duration::from_millis(100)).budget(Color::White, start, false);
        assert_eq!(budget.deadline, Some(start + Duration::from_millis(100)));
        assert!(!budget.manage_time);

        let budget = SearchParams::depth(5).budget(Color::White, start, false);
        assert_eq!(budget.deadline, None);
        assert_eq!(budget.depth, Some(5));
    }
}
