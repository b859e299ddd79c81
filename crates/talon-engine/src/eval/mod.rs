//! Static evaluation.
//!
//! The search sees evaluation only through [`Scorer`]; [`MaterialScorer`]
//! is the bundled implementation.

pub mod endgame;
pub mod kpk;
pub mod material;
pub mod mobility;
pub mod phase;
pub mod pst;
pub mod score;

use talon_core::{AnalysisCache, Position};

use score::Score;

/// Sentinel for "no evaluation available"; never a real score.
pub const NO_VALUE: i32 = i16::MAX as i32;

/// Position scorer consumed by the search.
///
/// Scores are white-relative centipawns strictly inside
/// `-KNOWN_WIN - 5000..KNOWN_WIN + 5000`, so they never collide with mate
/// scores or [`NO_VALUE`]. The search negates for Black.
pub trait Scorer: Send {
    /// `cache` has been rebuilt for `pos` before the call.
    fn evaluate(&mut self, pos: &Position, cache: &AnalysisCache) -> i32;
}

/// Material, piece-square tables and mobility, tapered by game phase,
/// behind the endgame recognisers.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialScorer;

impl MaterialScorer {
    pub fn new() -> MaterialScorer {
        MaterialScorer
    }
}

impl Scorer for MaterialScorer {
    fn evaluate(&mut self, pos: &Position, cache: &AnalysisCache) -> i32 {
        if let Some(known) = endgame::recognise(pos) {
            return known;
        }
        let total = material::material(pos) + pst::placement(pos) + mobility::mobility(pos, cache);
        let eg = total.eg * endgame::scale(pos) / endgame::SCALE_NORMAL;
        Score::new(total.mg, eg).taper(phase::game_phase(pos))
    }
}

#[cfg(test)]
mod tests {
    use talon_core::{AnalysisCache, Position};

    use super::{MaterialScorer, Scorer};
    use crate::search::KNOWN_WIN;

    fn eval(fen: &str) -> i32 {
        let pos: Position = fen.parse().unwrap();
        let mut cache = AnalysisCache::new();
        cache.rebuild(&pos);
        MaterialScorer.evaluate(&pos, &cache)
    }

    #[test]
    fn start_is_level() {
        assert_eq!(eval("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"), 0);
    }

    #[test]
    fn colour_flip_negates() {
        let white = eval("4k3/p7/8/8/8/8/4P3/R3K3 w - - 0 1");
        let black = eval("r3k3/4p3/8/8/8/8/P7/4K3 b - - 0 1");
        assert!(white > 400);
        assert_eq!(white, -black);
    }

    #[test]
    fn king_and_pawn_endings_use_the_table() {
        assert!(eval("8/5k1P/8/8/8/7K/8/8 w - - 0 1") >= KNOWN_WIN);
        assert_eq!(eval("8/5k1P/8/8/8/7K/8/8 b - - 0 1"), 0);
        assert!(eval("8/8/8/6p1/7k/8/6K1/8 b - - 0 1") <= -KNOWN_WIN);
        assert_eq!(eval("5k2/8/2K1P3/8/8/8/8/8 b - - 0 1"), 0);
    }

    #[test]
    fn blocked_rook_endings_are_damped() {
        // Black king in front of both white pawns, none of them passed.
        let blocked = eval("6k1/8/6p1/5P1P/8/8/r7/4R1K1 w - - 0 1");
        let passed = eval("6k1/8/6p1/P6P/8/8/r7/4R1K1 w - - 0 1");
        assert!(blocked < passed, "blocked {blocked} passed {passed}");
    }

    #[test]
    fn philidor_evaluates_to_zero() {
        assert_eq!(eval("5k2/8/r7/1R6/5K2/5P2/8/8 w - - 4 70"), 0);
        assert_eq!(eval("5k2/3R4/r7/5PK1/8/8/8/8 b - - 5 70"), 0);
    }
}
