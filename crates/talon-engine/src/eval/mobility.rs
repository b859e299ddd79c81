//! Piece mobility from the analysis cache.
//!
//! Counts squares each knight, bishop, rook and queen reaches that are not
//! occupied by its own side and not covered by an enemy pawn.

use talon_core::{AnalysisCache, Color, PieceKind, Position};

use crate::eval::score::{S, Score};

/// Per-square bonus indexed by [`PieceKind::index`].
const MOBILITY: [Score; PieceKind::COUNT] = [
    Score::ZERO,
    S(4, 4),
    S(3, 5),
    S(2, 3),
    S(1, 2),
    Score::ZERO,
];

fn side_mobility(pos: &Position, cache: &AnalysisCache, color: Color) -> Score {
    let safe = !pos.side(color) & !cache.attacked_by(!color, PieceKind::Pawn);
    let mut score = Score::ZERO;
    for kind in [PieceKind::Knight, PieceKind::Bishop, PieceKind::Rook, PieceKind::Queen] {
        for sq in pos.pieces_of(color, kind) {
            score += MOBILITY[kind.index()] * (cache.attacks_from(sq) & safe).count() as i32;
        }
    }
    score
}

/// White mobility minus Black mobility. `cache` must be built for `pos`.
pub fn mobility(pos: &Position, cache: &AnalysisCache) -> Score {
    side_mobility(pos, cache, Color::White) - side_mobility(pos, cache, Color::Black)
}

#[cfg(test)]
mod tests {
    use talon_core::{AnalysisCache, Position};

    use super::mobility;
    use crate::eval::score::Score;

    fn mobility_of(fen: &str) -> Score {
        let pos: Position = fen.parse().unwrap();
        let mut cache = AnalysisCache::new();
        cache.rebuild(&pos);
        mobility(&pos, &cache)
    }

    #[test]
    fn start_is_balanced() {
        assert_eq!(mobility_of("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"), Score::ZERO);
    }

    #[test]
    fn open_lines_count() {
        assert!(mobility_of("rnbqkb1r/pppppppp/5n2/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 1 2").mg > 0);
        assert!(mobility_of("r3k3/8/8/8/3R4/8/8/4K3 w - - 0 1").mg > 0);
    }
}
