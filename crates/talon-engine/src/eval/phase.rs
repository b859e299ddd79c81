//! Game phase from the remaining non-pawn material.

use talon_core::{PieceKind, Position};

/// Phase of the starting position.
///
/// Weights: knight 1, bishop 1, rook 2, queen 4.
pub const MAX_PHASE: i32 = 24;

const PHASE_WEIGHT: [(PieceKind, i32); 4] = [
    (PieceKind::Knight, 1),
    (PieceKind::Bishop, 1),
    (PieceKind::Rook, 2),
    (PieceKind::Queen, 4),
];

/// `0..=MAX_PHASE`: [`MAX_PHASE`] is a full middlegame set, 0 a pawn ending.
pub fn game_phase(pos: &Position) -> i32 {
    PHASE_WEIGHT
        .iter()
        .map(|&(kind, weight)| pos.pieces(kind).count() as i32 * weight)
        .sum::<i32>()
        .min(MAX_PHASE)
}

#[cfg(test)]
mod tests {
    use talon_core::Position;

    use super::{MAX_PHASE, game_phase};

    #[test]
    fn phase_counts_pieces() {
        assert_eq!(game_phase(&Position::startpos()), MAX_PHASE);
        let bare: Position = "8/8/4k3/8/8/4K3/8/8 w - - 0 1".parse().unwrap();
        assert_eq!(game_phase(&bare), 0);
        let no_queen: Position = "rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".parse().unwrap();
        assert_eq!(game_phase(&no_queen), 20);
    }
}
