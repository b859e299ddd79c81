//! Material balance, white-relative.

use talon_core::{Color, PieceKind, Position};

use crate::eval::score::{S, Score};

/// Piece values indexed by [`PieceKind::index`].
pub const PIECE_VALUE: [i32; PieceKind::COUNT] = [100, 320, 330, 500, 900, 0];

const BISHOP_PAIR: Score = S(30, 50);

pub fn material(pos: &Position) -> Score {
    let mut score = Score::ZERO;
    for color in Color::ALL {
        let mut side = Score::ZERO;
        for kind in PieceKind::ALL {
            let value = PIECE_VALUE[kind.index()];
            side += S(value, value) * pos.pieces_of(color, kind).count() as i32;
        }
        if pos.pieces_of(color, PieceKind::Bishop).count() >= 2 {
            side += BISHOP_PAIR;
        }
        score += side * color.sign();
    }
    score
}

#[cfg(test)]
mod tests {
    use talon_core::Position;

    use super::{BISHOP_PAIR, material};
    use crate::eval::score::{S, Score};

    #[test]
    fn balanced_start() {
        assert_eq!(material(&Position::startpos()), Score::ZERO);
    }

    #[test]
    fn queen_and_bishop_pair() {
        let pos: Position = "rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".parse().unwrap();
        assert_eq!(material(&pos), S(900, 900));

        let pos: Position = "rn1qk1nr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".parse().unwrap();
        assert_eq!(material(&pos), S(660, 660) + BISHOP_PAIR);
    }
}
