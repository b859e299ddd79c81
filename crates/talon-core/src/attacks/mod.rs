//! Attack sets for every piece kind.
//!
//! Leapers and square geometry are plain compile-time tables. Sliders use
//! magic bitboards built on first use (or eagerly through [`init`]).

mod magic;
mod tables;

use crate::bitboard::Bitboard;
use crate::color::Color;
use crate::piece_kind::PieceKind;
use crate::square::Square;

/// Build the slider tables up front so the first search does not pay for it.
pub fn init() {
    magic::init();
}

#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard {
    tables::KNIGHT[sq.index()]
}

#[inline]
pub fn king_attacks(sq: Square) -> Bitboard {
    tables::KING[sq.index()]
}

/// Squares a pawn of `color` standing on `sq` captures on.
#[inline]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    tables::PAWN[color.index()][sq.index()]
}

#[inline]
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    magic::rook(sq.index(), occupied)
}

#[inline]
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    magic::bishop(sq.index(), occupied)
}

#[inline]
pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    rook_attacks(sq, occupied) | bishop_attacks(sq, occupied)
}

/// Attack set of a `color` piece of `kind` on `sq` with `occupied` blockers.
#[inline]
pub fn attacks_from(kind: PieceKind, color: Color, sq: Square, occupied: Bitboard) -> Bitboard {
    match kind {
        PieceKind::Pawn => pawn_attacks(color, sq),
        PieceKind::Knight => knight_attacks(sq),
        PieceKind::Bishop => bishop_attacks(sq, occupied),
        PieceKind::Rook => rook_attacks(sq, occupied),
        PieceKind::Queen => queen_attacks(sq, occupied),
        PieceKind::King => king_attacks(sq),
    }
}

/// Squares strictly between `a` and `b`; empty unless they share a line.
#[inline]
pub fn between(a: Square, b: Square) -> Bitboard {
    tables::BETWEEN[a.index()][b.index()]
}

/// The whole rank, file or diagonal through `a` and `b`, edge to edge.
/// Empty unless they share a line.
#[inline]
pub fn line(a: Square, b: Square) -> Bitboard {
    tables::LINE[a.index()][b.index()]
}

/// `true` when `a`, `b` and `c` lie on one line.
#[inline]
pub fn aligned(a: Square, b: Square, c: Square) -> bool {
    line(a, b).contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaper_counts() {
        assert_eq!(knight_attacks(Square::E4).count(), 8);
        assert_eq!(knight_attacks(Square::A1).count(), 2);
        assert_eq!(knight_attacks(Square::G1), Bitboard::EMPTY.with(Square::E2).with(Square::F3).with(Square::H3));
        assert_eq!(king_attacks(Square::E1).count(), 5);
        assert_eq!(king_attacks(Square::H8).count(), 3);
    }

    #[test]
    fn pawn_captures_do_not_wrap() {
        assert_eq!(pawn_attacks(Color::White, Square::A4), Square::B5.bitboard());
        assert_eq!(pawn_attacks(Color::White, Square::H4), Square::G5.bitboard());
        assert_eq!(
            pawn_attacks(Color::Black, Square::E5),
            Square::D4.bitboard() | Square::F4.bitboard()
        );
        assert!(pawn_attacks(Color::White, Square::C8).is_empty());
    }

    #[test]
    fn sliders_on_empty_board() {
        for sq in Square::all() {
            assert_eq!(rook_attacks(sq, Bitboard::EMPTY).count(), 14, "{sq}");
        }
        assert_eq!(bishop_attacks(Square::D4, Bitboard::EMPTY).count(), 13);
        assert_eq!(queen_attacks(Square::A1, Bitboard::EMPTY).count(), 21);
    }

    #[test]
    fn blocker_square_is_included() {
        let attacks = rook_attacks(Square::E4, Square::E6.bitboard());
        assert!(attacks.contains(Square::E5));
        assert!(attacks.contains(Square::E6));
        assert!(!attacks.contains(Square::E7));
    }

    #[test]
    fn attacks_from_dispatches_by_kind() {
        let occ = Square::D5.bitboard();
        assert_eq!(attacks_from(PieceKind::Pawn, Color::Black, Square::E5, occ), pawn_attacks(Color::Black, Square::E5));
        assert_eq!(attacks_from(PieceKind::Queen, Color::White, Square::D1, occ), queen_attacks(Square::D1, occ));
        assert_eq!(attacks_from(PieceKind::Knight, Color::White, Square::B1, occ), knight_attacks(Square::B1));
    }

    #[test]
    fn geometry() {
        assert_eq!(between(Square::E1, Square::E4), Square::E2.bitboard() | Square::E3.bitboard());
        assert_eq!(between(Square::A1, Square::H8).count(), 6);
        assert_eq!(between(Square::H8, Square::A1), between(Square::A1, Square::H8));
        assert!(between(Square::A1, Square::B3).is_empty());
        assert!(between(Square::E4, Square::E5).is_empty());
        assert_eq!(line(Square::A1, Square::H8).count(), 8);
        assert_eq!(line(Square::C1, Square::F1), Bitboard::RANK_1);
        assert!(line(Square::A1, Square::B3).is_empty());
        assert!(aligned(Square::A1, Square::C3, Square::H8));
        assert!(!aligned(Square::A1, Square::C3, Square::H7));
    }
}
