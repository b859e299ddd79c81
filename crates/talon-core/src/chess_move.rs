//! Moves packed into a `u32`.

use std::fmt;

use crate::piece_kind::PieceKind;
use crate::square::Square;

const TO_SHIFT: u32 = 0;
const FROM_SHIFT: u32 = 6;
const PIECE_SHIFT: u32 = 12;
const CAPTURE_BIT: u32 = 1 << 15;
const CHECK_BIT: u32 = 1 << 16;
const TYPE_SHIFT: u32 = 17;

const SQUARE_MASK: u32 = 0x3F;
const PIECE_MASK: u32 = 0x7;
const TYPE_MASK: u32 = 0xF;

/// Every field of a real move fits below this bit.
pub const MOVE_BITS: u32 = 21;

/// Special-move tag stored in bits 17..21.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveType {
    Normal = 0,
    CastleKing = 1,
    CastleQueen = 2,
    EnPassant = 3,
    PromoteQueen = 4,
    PromoteKnight = 5,
    PromoteBishop = 6,
    PromoteRook = 7,
    /// Only meaningful for variants with royal promotion; never generated.
    PromoteKing = 8,
}

impl MoveType {
    const fn from_bits(bits: u32) -> MoveType {
        match bits {
            1 => MoveType::CastleKing,
            2 => MoveType::CastleQueen,
            3 => MoveType::EnPassant,
            4 => MoveType::PromoteQueen,
            5 => MoveType::PromoteKnight,
            6 => MoveType::PromoteBishop,
            7 => MoveType::PromoteRook,
            8 => MoveType::PromoteKing,
            _ => MoveType::Normal,
        }
    }

    /// Promotion tag for `kind`, or `None` for a pawn.
    pub const fn promotion(kind: PieceKind) -> Option<MoveType> {
        match kind {
            PieceKind::Queen => Some(MoveType::PromoteQueen),
            PieceKind::Knight => Some(MoveType::PromoteKnight),
            PieceKind::Bishop => Some(MoveType::PromoteBishop),
            PieceKind::Rook => Some(MoveType::PromoteRook),
            PieceKind::King => Some(MoveType::PromoteKing),
            PieceKind::Pawn => None,
        }
    }

    /// Promotion tags in the order the generator emits them.
    pub const PROMOTIONS: [MoveType; 4] = [
        MoveType::PromoteQueen,
        MoveType::PromoteKnight,
        MoveType::PromoteRook,
        MoveType::PromoteBishop,
    ];
}

/// A move: destination, origin, moving piece, capture/check flags and type.
///
/// ```text
/// bits  0-5   destination square
/// bits  6-11  origin square
/// bits 12-14  moving piece kind + 1 (0 = none)
/// bit  15     capture
/// bit  16     gives check
/// bits 17-20  MoveType
/// ```
///
/// For castling the destination is the king's target square in standard
/// chess and the castling rook's square in Chess960.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Move(u32);

impl Move {
    /// No move at all.
    pub const NONE: Move = Move(0);
    /// A pass, used by null-move pruning. Never offered as output.
    pub const NULL: Move = Move(u32::MAX);

    pub const fn new(
        from: Square,
        to: Square,
        piece: PieceKind,
        capture: bool,
        check: bool,
        move_type: MoveType,
    ) -> Move {
        let mut bits = (to.index() as u32) << TO_SHIFT
            | (from.index() as u32) << FROM_SHIFT
            | (piece.index() as u32 + 1) << PIECE_SHIFT
            | (move_type as u32) << TYPE_SHIFT;
        if capture {
            bits |= CAPTURE_BIT;
        }
        if check {
            bits |= CHECK_BIT;
        }
        Move(bits)
    }

    /// Rebuild from [`Move::raw`]; used by the transposition table.
    #[inline]
    pub const fn from_raw(raw: u32) -> Move {
        Move(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == Move::NONE.0
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == Move::NULL.0
    }

    /// Neither [`Move::NONE`] nor [`Move::NULL`].
    #[inline]
    pub const fn is_some(self) -> bool {
        !self.is_none() && !self.is_null()
    }

    #[inline]
    pub const fn to(self) -> Square {
        Square::from_index_unchecked(((self.0 >> TO_SHIFT) & SQUARE_MASK) as u8)
    }

    #[inline]
    pub const fn from(self) -> Square {
        Square::from_index_unchecked(((self.0 >> FROM_SHIFT) & SQUARE_MASK) as u8)
    }

    /// The moving piece; pawn for sentinels, which carry none.
    #[inline]
    pub const fn piece(self) -> PieceKind {
        let idx = (self.0 >> PIECE_SHIFT) & PIECE_MASK;
        match PieceKind::from_index(idx.saturating_sub(1) as usize) {
            Some(kind) => kind,
            None => PieceKind::Pawn,
        }
    }

    #[inline]
    pub const fn is_capture(self) -> bool {
        self.is_some() && self.0 & CAPTURE_BIT != 0
    }

    #[inline]
    pub const fn is_check(self) -> bool {
        self.is_some() && self.0 & CHECK_BIT != 0
    }

    #[inline]
    pub const fn move_type(self) -> MoveType {
        if self.is_null() {
            return MoveType::Normal;
        }
        MoveType::from_bits((self.0 >> TYPE_SHIFT) & TYPE_MASK)
    }

    /// Piece a pawn promotes to, if this is a promotion.
    #[inline]
    pub const fn promotion(self) -> Option<PieceKind> {
        match self.move_type() {
            MoveType::PromoteQueen => Some(PieceKind::Queen),
            MoveType::PromoteKnight => Some(PieceKind::Knight),
            MoveType::PromoteBishop => Some(PieceKind::Bishop),
            MoveType::PromoteRook => Some(PieceKind::Rook),
            MoveType::PromoteKing => Some(PieceKind::King),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_castle(self) -> bool {
        matches!(self.move_type(), MoveType::CastleKing | MoveType::CastleQueen)
    }

    #[inline]
    pub const fn is_en_passant(self) -> bool {
        matches!(self.move_type(), MoveType::EnPassant)
    }

    /// Captures and promotions: the moves quiescence looks at.
    #[inline]
    pub const fn is_tactical(self) -> bool {
        self.is_capture() || self.promotion().is_some()
    }

    /// Same move with the check flag forced to `check`.
    #[inline]
    pub const fn with_check(self, check: bool) -> Move {
        if !self.is_some() {
            return self;
        }
        if check { Move(self.0 | CHECK_BIT) } else { Move(self.0 & !CHECK_BIT) }
    }

    /// Equality ignoring the check annotation.
    #[inline]
    pub const fn same_as(self, other: Move) -> bool {
        self.with_check(false).0 == other.with_check(false).0
    }

    /// Coordinate notation: `e2e4`, `e7e8q`, `0000` for the null move.
    pub fn to_uci(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("0000");
        }
        if self.is_none() {
            return f.write_str("none");
        }
        write!(f, "{}{}", self.from(), self.to())?;
        if let Some(kind) = self.promotion() {
            write!(f, "{}", kind.fen_char())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_some() {
            return write!(f, "Move({self})");
        }
        write!(f, "Move({self} {:?} {:?}", self.piece(), self.move_type())?;
        if self.is_capture() {
            f.write_str(" capture")?;
        }
        if self.is_check() {
            f.write_str(" check")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::{MOVE_BITS, Move, MoveType};
    use crate::piece_kind::PieceKind;
    use crate::square::Square;

    #[test]
    fn fields_roundtrip() {
        let mv = Move::new(Square::G1, Square::F3, PieceKind::Knight, false, true, MoveType::Normal);
        assert_eq!(mv.from(), Square::G1);
        assert_eq!(mv.to(), Square::F3);
        assert_eq!(mv.piece(), PieceKind::Knight);
        assert!(!mv.is_capture());
        assert!(mv.is_check());
        assert_eq!(mv.move_type(), MoveType::Normal);
        assert!(mv.raw() < 1 << MOVE_BITS);
        assert_eq!(Move::from_raw(mv.raw()), mv);
    }

    #[test]
    fn layout_matches_bit_positions() {
        let mv = Move::new(Square::A2, Square::B1, PieceKind::Pawn, true, false, MoveType::PromoteRook);
        assert_eq!(mv.raw() & 0x3F, 1);
        assert_eq!((mv.raw() >> 6) & 0x3F, 8);
        assert_eq!((mv.raw() >> 12) & 0x7, 1);
        assert_eq!((mv.raw() >> 15) & 1, 1);
        assert_eq!((mv.raw() >> 17) & 0xF, 7);
    }

    #[test]
    fn promotions() {
        for kind in [PieceKind::Queen, PieceKind::Knight, PieceKind::Bishop, PieceKind::Rook] {
            let mt = MoveType::promotion(kind).unwrap();
            let mv = Move::new(Square::E7, Square::E8, PieceKind::Pawn, false, false, mt);
            assert_eq!(mv.promotion(), Some(kind));
            assert!(mv.is_tactical());
            assert_eq!(mv.to_uci(), format!("e7e8{}", kind.fen_char()));
        }
        assert_eq!(MoveType::promotion(PieceKind::Pawn), None);
    }

    #[test]
    fn sentinels() {
        assert!(Move::NONE.is_none());
        assert!(Move::NULL.is_null());
        assert!(!Move::NULL.is_some());
        assert!(!Move::NULL.is_capture());
        assert!(!Move::NULL.is_check());
        assert_eq!(Move::NULL.to_uci(), "0000");
        assert_eq!(Move::NONE.to_string(), "none");
        assert_eq!(Move::NULL.with_check(true), Move::NULL);
    }

    #[test]
    fn check_flag_is_ignored_by_same_as() {
        let quiet = Move::new(Square::D1, Square::H5, PieceKind::Queen, false, false, MoveType::Normal);
        let checking = quiet.with_check(true);
        assert_ne!(quiet, checking);
        assert!(quiet.same_as(checking));
        assert_eq!(checking.with_check(false), quiet);
    }

    #[test]
    fn castling_and_en_passant_tags() {
        let castle = Move::new(Square::E1, Square::G1, PieceKind::King, false, false, MoveType::CastleKing);
        assert!(castle.is_castle());
        assert_eq!(castle.to_uci(), "e1g1");
        let ep = Move::new(Square::E5, Square::D6, PieceKind::Pawn, true, false, MoveType::EnPassant);
        assert!(ep.is_en_passant());
        assert!(ep.is_capture());
        assert_eq!(ep.promotion(), None);
    }
}
