//! Castling rights: one bit per (colour, side) pair.

use std::fmt;

use crate::color::Color;
use crate::square::Square;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastleSide {
    King,
    Queen,
}

impl CastleSide {
    pub const ALL: [CastleSide; 2] = [CastleSide::King, CastleSide::Queen];

    /// Files the king and rook land on.
    #[inline]
    pub const fn king_target_file(self) -> u8 {
        match self {
            CastleSide::King => 6,
            CastleSide::Queen => 2,
        }
    }

    #[inline]
    pub const fn rook_target_file(self) -> u8 {
        match self {
            CastleSide::King => 5,
            CastleSide::Queen => 3,
        }
    }

    /// King destination on `color`'s back rank.
    #[inline]
    pub const fn king_target(self, color: Color) -> Square {
        Square::new(back_rank(color), self.king_target_file())
    }

    /// Rook destination on `color`'s back rank.
    #[inline]
    pub const fn rook_target(self, color: Color) -> Square {
        Square::new(back_rank(color), self.rook_target_file())
    }
}

#[inline]
const fn back_rank(color: Color) -> u8 {
    match color {
        Color::White => 0,
        Color::Black => 7,
    }
}

/// Four rights packed into the low nibble: `WK = 1`, `WQ = 2`, `BK = 4`, `BQ = 8`.
///
/// The bit position doubles as the slot index of the castling rook in
/// [`crate::Position::castling_rook`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastleRights(u8);

impl CastleRights {
    pub const NONE: CastleRights = CastleRights(0);
    pub const ALL: CastleRights = CastleRights(0b1111);

    #[inline]
    pub const fn from_bits(bits: u8) -> CastleRights {
        CastleRights(bits & 0b1111)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Slot 0..4 for a colour and side.
    #[inline]
    pub const fn slot(color: Color, side: CastleSide) -> usize {
        color.index() * 2
            + match side {
                CastleSide::King => 0,
                CastleSide::Queen => 1,
            }
    }

    #[inline]
    pub const fn has(self, color: Color, side: CastleSide) -> bool {
        self.0 & (1 << Self::slot(color, side)) != 0
    }

    #[inline]
    pub const fn with(self, color: Color, side: CastleSide) -> CastleRights {
        CastleRights(self.0 | 1 << Self::slot(color, side))
    }

    #[inline]
    pub const fn without(self, color: Color, side: CastleSide) -> CastleRights {
        CastleRights(self.0 & !(1 << Self::slot(color, side)))
    }

    #[inline]
    pub const fn without_color(self, color: Color) -> CastleRights {
        CastleRights(self.0 & !(0b11 << (color.index() * 2)))
    }

    /// Rights set in `self` but not in `other`, as raw slot bits.
    #[inline]
    pub const fn lost_since(self, other: CastleRights) -> u8 {
        self.0 & !other.0
    }
}

impl fmt::Display for CastleRights {
    /// Standard letters; Chess960 files are written by the FEN exporter.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        for (slot, c) in ['K', 'Q', 'k', 'q'].into_iter().enumerate() {
            if self.0 & (1 << slot) != 0 {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CastleRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CastleRights({self})")
    }
}
