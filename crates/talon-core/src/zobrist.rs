//! Two-word Zobrist keys.
//!
//! White's pieces, the side to move, white castling rights and a white
//! double push's en-passant file fold into word 0; black's counterparts into
//! word 1. Transposition lookups use [`Key::primary`] and guard slots with
//! [`Key::verification`].

use std::fmt;

use crate::color::Color;
use crate::piece_kind::PieceKind;
use crate::square::Square;

const SEED: u64 = 0x7461_6c6f_6e5f_6b31;

const fn xorshift64(mut state: u64) -> u64 {
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    state
}

pub(crate) struct Tables {
    pieces: [[[u64; 64]; PieceKind::COUNT]; Color::COUNT],
    turn: u64,
    castling: [u64; 4],
    ep_file: [u64; 8],
}

const fn generate() -> Tables {
    let mut t = Tables {
        pieces: [[[0; 64]; PieceKind::COUNT]; Color::COUNT],
        turn: 0,
        castling: [0; 4],
        ep_file: [0; 8],
    };
    let mut state = SEED;
    let mut c = 0;
    while c < Color::COUNT {
        let mut k = 0;
        while k < PieceKind::COUNT {
            let mut sq = 0;
            while sq < 64 {
                state = xorshift64(state);
                t.pieces[c][k][sq] = state;
                sq += 1;
            }
            k += 1;
        }
        c += 1;
    }
    state = xorshift64(state);
    t.turn = state;
    let mut i = 0;
    while i < 4 {
        state = xorshift64(state);
        t.castling[i] = state;
        i += 1;
    }
    let mut i = 0;
    while i < 8 {
        state = xorshift64(state);
        t.ep_file[i] = state;
        i += 1;
    }
    t
}

pub(crate) static TABLES: Tables = generate();

/// Mixed into the key of a search that excludes one move, so its
/// transposition entries never alias the unrestricted node.
const EXCLUSION: u64 = 0x2f1c_8b3e_9d47_a605;

/// The 128-bit position key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Key([u64; 2]);

impl Key {
    pub const EMPTY: Key = Key([0; 2]);

    #[inline]
    pub const fn words(self) -> [u64; 2] {
        self.0
    }

    /// Canonical 64-bit key used for table indexing and repetition checks.
    #[inline]
    pub const fn primary(self) -> u64 {
        self.0[0] ^ self.0[1]
    }

    /// A second, differently mixed 64-bit view stored in table slots.
    #[inline]
    pub const fn verification(self) -> u64 {
        self.0[0] ^ self.0[1].rotate_left(32)
    }

    /// Key of the same node searched with one move excluded.
    #[inline]
    pub const fn excluded(self) -> Key {
        Key([self.0[0] ^ EXCLUSION, self.0[1]])
    }

    #[inline]
    pub(crate) fn toggle_piece(&mut self, color: Color, kind: PieceKind, sq: Square) {
        self.0[color.index()] ^= TABLES.pieces[color.index()][kind.index()][sq.index()];
    }

    #[inline]
    pub(crate) fn toggle_turn(&mut self) {
        self.0[0] ^= TABLES.turn;
    }

    /// Toggle every castling right present in `slots` (bit `i` = slot `i`).
    #[inline]
    pub(crate) fn toggle_castling(&mut self, slots: u8) {
        for slot in 0..4 {
            if slots & (1 << slot) != 0 {
                self.0[slot / 2] ^= TABLES.castling[slot];
            }
        }
    }

    /// Toggle the en-passant file created by `mover`'s double push.
    #[inline]
    pub(crate) fn toggle_en_passant(&mut self, mover: Color, file: u8) {
        self.0[mover.index()] ^= TABLES.ep_file[file as usize];
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:016x}:{:016x})", self.0[0], self.0[1])
    }
}

#[cfg(test)]
mod tests {
    use super::{Key, TABLES};
    use crate::color::Color;
    use crate::piece_kind::PieceKind;
    use crate::square::Square;

    #[test]
    fn all_constants_are_distinct() {
        let mut all: Vec<u64> = TABLES.pieces.iter().flatten().flatten().copied().collect();
        all.push(TABLES.turn);
        all.extend(TABLES.castling);
        all.extend(TABLES.ep_file);
        let count = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), count);
        assert!(!all.contains(&0));
    }

    #[test]
    fn toggles_are_involutions() {
        let mut key = Key::default();
        key.toggle_piece(Color::Black, PieceKind::Queen, Square::D8);
        key.toggle_turn();
        key.toggle_castling(0b1010);
        key.toggle_en_passant(Color::White, 4);
        assert_ne!(key, Key::default());
        key.toggle_en_passant(Color::White, 4);
        key.toggle_castling(0b1010);
        key.toggle_turn();
        key.toggle_piece(Color::Black, PieceKind::Queen, Square::D8);
        assert_eq!(key, Key::default());
    }

    #[test]
    fn colours_use_separate_words() {
        let mut key = Key::default();
        key.toggle_piece(Color::White, PieceKind::Pawn, Square::E4);
        assert_eq!(key.words()[1], 0);
        key.toggle_castling(0b0100);
        assert_ne!(key.words()[1], 0);
    }

    #[test]
    fn exclusion_changes_both_views() {
        let mut key = Key::default();
        key.toggle_piece(Color::White, PieceKind::King, Square::E1);
        let ex = key.excluded();
        assert_ne!(ex.primary(), key.primary());
        assert_ne!(ex.verification(), key.verification());
        assert_eq!(ex.excluded(), key);
    }
}
