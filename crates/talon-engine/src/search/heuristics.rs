//! Killer moves and the history heuristic for quiet move ordering.

use talon_core::{Move, PieceKind, Square};

use crate::search::MAX_DEPTH;

pub const HISTORY_MAX: i32 = 32_766;
pub const HISTORY_MIN: i32 = -32_766;

/// Two killer moves per ply: quiet moves that caused beta cutoffs.
#[derive(Clone)]
pub struct KillerTable {
    slots: [[Move; 2]; MAX_DEPTH],
}

impl KillerTable {
    pub fn new() -> Self {
        Self {
            slots: [[Move::NONE; 2]; MAX_DEPTH],
        }
    }

    /// Push `mv` into slot 0, shifting the old first killer down.
    pub fn store(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_DEPTH || self.slots[ply][0] == mv {
            return;
        }
        self.slots[ply][1] = self.slots[ply][0];
        self.slots[ply][0] = mv;
    }

    /// Killers at `ply`, `[NONE, NONE]` out of range.
    #[inline]
    pub fn get(&self, ply: usize) -> [Move; 2] {
        self.slots.get(ply).copied().unwrap_or([Move::NONE; 2])
    }

    pub fn is_killer(&self, ply: usize, mv: Move) -> bool {
        self.get(ply).contains(&mv)
    }

    pub fn clear(&mut self) {
        self.slots = [[Move::NONE; 2]; MAX_DEPTH];
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        Self::new()
    }
}

/// History table indexed by `[piece_kind][to_square]`.
///
/// Each update moves an entry a depth-proportional fraction of the way to
/// the bound: `h += (bound - h) * depth / 256`. Entries never leave
/// `HISTORY_MIN..=HISTORY_MAX`.
#[derive(Clone)]
pub struct HistoryTable {
    table: [[i32; Square::COUNT]; PieceKind::COUNT],
}

impl HistoryTable {
    pub fn new() -> Self {
        Self {
            table: [[0; Square::COUNT]; PieceKind::COUNT],
        }
    }

    /// Reward a quiet move that caused a beta cutoff.
    pub fn update_good(&mut self, mv: Move, depth: i32) {
        let entry = &mut self.table[mv.piece().index()][mv.to().index()];
        *entry += ((HISTORY_MAX - *entry) * depth) >> 8;
    }

    /// Penalise a quiet move that was searched but did not raise alpha.
    pub fn update_bad(&mut self, mv: Move, depth: i32) {
        let entry = &mut self.table[mv.piece().index()][mv.to().index()];
        *entry += ((HISTORY_MIN - *entry) * depth) >> 8;
    }

    #[inline]
    pub fn score(&self, mv: Move) -> i32 {
        self.table[mv.piece().index()][mv.to().index()]
    }

    pub fn clear(&mut self) {
        self.table = [[0; Square::COUNT]; PieceKind::COUNT];
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talon_core::MoveType;

    fn quiet(from: Square, to: Square, piece: PieceKind) -> Move {
        Move::new(from, to, piece, false, false, MoveType::Normal)
    }

    #[test]
    fn killer_store_and_shift() {
        let mut kt = KillerTable::new();
        let e4 = quiet(Square::E2, Square::E4, PieceKind::Pawn);
        let d4 = quiet(Square::D2, Square::D4, PieceKind::Pawn);

        kt.store(5, e4);
        assert_eq!(kt.get(5), [e4, Move::NONE]);
        kt.store(5, d4);
        assert_eq!(kt.get(5), [d4, e4]);
        // Re-storing the first killer changes nothing.
        kt.store(5, d4);
        assert_eq!(kt.get(5), [d4, e4]);
        assert!(!kt.is_killer(4, e4));
        assert_eq!(kt.get(MAX_DEPTH + 3), [Move::NONE; 2]);
    }

    #[test]
    fn history_moves_toward_bounds() {
        let mut ht = HistoryTable::new();
        let nf3 = quiet(Square::G1, Square::F3, PieceKind::Knight);
        assert_eq!(ht.score(nf3), 0);

        ht.update_good(nf3, 8);
        assert_eq!(ht.score(nf3), (32_766 * 8) >> 8);
        let after_good = ht.score(nf3);
        ht.update_bad(nf3, 8);
        assert_eq!(ht.score(nf3), after_good + (((-32_766 - after_good) * 8) >> 8));
    }

    #[test]
    fn history_stays_bounded() {
        let mut ht = HistoryTable::new();
        let mv = quiet(Square::A2, Square::A3, PieceKind::Pawn);
        for _ in 0..500 {
            ht.update_good(mv, 64);
        }
        assert!(ht.score(mv) <= HISTORY_MAX);
        assert!(ht.score(mv) > 32_000);
        for _ in 0..500 {
            ht.update_bad(mv, 64);
        }
        assert!(ht.score(mv) >= HISTORY_MIN);
        assert!(ht.score(mv) < -32_000);
        ht.clear();
        assert_eq!(ht.score(mv), 0);
    }
}
