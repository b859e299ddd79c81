//! Transposition table.
//!
//! Three parallel arrays: the verification word of the position key, a
//! packed info word and the static evaluation. A position may live in any of
//! [`SLOT_RUN`] consecutive slots starting at the index taken from the top
//! bits of its primary key.
//!
//! ## Info word layout
//!
//! ```text
//! bits  0-20  move
//! bits 21-24  node type
//! bits 32-39  generation
//! bits 40-47  depth (0xFF stores -1)
//! bits 48-63  score (i16)
//! ```

use talon_core::{Key, MOVE_BITS, Move};
use tracing::debug;

use crate::search::VALUE_IS_MATE;

/// Slots scanned from the home index.
const SLOT_RUN: usize = 4;

/// Bound kind of a stored score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    /// Only the static evaluation is meaningful.
    Eval = 0,
    Exact = 1,
    /// Upper bound: every move failed low.
    FailLow = 2,
    /// Lower bound: a move failed high.
    FailHigh = 3,
}

impl NodeType {
    const fn from_bits(bits: u64) -> NodeType {
        match bits & 0xF {
            1 => NodeType::Exact,
            2 => NodeType::FailLow,
            3 => NodeType::FailHigh,
            _ => NodeType::Eval,
        }
    }
}

/// Depth marker of quiescence entries that generated checks.
pub const DEPTH_QS_CHECKS: i32 = 0;
/// Depth marker of quiescence entries limited to captures.
pub const DEPTH_QS_NO_CHECKS: i32 = -1;

/// A decoded slot; the score is already relative to the probing node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtEntry {
    pub mv: Move,
    pub node_type: NodeType,
    pub depth: i32,
    pub generation: u8,
    pub score: i32,
    pub eval: i32,
}

impl TtEntry {
    /// Whether the stored bound settles a search of `depth` with the window
    /// `(alpha, beta)` without looking further.
    pub fn can_cut(&self, depth: i32, alpha: i32, beta: i32) -> bool {
        self.depth >= depth
            && match self.node_type {
                NodeType::Exact => true,
                NodeType::FailLow => self.score <= alpha,
                NodeType::FailHigh => self.score >= beta,
                NodeType::Eval => false,
            }
    }
}

pub struct TranspositionTable {
    keys: Vec<u64>,
    infos: Vec<u64>,
    evals: Vec<i16>,
    size_bits: u32,
    generation: u8,
    occupied: usize,
}

impl TranspositionTable {
    /// Table with `2^(log2(mb) + 16)` slots, 18 bytes each.
    pub fn new(mb: usize) -> TranspositionTable {
        let size_bits = mb.max(1).ilog2() + 16;
        let size = 1usize << size_bits;
        debug!(mb, slots = size, "allocating transposition table");
        TranspositionTable {
            keys: vec![0; size],
            infos: vec![0; size],
            evals: vec![0; size],
            size_bits,
            generation: 0,
            occupied: 0,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.keys.len()
    }

    /// Forget every entry; the allocation is kept.
    pub fn clear(&mut self) {
        self.keys.fill(0);
        self.infos.fill(0);
        self.evals.fill(0);
        self.occupied = 0;
        self.generation = 0;
    }

    /// Start a new search pass. Wraps after 255.
    pub fn new_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    #[inline]
    pub fn generation(&self) -> u8 {
        self.generation
    }

    /// Occupied slots per thousand.
    pub fn hashfull(&self) -> u32 {
        (1000 * self.occupied as u64 / self.size() as u64) as u32
    }

    #[inline]
    fn home(&self, key: Key) -> usize {
        (key.primary() >> (64 - self.size_bits)) as usize
    }

    fn run(&self, key: Key) -> std::ops::Range<usize> {
        let start = self.home(key);
        start..(start + SLOT_RUN).min(self.size())
    }

    /// Look `key` up. Pass [`Position::exclusion_key`] for singular searches.
    /// Mate scores come back measured from the node at `ply`.
    ///
    /// [`Position::exclusion_key`]: talon_core::Position::exclusion_key
    pub fn lookup(&self, key: Key, ply: usize) -> Option<TtEntry> {
        let verification = key.verification();
        let slot = self.run(key).find(|&i| self.keys[i] == verification)?;
        let info = self.infos[slot];
        let mut score = (info >> 48) as u16 as i16 as i32;
        if score >= VALUE_IS_MATE {
            score -= ply as i32;
        } else if score <= -VALUE_IS_MATE {
            score += ply as i32;
        }
        Some(TtEntry {
            mv: Move::from_raw((info & ((1 << MOVE_BITS) - 1)) as u32),
            node_type: NodeType::from_bits(info >> 21),
            depth: decode_depth(info),
            generation: (info >> 32) as u8,
            score,
            eval: self.evals[slot] as i32,
        })
    }

    /// Store a search result for `key`.
    ///
    /// The slot is the first empty one in the run, else one already holding
    /// this key, else the least important: exact bounds count 10, each
    /// generation of age costs 1 and each ply of depth earns 1.
    #[allow(clippy::too_many_arguments)]
    pub fn store(
        &mut self,
        key: Key,
        node_type: NodeType,
        depth: i32,
        mv: Move,
        score: i32,
        eval: i32,
        ply: usize,
    ) {
        let verification = key.verification();
        let mut target = None;
        let mut keep_move = Move::NONE;
        let mut lowest = i32::MAX;

        for i in self.run(key) {
            if self.keys[i] == 0 {
                self.occupied += 1;
                target = Some(i);
                break;
            }
            if self.keys[i] == verification {
                if !mv.is_some() {
                    keep_move = Move::from_raw((self.infos[i] & ((1 << MOVE_BITS) - 1)) as u32);
                }
                target = Some(i);
                break;
            }
            let importance = self.importance(i);
            if importance < lowest {
                lowest = importance;
                target = Some(i);
            }
        }
        let Some(slot) = target else {
            return;
        };

        let mut score = score;
        if score >= VALUE_IS_MATE {
            score += ply as i32;
        } else if score <= -VALUE_IS_MATE {
            score -= ply as i32;
        }
        debug_assert!(i16::try_from(score).is_ok(), "score {score} does not fit the table");
        let mv = if mv.is_some() { mv } else { keep_move };

        self.keys[slot] = verification;
        self.infos[slot] = (mv.raw() as u64 & ((1 << MOVE_BITS) - 1))
            | ((node_type as u64) << 21)
            | ((self.generation as u64) << 32)
            | ((depth as u8 as u64) << 40)
            | ((score as i16 as u16 as u64) << 48);
        self.evals[slot] = eval as i16;
    }

    fn importance(&self, slot: usize) -> i32 {
        let info = self.infos[slot];
        let exact = if NodeType::from_bits(info >> 21) == NodeType::Exact { 10 } else { 0 };
        let age = self.generation.wrapping_sub((info >> 32) as u8) as i32;
        exact - age + decode_depth(info)
    }
}

#[inline]
fn decode_depth(info: u64) -> i32 {
    (info >> 40) as u8 as i8 as i32
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("slots", &self.size())
            .field("generation", &self.generation)
            .field("occupied", &self.occupied)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::MATE;
    use talon_core::{MoveType, PieceKind, Position, Square};

    fn e2e4() -> Move {
        Move::new(Square::E2, Square::E4, PieceKind::Pawn, false, false, MoveType::Normal)
    }

    #[test]
    fn sizes_are_powers_of_two() {
        assert_eq!(TranspositionTable::new(1).size(), 1 << 16);
        assert_eq!(TranspositionTable::new(3).size(), 1 << 17);
        assert_eq!(TranspositionTable::new(64).size(), 1 << 22);
    }

    #[test]
    fn store_and_lookup_roundtrip() {
        let mut tt = TranspositionTable::new(1);
        let pos = Position::startpos();
        assert!(tt.lookup(pos.key(), 0).is_none());

        tt.store(pos.key(), NodeType::Exact, DEPTH_QS_NO_CHECKS, e2e4(), -100, 456, 0);
        let entry = tt.lookup(pos.key(), 0).unwrap();
        assert_eq!(entry.mv, e2e4());
        assert_eq!(entry.node_type, NodeType::Exact);
        assert_eq!(entry.depth, -1);
        assert_eq!(entry.score, -100);
        assert_eq!(entry.eval, 456);
        assert_eq!(entry.generation, 0);
        assert_eq!(tt.hashfull(), 0);
    }

    #[test]
    fn mate_scores_are_rebased_to_the_probing_ply() {
        let mut tt = TranspositionTable::new(1);
        let pos: Position = "8/7K/8/8/8/8/R7/7k w - - 0 1".parse().unwrap();
        let a2f2 = Move::new(Square::A2, Square::F2, PieceKind::Rook, false, false, MoveType::Normal);

        tt.store(pos.key(), NodeType::FailHigh, 1, a2f2, MATE - 8, 0, 4);
        let entry = tt.lookup(pos.key(), 1).unwrap();
        assert_eq!(entry.mv, a2f2);
        assert_eq!(entry.score, MATE - 5);

        tt.store(pos.key(), NodeType::FailLow, 1, a2f2, -(MATE - 8), 0, 4);
        assert_eq!(tt.lookup(pos.key(), 1).unwrap().score, -(MATE - 5));
    }

    #[test]
    fn same_key_keeps_old_move_when_new_has_none() {
        let mut tt = TranspositionTable::new(1);
        let key = Position::startpos().key();
        tt.store(key, NodeType::FailHigh, 4, e2e4(), 30, 10, 0);
        tt.store(key, NodeType::FailLow, 5, Move::NONE, -20, 10, 0);
        let entry = tt.lookup(key, 0).unwrap();
        assert_eq!(entry.mv, e2e4());
        assert_eq!(entry.depth, 5);
        assert_eq!(entry.node_type, NodeType::FailLow);
    }

    #[test]
    fn exclusion_key_does_not_alias() {
        let mut tt = TranspositionTable::new(1);
        let pos = Position::startpos();
        tt.store(pos.exclusion_key(), NodeType::FailLow, 3, Move::NONE, 12, 0, 0);
        assert!(tt.lookup(pos.key(), 0).is_none());
        assert_eq!(tt.lookup(pos.exclusion_key(), 0).unwrap().score, 12);
    }

    #[test]
    fn replacement_evicts_least_important() {
        let mut tt = TranspositionTable::new(1);
        let key = Position::startpos().key();
        let run: Vec<usize> = tt.run(key).collect();
        for (n, &slot) in run.iter().enumerate() {
            let depth = if n == 1 { 2u64 } else { 9 };
            tt.keys[slot] = 1000 + slot as u64;
            tt.infos[slot] = ((NodeType::FailHigh as u64) << 21) | (depth << 40);
        }
        tt.store(key, NodeType::Exact, 1, e2e4(), 0, 0, 0);
        assert_eq!(tt.keys[run[1]], key.verification());
        assert_eq!(tt.lookup(key, 0).unwrap().mv, e2e4());
    }

    #[test]
    fn importance_weighs_bound_age_and_depth() {
        let mut tt = TranspositionTable::new(1);
        let key = Position::startpos().key();
        tt.store(key, NodeType::Exact, 6, e2e4(), 0, 0, 0);
        let slot = tt.run(key).find(|&i| tt.keys[i] == key.verification()).unwrap();
        assert_eq!(tt.importance(slot), 16);
        for _ in 0..10 {
            tt.new_generation();
        }
        assert_eq!(tt.importance(slot), 6);
        tt.store(key, NodeType::FailHigh, 6, e2e4(), 0, 0, 0);
        assert_eq!(tt.importance(slot), 6);
    }

    #[test]
    fn generation_wraps_and_clear_empties() {
        let mut tt = TranspositionTable::new(1);
        for _ in 0..256 {
            tt.new_generation();
        }
        assert_eq!(tt.generation(), 0);
        let key = Position::startpos().key();
        tt.store(key, NodeType::Exact, 3, e2e4(), 0, 0, 0);
        tt.clear();
        assert!(tt.lookup(key, 0).is_none());
        assert_eq!(tt.hashfull(), 0);
    }

    #[test]
    fn can_cut_respects_bounds() {
        let entry = |node_type, score| TtEntry {
            mv: Move::NONE,
            node_type,
            depth: 4,
            generation: 0,
            score,
            eval: 0,
        };
        assert!(entry(NodeType::Exact, 5).can_cut(4, -10, 10));
        assert!(!entry(NodeType::Exact, 5).can_cut(5, -10, 10));
        assert!(entry(NodeType::FailLow, -10).can_cut(3, -10, 10));
        assert!(!entry(NodeType::FailLow, -9).can_cut(3, -10, 10));
        assert!(entry(NodeType::FailHigh, 10).can_cut(3, -10, 10));
        assert!(!entry(NodeType::Eval, 0).can_cut(0, -10, 10));
    }
}
