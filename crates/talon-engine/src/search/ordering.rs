//! Staged move ordering.
//!
//! [`MovePicker`] hands out the moves of one node in the order the search
//! wants to try them: the transposition-table move first, then captures
//! split by static exchange into good and equal ones, then up to four
//! killers, then quiet moves by history, and losing captures last. Moves
//! are generated lazily, captures before quiets, so a cutoff on an early
//! move never pays for the quiet generation.

use talon_core::movegen::{self, MAX_MOVES};
use talon_core::{AnalysisCache, GenType, Move, MoveType, PieceKind, Position};

use crate::search::heuristics::HistoryTable;

/// Victim values for MVV/LVA, indexed by [`PieceKind::index`].
const VICTIM: [i32; PieceKind::COUNT] = [100, 325, 330, 500, 975, 10_000];

/// Attacker values for MVV/LVA, indexed by [`PieceKind::index`].
const AGGRESSOR: [i32; PieceKind::COUNT] = [10, 32, 33, 50, 97, 99];

const SCORE_PROMOTE_QUEEN: i32 = 975;
const SCORE_UNDERPROMOTION: i32 = i32::MIN + 1;
const SCORE_TAKEN: i32 = i32::MIN;

/// Marker for an exchange value not computed yet.
const SEE_UNKNOWN: i32 = i16::MAX as i32;

/// Which moves a node asks for. Check evasions always get every move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickMode {
    All,
    /// Non-losing captures and queen promotions.
    CapturesPromos,
    /// As above, plus non-losing quiet checks.
    CapturesPromosChecks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Tt,
    GenCaptures,
    GoodCaptures,
    EqualCaptures,
    GenQuiets,
    Killer(usize),
    Quiets,
    BadCaptures,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Good,
    Equal,
    Quiet,
    Bad,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    mv: Move,
    score: i32,
    see: i32,
    bucket: Bucket,
}

const EMPTY_ENTRY: Entry = Entry {
    mv: Move::NONE,
    score: SCORE_TAKEN,
    see: SEE_UNKNOWN,
    bucket: Bucket::Quiet,
};

/// Per-node move supplier. Never yields the same move twice.
pub struct MovePicker {
    phase: Phase,
    mode: PickMode,
    in_check: bool,
    tt_move: Move,
    killers: [Move; 4],
    found_killers: [Move; 4],
    entries: [Entry; MAX_MOVES],
    len: usize,
    last_move: Move,
    last_see: i32,
    last_score: i32,
    last_is_killer: bool,
}

impl MovePicker {
    /// `killers` holds this ply's two killers followed by the two from two
    /// plies back; pass [`Move::NONE`] for absent slots.
    pub fn new(tt_move: Move, mode: PickMode, killers: [Move; 4], in_check: bool) -> MovePicker {
        MovePicker {
            phase: Phase::Tt,
            mode,
            in_check,
            tt_move: if tt_move.is_some() { tt_move } else { Move::NONE },
            killers,
            found_killers: [Move::NONE; 4],
            entries: [EMPTY_ENTRY; MAX_MOVES],
            len: 0,
            last_move: Move::NONE,
            last_see: SEE_UNKNOWN,
            last_score: 0,
            last_is_killer: false,
        }
    }

    /// The next move to try, or `None` once the node is exhausted.
    ///
    /// `pos` must be the node's position and `cache` built for it; both are
    /// left as they were.
    pub fn next(&mut self, pos: &mut Position, cache: &AnalysisCache, history: &HistoryTable) -> Option<Move> {
        loop {
            match self.phase {
                Phase::Tt => {
                    self.phase = Phase::GenCaptures;
                    if self.tt_move.is_some() && self.accepts_tt_move(pos) {
                        let mv = self.tt_move;
                        self.last_move = mv;
                        self.last_see = SEE_UNKNOWN;
                        self.last_score = 0;
                        return Some(mv);
                    }
                    self.tt_move = Move::NONE;
                }
                Phase::GenCaptures => {
                    self.generate(pos, cache, history, GenType::Tactical);
                    self.phase = Phase::GoodCaptures;
                }
                Phase::GoodCaptures => {
                    if let Some(mv) = self.pick(Bucket::Good) {
                        return Some(mv);
                    }
                    self.phase = Phase::EqualCaptures;
                }
                Phase::EqualCaptures => {
                    if let Some(mv) = self.pick(Bucket::Equal) {
                        return Some(mv);
                    }
                    self.phase = Phase::GenQuiets;
                }
                Phase::GenQuiets => {
                    if !self.in_check && self.mode == PickMode::CapturesPromos {
                        self.phase = Phase::End;
                        return None;
                    }
                    self.generate(pos, cache, history, GenType::Quiet);
                    self.phase = Phase::Killer(0);
                }
                Phase::Killer(slot) => {
                    self.phase = if slot + 1 < self.killers.len() { Phase::Killer(slot + 1) } else { Phase::Quiets };
                    self.last_is_killer = true;
                    let mv = self.found_killers[slot];
                    if mv.is_some() {
                        self.last_move = mv;
                        self.last_see = SEE_UNKNOWN;
                        return Some(mv);
                    }
                }
                Phase::Quiets => {
                    self.last_is_killer = false;
                    if let Some(mv) = self.pick(Bucket::Quiet) {
                        return Some(mv);
                    }
                    self.phase = Phase::BadCaptures;
                }
                Phase::BadCaptures => {
                    if let Some(mv) = self.pick(Bucket::Bad) {
                        return Some(mv);
                    }
                    self.phase = Phase::End;
                    return None;
                }
                Phase::End => return None,
            }
        }
    }

    /// Static exchange value of the move last returned, computed on demand.
    pub fn last_see(&mut self, pos: &Position) -> i32 {
        if self.last_see == SEE_UNKNOWN {
            self.last_see = pos.see(self.last_move);
        }
        self.last_see
    }

    /// Ordering score of the move last returned; history for quiet moves.
    pub fn last_score(&self) -> i32 {
        self.last_score
    }

    /// Whether the move last returned came from a killer slot.
    pub fn last_is_killer(&self) -> bool {
        self.last_is_killer
    }

    pub fn in_check(&self) -> bool {
        self.in_check
    }

    /// Replaces the hash move by its annotated legal form, or refuses it.
    fn accepts_tt_move(&mut self, pos: &mut Position) -> bool {
        if !pos.pieces_of(pos.turn(), self.tt_move.piece()).contains(self.tt_move.from()) {
            return false;
        }
        let Some(mv) = movegen::annotate(pos, self.tt_move) else {
            return false;
        };
        self.tt_move = mv;
        if self.in_check || self.mode == PickMode::All || mv.move_type() == MoveType::PromoteQueen {
            return true;
        }
        let wanted = match self.mode {
            PickMode::CapturesPromos => mv.is_capture(),
            _ => mv.is_capture() || mv.is_check(),
        };
        wanted && pos.see(mv) >= 0
    }

    fn generate(&mut self, pos: &mut Position, cache: &AnalysisCache, history: &HistoryTable, gen_type: GenType) {
        let moves = movegen::generate_legal(pos, gen_type);
        for &mv in moves.iter() {
            self.add(pos, cache, history, mv);
        }
    }

    fn add(&mut self, pos: &Position, cache: &AnalysisCache, history: &HistoryTable, mv: Move) {
        let capture = mv.is_capture();
        let queen_promo = mv.move_type() == MoveType::PromoteQueen;
        let underpromotion = mv.promotion().is_some() && !queen_promo;

        if self.mode == PickMode::CapturesPromosChecks && !self.in_check && !mv.is_check() && !capture && !queen_promo {
            return;
        }
        if mv.same_as(self.tt_move) {
            return;
        }
        if !capture {
            if let Some(slot) = self.killers.iter().position(|k| k.is_some() && k.same_as(mv)) {
                self.found_killers[slot] = mv;
                return;
            }
        }

        let see = if capture || (self.mode == PickMode::CapturesPromosChecks && mv.is_check()) {
            cache.see_fast(pos, mv)
        } else {
            SEE_UNKNOWN
        };

        if self.mode != PickMode::All && !self.in_check && see < 0 {
            return;
        }

        let entry = if capture && see < 0 {
            Entry { mv, score: see, see, bucket: Bucket::Bad }
        } else if (capture || queen_promo) && !underpromotion {
            let mut score = 0;
            if capture {
                let victim = if mv.is_en_passant() { Some(PieceKind::Pawn) } else { pos.kind_on(mv.to()) };
                score = victim.map_or(0, |v| VICTIM[v.index()]) - AGGRESSOR[mv.piece().index()];
            }
            if queen_promo {
                score += SCORE_PROMOTE_QUEEN;
            }
            let bucket = if see > 0 || queen_promo { Bucket::Good } else { Bucket::Equal };
            Entry { mv, score, see, bucket }
        } else {
            let score = if underpromotion { SCORE_UNDERPROMOTION } else { history.score(mv) };
            Entry { mv, score, see, bucket: Bucket::Quiet }
        };

        if self.len < MAX_MOVES {
            self.entries[self.len] = entry;
            self.len += 1;
        }
    }

    /// Highest-scored untaken move of `bucket`; ties go to the earliest.
    fn pick(&mut self, bucket: Bucket) -> Option<Move> {
        let mut best: Option<usize> = None;
        let mut best_score = SCORE_TAKEN;
        for (i, entry) in self.entries[..self.len].iter().enumerate() {
            if entry.bucket == bucket && entry.score > best_score {
                best_score = entry.score;
                best = Some(i);
            }
        }
        let i = best?;
        let entry = &mut self.entries[i];
        self.last_move = entry.mv;
        self.last_see = entry.see;
        self.last_score = entry.score;
        entry.score = SCORE_TAKEN;
        Some(entry.mv)
    }
}
