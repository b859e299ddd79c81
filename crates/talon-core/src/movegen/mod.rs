//! Move generation: pseudo-legal candidates per piece kind, then a legality
//! filter that plays each candidate and keeps the ones that stand.

mod castling;
mod pawns;
mod pieces;

use crate::chess_move::Move;
use crate::position::Position;

/// Which moves to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenType {
    All,
    /// Captures (en passant included) and every promotion.
    Tactical,
    /// Everything else, castling included.
    Quiet,
}

impl GenType {
    #[inline]
    pub(crate) fn tactical(self) -> bool {
        self != GenType::Quiet
    }

    #[inline]
    pub(crate) fn quiet(self) -> bool {
        self != GenType::Tactical
    }
}

/// Upper bound on legal moves in any position is 218.
pub const MAX_MOVES: usize = 256;

/// Fixed-capacity move buffer that lives on the stack.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    len: usize,
}

impl MoveList {
    pub fn new() -> MoveList {
        MoveList { moves: [Move::NONE; MAX_MOVES], len: 0 }
    }

    #[inline]
    pub fn push(&mut self, mv: Move) {
        debug_assert!(self.len < MAX_MOVES);
        if self.len < MAX_MOVES {
            self.moves[self.len] = mv;
            self.len += 1;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.as_slice().iter()
    }

    /// First move equal to `mv` when check flags are ignored.
    pub fn find(&self, mv: Move) -> Option<Move> {
        self.iter().copied().find(|m| m.same_as(mv))
    }
}

impl Default for MoveList {
    fn default() -> MoveList {
        MoveList::new()
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter().map(|m| m.to_string())).finish()
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;
    #[inline]
    fn index(&self, index: usize) -> &Move {
        &self.as_slice()[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Candidates for the side to move; some may leave the king attacked.
pub fn generate_pseudo(pos: &Position, gen_type: GenType, list: &mut MoveList) {
    pawns::generate(pos, gen_type, list);
    pieces::generate(pos, gen_type, list);
    if gen_type.quiet() {
        castling::generate(pos, list);
    }
}

/// Play `mv`; if it is legal return it with its check flag set, restoring
/// the position either way.
pub fn annotate(pos: &mut Position, mv: Move) -> Option<Move> {
    if !pos.apply(mv) {
        return None;
    }
    let check = pos.is_check();
    pos.rollback();
    Some(mv.with_check(check))
}

/// Legal moves of the requested type, each with its check flag.
pub fn generate_legal(pos: &mut Position, gen_type: GenType) -> MoveList {
    let mut pseudo = MoveList::new();
    generate_pseudo(pos, gen_type, &mut pseudo);
    let mut legal = MoveList::new();
    for &mv in pseudo.iter() {
        if let Some(mv) = annotate(pos, mv) {
            legal.push(mv);
        }
    }
    legal
}

impl Position {
    pub fn legal_moves(&mut self) -> MoveList {
        generate_legal(self, GenType::All)
    }

    /// The legal move matching `mv` (check flag ignored), fully annotated,
    /// or [`Move::NONE`].
    pub fn legal_move(&mut self, mv: Move) -> Move {
        if !mv.is_some() {
            return Move::NONE;
        }
        self.legal_moves().find(mv).unwrap_or(Move::NONE)
    }
}
