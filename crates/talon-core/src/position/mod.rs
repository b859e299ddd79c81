//! The game position: bitboards, flags, two-word key and a ply-indexed history
//! that makes every [`Position::apply`] reversible in O(1).

mod apply;
mod draw;
mod fen;
mod see;

use std::fmt;

use crate::attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks};
use crate::bitboard::Bitboard;
use crate::castling::{CastleRights, CastleSide};
use crate::chess_move::Move;
use crate::color::Color;
use crate::error::BoardError;
use crate::piece_kind::PieceKind;
use crate::square::Square;
use crate::zobrist::Key;

pub use draw::GameState;
pub use fen::STARTING_FEN;
pub use see::SEE_VALUES;

/// History slots reserved up front; games longer than this still work.
pub const HISTORY_CAPACITY: usize = 1024;

/// Everything a move can change, snapshotted once per ply.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct State {
    pub(crate) kinds: [Bitboard; PieceKind::COUNT],
    pub(crate) sides: [Bitboard; Color::COUNT],
    pub(crate) turn: Color,
    pub(crate) castling: CastleRights,
    pub(crate) ep: Option<Square>,
    pub(crate) check: bool,
    pub(crate) fifty: u16,
    pub(crate) key: Key,
}

impl State {
    const EMPTY: State = State {
        kinds: [Bitboard::EMPTY; PieceKind::COUNT],
        sides: [Bitboard::EMPTY; Color::COUNT],
        turn: Color::White,
        castling: CastleRights::NONE,
        ep: None,
        check: false,
        fifty: 0,
        key: Key::EMPTY,
    };

    /// Flip one piece on or off, keeping the key in step.
    #[inline]
    pub(crate) fn toggle(&mut self, color: Color, kind: PieceKind, sq: Square) {
        let bb = sq.bitboard();
        self.kinds[kind.index()] ^= bb;
        self.sides[color.index()] ^= bb;
        self.key.toggle_piece(color, kind, sq);
    }

    #[inline]
    pub(crate) fn occupied(&self) -> Bitboard {
        self.sides[0] | self.sides[1]
    }

    pub(crate) fn kind_on(&self, sq: Square) -> Option<PieceKind> {
        if !self.occupied().contains(sq) {
            return None;
        }
        PieceKind::ALL.into_iter().find(|k| self.kinds[k.index()].contains(sq))
    }

    /// Key recomputed from the board contents alone.
    pub(crate) fn compute_key(&self) -> Key {
        let mut key = Key::EMPTY;
        for color in Color::ALL {
            for kind in PieceKind::ALL {
                for sq in self.kinds[kind.index()] & self.sides[color.index()] {
                    key.toggle_piece(color, kind, sq);
                }
            }
        }
        if self.turn == Color::Black {
            key.toggle_turn();
        }
        key.toggle_castling(self.castling.bits());
        if let Some(ep) = self.ep {
            key.toggle_en_passant(!self.turn, ep.file());
        }
        key
    }
}

#[derive(Clone, Copy, Debug)]
struct Undo {
    state: State,
    mv: Move,
}

/// A mutable game position.
///
/// Mutated only through matched [`Position::apply`] / [`Position::rollback`]
/// pairs (or a fresh FEN import).
#[derive(Clone)]
pub struct Position {
    state: State,
    history: Vec<Undo>,
    /// Rook origin per castling slot (`WK`, `WQ`, `BK`, `BQ`).
    castling_rooks: [Square; 4],
    chess960: bool,
    /// Game ply of the imported FEN; `ply()` counts on from here.
    start_ply: u32,
}

impl Position {
    /// The standard initial position.
    pub fn startpos() -> Position {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut pos = Position::empty();
        for (file, kind) in BACK_RANK.into_iter().enumerate() {
            let file = file as u8;
            pos.state.toggle(Color::White, kind, Square::new(0, file));
            pos.state.toggle(Color::White, PieceKind::Pawn, Square::new(1, file));
            pos.state.toggle(Color::Black, PieceKind::Pawn, Square::new(6, file));
            pos.state.toggle(Color::Black, kind, Square::new(7, file));
        }
        pos.state.castling = CastleRights::ALL;
        pos.state.key = pos.state.compute_key();
        pos
    }

    fn empty() -> Position {
        Position {
            state: State::EMPTY,
            history: Vec::with_capacity(HISTORY_CAPACITY),
            castling_rooks: [Square::H1, Square::A1, Square::H8, Square::A8],
            chess960: false,
            start_ply: 0,
        }
    }

    // --- Board queries ------------------------------------------------

    #[inline]
    pub fn pieces(&self, kind: PieceKind) -> Bitboard {
        self.state.kinds[kind.index()]
    }

    #[inline]
    pub fn side(&self, color: Color) -> Bitboard {
        self.state.sides[color.index()]
    }

    #[inline]
    pub fn pieces_of(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.pieces(kind) & self.side(color)
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.state.occupied()
    }

    pub fn kind_on(&self, sq: Square) -> Option<PieceKind> {
        self.state.kind_on(sq)
    }

    pub fn color_on(&self, sq: Square) -> Option<Color> {
        Color::ALL.into_iter().find(|c| self.side(*c).contains(sq))
    }

    pub fn piece_on(&self, sq: Square) -> Option<(Color, PieceKind)> {
        Some((self.color_on(sq)?, self.kind_on(sq)?))
    }

    /// King square; a1 for a side without a king, which only invalid
    /// positions produce.
    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.pieces_of(color, PieceKind::King).lsb().unwrap_or(Square::A1)
    }

    /// Knights, bishops, rooks and queens of `color`.
    #[inline]
    pub fn non_pawn_material(&self, color: Color) -> Bitboard {
        self.side(color) & !(self.pieces(PieceKind::Pawn) | self.pieces(PieceKind::King))
    }

    #[inline]
    pub fn turn(&self) -> Color {
        self.state.turn
    }

    #[inline]
    pub fn castling(&self) -> CastleRights {
        self.state.castling
    }

    /// Origin square of the rook for a castling right.
    #[inline]
    pub fn castling_rook(&self, color: Color, side: CastleSide) -> Square {
        self.castling_rooks[CastleRights::slot(color, side)]
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.state.ep
    }

    /// Side to move is in check.
    #[inline]
    pub fn is_check(&self) -> bool {
        self.state.check
    }

    #[inline]
    pub fn fifty(&self) -> u16 {
        self.state.fifty
    }

    #[inline]
    pub fn key(&self) -> Key {
        self.state.key
    }

    /// Key for a search that excludes one move at this node.
    #[inline]
    pub fn exclusion_key(&self) -> Key {
        self.state.key.excluded()
    }

    #[inline]
    pub fn is_chess960(&self) -> bool {
        self.chess960
    }

    /// Switch castling moves between `e1g1` and king-takes-rook encoding.
    pub fn set_chess960(&mut self, chess960: bool) {
        self.chess960 = chess960;
    }

    /// Game ply: 0 at the initial position, odd when black is to move.
    #[inline]
    pub fn ply(&self) -> u32 {
        self.start_ply + self.history.len() as u32
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.ply() / 2 + 1
    }

    /// Number of applied moves that can be rolled back.
    #[inline]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Most recent move applied (`NULL` for a pass), or `NONE` at the import point.
    pub fn last_move(&self) -> Move {
        self.history.last().map_or(Move::NONE, |undo| undo.mv)
    }

    /// Moves applied since the import point, oldest first, in coordinate form.
    pub fn moves_played(&self) -> Vec<String> {
        self.history.iter().map(|undo| undo.mv.to_uci()).collect()
    }

    // --- Attacks ------------------------------------------------------

    /// Pieces of both colours attacking `sq` through `occupied`.
    pub fn attackers_to(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let s = &self.state;
        let queens = s.kinds[PieceKind::Queen.index()];
        (pawn_attacks(Color::White, sq) & self.pieces_of(Color::Black, PieceKind::Pawn))
            | (pawn_attacks(Color::Black, sq) & self.pieces_of(Color::White, PieceKind::Pawn))
            | (knight_attacks(sq) & s.kinds[PieceKind::Knight.index()])
            | (king_attacks(sq) & s.kinds[PieceKind::King.index()])
            | (bishop_attacks(sq, occupied) & (s.kinds[PieceKind::Bishop.index()] | queens))
            | (rook_attacks(sq, occupied) & (s.kinds[PieceKind::Rook.index()] | queens))
    }

    /// `true` when `by` attacks `sq` on the current board.
    #[inline]
    pub fn is_attacked(&self, sq: Square, by: Color) -> bool {
        self.attackers_to(sq, self.occupied()).intersects(self.side(by))
    }

    /// A pawn of `color` on `sq` with no enemy pawn ahead on its own or
    /// adjacent files.
    pub fn is_passed_pawn(&self, sq: Square, color: Color) -> bool {
        let span = (Bitboard::file(sq.file()) | Bitboard::adjacent_files(sq.file()))
            & Bitboard::ranks_ahead(color, sq.rank());
        !span.intersects(self.pieces_of(!color, PieceKind::Pawn))
    }

    // --- Validation ---------------------------------------------------

    /// Structural sanity check of the board.
    pub fn validate(&self) -> Result<(), BoardError> {
        let s = &self.state;
        for color in Color::ALL {
            let count = self.pieces_of(color, PieceKind::King).count();
            if count != 1 {
                return Err(BoardError::InvalidKingCount { color, count });
            }
        }
        if self.pieces(PieceKind::Pawn).intersects(Bitboard::BACK_RANKS) {
            return Err(BoardError::PawnsOnBackRank);
        }
        let mut union = Bitboard::EMPTY;
        for bb in s.kinds {
            if union.intersects(bb) {
                return Err(BoardError::OverlappingPieces);
            }
            union |= bb;
        }
        if s.sides[0].intersects(s.sides[1]) {
            return Err(BoardError::InconsistentSides);
        }
        if union != s.occupied() {
            return Err(BoardError::InconsistentOccupied);
        }
        let mover = !s.turn;
        if self.is_attacked(self.king_square(mover), s.turn) {
            return Err(BoardError::OpponentInCheck { color: mover });
        }
        Ok(())
    }

    /// Debug check: the incremental key equals a recomputation.
    #[inline]
    pub(crate) fn debug_check_key(&self) {
        debug_assert_eq!(self.state.key, self.state.compute_key(), "incremental key drifted");
    }

    /// Same pieces, side, rights and en passant, ignoring history.
    fn same_board(&self, other: &Position) -> bool {
        let (a, b) = (&self.state, &other.state);
        a.kinds == b.kinds
            && a.sides == b.sides
            && a.turn == b.turn
            && a.castling == b.castling
            && a.ep == b.ep
    }
}

impl Default for Position {
    fn default() -> Position {
        Position::startpos()
    }
}

impl PartialEq for Position {
    /// Equal boards, flags and counters; history is not compared.
    fn eq(&self, other: &Position) -> bool {
        self.state == other.state && self.castling_rooks == other.castling_rooks
    }
}

impl Eq for Position {}

impl fmt::Display for Position {
    /// An 8x8 diagram followed by the FEN.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0u8..8).rev() {
            write!(f, "{}  ", rank + 1)?;
            for file in 0u8..8 {
                let c = match self.piece_on(Square::new(rank, file)) {
                    Some((Color::White, kind)) => kind.fen_char().to_ascii_uppercase(),
                    Some((Color::Black, kind)) => kind.fen_char(),
                    None => '.',
                };
                write!(f, "{c}")?;
                if file < 7 {
                    f.write_str(" ")?;
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "   a b c d e f g h")?;
        write!(f, "\nFen: {}", self.to_fen())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position(\"{}\")", self.to_fen())
    }
}
