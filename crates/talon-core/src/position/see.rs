//! Static exchange evaluation.

use crate::attacks::{bishop_attacks, rook_attacks};
use crate::bitboard::Bitboard;
use crate::chess_move::Move;
use crate::piece_kind::PieceKind;
use crate::square::Square;

use super::Position;

/// Exchange values indexed by [`PieceKind::index`].
pub const SEE_VALUES: [i32; PieceKind::COUNT] = [100, 325, 330, 500, 900, 9999];

impl Position {
    /// Net material won by `mv` if both sides keep recapturing on its
    /// destination with their least valuable attacker and may stop at any
    /// point. Castling and sentinels score 0.
    pub fn see(&self, mv: Move) -> i32 {
        if !mv.is_some() || mv.is_castle() {
            return 0;
        }
        let (from, to) = (mv.from(), mv.to());
        let victim = if mv.is_en_passant() {
            Some(PieceKind::Pawn)
        } else {
            self.kind_on(to)
        };
        let mut occupied = self.occupied();
        if mv.is_en_passant() {
            occupied = occupied.without(Square::new(from.rank(), to.file()));
        }
        self.exchange(from, to, mv.piece(), victim, occupied)
    }

    fn exchange(
        &self,
        from: Square,
        to: Square,
        piece: PieceKind,
        victim: Option<PieceKind>,
        mut occupied: Bitboard,
    ) -> i32 {
        let diagonal = self.pieces(PieceKind::Bishop) | self.pieces(PieceKind::Queen);
        let straight = self.pieces(PieceKind::Rook) | self.pieces(PieceKind::Queen);

        let mut gain = [0i32; 32];
        gain[0] = victim.map_or(0, |v| SEE_VALUES[v.index()]);
        let mut attackers = self.attackers_to(to, occupied);
        let mut side = self.color_on(from).unwrap_or(self.turn());
        let mut piece = piece;
        let mut from_bb = from.bitboard();
        let mut depth = 0;

        loop {
            depth += 1;
            gain[depth] = SEE_VALUES[piece.index()] - gain[depth - 1];
            occupied ^= from_bb;
            attackers ^= from_bb;
            // Sliders behind the piece that just captured join in.
            attackers |= (bishop_attacks(to, occupied) & diagonal) | (rook_attacks(to, occupied) & straight);
            attackers &= occupied;

            side = !side;
            match self.least_valuable(attackers & self.side(side)) {
                Some((kind, bb)) if depth < gain.len() - 1 => {
                    piece = kind;
                    from_bb = bb;
                }
                _ => break,
            }
        }

        while depth > 1 {
            depth -= 1;
            gain[depth - 1] = -(-gain[depth - 1]).max(gain[depth]);
        }
        gain[0]
    }

    fn least_valuable(&self, attackers: Bitboard) -> Option<(PieceKind, Bitboard)> {
        PieceKind::ALL.into_iter().find_map(|kind| {
            let bb = attackers & self.pieces(kind);
            bb.is_nonempty().then(|| (kind, bb.isolate_lsb()))
        })
    }

    /// [`Position::see`] for a move written as two squares; the piece and
    /// capture are read from the board.
    pub fn see_squares(&self, from: Square, to: Square) -> i32 {
        let Some(piece) = self.kind_on(from) else {
            return 0;
        };
        let mut occupied = self.occupied();
        let mut victim = self.kind_on(to);
        if piece == PieceKind::Pawn && self.en_passant() == Some(to) {
            victim = Some(PieceKind::Pawn);
            occupied = occupied.without(Square::new(from.rank(), to.file()));
        }
        self.exchange(from, to, piece, victim, occupied)
    }
}
