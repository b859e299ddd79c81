//! Reversible move application.

use crate::attacks::pawn_attacks;
use crate::castling::{CastleRights, CastleSide};
use crate::chess_move::{Move, MoveType};
use crate::piece_kind::PieceKind;
use crate::square::Square;

use super::{Position, Undo};

impl Position {
    /// Play `mv` for the side to move.
    ///
    /// Returns `false`, leaving the position untouched, when the move does not
    /// fit the board or would leave the mover's king attacked. On success the
    /// check flag reflects the new side to move.
    pub fn apply(&mut self, mv: Move) -> bool {
        if mv.is_null() {
            self.apply_null();
            return true;
        }
        if mv.is_none() {
            return false;
        }

        let us = self.state.turn;
        let them = !us;
        let (from, to) = (mv.from(), mv.to());
        let piece = mv.piece();

        if !self.pieces_of(us, piece).contains(from) {
            return false;
        }

        self.history.push(Undo { state: self.state, mv });
        let ok = match mv.move_type() {
            MoveType::CastleKing => self.apply_castle(from, CastleSide::King),
            MoveType::CastleQueen => self.apply_castle(from, CastleSide::Queen),
            _ => self.apply_ordinary(mv, from, to, piece),
        };
        if !ok {
            self.rollback();
            return false;
        }

        let st = &mut self.state;
        st.turn = them;
        st.key.toggle_turn();

        if self.is_attacked(self.king_square(us), them) {
            self.rollback();
            return false;
        }
        self.state.check = self.is_attacked(self.king_square(them), us);
        self.debug_check_key();
        true
    }

    /// Clear the en-passant square and bump the fifty-move counter: the part
    /// every move, including a pass, shares.
    fn begin_ply(&mut self) {
        let st = &mut self.state;
        if let Some(ep) = st.ep.take() {
            st.key.toggle_en_passant(!st.turn, ep.file());
        }
        st.fifty = st.fifty.saturating_add(1);
    }

    fn apply_ordinary(&mut self, mv: Move, from: Square, to: Square, piece: PieceKind) -> bool {
        let us = self.state.turn;
        let them = !us;

        if self.side(us).contains(to) {
            return false;
        }
        let victim_sq = if mv.is_en_passant() {
            if piece != PieceKind::Pawn || self.state.ep != Some(to) {
                return false;
            }
            Square::new(from.rank(), to.file())
        } else {
            to
        };
        let victim = if self.side(them).contains(victim_sq) {
            self.kind_on(victim_sq)
        } else {
            None
        };
        if victim.is_some() != mv.is_capture() || victim == Some(PieceKind::King) {
            return false;
        }
        let promotion = mv.promotion();
        if promotion.is_some() != (piece == PieceKind::Pawn && to.relative_rank(us) == 7) {
            return false;
        }

        self.begin_ply();
        let old_rights = self.state.castling;
        let st = &mut self.state;

        if let Some(kind) = victim {
            st.toggle(them, kind, victim_sq);
        }
        st.toggle(us, piece, from);
        st.toggle(us, promotion.unwrap_or(piece), to);

        if victim.is_some() || piece == PieceKind::Pawn {
            st.fifty = 0;
        }

        // Only record an en-passant square an enemy pawn can actually use.
        if piece == PieceKind::Pawn && from.index().abs_diff(to.index()) == 16 {
            let ep = Square::new((from.rank() + to.rank()) / 2, from.file());
            let takers = pawn_attacks(us, ep) & st.kinds[PieceKind::Pawn.index()] & st.sides[them.index()];
            if takers.is_nonempty() {
                st.ep = Some(ep);
                st.key.toggle_en_passant(us, ep.file());
            }
        }

        let mut rights = old_rights;
        if piece == PieceKind::King {
            rights = rights.without_color(us);
        }
        for color in [us, them] {
            for side in CastleSide::ALL {
                let rook = self.castling_rook(color, side);
                if rights.has(color, side) && (rook == from || rook == to) {
                    rights = rights.without(color, side);
                }
            }
        }
        self.set_castling(rights);
        true
    }

    fn apply_castle(&mut self, king_from: Square, side: CastleSide) -> bool {
        let us = self.state.turn;
        if !self.state.castling.has(us, side) || self.king_square(us) != king_from {
            return false;
        }
        let rook_from = self.castling_rook(us, side);
        if !self.pieces_of(us, PieceKind::Rook).contains(rook_from) {
            return false;
        }

        self.begin_ply();
        let st = &mut self.state;
        // Lift both pieces first: in Chess960 either target may be the
        // other piece's origin.
        st.toggle(us, PieceKind::King, king_from);
        st.toggle(us, PieceKind::Rook, rook_from);
        st.toggle(us, PieceKind::King, side.king_target(us));
        st.toggle(us, PieceKind::Rook, side.rook_target(us));

        let rights = self.state.castling.without_color(us);
        self.set_castling(rights);
        true
    }

    fn set_castling(&mut self, rights: CastleRights) {
        let st = &mut self.state;
        st.key.toggle_castling(st.castling.lost_since(rights) | rights.lost_since(st.castling));
        st.castling = rights;
    }

    /// Pass the turn. Never fails; undone by [`Position::rollback`].
    pub fn apply_null(&mut self) {
        self.history.push(Undo { state: self.state, mv: Move::NULL });
        self.begin_ply();
        let st = &mut self.state;
        st.turn = !st.turn;
        st.key.toggle_turn();
        st.check = false;
        self.debug_check_key();
    }

    /// Undo the most recent [`Position::apply`] or [`Position::apply_null`].
    pub fn rollback(&mut self) {
        debug_assert!(!self.history.is_empty(), "rollback without a matching apply");
        if let Some(undo) = self.history.pop() {
            self.state = undo.state;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::chess_move::{Move, MoveType};
    use crate::color::Color;
    use crate::piece_kind::PieceKind;
    use crate::position::Position;
    use crate::square::Square;

    fn quiet(from: Square, to: Square, piece: PieceKind) -> Move {
        Move::new(from, to, piece, false, false, MoveType::Normal)
    }

    #[test]
    fn apply_and_rollback_restore_everything() {
        let mut pos = Position::startpos();
        let before = pos.clone();
        assert!(pos.apply(quiet(Square::E2, Square::E4, PieceKind::Pawn)));
        assert_eq!(pos.turn(), Color::Black);
        assert_eq!(pos.kind_on(Square::E4), Some(PieceKind::Pawn));
        // No black pawn can take on e3, so no en-passant square.
        assert_eq!(pos.en_passant(), None);
        assert_eq!(pos.ply(), 1);
        pos.rollback();
        assert_eq!(pos, before);
        assert_eq!(pos.key(), before.key());
    }

    #[test]
    fn rejects_wrong_side_and_bad_flags() {
        let mut pos = Position::startpos();
        assert!(!pos.apply(quiet(Square::E7, Square::E5, PieceKind::Pawn)));
        assert!(!pos.apply(quiet(Square::E2, Square::E4, PieceKind::Knight)));
        assert!(!pos.apply(Move::new(Square::E2, Square::E4, PieceKind::Pawn, true, false, MoveType::Normal)));
        assert!(!pos.apply(Move::NONE));
        assert_eq!(pos.history_len(), 0);
    }

    #[test]
    fn illegal_move_is_rolled_back() {
        // The e2 knight is pinned by the e8 rook.
        let mut pos: Position = "4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1".parse().unwrap();
        let before = pos.clone();
        assert!(!pos.apply(quiet(Square::E2, Square::C3, PieceKind::Knight)));
        assert_eq!(pos, before);
        assert_eq!(pos.history_len(), 0);
    }

    #[test]
    fn en_passant_square_and_capture() {
        let mut pos: Position = "4k3/8/8/8/3p4/8/4P3/4K3 w - - 0 1".parse().unwrap();
        assert!(pos.apply(quiet(Square::E2, Square::E4, PieceKind::Pawn)));
        assert_eq!(pos.en_passant(), Some(Square::E3));
        let ep = Move::new(Square::D4, Square::E3, PieceKind::Pawn, true, false, MoveType::EnPassant);
        assert!(pos.apply(ep));
        assert_eq!(pos.kind_on(Square::E4), None);
        assert_eq!(pos.kind_on(Square::E3), Some(PieceKind::Pawn));
        assert_eq!(pos.fifty(), 0);
        pos.rollback();
        pos.rollback();
        assert_eq!(pos, "4k3/8/8/8/3p4/8/4P3/4K3 w - - 0 1".parse().unwrap());
    }

    #[test]
    fn castling_moves_rook_and_drops_rights() {
        let mut pos: Position = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".parse().unwrap();
        let castle = Move::new(Square::E1, Square::G1, PieceKind::King, false, false, MoveType::CastleKing);
        assert!(pos.apply(castle));
        assert_eq!(pos.kind_on(Square::G1), Some(PieceKind::King));
        assert_eq!(pos.kind_on(Square::F1), Some(PieceKind::Rook));
        assert_eq!(pos.kind_on(Square::H1), None);
        assert_eq!(pos.castling().to_string(), "kq");
    }

    #[test]
    fn rook_capture_revokes_opponent_right() {
        let mut pos: Position = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".parse().unwrap();
        let take = Move::new(Square::H1, Square::H8, PieceKind::Rook, true, true, MoveType::Normal);
        assert!(pos.apply(take));
        assert_eq!(pos.castling().to_string(), "Qq");
        assert!(pos.is_check());
    }

    #[test]
    fn promotion_replaces_pawn() {
        let mut pos: Position = "8/4P1k1/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let promo = Move::new(Square::E7, Square::E8, PieceKind::Pawn, false, false, MoveType::PromoteKnight);
        assert!(pos.apply(promo));
        assert_eq!(pos.kind_on(Square::E8), Some(PieceKind::Knight));
        assert_eq!(pos.pieces(PieceKind::Pawn).count(), 0);
        assert!(!pos.apply(quiet(Square::G7, Square::G7, PieceKind::King)));
    }

    #[test]
    fn null_move_flips_turn_and_clears_en_passant() {
        let mut pos: Position = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2".parse().unwrap();
        let key = pos.key();
        pos.apply_null();
        assert_eq!(pos.turn(), Color::Black);
        assert_eq!(pos.en_passant(), None);
        assert_eq!(pos.last_move(), Move::NULL);
        pos.rollback();
        assert_eq!(pos.key(), key);
        assert_eq!(pos.en_passant(), Some(Square::D6));
    }
}
