//! Castling for both standard chess and Chess960.

use crate::attacks::between;
use crate::castling::CastleSide;
use crate::chess_move::{Move, MoveType};
use crate::piece_kind::PieceKind;
use crate::position::Position;

use super::MoveList;

pub(super) fn generate(pos: &Position, list: &mut MoveList) {
    let us = pos.turn();
    if pos.is_check() || pos.castling().is_empty() {
        return;
    }
    let king_from = pos.king_square(us);
    let occupied = pos.occupied();

    for side in CastleSide::ALL {
        if !pos.castling().has(us, side) {
            continue;
        }
        let rook_from = pos.castling_rook(us, side);
        if !pos.pieces_of(us, PieceKind::Rook).contains(rook_from) {
            continue;
        }
        let king_to = side.king_target(us);
        let rook_to = side.rook_target(us);

        let king_path = between(king_from, king_to) | king_to.bitboard();
        let rook_path = between(rook_from, rook_to) | rook_to.bitboard();
        let movers = king_from.bitboard() | rook_from.bitboard();
        if ((king_path | rook_path) & !movers).intersects(occupied) {
            continue;
        }
        // The rook is gone once the king travels, so it cannot shield.
        let without_rook = occupied.without(rook_from);
        let attacked = king_path
            .into_iter()
            .any(|sq| (pos.attackers_to(sq, without_rook) & pos.side(!us)).is_nonempty());
        if attacked {
            continue;
        }

        let to = if pos.is_chess960() { rook_from } else { king_to };
        let move_type = match side {
            CastleSide::King => MoveType::CastleKing,
            CastleSide::Queen => MoveType::CastleQueen,
        };
        list.push(Move::new(king_from, to, PieceKind::King, false, false, move_type));
    }
}
