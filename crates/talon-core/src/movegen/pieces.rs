//! Knight, slider and king steps.

use crate::attacks::attacks_from;
use crate::bitboard::Bitboard;
use crate::chess_move::{Move, MoveType};
use crate::piece_kind::PieceKind;
use crate::position::Position;

use super::{GenType, MoveList};

const KINDS: [PieceKind; 5] = [
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Rook,
    PieceKind::Queen,
    PieceKind::King,
];

pub(super) fn generate(pos: &Position, gen_type: GenType, list: &mut MoveList) {
    let us = pos.turn();
    let occupied = pos.occupied();
    let them = pos.side(!us);
    let targets = match gen_type {
        GenType::All => !pos.side(us),
        GenType::Tactical => them,
        GenType::Quiet => !occupied,
    };
    // Never offer a king capture.
    let targets = targets & !pos.pieces(PieceKind::King);

    for kind in KINDS {
        for from in pos.pieces_of(us, kind) {
            let reach: Bitboard = attacks_from(kind, us, from, occupied) & targets;
            for to in reach {
                list.push(Move::new(from, to, kind, them.contains(to), false, MoveType::Normal));
            }
        }
    }
}
