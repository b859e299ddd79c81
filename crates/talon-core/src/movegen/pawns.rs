//! Pawn pushes, captures, promotions and en passant.

use crate::attacks::pawn_attacks;
use crate::chess_move::{Move, MoveType};
use crate::piece_kind::PieceKind;
use crate::position::Position;
use crate::square::Square;

use super::{GenType, MoveList};

pub(super) fn generate(pos: &Position, gen_type: GenType, list: &mut MoveList) {
    let us = pos.turn();
    let them = pos.side(!us);
    let empty = !pos.occupied();

    for from in pos.pieces_of(us, PieceKind::Pawn) {
        let Some(to) = from.forward(us) else {
            continue;
        };
        let promoting = to.relative_rank(us) == 7;

        if empty.contains(to) {
            if promoting {
                if gen_type.tactical() {
                    push_promotions(list, from, to, false);
                }
            } else if gen_type.quiet() {
                list.push(Move::new(from, to, PieceKind::Pawn, false, false, MoveType::Normal));
                if from.relative_rank(us) == 1 {
                    if let Some(double) = to.forward(us).filter(|sq| empty.contains(*sq)) {
                        list.push(Move::new(from, double, PieceKind::Pawn, false, false, MoveType::Normal));
                    }
                }
            }
        }

        if !gen_type.tactical() {
            continue;
        }
        let attacks = pawn_attacks(us, from);
        for to in attacks & them {
            if promoting {
                push_promotions(list, from, to, true);
            } else {
                list.push(Move::new(from, to, PieceKind::Pawn, true, false, MoveType::Normal));
            }
        }
        if let Some(ep) = pos.en_passant().filter(|ep| attacks.contains(*ep)) {
            list.push(Move::new(from, ep, PieceKind::Pawn, true, false, MoveType::EnPassant));
        }
    }
}

fn push_promotions(list: &mut MoveList, from: Square, to: Square, capture: bool) {
    for move_type in MoveType::PROMOTIONS {
        list.push(Move::new(from, to, PieceKind::Pawn, capture, false, move_type));
    }
}
