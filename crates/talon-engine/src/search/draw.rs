//! Contempt: the score of a draw reached inside the search.

use talon_core::{PieceKind, Position};

const KNIGHT: i32 = 325;
const BISHOP: i32 = 325;
const ROOK: i32 = 500;
const QUEEN: i32 = 975;

/// Non-pawn material (both sides) at and above which contempt is full.
const MIDGAME_MATERIAL: i32 = 5400;
/// Non-pawn material at and below which contempt vanishes.
const ENDGAME_MATERIAL: i32 = 1475;

const PHASE_MIDGAME: i32 = 1000;

/// Game phase from non-pawn material: 1000 in the middlegame, 0 in the
/// endgame, linear between.
pub fn draw_phase(pos: &Position) -> i32 {
    let material = pos.pieces(PieceKind::Knight).count() as i32 * KNIGHT
        + pos.pieces(PieceKind::Bishop).count() as i32 * BISHOP
        + pos.pieces(PieceKind::Rook).count() as i32 * ROOK
        + pos.pieces(PieceKind::Queen).count() as i32 * QUEEN;
    if material >= MIDGAME_MATERIAL {
        PHASE_MIDGAME
    } else if material <= ENDGAME_MATERIAL {
        0
    } else {
        (material - ENDGAME_MATERIAL) * PHASE_MIDGAME / (MIDGAME_MATERIAL - ENDGAME_MATERIAL)
    }
}

/// Score of a draw `ply` plies below the root, from the side to move.
///
/// Even plies belong to the engine, which sees a draw as slightly bad;
/// odd plies belong to the opponent, who sees it as slightly good.
pub fn draw_score(pos: &Position, ply: usize, contempt: i32) -> i32 {
    let sign = if ply % 2 == 0 { -contempt } else { contempt };
    sign * draw_phase(pos) / PHASE_MIDGAME
}
