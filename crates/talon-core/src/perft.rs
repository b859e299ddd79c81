//! Perft: leaf counts of the legal move tree, for checking the generator.

use crate::position::Position;

/// Count the leaves `depth` plies below `pos`.
///
/// Depth 0 is the position itself. At depth 1 the legal moves are counted
/// without being played.
pub fn perft(pos: &mut Position, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = pos.legal_moves();
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0;
    for &mv in moves.iter() {
        if pos.apply(mv) {
            nodes += perft(pos, depth - 1);
            pos.rollback();
        }
    }
    nodes
}

/// Per-move breakdown of [`perft`] as `(uci, nodes)`, sorted by move text.
pub fn divide(pos: &mut Position, depth: usize) -> Vec<(String, u64)> {
    let moves = pos.legal_moves();
    let mut results = Vec::with_capacity(moves.len());
    for &mv in moves.iter() {
        if pos.apply(mv) {
            let count = perft(pos, depth.saturating_sub(1));
            pos.rollback();
            results.push((mv.to_uci(), count));
        }
    }
    results.sort_by(|a, b| a.0.cmp(&b.0));
    results
}
