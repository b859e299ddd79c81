//! King and pawn against king, solved by retrograde analysis.
//!
//! Every position is mirrored so the pawn is white. The table is built the
//! first time it is read and holds one outcome per pawn square, king pair
//! and side to move.

use std::sync::OnceLock;

use talon_core::attacks::{king_attacks, pawn_attacks};
use talon_core::{Color, PieceKind, Position, Square};
use tracing::debug;

const INVALID: u8 = 0;
const UNKNOWN: u8 = 1;
const DRAW: u8 = 2;
const WIN: u8 = 4;

/// Pawn squares a2..h7.
const PAWN_SQUARES: usize = 48;
const SIZE: usize = PAWN_SQUARES * 64 * 64 * 2;

fn index(strong_to_move: bool, strong: Square, weak: Square, pawn: Square) -> usize {
    (((pawn.index() - 8) * 64 + strong.index()) * 64 + weak.index()) * 2 + usize::from(strong_to_move)
}

/// Outcome decided without looking at successors.
fn initial(strong_to_move: bool, strong: Square, weak: Square, pawn: Square) -> u8 {
    if strong.distance(weak) <= 1
        || strong == pawn
        || weak == pawn
        || (strong_to_move && pawn_attacks(Color::White, pawn).contains(weak))
    {
        return INVALID;
    }
    if strong_to_move && pawn.rank() == 6 {
        let queen = Square::new(7, pawn.file());
        if strong != queen && weak != queen && (weak.distance(queen) > 1 || strong.distance(queen) == 1) {
            return WIN;
        }
    }
    if !strong_to_move {
        let covered = king_attacks(strong) | pawn_attacks(Color::White, pawn);
        let stalemate = (king_attacks(weak) & !covered).is_empty();
        let takes_pawn = weak.distance(pawn) == 1 && strong.distance(pawn) > 1;
        if stalemate || takes_pawn {
            return DRAW;
        }
    }
    UNKNOWN
}

/// Outcome from the successors' current classification.
fn step(table: &[u8], strong_to_move: bool, strong: Square, weak: Square, pawn: Square) -> u8 {
    let (good, bad) = if strong_to_move { (WIN, DRAW) } else { (DRAW, WIN) };
    let mut seen = INVALID;
    if strong_to_move {
        for to in king_attacks(strong) {
            seen |= table[index(false, to, weak, pawn)];
        }
        if pawn.rank() < 6 {
            let push = Square::new(pawn.rank() + 1, pawn.file());
            seen |= table[index(false, strong, weak, push)];
            if pawn.rank() == 1 && push != strong && push != weak {
                let double = Square::new(3, pawn.file());
                seen |= table[index(false, strong, weak, double)];
            }
        }
    } else {
        for to in king_attacks(weak) {
            seen |= table[index(true, strong, to, pawn)];
        }
    }
    if seen & good != 0 {
        good
    } else if seen & UNKNOWN != 0 {
        UNKNOWN
    } else {
        bad
    }
}

fn entries() -> impl Iterator<Item = (bool, Square, Square, Square)> {
    Square::all()
        .filter(|pawn| (1..=6).contains(&pawn.rank()))
        .flat_map(|pawn| Square::all().map(move |strong| (strong, pawn)))
        .flat_map(|(strong, pawn)| Square::all().map(move |weak| (strong, weak, pawn)))
        .flat_map(|(strong, weak, pawn)| [false, true].map(|stm| (stm, strong, weak, pawn)))
}

fn build() -> Vec<u8> {
    let mut table = vec![INVALID; SIZE];
    for (stm, strong, weak, pawn) in entries() {
        table[index(stm, strong, weak, pawn)] = initial(stm, strong, weak, pawn);
    }
    let mut passes = 0;
    loop {
        passes += 1;
        let mut changed = false;
        for (stm, strong, weak, pawn) in entries() {
            let at = index(stm, strong, weak, pawn);
            if table[at] != UNKNOWN {
                continue;
            }
            let outcome = step(&table, stm, strong, weak, pawn);
            if outcome != UNKNOWN {
                table[at] = outcome;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    debug!(passes, "KPK table built");
    table
}

fn table() -> &'static [u8] {
    static TABLE: OnceLock<Vec<u8>> = OnceLock::new();
    TABLE.get_or_init(build)
}

/// Whether the side with the only pawn wins a king and pawn ending.
/// `false` for any other material.
pub fn is_win(pos: &Position) -> bool {
    let pawns = pos.pieces(PieceKind::Pawn);
    if pawns.count() != 1 || pos.occupied().count() != 3 {
        return false;
    }
    let Some(pawn) = pawns.lsb() else {
        return false;
    };
    let Some(strong) = pos.color_on(pawn) else {
        return false;
    };
    let normalise = |sq: Square| if strong == Color::White { sq } else { sq.flip_rank() };
    let pawn = normalise(pawn);
    if !(1..=6).contains(&pawn.rank()) {
        return false;
    }
    let at = index(
        pos.turn() == strong,
        normalise(pos.king_square(strong)),
        normalise(pos.king_square(!strong)),
        pawn,
    );
    table()[at] == WIN
}

#[cfg(test)]
mod tests {
    use talon_core::Position;

    use super::is_win;

    fn wins(fen: &str) -> bool {
        is_win(&fen.parse::<Position>().unwrap())
    }

    #[test]
    fn pawn_promotes() {
        assert!(wins("8/5k1P/8/8/8/7K/8/8 w - - 0 1"));
        assert!(!wins("8/5k1P/8/8/8/7K/8/8 b - - 0 1"));
    }

    #[test]
    fn undefended_pawn_is_taken() {
        assert!(!wins("8/6kP/8/8/8/7K/8/8 b - - 0 1"));
        assert!(!wins("8/8/4kP2/8/8/7K/8/8 b - - 0 1"));
        assert!(!wins("8/8/2Pk4/8/8/K7/8/8 b - - 0 1"));
        assert!(!wins("8/8/4Kp2/8/8/7k/8/8 b - - 0 1"));
        assert!(!wins("8/8/2pK4/8/8/k7/8/8 b - - 0 1"));
    }

    #[test]
    fn master_game_endings() {
        // Panno v Najdorf.
        assert!(wins("8/1k6/8/8/8/7K/7P/8 w - - 0 1"));
        // Barcza v Fischer, 1959.
        assert!(!wins("8/8/8/p7/k7/4K3/8/8 w - - 0 1"));
        // Golombek v Pomar, 1946.
        assert!(wins("6k1/8/6K1/6P1/8/8/8/8 w - - 0 1"));
        // Maroczy v Marshall, 1903.
        assert!(wins("8/8/8/6p1/7k/8/6K1/8 b - - 0 1"));
        assert!(!wins("8/8/8/1p6/1k6/8/8/1K6 w - - 0 1"));
        // Kamsky v Kramnik, 2009.
        assert!(!wins("5k2/8/2K1P3/8/8/8/8/8 b - - 0 1"));
    }

    #[test]
    fn other_material_is_not_classified() {
        assert!(!wins("4k3/8/8/8/8/8/4P3/R3K3 w - - 0 1"));
    }
}
