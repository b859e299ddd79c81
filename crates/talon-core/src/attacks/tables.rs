//! Leaper attack sets and square-pair geometry, computed at compile time.

use crate::bitboard::Bitboard;

const KNIGHT_STEPS: [(i8, i8); 8] = [
    (2, 1), (1, 2), (-1, 2), (-2, 1),
    (-2, -1), (-1, -2), (1, -2), (2, -1),
];

const KING_STEPS: [(i8, i8); 8] = [
    (1, 0), (1, 1), (0, 1), (-1, 1),
    (-1, 0), (-1, -1), (0, -1), (1, -1),
];

const fn on_board(rank: i8, file: i8) -> bool {
    rank >= 0 && rank < 8 && file >= 0 && file < 8
}

const fn bit(rank: i8, file: i8) -> u64 {
    1u64 << (rank as u32 * 8 + file as u32)
}

const fn leaper_table(steps: &[(i8, i8)]) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let mut sq = 0;
    while sq < 64 {
        let (rank, file) = ((sq / 8) as i8, (sq % 8) as i8);
        let mut bits = 0u64;
        let mut i = 0;
        while i < steps.len() {
            let (r, f) = (rank + steps[i].0, file + steps[i].1);
            if on_board(r, f) {
                bits |= bit(r, f);
            }
            i += 1;
        }
        table[sq] = Bitboard::new(bits);
        sq += 1;
    }
    table
}

/// `[white, black]`: white pawns capture towards rank 8.
const fn pawn_table() -> [[Bitboard; 64]; 2] {
    let mut table = [[Bitboard::EMPTY; 64]; 2];
    let mut sq = 0;
    while sq < 64 {
        let (rank, file) = ((sq / 8) as i8, (sq % 8) as i8);
        let mut side = 0;
        while side < 2 {
            let r = if side == 0 { rank + 1 } else { rank - 1 };
            let mut bits = 0u64;
            if on_board(r, file - 1) {
                bits |= bit(r, file - 1);
            }
            if on_board(r, file + 1) {
                bits |= bit(r, file + 1);
            }
            table[side][sq] = Bitboard::new(bits);
            side += 1;
        }
        sq += 1;
    }
    table
}

/// Unit step from `a` towards `b`, or `None` when they share no line.
const fn direction(a: usize, b: usize) -> Option<(i8, i8)> {
    let dr = (b / 8) as i8 - (a / 8) as i8;
    let df = (b % 8) as i8 - (a % 8) as i8;
    if a == b || !(dr == 0 || df == 0 || dr == df || dr == -df) {
        return None;
    }
    Some((dr.signum(), df.signum()))
}

/// `(between, line)` indexed `[a][b]`; both empty for unaligned pairs.
const fn geometry() -> ([[Bitboard; 64]; 64], [[Bitboard; 64]; 64]) {
    let mut between = [[Bitboard::EMPTY; 64]; 64];
    let mut line = [[Bitboard::EMPTY; 64]; 64];
    let mut a = 0;
    while a < 64 {
        let mut b = 0;
        while b < 64 {
            if let Some((dr, df)) = direction(a, b) {
                let (ra, fa) = ((a / 8) as i8, (a % 8) as i8);
                let (rb, fb) = ((b / 8) as i8, (b % 8) as i8);

                let mut inner = 0u64;
                let (mut r, mut f) = (ra + dr, fa + df);
                while r != rb || f != fb {
                    inner |= bit(r, f);
                    r += dr;
                    f += df;
                }

                let mut full = bit(ra, fa);
                let (mut r, mut f) = (ra + dr, fa + df);
                while on_board(r, f) {
                    full |= bit(r, f);
                    r += dr;
                    f += df;
                }
                let (mut r, mut f) = (ra - dr, fa - df);
                while on_board(r, f) {
                    full |= bit(r, f);
                    r -= dr;
                    f -= df;
                }

                between[a][b] = Bitboard::new(inner);
                line[a][b] = Bitboard::new(full);
            }
            b += 1;
        }
        a += 1;
    }
    (between, line)
}

const GEOMETRY: ([[Bitboard; 64]; 64], [[Bitboard; 64]; 64]) = geometry();

pub(crate) static KNIGHT: [Bitboard; 64] = leaper_table(&KNIGHT_STEPS);
pub(crate) static KING: [Bitboard; 64] = leaper_table(&KING_STEPS);
pub(crate) static PAWN: [[Bitboard; 64]; 2] = pawn_table();
pub(crate) static BETWEEN: [[Bitboard; 64]; 64] = GEOMETRY.0;
pub(crate) static LINE: [[Bitboard; 64]; 64] = GEOMETRY.1;
