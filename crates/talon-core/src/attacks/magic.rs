//! Magic bitboard lookup for rook and bishop rays.
//!
//! Each square gets a relevant-occupancy mask, a multiplier and a slice of a
//! shared attack table. The multipliers below are known-good starting points;
//! any square whose multiplier collides destructively gets a fresh one from a
//! deterministic sparse-random search while the tables are built.

use std::sync::OnceLock;

use crate::bitboard::Bitboard;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Slider {
    Rook,
    Bishop,
}

impl Slider {
    const fn steps(self) -> [(i8, i8); 4] {
        match self {
            Slider::Rook => [(1, 0), (-1, 0), (0, 1), (0, -1)],
            Slider::Bishop => [(1, 1), (1, -1), (-1, 1), (-1, -1)],
        }
    }

    const fn seeds(self) -> &'static [u64; 64] {
        match self {
            Slider::Rook => &ROOK_SEEDS,
            Slider::Bishop => &BISHOP_SEEDS,
        }
    }
}

/// Ray attacks from `sq`, stopping at (and including) the first blocker.
pub(crate) const fn slow_attacks(slider: Slider, sq: usize, occupied: u64) -> u64 {
    let steps = slider.steps();
    let mut attacks = 0u64;
    let mut i = 0;
    while i < 4 {
        let (dr, df) = steps[i];
        let mut r = (sq / 8) as i8 + dr;
        let mut f = (sq % 8) as i8 + df;
        while r >= 0 && r < 8 && f >= 0 && f < 8 {
            let bit = 1u64 << (r as u32 * 8 + f as u32);
            attacks |= bit;
            if occupied & bit != 0 {
                break;
            }
            r += dr;
            f += df;
        }
        i += 1;
    }
    attacks
}

/// Squares whose occupancy can change the attack set: every ray square
/// except the last one before the edge.
const fn relevant_mask(slider: Slider, sq: usize) -> u64 {
    let steps = slider.steps();
    let mut mask = 0u64;
    let mut i = 0;
    while i < 4 {
        let (dr, df) = steps[i];
        let mut r = (sq / 8) as i8 + dr;
        let mut f = (sq % 8) as i8 + df;
        while r + dr >= 0 && r + dr < 8 && f + df >= 0 && f + df < 8 {
            mask |= 1u64 << (r as u32 * 8 + f as u32);
            r += dr;
            f += df;
        }
        i += 1;
    }
    mask
}

#[rustfmt::skip]
const ROOK_SEEDS: [u64; 64] = [
    0x0a8002c000108020, 0x06c00049b0002001, 0x0100200010090040, 0x2480041000800801,
    0x0280028004000800, 0x0900410008040022, 0x0280020001001080, 0x2880002041000080,
    0xa000800080400034, 0x0004808020004000, 0x2290802004801000, 0x0411000d00100020,
    0x0402800800040080, 0x000b000401004208, 0x2409000100040200, 0x0001002100004082,
    0x0022878001e24000, 0x1090810021004010, 0x0801030040200012, 0x0500808008001000,
    0x0a08018014000880, 0x8000808004000200, 0x0201008080010200, 0x0801020000441091,
    0x0000800080204005, 0x1040200040100048, 0x0000120200402082, 0x0d14880480100080,
    0x0012040280080080, 0x0100040080020080, 0x9020010080800200, 0x0813241200148449,
    0x0491604001800080, 0x0100401000402001, 0x4820010021001040, 0x0400402202000812,
    0x0209009005000802, 0x0810800601800400, 0x4301083214000150, 0x204026458e001401,
    0x0040204000808000, 0x8001008040010020, 0x8410820820420010, 0x1003001000090020,
    0x0804040008008080, 0x0012000810020004, 0x1000100200040208, 0x430000a044020001,
    0x0280009023410300, 0x00e0100040002240, 0x0000200100401700, 0x2244100408008080,
    0x0008000400801980, 0x0002000810040200, 0x8010100228810400, 0x2000009044210200,
    0x4080008040102101, 0x0040002080411d01, 0x2005524060000901, 0x0502001008400422,
    0x489a000810200402, 0x0001004400080a13, 0x4000011008020084, 0x0026002114058042,
];

#[rustfmt::skip]
const BISHOP_SEEDS: [u64; 64] = [
    0x0002020202020200, 0x0002020202020000, 0x0004010202000000, 0x0004040080000000,
    0x0001104000000000, 0x0000821040000000, 0x0000410410400000, 0x0000104104104000,
    0x0000040404040400, 0x0000020202020200, 0x0000040102020000, 0x0000040400800000,
    0x0000011040000000, 0x0000008210400000, 0x0000004104104000, 0x0000002082082000,
    0x0004000808080800, 0x0002000404040400, 0x0001000202020200, 0x0000800802004000,
    0x0000800400a00000, 0x0000200100884000, 0x0000400082082000, 0x0000200041041000,
    0x0002080010101000, 0x0001040008080800, 0x0000208004010400, 0x0000404004010200,
    0x0000840000802000, 0x0000404002011000, 0x0000808001041000, 0x0000404000820800,
    0x0001041000202000, 0x0000820800101000, 0x0000104400080800, 0x0000020080080080,
    0x0000404040040100, 0x0000808100020100, 0x0001010100020800, 0x0000808080010400,
    0x0000820820004000, 0x0000410410002000, 0x0000082088001000, 0x0000002011000800,
    0x0000080100400400, 0x0001010101000200, 0x0002020202000400, 0x0001010101000200,
    0x0000410410400000, 0x0000208208200000, 0x0000002084100000, 0x0000000020880000,
    0x0000001002020000, 0x0000040408020000, 0x0004040404040000, 0x0002020202020000,
    0x0000104104104000, 0x0000002082082000, 0x0000000020841000, 0x0000000000208800,
    0x0000000010020200, 0x0000000404080200, 0x0000040404040400, 0x0002020202020200,
];

#[derive(Clone, Copy, Debug, Default)]
struct Magic {
    mask: u64,
    multiplier: u64,
    shift: u32,
    offset: usize,
}

impl Magic {
    #[inline]
    fn index(&self, occupied: u64) -> usize {
        self.offset + ((occupied & self.mask).wrapping_mul(self.multiplier) >> self.shift) as usize
    }
}

struct SliderTable {
    magics: [Magic; 64],
    attacks: Vec<Bitboard>,
}

/// xorshift64*; only used to replace a colliding multiplier.
struct SparseRng(u64);

impl SparseRng {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        self.0.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }

    fn sparse(&mut self) -> u64 {
        self.next() & self.next() & self.next()
    }
}

/// Fill `slot` for one square; `false` on a destructive collision.
fn try_fill(slot: &mut [Bitboard], subsets: &[(u64, u64)], mask: u64, multiplier: u64, shift: u32) -> bool {
    slot.fill(Bitboard::EMPTY);
    let mut used = vec![false; slot.len()];
    for &(occupied, attacks) in subsets {
        let idx = ((occupied & mask).wrapping_mul(multiplier) >> shift) as usize;
        if !used[idx] {
            used[idx] = true;
            slot[idx] = Bitboard::new(attacks);
        } else if slot[idx].inner() != attacks {
            return false;
        }
    }
    true
}

impl SliderTable {
    fn build(slider: Slider) -> SliderTable {
        let mut magics = [Magic::default(); 64];
        let mut attacks = Vec::new();
        let mut rng = SparseRng(0x9e37_79b9_7f4a_7c15 ^ slider as u64);

        for sq in 0..64 {
            let mask = relevant_mask(slider, sq);
            let bits = mask.count_ones();
            let shift = 64 - bits;
            let offset = attacks.len();
            attacks.resize(offset + (1usize << bits), Bitboard::EMPTY);

            // Carry-rippler walk over every subset of the mask.
            let mut subsets = Vec::with_capacity(1 << bits);
            let mut occupied = 0u64;
            loop {
                subsets.push((occupied, slow_attacks(slider, sq, occupied)));
                occupied = occupied.wrapping_sub(mask) & mask;
                if occupied == 0 {
                    break;
                }
            }

            let slot = &mut attacks[offset..];
            let mut multiplier = slider.seeds()[sq];
            while !try_fill(slot, &subsets, mask, multiplier, shift) {
                tracing::debug!(?slider, sq, "magic seed collides, searching a replacement");
                multiplier = rng.sparse();
            }
            magics[sq] = Magic { mask, multiplier, shift, offset };
        }

        SliderTable { magics, attacks }
    }

    #[inline]
    fn lookup(&self, sq: usize, occupied: u64) -> Bitboard {
        self.attacks[self.magics[sq].index(occupied)]
    }
}

fn rook_table() -> &'static SliderTable {
    static TABLE: OnceLock<SliderTable> = OnceLock::new();
    TABLE.get_or_init(|| SliderTable::build(Slider::Rook))
}

fn bishop_table() -> &'static SliderTable {
    static TABLE: OnceLock<SliderTable> = OnceLock::new();
    TABLE.get_or_init(|| SliderTable::build(Slider::Bishop))
}

#[inline]
pub(crate) fn rook(sq: usize, occupied: Bitboard) -> Bitboard {
    rook_table().lookup(sq, occupied.inner())
}

#[inline]
pub(crate) fn bishop(sq: usize, occupied: Bitboard) -> Bitboard {
    bishop_table().lookup(sq, occupied.inner())
}

/// Force both tables to be built now rather than on first use.
pub(crate) fn init() {
    rook_table();
    bishop_table();
}

#[cfg(test)]
mod tests {
    use super::{Slider, bishop, relevant_mask, rook, slow_attacks};
    use crate::bitboard::Bitboard;

    #[test]
    fn relevant_mask_sizes() {
        assert_eq!(relevant_mask(Slider::Rook, 0).count_ones(), 12);
        assert_eq!(relevant_mask(Slider::Rook, 27).count_ones(), 10);
        assert_eq!(relevant_mask(Slider::Bishop, 0).count_ones(), 6);
        assert_eq!(relevant_mask(Slider::Bishop, 27).count_ones(), 9);
    }

    #[test]
    fn slow_attacks_stop_at_blockers() {
        // Rook on a1, blocker on a3: a2, a3 plus the whole first rank.
        let attacks = slow_attacks(Slider::Rook, 0, 1 << 16);
        assert_eq!(attacks, (1 << 8) | (1 << 16) | 0xFE);
    }

    #[test]
    fn every_relevant_occupancy_matches_ray_walk() {
        for (slider, lookup) in [(Slider::Rook, rook as fn(usize, Bitboard) -> Bitboard), (Slider::Bishop, bishop)] {
            for sq in 0..64 {
                let mask = relevant_mask(slider, sq);
                let mut subset = 0u64;
                loop {
                    assert_eq!(
                        lookup(sq, Bitboard::new(subset)).inner(),
                        slow_attacks(slider, sq, subset),
                        "{slider:?} on {sq} with {subset:016x}"
                    );
                    subset = subset.wrapping_sub(mask) & mask;
                    if subset == 0 {
                        break;
                    }
                }
            }
        }
    }
}
