//! Recognisers for endings whose result static terms misjudge.
//!
//! [`recognise`] returns a white-relative score when the material signature
//! is known, and `None` to fall through to the regular evaluation. [`scale`]
//! damps the endgame half of that evaluation for drawish structures.

use talon_core::attacks::bishop_attacks;
use talon_core::{Bitboard, Color, PieceKind, Position, Square};

use crate::eval::kpk;
use crate::eval::material::PIECE_VALUE;
use crate::search::KNOWN_WIN;

/// Endgame scale of an ordinary position.
pub const SCALE_NORMAL: i32 = 1000;
/// Endgame scale of a position that is hard to win.
pub const SCALE_DRAWISH: i32 = 100;

/// Bonus for kings standing close, indexed by distance.
const CLOSER: [i32; 8] = [0, 0, 100, 80, 60, 40, 20, 10];

/// Lone king near any corner.
#[rustfmt::skip]
const TO_CORNERS: [i32; 64] = [
    100,  90,  80,  70,  70,  80,  90, 100,
     90,  70,  60,  50,  50,  60,  70,  90,
     80,  60,  40,  30,  30,  40,  60,  80,
     70,  50,  30,  20,  20,  30,  50,  70,
     70,  50,  30,  20,  20,  30,  50,  70,
     80,  60,  40,  30,  30,  40,  60,  80,
     90,  70,  60,  50,  50,  60,  70,  90,
    100,  90,  80,  70,  70,  80,  90, 100,
];

/// Lone king near a light corner (h1, a8).
#[rustfmt::skip]
const TO_LIGHT_CORNERS: [i32; 64] = [
    130, 140, 150, 160, 170, 180, 190, 200,
    140, 130, 140, 150, 160, 170, 180, 190,
    150, 140, 125, 140, 140, 155, 170, 180,
    160, 150, 140, 110, 120, 140, 160, 170,
    170, 160, 140, 120, 110, 140, 150, 160,
    180, 170, 155, 140, 140, 125, 140, 150,
    190, 180, 170, 160, 150, 140, 130, 140,
    200, 190, 180, 170, 160, 150, 140, 130,
];

/// Per-side piece counts.
#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    pawns: u32,
    knights: u32,
    bishops: u32,
    rooks: u32,
    queens: u32,
}

impl Counts {
    fn of(pos: &Position, color: Color) -> Counts {
        let n = |kind| pos.pieces_of(color, kind).count();
        Counts {
            pawns: n(PieceKind::Pawn),
            knights: n(PieceKind::Knight),
            bishops: n(PieceKind::Bishop),
            rooks: n(PieceKind::Rook),
            queens: n(PieceKind::Queen),
        }
    }

    fn pieces(&self) -> u32 {
        self.knights + self.bishops + self.rooks + self.queens
    }

    fn total(&self) -> u32 {
        self.pieces() + self.pawns
    }
}

pub fn recognise(pos: &Position) -> Option<i32> {
    let white = Counts::of(pos, Color::White);
    let black = Counts::of(pos, Color::Black);
    let strong = if white.total() > black.total() { Color::White } else { Color::Black };

    if white.pawns == 0 && black.pawns == 0 {
        let (s, w) = if strong == Color::White { (white, black) } else { (black, white) };
        if w.total() == 0 && s.total() == 2 && s.knights == 1 && s.bishops == 1 {
            return Some(kbnk(pos, strong));
        }
        if white.total() == 1 && black.total() == 1 {
            if white.rooks == 1 && black.rooks == 1 {
                return Some(0);
            }
            if white.queens == 1 && black.queens == 1 {
                return Some(0);
            }
        }
    } else if white.pawns + black.pawns == 1 {
        let strong = if white.pawns == 1 { Color::White } else { Color::Black };
        let (s, w) = if strong == Color::White { (white, black) } else { (black, white) };
        if s.pieces() == 0 && w.pieces() == 0 {
            return Some(kpk(pos, strong));
        }
        // The queen belongs to the side without the pawn.
        if s.pieces() == 0 && w.pieces() == 1 && w.queens == 1 && kqkp_is_drawn(pos, !strong) {
            return Some(0);
        }
        if s.pieces() == 1 && w.pieces() == 1 && s.rooks == 1 && w.rooks == 1 && krpkr_is_drawn(pos, strong) {
            return Some(0);
        }
        if s.pieces() == 1 && w.pieces() == 1 && s.bishops == 1 && w.bishops == 1 && kbpkb_is_drawn(pos, strong) {
            return Some(0);
        }
        if s.pieces() == 1 && w.pieces() == 1 && s.bishops == 1 && w.knights == 1 && pawn_is_blockaded(pos, strong) {
            return Some(0);
        }
    }

    let lone = |c: Counts| c.total() == 0;
    let mating = |c: Counts| c.bishops >= 2 || c.rooks > 0 || c.queens > 0;
    if (lone(black) && mating(white)) || (lone(white) && mating(black)) {
        let strong = if lone(black) { Color::White } else { Color::Black };
        return Some(kxk(pos, strong, white, black));
    }
    None
}

/// Endgame scale for `pos`, out of [`SCALE_NORMAL`].
pub fn scale(pos: &Position) -> i32 {
    let white = Counts::of(pos, Color::White);
    let black = Counts::of(pos, Color::Black);
    let rooks_only = |c: Counts| c.pieces() == 1 && c.rooks == 1;
    if rooks_only(white) && rooks_only(black) {
        let strong = match (white.pawns, black.pawns) {
            (2, 1) => Color::White,
            (1, 2) => Color::Black,
            _ => return SCALE_NORMAL,
        };
        if krppkrp_is_drawish(pos, strong) {
            return SCALE_DRAWISH;
        }
    }
    SCALE_NORMAL
}

/// Won king and pawn endings are worth a little more the further the pawn
/// has run.
fn kpk(pos: &Position, strong: Color) -> i32 {
    if !kpk::is_win(pos) {
        return 0;
    }
    let advance = pos
        .pieces(PieceKind::Pawn)
        .lsb()
        .map_or(0, |pawn| i32::from(pawn.relative_rank(strong)));
    (KNOWN_WIN + PIECE_VALUE[PieceKind::Pawn.index()] + advance) * strong.sign()
}

/// Squares in front of `pawn` on its own file.
fn pawn_route(pawn: Square, color: Color) -> Bitboard {
    Bitboard::ranks_ahead(color, pawn.rank()) & Bitboard::file(pawn.file())
}

/// The defending king stands in front of the pawn on a square the strong
/// bishop can never attack.
fn pawn_is_blockaded(pos: &Position, strong: Color) -> bool {
    let Some(pawn) = pos.pieces_of(strong, PieceKind::Pawn).lsb() else {
        return false;
    };
    let weak_king = pos.pieces_of(!strong, PieceKind::King);
    let shade = pos.pieces_of(strong, PieceKind::Bishop).same_shade();
    pawn_route(pawn, strong).intersects(weak_king) && !shade.intersects(weak_king)
}

/// Bishop and pawn against bishop: a blockade, or an opposite-coloured
/// bishop that stops the pawn's route.
fn kbpkb_is_drawn(pos: &Position, strong: Color) -> bool {
    if pawn_is_blockaded(pos, strong) {
        return true;
    }
    let Some(pawn) = pos.pieces_of(strong, PieceKind::Pawn).lsb() else {
        return false;
    };
    let ours = pos.pieces_of(strong, PieceKind::Bishop);
    let theirs = pos.pieces_of(!strong, PieceKind::Bishop);
    let Some(defender) = theirs.lsb() else {
        return false;
    };
    let route = pawn_route(pawn, strong);
    ours.same_shade() != theirs.same_shade()
        && (theirs.intersects(route) || bishop_attacks(defender, Bitboard::EMPTY).intersects(route))
}

/// Two pawns against one with rooks: neither pawn is passed and the
/// defending king stands in front of both.
fn krppkrp_is_drawish(pos: &Position, strong: Color) -> bool {
    let their_pawns = pos.pieces_of(!strong, PieceKind::Pawn);
    let weak_king = pos.pieces_of(!strong, PieceKind::King);
    pos.pieces_of(strong, PieceKind::Pawn).all(|pawn| {
        let span = Bitboard::ranks_ahead(strong, pawn.rank())
            & (Bitboard::file(pawn.file()) | Bitboard::adjacent_files(pawn.file()));
        span.intersects(their_pawns) && span.intersects(weak_king)
    })
}

/// Drive the lone king to an edge and bring the kings together.
fn kxk(pos: &Position, strong: Color, white: Counts, black: Counts) -> i32 {
    let pieces = |kind: PieceKind, n: u32| PIECE_VALUE[kind.index()] * n as i32;
    let value = KNOWN_WIN
        + pieces(PieceKind::Knight, white.knights + black.knights)
        + pieces(PieceKind::Bishop, white.bishops + black.bishops)
        + pieces(PieceKind::Rook, white.rooks + black.rooks)
        + pieces(PieceKind::Queen, white.queens + black.queens)
        + CLOSER[pos.king_square(strong).distance(pos.king_square(!strong)) as usize]
        + TO_CORNERS[pos.king_square(!strong).index()];
    value * strong.sign()
}

/// Bishop and knight mate only in a corner of the bishop's shade.
fn kbnk(pos: &Position, strong: Color) -> i32 {
    let dark = pos.pieces(PieceKind::Bishop).intersects(Bitboard::DARK_SQUARES);
    let orient = |sq: Square| if dark { sq.with_file(7 - sq.file()) } else { sq };
    let strong_king = orient(pos.king_square(strong));
    let weak_king = orient(pos.king_square(!strong));
    let value = KNOWN_WIN + CLOSER[strong_king.distance(weak_king) as usize] + TO_LIGHT_CORNERS[weak_king.index()];
    value * strong.sign()
}

/// Rook and pawn against rook: Philidor, checks from behind, and the
/// back-rank defence against a knight or rook pawn.
fn krpkr_is_drawn(pos: &Position, strong: Color) -> bool {
    let weak = !strong;
    let Some(pawn) = pos.pieces(PieceKind::Pawn).lsb() else {
        return false;
    };
    let strong_king = pos.king_square(strong);
    let weak_king = pos.pieces_of(weak, PieceKind::King);
    let weak_rook = pos.pieces_of(weak, PieceKind::Rook);

    let rel = |relative: u8| match strong {
        Color::White => relative,
        Color::Black => 7 - relative,
    };
    let (rank2, rank6, rank7, rank8) = (rel(1), rel(5), rel(6), rel(7));
    let pawn_file = Bitboard::file(pawn.file());
    let guard_files = pawn_file | Bitboard::adjacent_files(pawn.file());
    let promotion_zone = Bitboard::ranks_ahead(strong, rank6);
    let behind_rank6 = Bitboard::ranks_behind(strong, rank6);
    let rank2_and_behind = Bitboard::rank(rank2) | Bitboard::ranks_behind(strong, rank2);
    let weak_to_move = pos.turn() == weak;

    // Philidor: rook holds the third rank from the defender's side.
    if behind_rank6.contains(pawn)
        && behind_rank6.contains(strong_king)
        && (promotion_zone & guard_files).intersects(weak_king)
        && Bitboard::rank(rank6).intersects(weak_rook)
    {
        return true;
    }
    // Pawn on the sixth: the rook checks from behind.
    if pawn.rank() == rank6
        && (promotion_zone & guard_files).intersects(weak_king)
        && (rank2_and_behind.intersects(weak_rook) || (weak_to_move && pawn.distance(strong_king) >= 3))
    {
        return true;
    }
    // Pawn on the seventh with the defending king in front of it.
    if pawn.rank() == rank7
        && (promotion_zone & pawn_file).intersects(weak_king)
        && rank2_and_behind.intersects(weak_rook)
        && (weak_to_move || pawn.distance(strong_king) >= 2)
    {
        return true;
    }
    // Back-rank defence against a knight or rook pawn.
    let edge_files = Bitboard::file(0) | Bitboard::file(1) | Bitboard::file(6) | Bitboard::file(7);
    edge_files.contains(pawn)
        && (Bitboard::rank(rank8) & guard_files).intersects(weak_king)
        && Bitboard::rank(rank8).intersects(weak_rook)
}

/// Queen against a rook or bishop pawn on the seventh, with the
/// defending king beside it, cannot be won.
fn kqkp_is_drawn(pos: &Position, strong: Color) -> bool {
    let Some(pawn) = pos.pieces(PieceKind::Pawn).lsb() else {
        return false;
    };
    // The pawn's two last ranks, seen from the queen's side.
    let last_ranks = match strong {
        Color::White => Bitboard::RANK_1 | Bitboard::RANK_2,
        Color::Black => Bitboard::RANK_7 | Bitboard::RANK_8,
    };
    let files = |range: std::ops::RangeInclusive<u8>| range.fold(Bitboard::EMPTY, |bb, f| bb | Bitboard::file(f));
    let zone = match pawn.file() {
        0 => files(0..=2),
        2 => files(0..=3),
        5 => files(4..=7),
        7 => files(5..=7),
        _ => return false,
    } & last_ranks;
    zone.intersects(pos.pieces_of(!strong, PieceKind::King))
}

#[cfg(test)]
mod tests {
    use talon_core::Position;

    use super::{SCALE_DRAWISH, SCALE_NORMAL, recognise, scale};
    use crate::search::KNOWN_WIN;

    fn eval(fen: &str) -> Option<i32> {
        recognise(&fen.parse::<Position>().unwrap())
    }

    #[test]
    fn philidor_defence_is_a_draw() {
        assert_eq!(eval("5k2/8/r7/1R6/5K2/5P2/8/8 w - - 4 70"), Some(0));
        assert_eq!(eval("5k2/3R4/r7/5PK1/8/8/8/8 b - - 5 70"), Some(0));
    }

    #[test]
    fn krpkr_without_defence_falls_through() {
        // Defending king cut off far from the pawn.
        assert_eq!(eval("8/1k6/8/8/5PK1/8/r7/5R2 w - - 0 1"), None);
    }

    #[test]
    fn back_rank_defence_for_black_pawn() {
        // Black pawn on g3, White king and rook on the first rank.
        assert_eq!(eval("8/8/8/4k3/8/1r4p1/8/R5K1 w - - 0 1"), Some(0));
    }

    #[test]
    fn symmetric_heavy_endings_are_draws() {
        assert_eq!(eval("8/8/3k4/3r4/8/8/3R4/3K4 w - - 0 1"), Some(0));
        assert_eq!(eval("8/8/3k4/3q4/8/8/3Q4/3K4 w - - 0 1"), Some(0));
    }

    #[test]
    fn kxk_pushes_king_to_the_edge() {
        let centre = eval("8/8/8/3k4/8/8/8/R3K3 w - - 0 1").unwrap();
        let corner = eval("k7/8/8/8/8/8/8/1R2K3 w - - 0 1").unwrap();
        assert!(centre > KNOWN_WIN);
        assert!(corner > centre);
        let black = eval("r3k3/8/8/8/3K4/8/8/8 w - - 0 1").unwrap();
        assert!(black < -KNOWN_WIN);
    }

    #[test]
    fn kbnk_prefers_the_bishop_corner() {
        // Light-squared bishop on f1: h1 and a8 are the mating corners.
        let light_corner = eval("8/8/8/8/8/8/5K2/5BNk w - - 0 1").unwrap();
        let dark_corner = eval("8/8/8/8/8/8/5K2/k4BN1 w - - 0 1").unwrap();
        assert!(dark_corner > KNOWN_WIN);
        assert!(light_corner > dark_corner);
        // Dark-squared bishop on c1 flips the preference.
        let a1 = eval("8/8/8/8/8/2K5/8/k1B1N3 w - - 0 1").unwrap();
        let h1 = eval("8/8/8/8/8/5K2/8/2B1N2k w - - 0 1").unwrap();
        assert!(a1 > h1);
    }

    #[test]
    fn kqkp_rook_pawn_on_seventh_holds() {
        assert_eq!(eval("8/8/8/8/8/4Q3/p7/1k2K3 b - - 0 1"), Some(0));
        // A centre pawn loses.
        assert_eq!(eval("8/8/8/8/8/4Q3/3p4/2k4K b - - 0 1"), None);
    }

    #[test]
    fn king_and_pawn() {
        assert!(eval("8/5k1P/8/8/8/7K/8/8 w - - 0 1").unwrap() >= KNOWN_WIN);
        assert_eq!(eval("8/5k1P/8/8/8/7K/8/8 b - - 0 1"), Some(0));
        assert!(eval("8/1k6/8/8/8/7K/7P/8 w - - 0 1").unwrap() >= KNOWN_WIN);
        assert_eq!(eval("8/8/8/p7/k7/4K3/8/8 w - - 0 1"), Some(0));
        assert!(eval("8/8/8/6p1/7k/8/6K1/8 b - - 0 1").unwrap() <= -KNOWN_WIN);
        assert_eq!(eval("8/8/8/1p6/1k6/8/8/1K6 w - - 0 1"), Some(0));
    }

    #[test]
    fn advanced_pawn_scores_higher() {
        let far = eval("8/8/8/8/8/1k6/7P/7K w - - 0 1");
        let near = eval("8/7P/8/8/8/1k6/8/7K w - - 0 1");
        assert!(near.unwrap() > far.unwrap());
    }

    #[test]
    fn bishop_pawn_against_knight_blockade() {
        // Light bishop; the king on dark d6 in front of the pawn holds.
        assert_eq!(eval("8/8/3k4/3P4/8/8/2B5/3K2n1 w - - 0 1"), Some(0));
        // On light d7 the bishop can drive it away.
        assert_eq!(eval("8/3k4/8/3P4/8/8/2B5/3K2n1 w - - 0 1"), None);
    }

    #[test]
    fn opposite_bishops_stop_the_pawn() {
        // Dark bishop on e7 covers d6 and d8.
        assert_eq!(eval("7k/4b3/8/3P4/8/8/2B5/3K4 w - - 0 1"), Some(0));
        // Same-coloured bishops with the king away fall through.
        assert_eq!(eval("7k/5b2/8/3P4/8/8/2B5/3K4 w - - 0 1"), None);
    }

    #[test]
    fn rook_endings_with_blocked_pawns_scale_down() {
        let scale_of = |fen: &str| scale(&fen.parse::<Position>().unwrap());
        assert_eq!(scale_of("6k1/8/6p1/5P1P/8/8/r7/4R1K1 w - - 0 1"), SCALE_DRAWISH);
        // The a-pawn is passed.
        assert_eq!(scale_of("6k1/8/6p1/P6P/8/8/r7/4R1K1 w - - 0 1"), SCALE_NORMAL);
        // Mirrored for Black.
        assert_eq!(scale_of("4r1k1/R7/8/8/5p1p/6P1/8/6K1 b - - 0 1"), SCALE_DRAWISH);
        assert_eq!(scale_of("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"), SCALE_NORMAL);
    }

    #[test]
    fn ordinary_positions_fall_through() {
        assert_eq!(eval("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"), None);
    }
}
