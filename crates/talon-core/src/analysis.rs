//! Attack, pin and check information derived from a [`Position`].
//!
//! Everything here can be recomputed from the board; the cache only saves
//! doing it twice for the same position. [`AnalysisCache::rebuild`] is a
//! no-op while the position key is unchanged.

use crate::attacks::{attacks_from, between, bishop_attacks, rook_attacks};
use crate::bitboard::Bitboard;
use crate::chess_move::Move;
use crate::color::Color;
use crate::piece_kind::PieceKind;
use crate::position::{Position, SEE_VALUES};
use crate::square::Square;
use crate::zobrist::Key;

#[derive(Clone)]
pub struct AnalysisCache {
    key: Option<Key>,
    attacked: [Bitboard; 2],
    attacked_by: [[Bitboard; PieceKind::COUNT]; 2],
    attacks_from: [Bitboard; Square::COUNT],
    pawn_can_attack: [Bitboard; 2],
    may_pin: [Bitboard; 2],
    pinned: Bitboard,
    pin_ray: [Bitboard; Square::COUNT],
    checkers: Bitboard,
    interpose: Bitboard,
}

impl AnalysisCache {
    pub fn new() -> AnalysisCache {
        AnalysisCache {
            key: None,
            attacked: [Bitboard::EMPTY; 2],
            attacked_by: [[Bitboard::EMPTY; PieceKind::COUNT]; 2],
            attacks_from: [Bitboard::EMPTY; Square::COUNT],
            pawn_can_attack: [Bitboard::EMPTY; 2],
            may_pin: [Bitboard::EMPTY; 2],
            pinned: Bitboard::EMPTY,
            pin_ray: [Bitboard::FULL; Square::COUNT],
            checkers: Bitboard::EMPTY,
            interpose: Bitboard::FULL,
        }
    }

    /// Build for `pos` unless already built for a position with its key.
    pub fn rebuild(&mut self, pos: &Position) {
        if self.key == Some(pos.key()) {
            return;
        }
        *self = AnalysisCache::new();
        self.key = Some(pos.key());

        let occupied = pos.occupied();
        for (sq, (color, kind)) in Square::all().filter_map(|sq| pos.piece_on(sq).map(|p| (sq, p))) {
            let reach = attacks_from(kind, color, sq, occupied);
            self.attacks_from[sq.index()] = reach;
            self.attacked_by[color.index()][kind.index()] |= reach;
            self.attacked[color.index()] |= reach;
            if kind.is_slider() {
                self.may_pin[color.index()] |= reach & occupied;
            }
            if kind == PieceKind::Pawn {
                self.pawn_can_attack[color.index()] |=
                    Bitboard::adjacent_files(sq.file()) & Bitboard::ranks_ahead(color, sq.rank());
            }
        }

        for color in Color::ALL {
            self.find_pins(pos, color);
        }

        let us = pos.turn();
        let king = pos.king_square(us);
        self.checkers = pos.attackers_to(king, occupied) & pos.side(!us);
        self.interpose = match self.checkers.count() {
            0 => Bitboard::FULL,
            1 => self
                .checkers
                .lsb()
                .map_or(Bitboard::EMPTY, |checker| between(king, checker) | checker.bitboard()),
            _ => Bitboard::EMPTY,
        };
    }

    /// Pieces of `color` standing alone between their king and an enemy
    /// slider: look through the king's own blockers and see which sliders
    /// appear.
    fn find_pins(&mut self, pos: &Position, color: Color) {
        let king = pos.king_square(color);
        let occupied = pos.occupied();
        let own = pos.side(color);
        let queens = pos.pieces_of(!color, PieceKind::Queen);
        let lines = [
            (rook_attacks as fn(Square, Bitboard) -> Bitboard, pos.pieces_of(!color, PieceKind::Rook) | queens),
            (bishop_attacks as fn(Square, Bitboard) -> Bitboard, pos.pieces_of(!color, PieceKind::Bishop) | queens),
        ];
        for (attacks, sliders) in lines {
            let direct = attacks(king, occupied);
            let xray = attacks(king, occupied & !(direct & own)) & !direct;
            for pinner in xray & sliders {
                let ray = between(king, pinner);
                let blockers = ray & occupied;
                if blockers.count() == 1 && blockers.intersects(own) {
                    if let Some(pinned) = blockers.lsb() {
                        self.pinned = self.pinned.with(pinned);
                        self.pin_ray[pinned.index()] = ray | pinner.bitboard();
                    }
                }
            }
        }
    }

    /// Forget the cached position.
    pub fn invalidate(&mut self) {
        self.key = None;
    }

    /// Key of the position this cache describes, if any.
    pub fn key(&self) -> Option<Key> {
        self.key
    }

    /// Squares attacked by `color`.
    #[inline]
    pub fn attacked(&self, color: Color) -> Bitboard {
        self.attacked[color.index()]
    }

    /// Squares attacked by `color`'s pieces of one kind.
    #[inline]
    pub fn attacked_by(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.attacked_by[color.index()][kind.index()]
    }

    /// Attack set of the piece on `sq`, empty for an empty square.
    #[inline]
    pub fn attacks_from(&self, sq: Square) -> Bitboard {
        self.attacks_from[sq.index()]
    }

    /// Squares `color`'s pawns attack now or could attack after advancing.
    #[inline]
    pub fn pawn_can_attack(&self, color: Color) -> Bitboard {
        self.pawn_can_attack[color.index()]
    }

    /// Occupied squares directly hit by `color`'s sliders; moving a piece
    /// off one of them may open a line.
    #[inline]
    pub fn may_pin(&self, color: Color) -> Bitboard {
        self.may_pin[color.index()]
    }

    /// Pinned pieces of both colours.
    #[inline]
    pub fn pinned(&self) -> Bitboard {
        self.pinned
    }

    /// Squares the piece on `sq` may still move to; everything if unpinned.
    #[inline]
    pub fn pin_ray(&self, sq: Square) -> Bitboard {
        self.pin_ray[sq.index()]
    }

    /// Enemy pieces giving check to the side to move.
    #[inline]
    pub fn checkers(&self) -> Bitboard {
        self.checkers
    }

    /// Squares a non-king move must reach to answer the check: everything
    /// when not in check, nothing in double check.
    #[inline]
    pub fn interpose(&self) -> Bitboard {
        self.interpose
    }

    /// [`Position::see`] that skips the exchange when nothing can answer:
    /// the destination is not attacked and leaving the origin opens no
    /// enemy slider line, so the capture simply wins the victim.
    pub fn see_fast(&self, pos: &Position, mv: Move) -> i32 {
        if !mv.is_some() || mv.is_castle() || mv.is_en_passant() {
            return pos.see(mv);
        }
        let them = !pos.turn();
        let contested = self.attacked(them).contains(mv.to()) || self.may_pin(them).contains(mv.from());
        if contested {
            return pos.see(mv);
        }
        pos.kind_on(mv.to()).map_or(0, |victim| SEE_VALUES[victim.index()])
    }
}

impl Default for AnalysisCache {
    fn default() -> AnalysisCache {
        AnalysisCache::new()
    }
}

#[cfg(test)]
mod tests {
    use super::AnalysisCache;
    use crate::bitboard::Bitboard;
    use crate::color::Color;
    use crate::piece_kind::PieceKind;
    use crate::position::Position;
    use crate::square::Square;

    fn built(fen: &str) -> (Position, AnalysisCache) {
        let pos: Position = fen.parse().unwrap();
        let mut cache = AnalysisCache::new();
        cache.rebuild(&pos);
        (pos, cache)
    }

    #[test]
    fn startpos_attacks() {
        let (_, cache) = built(crate::position::STARTING_FEN);
        assert_eq!(cache.attacked_by(Color::White, PieceKind::Pawn), Bitboard::rank(2));
        assert!(cache.attacked(Color::Black).contains(Square::F6));
        assert_eq!(cache.checkers(), Bitboard::EMPTY);
        assert_eq!(cache.interpose(), Bitboard::FULL);
        assert_eq!(cache.pinned(), Bitboard::EMPTY);
    }

    #[test]
    fn pins_through_one_blocker_only() {
        // The e2 knight is pinned by the e8 rook. The d2 bishop is not: the
        // c3 pawn also stands between the king and the a5 queen.
        let (_, cache) = built("4r1k1/8/8/q7/8/2P5/3BN3/4K3 w - - 0 1");
        assert!(cache.pinned().contains(Square::E2));
        assert!(!cache.pinned().contains(Square::D2));
        assert_eq!(
            cache.pin_ray(Square::E2),
            Bitboard::file(4).without(Square::E1)
        );
        assert_eq!(cache.pin_ray(Square::D2), Bitboard::FULL);
    }

    #[test]
    fn single_and_double_check() {
        let (_, single) = built("4k3/8/8/8/8/8/8/r3K3 w - - 0 1");
        assert_eq!(single.checkers(), Square::A1.bitboard());
        assert_eq!(
            single.interpose(),
            Bitboard::EMPTY.with(Square::A1).with(Square::B1).with(Square::C1).with(Square::D1)
        );

        let (_, double) = built("4k3/8/8/8/8/5n2/8/r3K3 w - - 0 1");
        assert_eq!(double.checkers().count(), 2);
        assert_eq!(double.interpose(), Bitboard::EMPTY);
    }

    #[test]
    fn rebuild_is_memoized_by_key() {
        let (mut pos, mut cache) = built(crate::position::STARTING_FEN);
        assert_eq!(cache.key(), Some(pos.key()));
        let moves = pos.legal_moves();
        assert!(pos.apply(moves[0]));
        cache.rebuild(&pos);
        assert_eq!(cache.key(), Some(pos.key()));
        cache.invalidate();
        assert_eq!(cache.key(), None);
    }

    #[test]
    fn fast_see_agrees_with_full_see() {
        let fens = [
            "1k1r4/1pp4p/p7/4p3/8/P5P1/1PP4P/2K1R3 w - - 0 1",
            "1k1r3q/1ppn3p/p4b2/4p3/8/P2N2P1/1PP1R1BP/2K1Q3 w - - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "4k3/8/8/4r3/8/8/4R3/4K3 w - - 0 1",
        ];
        for fen in fens {
            let (mut pos, cache) = built(fen);
            for &mv in pos.legal_moves().iter().filter(|m| m.is_capture()) {
                assert_eq!(cache.see_fast(&pos, mv), pos.see(mv), "{fen} {mv}");
            }
        }
    }

    #[test]
    fn pawn_can_attack_spans_files_ahead() {
        let (_, cache) = built("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");
        let expected = Bitboard::adjacent_files(4) & Bitboard::ranks_ahead(Color::White, 1);
        assert_eq!(cache.pawn_can_attack(Color::White), expected);
        assert_eq!(cache.pawn_can_attack(Color::Black), Bitboard::EMPTY);
    }
}
