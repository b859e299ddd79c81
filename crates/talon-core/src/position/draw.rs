//! Draw rules and game result.

use crate::bitboard::Bitboard;
use crate::color::Color;
use crate::piece_kind::PieceKind;

use super::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameState {
    Ongoing,
    WhiteWins,
    BlackWins,
    Draw,
}

impl Position {
    /// Fifty-move rule, threefold repetition or insufficient material.
    pub fn is_draw(&self) -> bool {
        self.state.fifty >= 100 || self.repetitions() >= 2 || self.insufficient_material()
    }

    /// Earlier positions in this game identical to the current one.
    ///
    /// Only the reversible tail of the history can repeat, and only with
    /// the same side to move.
    pub fn repetitions(&self) -> usize {
        let key = self.state.key.primary();
        let window = (self.state.fifty as usize).min(self.history.len());
        self.history
            .iter()
            .rev()
            .take(window)
            .skip(1)
            .step_by(2)
            .filter(|undo| undo.state.key.primary() == key)
            .count()
    }

    /// No sequence of legal moves can produce a mate.
    pub fn insufficient_material(&self) -> bool {
        let heavy = self.pieces(PieceKind::Pawn) | self.pieces(PieceKind::Rook) | self.pieces(PieceKind::Queen);
        if heavy.is_nonempty() {
            return false;
        }
        let knights = self.pieces(PieceKind::Knight);
        let bishops = self.pieces(PieceKind::Bishop);
        if knights.is_empty() {
            // Any number of bishops, all on one shade.
            return !(bishops.intersects(Bitboard::DARK_SQUARES) && bishops.intersects(Bitboard::LIGHT_SQUARES));
        }
        if bishops.is_nonempty() {
            return false;
        }
        // One knight, or two knights owned by the same side.
        match knights.count() {
            1 => true,
            2 => Color::ALL.into_iter().any(|c| (knights & self.side(c)).count() == 2),
            _ => false,
        }
    }

    /// `true` when the side to move is checkmated.
    pub fn is_mate(&mut self) -> bool {
        self.is_check() && self.legal_moves().is_empty()
    }

    /// Result of the game as it stands.
    pub fn game_state(&mut self) -> GameState {
        if self.legal_moves().is_empty() {
            if !self.is_check() {
                return GameState::Draw;
            }
            return match self.turn() {
                Color::White => GameState::BlackWins,
                Color::Black => GameState::WhiteWins,
            };
        }
        if self.is_draw() { GameState::Draw } else { GameState::Ongoing }
    }
}

#[cfg(test)]
mod tests {
    use super::GameState;
    use crate::chess_move::{Move, MoveType};
    use crate::piece_kind::PieceKind;
    use crate::position::Position;
    use crate::square::Square;

    fn draw(fen: &str) -> bool {
        fen.parse::<Position>().unwrap().is_draw()
    }

    #[test]
    fn insufficient_material_table() {
        assert!(draw("7k/8/8/8/8/8/8/7K w"));
        assert!(draw("7k/8/8/8/8/8/8/6BK b"));
        assert!(draw("7k/8/8/8/8/8/8/6NK b"));
        assert!(draw("7k/8/nn6/8/8/8/8/7K b"));
        assert!(!draw("7k/8/Nn6/8/8/8/8/7K b"));
        assert!(!draw("7k/7p/8/8/8/8/8/6NK b"));
        assert!(!draw("6bk/8/8/8/8/8/8/6BK b"));
        assert!(draw("6bk/8/8/8/8/8/8/5B1K b"));
        assert!(!draw("6nk/8/8/8/8/8/8/6BK b"));
    }

    #[test]
    fn fifty_move_rule() {
        assert!(draw("4k3/8/8/8/8/8/4P3/4K3 w - - 100 80"));
        assert!(!draw("4k3/8/8/8/8/8/4P3/4K3 w - - 99 80"));
    }

    #[test]
    fn threefold_repetition() {
        let mut pos: Position = "4k3/8/8/8/8/8/4P3/R3K3 w - - 0 1".parse().unwrap();
        let shuffle = [
            (Square::A1, Square::A2, PieceKind::Rook),
            (Square::E8, Square::D8, PieceKind::King),
            (Square::A2, Square::A1, PieceKind::Rook),
            (Square::D8, Square::E8, PieceKind::King),
        ];
        for round in 0..2 {
            for (from, to, piece) in shuffle {
                assert!(!pos.is_draw(), "round {round}");
                assert!(pos.apply(Move::new(from, to, piece, false, false, MoveType::Normal)));
            }
        }
        assert_eq!(pos.repetitions(), 2);
        assert!(pos.is_draw());
    }

    #[test]
    fn mate_and_stalemate() {
        let mut mated: Position = "R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1".parse().unwrap();
        assert!(mated.is_mate());
        assert_eq!(mated.game_state(), GameState::WhiteWins);

        let mut stalemate: Position = "k7/2K5/1Q6/8/8/8/8/8 b - - 0 1".parse().unwrap();
        assert!(!stalemate.is_mate());
        assert_eq!(stalemate.game_state(), GameState::Draw);

        assert_eq!(Position::startpos().game_state(), GameState::Ongoing);
    }
}
