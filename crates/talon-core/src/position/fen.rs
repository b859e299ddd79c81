//! FEN import and export, including X-FEN and Shredder-FEN castling fields.

use std::fmt::Write as _;
use std::str::FromStr;

use crate::attacks::pawn_attacks;
use crate::bitboard::Bitboard;
use crate::castling::{CastleRights, CastleSide};
use crate::chess_move::Move;
use crate::color::Color;
use crate::error::FenError;
use crate::piece_kind::PieceKind;
use crate::square::Square;

use super::Position;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl FromStr for Position {
    type Err = FenError;

    /// Trailing fields may be omitted; they default to `w - - 0 1`.
    fn from_str(fen: &str) -> Result<Position, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.is_empty() || fields.len() > 6 {
            return Err(FenError::WrongFieldCount { found: fields.len() });
        }
        let field = |i: usize, default: &'static str| fields.get(i).copied().unwrap_or(default);

        let mut pos = Position::empty();
        parse_placement(&mut pos, fields[0])?;

        pos.state.turn = match field(1, "w") {
            "w" | "W" => Color::White,
            "b" | "B" => Color::Black,
            other => return Err(FenError::InvalidColor { found: other.to_string() }),
        };

        parse_castling(&mut pos, field(2, "-"))?;

        let ep = field(3, "-");
        if ep != "-" {
            let sq = Square::from_algebraic(ep)
                .ok_or_else(|| FenError::InvalidEnPassant { found: ep.to_string() })?;
            // Keep the square only if a pawn can take there, matching what
            // `apply` records after a double push.
            let us = pos.state.turn;
            let takers = pawn_attacks(!us, sq) & pos.pieces_of(us, PieceKind::Pawn);
            if sq.relative_rank(us) == 5 && takers.is_nonempty() {
                pos.state.ep = Some(sq);
            }
        }

        let fifty = field(4, "0");
        pos.state.fifty = fifty.parse().map_err(|_| FenError::InvalidMoveCounter {
            field: "halfmove clock",
            found: fifty.to_string(),
        })?;

        let fullmove = field(5, "1");
        let fullmove: u32 = fullmove.parse().map_err(|_| FenError::InvalidMoveCounter {
            field: "fullmove number",
            found: fullmove.to_string(),
        })?;
        pos.start_ply = fullmove.saturating_sub(1) * 2 + pos.state.turn.index() as u32;

        pos.validate()?;
        pos.state.check = pos.is_attacked(pos.king_square(pos.state.turn), !pos.state.turn);
        pos.state.key = pos.state.compute_key();
        Ok(pos)
    }
}

fn parse_placement(pos: &mut Position, placement: &str) -> Result<(), FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::WrongRankCount { found: ranks.len() });
    }
    for (rank_index, text) in ranks.iter().enumerate() {
        let rank = 7 - rank_index as u8;
        let mut file = 0u8;
        for c in text.chars() {
            if let Some(run) = c.to_digit(10) {
                if !(1..=8).contains(&run) {
                    return Err(FenError::InvalidPieceChar { character: c });
                }
                file += run as u8;
                continue;
            }
            let kind = PieceKind::from_fen_char(c).ok_or(FenError::InvalidPieceChar { character: c })?;
            if file >= 8 {
                return Err(FenError::BadRankLength { rank_index, length: file as usize + 1 });
            }
            let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
            let sq = Square::new(rank, file);
            pos.state.kinds[kind.index()] |= sq.bitboard();
            pos.state.sides[color.index()] |= sq.bitboard();
            file += 1;
        }
        if file != 8 {
            return Err(FenError::BadRankLength { rank_index, length: file as usize });
        }
    }
    Ok(())
}

/// `KQkq` pick the outermost rook on each wing (X-FEN); file letters name
/// the rook directly (Shredder-FEN). Rights whose king or rook is missing
/// are dropped.
fn parse_castling(pos: &mut Position, text: &str) -> Result<(), FenError> {
    if text == "-" {
        return Ok(());
    }
    let mut rights = CastleRights::NONE;
    let mut chess960 = false;
    for c in text.chars() {
        let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
        let back_rank = Bitboard::rank(if color == Color::White { 0 } else { 7 });
        let king = pos.king_square(color);
        let rooks = pos.pieces_of(color, PieceKind::Rook) & back_rank;
        let king_file = king.file();

        let (side, rook) = match c.to_ascii_lowercase() {
            'k' => (CastleSide::King, rooks.into_iter().filter(|r| r.file() > king_file).last()),
            'q' => (CastleSide::Queen, rooks.into_iter().find(|r| r.file() < king_file)),
            f @ 'a'..='h' => {
                let file = f as u8 - b'a';
                let side = if file > king_file { CastleSide::King } else { CastleSide::Queen };
                let rook = rooks.into_iter().find(|r| r.file() == file);
                (side, rook)
            }
            _ => return Err(FenError::InvalidCastlingChar { character: c }),
        };

        let king_home = pos.pieces_of(color, PieceKind::King).intersects(back_rank);
        match rook {
            Some(rook) if king_home => {
                rights = rights.with(color, side);
                pos.castling_rooks[CastleRights::slot(color, side)] = rook;
                chess960 |= king_file != 4 || (rook.file() != 0 && rook.file() != 7);
            }
            _ => tracing::debug!(%c, "ignoring castling right without king or rook at home"),
        }
    }
    pos.state.castling = rights;
    pos.chess960 = chess960;
    Ok(())
}

impl Position {
    /// Replace the position, keeping history when the new one follows from it.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), FenError> {
        self.set_fen_with_move(fen, Move::NONE)
    }

    /// Load `fen`. History survives when the FEN is exactly one ply ahead and
    /// `last_move` (legal here) leads to it, or when it is an earlier
    /// position along the current line. Otherwise the history is reset.
    pub fn set_fen_with_move(&mut self, fen: &str, last_move: Move) -> Result<(), FenError> {
        let mut target: Position = fen.parse()?;
        target.chess960 |= self.chess960;

        let (now, then) = (self.ply(), target.ply());
        if then == now + 1 && last_move.is_some() {
            let mv = self.legal_move(last_move);
            if mv.is_some() && self.apply(mv) {
                if self.same_board(&target) {
                    self.state.fifty = target.state.fifty;
                    return Ok(());
                }
                self.rollback();
            }
        } else if then <= now && (now - then) as usize <= self.history.len() {
            let mut candidate = self.clone();
            for _ in then..now {
                candidate.rollback();
            }
            if candidate.same_board(&target) {
                *self = candidate;
                self.state.fifty = target.state.fifty;
                return Ok(());
            }
        }

        tracing::trace!(fen, "history reset");
        *self = target;
        Ok(())
    }

    /// Export in FEN. Castling uses `KQkq` unless a rook is not the outermost
    /// on its wing, in which case its file letter is written.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(90);
        for rank in (0u8..8).rev() {
            let mut empty = 0;
            for file in 0u8..8 {
                match self.piece_on(Square::new(rank, file)) {
                    Some((color, kind)) => {
                        if empty > 0 {
                            let _ = write!(fen, "{empty}");
                            empty = 0;
                        }
                        let c = kind.fen_char();
                        fen.push(if color == Color::White { c.to_ascii_uppercase() } else { c });
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                let _ = write!(fen, "{empty}");
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        let _ = write!(fen, " {} {} ", self.turn(), self.castling_field());
        match self.en_passant() {
            Some(sq) => {
                let _ = write!(fen, "{sq}");
            }
            None => fen.push('-'),
        }
        let _ = write!(fen, " {} {}", self.fifty(), self.fullmove_number());
        fen
    }

    fn castling_field(&self) -> String {
        let rights = self.castling();
        if rights.is_empty() {
            return "-".to_string();
        }
        let mut out = String::with_capacity(4);
        for color in Color::ALL {
            let back_rank = Bitboard::rank(if color == Color::White { 0 } else { 7 });
            let rooks = self.pieces_of(color, PieceKind::Rook) & back_rank;
            for side in CastleSide::ALL {
                if !rights.has(color, side) {
                    continue;
                }
                let rook = self.castling_rook(color, side);
                let outermost = match side {
                    CastleSide::King => rooks.msb() == Some(rook),
                    CastleSide::Queen => rooks.lsb() == Some(rook),
                };
                let letter = match (outermost, side) {
                    (true, CastleSide::King) => 'k',
                    (true, CastleSide::Queen) => 'q',
                    (false, _) => (b'a' + rook.file()) as char,
                };
                out.push(if color == Color::White { letter.to_ascii_uppercase() } else { letter });
            }
        }
        out
    }
}
