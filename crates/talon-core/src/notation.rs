//! Move text: coordinate notation, standard algebraic notation and a long
//! algebraic form for logs.
//!
//! Parsing never fails loudly. Text that does not name exactly one legal
//! move yields [`Move::NONE`].

use crate::castling::CastleSide;
use crate::chess_move::{Move, MoveType};
use crate::piece_kind::PieceKind;
use crate::position::Position;
use crate::square::Square;

/// Resolve `text` against the legal moves of `pos`.
///
/// Accepts coordinate moves (`e2e4`, `e7e8q`, king-takes-rook castling),
/// SAN and long algebraic (`Nbd7`, `exd6`, `e8=Q+`, `Ng1-f3`, `O-O-O`,
/// `0-0`), `0000`/`null` for the null move and `none`. A promotion without
/// a piece becomes a queen.
pub fn parse(pos: &mut Position, text: &str) -> Move {
    let text = text.trim();
    match text {
        "none" | "" => return Move::NONE,
        "0000" | "null" | "--" => return Move::NULL,
        _ => {}
    }
    let text = text.trim_end_matches(['+', '#', '!', '?']);

    let castle = text.replace('0', "O");
    if castle == "O-O" || castle == "O-O-O" {
        let long = castle.len() == 5;
        return unique(pos, |mv| {
            mv.is_castle() && (mv.move_type() == MoveType::CastleQueen) == long
        });
    }

    if let Some(mv) = parse_coordinate(pos, text) {
        return mv;
    }
    parse_algebraic(pos, text)
}

fn parse_coordinate(pos: &mut Position, text: &str) -> Option<Move> {
    let from = Square::from_algebraic(text.get(0..2)?)?;
    let to = Square::from_algebraic(text.get(2..4)?)?;
    let promotion = match text.get(4..)? {
        "" => None,
        p if p.len() == 1 => Some(PieceKind::from_fen_char(p.chars().next()?)?),
        _ => return None,
    };
    let us = pos.turn();
    let rooks = [pos.castling_rook(us, CastleSide::King), pos.castling_rook(us, CastleSide::Queen)];
    let found = unique(pos, |mv| {
        if mv.from() != from {
            return false;
        }
        if mv.is_castle() {
            // Either the usual king destination or king-takes-rook.
            let rook = if mv.move_type() == MoveType::CastleKing { rooks[0] } else { rooks[1] };
            return mv.to() == to || rook == to;
        }
        mv.to() == to && promotion_matches(mv, promotion)
    });
    Some(found)
}

fn promotion_matches(mv: Move, wanted: Option<PieceKind>) -> bool {
    match (mv.promotion(), wanted) {
        (None, None) => true,
        (Some(kind), Some(wanted)) => kind == wanted,
        (Some(kind), None) => kind == PieceKind::Queen,
        (None, Some(_)) => false,
    }
}

fn parse_algebraic(pos: &mut Position, text: &str) -> Move {
    let mut body = text;

    let mut piece = PieceKind::Pawn;
    if let Some(first) = body.chars().next().filter(char::is_ascii_uppercase) {
        match PieceKind::from_fen_char(first) {
            Some(kind) if kind != PieceKind::Pawn => piece = kind,
            _ => return Move::NONE,
        }
        body = &body[1..];
    }

    // Trailing promotion: `e8=Q`, `e8Q` or `e8q`.
    let mut promotion = None;
    let bytes = body.as_bytes();
    let n = bytes.len();
    if n >= 3 && bytes[n - 1].is_ascii_alphabetic() && (bytes[n - 2] == b'=' || bytes[n - 2].is_ascii_digit()) {
        let Some(kind) = PieceKind::from_fen_char(bytes[n - 1] as char) else {
            return Move::NONE;
        };
        promotion = Some(kind);
        body = body[..n - 1].trim_end_matches('=');
    }

    let cleaned: String = body.chars().filter(|c| !matches!(c, 'x' | ':' | '-')).collect();
    if cleaned.len() < 2 || !cleaned.is_char_boundary(cleaned.len() - 2) {
        return Move::NONE;
    }
    let (hint, dest) = cleaned.split_at(cleaned.len() - 2);
    let Some(to) = Square::from_algebraic(dest) else {
        return Move::NONE;
    };
    let mut file = None;
    let mut rank = None;
    for c in hint.chars() {
        match c {
            'a'..='h' => file = Some(c as u8 - b'a'),
            '1'..='8' => rank = Some(c as u8 - b'1'),
            _ => return Move::NONE,
        }
    }

    unique(pos, |mv| {
        !mv.is_castle()
            && mv.piece() == piece
            && mv.to() == to
            && file.is_none_or(|f| mv.from().file() == f)
            && rank.is_none_or(|r| mv.from().rank() == r)
            && promotion_matches(mv, promotion)
    })
}

/// The only legal move satisfying `accept`, or NONE.
fn unique(pos: &mut Position, accept: impl Fn(Move) -> bool) -> Move {
    let moves = pos.legal_moves();
    let mut found = moves.iter().copied().filter(|&mv| accept(mv));
    match (found.next(), found.next()) {
        (Some(mv), None) => mv,
        _ => Move::NONE,
    }
}

/// Standard algebraic notation for a legal move, with `+` or `#`.
/// Moves that are not legal here fall back to coordinate notation.
pub fn to_san(pos: &mut Position, mv: Move) -> String {
    let mv = pos.legal_move(mv);
    if mv.is_none() {
        return mv.to_uci();
    }
    let mut san = String::with_capacity(8);
    if mv.is_castle() {
        san.push_str(match mv.move_type() {
            MoveType::CastleKing => "O-O",
            _ => "O-O-O",
        });
    } else {
        let piece = mv.piece();
        if piece == PieceKind::Pawn {
            if mv.is_capture() {
                san.push((b'a' + mv.from().file()) as char);
            }
        } else {
            san.push(piece.fen_char().to_ascii_uppercase());
            san.push_str(&disambiguation(pos, mv));
        }
        if mv.is_capture() {
            san.push('x');
        }
        san.push_str(&mv.to().to_string());
        if let Some(kind) = mv.promotion() {
            san.push('=');
            san.push(kind.fen_char().to_ascii_uppercase());
        }
    }
    if mv.is_check() && pos.apply(mv) {
        san.push(if pos.is_mate() { '#' } else { '+' });
        pos.rollback();
    }
    san
}

fn disambiguation(pos: &mut Position, mv: Move) -> String {
    let from = mv.from();
    let rivals: Vec<Square> = pos
        .legal_moves()
        .iter()
        .filter(|m| m.piece() == mv.piece() && m.to() == mv.to() && m.from() != from && !m.is_castle())
        .map(|m| m.from())
        .collect();
    let square = from.to_string();
    if rivals.is_empty() {
        String::new()
    } else if rivals.iter().all(|sq| sq.file() != from.file()) {
        square[..1].to_string()
    } else if rivals.iter().all(|sq| sq.rank() != from.rank()) {
        square[1..].to_string()
    } else {
        square
    }
}

/// Long algebraic form for debug output: `Ng1-f3`, `e4xd5`, `e7-e8=Q+`.
pub fn to_long(mv: Move) -> String {
    if !mv.is_some() {
        return mv.to_uci();
    }
    let mut out = String::with_capacity(10);
    if mv.is_castle() {
        out.push_str(match mv.move_type() {
            MoveType::CastleKing => "O-O",
            _ => "O-O-O",
        });
    } else {
        if mv.piece() != PieceKind::Pawn {
            out.push(mv.piece().fen_char().to_ascii_uppercase());
        }
        out.push_str(&mv.from().to_string());
        out.push(if mv.is_capture() { 'x' } else { '-' });
        out.push_str(&mv.to().to_string());
        if let Some(kind) = mv.promotion() {
            out.push('=');
            out.push(kind.fen_char().to_ascii_uppercase());
        }
    }
    if mv.is_check() {
        out.push('+');
    }
    out
}
