//! Core chess types: board representation, move generation, and game rules.

mod analysis;
pub mod attacks;
mod bitboard;
mod castling;
mod chess_move;
mod color;
mod error;
pub mod movegen;
pub mod notation;
mod perft;
mod piece_kind;
mod position;
mod square;
mod zobrist;

pub use analysis::AnalysisCache;
pub use bitboard::Bitboard;
pub use castling::{CastleRights, CastleSide};
pub use chess_move::{MOVE_BITS, Move, MoveType};
pub use color::Color;
pub use error::{BoardError, FenError};
pub use movegen::{GenType, MoveList};
pub use perft::{divide, perft};
pub use piece_kind::PieceKind;
pub use position::{GameState, Position, SEE_VALUES, STARTING_FEN};
pub use square::Square;
pub use zobrist::Key;
