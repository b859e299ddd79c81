//! Error types for FEN parsing and position validation.

use crate::color::Color;

/// Errors from parsing a FEN (or X-FEN / Shredder-FEN) string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    /// Empty input or more than six whitespace-separated fields.
    #[error("expected 1 to 6 FEN fields, found {found}")]
    WrongFieldCount { found: usize },
    #[error("expected 8 ranks in piece placement, found {found}")]
    WrongRankCount { found: usize },
    /// `rank_index` counts from the top, as written (0 = rank 8).
    #[error("rank {rank_index} describes {length} squares, expected 8")]
    BadRankLength { rank_index: usize, length: usize },
    #[error("invalid piece character: '{character}'")]
    InvalidPieceChar { character: char },
    #[error("invalid active color: \"{found}\"")]
    InvalidColor { found: String },
    /// Unknown letter, or a right whose king or rook is missing.
    #[error("invalid castling character: '{character}'")]
    InvalidCastlingChar { character: char },
    #[error("invalid en passant square: \"{found}\"")]
    InvalidEnPassant { found: String },
    #[error("invalid {field}: \"{found}\"")]
    InvalidMoveCounter { field: &'static str, found: String },
    #[error("invalid board: {source}")]
    InvalidBoard {
        #[from]
        source: BoardError,
    },
}

/// Structural problems found by [`crate::Position::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("expected 1 king for {color}, found {count}")]
    InvalidKingCount { color: Color, count: u32 },
    #[error("pawns found on back rank")]
    PawnsOnBackRank,
    /// Two piece kinds claim the same square.
    #[error("overlapping piece bitboards")]
    OverlappingPieces,
    /// The piece-kind boards and the side boards cover different squares.
    #[error("piece bitboards are inconsistent with side bitboards")]
    InconsistentOccupied,
    #[error("white and black side bitboards overlap")]
    InconsistentSides,
    /// The side that just moved left its king attacked.
    #[error("side not to move ({color}) is in check")]
    OpponentInCheck { color: Color },
}

#[cfg(test)]
mod tests {
    use super::{BoardError, FenError};
    use crate::color::Color;

    #[test]
    fn fen_error_display() {
        let err = FenError::WrongFieldCount { found: 7 };
        assert_eq!(err.to_string(), "expected 1 to 6 FEN fields, found 7");
        let err = FenError::InvalidMoveCounter { field: "halfmove clock", found: "x".into() };
        assert_eq!(err.to_string(), "invalid halfmove clock: \"x\"");
    }

    #[test]
    fn board_error_display() {
        assert_eq!(BoardError::PawnsOnBackRank.to_string(), "pawns found on back rank");
        let err = BoardError::InvalidKingCount { color: Color::Black, count: 0 };
        assert_eq!(err.to_string(), "expected 1 king for b, found 0");
    }

    #[test]
    fn fen_error_wraps_board_error() {
        let fen_err: FenError = BoardError::OverlappingPieces.into();
        assert!(matches!(fen_err, FenError::InvalidBoard { source: BoardError::OverlappingPieces }));
        assert_eq!(fen_err.to_string(), "invalid board: overlapping piece bitboards");
    }
}
