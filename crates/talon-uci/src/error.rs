//! UCI protocol errors.

use talon_core::FenError;

/// Errors that can occur during UCI protocol handling.
#[derive(Debug, thiserror::Error)]
pub enum UciError {
    /// The `position` command is missing `startpos` or `fen` keyword.
    #[error("malformed position command: missing startpos or fen keyword")]
    MalformedPosition,

    /// Failed to parse a FEN string.
    #[error("invalid FEN \"{fen}\": {source}")]
    InvalidFen {
        fen: String,
        #[source]
        source: FenError,
    },

    /// A move in a `position` or `go searchmoves` command is not legal.
    #[error("illegal or unreadable move: {text}")]
    InvalidMove { text: String },

    /// A keyword that takes a value came last on the line.
    #[error("missing value for {param}")]
    MissingValue { param: String },

    /// A numeric value could not be parsed.
    #[error("invalid value for {param}: {value}")]
    InvalidValue { param: String, value: String },

    /// `setoption` without `name`.
    #[error("malformed setoption command")]
    MalformedOption,

    /// An I/O error occurred while reading from stdin.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}
