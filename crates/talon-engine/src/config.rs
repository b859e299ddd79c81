//! Engine configuration.

/// Settings read once when a [`SearchEngine`](crate::SearchEngine) is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Transposition table size in MiB.
    pub hash_mb: usize,
    /// Centipawns the engine gives up to avoid a draw in the middlegame.
    pub contempt: i32,
    /// Castling is written king-takes-rook.
    pub chess960: bool,
    /// Advertise pondering to the GUI.
    pub ponder: bool,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            hash_mb: 64,
            contempt: 90,
            chess960: false,
            ponder: true,
        }
    }
}
