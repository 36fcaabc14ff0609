//! Error types for maze loading and generation.

use std::path::PathBuf;

/// Errors that can occur while loading a template or generating a maze.
///
/// The first group (`InvalidChar` through `Io`) is fatal at load time:
/// a broken template file should stop the server from starting. The
/// generation failures are recoverable, since another template (or
/// another roll of the dice) may well succeed.
#[derive(Debug, thiserror::Error)]
pub enum MazeError {
    /// A template contained a character outside `. # J M E`.
    #[error("invalid map character {ch:?} at row {row}, column {col}")]
    InvalidChar { ch: char, row: usize, col: usize },

    /// A template row is not as wide as the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A template had no rows, or only empty ones.
    #[error("template has no cells")]
    EmptyTemplate,

    /// Reading a template file (or the templates directory) failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The templates directory held no `*.txt` files.
    #[error("no map templates found in {}", .0.display())]
    EmptyCatalog(PathBuf),

    /// No cell is more than two moves away from every exit.
    #[error("template {0:?} has no valid player start")]
    NoPlayerCandidates(String),

    /// No cell at the required distance keeps an exit reachable.
    #[error("template {0:?} has no fair monster position")]
    NoMonsterCandidates(String),

    /// A move or query needs a player, but none has been placed.
    #[error("player has not been placed")]
    PlayerNotPlaced,
}

impl MazeError {
    /// `true` if the failure came from placement rather than from a
    /// broken template. Such failures are worth retrying.
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            MazeError::NoPlayerCandidates(_) | MazeError::NoMonsterCandidates(_)
        )
    }
}
