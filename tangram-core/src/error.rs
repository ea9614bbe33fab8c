//! Error types for tangram assembly operations.

use thiserror::Error;

/// Result type for tangram assembly operations.
pub type TangramResult<T> = Result<T, TangramError>;

/// Errors that can occur while assembling a puzzle.
///
/// All variants are recoverable; the engine never panics and never leaves
/// a puzzle partially mutated when one of these is returned.
#[derive(Debug, Error)]
pub enum TangramError {
    /// The selected points cannot form a resolvable connection.
    #[error("Invalid connection selection: {0}")]
    InvalidConnections(String),

    /// No valid candidate transform could be produced for a placement.
    #[error("Placement calculation failed: {0}")]
    PlacementCalculationFailed(String),

    /// A candidate transform intersects another piece.
    #[error("Placement overlaps piece: {0}")]
    OverlappingPieces(String),

    /// A commit failed post-hoc revalidation.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The puzzle already contains a piece of this type.
    #[error("Piece already placed: {0}")]
    PieceAlreadyPlaced(String),

    /// The operation is not allowed in the current puzzle state.
    #[error("Operation not allowed: {0}")]
    OperationNotAllowed(String),

    /// A referenced piece does not exist in the puzzle.
    #[error("Piece not found: {0}")]
    PieceNotFound(String),

    /// Puzzle serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
