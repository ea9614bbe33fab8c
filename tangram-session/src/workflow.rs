//! Editor workflow state machine.
//!
//! Sequences user actions into engine calls. Transitions are a pure
//! function of `(state, event, puzzle_has_pieces)`; the session applies
//! them and performs the actual engine work on the side.

use serde::{Deserialize, Serialize};
use tangram_core::{PieceId, PieceType};

/// The manipulation offered while adjusting a pending piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingMode {
    /// The pending piece may rotate about its connection pivot.
    Rotatable,
    /// The pending piece may slide along its connection edge.
    Slidable,
    /// The placement is fully determined.
    Fixed,
}

/// Where the editor is in the placement workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "data", rename_all = "camelCase")]
pub enum EditorState {
    /// Nothing in progress.
    Idle,
    /// Choosing the type of the very first piece.
    SelectingFirstPiece,
    /// Adjusting the first piece before it is committed.
    ManipulatingFirstPiece {
        /// Chosen piece type.
        piece_type: PieceType,
        /// Current rotation in radians.
        rotation: f64,
        /// Whether the piece is mirrored.
        is_flipped: bool,
    },
    /// Choosing the type of a subsequent piece.
    SelectingNextPiece,
    /// Selecting connection points on already-placed pieces.
    SelectingCanvasConnections {
        /// How many points may still be selected.
        max_points: usize,
    },
    /// Selecting the matching points on the pending piece.
    SelectingPendingConnections {
        /// Pending piece type.
        piece_type: PieceType,
        /// How many points must be selected.
        max_points: usize,
    },
    /// Adjusting a connected pending piece within its remaining freedom.
    ManipulatingPendingPiece {
        /// Pending piece type.
        piece_type: PieceType,
        /// Freedom left by the connection.
        mode: PendingMode,
        /// Current rotation in radians.
        rotation: f64,
    },
    /// Showing a computed placement before commit.
    PreviewingPlacement {
        /// The piece awaiting commit.
        piece_id: PieceId,
    },
    /// A placed piece is selected.
    PieceSelected {
        /// The selected piece.
        piece_id: PieceId,
    },
    /// A placed piece is being rotated or slid.
    ManipulatingExistingPiece {
        /// The piece under manipulation.
        piece_id: PieceId,
    },
    /// A recoverable failure to surface to the user.
    Error {
        /// Human-readable description.
        message: String,
    },
}

impl EditorState {
    /// The state a freshly-opened puzzle starts in.
    #[must_use]
    pub const fn initial(has_pieces: bool) -> Self {
        if has_pieces {
            Self::SelectingNextPiece
        } else {
            Self::SelectingFirstPiece
        }
    }

    /// True when a piece placement is mid-flight.
    #[must_use]
    pub const fn is_placing(&self) -> bool {
        matches!(
            self,
            Self::ManipulatingFirstPiece { .. }
                | Self::SelectingCanvasConnections { .. }
                | Self::SelectingPendingConnections { .. }
                | Self::ManipulatingPendingPiece { .. }
                | Self::PreviewingPlacement { .. }
        )
    }
}

/// A user action driving the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum EditorEvent {
    /// A piece type was chosen from the tray.
    PieceTypeChosen {
        /// The chosen type.
        piece_type: PieceType,
    },
    /// The first/pending piece's rotation was adjusted.
    RotationAdjusted {
        /// New rotation in radians.
        rotation: f64,
    },
    /// The pending parallelogram was flipped.
    FlipToggled,
    /// Enough canvas connection points were selected.
    CanvasPointsSelected {
        /// Number of points selected.
        count: usize,
    },
    /// Matching pending points were selected and a placement computed.
    PlacementComputed {
        /// The pending piece, now carrying its candidate transform.
        piece_id: PieceId,
        /// Freedom the connection leaves the piece.
        mode: PendingMode,
    },
    /// The previewed/adjusted placement was committed.
    Committed,
    /// A placed piece was tapped.
    PieceTapped {
        /// The tapped piece.
        piece_id: PieceId,
    },
    /// A rotate/slide gesture started on the selected piece.
    GestureStarted,
    /// The in-flight gesture was committed.
    GestureCommitted,
    /// The current step was cancelled.
    Cancelled,
    /// An engine operation failed.
    Failed {
        /// Error description for the user.
        message: String,
    },
}

impl EditorState {
    /// Apply an event, yielding the next state.
    ///
    /// `has_pieces` reflects the puzzle *after* any mutation the event
    /// reports (a commit counts its own piece). Unrecognized
    /// state/event combinations leave the state unchanged.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn transition(self, event: EditorEvent, has_pieces: bool) -> Self {
        match (self, event) {
            // Choosing a type starts first-piece adjustment on an empty
            // canvas and connection selection otherwise.
            (
                Self::Idle | Self::SelectingFirstPiece,
                EditorEvent::PieceTypeChosen { piece_type },
            ) if !has_pieces => Self::ManipulatingFirstPiece {
                piece_type,
                rotation: 0.0,
                is_flipped: false,
            },
            (
                Self::ManipulatingFirstPiece {
                    piece_type,
                    is_flipped,
                    ..
                },
                EditorEvent::RotationAdjusted { rotation },
            ) => Self::ManipulatingFirstPiece {
                piece_type,
                rotation,
                is_flipped,
            },
            (
                Self::ManipulatingFirstPiece {
                    piece_type,
                    rotation,
                    is_flipped,
                },
                EditorEvent::FlipToggled,
            ) => Self::ManipulatingFirstPiece {
                piece_type,
                rotation,
                is_flipped: !is_flipped,
            },
            (Self::ManipulatingFirstPiece { .. }, EditorEvent::Committed) => {
                Self::SelectingNextPiece
            }

            // Canvas points first, then the matching pending points.
            (Self::SelectingNextPiece, EditorEvent::CanvasPointsSelected { count }) => {
                Self::SelectingCanvasConnections { max_points: count }
            }
            (
                Self::SelectingCanvasConnections { max_points },
                EditorEvent::PieceTypeChosen { piece_type },
            ) => Self::SelectingPendingConnections {
                piece_type,
                max_points,
            },
            (
                Self::SelectingPendingConnections { piece_type, .. },
                EditorEvent::PlacementComputed { piece_id, mode },
            ) => match mode {
                PendingMode::Fixed => Self::PreviewingPlacement { piece_id },
                PendingMode::Rotatable | PendingMode::Slidable => {
                    Self::ManipulatingPendingPiece {
                        piece_type,
                        mode,
                        rotation: 0.0,
                    }
                }
            },
            (
                Self::ManipulatingPendingPiece {
                    piece_type, mode, ..
                },
                EditorEvent::RotationAdjusted { rotation },
            ) => Self::ManipulatingPendingPiece {
                piece_type,
                mode,
                rotation,
            },
            (
                Self::SelectingPendingConnections { .. }
                | Self::ManipulatingPendingPiece { .. }
                | Self::PreviewingPlacement { .. },
                EditorEvent::Committed,
            ) => Self::SelectingNextPiece,

            // Selecting and manipulating placed pieces.
            (
                Self::Idle | Self::SelectingNextPiece | Self::PieceSelected { .. },
                EditorEvent::PieceTapped { piece_id },
            ) => Self::PieceSelected { piece_id },
            (Self::PieceSelected { piece_id }, EditorEvent::GestureStarted) => {
                Self::ManipulatingExistingPiece { piece_id }
            }
            (
                Self::ManipulatingExistingPiece { piece_id },
                EditorEvent::GestureCommitted,
            ) => Self::PieceSelected { piece_id },

            // Cancel backs out to whichever selection step fits the
            // puzzle contents; errors surface and then cancel out.
            (_, EditorEvent::Cancelled) => Self::initial(has_pieces),
            (_, EditorEvent::Failed { message }) => Self::Error { message },

            (state, event) => {
                tracing::debug!(?state, ?event, "ignored workflow event");
                state
            }
        }
    }
}
