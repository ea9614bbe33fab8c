//! The editing session - exclusive owner of the puzzle under assembly.
//!
//! Every committed mutation runs the same pipeline: validate, mutate,
//! reclassify every piece's manipulation mode and numeric limits, then
//! report. The mode/constraint caches are always rebuilt in full;
//! classification depends on global assembly topology, so incremental
//! patching is not allowed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tangram_core::{
    calculate_transform, connection_placement, resolve_connection, BoundsPolicy, ConnectionPoint,
    ManipulationConstraints, ManipulationMode, Piece, PieceId, PieceType, Point, Puzzle, Rect,
    SlideEdge, TangramError, TangramResult, Transform, TransformOperation, TransformResult,
    Violation,
};

use crate::workflow::{EditorEvent, EditorState};

/// Tunable session parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Canvas bounds placements must stay within.
    pub canvas_bounds: Rect,
    /// Step size for the rotation-limit search, in degrees.
    pub rotation_step_degrees: f64,
    /// Step size for the slide-limit search, in canvas units.
    pub slide_step: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            canvas_bounds: Rect {
                x: 0.0,
                y: 0.0,
                width: 800.0,
                height: 600.0,
            },
            rotation_step_degrees: 5.0,
            slide_step: 5.0,
        }
    }
}

/// Which gesture is in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureKind {
    /// Rotation about a pivot.
    Rotate {
        /// World-space pivot.
        pivot: Point,
    },
    /// Translation along an edge.
    Slide {
        /// The edge being slid along.
        edge: SlideEdge,
    },
}

/// A gesture's starting conditions, captured once at gesture start.
///
/// Candidate transforms during the gesture are a pure function of this
/// capture plus the current cumulative delta; per-frame deltas are never
/// composed, so cancellation is exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureCapture {
    /// The piece under manipulation.
    pub piece_id: PieceId,
    /// The piece's transform when the gesture started.
    pub initial: Transform,
    /// What kind of movement the gesture performs.
    pub kind: GestureKind,
}

/// An interactive tangram editing session.
#[derive(Debug, Clone)]
pub struct EditorSession {
    puzzle: Puzzle,
    state: EditorState,
    config: SessionConfig,
    modes: HashMap<PieceId, ManipulationMode>,
    constraints: HashMap<PieceId, ManipulationConstraints>,
    gesture: Option<GestureCapture>,
}

impl EditorSession {
    /// Start a session with an empty puzzle.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            puzzle: Puzzle::new(),
            state: EditorState::initial(false),
            config,
            modes: HashMap::new(),
            constraints: HashMap::new(),
            gesture: None,
        }
    }

    /// Resume a session over a loaded puzzle.
    #[must_use]
    pub fn from_puzzle(puzzle: Puzzle, config: SessionConfig) -> Self {
        let mut session = Self {
            state: EditorState::initial(!puzzle.is_empty()),
            puzzle,
            config,
            modes: HashMap::new(),
            constraints: HashMap::new(),
            gesture: None,
        };
        session.reclassify();
        session
    }

    /// The puzzle under assembly.
    #[must_use]
    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    /// The current workflow state.
    #[must_use]
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// The session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The cached manipulation mode for a piece.
    #[must_use]
    pub fn mode_for(&self, piece_id: PieceId) -> Option<&ManipulationMode> {
        self.modes.get(&piece_id)
    }

    /// The cached numeric limits for a piece.
    #[must_use]
    pub fn limits_for(&self, piece_id: PieceId) -> Option<&ManipulationConstraints> {
        self.constraints.get(&piece_id)
    }

    /// The gesture currently in flight, if any.
    #[must_use]
    pub fn gesture(&self) -> Option<&GestureCapture> {
        self.gesture.as_ref()
    }

    /// Advance the workflow state machine.
    pub fn apply_event(&mut self, event: EditorEvent) {
        let has_pieces = !self.puzzle.is_empty();
        let next = self.state.clone().transition(event, has_pieces);
        if next != self.state {
            tracing::debug!(from = ?self.state, to = ?next, "workflow transition");
            self.state = next;
        }
    }

    /// Place the first piece at a chosen center and rotation.
    ///
    /// # Errors
    ///
    /// Returns [`TangramError::OperationNotAllowed`] when the puzzle is
    /// not empty, and the first violation as an error when the placement
    /// does not validate. The puzzle is untouched on failure.
    pub fn place_first_piece(
        &mut self,
        piece_type: PieceType,
        center: Point,
        rotation: f64,
        is_flipped: bool,
    ) -> TangramResult<PieceId> {
        if !self.puzzle.is_empty() {
            return Err(TangramError::OperationNotAllowed(
                "the first piece is already placed".to_string(),
            ));
        }
        let piece = Piece::new(piece_type).with_flipped(is_flipped);
        let result = calculate_transform(
            &piece,
            &TransformOperation::Place { center, rotation },
            None,
            self.puzzle.pieces(),
            self.config.canvas_bounds,
            BoundsPolicy::Enforce,
        );
        if !result.is_valid {
            return Err(violation_error(&result));
        }
        let id = self
            .puzzle
            .add_piece(piece.with_transform(result.transform), None)?;
        self.reclassify();
        Ok(id)
    }

    /// Resolve a connection from point selections, compute the placement
    /// it implies, validate, and commit.
    ///
    /// # Errors
    ///
    /// Propagates resolver and placement errors; returns the first
    /// violation as an error when the computed placement does not
    /// validate. The puzzle is untouched on failure.
    pub fn commit_connected_piece(
        &mut self,
        piece_type: PieceType,
        is_flipped: bool,
        canvas_points: &[ConnectionPoint],
        pending_points: &[ConnectionPoint],
    ) -> TangramResult<PieceId> {
        let pending = Piece::new(piece_type).with_flipped(is_flipped);
        let connection =
            resolve_connection(canvas_points, pending_points, &pending, self.puzzle.pieces())?;
        let transform = connection_placement(&pending, &connection, self.puzzle.pieces())?;
        let placed = pending.with_transform(transform);
        let result = calculate_transform(
            &placed,
            &TransformOperation::Drag {
                to: placed.centroid(),
            },
            Some(&connection),
            self.puzzle.pieces(),
            self.config.canvas_bounds,
            BoundsPolicy::Enforce,
        );
        if !result.is_valid {
            return Err(violation_error(&result));
        }
        let id = self.puzzle.add_piece(placed, Some(connection))?;
        self.reclassify();
        Ok(id)
    }

    /// Remove a placed piece and every connection referencing it.
    ///
    /// # Errors
    ///
    /// Propagates the anchor and not-found rules of the puzzle.
    pub fn remove_piece(&mut self, piece_id: PieceId) -> TangramResult<()> {
        self.puzzle.remove_piece(piece_id)?;
        if self.gesture.is_some_and(|g| g.piece_id == piece_id) {
            self.gesture = None;
        }
        self.reclassify();
        self.state = EditorState::initial(!self.puzzle.is_empty());
        Ok(())
    }

    /// Start a rotation gesture on a rotatable piece.
    ///
    /// # Errors
    ///
    /// Returns [`TangramError::PieceNotFound`] for an unknown piece and
    /// [`TangramError::OperationNotAllowed`] when the piece is not
    /// rotatable or another gesture is in flight.
    pub fn begin_rotation(&mut self, piece_id: PieceId) -> TangramResult<()> {
        let pivot = match self.mode_for_gesture(piece_id)? {
            ManipulationMode::Rotatable { pivot, .. } => pivot,
            _ => {
                return Err(TangramError::OperationNotAllowed(
                    "piece is not rotatable".to_string(),
                ))
            }
        };
        self.capture(piece_id, GestureKind::Rotate { pivot })
    }

    /// Start a slide gesture on a slidable piece.
    ///
    /// # Errors
    ///
    /// Returns [`TangramError::PieceNotFound`] for an unknown piece and
    /// [`TangramError::OperationNotAllowed`] when the piece is not
    /// slidable or another gesture is in flight.
    pub fn begin_slide(&mut self, piece_id: PieceId) -> TangramResult<()> {
        let edge = match self.mode_for_gesture(piece_id)? {
            ManipulationMode::Slidable { edge, .. } => edge,
            _ => {
                return Err(TangramError::OperationNotAllowed(
                    "piece is not slidable".to_string(),
                ))
            }
        };
        self.capture(piece_id, GestureKind::Slide { edge })
    }

    /// Compute the candidate for the in-flight gesture at a cumulative
    /// delta (radians for rotation, canvas units for slides).
    ///
    /// Bounds are advisory during the gesture; the commit re-validates
    /// with them enforced. The puzzle is not mutated.
    ///
    /// # Errors
    ///
    /// Returns [`TangramError::OperationNotAllowed`] when no gesture is
    /// in flight.
    pub fn update_gesture(&self, delta: f64) -> TangramResult<TransformResult> {
        self.gesture_candidate(delta, BoundsPolicy::Advisory)
    }

    /// Commit the in-flight gesture at its final cumulative delta.
    ///
    /// # Errors
    ///
    /// Returns the first violation as an error when the final candidate
    /// does not validate; the gesture is discarded and the puzzle is
    /// untouched.
    pub fn commit_gesture(&mut self, delta: f64) -> TangramResult<()> {
        let result = self.gesture_candidate(delta, BoundsPolicy::Enforce)?;
        let capture = self.gesture.take().ok_or_else(no_gesture)?;
        if !result.is_valid {
            tracing::info!(piece = %capture.piece_id, "gesture commit rejected");
            return Err(violation_error(&result));
        }
        self.puzzle.set_transform(capture.piece_id, result.transform)?;
        self.reclassify();
        Ok(())
    }

    /// Discard the in-flight gesture without mutating anything.
    pub fn cancel_gesture(&mut self) {
        self.gesture = None;
    }

    /// Clone the puzzle for the undo collaborator.
    #[must_use]
    pub fn snapshot(&self) -> Puzzle {
        self.puzzle.clone()
    }

    /// Replace the puzzle wholesale (undo/redo, load).
    pub fn restore(&mut self, puzzle: Puzzle) {
        self.puzzle = puzzle;
        self.gesture = None;
        self.reclassify();
        self.state = EditorState::initial(!self.puzzle.is_empty());
    }

    fn mode_for_gesture(&self, piece_id: PieceId) -> TangramResult<ManipulationMode> {
        if self.gesture.is_some() {
            return Err(TangramError::OperationNotAllowed(
                "another gesture is in flight".to_string(),
            ));
        }
        self.modes
            .get(&piece_id)
            .copied()
            .ok_or_else(|| TangramError::PieceNotFound(piece_id.to_string()))
    }

    fn capture(&mut self, piece_id: PieceId, kind: GestureKind) -> TangramResult<()> {
        let piece = self
            .puzzle
            .piece(piece_id)
            .ok_or_else(|| TangramError::PieceNotFound(piece_id.to_string()))?;
        self.gesture = Some(GestureCapture {
            piece_id,
            initial: piece.transform,
            kind,
        });
        Ok(())
    }

    fn gesture_candidate(
        &self,
        delta: f64,
        bounds_policy: BoundsPolicy,
    ) -> TangramResult<TransformResult> {
        let capture = self.gesture.ok_or_else(no_gesture)?;
        let piece = self
            .puzzle
            .piece(capture.piece_id)
            .ok_or_else(|| TangramError::PieceNotFound(capture.piece_id.to_string()))?
            .clone()
            .with_transform(capture.initial);
        let operation = match capture.kind {
            GestureKind::Rotate { pivot } => TransformOperation::Rotate { angle: delta, pivot },
            GestureKind::Slide { edge } => TransformOperation::Slide {
                distance: delta,
                edge,
            },
        };
        let connection = self
            .puzzle
            .connections()
            .iter()
            .find(|c| c.affects(capture.piece_id));
        Ok(calculate_transform(
            &piece,
            &operation,
            connection,
            self.puzzle.pieces(),
            self.config.canvas_bounds,
            bounds_policy,
        ))
    }

    /// Rebuild the mode and constraint caches for the whole assembly.
    fn reclassify(&mut self) {
        self.modes.clear();
        self.constraints.clear();
        let pieces = self.puzzle.pieces().to_vec();
        for (index, piece) in pieces.iter().enumerate() {
            let mode = tangram_core::classify(
                piece,
                self.puzzle.connections(),
                &pieces,
                index == 0,
            );
            let limits = tangram_core::constraints_for(
                piece,
                &mode,
                &pieces,
                self.config.canvas_bounds,
                BoundsPolicy::Enforce,
                self.config.rotation_step_degrees,
                self.config.slide_step,
            );
            self.modes.insert(piece.id, mode);
            self.constraints.insert(piece.id, limits);
        }
        tracing::debug!(pieces = pieces.len(), "manipulation caches rebuilt");
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

fn no_gesture() -> TangramError {
    TangramError::OperationNotAllowed("no gesture in flight".to_string())
}

/// Surface the most relevant violation as an error.
fn violation_error(result: &TransformResult) -> TangramError {
    match result.violations.first() {
        Some(Violation::Overlap { other }) => TangramError::OverlappingPieces(other.to_string()),
        Some(Violation::ConnectionBroken) => {
            TangramError::ValidationFailed("connection points no longer coincide".to_string())
        }
        Some(Violation::OutOfBounds) => {
            TangramError::ValidationFailed("piece leaves the canvas".to_string())
        }
        None => TangramError::ValidationFailed("no candidate transform".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center() -> Point {
        Point::new(400.0, 300.0)
    }

    #[test]
    fn test_place_first_piece_reclassifies() {
        let mut session = EditorSession::default();
        let id = session
            .place_first_piece(PieceType::Square, center(), 0.0, false)
            .expect("placement");

        // The sole piece is free to move.
        assert_eq!(session.mode_for(id), Some(&ManipulationMode::Free));
        assert_eq!(session.limits_for(id), Some(&ManipulationConstraints::default()));
    }

    #[test]
    fn test_first_piece_only_once() {
        let mut session = EditorSession::default();
        session
            .place_first_piece(PieceType::Square, center(), 0.0, false)
            .expect("placement");
        let result = session.place_first_piece(PieceType::MediumTriangle, center(), 0.0, false);
        assert!(matches!(result, Err(TangramError::OperationNotAllowed(_))));
    }

    #[test]
    fn test_out_of_bounds_placement_rejected() {
        let mut session = EditorSession::default();
        let result =
            session.place_first_piece(PieceType::Square, Point::new(-200.0, -200.0), 0.0, false);
        assert!(matches!(result, Err(TangramError::ValidationFailed(_))));
        assert!(session.puzzle().is_empty());
    }

    #[test]
    fn test_gesture_requires_matching_mode() {
        let mut session = EditorSession::default();
        let id = session
            .place_first_piece(PieceType::Square, center(), 0.0, false)
            .expect("placement");

        // A free piece is neither rotatable nor slidable.
        assert!(matches!(
            session.begin_rotation(id),
            Err(TangramError::OperationNotAllowed(_))
        ));
        assert!(matches!(
            session.begin_slide(id),
            Err(TangramError::OperationNotAllowed(_))
        ));
    }

    #[test]
    fn test_snapshot_restore_roundtrip() {
        let mut session = EditorSession::default();
        session
            .place_first_piece(PieceType::Square, center(), 0.0, false)
            .expect("placement");
        let snapshot = session.snapshot();

        session.restore(Puzzle::new());
        assert!(session.puzzle().is_empty());
        assert_eq!(session.state(), &EditorState::SelectingFirstPiece);

        session.restore(snapshot.clone());
        assert_eq!(session.puzzle(), &snapshot);
        assert_eq!(session.state(), &EditorState::SelectingNextPiece);
    }
}
