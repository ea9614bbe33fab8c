//! Editing Session Integration Tests
//!
//! Tests the complete editing flow including:
//! - First placement then connected placement
//! - Cache reclassification after every mutation
//! - Rotation gesture capture, update, commit, and cancel
//! - Snapshot/restore for the undo collaborator

use tangram_core::{
    connection_points, ManipulationMode, Piece, PieceType, Point, PointKind, TangramError,
    EPSILON,
};
use tangram_session::{EditorEvent, EditorSession, EditorState, SessionConfig};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn session_with_anchor() -> EditorSession {
    init_tracing();
    let mut session = EditorSession::new(SessionConfig::default());
    session
        .place_first_piece(PieceType::SmallTriangleA, Point::new(400.0, 300.0), 0.0, false)
        .expect("anchor placement");
    session
}

/// The selectable point of the given kind on a piece.
fn select_point(piece: &Piece, kind: PointKind) -> tangram_core::ConnectionPoint {
    connection_points(piece)
        .into_iter()
        .find(|p| p.kind == kind)
        .unwrap_or_else(|| panic!("piece has no point {kind:?}"))
}

// ============================================================================
// Placement Flow
// ============================================================================

#[test]
fn test_connected_placement_updates_caches() {
    let mut session = session_with_anchor();
    let anchor = session.puzzle().pieces()[0].clone();

    // Mate the second small triangle's hypotenuse to the anchor's.
    let canvas_sel = select_point(&anchor, PointKind::Edge(1));
    let pending = Piece::new(PieceType::SmallTriangleB);
    let pending_sel = select_point(&pending, PointKind::Edge(1));

    let placed_id = session
        .commit_connected_piece(
            PieceType::SmallTriangleB,
            false,
            &[canvas_sel],
            &[pending_sel],
        )
        .expect("connected placement");

    assert_eq!(session.puzzle().piece_count(), 2);
    assert_eq!(session.puzzle().connections().len(), 1);

    // Equal-length edges mate flush; the anchor locks once depended on.
    assert_eq!(session.mode_for(placed_id), Some(&ManipulationMode::Fixed));
    assert_eq!(session.mode_for(anchor.id), Some(&ManipulationMode::Fixed));
}

#[test]
fn test_duplicate_type_rejected_without_mutation() {
    let mut session = session_with_anchor();
    let anchor = session.puzzle().pieces()[0].clone();
    let canvas_sel = select_point(&anchor, PointKind::Edge(1));
    let pending = Piece::new(PieceType::SmallTriangleA);
    let pending_sel = select_point(&pending, PointKind::Edge(1));

    let result = session.commit_connected_piece(
        PieceType::SmallTriangleA,
        false,
        &[canvas_sel],
        &[pending_sel],
    );
    assert!(matches!(result, Err(TangramError::PieceAlreadyPlaced(_))));
    assert_eq!(session.puzzle().piece_count(), 1);
}

#[test]
fn test_empty_selection_rejected() {
    let mut session = session_with_anchor();
    let result = session.commit_connected_piece(PieceType::Square, false, &[], &[]);
    assert!(matches!(result, Err(TangramError::InvalidConnections(_))));
}

// ============================================================================
// Gestures
// ============================================================================

#[test]
fn test_rotation_gesture_lifecycle() {
    let mut session = session_with_anchor();
    let anchor = session.puzzle().pieces()[0].clone();

    // Attach the square by one vertex so rotation about it remains.
    let canvas_sel = select_point(&anchor, PointKind::Vertex(1));
    let pending = Piece::new(PieceType::Square);
    let pending_sel = select_point(&pending, PointKind::Vertex(0));
    let square_id = session
        .commit_connected_piece(PieceType::Square, false, &[canvas_sel], &[pending_sel])
        .expect("vertex placement");

    let Some(&ManipulationMode::Rotatable { pivot, .. }) = session.mode_for(square_id) else {
        panic!("expected rotatable mode, got {:?}", session.mode_for(square_id));
    };
    assert!(pivot.distance_to(canvas_sel.position) < EPSILON);
    assert!(session
        .limits_for(square_id)
        .and_then(|l| l.rotation_limits)
        .is_some());

    let before = session.puzzle().piece(square_id).expect("square").transform;

    session.begin_rotation(square_id).expect("gesture start");
    assert!(session.begin_rotation(square_id).is_err(), "one gesture at a time");

    // Mid-gesture updates never mutate the puzzle.
    let probe = session.update_gesture(0.1).expect("candidate");
    assert!(probe.is_valid, "violations: {:?}", probe.violations);
    assert_eq!(
        session.puzzle().piece(square_id).expect("square").transform,
        before
    );

    // Cancel is exact: the captured transform is simply discarded.
    session.cancel_gesture();
    assert_eq!(
        session.puzzle().piece(square_id).expect("square").transform,
        before
    );

    // Commit applies the final candidate and the pivot stays mated.
    session.begin_rotation(square_id).expect("gesture restart");
    session.commit_gesture(0.1).expect("commit");
    let after = session.puzzle().piece(square_id).expect("square");
    assert!(after.transform != before);
    let mated = after.vertex_position(0).expect("square vertex");
    assert!(mated.distance_to(pivot) < EPSILON);
}

#[test]
fn test_dependent_connection_locks_rotatable_piece() {
    let mut session = session_with_anchor();
    let anchor = session.puzzle().pieces()[0].clone();

    // Square attached to the anchor by one vertex: rotatable.
    let canvas_sel = select_point(&anchor, PointKind::Vertex(1));
    let square_pending = Piece::new(PieceType::Square);
    let square_sel = select_point(&square_pending, PointKind::Vertex(0));
    let square_id = session
        .commit_connected_piece(PieceType::Square, false, &[canvas_sel], &[square_sel])
        .expect("square placement");
    assert!(matches!(
        session.mode_for(square_id),
        Some(&ManipulationMode::Rotatable { .. })
    ));

    // A third piece attached to the square by one of its vertices.
    let square = session.puzzle().piece(square_id).expect("square").clone();
    let square_vertex = select_point(&square, PointKind::Vertex(2));
    let triangle_pending = Piece::new(PieceType::SmallTriangleB);
    let triangle_sel = select_point(&triangle_pending, PointKind::Vertex(0));
    let triangle_id = session
        .commit_connected_piece(
            PieceType::SmallTriangleB,
            false,
            &[square_vertex],
            &[triangle_sel],
        )
        .expect("triangle placement");

    // The square now has a dependent: rotating it would break the
    // recorded square/triangle coincidence, so it locks.
    assert_eq!(session.mode_for(square_id), Some(&ManipulationMode::Fixed));
    assert!(matches!(
        session.begin_rotation(square_id),
        Err(TangramError::OperationNotAllowed(_))
    ));

    // The leaf of the chain stays rotatable about its own pivot.
    assert!(matches!(
        session.mode_for(triangle_id),
        Some(&ManipulationMode::Rotatable { .. })
    ));
}

#[test]
fn test_gesture_requires_capture() {
    let session = session_with_anchor();
    assert!(matches!(
        session.update_gesture(0.1),
        Err(TangramError::OperationNotAllowed(_))
    ));
}

// ============================================================================
// Snapshot / Restore and Workflow
// ============================================================================

#[test]
fn test_restore_rebuilds_caches_and_state() {
    let mut session = session_with_anchor();
    let anchor_id = session.puzzle().pieces()[0].id;
    let snapshot = session.snapshot();

    let mut other = EditorSession::new(SessionConfig::default());
    assert_eq!(other.state(), &EditorState::SelectingFirstPiece);

    other.restore(snapshot);
    assert_eq!(other.state(), &EditorState::SelectingNextPiece);
    assert_eq!(other.mode_for(anchor_id), Some(&ManipulationMode::Free));
}

#[test]
fn test_workflow_events_advance_state() {
    let mut session = EditorSession::new(SessionConfig::default());
    session.apply_event(EditorEvent::PieceTypeChosen {
        piece_type: PieceType::LargeTriangleA,
    });
    assert!(matches!(
        session.state(),
        EditorState::ManipulatingFirstPiece {
            piece_type: PieceType::LargeTriangleA,
            ..
        }
    ));

    session
        .place_first_piece(PieceType::LargeTriangleA, Point::new(400.0, 300.0), 0.0, false)
        .expect("placement");
    session.apply_event(EditorEvent::Committed);
    assert_eq!(session.state(), &EditorState::SelectingNextPiece);
}
