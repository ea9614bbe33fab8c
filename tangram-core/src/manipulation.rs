//! Manipulation mode classification and movement-limit search.
//!
//! Classification is a pure function of `(piece, connections, pieces)`;
//! limits come from a discretized, directional outward search that probes
//! candidate transforms until the first violation in each direction.

use serde::{Deserialize, Serialize};

use crate::connection::{Connection, ConnectionKind, ConstraintKind, SlideEdge};
use crate::engine::{self, BoundsPolicy, TransformOperation};
use crate::geometry::{Point, Rect};
use crate::piece::Piece;

/// The interactive freedom currently available to a placed piece.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "data", rename_all = "lowercase")]
pub enum ManipulationMode {
    /// The piece cannot be moved.
    Fixed,
    /// The piece may rotate about a pivot.
    Rotatable {
        /// World-space pivot.
        pivot: Point,
        /// The piece's rotation at classification time, in radians.
        current_angle: f64,
    },
    /// The piece may slide along an edge.
    Slidable {
        /// The edge being slid along.
        edge: SlideEdge,
        /// Offsets (along the edge) that keep the mated edges in full
        /// contact, relative to the centered mate.
        base_range: SlideRange,
        /// The piece's offset at classification time.
        current_offset: f64,
    },
    /// The piece may be moved freely.
    Free,
}

/// A closed range of angles, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationLimits {
    /// Smallest legal angle.
    pub min: f64,
    /// Largest legal angle.
    pub max: f64,
}

/// A closed range of slide offsets, in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlideRange {
    /// Smallest legal offset.
    pub min: f64,
    /// Largest legal offset.
    pub max: f64,
}

impl SlideRange {
    /// Create a range from bounds.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// True when the offset lies within the range.
    #[must_use]
    pub fn contains(&self, offset: f64) -> bool {
        offset >= self.min && offset <= self.max
    }
}

/// Numeric movement limits for one piece.
///
/// Cached per piece id by the session and fully recomputed on any
/// assembly mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ManipulationConstraints {
    /// Legal rotation range for rotatable pieces.
    pub rotation_limits: Option<RotationLimits>,
    /// Legal slide range for slidable pieces.
    pub slide_limits: Option<SlideRange>,
}

/// Offset of a slidable piece's mated edge from the canvas edge, measured
/// along the canvas edge direction.
fn slide_offset(piece: &Piece, connection: &Connection, edge: &SlideEdge) -> f64 {
    let mated = match connection.kind {
        ConnectionKind::EdgeToEdge { edge_b, .. } => piece
            .edge_points(edge_b)
            .map(|(s, e)| SlideEdge::new(s, e).midpoint()),
        ConnectionKind::VertexToEdge { vertex, .. } => piece.vertex_position(vertex),
        ConnectionKind::VertexToVertex { .. } => None,
    };
    mated.map_or(0.0, |m| edge.midpoint().to(m).dot(edge.unit()))
}

/// Full-contact slide half-width for an edge-to-edge connection: the
/// shorter edge may travel this far either side of the centered mate.
fn base_half_width(piece: &Piece, connection: &Connection, edge: &SlideEdge) -> f64 {
    match connection.kind {
        ConnectionKind::EdgeToEdge { edge_b, .. } => piece
            .edge_points(edge_b)
            .map_or(0.0, |(s, e)| (edge.length() - s.distance_to(e)).abs() / 2.0),
        // A vertex may travel the whole edge.
        ConnectionKind::VertexToEdge { .. } => edge.length() / 2.0,
        ConnectionKind::VertexToVertex { .. } => 0.0,
    }
}

/// Classify a placed piece's manipulation mode.
///
/// Rules, in order: a piece that any connection references as its canvas
/// side is fixed, even when its own connection would leave it freedom
/// (moving it would break the dependents' recorded coincidences); the
/// constraints of connections attaching this piece decide (one rotatable
/// constraint means rotatable, one slidable means slidable, anything
/// else means fixed); an unconnected anchor piece is free while alone
/// and fixed once any other piece exists; otherwise the piece is free.
#[must_use]
pub fn classify(
    piece: &Piece,
    connections: &[Connection],
    all_pieces: &[Piece],
    is_first_piece: bool,
) -> ManipulationMode {
    if connections
        .iter()
        .any(|c| c.references(piece.id) && !c.affects(piece.id))
    {
        return ManipulationMode::Fixed;
    }

    let affecting: Vec<&Connection> = connections.iter().filter(|c| c.affects(piece.id)).collect();

    if !affecting.is_empty() {
        if affecting.len() > 1 {
            return ManipulationMode::Fixed;
        }
        let connection = affecting[0];
        return match connection.constraint.kind {
            ConstraintKind::Fixed => ManipulationMode::Fixed,
            ConstraintKind::Rotatable { pivot } => ManipulationMode::Rotatable {
                pivot,
                current_angle: piece.rotation(),
            },
            ConstraintKind::Slidable { edge } => {
                let half = base_half_width(piece, connection, &edge);
                ManipulationMode::Slidable {
                    edge,
                    base_range: SlideRange::new(-half, half),
                    current_offset: slide_offset(piece, connection, &edge),
                }
            }
        };
    }

    if is_first_piece {
        // The anchor roots every dependent placement; it stays put once
        // anything else is on the canvas.
        if all_pieces.len() > 1 {
            return ManipulationMode::Fixed;
        }
        return ManipulationMode::Free;
    }

    ManipulationMode::Free
}

/// Stepped outward search for the legal rotation range about a pivot.
///
/// Starting from the piece's current angle, probes `step_degrees`
/// increments in each direction independently, re-validating overlap and
/// bounds at each step (the connection is preserved by construction and
/// is not re-checked). The returned endpoints are the last valid angles
/// found; if the very first probe in a direction collides, that endpoint
/// equals the starting angle.
#[must_use]
pub fn calculate_rotation_limits(
    piece: &Piece,
    pivot: Point,
    other_pieces: &[Piece],
    canvas_bounds: Rect,
    bounds_policy: BoundsPolicy,
    step_degrees: f64,
) -> RotationLimits {
    let start = piece.rotation();
    if step_degrees <= 0.0 {
        return RotationLimits {
            min: start,
            max: start,
        };
    }
    let step = step_degrees.to_radians();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let max_steps = (std::f64::consts::TAU / step).floor() as usize;

    let sweep = |direction: f64| -> f64 {
        let mut last_valid = 0.0;
        for k in 1..=max_steps {
            #[allow(clippy::cast_precision_loss)]
            let angle = direction * step * k as f64;
            let result = engine::calculate_transform(
                piece,
                &TransformOperation::Rotate { angle, pivot },
                None,
                other_pieces,
                canvas_bounds,
                bounds_policy,
            );
            if !result.is_valid {
                break;
            }
            last_valid = angle;
        }
        last_valid
    };

    let limits = RotationLimits {
        min: start + sweep(-1.0),
        max: start + sweep(1.0),
    };
    tracing::debug!(piece = %piece.id, min = limits.min, max = limits.max, "rotation limits");
    limits
}

/// Stepped outward search for the legal slide range along an edge.
///
/// Walks `step_size` increments from the current offset in each
/// direction, staying inside `base_range` and stopping at the first
/// overlap/bounds violation. Returned offsets are absolute (same datum as
/// `base_range`); a direction whose first probe fails contributes a
/// zero-width bound at the current offset.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn calculate_slide_limits(
    piece: &Piece,
    edge: &SlideEdge,
    base_range: SlideRange,
    current_offset: f64,
    other_pieces: &[Piece],
    canvas_bounds: Rect,
    bounds_policy: BoundsPolicy,
    step_size: f64,
) -> SlideRange {
    if step_size <= 0.0 {
        return SlideRange::new(current_offset, current_offset);
    }

    let sweep = |direction: f64| -> f64 {
        let mut last_valid = 0.0;
        let mut k = 1_usize;
        loop {
            #[allow(clippy::cast_precision_loss)]
            let distance = direction * step_size * k as f64;
            if !base_range.contains(current_offset + distance) {
                break;
            }
            let result = engine::calculate_transform(
                piece,
                &TransformOperation::Slide {
                    distance,
                    edge: *edge,
                },
                None,
                other_pieces,
                canvas_bounds,
                bounds_policy,
            );
            if !result.is_valid {
                break;
            }
            last_valid = distance;
            k += 1;
        }
        last_valid
    };

    let limits = SlideRange::new(current_offset + sweep(-1.0), current_offset + sweep(1.0));
    tracing::debug!(piece = %piece.id, min = limits.min, max = limits.max, "slide limits");
    limits
}

/// Compute the numeric constraints matching a piece's manipulation mode.
#[must_use]
pub fn constraints_for(
    piece: &Piece,
    mode: &ManipulationMode,
    other_pieces: &[Piece],
    canvas_bounds: Rect,
    bounds_policy: BoundsPolicy,
    rotation_step_degrees: f64,
    slide_step: f64,
) -> ManipulationConstraints {
    match mode {
        ManipulationMode::Rotatable { pivot, .. } => ManipulationConstraints {
            rotation_limits: Some(calculate_rotation_limits(
                piece,
                *pivot,
                other_pieces,
                canvas_bounds,
                bounds_policy,
                rotation_step_degrees,
            )),
            slide_limits: None,
        },
        ManipulationMode::Slidable {
            edge,
            base_range,
            current_offset,
        } => ManipulationConstraints {
            rotation_limits: None,
            slide_limits: Some(calculate_slide_limits(
                piece,
                edge,
                *base_range,
                *current_offset,
                other_pieces,
                canvas_bounds,
                bounds_policy,
                slide_step,
            )),
        },
        ManipulationMode::Fixed | ManipulationMode::Free => ManipulationConstraints::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Constraint, ConstraintKind};
    use crate::engine::calculate_transform;
    use crate::piece::PieceType;

    const BOUNDS: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

    fn place(piece_type: PieceType, center: Point) -> Piece {
        let piece = Piece::new(piece_type);
        let result = calculate_transform(
            &piece,
            &TransformOperation::Place {
                center,
                rotation: 0.0,
            },
            None,
            &[],
            BOUNDS,
            BoundsPolicy::Enforce,
        );
        piece.with_transform(result.transform)
    }

    fn rotatable_connection(canvas: &Piece, pending: &Piece, pivot: Point) -> Connection {
        Connection {
            kind: ConnectionKind::VertexToVertex {
                piece_a: canvas.id,
                vertex_a: 1,
                piece_b: pending.id,
                vertex_b: 0,
            },
            constraint: Constraint {
                kind: ConstraintKind::Rotatable { pivot },
                affected_piece: pending.id,
            },
        }
    }

    #[test]
    fn test_anchor_free_while_alone() {
        let anchor = place(PieceType::Square, Point::new(400.0, 300.0));
        let mode = classify(&anchor, &[], std::slice::from_ref(&anchor), true);
        assert_eq!(mode, ManipulationMode::Free);
    }

    #[test]
    fn test_anchor_fixed_once_others_exist() {
        let anchor = place(PieceType::Square, Point::new(400.0, 300.0));
        let other = place(PieceType::SmallTriangleA, Point::new(600.0, 300.0));
        let pieces = vec![anchor.clone(), other];
        let mode = classify(&anchor, &[], &pieces, true);
        assert_eq!(mode, ManipulationMode::Fixed);
    }

    #[test]
    fn test_rotatable_constraint_classifies_rotatable() {
        let anchor = place(PieceType::Square, Point::new(400.0, 300.0));
        let attached = place(PieceType::SmallTriangleA, Point::new(500.0, 300.0));
        let pivot = anchor.vertex_position(1).expect("vertex");
        let connections = vec![rotatable_connection(&anchor, &attached, pivot)];
        let pieces = vec![anchor, attached.clone()];

        match classify(&attached, &connections, &pieces, false) {
            ManipulationMode::Rotatable {
                pivot: p,
                current_angle,
            } => {
                assert!(p.distance_to(pivot) < 1e-9);
                assert!(current_angle.abs() < 1e-9);
            }
            other => panic!("expected rotatable, got {other:?}"),
        }
    }

    #[test]
    fn test_two_connections_classify_fixed() {
        let anchor = place(PieceType::Square, Point::new(400.0, 300.0));
        let attached = place(PieceType::SmallTriangleA, Point::new(500.0, 300.0));
        let pivot = anchor.vertex_position(1).expect("vertex");
        let connections = vec![
            rotatable_connection(&anchor, &attached, pivot),
            rotatable_connection(&anchor, &attached, pivot),
        ];
        let pieces = vec![anchor, attached.clone()];
        assert_eq!(
            classify(&attached, &connections, &pieces, false),
            ManipulationMode::Fixed
        );
    }

    #[test]
    fn test_connection_target_is_fixed() {
        let anchor = place(PieceType::Square, Point::new(400.0, 300.0));
        let middle = place(PieceType::SmallTriangleA, Point::new(500.0, 300.0));
        let attached = place(PieceType::SmallTriangleB, Point::new(600.0, 300.0));
        let pivot = middle.vertex_position(1).expect("vertex");
        let connections = vec![rotatable_connection(&middle, &attached, pivot)];
        let pieces = vec![anchor, middle.clone(), attached];
        // `middle` has a dependent, so it may not move.
        assert_eq!(
            classify(&middle, &connections, &pieces, false),
            ManipulationMode::Fixed
        );
    }

    #[test]
    fn test_dependent_overrides_own_constraint() {
        // anchor <- middle (rotatable) <- attached: the middle piece's own
        // rotatable constraint is overridden by the dependent, since
        // rotating it would break the recorded middle/attached coincidence.
        let anchor = place(PieceType::Square, Point::new(400.0, 300.0));
        let middle = place(PieceType::SmallTriangleA, Point::new(500.0, 300.0));
        let attached = place(PieceType::SmallTriangleB, Point::new(600.0, 300.0));
        let connections = vec![
            rotatable_connection(&anchor, &middle, anchor.vertex_position(1).expect("vertex")),
            rotatable_connection(&middle, &attached, middle.vertex_position(1).expect("vertex")),
        ];
        let pieces = vec![anchor, middle.clone(), attached.clone()];

        assert_eq!(
            classify(&middle, &connections, &pieces, false),
            ManipulationMode::Fixed
        );
        // The leaf of the chain keeps its freedom.
        assert!(matches!(
            classify(&attached, &connections, &pieces, false),
            ManipulationMode::Rotatable { .. }
        ));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let anchor = place(PieceType::Square, Point::new(400.0, 300.0));
        let attached = place(PieceType::SmallTriangleA, Point::new(500.0, 300.0));
        let pivot = anchor.vertex_position(1).expect("vertex");
        let connections = vec![rotatable_connection(&anchor, &attached, pivot)];
        let pieces = vec![anchor, attached.clone()];

        let first = classify(&attached, &connections, &pieces, false);
        let second = classify(&attached, &connections, &pieces, false);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rotation_limits_unobstructed_sweep_full_circle() {
        let piece = place(PieceType::SmallTriangleA, Point::new(400.0, 300.0));
        let pivot = piece.centroid();
        let limits =
            calculate_rotation_limits(&piece, pivot, &[], BOUNDS, BoundsPolicy::Enforce, 15.0);
        // No obstacles: the sweep runs the full capped circle both ways.
        assert!(limits.max - limits.min > std::f64::consts::PI);
    }

    #[test]
    fn test_rotation_limits_blocked_first_probe() {
        // Two squares flush along an edge: rotating either about its own
        // centroid swings its corners into the neighbor on the very first
        // probe, so both bounds collapse to the starting angle.
        let piece = place(PieceType::Square, Point::new(400.0, 300.0));
        let side = piece.bounding_box().width;
        let wall = place(PieceType::Square, Point::new(400.0 + side, 300.0));
        let limits = calculate_rotation_limits(
            &piece,
            piece.centroid(),
            std::slice::from_ref(&wall),
            BOUNDS,
            BoundsPolicy::Enforce,
            20.0,
        );
        let start = piece.rotation();
        assert!((limits.min - start).abs() < 1e-9);
        assert!((limits.max - start).abs() < 1e-9);
    }

    #[test]
    fn test_slide_limits_stay_in_base_range() {
        let piece = place(PieceType::SmallTriangleA, Point::new(400.0, 300.0));
        let edge = SlideEdge::new(Point::new(300.0, 300.0), Point::new(500.0, 300.0));
        let base = SlideRange::new(-25.0, 25.0);
        let limits = calculate_slide_limits(
            &piece,
            &edge,
            base,
            0.0,
            &[],
            BOUNDS,
            BoundsPolicy::Enforce,
            5.0,
        );
        assert!(limits.min >= base.min - 1e-9);
        assert!(limits.max <= base.max + 1e-9);
        // Unobstructed: the search reaches the last step inside the range.
        assert!((limits.max - 25.0).abs() < 1e-9);
        assert!((limits.min + 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_slide_limits_stop_at_obstacle_mid_range() {
        let piece = place(PieceType::Square, Point::new(400.0, 300.0));
        let side = piece.bounding_box().width;
        // A neighbor 12.5 units beyond flush: steps +5 and +10 clear it,
        // +15 collides, so the search stops after the second step.
        let wall = place(PieceType::Square, Point::new(400.0 + side + 12.5, 300.0));
        let edge = SlideEdge::new(Point::new(300.0, 300.0), Point::new(500.0, 300.0));
        let limits = calculate_slide_limits(
            &piece,
            &edge,
            SlideRange::new(-50.0, 50.0),
            0.0,
            std::slice::from_ref(&wall),
            BOUNDS,
            BoundsPolicy::Enforce,
            5.0,
        );
        assert!((limits.max - 10.0).abs() < 1e-9);
        assert!((limits.min + 50.0).abs() < 1e-9);

        // The returned endpoint is collision-free; one more step is not.
        let slide_is_valid = |distance: f64| {
            calculate_transform(
                &piece,
                &TransformOperation::Slide { distance, edge },
                None,
                std::slice::from_ref(&wall),
                BOUNDS,
                BoundsPolicy::Enforce,
            )
            .is_valid
        };
        assert!(slide_is_valid(10.0));
        assert!(!slide_is_valid(15.0));
    }

    #[test]
    fn test_slide_limits_blocked_direction_is_zero_width() {
        let piece = place(PieceType::Square, Point::new(400.0, 300.0));
        let side = piece.bounding_box().width;
        // A neighbor flush to the right blocks the +direction on the
        // first probe.
        let wall = place(PieceType::Square, Point::new(400.0 + side, 300.0));
        let edge = SlideEdge::new(Point::new(300.0, 300.0), Point::new(500.0, 300.0));
        let limits = calculate_slide_limits(
            &piece,
            &edge,
            SlideRange::new(-50.0, 50.0),
            0.0,
            std::slice::from_ref(&wall),
            BOUNDS,
            BoundsPolicy::Enforce,
            5.0,
        );
        assert!((limits.max - 0.0).abs() < 1e-9);
        assert!(limits.min < 0.0);
    }
}
