//! Transform engine - computing and validating placement transforms.
//!
//! Every entry point is a pure function: candidate transforms are computed
//! from an operation plus the piece's captured transform, validated
//! against the rest of the assembly, and returned as data. Violations are
//! collected, never short-circuited, so the caller can surface the most
//! relevant one.

use serde::{Deserialize, Serialize};

use crate::connection::{Connection, ConnectionKind, SlideEdge};
use crate::error::{TangramError, TangramResult};
use crate::geometry::{self, Point, Rect, Transform, EPSILON};
use crate::piece::{Piece, PieceId};

/// A requested transform operation on a piece.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data", rename_all = "lowercase")]
pub enum TransformOperation {
    /// Center the piece's centroid at a point with a given rotation,
    /// ignoring its current transform.
    Place {
        /// Target centroid position.
        center: Point,
        /// Rotation in radians.
        rotation: f64,
    },
    /// Rotate the piece's captured transform about a pivot.
    ///
    /// `angle` is the cumulative gesture angle, not a per-frame delta.
    Rotate {
        /// Cumulative rotation in radians.
        angle: f64,
        /// World-space pivot.
        pivot: Point,
    },
    /// Translate the piece's captured transform along an edge.
    ///
    /// `distance` is the cumulative gesture offset, not a per-frame delta.
    Slide {
        /// Cumulative signed distance along the edge vector.
        distance: f64,
        /// The edge being slid along.
        edge: SlideEdge,
    },
    /// Re-validate the piece exactly where it is.
    ///
    /// Used to check an already-computed placement without perturbing it.
    Drag {
        /// The point the piece was dragged to (informational only).
        to: Point,
    },
}

/// A single validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum Violation {
    /// The candidate polygon has positive-area intersection with another
    /// piece.
    Overlap {
        /// The intersected piece.
        other: PieceId,
    },
    /// The nominated connection points are no longer coincident.
    ConnectionBroken,
    /// The candidate bounding box leaves the canvas.
    OutOfBounds,
}

/// How out-of-bounds violations affect validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsPolicy {
    /// `OutOfBounds` invalidates the result.
    #[default]
    Enforce,
    /// `OutOfBounds` is recorded but does not invalidate the result.
    ///
    /// Used during interactive dragging; commits re-validate with
    /// [`BoundsPolicy::Enforce`].
    Advisory,
}

/// Which points snapped together in a valid connection placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapInfo {
    /// The world-space point the piece snapped to.
    pub position: Point,
    /// Residual distance after snapping.
    pub residual: f64,
}

/// Outcome of a transform calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformResult {
    /// The candidate transform that was validated.
    pub transform: Transform,
    /// True when no hard violation was recorded.
    pub is_valid: bool,
    /// All violations found, in check order (connection, overlap, bounds).
    pub violations: Vec<Violation>,
    /// Snap metadata for satisfied connection placements.
    pub snap_info: Option<SnapInfo>,
}

/// Measure how well a connection is satisfied by a candidate placement.
///
/// Returns the snap point and residual when satisfied, `None` when broken
/// or when either referenced piece cannot be found.
fn connection_residual(
    candidate: &Piece,
    connection: &Connection,
    other_pieces: &[Piece],
) -> Option<SnapInfo> {
    let find = |id: PieceId| -> Option<&Piece> {
        if id == candidate.id {
            Some(candidate)
        } else {
            other_pieces.iter().find(|p| p.id == id)
        }
    };

    match connection.kind {
        ConnectionKind::VertexToVertex {
            piece_a,
            vertex_a,
            piece_b,
            vertex_b,
        } => {
            let pa = find(piece_a)?.vertex_position(vertex_a)?;
            let pb = find(piece_b)?.vertex_position(vertex_b)?;
            let residual = pa.distance_to(pb);
            (residual < EPSILON).then_some(SnapInfo {
                position: pa,
                residual,
            })
        }
        ConnectionKind::EdgeToEdge {
            piece_a,
            edge_a,
            piece_b,
            edge_b,
        } => {
            let (sa, ea) = find(piece_a)?.edge_points(edge_a)?;
            let (sb, eb) = find(piece_b)?.edge_points(edge_b)?;
            // Collinear within epsilon, and the 1-D intervals still touch.
            let off_s = geometry::distance_to_line(sb, sa, ea).abs();
            let off_e = geometry::distance_to_line(eb, sa, ea).abs();
            if off_s >= EPSILON || off_e >= EPSILON {
                return None;
            }
            let unit = sa.to(ea).normalized();
            let (a0, a1) = (sa.dot(unit), ea.dot(unit));
            let (b0, b1) = (sb.dot(unit), eb.dot(unit));
            let (a_min, a_max) = (a0.min(a1), a0.max(a1));
            let (b_min, b_max) = (b0.min(b1), b0.max(b1));
            let touching = a_max >= b_min - EPSILON && b_max >= a_min - EPSILON;
            touching.then_some(SnapInfo {
                position: SlideEdge::new(sa, ea).midpoint(),
                residual: off_s.max(off_e),
            })
        }
        ConnectionKind::VertexToEdge {
            piece_a,
            vertex,
            piece_b,
            edge,
        } => {
            let v = find(piece_a)?.vertex_position(vertex)?;
            let (s, e) = find(piece_b)?.edge_points(edge)?;
            let residual = v.distance_to(geometry::project_onto_segment(v, s, e));
            (residual < EPSILON).then_some(SnapInfo {
                position: v,
                residual,
            })
        }
    }
}

/// Compute and validate a candidate transform for a piece.
///
/// The candidate is derived purely from `operation` and the transform
/// carried by `piece` (for gestures, the transform captured at gesture
/// start). Validation order: connection coincidence, polygon overlap
/// against every other piece, canvas bounds. Bounds are only checked when
/// `canvas_bounds` has positive area, and only invalidate the result
/// under [`BoundsPolicy::Enforce`].
#[must_use]
pub fn calculate_transform(
    piece: &Piece,
    operation: &TransformOperation,
    connection: Option<&Connection>,
    other_pieces: &[Piece],
    canvas_bounds: Rect,
    bounds_policy: BoundsPolicy,
) -> TransformResult {
    let transform = match *operation {
        TransformOperation::Place { center, rotation } => {
            let rotated = Transform::rotation(rotation);
            let local_center = geometry::centroid(&piece.local_vertices());
            let delta = rotated.apply(local_center).to(center);
            rotated.translated(delta)
        }
        TransformOperation::Rotate { angle, pivot } => piece.transform.rotated_about(angle, pivot),
        TransformOperation::Slide { distance, edge } => {
            piece.transform.translated(edge.unit().scaled(distance))
        }
        TransformOperation::Drag { .. } => piece.transform,
    };

    let candidate = piece.clone().with_transform(transform);
    let candidate_polygon = candidate.transformed_vertices();
    let mut violations = Vec::new();

    let snap_info = if let Some(connection) = connection {
        let snap = connection_residual(&candidate, connection, other_pieces);
        if snap.is_none() {
            violations.push(Violation::ConnectionBroken);
        }
        snap
    } else {
        None
    };

    for other in other_pieces {
        if other.id == candidate.id {
            continue;
        }
        if geometry::polygons_overlap(&candidate_polygon, &other.transformed_vertices()) {
            violations.push(Violation::Overlap { other: other.id });
        }
    }

    if canvas_bounds.is_positive() && !canvas_bounds.contains_rect(&candidate.bounding_box()) {
        violations.push(Violation::OutOfBounds);
    }

    let is_valid = violations.iter().all(|v| {
        matches!(v, Violation::OutOfBounds) && bounds_policy == BoundsPolicy::Advisory
    });

    if !is_valid {
        tracing::debug!(piece = %piece.id, ?violations, "candidate transform rejected");
    }

    TransformResult {
        transform,
        is_valid,
        violations,
        snap_info,
    }
}

/// Compute the transform that realizes a connection for a pending piece.
///
/// - Vertex-to-vertex keeps the pending rotation and translates the
///   pending vertex onto the canvas vertex.
/// - Edge-to-edge rotates the pending piece so its edge runs anti-parallel
///   to the canvas edge (the pieces end up on opposite sides) and mates
///   the edge midpoints.
/// - Vertex-to-edge translates the pending vertex onto the closest point
///   of the canvas edge segment.
///
/// The result is a candidate only; callers validate it with a
/// [`TransformOperation::Drag`] pass.
///
/// # Errors
///
/// Returns [`TangramError::PlacementCalculationFailed`] when a referenced
/// piece or feature cannot be resolved.
pub fn connection_placement(
    pending: &Piece,
    connection: &Connection,
    pieces: &[Piece],
) -> TangramResult<Transform> {
    let fail = |what: &str| TangramError::PlacementCalculationFailed(what.to_string());
    let find = |id: PieceId| pieces.iter().find(|p| p.id == id);

    match connection.kind {
        ConnectionKind::VertexToVertex {
            piece_a,
            vertex_a,
            piece_b,
            vertex_b,
        } => {
            if piece_b != pending.id {
                return Err(fail("connection does not attach the pending piece"));
            }
            let target = find(piece_a)
                .and_then(|p| p.vertex_position(vertex_a))
                .ok_or_else(|| fail("canvas vertex not found"))?;
            let current = pending
                .vertex_position(vertex_b)
                .ok_or_else(|| fail("pending vertex not found"))?;
            Ok(pending.transform.translated(current.to(target)))
        }
        ConnectionKind::EdgeToEdge {
            piece_a,
            edge_a,
            piece_b,
            edge_b,
        } => {
            if piece_b != pending.id {
                return Err(fail("connection does not attach the pending piece"));
            }
            let (sa, ea) = find(piece_a)
                .and_then(|p| p.edge_points(edge_a))
                .ok_or_else(|| fail("canvas edge not found"))?;
            let (sb, eb) = pending
                .edge_points(edge_b)
                .ok_or_else(|| fail("pending edge not found"))?;
            let canvas_dir = sa.to(ea);
            let pending_dir = sb.to(eb);
            if canvas_dir.length() < EPSILON || pending_dir.length() < EPSILON {
                return Err(fail("degenerate edge"));
            }
            // Anti-parallel mate: pending edge direction becomes the
            // reverse of the canvas edge direction.
            let target_angle = (-canvas_dir.y).atan2(-canvas_dir.x);
            let current_angle = pending_dir.y.atan2(pending_dir.x);
            let mid_b = SlideEdge::new(sb, eb).midpoint();
            let rotated = pending
                .transform
                .rotated_about(target_angle - current_angle, mid_b);
            let mid_a = SlideEdge::new(sa, ea).midpoint();
            Ok(rotated.translated(mid_b.to(mid_a)))
        }
        ConnectionKind::VertexToEdge {
            piece_a,
            vertex,
            piece_b,
            edge,
        } => {
            // Either side may own the vertex; translate the pending piece
            // so the pair coincides.
            if piece_a == pending.id {
                let (s, e) = find(piece_b)
                    .and_then(|p| p.edge_points(edge))
                    .ok_or_else(|| fail("canvas edge not found"))?;
                let v = pending
                    .vertex_position(vertex)
                    .ok_or_else(|| fail("pending vertex not found"))?;
                let target = geometry::project_onto_segment(v, s, e);
                Ok(pending.transform.translated(v.to(target)))
            } else {
                let v = find(piece_a)
                    .and_then(|p| p.vertex_position(vertex))
                    .ok_or_else(|| fail("canvas vertex not found"))?;
                let (s, e) = pending
                    .edge_points(edge)
                    .ok_or_else(|| fail("pending edge not found"))?;
                let closest = geometry::project_onto_segment(v, s, e);
                Ok(pending.transform.translated(closest.to(v)))
            }
        }
    }
}
