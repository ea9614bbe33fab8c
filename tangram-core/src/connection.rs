//! Symbolic connections between pieces and the constraints they induce.
//!
//! A connection records that two pieces' specific vertex/edge indices must
//! coincide; the constraint captures whatever freedom of movement that
//! leaves the attached piece.

use serde::{Deserialize, Serialize};

use crate::error::{TangramError, TangramResult};
use crate::geometry::{Point, EPSILON};
use crate::piece::{Piece, PieceId, PieceType};
use crate::remap;

/// A selectable feature on a piece: a vertex or an edge.
///
/// Indices are canonical slot indices as produced by
/// [`connection_points`]; the resolver translates them to
/// physically-realized indices before a [`Connection`] is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "lowercase")]
pub enum PointKind {
    /// A polygon vertex.
    Vertex(usize),
    /// A polygon edge (from vertex `i` to vertex `i + 1`).
    Edge(usize),
}

/// A selectable connection point in world space.
///
/// Ephemeral: produced on demand from a piece, never stored in the puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectionPoint {
    /// The piece this point belongs to.
    pub piece_id: PieceId,
    /// Which feature of the piece this is.
    pub kind: PointKind,
    /// World-space position (edge points use the midpoint).
    pub position: Point,
}

/// A directed edge segment a piece may slide along.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlideEdge {
    /// Edge start in world space.
    pub start: Point,
    /// Edge end in world space.
    pub end: Point,
}

impl SlideEdge {
    /// Create an edge from endpoints.
    #[must_use]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// The edge vector from start to end.
    #[must_use]
    pub fn vector(&self) -> Point {
        self.start.to(self.end)
    }

    /// Unit vector along the edge.
    #[must_use]
    pub fn unit(&self) -> Point {
        self.vector().normalized()
    }

    /// Edge length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.vector().length()
    }

    /// Edge midpoint.
    #[must_use]
    pub fn midpoint(&self) -> Point {
        Point::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }
}

/// Degrees of freedom a connection leaves its affected piece.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ConstraintKind {
    /// Placement fully determined.
    Fixed,
    /// Rotation about a shared vertex remains free.
    Rotatable {
        /// World-space pivot point.
        pivot: Point,
    },
    /// Translation along a shared edge remains free.
    Slidable {
        /// The edge being slid along, in world space.
        edge: SlideEdge,
    },
}

/// The constraint a connection imposes, bound to the piece it restricts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// The kind of freedom remaining.
    pub kind: ConstraintKind,
    /// The piece whose movement is constrained.
    pub affected_piece: PieceId,
}

/// Which features of the two pieces must coincide.
///
/// `piece_a` is the already-placed (canvas) side for vertex/edge pairs;
/// for vertex-to-edge, `piece_a` is whichever side contributes the vertex.
/// All indices are physically-realized (post-remap for a flipped
/// parallelogram).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ConnectionKind {
    /// Two vertices coincide.
    VertexToVertex {
        /// Canvas-side piece.
        piece_a: PieceId,
        /// Canvas-side vertex index.
        vertex_a: usize,
        /// Pending-side piece.
        piece_b: PieceId,
        /// Pending-side vertex index.
        vertex_b: usize,
    },
    /// Two edges lie against each other.
    EdgeToEdge {
        /// Canvas-side piece.
        piece_a: PieceId,
        /// Canvas-side edge index.
        edge_a: usize,
        /// Pending-side piece.
        piece_b: PieceId,
        /// Pending-side edge index.
        edge_b: usize,
    },
    /// A vertex lies on an edge.
    VertexToEdge {
        /// The piece contributing the vertex.
        piece_a: PieceId,
        /// Vertex index on `piece_a`.
        vertex: usize,
        /// The piece contributing the edge.
        piece_b: PieceId,
        /// Edge index on `piece_b`.
        edge: usize,
    },
}

impl ConnectionKind {
    /// The two pieces this connection references.
    #[must_use]
    pub const fn pieces(&self) -> (PieceId, PieceId) {
        match *self {
            Self::VertexToVertex {
                piece_a, piece_b, ..
            }
            | Self::EdgeToEdge {
                piece_a, piece_b, ..
            }
            | Self::VertexToEdge {
                piece_a, piece_b, ..
            } => (piece_a, piece_b),
        }
    }
}

/// A committed geometric connection between two placed pieces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Which features must coincide.
    pub kind: ConnectionKind,
    /// The freedom the connection leaves the attached piece.
    pub constraint: Constraint,
}

impl Connection {
    /// True when the connection references the given piece on either side.
    #[must_use]
    pub fn references(&self, piece_id: PieceId) -> bool {
        let (a, b) = self.kind.pieces();
        a == piece_id || b == piece_id
    }

    /// True when the connection constrains the given piece.
    #[must_use]
    pub fn affects(&self, piece_id: PieceId) -> bool {
        self.constraint.affected_piece == piece_id
    }
}

/// Translate a selected point's canonical index into the physically-
/// realized one for the owning piece.
fn realized_kind(piece: &Piece, kind: PointKind) -> PointKind {
    if piece.is_flipped && piece.piece_type == PieceType::Parallelogram {
        match kind {
            PointKind::Vertex(i) => PointKind::Vertex(remap::remap_vertex(i)),
            PointKind::Edge(i) => PointKind::Edge(remap::remap_edge(i)),
        }
    } else {
        kind
    }
}

/// A mixed vertex/edge correspondence with realized indices.
#[derive(Debug, Clone, Copy)]
enum MixedPair {
    /// Canvas vertex against a pending edge.
    CanvasVertex {
        vertex: usize,
        edge: usize,
        position: Point,
    },
    /// Canvas edge against a pending vertex.
    CanvasEdge { edge: usize, vertex: usize },
}

/// Resolve a set of selected point correspondences into a connection.
///
/// `canvas_points` and `pending_points` are paired by position and must
/// have equal, non-zero cardinality. Vertex-vertex pairs take precedence
/// over edge-edge pairs, which take precedence over mixed pairs. For a
/// flipped parallelogram on either side, local indices are remapped to the
/// physically-realized ones before the connection is built.
///
/// Constraint derivation: a single vertex pair leaves rotation about the
/// shared vertex; a single edge pair leaves sliding when the edge lengths
/// differ (a fully mated pair of equal edges is fixed); two or more
/// correspondences fully determine the placement.
///
/// # Errors
///
/// Returns [`TangramError::InvalidConnections`] when the cardinalities
/// mismatch or no pair is resolvable, and
/// [`TangramError::PieceNotFound`] when a canvas point references a piece
/// that is not in the assembly.
pub fn resolve_connection(
    canvas_points: &[ConnectionPoint],
    pending_points: &[ConnectionPoint],
    pending: &Piece,
    pieces: &[Piece],
) -> TangramResult<Connection> {
    if canvas_points.is_empty() || canvas_points.len() != pending_points.len() {
        return Err(TangramError::InvalidConnections(format!(
            "selected {} canvas and {} pending points",
            canvas_points.len(),
            pending_points.len()
        )));
    }

    let canvas_id = canvas_points[0].piece_id;
    let canvas_piece = pieces
        .iter()
        .find(|p| p.id == canvas_id)
        .ok_or_else(|| TangramError::PieceNotFound(canvas_id.to_string()))?;

    let mut vertex_pairs: Vec<(usize, usize, Point)> = Vec::new();
    let mut edge_pairs: Vec<(usize, usize)> = Vec::new();
    let mut mixed_pairs: Vec<MixedPair> = Vec::new();
    for (canvas, sel) in canvas_points.iter().zip(pending_points) {
        let canvas_kind = realized_kind(canvas_piece, canvas.kind);
        let pending_kind = realized_kind(pending, sel.kind);
        match (canvas_kind, pending_kind) {
            (PointKind::Vertex(va), PointKind::Vertex(vb)) => {
                vertex_pairs.push((va, vb, canvas.position));
            }
            (PointKind::Edge(ea), PointKind::Edge(eb)) => edge_pairs.push((ea, eb)),
            (PointKind::Vertex(vertex), PointKind::Edge(edge)) => {
                mixed_pairs.push(MixedPair::CanvasVertex {
                    vertex,
                    edge,
                    position: canvas.position,
                });
            }
            (PointKind::Edge(edge), PointKind::Vertex(vertex)) => {
                mixed_pairs.push(MixedPair::CanvasEdge { edge, vertex });
            }
        }
    }

    let total = vertex_pairs.len() + edge_pairs.len() + mixed_pairs.len();
    let fully_determined = total >= 2;

    let (kind, freedom) = if let Some(&(va, vb, position)) = vertex_pairs.first() {
        (
            ConnectionKind::VertexToVertex {
                piece_a: canvas_id,
                vertex_a: va,
                piece_b: pending.id,
                vertex_b: vb,
            },
            ConstraintKind::Rotatable { pivot: position },
        )
    } else if let Some(&(ea, eb)) = edge_pairs.first() {
        let (start, end) = canvas_piece
            .edge_points(ea)
            .ok_or_else(|| TangramError::InvalidConnections(format!("no edge {ea} on canvas piece")))?;
        let edge = SlideEdge::new(start, end);
        let pending_len = pending
            .edge_points(eb)
            .map(|(s, e)| s.distance_to(e))
            .ok_or_else(|| {
                TangramError::InvalidConnections(format!("no edge {eb} on pending piece"))
            })?;
        let freedom = if (edge.length() - pending_len).abs() < EPSILON {
            // Equal-length edges mate flush.
            ConstraintKind::Fixed
        } else {
            ConstraintKind::Slidable { edge }
        };
        (
            ConnectionKind::EdgeToEdge {
                piece_a: canvas_id,
                edge_a: ea,
                piece_b: pending.id,
                edge_b: eb,
            },
            freedom,
        )
    } else if let Some(&pair) = mixed_pairs.first() {
        match pair {
            // Pending edge through a canvas vertex: rotation about the
            // vertex remains.
            MixedPair::CanvasVertex {
                vertex,
                edge,
                position,
            } => (
                ConnectionKind::VertexToEdge {
                    piece_a: canvas_id,
                    vertex,
                    piece_b: pending.id,
                    edge,
                },
                ConstraintKind::Rotatable { pivot: position },
            ),
            // Pending vertex on a canvas edge: sliding along the edge
            // remains.
            MixedPair::CanvasEdge { edge, vertex } => {
                let (start, end) = canvas_piece.edge_points(edge).ok_or_else(|| {
                    TangramError::InvalidConnections(format!("no edge {edge} on canvas piece"))
                })?;
                (
                    ConnectionKind::VertexToEdge {
                        piece_a: pending.id,
                        vertex,
                        piece_b: canvas_id,
                        edge,
                    },
                    ConstraintKind::Slidable {
                        edge: SlideEdge::new(start, end),
                    },
                )
            }
        }
    } else {
        return Err(TangramError::InvalidConnections(
            "no resolvable correspondence".to_string(),
        ));
    };

    let constraint = Constraint {
        kind: if fully_determined {
            ConstraintKind::Fixed
        } else {
            freedom
        },
        affected_piece: pending.id,
    };

    tracing::debug!(
        pending = %pending.id,
        canvas = %canvas_id,
        pairs = total,
        "resolved connection"
    );

    Ok(Connection { kind, constraint })
}

/// Enumerate a piece's selectable connection points in world space.
///
/// Vertices first (canonical index order), then edges (midpoints). Kinds
/// carry canonical indices; the resolver remaps them for a flipped
/// parallelogram.
#[must_use]
pub fn connection_points(piece: &Piece) -> Vec<ConnectionPoint> {
    let vertices = piece.transformed_vertices();
    let n = vertices.len();
    let mut points = Vec::with_capacity(n * 2);
    for (i, v) in vertices.iter().enumerate() {
        points.push(ConnectionPoint {
            piece_id: piece.id,
            kind: PointKind::Vertex(i),
            position: *v,
        });
    }
    for i in 0..n {
        let mid = Point::new(
            (vertices[i].x + vertices[(i + 1) % n].x) / 2.0,
            (vertices[i].y + vertices[(i + 1) % n].y) / 2.0,
        );
        points.push(ConnectionPoint {
            piece_id: piece.id,
            kind: PointKind::Edge(i),
            position: mid,
        });
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Transform;

    fn placed(piece_type: PieceType) -> Piece {
        Piece::new(piece_type).with_transform(Transform::translation(100.0, 100.0))
    }

    fn point_of(piece: &Piece, kind: PointKind) -> ConnectionPoint {
        connection_points(piece)
            .into_iter()
            .find(|p| p.kind == kind)
            .expect("point exists")
    }

    #[test]
    fn test_single_vertex_pair_is_rotatable() {
        let canvas = placed(PieceType::Square);
        let pending = Piece::new(PieceType::SmallTriangleA);
        let connection = resolve_connection(
            &[point_of(&canvas, PointKind::Vertex(1))],
            &[point_of(&pending, PointKind::Vertex(0))],
            &pending,
            std::slice::from_ref(&canvas),
        )
        .expect("resolvable");

        assert!(matches!(
            connection.constraint.kind,
            ConstraintKind::Rotatable { .. }
        ));
        assert_eq!(connection.constraint.affected_piece, pending.id);
    }

    #[test]
    fn test_equal_edges_resolve_fixed() {
        // Small triangle legs have the same length.
        let canvas = placed(PieceType::SmallTriangleA);
        let pending = Piece::new(PieceType::SmallTriangleB);
        let connection = resolve_connection(
            &[point_of(&canvas, PointKind::Edge(0))],
            &[point_of(&pending, PointKind::Edge(0))],
            &pending,
            std::slice::from_ref(&canvas),
        )
        .expect("resolvable");

        assert!(matches!(connection.constraint.kind, ConstraintKind::Fixed));
    }

    #[test]
    fn test_unequal_edges_resolve_slidable() {
        let canvas = placed(PieceType::LargeTriangleA);
        let pending = Piece::new(PieceType::SmallTriangleA);
        let connection = resolve_connection(
            &[point_of(&canvas, PointKind::Edge(0))],
            &[point_of(&pending, PointKind::Edge(0))],
            &pending,
            std::slice::from_ref(&canvas),
        )
        .expect("resolvable");

        match connection.constraint.kind {
            ConstraintKind::Slidable { edge } => {
                assert!((edge.length() - 100.0).abs() < 1e-9);
            }
            other => panic!("expected slidable, got {other:?}"),
        }
    }

    #[test]
    fn test_two_pairs_resolve_fixed() {
        let canvas = placed(PieceType::Square);
        let pending = Piece::new(PieceType::SmallTriangleA);
        let connection = resolve_connection(
            &[
                point_of(&canvas, PointKind::Vertex(1)),
                point_of(&canvas, PointKind::Vertex(2)),
            ],
            &[
                point_of(&pending, PointKind::Vertex(0)),
                point_of(&pending, PointKind::Vertex(1)),
            ],
            &pending,
            std::slice::from_ref(&canvas),
        )
        .expect("resolvable");

        assert!(matches!(connection.constraint.kind, ConstraintKind::Fixed));
        assert!(matches!(
            connection.kind,
            ConnectionKind::VertexToVertex { .. }
        ));
    }

    #[test]
    fn test_cardinality_mismatch_rejected() {
        let canvas = placed(PieceType::Square);
        let pending = Piece::new(PieceType::SmallTriangleA);
        let result = resolve_connection(
            &[
                point_of(&canvas, PointKind::Vertex(0)),
                point_of(&canvas, PointKind::Vertex(1)),
            ],
            &[point_of(&pending, PointKind::Vertex(0))],
            &pending,
            std::slice::from_ref(&canvas),
        );
        assert!(matches!(result, Err(TangramError::InvalidConnections(_))));
    }

    #[test]
    fn test_flipped_parallelogram_indices_are_remapped() {
        let canvas = placed(PieceType::Square);
        let pending = Piece::new(PieceType::Parallelogram).with_flipped(true);
        let connection = resolve_connection(
            &[point_of(&canvas, PointKind::Vertex(0))],
            &[point_of(&pending, PointKind::Vertex(0))],
            &pending,
            std::slice::from_ref(&canvas),
        )
        .expect("resolvable");

        // Canonical vertex 0 of a flipped parallelogram realizes as 1.
        match connection.kind {
            ConnectionKind::VertexToVertex { vertex_b, .. } => assert_eq!(vertex_b, 1),
            other => panic!("expected vertex-to-vertex, got {other:?}"),
        }
    }

    #[test]
    fn test_connection_point_enumeration() {
        let piece = Piece::new(PieceType::Square);
        let points = connection_points(&piece);
        assert_eq!(points.len(), 8);
        assert!(points.iter().all(|p| p.piece_id == piece.id));
    }
}
