//! The seven tangram pieces - canonical geometry and placed instances.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{self, Point, Rect, Transform};
use crate::remap;

/// Canvas units per canonical unit.
///
/// Canonical coordinates use the classic dissection of a side-2 square;
/// this scale maps them to comfortable on-screen sizes.
pub const PIECE_SCALE: f64 = 50.0;

/// Unique identifier for a placed piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceId(Uuid);

impl PieceId {
    /// Create a new unique piece ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse from a string representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for PieceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PieceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

const SQRT_2: f64 = std::f64::consts::SQRT_2;
const HALF_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;

const SMALL_TRIANGLE: [Point; 3] = [
    Point::new(0.0, 0.0),
    Point::new(1.0, 0.0),
    Point::new(0.0, 1.0),
];

const MEDIUM_TRIANGLE: [Point; 3] = [
    Point::new(0.0, 0.0),
    Point::new(SQRT_2, 0.0),
    Point::new(0.0, SQRT_2),
];

const LARGE_TRIANGLE: [Point; 3] = [
    Point::new(0.0, 0.0),
    Point::new(2.0, 0.0),
    Point::new(0.0, 2.0),
];

const SQUARE: [Point; 4] = [
    Point::new(0.0, 0.0),
    Point::new(HALF_SQRT_2, 0.0),
    Point::new(HALF_SQRT_2, HALF_SQRT_2),
    Point::new(0.0, HALF_SQRT_2),
];

const PARALLELOGRAM: [Point; 4] = [
    Point::new(0.0, 0.0),
    Point::new(1.0, 0.0),
    Point::new(1.5, 0.5),
    Point::new(0.5, 0.5),
];

/// The seven canonical tangram piece types.
///
/// Each type has a fixed canonical vertex list; the puzzle may contain at
/// most one piece of each type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PieceType {
    /// First small right triangle (unit legs).
    SmallTriangleA,
    /// Second small right triangle (unit legs).
    SmallTriangleB,
    /// Medium right triangle (legs of length sqrt(2)).
    MediumTriangle,
    /// First large right triangle (legs of length 2).
    LargeTriangleA,
    /// Second large right triangle (legs of length 2).
    LargeTriangleB,
    /// Square (side sqrt(2)/2).
    Square,
    /// Parallelogram - the only piece that is not mirror-symmetric.
    Parallelogram,
}

impl PieceType {
    /// All seven piece types in canonical order.
    pub const ALL: [PieceType; 7] = [
        Self::SmallTriangleA,
        Self::SmallTriangleB,
        Self::MediumTriangle,
        Self::LargeTriangleA,
        Self::LargeTriangleB,
        Self::Square,
        Self::Parallelogram,
    ];

    /// Canonical (unscaled, unrotated) vertex list for this type.
    #[must_use]
    pub const fn canonical_vertices(self) -> &'static [Point] {
        match self {
            Self::SmallTriangleA | Self::SmallTriangleB => &SMALL_TRIANGLE,
            Self::MediumTriangle => &MEDIUM_TRIANGLE,
            Self::LargeTriangleA | Self::LargeTriangleB => &LARGE_TRIANGLE,
            Self::Square => &SQUARE,
            Self::Parallelogram => &PARALLELOGRAM,
        }
    }

    /// Number of vertices (equal to the number of edges).
    #[must_use]
    pub const fn vertex_count(self) -> usize {
        self.canonical_vertices().len()
    }

    /// Stable string form, used in serialized documents and checksums.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SmallTriangleA => "smallTriangleA",
            Self::SmallTriangleB => "smallTriangleB",
            Self::MediumTriangle => "mediumTriangle",
            Self::LargeTriangleA => "largeTriangleA",
            Self::LargeTriangleB => "largeTriangleB",
            Self::Square => "square",
            Self::Parallelogram => "parallelogram",
        }
    }
}

impl std::fmt::Display for PieceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A placed tangram piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    /// Unique identifier.
    pub id: PieceId,
    /// Which of the seven shapes this is.
    pub piece_type: PieceType,
    /// Placement transform (rotation + translation).
    pub transform: Transform,
    /// Whether the piece is horizontally mirrored.
    ///
    /// Only meaningful in practice for the parallelogram; the other
    /// pieces are mirror-symmetric up to relabeling.
    #[serde(default)]
    pub is_flipped: bool,
}

impl Piece {
    /// Create a piece of the given type with an identity transform.
    #[must_use]
    pub fn new(piece_type: PieceType) -> Self {
        Self {
            id: PieceId::new(),
            piece_type,
            transform: Transform::identity(),
            is_flipped: false,
        }
    }

    /// Set the placement transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the flip flag.
    #[must_use]
    pub const fn with_flipped(mut self, is_flipped: bool) -> Self {
        self.is_flipped = is_flipped;
        self
    }

    /// Scaled canonical vertices with the flip applied, before the
    /// placement transform.
    ///
    /// The mirror is taken about the vertical axis through the canonical
    /// centroid, so flipping leaves the centroid in place.
    #[must_use]
    pub fn local_vertices(&self) -> Vec<Point> {
        let canonical = self.piece_type.canonical_vertices();
        let center_x = geometry::centroid(canonical).x;
        canonical
            .iter()
            .map(|v| {
                let x = if self.is_flipped {
                    2.0 * center_x - v.x
                } else {
                    v.x
                };
                Point::new(x * PIECE_SCALE, v.y * PIECE_SCALE)
            })
            .collect()
    }

    /// World-space vertices: flip, scale, then the placement transform.
    ///
    /// Indexed in canonical slot order; use [`Piece::vertex_position`] to
    /// look up by physically-realized index.
    #[must_use]
    pub fn transformed_vertices(&self) -> Vec<Point> {
        self.local_vertices()
            .iter()
            .map(|v| self.transform.apply(*v))
            .collect()
    }

    /// World-space centroid of the placed piece.
    #[must_use]
    pub fn centroid(&self) -> Point {
        geometry::centroid(&self.transformed_vertices())
    }

    /// World-space bounding box of the placed piece.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        geometry::bounding_box(&self.transformed_vertices())
    }

    /// Map a physically-realized vertex index to its canonical slot.
    ///
    /// The flip swaps which geometric vertex a parallelogram index points
    /// at, so reads by realized index go through the reflection remap.
    fn vertex_slot(&self, index: usize) -> usize {
        if self.is_flipped && self.piece_type == PieceType::Parallelogram {
            remap::remap_vertex(index)
        } else {
            index
        }
    }

    fn edge_slot(&self, index: usize) -> usize {
        if self.is_flipped && self.piece_type == PieceType::Parallelogram {
            remap::remap_edge(index)
        } else {
            index
        }
    }

    /// World position of the vertex with the given realized index.
    #[must_use]
    pub fn vertex_position(&self, index: usize) -> Option<Point> {
        let vertices = self.transformed_vertices();
        vertices.get(self.vertex_slot(index)).copied()
    }

    /// World endpoints of the edge with the given realized index.
    ///
    /// Edge `i` runs from vertex slot `i` to slot `(i + 1) % n`.
    #[must_use]
    pub fn edge_points(&self, index: usize) -> Option<(Point, Point)> {
        let vertices = self.transformed_vertices();
        let slot = self.edge_slot(index);
        if slot >= vertices.len() {
            return None;
        }
        Some((vertices[slot], vertices[(slot + 1) % vertices.len()]))
    }

    /// The current rotation of the piece in radians.
    #[must_use]
    pub fn rotation(&self) -> f64 {
        self.transform.rotation_angle()
    }
}
