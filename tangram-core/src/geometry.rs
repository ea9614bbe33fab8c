//! Geometry kernel - points, affine transforms, and polygon predicates.
//!
//! Every operation here is pure and side-effect-free. Polygons are given
//! as ordered vertex lists; winding order does not matter to any predicate.

use serde::{Deserialize, Serialize};

/// Tolerance for coincidence and overlap decisions.
///
/// Boundary contact (shared edges, shared vertices) must compare as
/// non-overlapping, so every interval test carries this slack.
pub const EPSILON: f64 = 1e-6;

/// A point (or vector) in canvas space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Create a point from coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector from `self` to `other`.
    #[must_use]
    pub fn to(self, other: Self) -> Self {
        Self::new(other.x - self.x, other.y - self.y)
    }

    /// Component-wise sum.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Scale both components.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Dot product, treating both points as vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Euclidean length, treating the point as a vector.
    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        self.to(other).length()
    }

    /// Unit vector in the same direction, or zero if degenerate.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len < EPSILON {
            Self::default()
        } else {
            self.scaled(1.0 / len)
        }
    }

    /// Perpendicular vector (rotated 90 degrees counter-clockwise).
    #[must_use]
    pub fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }
}

/// An axis-aligned rectangle, used for canvas bounds and bounding boxes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Create a rectangle from origin and size.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the rectangle encloses a positive area.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// True when `other` lies entirely inside this rectangle (within epsilon).
    #[must_use]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x - EPSILON
            && other.y >= self.y - EPSILON
            && other.x + other.width <= self.x + self.width + EPSILON
            && other.y + other.height <= self.y + self.height + EPSILON
    }
}

/// A 2D affine transform in `{a, b, c, d, tx, ty}` form.
///
/// Applies as `(x, y) -> (a*x + c*y + tx, b*x + d*y + ty)`; `a..d` carry
/// rotation (and, for the parallelogram, reflection), `tx`/`ty` translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Row 1, column 1.
    pub a: f64,
    /// Row 2, column 1.
    pub b: f64,
    /// Row 1, column 2.
    pub c: f64,
    /// Row 2, column 2.
    pub d: f64,
    /// X translation.
    pub tx: f64,
    /// Y translation.
    pub ty: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// The identity transform.
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Pure rotation by `angle` radians about the origin.
    #[must_use]
    pub fn rotation(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Pure translation.
    #[must_use]
    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx,
            ty,
        }
    }

    /// Apply the transform to a point.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }

    /// Compose: apply `self` first, then `next`.
    #[must_use]
    pub fn then(&self, next: &Transform) -> Self {
        Self {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            tx: self.tx * next.a + self.ty * next.c + next.tx,
            ty: self.tx * next.b + self.ty * next.d + next.ty,
        }
    }

    /// The transform followed by a translation.
    #[must_use]
    pub fn translated(&self, delta: Point) -> Self {
        self.then(&Self::translation(delta.x, delta.y))
    }

    /// The transform followed by a rotation about `pivot`.
    #[must_use]
    pub fn rotated_about(&self, angle: f64, pivot: Point) -> Self {
        self.then(&Self::translation(-pivot.x, -pivot.y))
            .then(&Self::rotation(angle))
            .then(&Self::translation(pivot.x, pivot.y))
    }

    /// The rotation angle in radians encoded by the linear part.
    #[must_use]
    pub fn rotation_angle(&self) -> f64 {
        self.b.atan2(self.a)
    }
}

/// Centroid (vertex mean) of an ordered vertex list.
///
/// For the tangram polygons (triangles, square, parallelogram) the vertex
/// mean coincides with the area centroid.
#[must_use]
pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::default();
    }
    let sum = points
        .iter()
        .fold(Point::default(), |acc, p| acc.offset(p.x, p.y));
    #[allow(clippy::cast_precision_loss)]
    sum.scaled(1.0 / points.len() as f64)
}

/// Axis-aligned bounding box of a vertex list.
#[must_use]
pub fn bounding_box(points: &[Point]) -> Rect {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    if points.is_empty() {
        Rect::default()
    } else {
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Project a polygon onto an axis, returning the `(min, max)` interval.
fn project(points: &[Point], axis: Point) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for p in points {
        let d = p.dot(axis);
        min = min.min(d);
        max = max.max(d);
    }
    (min, max)
}

/// True when some edge normal of `points` separates the two polygons.
fn has_separating_axis(points: &[Point], a: &[Point], b: &[Point]) -> bool {
    let n = points.len();
    for i in 0..n {
        let edge = points[i].to(points[(i + 1) % n]);
        let axis = edge.perpendicular().normalized();
        if axis.length() < EPSILON {
            continue;
        }
        let (min_a, max_a) = project(a, axis);
        let (min_b, max_b) = project(b, axis);
        if max_a <= min_b + EPSILON || max_b <= min_a + EPSILON {
            return true;
        }
    }
    false
}

/// Test two convex polygons for positive-area intersection.
///
/// Separating-axis interval projection over both polygons' edge normals.
/// Exact edge or vertex contact reports `false`: boundary contact is legal
/// in an assembly, only interior intersection is an overlap.
#[must_use]
pub fn polygons_overlap(a: &[Point], b: &[Point]) -> bool {
    if a.len() < 3 || b.len() < 3 {
        return false;
    }
    !(has_separating_axis(a, a, b) || has_separating_axis(b, a, b))
}

/// Signed distance of `p` from the infinite line through `start`/`end`.
#[must_use]
pub fn distance_to_line(p: Point, start: Point, end: Point) -> f64 {
    let dir = start.to(end).normalized();
    if dir.length() < EPSILON {
        return start.distance_to(p);
    }
    start.to(p).dot(dir.perpendicular())
}

/// Closest point to `p` on the segment `start`..`end`.
#[must_use]
pub fn project_onto_segment(p: Point, start: Point, end: Point) -> Point {
    let seg = start.to(end);
    let len_sq = seg.dot(seg);
    if len_sq < EPSILON * EPSILON {
        return start;
    }
    let t = (start.to(p).dot(seg) / len_sq).clamp(0.0, 1.0);
    start.offset(seg.x * t, seg.y * t)
}
