//! # Tangram Core
//!
//! Connection-driven tangram assembly: geometry, placement, and
//! constraint derivation for the seven classic pieces.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               tangram-core                  │
//! ├─────────────────────────────────────────────┤
//! │  Geometry        │  Connections             │
//! │  - Points, rects │  - Point selection       │
//! │  - Transforms    │  - Constraint resolution │
//! │  - SAT overlap   │  - Flip index remap      │
//! ├─────────────────────────────────────────────┤
//! │  Engine          │  Manipulation            │
//! │  - Placement     │  - Mode classification   │
//! │  - Validation    │  - Rotation/slide limits │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod connection;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod manipulation;
pub mod piece;
pub mod puzzle;
pub mod remap;

pub use connection::{
    connection_points, resolve_connection, Connection, ConnectionKind, ConnectionPoint,
    Constraint, ConstraintKind, PointKind, SlideEdge,
};
pub use engine::{
    calculate_transform, connection_placement, BoundsPolicy, SnapInfo, TransformOperation,
    TransformResult, Violation,
};
pub use error::{TangramError, TangramResult};
pub use geometry::{
    bounding_box, centroid, polygons_overlap, Point, Rect, Transform, EPSILON,
};
pub use manipulation::{
    calculate_rotation_limits, calculate_slide_limits, classify, constraints_for,
    ManipulationConstraints, ManipulationMode, RotationLimits, SlideRange,
};
pub use piece::{Piece, PieceId, PieceType, PIECE_SCALE};
pub use puzzle::{now_ms, PieceDocument, Puzzle, PuzzleDocument};

/// Tangram core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
