//! # Tangram Session
//!
//! Editing-session layer over `tangram-core`: the editor workflow state
//! machine, gesture capture, and the session that owns the puzzle and
//! the per-piece manipulation caches.
//!
//! Every committed mutation follows the same atomic sequence: validate,
//! mutate, reclassify all manipulation modes, report. Gestures capture
//! the piece's transform once at start and recompute candidates purely
//! from the cumulative delta, so cancellation is exact.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod session;
pub mod workflow;

pub use session::{EditorSession, GestureCapture, GestureKind, SessionConfig};
pub use workflow::{EditorEvent, EditorState, PendingMode};

/// Tangram session version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
