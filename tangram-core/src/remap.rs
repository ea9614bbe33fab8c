//! Reflection index remapping for the parallelogram.
//!
//! The parallelogram is the only piece whose mirror image is not a
//! rotation of itself, so flipping it changes which geometric vertex or
//! edge a canonical index points at. These tables translate between the
//! canonical index and the physically-realized one. Both maps are
//! involutions: applying one twice is the identity.

/// Remap a parallelogram vertex index across a horizontal flip.
///
/// `0 <-> 1`, `2 <-> 3`. Indices outside `0..4` pass through unchanged.
#[must_use]
pub const fn remap_vertex(index: usize) -> usize {
    match index {
        0 => 1,
        1 => 0,
        2 => 3,
        3 => 2,
        other => other,
    }
}

/// Remap a parallelogram edge index across a horizontal flip.
///
/// Edges `0` and `2` map to themselves; `1 <-> 3`.
#[must_use]
pub const fn remap_edge(index: usize) -> usize {
    match index {
        1 => 3,
        3 => 1,
        other => other,
    }
}
