//! The puzzle assembly - placed pieces, their connections, and the
//! serialized document shape handed to the persistence collaborator.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::connection::Connection;
use crate::error::{TangramError, TangramResult};
use crate::geometry::Transform;
use crate::piece::{Piece, PieceId, PieceType};

/// Hex characters kept from the SHA-256 digest in solution checksums.
const CHECKSUM_LEN: usize = 16;

/// A tangram puzzle under assembly.
///
/// Pieces are kept in placement order; `pieces[0]` is the anchor and may
/// not be removed while other pieces exist. At most one piece per
/// [`PieceType`] is allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Puzzle {
    /// Placed pieces in placement order.
    pieces: Vec<Piece>,
    /// Committed connections between pieces.
    connections: Vec<Connection>,
}

impl Puzzle {
    /// Create an empty puzzle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Placed pieces in placement order.
    #[must_use]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Committed connections.
    #[must_use]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Number of placed pieces.
    #[must_use]
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// True when no piece has been placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Look up a piece by id.
    #[must_use]
    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.id == id)
    }

    /// Look up a piece by id, mutably.
    pub fn piece_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.pieces.iter_mut().find(|p| p.id == id)
    }

    /// True when a piece of the given type is already placed.
    #[must_use]
    pub fn contains_type(&self, piece_type: PieceType) -> bool {
        self.pieces.iter().any(|p| p.piece_type == piece_type)
    }

    /// The anchor piece (first placed), if any.
    #[must_use]
    pub fn anchor(&self) -> Option<&Piece> {
        self.pieces.first()
    }

    /// True when the given piece is the anchor.
    #[must_use]
    pub fn is_anchor(&self, id: PieceId) -> bool {
        self.anchor().is_some_and(|p| p.id == id)
    }

    /// Add a piece (and optionally the connection that placed it).
    ///
    /// # Errors
    ///
    /// Returns [`TangramError::PieceAlreadyPlaced`] when the puzzle
    /// already holds a piece of the same type.
    pub fn add_piece(
        &mut self,
        piece: Piece,
        connection: Option<Connection>,
    ) -> TangramResult<PieceId> {
        if self.contains_type(piece.piece_type) {
            return Err(TangramError::PieceAlreadyPlaced(
                piece.piece_type.to_string(),
            ));
        }
        let id = piece.id;
        self.pieces.push(piece);
        if let Some(connection) = connection {
            self.connections.push(connection);
        }
        tracing::info!(piece = %id, count = self.pieces.len(), "piece added");
        Ok(id)
    }

    /// Remove a piece, dropping every connection that references it.
    ///
    /// # Errors
    ///
    /// Returns [`TangramError::OperationNotAllowed`] when the piece is
    /// the anchor and other pieces still exist, and
    /// [`TangramError::PieceNotFound`] when the id is unknown.
    pub fn remove_piece(&mut self, id: PieceId) -> TangramResult<Piece> {
        let index = self
            .pieces
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| TangramError::PieceNotFound(id.to_string()))?;
        if index == 0 && self.pieces.len() > 1 {
            return Err(TangramError::OperationNotAllowed(
                "the anchor piece cannot be removed while other pieces exist".to_string(),
            ));
        }
        let piece = self.pieces.remove(index);
        self.connections.retain(|c| !c.references(id));
        tracing::info!(piece = %id, count = self.pieces.len(), "piece removed");
        Ok(piece)
    }

    /// Replace a piece's transform (no validation; callers validate first).
    ///
    /// # Errors
    ///
    /// Returns [`TangramError::PieceNotFound`] when the id is unknown.
    pub fn set_transform(&mut self, id: PieceId, transform: Transform) -> TangramResult<()> {
        let piece = self
            .piece_mut(id)
            .ok_or_else(|| TangramError::PieceNotFound(id.to_string()))?;
        piece.transform = transform;
        Ok(())
    }

    /// Portable checksum of the solution layout.
    ///
    /// Concatenates each piece's `"type:tx,ty"` string, sorts the
    /// strings, and takes a truncated SHA-256 - stable across processes
    /// and platforms, unlike a language-runtime string hash.
    #[must_use]
    pub fn solution_checksum(&self) -> String {
        let mut parts: Vec<String> = self
            .pieces
            .iter()
            .map(|p| {
                format!(
                    "{}:{:.4},{:.4}",
                    p.piece_type, p.transform.tx, p.transform.ty
                )
            })
            .collect();
        parts.sort_unstable();

        let mut hasher = Sha256::new();
        for part in &parts {
            hasher.update(part.as_bytes());
        }
        let digest = hasher.finalize();
        let mut out = String::with_capacity(CHECKSUM_LEN);
        for byte in digest.iter().take(CHECKSUM_LEN / 2) {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }
}

/// Milliseconds since the Unix epoch.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Document-friendly piece description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceDocument {
    /// Piece identifier (UUID string).
    pub id: String,
    /// Which of the seven shapes this is.
    #[serde(rename = "type")]
    pub piece_type: PieceType,
    /// Placement transform.
    pub transform: Transform,
    /// Whether the piece is mirrored.
    #[serde(default)]
    pub is_flipped: bool,
}

impl From<&Piece> for PieceDocument {
    fn from(piece: &Piece) -> Self {
        Self {
            id: piece.id.to_string(),
            piece_type: piece.piece_type,
            transform: piece.transform,
            is_flipped: piece.is_flipped,
        }
    }
}

impl PieceDocument {
    /// Convert document to runtime piece.
    ///
    /// # Errors
    ///
    /// Returns an error string if the piece id is not a valid UUID.
    pub fn into_piece(self) -> Result<Piece, String> {
        let id = PieceId::parse(&self.id).map_err(|e| e.to_string())?;
        let mut piece = Piece::new(self.piece_type)
            .with_transform(self.transform)
            .with_flipped(self.is_flipped);
        piece.id = id;
        Ok(piece)
    }
}

/// Canonical serialized puzzle shape shared with the persistence
/// collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleDocument {
    /// Pieces in placement order.
    pub pieces: Vec<PieceDocument>,
    /// Committed connections.
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Portable layout checksum.
    pub solution_checksum: String,
    /// Creation timestamp (ms since epoch).
    #[serde(rename = "createdDate")]
    pub created_ms: u64,
    /// Last-modified timestamp (ms since epoch).
    #[serde(rename = "modifiedDate")]
    pub modified_ms: u64,
}

impl PuzzleDocument {
    /// Build a document from a runtime puzzle.
    #[must_use]
    pub fn from_puzzle(puzzle: &Puzzle, created_ms: u64, modified_ms: u64) -> Self {
        Self {
            pieces: puzzle.pieces.iter().map(PieceDocument::from).collect(),
            connections: puzzle.connections.clone(),
            solution_checksum: puzzle.solution_checksum(),
            created_ms,
            modified_ms,
        }
    }

    /// Materialize the runtime puzzle this document describes.
    ///
    /// # Errors
    ///
    /// Returns [`TangramError::ValidationFailed`] when a piece id cannot
    /// be parsed or a piece type repeats.
    pub fn into_puzzle(self) -> TangramResult<Puzzle> {
        let mut puzzle = Puzzle::new();
        for doc in self.pieces {
            let piece = doc
                .into_piece()
                .map_err(TangramError::ValidationFailed)?;
            puzzle.add_piece(piece, None)?;
        }
        puzzle.connections = self.connections;
        Ok(puzzle)
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> TangramResult<String> {
        serde_json::to_string(self).map_err(TangramError::Serialization)
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> TangramResult<Self> {
        serde_json::from_str(json).map_err(TangramError::Serialization)
    }
}
