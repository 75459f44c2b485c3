//! Deterministic tile identity.

use std::fmt;

use sha2::{Digest, Sha256};

use super::TileCoord;

/// Number of hex characters kept from the digest.
const ID_LEN: usize = 16;

/// Identity of a tile or of a multi-tile area.
///
/// Derived from the coordinate triples alone, so the same request always
/// maps to the same working directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(String);

impl TileId {
    /// Identity of a single tile.
    pub fn for_tile(tile: &TileCoord) -> Self {
        Self::for_tiles(std::slice::from_ref(tile))
    }

    /// Identity of an ordered list of tiles.
    ///
    /// Order matters: the serpentine fetch order is part of the identity.
    pub fn for_tiles(tiles: &[TileCoord]) -> Self {
        let mut hasher = Sha256::new();
        for tile in tiles {
            hasher.update(format!("{},{},{};", tile.x, tile.y, tile.zoom).as_bytes());
        }
        let digest = hasher.finalize();
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        TileId(hex[..ID_LEN].to_string())
    }

    /// Wraps an identity read back from a directory name.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        TileId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<std::path::Path> for TileId {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}
