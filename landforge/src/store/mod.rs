//! On-disk tile storage.
//!
//! Every tile job owns one directory under the tile root, named by its
//! [`TileId`](crate::coord::TileId). The directory holds the fetched,
//! stitched and derived rasters plus small JSON sidecars:
//!
//! ```text
//! <root>/<tile-id>/
//! ├── tile.json                  root sidecar
//! ├── stitched.png               satellite
//! ├── landcover.png              raw classification composite
//! ├── heightmap.png              stitched raw elevation
//! ├── heightmap_final.png        elevation after landcover composition
//! ├── ocean.png
//! ├── landcover_colors.png       palette-snapped classification
//! ├── landcover_colors_edited.png (optional override)
//! ├── <class>_mask.png
//! ├── landcover_texture.png / landcover_texture_100.png (+ .tif)
//! ├── coverage.json
//! └── leaves/<i>/<j>/...         one directory per fetched leaf
//!     ├── tile.json
//!     └── terrain-rgb.png
//! ```
//!
//! A tile is finished once its root `tile.json` reads `"status": "complete"`.
//! Failed jobs remove their directory; a pending directory found without a
//! running job is the leftover of an interrupted run and gets regenerated.

mod catalog;
mod claim;
mod layout;
mod metadata;

pub use catalog::{CatalogEntry, TileCatalog, CATALOG_TTL};
pub use claim::{ClaimRegistry, TileClaim};
pub use layout::{Artifact, TileStore};
pub use metadata::{TileMetadata, TileStatus};

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by tile storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON sidecar could not be read or written
    #[error("Invalid sidecar {path}: {source}")]
    Sidecar {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
