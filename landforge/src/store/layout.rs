//! Tile directory layout and atomic artifact writes.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use super::StoreError;
use crate::coord::TileId;
use crate::landcover::LandcoverClass;

/// Directory holding per-leaf subdirectories.
const LEAVES_DIR: &str = "leaves";

/// Named files inside a tile directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    Metadata,
    TerrainRgb,
    Satellite,
    Landcover,
    Heightmap,
    HeightmapFinal,
    Ocean,
    LandcoverColors,
    LandcoverColorsEdited,
    LandcoverTexture,
    LandcoverTextureSmall,
    LandcoverTextureTif,
    LandcoverTextureSmallTif,
    Coverage,
}

impl Artifact {
    pub const ALL: [Artifact; 14] = [
        Artifact::Metadata,
        Artifact::TerrainRgb,
        Artifact::Satellite,
        Artifact::Landcover,
        Artifact::Heightmap,
        Artifact::HeightmapFinal,
        Artifact::Ocean,
        Artifact::LandcoverColors,
        Artifact::LandcoverColorsEdited,
        Artifact::LandcoverTexture,
        Artifact::LandcoverTextureSmall,
        Artifact::LandcoverTextureTif,
        Artifact::LandcoverTextureSmallTif,
        Artifact::Coverage,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Artifact::Metadata => "tile.json",
            Artifact::TerrainRgb => "terrain-rgb.png",
            Artifact::Satellite => "stitched.png",
            Artifact::Landcover => "landcover.png",
            Artifact::Heightmap => "heightmap.png",
            Artifact::HeightmapFinal => "heightmap_final.png",
            Artifact::Ocean => "ocean.png",
            Artifact::LandcoverColors => "landcover_colors.png",
            Artifact::LandcoverColorsEdited => "landcover_colors_edited.png",
            Artifact::LandcoverTexture => "landcover_texture.png",
            Artifact::LandcoverTextureSmall => "landcover_texture_100.png",
            Artifact::LandcoverTextureTif => "landcover_texture.tif",
            Artifact::LandcoverTextureSmallTif => "landcover_texture_100.tif",
            Artifact::Coverage => "coverage.json",
        }
    }
}

/// Root of the tile directory tree.
#[derive(Debug, Clone)]
pub struct TileStore {
    root: PathBuf,
}

impl TileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tile_dir(&self, id: &TileId) -> PathBuf {
        self.root.join(id)
    }

    pub fn artifact(&self, id: &TileId, artifact: Artifact) -> PathBuf {
        self.tile_dir(id).join(artifact.file_name())
    }

    /// Path of the binary mask for `class`.
    pub fn mask(&self, id: &TileId, class: LandcoverClass) -> PathBuf {
        self.tile_dir(id).join(format!("{}_mask.png", class.name()))
    }

    /// Directory of a leaf, addressed by the sibling indices from the root.
    ///
    /// The root itself (an empty path) maps to the tile directory.
    pub fn leaf_dir(&self, id: &TileId, path: &[usize]) -> PathBuf {
        if path.is_empty() {
            return self.tile_dir(id);
        }
        let mut dir = self.tile_dir(id).join(LEAVES_DIR);
        for index in path {
            dir.push(index.to_string());
        }
        dir
    }

    /// Whether a directory for `id` exists.
    pub fn exists(&self, id: &TileId) -> bool {
        self.tile_dir(id).is_dir()
    }

    /// Creates the tile directory. Returns `false` when it already existed.
    pub async fn create(&self, id: &TileId) -> Result<bool, StoreError> {
        let dir = self.tile_dir(id);
        if dir.is_dir() {
            return Ok(false);
        }
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(&dir, e))?;
        debug!(tile_id = %id, path = %dir.display(), "Created tile directory");
        Ok(true)
    }

    /// Recursively removes the tile directory. Missing directories are fine.
    pub async fn remove(&self, id: &TileId) -> Result<(), StoreError> {
        let dir = self.tile_dir(id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                warn!(tile_id = %id, path = %dir.display(), "Removed tile directory");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&dir, e)),
        }
    }

    /// Writes `data` to `path` via a temporary file and rename.
    ///
    /// Readers never observe a partially written artifact.
    pub async fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }
        let temp_path = temp_path(path);
        tokio::fs::write(&temp_path, data)
            .await
            .map_err(|e| StoreError::io(&temp_path, e))?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| StoreError::io(path, e))?;
        Ok(())
    }

    /// Serializes `value` as pretty JSON and writes it atomically.
    pub async fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Sidecar {
            path: path.to_path_buf(),
            source,
        })?;
        self.write_atomic(path, &json).await
    }

    /// Reads a file, returning `None` when it does not exist.
    pub async fn read_optional(&self, path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}

/// `<path>.tmp`, keeping the original extension so sibling artifacts
/// sharing a stem never collide.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
