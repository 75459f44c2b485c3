//! `tile.json` sidecar.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::coord::TileCoord;
use crate::heightmap::ElevationRange;

/// Generation state recorded in a root sidecar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileStatus {
    /// Stages are still writing artifacts, or a run died part way
    #[default]
    Pending,
    /// Every requested stage finished
    Complete,
}

/// Per-tile sidecar used to rebuild the hierarchy from disk.
///
/// Written once when the tile is created; the elevation range is attached
/// later by the fetch stage after terrain decode. The root sidecar is
/// marked complete as the last write of a tile job, and readers treat
/// anything else as unfinished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileMetadata {
    pub tile: TileCoord,
    /// Ordinal among siblings, in stitch order
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<f64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: TileStatus,
}

impl TileMetadata {
    pub fn new(tile: TileCoord, index: usize) -> Self {
        Self {
            tile,
            index,
            min_height: None,
            max_height: None,
            created_at: Utc::now(),
            status: TileStatus::Pending,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == TileStatus::Complete
    }

    pub fn completed(mut self) -> Self {
        self.status = TileStatus::Complete;
        self
    }

    /// Attaches the elevation range learned during fetch.
    pub fn with_elevation(mut self, range: ElevationRange) -> Self {
        self.min_height = Some(range.min);
        self.max_height = Some(range.max);
        self
    }

    /// Reads a sidecar from disk.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let data = std::fs::read(path).map_err(|e| StoreError::io(path, e))?;
        serde_json::from_slice(&data).map_err(|source| StoreError::Sidecar {
            path: path.to_path_buf(),
            source,
        })
    }
}
