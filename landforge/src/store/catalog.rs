//! Listing of generated tiles.
//!
//! Scanning the tile root reads one sidecar per directory, so the listing is
//! cached and only rebuilt once it is older than [`CATALOG_TTL`]. Only tiles
//! whose sidecar is marked complete are listed.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{Artifact, StoreError, TileMetadata, TileStore};
use crate::coord::{BoundingBox, TileId};
use crate::landcover::CoverageMap;

/// How long a catalog listing is served from cache.
pub const CATALOG_TTL: Duration = Duration::from_secs(5 * 60);

/// One generated tile as seen on disk.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub id: TileId,
    pub path: PathBuf,
    pub metadata: TileMetadata,
    /// Artifacts present in the directory
    pub artifacts: Vec<Artifact>,
    pub coverage: Option<CoverageMap>,
}

impl CatalogEntry {
    pub fn has(&self, artifact: Artifact) -> bool {
        self.artifacts.contains(&artifact)
    }
}

struct Snapshot {
    taken_at: Instant,
    entries: Vec<CatalogEntry>,
}

/// Cached listing of the tile store.
pub struct TileCatalog {
    store: TileStore,
    ttl: Duration,
    snapshot: Mutex<Option<Snapshot>>,
}

impl TileCatalog {
    pub fn new(store: TileStore) -> Self {
        Self::with_ttl(store, CATALOG_TTL)
    }

    pub fn with_ttl(store: TileStore, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            snapshot: Mutex::new(None),
        }
    }

    /// Lists tiles, optionally only those whose centre lies in `bounds`.
    pub fn list(&self, bounds: Option<&BoundingBox>) -> Result<Vec<CatalogEntry>, StoreError> {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        let stale = snapshot
            .as_ref()
            .map_or(true, |s| s.taken_at.elapsed() >= self.ttl);
        if stale {
            *snapshot = Some(Snapshot {
                taken_at: Instant::now(),
                entries: self.scan()?,
            });
        }

        let entries = snapshot.as_ref().map(|s| s.entries.as_slice()).unwrap_or(&[]);
        Ok(entries
            .iter()
            .filter(|entry| {
                bounds.map_or(true, |b| {
                    let (lon, lat) = entry.metadata.tile.bbox().center();
                    b.contains(lon, lat)
                })
            })
            .cloned()
            .collect())
    }

    /// Drops the cached listing.
    pub fn invalidate(&self) {
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn scan(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        let root = self.store.root();
        let read_dir = match std::fs::read_dir(root) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(root, e)),
        };

        let mut entries = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|e| StoreError::io(root, e))?;
            let path = dir_entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let id = TileId::from_raw(name);

            let metadata = match TileMetadata::load(&self.store.artifact(&id, Artifact::Metadata)) {
                Ok(meta) => meta,
                Err(e) => {
                    warn!(tile_id = %id, error = %e, "Skipping tile without readable sidecar");
                    continue;
                }
            };
            if !metadata.is_complete() {
                debug!(tile_id = %id, "Skipping unfinished tile");
                continue;
            }

            let artifacts = Artifact::ALL
                .into_iter()
                .filter(|a| self.store.artifact(&id, *a).is_file())
                .collect();

            let coverage = std::fs::read(self.store.artifact(&id, Artifact::Coverage))
                .ok()
                .and_then(|data| serde_json::from_slice(&data).ok());

            entries.push(CatalogEntry {
                id,
                path,
                metadata,
                artifacts,
                coverage,
            });
        }

        entries.sort_by(|a, b| a.metadata.tile.cmp(&b.metadata.tile));
        debug!(count = entries.len(), "Scanned tile catalog");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoord;
    use tempfile::TempDir;

    async fn write_tile(store: &TileStore, tile: TileCoord) -> TileId {
        let id = TileId::for_tile(&tile);
        store.create(&id).await.unwrap();
        store
            .write_json(
                &store.artifact(&id, Artifact::Metadata),
                &TileMetadata::new(tile, 0).completed(),
            )
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn test_lists_tiles_with_artifacts() {
        let temp = TempDir::new().unwrap();
        let store = TileStore::new(temp.path());
        let id = write_tile(&store, TileCoord::new(4400, 2686, 13)).await;
        store
            .write_atomic(&store.artifact(&id, Artifact::HeightmapFinal), b"png")
            .await
            .unwrap();
        store
            .write_atomic(&store.artifact(&id, Artifact::Coverage), br#"{"water":0.5}"#)
            .await
            .unwrap();

        let catalog = TileCatalog::new(store);
        let entries = catalog.list(None).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].has(Artifact::HeightmapFinal));
        assert!(!entries[0].has(Artifact::Ocean));
        assert_eq!(entries[0].coverage.as_ref().unwrap().total(), 0.5);
    }

    #[tokio::test]
    async fn test_skips_directories_without_sidecar() {
        let temp = TempDir::new().unwrap();
        let store = TileStore::new(temp.path());
        std::fs::create_dir_all(temp.path().join("stray")).unwrap();
        write_tile(&store, TileCoord::new(1, 1, 4)).await;

        assert_eq!(TileCatalog::new(store).list(None).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_skips_unfinished_tiles() {
        let temp = TempDir::new().unwrap();
        let store = TileStore::new(temp.path());
        write_tile(&store, TileCoord::new(1, 1, 4)).await;

        // Sidecar and stitched imagery written, final heightmap not yet
        let pending = TileCoord::new(2, 1, 4);
        let id = TileId::for_tile(&pending);
        store.create(&id).await.unwrap();
        store
            .write_json(
                &store.artifact(&id, Artifact::Metadata),
                &TileMetadata::new(pending, 0),
            )
            .await
            .unwrap();
        store
            .write_atomic(&store.artifact(&id, Artifact::Satellite), b"png")
            .await
            .unwrap();

        let entries = TileCatalog::new(store).list(None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].metadata.tile, TileCoord::new(1, 1, 4));
    }

    #[tokio::test]
    async fn test_bounds_filter_uses_tile_centre() {
        let temp = TempDir::new().unwrap();
        let store = TileStore::new(temp.path());
        let london = crate::coord::to_tile_coords(51.5, -0.12, 10).unwrap();
        let sydney = crate::coord::to_tile_coords(-33.86, 151.2, 10).unwrap();
        write_tile(&store, london).await;
        write_tile(&store, sydney).await;

        let catalog = TileCatalog::new(store);
        let europe = BoundingBox {
            west: -10.0,
            south: 35.0,
            east: 30.0,
            north: 60.0,
        };
        let entries = catalog.list(Some(&europe)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].metadata.tile, london);
        assert_eq!(catalog.list(None).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_listing_cached_until_invalidated() {
        let temp = TempDir::new().unwrap();
        let store = TileStore::new(temp.path());
        let catalog = TileCatalog::new(store.clone());
        assert!(catalog.list(None).unwrap().is_empty());

        write_tile(&store, TileCoord::new(1, 1, 4)).await;
        assert!(catalog.list(None).unwrap().is_empty());

        catalog.invalidate();
        assert_eq!(catalog.list(None).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_rescans() {
        let temp = TempDir::new().unwrap();
        let store = TileStore::new(temp.path());
        let catalog = TileCatalog::with_ttl(store.clone(), Duration::ZERO);
        assert!(catalog.list(None).unwrap().is_empty());
        write_tile(&store, TileCoord::new(1, 1, 4)).await;
        assert_eq!(catalog.list(None).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let catalog = TileCatalog::new(TileStore::new("/nonexistent/landforge/tiles"));
        assert!(catalog.list(None).unwrap().is_empty());
    }
}
