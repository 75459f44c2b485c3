//! Integration tests for the tile pipeline.
//!
//! These tests drive the orchestrator end to end against an in-memory
//! provider that renders small synthetic tiles:
//! - Stage ordering and artifact layout
//! - Idempotent resubmission and duplicate suppression
//! - Rate-limit cool-down and resumption, per tile and across an area
//! - Cleanup after failures
//! - Area fan-out and the tile catalog

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use tempfile::TempDir;

use landforge::coord::{BoundingBox, TileCoord, TileId};
use landforge::geotiff::{ExportError, GeoreferenceTool};
use landforge::landcover::{CoverageMap, LandcoverClass};
use landforge::pipeline::{
    tile_cover, AreaRequest, JobHandle, JobStatus, Orchestrator, PipelineConfig, PipelineError,
    Stage, TileOptions, WorkerCounts,
};
use landforge::provider::{AsyncProvider, LayerKind, ProviderError};
use landforge::store::{Artifact, TileCatalog, TileMetadata, TileStore};

// =============================================================================
// Test Helpers
// =============================================================================

/// Side length of every synthetic provider tile.
const TILE_SIZE: u32 = 32;

/// How the mock answers one fetch attempt.
#[derive(Clone, Copy)]
enum Script {
    Ok,
    RateLimited,
    Rejected,
    Garbage,
}

#[derive(Default)]
struct MockState {
    attempts: AtomicUsize,
    /// Successful (tile, layer) fetches in order
    fetched: Mutex<Vec<(TileCoord, LayerKind)>>,
    /// Every attempt with the instant it reached the provider
    started: Mutex<Vec<(TileCoord, Instant)>>,
    /// When the first rate-limit response was returned
    limited_at: Mutex<Option<Instant>>,
    /// Attempt indices answered with a rate limit
    rate_limited_attempts: Mutex<HashSet<usize>>,
    always_rate_limited: bool,
    failing_layer: Option<(LayerKind, Script)>,
}

/// Provider rendering terrain, satellite and landcover tiles in memory.
#[derive(Clone)]
struct MockProvider {
    state: Arc<MockState>,
    landcover: bool,
}

impl MockProvider {
    fn new() -> Self {
        Self::with_state(MockState::default())
    }

    fn with_state(state: MockState) -> Self {
        Self {
            state: Arc::new(state),
            landcover: true,
        }
    }

    fn without_landcover(mut self) -> Self {
        self.landcover = false;
        self
    }

    fn fetched(&self) -> Vec<(TileCoord, LayerKind)> {
        self.state.fetched.lock().unwrap().clone()
    }

    fn started(&self) -> Vec<(TileCoord, Instant)> {
        self.state.started.lock().unwrap().clone()
    }

    fn script(&self, attempt: usize, layer: LayerKind) -> Script {
        if self.state.always_rate_limited
            || self.state.rate_limited_attempts.lock().unwrap().contains(&attempt)
        {
            return Script::RateLimited;
        }
        match self.state.failing_layer {
            Some((failing, script)) if failing == layer => script,
            _ => Script::Ok,
        }
    }
}

impl AsyncProvider for MockProvider {
    async fn fetch(&self, tile: TileCoord, layer: LayerKind) -> Result<Vec<u8>, ProviderError> {
        let attempt = self.state.attempts.fetch_add(1, Ordering::SeqCst);
        self.state.started.lock().unwrap().push((tile, Instant::now()));
        tokio::time::sleep(Duration::from_millis(1)).await;

        match self.script(attempt, layer) {
            Script::Ok => {}
            Script::RateLimited => {
                self.state
                    .limited_at
                    .lock()
                    .unwrap()
                    .get_or_insert_with(Instant::now);
                return Err(ProviderError::RateLimited { retry_after: None });
            }
            Script::Rejected => {
                return Err(ProviderError::InvalidResponse("HTTP 404".to_string()))
            }
            Script::Garbage => return Ok(b"definitely not a png".to_vec()),
        }

        let image = match layer {
            LayerKind::Terrain => terrain_tile(tile),
            LayerKind::Satellite => RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgba([90, 110, 70, 255])),
            LayerKind::Landcover | LayerKind::Classification => landcover_tile(),
        };
        self.state.fetched.lock().unwrap().push((tile, layer));
        Ok(encode(&image))
    }

    fn name(&self) -> &str {
        "Mock"
    }

    fn supports(&self, layer: LayerKind) -> bool {
        match layer {
            LayerKind::Terrain | LayerKind::Satellite => true,
            LayerKind::Landcover => self.landcover,
            LayerKind::Classification => false,
        }
    }
}

/// Terrain-RGB ramp rising west to east, offset per tile.
fn terrain_tile(tile: TileCoord) -> RgbaImage {
    RgbaImage::from_fn(TILE_SIZE, TILE_SIZE, |x, _| {
        let metres = 100.0 + x as f64 * 2.0 + (tile.x % 7) as f64 * 10.0;
        let v = ((metres + 10000.0) * 10.0).round() as u32;
        Rgba([(v >> 16) as u8, (v >> 8) as u8, v as u8, 255])
    })
}

/// Water on the left half, trees on the right.
fn landcover_tile() -> RgbaImage {
    let water = LandcoverClass::Water.paint();
    let trees = LandcoverClass::Trees.paint();
    RgbaImage::from_fn(TILE_SIZE, TILE_SIZE, |x, _| {
        let [r, g, b] = if x < TILE_SIZE / 2 { water } else { trees };
        Rgba([r, g, b, 255])
    })
}

fn encode(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Georeferencing stand-in that copies the source raster.
#[derive(Clone, Default)]
struct CopyTool {
    calls: Arc<AtomicUsize>,
}

impl GeoreferenceTool for CopyTool {
    async fn georeference(
        &self,
        source: &Path,
        target: &Path,
        _bbox: &BoundingBox,
    ) -> Result<(), ExportError> {
        tokio::fs::copy(source, target)
            .await
            .map_err(|source| ExportError::ToolNotFound {
                tool: "copy".to_string(),
                source,
            })?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn test_config() -> PipelineConfig {
    PipelineConfig {
        resolution: 64,
        cooldown: Duration::from_millis(200),
        ..PipelineConfig::default()
    }
}

fn orchestrator(
    provider: MockProvider,
    config: PipelineConfig,
) -> (Orchestrator<MockProvider, CopyTool>, CopyTool, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let tool = CopyTool::default();
    let orchestrator = Orchestrator::new(
        provider,
        Some(tool.clone()),
        TileStore::new(temp_dir.path()),
        config,
    );
    (orchestrator, tool, temp_dir)
}

async fn wait(handle: &JobHandle) -> Result<(), PipelineError> {
    tokio::time::timeout(Duration::from_secs(30), handle.wait())
        .await
        .expect("job timed out")
}

fn tile() -> TileCoord {
    TileCoord::new(4267, 2893, 13)
}

// =============================================================================
// Integration Tests
// =============================================================================

#[tokio::test]
async fn test_tile_runs_stages_in_order() {
    let provider = MockProvider::new();
    let (orchestrator, tool, _temp_dir) = orchestrator(provider.clone(), test_config());

    let submission = orchestrator
        .submit_tile(tile(), TileOptions::default())
        .unwrap();
    wait(&submission.handle).await.unwrap();

    let stages: Vec<Stage> = orchestrator.jobs().iter().map(|h| h.info().stage).collect();
    assert_eq!(
        stages,
        vec![
            Stage::Tile,
            Stage::Fetch,
            Stage::Landcover,
            Stage::Heightmap,
            Stage::Export
        ]
    );
    for job in orchestrator.jobs() {
        assert_eq!(job.status(), JobStatus::Done);
        assert_eq!(job.info().tile, Some(tile()));
    }
    assert_eq!(submission.handle.state().progress, 100);

    // Four leaves, three layers each
    assert_eq!(provider.fetched().len(), 12);
    assert_eq!(tool.calls.load(Ordering::SeqCst), 2);

    let store = orchestrator.store();
    for artifact in Artifact::ALL {
        let expected = artifact != Artifact::LandcoverColorsEdited;
        assert_eq!(
            store.artifact(&submission.id, artifact).is_file(),
            expected,
            "{:?}",
            artifact
        );
    }
    assert!(store.mask(&submission.id, LandcoverClass::Water).is_file());
    assert!(store.mask(&submission.id, LandcoverClass::Trees).is_file());

    let heightmap = image::open(store.artifact(&submission.id, Artifact::HeightmapFinal)).unwrap();
    assert_eq!((heightmap.width(), heightmap.height()), (64, 64));
}

#[tokio::test]
async fn test_sidecars_carry_elevation() {
    let (orchestrator, _tool, _temp_dir) = orchestrator(MockProvider::new(), test_config());

    let submission = orchestrator
        .submit_tile(tile(), TileOptions::default())
        .unwrap();
    wait(&submission.handle).await.unwrap();

    let store = orchestrator.store();
    let root = TileMetadata::load(&store.artifact(&submission.id, Artifact::Metadata)).unwrap();
    assert_eq!(root.tile, tile());
    assert!(root.is_complete());
    let (min, max) = (root.min_height.unwrap(), root.max_height.unwrap());
    assert!(min >= 100.0 && min < max, "min {min} max {max}");

    for (i, child) in tile().children().iter().enumerate() {
        let leaf = store
            .leaf_dir(&submission.id, &[i])
            .join(Artifact::Metadata.file_name());
        let meta = TileMetadata::load(&leaf).unwrap();
        assert_eq!(meta.tile, *child);
        assert_eq!(meta.index, i);
        assert!(!meta.is_complete());
        assert!(meta.min_height.unwrap() >= min);
        assert!(meta.max_height.unwrap() <= max);
    }
}

#[tokio::test]
async fn test_coverage_sums_to_one() {
    let (orchestrator, _tool, _temp_dir) = orchestrator(MockProvider::new(), test_config());

    let submission = orchestrator
        .submit_tile(tile(), TileOptions::default())
        .unwrap();
    wait(&submission.handle).await.unwrap();

    let path = orchestrator
        .store()
        .artifact(&submission.id, Artifact::Coverage);
    let coverage: CoverageMap = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();

    assert!((coverage.total() - 1.0).abs() < 1e-9);
    assert!((coverage.get(LandcoverClass::Water).unwrap() - 0.5).abs() < 1e-9);
    assert!((coverage.get(LandcoverClass::Trees).unwrap() - 0.5).abs() < 1e-9);
    assert_eq!(coverage.get(LandcoverClass::Snow), Some(0.0));
}

#[tokio::test]
async fn test_resubmit_is_idempotent() {
    let provider = MockProvider::new();
    let (orchestrator, _tool, _temp_dir) = orchestrator(provider.clone(), test_config());

    let first = orchestrator
        .submit_tile(tile(), TileOptions::default())
        .unwrap();
    wait(&first.handle).await.unwrap();
    let fetched = provider.fetched().len();
    let jobs = orchestrator.jobs().len();

    let second = orchestrator
        .submit_tile(tile(), TileOptions::default())
        .unwrap();
    wait(&second.handle).await.unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(provider.fetched().len(), fetched);
    // Only the second tile job; no stage ran
    assert_eq!(orchestrator.jobs().len(), jobs + 1);
}

#[tokio::test]
async fn test_concurrent_duplicates_generate_once() {
    let provider = MockProvider::new();
    let (orchestrator, _tool, _temp_dir) = orchestrator(provider.clone(), test_config());

    let a = orchestrator
        .submit_tile(tile(), TileOptions::default())
        .unwrap();
    let b = orchestrator
        .submit_tile(tile(), TileOptions::default())
        .unwrap();
    wait(&a.handle).await.unwrap();
    wait(&b.handle).await.unwrap();

    assert_eq!(provider.fetched().len(), 12);
    let fetch_jobs = orchestrator
        .jobs()
        .iter()
        .filter(|h| h.info().stage == Stage::Fetch)
        .count();
    assert_eq!(fetch_jobs, 1);
}

#[tokio::test]
async fn test_unfinished_directory_is_regenerated() {
    let provider = MockProvider::new();
    let (orchestrator, _tool, temp_dir) = orchestrator(provider.clone(), test_config());

    // Leftover of an interrupted run: pending sidecar and one stale raster
    let store = TileStore::new(temp_dir.path());
    let id = TileId::for_tiles(&tile_cover(&tile()).unwrap());
    store.create(&id).await.unwrap();
    store
        .write_json(
            &store.artifact(&id, Artifact::Metadata),
            &TileMetadata::new(tile(), tile().sibling_index()),
        )
        .await
        .unwrap();
    store
        .write_atomic(&store.artifact(&id, Artifact::Ocean), b"stale")
        .await
        .unwrap();
    assert!(TileCatalog::new(store.clone()).list(None).unwrap().is_empty());

    let submission = orchestrator
        .submit_tile(tile(), TileOptions::default())
        .unwrap();
    wait(&submission.handle).await.unwrap();

    assert_eq!(submission.id, id);
    assert_eq!(provider.fetched().len(), 12);
    let root = TileMetadata::load(&store.artifact(&id, Artifact::Metadata)).unwrap();
    assert!(root.is_complete());
    // The synthetic landcover has water, so the ocean raster is a real PNG again
    assert!(image::open(store.artifact(&id, Artifact::Ocean)).is_ok());
    assert_eq!(TileCatalog::new(store).list(None).unwrap().len(), 1);
}

#[tokio::test]
async fn test_rate_limit_pauses_and_resumes() {
    let state = MockState::default();
    state.rate_limited_attempts.lock().unwrap().insert(4);
    let provider = MockProvider::with_state(state).without_landcover();
    let config = PipelineConfig {
        leaf_depth: 1,
        ..test_config()
    };
    let cooldown = config.cooldown;
    let (orchestrator, _tool, _temp_dir) = orchestrator(provider.clone(), config);

    let started = Instant::now();
    let submission = orchestrator
        .submit_tile(
            tile(),
            TileOptions {
                landcover: false,
                ..TileOptions::default()
            },
        )
        .unwrap();
    wait(&submission.handle).await.unwrap();

    assert!(started.elapsed() >= cooldown);
    assert_eq!(orchestrator.gate().trips(), 1);
    assert!(!orchestrator.gate().is_paused());

    // Sixteen leaves, two layers, each fetched successfully exactly once
    let fetched = provider.fetched();
    assert_eq!(fetched.len(), 32);
    let unique: HashSet<_> = fetched.iter().copied().collect();
    assert_eq!(unique.len(), 32);
    assert_eq!(provider.state.attempts.load(Ordering::SeqCst), 33);

    let fetch_job = orchestrator
        .jobs()
        .into_iter()
        .find(|h| h.info().stage == Stage::Fetch)
        .unwrap();
    assert_eq!(fetch_job.state().attempts, 2);
    assert_eq!(fetch_job.status(), JobStatus::Done);
}

#[tokio::test]
async fn test_rate_limit_pauses_every_tile_of_an_area() {
    let state = MockState::default();
    state.rate_limited_attempts.lock().unwrap().insert(5);
    let provider = MockProvider::with_state(state);
    let config = PipelineConfig {
        workers: WorkerCounts {
            fetch: 4,
            tile: 4,
            ..WorkerCounts::default()
        },
        ..test_config()
    };
    let cooldown = config.cooldown;
    let (orchestrator, _tool, _temp_dir) = orchestrator(provider.clone(), config);

    let parent = TileCoord::new(2133, 1446, 12);
    let submission = orchestrator
        .submit_area(AreaRequest {
            coords: parent.bbox().inset_ring(0.001),
            zoom: 11,
            options: TileOptions::default(),
        })
        .unwrap();
    wait(&submission.handle).await.unwrap();

    assert_eq!(submission.tiles.len(), 4);
    for tile in &submission.tiles {
        assert_eq!(tile.handle.status(), JobStatus::Done);
    }
    assert_eq!(orchestrator.gate().trips(), 1);
    assert!(!orchestrator.gate().is_paused());

    // No tile reached the provider while the queue was paused
    let limited_at = provider.state.limited_at.lock().unwrap().unwrap();
    let resume_at = limited_at + cooldown;
    let started = provider.started();
    let during_pause: Vec<_> = started
        .iter()
        .filter(|(_, at)| *at > limited_at && *at < resume_at)
        .collect();
    assert!(during_pause.is_empty(), "fetched while paused: {during_pause:?}");

    // Tiles besides the rate-limited one were held and resumed too
    let resumed: HashSet<TileCoord> = started
        .iter()
        .filter(|(_, at)| *at >= resume_at)
        .filter_map(|(leaf, _)| leaf.parent())
        .collect();
    assert!(resumed.len() > 1, "resumed tiles: {resumed:?}");

    // Four tiles, four leaves, three layers; no leaf fetched twice
    let fetched = provider.fetched();
    let unique: HashSet<_> = fetched.iter().copied().collect();
    assert_eq!(fetched.len(), 4 * 12);
    assert_eq!(unique.len(), fetched.len());
    assert_eq!(provider.state.attempts.load(Ordering::SeqCst), 4 * 12 + 1);
}

#[tokio::test]
async fn test_retries_exhausted_fails_tile() {
    let provider = MockProvider::with_state(MockState {
        always_rate_limited: true,
        ..MockState::default()
    });
    let config = PipelineConfig {
        max_retries: 1,
        cooldown: Duration::from_millis(20),
        ..test_config()
    };
    let (orchestrator, _tool, _temp_dir) = orchestrator(provider, config);

    let submission = orchestrator
        .submit_tile(tile(), TileOptions::default())
        .unwrap();
    let err = wait(&submission.handle).await.unwrap_err();

    assert!(matches!(err, PipelineError::DependencyFailed { stage: Stage::Tile, .. }));
    assert!(err.to_string().contains("Rate limited"), "{err}");
    assert!(!orchestrator.store().tile_dir(&submission.id).exists());
    assert_eq!(orchestrator.gate().trips(), 1);
}

#[tokio::test]
async fn test_provider_failure_removes_tile_directory() {
    let provider = MockProvider::with_state(MockState {
        failing_layer: Some((LayerKind::Satellite, Script::Rejected)),
        ..MockState::default()
    });
    let (orchestrator, tool, _temp_dir) = orchestrator(provider, test_config());

    let submission = orchestrator
        .submit_tile(tile(), TileOptions::default())
        .unwrap();
    let err = wait(&submission.handle).await.unwrap_err();

    assert!(err.to_string().contains("HTTP 404"), "{err}");
    assert!(!orchestrator.store().tile_dir(&submission.id).exists());
    assert_eq!(submission.handle.status(), JobStatus::Failed);
    assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
    // Not retryable: the gate never tripped
    assert_eq!(orchestrator.gate().trips(), 0);

    let stages: Vec<Stage> = orchestrator.jobs().iter().map(|h| h.info().stage).collect();
    assert_eq!(stages, vec![Stage::Tile, Stage::Fetch]);
}

#[tokio::test]
async fn test_malformed_image_removes_tile_directory() {
    let provider = MockProvider::with_state(MockState {
        failing_layer: Some((LayerKind::Terrain, Script::Garbage)),
        ..MockState::default()
    });
    let (orchestrator, _tool, _temp_dir) = orchestrator(provider, test_config());

    let submission = orchestrator
        .submit_tile(tile(), TileOptions::default())
        .unwrap();
    let err = wait(&submission.handle).await.unwrap_err();

    assert!(err.to_string().contains("malformed input"), "{err}");
    assert!(!orchestrator.store().tile_dir(&submission.id).exists());
}

#[tokio::test]
async fn test_missing_landcover_layer_is_configuration_error() {
    let provider = MockProvider::new().without_landcover();
    let (orchestrator, _tool, _temp_dir) = orchestrator(provider.clone(), test_config());

    let submission = orchestrator
        .submit_tile(tile(), TileOptions::default())
        .unwrap();
    let err = wait(&submission.handle).await.unwrap_err();

    assert!(err.to_string().contains("landcover"), "{err}");
    assert!(provider.fetched().is_empty());
    assert!(!orchestrator.store().tile_dir(&submission.id).exists());
}

#[tokio::test]
async fn test_options_skip_stages() {
    let provider = MockProvider::new();
    let (orchestrator, _tool, _temp_dir) = orchestrator(provider.clone(), test_config());

    let submission = orchestrator
        .submit_tile(
            tile(),
            TileOptions {
                landcover: false,
                heightmap: true,
                seed: Some(3),
            },
        )
        .unwrap();
    wait(&submission.handle).await.unwrap();

    let stages: Vec<Stage> = orchestrator.jobs().iter().map(|h| h.info().stage).collect();
    assert_eq!(
        stages,
        vec![Stage::Tile, Stage::Fetch, Stage::Heightmap, Stage::Export]
    );
    assert!(provider
        .fetched()
        .iter()
        .all(|(_, layer)| *layer != LayerKind::Landcover));

    let store = orchestrator.store();
    assert!(store.artifact(&submission.id, Artifact::HeightmapFinal).is_file());
    assert!(!store.artifact(&submission.id, Artifact::Ocean).is_file());
    assert!(!store.artifact(&submission.id, Artifact::Coverage).is_file());
}

#[tokio::test]
async fn test_area_fans_out_to_tiles() {
    let provider = MockProvider::new();
    let (orchestrator, _tool, temp_dir) = orchestrator(provider.clone(), test_config());

    // A ring just inside one zoom-12 tile
    let parent = TileCoord::new(2133, 1446, 12);
    let coords = parent.bbox().inset_ring(0.001);

    let submission = orchestrator
        .submit_area(AreaRequest {
            coords,
            zoom: 11,
            options: TileOptions::default(),
        })
        .unwrap();
    wait(&submission.handle).await.unwrap();

    let roots: Vec<TileCoord> = submission.tiles.iter().map(|t| t.root).collect();
    assert_eq!(roots, parent.children().to_vec());
    for tile in &submission.tiles {
        assert_eq!(tile.handle.status(), JobStatus::Done);
    }
    assert_eq!(provider.fetched().len(), 4 * 12);

    let catalog = TileCatalog::new(TileStore::new(temp_dir.path()));
    let entries = catalog.list(None).unwrap();
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().all(|e| e.has(Artifact::HeightmapFinal)));

    let centre = parent.children()[0].bbox();
    let within = catalog.list(Some(&centre)).unwrap();
    assert_eq!(within.len(), 1);
    assert_eq!(within[0].metadata.tile, parent.children()[0]);
}

#[tokio::test]
async fn test_area_failure_propagates() {
    let provider = MockProvider::with_state(MockState {
        failing_layer: Some((LayerKind::Satellite, Script::Rejected)),
        ..MockState::default()
    });
    let (orchestrator, _tool, _temp_dir) = orchestrator(provider, test_config());

    let submission = orchestrator
        .submit_area(AreaRequest {
            coords: tile().bbox().inset_ring(0.001),
            zoom: 13,
            options: TileOptions::default(),
        })
        .unwrap();
    let err = wait(&submission.handle).await.unwrap_err();

    assert!(matches!(err, PipelineError::DependencyFailed { stage: Stage::Area, .. }));
    assert_eq!(submission.tiles.len(), 1);
}

#[tokio::test]
async fn test_shutdown_rejects_waiting_work() {
    let (orchestrator, _tool, _temp_dir) = orchestrator(MockProvider::new(), test_config());
    orchestrator.shutdown();

    let submission = orchestrator
        .submit_tile(tile(), TileOptions::default())
        .unwrap();
    let err = wait(&submission.handle).await.unwrap_err();

    assert!(err.to_string().contains("shutting down"), "{err}");
    assert!(!orchestrator.store().tile_dir(&submission.id).exists());
}
