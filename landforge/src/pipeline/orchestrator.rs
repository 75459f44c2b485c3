//! Job orchestrator.
//!
//! The orchestrator owns one worker pool per stage and drives tile jobs
//! through them:
//!
//! ```text
//! area ──► tile ──► fetch ──► landcover ──► heightmap ──► export
//!           │          ▲           ▲             ▲            ▲
//!           └──────────┴── waits on each child's completion ──┘
//! ```
//!
//! Every job runs in its own task and publishes its state through a
//! [`JobHandle`]. A tile job spawns one child per stage and blocks on the
//! child's handle before moving on, so a later stage never sees the
//! artifacts of an unfinished earlier one.
//!
//! # Failure handling
//!
//! Transient provider failures trip the provider queue's [`CooldownGate`]
//! and requeue the job. Any other failure fails the stage job, and the
//! tile job removes the tile directory before reporting
//! [`PipelineError::PartialState`].
//!
//! # Deduplication
//!
//! A tile job claims its [`TileId`] and then checks for an existing
//! directory. A complete one means the tile was already generated and the
//! job finishes without fetching anything; a pending one is the leftover of
//! an interrupted run and is removed before starting over.

use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::area::{plan_area, tile_cover};
use super::stages::{self, TileJob};
use super::{
    CooldownGate, JobHandle, JobId, JobInfo, JobRegistry, JobReporter, PipelineConfig,
    PipelineError, Stage, StagePool, TileOptions,
};
use crate::coord::{TileCoord, TileId};
use crate::geotiff::GeoreferenceTool;
use crate::landcover::Palette;
use crate::provider::{landcover_layer, AsyncProvider, ProviderError};
use crate::stitch::TileTree;
use crate::store::{Artifact, ClaimRegistry, TileMetadata, TileStore};

/// Request to generate every tile of a drawn area.
#[derive(Debug, Clone)]
pub struct AreaRequest {
    /// `(lon, lat)` points of the drawn line or ring
    pub coords: Vec<(f64, f64)>,
    pub zoom: u8,
    pub options: TileOptions,
}

/// A submitted tile job.
#[derive(Debug, Clone)]
pub struct TileSubmission {
    pub id: TileId,
    pub root: TileCoord,
    pub handle: JobHandle,
}

/// A submitted area job and the tile jobs it fanned out to.
#[derive(Debug, Clone)]
pub struct AreaSubmission {
    pub handle: JobHandle,
    pub tiles: Vec<TileSubmission>,
}

pub(crate) struct Inner<P, G> {
    pub(crate) provider: P,
    pub(crate) georeference: Option<G>,
    pub(crate) store: TileStore,
    pub(crate) palette: Palette,
    pub(crate) config: PipelineConfig,
    pub(crate) gate: Arc<CooldownGate>,
    claims: ClaimRegistry,
    registry: JobRegistry,
    pools: Vec<StagePool>,
    shutdown: CancellationToken,
}

impl<P, G> Inner<P, G> {
    fn pool(&self, stage: Stage) -> Option<&StagePool> {
        self.pools.iter().find(|p| p.stage() == stage)
    }
}

/// Drives tile jobs through the stage pools.
pub struct Orchestrator<P, G> {
    inner: Arc<Inner<P, G>>,
}

impl<P, G> Clone for Orchestrator<P, G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, G> Orchestrator<P, G>
where
    P: AsyncProvider + 'static,
    G: GeoreferenceTool + 'static,
{
    /// Creates an orchestrator.
    ///
    /// Without a georeferencing tool, or with export disabled in `config`,
    /// the export stage is skipped.
    pub fn new(
        provider: P,
        georeference: Option<G>,
        store: TileStore,
        config: PipelineConfig,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let gate = Arc::new(CooldownGate::new(Stage::Fetch.as_str(), config.cooldown));
        let workers = config.workers;

        let pools = vec![
            StagePool::new(Stage::Tile, workers.tile, shutdown.clone()),
            StagePool::new(Stage::Fetch, workers.fetch, shutdown.clone())
                .with_gate(Arc::clone(&gate)),
            StagePool::new(Stage::Landcover, workers.landcover, shutdown.clone()),
            StagePool::new(Stage::Heightmap, workers.heightmap, shutdown.clone()),
            StagePool::new(Stage::Export, workers.export, shutdown.clone()),
        ];

        info!(
            provider = provider.name(),
            root = %store.root().display(),
            fetch_workers = workers.fetch,
            landcover_workers = workers.landcover,
            heightmap_workers = workers.heightmap,
            tile_workers = workers.tile,
            "Orchestrator started"
        );

        Self {
            inner: Arc::new(Inner {
                provider,
                georeference,
                store,
                palette: Palette::standard(),
                config,
                gate,
                claims: ClaimRegistry::new(),
                registry: JobRegistry::new(),
                pools,
                shutdown,
            }),
        }
    }

    pub fn store(&self) -> &TileStore {
        &self.inner.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    /// The provider queue's cool-down gate.
    pub fn gate(&self) -> &CooldownGate {
        &self.inner.gate
    }

    /// Worker pool of `stage`; `None` for the unpooled area stage.
    pub fn pool(&self, stage: Stage) -> Option<&StagePool> {
        self.inner.pool(stage)
    }

    /// Every job created so far, in creation order.
    pub fn jobs(&self) -> Vec<JobHandle> {
        self.inner.registry.jobs()
    }

    /// Stops admitting work. Jobs waiting for a worker fail with
    /// [`PipelineError::ShuttingDown`]; running jobs finish.
    pub fn shutdown(&self) {
        info!("Orchestrator shutting down");
        self.inner.shutdown.cancel();
    }

    /// Plans an area and submits one tile job per cover.
    ///
    /// Returns immediately; the area handle completes once every tile job
    /// has finished and fails if any of them failed.
    pub fn submit_area(&self, request: AreaRequest) -> Result<AreaSubmission, PipelineError> {
        let covers = plan_area(&request.coords, request.zoom, self.inner.config.target_zoom)?;
        info!(
            zoom = request.zoom,
            tiles = covers.len(),
            "Area planned"
        );

        let (handle, reporter) = self.new_job(Stage::Area, None);
        reporter.activate();

        let tiles = covers
            .into_iter()
            .map(|cover| self.submit_cover(cover, request.options))
            .collect::<Result<Vec<_>, _>>();
        let tiles = match tiles {
            Ok(tiles) => tiles,
            Err(e) => {
                reporter.fail(&e);
                return Err(e);
            }
        };

        let waits: Vec<JobHandle> = tiles.iter().map(|t| t.handle.clone()).collect();
        tokio::spawn(async move {
            let total = waits.len();
            let results = join_all(waits.iter().map(|h| h.wait())).await;
            let failed = results.iter().filter(|r| r.is_err()).count();
            if failed == 0 {
                info!(tiles = total, "Area finished");
                reporter.complete();
            } else {
                let err = PipelineError::DependencyFailed {
                    stage: Stage::Tile,
                    reason: format!("{} of {} tiles failed", failed, total),
                };
                warn!(failed, tiles = total, "Area finished with failures");
                reporter.fail(&err);
            }
        });

        Ok(AreaSubmission { handle, tiles })
    }

    /// Submits a job for one tile, covered by its four children.
    pub fn submit_tile(
        &self,
        tile: TileCoord,
        options: TileOptions,
    ) -> Result<TileSubmission, PipelineError> {
        self.submit_cover(tile_cover(&tile)?, options)
    }

    /// Submits a tile job for an explicit cover: one tile or four siblings
    /// in stitch order.
    pub fn submit_cover(
        &self,
        cover: Vec<TileCoord>,
        options: TileOptions,
    ) -> Result<TileSubmission, PipelineError> {
        let tree = TileTree::from_cover(&cover, 0)?;
        let root = tree.node(tree.root()).coord;
        let job = TileJob {
            id: TileId::for_tiles(&cover),
            root,
            cover,
            options,
        };

        let (handle, reporter) = self.new_job(Stage::Tile, Some(root));
        let submission = TileSubmission {
            id: job.id.clone(),
            root,
            handle: handle.clone(),
        };

        let this = self.clone();
        tokio::spawn(async move {
            let result = this.run_tile(&job, &reporter).await;
            let _ = reporter.finish(result);
        });
        Ok(submission)
    }

    fn new_job(&self, stage: Stage, tile: Option<TileCoord>) -> (JobHandle, JobReporter) {
        let (handle, reporter) = JobHandle::channel(JobInfo {
            id: JobId::next(),
            stage,
            tile,
        });
        self.inner.registry.register(&handle);
        (handle, reporter)
    }

    async fn run_tile(&self, job: &TileJob, reporter: &JobReporter) -> Result<(), PipelineError> {
        if job.options.landcover && landcover_layer(&self.inner.provider).is_none() {
            return Err(PipelineError::Configuration(format!(
                "provider {} serves no landcover layer",
                self.inner.provider.name()
            )));
        }

        let _permit = match self.inner.pool(Stage::Tile) {
            Some(pool) => Some(pool.acquire().await?),
            None => None,
        };
        reporter.activate();

        let _claim = self.inner.claims.claim(&job.id).await;
        if self.inner.store.exists(&job.id) {
            let sidecar = self.inner.store.artifact(&job.id, Artifact::Metadata);
            match TileMetadata::load(&sidecar) {
                Ok(metadata) if metadata.is_complete() => {
                    info!(tile = %job.root, tile_id = %job.id, "Tile already generated, skipping");
                    return Ok(());
                }
                _ => {
                    warn!(tile = %job.root, tile_id = %job.id, "Removing unfinished tile directory");
                    self.inner.store.remove(&job.id).await?;
                }
            }
        }

        self.inner.store.create(&job.id).await?;
        reporter.progress(10);
        info!(tile = %job.root, tile_id = %job.id, "Tile job started");

        match self.drive_tile(job, reporter).await {
            Ok(()) => {
                info!(tile = %job.root, tile_id = %job.id, "Tile job finished");
                Ok(())
            }
            Err(e) => {
                warn!(tile = %job.root, tile_id = %job.id, error = %e, "Tile job failed, cleaning up");
                if let Err(cleanup) = self.inner.store.remove(&job.id).await {
                    error!(tile_id = %job.id, error = %cleanup, "Failed to remove tile directory");
                }
                Err(PipelineError::PartialState {
                    tile: job.id.clone(),
                    source: Box::new(e),
                })
            }
        }
    }

    async fn drive_tile(&self, job: &TileJob, reporter: &JobReporter) -> Result<(), PipelineError> {
        stages::write_root_sidecar(&self.inner, job).await?;

        self.spawn_stage(Stage::Fetch, job).wait().await?;
        reporter.progress(50);

        if job.options.landcover {
            self.spawn_stage(Stage::Landcover, job).wait().await?;
        }
        reporter.progress(75);

        if job.options.heightmap {
            self.spawn_stage(Stage::Heightmap, job).wait().await?;
        }
        reporter.progress(90);

        if self.inner.config.export_enabled && self.inner.georeference.is_some() {
            self.spawn_stage(Stage::Export, job).wait().await?;
        }
        stages::mark_complete(&self.inner, job).await
    }

    /// Starts a stage job for `job` in its own task.
    fn spawn_stage(&self, stage: Stage, job: &TileJob) -> JobHandle {
        let (handle, reporter) = self.new_job(stage, Some(job.root));
        let this = self.clone();
        let job = job.clone();
        tokio::spawn(async move {
            let result = this.run_with_retry(stage, &job, &reporter).await;
            let _ = reporter.finish(result);
        });
        handle
    }

    /// Runs a stage job on its pool, requeueing it after the cool-down on
    /// retryable failures until `max_retries` is exhausted.
    async fn run_with_retry(
        &self,
        stage: Stage,
        job: &TileJob,
        reporter: &JobReporter,
    ) -> Result<(), PipelineError> {
        let pool = self
            .inner
            .pool(stage)
            .ok_or_else(|| PipelineError::Internal(format!("no worker pool for {}", stage)))?;
        let mut retries = 0;

        loop {
            let permit = pool.acquire().await?;
            reporter.activate();
            info!(stage = %stage, job_id = %reporter.info().id, tile = %job.root, "Stage started");

            let result = stages::run(&self.inner, stage, job, reporter).await;
            drop(permit);

            match result {
                Ok(()) => {
                    info!(stage = %stage, job_id = %reporter.info().id, tile = %job.root, "Stage finished");
                    return Ok(());
                }
                Err(e) if e.is_retryable() && retries < self.inner.config.max_retries => {
                    retries += 1;
                    let retry_after = match &e {
                        PipelineError::TransientProvider(ProviderError::RateLimited {
                            retry_after,
                        }) => *retry_after,
                        _ => None,
                    };
                    self.inner.gate.trip(retry_after);
                    warn!(
                        stage = %stage,
                        job_id = %reporter.info().id,
                        tile = %job.root,
                        attempt = retries,
                        error = %e,
                        "Transient failure, requeued until cool-down ends"
                    );
                    reporter.requeue();
                    self.inner.gate.wait_ready().await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
