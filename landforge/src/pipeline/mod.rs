//! Job pipeline.
//!
//! Turns a drawn area into finished tile directories. An area job fans out
//! to tile jobs; each tile job runs the fetch, landcover, heightmap and
//! export stages in order, each on its own bounded worker pool.
//!
//! # Example
//!
//! ```ignore
//! let orchestrator = Orchestrator::new(provider, Some(GdalTranslate::default()), store, config);
//! let submission = orchestrator.submit_area(AreaRequest {
//!     coords: ring,
//!     zoom: 12,
//!     options: TileOptions::default(),
//! })?;
//! submission.handle.wait().await?;
//! ```

mod area;
mod config;
mod cooldown;
mod error;
mod handle;
mod job;
mod orchestrator;
mod pool;
mod stages;

pub use area::{plan_area, tile_cover};
pub use config::{
    PipelineConfig, WorkerCounts, AREA_INSET_DEG, DEFAULT_RESOLUTION, DEFAULT_TARGET_ZOOM,
    SMALL_TEXTURE_SIZE,
};
pub use cooldown::{CooldownGate, DEFAULT_COOLDOWN};
pub use error::PipelineError;
pub use handle::{JobHandle, JobRegistry, JobReporter};
pub use job::{JobId, JobInfo, JobState, JobStatus, Stage, TileOptions};
pub use orchestrator::{AreaRequest, AreaSubmission, Orchestrator, TileSubmission};
pub use pool::{StagePermit, StagePool};
pub use stages::TileJob;
