//! Stage implementations run by the orchestrator's workers.
//!
//! Each stage reads the artifacts left by the previous ones from the tile
//! directory and writes its own, so a stage job carries nothing but the
//! [`TileJob`] it belongs to.

mod export;
mod fetch;
mod heightmap;
mod landcover;

use crate::coord::{TileCoord, TileId};
use crate::geotiff::GeoreferenceTool;
use crate::provider::AsyncProvider;
use crate::store::{Artifact, TileMetadata};

use super::orchestrator::Inner;
use super::{JobReporter, PipelineError, Stage, TileOptions};

/// The unit of work passed down the stages.
#[derive(Debug, Clone)]
pub struct TileJob {
    pub id: TileId,
    /// Covering tiles in stitch order
    pub cover: Vec<TileCoord>,
    /// The tile the cover stitches into
    pub root: TileCoord,
    pub options: TileOptions,
}

/// Runs one stage of `job`.
pub(crate) async fn run<P, G>(
    inner: &Inner<P, G>,
    stage: Stage,
    job: &TileJob,
    reporter: &JobReporter,
) -> Result<(), PipelineError>
where
    P: AsyncProvider,
    G: GeoreferenceTool,
{
    match stage {
        Stage::Fetch => fetch::run(inner, job, reporter).await,
        Stage::Landcover => landcover::run(inner, job, reporter).await,
        Stage::Heightmap => heightmap::run(inner, job, reporter).await,
        Stage::Export => export::run(inner, job, reporter).await,
        Stage::Area | Stage::Tile => Err(PipelineError::Internal(format!(
            "{} is not a worker stage",
            stage
        ))),
    }
}

/// Writes the root `tile.json` of a freshly created tile directory.
pub(crate) async fn write_root_sidecar<P, G>(
    inner: &Inner<P, G>,
    job: &TileJob,
) -> Result<(), PipelineError> {
    let path = inner.store.artifact(&job.id, Artifact::Metadata);
    let metadata = TileMetadata::new(job.root, job.root.sibling_index());
    inner.store.write_json(&path, &metadata).await?;
    Ok(())
}

/// Marks the root `tile.json` complete. Nothing is written after this.
pub(crate) async fn mark_complete<P, G>(
    inner: &Inner<P, G>,
    job: &TileJob,
) -> Result<(), PipelineError> {
    let path = inner.store.artifact(&job.id, Artifact::Metadata);
    let metadata = TileMetadata::load(&path)?.completed();
    inner.store.write_json(&path, &metadata).await?;
    Ok(())
}
