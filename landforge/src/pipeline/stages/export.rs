//! Export stage: georeference the landcover textures.

use tracing::{debug, info};

use crate::geotiff::{tif_path, GeoreferenceTool};
use crate::provider::AsyncProvider;
use crate::store::Artifact;

use super::super::orchestrator::Inner;
use super::super::{JobReporter, PipelineError};
use super::TileJob;

/// Rasters that get a GeoTIFF counterpart.
const EXPORTED: [Artifact; 2] = [Artifact::LandcoverTexture, Artifact::LandcoverTextureSmall];

pub(super) async fn run<P, G>(
    inner: &Inner<P, G>,
    job: &TileJob,
    reporter: &JobReporter,
) -> Result<(), PipelineError>
where
    P: AsyncProvider,
    G: GeoreferenceTool,
{
    let Some(tool) = &inner.georeference else {
        return Ok(());
    };
    let bbox = job.root.bbox();
    let mut exported = 0;

    for (i, artifact) in EXPORTED.iter().enumerate() {
        let source = inner.store.artifact(&job.id, *artifact);
        if !source.is_file() {
            debug!(tile = %job.root, source = %source.display(), "Nothing to export");
            continue;
        }
        tool.georeference(&source, &tif_path(&source), &bbox).await?;
        exported += 1;
        reporter.progress(((i + 1) * 100 / EXPORTED.len()) as u8);
    }

    info!(tile = %job.root, exported, "GeoTIFF export finished");
    Ok(())
}
