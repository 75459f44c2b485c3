//! Heightmap stage: combine stitched elevation with landcover masks.

use std::path::Path;

use tracing::{debug, info};

use crate::geotiff::GeoreferenceTool;
use crate::heightmap::{compose, HeightField, HeightmapParams};
use crate::landcover::MaskSet;
use crate::provider::AsyncProvider;
use crate::raster;
use crate::store::{Artifact, TileStore};

use super::super::orchestrator::Inner;
use super::super::{JobReporter, PipelineError};
use super::TileJob;

pub(super) async fn run<P, G>(
    inner: &Inner<P, G>,
    job: &TileJob,
    reporter: &JobReporter,
) -> Result<(), PipelineError>
where
    P: AsyncProvider,
    G: GeoreferenceTool,
{
    let store = inner.store.clone();
    let palette = inner.palette.clone();
    let resolution = inner.config.resolution;
    let params = HeightmapParams {
        seed: job.options.seed,
        ..inner.config.heightmap.clone()
    };
    let id = job.id.clone();

    let (elevation, ocean, masks) = tokio::task::spawn_blocking(move || {
        let elevation = load_field(&store.artifact(&id, Artifact::Heightmap), resolution)?;

        let mut masks = MaskSet::default();
        for &class in palette.classes() {
            let path = store.mask(&id, class);
            if path.is_file() {
                masks.insert(class, load_field(&path, resolution)?);
            }
        }
        debug!(tile_id = %id, masks = masks.len(), "Composing heightmap");

        let composed = compose(&elevation, &masks, &params)?;
        let ocean = match &composed.ocean {
            Some(ocean) => Some(raster::encode_gray_png(&ocean.to_gray())?),
            None => None,
        };
        let elevation = raster::encode_gray_png(&composed.elevation.to_gray())?;
        Ok::<_, PipelineError>((elevation, ocean, masks.len()))
    })
    .await??;
    reporter.progress(80);

    write(&inner.store, job, Artifact::HeightmapFinal, &elevation).await?;
    if let Some(ocean) = &ocean {
        write(&inner.store, job, Artifact::Ocean, ocean).await?;
    }

    info!(
        tile = %job.root,
        masks,
        ocean = ocean.is_some(),
        "Heightmap composed"
    );
    Ok(())
}

fn load_field(path: &Path, resolution: usize) -> Result<HeightField, PipelineError> {
    let gray = raster::to_grayscale(&raster::load(path)?);
    Ok(HeightField::from_gray(&gray)?.resized(resolution))
}

async fn write(
    store: &TileStore,
    job: &TileJob,
    artifact: Artifact,
    data: &[u8],
) -> Result<(), PipelineError> {
    store
        .write_atomic(&store.artifact(&job.id, artifact), data)
        .await?;
    Ok(())
}
