//! Landcover stage: classify, then derive masks, coverage and textures.

use std::path::Path;

use tracing::info;

use crate::geotiff::GeoreferenceTool;
use crate::landcover::{
    coverage, snap_to_palette, to_texture, CoverageMap, LandcoverClass, MaskSet, Palette,
};
use crate::provider::AsyncProvider;
use crate::raster;
use crate::store::Artifact;

use super::super::config::SMALL_TEXTURE_SIZE;
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
    let store = &inner.store;
    let edited = store.artifact(&job.id, Artifact::LandcoverColorsEdited);
    let (source, write_snapped) = if edited.is_file() {
        info!(tile = %job.root, "Using hand-edited landcover");
        (edited, false)
    } else {
        (store.artifact(&job.id, Artifact::Landcover), true)
    };

    let palette = inner.palette.clone();
    let resolution = inner.config.resolution;
    let outputs = tokio::task::spawn_blocking(move || {
        classify_tile(&source, write_snapped, &palette, resolution)
    })
    .await??;
    reporter.progress(60);

    if let Some(snapped) = &outputs.snapped {
        store
            .write_atomic(&store.artifact(&job.id, Artifact::LandcoverColors), snapped)
            .await?;
    }
    for (class, mask) in &outputs.masks {
        store
            .write_atomic(&store.mask(&job.id, *class), mask)
            .await?;
    }
    store
        .write_json(&store.artifact(&job.id, Artifact::Coverage), &outputs.coverage)
        .await?;
    store
        .write_atomic(
            &store.artifact(&job.id, Artifact::LandcoverTexture),
            &outputs.texture,
        )
        .await?;
    store
        .write_atomic(
            &store.artifact(&job.id, Artifact::LandcoverTextureSmall),
            &outputs.texture_small,
        )
        .await?;

    info!(
        tile = %job.root,
        masks = outputs.masks.len(),
        classified = outputs.coverage.total(),
        "Landcover classified"
    );
    Ok(())
}

struct Classified {
    snapped: Option<Vec<u8>>,
    masks: Vec<(LandcoverClass, Vec<u8>)>,
    coverage: CoverageMap,
    texture: Vec<u8>,
    texture_small: Vec<u8>,
}

/// Snaps `source` to the palette and encodes everything derived from it.
///
/// A hand-edited source is snapped as well, which leaves exact palette
/// colours untouched and cleans up stray brush pixels.
fn classify_tile(
    source: &Path,
    write_snapped: bool,
    palette: &Palette,
    resolution: usize,
) -> Result<Classified, PipelineError> {
    let snapped = snap_to_palette(&raster::load(source)?, palette);

    let masks = MaskSet::from_classified(&snapped, palette, resolution)?;
    let mut encoded = Vec::with_capacity(masks.len());
    for &class in palette.classes() {
        if let Some(mask) = masks.get(class) {
            encoded.push((class, raster::encode_gray_png(&mask.to_gray())?));
        }
    }

    let texture = to_texture(&snapped, palette);
    let small = raster::resize_nearest(&texture, SMALL_TEXTURE_SIZE, SMALL_TEXTURE_SIZE);

    Ok(Classified {
        snapped: if write_snapped {
            Some(raster::encode_png(&snapped)?)
        } else {
            None
        },
        masks: encoded,
        coverage: coverage(&snapped, palette),
        texture: raster::encode_png(&texture)?,
        texture_small: raster::encode_png(&small)?,
    })
}
