//! Fetch stage: download every leaf of the tile tree and stitch it.
//!
//! Leaf downloads are persisted under `leaves/` before anything is
//! stitched. A requeued job therefore resumes where the rate limit cut it
//! off and never fetches a (tile, layer) pair twice.

use std::collections::HashMap;
use std::path::PathBuf;

use image::{GrayImage, RgbaImage};
use tracing::{debug, info};

use crate::coord::TileId;
use crate::geotiff::GeoreferenceTool;
use crate::heightmap::{ElevationRange, HeightField};
use crate::provider::{landcover_layer, AsyncProvider, LayerKind};
use crate::raster::{self, RasterError};
use crate::stitch::{stitch_normalized, NodeId, TileTree};
use crate::store::{Artifact, TileMetadata, TileStore};

use super::super::orchestrator::Inner;
use super::super::{JobReporter, PipelineError};
use super::TileJob;

/// Share of the stage's progress spent downloading.
const DOWNLOAD_PROGRESS: usize = 80;

/// File a fetched layer is stored under, both per leaf and stitched.
fn leaf_artifact(layer: LayerKind) -> Artifact {
    match layer {
        LayerKind::Terrain => Artifact::TerrainRgb,
        LayerKind::Satellite => Artifact::Satellite,
        LayerKind::Landcover | LayerKind::Classification => Artifact::Landcover,
    }
}

pub(super) async fn run<P, G>(
    inner: &Inner<P, G>,
    job: &TileJob,
    reporter: &JobReporter,
) -> Result<(), PipelineError>
where
    P: AsyncProvider,
    G: GeoreferenceTool,
{
    let tree = TileTree::from_cover(&job.cover, inner.config.leaf_depth)?;
    let mut layers = vec![LayerKind::Terrain, LayerKind::Satellite];
    if job.options.landcover {
        if let Some(layer) = landcover_layer(&inner.provider) {
            layers.push(layer);
        }
    }

    let leaves = tree.leaves();
    let total = leaves.len() * layers.len();
    let mut done = 0;
    let mut fetched = 0;

    for &leaf in &leaves {
        let coord = tree.node(leaf).coord;
        let dir = inner.store.leaf_dir(&job.id, &tree.path(leaf));
        for &layer in &layers {
            let path = dir.join(leaf_artifact(layer).file_name());
            if !path.is_file() {
                // In-flight jobs honour a pause tripped by another job.
                inner.gate.wait_ready().await;
                let bytes = inner.provider.fetch(coord, layer).await?;
                raster::decode(&bytes)?;
                inner.store.write_atomic(&path, &bytes).await?;
                fetched += 1;
                debug!(tile = %coord, layer = %layer, "Leaf fetched");
            }
            done += 1;
            reporter.progress((done * DOWNLOAD_PROGRESS / total) as u8);
        }
    }

    let store = inner.store.clone();
    let id = job.id.clone();
    let resolution = inner.config.resolution;
    let outputs = tokio::task::spawn_blocking(move || {
        assemble(&store, &id, &tree, &layers, resolution)
    })
    .await??;

    for (path, data) in &outputs.files {
        inner.store.write_atomic(path, data).await?;
    }
    for (path, metadata) in &outputs.sidecars {
        inner.store.write_json(path, metadata).await?;
    }

    let sidecar = inner.store.artifact(&job.id, Artifact::Metadata);
    let root = match TileMetadata::load(&sidecar) {
        Ok(existing) => existing,
        Err(_) => TileMetadata::new(job.root, job.root.sibling_index()),
    };
    let root = match outputs.elevation {
        Some(range) => root.with_elevation(range),
        None => root,
    };
    inner.store.write_json(&sidecar, &root).await?;

    info!(
        tile = %job.root,
        leaves = leaves.len(),
        fetched,
        min_height = root.min_height,
        max_height = root.max_height,
        "Tile imagery stitched"
    );
    Ok(())
}

/// Encoded artifacts produced from the downloaded leaves.
struct Assembled {
    files: Vec<(PathBuf, Vec<u8>)>,
    sidecars: Vec<(PathBuf, TileMetadata)>,
    elevation: Option<ElevationRange>,
}

/// Decodes the leaves and builds the stitched rasters and the heightmap.
fn assemble(
    store: &TileStore,
    id: &TileId,
    tree: &TileTree,
    layers: &[LayerKind],
    resolution: usize,
) -> Result<Assembled, PipelineError> {
    let root = tree.root();
    let leaves = tree.leaves();
    let mut files = Vec::new();
    let mut sidecars = Vec::new();
    let mut elevation: Option<ElevationRange> = None;
    let mut heights: HashMap<NodeId, GrayImage> = HashMap::new();

    for &layer in layers {
        let artifact = leaf_artifact(layer);
        let mut images: HashMap<NodeId, RgbaImage> = HashMap::new();
        for &leaf in &leaves {
            let path = store.leaf_dir(id, &tree.path(leaf)).join(artifact.file_name());
            images.insert(leaf, raster::load(&path)?);
        }

        if layer == LayerKind::Terrain {
            for &leaf in &leaves {
                let image = images
                    .get(&leaf)
                    .ok_or(RasterError::MissingTile(leaf.index()))?;
                let (field, range) = HeightField::from_terrain_rgb(image)?;
                heights.insert(leaf, field.to_gray());

                elevation = Some(match elevation {
                    Some(acc) => ElevationRange {
                        min: acc.min.min(range.min),
                        max: acc.max.max(range.max),
                    },
                    None => range,
                });

                if leaf != root {
                    let node = tree.node(leaf);
                    let dir = store.leaf_dir(id, &tree.path(leaf));
                    sidecars.push((
                        dir.join(Artifact::Metadata.file_name()),
                        TileMetadata::new(node.coord, node.index).with_elevation(range),
                    ));
                }
            }
        }

        if root_is_leaf(tree) {
            // The root is its own leaf; its download already sits in place.
            continue;
        }
        let stitched = tree.composite(root, &images)?;
        files.push((
            store.artifact(id, artifact),
            raster::encode_png(&stitched)?,
        ));
    }

    let stitched = stitch_normalized(tree, root, &heights)?;
    let heightmap = HeightField::from_gray(&stitched)?.resized(resolution);
    files.push((
        store.artifact(id, Artifact::Heightmap),
        raster::encode_gray_png(&heightmap.to_gray())?,
    ));

    Ok(Assembled {
        files,
        sidecars,
        elevation,
    })
}

fn root_is_leaf(tree: &TileTree) -> bool {
    tree.node(tree.root()).children.is_empty()
}
