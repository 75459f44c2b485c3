//! Seam brightness normalization between neighbouring heightmap tiles.
//!
//! Each tile's heightmap is normalized on its own, so two neighbours rarely
//! agree on the height of their shared edge. Before stitching, the tile
//! whose touching edge has the brighter peak is scaled down so that its
//! peak matches the darker side.
//!
//! This is one linear factor for the whole tile, not a gradient, so banding
//! can remain; later blurring hides most of it.

use std::collections::HashMap;

use image::GrayImage;
use tracing::debug;

use super::{stitch, NodeId, TileTree};
use crate::raster::{edge_pixels, Edge, RasterError};

/// Outcome of normalizing one pair of tiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeamAdjustment {
    /// Which side of the pair was darkened, if any: 0 for the first, 1 for the second.
    pub darkened: Option<usize>,
    /// Multiplicative factor applied to the darkened tile.
    pub factor: f32,
}

impl SeamAdjustment {
    const NONE: SeamAdjustment = SeamAdjustment {
        darkened: None,
        factor: 1.0,
    };
}

/// Compares the brightest pixels along the touching edges of `a` and `b`
/// and darkens the brighter tile by the fractional difference.
///
/// `a_edge` is the side of `a` that touches `b`.
pub fn normalize_pair(a: &mut GrayImage, b: &mut GrayImage, a_edge: Edge) -> SeamAdjustment {
    let peak_a = edge_pixels(a, a_edge).into_iter().max().unwrap_or(0);
    let peak_b = edge_pixels(b, a_edge.opposite()).into_iter().max().unwrap_or(0);

    let (target, bright, dark, index) = match peak_a.cmp(&peak_b) {
        std::cmp::Ordering::Equal => return SeamAdjustment::NONE,
        std::cmp::Ordering::Greater => (a, peak_a, peak_b, 0),
        std::cmp::Ordering::Less => (b, peak_b, peak_a, 1),
    };

    let fraction = (bright - dark) as f32 / bright as f32;
    let factor = 1.0 - fraction;
    for px in target.pixels_mut() {
        px[0] = (px[0] as f32 * factor).round() as u8;
    }

    debug!(
        darkened = index,
        bright_peak = bright,
        dark_peak = dark,
        factor = factor,
        "Seam normalized"
    );

    SeamAdjustment {
        darkened: Some(index),
        factor,
    }
}

/// Normalizes the two horizontal seams of a 2×2 group in stitch order.
///
/// Pairs are top-left/top-right and bottom-left/bottom-right, the
/// neighbours that are consecutive in serpentine fetch order.
pub fn normalize_quad(tiles: &mut [GrayImage]) -> [SeamAdjustment; 2] {
    if tiles.len() != 4 {
        return [SeamAdjustment::NONE; 2];
    }
    let (top, bottom) = tiles.split_at_mut(2);
    let (top_left, top_right) = top.split_at_mut(1);
    let (bottom_right, bottom_left) = bottom.split_at_mut(1);

    [
        normalize_pair(&mut top_left[0], &mut top_right[0], Edge::Right),
        normalize_pair(&mut bottom_left[0], &mut bottom_right[0], Edge::Right),
    ]
}

/// Composites heightmap leaves under `id`, normalizing seams at every level.
///
/// Like [`TileTree::composite`], but each group of four is passed through
/// [`normalize_quad`] before it is stitched.
pub fn stitch_normalized(
    tree: &TileTree,
    id: NodeId,
    leaves: &HashMap<NodeId, GrayImage>,
) -> Result<GrayImage, RasterError> {
    let node = tree.node(id);
    if node.children.is_empty() {
        return leaves
            .get(&id)
            .cloned()
            .ok_or(RasterError::MissingTile(id.index()));
    }

    let mut children = node
        .children
        .iter()
        .map(|&child| stitch_normalized(tree, child, leaves))
        .collect::<Result<Vec<_>, _>>()?;
    normalize_quad(&mut children);
    stitch(&children)
}
