//! Area planning: from a drawn area to the covers of individual tile jobs.

use crate::coord::{children_until_zoom, decompose, TileCoord};
use crate::stitch::TileTree;

use super::config::AREA_INSET_DEG;
use super::PipelineError;

/// Splits an area into tile-job covers.
///
/// At or below the finest granularity (`zoom >= target_zoom`) the area's own
/// cover becomes a single job when it is stitchable. Otherwise the cover is
/// descended to `target_zoom`, and each resulting tile is re-covered from a
/// slightly inset copy of its box so every job gets a stitchable cover.
pub fn plan_area(
    coords: &[(f64, f64)],
    zoom: u8,
    target_zoom: u8,
) -> Result<Vec<Vec<TileCoord>>, PipelineError> {
    let cover = decompose(coords, zoom)?;

    let tiles = if zoom >= target_zoom {
        if TileTree::from_cover(&cover, 0).is_ok() {
            return Ok(vec![cover]);
        }
        let mut parents: Vec<TileCoord> = cover.iter().filter_map(|t| t.parent()).collect();
        parents.sort();
        parents.dedup();
        parents
    } else {
        children_until_zoom(&cover, target_zoom)
    };

    tiles
        .iter()
        .map(|tile| {
            let cover_zoom = tile.zoom.min(target_zoom.max(zoom));
            Ok(decompose(&inset_ring(tile), cover_zoom)?)
        })
        .collect()
}

/// Cover of a single tile: its four children, from an inset copy of its box.
pub fn tile_cover(tile: &TileCoord) -> Result<Vec<TileCoord>, PipelineError> {
    Ok(decompose(&inset_ring(tile), tile.zoom)?)
}

/// Closed ring just inside `tile`'s box.
///
/// The inset shrinks for tiles too small to lose [`AREA_INSET_DEG`] on each
/// side.
fn inset_ring(tile: &TileCoord) -> Vec<(f64, f64)> {
    let bbox = tile.bbox();
    let inset = AREA_INSET_DEG
        .min((bbox.east - bbox.west) / 4.0)
        .min((bbox.north - bbox.south) / 4.0);
    bbox.inset_ring(inset)
}
