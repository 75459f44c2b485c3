//! Area decomposition into covering tiles.
//!
//! An area is an arbitrary list of `(lon, lat)` points (a drawn line or
//! polygon ring). It is reduced to its bounding box, covered with tiles one
//! zoom level below the requested zoom, and reordered so that consecutive
//! tiles in the list are spatial neighbours.

use super::{to_tile_coords, CoordError, TileCoord, MAX_LAT, MIN_LAT};

/// Computes the ordered set of tiles covering `coords` at `zoom + 1`.
///
/// Tiles are sorted by row then column and then put into serpentine order
/// (see [`serpentine`]). For a 2×2 cover this yields top-left, top-right,
/// bottom-right, bottom-left, which is the quadrant order [`crate::stitch`]
/// expects.
pub fn decompose(coords: &[(f64, f64)], zoom: u8) -> Result<Vec<TileCoord>, CoordError> {
    let bbox = super::BoundingBox::from_points(coords).ok_or(CoordError::EmptyArea)?;
    let cover_zoom = zoom.checked_add(1).ok_or(CoordError::InvalidZoom(zoom))?;

    let north = bbox.north.clamp(MIN_LAT, MAX_LAT);
    let south = bbox.south.clamp(MIN_LAT, MAX_LAT);
    let top_left = to_tile_coords(north, bbox.west, cover_zoom)?;
    let bottom_right = to_tile_coords(south, bbox.east, cover_zoom)?;

    let mut tiles = Vec::new();
    for y in top_left.y..=bottom_right.y {
        for x in top_left.x..=bottom_right.x {
            tiles.push(TileCoord::new(x, y, cover_zoom));
        }
    }

    Ok(serpentine(tiles))
}

/// Sorts tiles by row then column and reverses the second half.
///
/// The first `ceil(n / 2)` tiles run left to right along the top, the rest
/// run right to left along the bottom.
pub fn serpentine(mut tiles: Vec<TileCoord>) -> Vec<TileCoord> {
    tiles.sort_by(|a, b| a.y.cmp(&b.y).then(a.x.cmp(&b.x)));
    let half = tiles.len().div_ceil(2);
    tiles[half..].reverse();
    tiles
}

/// Descends the quad-tree from `tiles` until `zoom` is reached.
///
/// Always descends at least one level, matching how an area request at a
/// coarse zoom is split into finest-granularity tile jobs. Tiles already at
/// or past `zoom` are split once.
pub fn children_until_zoom(tiles: &[TileCoord], zoom: u8) -> Vec<TileCoord> {
    let mut current: Vec<TileCoord> = tiles.iter().flat_map(|t| t.children()).collect();
    while current.first().is_some_and(|t| t.zoom < zoom) {
        current = current.iter().flat_map(|t| t.children()).collect();
    }
    current
}
