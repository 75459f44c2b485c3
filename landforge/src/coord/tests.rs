//! Tests for coordinate conversion and area decomposition

use super::*;

#[test]
fn test_london_at_zoom_10() {
    // London: 51.5074°N, 0.1278°W
    let tile = to_tile_coords(51.5074, -0.1278, 10).unwrap();
    assert_eq!(tile.y, 340);
    assert_eq!(tile.x, 511);
    assert_eq!(tile.zoom, 10);
}

#[test]
fn test_invalid_latitude() {
    let result = to_tile_coords(90.0, 0.0, 10);
    assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
}

#[test]
fn test_antimeridian_clamped_into_grid() {
    let tile = to_tile_coords(0.0, 180.0, 3).unwrap();
    assert_eq!(tile.x, 7);
}

#[test]
fn test_children_order_matches_quadrants() {
    let children = TileCoord::new(3, 5, 10).children();
    assert_eq!(children[0], TileCoord::new(6, 10, 11));
    assert_eq!(children[1], TileCoord::new(7, 10, 11));
    assert_eq!(children[2], TileCoord::new(7, 11, 11));
    assert_eq!(children[3], TileCoord::new(6, 11, 11));

    for (index, child) in children.iter().enumerate() {
        assert_eq!(child.sibling_index(), index);
        assert_eq!(child.parent(), Some(TileCoord::new(3, 5, 10)));
    }
}

#[test]
fn test_root_has_no_parent() {
    assert_eq!(TileCoord::new(0, 0, 0).parent(), None);
}

#[test]
fn test_bbox_of_world_tile() {
    let bbox = TileCoord::new(0, 0, 0).bbox();
    assert!((bbox.west + 180.0).abs() < 1e-9);
    assert!((bbox.east - 180.0).abs() < 1e-9);
    assert!((bbox.north - MAX_LAT).abs() < 1e-6);
    assert!((bbox.south - MIN_LAT).abs() < 1e-6);
}

#[test]
fn test_serpentine_order() {
    // 4 columns x 2 rows, shuffled
    let mut tiles = Vec::new();
    for y in [1, 0] {
        for x in [2, 0, 3, 1] {
            tiles.push(TileCoord::new(x, y, 5));
        }
    }

    let ordered = serpentine(tiles);
    let xy: Vec<(u32, u32)> = ordered.iter().map(|t| (t.x, t.y)).collect();
    assert_eq!(
        xy,
        vec![
            (0, 0),
            (1, 0),
            (2, 0),
            (3, 0),
            (3, 1),
            (2, 1),
            (1, 1),
            (0, 1)
        ]
    );
}

#[test]
fn test_decompose_inset_tile_yields_quadrants() {
    let tile = TileCoord::new(4400, 2686, 13);
    let ring = tile.bbox().inset_ring(0.01);

    let tiles = decompose(&ring, 13).unwrap();

    assert_eq!(tiles.len(), 4);
    assert_eq!(tiles.to_vec(), tile.children().to_vec());
}

#[test]
fn test_decompose_empty_area() {
    assert_eq!(decompose(&[], 10), Err(CoordError::EmptyArea));
}

#[test]
fn test_children_until_zoom() {
    let tiles = children_until_zoom(&[TileCoord::new(1, 1, 10)], 13);
    assert_eq!(tiles.len(), 64);
    assert!(tiles.iter().all(|t| t.zoom == 13));
}

#[test]
fn test_children_until_zoom_splits_at_least_once() {
    let tiles = children_until_zoom(&[TileCoord::new(1, 1, 13)], 13);
    assert_eq!(tiles.len(), 4);
    assert!(tiles.iter().all(|t| t.zoom == 14));
}

#[test]
fn test_tile_id_is_deterministic() {
    let a = TileId::for_tile(&TileCoord::new(1, 2, 3));
    let b = TileId::for_tile(&TileCoord::new(1, 2, 3));
    let c = TileId::for_tile(&TileCoord::new(2, 1, 3));

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.as_str().len(), 16);
}

#[test]
fn test_tile_id_depends_on_order() {
    let t1 = TileCoord::new(1, 1, 4);
    let t2 = TileCoord::new(2, 1, 4);
    assert_ne!(TileId::for_tiles(&[t1, t2]), TileId::for_tiles(&[t2, t1]));
}

#[test]
fn test_tile_coord_serializes_as_triple() {
    let json = serde_json::to_string(&TileCoord::new(7, 8, 9)).unwrap();
    assert_eq!(json, "[7,8,9]");

    let back: TileCoord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, TileCoord::new(7, 8, 9));
}
