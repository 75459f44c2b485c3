//! Argument parsing and output helpers shared across commands.

use landforge::coord::BoundingBox;
use landforge::pipeline::{JobHandle, TileOptions, TileSubmission};

use crate::error::CliError;

/// Parses `"lon,lat lon,lat ..."` into points.
pub fn parse_coords(input: &str) -> Result<Vec<(f64, f64)>, CliError> {
    let points = input
        .split_whitespace()
        .map(parse_point)
        .collect::<Result<Vec<_>, _>>()?;
    if points.is_empty() {
        return Err(CliError::InvalidArgument(
            "at least one lon,lat point is required".to_string(),
        ));
    }
    Ok(points)
}

fn parse_point(pair: &str) -> Result<(f64, f64), CliError> {
    let invalid = || CliError::InvalidArgument(format!("'{}' is not a lon,lat pair", pair));
    let (lon, lat) = pair.split_once(',').ok_or_else(invalid)?;
    let lon: f64 = lon.trim().parse().map_err(|_| invalid())?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(CliError::InvalidArgument(format!(
            "'{}' is outside the valid lon/lat range",
            pair
        )));
    }
    Ok((lon, lat))
}

/// Parses `"minlon,minlat,maxlon,maxlat"`.
pub fn parse_bounds(input: &str) -> Result<BoundingBox, CliError> {
    let values = input
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| CliError::InvalidArgument(format!("'{}' is not a list of numbers", input)))?;
    match values.as_slice() {
        &[west, south, east, north] if west < east && south < north => Ok(BoundingBox {
            west,
            south,
            east,
            north,
        }),
        _ => Err(CliError::InvalidArgument(format!(
            "'{}' must be minlon,minlat,maxlon,maxlat with min < max",
            input
        ))),
    }
}

/// Tile options from the `--no-*` flags.
pub fn tile_options(no_landcover: bool, no_heightmap: bool, seed: Option<u32>) -> TileOptions {
    TileOptions {
        landcover: !no_landcover,
        heightmap: !no_heightmap,
        seed,
    }
}

/// Waits for each tile job and prints one line per finished tile.
///
/// Returns the number of failed tiles.
pub async fn report_tiles(tiles: &[TileSubmission]) -> usize {
    let mut failed = 0;
    for tile in tiles {
        match tile.handle.wait().await {
            Ok(()) => println!("  done    {}  {}", tile.root, tile.id),
            Err(_) => {
                failed += 1;
                println!("  FAILED  {}  {}  {}", tile.root, tile.id, failure(&tile.handle));
            }
        }
    }
    failed
}

fn failure(handle: &JobHandle) -> String {
    handle.state().error.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coords() {
        let points = parse_coords("7.6,45.9  7.7,45.9 7.7,46.0").unwrap();
        assert_eq!(points, vec![(7.6, 45.9), (7.7, 45.9), (7.7, 46.0)]);
    }

    #[test]
    fn test_parse_coords_rejects_garbage() {
        assert!(parse_coords("").is_err());
        assert!(parse_coords("7.6;45.9").is_err());
        assert!(parse_coords("7.6,abc").is_err());
        assert!(parse_coords("200,45").is_err());
    }

    #[test]
    fn test_parse_bounds() {
        let bbox = parse_bounds("7.5,45.8,7.8,46.1").unwrap();
        assert_eq!(bbox.west, 7.5);
        assert_eq!(bbox.north, 46.1);

        assert!(parse_bounds("7.8,45.8,7.5,46.1").is_err());
        assert!(parse_bounds("1,2,3").is_err());
    }

    #[test]
    fn test_tile_options() {
        let options = tile_options(true, false, Some(7));
        assert!(!options.landcover);
        assert!(options.heightmap);
        assert_eq!(options.seed, Some(7));
    }
}
