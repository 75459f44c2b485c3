//! Coordinate type definitions

use std::fmt;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels supported by the upstream providers
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 22;

/// Tile coordinates in the Web Mercator / Slippy Map system.
///
/// Serialized as the `[x, y, zoom]` triple used in tile sidecars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// X coordinate (east-west), 0 at west
    pub x: u32,
    /// Y coordinate (north-south), 0 at north
    pub y: u32,
    /// Zoom level
    pub zoom: u8,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[inline]
    pub const fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Returns the four children one zoom level deeper.
    ///
    /// Order is top-left, top-right, bottom-right, bottom-left, which is
    /// also the quadrant order used when stitching.
    #[inline]
    pub fn children(&self) -> [TileCoord; 4] {
        let (x, y, z) = (self.x * 2, self.y * 2, self.zoom + 1);
        [
            TileCoord::new(x, y, z),
            TileCoord::new(x + 1, y, z),
            TileCoord::new(x + 1, y + 1, z),
            TileCoord::new(x, y + 1, z),
        ]
    }

    /// Returns the parent tile, or `None` at zoom 0.
    #[inline]
    pub fn parent(&self) -> Option<TileCoord> {
        if self.zoom == 0 {
            return None;
        }
        Some(TileCoord::new(self.x / 2, self.y / 2, self.zoom - 1))
    }

    /// Position of this tile among its siblings, in [`children`](Self::children) order.
    pub fn sibling_index(&self) -> usize {
        match (self.x % 2, self.y % 2) {
            (0, 0) => 0,
            (1, 0) => 1,
            (1, 1) => 2,
            _ => 3,
        }
    }

    /// Geographic bounding box of this tile.
    pub fn bbox(&self) -> BoundingBox {
        let (north, west) = super::tile_to_lat_lon(self);
        let (south, east) =
            super::tile_to_lat_lon(&TileCoord::new(self.x + 1, self.y + 1, self.zoom));
        BoundingBox {
            west,
            south,
            east,
            north,
        }
    }

    /// Coordinate triple as stored in `tile.json`.
    #[inline]
    pub fn as_triple(&self) -> [u32; 3] {
        [self.x, self.y, self.zoom as u32]
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

impl serde::Serialize for TileCoord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_triple().serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for TileCoord {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [x, y, zoom] = <[u32; 3]>::deserialize(deserializer)?;
        let zoom = u8::try_from(zoom).map_err(serde::de::Error::custom)?;
        Ok(TileCoord::new(x, y, zoom))
    }
}

/// A lon/lat rectangle in degrees (EPSG:4326).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Smallest box containing every `(lon, lat)` point.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_points(points: &[(f64, f64)]) -> Option<Self> {
        let (&(lon0, lat0), rest) = points.split_first()?;
        let mut bbox = BoundingBox {
            west: lon0,
            south: lat0,
            east: lon0,
            north: lat0,
        };
        for &(lon, lat) in rest {
            bbox.west = bbox.west.min(lon);
            bbox.east = bbox.east.max(lon);
            bbox.south = bbox.south.min(lat);
            bbox.north = bbox.north.max(lat);
        }
        Some(bbox)
    }

    /// Centre point as `(lon, lat)`.
    pub fn center(&self) -> (f64, f64) {
        ((self.west + self.east) / 2.0, (self.south + self.north) / 2.0)
    }

    /// Returns true if `(lon, lat)` lies strictly inside the box.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon > self.west && lon < self.east && lat > self.south && lat < self.north
    }

    /// Closed ring of the box shrunk by `inset` degrees on every side.
    ///
    /// Corners run top-left, top-right, bottom-right, bottom-left, top-left.
    pub fn inset_ring(&self, inset: f64) -> Vec<(f64, f64)> {
        let top_left = (self.west + inset, self.north - inset);
        let top_right = (self.east - inset, self.north - inset);
        let bottom_right = (self.east - inset, self.south + inset);
        let bottom_left = (self.west + inset, self.south + inset);
        vec![top_left, top_right, bottom_right, bottom_left, top_left]
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside valid range (-85.05112878 to 85.05112878)
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
    /// Zoom level is outside valid range
    InvalidZoom(u8),
    /// No coordinates were supplied
    EmptyArea,
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
            CoordError::EmptyArea => write!(f, "Area contains no coordinates"),
        }
    }
}

impl std::error::Error for CoordError {}
