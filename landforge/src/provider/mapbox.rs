//! Mapbox raster provider.
//!
//! Serves terrain, satellite and style-rendered landcover tiles.
//!
//! # URL Patterns
//!
//! - Terrain and satellite (512px, lossless):
//!   `https://api.mapbox.com/v4/{tileset}/{z}/{x}/{y}@2x.pngraw?access_token={token}`
//! - Landcover rendered through a user style:
//!   `https://api.mapbox.com/styles/v1/{user}/{style}/tiles/{z}/{x}/{y}?access_token={token}&fresh=true`
//!
//! All three share one account-wide rate limit; a 429 on any of them is
//! reported as [`ProviderError::RateLimited`].

use crate::coord::TileCoord;
use crate::provider::{AsyncHttpClient, AsyncProvider, LayerKind, ProviderError};

/// Base URL for Mapbox raster tilesets.
const MAPBOX_TILES_URL: &str = "https://api.mapbox.com/v4";

/// Base URL for Mapbox style-rendered tiles.
const MAPBOX_STYLES_URL: &str = "https://api.mapbox.com/styles/v1";

const TERRAIN_TILESET: &str = "mapbox.terrain-rgb";
const SATELLITE_TILESET: &str = "mapbox.satellite";

/// Maximum zoom level served by Mapbox raster tilesets.
const MAX_ZOOM: u8 = 22;

/// A Mapbox style used to render landcover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapboxStyle {
    pub username: String,
    pub style_id: String,
}

/// Async Mapbox provider.
///
/// # Example
///
/// ```ignore
/// use landforge::provider::{AsyncReqwestClient, MapboxProvider};
///
/// let client = AsyncReqwestClient::with_timeout(30)?;
/// let provider = MapboxProvider::new(client, "pk.your_token");
/// let terrain = provider.fetch(tile, LayerKind::Terrain).await?;
/// ```
pub struct MapboxProvider<C: AsyncHttpClient> {
    http_client: C,
    access_token: String,
    style: Option<MapboxStyle>,
}

impl<C: AsyncHttpClient> MapboxProvider<C> {
    /// Creates a provider without a landcover style.
    pub fn new(http_client: C, access_token: impl Into<String>) -> Self {
        Self {
            http_client,
            access_token: access_token.into(),
            style: None,
        }
    }

    /// Enables the [`LayerKind::Landcover`] layer through `style`.
    pub fn with_style(mut self, style: MapboxStyle) -> Self {
        self.style = Some(style);
        self
    }

    /// Builds the tile URL, or `None` for an unsupported layer.
    fn build_url(&self, tile: TileCoord, layer: LayerKind) -> Option<String> {
        let TileCoord { x, y, zoom } = tile;
        match layer {
            LayerKind::Terrain | LayerKind::Satellite => {
                let tileset = if layer == LayerKind::Terrain {
                    TERRAIN_TILESET
                } else {
                    SATELLITE_TILESET
                };
                Some(format!(
                    "{}/{}/{}/{}/{}@2x.pngraw?access_token={}",
                    MAPBOX_TILES_URL, tileset, zoom, x, y, self.access_token
                ))
            }
            LayerKind::Landcover => self.style.as_ref().map(|style| {
                format!(
                    "{}/{}/{}/tiles/{}/{}/{}?access_token={}&fresh=true",
                    MAPBOX_STYLES_URL,
                    style.username,
                    style.style_id,
                    zoom,
                    x,
                    y,
                    self.access_token
                )
            }),
            LayerKind::Classification => None,
        }
    }
}

impl<C: AsyncHttpClient> AsyncProvider for MapboxProvider<C> {
    async fn fetch(&self, tile: TileCoord, layer: LayerKind) -> Result<Vec<u8>, ProviderError> {
        if tile.zoom > MAX_ZOOM {
            return Err(ProviderError::UnsupportedZoom(tile.zoom));
        }
        let url = self
            .build_url(tile, layer)
            .ok_or(ProviderError::UnsupportedLayer(layer))?;
        self.http_client.get(&url).await
    }

    fn name(&self) -> &str {
        "Mapbox"
    }

    fn supports(&self, layer: LayerKind) -> bool {
        match layer {
            LayerKind::Terrain | LayerKind::Satellite => true,
            LayerKind::Landcover => self.style.is_some(),
            LayerKind::Classification => false,
        }
    }
}
