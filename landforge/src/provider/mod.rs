//! Raster tile provider abstraction
//!
//! This module provides the fetch adapter used by the pipeline: a trait for
//! async tile providers, a reqwest-backed HTTP client, the Mapbox provider for
//! terrain, satellite and styled landcover, and the session-authenticated
//! classification provider.
//!
//! # Routing
//!
//! [`ProviderSet`] combines a primary and an optional secondary provider and
//! routes each [`LayerKind`] to whichever one serves it:
//!
//! ```ignore
//! use landforge::provider::{AsyncReqwestClient, MapboxProvider, ProviderSet};
//!
//! let client = AsyncReqwestClient::with_timeout(30)?;
//! let mapbox = MapboxProvider::new(client.clone(), token);
//! let providers = ProviderSet::new(mapbox, Some(classification));
//! ```

mod classification;
mod http;
mod mapbox;
mod session;
mod types;

pub use classification::{ClassificationEndpoint, ClassificationProvider};
pub use http::{status_error, AsyncHttpClient, AsyncReqwestClient};
pub use mapbox::{MapboxProvider, MapboxStyle};
pub use session::SessionCache;
pub use types::{AsyncProvider, LayerKind, ProviderError};

#[cfg(test)]
pub use http::tests::{MockAsyncHttpClient, Recorded, RecordingHttpClient};

/// Routes layers to a primary provider, falling back to a secondary one.
pub struct ProviderSet<P, S> {
    primary: P,
    secondary: Option<S>,
}

impl<P: AsyncProvider, S: AsyncProvider> ProviderSet<P, S> {
    pub fn new(primary: P, secondary: Option<S>) -> Self {
        Self { primary, secondary }
    }
}

/// The layer `provider` serves landcover through: classification when
/// available, otherwise styled landcover.
pub fn landcover_layer<P: AsyncProvider>(provider: &P) -> Option<LayerKind> {
    [LayerKind::Classification, LayerKind::Landcover]
        .into_iter()
        .find(|layer| provider.supports(*layer))
}

impl<P: AsyncProvider, S: AsyncProvider> AsyncProvider for ProviderSet<P, S> {
    async fn fetch(
        &self,
        tile: crate::coord::TileCoord,
        layer: LayerKind,
    ) -> Result<Vec<u8>, ProviderError> {
        if self.primary.supports(layer) {
            return self.primary.fetch(tile, layer).await;
        }
        match &self.secondary {
            Some(secondary) if secondary.supports(layer) => secondary.fetch(tile, layer).await,
            _ => Err(ProviderError::UnsupportedLayer(layer)),
        }
    }

    fn name(&self) -> &str {
        self.primary.name()
    }

    fn supports(&self, layer: LayerKind) -> bool {
        self.primary.supports(layer)
            || self
                .secondary
                .as_ref()
                .is_some_and(|secondary| secondary.supports(layer))
    }
}
