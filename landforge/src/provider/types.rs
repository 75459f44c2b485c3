//! Provider types and traits

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::coord::TileCoord;

/// Errors that can occur during provider operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Transport-level failure or unexpected status
    HttpError(String),
    /// Provider answered 429; `retry_after` is taken from the response when present
    RateLimited { retry_after: Option<Duration> },
    /// Provider answered with a 5xx status
    Upstream { status: u16 },
    /// Credentials rejected or session could not be established
    Authentication(String),
    /// Invalid response data from provider
    InvalidResponse(String),
    /// Zoom level not supported by this provider
    UnsupportedZoom(u8),
    /// This provider cannot serve the requested layer
    UnsupportedLayer(LayerKind),
}

impl ProviderError {
    /// True for failures that clear up on their own: rate limits and 5xx.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. } | ProviderError::Upstream { .. }
        )
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            ProviderError::RateLimited { retry_after } => match retry_after {
                Some(d) => write!(f, "Rate limited (retry after {}s)", d.as_secs()),
                None => write!(f, "Rate limited"),
            },
            ProviderError::Upstream { status } => write!(f, "Upstream error: HTTP {}", status),
            ProviderError::Authentication(msg) => write!(f, "Authentication failed: {}", msg),
            ProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            ProviderError::UnsupportedZoom(zoom) => {
                write!(f, "Zoom level {} not supported by provider", zoom)
            }
            ProviderError::UnsupportedLayer(layer) => {
                write!(f, "Layer {} not supported by provider", layer)
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// The raster layers a tile job can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Terrain-RGB encoded elevation
    Terrain,
    /// Satellite imagery
    Satellite,
    /// Landcover rendered through a map style
    Landcover,
    /// Landcover from the authenticated classification service
    Classification,
}

impl LayerKind {
    pub fn name(self) -> &'static str {
        match self {
            LayerKind::Terrain => "terrain",
            LayerKind::Satellite => "satellite",
            LayerKind::Landcover => "landcover",
            LayerKind::Classification => "classification",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Async trait for raster tile providers.
///
/// Implementors fetch encoded image bytes for one tile of one layer.
/// Rate-limit responses must surface as [`ProviderError::RateLimited`]
/// so the pipeline can pause the affected queue.
pub trait AsyncProvider: Send + Sync {
    /// Fetches one tile of `layer`.
    ///
    /// # Returns
    ///
    /// Raw image data (typically PNG) or an error.
    fn fetch(
        &self,
        tile: TileCoord,
        layer: LayerKind,
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;

    /// Returns the provider's name for logging and identification.
    fn name(&self) -> &str;

    /// Whether this provider can serve `layer`.
    fn supports(&self, layer: LayerKind) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::RateLimited { retry_after: None }.is_transient());
        assert!(ProviderError::Upstream { status: 503 }.is_transient());
        assert!(!ProviderError::HttpError("x".into()).is_transient());
        assert!(!ProviderError::Authentication("x".into()).is_transient());
    }

    #[test]
    fn test_display() {
        let err = ProviderError::RateLimited {
            retry_after: Some(Duration::from_secs(30)),
        };
        assert_eq!(err.to_string(), "Rate limited (retry after 30s)");
        assert_eq!(
            ProviderError::UnsupportedLayer(LayerKind::Classification).to_string(),
            "Layer classification not supported by provider"
        );
    }
}
