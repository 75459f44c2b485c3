//! Error types for the tile pipeline.
//!
//! Variants follow how the orchestrator reacts to them: transient provider
//! failures are retried after the cool-down, everything else fails the
//! owning job and propagates to its parent.

use thiserror::Error;

use super::Stage;
use crate::coord::{CoordError, TileId};
use crate::geotiff::ExportError;
use crate::provider::ProviderError;
use crate::raster::RasterError;
use crate::stitch::TreeError;
use crate::store::StoreError;

/// Errors raised while running pipeline jobs.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Rate limit or upstream 5xx; retried after the stage cool-down
    #[error("transient provider failure: {0}")]
    TransientProvider(ProviderError),

    /// Provider failure that retrying will not fix
    #[error("provider failure: {0}")]
    Provider(ProviderError),

    /// Unreadable image, dimension mismatch or invalid area
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The job failed after writing artifacts; its directory was removed
    #[error("tile {tile} failed and was cleaned up: {source}")]
    PartialState {
        tile: TileId,
        #[source]
        source: Box<PipelineError>,
    },

    /// Missing credentials or an unavailable layer
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A job this one waited on failed
    #[error("{stage} job failed: {reason}")]
    DependencyFailed { stage: Stage, reason: String },

    /// Tile storage failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// GeoTIFF export failed
    #[error(transparent)]
    Export(#[from] ExportError),

    /// A blocking task panicked or a channel closed unexpectedly
    #[error("internal error: {0}")]
    Internal(String),

    /// The orchestrator is shutting down
    #[error("pipeline shutting down")]
    ShuttingDown,
}

impl PipelineError {
    /// True only for failures that clear up after the cool-down.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::TransientProvider(_))
    }
}

impl From<ProviderError> for PipelineError {
    fn from(err: ProviderError) -> Self {
        if err.is_transient() {
            PipelineError::TransientProvider(err)
        } else {
            PipelineError::Provider(err)
        }
    }
}

impl From<RasterError> for PipelineError {
    fn from(err: RasterError) -> Self {
        PipelineError::MalformedInput(err.to_string())
    }
}

impl From<CoordError> for PipelineError {
    fn from(err: CoordError) -> Self {
        PipelineError::MalformedInput(err.to_string())
    }
}

impl From<TreeError> for PipelineError {
    fn from(err: TreeError) -> Self {
        PipelineError::MalformedInput(err.to_string())
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        PipelineError::Internal(format!("task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_errors_split_by_transience() {
        let limited: PipelineError = ProviderError::RateLimited { retry_after: None }.into();
        assert!(limited.is_retryable());

        let upstream: PipelineError = ProviderError::Upstream { status: 502 }.into();
        assert!(upstream.is_retryable());

        let auth: PipelineError = ProviderError::Authentication("401".into()).into();
        assert!(!auth.is_retryable());
        assert!(matches!(auth, PipelineError::Provider(_)));
    }

    #[test]
    fn test_raster_errors_are_malformed_input() {
        let err: PipelineError = RasterError::NotSquare(12).into();
        assert!(matches!(err, PipelineError::MalformedInput(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_partial_state_display_includes_cause() {
        let err = PipelineError::PartialState {
            tile: TileId::from_raw("abc"),
            source: Box::new(PipelineError::MalformedInput("bad png".into())),
        };
        let text = err.to_string();
        assert!(text.contains("abc"));
        assert!(text.contains("bad png"));
    }
}
