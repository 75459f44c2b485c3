//! GeoTIFF export through an external georeferencing tool.
//!
//! PNG rasters are converted to GeoTIFF with the tile's bounding box as the
//! upper-left / lower-right corners in EPSG:4326. The conversion is delegated
//! to `gdal_translate` by default; anything implementing
//! [`GeoreferenceTool`] can stand in for it.

use std::future::Future;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::coord::BoundingBox;

/// Geographic CRS assigned to every export.
pub const EXPORT_SRS: &str = "EPSG:4326";

/// Errors from GeoTIFF export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The tool binary could not be started
    #[error("Georeferencing tool '{tool}' not found: {source}")]
    ToolNotFound {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and reported failure
    #[error("'{tool}' exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    /// Source raster is missing
    #[error("Source raster {0} does not exist")]
    MissingSource(PathBuf),
}

/// Converts a raster into a georeferenced GeoTIFF.
pub trait GeoreferenceTool: Send + Sync {
    fn georeference(
        &self,
        source: &Path,
        target: &Path,
        bbox: &BoundingBox,
    ) -> impl Future<Output = Result<(), ExportError>> + Send;
}

/// `gdal_translate` invocation.
#[derive(Debug, Clone)]
pub struct GdalTranslate {
    program: String,
}

impl Default for GdalTranslate {
    fn default() -> Self {
        Self::new("gdal_translate")
    }
}

impl GdalTranslate {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Command-line arguments for one conversion.
    ///
    /// PAM sidecars are disabled so the output depends only on the source
    /// raster and the box.
    pub fn args(source: &Path, target: &Path, bbox: &BoundingBox) -> Vec<String> {
        vec![
            "--config".into(),
            "GDAL_PAM_ENABLED".into(),
            "NO".into(),
            "-q".into(),
            "-of".into(),
            "GTiff".into(),
            "-a_srs".into(),
            EXPORT_SRS.into(),
            "-a_ullr".into(),
            bbox.west.to_string(),
            bbox.north.to_string(),
            bbox.east.to_string(),
            bbox.south.to_string(),
            source.display().to_string(),
            target.display().to_string(),
        ]
    }
}

impl GeoreferenceTool for GdalTranslate {
    async fn georeference(
        &self,
        source: &Path,
        target: &Path,
        bbox: &BoundingBox,
    ) -> Result<(), ExportError> {
        if !source.is_file() {
            return Err(ExportError::MissingSource(source.to_path_buf()));
        }

        let args = Self::args(source, target, bbox);
        debug!(tool = %self.program, source = %source.display(), target = %target.display(), "Exporting GeoTIFF");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|source| ExportError::ToolNotFound {
                tool: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(tool = %self.program, status = %output.status, stderr = %stderr, "GeoTIFF export failed");
            return Err(ExportError::Failed {
                tool: self.program.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }
        Ok(())
    }
}

/// Target path for a PNG's GeoTIFF counterpart.
pub fn tif_path(png: &Path) -> PathBuf {
    png.with_extension("tif")
}
