//! Configuration file handling for ~/.landforge/config.ini.
//!
//! Loads and saves user configuration with sensible defaults, and turns the
//! loaded settings into the runtime configuration of the other modules.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::{Ini, ParseOption};
use thiserror::Error;

use super::settings::ConfigFile;
use crate::heightmap::HeightmapParams;
use crate::pipeline::{PipelineConfig, WorkerCounts};
use crate::provider::{ClassificationEndpoint, MapboxStyle};

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),

    /// A credential needed to run is not set
    #[error("Missing credential: {key} is not set in the config file")]
    MissingCredential { key: String },
}

impl ConfigFile {
    /// Load configuration from the default path (~/.landforge/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults. Quotes and backslashes
    /// are kept literally so JSON credentials and Windows paths survive.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let opt = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_file_opt(path, opt)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.landforge/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        let path = config_file_path();
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            let config = Self::default();
            config.save_to(&path)?;
        }
        Ok(path)
    }

    /// The Mapbox token, which every run needs for terrain and satellite.
    pub fn require_mapbox_token(&self) -> Result<&str, ConfigFileError> {
        self.provider
            .mapbox_access_token
            .as_deref()
            .ok_or_else(|| ConfigFileError::MissingCredential {
                key: "provider.mapbox_access_token".to_string(),
            })
    }

    /// Landcover map style, when both owner and style ID are set.
    pub fn mapbox_style(&self) -> Option<MapboxStyle> {
        match (&self.provider.mapbox_username, &self.provider.mapbox_style_id) {
            (Some(username), Some(style_id)) => Some(MapboxStyle {
                username: username.clone(),
                style_id: style_id.clone(),
            }),
            _ => None,
        }
    }

    /// Classification service endpoint.
    ///
    /// `Ok(None)` when no classification URL is configured; an error when
    /// the URL is set but its authentication settings are not.
    pub fn classification_endpoint(
        &self,
    ) -> Result<Option<ClassificationEndpoint>, ConfigFileError> {
        let Some(tile_url) = &self.provider.classification_url else {
            return Ok(None);
        };
        let auth_url = self.provider.classification_auth_url.clone().ok_or_else(|| {
            ConfigFileError::MissingCredential {
                key: "provider.classification_auth_url".to_string(),
            }
        })?;
        let credentials = self
            .provider
            .classification_credentials
            .clone()
            .ok_or_else(|| ConfigFileError::MissingCredential {
                key: "provider.classification_credentials".to_string(),
            })?;
        Ok(Some(ClassificationEndpoint {
            tile_url: tile_url.clone(),
            auth_url,
            credentials,
        }))
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session.ttl_secs)
    }

    /// Orchestrator settings from the `[tiles]`, `[queues]`, `[rate_limit]`,
    /// `[heightmap]` and `[export]` sections.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            target_zoom: self.tiles.target_zoom,
            resolution: self.tiles.resolution,
            leaf_depth: self.tiles.leaf_depth,
            workers: WorkerCounts {
                fetch: self.queues.fetch_workers,
                landcover: self.queues.landcover_workers,
                heightmap: self.queues.heightmap_workers,
                tile: self.queues.tile_workers,
                export: self.queues.export_workers,
            },
            max_retries: self.queues.max_retries,
            cooldown: Duration::from_secs_f64(self.rate_limit.cooldown_secs),
            heightmap: HeightmapParams {
                blur_radius: self.heightmap.blur_radius,
                detail_noise_scale: self.heightmap.detail_noise_scale,
                detail_noise_weight: self.heightmap.detail_noise_weight,
                final_noise_scale: self.heightmap.final_noise_scale,
                final_noise_weight: self.heightmap.final_noise_weight,
                seed: None,
            },
            export_enabled: self.export.enabled,
        }
    }
}

/// Get the path to the config directory (~/.landforge).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".landforge")
}

/// Get the path to the config file (~/.landforge/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert!(config.provider.mapbox_access_token.is_none());
        assert_eq!(config.provider.timeout, DEFAULT_PROVIDER_TIMEOUT_SECS);
        assert_eq!(config.tiles.target_zoom, 13);
        assert_eq!(config.tiles.resolution, 1024);
        assert_eq!(config.queues.fetch_workers, 1);
        assert_eq!(config.queues.heightmap_workers, 4);
        assert_eq!(config.rate_limit.cooldown_secs, 300.0);
        assert_eq!(config.session.ttl_secs, DEFAULT_SESSION_TTL_SECS);
        assert!(config.export.enabled);
        assert_eq!(config.export.tool, DEFAULT_EXPORT_TOOL);
        assert!(config.tiles.directory.ends_with(".landforge/tiles"));
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_require_mapbox_token() {
        let mut config = ConfigFile::default();
        let err = config.require_mapbox_token().unwrap_err();
        assert!(matches!(err, ConfigFileError::MissingCredential { .. }));
        assert!(err.to_string().contains("mapbox_access_token"));

        config.provider.mapbox_access_token = Some("pk.abc".to_string());
        assert_eq!(config.require_mapbox_token().unwrap(), "pk.abc");
    }

    #[test]
    fn test_classification_endpoint() {
        let mut config = ConfigFile::default();
        assert!(config.classification_endpoint().unwrap().is_none());

        config.provider.classification_url = Some("https://lc/{z}/{x}/{y}".to_string());
        assert!(matches!(
            config.classification_endpoint(),
            Err(ConfigFileError::MissingCredential { .. })
        ));

        config.provider.classification_auth_url = Some("https://lc/token".to_string());
        config.provider.classification_credentials = Some("{}".to_string());
        let endpoint = config.classification_endpoint().unwrap().unwrap();
        assert_eq!(endpoint.auth_url, "https://lc/token");
    }

    #[test]
    fn test_mapbox_style_needs_both_parts() {
        let mut config = ConfigFile::default();
        config.provider.mapbox_username = Some("someone".to_string());
        assert!(config.mapbox_style().is_none());
        config.provider.mapbox_style_id = Some("landcover".to_string());
        assert_eq!(config.mapbox_style().unwrap().style_id, "landcover");
    }

    #[test]
    fn test_pipeline_config() {
        let mut config = ConfigFile::default();
        config.rate_limit.cooldown_secs = 0.5;
        config.queues.export_workers = 7;

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.cooldown, Duration::from_millis(500));
        assert_eq!(pipeline.workers.export, 7);
        assert_eq!(pipeline.heightmap, HeightmapParams::default());
        assert!(pipeline.heightmap.seed.is_none());
    }
}
