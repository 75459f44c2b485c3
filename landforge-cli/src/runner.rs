//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and provider wiring
//! so command handlers only deal with their own arguments.

use std::path::{Path, PathBuf};

use tracing::info;

use landforge::config::{config_file_path, ConfigFile};
use landforge::geotiff::GdalTranslate;
use landforge::logging::{default_log_file, init_logging_with_filter, LoggingGuard};
use landforge::pipeline::Orchestrator;
use landforge::provider::{
    AsyncReqwestClient, ClassificationProvider, MapboxProvider, ProviderSet,
};
use landforge::store::TileStore;

use crate::error::CliError;

/// Providers used by the CLI: Mapbox first, classification for landcover.
pub type CliProvider =
    ProviderSet<MapboxProvider<AsyncReqwestClient>, ClassificationProvider<AsyncReqwestClient>>;

/// Orchestrator type used by the CLI.
pub type CliOrchestrator = Orchestrator<CliProvider, GdalTranslate>;

/// Loads the config file from `path` or the default location.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    match path {
        Some(path) => Ok(ConfigFile::load_from(path)?),
        None => Ok(ConfigFile::load()?),
    }
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
    config_path: PathBuf,
}

impl CliRunner {
    /// Loads the config and initializes logging.
    ///
    /// `verbose` lowers the default log level to debug.
    pub fn new(config_path: Option<PathBuf>, verbose: bool) -> Result<Self, CliError> {
        let config = load_config(config_path.as_deref())?;
        let config_path = config_path.unwrap_or_else(config_file_path);

        let log_path = &config.logging.file;
        let log_dir = log_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| default_log_file().to_string());

        let filter = if verbose { "debug" } else { "info" };
        let logging_guard = init_logging_with_filter(&log_dir, &log_file, filter)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information.
    pub fn log_startup(&self, command: &str) {
        info!(
            version = landforge::VERSION,
            command,
            config = %self.config_path.display(),
            tiles = %self.config.tiles.directory.display(),
            "Landforge starting"
        );
    }

    pub fn store(&self) -> TileStore {
        TileStore::new(&self.config.tiles.directory)
    }

    /// Builds the providers and the orchestrator.
    ///
    /// Fails before any job is queued when the Mapbox token is missing.
    pub fn orchestrator(&self) -> Result<CliOrchestrator, CliError> {
        let config = &self.config;
        let token = config.require_mapbox_token()?;
        let client = AsyncReqwestClient::with_timeout(config.provider.timeout)?;

        let mut mapbox = MapboxProvider::new(client.clone(), token);
        if let Some(style) = config.mapbox_style() {
            mapbox = mapbox.with_style(style);
        }
        let classification = config
            .classification_endpoint()?
            .map(|endpoint| ClassificationProvider::new(client, endpoint, config.session_ttl()));

        let georeference = config
            .export
            .enabled
            .then(|| GdalTranslate::new(config.export.tool.clone()));

        Ok(Orchestrator::new(
            ProviderSet::new(mapbox, classification),
            georeference,
            self.store(),
            config.pipeline_config(),
        ))
    }
}
