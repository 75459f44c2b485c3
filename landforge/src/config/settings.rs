//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub provider: ProviderSettings,
    pub tiles: TilesSettings,
    pub queues: QueueSettings,
    pub rate_limit: RateLimitSettings,
    pub session: SessionSettings,
    pub heightmap: HeightmapSettings,
    pub export: ExportSettings,
    pub logging: LoggingSettings,
}

/// Provider credentials and endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    /// Mapbox access token, required for every run
    pub mapbox_access_token: Option<String>,
    /// Owner of the landcover map style
    pub mapbox_username: Option<String>,
    pub mapbox_style_id: Option<String>,
    /// Classification tile URL template with `{x}`, `{y}` and `{z}`
    pub classification_url: Option<String>,
    pub classification_auth_url: Option<String>,
    /// JSON body posted to the auth URL
    pub classification_credentials: Option<String>,
    /// HTTP timeout in seconds
    pub timeout: u64,
}

/// Tile output settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TilesSettings {
    /// Root of the tile directories
    pub directory: PathBuf,
    /// Finest zoom at which tile jobs are generated
    pub target_zoom: u8,
    /// Heightmap and mask side length in pixels
    pub resolution: usize,
    /// Extra quad-tree levels fetched below each cover tile
    pub leaf_depth: u8,
}

/// Worker counts per stage queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSettings {
    pub fetch_workers: usize,
    pub landcover_workers: usize,
    pub heightmap_workers: usize,
    pub tile_workers: usize,
    pub export_workers: usize,
    /// Attempts after the first for rate-limited jobs
    pub max_retries: u32,
}

/// Provider queue pause after a rate-limit response.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitSettings {
    /// Cool-down in seconds; fractional values are accepted
    pub cooldown_secs: f64,
}

/// Classification service session settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Upper bound on a cached token's lifetime, in seconds
    pub ttl_secs: u64,
}

/// Heightmap composition tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightmapSettings {
    pub blur_radius: usize,
    pub detail_noise_scale: f64,
    pub detail_noise_weight: f32,
    pub final_noise_scale: f64,
    pub final_noise_weight: f32,
}

/// GeoTIFF export settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub enabled: bool,
    /// Georeferencing program, looked up on `PATH` unless absolute
    pub tool: String,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
