//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use super::settings::*;
use crate::heightmap::HeightmapParams;
use crate::pipeline::{WorkerCounts, DEFAULT_COOLDOWN, DEFAULT_RESOLUTION, DEFAULT_TARGET_ZOOM};

// =============================================================================
// Provider
// =============================================================================

/// Default HTTP timeout in seconds.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Tiles
// =============================================================================

/// Tile directory name under the config directory.
pub const DEFAULT_TILES_DIR: &str = "tiles";

/// Highest accepted target zoom.
pub const MAX_TARGET_ZOOM: u8 = 22;

/// Deepest accepted leaf expansion; each level quadruples the downloads.
pub const MAX_LEAF_DEPTH: u8 = 3;

// =============================================================================
// Queues
// =============================================================================

pub const DEFAULT_MAX_RETRIES: u32 = 3;

// =============================================================================
// Session
// =============================================================================

/// Default classification token lifetime cap: 10 minutes.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 600;

// =============================================================================
// Export
// =============================================================================

pub const DEFAULT_EXPORT_TOOL: &str = "gdal_translate";

// =============================================================================
// Logging
// =============================================================================

pub const DEFAULT_LOG_FILE: &str = "landforge.log";

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = super::file::config_directory();
        let workers = WorkerCounts::default();
        let heightmap = HeightmapParams::default();

        Self {
            provider: ProviderSettings {
                mapbox_access_token: None,
                mapbox_username: None,
                mapbox_style_id: None,
                classification_url: None,
                classification_auth_url: None,
                classification_credentials: None,
                timeout: DEFAULT_PROVIDER_TIMEOUT_SECS,
            },
            tiles: TilesSettings {
                directory: config_dir.join(DEFAULT_TILES_DIR),
                target_zoom: DEFAULT_TARGET_ZOOM,
                resolution: DEFAULT_RESOLUTION,
                leaf_depth: 0,
            },
            queues: QueueSettings {
                fetch_workers: workers.fetch,
                landcover_workers: workers.landcover,
                heightmap_workers: workers.heightmap,
                tile_workers: workers.tile,
                export_workers: workers.export,
                max_retries: DEFAULT_MAX_RETRIES,
            },
            rate_limit: RateLimitSettings {
                cooldown_secs: DEFAULT_COOLDOWN.as_secs_f64(),
            },
            session: SessionSettings {
                ttl_secs: DEFAULT_SESSION_TTL_SECS,
            },
            heightmap: HeightmapSettings {
                blur_radius: heightmap.blur_radius,
                detail_noise_scale: heightmap.detail_noise_scale,
                detail_noise_weight: heightmap.detail_noise_weight,
                final_noise_scale: heightmap.final_noise_scale,
                final_noise_weight: heightmap.final_noise_weight,
            },
            export: ExportSettings {
                enabled: true,
                tool: DEFAULT_EXPORT_TOOL.to_string(),
            },
            logging: LoggingSettings {
                file: config_dir.join(DEFAULT_LOG_FILE),
            },
        }
    }
}
