//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let provider = &config.provider;
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();

    format!(
        r#"[provider]
; Mapbox access token (required)
; Get one at: https://www.mapbox.com/
mapbox_access_token = {}
; Map style rendering landcover (optional, owner and style ID)
mapbox_username = {}
mapbox_style_id = {}
; Authenticated classification service (optional, takes precedence over the style)
; Tile URL template with {{x}}, {{y}} and {{z}} placeholders
classification_url = {}
; Token endpoint and the JSON credentials posted to it
classification_auth_url = {}
classification_credentials = {}
; Timeout in seconds for HTTP requests (default: 30)
timeout = {}

[tiles]
; Root directory for generated tiles
directory = {}
; Zoom level areas are split down to (default: 13)
target_zoom = {}
; Heightmap and mask resolution in pixels (default: 1024)
resolution = {}
; Extra quad-tree levels fetched below each cover tile (default: 0)
; Every level quadruples the number of provider requests
leaf_depth = {}

[queues]
; Workers per stage queue. Keep fetch_workers low to stay under provider rate limits.
fetch_workers = {}
landcover_workers = {}
heightmap_workers = {}
tile_workers = {}
export_workers = {}
; Retries for rate-limited jobs before they fail (default: 3)
max_retries = {}

[rate_limit]
; Seconds the provider queue pauses after a rate-limit response (default: 300)
cooldown_secs = {}

[session]
; Upper bound in seconds on a cached classification token (default: 600)
ttl_secs = {}

[heightmap]
; Gaussian blur radius applied to raw elevation (default: 16)
blur_radius = {}
; Coarse detail noise (defaults: 1.5 / 0.1)
detail_noise_scale = {}
detail_noise_weight = {}
; Fine final noise (defaults: 8.0 / 0.02)
final_noise_scale = {}
final_noise_weight = {}

[export]
; Write GeoTIFF copies of the landcover textures (default: true)
enabled = {}
; Georeferencing program (default: gdal_translate)
tool = {}

[logging]
; Log file location
file = {}
"#,
        opt(&provider.mapbox_access_token),
        opt(&provider.mapbox_username),
        opt(&provider.mapbox_style_id),
        opt(&provider.classification_url),
        opt(&provider.classification_auth_url),
        opt(&provider.classification_credentials),
        provider.timeout,
        path_to_string(&config.tiles.directory),
        config.tiles.target_zoom,
        config.tiles.resolution,
        config.tiles.leaf_depth,
        config.queues.fetch_workers,
        config.queues.landcover_workers,
        config.queues.heightmap_workers,
        config.queues.tile_workers,
        config.queues.export_workers,
        config.queues.max_retries,
        config.rate_limit.cooldown_secs,
        config.session.ttl_secs,
        config.heightmap.blur_radius,
        config.heightmap.detail_noise_scale,
        config.heightmap.detail_noise_weight,
        config.heightmap.final_noise_scale,
        config.heightmap.final_noise_weight,
        config.export.enabled,
        config.export.tool,
        path_to_string(&config.logging.file),
    )
}

/// Convert a path to string, using ~ for home directory.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
