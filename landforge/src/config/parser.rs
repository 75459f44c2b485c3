//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::defaults::{MAX_LEAF_DEPTH, MAX_TARGET_ZOOM};
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [provider] section
    if let Some(section) = ini.section(Some("provider")) {
        let provider = &mut config.provider;
        for (key, slot) in [
            ("mapbox_access_token", &mut provider.mapbox_access_token),
            ("mapbox_username", &mut provider.mapbox_username),
            ("mapbox_style_id", &mut provider.mapbox_style_id),
            ("classification_url", &mut provider.classification_url),
            ("classification_auth_url", &mut provider.classification_auth_url),
            (
                "classification_credentials",
                &mut provider.classification_credentials,
            ),
        ] {
            if let Some(v) = non_empty(section, key) {
                *slot = Some(v.to_string());
            }
        }
        if let Some(v) = parse(section, "provider", "timeout", "must be a positive integer (seconds)")? {
            provider.timeout = v;
        }
        if let Some(url) = &provider.classification_url {
            if !["{x}", "{y}", "{z}"].iter().all(|p| url.contains(p)) {
                return Err(ConfigFileError::InvalidValue {
                    section: "provider".to_string(),
                    key: "classification_url".to_string(),
                    value: url.clone(),
                    reason: "must contain {x}, {y} and {z} placeholders".to_string(),
                });
            }
        }
    }

    // [tiles] section
    if let Some(section) = ini.section(Some("tiles")) {
        if let Some(v) = non_empty(section, "directory") {
            config.tiles.directory = expand_tilde(v);
        }
        if let Some(v) = parse::<u8>(section, "tiles", "target_zoom", "must be an integer zoom level")? {
            if v > MAX_TARGET_ZOOM {
                return Err(ConfigFileError::InvalidValue {
                    section: "tiles".to_string(),
                    key: "target_zoom".to_string(),
                    value: v.to_string(),
                    reason: format!("must be at most {}", MAX_TARGET_ZOOM),
                });
            }
            config.tiles.target_zoom = v;
        }
        if let Some(v) = parse::<usize>(section, "tiles", "resolution", "must be a positive integer (pixels)")? {
            if v == 0 {
                return Err(ConfigFileError::InvalidValue {
                    section: "tiles".to_string(),
                    key: "resolution".to_string(),
                    value: v.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
            config.tiles.resolution = v;
        }
        if let Some(v) = parse::<u8>(section, "tiles", "leaf_depth", "must be a small integer")? {
            if v > MAX_LEAF_DEPTH {
                return Err(ConfigFileError::InvalidValue {
                    section: "tiles".to_string(),
                    key: "leaf_depth".to_string(),
                    value: v.to_string(),
                    reason: format!("must be at most {}", MAX_LEAF_DEPTH),
                });
            }
            config.tiles.leaf_depth = v;
        }
    }

    // [queues] section
    if let Some(section) = ini.section(Some("queues")) {
        let queues = &mut config.queues;
        for (key, slot) in [
            ("fetch_workers", &mut queues.fetch_workers),
            ("landcover_workers", &mut queues.landcover_workers),
            ("heightmap_workers", &mut queues.heightmap_workers),
            ("tile_workers", &mut queues.tile_workers),
            ("export_workers", &mut queues.export_workers),
        ] {
            if let Some(v) = parse::<usize>(section, "queues", key, "must be a positive integer")? {
                if v == 0 {
                    return Err(ConfigFileError::InvalidValue {
                        section: "queues".to_string(),
                        key: key.to_string(),
                        value: v.to_string(),
                        reason: "must be at least 1".to_string(),
                    });
                }
                *slot = v;
            }
        }
        if let Some(v) = parse(section, "queues", "max_retries", "must be a non-negative integer")? {
            queues.max_retries = v;
        }
    }

    // [rate_limit] section
    if let Some(section) = ini.section(Some("rate_limit")) {
        if let Some(v) = parse::<f64>(section, "rate_limit", "cooldown_secs", "must be a number of seconds")? {
            if !v.is_finite() || v < 0.0 {
                return Err(ConfigFileError::InvalidValue {
                    section: "rate_limit".to_string(),
                    key: "cooldown_secs".to_string(),
                    value: v.to_string(),
                    reason: "must be a non-negative number of seconds".to_string(),
                });
            }
            config.rate_limit.cooldown_secs = v;
        }
    }

    // [session] section
    if let Some(section) = ini.section(Some("session")) {
        if let Some(v) = parse(section, "session", "ttl_secs", "must be a positive integer (seconds)")? {
            config.session.ttl_secs = v;
        }
    }

    // [heightmap] section
    if let Some(section) = ini.section(Some("heightmap")) {
        let heightmap = &mut config.heightmap;
        if let Some(v) = parse(section, "heightmap", "blur_radius", "must be a non-negative integer (pixels)")? {
            heightmap.blur_radius = v;
        }
        if let Some(v) = parse(section, "heightmap", "detail_noise_scale", "must be a number")? {
            heightmap.detail_noise_scale = v;
        }
        if let Some(v) = parse(section, "heightmap", "detail_noise_weight", "must be a number")? {
            heightmap.detail_noise_weight = v;
        }
        if let Some(v) = parse(section, "heightmap", "final_noise_scale", "must be a number")? {
            heightmap.final_noise_scale = v;
        }
        if let Some(v) = parse(section, "heightmap", "final_noise_weight", "must be a number")? {
            heightmap.final_noise_weight = v;
        }
    }

    // [export] section
    if let Some(section) = ini.section(Some("export")) {
        if let Some(v) = section.get("enabled") {
            config.export.enabled = parse_bool(v);
        }
        if let Some(v) = non_empty(section, "tool") {
            config.export.tool = v.to_string();
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = expand_tilde(v);
        }
    }

    Ok(config)
}

/// Trimmed value of `key`, `None` when absent or blank.
fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

/// Parses `key` if present, reporting `reason` for malformed values.
fn parse<T: FromStr>(
    section: &Properties,
    section_name: &str,
    key: &str,
    reason: &str,
) -> Result<Option<T>, ConfigFileError> {
    let Some(v) = non_empty(section, key) else {
        return Ok(None);
    };
    v.parse().map(Some).map_err(|_| ConfigFileError::InvalidValue {
        section: section_name.to_string(),
        key: key.to_string(),
        value: v.to_string(),
        reason: reason.to_string(),
    })
}

/// Parse a boolean value from config string.
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
