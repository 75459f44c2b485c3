//! Runtime settings for the orchestrator.

use std::time::Duration;

use super::cooldown::DEFAULT_COOLDOWN;
use crate::heightmap::HeightmapParams;

/// Finest zoom at which tile jobs are generated.
pub const DEFAULT_TARGET_ZOOM: u8 = 13;

/// Side length in pixels of heightmaps and masks.
pub const DEFAULT_RESOLUTION: usize = 1024;

/// Inset in degrees applied to a tile's box before re-decomposing it.
pub const AREA_INSET_DEG: f64 = 0.01;

/// Side length of the downsampled texture.
pub const SMALL_TEXTURE_SIZE: u32 = 100;

/// Worker counts per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerCounts {
    pub fetch: usize,
    pub landcover: usize,
    pub heightmap: usize,
    pub tile: usize,
    pub export: usize,
}

impl Default for WorkerCounts {
    fn default() -> Self {
        Self {
            fetch: 1,
            landcover: 2,
            heightmap: 4,
            tile: 4,
            export: 2,
        }
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub target_zoom: u8,
    pub resolution: usize,
    /// Extra quad-tree levels fetched below each cover tile
    pub leaf_depth: u8,
    pub workers: WorkerCounts,
    /// Attempts after the first for retryable failures
    pub max_retries: u32,
    /// Provider queue pause after a rate-limit response
    pub cooldown: Duration,
    /// Heightmap composition parameters; the seed comes from each request
    pub heightmap: HeightmapParams,
    pub export_enabled: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_zoom: DEFAULT_TARGET_ZOOM,
            resolution: DEFAULT_RESOLUTION,
            leaf_depth: 0,
            workers: WorkerCounts::default(),
            max_retries: 3,
            cooldown: DEFAULT_COOLDOWN,
            heightmap: HeightmapParams::default(),
            export_enabled: true,
        }
    }
}
