//! Job identity, stages and lifecycle states.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::coord::TileCoord;

/// Global counter for generating job IDs.
static JOB_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique, creation-ordered job identifier.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct JobId(u64);

impl JobId {
    /// Allocates the next ID. IDs sort in creation order.
    pub fn next() -> Self {
        Self(JOB_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobId({})", self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Pipeline stage; each stage has its own queue and worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Splits a requested area into tile jobs
    Area,
    /// Drives one tile through the stages below
    Tile,
    /// Fetches and stitches provider imagery
    Fetch,
    /// Classifies landcover, writes masks, coverage and texture
    Landcover,
    /// Composes the final heightmap
    Heightmap,
    /// Writes GeoTIFF exports
    Export,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Area,
        Stage::Tile,
        Stage::Fetch,
        Stage::Landcover,
        Stage::Heightmap,
        Stage::Export,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Area => "area",
            Stage::Tile => "tile",
            Stage::Fetch => "fetch",
            Stage::Landcover => "landcover",
            Stage::Heightmap => "heightmap",
            Stage::Export => "export",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job lifecycle state.
///
/// `Queued → Active → Done | Failed`. A retryable failure moves an
/// `Active` job back to `Queued` until the cool-down has passed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JobStatus {
    #[default]
    Queued,
    Active,
    Done,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Active => write!(f, "active"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Snapshot of a job's observable state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JobState {
    pub status: JobStatus,
    /// 0 to 100, never decreasing
    pub progress: u8,
    /// Number of times the job was claimed by a worker
    pub attempts: u32,
    /// Failure reason once `status` is `Failed`
    pub error: Option<String>,
}

/// Tile-level options carried by tile jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileOptions {
    pub landcover: bool,
    pub heightmap: bool,
    /// Noise seed; a random one is drawn per noise field when `None`
    pub seed: Option<u32>,
}

impl Default for TileOptions {
    fn default() -> Self {
        Self {
            landcover: true,
            heightmap: true,
            seed: None,
        }
    }
}

/// What a job is working on, for logging and listings.
#[derive(Debug, Clone, PartialEq)]
pub struct JobInfo {
    pub id: JobId,
    pub stage: Stage,
    /// Root tile of the job, absent for area jobs
    pub tile: Option<TileCoord>,
}
