//! Landforge - terrain tile generation from web map imagery
//!
//! Turns a drawn area into a set of tile directories, each holding a
//! stitched satellite image, a classified landcover map with per-class
//! masks, and a heightmap shaped by that landcover.
//!
//! # High-Level API
//!
//! The [`pipeline`] module drives everything:
//!
//! ```ignore
//! use landforge::pipeline::{AreaRequest, Orchestrator, TileOptions};
//!
//! let orchestrator = Orchestrator::new(provider, Some(GdalTranslate::default()), store, config);
//! let submission = orchestrator.submit_area(AreaRequest {
//!     coords: vec![(7.60, 45.90), (7.70, 45.90), (7.70, 46.00), (7.60, 45.90)],
//!     zoom: 12,
//!     options: TileOptions::default(),
//! })?;
//! submission.handle.wait().await?;
//! ```

pub mod config;
pub mod coord;
pub mod geotiff;
pub mod heightmap;
pub mod landcover;
pub mod logging;
pub mod pipeline;
pub mod provider;
pub mod raster;
pub mod stitch;
pub mod store;

/// Version of the Landforge library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
