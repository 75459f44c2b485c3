//! CLI command implementations.
//!
//! - [`area`] - Generate every tile of a drawn area
//! - [`tile`] - Generate a single tile
//! - [`list`] - List generated tiles
//! - [`config`] - Configuration management (init, path, show)

pub mod area;
pub mod common;
pub mod config;
pub mod list;
pub mod tile;
