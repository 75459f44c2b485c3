//! Configuration file handling.
//!
//! `~/.landforge/config.ini` is split into one `[section]` per concern.
//! Settings structs live in [`settings`], constants in [`defaults`],
//! parsing in `parser` and serialization in `writer`.
//!
//! # Example
//!
//! ```no_run
//! use landforge::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let token = config.require_mapbox_token()?;
//! let pipeline = config.pipeline_config();
//! # Ok::<(), landforge::config::ConfigFileError>(())
//! ```

pub mod defaults;
mod file;
mod parser;
pub mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, ExportSettings, HeightmapSettings, LoggingSettings, ProviderSettings,
    QueueSettings, RateLimitSettings, SessionSettings, TilesSettings,
};
