//! Configuration management CLI commands.
//!
//! Provides `config init`, `config path` and `config show`.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use landforge::config::{config_file_path, ConfigFile};

use crate::error::CliError;
use crate::runner::load_config;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write a config file with default settings if none exists
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration file path
    Path,

    /// Print the effective configuration
    Show,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_path: Option<PathBuf>) -> Result<(), CliError> {
    let path = config_path.unwrap_or_else(config_file_path);
    match command {
        ConfigCommands::Init { force } => run_init(&path, force),
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Show => run_show(&path),
    }
}

fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        println!("Config file already exists: {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }
    ConfigFile::default().save_to(path)?;
    println!("Wrote {}", path.display());
    println!("Set mapbox_access_token in the [provider] section before running.");
    Ok(())
}

fn run_show(path: &Path) -> Result<(), CliError> {
    let config = load_config(Some(path))?;
    let secret = |v: &Option<String>| match v {
        Some(_) => "(set)".to_string(),
        None => "(not set)".to_string(),
    };
    let plain = |v: &Option<String>| v.clone().unwrap_or_else(|| "(not set)".to_string());

    println!("Configuration ({})", path.display());
    println!();
    println!("[provider]");
    println!("  mapbox_access_token        {}", secret(&config.provider.mapbox_access_token));
    println!("  mapbox_username            {}", plain(&config.provider.mapbox_username));
    println!("  mapbox_style_id            {}", plain(&config.provider.mapbox_style_id));
    println!("  classification_url         {}", plain(&config.provider.classification_url));
    println!("  classification_auth_url    {}", plain(&config.provider.classification_auth_url));
    println!("  classification_credentials {}", secret(&config.provider.classification_credentials));
    println!("  timeout                    {}s", config.provider.timeout);
    println!("[tiles]");
    println!("  directory                  {}", config.tiles.directory.display());
    println!("  target_zoom                {}", config.tiles.target_zoom);
    println!("  resolution                 {}", config.tiles.resolution);
    println!("  leaf_depth                 {}", config.tiles.leaf_depth);
    println!("[queues]");
    println!("  fetch_workers              {}", config.queues.fetch_workers);
    println!("  landcover_workers          {}", config.queues.landcover_workers);
    println!("  heightmap_workers          {}", config.queues.heightmap_workers);
    println!("  tile_workers               {}", config.queues.tile_workers);
    println!("  export_workers             {}", config.queues.export_workers);
    println!("  max_retries                {}", config.queues.max_retries);
    println!("[rate_limit]");
    println!("  cooldown_secs              {}", config.rate_limit.cooldown_secs);
    println!("[session]");
    println!("  ttl_secs                   {}", config.session.ttl_secs);
    println!("[heightmap]");
    println!("  blur_radius                {}", config.heightmap.blur_radius);
    println!("  detail_noise               {} x {}", config.heightmap.detail_noise_scale, config.heightmap.detail_noise_weight);
    println!("  final_noise                {} x {}", config.heightmap.final_noise_scale, config.heightmap.final_noise_weight);
    println!("[export]");
    println!("  enabled                    {}", config.export.enabled);
    println!("  tool                       {}", config.export.tool);
    println!("[logging]");
    println!("  file                       {}", config.logging.file.display());
    Ok(())
}
