//! Landforge CLI - Command-line interface
//!
//! This binary exposes the landforge tile pipeline on the command line.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::area::AreaArgs;
use commands::config::ConfigCommands;
use commands::list::ListArgs;
use commands::tile::TileArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "landforge")]
#[command(version = landforge::VERSION)]
#[command(about = "Generate heightmaps, landcover and textures for map tiles", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.landforge/config.ini
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every tile covering an area
    Area {
        /// Points as "lon,lat lon,lat ..."; a closed ring describes a polygon
        #[arg(long)]
        coords: String,

        /// Zoom level the area is drawn at
        #[arg(long, default_value = "12")]
        zoom: u8,

        /// Skip landcover classification
        #[arg(long)]
        no_landcover: bool,

        /// Skip heightmap composition
        #[arg(long)]
        no_heightmap: bool,

        /// Noise seed for reproducible heightmaps
        #[arg(long)]
        seed: Option<u32>,
    },

    /// Generate a single tile
    Tile {
        #[arg(long)]
        x: u32,

        #[arg(long)]
        y: u32,

        #[arg(long)]
        zoom: u8,

        /// Noise seed for reproducible heightmaps
        #[arg(long)]
        seed: Option<u32>,
    },

    /// List generated tiles
    List {
        /// Only tiles whose centre lies in "minlon,minlat,maxlon,maxlat"
        #[arg(long)]
        bounds: Option<String>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Area {
            coords,
            zoom,
            no_landcover,
            no_heightmap,
            seed,
        } => {
            commands::area::run(AreaArgs {
                config: cli.config,
                verbose: cli.verbose,
                coords,
                zoom,
                no_landcover,
                no_heightmap,
                seed,
            })
            .await
        }
        Commands::Tile { x, y, zoom, seed } => {
            commands::tile::run(TileArgs {
                config: cli.config,
                verbose: cli.verbose,
                x,
                y,
                zoom,
                seed,
            })
            .await
        }
        Commands::List { bounds } => commands::list::run(ListArgs {
            config: cli.config,
            bounds,
        }),
        Commands::Config { command } => commands::config::run(command, cli.config),
    };

    if let Err(e) = result {
        e.exit();
    }
}
