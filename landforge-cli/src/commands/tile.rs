//! Tile command - generate a single tile.

use std::path::PathBuf;

use landforge::coord::TileCoord;
use landforge::pipeline::TileOptions;

use super::common::report_tiles;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the tile command.
pub struct TileArgs {
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
    pub seed: Option<u32>,
}

pub async fn run(args: TileArgs) -> Result<(), CliError> {
    let tile = TileCoord::new(args.x, args.y, args.zoom);
    let max = 1u64 << args.zoom.min(31);
    if u64::from(args.x) >= max || u64::from(args.y) >= max {
        return Err(CliError::InvalidArgument(format!(
            "tile {} is outside the zoom {} grid",
            tile, args.zoom
        )));
    }

    let runner = CliRunner::new(args.config, args.verbose)?;
    runner.log_startup("tile");
    let orchestrator = runner.orchestrator()?;

    let submission = orchestrator.submit_tile(
        tile,
        TileOptions {
            seed: args.seed,
            ..TileOptions::default()
        },
    )?;
    report_tiles(std::slice::from_ref(&submission)).await;
    let result = submission.handle.wait().await;
    orchestrator.shutdown();

    if result.is_ok() {
        println!();
        println!(
            "Output: {}",
            orchestrator.store().tile_dir(&submission.id).display()
        );
    }
    Ok(result?)
}
