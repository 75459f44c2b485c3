//! Area command - generate every tile of a drawn area.

use std::path::PathBuf;

use landforge::pipeline::AreaRequest;

use super::common::{parse_coords, report_tiles, tile_options};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the area command.
pub struct AreaArgs {
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub coords: String,
    pub zoom: u8,
    pub no_landcover: bool,
    pub no_heightmap: bool,
    pub seed: Option<u32>,
}

/// Run the area command to completion.
pub async fn run(args: AreaArgs) -> Result<(), CliError> {
    let coords = parse_coords(&args.coords)?;
    let runner = CliRunner::new(args.config, args.verbose)?;
    runner.log_startup("area");
    let orchestrator = runner.orchestrator()?;

    let submission = orchestrator.submit_area(AreaRequest {
        coords,
        zoom: args.zoom,
        options: tile_options(args.no_landcover, args.no_heightmap, args.seed),
    })?;

    println!(
        "Generating {} tile(s) into {}",
        submission.tiles.len(),
        orchestrator.store().root().display()
    );
    let failed = report_tiles(&submission.tiles).await;
    let result = submission.handle.wait().await;
    orchestrator.shutdown();

    println!();
    println!(
        "{} of {} tile(s) generated",
        submission.tiles.len() - failed,
        submission.tiles.len()
    );
    Ok(result?)
}
