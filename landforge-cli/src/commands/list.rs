//! List command - print the tile catalog.

use std::path::PathBuf;

use landforge::store::{Artifact, TileCatalog, TileStore};

use super::common::parse_bounds;
use crate::error::CliError;
use crate::runner::load_config;

/// Arguments for the list command.
pub struct ListArgs {
    pub config: Option<PathBuf>,
    pub bounds: Option<String>,
}

pub fn run(args: ListArgs) -> Result<(), CliError> {
    let bounds = args.bounds.as_deref().map(parse_bounds).transpose()?;
    let config = load_config(args.config.as_deref())?;
    let catalog = TileCatalog::new(TileStore::new(&config.tiles.directory));
    let entries = catalog.list(bounds.as_ref())?;

    if entries.is_empty() {
        println!("No tiles in {}", config.tiles.directory.display());
        return Ok(());
    }

    println!("{:<18} {:<16} {:>10} {:>10}  ARTIFACTS", "ID", "TILE", "MIN (m)", "MAX (m)");
    for entry in &entries {
        let height = |h: Option<f64>| h.map(|h| format!("{:.1}", h)).unwrap_or_else(|| "-".to_string());
        let artifacts = entry
            .artifacts
            .iter()
            .filter(|a| **a != Artifact::Metadata)
            .map(|a| a.file_name())
            .collect::<Vec<_>>()
            .join(",");
        println!(
            "{:<18} {:<16} {:>10} {:>10}  {}",
            entry.id.as_str(),
            entry.metadata.tile.to_string(),
            height(entry.metadata.min_height),
            height(entry.metadata.max_height),
            artifacts
        );
        if let Some(coverage) = &entry.coverage {
            let classes = coverage
                .iter()
                .filter(|(_, fraction)| *fraction > 0.0)
                .map(|(name, fraction)| format!("{}={:.1}%", name, fraction * 100.0))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{:<18} {}", "", classes);
        }
    }
    println!();
    println!("{} tile(s)", entries.len());
    Ok(())
}
