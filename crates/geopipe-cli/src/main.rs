//! geopipe - staged materialization of project geodata
//!
//! Downloads, extracts, and cleans the geospatial datasets the project
//! depends on (county boundaries, watersheds, culvert lines, the
//! elevation-tile index) into a local data directory, caching each
//! pipeline stage by the existence of its output file.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "geopipe")]
#[command(about = "Staged materialization of project geodata")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./geopipe.toml or ~/.config/geopipe/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Create one or more datasets, skipping stages already on disk
    Create(cmd::create::CreateArgs),
    /// Remove the derived artifacts of one or more datasets
    Remove(cmd::remove::RemoveArgs),
    /// Show which artifacts exist for every dataset
    Status,
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    geopipe_core::init_logging(cli.debug);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Create(args) => cmd::create::run(args, &config),
        Command::Remove(args) => cmd::remove::run(args, &config),
        Command::Status => cmd::status::run(&config),
        Command::Config => {
            use comfy_table::{
                modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec![
                "Data directory",
                &config.data.dir.display().to_string(),
            ]);
            table.add_row(vec![
                "ogr2ogr binary",
                &config.engine.ogr2ogr.display().to_string(),
            ]);
            table.add_row(vec![
                "Target CRS",
                geopipe_datasets::datasets::TARGET_SRS,
            ]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
