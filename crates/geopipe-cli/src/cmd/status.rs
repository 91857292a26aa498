//! `geopipe status` - artifact inventory

use anyhow::Result;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use geopipe_datasets::{datasets, DataStore};

use crate::config::Config;

pub fn run(config: &Config) -> Result<()> {
    let store = DataStore::new(&config.data.dir);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Dataset").fg(Color::Cyan),
            Cell::new("Stage").fg(Color::Cyan),
            Cell::new("Artifact").fg(Color::Cyan),
            Cell::new("Status").fg(Color::Cyan),
        ]);

    for ds in datasets::ALL {
        for stage in ds.stages {
            let path = store.resolve(stage);
            let status = if path.exists() {
                Cell::new("present").fg(Color::Green)
            } else if stage.kind.is_input() {
                Cell::new("missing").fg(Color::Yellow)
            } else {
                Cell::new("absent").fg(Color::DarkGrey)
            };
            table.add_row(vec![
                Cell::new(ds.name),
                Cell::new(stage.id),
                Cell::new(stage.rel_path),
                status,
            ]);
        }
    }

    eprintln!("\n{table}");
    Ok(())
}
