//! `geopipe create` - materialize datasets

use anyhow::Result;
use clap::Args;

use geopipe_core::HttpDownloader;
use geopipe_datasets::{materialize, Collaborators, DataStore};
use geopipe_engine::Ogr2Ogr;
use geopipe_join::DuckFrame;

use super::DatasetName;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Datasets to create
    #[arg(required = true, value_enum)]
    pub datasets: Vec<DatasetName>,
}

pub fn run(args: CreateArgs, config: &Config) -> Result<()> {
    let store = DataStore::new(&config.data.dir);
    let downloader = HttpDownloader;
    let engine = Ogr2Ogr::new(&config.engine.ogr2ogr);
    let frames = DuckFrame;
    let collab = Collaborators {
        downloader: &downloader,
        engine: &engine,
        frames: &frames,
    };

    // Fail fast: the first failing dataset aborts the batch. Datasets
    // touch disjoint path subtrees, so earlier ones stay fully built.
    for name in &args.datasets {
        materialize(name.spec(), &store, &collab)?;
    }
    Ok(())
}
