//! `geopipe remove` - purge derived artifacts

use anyhow::Result;
use clap::Args;

use geopipe_datasets::{purge, DataStore};

use super::DatasetName;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Datasets to remove (sources are always preserved)
    #[arg(required = true, value_enum)]
    pub datasets: Vec<DatasetName>,
}

pub fn run(args: RemoveArgs, config: &Config) -> Result<()> {
    let store = DataStore::new(&config.data.dir);
    for name in &args.datasets {
        purge(name.spec(), &store)?;
    }
    Ok(())
}
