//! Subcommand implementations.

pub mod create;
pub mod remove;
pub mod status;

use clap::ValueEnum;
use geopipe_datasets::{datasets, DatasetSpec};

/// The closed set of dataset names the CLI accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DatasetName {
    Boundaries,
    Watersheds,
    Culverts,
    DemIndex,
}

impl DatasetName {
    pub fn spec(self) -> &'static DatasetSpec {
        match self {
            Self::Boundaries => &datasets::BOUNDARIES,
            Self::Watersheds => &datasets::WATERSHEDS,
            Self::Culverts => &datasets::CULVERTS,
            Self::DemIndex => &datasets::DEM_INDEX,
        }
    }
}
