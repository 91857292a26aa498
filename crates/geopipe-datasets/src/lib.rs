//! geopipe-datasets - the staged dataset materialization core
//!
//! A dataset is an ordered sequence of named, path-addressed artifacts,
//! each produced by a deterministic, idempotent transformation over its
//! predecessor (or an external source). Dataset descriptors are static
//! data; one interpreter materializes or purges any dataset from its
//! descriptor.

pub mod datasets;
pub mod descriptor;
pub mod pipeline;
pub mod store;

pub use descriptor::{DatasetSpec, StageKind, StageSpec};
pub use pipeline::{materialize, purge, Collaborators};
pub use store::DataStore;
