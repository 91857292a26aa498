//! Declarative dataset descriptors.
//!
//! A descriptor is static data: an ordered list of stages, where every
//! derived stage names its input stage(s) explicitly. Ordering and data
//! dependencies are therefore visible invariants, checked by
//! [`DatasetSpec::validate`], rather than a side effect of declaration
//! order.

use anyhow::{bail, Result};

/// How one stage produces its artifact.
#[derive(Debug, Clone, Copy)]
pub enum StageKind {
    /// Pre-supplied file. Never created by the pipeline; never purged.
    Source,
    /// Download a fixed source URL to the artifact path.
    Acquire { url: &'static str },
    /// Copy one named layer out of a downloaded archive, addressed via an
    /// in-archive virtual path so the archive is never unpacked.
    ExtractLayer {
        input: &'static str,
        archive_member: Option<&'static str>,
        layer: &'static str,
    },
    /// SQL attribute/geometry selection plus reprojection, in one engine
    /// pass.
    ProjectSql {
        input: &'static str,
        sql: &'static str,
        output_layer: &'static str,
        target_srs: &'static str,
    },
    /// Tile-index clean: reproject to WKT CSV, then derive the tile id
    /// from a location column.
    DeriveIds {
        input: &'static str,
        location_field: &'static str,
        target_srs: &'static str,
    },
    /// Tile-index join: LEFT-join download URLs onto the cleaned index,
    /// then write the final layer.
    JoinLinks {
        index: &'static str,
        links: &'static str,
        id_pattern: &'static str,
        output_layer: &'static str,
        srs: &'static str,
    },
}

impl StageKind {
    /// Acquired and pre-supplied artifacts are precious inputs: purge
    /// never deletes them.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Source | Self::Acquire { .. })
    }

    /// Ids of the stages this stage consumes.
    pub fn input_ids(&self) -> Vec<&'static str> {
        match self {
            Self::Source | Self::Acquire { .. } => Vec::new(),
            Self::ExtractLayer { input, .. }
            | Self::ProjectSql { input, .. }
            | Self::DeriveIds { input, .. } => vec![input],
            Self::JoinLinks { index, links, .. } => vec![index, links],
        }
    }
}

/// One stage of a dataset: a stable id, a fixed artifact path relative to
/// the data root, and the transformation that produces it.
#[derive(Debug, Clone, Copy)]
pub struct StageSpec {
    pub id: &'static str,
    pub rel_path: &'static str,
    pub kind: StageKind,
}

/// An ordered enumeration of the stages belonging to one dataset.
#[derive(Debug)]
pub struct DatasetSpec {
    pub name: &'static str,
    pub stages: &'static [StageSpec],
}

impl DatasetSpec {
    pub fn stage(&self, id: &str) -> Option<&'static StageSpec> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Static well-formedness: unique ids and paths, inputs that exist
    /// and strictly precede their consumers, and a non-derived first
    /// stage.
    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            bail!("dataset {}: no stages", self.name);
        }
        if !self.stages[0].kind.is_input() {
            bail!(
                "dataset {}: first stage {} must be a source or download",
                self.name,
                self.stages[0].id
            );
        }
        for (pos, stage) in self.stages.iter().enumerate() {
            if self.stages[..pos].iter().any(|s| s.id == stage.id) {
                bail!("dataset {}: duplicate stage id {}", self.name, stage.id);
            }
            if self.stages[..pos].iter().any(|s| s.rel_path == stage.rel_path) {
                bail!("dataset {}: duplicate path {}", self.name, stage.rel_path);
            }
            for input in stage.kind.input_ids() {
                if !self.stages[..pos].iter().any(|s| s.id == input) {
                    bail!(
                        "dataset {}: stage {} consumes {}, which does not precede it",
                        self.name,
                        stage.id,
                        input
                    );
                }
            }
        }
        Ok(())
    }
}

/// Cross-dataset invariant: no two stages anywhere may share a path.
pub fn validate_registry(datasets: &[&DatasetSpec]) -> Result<()> {
    let mut seen: Vec<(&str, &str)> = Vec::new();
    for ds in datasets {
        ds.validate()?;
        for stage in ds.stages {
            if let Some((other, _)) = seen.iter().find(|(_, p)| *p == stage.rel_path) {
                bail!(
                    "datasets {} and {} both resolve an artifact to {}",
                    other,
                    ds.name,
                    stage.rel_path
                );
            }
            seen.push((ds.name, stage.rel_path));
        }
    }
    Ok(())
}
