//! Dataset lifecycle: materialize and purge.
//!
//! One interpreter drives every dataset from its descriptor. Stages run
//! strictly in declaration order (each consumes an artifact a predecessor
//! wrote); a stage whose artifact already exists is skipped; the first
//! failure aborts the rest of the dataset.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use geopipe_core::download::Downloader;
use geopipe_engine::{vsi_zip, OutputFormat, TransformRequest, VectorEngine};
use geopipe_join::FrameOps;

use crate::descriptor::{DatasetSpec, StageKind, StageSpec};
use crate::store::DataStore;

/// The external collaborators every stage draws on, passed by reference
/// so there is no ambient global I/O state.
pub struct Collaborators<'a> {
    pub downloader: &'a dyn Downloader,
    pub engine: &'a dyn VectorEngine,
    pub frames: &'a dyn FrameOps,
}

/// Run every stage of `ds` in dependency order, skipping stages whose
/// artifact already exists.
pub fn materialize(ds: &DatasetSpec, store: &DataStore, collab: &Collaborators) -> Result<()> {
    log::info!("materializing dataset: {}", ds.name);
    for stage in ds.stages {
        let dst = store.resolve(stage);
        if dst.exists() {
            log::info!("{}/{}: found at {}", ds.name, stage.id, dst.display());
            continue;
        }
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        run_stage(ds, stage, &dst, store, collab)
            .with_context(|| format!("stage {}/{} failed", ds.name, stage.id))?;
    }
    Ok(())
}

/// Delete every derived artifact of `ds` that exists. Acquired and
/// pre-supplied sources are always preserved; an already-absent artifact
/// is a silent no-op.
pub fn purge(ds: &DatasetSpec, store: &DataStore) -> Result<()> {
    log::info!("purging dataset: {}", ds.name);
    for stage in ds.stages {
        if stage.kind.is_input() {
            continue;
        }
        let path = store.resolve(stage);
        if path.exists() {
            log::info!("deleting: {}", path.display());
            fs::remove_file(&path)
                .with_context(|| format!("failed to delete {}", path.display()))?;
        }
    }
    Ok(())
}

/// Artifact path of a named input stage within the same dataset.
fn input_path(ds: &DatasetSpec, store: &DataStore, id: &str) -> Result<PathBuf> {
    let stage = ds
        .stage(id)
        .with_context(|| format!("dataset {} has no stage {id}", ds.name))?;
    Ok(store.resolve(stage))
}

fn run_stage(
    ds: &DatasetSpec,
    stage: &StageSpec,
    dst: &Path,
    store: &DataStore,
    collab: &Collaborators,
) -> Result<()> {
    match stage.kind {
        StageKind::Source => {
            bail!(
                "pre-supplied source missing: place the file at {}",
                dst.display()
            );
        }
        StageKind::Acquire { url } => {
            log::info!("{}/{}: downloading to {}", ds.name, stage.id, dst.display());
            collab.downloader.fetch(url, dst)?;
        }
        StageKind::ExtractLayer {
            input,
            archive_member,
            layer,
        } => {
            let src = input_path(ds, store, input)?;
            log::info!(
                "{}/{}: extracting layer {layer} to {}",
                ds.name,
                stage.id,
                dst.display()
            );
            let req = TransformRequest::new(
                vsi_zip(&src, archive_member),
                dst,
                OutputFormat::Gpkg,
            )
            .layer(layer);
            collab.engine.run(&req)?;
        }
        StageKind::ProjectSql {
            input,
            sql,
            output_layer,
            target_srs,
        } => {
            let src = input_path(ds, store, input)?;
            log::info!(
                "{}/{}: writing cleaned layer {output_layer} to {}",
                ds.name,
                stage.id,
                dst.display()
            );
            let req = TransformRequest::new(src.display().to_string(), dst, OutputFormat::Gpkg)
                .target_srs(target_srs)
                .sql(sql)
                .output_layer(output_layer);
            collab.engine.run(&req)?;
        }
        StageKind::DeriveIds {
            input,
            location_field,
            target_srs,
        } => {
            let src = input_path(ds, store, input)?;
            log::info!(
                "{}/{}: writing cleaned tile index to {}",
                ds.name,
                stage.id,
                dst.display()
            );
            // Two steps: the engine reprojects the index into a WKT CSV
            // scratch file, then the frame collaborator derives the id
            // column and writes the artifact.
            let scratch = dst.with_extension("wkt.csv");
            let req =
                TransformRequest::new(src.display().to_string(), &scratch, OutputFormat::Csv)
                    .target_srs(target_srs)
                    .layer_creation_option("GEOMETRY=AS_WKT");
            collab.engine.run(&req)?;
            collab.frames.derive_ids(&scratch, location_field, dst)?;
            fs::remove_file(&scratch)
                .with_context(|| format!("failed to remove {}", scratch.display()))?;
        }
        StageKind::JoinLinks {
            index,
            links,
            id_pattern,
            output_layer,
            srs,
        } => {
            let index_csv = input_path(ds, store, index)?;
            let links_path = input_path(ds, store, links)?;
            log::info!(
                "{}/{}: writing joined tile index to {}",
                ds.name,
                stage.id,
                dst.display()
            );
            let scratch = dst.with_extension("joined.csv");
            collab
                .frames
                .join_links(&index_csv, &links_path, id_pattern, &scratch)?;
            // The joined CSV carries WKT geometry but no CRS metadata;
            // assign the CRS the clean stage reprojected into.
            let req =
                TransformRequest::new(scratch.display().to_string(), dst, OutputFormat::Gpkg)
                    .assign_srs(srs)
                    .output_layer(output_layer)
                    .open_option("GEOM_POSSIBLE_NAMES=WKT");
            collab.engine.run(&req)?;
            fs::remove_file(&scratch)
                .with_context(|| format!("failed to remove {}", scratch.display()))?;
        }
    }
    Ok(())
}
