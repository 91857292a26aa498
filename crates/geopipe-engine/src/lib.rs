//! geopipe-engine - wrapper around the external vector transformation tool
//!
//! The engine (ogr2ogr) is invoked as a blocking, all-or-nothing
//! operation: one or more input dataset locations (including
//! archive-relative `/vsizip/` virtual paths), an optional source layer,
//! an optional SQL selection, a target CRS, and an output path. A
//! non-zero exit is fatal. Output is written to a temporary sibling path
//! and renamed on success, so a killed subprocess never leaves a partial
//! file at an artifact path.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Output driver, passed explicitly as `-f` so the tool never has to
/// infer the format from the temporary output path's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Gpkg,
    Csv,
}

impl OutputFormat {
    pub fn driver(self) -> &'static str {
        match self {
            Self::Gpkg => "GPKG",
            Self::Csv => "CSV",
        }
    }
}

/// One blocking invocation of the vector engine, built declaratively.
#[derive(Debug, Clone)]
pub struct TransformRequest {
    src: String,
    dst: PathBuf,
    format: OutputFormat,
    layer: Option<String>,
    sql: Option<String>,
    target_srs: Option<String>,
    assign_srs: Option<String>,
    output_layer: Option<String>,
    layer_creation: Vec<String>,
    open_options: Vec<String>,
}

impl TransformRequest {
    pub fn new(src: impl Into<String>, dst: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            format,
            layer: None,
            sql: None,
            target_srs: None,
            assign_srs: None,
            output_layer: None,
            layer_creation: Vec::new(),
            open_options: Vec::new(),
        }
    }

    /// Copy a single named source layer (ignored when an SQL selection is set).
    pub fn layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    /// SQL attribute/geometry selection over the source.
    pub fn sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    /// Reproject to the given CRS (`-t_srs`).
    pub fn target_srs(mut self, srs: impl Into<String>) -> Self {
        self.target_srs = Some(srs.into());
        self
    }

    /// Assign a CRS without reprojecting (`-a_srs`), for sources that
    /// carry coordinates but no CRS metadata (e.g. WKT CSV).
    pub fn assign_srs(mut self, srs: impl Into<String>) -> Self {
        self.assign_srs = Some(srs.into());
        self
    }

    /// Name of the layer created in the output (`-nln`).
    pub fn output_layer(mut self, name: impl Into<String>) -> Self {
        self.output_layer = Some(name.into());
        self
    }

    /// Driver-specific layer creation option (`-lco KEY=VALUE`).
    pub fn layer_creation_option(mut self, opt: impl Into<String>) -> Self {
        self.layer_creation.push(opt.into());
        self
    }

    /// Driver-specific dataset open option (`-oo KEY=VALUE`).
    pub fn open_option(mut self, opt: impl Into<String>) -> Self {
        self.open_options.push(opt.into());
        self
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn dst(&self) -> &Path {
        &self.dst
    }

    /// Command-line arguments, with output redirected to `out`.
    pub fn to_args(&self, out: &Path) -> Vec<String> {
        let mut args = vec!["-f".to_string(), self.format.driver().to_string()];
        if let Some(srs) = &self.target_srs {
            args.push("-t_srs".to_string());
            args.push(srs.clone());
        }
        if let Some(srs) = &self.assign_srs {
            args.push("-a_srs".to_string());
            args.push(srs.clone());
        }
        if let Some(sql) = &self.sql {
            args.push("-sql".to_string());
            args.push(sql.clone());
        }
        if let Some(name) = &self.output_layer {
            args.push("-nln".to_string());
            args.push(name.clone());
        }
        for opt in &self.layer_creation {
            args.push("-lco".to_string());
            args.push(opt.clone());
        }
        for opt in &self.open_options {
            args.push("-oo".to_string());
            args.push(opt.clone());
        }
        args.push(out.display().to_string());
        args.push(self.src.clone());
        if self.sql.is_none() {
            if let Some(layer) = &self.layer {
                args.push(layer.clone());
            }
        }
        args
    }
}

/// Build a `/vsizip/` virtual path addressing a dataset inside a zip
/// archive, without unpacking it to disk.
pub fn vsi_zip(archive: &Path, member: Option<&str>) -> String {
    match member {
        Some(member) => format!("/vsizip/{}/{member}", archive.display()),
        None => format!("/vsizip/{}", archive.display()),
    }
}

/// Error from a vector engine invocation.
#[derive(Debug)]
pub enum EngineError {
    /// The tool could not be spawned (usually: not installed)
    Spawn(std::io::Error),
    /// The tool exited with a non-zero status
    Exit { code: Option<i32>, stderr: String },
    /// The tool reported success but produced no output bytes
    EmptyOutput(PathBuf),
    /// I/O error while committing the output
    Io(std::io::Error),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(e) => write!(f, "failed to run ogr2ogr (is GDAL installed?): {e}"),
            Self::Exit {
                code: Some(code),
                stderr,
            } => write!(f, "ogr2ogr exited with status {code}: {}", stderr.trim()),
            Self::Exit { code: None, stderr } => {
                write!(f, "ogr2ogr killed by signal: {}", stderr.trim())
            }
            Self::EmptyOutput(path) => {
                write!(f, "ogr2ogr produced an empty output at {}", path.display())
            }
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// The external transformation engine, at its interface.
pub trait VectorEngine {
    fn run(&self, req: &TransformRequest) -> Result<(), EngineError>;
}

/// Temporary output path: `name.ext` becomes `name.tmp.ext` in the same
/// directory. The extension is preserved because the CSV driver treats an
/// extensionless output as a directory of per-layer files.
fn tmp_output(dst: &Path) -> PathBuf {
    let stem = dst
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match dst.extension() {
        Some(ext) => dst.with_file_name(format!("{stem}.tmp.{}", ext.to_string_lossy())),
        None => dst.with_file_name(format!("{stem}.tmp")),
    }
}

/// The real engine: spawns the `ogr2ogr` binary.
pub struct Ogr2Ogr {
    binary: PathBuf,
}

impl Ogr2Ogr {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for Ogr2Ogr {
    fn default() -> Self {
        Self::new("ogr2ogr")
    }
}

impl VectorEngine for Ogr2Ogr {
    fn run(&self, req: &TransformRequest) -> Result<(), EngineError> {
        let tmp = tmp_output(req.dst());
        if tmp.exists() {
            // Stale output from an interrupted run
            fs::remove_file(&tmp)?;
        }

        let args = req.to_args(&tmp);
        log::debug!("{} {}", self.binary.display(), args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(EngineError::Spawn)?;

        if !output.status.success() {
            let _ = fs::remove_file(&tmp);
            return Err(EngineError::Exit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        // A killed or misbehaving tool can report success with no bytes
        // written; refuse to commit that as a completed artifact.
        let len = fs::metadata(&tmp).map(|m| m.len()).unwrap_or(0);
        if len == 0 {
            let _ = fs::remove_file(&tmp);
            return Err(EngineError::EmptyOutput(req.dst().to_path_buf()));
        }

        fs::rename(&tmp, req.dst())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_args_name_the_layer() {
        let req = TransformRequest::new(
            "/vsizip//data/raw/counties.zip/counties.gpkg",
            "/data/interim/county_boundaries.gpkg",
            OutputFormat::Gpkg,
        )
        .layer("mn_county_boundaries_multipart");

        let args = req.to_args(Path::new("/data/interim/county_boundaries.tmp.gpkg"));
        assert_eq!(
            args,
            vec![
                "-f",
                "GPKG",
                "/data/interim/county_boundaries.tmp.gpkg",
                "/vsizip//data/raw/counties.zip/counties.gpkg",
                "mn_county_boundaries_multipart",
            ]
        );
    }

    #[test]
    fn sql_args_reproject_and_rename_layer() {
        let req = TransformRequest::new(
            "/data/interim/huc_12_watersheds.gpkg",
            "/data/processed/huc_12_watersheds.gpkg",
            OutputFormat::Gpkg,
        )
        .sql("SELECT DISTINCT HUC12 AS huc12, Name AS name, Shape AS geom FROM WBDHU12")
        .target_srs("EPSG:26915")
        .output_layer("watersheds");

        let args = req.to_args(Path::new("/tmp/out.tmp.gpkg"));
        assert_eq!(args[0..2], ["-f", "GPKG"]);
        assert_eq!(args[2..4], ["-t_srs", "EPSG:26915"]);
        assert_eq!(args[4], "-sql");
        assert!(args[5].starts_with("SELECT DISTINCT"));
        assert_eq!(args[6..8], ["-nln", "watersheds"]);
        assert_eq!(args[8], "/tmp/out.tmp.gpkg");
        assert_eq!(args[9], "/data/interim/huc_12_watersheds.gpkg");
    }

    #[test]
    fn sql_suppresses_positional_layer() {
        let req = TransformRequest::new("src.gpkg", "dst.gpkg", OutputFormat::Gpkg)
            .layer("ignored")
            .sql("SELECT fid, geom FROM culverts");
        let args = req.to_args(Path::new("dst.tmp.gpkg"));
        assert!(!args.contains(&"ignored".to_string()));
    }

    #[test]
    fn csv_args_carry_creation_and_open_options() {
        let req = TransformRequest::new("/data/raw/opr_index.gpkg", "/tmp/index.csv", OutputFormat::Csv)
            .target_srs("EPSG:26915")
            .layer_creation_option("GEOMETRY=AS_WKT")
            .open_option("GEOM_POSSIBLE_NAMES=WKT");
        let args = req.to_args(Path::new("/tmp/index.tmp.csv"));
        assert!(args.windows(2).any(|w| w == ["-lco", "GEOMETRY=AS_WKT"]));
        assert!(args
            .windows(2)
            .any(|w| w == ["-oo", "GEOM_POSSIBLE_NAMES=WKT"]));
    }

    #[test]
    fn vsi_zip_with_member() {
        let vsi = vsi_zip(Path::new("/data/raw/archive.zip"), Some("inner.gpkg"));
        assert_eq!(vsi, "/vsizip//data/raw/archive.zip/inner.gpkg");
    }

    #[test]
    fn vsi_zip_without_member() {
        let vsi = vsi_zip(Path::new("/data/external/lines.shp.zip"), None);
        assert_eq!(vsi, "/vsizip//data/external/lines.shp.zip");
    }

    #[test]
    fn tmp_output_preserves_extension() {
        assert_eq!(
            tmp_output(Path::new("/data/interim/dem_index.csv")),
            Path::new("/data/interim/dem_index.tmp.csv")
        );
        assert_eq!(
            tmp_output(Path::new("/data/processed/culverts.gpkg")),
            Path::new("/data/processed/culverts.tmp.gpkg")
        );
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let engine = Ogr2Ogr::new("/nonexistent/ogr2ogr-binary");
        let dir = tempfile::tempdir().unwrap();
        let req = TransformRequest::new(
            "src.gpkg",
            dir.path().join("out.gpkg"),
            OutputFormat::Gpkg,
        );
        match engine.run(&req) {
            Err(EngineError::Spawn(_)) => {}
            other => panic!("expected spawn error, got {other:?}"),
        }
    }

    #[test]
    fn exit_error_display_includes_stderr() {
        let err = EngineError::Exit {
            code: Some(1),
            stderr: "FAILURE: Unable to open datasource\n".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("status 1"));
        assert!(msg.contains("Unable to open datasource"));
    }
}
