//! geopipe-join - tabular stages for the elevation-tile index
//!
//! The tile-index dataset needs two operations the vector engine's SQL
//! cannot express: deriving a join key from a file path and a LEFT join
//! against a plain-text list of download URLs. Both run in an in-memory
//! DuckDB connection over the WKT CSVs the engine produces.

mod sql;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use duckdb::Connection;

/// Summary of a link join.
#[derive(Debug, Clone, Copy)]
pub struct JoinSummary {
    /// Rows in the output (always equals the index row count)
    pub rows: u64,
    /// Rows that matched a download URL
    pub matched: u64,
}

/// The in-memory tabular collaborator, at its interface.
pub trait FrameOps {
    /// Derive a tile id (file stem of `location_field`) and write a CSV
    /// of (id, WKT). Returns the row count.
    fn derive_ids(&self, src_csv: &Path, location_field: &str, dst_csv: &Path) -> Result<u64>;

    /// LEFT-join the cleaned index against the URL list; every index row
    /// is preserved, unmatched rows keep a NULL url.
    fn join_links(
        &self,
        index_csv: &Path,
        links: &Path,
        id_pattern: &str,
        dst_csv: &Path,
    ) -> Result<JoinSummary>;
}

/// Output CSVs are committed via tmp + rename, matching the other writers.
fn tmp_output(dst: &Path) -> PathBuf {
    let stem = dst
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dst.with_file_name(format!("{stem}.tmp.csv"))
}

/// DuckDB-backed implementation.
pub struct DuckFrame;

impl DuckFrame {
    fn connection() -> Result<Connection> {
        Connection::open_in_memory().context("failed to open DuckDB in-memory connection")
    }
}

impl FrameOps for DuckFrame {
    fn derive_ids(&self, src_csv: &Path, location_field: &str, dst_csv: &Path) -> Result<u64> {
        let conn = Self::connection()?;

        let rows: i64 = conn
            .query_row(&sql::count_rows(src_csv), [], |row| row.get(0))
            .with_context(|| format!("failed to read {}", src_csv.display()))?;

        let tmp = tmp_output(dst_csv);
        conn.execute_batch(&sql::derive_ids(src_csv, location_field, &tmp))
            .context("failed to derive tile ids")?;
        fs::rename(&tmp, dst_csv)
            .with_context(|| format!("failed to commit {}", dst_csv.display()))?;

        log::info!("derived ids for {rows} tiles");
        Ok(rows as u64)
    }

    fn join_links(
        &self,
        index_csv: &Path,
        links: &Path,
        id_pattern: &str,
        dst_csv: &Path,
    ) -> Result<JoinSummary> {
        let conn = Self::connection()?;

        conn.execute_batch(&sql::index_view(index_csv))
            .with_context(|| format!("failed to read {}", index_csv.display()))?;
        conn.execute_batch(&sql::links_view(links, id_pattern))
            .with_context(|| format!("failed to read {}", links.display()))?;
        conn.execute_batch(sql::joined_table())
            .context("failed to join download urls")?;

        let summary = conn
            .query_row(sql::summary(), [], |row| {
                Ok(JoinSummary {
                    rows: row.get::<_, i64>(0)? as u64,
                    matched: row.get::<_, i64>(1)? as u64,
                })
            })
            .context("failed to summarize join")?;

        let tmp = tmp_output(dst_csv);
        conn.execute_batch(&sql::export(&tmp))
            .context("failed to export joined index")?;
        fs::rename(&tmp, dst_csv)
            .with_context(|| format!("failed to commit {}", dst_csv.display()))?;

        log::info!(
            "joined {} tiles, {} with download urls",
            summary.rows,
            summary.matched
        );
        Ok(summary)
    }
}
