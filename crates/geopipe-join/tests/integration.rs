use std::collections::HashMap;
use std::fs;
use std::path::Path;

use geopipe_join::{DuckFrame, FrameOps};
use tempfile::TempDir;

const TIF_PATTERN: &str = r"(\d+)\.tif";

/// Parse a headered (id, WKT[, url]) CSV into id → remaining columns.
fn read_rows(path: &Path) -> HashMap<String, Vec<String>> {
    let content = fs::read_to_string(path).unwrap();
    let mut lines = content.lines();
    lines.next().expect("missing header");
    lines
        .map(|line| {
            let mut cols = line.split(',').map(|c| c.trim_matches('"').to_string());
            let id = cols.next().unwrap();
            (id, cols.collect())
        })
        .collect()
}

#[test]
fn derive_ids_extracts_file_stems() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("index_wkt.csv");
    let dst = dir.path().join("dem_index.csv");

    fs::write(
        &src,
        "WKT,location\n\
         POINT (1 2),projects/MN/tiles/123045.tif\n\
         POINT (3 4),projects/MN/tiles/123046.tif\n",
    )
    .unwrap();

    let rows = DuckFrame.derive_ids(&src, "location", &dst).unwrap();
    assert_eq!(rows, 2);

    let rows = read_rows(&dst);
    assert_eq!(rows["123045"], vec!["POINT (1 2)"]);
    assert_eq!(rows["123046"], vec!["POINT (3 4)"]);
}

#[test]
fn derive_ids_nulls_unparseable_locations() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("index_wkt.csv");
    let dst = dir.path().join("dem_index.csv");

    fs::write(&src, "WKT,location\nPOINT (1 2),no-extension-here\n").unwrap();

    let rows = DuckFrame.derive_ids(&src, "location", &dst).unwrap();
    assert_eq!(rows, 1);

    let rows = read_rows(&dst);
    // Permissive: the row survives with an empty id
    assert_eq!(rows[""], vec!["POINT (1 2)"]);
}

#[test]
fn join_preserves_every_index_row() {
    let dir = TempDir::new().unwrap();
    let index = dir.path().join("dem_index.csv");
    let links = dir.path().join("links.txt");
    let dst = dir.path().join("joined.csv");

    fs::write(
        &index,
        "id,WKT\n\
         123045,POINT (1 2)\n\
         123046,POINT (3 4)\n\
         123047,POINT (5 6)\n",
    )
    .unwrap();
    fs::write(
        &links,
        "https://example.com/tiles/123045.tif\n\
         https://example.com/tiles/123047.tif\n\
         https://example.com/tiles/readme.txt\n",
    )
    .unwrap();

    let summary = DuckFrame
        .join_links(&index, &links, TIF_PATTERN, &dst)
        .unwrap();
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.matched, 2);

    let rows = read_rows(&dst);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows["123045"][1], "https://example.com/tiles/123045.tif");
    assert_eq!(rows["123047"][1], "https://example.com/tiles/123047.tif");
    // Left join: the unmatched tile keeps a null url
    assert_eq!(rows["123046"][1], "");
}

#[test]
fn join_with_no_matching_links() {
    let dir = TempDir::new().unwrap();
    let index = dir.path().join("dem_index.csv");
    let links = dir.path().join("links.txt");
    let dst = dir.path().join("joined.csv");

    fs::write(&index, "id,WKT\n123045,POINT (1 2)\n").unwrap();
    fs::write(&links, "https://example.com/metadata.xml\n").unwrap();

    let summary = DuckFrame
        .join_links(&index, &links, TIF_PATTERN, &dst)
        .unwrap();
    assert_eq!(summary.rows, 1);
    assert_eq!(summary.matched, 0);
}

#[test]
fn join_commits_no_partial_output_on_failure() {
    let dir = TempDir::new().unwrap();
    let index = dir.path().join("missing.csv");
    let links = dir.path().join("links.txt");
    let dst = dir.path().join("joined.csv");

    fs::write(&links, "https://example.com/tiles/123045.tif\n").unwrap();

    let result = DuckFrame.join_links(&index, &links, TIF_PATTERN, &dst);
    assert!(result.is_err());
    assert!(!dst.exists());
}
