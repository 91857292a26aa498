//! SQL generation for the tile-index tabular stages.
//!
//! All geometry stays opaque: it rides along as the WKT text column the
//! vector engine writes, and is never parsed here.

use std::path::Path;

/// File stem of a path-valued column: last path component with its final
/// extension stripped (`.../tiles/123045.tif` → `123045`).
const STEM_PATTERN: &str = r"([^/\\]+)\.[^./\\]+$";

/// Count the data rows of a headered CSV.
pub fn count_rows(src: &Path) -> String {
    format!(
        "SELECT count(*) FROM read_csv('{}', header = true)",
        src.display()
    )
}

/// Derive the tile id from `location_field` and keep only (id, WKT).
///
/// Rows whose location does not parse get a NULL id rather than failing.
pub fn derive_ids(src: &Path, location_field: &str, dst: &Path) -> String {
    format!(
        "COPY (SELECT NULLIF(regexp_extract(\"{location_field}\", '{STEM_PATTERN}', 1), '') AS id, \"WKT\" \
         FROM read_csv('{}', header = true)) \
         TO '{}' (FORMAT CSV, HEADER)",
        src.display(),
        dst.display()
    )
}

/// View over the cleaned tile index CSV (columns: id, WKT).
///
/// The id is forced to text so the join key always compares as a string,
/// whatever type the CSV sniffer guessed.
pub fn index_view(index: &Path) -> String {
    format!(
        "CREATE OR REPLACE VIEW v_index AS \
         SELECT CAST(id AS VARCHAR) AS id, \"WKT\" \
         FROM read_csv('{}', header = true)",
        index.display()
    )
}

/// View over the plain-text URL list: one URL per line, id extracted via
/// `id_pattern`. Unparseable lines get a NULL id and so never match.
pub fn links_view(links: &Path, id_pattern: &str) -> String {
    format!(
        "CREATE OR REPLACE VIEW v_links AS \
         SELECT NULLIF(regexp_extract(url, '{id_pattern}', 1), '') AS id, url \
         FROM read_csv('{}', header = false, columns = {{'url': 'VARCHAR'}})",
        links.display()
    )
}

/// LEFT join: every index row survives; unmatched rows keep a NULL url.
pub fn joined_table() -> &'static str {
    "CREATE OR REPLACE TEMP TABLE joined AS \
     SELECT i.id, i.\"WKT\", l.url \
     FROM v_index i LEFT JOIN v_links l ON i.id = l.id"
}

/// Total row count and matched-url count of the joined table.
pub fn summary() -> &'static str {
    "SELECT count(*), count(url) FROM joined"
}

pub fn export(dst: &Path) -> String {
    format!(
        "COPY joined TO '{}' (FORMAT CSV, HEADER)",
        dst.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_ids_nulls_unparseable_locations() {
        let sql = derive_ids(
            Path::new("/tmp/index.csv"),
            "location",
            Path::new("/tmp/out.csv"),
        );
        assert!(sql.contains("NULLIF"));
        assert!(sql.contains("\"location\""));
        assert!(sql.contains("read_csv('/tmp/index.csv'"));
    }

    #[test]
    fn joined_table_uses_left_join() {
        assert!(joined_table().contains("LEFT JOIN"));
    }

    #[test]
    fn links_view_is_headerless_single_column() {
        let sql = links_view(Path::new("/tmp/links.txt"), r"(\d+)\.tif");
        assert!(sql.contains("header = false"));
        assert!(sql.contains("'url': 'VARCHAR'"));
    }
}
