//! The dataset definitions: URLs, layer names, SQL selections, and
//! artifact paths for every dataset the pipeline can materialize.
//!
//! Everything here is declarative; `pipeline::materialize` interprets it.
//! Artifacts live under `raw/` (acquired sources), `external/`
//! (pre-supplied sources), `interim/` (extracted but unclean) and
//! `processed/` (final cleaned form).

use crate::descriptor::{DatasetSpec, StageKind, StageSpec};

/// All cleaned layers are delivered in UTM zone 15N.
pub const TARGET_SRS: &str = "EPSG:26915";

/// MN county boundaries, from the state geospatial commons.
pub static BOUNDARIES: DatasetSpec = DatasetSpec {
    name: "boundaries",
    stages: &[
        StageSpec {
            id: "downloaded",
            rel_path: "raw/gpkg_bdry_counties_in_minnesota.zip",
            kind: StageKind::Acquire {
                url: "https://resources.gisdata.mn.gov/pub/gdrs/data/pub/us_mn_state_dnr/bdry_counties_in_minnesota/gpkg_bdry_counties_in_minnesota.zip",
            },
        },
        StageSpec {
            id: "extracted",
            rel_path: "interim/county_boundaries.gpkg",
            kind: StageKind::ExtractLayer {
                input: "downloaded",
                archive_member: Some("bdry_counties_in_minnesota.gpkg"),
                layer: "mn_county_boundaries_multipart",
            },
        },
        StageSpec {
            id: "cleaned",
            rel_path: "processed/county_boundaries.gpkg",
            kind: StageKind::ProjectSql {
                input: "extracted",
                sql: "SELECT COUNTYNAME AS name, Shape AS geom FROM mn_county_boundaries_multipart",
                output_layer: "counties",
                target_srs: TARGET_SRS,
            },
        },
    ],
};

/// HUC-12 watershed polygons from the NHDPlus HR distribution for the
/// project's vector processing unit.
pub static WATERSHEDS: DatasetSpec = DatasetSpec {
    name: "watersheds",
    stages: &[
        StageSpec {
            id: "downloaded",
            rel_path: "raw/NHDPLUS_H_0704_HU4_GPKG.zip",
            kind: StageKind::Acquire {
                url: "https://prd-tnm.s3.amazonaws.com/StagedProducts/Hydrography/NHDPlusHR/VPU/Current/GPKG/NHDPLUS_H_0704_HU4_GPKG.zip",
            },
        },
        StageSpec {
            id: "extracted",
            rel_path: "interim/huc_12_watersheds.gpkg",
            kind: StageKind::ExtractLayer {
                input: "downloaded",
                archive_member: Some("NHDPLUS_H_0704_HU4_GPKG.gpkg"),
                layer: "WBDHU12",
            },
        },
        StageSpec {
            id: "cleaned",
            rel_path: "processed/huc_12_watersheds.gpkg",
            kind: StageKind::ProjectSql {
                input: "extracted",
                // DISTINCT is attribute+geometry-wise: two features are
                // duplicates only when every selected field and the
                // geometry agree.
                sql: "SELECT DISTINCT HUC12 AS huc12, Name AS name, Shape AS geom FROM WBDHU12",
                output_layer: "watersheds",
                target_srs: TARGET_SRS,
            },
        },
    ],
};

/// Goodhue County culvert lines, supplied as a zipped shapefile by the
/// county rather than downloaded.
pub static CULVERTS: DatasetSpec = DatasetSpec {
    name: "culverts",
    stages: &[
        StageSpec {
            id: "source",
            rel_path: "external/source_goodhue_culvert_lines.shp.zip",
            kind: StageKind::Source,
        },
        StageSpec {
            id: "extracted",
            rel_path: "interim/culverts.gpkg",
            kind: StageKind::ExtractLayer {
                input: "source",
                archive_member: None,
                layer: "GoodhueCountyCulvertLines",
            },
        },
        StageSpec {
            id: "cleaned",
            rel_path: "processed/culverts.gpkg",
            kind: StageKind::ProjectSql {
                input: "extracted",
                sql: "SELECT fid, geom FROM GoodhueCountyCulvertLines",
                output_layer: "culverts",
                target_srs: TARGET_SRS,
            },
        },
    ],
};

/// Index of the OPR DEM tiles covering the LiDAR project, joined to the
/// per-tile download URLs published alongside it.
pub static DEM_INDEX: DatasetSpec = DatasetSpec {
    name: "dem-index",
    stages: &[
        StageSpec {
            id: "links",
            rel_path: "raw/opr_download_links.txt",
            kind: StageKind::Acquire {
                url: "https://prd-tnm.s3.amazonaws.com/StagedProducts/Elevation/OPR/Projects/MN_GoodhueCounty_2020_A20/MN_GoodhueCo_1_2020/0_file_download_links.txt",
            },
        },
        StageSpec {
            id: "downloaded",
            rel_path: "raw/opr_index.gpkg",
            kind: StageKind::Acquire {
                url: "https://prd-tnm.s3.amazonaws.com/StagedProducts/Elevation/metadata/MN_GoodhueCounty_2020_A20/MN_GoodhueCo_1_2020/spatial_metadata/USGS/opr_index.gpkg",
            },
        },
        StageSpec {
            id: "cleaned",
            rel_path: "interim/dem_index.csv",
            kind: StageKind::DeriveIds {
                input: "downloaded",
                location_field: "location",
                target_srs: TARGET_SRS,
            },
        },
        StageSpec {
            id: "joined",
            rel_path: "processed/dem_index.gpkg",
            kind: StageKind::JoinLinks {
                index: "cleaned",
                links: "links",
                id_pattern: r"(\d+)\.tif",
                output_layer: "dem_index",
                srs: TARGET_SRS,
            },
        },
    ],
};

/// Registry of every dataset, in the order the CLI lists them.
pub static ALL: &[&DatasetSpec] = &[&BOUNDARIES, &WATERSHEDS, &CULVERTS, &DEM_INDEX];

pub fn find(name: &str) -> Option<&'static DatasetSpec> {
    ALL.iter().find(|ds| ds.name == name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::validate_registry;

    #[test]
    fn registry_is_well_formed_and_paths_are_disjoint() {
        validate_registry(ALL).unwrap();
    }

    #[test]
    fn find_by_name() {
        assert_eq!(find("dem-index").unwrap().name, "dem-index");
        assert!(find("unknown").is_none());
    }

    #[test]
    fn watersheds_clean_deduplicates() {
        let stage = WATERSHEDS.stage("cleaned").unwrap();
        match stage.kind {
            crate::descriptor::StageKind::ProjectSql { sql, .. } => {
                assert!(sql.starts_with("SELECT DISTINCT"));
            }
            _ => panic!("watersheds clean stage must be a SQL projection"),
        }
    }

    #[test]
    fn purge_preserves_both_dem_index_downloads() {
        let preserved: Vec<_> = DEM_INDEX
            .stages
            .iter()
            .filter(|s| s.kind.is_input())
            .map(|s| s.id)
            .collect();
        assert_eq!(preserved, vec!["links", "downloaded"]);
    }
}
