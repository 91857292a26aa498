//! Artifact path resolution.

use std::path::{Path, PathBuf};

use crate::descriptor::StageSpec;

/// Maps (dataset, stage) artifacts to concrete paths under one root.
///
/// Resolution is pure: the path is a function of the stage's fixed
/// relative path and the configured root. Nothing is checked against the
/// filesystem and no directories are created here — stage execution owns
/// that.
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, stage: &StageSpec) -> PathBuf {
        self.root.join(stage.rel_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::StageKind;

    #[test]
    fn resolve_joins_root_and_relative_path() {
        let store = DataStore::new("/data");
        let stage = StageSpec {
            id: "downloaded",
            rel_path: "raw/source.zip",
            kind: StageKind::Acquire {
                url: "https://example.com/source.zip",
            },
        };
        assert_eq!(store.resolve(&stage), PathBuf::from("/data/raw/source.zip"));
    }
}
