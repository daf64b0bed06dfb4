use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::{Resource, ResourceSource};
use crate::config::City;

/// Reads resources from a local directory laid out like the remote mirror.
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, resource: Resource, city: &City) -> PathBuf {
        self.root.join(resource.path(city))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceSource for LocalSource {
    fn fetch(&self, resource: Resource, city: &City) -> Result<Vec<u8>> {
        let path = self.path(resource, city);
        std::fs::read(&path).with_context(|| format!("reading {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_file_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let city = City::new("Madrid").unwrap();
        let source = LocalSource::new(dir.path());

        let path = source.path(Resource::Listings, &city);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"ASSETID\nA1\n").unwrap();

        assert_eq!(
            source.fetch(Resource::Listings, &city).unwrap(),
            b"ASSETID\nA1\n"
        );
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let city = City::new("Madrid").unwrap();
        let source = LocalSource::new(dir.path());

        let err = source.fetch(Resource::CensusSections, &city).unwrap_err();
        assert!(err.to_string().contains("ine-censal-polygon-boundaries-2011-Madrid"));
    }
}
