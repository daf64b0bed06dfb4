//! Artifact registry backends.
//!
//! [`LocalRegistry`] reads a directory tree, [`S3Registry`] a bucket. Both
//! use the layout `{project}/{kind}/{collection}/{version}/` with a
//! `metadata.json` beside the artifact files, and keep run records under
//! `{project}/runs/`.

mod local;
mod s3;

pub use local::LocalRegistry;
pub use s3::S3Registry;

use anyhow::{Result, bail};
use std::path::{Component, Path};

use crate::config::RegistryConfig;
use crate::services::artifact_registry::ArtifactRegistry;

/// Builds the registry described by `config`, loading AWS settings from the
/// environment for S3.
pub async fn registry_from_config(config: &RegistryConfig) -> Box<dyn ArtifactRegistry> {
    match config {
        RegistryConfig::Local { root } => Box::new(LocalRegistry::new(root.clone())),
        RegistryConfig::S3 { bucket } => {
            let aws = aws_config::load_from_env().await;
            Box::new(S3Registry::new(aws_sdk_s3::Client::new(&aws), bucket))
        }
    }
}

/// Key of a run record relative to the registry root.
pub(crate) fn run_record_path(project: &str, run_id: &str) -> String {
    format!("{project}/runs/{run_id}.json")
}

/// `relative` as a path that stays below the download directory.
pub(crate) fn contained_path(relative: &str) -> Result<&Path> {
    let path = Path::new(relative);
    let escapes = path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes {
        bail!("object path '{relative}' leaves the artifact directory");
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_object_paths_are_kept() {
        assert_eq!(
            contained_path("features/X_train.csv.gz").unwrap(),
            Path::new("features/X_train.csv.gz")
        );
        assert!(contained_path("./model.json").is_ok());
    }

    #[test]
    fn test_escaping_object_paths_are_rejected() {
        assert!(contained_path("../model.json").is_err());
        assert!(contained_path("weights/../../etc/passwd").is_err());
        assert!(contained_path("/etc/passwd").is_err());
    }

    #[test]
    fn test_run_record_path() {
        assert_eq!(run_record_path("prices", "r1"), "prices/runs/r1.json");
    }
}
