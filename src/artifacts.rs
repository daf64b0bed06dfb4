//! Retrieval of trained models and dataset splits from an artifact registry.

use anyhow::{Context, Result, bail};
use polars::prelude::{DataFrame, Series};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::frame::squeeze;
use crate::parser::parse_inferred;
use crate::services::artifact_registry::{ArtifactKind, ArtifactRegistry, METADATA_FILE, RunRecord};

/// Fixed file names of a dataset split artifact.
pub const X_TRAIN_FILE: &str = "X_train.csv.gz";
pub const X_TEST_FILE: &str = "X_test.csv.gz";
pub const Y_TRAIN_FILE: &str = "y_train.csv.gz";
pub const Y_TEST_FILE: &str = "y_test.csv.gz";

/// Train/test features and labels.
#[derive(Debug, Clone)]
pub struct DatasetSplits {
    pub x_train: DataFrame,
    pub x_test: DataFrame,
    pub y_train: DataFrame,
    pub y_test: DataFrame,
}

impl DatasetSplits {
    /// The single label column of `y_train`.
    pub fn y_train_values(&self) -> Result<Series> {
        squeeze(&self.y_train)
    }

    pub fn y_test_values(&self) -> Result<Series> {
        squeeze(&self.y_test)
    }
}

/// First payload file of a downloaded artifact, by name.
fn first_payload_file(dir: &Path) -> Result<PathBuf> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_file() && entry.file_name() != METADATA_FILE {
            files.push(entry.path());
        }
    }
    files.sort();
    match files.into_iter().next() {
        Some(file) => Ok(file),
        None => bail!("artifact directory {} holds no files", dir.display()),
    }
}

/// Finds the first model artifact tagged `tag` and deserializes its file.
///
/// Collections are scanned in listing order and versions lowest first.
/// Returns `Ok(None)` when no artifact carries the tag.
#[tracing::instrument(skip(registry, dest))]
pub async fn get_model<M, R>(
    registry: &R,
    project: &str,
    tag: &str,
    dest: &Path,
) -> Result<Option<M>>
where
    M: DeserializeOwned,
    R: ArtifactRegistry + ?Sized,
{
    for collection in registry.list_collections(project, ArtifactKind::Model).await? {
        debug!(collection = %collection, "Scanning collection");

        for artifact in registry
            .list_artifacts(project, ArtifactKind::Model, &collection)
            .await?
        {
            debug!(artifact = %artifact.name(), tags = ?artifact.metadata.tags, "Artifact");
            if !artifact.has_tag(tag) {
                continue;
            }

            let dir = registry.download(&artifact, dest).await?;
            let file = first_payload_file(&dir)?;
            let bytes = fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let model = serde_json::from_slice(&bytes)
                .with_context(|| format!("deserializing model {}", file.display()))?;

            info!(artifact = %artifact.name(), file = %file.display(), "Model found");
            return Ok(Some(model));
        }
    }

    info!("No model artifact carries the tag");
    Ok(None)
}

fn load_split(dir: &Path, file: &str) -> Result<DataFrame> {
    let path = dir.join(file);
    let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    parse_inferred(&bytes, b',').with_context(|| format!("parsing {}", path.display()))
}

/// Downloads the dataset artifact `artifact_name` (`collection[:alias]`)
/// and loads its four split files. The retrieval is recorded as a run.
#[tracing::instrument(skip(registry, dest))]
pub async fn get_dataset<R>(
    registry: &R,
    project: &str,
    artifact_name: &str,
    dest: &Path,
) -> Result<DatasetSplits>
where
    R: ArtifactRegistry + ?Sized,
{
    let mut run = RunRecord::start(project);

    let artifact = registry
        .resolve(project, ArtifactKind::Dataset, artifact_name)
        .await?;
    let dir = registry.download(&artifact, dest).await?;
    run.used_artifacts.push(artifact.name());

    let splits = DatasetSplits {
        x_train: load_split(&dir, X_TRAIN_FILE)?,
        x_test: load_split(&dir, X_TEST_FILE)?,
        y_train: load_split(&dir, Y_TRAIN_FILE)?,
        y_test: load_split(&dir, Y_TEST_FILE)?,
    };

    debug!(
        x_train_rows = splits.x_train.height(),
        x_train_columns = splits.x_train.width(),
        x_test_rows = splits.x_test.height(),
        y_train_rows = splits.y_train.height(),
        y_test_rows = splits.y_test.height(),
        "Loaded dataset splits"
    );

    run.finish();
    registry.record_run(&run).await?;
    info!(run_id = %run.run_id, artifact = %artifact.name(), "Dataset retrieved");

    Ok(splits)
}
