use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::run_record_path;
use crate::services::artifact_registry::{
    METADATA_FILE, Artifact, ArtifactKind, ArtifactMetadata, ArtifactRegistry, RunRecord,
    sort_by_version,
};

/// Registry stored in a local directory.
pub struct LocalRegistry {
    root: PathBuf,
}

impl LocalRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn kind_dir(&self, project: &str, kind: ArtifactKind) -> PathBuf {
        self.root.join(project).join(kind.as_str())
    }
}

/// Sorted names of the subdirectories of `dir`; a missing directory is empty.
fn subdirectories(dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

fn read_metadata(dir: &Path) -> Result<ArtifactMetadata> {
    let path = dir.join(METADATA_FILE);
    if !path.exists() {
        return Ok(ArtifactMetadata::default());
    }
    let content =
        fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

#[async_trait]
impl ArtifactRegistry for LocalRegistry {
    async fn list_collections(&self, project: &str, kind: ArtifactKind) -> Result<Vec<String>> {
        subdirectories(&self.kind_dir(project, kind))
    }

    async fn list_artifacts(
        &self,
        project: &str,
        kind: ArtifactKind,
        collection: &str,
    ) -> Result<Vec<Artifact>> {
        let collection_dir = self.kind_dir(project, kind).join(collection);

        let mut artifacts = subdirectories(&collection_dir)?
            .into_iter()
            .map(|version| {
                let metadata = read_metadata(&collection_dir.join(&version))?;
                Ok(Artifact {
                    project: project.to_string(),
                    kind,
                    collection: collection.to_string(),
                    version,
                    metadata,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        sort_by_version(&mut artifacts);
        Ok(artifacts)
    }

    async fn download(&self, artifact: &Artifact, dest: &Path) -> Result<PathBuf> {
        let source = self.root.join(artifact.storage_path());
        let target = artifact.download_dir(dest);
        fs::create_dir_all(&target).with_context(|| format!("creating {}", target.display()))?;

        let mut copied = 0;
        let entries =
            fs::read_dir(&source).with_context(|| format!("listing {}", source.display()))?;
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            fs::copy(entry.path(), target.join(entry.file_name()))
                .with_context(|| format!("copying {}", entry.path().display()))?;
            copied += 1;
        }

        debug!(
            artifact = %artifact.name(),
            files = copied,
            target = %target.display(),
            "Artifact downloaded"
        );
        Ok(target)
    }

    async fn record_run(&self, run: &RunRecord) -> Result<()> {
        let path = self.root.join(run_record_path(&run.project, &run.run_id));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_vec_pretty(run)?)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}
