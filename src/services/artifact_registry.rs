//! Trait and types for interacting with an artifact registry.

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// File holding an artifact's metadata next to its payload.
pub const METADATA_FILE: &str = "metadata.json";

/// What an artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Model,
    Dataset,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Model => "model",
            ArtifactKind::Dataset => "dataset",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contents of `metadata.json`. Unknown keys are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One version of an artifact collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub project: String,
    pub kind: ArtifactKind,
    pub collection: String,
    pub version: String,
    pub metadata: ArtifactMetadata,
}

impl Artifact {
    /// `collection:version`.
    pub fn name(&self) -> String {
        format!("{}:{}", self.collection, self.version)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.metadata.tags.iter().any(|t| t == tag)
    }

    /// Storage path relative to the registry root:
    /// `{project}/{kind}/{collection}/{version}`.
    pub fn storage_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.project, self.kind, self.collection, self.version
        )
    }

    /// Where a download of this artifact lands under `dest`.
    pub fn download_dir(&self, dest: &Path) -> PathBuf {
        dest.join(&self.collection).join(&self.version)
    }
}

/// Numeric part of a `vN` version label.
pub fn version_number(version: &str) -> Option<u64> {
    version.strip_prefix('v')?.parse().ok()
}

/// Orders artifacts by version number; labels that are not `vN` sort last
/// by name.
pub fn sort_by_version(artifacts: &mut [Artifact]) {
    artifacts.sort_by(|a, b| {
        match (version_number(&a.version), version_number(&b.version)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.version.cmp(&b.version),
        }
    });
}

/// Picks the artifact named by `alias` out of a version-ordered list.
/// `None` or `latest` selects the highest version.
pub fn select_version(artifacts: Vec<Artifact>, alias: Option<&str>) -> Result<Artifact> {
    match alias {
        None | Some("latest") => artifacts
            .into_iter()
            .last()
            .ok_or_else(|| anyhow!("collection has no versions")),
        Some(version) => artifacts
            .into_iter()
            .find(|a| a.version == version)
            .ok_or_else(|| anyhow!("version '{version}' not found")),
    }
}

/// Splits `collection:alias` into its parts.
pub fn parse_artifact_name(name: &str) -> Result<(&str, Option<&str>)> {
    let (collection, alias) = match name.split_once(':') {
        Some((collection, alias)) => (collection, Some(alias)),
        None => (name, None),
    };
    if collection.is_empty() || alias == Some("") {
        bail!("invalid artifact name '{name}'");
    }
    Ok((collection, alias))
}

/// A record of which artifacts a retrieval used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub project: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub used_artifacts: Vec<String>,
}

impl RunRecord {
    pub fn start(project: &str) -> Self {
        let started_at = Utc::now();
        Self {
            run_id: format!("run-{}", started_at.format("%Y%m%d-%H%M%S-%3f")),
            project: project.to_string(),
            started_at,
            finished_at: None,
            used_artifacts: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

/// Abstraction over an artifact store (bucket, directory, ...).
#[async_trait::async_trait]
pub trait ArtifactRegistry: Send + Sync {
    /// Names of the collections of `kind` in `project`.
    async fn list_collections(&self, project: &str, kind: ArtifactKind) -> Result<Vec<String>>;

    /// Versions of `collection`, lowest first.
    async fn list_artifacts(
        &self,
        project: &str,
        kind: ArtifactKind,
        collection: &str,
    ) -> Result<Vec<Artifact>>;

    /// Copies the artifact's files under `dest` and returns the directory
    /// holding them.
    async fn download(&self, artifact: &Artifact, dest: &Path) -> Result<PathBuf>;

    /// Persists a run record.
    async fn record_run(&self, run: &RunRecord) -> Result<()>;

    /// Resolves `collection[:alias]` to one artifact.
    async fn resolve(&self, project: &str, kind: ArtifactKind, name: &str) -> Result<Artifact> {
        let (collection, alias) = parse_artifact_name(name)?;
        let artifacts = self.list_artifacts(project, kind, collection).await?;
        select_version(artifacts, alias)
            .map_err(|e| anyhow!("resolving {kind} artifact '{name}' in '{project}': {e}"))
    }
}
