use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{contained_path, run_record_path};
use crate::services::artifact_registry::{
    METADATA_FILE, Artifact, ArtifactKind, ArtifactMetadata, ArtifactRegistry, RunRecord,
    sort_by_version,
};

/// Registry stored in an S3 bucket.
///
/// Credentials and region come from the ambient AWS configuration loaded by
/// `aws_config::load_from_env`.
pub struct S3Registry {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Registry {
    pub fn new(client: aws_sdk_s3::Client, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }

    /// Immediate child "directories" of `prefix` (which must end in `/`).
    async fn child_prefixes(&self, prefix: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .delimiter("/")
                .set_continuation_token(token.clone())
                .send()
                .await
                .with_context(|| format!("listing s3://{}/{prefix}", self.bucket))?;

            for common in resp.common_prefixes() {
                if let Some(name) = common
                    .prefix()
                    .and_then(|p| p.strip_prefix(prefix))
                    .map(|p| p.trim_end_matches('/'))
                    .filter(|p| !p.is_empty())
                {
                    names.push(name.to_string());
                }
            }

            match resp.next_continuation_token() {
                Some(next) if resp.is_truncated() == Some(true) => token = Some(next.to_string()),
                _ => break,
            }
        }

        names.sort();
        Ok(names)
    }

    /// Every object key below `prefix`.
    async fn object_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(token.clone())
                .send()
                .await
                .with_context(|| format!("listing s3://{}/{prefix}", self.bucket))?;

            keys.extend(
                resp.contents()
                    .iter()
                    .filter_map(|o| o.key())
                    .map(str::to_string),
            );

            match resp.next_continuation_token() {
                Some(next) if resp.is_truncated() == Some(true) => token = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(keys)
    }

    /// Object body, or `None` if the key does not exist.
    async fn get_object(&self, key: &str) -> Result<Option<Bytes>> {
        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_no_such_key()) => {
                return Ok(None);
            }
            Err(err) => {
                return Err(err).with_context(|| format!("GetObject s3://{}/{key}", self.bucket));
            }
        };

        let body = resp
            .body
            .collect()
            .await
            .with_context(|| format!("reading s3://{}/{key}", self.bucket))?;
        Ok(Some(body.into_bytes()))
    }

    async fn read_metadata(&self, prefix: &str) -> Result<ArtifactMetadata> {
        let key = format!("{prefix}{METADATA_FILE}");
        match self.get_object(&key).await? {
            Some(body) => serde_json::from_slice(&body)
                .with_context(|| format!("parsing s3://{}/{key}", self.bucket)),
            None => Ok(ArtifactMetadata::default()),
        }
    }
}

#[async_trait]
impl ArtifactRegistry for S3Registry {
    async fn list_collections(&self, project: &str, kind: ArtifactKind) -> Result<Vec<String>> {
        self.child_prefixes(&format!("{project}/{kind}/")).await
    }

    async fn list_artifacts(
        &self,
        project: &str,
        kind: ArtifactKind,
        collection: &str,
    ) -> Result<Vec<Artifact>> {
        let collection_prefix = format!("{project}/{kind}/{collection}/");

        let mut artifacts = Vec::new();
        for version in self.child_prefixes(&collection_prefix).await? {
            let metadata = self
                .read_metadata(&format!("{collection_prefix}{version}/"))
                .await?;
            artifacts.push(Artifact {
                project: project.to_string(),
                kind,
                collection: collection.to_string(),
                version,
                metadata,
            });
        }

        sort_by_version(&mut artifacts);
        Ok(artifacts)
    }

    #[tracing::instrument(
        skip(self, artifact),
        fields(artifact = %artifact.name(), bucket = %self.bucket)
    )]
    async fn download(&self, artifact: &Artifact, dest: &Path) -> Result<PathBuf> {
        let prefix = format!("{}/", artifact.storage_path());
        let target = artifact.download_dir(dest);
        std::fs::create_dir_all(&target)
            .with_context(|| format!("creating {}", target.display()))?;

        let mut download_count = 0;
        for key in self.object_keys(&prefix).await? {
            let Some(relative) = key.strip_prefix(&prefix).filter(|r| !r.is_empty()) else {
                continue;
            };
            let Some(body) = self.get_object(&key).await? else {
                continue;
            };

            let path = target.join(contained_path(relative)?);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &body)
                .with_context(|| format!("writing {}", path.display()))?;
            debug!(key = %key, bytes = body.len(), "Object downloaded");
            download_count += 1;
        }

        info!(download_count, target = %target.display(), "S3 download complete");
        Ok(target)
    }

    async fn record_run(&self, run: &RunRecord) -> Result<()> {
        let body = serde_json::to_vec(run)?;
        let key = run_record_path(&run.project, &run.run_id);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type("application/json")
            .send()
            .await
            .with_context(|| format!("PutObject s3://{}/{key}", self.bucket))?;

        Ok(())
    }
}
