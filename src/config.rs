//! Runtime configuration: the city being processed and where data and
//! artifacts live.

use anyhow::{Result, bail};
use std::fmt;
use std::path::PathBuf;

/// Public mirror of the idealista18 dataset.
pub const DEFAULT_BASE_URL: &str =
    "https://raw.githubusercontent.com/davidreyblanco/ml-training/master/data/idealista18/data";

/// A city name in the capitalized form used by the dataset file names
/// (`Madrid`, `Barcelona`, `Valencia`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct City(String);

impl City {
    /// Normalizes `name` to first letter upper-case, rest lower-case.
    pub fn new(name: &str) -> Result<Self> {
        let name = name.trim();
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            bail!("city name must not be empty");
        };

        let capitalized: String = first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect();

        Ok(Self(capitalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where dataset resources are resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    /// Remote mirror, resources addressed relative to `base_url`.
    Http { base_url: String },
    /// Local copy with the same directory layout as the mirror.
    Local { root: PathBuf },
}

impl SourceConfig {
    /// Picks a local directory when given, otherwise `IDEALISTA18_BASE_URL`
    /// or the public mirror.
    pub fn from_env(data_dir: Option<PathBuf>) -> Self {
        match data_dir {
            Some(root) => SourceConfig::Local { root },
            None => SourceConfig::Http {
                base_url: std::env::var("IDEALISTA18_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            },
        }
    }
}

/// Where artifacts (models, dataset splits) are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryConfig {
    S3 { bucket: String },
    Local { root: PathBuf },
}

impl RegistryConfig {
    /// Uses `registry_dir` when given, otherwise requires `ARTIFACT_BUCKET`.
    pub fn from_env(registry_dir: Option<PathBuf>) -> Result<Self> {
        if let Some(root) = registry_dir {
            return Ok(RegistryConfig::Local { root });
        }

        match std::env::var("ARTIFACT_BUCKET") {
            Ok(bucket) if !bucket.is_empty() => Ok(RegistryConfig::S3 { bucket }),
            _ => bail!("ARTIFACT_BUCKET must be set when no registry directory is given"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_is_capitalized() {
        assert_eq!(City::new("madrid").unwrap().as_str(), "Madrid");
        assert_eq!(City::new("BARCELONA").unwrap().as_str(), "Barcelona");
        assert_eq!(City::new("  vAlEnCiA ").unwrap().as_str(), "Valencia");
    }

    #[test]
    fn test_city_rejects_empty_name() {
        assert!(City::new("").is_err());
        assert!(City::new("   ").is_err());
    }

    #[test]
    fn test_local_source_wins_over_env() {
        let config = SourceConfig::from_env(Some(PathBuf::from("/tmp/data")));
        assert_eq!(
            config,
            SourceConfig::Local {
                root: PathBuf::from("/tmp/data")
            }
        );
    }

    #[test]
    fn test_registry_dir_wins_over_bucket() {
        let config = RegistryConfig::from_env(Some(PathBuf::from("/tmp/registry"))).unwrap();
        assert_eq!(
            config,
            RegistryConfig::Local {
                root: PathBuf::from("/tmp/registry")
            }
        );
    }
}
