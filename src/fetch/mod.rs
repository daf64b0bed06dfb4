mod http;
mod local;
mod resource;
mod source;

pub use http::HttpSource;
pub use local::LocalSource;
pub use resource::Resource;
pub use source::ResourceSource;

use crate::config::{City, SourceConfig};
use anyhow::Result;

/// Builds the source described by `config`.
pub fn source_from_config(config: &SourceConfig) -> Box<dyn ResourceSource + Send> {
    match config {
        SourceConfig::Http { base_url } => Box::new(HttpSource::new(base_url)),
        SourceConfig::Local { root } => Box::new(LocalSource::new(root.clone())),
    }
}

/// Fetches `resource` for `city` from `source`.
pub fn fetch_bytes<S: ResourceSource>(
    source: &S,
    resource: Resource,
    city: &City,
) -> Result<Vec<u8>> {
    source.fetch(resource, city)
}
