use anyhow::{Context, Result};
use tracing::debug;

use super::{Resource, ResourceSource};
use crate::config::City;

/// Fetches resources over HTTP from a mirror of the dataset.
pub struct HttpSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, resource: Resource, city: &City) -> String {
        format!("{}/{}", self.base_url, resource.path(city))
    }
}

impl ResourceSource for HttpSource {
    #[tracing::instrument(skip(self), fields(city = %city))]
    fn fetch(&self, resource: Resource, city: &City) -> Result<Vec<u8>> {
        let url = self.url(resource, city);
        debug!(url = %url, "Fetching resource");

        let resp = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("GET {url} failed"))?
            .error_for_status()
            .with_context(|| format!("GET {url} returned an error status"))?;

        let bytes = resp
            .bytes()
            .with_context(|| format!("reading body of {url}"))?;
        debug!(bytes = bytes.len(), "Resource received");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_base_and_path() {
        let source = HttpSource::new("https://example.org/data/");
        let city = City::new("barcelona").unwrap();
        assert_eq!(
            source.url(Resource::MarketingZones, &city),
            "https://example.org/data/polygons/Barcelona_polygons.csv.gz"
        );
    }
}
