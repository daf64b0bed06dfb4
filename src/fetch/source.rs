use anyhow::Result;

use super::Resource;
use crate::config::City;

/// Resolves a dataset resource into its raw (possibly compressed) bytes.
pub trait ResourceSource {
    fn fetch(&self, resource: Resource, city: &City) -> Result<Vec<u8>>;
}

impl<S: ResourceSource + ?Sized> ResourceSource for &S {
    fn fetch(&self, resource: Resource, city: &City) -> Result<Vec<u8>> {
        (**self).fetch(resource, city)
    }
}

impl<S: ResourceSource + ?Sized> ResourceSource for Box<S> {
    fn fetch(&self, resource: Resource, city: &City) -> Result<Vec<u8>> {
        (**self).fetch(resource, city)
    }
}
