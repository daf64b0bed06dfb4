//! Typed loading of the per-city dataset files.

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use tracing::info;

use crate::config::City;
use crate::fetch::{Resource, ResourceSource, fetch_bytes};
use crate::frame::str_values;
use crate::geometry::{MarketingZone, PointLayer, ZoneLayer, points_from_columns, zones_from_frame};
use crate::parser::parse_delimited;

/// Field delimiter used by every dataset file.
pub const DATASET_DELIMITER: u8 = b';';

pub struct Loader<S> {
    source: S,
}

impl<S: ResourceSource> Loader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetches and parses `resource` without building any geometry.
    #[tracing::instrument(skip(self), fields(city = %city))]
    pub fn frame(&self, resource: Resource, city: &City) -> Result<DataFrame> {
        let bytes = fetch_bytes(&self.source, resource, city)?;
        let frame = parse_delimited(&bytes, DATASET_DELIMITER)
            .with_context(|| format!("parsing {}", resource.path(city)))?;
        info!(
            rows = frame.height(),
            columns = frame.width(),
            "Resource loaded"
        );
        Ok(frame)
    }

    /// Raw listings table.
    pub fn listings(&self, city: &City) -> Result<DataFrame> {
        self.frame(Resource::Listings, city)
    }

    /// Marketing-zone polygons keyed by (LOCATIONID, LOCATIONNAME).
    pub fn marketing_zones(&self, city: &City) -> Result<ZoneLayer<MarketingZone>> {
        let frame = self.frame(Resource::MarketingZones, city)?;
        marketing_zones_from_frame(&frame)
    }

    /// Census-section polygons keyed by CUSEC.
    pub fn census_sections(&self, city: &City) -> Result<ZoneLayer<String>> {
        let frame = self.frame(Resource::CensusSections, city)?;
        census_sections_from_frame(&frame)
    }

    /// Points of interest with geometry built from LNG/LAT.
    pub fn points_of_interest(&self, city: &City) -> Result<PointLayer> {
        let frame = self.frame(Resource::PointsOfInterest, city)?;
        points_from_columns(&frame, "LNG", "LAT")
    }
}

/// Zones with a missing LOCATIONID or LOCATIONNAME are kept unkeyed.
pub fn marketing_zones_from_frame(frame: &DataFrame) -> Result<ZoneLayer<MarketingZone>> {
    let keys = str_values(frame, "LOCATIONID")?
        .into_iter()
        .zip(str_values(frame, "LOCATIONNAME")?)
        .map(|(id, name)| match (id, name) {
            (Some(location_id), Some(location_name)) => Some(MarketingZone {
                location_id,
                location_name,
            }),
            _ => None,
        })
        .collect();
    zones_from_frame(frame, keys)
}

pub fn census_sections_from_frame(frame: &DataFrame) -> Result<ZoneLayer<String>> {
    zones_from_frame(frame, str_values(frame, "CUSEC")?)
}
