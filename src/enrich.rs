//! Listing enrichment: outlier removal, spatial join against census and
//! marketing zones, and merge of per-zone statistics.

use anyhow::Result;
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::info;

use crate::analyzers::{census_statistics, marketing_statistics};
use crate::config::City;
use crate::dedup::deduplicate;
use crate::fetch::ResourceSource;
use crate::frame::left_join;
use crate::geometry::{MarketingZone, ZoneLayer, points_from_columns};
use crate::loader::Loader;
use crate::outliers::remove_geo_outliers;
use crate::spatial::{joined_frame, spatial_join, zone_code_lookup};

pub const ASSET_ID: &str = "ASSETID";

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichOptions {
    /// Keep one row per ASSETID (and drop PERIOD).
    pub deduplicate_by_asset_id: bool,
    /// Merge `CUSEC_*` statistics.
    pub enrich_census_code: bool,
    /// Merge `ID_*` statistics.
    pub enrich_marketing_zones: bool,
    pub outlier_zscore: f64,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            deduplicate_by_asset_id: false,
            enrich_census_code: true,
            enrich_marketing_zones: true,
            outlier_zscore: 5.0,
        }
    }
}

/// Row counts observed while enriching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentSummary {
    pub raw_listings: usize,
    pub kept_listings: usize,
    pub joined_records: usize,
    pub matched_listings: usize,
    pub census_zones: usize,
    pub marketing_zones: usize,
}

#[derive(Debug, Clone)]
pub struct Enrichment {
    pub frame: DataFrame,
    pub summary: EnrichmentSummary,
}

pub struct Enricher<S> {
    loader: Loader<S>,
    options: EnrichOptions,
}

impl<S: ResourceSource> Enricher<S> {
    pub fn new(source: S, options: EnrichOptions) -> Self {
        Self {
            loader: Loader::new(source),
            options,
        }
    }

    /// Loads every resource for `city` and enriches its listings.
    #[tracing::instrument(skip(self), fields(city = %city))]
    pub fn enrich(&self, city: &City) -> Result<Enrichment> {
        let raw = self.loader.listings(city)?;
        let listings = prepare_listings(&raw, &self.options)?;

        let marketing = self.loader.marketing_zones(city)?;
        let census = self.loader.census_sections(city)?;

        let mut enrichment = join_and_merge(&listings, &census, &marketing, &self.options)?;
        enrichment.summary.raw_listings = raw.height();
        log_summary(&enrichment.summary);
        Ok(enrichment)
    }
}

/// Runs the enrichment on already loaded inputs.
pub fn enrich_frames(
    raw: &DataFrame,
    census: &ZoneLayer<String>,
    marketing: &ZoneLayer<MarketingZone>,
    options: &EnrichOptions,
) -> Result<Enrichment> {
    let listings = prepare_listings(raw, options)?;
    let mut enrichment = join_and_merge(&listings, census, marketing, options)?;
    enrichment.summary.raw_listings = raw.height();
    log_summary(&enrichment.summary);
    Ok(enrichment)
}

/// Outlier removal, then optional deduplication by ASSETID.
fn prepare_listings(raw: &DataFrame, options: &EnrichOptions) -> Result<DataFrame> {
    let mut listings = remove_geo_outliers(raw, options.outlier_zscore)?;

    if options.deduplicate_by_asset_id {
        listings = deduplicate(&listings, ASSET_ID)?;
        if listings.column("PERIOD").is_ok() {
            listings = listings.drop("PERIOD")?;
        }
    }

    Ok(listings)
}

fn join_and_merge(
    listings: &DataFrame,
    census: &ZoneLayer<String>,
    marketing: &ZoneLayer<MarketingZone>,
    options: &EnrichOptions,
) -> Result<Enrichment> {
    let points = points_from_columns(listings, "LONGITUDE", "LATITUDE")?;
    let matches = spatial_join(&points, census, marketing)?;
    let joined = joined_frame(&matches, &points.frame)?;
    let codes = zone_code_lookup(&joined)?;

    let mut frame = left_join(listings, &codes, &[ASSET_ID])?;

    if options.enrich_census_code {
        let stats = census_statistics(&joined)?;
        frame = left_join(&frame, &stats, &["CUSEC"])?;
    }

    if options.enrich_marketing_zones {
        let stats = marketing_statistics(&joined)?;
        frame = left_join(&frame, &stats, &["LOCATIONID", "LOCATIONNAME"])?;
    }

    let summary = EnrichmentSummary {
        raw_listings: listings.height(),
        kept_listings: listings.height(),
        joined_records: joined.height(),
        matched_listings: codes.height(),
        census_zones: census.len(),
        marketing_zones: marketing.len(),
    };

    Ok(Enrichment { frame, summary })
}

fn log_summary(summary: &EnrichmentSummary) {
    info!(
        raw_listings = summary.raw_listings,
        kept_listings = summary.kept_listings,
        joined_records = summary.joined_records,
        matched_listings = summary.matched_listings,
        census_zones = summary.census_zones,
        marketing_zones = summary.marketing_zones,
        "Enrichment complete"
    );
}
