//! Spatial join of listing points against census and marketing zones.

use anyhow::{Result, bail};
use polars::prelude::*;
use tracing::debug;

use crate::dedup::deduplicate;
use crate::frame::{f64_values, str_values};
use crate::geometry::{MarketingZone, PointLayer, ZoneLayer};

/// Columns of the zone-code lookup.
pub const CODE_COLUMNS: [&str; 4] = ["ASSETID", "LOCATIONID", "LOCATIONNAME", "CUSEC"];

/// One (listing, census section, marketing zone) match. Codes are missing
/// when the matched polygon has no key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedListing {
    /// Row of the listing in the point layer.
    pub row: usize,
    pub cusec: Option<String>,
    pub zone: Option<MarketingZone>,
}

/// Inner join of `points` with both zone layers.
///
/// A listing yields one record per census section and marketing zone pair
/// it falls in, so overlapping polygons produce several records. Listings
/// outside either layer, or without coordinates, yield none.
pub fn spatial_join(
    points: &PointLayer,
    census: &ZoneLayer<String>,
    marketing: &ZoneLayer<MarketingZone>,
) -> Result<Vec<JoinedListing>> {
    if points.crs != census.crs || points.crs != marketing.crs {
        bail!(
            "layers use different coordinate systems: {}, {}, {}",
            points.crs.code(),
            census.crs.code(),
            marketing.crs.code()
        );
    }

    let mut joined = Vec::new();
    for (row, point) in points.points.iter().enumerate() {
        let Some(point) = point else {
            continue;
        };

        let zones = marketing.containing(point);
        if zones.is_empty() {
            continue;
        }

        for section in census.containing(point) {
            for zone in &zones {
                joined.push(JoinedListing {
                    row,
                    cusec: section.key.clone(),
                    zone: zone.key.clone(),
                });
            }
        }
    }

    debug!(
        listings = points.len(),
        records = joined.len(),
        "Spatial join complete"
    );
    Ok(joined)
}

/// One row per joined record: the zone codes plus the listing's ASSETID,
/// PRICE and UNITPRICE.
pub fn joined_frame(joined: &[JoinedListing], listings: &DataFrame) -> Result<DataFrame> {
    let asset_ids = str_values(listings, "ASSETID")?;
    let prices = f64_values(listings, "PRICE")?;
    let unit_prices = f64_values(listings, "UNITPRICE")?;

    let mut ids = Vec::with_capacity(joined.len());
    let mut location_ids = Vec::with_capacity(joined.len());
    let mut location_names = Vec::with_capacity(joined.len());
    let mut cusecs = Vec::with_capacity(joined.len());
    let mut price = Vec::with_capacity(joined.len());
    let mut unit_price = Vec::with_capacity(joined.len());

    for j in joined {
        ids.push(asset_ids[j.row].clone());
        location_ids.push(j.zone.as_ref().map(|z| z.location_id.clone()));
        location_names.push(j.zone.as_ref().map(|z| z.location_name.clone()));
        cusecs.push(j.cusec.clone());
        price.push(prices[j.row]);
        unit_price.push(unit_prices[j.row]);
    }

    let frame = DataFrame::new(vec![
        Series::new("ASSETID".into(), ids).into(),
        Series::new("LOCATIONID".into(), location_ids).into(),
        Series::new("LOCATIONNAME".into(), location_names).into(),
        Series::new("CUSEC".into(), cusecs).into(),
        Series::new("PRICE".into(), price).into(),
        Series::new("UNITPRICE".into(), unit_price).into(),
    ])?;
    Ok(frame)
}

/// One row per ASSETID with its zone codes (ASSETID, LOCATIONID,
/// LOCATIONNAME, CUSEC). The first joined record of a listing wins.
pub fn zone_code_lookup(joined: &DataFrame) -> Result<DataFrame> {
    let codes = joined.select(CODE_COLUMNS)?;
    deduplicate(&codes, "ASSETID")
}
