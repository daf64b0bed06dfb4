use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::debug;

use crate::analyzers::types::ZoneKind;

/// Groups `joined` (one row per spatial match, with PRICE and UNITPRICE) by
/// the keys of `kind` and summarizes each group.
///
/// Records whose zone has a missing key are left out. Groups appear in
/// order of first occurrence.
pub fn zone_statistics(joined: &DataFrame, kind: ZoneKind) -> Result<DataFrame> {
    let keys = kind.key_columns();
    let names = kind.stat_column_names();

    let keyed = keys
        .iter()
        .map(|k| col(*k).is_not_null())
        .reduce(|acc, e| acc.and(e))
        .unwrap_or(lit(true));

    let price = || col("PRICE");
    let unit_price = || col("UNITPRICE");
    let aggregations = [
        price().median(),
        price().mean(),
        price().std(1),
        unit_price().median(),
        unit_price().mean(),
        unit_price().count(),
        unit_price().std(1),
    ]
    .into_iter()
    .zip(names)
    .map(|(expr, name)| expr.alias(name))
    .collect::<Vec<_>>();

    let stats = joined
        .clone()
        .lazy()
        .filter(keyed)
        .group_by_stable(keys.iter().map(|k| col(*k)).collect::<Vec<_>>())
        .agg(aggregations)
        .collect()
        .with_context(|| format!("aggregating {} statistics", kind.prefix()))?;

    debug!(kind = ?kind, zones = stats.height(), "Zone statistics computed");
    Ok(stats)
}

/// Statistics per census section over every joined record.
pub fn census_statistics(joined: &DataFrame) -> Result<DataFrame> {
    zone_statistics(joined, ZoneKind::Census)
}

/// Statistics per marketing zone over every joined record.
pub fn marketing_statistics(joined: &DataFrame) -> Result<DataFrame> {
    zone_statistics(joined, ZoneKind::Marketing)
}
