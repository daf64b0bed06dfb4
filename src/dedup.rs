use anyhow::Result;
use polars::prelude::*;

/// Keeps the first row for each distinct value of `field`, original order
/// otherwise preserved. Missing values count as one shared key.
pub fn deduplicate(frame: &DataFrame, field: &str) -> Result<DataFrame> {
    frame.column(field)?;
    let deduped = frame
        .clone()
        .lazy()
        .unique_stable(Some(vec![field.into()]), UniqueKeepStrategy::First)
        .collect()?;
    Ok(deduped)
}
