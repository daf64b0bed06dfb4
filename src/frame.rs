//! Column access and joins over polars frames.

use anyhow::{Context, Result, bail};
use polars::prelude::*;

const ROW_INDEX: &str = "__row";

/// Names of the columns of `frame`, in order.
pub fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// `name` cast to Float64. Text that is not a number is an error.
pub fn f64_column(frame: &DataFrame, name: &str) -> Result<Float64Chunked> {
    let series = frame
        .column(name)?
        .as_materialized_series()
        .strict_cast(&DataType::Float64)
        .with_context(|| format!("column '{name}' is not numeric"))?;
    Ok(series.f64()?.clone())
}

/// Values of `name` as floats, nulls kept.
pub fn f64_values(frame: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    Ok(f64_column(frame, name)?.into_iter().collect())
}

/// Values of `name` as text, nulls kept.
pub fn str_values(frame: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = frame
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// The only column of a single-column frame.
pub fn squeeze(frame: &DataFrame) -> Result<Series> {
    if frame.width() != 1 {
        bail!(
            "expected a single column to squeeze, found {}",
            frame.width()
        );
    }
    Ok(frame.get_columns()[0].as_materialized_series().clone())
}

/// Left join on `on`, keeping every row of `left` in its original order.
/// Null keys never match.
pub fn left_join(left: &DataFrame, right: &DataFrame, on: &[&str]) -> Result<DataFrame> {
    let keys: Vec<Expr> = on.iter().map(|c| col(*c)).collect();
    let joined = left
        .clone()
        .lazy()
        .with_row_index(ROW_INDEX, None)
        .join(
            right.clone().lazy(),
            keys.clone(),
            keys,
            JoinArgs::new(JoinType::Left),
        )
        .sort([ROW_INDEX], Default::default())
        .collect()
        .with_context(|| format!("left join on {on:?}"))?;
    Ok(joined.drop(ROW_INDEX)?)
}
