//! Geographic outlier removal.

use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

use crate::frame::f64_column;

/// Threshold used when the caller has no preference.
pub const DEFAULT_OUTLIER_ZSCORE: f64 = 3.0;

/// Accepted interval `median ± zscore * std` for one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBounds {
    pub low: f64,
    pub high: f64,
}

impl AxisBounds {
    /// Bounds for `values`; `None` when the column has no center or spread.
    /// The center is the median while the spread is the sample standard
    /// deviation.
    pub fn from_values(values: &Float64Chunked, zscore: f64) -> Option<Self> {
        let center = values.median()?;
        let spread = values.std(1)?;
        Some(Self {
            low: center - zscore * spread,
            high: center + zscore * spread,
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Keeps rows whose LATITUDE and LONGITUDE both fall inside their axis
/// bounds. Rows with a missing coordinate never pass.
pub fn remove_geo_outliers(frame: &DataFrame, zscore: f64) -> Result<DataFrame> {
    let lat = f64_column(frame, "LATITUDE")?;
    let lon = f64_column(frame, "LONGITUDE")?;

    let lat_bounds = AxisBounds::from_values(&lat, zscore);
    let lon_bounds = AxisBounds::from_values(&lon, zscore);
    debug!(?lat_bounds, ?lon_bounds, zscore, "Outlier bounds");

    let within = |bounds: Option<AxisBounds>, value: Option<f64>| match (bounds, value) {
        (Some(b), Some(v)) => b.contains(v),
        _ => false,
    };

    let mask: BooleanChunked = lat
        .into_iter()
        .zip(&lon)
        .map(|(y, x)| within(lat_bounds, y) && within(lon_bounds, x))
        .collect();

    let kept = frame.filter(&mask)?;
    debug!(
        before = frame.height(),
        after = kept.height(),
        "Geographic outliers removed"
    );
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{f64_values, str_values};
    use polars::df;

    fn cluster_with_outlier() -> DataFrame {
        let mut ids: Vec<String> = (0..20).map(|i| format!("A{i}")).collect();
        let mut lat: Vec<f64> = (0..20).map(|i| 40.40 + (i % 5) as f64 * 0.001).collect();
        let mut lon: Vec<f64> = (0..20).map(|i| -3.70 - (i % 5) as f64 * 0.001).collect();
        ids.push("FAR".into());
        lat.push(28.1);
        lon.push(-15.4);

        df!("ASSETID" => ids, "LATITUDE" => lat, "LONGITUDE" => lon).unwrap()
    }

    #[test]
    fn test_far_listing_is_removed() {
        let kept = remove_geo_outliers(&cluster_with_outlier(), DEFAULT_OUTLIER_ZSCORE).unwrap();

        assert_eq!(kept.height(), 20);
        assert!(!str_values(&kept, "ASSETID")
            .unwrap()
            .contains(&Some("FAR".to_string())));
    }

    #[test]
    fn test_kept_rows_are_within_bounds() {
        let frame = cluster_with_outlier();
        let zscore = 1.0;
        let lat_bounds =
            AxisBounds::from_values(&f64_column(&frame, "LATITUDE").unwrap(), zscore).unwrap();
        let lon_bounds =
            AxisBounds::from_values(&f64_column(&frame, "LONGITUDE").unwrap(), zscore).unwrap();

        let kept = remove_geo_outliers(&frame, zscore).unwrap();
        assert!(kept.height() > 0);
        for v in f64_values(&kept, "LATITUDE").unwrap().into_iter().flatten() {
            assert!(lat_bounds.contains(v));
        }
        for v in f64_values(&kept, "LONGITUDE").unwrap().into_iter().flatten() {
            assert!(lon_bounds.contains(v));
        }
    }

    #[test]
    fn test_missing_coordinates_are_dropped() {
        let frame = df!(
            "ASSETID" => ["A1", "A2", "A3"],
            "LATITUDE" => [Some("40.40"), Some("40.41"), None],
            "LONGITUDE" => ["-3.70", "-3.71", "-3.70"]
        )
        .unwrap();

        let kept = remove_geo_outliers(&frame, 5.0).unwrap();
        assert_eq!(
            str_values(&kept, "ASSETID").unwrap(),
            vec![Some("A1".to_string()), Some("A2".to_string())]
        );
    }

    #[test]
    fn test_single_row_has_no_spread() {
        let frame = df!("LATITUDE" => [40.4], "LONGITUDE" => [-3.7]).unwrap();
        assert_eq!(remove_geo_outliers(&frame, 5.0).unwrap().height(), 0);
    }

    #[test]
    fn test_missing_coordinate_column_fails() {
        let frame = df!("LATITUDE" => [40.4]).unwrap();
        assert!(remove_geo_outliers(&frame, 3.0).is_err());
    }
}
