//! Point and polygon layers built from tabular columns.

use anyhow::{Context, Result, anyhow, bail};
use geo::{BoundingRect, Geometry, Intersects, MultiPolygon, Point, Rect};
use polars::prelude::DataFrame;
use rstar::RTree;
use rstar::primitives::{GeomWithData, Rectangle};
use tracing::warn;
use wkt::TryFromWkt;

use crate::frame::{f64_values, str_values};

/// Coordinate reference system attached to a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Crs {
    /// WGS 84 longitude/latitude.
    #[default]
    Epsg4326,
}

impl Crs {
    pub fn code(&self) -> &'static str {
        match self {
            Crs::Epsg4326 => "EPSG:4326",
        }
    }
}

/// Rows of a frame paired with one point each. Rows whose coordinates are
/// missing carry `None`.
#[derive(Debug, Clone)]
pub struct PointLayer {
    pub frame: DataFrame,
    pub points: Vec<Option<Point<f64>>>,
    pub crs: Crs,
}

impl PointLayer {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Builds a point per row from `lon_col`/`lat_col` and drops both columns
/// from the attached frame.
pub fn points_from_columns(frame: &DataFrame, lon_col: &str, lat_col: &str) -> Result<PointLayer> {
    let lon = f64_values(frame, lon_col)?;
    let lat = f64_values(frame, lat_col)?;

    let points = lon
        .iter()
        .zip(&lat)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(Point::new(*x, *y)),
            _ => None,
        })
        .collect();

    Ok(PointLayer {
        frame: frame.drop(lon_col)?.drop(lat_col)?,
        points,
        crs: Crs::Epsg4326,
    })
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "POINT",
        Geometry::Line(_) | Geometry::LineString(_) => "LINESTRING",
        Geometry::Polygon(_) => "POLYGON",
        Geometry::MultiPoint(_) => "MULTIPOINT",
        Geometry::MultiLineString(_) => "MULTILINESTRING",
        Geometry::MultiPolygon(_) => "MULTIPOLYGON",
        Geometry::GeometryCollection(_) => "GEOMETRYCOLLECTION",
        Geometry::Rect(_) => "RECT",
        Geometry::Triangle(_) => "TRIANGLE",
    }
}

/// Parses a POLYGON or MULTIPOLYGON well-known-text string.
pub fn polygon_from_wkt(text: &str) -> Result<MultiPolygon<f64>> {
    let geometry = Geometry::<f64>::try_from_wkt_str(text.trim())
        .map_err(|e| anyhow!("invalid WKT: {e}"))?;

    match geometry {
        Geometry::Polygon(polygon) => Ok(MultiPolygon::new(vec![polygon])),
        Geometry::MultiPolygon(multi) => Ok(multi),
        other => bail!(
            "expected POLYGON or MULTIPOLYGON, found {}",
            geometry_kind(&other)
        ),
    }
}

/// Identifier of a marketing zone.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarketingZone {
    pub location_id: String,
    pub location_name: String,
}

/// A polygon with its grouping key. Zones whose key is missing still take
/// part in spatial matching but carry no code.
#[derive(Debug, Clone)]
pub struct Zone<K> {
    pub key: Option<K>,
    pub geometry: MultiPolygon<f64>,
    bbox: Option<Rect<f64>>,
}

impl<K> Zone<K> {
    pub fn new(key: Option<K>, geometry: MultiPolygon<f64>) -> Self {
        let bbox = geometry.bounding_rect();
        Self {
            key,
            geometry,
            bbox,
        }
    }

    /// `true` if `point` is inside the polygon or on its boundary.
    pub fn intersects(&self, point: &Point<f64>) -> bool {
        match self.bbox {
            Some(rect) if rect.intersects(&point.0) => self.geometry.intersects(&point.0),
            _ => false,
        }
    }
}

type ZoneEnvelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Zones of one kind with an R-tree over their bounding boxes.
#[derive(Debug, Clone)]
pub struct ZoneLayer<K> {
    zones: Vec<Zone<K>>,
    index: RTree<ZoneEnvelope>,
    pub crs: Crs,
}

impl<K> ZoneLayer<K> {
    pub fn new(zones: Vec<Zone<K>>, crs: Crs) -> Self {
        let envelopes = zones
            .iter()
            .enumerate()
            .filter_map(|(i, zone)| {
                zone.bbox.map(|rect| {
                    let (min, max) = (rect.min(), rect.max());
                    GeomWithData::new(Rectangle::from_corners([min.x, min.y], [max.x, max.y]), i)
                })
            })
            .collect();

        Self {
            zones,
            index: RTree::bulk_load(envelopes),
            crs,
        }
    }

    pub fn zones(&self) -> &[Zone<K>] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Zones intersecting `point`, in layer order.
    pub fn containing(&self, point: &Point<f64>) -> Vec<&Zone<K>> {
        let mut candidates: Vec<usize> = self
            .index
            .locate_all_at_point(&[point.x(), point.y()])
            .map(|envelope| envelope.data)
            .collect();
        candidates.sort_unstable();

        candidates
            .into_iter()
            .map(|i| &self.zones[i])
            .filter(|zone| zone.intersects(point))
            .collect()
    }
}

/// Converts the `WKT` column of `frame` into zones, pairing row `i` with
/// `keys[i]`.
pub fn zones_from_frame<K>(frame: &DataFrame, keys: Vec<Option<K>>) -> Result<ZoneLayer<K>> {
    let wkt = str_values(frame, "WKT")?;
    if wkt.len() != keys.len() {
        bail!("{} zone keys for {} polygons", keys.len(), wkt.len());
    }

    let unkeyed = keys.iter().filter(|k| k.is_none()).count();
    if unkeyed > 0 {
        warn!(unkeyed, "Zones without a key never contribute a code");
    }

    let zones = wkt
        .into_iter()
        .zip(keys)
        .enumerate()
        .map(|(row, (text, key))| {
            let text = text
                .ok_or_else(|| anyhow!("missing WKT"))
                .with_context(|| format!("zone row {row}"))?;
            let geometry = polygon_from_wkt(&text).with_context(|| format!("zone row {row}"))?;
            Ok(Zone::new(key, geometry))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ZoneLayer::new(zones, Crs::Epsg4326))
}
