use crate::config::City;

/// The dataset files published per city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Sale listings for 2018.
    Listings,
    /// Marketing-zone polygons (LOCATIONID, LOCATIONNAME, WKT).
    MarketingZones,
    /// 2011 census-section polygons (CUSEC, WKT).
    CensusSections,
    /// OpenStreetMap points of interest (LAT, LNG).
    PointsOfInterest,
}

impl Resource {
    /// Path of the resource relative to the dataset root.
    pub fn path(&self, city: &City) -> String {
        match self {
            Resource::Listings => format!("assets/es_home_sale_{city}_2018.csv.gz"),
            Resource::MarketingZones => format!("polygons/{city}_polygons.csv.gz"),
            Resource::CensusSections => {
                format!("ine/ine-censal-polygon-boundaries-2011-{city}.csv.gz")
            }
            Resource::PointsOfInterest => format!("osm/osm-pois-{city}.csv.gz"),
        }
    }
}
