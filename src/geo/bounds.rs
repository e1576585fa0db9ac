use serde::Serialize;

use super::record::GeotagRecord;

/// Extent of a set of located photos, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapBounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl MapBounds {
    fn of_point(lat: f64, lon: f64) -> Self {
        Self {
            min_lat: lat,
            min_lon: lon,
            max_lat: lat,
            max_lon: lon,
        }
    }

    fn extend(self, lat: f64, lon: f64) -> Self {
        Self {
            min_lat: self.min_lat.min(lat),
            min_lon: self.min_lon.min(lon),
            max_lat: self.max_lat.max(lat),
            max_lon: self.max_lon.max(lon),
        }
    }
}

/// Bounds over every record that has a location.
///
/// Returns `None` when no record is located, so an empty set is never
/// mistaken for a single point at `(0, 0)`.
pub fn calculate_bounds<'a, I>(records: I) -> Option<MapBounds>
where
    I: IntoIterator<Item = &'a GeotagRecord>,
{
    records
        .into_iter()
        .filter_map(GeotagRecord::position)
        .fold(None, |bounds, p| match bounds {
            None => Some(MapBounds::of_point(p.latitude, p.longitude)),
            Some(b) => Some(b.extend(p.latitude, p.longitude)),
        })
}
