use serde::Serialize;

use crate::error::ConversionError;

/// Where a photo was taken, in WGS84 decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters; negative below sea level.
    pub altitude: Option<f64>,
    /// Image direction, degrees clockwise from north in `[0, 360)`.
    pub bearing: Option<f64>,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            bearing: None,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = Some(bearing);
        self
    }
}

/// Geolocation of one processed photo.
///
/// Built once from the photo's GPS tags and read-only afterwards. A record
/// without a position stands for a photo whose geotag was missing or could
/// not be converted; exporters skip it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeotagRecord {
    name: String,
    position: Option<GeoPosition>,
}

impl GeotagRecord {
    pub fn located(name: impl Into<String>, position: GeoPosition) -> Self {
        Self {
            name: name.into(),
            position: Some(position),
        }
    }

    /// A record for a photo with no usable geotag.
    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Option<&GeoPosition> {
        self.position.as_ref()
    }

    pub fn has_location(&self) -> bool {
        self.position.is_some()
    }

    pub fn bearing(&self) -> Option<f64> {
        self.position.and_then(|p| p.bearing)
    }
}

/// A photo whose geotag could not be used, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoFailure {
    /// Position of the photo's record in [`GeotagBatch::records`].
    pub index: usize,
    pub name: String,
    pub error: ConversionError,
}

/// Result of processing a set of photos, passed explicitly to the exporters.
///
/// Every photo yields a record; failed conversions are kept as unlocated
/// records and listed in [`failures`](Self::failures).
#[derive(Debug, Clone, Default)]
pub struct GeotagBatch {
    records: Vec<GeotagRecord>,
    failures: Vec<PhotoFailure>,
}

impl GeotagBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the outcome of one photo. A failure is downgraded to an
    /// unlocated record.
    pub fn push(&mut self, name: &str, outcome: Result<GeotagRecord, ConversionError>) {
        match outcome {
            Ok(record) => self.records.push(record),
            Err(error) => {
                self.failures.push(PhotoFailure {
                    index: self.records.len(),
                    name: name.to_string(),
                    error,
                });
                self.records.push(GeotagRecord::missing(name));
            }
        }
    }

    pub fn records(&self) -> &[GeotagRecord] {
        &self.records
    }

    pub fn failures(&self) -> &[PhotoFailure] {
        &self.failures
    }

    /// Why the record at `index` has no location, if its conversion failed.
    pub fn error_at(&self, index: usize) -> Option<&ConversionError> {
        self.failures
            .binary_search_by_key(&index, |f| f.index)
            .ok()
            .map(|i| &self.failures[i].error)
    }

    /// Every record paired with its conversion error, in input order.
    /// Names need not be unique, so the pairing is positional.
    pub fn outcomes(&self) -> impl Iterator<Item = (&GeotagRecord, Option<&ConversionError>)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| (record, self.error_at(i)))
    }

    pub fn located(&self) -> impl Iterator<Item = &GeotagRecord> {
        self.records.iter().filter(|r| r.has_location())
    }

    pub fn located_count(&self) -> usize {
        self.located().count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
