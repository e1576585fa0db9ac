use crate::error::ConversionError;
use crate::exif::{
    GpsTags, TagValue, TAG_GPS_ALTITUDE, TAG_GPS_ALTITUDE_REF, TAG_GPS_IMG_DIRECTION,
    TAG_GPS_LATITUDE, TAG_GPS_LATITUDE_REF, TAG_GPS_LONGITUDE, TAG_GPS_LONGITUDE_REF,
};

use super::record::{GeoPosition, GeotagRecord};

/// Hemisphere reference of a GPS coordinate (`N`, `S`, `E`, `W`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    pub fn from_ref(reference: &str) -> Option<Self> {
        match reference {
            "N" | "n" => Some(Self::North),
            "S" | "s" => Some(Self::South),
            "E" | "e" => Some(Self::East),
            "W" | "w" => Some(Self::West),
            _ => None,
        }
    }

    fn sign(self) -> f64 {
        match self {
            Self::North | Self::East => 1.0,
            Self::South | Self::West => -1.0,
        }
    }
}

/// Convert degrees/minutes/seconds to signed decimal degrees.
///
/// No range clamping: out-of-range input gives out-of-range output.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, hemisphere: Hemisphere) -> f64 {
    (degrees + minutes / 60.0 + seconds / 3600.0) * hemisphere.sign()
}

/// Convert a raw DMS triple and its reference tag to decimal degrees.
pub fn convert_to_decimal(
    dms: &TagValue,
    reference: &TagValue,
    tag: &'static str,
) -> Result<f64, ConversionError> {
    let parts = dms
        .as_sequence()
        .ok_or_else(|| ConversionError::malformed(tag, format!("expected a DMS triple, got {dms}")))?;
    if parts.len() != 3 {
        return Err(ConversionError::malformed(
            tag,
            format!("expected 3 components, got {}", parts.len()),
        ));
    }

    let mut dms_values = [0.0; 3];
    for (slot, part) in dms_values.iter_mut().zip(parts) {
        *slot = part
            .as_f64()
            .ok_or_else(|| ConversionError::malformed(tag, format!("non-numeric component {part}")))?;
    }

    let hemisphere = reference
        .as_text()
        .and_then(Hemisphere::from_ref)
        .ok_or_else(|| ConversionError::malformed(tag, format!("invalid reference {reference}")))?;

    let [degrees, minutes, seconds] = dms_values;
    Ok(dms_to_decimal(degrees, minutes, seconds, hemisphere))
}

/// Build the geotag record of one photo from its GPS tag group.
///
/// Latitude, longitude and their references are mandatory. Altitude and
/// image direction are read independently: when unreadable they are left
/// out and the position is still returned.
pub fn extract_geotag(name: &str, gps: Option<&GpsTags>) -> Result<GeotagRecord, ConversionError> {
    let gps = match gps {
        Some(gps) if !gps.is_empty() => gps,
        _ => return Err(ConversionError::MissingGeotag),
    };

    let lat = required(gps, TAG_GPS_LATITUDE, "GPSLatitude")?;
    let lat_ref = required(gps, TAG_GPS_LATITUDE_REF, "GPSLatitudeRef")?;
    let lon = required(gps, TAG_GPS_LONGITUDE, "GPSLongitude")?;
    let lon_ref = required(gps, TAG_GPS_LONGITUDE_REF, "GPSLongitudeRef")?;

    let latitude = convert_to_decimal(lat, lat_ref, "GPSLatitude")?;
    let longitude = convert_to_decimal(lon, lon_ref, "GPSLongitude")?;
    let mut position = GeoPosition::new(latitude, longitude);

    if let Some(altitude) = extract_altitude(name, gps) {
        position = position.with_altitude(altitude);
    }
    if let Some(bearing) = extract_bearing(name, gps) {
        position = position.with_bearing(bearing);
    }

    log::debug!("{name}: {latitude}, {longitude}");
    Ok(GeotagRecord::located(name, position))
}

fn required<'a>(
    gps: &'a GpsTags,
    tag: u16,
    label: &'static str,
) -> Result<&'a TagValue, ConversionError> {
    gps.get(tag)
        .ok_or_else(|| ConversionError::malformed(label, "tag not present"))
}

/// Altitude in meters; a reference of 1 means below sea level.
fn extract_altitude(name: &str, gps: &GpsTags) -> Option<f64> {
    let raw = gps.get(TAG_GPS_ALTITUDE)?;
    let Some(magnitude) = raw.as_f64().filter(|v| v.is_finite()) else {
        log::debug!("{name}: ignoring unreadable GPSAltitude {raw}");
        return None;
    };
    let below_sea_level = gps
        .get(TAG_GPS_ALTITUDE_REF)
        .and_then(TagValue::as_f64)
        .is_some_and(|r| r == 1.0);
    Some(if below_sea_level { -magnitude } else { magnitude })
}

fn extract_bearing(name: &str, gps: &GpsTags) -> Option<f64> {
    let raw = gps.get(TAG_GPS_IMG_DIRECTION)?;
    match raw.as_f64().filter(|v| v.is_finite()) {
        Some(bearing) => Some(normalize_bearing(bearing)),
        None => {
            log::debug!("{name}: ignoring unreadable GPSImgDirection {raw}");
            None
        }
    }
}

/// Reduce a finite bearing into `[0, 360)`. `rem_euclid` rounds tiny
/// negative inputs up to exactly 360.
fn normalize_bearing(bearing: f64) -> f64 {
    let reduced = bearing.rem_euclid(360.0);
    if reduced >= 360.0 { 0.0 } else { reduced }
}
