use anyhow::{Context, Result};
use nom_exif::*;
use std::path::Path;

use super::tags::{
    GpsTags, TagValue, TAG_GPS_ALTITUDE, TAG_GPS_ALTITUDE_REF, TAG_GPS_IMG_DIRECTION,
    TAG_GPS_IMG_DIRECTION_REF, TAG_GPS_LATITUDE, TAG_GPS_LATITUDE_REF, TAG_GPS_LONGITUDE,
    TAG_GPS_LONGITUDE_REF,
};

/// Read the GPS tag group of an image file.
///
/// Returns `Ok(None)` when the file has no EXIF data or no GPS group; the
/// caller treats that as a missing geotag, not a failure.
pub fn read_gps_tags(path: &Path) -> Result<Option<GpsTags>> {
    let mut parser = MediaParser::new();
    let ms = MediaSource::file_path(path).context("Failed to open image file")?;

    let iter: ExifIter = match parser.parse(ms) {
        Ok(iter) => iter,
        Err(_) => {
            log::debug!("No EXIF data found in {}", path.display());
            return Ok(None);
        }
    };

    // GPS group first; converting into Exif consumes the iterator
    let gps_info = iter.parse_gps_info().ok().flatten();
    let exif: Exif = iter.into();

    let Some(gps) = gps_info else {
        log::debug!("No GPS group in {}", path.display());
        return Ok(None);
    };

    let mut tags = GpsTags::new();
    tags.insert(TAG_GPS_LATITUDE_REF, TagValue::Text(gps.latitude_ref.to_string()));
    tags.insert(TAG_GPS_LATITUDE, latlng_to_sequence(&gps.latitude));
    tags.insert(TAG_GPS_LONGITUDE_REF, TagValue::Text(gps.longitude_ref.to_string()));
    tags.insert(TAG_GPS_LONGITUDE, latlng_to_sequence(&gps.longitude));

    // nom-exif fills a zero denominator when the altitude tag is absent
    if gps.altitude.1 != 0 {
        tags.insert(TAG_GPS_ALTITUDE_REF, TagValue::Numeric(gps.altitude_ref as f64));
        tags.insert(TAG_GPS_ALTITUDE, urational(&gps.altitude));
    }

    // GPS sub-IFD entries are reported under IFD0
    if let Some(val) = exif.get_by_ifd_tag_code(0, TAG_GPS_IMG_DIRECTION) {
        tags.insert(TAG_GPS_IMG_DIRECTION, entry_to_tag_value(val));
    }
    if let Some(val) = exif.get_by_ifd_tag_code(0, TAG_GPS_IMG_DIRECTION_REF) {
        tags.insert(TAG_GPS_IMG_DIRECTION_REF, entry_to_tag_value(val));
    }

    Ok(Some(tags))
}

/// Read every main-image EXIF tag except the GPS group, as `(name, value)`
/// pairs in file order.
///
/// Tags nom-exif does not recognize are named `Tag0x....`. Thumbnail (IFD1)
/// entries and entries that fail to parse are skipped. A file without EXIF
/// yields an empty list.
pub fn read_exif_tags(path: &Path) -> Result<Vec<(String, TagValue)>> {
    let mut parser = MediaParser::new();
    let ms = MediaSource::file_path(path).context("Failed to open image file")?;

    let iter: ExifIter = match parser.parse(ms) {
        Ok(iter) => iter,
        Err(_) => {
            log::debug!("No EXIF data found in {}", path.display());
            return Ok(Vec::new());
        }
    };

    let mut entries = Vec::new();
    for mut entry in iter {
        if entry.ifd_index() != 0 {
            continue;
        }
        let name = match entry.tag() {
            Some(tag) => tag.to_string(),
            None => format!("Tag{:#06x}", entry.tag_code()),
        };
        if name.starts_with("GPS") {
            continue;
        }
        match entry.take_value() {
            Some(value) => entries.push((name, entry_to_tag_value(&value))),
            None => log::debug!("Unreadable {name} in {}", path.display()),
        }
    }

    Ok(entries)
}

fn urational(r: &URational) -> TagValue {
    TagValue::rational(r.0 as i64, r.1 as i64)
}

/// Convert a nom-exif LatLng (3 URationals: deg, min, sec) to a DMS sequence.
fn latlng_to_sequence(latlng: &LatLng) -> TagValue {
    TagValue::Sequence(vec![
        urational(&latlng.0),
        urational(&latlng.1),
        urational(&latlng.2),
    ])
}

/// Map a nom-exif entry onto the closed tag value model.
fn entry_to_tag_value(val: &EntryValue) -> TagValue {
    match val {
        EntryValue::URational(r) => urational(r),
        EntryValue::IRational(r) => TagValue::rational(r.0 as i64, r.1 as i64),
        EntryValue::F64(v) => TagValue::Numeric(*v),
        EntryValue::F32(v) => TagValue::Numeric(*v as f64),
        EntryValue::U8(v) => TagValue::Numeric(*v as f64),
        EntryValue::U16(v) => TagValue::Numeric(*v as f64),
        EntryValue::U32(v) => TagValue::Numeric(*v as f64),
        EntryValue::U64(v) => TagValue::Numeric(*v as f64),
        EntryValue::I8(v) => TagValue::Numeric(*v as f64),
        EntryValue::I16(v) => TagValue::Numeric(*v as f64),
        EntryValue::I32(v) => TagValue::Numeric(*v as f64),
        EntryValue::I64(v) => TagValue::Numeric(*v as f64),
        EntryValue::Text(s) => TagValue::Text(s.clone()),
        // Undefined bytes are shown as text when they decode as UTF-8
        EntryValue::Undefined(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) => TagValue::Text(s.to_string()),
            Err(_) => TagValue::Text(val.to_string()),
        },
        EntryValue::URationalArray(items) => {
            TagValue::Sequence(items.iter().map(urational).collect())
        }
        EntryValue::IRationalArray(items) => TagValue::Sequence(
            items
                .iter()
                .map(|r| TagValue::rational(r.0 as i64, r.1 as i64))
                .collect(),
        ),
        EntryValue::U8Array(items) => numbers(items),
        EntryValue::U16Array(items) => numbers(items),
        EntryValue::U32Array(items) => numbers(items),
        other => TagValue::Text(other.to_string()),
    }
}

fn numbers<T: Copy + Into<f64>>(items: &[T]) -> TagValue {
    TagValue::Sequence(items.iter().map(|v| TagValue::Numeric((*v).into())).collect())
}
