//! # photo-geotag
//!
//! Turn the GPS tags of geotagged photos into map exports: a KML document with
//! one pin per photo plus a camera direction line, and a zipped ESRI shapefile
//! set with a point layer and a direction line layer.
//!
//! ## Quick Start
//!
//! The pipeline module handles the full read → convert → batch flow:
//!
//! ```rust,no_run
//! use photo_geotag::export::{create_kml, create_shapefile_archive};
//! use photo_geotag::geo::calculate_bounds;
//! use photo_geotag::pipeline::{collect_images, process_images};
//! use std::path::PathBuf;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Collect supported image files from paths (files or directories)
//!     let images = collect_images(&[PathBuf::from("./photos")]);
//!
//!     // One record per photo; photos without a usable geotag stay unlocated
//!     let batch = process_images(&images);
//!     println!("{} of {} photos located", batch.located_count(), batch.len());
//!
//!     if let Some(bounds) = calculate_bounds(batch.records()) {
//!         println!("Extent: {bounds:?}");
//!     }
//!
//!     std::fs::write("Photo_Locations.kml", create_kml(batch.records(), 50.0)?)?;
//!     std::fs::write("Photo_Locations.zip", create_shapefile_archive(batch.records(), 50.0)?)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Lower-Level Usage
//!
//! GPS tags can come from any EXIF parser. Build the tag map yourself and
//! convert it:
//!
//! ```rust
//! use photo_geotag::exif::{
//!     GpsTags, TagValue, TAG_GPS_IMG_DIRECTION, TAG_GPS_LATITUDE, TAG_GPS_LATITUDE_REF,
//!     TAG_GPS_LONGITUDE, TAG_GPS_LONGITUDE_REF,
//! };
//! use photo_geotag::geo::{destination, extract_geotag};
//!
//! let dms = |d: i64, m: i64, s: i64| {
//!     TagValue::Sequence(vec![
//!         TagValue::rational(d, 1),
//!         TagValue::rational(m, 1),
//!         TagValue::rational(s, 1),
//!     ])
//! };
//!
//! let mut gps = GpsTags::new();
//! gps.insert(TAG_GPS_LATITUDE_REF, TagValue::Text("S".into()));
//! gps.insert(TAG_GPS_LATITUDE, dms(33, 0, 0));
//! gps.insert(TAG_GPS_LONGITUDE_REF, TagValue::Text("E".into()));
//! gps.insert(TAG_GPS_LONGITUDE, dms(146, 30, 0));
//! gps.insert(TAG_GPS_IMG_DIRECTION, TagValue::rational(90, 1));
//!
//! let record = extract_geotag("IMG_1.jpg", Some(&gps)).unwrap();
//! let position = record.position().unwrap();
//! assert_eq!((position.latitude, position.longitude), (-33.0, 146.5));
//!
//! // Where the camera was pointing, 100 m out
//! let end = destination(position.latitude, position.longitude, 90.0, 100.0);
//! assert!(end.longitude > 146.5);
//! ```
//!
//! ## Exports
//!
//! | Export | Contents |
//! |--------|----------|
//! | KML (`create_kml`) | `photoStyle` / `directionStyle`, a point placemark per located photo, a `LineString` per photo with a bearing |
//! | Shapefile ZIP (`create_shapefile_archive`) | `photos.shp/.shx/.dbf/.prj`, plus `photo_directions.*` when any bearing exists |
//!
//! ## Modules
//!
//! - [`config`] — Configuration types and loading/saving
//! - [`error`] — Conversion and export error kinds
//! - [`exif`] — GPS tag model, display formatting and the image reader
//! - [`geo`] — DMS conversion, destination points, bounds, geotag records
//! - [`export`] — KML and shapefile archive exporters
//! - [`pipeline`] — Image collection and batch processing

pub mod config;
pub mod error;
pub mod exif;
pub mod export;
pub mod geo;
pub mod pipeline;
