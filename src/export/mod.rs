//! Geospatial exports of a set of geotag records.
//!
//! - [`create_kml`] — KML document with photo placemarks and direction lines
//! - [`create_shapefile_archive`] — Zipped `photos` point layer plus an optional
//!   `photo_directions` line layer, each with a WGS84 `.prj`
//!
//! Both take the direction line length in meters, [`DEFAULT_LINE_LENGTH_M`]
//! unless configured otherwise.

mod archive;
mod kml;
pub mod shapefile;

pub use archive::{
    build_layers, create_shapefile_archive, write_shapefiles, DIRECTION_LAYER, POINT_LAYER,
    WGS84_PRJ,
};
pub use kml::{create_kml, write_kml, KML_NAMESPACE};

/// Default length of a photo direction line, in meters.
pub const DEFAULT_LINE_LENGTH_M: f64 = 50.0;
