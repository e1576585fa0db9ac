//! Geotag model and the geodetic math behind it.
//!
//! - [`extract_geotag`] — GPS tag group → [`GeotagRecord`]
//! - [`destination`] — Great-circle destination point
//! - [`calculate_bounds`] — Extent of the located records

mod bounds;
mod convert;
mod geodesy;
mod record;

pub use bounds::{calculate_bounds, MapBounds};
pub use convert::{convert_to_decimal, dms_to_decimal, extract_geotag, Hemisphere};
pub use geodesy::{destination, DestinationPoint, EARTH_RADIUS_M};
pub use record::{GeoPosition, GeotagBatch, GeotagRecord, PhotoFailure};
