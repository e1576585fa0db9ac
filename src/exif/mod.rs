//! EXIF tag model, its grouped display, and the image file reader that fills it.
//!
//! - [`read_gps_tags`] — Read the GPS tag group of an image with nom-exif
//! - [`read_exif_tags`] — Read the other main-image EXIF tags
//! - [`organize_exif_info`] — Group tags into display sections
//! - [`GpsTags`] / [`TagValue`] — Tag ID → raw value mapping handed to the converter
//! - [`format_tag_key`] — Readable labels for EXIF tag names

mod groups;
mod reader;
mod tags;

pub use groups::{organize_exif_info, ExifGroup, ExifSection};
pub use reader::{read_exif_tags, read_gps_tags};
pub use tags::{
    format_tag_key, gps_tag_name, GpsTags, TagValue, TAG_GPS_ALTITUDE, TAG_GPS_ALTITUDE_REF,
    TAG_GPS_IMG_DIRECTION, TAG_GPS_IMG_DIRECTION_REF, TAG_GPS_LATITUDE, TAG_GPS_LATITUDE_REF,
    TAG_GPS_LONGITUDE, TAG_GPS_LONGITUDE_REF,
};
