use serde::Serialize;

use super::tags::TagValue;

const BASIC_INFO_TAGS: &[&str] = &["Make", "Model", "Software", "DateTime", "DateTimeOriginal"];
const CAMERA_SETTINGS_TAGS: &[&str] = &[
    "ExposureTime",
    "FNumber",
    "ISOSpeedRatings",
    "FocalLength",
    "ExposureMode",
    "WhiteBalance",
    "MeteringMode",
];
// nom-exif names tag 0x0101 `ImageHeight`; EXIF calls it `ImageLength`
const IMAGE_DETAILS_TAGS: &[&str] = &[
    "ImageWidth",
    "ImageLength",
    "ImageHeight",
    "XResolution",
    "YResolution",
    "Orientation",
    "ColorSpace",
];

/// Display section of an EXIF tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExifSection {
    BasicInfo,
    CameraSettings,
    GpsInformation,
    ImageDetails,
    Other,
}

impl ExifSection {
    /// Sections in display order.
    pub const ALL: [ExifSection; 5] = [
        Self::BasicInfo,
        Self::CameraSettings,
        Self::GpsInformation,
        Self::ImageDetails,
        Self::Other,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::BasicInfo => "Basic Info",
            Self::CameraSettings => "Camera Settings",
            Self::GpsInformation => "GPS Information",
            Self::ImageDetails => "Image Details",
            Self::Other => "Other",
        }
    }

    /// Section of a non-GPS EXIF tag.
    pub fn of_tag(name: &str) -> Self {
        if BASIC_INFO_TAGS.contains(&name) {
            Self::BasicInfo
        } else if CAMERA_SETTINGS_TAGS.contains(&name) {
            Self::CameraSettings
        } else if IMAGE_DETAILS_TAGS.contains(&name) {
            Self::ImageDetails
        } else {
            Self::Other
        }
    }
}

/// One non-empty section of the grouped EXIF view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExifGroup {
    pub section: ExifSection,
    pub items: Vec<(String, TagValue)>,
}

/// Group EXIF tags for display.
///
/// `exif` holds the main-image tags; the `GPSInfo` pointer is dropped.
/// `gps` holds the entries of the GPS Information section as given (raw GPS
/// tags, derived decimal coordinates). Items keep their input order, and
/// sections without items are left out.
///
/// ```rust
/// use photo_geotag::exif::{organize_exif_info, ExifSection, TagValue};
///
/// let exif = vec![
///     ("Make".to_string(), TagValue::Text("Canon".into())),
///     ("FNumber".to_string(), TagValue::rational(28, 10)),
/// ];
/// let groups = organize_exif_info(exif, Vec::new());
/// let sections: Vec<_> = groups.iter().map(|g| g.section).collect();
/// assert_eq!(sections, [ExifSection::BasicInfo, ExifSection::CameraSettings]);
/// ```
pub fn organize_exif_info<E, G>(exif: E, gps: G) -> Vec<ExifGroup>
where
    E: IntoIterator<Item = (String, TagValue)>,
    G: IntoIterator<Item = (String, TagValue)>,
{
    let mut groups: Vec<ExifGroup> = ExifSection::ALL
        .iter()
        .map(|&section| ExifGroup {
            section,
            items: Vec::new(),
        })
        .collect();

    for (name, value) in exif {
        if name == "GPSInfo" {
            continue;
        }
        let section = ExifSection::of_tag(&name);
        groups[section as usize].items.push((name, value));
    }
    groups[ExifSection::GpsInformation as usize]
        .items
        .extend(gps);

    groups.retain(|g| !g.items.is_empty());
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif::format_tag_key;

    fn entry(name: &str, value: TagValue) -> (String, TagValue) {
        (name.to_string(), value)
    }

    fn sections(groups: &[ExifGroup]) -> Vec<ExifSection> {
        groups.iter().map(|g| g.section).collect()
    }

    #[test]
    fn tags_land_in_their_sections() {
        let exif = vec![
            entry("Orientation", TagValue::Numeric(1.0)),
            entry("Make", TagValue::Text("Canon".into())),
            entry("ISOSpeedRatings", TagValue::Numeric(200.0)),
            entry("LensModel", TagValue::Text("EF 50mm".into())),
            entry("DateTimeOriginal", TagValue::Text("2024:05:01 10:00:00".into())),
            entry("ImageHeight", TagValue::Numeric(3000.0)),
        ];
        let groups = organize_exif_info(exif, Vec::new());

        assert_eq!(
            sections(&groups),
            vec![
                ExifSection::BasicInfo,
                ExifSection::CameraSettings,
                ExifSection::ImageDetails,
                ExifSection::Other,
            ]
        );
        let basic: Vec<&str> = groups[0].items.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(basic, vec!["Make", "DateTimeOriginal"]);
        let details: Vec<&str> = groups[2].items.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(details, vec!["Orientation", "ImageHeight"]);
        assert_eq!(groups[3].items[0].0, "LensModel");
    }

    #[test]
    fn gps_pointer_is_dropped_and_gps_entries_kept() {
        let exif = vec![entry("GPSInfo", TagValue::Numeric(44.0))];
        let gps = vec![
            entry("GPSLatitudeRef", TagValue::Text("S".into())),
            entry("Latitude", TagValue::Text("-33.000000".into())),
        ];
        let groups = organize_exif_info(exif, gps);

        assert_eq!(sections(&groups), vec![ExifSection::GpsInformation]);
        assert_eq!(groups[0].items.len(), 2);
        assert_eq!(groups[0].section.title(), "GPS Information");
    }

    #[test]
    fn nothing_to_show_gives_no_groups() {
        assert!(organize_exif_info(Vec::new(), Vec::new()).is_empty());
    }

    #[test]
    fn section_labels_are_readable() {
        let exif = vec![
            entry("FNumber", TagValue::rational(28, 10)),
            entry("ISOSpeedRatings", TagValue::Numeric(100.0)),
        ];
        let groups = organize_exif_info(exif, Vec::new());
        let labels: Vec<String> = groups[0]
            .items
            .iter()
            .map(|(name, value)| format!("{}: {value}", format_tag_key(name)))
            .collect();
        assert_eq!(labels, vec!["F-Number: 2.8", "ISO Speed Ratings: 100"]);
    }
}
