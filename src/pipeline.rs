use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::ConversionError;
use crate::exif::{self, organize_exif_info, ExifGroup, GpsTags, TagValue};
use crate::geo::{calculate_bounds, extract_geotag, GeotagBatch, GeotagRecord};

/// Supported image extensions (formats nom-exif can read EXIF from).
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "tif", "tiff", "heic", "heif", "png", "webp"];

/// Pre-parsed GPS tags of one photo, as produced by an external EXIF parser.
///
/// A JSON dump of these can be processed instead of image files:
///
/// ```json
/// [
///   { "name": "IMG_1.jpg", "gps": { "1": "S", "2": [33, 0, 0], "3": "E", "4": [146, 30, 0], "17": 90.0 } },
///   { "name": "IMG_2.jpg" }
/// ]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedPhoto {
    pub name: String,
    #[serde(default)]
    pub gps: Option<GpsTags>,
}

/// Collect supported image files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// recursively (following symlinks).
///
/// # Example
///
/// ```rust,no_run
/// use photo_geotag::pipeline::collect_images;
/// use std::path::PathBuf;
///
/// let images = collect_images(&[
///     PathBuf::from("photo.jpg"),       // single file
///     PathBuf::from("./photos/"),        // entire directory
/// ]);
/// println!("Found {} images", images.len());
/// ```
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_supported_image(path) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if p.is_file() && is_supported_image(p) {
                    images.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// Check if a file has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Record name of an image: its file name.
pub fn photo_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Turn one photo's GPS tags into a geotag record, logging why it failed.
pub fn process_photo(name: &str, gps: Option<&GpsTags>) -> Result<GeotagRecord, ConversionError> {
    let outcome = extract_geotag(name, gps);
    match &outcome {
        Ok(_) => log::debug!("  {name}: located"),
        Err(ConversionError::MissingGeotag) => log::info!("  {name}: no geotag"),
        Err(e) => log::warn!("  {name}: {e}"),
    }
    outcome
}

/// Process `(name, tags)` pairs into a batch. One bad photo never stops the
/// others; failures become unlocated records.
pub fn build_batch<I>(photos: I) -> GeotagBatch
where
    I: IntoIterator<Item = (String, Option<GpsTags>)>,
{
    let mut batch = GeotagBatch::new();
    for (name, gps) in photos {
        let outcome = process_photo(&name, gps.as_ref());
        batch.push(&name, outcome);
    }
    batch
}

/// Read GPS tags of one image. A file whose EXIF cannot be read counts as
/// having no geotag.
pub fn read_tags_lossy(path: &Path) -> Option<GpsTags> {
    match exif::read_gps_tags(path) {
        Ok(tags) => tags,
        Err(e) => {
            log::warn!("Failed to read EXIF from {}: {e:#}", path.display());
            None
        }
    }
}

/// Read and process image files into a batch.
pub fn process_images(paths: &[PathBuf]) -> GeotagBatch {
    let total = paths.len();
    build_batch(paths.iter().enumerate().map(|(i, path)| {
        log::info!("[{}/{}] Processing: {}", i + 1, total, path.display());
        (photo_name(path), read_tags_lossy(path))
    }))
}

/// Process pre-parsed tag dumps into a batch.
pub fn process_tagged(photos: Vec<TaggedPhoto>) -> GeotagBatch {
    build_batch(photos.into_iter().map(|p| (p.name, p.gps)))
}

/// Load a JSON array of [`TaggedPhoto`].
pub fn load_tag_dump(path: &Path) -> Result<Vec<TaggedPhoto>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tag file {}", path.display()))?;
    let photos: Vec<TaggedPhoto> =
        serde_json::from_str(&contents).context("Failed to parse tag file")?;
    Ok(photos)
}

/// Grouped EXIF view of one photo: its main-image tags plus a GPS section
/// with the raw GPS tags and, when they convert, the decimal coordinates.
pub fn exif_groups(
    name: &str,
    exif: Vec<(String, TagValue)>,
    gps: Option<&GpsTags>,
) -> Vec<ExifGroup> {
    let mut gps_items: Vec<(String, TagValue)> = Vec::new();
    if let Some(tags) = gps {
        gps_items.extend(tags.named_entries().map(|(key, value)| (key, value.clone())));
        if let Ok(record) = extract_geotag(name, Some(tags)) {
            if let Some(p) = record.position() {
                gps_items.push(("Latitude".into(), TagValue::Text(format!("{:.6}", p.latitude))));
                gps_items.push(("Longitude".into(), TagValue::Text(format!("{:.6}", p.longitude))));
            }
        }
    }
    organize_exif_info(exif, gps_items)
}

/// JSON summary of a processed batch: one entry per photo in input order,
/// the map bounds (`null` when nothing is located) and the written files.
pub fn batch_summary(batch: &GeotagBatch, outputs: &[PathBuf]) -> serde_json::Value {
    let photos: Vec<serde_json::Value> = batch
        .outcomes()
        .map(|(record, error)| {
            let position = record.position();
            serde_json::json!({
                "name": record.name(),
                "latitude": position.map(|p| p.latitude),
                "longitude": position.map(|p| p.longitude),
                "altitude": position.and_then(|p| p.altitude),
                "bearing": position.and_then(|p| p.bearing),
                "error": error.map(|e| e.to_string()),
            })
        })
        .collect();

    serde_json::json!({
        "photos": photos,
        "bounds": calculate_bounds(batch.records()),
        "outputs": outputs.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif::{ExifSection, TAG_GPS_LATITUDE};
    use std::fs;
    use tempfile::TempDir;

    // ── is_supported_image ───────────────────────────────────────────

    #[test]
    fn supported_image_extensions() {
        assert!(is_supported_image(Path::new("photo.jpg")));
        assert!(is_supported_image(Path::new("photo.JPEG")));
        assert!(is_supported_image(Path::new("photo.tif")));
        assert!(is_supported_image(Path::new("photo.heic")));
    }

    #[test]
    fn unsupported_image_extensions() {
        assert!(!is_supported_image(Path::new("doc.pdf")));
        assert!(!is_supported_image(Path::new("layer.shp")));
        assert!(!is_supported_image(Path::new("noext")));
    }

    // ── collect_images ───────────────────────────────────────────────

    #[test]
    fn collect_images_single_file() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("test.jpg");
        fs::write(&jpg, b"fake").unwrap();

        let images = collect_images(&[jpg.clone()]);
        assert_eq!(images, vec![jpg]);
    }

    #[test]
    fn collect_images_directory_recursive() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        fs::write(dir.path().join("a.jpg"), b"fake").unwrap();
        fs::write(sub.join("b.heic"), b"fake").unwrap();
        fs::write(sub.join("c.txt"), b"fake").unwrap();

        let images = collect_images(&[dir.path().to_path_buf()]);
        assert_eq!(images.len(), 2);
    }

    #[test]
    fn collect_images_nonexistent_path() {
        let images = collect_images(&[PathBuf::from("/nonexistent/path")]);
        assert!(images.is_empty());
    }

    // ── processing ───────────────────────────────────────────────────

    #[test]
    fn photo_name_is_file_name() {
        assert_eq!(photo_name(Path::new("/a/b/IMG_1.jpg")), "IMG_1.jpg");
    }

    #[test]
    fn unreadable_image_is_missing_geotag() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("broken.jpg");
        fs::write(&jpg, b"not a jpeg").unwrap();

        assert!(read_tags_lossy(&jpg).is_none());
        assert_eq!(
            process_photo("broken.jpg", None),
            Err(ConversionError::MissingGeotag)
        );

        let batch = process_images(&[jpg]);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.located_count(), 0);
        assert_eq!(batch.records()[0].name(), "broken.jpg");
    }

    #[test]
    fn tagged_batch_isolates_failures() {
        let good: GpsTags = serde_json::from_str(
            r#"{"1": "S", "2": [33, 0, 0], "3": "E", "4": [146, 30, 0], "17": 90.0}"#,
        )
        .unwrap();
        let mut bad = good.clone();
        bad.insert(TAG_GPS_LATITUDE, TagValue::Text("nowhere".into()));

        let photos = vec![
            TaggedPhoto { name: "bad.jpg".into(), gps: Some(bad) },
            TaggedPhoto { name: "none.jpg".into(), gps: None },
            TaggedPhoto { name: "good.jpg".into(), gps: Some(good) },
        ];
        let batch = process_tagged(photos);

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.located_count(), 1);
        assert_eq!(batch.failures().len(), 2);
        let good = batch.located().next().unwrap();
        assert_eq!(good.name(), "good.jpg");
        let pos = good.position().unwrap();
        assert_eq!((pos.latitude, pos.longitude, pos.bearing), (-33.0, 146.5, Some(90.0)));
    }

    #[test]
    fn build_batch_keeps_input_order() {
        let batch = build_batch(vec![
            ("z.jpg".to_string(), None),
            ("a.jpg".to_string(), Some(GpsTags::new())),
        ]);
        let names: Vec<&str> = batch.records().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["z.jpg", "a.jpg"]);
        assert_eq!(batch.failures()[1].error, ConversionError::MissingGeotag);
    }

    // ── exif_groups ──────────────────────────────────────────────────

    #[test]
    fn exif_groups_add_decimal_coordinates() {
        let gps: GpsTags = serde_json::from_str(
            r#"{"1": "S", "2": [33, 0, 0], "3": "E", "4": [146, 30, 0]}"#,
        )
        .unwrap();
        let exif = vec![("Model".to_string(), TagValue::Text("X100V".into()))];
        let groups = exif_groups("IMG_1.jpg", exif, Some(&gps));

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].section, ExifSection::BasicInfo);
        let gps_group = &groups[1];
        assert_eq!(gps_group.section, ExifSection::GpsInformation);
        let names: Vec<&str> = gps_group.items.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["GPSLatitudeRef", "GPSLatitude", "GPSLongitudeRef", "GPSLongitude", "Latitude", "Longitude"]
        );
        assert_eq!(gps_group.items[4].1.to_string(), "-33.000000");
        assert_eq!(gps_group.items[5].1.to_string(), "146.500000");
    }

    #[test]
    fn exif_groups_without_gps_skip_the_section() {
        let exif = vec![("Flash".to_string(), TagValue::Numeric(16.0))];
        let groups = exif_groups("a.jpg", exif, None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].section, ExifSection::Other);
    }

    // ── batch_summary ────────────────────────────────────────────────

    #[test]
    fn summary_keeps_errors_with_their_own_photo() {
        let good: GpsTags =
            serde_json::from_str(r#"{"1": "N", "2": [1, 0, 0], "3": "E", "4": [2, 0, 0]}"#)
                .unwrap();
        let batch = build_batch(vec![
            ("IMG_1.jpg".to_string(), Some(good)),
            ("IMG_1.jpg".to_string(), None),
        ]);

        let summary = batch_summary(&batch, &[PathBuf::from("out/Photo_Locations.kml")]);
        let photos = summary["photos"].as_array().unwrap();
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0]["latitude"], 1.0);
        assert!(photos[0]["error"].is_null());
        assert!(photos[1]["latitude"].is_null());
        assert_eq!(photos[1]["error"], "missing geotag");
        assert_eq!(summary["bounds"]["max_lon"], 2.0);
        assert_eq!(summary["outputs"][0], "out/Photo_Locations.kml");
    }

    #[test]
    fn summary_without_located_photos_has_null_bounds() {
        let batch = build_batch(vec![("a.jpg".to_string(), None)]);
        let summary = batch_summary(&batch, &[]);
        assert!(summary["bounds"].is_null());
        assert_eq!(summary["outputs"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn load_tag_dump_from_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tags.json");
        fs::write(
            &path,
            r#"[{"name": "IMG_1.jpg", "gps": {"1": "N", "2": [1, 0, 0], "3": "W", "4": [2, 0, 0]}},
                {"name": "IMG_2.jpg"}]"#,
        )
        .unwrap();

        let photos = load_tag_dump(&path).unwrap();
        assert_eq!(photos.len(), 2);
        assert!(photos[1].gps.is_none());

        let batch = process_tagged(photos);
        let pos = batch.records()[0].position().unwrap();
        assert_eq!((pos.latitude, pos.longitude), (1.0, -2.0));
    }
}
