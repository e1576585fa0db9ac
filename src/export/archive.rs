use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::shapefile::{FieldSpec, FieldValue, Shape, ShapeLayer, ShapeType};
use crate::error::ExportError;
use crate::geo::{destination, GeotagRecord};

/// Base name of the point layer inside the archive.
pub const POINT_LAYER: &str = "photos";
/// Base name of the direction line layer inside the archive.
pub const DIRECTION_LAYER: &str = "photo_directions";

/// WGS84 geographic coordinate system, written as each layer's `.prj`.
pub const WGS84_PRJ: &str = concat!(
    "GEOGCS[\"GCS_WGS_1984\",DATUM[\"D_WGS_1984\",",
    "SPHEROID[\"WGS_84\",6378137,298.257223563]],",
    "PRIMEM[\"Greenwich\",0],UNIT[\"Degree\",0.017453292519943295]]"
);

const POINT_FIELDS: [FieldSpec; 4] = [
    FieldSpec::character("Name", 50),
    FieldSpec::numeric("Latitude", 20, 10),
    FieldSpec::numeric("Longitude", 20, 10),
    FieldSpec::numeric("Direction", 20, 10),
];

const DIRECTION_FIELDS: [FieldSpec; 2] = [
    FieldSpec::character("Name", 50),
    FieldSpec::numeric("Direction", 20, 10),
];

/// Build the point layer and, when any located photo has a bearing, the
/// direction line layer.
///
/// Every located photo gets a point; its `Direction` is 0 when the bearing is
/// unknown. Lines exist only for photos with a bearing.
pub fn build_layers(records: &[GeotagRecord], line_length: f64) -> (ShapeLayer, Option<ShapeLayer>) {
    let mut points = ShapeLayer::new(ShapeType::Point, POINT_FIELDS.to_vec());
    let mut lines = ShapeLayer::new(ShapeType::PolyLine, DIRECTION_FIELDS.to_vec());

    for record in records {
        let Some(position) = record.position() else {
            continue;
        };
        let (lat, lon) = (position.latitude, position.longitude);

        points.push(
            Shape::Point { x: lon, y: lat },
            vec![
                FieldValue::Text(record.name().to_string()),
                FieldValue::Number(lat),
                FieldValue::Number(lon),
                FieldValue::Number(position.bearing.unwrap_or(0.0)),
            ],
        );

        if let Some(bearing) = position.bearing {
            let dest = destination(lat, lon, bearing, line_length);
            lines.push(
                Shape::PolyLine(vec![(lon, lat), (dest.longitude, dest.latitude)]),
                vec![
                    FieldValue::Text(record.name().to_string()),
                    FieldValue::Number(bearing),
                ],
            );
        }
    }

    let lines = if lines.is_empty() { None } else { Some(lines) };
    (points, lines)
}

/// Write the shapefile layers and their `.prj` files into `dir`.
///
/// Returns the written paths in archive order: `photos.shp/.shx/.dbf/.prj`,
/// then the same four for `photo_directions` when that layer exists.
pub fn write_shapefiles(
    dir: &Path,
    records: &[GeotagRecord],
    line_length: f64,
) -> Result<Vec<PathBuf>, ExportError> {
    let (points, lines) = build_layers(records, line_length);

    let mut written = write_layer(dir, POINT_LAYER, &points)?;
    if let Some(lines) = lines {
        written.extend(write_layer(dir, DIRECTION_LAYER, &lines)?);
    }
    Ok(written)
}

fn write_layer(dir: &Path, base: &str, layer: &ShapeLayer) -> Result<Vec<PathBuf>, ExportError> {
    let mut written = layer.write_files(dir, base)?;
    let prj = dir.join(format!("{base}.prj"));
    fs::write(&prj, WGS84_PRJ)?;
    written.push(prj);
    log::debug!("Layer {base}: {} shape(s)", layer.len());
    Ok(written)
}

/// Build a zipped shapefile set for the given photos.
///
/// Layers are staged in a private temporary directory that is removed on
/// every exit path. Entry timestamps are fixed, so the same records always
/// give the same bytes. With no located photos the archive still holds an
/// empty `photos` layer.
///
/// # Example
///
/// ```rust
/// use photo_geotag::export::create_shapefile_archive;
/// use photo_geotag::geo::{GeoPosition, GeotagRecord};
///
/// let records = vec![GeotagRecord::located("IMG_1.jpg", GeoPosition::new(-33.0, 146.5))];
/// let zip_bytes = create_shapefile_archive(&records, 50.0).unwrap();
/// assert!(!zip_bytes.is_empty());
/// ```
pub fn create_shapefile_archive(
    records: &[GeotagRecord],
    line_length: f64,
) -> Result<Vec<u8>, ExportError> {
    let workspace = tempfile::Builder::new()
        .prefix("photo-geotag-")
        .tempdir()?;
    let files = write_shapefiles(workspace.path(), records, line_length)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for path in &files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        zip.start_file(name.as_str(), entry_options())?;
        zip.write_all(&fs::read(path)?)?;
    }
    let bytes = zip.finish()?.into_inner();

    workspace.close()?;
    if !records.iter().any(GeotagRecord::has_location) {
        log::warn!("Shapefile export has no located photos; archive holds an empty layer");
    }
    log::info!("Shapefile archive: {} file(s), {} bytes", files.len(), bytes.len());
    Ok(bytes)
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
}
