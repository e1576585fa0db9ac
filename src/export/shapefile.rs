//! ESRI shapefile layer encoding (`.shp`, `.shx`, `.dbf`).
//!
//! Only what the photo layers need: 2D points, single-part polylines, and
//! dBase III character/numeric attribute fields.

use std::fs;
use std::path::{Path, PathBuf};

const FILE_CODE: i32 = 9994;
const VERSION: i32 = 1000;
const HEADER_LEN: usize = 100;
const RECORD_HEADER_LEN: usize = 8;

const DBF_VERSION: u8 = 0x03;
// YY (since 1900), MM, DD; fixed so repeated exports are byte-identical
const DBF_LAST_UPDATE: [u8; 3] = [80, 1, 1];
const DBF_HEADER_TERMINATOR: u8 = 0x0D;
const DBF_EOF: u8 = 0x1A;
const DBF_FIELD_NAME_LEN: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Point,
    PolyLine,
}

impl ShapeType {
    pub fn code(self) -> i32 {
        match self {
            Self::Point => 1,
            Self::PolyLine => 3,
        }
    }
}

/// Geometry of one shape, `x` = longitude and `y` = latitude.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point { x: f64, y: f64 },
    PolyLine(Vec<(f64, f64)>),
}

impl Shape {
    fn shape_type(&self) -> ShapeType {
        match self {
            Self::Point { .. } => ShapeType::Point,
            Self::PolyLine(_) => ShapeType::PolyLine,
        }
    }

    fn points(&self) -> Vec<(f64, f64)> {
        match self {
            Self::Point { x, y } => vec![(*x, *y)],
            Self::PolyLine(points) => points.clone(),
        }
    }

    /// Record content, without the 8-byte record header.
    fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        put_i32_le(&mut buf, self.shape_type().code());
        match self {
            Self::Point { x, y } => {
                put_f64_le(&mut buf, *x);
                put_f64_le(&mut buf, *y);
            }
            Self::PolyLine(points) => {
                let bbox = BoundingBox::of(points.iter().copied()).unwrap_or_default();
                bbox.encode(&mut buf);
                put_i32_le(&mut buf, 1); // parts
                put_i32_le(&mut buf, points.len() as i32);
                put_i32_le(&mut buf, 0); // first part starts at point 0
                for (x, y) in points {
                    put_f64_le(&mut buf, *x);
                    put_f64_le(&mut buf, *y);
                }
            }
        }
        buf
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct BoundingBox {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
}

impl BoundingBox {
    fn of(points: impl Iterator<Item = (f64, f64)>) -> Option<Self> {
        points.fold(None, |acc, (x, y)| {
            Some(match acc {
                None => Self { xmin: x, ymin: y, xmax: x, ymax: y },
                Some(b) => Self {
                    xmin: b.xmin.min(x),
                    ymin: b.ymin.min(y),
                    xmax: b.xmax.max(x),
                    ymax: b.ymax.max(y),
                },
            })
        })
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        for v in [self.xmin, self.ymin, self.xmax, self.ymax] {
            put_f64_le(buf, v);
        }
    }
}

/// dBase field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Character,
    Numeric,
}

impl FieldKind {
    fn code(self) -> u8 {
        match self {
            Self::Character => b'C',
            Self::Numeric => b'N',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub width: u8,
    pub decimals: u8,
}

impl FieldSpec {
    pub const fn character(name: &'static str, width: u8) -> Self {
        Self {
            name,
            kind: FieldKind::Character,
            width,
            decimals: 0,
        }
    }

    pub const fn numeric(name: &'static str, width: u8, decimals: u8) -> Self {
        Self {
            name,
            kind: FieldKind::Numeric,
            width,
            decimals,
        }
    }

    /// Fixed-width cell bytes for a value of this field.
    fn encode(&self, value: &FieldValue) -> Vec<u8> {
        let width = self.width as usize;
        let text = match value {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => format!("{:.*}", self.decimals as usize, n),
        };
        let mut cell = truncate_at_char_boundary(&text, width).as_bytes().to_vec();
        let pad = width - cell.len();
        match self.kind {
            FieldKind::Character => cell.extend(std::iter::repeat_n(b' ', pad)),
            FieldKind::Numeric => {
                let mut padded = vec![b' '; pad];
                padded.append(&mut cell);
                cell = padded;
            }
        }
        cell
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

/// One shapefile layer held in memory: a single shape type, a fixed field
/// list, and one attribute row per shape.
#[derive(Debug, Clone)]
pub struct ShapeLayer {
    shape_type: ShapeType,
    fields: Vec<FieldSpec>,
    shapes: Vec<Shape>,
    rows: Vec<Vec<FieldValue>>,
}

impl ShapeLayer {
    pub fn new(shape_type: ShapeType, fields: Vec<FieldSpec>) -> Self {
        Self {
            shape_type,
            fields,
            shapes: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Append a shape with its attribute row.
    ///
    /// Callers build rows from the layer's own field list; a row of the wrong
    /// length or a shape of another type is a programming error.
    pub fn push(&mut self, shape: Shape, row: Vec<FieldValue>) {
        debug_assert_eq!(shape.shape_type(), self.shape_type);
        debug_assert_eq!(row.len(), self.fields.len());
        self.shapes.push(shape);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    fn bbox(&self) -> BoundingBox {
        BoundingBox::of(self.shapes.iter().flat_map(|s| s.points())).unwrap_or_default()
    }

    fn header(&self, file_len_bytes: usize) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN);
        put_i32_be(&mut buf, FILE_CODE);
        buf.extend_from_slice(&[0u8; 20]);
        put_i32_be(&mut buf, (file_len_bytes / 2) as i32);
        put_i32_le(&mut buf, VERSION);
        put_i32_le(&mut buf, self.shape_type.code());
        self.bbox().encode(&mut buf);
        // Z and M ranges are unused for 2D shapes
        buf.extend_from_slice(&[0u8; 32]);
        buf
    }

    /// Main `.shp` file bytes.
    pub fn encode_shp(&self) -> Vec<u8> {
        let contents: Vec<Vec<u8>> = self.shapes.iter().map(Shape::encode).collect();
        let total = HEADER_LEN
            + contents
                .iter()
                .map(|c| RECORD_HEADER_LEN + c.len())
                .sum::<usize>();

        let mut buf = self.header(total);
        for (i, content) in contents.iter().enumerate() {
            put_i32_be(&mut buf, i as i32 + 1);
            put_i32_be(&mut buf, (content.len() / 2) as i32);
            buf.extend_from_slice(content);
        }
        buf
    }

    /// `.shx` index bytes: offset and length of every `.shp` record, in
    /// 16-bit words.
    pub fn encode_shx(&self) -> Vec<u8> {
        let total = HEADER_LEN + self.shapes.len() * RECORD_HEADER_LEN;
        let mut buf = self.header(total);
        let mut offset = HEADER_LEN;
        for shape in &self.shapes {
            let len = shape.encode().len();
            put_i32_be(&mut buf, (offset / 2) as i32);
            put_i32_be(&mut buf, (len / 2) as i32);
            offset += RECORD_HEADER_LEN + len;
        }
        buf
    }

    /// `.dbf` attribute table bytes (dBase III).
    pub fn encode_dbf(&self) -> Vec<u8> {
        let header_len = 32 + 32 * self.fields.len() + 1;
        let record_len = 1 + self.fields.iter().map(|f| f.width as usize).sum::<usize>();

        let mut buf = Vec::with_capacity(header_len + record_len * self.rows.len() + 1);
        buf.push(DBF_VERSION);
        buf.extend_from_slice(&DBF_LAST_UPDATE);
        buf.extend_from_slice(&(self.rows.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(header_len as u16).to_le_bytes());
        buf.extend_from_slice(&(record_len as u16).to_le_bytes());
        buf.extend_from_slice(&[0u8; 20]);

        for field in &self.fields {
            let mut name = [0u8; DBF_FIELD_NAME_LEN];
            let raw = field.name.replace(' ', "_");
            let raw = truncate_at_char_boundary(&raw, DBF_FIELD_NAME_LEN - 1);
            name[..raw.len()].copy_from_slice(raw.as_bytes());
            buf.extend_from_slice(&name);
            buf.push(field.kind.code());
            buf.extend_from_slice(&[0u8; 4]);
            buf.push(field.width);
            buf.push(field.decimals);
            buf.extend_from_slice(&[0u8; 14]);
        }
        buf.push(DBF_HEADER_TERMINATOR);

        for row in &self.rows {
            buf.push(b' '); // not deleted
            for (field, value) in self.fields.iter().zip(row) {
                buf.extend_from_slice(&field.encode(value));
            }
        }
        buf.push(DBF_EOF);
        buf
    }

    /// Write `<base>.shp`, `<base>.shx` and `<base>.dbf` into `dir`.
    pub fn write_files(&self, dir: &Path, base: &str) -> std::io::Result<Vec<PathBuf>> {
        let outputs = [
            ("shp", self.encode_shp()),
            ("shx", self.encode_shx()),
            ("dbf", self.encode_dbf()),
        ];
        let mut written = Vec::with_capacity(outputs.len());
        for (ext, bytes) in outputs {
            let path = dir.join(format!("{base}.{ext}"));
            fs::write(&path, bytes)?;
            log::debug!("Wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn put_i32_be(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_i32_le(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_f64_le(buf: &mut Vec<u8>, v: f64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn i32_be(bytes: &[u8], at: usize) -> i32 {
        i32::from_be_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    fn i32_le(bytes: &[u8], at: usize) -> i32 {
        i32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    fn f64_le(bytes: &[u8], at: usize) -> f64 {
        f64::from_le_bytes(bytes[at..at + 8].try_into().unwrap())
    }

    fn point_layer() -> ShapeLayer {
        let mut layer = ShapeLayer::new(
            ShapeType::Point,
            vec![FieldSpec::character("Name", 10), FieldSpec::numeric("Value", 8, 2)],
        );
        layer.push(
            Shape::Point { x: 146.5, y: -33.0 },
            vec![FieldValue::Text("a.jpg".into()), FieldValue::Number(1.5)],
        );
        layer.push(
            Shape::Point { x: 150.0, y: -30.0 },
            vec![FieldValue::Text("b.jpg".into()), FieldValue::Number(-2.0)],
        );
        layer
    }

    // ── .shp / .shx ──────────────────────────────────────────────────

    #[test]
    fn empty_layer_is_header_only() {
        let layer = ShapeLayer::new(ShapeType::Point, vec![FieldSpec::character("Name", 50)]);
        let shp = layer.encode_shp();
        assert_eq!(shp.len(), 100);
        assert_eq!(i32_be(&shp, 0), 9994);
        assert_eq!(i32_be(&shp, 24), 50);
        assert_eq!(i32_le(&shp, 28), 1000);
        assert_eq!(i32_le(&shp, 32), 1);
        assert!(shp[36..100].iter().all(|b| *b == 0));
        assert_eq!(layer.encode_shx().len(), 100);
    }

    #[test]
    fn point_records() {
        let layer = point_layer();
        let shp = layer.encode_shp();
        // header + 2 * (8 + 20)
        assert_eq!(shp.len(), 156);
        assert_eq!(i32_be(&shp, 24), 78);
        // bbox
        assert_eq!(f64_le(&shp, 36), 146.5);
        assert_eq!(f64_le(&shp, 44), -33.0);
        assert_eq!(f64_le(&shp, 52), 150.0);
        assert_eq!(f64_le(&shp, 60), -30.0);
        // first record
        assert_eq!(i32_be(&shp, 100), 1);
        assert_eq!(i32_be(&shp, 104), 10);
        assert_eq!(i32_le(&shp, 108), 1);
        assert_eq!(f64_le(&shp, 112), 146.5);
        assert_eq!(f64_le(&shp, 120), -33.0);
        assert_eq!(i32_be(&shp, 128), 2);
    }

    #[test]
    fn shx_offsets() {
        let shx = point_layer().encode_shx();
        assert_eq!(shx.len(), 116);
        assert_eq!(i32_be(&shx, 24), 58);
        assert_eq!((i32_be(&shx, 100), i32_be(&shx, 104)), (50, 10));
        assert_eq!((i32_be(&shx, 108), i32_be(&shx, 112)), (64, 10));
    }

    #[test]
    fn polyline_record() {
        let mut layer = ShapeLayer::new(ShapeType::PolyLine, vec![FieldSpec::numeric("D", 5, 1)]);
        layer.push(
            Shape::PolyLine(vec![(10.0, 20.0), (11.0, 19.0)]),
            vec![FieldValue::Number(90.0)],
        );
        let shp = layer.encode_shp();
        // header + 8 + 80
        assert_eq!(shp.len(), 188);
        assert_eq!(i32_le(&shp, 32), 3);
        assert_eq!(i32_be(&shp, 104), 40);
        let content = &shp[108..];
        assert_eq!(i32_le(content, 0), 3);
        assert_eq!(
            [f64_le(content, 4), f64_le(content, 12), f64_le(content, 20), f64_le(content, 28)],
            [10.0, 19.0, 11.0, 20.0]
        );
        assert_eq!((i32_le(content, 36), i32_le(content, 40), i32_le(content, 44)), (1, 2, 0));
        assert_eq!(f64_le(content, 48), 10.0);
        assert_eq!(f64_le(content, 72), 19.0);
    }

    // ── .dbf ─────────────────────────────────────────────────────────

    #[test]
    fn dbf_header_and_rows() {
        let dbf = point_layer().encode_dbf();
        assert_eq!(dbf[0], 0x03);
        assert_eq!(u32::from_le_bytes(dbf[4..8].try_into().unwrap()), 2);
        let header_len = u16::from_le_bytes(dbf[8..10].try_into().unwrap()) as usize;
        let record_len = u16::from_le_bytes(dbf[10..12].try_into().unwrap()) as usize;
        assert_eq!(header_len, 97);
        assert_eq!(record_len, 19);
        assert_eq!(&dbf[32..43], b"Name\0\0\0\0\0\0\0");
        assert_eq!(dbf[43], b'C');
        assert_eq!((dbf[48], dbf[49]), (10, 0));
        assert_eq!(&dbf[64..69], b"Value");
        assert_eq!(dbf[75], b'N');
        assert_eq!((dbf[80], dbf[81]), (8, 2));
        assert_eq!(dbf[96], 0x0D);

        let rows = &dbf[header_len..];
        assert_eq!(&rows[..record_len], b" a.jpg         1.50");
        assert_eq!(&rows[record_len..2 * record_len], b" b.jpg        -2.00");
        assert_eq!(rows[2 * record_len], 0x1A);
        assert_eq!(dbf.len(), header_len + 2 * record_len + 1);
    }

    #[test]
    fn cells_are_truncated_to_width() {
        let name = FieldSpec::character("Name", 4);
        assert_eq!(name.encode(&FieldValue::Text("abcdef".into())), b"abcd");
        assert_eq!(name.encode(&FieldValue::Text("é€".into())), b"\xc3\xa9  ");
        let num = FieldSpec::numeric("N", 20, 10);
        assert_eq!(num.encode(&FieldValue::Number(90.0)), b"       90.0000000000");
        assert_eq!(num.encode(&FieldValue::Number(-33.0)), b"      -33.0000000000");
    }

    // ── files ────────────────────────────────────────────────────────

    #[test]
    fn write_files_creates_three_components() {
        let dir = TempDir::new().unwrap();
        let written = point_layer().write_files(dir.path(), "photos").unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["photos.shp", "photos.shx", "photos.dbf"]);
        for path in &written {
            assert!(path.is_file());
        }
    }
}
