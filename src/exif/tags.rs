use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// GPS IFD tag IDs
pub const TAG_GPS_LATITUDE_REF: u16 = 0x0001;
pub const TAG_GPS_LATITUDE: u16 = 0x0002;
pub const TAG_GPS_LONGITUDE_REF: u16 = 0x0003;
pub const TAG_GPS_LONGITUDE: u16 = 0x0004;
pub const TAG_GPS_ALTITUDE_REF: u16 = 0x0005;
pub const TAG_GPS_ALTITUDE: u16 = 0x0006;
pub const TAG_GPS_IMG_DIRECTION_REF: u16 = 0x0010;
pub const TAG_GPS_IMG_DIRECTION: u16 = 0x0011;

/// A raw EXIF value as handed over by the tag parser.
///
/// The parser produces bytes, rationals, strings, arrays and nested groups;
/// every shape is one of these variants so consumers match instead of probing
/// types at runtime.
///
/// Deserializes untagged from JSON: `90.5`, `{"num": 33, "den": 1}`, `"S"`,
/// `[33, 52, 10.2]` or a nested object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Numeric(f64),
    Rational { num: i64, den: i64 },
    Text(String),
    Sequence(Vec<TagValue>),
    SubMapping(BTreeMap<String, TagValue>),
}

impl TagValue {
    pub fn rational(num: i64, den: i64) -> Self {
        Self::Rational { num, den }
    }

    /// Numeric value of a scalar tag. Rationals with a zero denominator,
    /// unparsable text, sequences and mappings have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Numeric(v) => Some(*v),
            Self::Rational { num, den } if *den != 0 => Some(*num as f64 / *den as f64),
            Self::Rational { .. } => None,
            Self::Text(s) => clean_text(s).parse().ok(),
            Self::Sequence(_) | Self::SubMapping(_) => None,
        }
    }

    /// Text of a reference tag with trailing NULs and whitespace removed.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(clean_text(s)),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[TagValue]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }
}

fn clean_text(s: &str) -> &str {
    s.trim_end_matches('\0').trim()
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "{v}"),
            Self::Rational { .. } => match self.as_f64() {
                Some(v) => write!(f, "{v}"),
                None => write!(f, "undefined"),
            },
            Self::Text(s) => f.write_str(clean_text(s)),
            Self::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::SubMapping(map) => {
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                Ok(())
            }
        }
    }
}

/// The GPS tag group of one photo, keyed by GPS IFD tag ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GpsTags(BTreeMap<u16, TagValue>);

impl GpsTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: u16, value: TagValue) -> Option<TagValue> {
        self.0.insert(tag, value)
    }

    pub fn get(&self, tag: u16) -> Option<&TagValue> {
        self.0.get(&tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Entries with human-readable tag names, in tag ID order.
    pub fn named_entries(&self) -> impl Iterator<Item = (String, &TagValue)> {
        self.0.iter().map(|(tag, value)| (gps_tag_name(*tag), value))
    }
}

impl FromIterator<(u16, TagValue)> for GpsTags {
    fn from_iter<I: IntoIterator<Item = (u16, TagValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// EXIF name of a GPS IFD tag, e.g. `GPSLatitude` for tag 2.
pub fn gps_tag_name(tag: u16) -> String {
    let name = match tag {
        0x0000 => "GPSVersionID",
        TAG_GPS_LATITUDE_REF => "GPSLatitudeRef",
        TAG_GPS_LATITUDE => "GPSLatitude",
        TAG_GPS_LONGITUDE_REF => "GPSLongitudeRef",
        TAG_GPS_LONGITUDE => "GPSLongitude",
        TAG_GPS_ALTITUDE_REF => "GPSAltitudeRef",
        TAG_GPS_ALTITUDE => "GPSAltitude",
        0x0007 => "GPSTimeStamp",
        0x000C => "GPSSpeedRef",
        0x000D => "GPSSpeed",
        TAG_GPS_IMG_DIRECTION_REF => "GPSImgDirectionRef",
        TAG_GPS_IMG_DIRECTION => "GPSImgDirection",
        0x0012 => "GPSMapDatum",
        0x001D => "GPSDateStamp",
        other => return format!("GPSTag{other:#06x}"),
    };
    name.to_string()
}

/// Make an EXIF tag name readable: `GPSImgDirection` -> `GPS Img Direction`.
pub fn format_tag_key(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() * 2);
    for c in key.chars() {
        if c.is_uppercase() {
            spaced.push(' ');
        }
        spaced.push(c);
    }
    spaced
        .trim()
        .replace("G P S", "GPS")
        .replace("I S O", "ISO")
        .replace("F Number", "F-Number")
}
