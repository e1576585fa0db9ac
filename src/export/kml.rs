use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

use crate::error::ExportError;
use crate::geo::{destination, GeotagRecord};

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

const PHOTO_STYLE_ID: &str = "photoStyle";
const DIRECTION_STYLE_ID: &str = "directionStyle";
const PIN_ICON_HREF: &str = "http://maps.google.com/mapfiles/kml/pushpin/blue-pushpin.png";
// KML colors are aabbggrr
const DIRECTION_LINE_COLOR: &str = "ff0000ff";
const DIRECTION_LINE_WIDTH: &str = "2";

/// Build a KML document with one placemark per located photo and one
/// direction line per photo that also has a bearing.
///
/// Photos without a location are skipped. With nothing located the document
/// still carries the two style definitions, just no placemarks.
///
/// # Example
///
/// ```rust
/// use photo_geotag::export::create_kml;
/// use photo_geotag::geo::{GeoPosition, GeotagRecord};
///
/// let records = vec![GeotagRecord::located(
///     "IMG_1.jpg",
///     GeoPosition::new(-33.0, 146.5).with_bearing(90.0),
/// )];
/// let kml = create_kml(&records, 50.0).unwrap();
/// let text = String::from_utf8(kml).unwrap();
/// assert!(text.contains("<name>IMG_1.jpg - Direction</name>"));
/// ```
pub fn create_kml(records: &[GeotagRecord], line_length: f64) -> Result<Vec<u8>, ExportError> {
    write_kml(Vec::new(), records, line_length)
}

/// Write the KML document of [`create_kml`] into `out` and hand it back.
/// A failing sink surfaces as [`ExportError::Io`].
pub fn write_kml<W: Write>(
    out: W,
    records: &[GeotagRecord],
    line_length: f64,
) -> Result<W, ExportError> {
    let mut writer = Writer::new(out);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.get_mut().write_all(b"\n")?;

    writer.write_event(Event::Start(
        BytesStart::new("kml").with_attributes([("xmlns", KML_NAMESPACE)]),
    ))?;
    open(&mut writer, "Document")?;
    write_styles(&mut writer)?;

    let mut placemarks = 0usize;
    let mut lines = 0usize;
    for record in records {
        let Some(position) = record.position() else {
            continue;
        };
        let (lat, lon) = (position.latitude, position.longitude);

        open(&mut writer, "Placemark")?;
        text_element(&mut writer, "name", record.name())?;
        text_element(
            &mut writer,
            "description",
            &format!("Photo taken at: {lat:?}, {lon:?}"),
        )?;
        text_element(&mut writer, "styleUrl", &format!("#{PHOTO_STYLE_ID}"))?;
        open(&mut writer, "Point")?;
        text_element(&mut writer, "coordinates", &format!("{lon:?},{lat:?},0"))?;
        close(&mut writer, "Point")?;
        close(&mut writer, "Placemark")?;
        placemarks += 1;

        if let Some(bearing) = position.bearing {
            let dest = destination(lat, lon, bearing, line_length);

            open(&mut writer, "Placemark")?;
            text_element(&mut writer, "name", &format!("{} - Direction", record.name()))?;
            text_element(&mut writer, "description", &format!("Direction: {bearing:?}°"))?;
            text_element(&mut writer, "styleUrl", &format!("#{DIRECTION_STYLE_ID}"))?;
            open(&mut writer, "LineString")?;
            text_element(
                &mut writer,
                "coordinates",
                &format!("{lon:?},{lat:?},0 {:?},{:?},0", dest.longitude, dest.latitude),
            )?;
            close(&mut writer, "LineString")?;
            close(&mut writer, "Placemark")?;
            lines += 1;
        }
    }

    close(&mut writer, "Document")?;
    close(&mut writer, "kml")?;

    if placemarks == 0 {
        log::warn!("KML export has no located photos; writing styles only");
    } else {
        log::info!("KML export: {placemarks} placemark(s), {lines} direction line(s)");
    }

    Ok(writer.into_inner())
}

fn write_styles<W: Write>(writer: &mut Writer<W>) -> Result<(), ExportError> {
    writer.write_event(Event::Start(
        BytesStart::new("Style").with_attributes([("id", PHOTO_STYLE_ID)]),
    ))?;
    open(writer, "IconStyle")?;
    open(writer, "Icon")?;
    text_element(writer, "href", PIN_ICON_HREF)?;
    close(writer, "Icon")?;
    close(writer, "IconStyle")?;
    close(writer, "Style")?;

    writer.write_event(Event::Start(
        BytesStart::new("Style").with_attributes([("id", DIRECTION_STYLE_ID)]),
    ))?;
    open(writer, "LineStyle")?;
    text_element(writer, "color", DIRECTION_LINE_COLOR)?;
    text_element(writer, "width", DIRECTION_LINE_WIDTH)?;
    close(writer, "LineStyle")?;
    close(writer, "Style")?;
    Ok(())
}

fn open<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), ExportError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn close<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), ExportError> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// `<name>text</name>`; only `&`, `<` and `>` are escaped in the text.
fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<(), ExportError> {
    open(writer, name)?;
    writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
    close(writer, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPosition;

    const STYLES: &str = concat!(
        "<Style id=\"photoStyle\"><IconStyle><Icon>",
        "<href>http://maps.google.com/mapfiles/kml/pushpin/blue-pushpin.png</href>",
        "</Icon></IconStyle></Style>",
        "<Style id=\"directionStyle\"><LineStyle><color>ff0000ff</color>",
        "<width>2</width></LineStyle></Style>",
    );

    fn kml_string(records: &[GeotagRecord], line_length: f64) -> String {
        String::from_utf8(create_kml(records, line_length).unwrap()).unwrap()
    }

    #[test]
    fn empty_input_has_styles_only() {
        let text = kml_string(&[], 50.0);
        assert_eq!(
            text,
            format!(
                "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
                 <kml xmlns=\"http://www.opengis.net/kml/2.2\"><Document>{STYLES}</Document></kml>"
            )
        );
        assert_eq!(text.matches("<Style ").count(), 2);
        assert_eq!(text.matches("<Placemark>").count(), 0);
    }

    #[test]
    fn unlocated_records_are_skipped() {
        let text = kml_string(&[GeotagRecord::missing("a.jpg")], 50.0);
        assert!(!text.contains("<Placemark>"));
        assert!(!text.contains("a.jpg"));
    }

    #[test]
    fn point_placemark_is_lon_lat() {
        let records = [GeotagRecord::located("IMG_2.jpg", GeoPosition::new(51.5, -0.125))];
        let text = kml_string(&records, 50.0);
        assert!(text.contains(concat!(
            "<Placemark><name>IMG_2.jpg</name>",
            "<description>Photo taken at: 51.5, -0.125</description>",
            "<styleUrl>#photoStyle</styleUrl>",
            "<Point><coordinates>-0.125,51.5,0</coordinates></Point></Placemark>",
        )));
        assert_eq!(text.matches("<Placemark>").count(), 1);
        assert!(!text.contains("LineString"));
    }

    #[test]
    fn direction_line_placemark() {
        let records = [GeotagRecord::located(
            "IMG_1.jpg",
            GeoPosition::new(-33.0, 146.5).with_bearing(90.0),
        )];
        let text = kml_string(&records, 100.0);
        let dest = destination(-33.0, 146.5, 90.0, 100.0);
        assert!(text.contains("<name>IMG_1.jpg - Direction</name>"));
        assert!(text.contains("<description>Direction: 90.0°</description>"));
        assert!(text.contains("<styleUrl>#directionStyle</styleUrl>"));
        assert!(text.contains(&format!(
            "<LineString><coordinates>146.5,-33.0,0 {:?},{:?},0</coordinates></LineString>",
            dest.longitude, dest.latitude
        )));
        assert_eq!(text.matches("<Placemark>").count(), 2);
    }

    #[test]
    fn names_are_escaped() {
        let records = [GeotagRecord::located("a&b<c>.jpg", GeoPosition::new(1.0, 2.0))];
        let text = kml_string(&records, 50.0);
        assert!(text.contains("<name>a&amp;b&lt;c&gt;.jpg</name>"));
    }

    #[derive(Debug)]
    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn sink_failure_is_an_io_error() {
        let records = [GeotagRecord::located("a.jpg", GeoPosition::new(1.0, 2.0))];
        let err = write_kml(FailingSink, &records, 50.0).unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
    }

    #[test]
    fn write_kml_matches_create_kml() {
        let records = [GeotagRecord::located("a.jpg", GeoPosition::new(1.0, 2.0))];
        let written = write_kml(Vec::new(), &records, 50.0).unwrap();
        assert_eq!(written, create_kml(&records, 50.0).unwrap());
    }

    #[test]
    fn output_is_deterministic() {
        let records = [
            GeotagRecord::located("a.jpg", GeoPosition::new(1.0, 2.0).with_bearing(12.5)),
            GeotagRecord::missing("b.jpg"),
            GeotagRecord::located("c.jpg", GeoPosition::new(-3.0, 4.0)),
        ];
        assert_eq!(create_kml(&records, 50.0).unwrap(), create_kml(&records, 50.0).unwrap());
    }
}
