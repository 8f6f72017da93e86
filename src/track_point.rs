//! A single GPX track point, parsed eagerly into a plain value.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

use crate::error::TrackError;
use crate::gpx_reader::GPX_NAMESPACE;
use crate::xml_tree::XmlElement;

#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub elevation: f64,
    pub timestamp: DateTime<FixedOffset>,
    /// Device-specific numeric readings keyed by element name (`hr`, `cad`, `atemp`...).
    /// A key missing here means the device did not record it for this point.
    pub extensions: BTreeMap<String, f64>,
}

impl TrackPoint {
    pub fn new(
        latitude: f64,
        longitude: f64,
        elevation: f64,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        TrackPoint {
            longitude,
            latitude,
            elevation,
            timestamp,
            extensions: BTreeMap::new(),
        }
    }

    pub fn with_extension(mut self, name: impl Into<String>, value: f64) -> Self {
        self.extensions.insert(name.into(), value);
        self
    }

    /// `(latitude, longitude)` in degrees.
    pub fn lat_lon(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    pub fn extension(&self, name: &str) -> Option<f64> {
        self.extensions.get(name).copied()
    }

    pub(crate) fn from_element(element: &XmlElement) -> Result<Self, TrackError> {
        let latitude = parse_coordinate(element, "lat", 90.0)?;
        let longitude = parse_coordinate(element, "lon", 180.0)?;

        let elevation_text = element
            .find(GPX_NAMESPACE, "ele")
            .map(|e| e.text.trim())
            .ok_or_else(|| TrackError::malformed("ele", "missing"))?;
        let elevation = parse_number("ele", elevation_text)?;

        let time_text = element
            .find(GPX_NAMESPACE, "time")
            .map(|e| e.text.trim())
            .ok_or_else(|| TrackError::malformed("time", "missing"))?;
        let timestamp = parse_timestamp(time_text)?;

        let mut extensions = BTreeMap::new();
        if let Some(container) = element.find(GPX_NAMESPACE, "extensions") {
            for leaf in container.leaves() {
                let text = leaf.text.trim();
                // Empty containers such as <gpxtpx:TrackPointExtension/> hold no reading
                if text.is_empty() {
                    continue;
                }
                let field = format!("ext:{}", leaf.name);
                let value = parse_number(&field, text)?;
                extensions.insert(leaf.name.clone(), value);
            }
        }

        Ok(TrackPoint {
            longitude,
            latitude,
            elevation,
            timestamp,
            extensions,
        })
    }
}

/// RFC 3339 timestamp with a mandatory offset. `Z` comes back as `+00:00`.
pub fn parse_timestamp(text: &str) -> Result<DateTime<FixedOffset>, TrackError> {
    DateTime::parse_from_rfc3339(text).map_err(|e| {
        TrackError::malformed("time", format!("`{}` is not an RFC 3339 timestamp: {}", text, e))
    })
}

fn parse_coordinate(element: &XmlElement, field: &str, limit: f64) -> Result<f64, TrackError> {
    let text = element
        .attribute(field)
        .ok_or_else(|| TrackError::malformed(field, "missing"))?;
    let value = parse_number(field, text.trim())?;

    if value.abs() > limit {
        return Err(TrackError::malformed(
            field,
            format!("{} is outside [-{}, {}]", value, limit, limit),
        ));
    }
    Ok(value)
}

fn parse_number(field: &str, text: &str) -> Result<f64, TrackError> {
    let value = text
        .parse::<f64>()
        .map_err(|_| TrackError::malformed(field, format!("`{}` is not a number", text)))?;

    if !value.is_finite() {
        return Err(TrackError::malformed(field, format!("`{}` is not finite", text)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml_tree::parse_tree;

    fn parse_point(body: &str) -> Result<TrackPoint, TrackError> {
        let xml = format!(
            r#"<trkpt xmlns="{}" xmlns:gpxtpx="http://www.garmin.com/xmlschemas/TrackPointExtension/v1" {}</trkpt>"#,
            GPX_NAMESPACE, body
        );
        let root = parse_tree(xml.as_bytes()).unwrap().unwrap();
        TrackPoint::from_element(&root)
    }

    fn malformed_field(result: Result<TrackPoint, TrackError>) -> String {
        match result {
            Err(TrackError::MalformedPoint { field, .. }) => field,
            other => panic!("expected MalformedPoint, got {:?}", other),
        }
    }

    #[test]
    fn test_parses_required_fields() {
        let point = parse_point(
            r#"lat="51.5" lon="-0.12"><ele>12.5</ele><time>2020-03-01T09:00:00Z</time>"#,
        )
        .unwrap();

        assert_eq!(point.latitude, 51.5);
        assert_eq!(point.longitude, -0.12);
        assert_eq!(point.elevation, 12.5);
        assert_eq!(point.timestamp.offset().local_minus_utc(), 0);
        assert_eq!(point.timestamp.to_rfc3339(), "2020-03-01T09:00:00+00:00");
        assert!(point.extensions.is_empty());
    }

    #[test]
    fn test_keeps_explicit_offsets() {
        let point = parse_point(
            r#"lat="0" lon="0"><ele>0</ele><time>2020-03-01T10:00:00.250+01:00</time>"#,
        )
        .unwrap();
        assert_eq!(point.timestamp.offset().local_minus_utc(), 3600);
        assert_eq!(point.timestamp.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parses_nested_garmin_extensions() {
        let point = parse_point(
            r#"lat="0" lon="0"><ele>0</ele><time>2020-03-01T09:00:00Z</time>
               <extensions><gpxtpx:TrackPointExtension>
                 <gpxtpx:hr>142</gpxtpx:hr><gpxtpx:cad>86</gpxtpx:cad>
               </gpxtpx:TrackPointExtension></extensions>"#,
        )
        .unwrap();

        assert_eq!(point.extension("hr"), Some(142.0));
        assert_eq!(point.extension("cad"), Some(86.0));
        assert_eq!(point.extension("atemp"), None);
    }

    #[test]
    fn test_missing_elevation_names_the_field() {
        let result = parse_point(r#"lat="0" lon="0"><time>2020-03-01T09:00:00Z</time>"#);
        assert_eq!(malformed_field(result), "ele");
    }

    #[test]
    fn test_missing_latitude_names_the_field() {
        let result = parse_point(r#"lon="0"><ele>1</ele><time>2020-03-01T09:00:00Z</time>"#);
        assert_eq!(malformed_field(result), "lat");
    }

    #[test]
    fn test_out_of_range_longitude_is_rejected() {
        let result =
            parse_point(r#"lat="0" lon="181"><ele>1</ele><time>2020-03-01T09:00:00Z</time>"#);
        assert_eq!(malformed_field(result), "lon");
    }

    #[test]
    fn test_timestamp_without_offset_is_rejected() {
        let result = parse_point(r#"lat="0" lon="0"><ele>1</ele><time>2020-03-01T09:00:00</time>"#);
        assert_eq!(malformed_field(result), "time");
    }

    #[test]
    fn test_unparseable_extension_is_an_error() {
        let result = parse_point(
            r#"lat="0" lon="0"><ele>1</ele><time>2020-03-01T09:00:00Z</time>
               <extensions><hr>fast</hr></extensions>"#,
        );
        assert_eq!(malformed_field(result), "ext:hr");
    }

    #[test]
    fn test_empty_extension_container_is_skipped() {
        let point = parse_point(
            r#"lat="0" lon="0"><ele>1</ele><time>2020-03-01T09:00:00Z</time>
               <extensions><gpxtpx:TrackPointExtension/></extensions>"#,
        )
        .unwrap();
        assert!(point.extensions.is_empty());

        let point = parse_point(
            r#"lat="0" lon="0"><ele>1</ele><time>2020-03-01T09:00:00Z</time>
               <extensions><gpxtpx:TrackPointExtension>
                 <gpxtpx:hr>97</gpxtpx:hr><gpxtpx:cad></gpxtpx:cad>
               </gpxtpx:TrackPointExtension></extensions>"#,
        )
        .unwrap();
        assert_eq!(point.extension("hr"), Some(97.0));
        assert_eq!(point.extension("cad"), None);
    }
}
