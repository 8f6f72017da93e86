//! GPX 1.1 document reader
//!
//! Reads a document top-down into tracks, segments and points, keeping source
//! order everywhere. Any error aborts the whole document; no partially built
//! tracks are handed back.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::TrackError;
use crate::track_point::TrackPoint;
use crate::xml_tree::{parse_tree, XmlElement};

pub const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackSegment {
    pub points: Vec<TrackPoint>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    pub name: Option<String>,
    pub segments: Vec<TrackSegment>,
}

impl Track {
    /// The track name for callers that cannot work without one.
    pub fn require_name(&self) -> Result<&str, TrackError> {
        self.name.as_deref().ok_or(TrackError::MissingTrackName)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpxDocument {
    pub tracks: Vec<Track>,
}

impl GpxDocument {
    /// First track and its first segment, the only part the batch tools analyse.
    pub fn first_segment(&self) -> Result<(&Track, &TrackSegment), TrackError> {
        let track = self.tracks.first().ok_or(TrackError::EmptyDocument)?;
        let segment = track.segments.first().ok_or(TrackError::EmptyDocument)?;
        Ok((track, segment))
    }

    pub fn point_count(&self) -> usize {
        self.tracks
            .iter()
            .flat_map(|t| &t.segments)
            .map(|s| s.points.len())
            .sum()
    }
}

pub fn read_gpx<R: BufRead>(reader: R) -> Result<GpxDocument, TrackError> {
    let root = parse_tree(reader)?
        .ok_or_else(|| TrackError::InvalidDocument("document has no root element".to_string()))?;

    if !root.is(GPX_NAMESPACE, "gpx") {
        return Err(TrackError::InvalidDocument(format!(
            "expected root element {{{}}}gpx, found {}",
            GPX_NAMESPACE,
            root.qualified_name()
        )));
    }

    let tracks = root
        .find_all(GPX_NAMESPACE, "trk")
        .map(parse_track)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GpxDocument { tracks })
}

pub fn read_gpx_str(content: &str) -> Result<GpxDocument, TrackError> {
    read_gpx(content.as_bytes())
}

pub fn read_gpx_file(path: &Path) -> Result<GpxDocument, TrackError> {
    let file = File::open(path)?;
    let document = read_gpx(BufReader::new(file))?;

    debug!(
        path = %path.display(),
        tracks = document.tracks.len(),
        points = document.point_count(),
        "read GPX document"
    );
    Ok(document)
}

fn parse_track(element: &XmlElement) -> Result<Track, TrackError> {
    let name = element
        .find(GPX_NAMESPACE, "name")
        .map(|n| n.text.trim().to_string())
        .filter(|n| !n.is_empty());

    let segments = element
        .find_all(GPX_NAMESPACE, "trkseg")
        .map(parse_segment)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Track { name, segments })
}

fn parse_segment(element: &XmlElement) -> Result<TrackSegment, TrackError> {
    let points = element
        .find_all(GPX_NAMESPACE, "trkpt")
        .map(TrackPoint::from_element)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TrackSegment { points })
}
