//! Derive distance, elevation, speed and pace series from GPX tracks.

pub mod batch;
pub mod chart_series;
pub mod error;
pub mod geodesic;
pub mod gpx_reader;
pub mod metrics;
pub mod report;
pub mod smoothing;
pub mod summary;
pub mod track_point;
mod xml_tree;

pub use error::TrackError;
pub use gpx_reader::{read_gpx, read_gpx_file, read_gpx_str, GpxDocument, Track, TrackSegment};
pub use metrics::{compute_metrics, MetricsConfig, MetricsRow};
pub use summary::{summarize, Summary};
pub use track_point::TrackPoint;
