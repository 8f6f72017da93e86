//! Point stream to metrics table
//!
//! Every row is derived from the point before it: haversine step, elevation
//! step, their Pythagorean combination, elapsed time, speed and pace. The
//! elevation and pace series are then median-smoothed over a forward window.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use crate::error::TrackError;
use crate::geodesic::haversine_distance;
use crate::smoothing::median_smooth;
use crate::track_point::TrackPoint;

/// Converts a speed in m/s into a pace in min/km: 1000 m / 60 s.
pub const METRES_PER_SECOND_TO_MIN_PER_KM: f64 = 1000.0 / 60.0;

pub const DEFAULT_SMOOTHING_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsConfig {
    /// Number of points in the forward median window (the point itself included).
    pub window_size: usize,
    /// Pace (min/km) of a 1 m/s speed.
    pub unit_conversion: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            window_size: DEFAULT_SMOOTHING_WINDOW,
            unit_conversion: METRES_PER_SECOND_TO_MIN_PER_KM,
        }
    }
}

impl MetricsConfig {
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRow {
    pub longitude: f64,
    pub latitude: f64,
    pub elevation: f64,
    pub timestamp: DateTime<FixedOffset>,
    pub cumulative_distance_2d_m: f64,
    pub cumulative_distance_3d_m: f64,
    /// Smoothed elevation change from the previous point.
    pub elevation_delta_m: f64,
    pub time_delta_s: f64,
    pub speed_mps: f64,
    pub pace_min_per_km: f64,
    pub pace_min_per_km_smoothed: f64,
    pub extensions: BTreeMap<String, f64>,
}

/// Signed elapsed seconds from `start` to `stop`, sub-second precision kept.
pub fn elapsed_seconds(start: &DateTime<FixedOffset>, stop: &DateTime<FixedOffset>) -> f64 {
    let delta = stop.signed_duration_since(*start);
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        // Spans beyond ~292 years overflow i64 nanoseconds
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// Distance over time, or 0 when no time has passed.
pub fn speed_mps(distance_m: f64, time_delta_s: f64) -> f64 {
    if time_delta_s == 0.0 {
        0.0
    } else {
        distance_m / time_delta_s
    }
}

/// Pace in min/km for a speed in m/s, or 0 for a standing start.
pub fn pace_min_per_km(speed_mps: f64, unit_conversion: f64) -> f64 {
    if speed_mps == 0.0 {
        0.0
    } else {
        unit_conversion / speed_mps
    }
}

/// Straight-line combination of a surface step and an elevation step.
pub fn distance_3d(distance_2d_m: f64, elevation_delta_m: f64) -> f64 {
    (distance_2d_m.powi(2) + elevation_delta_m.powi(2)).sqrt()
}

/// Build the metrics table for one segment. Empty input gives an empty table.
pub fn compute_metrics(
    points: &[TrackPoint],
    config: &MetricsConfig,
) -> Result<Vec<MetricsRow>, TrackError> {
    if config.window_size == 0 {
        return Err(TrackError::InvalidConfig(
            "smoothing window must hold at least one point".to_string(),
        ));
    }
    if points.is_empty() {
        return Ok(Vec::new());
    }

    let n = points.len();
    let mut cumulative_2d = Vec::with_capacity(n);
    let mut cumulative_3d = Vec::with_capacity(n);
    let mut elevation_deltas = Vec::with_capacity(n);
    let mut time_deltas = Vec::with_capacity(n);
    let mut speeds = Vec::with_capacity(n);
    let mut paces = Vec::with_capacity(n);

    cumulative_2d.push(0.0);
    cumulative_3d.push(0.0);
    elevation_deltas.push(0.0);
    time_deltas.push(0.0);
    speeds.push(0.0);
    paces.push(0.0);

    for (i, pair) in points.windows(2).enumerate() {
        let (start, stop) = (&pair[0], &pair[1]);

        if stop.timestamp <= start.timestamp {
            return Err(TrackError::NonChronological { index: i + 1 });
        }

        let step_2d = haversine_distance(start.lat_lon(), stop.lat_lon());
        let elevation_delta = stop.elevation - start.elevation;
        let step_3d = distance_3d(step_2d, elevation_delta);
        let time_delta = elapsed_seconds(&start.timestamp, &stop.timestamp);
        let speed = speed_mps(step_3d, time_delta);

        cumulative_2d.push(cumulative_2d[i] + step_2d);
        cumulative_3d.push(cumulative_3d[i] + step_3d);
        elevation_deltas.push(elevation_delta);
        time_deltas.push(time_delta);
        speeds.push(speed);
        paces.push(pace_min_per_km(speed, config.unit_conversion));
    }

    let smoothed_elevation = median_smooth(&elevation_deltas, config.window_size);
    let smoothed_pace = median_smooth(&paces, config.window_size);

    let rows: Vec<MetricsRow> = points
        .iter()
        .enumerate()
        .map(|(i, point)| MetricsRow {
            longitude: point.longitude,
            latitude: point.latitude,
            elevation: point.elevation,
            timestamp: point.timestamp,
            cumulative_distance_2d_m: cumulative_2d[i],
            cumulative_distance_3d_m: cumulative_3d[i],
            elevation_delta_m: smoothed_elevation[i],
            time_delta_s: time_deltas[i],
            speed_mps: speeds[i],
            pace_min_per_km: paces[i],
            pace_min_per_km_smoothed: smoothed_pace[i],
            extensions: point.extensions.clone(),
        })
        .collect();

    debug!(
        points = n,
        distance_m = cumulative_2d[n - 1],
        window = config.window_size,
        "computed metrics"
    );

    Ok(rows)
}
