//! Scalar totals over a metrics table.

use serde::Serialize;

use crate::metrics::MetricsRow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub point_count: usize,
    pub total_time_s: f64,
    pub total_distance_m: f64,
    /// Mean of every row's pace, the zero of the first row included.
    pub average_pace_min_per_km: f64,
    /// Sum of the positive smoothed elevation deltas; descents are not netted.
    pub elevation_gain_m: f64,
}

pub fn summarize(rows: &[MetricsRow]) -> Summary {
    if rows.is_empty() {
        return Summary::default();
    }

    let total_time_s = rows.iter().map(|r| r.time_delta_s).sum::<f64>();
    let total_distance_m = rows
        .last()
        .map(|r| r.cumulative_distance_2d_m)
        .unwrap_or(0.0);
    let average_pace_min_per_km =
        rows.iter().map(|r| r.pace_min_per_km).sum::<f64>() / rows.len() as f64;
    let elevation_gain_m = rows
        .iter()
        .map(|r| r.elevation_delta_m)
        .filter(|&delta| delta > 0.0)
        .sum::<f64>();

    Summary {
        point_count: rows.len(),
        total_time_s,
        total_distance_m,
        average_pace_min_per_km,
        elevation_gain_m,
    }
}

/// `12.345km`
pub fn format_distance(metres: f64) -> String {
    let metres = metres.max(0.0);
    let km = (metres / 1000.0).floor();
    let remainder = (metres % 1000.0).floor();
    format!("{}.{:03}km", km as u64, remainder as u64)
}

/// `1:02:03`
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{}:{:02}:{:02}", hours, minutes, secs)
}

/// `5:30/km`
pub fn format_pace(min_per_km: f64) -> String {
    let pace = min_per_km.max(0.0);
    let minutes = pace.floor();
    let seconds = (60.0 * (pace - minutes)).floor();
    format!("{}:{:02}/km", minutes as u64, seconds as u64)
}
