//! Plot-ready series extracted from a metrics table
//!
//! Rendering happens elsewhere; this module decides what gets plotted against
//! what, and how known device extensions are labelled.

use std::collections::BTreeSet;

use crate::metrics::MetricsRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub label: &'static str,
    pub title: &'static str,
    pub color: &'static str,
}

/// Extensions with a known meaning. Anything else is not charted.
pub const EXTENSION_REGISTRY: [ExtensionInfo; 3] = [
    ExtensionInfo {
        key: "atemp",
        name: "Temperature",
        label: "Temperature (C)",
        title: "Temperature",
        color: "tab:orange",
    },
    ExtensionInfo {
        key: "cad",
        name: "Cadence",
        label: "Cadence",
        title: "Cadence",
        color: "tab:green",
    },
    ExtensionInfo {
        key: "hr",
        name: "Heart Rate",
        label: "Heart Rate (bpm)",
        title: "Heart Rate",
        color: "tab:red",
    },
];

pub fn lookup_extension(key: &str) -> Option<&'static ExtensionInfo> {
    EXTENSION_REGISTRY.iter().find(|info| info.key == key)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub x_label: String,
    pub y_label: String,
    pub color: String,
    /// Plot with the y axis running downwards (faster pace at the top).
    pub invert_y: bool,
    pub y_range: Option<(f64, f64)>,
    pub points: Vec<(f64, f64)>,
}

const DISTANCE_LABEL: &str = "Distance (km)";

fn distance_km(row: &MetricsRow) -> f64 {
    row.cumulative_distance_3d_m / 1000.0
}

pub fn elevation_series(rows: &[MetricsRow]) -> ChartSeries {
    let points: Vec<(f64, f64)> = rows.iter().map(|r| (distance_km(r), r.elevation)).collect();

    // Headroom below the lowest point and well above the highest
    let y_range = rows
        .iter()
        .map(|r| r.elevation)
        .fold(None, |range: Option<(f64, f64)>, e| match range {
            Some((lo, hi)) => Some((lo.min(e), hi.max(e))),
            None => Some((e, e)),
        })
        .map(|(lo, hi)| (lo - 15.0, hi + 200.0));

    ChartSeries {
        name: "Elevation".to_string(),
        x_label: DISTANCE_LABEL.to_string(),
        y_label: "Elevation (m)".to_string(),
        color: "tab:purple".to_string(),
        invert_y: false,
        y_range,
        points,
    }
}

pub fn pace_series(rows: &[MetricsRow]) -> ChartSeries {
    ChartSeries {
        name: "Pace".to_string(),
        x_label: DISTANCE_LABEL.to_string(),
        y_label: "Pace min/km".to_string(),
        color: "#34ACE4".to_string(),
        invert_y: true,
        y_range: None,
        points: rows
            .iter()
            .map(|r| (distance_km(r), r.pace_min_per_km_smoothed))
            .collect(),
    }
}

pub fn route_series(rows: &[MetricsRow]) -> ChartSeries {
    ChartSeries {
        name: "Route".to_string(),
        x_label: "Longitude".to_string(),
        y_label: "Latitude".to_string(),
        color: "tab:orange".to_string(),
        invert_y: false,
        y_range: None,
        points: rows.iter().map(|r| (r.longitude, r.latitude)).collect(),
    }
}

/// One series per registered extension that appears anywhere in the table.
/// Rows without a reading for that extension are left out of its series.
pub fn extension_series(rows: &[MetricsRow]) -> Vec<ChartSeries> {
    let present: BTreeSet<&str> = rows
        .iter()
        .flat_map(|r| r.extensions.keys().map(String::as_str))
        .collect();

    present
        .into_iter()
        .filter_map(lookup_extension)
        .map(|info| ChartSeries {
            name: info.name.to_string(),
            x_label: DISTANCE_LABEL.to_string(),
            y_label: info.label.to_string(),
            color: info.color.to_string(),
            invert_y: false,
            y_range: None,
            points: rows
                .iter()
                .filter_map(|r| r.extensions.get(info.key).map(|&v| (distance_km(r), v)))
                .collect(),
        })
        .collect()
}

pub fn chart_series(rows: &[MetricsRow]) -> Vec<ChartSeries> {
    let mut series = vec![elevation_series(rows), pace_series(rows), route_series(rows)];
    series.extend(extension_series(rows));
    series
}
