//! Console summary and CSV export of processed tracks.

use std::collections::BTreeSet;
use std::path::Path;

use csv::Writer;
use serde::Serialize;

use crate::batch::FileReport;
use crate::chart_series::ChartSeries;
use crate::error::TrackError;
use crate::metrics::MetricsRow;
use crate::summary::{format_distance, format_duration, format_pace, Summary};

const SEPARATOR_WIDTH: usize = 120;

pub fn print_summary(name: &str, summary: &Summary) {
    println!("Results for {}", name);
    println!("{}", "-".repeat(SEPARATOR_WIDTH));
    println!("Distance : {}", format_distance(summary.total_distance_m));
    println!("Total time : {}", format_duration(summary.total_time_s));
    println!("Average Pace : {}", format_pace(summary.average_pace_min_per_km));
    println!("Gain = {}m", summary.elevation_gain_m.floor() as i64);
    println!("{}", "-".repeat(SEPARATOR_WIDTH));
}

/// Every metrics row under a column header, printed after the summary block
/// when the user asks for the full table.
pub fn print_metrics_table(rows: &[MetricsRow]) {
    for line in metrics_table_lines(rows) {
        println!("{}", line);
    }
}

fn metrics_table_lines(rows: &[MetricsRow]) -> Vec<String> {
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!(
        "{:>6} {:>12} {:>11} {:>8} {:<25} {:>11} {:>11} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "", "long", "lat", "elev", "time", "dist_2D", "dist_3D", "ele_diff", "t_diff",
        "speed", "pace", "pace_sm"
    ));
    for (i, row) in rows.iter().enumerate() {
        lines.push(format!(
            "{:>6} {:>12.6} {:>11.6} {:>8.1} {:<25} {:>11.3} {:>11.3} {:>8.3} {:>8.1} {:>8.3} {:>8.3} {:>8.3}",
            i,
            row.longitude,
            row.latitude,
            row.elevation,
            row.timestamp.to_rfc3339(),
            row.cumulative_distance_2d_m,
            row.cumulative_distance_3d_m,
            row.elevation_delta_m,
            row.time_delta_s,
            row.speed_mps,
            row.pace_min_per_km,
            row.pace_min_per_km_smoothed,
        ));
    }
    lines.push(format!("[{} rows x 11 columns]", rows.len()));
    lines
}

/// Folder-safe version of a track name: anything other than letters, digits,
/// `_`, `-`, `.`, parentheses and spaces becomes `_`.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            c if c.is_alphanumeric() => c,
            '_' | '-' | '.' | '(' | ')' | ' ' => c,
            _ => '_',
        })
        .collect();

    let cleaned = cleaned.trim();
    // "." and ".." would escape the output folder
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned.to_string()
    }
}

/// One line per point. Extension columns cover every key seen in the table
/// and stay blank where a point has no reading.
pub fn write_metrics_csv(rows: &[MetricsRow], path: &Path) -> Result<(), TrackError> {
    let extension_keys: BTreeSet<&str> = rows
        .iter()
        .flat_map(|r| r.extensions.keys().map(String::as_str))
        .collect();

    let mut wtr = Writer::from_path(path)?;

    let mut header = vec![
        "long".to_string(),
        "lat".to_string(),
        "elev".to_string(),
        "time".to_string(),
        "dist_hav_2D".to_string(),
        "dist_hav_3D".to_string(),
        "elevation_diff".to_string(),
        "time_diff".to_string(),
        "speed".to_string(),
        "pace_km".to_string(),
        "pace_km_smoothed".to_string(),
    ];
    header.extend(extension_keys.iter().map(|key| format!("ext:{}", key)));
    wtr.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.longitude.to_string(),
            row.latitude.to_string(),
            row.elevation.to_string(),
            row.timestamp.to_rfc3339(),
            format!("{:.3}", row.cumulative_distance_2d_m),
            format!("{:.3}", row.cumulative_distance_3d_m),
            format!("{:.3}", row.elevation_delta_m),
            format!("{:.3}", row.time_delta_s),
            format!("{:.4}", row.speed_mps),
            format!("{:.4}", row.pace_min_per_km),
            format!("{:.4}", row.pace_min_per_km_smoothed),
        ];
        for key in &extension_keys {
            record.push(
                row.extensions
                    .get(*key)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_series_csv(series: &ChartSeries, path: &Path) -> Result<(), TrackError> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record([series.x_label.as_str(), series.y_label.as_str()])?;
    for (x, y) in &series.points {
        wtr.write_record([x.to_string(), y.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct SummaryRecord<'a> {
    #[serde(rename = "File")]
    file: &'a str,
    #[serde(rename = "Track_Name")]
    track_name: &'a str,
    #[serde(rename = "Points")]
    points: usize,
    #[serde(rename = "Distance_km")]
    distance_km: String,
    #[serde(rename = "Total_Time")]
    total_time: String,
    #[serde(rename = "Average_Pace_min_per_km")]
    average_pace: String,
    #[serde(rename = "Elevation_Gain_m")]
    elevation_gain_m: String,
    #[serde(rename = "Status")]
    status: String,
}

/// Batch-level table, failed files included with their error as status.
pub fn write_summary_csv(reports: &[FileReport], path: &Path) -> Result<(), TrackError> {
    let mut wtr = Writer::from_path(path)?;

    for report in reports {
        let record = match &report.outcome {
            Ok(analysis) => SummaryRecord {
                file: &report.file_name,
                track_name: &analysis.track_name,
                points: analysis.summary.point_count,
                distance_km: format!("{:.3}", analysis.summary.total_distance_m / 1000.0),
                total_time: format_duration(analysis.summary.total_time_s),
                average_pace: format!("{:.3}", analysis.summary.average_pace_min_per_km),
                elevation_gain_m: format!("{:.1}", analysis.summary.elevation_gain_m),
                status: "SUCCESS".to_string(),
            },
            Err(e) => SummaryRecord {
                file: &report.file_name,
                track_name: "",
                points: 0,
                distance_km: String::new(),
                total_time: String::new(),
                average_pace: String::new(),
                elevation_gain_m: String::new(),
                status: format!("ERROR: {}", e),
            },
        };
        wtr.serialize(record)?;
    }

    wtr.flush()?;
    Ok(())
}
