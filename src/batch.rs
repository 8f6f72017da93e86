//! Folder-level driver: find GPX files, process them in parallel and export
//! the results. A failing file is reported and never stops the others.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::chart_series::chart_series;
use crate::error::TrackError;
use crate::gpx_reader::read_gpx_file;
use crate::metrics::{compute_metrics, MetricsConfig, MetricsRow};
use crate::report::{sanitize_name, write_metrics_csv, write_series_csv};
use crate::summary::{summarize, Summary};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config: MetricsConfig,
    /// Write per-track CSV files under `output_dir`.
    pub export: bool,
}

#[derive(Debug, Clone)]
pub struct TrackAnalysis {
    pub track_name: String,
    pub rows: Vec<MetricsRow>,
    pub summary: Summary,
    pub exported_files: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub file_name: String,
    pub outcome: Result<TrackAnalysis, TrackError>,
}

/// Every `.gpx` file below `dir` (any case), sorted for stable output.
pub fn collect_gpx_files(dir: &Path) -> Result<Vec<PathBuf>, TrackError> {
    let mut gpx_files = Vec::new();

    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_gpx = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("gpx"))
            .unwrap_or(false);
        if is_gpx {
            gpx_files.push(entry.into_path());
        }
    }

    gpx_files.sort();
    Ok(gpx_files)
}

/// Read one file and analyse the first segment of its first track.
pub fn process_file(path: &Path, options: &BatchOptions) -> Result<TrackAnalysis, TrackError> {
    let document = read_gpx_file(path)?;
    let (track, segment) = document.first_segment()?;

    let track_name = match track.require_name() {
        Ok(name) => name.to_string(),
        Err(_) => {
            let fallback = file_stem(path);
            debug!(path = %path.display(), fallback = %fallback, "track has no name, using file name");
            fallback
        }
    };

    let rows = compute_metrics(&segment.points, &options.config)?;
    let summary = summarize(&rows);

    let exported_files = if options.export {
        let folder_name = export_folder_name(path, &options.input_dir, &track_name);
        export_track(&folder_name, &rows, &options.output_dir)?
    } else {
        Vec::new()
    };

    Ok(TrackAnalysis {
        track_name,
        rows,
        summary,
        exported_files,
    })
}

/// Output folder for one input file. Track names repeat across files
/// ("Morning Run"), so the file's path below `input_dir` is always part of it:
/// `Morning Run (2024_run)`, or just `2024_run` when the track is named after
/// its file.
pub fn export_folder_name(path: &Path, input_dir: &Path, track_name: &str) -> String {
    let relative = path.strip_prefix(input_dir).unwrap_or(path).with_extension("");
    let file_key = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("_");

    if file_key == track_name {
        sanitize_name(&file_key)
    } else {
        sanitize_name(&format!("{} ({})", track_name, file_key))
    }
}

/// `<output>/<folder>/metrics.csv` plus one CSV per chart series.
pub fn export_track(
    folder_name: &str,
    rows: &[MetricsRow],
    output_dir: &Path,
) -> Result<Vec<PathBuf>, TrackError> {
    let folder = output_dir.join(sanitize_name(folder_name));
    fs::create_dir_all(&folder)?;

    let mut written = Vec::new();

    let metrics_path = folder.join("metrics.csv");
    write_metrics_csv(rows, &metrics_path)?;
    written.push(metrics_path);

    for series in chart_series(rows) {
        let series_path = folder.join(format!("{}.csv", sanitize_name(&series.name)));
        write_series_csv(&series, &series_path)?;
        written.push(series_path);
    }

    Ok(written)
}

pub fn run_batch(options: &BatchOptions) -> Result<Vec<FileReport>, TrackError> {
    let gpx_files = collect_gpx_files(&options.input_dir)?;
    info!(
        count = gpx_files.len(),
        input = %options.input_dir.display(),
        "found GPX files"
    );

    if options.export {
        fs::create_dir_all(&options.output_dir)?;
    }

    let reports: Vec<FileReport> = gpx_files
        .par_iter()
        .map(|path| {
            let outcome = process_file(path, options);
            match &outcome {
                Ok(analysis) => debug!(
                    path = %path.display(),
                    points = analysis.summary.point_count,
                    "processed"
                ),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to process file"),
            }
            FileReport {
                path: path.clone(),
                file_name: file_name(path),
                outcome,
            }
        })
        .collect();

    Ok(reports)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <trkseg>
      <trkpt lat="0.0" lon="0.0"><ele>0</ele><time>2020-03-01T09:00:00Z</time>
        <extensions><hr>120</hr></extensions></trkpt>
      <trkpt lat="0.0" lon="0.01"><ele>0</ele><time>2020-03-01T09:00:10Z</time></trkpt>
      <trkpt lat="0.0" lon="0.02"><ele>10</ele><time>2020-03-01T09:00:20Z</time>
        <extensions><hr>131</hr></extensions></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    const WRONG_ROOT: &str = r#"<kml xmlns="http://www.opengis.net/kml/2.2"></kml>"#;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "gpx-pace-metrics-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_collects_gpx_files_recursively() {
        let dir = scratch_dir("collect");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("b.gpx"), VALID).unwrap();
        fs::write(dir.join("nested").join("a.GPX"), VALID).unwrap();
        fs::write(dir.join("notes.txt"), "not a track").unwrap();

        let files = collect_gpx_files(&dir).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap().eq_ignore_ascii_case("gpx")));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_bad_file_does_not_abort_batch() {
        let input = scratch_dir("batch-in");
        let output = scratch_dir("batch-out");
        fs::write(input.join("good.gpx"), VALID).unwrap();
        fs::write(input.join("bad.gpx"), WRONG_ROOT).unwrap();

        let options = BatchOptions {
            input_dir: input.clone(),
            output_dir: output.clone(),
            config: MetricsConfig::default(),
            export: true,
        };
        let reports = run_batch(&options).unwrap();
        assert_eq!(reports.len(), 2);

        let bad = reports.iter().find(|r| r.file_name == "bad.gpx").unwrap();
        assert!(matches!(bad.outcome, Err(TrackError::InvalidDocument(_))));

        let good = reports.iter().find(|r| r.file_name == "good.gpx").unwrap();
        let analysis = good.outcome.as_ref().unwrap();
        // No <name>: falls back to the file stem
        assert_eq!(analysis.track_name, "good");
        assert_eq!(analysis.rows.len(), 3);
        assert!(output.join("good").join("metrics.csv").exists());
        assert!(output.join("good").join("Heart Rate.csv").exists());
        assert!(analysis.exported_files.iter().all(|p| p.exists()));

        fs::remove_dir_all(&input).unwrap();
        fs::remove_dir_all(&output).unwrap();
    }

    #[test]
    fn test_shared_track_names_export_to_separate_folders() {
        let input = scratch_dir("dup-in");
        let output = scratch_dir("dup-out");
        let named = VALID.replace("<trk>", "<trk><name>Morning Run</name>");
        let shorter = named.replace(
            r#"<trkpt lat="0.0" lon="0.02"><ele>10</ele><time>2020-03-01T09:00:20Z</time>
        <extensions><hr>131</hr></extensions></trkpt>"#,
            "",
        );
        fs::create_dir_all(input.join("week2")).unwrap();
        fs::write(input.join("monday.gpx"), &named).unwrap();
        fs::write(input.join("tuesday.gpx"), &shorter).unwrap();
        fs::write(input.join("week2").join("monday.gpx"), &named).unwrap();

        let options = BatchOptions {
            input_dir: input.clone(),
            output_dir: output.clone(),
            config: MetricsConfig::default(),
            export: true,
        };
        let reports = run_batch(&options).unwrap();
        assert_eq!(reports.len(), 3);

        let metrics_files: Vec<PathBuf> = reports
            .iter()
            .map(|r| r.outcome.as_ref().unwrap().exported_files[0].clone())
            .collect();
        assert_ne!(metrics_files[0], metrics_files[1]);
        assert_ne!(metrics_files[0], metrics_files[2]);
        assert_ne!(metrics_files[1], metrics_files[2]);

        let row_count = |folder: &str| {
            let mut rdr = csv::Reader::from_path(output.join(folder).join("metrics.csv")).unwrap();
            rdr.records().count()
        };
        assert_eq!(row_count("Morning Run (monday)"), 3);
        assert_eq!(row_count("Morning Run (tuesday)"), 2);
        assert_eq!(row_count("Morning Run (week2_monday)"), 3);
        assert!(!output.join("Morning Run").exists());

        fs::remove_dir_all(&input).unwrap();
        fs::remove_dir_all(&output).unwrap();
    }

    #[test]
    fn test_export_folder_name() {
        let input = Path::new("runs");
        assert_eq!(export_folder_name(&input.join("good.gpx"), input, "good"), "good");
        assert_eq!(
            export_folder_name(&input.join("a").join("b.gpx"), input, "Hill: reps"),
            "Hill_ reps (a_b)"
        );
    }

    #[test]
    fn test_process_without_export() {
        let dir = scratch_dir("no-export");
        let path = dir.join("run.gpx");
        fs::write(&path, VALID).unwrap();

        let options = BatchOptions {
            input_dir: dir.clone(),
            output_dir: dir.join("out"),
            config: MetricsConfig::default(),
            export: false,
        };
        let analysis = process_file(&path, &options).unwrap();
        assert!(analysis.exported_files.is_empty());
        assert!(!dir.join("out").exists());
        assert!(analysis.summary.total_distance_m > 2200.0);

        fs::remove_dir_all(&dir).unwrap();
    }
}
