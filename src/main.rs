use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gpx_pace_metrics::batch::{run_batch, BatchOptions};
use gpx_pace_metrics::metrics::{MetricsConfig, DEFAULT_SMOOTHING_WINDOW};
use gpx_pace_metrics::report::{print_metrics_table, print_summary, write_summary_csv};

#[derive(Parser, Debug)]
#[command(author, version, about = "Distance, elevation and pace metrics for GPX tracks", long_about = None)]
struct Cli {
    /// Folder searched recursively for .gpx files
    #[arg(short, long, default_value = "gpxfiles")]
    input: PathBuf,

    /// Folder receiving one sub-folder of CSV files per track
    #[arg(short, long, default_value = "results")]
    output: PathBuf,

    /// Points in the forward median window used to smooth elevation and pace
    #[arg(short, long, default_value_t = DEFAULT_SMOOTHING_WINDOW)]
    window: usize,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Print summaries only, write no CSV files
    #[arg(long, action = ArgAction::SetTrue)]
    no_export: bool,

    /// Print the full metrics table after each summary
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let jobs = cli.jobs.unwrap_or_else(num_cpus::get).max(1);
    rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build_global()
        .context("failed to start worker pool")?;

    let options = BatchOptions {
        input_dir: cli.input,
        output_dir: cli.output,
        config: MetricsConfig::default().with_window_size(cli.window),
        export: !cli.no_export,
    };

    println!("\n🏃 GPX PACE METRICS");
    println!("===================");
    println!("📁 Input folder: {}", options.input_dir.display());
    println!("⚡ Using parallel processing on {} threads", jobs);
    println!("🔧 Median smoothing window: {} points\n", options.config.window_size);

    let reports = run_batch(&options)
        .with_context(|| format!("failed to scan {}", options.input_dir.display()))?;

    let mut processed_count = 0;
    let mut error_count = 0;

    for report in &reports {
        match &report.outcome {
            Ok(analysis) => {
                processed_count += 1;
                print_summary(&analysis.track_name, &analysis.summary);
                if cli.verbose {
                    print_metrics_table(&analysis.rows);
                }
            }
            Err(e) => {
                error_count += 1;
                println!("❌ {}: {}", report.file_name, e);
            }
        }
    }

    if options.export && !reports.is_empty() {
        let summary_path = options.output_dir.join("summary.csv");
        write_summary_csv(&reports, &summary_path)
            .with_context(|| format!("failed to write {}", summary_path.display()))?;
        println!("\n📊 Summary saved to: {}", summary_path.display());
    }

    println!("\n✅ Processed {} out of {} GPX files", processed_count, reports.len());
    if error_count > 0 {
        println!("⚠️  {} file(s) could not be processed", error_count);
    }

    Ok(())
}
