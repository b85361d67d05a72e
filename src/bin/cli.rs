//! fixeval CLI - Positional accuracy evaluation of recorded location fixes
//!
//! Usage:
//!   fixeval-cli evaluate <dataset> [--config <file>] [--chart <png|svg>] [--map <html>]
//!   fixeval-cli timeline <dataset> [--config <file>] [--chart <png|svg>] [--map <html>]
//!   fixeval-cli distance <lat1> <lon1> <lat2> <lon2>
//!   fixeval-cli dump-config [--timeline]
//!
//! `evaluate` pairs every recorded fix with its route's reference point,
//! prints per-mode error percentiles and optionally writes the CDF chart and
//! a map of routes and fixes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fixeval::aggregate::run_evaluation;
use fixeval::geo_utils::haversine_distance;
use fixeval::render::{self, ChartOptions};
use fixeval::{
    discover_dataset, load_timelines, EvalConfig, EvalError, FileFailure, GeoPoint, ModeSummary,
    Result, TimelineConfig,
};

#[derive(Parser)]
#[command(name = "fixeval-cli")]
#[command(about = "Positional accuracy evaluation of recorded location fixes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare recorded fixes with reference routes and report error percentiles
    Evaluate {
        /// Dataset root: <route>/<mode>/*.json
        dataset: PathBuf,

        /// JSON file with routes and accuracy modes (defaults to the built-in routes)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the error-distance CDF chart (.png or .svg)
        #[arg(long)]
        chart: Option<PathBuf>,

        /// Upper bound of the chart's distance axis in meters
        #[arg(long)]
        x_max: Option<f64>,

        /// Write an interactive Leaflet map
        #[arg(short, long)]
        map: Option<PathBuf>,

        /// Write the map overlay as GeoJSON
        #[arg(long)]
        geojson: Option<PathBuf>,

        /// Write per-mode CDF tables and percentiles as JSON
        #[arg(long)]
        cdf_json: Option<PathBuf>,

        /// Print the full CDF table of every mode
        #[arg(long)]
        print_cdf: bool,
    },

    /// Plot cumulative GPS-fix counters of tracking strategies over time
    Timeline {
        /// Dataset root: <STRATEGY>/<unix_seconds>.json
        dataset: PathBuf,

        /// JSON file listing the strategies (defaults to the built-in set)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the fix-count chart (.png or .svg)
        #[arg(long)]
        chart: Option<PathBuf>,

        /// Write an interactive Leaflet map of snapshot positions
        #[arg(short, long)]
        map: Option<PathBuf>,

        /// Write the map overlay as GeoJSON
        #[arg(long)]
        geojson: Option<PathBuf>,
    },

    /// Great-circle distance in meters between two points
    #[command(allow_negative_numbers = true)]
    Distance {
        lat1: f64,
        lon1: f64,
        lat2: f64,
        lon2: f64,
    },

    /// Print the built-in configuration as JSON
    DumpConfig {
        /// Print the timeline strategies instead of routes and modes
        #[arg(long)]
        timeline: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let result = match cli.command {
        Commands::Evaluate {
            dataset,
            config,
            chart,
            x_max,
            map,
            geojson,
            cdf_json,
            print_cdf,
        } => run_evaluate(
            &dataset,
            config.as_deref(),
            &Outputs {
                chart,
                map,
                geojson,
            },
            x_max,
            cdf_json.as_deref(),
            print_cdf,
        ),
        Commands::Timeline {
            dataset,
            config,
            chart,
            map,
            geojson,
        } => run_timeline(
            &dataset,
            config.as_deref(),
            &Outputs {
                chart,
                map,
                geojson,
            },
        ),
        Commands::Distance {
            lat1,
            lon1,
            lat2,
            lon2,
        } => {
            let d = haversine_distance(&GeoPoint::new(lat1, lon1), &GeoPoint::new(lat2, lon2));
            println!("{:.3}", d);
            Ok(())
        }
        Commands::DumpConfig { timeline } => dump_config(timeline),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Optional output files shared by both experiments
struct Outputs {
    chart: Option<PathBuf>,
    map: Option<PathBuf>,
    geojson: Option<PathBuf>,
}

fn banner(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{}", title);
    println!("{}", "=".repeat(60));
}

fn report_failures(failures: &[FileFailure]) {
    if failures.is_empty() {
        return;
    }
    println!("\nSkipped files ({}):", failures.len());
    for failure in failures {
        println!("  [ERR] {}", failure.error);
    }
}

fn run_evaluate(
    dataset: &Path,
    config_path: Option<&Path>,
    outputs: &Outputs,
    x_max: Option<f64>,
    cdf_json: Option<&Path>,
    print_cdf: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => EvalConfig::from_json_file(path)?,
        None => EvalConfig::default(),
    };

    banner(&format!("Loading fixes from: {}", dataset.display()));
    let data = discover_dataset(dataset, &config)?;
    println!(
        "  {} groups, {} fixes, {} routes, {} accuracy modes",
        data.groups.len(),
        data.fix_count(),
        config.routes.len(),
        config.modes.len()
    );
    report_failures(&data.failures);

    let evaluation = run_evaluation(&data.groups, &config)?;
    report_failures(&evaluation.failures);

    let mismatches: Vec<_> = evaluation.mismatches().collect();
    if !mismatches.is_empty() {
        println!("\nExcluded groups ({}):", mismatches.len());
        for outcome in mismatches {
            if let Some(error) = outcome.mismatch_error() {
                println!("  [WARN] {}", error);
            }
        }
    }

    let summaries = evaluation.aggregator.summaries();

    banner("ERROR DISTANCES");
    for summary in &summaries {
        print_summary(summary, print_cdf);
    }

    if let Some(path) = &outputs.chart {
        let opts = ChartOptions {
            x_max,
            ..ChartOptions::default()
        };
        render::render_cdf_chart(path, &summaries, &opts)?;
        println!("\n[Export] CDF chart: {}", path.display());
    }

    if let Some(path) = cdf_json {
        let text = serde_json::to_string_pretty(&summaries).map_err(|source| EvalError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text).map_err(|source| EvalError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        println!("[Export] CDF tables: {}", path.display());
    }

    if outputs.map.is_some() || outputs.geojson.is_some() {
        let overlay = render::evaluation_overlay(&config, &evaluation.outcomes);
        write_overlay(outputs, "Fix accuracy", &overlay)?;
    }

    Ok(())
}

fn print_summary(summary: &ModeSummary, print_cdf: bool) {
    match (&summary.cdf, &summary.percentiles) {
        (Some(cdf), Some(p)) => {
            println!(
                "  {:<12} n={:<5} p50={:>8.2}m  p95={:>8.2}m  max={:>8.2}m",
                summary.mode.label,
                summary.sample_count,
                p.p50,
                p.p95,
                cdf.max_distance()
            );
            if print_cdf {
                for point in cdf.points() {
                    println!("      {:>10.3}m  {:.4}", point.distance, point.fraction);
                }
            }
        }
        _ => println!("  {:<12} no data", summary.mode.label),
    }
}

fn write_overlay(outputs: &Outputs, title: &str, overlay: &render::MapOverlay) -> Result<()> {
    if let Some(bounds) = &overlay.bounds {
        let center = bounds.center();
        println!(
            "[Export] Map center: [{:.5}, {:.5}]",
            center.latitude, center.longitude
        );
    }
    if let Some(path) = &outputs.geojson {
        render::write_geojson(path, overlay)?;
        println!("[Export] GeoJSON: {}", path.display());
    }
    if let Some(path) = &outputs.map {
        render::write_leaflet_html(path, title, overlay)?;
        println!("[Export] Map: {}", path.display());
    }
    Ok(())
}

fn run_timeline(dataset: &Path, config_path: Option<&Path>, outputs: &Outputs) -> Result<()> {
    let config = match config_path {
        Some(path) => TimelineConfig::from_json_file(path)?,
        None => TimelineConfig::default(),
    };

    banner(&format!("Loading snapshots from: {}", dataset.display()));
    let timelines = load_timelines(dataset, &config)?;
    report_failures(&timelines.failures);

    banner("GPS FIXES");
    for series in &timelines.series {
        if series.samples.is_empty() {
            println!("  {:<20} no data", series.strategy.label);
            continue;
        }
        println!(
            "  {:<20} snapshots={:<5} duration={:>6}s  fixes={}",
            series.strategy.label,
            series.samples.len(),
            series.duration_secs(),
            series.total_fixes()
        );
    }

    if let Some(path) = &outputs.chart {
        render::render_timeline_chart(path, &timelines.series, &ChartOptions::default())?;
        println!("\n[Export] Timeline chart: {}", path.display());
    }

    if outputs.map.is_some() || outputs.geojson.is_some() {
        let overlay = render::timeline_overlay(&config, &timelines.series);
        write_overlay(outputs, "GPS fixes", &overlay)?;
    }

    Ok(())
}

fn dump_config(timeline: bool) -> Result<()> {
    let text = if timeline {
        TimelineConfig::default().to_json_pretty()?
    } else {
        EvalConfig::default().to_json_pretty()?
    };
    println!("{}", text);
    Ok(())
}
