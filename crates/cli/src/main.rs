//! Mangrove CLI - spatial analysis of mangrove monitoring points

mod config;
mod input;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use mangrove_algorithms::interpolation::VariogramModel;
use mangrove_core::store::{field_summary, health_distribution};
use mangrove_core::{GridSpec, HealthStatus};
use mangrove_engine::{
    AnalysisEngine, AnalysisRequest, AnalysisResult, BufferTarget, IdwParams, InterpolationMethod, KrigingParams,
    MethodKind, Overlay, SplineParams, Variogram,
};

use config::Config;
use input::{parse_bbox, parse_ids, read_points};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "mangrove")]
#[command(author, version, about = "Spatial analysis of mangrove monitoring data", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (default: ./mangrove.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise a points file: health classes and field statistics
    Summary {
        /// Input points file (JSON array)
        input: PathBuf,
        /// Fields to summarise
        #[arg(short, long, value_delimiter = ',', default_value = "coverage,height,pest")]
        fields: Vec<String>,
    },
    /// Interpolate a field onto a regular grid
    Interpolate {
        /// Input points file (JSON array)
        input: PathBuf,
        /// Field to interpolate (`health` uses the health class score)
        #[arg(short, long, default_value = "coverage")]
        field: String,
        /// Method: idw, kriging, spline (default from config)
        #[arg(short, long)]
        method: Option<MethodKind>,
        /// Cell size in degrees
        #[arg(long, default_value = "0.0005")]
        cell_size: f64,
        /// Grid extent 'min_lng,min_lat,max_lng,max_lat' (default: around the points)
        #[arg(long)]
        bbox: Option<String>,
        /// Padding around the points when no extent is given, in degrees
        #[arg(long, default_value = "0.002")]
        margin: f64,
        /// IDW power parameter
        #[arg(long, default_value = "2.0")]
        power: f64,
        /// Kriging variogram model
        #[arg(long, value_enum, default_value = "spherical")]
        model: ModelArg,
        /// Kriging nugget
        #[arg(long, default_value = "0.0")]
        nugget: f64,
        /// Kriging sill
        #[arg(long, default_value = "1.0")]
        sill: f64,
        /// Kriging range in metres
        #[arg(long, default_value = "500")]
        range: f64,
        /// Also compute the kriging variance
        #[arg(long)]
        variance: bool,
        /// Spline smoothing (0 = exact interpolation)
        #[arg(long, default_value = "0.0")]
        smoothing: f64,
        /// Write the full result as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Buffer monitoring points by a radius
    Buffer {
        /// Input points file (JSON array)
        input: PathBuf,
        /// Radius in metres (default from config)
        #[arg(short, long)]
        radius: Option<f64>,
        /// Only these point ids, comma separated
        #[arg(long)]
        ids: Option<String>,
        /// Combine the zones
        #[arg(long, value_enum, default_value = "none")]
        overlay: OverlayArg,
        /// Vertices per circle (default from config)
        #[arg(long)]
        vertices: Option<usize>,
        /// Write the full result as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Empirical variogram of a field, to help choose kriging parameters
    Variogram {
        /// Input points file (JSON array)
        input: PathBuf,
        #[arg(short, long, default_value = "coverage")]
        field: String,
        /// Number of lag bins
        #[arg(long, default_value = "8")]
        lags: usize,
        /// Largest lag in metres (default: half the largest separation)
        #[arg(long)]
        max_lag: Option<f64>,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelArg {
    Spherical,
    Exponential,
    Gaussian,
}

impl From<ModelArg> for VariogramModel {
    fn from(m: ModelArg) -> Self {
        match m {
            ModelArg::Spherical => VariogramModel::Spherical,
            ModelArg::Exponential => VariogramModel::Exponential,
            ModelArg::Gaussian => VariogramModel::Gaussian,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OverlayArg {
    None,
    Union,
    Intersection,
}

impl From<OverlayArg> for Overlay {
    fn from(o: OverlayArg) -> Self {
        match o {
            OverlayArg::None => Overlay::None,
            OverlayArg::Union => Overlay::Union,
            OverlayArg::Intersection => Overlay::Intersection,
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {e}"))
}

fn spinner(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

/// Build an engine and load every point from `path` into it.
fn load_engine(config: &Config, path: &Path) -> Result<Arc<AnalysisEngine>> {
    let engine = AnalysisEngine::new(config.engine.clone()).context("Failed to start analysis engine")?;
    let points = read_points(path)?;
    let count = points.len();
    for point in points {
        let id = point.id.clone();
        engine
            .submit_observation(point)
            .with_context(|| format!("Rejected point {id}"))?;
    }
    info!("Loaded {} points ({})", count, engine.version());
    Ok(Arc::new(engine))
}

/// Run `request` in the background behind a spinner.
fn run_analysis(config: &Config, engine: &Arc<AnalysisEngine>, request: AnalysisRequest) -> Result<Arc<AnalysisResult>> {
    debug!(%request, "submitting analysis");
    let label = format!("Running {}...", request.method_name());
    let handle = engine.spawn_analysis(request)?;

    let pb = if config.cli.progress { Some(spinner(&label)?) } else { None };
    let result = handle.wait();
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    Ok(result?)
}

fn write_json<T: Serialize>(config: &Config, value: &T, path: &Path) -> Result<()> {
    let json = if config.cli.pretty_json {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize result")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Result saved to: {}", path.display());
    Ok(())
}

fn done(name: &str, result: &AnalysisResult, elapsed: std::time::Duration) {
    println!("{} at {}", name, result.data_version);
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;
    let config = Config::load(cli.config)?;
    let fmt = |v: f64| config.engine.defaults.format_value(v);

    match cli.command {
        Commands::Summary { input, fields } => {
            let engine = load_engine(&config, &input)?;
            let snapshot = engine.snapshot();
            println!("Points: {} ({})", snapshot.len(), snapshot.version());

            println!("Health:");
            let distribution = health_distribution(&snapshot);
            for status in HealthStatus::ALL {
                let n = distribution.get(&status).copied().unwrap_or(0);
                println!("  {:<10} {:>4}  risk: {:?}", status.to_string(), n, status.risk());
            }

            for field in &fields {
                match field_summary(&snapshot, field) {
                    Some(s) => println!(
                        "{}: n={} min={} max={} mean={}",
                        field,
                        s.count,
                        fmt(s.min),
                        fmt(s.max),
                        fmt(s.mean)
                    ),
                    None => println!("{field}: no data"),
                }
            }
        }

        Commands::Interpolate {
            input,
            field,
            method,
            cell_size,
            bbox,
            margin,
            power,
            model,
            nugget,
            sill,
            range,
            variance,
            smoothing,
            output,
        } => {
            let engine = load_engine(&config, &input)?;
            let grid = match bbox {
                Some(b) => GridSpec::new(parse_bbox(&b)?, cell_size),
                None => {
                    let snapshot = engine.snapshot();
                    GridSpec::covering(snapshot.iter().map(|p| &p.position), cell_size, margin)
                        .context("No points to build a grid around")?
                }
            };

            let kind = method.unwrap_or(config.engine.defaults.interpolation_method);
            let method = match kind {
                MethodKind::Idw => InterpolationMethod::Idw(IdwParams {
                    power,
                    ..Default::default()
                }),
                MethodKind::Kriging => InterpolationMethod::Kriging(KrigingParams {
                    variogram: Variogram::new(model.into(), nugget, sill, range),
                    compute_variance: variance,
                    ..Default::default()
                }),
                MethodKind::Spline => InterpolationMethod::Spline(SplineParams { smoothing }),
            };

            info!("Grid: {} x {} cells", grid.cols(), grid.rows());
            let start = Instant::now();
            let result = run_analysis(&config, &engine, AnalysisRequest::interpolation(&field, method, grid))?;
            let elapsed = start.elapsed();

            if let Some(surface) = result.surface() {
                println!(
                    "{} surface of '{}' from {} samples",
                    surface.method, surface.field, surface.sample_count
                );
                match surface.range {
                    Some(r) => println!("  Range: {} .. {}", fmt(r.min), fmt(r.max)),
                    None => println!("  Range: no cell has a value"),
                }
            }
            done("Interpolation", &result, elapsed);
            if let Some(path) = output {
                write_json(&config, &*result, &path)?;
            }
        }

        Commands::Buffer {
            input,
            radius,
            ids,
            overlay,
            vertices,
            output,
        } => {
            let engine = load_engine(&config, &input)?;
            let target = match ids {
                Some(ids) => BufferTarget::Points(parse_ids(&ids)?),
                None => BufferTarget::AllPoints,
            };
            let radius = radius.unwrap_or(config.engine.defaults.buffer_radius_m);
            let mut request = AnalysisRequest::buffer(target, radius).with_overlay(overlay.into());
            if let mangrove_engine::AnalysisKind::Buffer(b) = &mut request.kind {
                b.vertices = vertices;
            }

            let start = Instant::now();
            let result = run_analysis(&config, &engine, request)?;
            let elapsed = start.elapsed();

            if let Some(set) = result.buffers() {
                for zone in &set.zones {
                    println!(
                        "  {:<12} area: {} m²  perimeter: {} m",
                        zone.label,
                        fmt(zone.area_m2),
                        fmt(zone.perimeter_m)
                    );
                }
                if let Some(area) = set.merged_area_m2 {
                    println!("  Overlay area: {} m²", fmt(area));
                }
            }
            done("Buffer", &result, elapsed);
            if let Some(path) = output {
                write_json(&config, &*result, &path)?;
            }
        }

        Commands::Variogram {
            input,
            field,
            lags,
            max_lag,
        } => {
            let engine = load_engine(&config, &input)?;
            let v = engine
                .variogram(&field, lags, max_lag)
                .with_context(|| format!("Failed to compute variogram of '{field}'"))?;
            println!("{:>12} {:>14} {:>6}", "lag (m)", "semivariance", "pairs");
            for ((lag, gamma), pairs) in v.lags.iter().zip(&v.semivariance).zip(&v.pair_counts) {
                let gamma = if gamma.is_nan() { "-".to_string() } else { fmt(*gamma) };
                println!("{:>12} {:>14} {:>6}", fmt(*lag), gamma, pairs);
            }
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
