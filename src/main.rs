use clap::{Parser, Subcommand};
use radviz_core::color::{color_points, render_color_field_with};
use radviz_core::config::ViewConfig;
use radviz_core::projector::{anchor_angles, Projector};
use radviz_core::reducer::{bin_points, reduce_projection};
use radviz_core::sampling::SamplerKind;
use radviz_core::{normalize_angle, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// RadViz core: project compositions onto a color disk and thin them for display
#[derive(Parser)]
#[command(name = "radviz", version, about)]
struct Cli {
    /// JSON view configuration; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print anchor positions for N dimensions
    Anchors {
        #[arg(long)]
        dims: usize,
        /// Rotation in degrees
        #[arg(long)]
        rotation: Option<f64>,
    },
    /// Project inline composition rows
    Project {
        /// One composition, comma separated (repeatable)
        #[arg(long = "row", value_parser = parse_row, required = true)]
        rows: Vec<Row>,
        #[arg(long)]
        rotation: Option<f64>,
        /// Emit JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Project and reduce a synthetic data set
    Reduce {
        #[arg(long, default_value_t = 3)]
        dims: usize,
        /// Number of synthetic rows
        #[arg(long, default_value_t = 10_000)]
        rows: usize,
        #[arg(long)]
        bins: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, value_enum)]
        sampler: Option<SamplerKind>,
    },
    /// Rasterize the background color disk
    Colorfield {
        #[arg(long)]
        size: Option<u32>,
        #[arg(long, default_value_t = false)]
        flat: bool,
        /// Draw opaque pixels as text
        #[arg(long, default_value_t = false)]
        ascii: bool,
    },
    /// Print the effective configuration
    Config,
}

/// One composition given on the command line.
#[derive(Clone, Debug)]
struct Row(Vec<f64>);

fn parse_row(s: &str) -> std::result::Result<Row, String> {
    s.split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid value {:?}: {}", v, e))
        })
        .collect::<std::result::Result<Vec<f64>, String>>()
        .map(Row)
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ViewConfig::load(path)?,
        None => ViewConfig::default(),
    };

    match cli.command {
        Commands::Anchors { dims, rotation } => {
            cmd_anchors(dims, rotation.unwrap_or(config.rotation_degrees))
        }
        Commands::Project {
            rows,
            rotation,
            json,
        } => {
            let rows: Vec<Vec<f64>> = rows.into_iter().map(|r| r.0).collect();
            cmd_project(&rows, rotation.unwrap_or(config.rotation_degrees), json)
        }
        Commands::Reduce {
            dims,
            rows,
            bins,
            seed,
            sampler,
        } => {
            let config = ViewConfig {
                bins: bins.unwrap_or(config.bins),
                seed: seed.unwrap_or(config.seed),
                sampler: sampler.unwrap_or(config.sampler),
                ..config
            };
            config.validate()?;
            cmd_reduce(dims, rows, &config)
        }
        Commands::Colorfield { size, flat, ascii } => {
            let config = ViewConfig {
                size: size.unwrap_or(config.size),
                flat_mode: flat || config.flat_mode,
                ..config
            };
            config.validate()?;
            cmd_colorfield(&config, ascii)
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn cmd_anchors(dims: usize, rotation_degrees: f64) -> Result<()> {
    let projector = Projector::new(dims, rotation_degrees.to_radians())?;
    let angles = anchor_angles(dims, rotation_degrees.to_radians());

    println!("{} anchors (rotation {:.1}°):", dims, rotation_degrees);
    for (k, (a, p)) in angles.iter().zip(projector.anchors()).enumerate() {
        println!(
            "  [{:>2}] {:>7.2}°  ({:>8.5}, {:>8.5})",
            k,
            normalize_angle(*a).to_degrees(),
            p[0],
            p[1]
        );
    }
    Ok(())
}

fn cmd_project(rows: &[Vec<f64>], rotation_degrees: f64, json: bool) -> Result<()> {
    let projection = radviz_core::project(rows, rotation_degrees.to_radians())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&projection)?);
        return Ok(());
    }

    let colors = color_points(&projection.samples, ViewConfig::default().lightness);
    println!("Samples:");
    for (i, (p, c)) in projection.samples.iter().zip(&colors).enumerate() {
        let flag = if projection.degenerate.contains(&i) { "  (zero sum)" } else { "" };
        println!("  [{:>3}] ({:>8.5}, {:>8.5})  {}{}", i, p[0], p[1], c.hex(), flag);
    }
    println!("Anchors:");
    for (k, p) in projection.anchors.iter().enumerate() {
        println!("  [{:>3}] ({:>8.5}, {:>8.5})", k, p[0], p[1]);
    }
    Ok(())
}

/// Flat Dirichlet draws: normalized exponential variates.
fn synthetic_rows(dims: usize, count: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let parts: Vec<f64> = (0..dims)
                .map(|_| -(1.0 - rng.gen::<f64>()).ln())
                .collect();
            let total: f64 = parts.iter().sum();
            parts.into_iter().map(|p| p / total).collect()
        })
        .collect()
}

fn cmd_reduce(dims: usize, count: usize, config: &ViewConfig) -> Result<()> {
    let rows = synthetic_rows(dims, count, config.seed);
    let projector = Projector::new(dims, 0.0)?;

    let start = Instant::now();
    let projection = projector.project(&rows)?;
    let projected_in = start.elapsed();

    let mut rng = config.sampler.build(config.seed);
    let start = Instant::now();
    let reduction = reduce_projection(&projection, config.bins, rng.as_mut())?;
    let reduced_in = start.elapsed();

    let occupied = bin_points(&projection.samples, config.bins)
        .iter()
        .filter(|b| !b.is_empty())
        .count();

    println!("Rows:          {:>10}", rows.len());
    println!("Dimensions:    {:>10}", dims);
    println!("Grid:          {:>7} x {}", config.bins, config.bins);
    println!("Occupied bins: {:>10}", occupied);
    println!("Kept samples:  {:>10}", reduction.samples.len());
    println!("Projected in   {:>10.2?}", projected_in);
    println!("Reduced in     {:>10.2?}", reduced_in);
    Ok(())
}

fn cmd_colorfield(config: &ViewConfig, ascii: bool) -> Result<()> {
    let start = Instant::now();
    let field = render_color_field_with(config.size, config.flat_mode, config.lightness)?;
    let elapsed = start.elapsed();
    let g = field.geometry;

    println!("Size:      {} x {} px", field.size(), field.size());
    println!("Disk:      diameter {:.3}, offset {:.3}", g.diameter, g.offset);
    println!("Opaque:    {} px", field.opaque_count());
    println!("Flat mode: {}", config.flat_mode);
    println!("Done in {:.2?}", elapsed);

    if ascii {
        // Keep the drawing within ~64 columns.
        let step = (field.size() / 64).max(1);
        for y in (0..field.size()).step_by(step as usize) {
            let line: String = (0..field.size())
                .step_by(step as usize)
                .map(|x| if field.pixel(x, y)[3] == 0 { '.' } else { '#' })
                .collect();
            println!("{}", line);
        }
    }
    Ok(())
}
