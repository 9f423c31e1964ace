#![allow(clippy::arithmetic_side_effects)]

use std::{
    error::Error,
    fs::{self, File},
    io::BufWriter,
    ops::Range,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use plotters::prelude::*;
use probing_table::{
    DEFAULT_MAX_LOAD_FACTOR,
    experiment::{self, LoadFactorConfig, LoadFactorRow, RehashConfig, RehashRow, STRING_LENGTH},
    logger::initialize_logger,
};
use rand::{SeedableRng, rngs::StdRng};

/// Colors assigned to series in drawing order
const COLORS: [RGBColor; 4] = [
    RGBColor(220, 50, 50),  // Bright red
    RGBColor(50, 90, 220),  // Bright blue
    RGBColor(50, 180, 50),  // Bright green
    RGBColor(180, 50, 180), // Bright magenta
];
/// Font used for captions and axis descriptions
const FONT_FAMILY: &str = "sans-serif";
/// Stroke width of plotted lines
const LINE_WIDTH: u32 = 2;
/// Radius of point markers
const MARKER_SIZE: i32 = 4;
/// Size of axis description text
const TEXT_SIZE: i32 = 16;
/// Size of chart captions
const TITLE_SIZE: i32 = 35;

/// Benchmarks for the linear probing table's resize strategies
#[derive(Debug, Parser)]
#[command(name = "probing_bench", version, about)]
struct Cli {
    /// Seed for string generation
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    /// Directory receiving CSV files and charts
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
    #[command(subcommand)]
    command: Command,
}

/// Experiment to run
#[derive(Debug, Subcommand)]
enum Command {
    /// Check resize thresholds on fixed inputs
    Scenarios,
    /// Time inserts for initial capacities 2^q_min ..= 2^q_max under each growth policy
    Rehash {
        /// Smallest initial capacity exponent
        #[arg(long, default_value_t = 4)]
        q_min: u32,
        /// Largest initial capacity exponent
        #[arg(long, default_value_t = 16)]
        q_max: u32,
        /// Values inserted into every table
        #[arg(short = 'n', long, default_value_t = 100_000)]
        inserts: usize,
        /// Load factor threshold of every table
        #[arg(short, long, default_value_t = DEFAULT_MAX_LOAD_FACTOR)]
        load_factor: f64,
    },
    /// Time successful and unsuccessful lookups at increasing load factors
    LoadFactor {
        /// Fixed capacity of the measured table
        #[arg(short, long, default_value_t = 1 << 16)]
        capacity: usize,
        /// Distance between measured load factors
        #[arg(long, default_value_t = 0.05)]
        step: f64,
        /// Successful and unsuccessful lookups per load factor
        #[arg(short = 'n', long, default_value_t = 10_000)]
        lookups: usize,
    },
}

/// How a series is drawn
#[derive(Debug, Clone, Copy)]
enum Mark {
    /// Connected line
    Line,
    /// Separate points
    Points,
}

/// One plotted series
#[derive(Debug)]
struct Series {
    /// Legend entry
    label: &'static str,
    /// Data points
    points: Vec<(f64, f64)>,
    /// Drawing mode
    mark: Mark,
}

/// Axis descriptions and tick label formatting of a chart
struct Axes<'a> {
    /// Description of the x axis
    x_desc: &'a str,
    /// Description of the y axis
    y_desc: &'a str,
    /// Formats x axis tick labels
    x_label: &'a dyn Fn(&f64) -> String,
}

/// Draws `series` into a PNG at `path`
fn draw_chart(
    path: &Path,
    caption: &str,
    axes: &Axes<'_>,
    x_range: Range<f64>,
    series: &[Series],
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_y = series
        .iter()
        .flat_map(|s| s.points.iter().map(|&(_, y)| y))
        .filter(|y| y.is_finite())
        .fold(0.0, f64::max) *
        1.1; // Add 10% margin
    let max_y = if max_y > 0.0 { max_y } else { 1.0 };

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, (FONT_FAMILY, TITLE_SIZE))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .right_y_label_area_size(10)
        .build_cartesian_2d(x_range, 0.0..max_y)?;

    chart
        .configure_mesh()
        .x_label_formatter(axes.x_label)
        .x_desc(axes.x_desc)
        .y_desc(axes.y_desc)
        .axis_desc_style((FONT_FAMILY, TEXT_SIZE))
        .draw()?;

    for (s, &color) in series.iter().zip(COLORS.iter().cycle()) {
        let line_style = ShapeStyle::from(&color).stroke_width(LINE_WIDTH);
        match s.mark {
            Mark::Line => {
                chart
                    .draw_series(LineSeries::new(s.points.iter().copied(), line_style))?
                    .label(s.label)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));
            }
            Mark::Points => {
                chart
                    .draw_series(
                        s.points
                            .iter()
                            .map(|&point| Circle::new(point, MARKER_SIZE, color.filled())),
                    )?
                    .label(s.label)
                    .legend(move |(x, y)| Circle::new((x + 10, y), MARKER_SIZE, color.filled()));
            }
        }
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    root.present()?;
    info!("wrote {}", path.display());
    Ok(())
}

/// Runs the threshold scenarios and fails if any of them fails
fn run_scenarios() -> Result<(), Box<dyn Error>> {
    let outcomes = experiment::scenarios()?;

    for outcome in &outcomes {
        let verdict = if outcome.passed() { "PASSED" } else { "FAILED" };
        info!(
            "{}: final size {} (expected {}), all found: {}, none spurious: {} - {verdict}",
            outcome.name,
            outcome.actual_size,
            outcome.expected_size,
            outcome.all_found,
            outcome.none_found
        );
    }

    let failed = outcomes.iter().filter(|outcome| !outcome.passed()).count();
    if failed > 0 {
        error!("{failed} of {} scenarios failed", outcomes.len());
        return Err(format!("{failed} scenarios failed").into());
    }
    Ok(())
}

/// Runs the rehash experiment and writes `rehash_times.csv` and `rehash_times.png`
fn run_rehash(
    out_dir: &Path,
    config: &RehashConfig,
    rng: &mut StdRng,
) -> Result<(), Box<dyn Error>> {
    let rows = experiment::rehash_experiment(config, rng)?;

    let csv_path = out_dir.join("rehash_times.csv");
    experiment::write_rehash_csv(BufWriter::new(File::create(&csv_path)?), &rows)?;
    info!("wrote {}", csv_path.display());

    if rows.is_empty() {
        warn!("no rows to plot, q_min {} exceeds q_max {}", config.q_min, config.q_max);
        return Ok(());
    }

    let points = |time: fn(&RehashRow) -> f64| -> Vec<(f64, f64)> {
        rows.iter().map(|row| (f64::from(row.q), time(row))).collect()
    };
    let series = [
        Series { label: "No Rehash", points: points(|row| row.no_rehash), mark: Mark::Line },
        Series { label: "Doubling", points: points(|row| row.doubling), mark: Mark::Line },
        Series { label: "Add 10000", points: points(|row| row.addition), mark: Mark::Line },
    ];
    let axes = Axes {
        x_desc: "Initial Size",
        y_desc: "Time per Insert (us)",
        x_label: &|q| format!("2^{q:.0}"),
    };

    draw_chart(
        &out_dir.join("rehash_times.png"),
        "Insert Performance by Resizing Strategy",
        &axes,
        f64::from(config.q_min)..f64::from(config.q_max.max(config.q_min.saturating_add(1))),
        &series,
    )
}

/// Draws measured lookup times against the theoretical probe counts
fn draw_lookup_chart(
    path: &Path,
    caption: &str,
    rows: &[LoadFactorRow],
    scale: f64,
    measured: fn(&LoadFactorRow) -> f64,
    theory: [fn(f64) -> f64; 2],
) -> Result<(), Box<dyn Error>> {
    let [linear, double] = theory;
    let curve = |expected: fn(f64) -> f64| -> Vec<(f64, f64)> {
        rows.iter().map(|row| (row.load_factor, expected(row.load_factor))).collect()
    };
    let series = [
        Series { label: "Linear Theoretical", points: curve(linear), mark: Mark::Line },
        Series { label: "Double Hashing Theoretical", points: curve(double), mark: Mark::Line },
        Series {
            label: "Experimental (scaled)",
            points: rows.iter().map(|row| (row.load_factor, scale * measured(row))).collect(),
            mark: Mark::Points,
        },
    ];
    let axes =
        Axes { x_desc: "Load Factor", y_desc: "Probe Count", x_label: &|x| format!("{x:.1}") };

    draw_chart(path, caption, &axes, 0.0..1.0, &series)
}

/// Runs the load factor experiment and writes `load_factor_times.csv`, `time_succ.png` and
/// `time_fail.png`
fn run_load_factor(
    out_dir: &Path,
    config: &LoadFactorConfig,
    rng: &mut StdRng,
) -> Result<(), Box<dyn Error>> {
    let rows = experiment::load_factor_experiment(config, rng)?;

    let csv_path = out_dir.join("load_factor_times.csv");
    experiment::write_load_factor_csv(BufWriter::new(File::create(&csv_path)?), &rows)?;
    info!("wrote {}", csv_path.display());

    let Some(scale) = experiment::probe_scale(&rows) else {
        warn!("no load factor of at least 0.5 with a measurable lookup time, skipping charts");
        return Ok(());
    };

    draw_lookup_chart(
        &out_dir.join("time_succ.png"),
        "Successful Search Performance",
        &rows,
        scale,
        |row| row.success_time,
        [experiment::linear_probing_success, experiment::double_hashing_success],
    )?;
    draw_lookup_chart(
        &out_dir.join("time_fail.png"),
        "Unsuccessful Search Performance",
        &rows,
        scale,
        |row| row.fail_time,
        [experiment::linear_probing_failure, experiment::double_hashing_failure],
    )
}

fn main() -> Result<(), Box<dyn Error>> {
    initialize_logger();
    let cli = Cli::parse();
    let mut rng = StdRng::seed_from_u64(cli.seed);

    match cli.command {
        Command::Scenarios => run_scenarios(),
        Command::Rehash { q_min, q_max, inserts, load_factor } => {
            fs::create_dir_all(&cli.out_dir)?;
            let config = RehashConfig {
                q_min,
                q_max,
                insert_count: inserts,
                max_load_factor: load_factor,
                string_length: STRING_LENGTH,
            };
            run_rehash(&cli.out_dir, &config, &mut rng)
        }
        Command::LoadFactor { capacity, step, lookups } => {
            fs::create_dir_all(&cli.out_dir)?;
            let config = LoadFactorConfig {
                capacity,
                load_factors: LoadFactorConfig::load_factor_steps(step),
                lookup_count: lookups,
                string_length: STRING_LENGTH,
            };
            run_load_factor(&cli.out_dir, &config, &mut rng)
        }
    }
}
