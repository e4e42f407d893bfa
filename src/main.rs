//! Satwatch - command line front end for the orbital kernel
//!
//! Every subcommand prints JSON, to stdout or to `--output`.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use satwatch::conjunction::{
    parse_tca, rank, timeline, ConjunctionAnalyzer, ConjunctionEvent, ParseReport,
    RawConjunctionRecord, RiskSummary, TimelineBucket,
};
use satwatch::data::{load_catalog, SatelliteCatalog};
use satwatch::propagation::{GeodeticPoint, OrbitPath, PathSegment, SampleMode};
use satwatch::settings::load_settings_or_default;
use satwatch::solar::{subsolar_point, sun_direction};
use satwatch::{KernelSettings, SatellitePosition, SatelliteTracker};

#[derive(Parser, Debug)]
#[command(
    name = "satwatch",
    version,
    about = "Satellite positions, orbit paths and conjunction risk"
)]
struct Cli {
    /// Settings JSON file (defaults apply when omitted)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    /// Output JSON file path (stdout when omitted)
    #[arg(long, global = true)]
    output: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Current geodetic position of one satellite
    Position(PositionArgs),
    /// One orbital period of samples
    Track(TrackArgs),
    /// Sun direction and subsolar point
    Sun(SunArgs),
    /// Rank conjunction screening rows for a primary satellite
    Conjunctions(ConjunctionArgs),
}

#[derive(Args, Debug)]
struct PositionArgs {
    /// Catalog file (.json database or 2LE/3LE text)
    #[arg(long)]
    catalog: PathBuf,
    /// NORAD catalog id
    #[arg(long)]
    norad: u32,
    /// Time (RFC 3339); now when omitted
    #[arg(long, value_parser = parse_time)]
    time: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
struct TrackArgs {
    /// Catalog file (.json database or 2LE/3LE text)
    #[arg(long)]
    catalog: PathBuf,
    /// NORAD catalog id
    #[arg(long)]
    norad: u32,
    /// Start time (RFC 3339); now when omitted
    #[arg(long, value_parser = parse_time)]
    time: Option<DateTime<Utc>>,
    /// Sampling mode; the configured default when omitted
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Number of steps; the configured count when omitted
    #[arg(long)]
    steps: Option<usize>,
    /// Split the path where it cannot be drawn as one line
    #[arg(long)]
    segments: bool,
}

#[derive(Args, Debug)]
struct SunArgs {
    /// Time (RFC 3339); now when omitted
    #[arg(long, value_parser = parse_time)]
    time: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
struct ConjunctionArgs {
    /// JSON array of screening rows
    #[arg(long)]
    records: PathBuf,
    /// NORAD id of the primary satellite
    #[arg(long)]
    primary: u32,
    /// Catalog used to resolve names
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Reference time for the timeline (RFC 3339); now when omitted
    #[arg(long, value_parser = parse_time)]
    time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Inertial,
    GroundTrack,
}

impl From<ModeArg> for SampleMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Inertial => SampleMode::Inertial,
            ModeArg::GroundTrack => SampleMode::GroundTrack,
        }
    }
}

#[derive(Debug, Serialize)]
struct TrackReport {
    catalog_id: u32,
    name: String,
    mode: SampleMode,
    start_time_utc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<OrbitPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    segments: Option<Vec<PathSegment>>,
}

#[derive(Debug, Serialize)]
struct SunReport {
    time_utc: String,
    direction: [f64; 3],
    declination_deg: f64,
    right_ascension_deg: f64,
    subsolar_point: GeodeticPoint,
}

#[derive(Debug, Serialize)]
struct ConjunctionReport {
    generated_at: String,
    primary: u32,
    parse: ParseReport,
    summary: RiskSummary,
    timeline: Vec<TimelineBucket>,
    events: Vec<ConjunctionEvent>,
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, String> {
    parse_tca(value).ok_or_else(|| format!("invalid time: {}", value))
}

fn write_json<T: Serialize>(value: &T, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file =
                File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
            serde_json::to_writer_pretty(file, value)?;
            log::info!("Wrote {:?}", path);
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, value)?;
            writeln!(handle)?;
        }
    }
    Ok(())
}

fn run_position(args: PositionArgs, settings: KernelSettings) -> Result<SatellitePosition> {
    let tracker = SatelliteTracker::new(load_catalog(&args.catalog)?, settings);
    let time = args.time.unwrap_or_else(Utc::now);

    tracker
        .position(args.norad, &time)
        .with_context(|| format!("No position for {} at {}", args.norad, time))
}

fn run_track(args: TrackArgs, mut settings: KernelSettings) -> Result<TrackReport> {
    if let Some(steps) = args.steps {
        if steps == 0 {
            return Err(anyhow!("steps must be > 0"));
        }
        settings.sampling.step_count = steps;
    }

    let tracker = SatelliteTracker::new(load_catalog(&args.catalog)?, settings);
    let start = args.time.unwrap_or_else(Utc::now);
    let mode = args.mode.map(SampleMode::from).unwrap_or(settings.sampling.default_mode);

    let (path, segments) = if args.segments {
        (None, Some(tracker.segments(args.norad, &start, mode)?))
    } else {
        (Some(tracker.orbit_path(args.norad, &start, mode)?), None)
    };

    Ok(TrackReport {
        catalog_id: args.norad,
        name: tracker.catalog().display_name(args.norad),
        mode,
        start_time_utc: start.to_rfc3339(),
        path,
        segments,
    })
}

fn run_sun(args: SunArgs) -> SunReport {
    let time = args.time.unwrap_or_else(Utc::now);
    let sun = sun_direction(&time);

    SunReport {
        time_utc: time.to_rfc3339(),
        direction: [sun.unit.x, sun.unit.y, sun.unit.z],
        declination_deg: sun.declination_deg(),
        right_ascension_deg: sun.right_ascension_deg(),
        subsolar_point: subsolar_point(&time),
    }
}

fn run_conjunctions(args: ConjunctionArgs, settings: KernelSettings) -> Result<ConjunctionReport> {
    let catalog = match &args.catalog {
        Some(path) => load_catalog(path)?,
        None => SatelliteCatalog::new(),
    };

    let file = File::open(&args.records)
        .with_context(|| format!("Failed to open conjunction records: {:?}", args.records))?;
    let records: Vec<RawConjunctionRecord> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| "Failed to parse conjunction records JSON")?;

    let analyzer = ConjunctionAnalyzer::new(&catalog, settings.risk);
    let (mut events, report) = analyzer.parse_with_report(&records, args.primary);
    rank(&mut events);

    let now = args.time.unwrap_or_else(Utc::now);
    let summary = RiskSummary::from_events(&events, &now, &settings.conjunctions);

    log::info!(
        "{} conjunctions for {} ({} high, {} urgent, {} rows skipped)",
        summary.total,
        args.primary,
        summary.high,
        summary.urgent,
        report.skipped()
    );

    Ok(ConjunctionReport {
        generated_at: Utc::now().to_rfc3339(),
        primary: args.primary,
        parse: report,
        timeline: timeline(&events, &now),
        summary,
        events,
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = load_settings_or_default(cli.settings.as_deref())?;
    let output = cli.output.as_ref();

    match cli.command {
        Command::Position(args) => write_json(&run_position(args, settings)?, output),
        Command::Track(args) => write_json(&run_track(args, settings)?, output),
        Command::Sun(args) => write_json(&run_sun(args), output),
        Command::Conjunctions(args) => write_json(&run_conjunctions(args, settings)?, output),
    }
}
