//! Mnemo CLI
//!
//! Command-line front end for the FSRS-6 scheduler: parameter diagnostics,
//! one-off reviews, previews, memory curves and rating simulations.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use mnemo_core::{
    CurveWindow, FSRSScheduler, ItemState, MemoryState, ParameterStore, Rating, ReviewHistory,
    ReviewOutcome, SchedulerConfig, project_curve,
};

/// Mnemo - FSRS-6 Review Scheduler CLI
#[derive(Parser)]
#[command(name = "mnemo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLI for the mnemo FSRS-6 review scheduler")]
#[command(long_about = "Mnemo schedules reviews with the 21-parameter FSRS-6 model.\n\nStates and histories are read from and written as JSON.")]
struct Cli {
    /// Scheduler config (JSON). Defaults to the platform config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a weight vector and show the effective parameters
    Params {
        /// JSON array of 21 weights (defaults to the configured vector)
        #[arg(long)]
        weights: Option<PathBuf>,
    },

    /// Apply one review and print the new state and log entry as JSON
    Review {
        /// again, hard, good, easy (or 1-4)
        #[arg(long)]
        rating: String,
        /// Current memory state (JSON); a new item when omitted
        #[arg(long)]
        state: Option<PathBuf>,
        /// Review time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<String>,
        /// Item identifier used to seed interval fuzz
        #[arg(long, default_value = "item")]
        item: String,
    },

    /// Show what every rating would do to an item
    Preview {
        /// Current memory state (JSON); a new item when omitted
        #[arg(long)]
        state: Option<PathBuf>,
        /// Review time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<String>,
        /// Item identifier used to seed interval fuzz
        #[arg(long, default_value = "item")]
        item: String,
    },

    /// Print predicted vs. actual retrievability per day
    Curve {
        /// Memory state (JSON)
        #[arg(long)]
        state: PathBuf,
        /// Review history (JSON array of log entries)
        #[arg(long)]
        history: Option<PathBuf>,
        /// First day offset (negative for the past)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        from: i64,
        /// Last day offset, inclusive
        #[arg(long, default_value = "30", allow_hyphen_values = true)]
        to: i64,
        /// Day zero (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Run a rating sequence on a fresh item and print every transition
    Simulate {
        /// Comma-separated ratings, e.g. good,good,again,good
        #[arg(long)]
        ratings: String,
        /// Fixed days between reviews; reviews happen when due if omitted
        #[arg(long)]
        gap_days: Option<f64>,
        /// Item identifier used to seed interval fuzz
        #[arg(long, default_value = "simulated")]
        item: String,
        /// Time of the first review (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Params { weights } => run_params(&config, weights),
        Commands::Review {
            rating,
            state,
            at,
            item,
        } => run_review(&config, &rating, state, at, &item),
        Commands::Preview { state, at, item } => run_preview(&config, state, at, &item),
        Commands::Curve {
            state,
            history,
            from,
            to,
            at,
        } => run_curve(&config, state, history, from, to, at),
        Commands::Simulate {
            ratings,
            gap_days,
            item,
            at,
        } => run_simulate(&config, &ratings, gap_days, &item, at),
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Default config location, e.g. `~/.config/mnemo/config.json`
fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "mnemo", "mnemo").map(|dirs| dirs.config_dir().join("config.json"))
}

/// Explicit file, else the platform default if present, else defaults; env overrides last
fn load_config(explicit: Option<&Path>) -> anyhow::Result<SchedulerConfig> {
    let base = match explicit {
        Some(path) => SchedulerConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => SchedulerConfig::from_file(&path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => SchedulerConfig::default(),
        },
    };
    Ok(base.with_env_overrides())
}

fn build_scheduler(config: &SchedulerConfig) -> anyhow::Result<FSRSScheduler> {
    FSRSScheduler::new(config).context("invalid scheduler config")
}

// ============================================================================
// COMMANDS
// ============================================================================

/// Run params command
fn run_params(config: &SchedulerConfig, weights: Option<PathBuf>) -> anyhow::Result<()> {
    let weights: Vec<f64> = match weights {
        Some(path) => read_json(&path)?,
        None => config.parameters.clone(),
    };
    let validation = ParameterStore::validate(&weights);

    println!("{}", "=== FSRS-6 Parameters ===".cyan().bold());
    println!();
    println!(
        "  {:>3}  {:<28} {:>10}  {:>17}  {:>8}",
        "w".white().bold(),
        "name".white().bold(),
        "value".white().bold(),
        "range".white().bold(),
        "default".white().bold()
    );

    for row in ParameterStore::report(&weights) {
        let value = match row.value {
            Some(v) => format!("{v:>10.4}"),
            None => format!("{:>10}", "missing"),
        };
        let value = if row.in_range {
            value.green()
        } else {
            value.red().bold()
        };
        println!(
            "  {:>3}  {:<28} {}  [{:>6.3}, {:>6.3}]  {:>8.4}",
            row.index, row.name, value, row.min, row.max, row.default
        );
    }

    println!();
    if validation.is_valid() {
        println!("{}: {}", "Status".white().bold(), "VALID".green().bold());
    } else {
        println!(
            "{}: {}",
            "Status".white().bold(),
            "INVALID - falling back to defaults".red().bold()
        );
        for error in &validation.errors {
            println!("  {} {}", "!".yellow().bold(), error.to_string().yellow());
        }
    }

    let effective = ParameterStore::effective(&weights);
    println!();
    println!("{}", "Effective vector:".cyan().bold());
    println!("  {}", serde_json::to_string(effective.as_array())?);
    println!(
        "{}: {:.4}  {}: {:.6}",
        "Decay".white(),
        effective.decay(),
        "Factor".white(),
        effective.factor()
    );

    Ok(())
}

/// Run review command
fn run_review(
    config: &SchedulerConfig,
    rating: &str,
    state: Option<PathBuf>,
    at: Option<String>,
    item: &str,
) -> anyhow::Result<()> {
    let scheduler = build_scheduler(config)?;
    let rating = parse_rating(rating)?;
    let now = parse_at(at.as_deref())?;
    let state = load_state(state.as_deref(), now)?;

    let result = scheduler.review(item, &state, ReviewOutcome::new(rating, now));
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Run preview command
fn run_preview(
    config: &SchedulerConfig,
    state: Option<PathBuf>,
    at: Option<String>,
    item: &str,
) -> anyhow::Result<()> {
    let scheduler = build_scheduler(config)?;
    let now = parse_at(at.as_deref())?;
    let state = load_state(state.as_deref(), now)?;
    let preview = scheduler.preview(item, &state, now);

    println!("{}", "=== Review Preview ===".cyan().bold());
    println!(
        "{}: {}  {}: {:.1}%",
        "Current State".white().bold(),
        state.state,
        "Retrievability".white().bold(),
        scheduler.retrievability(&state, now) * 100.0
    );
    println!();

    for rating in Rating::ALL {
        let next = &preview.get(rating).state;
        println!(
            "  {:<6} -> {:<10} due {}  (in {})  S={:.2}  D={:.2}",
            color_rating(rating),
            next.state.to_string(),
            next.due.format("%Y-%m-%d %H:%M"),
            format_wait(next.due - now),
            next.stability,
            next.difficulty
        );
    }

    Ok(())
}

/// Run curve command
fn run_curve(
    config: &SchedulerConfig,
    state: PathBuf,
    history: Option<PathBuf>,
    from: i64,
    to: i64,
    at: Option<String>,
) -> anyhow::Result<()> {
    let days = curve_days(from, to)?;

    let scheduler = build_scheduler(config)?;
    let origin = parse_at(at.as_deref())?;
    let state: MemoryState = read_json(&state)?;
    let history: ReviewHistory = match history {
        Some(path) => read_json(&path)?,
        None => ReviewHistory::new(),
    };

    let window = CurveWindow::new(origin, days);
    let curve = project_curve(&state, &history, &window, scheduler.parameters());

    println!("{}", "=== Memory Curve ===".cyan().bold());
    println!();
    for point in curve {
        let actual = match point.actual_retrievability {
            Some(a) if a >= 0.5 => format!("{:>5.0}%", a * 100.0).green(),
            Some(a) => format!("{:>5.0}%", a * 100.0).red(),
            None => format!("{:>6}", "").normal(),
        };
        println!(
            "  {:>5}  {}  {:>5.1}%  {}  {}",
            point.day,
            point.date.format("%Y-%m-%d"),
            point.predicted_retrievability * 100.0,
            actual,
            retention_bar(point.predicted_retrievability)
        );
    }

    Ok(())
}

/// Run simulate command
fn run_simulate(
    config: &SchedulerConfig,
    ratings: &str,
    gap_days: Option<f64>,
    item: &str,
    at: Option<String>,
) -> anyhow::Result<()> {
    let scheduler = build_scheduler(config)?;
    let ratings = ratings
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(parse_rating)
        .collect::<anyhow::Result<Vec<Rating>>>()?;
    anyhow::ensure!(!ratings.is_empty(), "no ratings given");
    let gap = gap_days.map(gap_duration).transpose()?;

    let start = parse_at(at.as_deref())?;
    let mut now = start;
    let mut state = scheduler.new_item(start);
    let mut history = ReviewHistory::new();

    println!("{}", "=== Simulation ===".cyan().bold());
    println!();

    for (i, rating) in ratings.into_iter().enumerate() {
        if i > 0 {
            now = match gap {
                Some(gap) => now
                    .checked_add_signed(gap)
                    .context("simulation ran past the end of the calendar")?,
                None => state.due.max(now),
            };
        }
        let before = state.state;
        let r = scheduler.retrievability(&state, now);
        state = scheduler.record(item, &state, ReviewOutcome::new(rating, now), &mut history)?;

        println!(
            "  #{:<3} day {:>7.2}  {:<6} R={:>5.1}%  {} -> {}  S={:>8.2}  D={:.2}  next in {}",
            i + 1,
            (now - start).num_seconds() as f64 / 86_400.0,
            color_rating(rating),
            r * 100.0,
            before,
            color_state(state.state),
            state.stability,
            state.difficulty,
            format_wait(state.due - now)
        );
    }

    println!();
    println!(
        "{}: {}  {}: {}",
        "Reps".white().bold(),
        state.reps,
        "Lapses".white().bold(),
        state.lapses
    );

    Ok(())
}

// ============================================================================
// HELPERS
// ============================================================================

/// Largest `--from`/`--to` magnitude, in days
const MAX_DAY_OFFSET: i64 = 1_000_000;

/// Longest `--gap-days`
const MAX_GAP_DAYS: f64 = 36_500.0;

/// Inclusive `--from`/`--to` as a half-open day range
fn curve_days(from: i64, to: i64) -> anyhow::Result<std::ops::Range<i64>> {
    anyhow::ensure!(from <= to, "--from ({from}) must not exceed --to ({to})");
    anyhow::ensure!(
        from >= -MAX_DAY_OFFSET && to <= MAX_DAY_OFFSET,
        "--from and --to must lie within ±{MAX_DAY_OFFSET} days"
    );
    Ok(from..to + 1)
}

fn gap_duration(days: f64) -> anyhow::Result<Duration> {
    anyhow::ensure!(
        days.is_finite() && (0.0..=MAX_GAP_DAYS).contains(&days),
        "--gap-days must be between 0 and {MAX_GAP_DAYS}"
    );
    Ok(Duration::seconds((days * 86_400.0).round() as i64))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn load_state(path: Option<&Path>, now: DateTime<Utc>) -> anyhow::Result<MemoryState> {
    match path {
        Some(path) => read_json(path),
        None => Ok(MemoryState::new(now)),
    }
}

fn parse_rating(raw: &str) -> anyhow::Result<Rating> {
    Rating::parse_name(raw)
        .with_context(|| format!("unknown rating '{raw}' (expected again, hard, good or easy)"))
}

fn parse_at(raw: Option<&str>) -> anyhow::Result<DateTime<Utc>> {
    match raw {
        Some(raw) => Ok(DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("invalid timestamp '{raw}'"))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

/// Human-readable wait, minutes below an hour, hours below a day
fn format_wait(wait: Duration) -> String {
    let minutes = wait.num_minutes();
    if minutes < 60 {
        format!("{minutes}m")
    } else if minutes < 24 * 60 {
        format!("{:.1}h", minutes as f64 / 60.0)
    } else {
        format!("{}d", wait.num_days())
    }
}

fn color_rating(rating: Rating) -> colored::ColoredString {
    match rating {
        Rating::Again => rating.as_str().red(),
        Rating::Hard => rating.as_str().yellow(),
        Rating::Good => rating.as_str().green(),
        Rating::Easy => rating.as_str().cyan(),
    }
}

fn color_state(state: ItemState) -> colored::ColoredString {
    match state {
        ItemState::New => state.as_str().white(),
        ItemState::Learning => state.as_str().yellow(),
        ItemState::Review => state.as_str().green(),
        ItemState::Relearning => state.as_str().magenta(),
    }
}

/// Retention bar, 30 columns wide
fn retention_bar(value: f64) -> colored::ColoredString {
    let bar_width: usize = 30;
    let filled = (value.clamp(0.0, 1.0) * bar_width as f64).round() as usize;
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(bar_width - filled));
    if value >= 0.7 {
        bar.green()
    } else if value >= 0.4 {
        bar.yellow()
    } else {
        bar.red()
    }
}
