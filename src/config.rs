//! Command-line surface and the runtime configuration built from it.

use std::{ffi::OsString, path::PathBuf};

use clap::Parser;

use crate::{
    error::DimensionError,
    patterns::{NoiseSettings, Pattern},
    rules::Ruleset,
};

/// Longest accepted dimension literal, in digits.
pub const MAX_DIMENSION_DIGITS: usize = 19;

pub const DEFAULT_TICKS_PER_SECOND: u32 = 60;
pub const DEFAULT_STALL_MULTIPLIER: u32 = 100;
pub const DEFAULT_DENSITY: f64 = 0.5;
pub const DEFAULT_CELL_SCALE: u16 = 2;

/// Toroidal Game of Life in the terminal.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of cells along the horizontal axis.
    #[arg(value_name = "CELLS_X", value_parser = parse_dimension)]
    width: u64,
    /// Number of cells along the vertical axis.
    #[arg(value_name = "CELLS_Y", value_parser = parse_dimension)]
    height: u64,
    /// Initial generation.
    #[arg(short, long, value_enum, default_value_t = Pattern::Random)]
    pattern: Pattern,
    /// Ruleset used to compute generations.
    #[arg(short, long, value_enum, default_value_t = Ruleset::Classic)]
    rules: Ruleset,
    /// Bias of the noise pattern towards live cells, between 0 and 1.
    #[arg(
        long,
        value_name = "FRACTION",
        default_value_t = DEFAULT_DENSITY,
        value_parser = parse_density
    )]
    density: f64,
    /// Grid cells per noise lattice unit; larger values give larger blobs.
    #[arg(long, value_name = "CELLS", default_value_t = 1.0, value_parser = parse_scale)]
    noise_scale: f64,
    /// Seed of the random pattern. A fresh seed is drawn when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Target loop ticks per second.
    #[arg(
        long,
        value_name = "TICKS",
        default_value_t = DEFAULT_TICKS_PER_SECOND,
        value_parser = clap::value_parser!(u32).range(1..=1000)
    )]
    tps: u32,
    /// Abort when one tick takes this many tick budgets.
    #[arg(
        long,
        value_name = "FACTOR",
        default_value_t = DEFAULT_STALL_MULTIPLIER,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    stall_multiplier: u32,
    /// Ticks per generation at startup.
    #[arg(
        long,
        value_name = "TICKS",
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..=1000)
    )]
    frame_skip: u32,
    /// Frame-skip change applied by one speed key press.
    #[arg(
        long,
        value_name = "TICKS",
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    speed_step: u32,
    /// Terminal columns drawn per grid cell.
    #[arg(
        long,
        value_name = "COLUMNS",
        default_value_t = DEFAULT_CELL_SCALE,
        value_parser = clap::value_parser!(u16).range(1..=8)
    )]
    cell_scale: u16,
    /// Compute generations on all cores.
    #[arg(long)]
    parallel: bool,
    /// Run without a terminal UI and print a summary after `--ticks` ticks.
    #[arg(long, requires = "ticks")]
    headless: bool,
    /// Stop after this many ticks.
    #[arg(long, value_name = "COUNT", requires = "headless")]
    ticks: Option<u64>,
    /// Write logs to this file (filter with RUST_LOG).
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

/// Everything a run needs, resolved from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub width: u64,
    pub height: u64,
    pub pattern: Pattern,
    pub rules: Ruleset,
    pub noise: NoiseSettings,
    pub seed: u64,
    pub ticks_per_second: u32,
    pub stall_multiplier: u32,
    pub frame_skip: u32,
    pub speed_step: u32,
    pub cell_scale: u16,
    pub parallel: bool,
    pub headless: bool,
    pub max_ticks: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Parses the process arguments.
    pub fn from_env() -> Result<Config, clap::Error> {
        Config::try_parse_from(std::env::args_os())
    }

    /// Parses an argument list whose first item is the program name.
    pub fn try_parse_from<I, T>(args: I) -> Result<Config, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args)?;
        Ok(Config::from_cli(cli))
    }

    fn from_cli(cli: Cli) -> Config {
        Config {
            width: cli.width,
            height: cli.height,
            pattern: cli.pattern,
            rules: cli.rules,
            noise: NoiseSettings {
                density: cli.density,
                scale: cli.noise_scale,
            },
            seed: cli.seed.unwrap_or_else(rand::random),
            ticks_per_second: cli.tps,
            stall_multiplier: cli.stall_multiplier,
            frame_skip: cli.frame_skip,
            speed_step: cli.speed_step,
            cell_scale: cli.cell_scale,
            parallel: cli.parallel,
            headless: cli.headless,
            max_ticks: cli.ticks,
            log_file: cli.log_file,
        }
    }
}

/// Strict decimal parser for grid dimensions: digits only, at most
/// [`MAX_DIMENSION_DIGITS`] of them.
pub fn parse_dimension(value: &str) -> Result<u64, DimensionError> {
    if value.is_empty() {
        return Err(DimensionError::Empty);
    }
    if value.len() > MAX_DIMENSION_DIGITS {
        return Err(DimensionError::TooLarge {
            input: value.to_owned(),
        });
    }
    if let Some((index, ch)) = value.char_indices().find(|(_, ch)| !ch.is_ascii_digit()) {
        return Err(DimensionError::NotANumber {
            ch,
            position: value[..index].chars().count() + 1,
            input: value.to_owned(),
        });
    }
    value.parse().map_err(|_| DimensionError::TooLarge {
        input: value.to_owned(),
    })
}

fn parse_density(value: &str) -> Result<f64, String> {
    let density: f64 = value.parse().map_err(|err| format!("{err}"))?;
    if (0.0..=1.0).contains(&density) {
        Ok(density)
    } else {
        Err(format!("{density} is not between 0 and 1"))
    }
}

fn parse_scale(value: &str) -> Result<f64, String> {
    let scale: f64 = value.parse().map_err(|err| format!("{err}"))?;
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(format!("{scale} must be a positive number"))
    }
}
