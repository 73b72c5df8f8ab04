//! # Torus Life
//!
//! Conway's Game of Life on a wraparound grid, drawn in the terminal with
//! `ratatui` and driven by `crossterm` key presses.
//!
//! ## Features
//!
//! * Double-buffered toroidal grid with O(1) generation swaps
//! * Random, glider, acorn, checkerboard and coherent-noise starting patterns
//! * Selectable rulesets, optionally stepped in parallel with `rayon`
//! * Fixed-rate loop with pause, single step and speed control
//! * Real-time statistics and memory monitoring
//! * Headless mode for scripted runs

pub mod config;
pub mod error;
pub mod grid;
pub mod headless;
pub mod noise;
pub mod patterns;
pub mod rules;
pub mod simulation;
pub mod terminal;

use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

pub use config::Config;
pub use error::{AppError, GridError};
pub use grid::{wrap_coordinate, Grid};
pub use patterns::{NoiseSettings, Pattern};
pub use rules::{advance, Generation, Rule, Ruleset};
pub use simulation::{Command, Mode, Pacer, RunState, Simulation, Stats};

/// Allocates and populates the grid described by `config` and wraps it in a
/// ready-to-run [`Simulation`].
///
/// # Errors
///
/// [`GridError`] if the grid cannot be allocated or the pattern does not fit.
pub fn build_simulation(config: &Config) -> Result<Simulation, GridError> {
    let mut grid = Grid::new(config.width, config.height)?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    patterns::populate(&mut grid, config.pattern, config.noise, &mut rng)?;

    info!(
        width = config.width,
        height = config.height,
        pattern = config.pattern.name(),
        seed = config.seed,
        population = grid.population(),
        "grid of size {} by {}",
        config.width,
        config.height
    );

    let run = RunState::new(config.frame_skip, config.speed_step);
    Ok(Simulation::new(grid, config.rules, run).with_parallel(config.parallel))
}
