//! Generation stepping.
//!
//! A [`Rule`] decides one cell's fate from its own state and its Moore
//! neighbourhood count. [`advance`] applies a rule to every cell, reading the
//! grid's current buffer and writing its scratch buffer; the caller swaps.

use std::ops::Add;

use clap::ValueEnum;
use rayon::prelude::*;

use crate::{
    error::GridError,
    grid::{wrap_coordinate, Grid},
};

/// Cell transition function.
pub trait Rule: Sync {
    fn name(&self) -> &'static str;

    /// Next state of a cell that is `alive` now and has `neighbors` live
    /// neighbours (0..=8).
    fn next_state(&self, alive: bool, neighbors: u8) -> bool;
}

/// Conway's B3/S23.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classic;

impl Rule for Classic {
    fn name(&self) -> &'static str {
        "classic"
    }

    fn next_state(&self, alive: bool, neighbors: u8) -> bool {
        if neighbors < 2 || neighbors > 3 {
            false
        } else if neighbors == 3 {
            true
        } else {
            alive
        }
    }
}

/// Experimental ruleset. Currently behaves exactly like [`Classic`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Testing;

impl Rule for Testing {
    fn name(&self) -> &'static str {
        "testing"
    }

    fn next_state(&self, alive: bool, neighbors: u8) -> bool {
        match neighbors {
            3 => true,
            2 => alive,
            _ => false,
        }
    }
}

/// Ruleset chosen for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Ruleset {
    #[default]
    Classic,
    Testing,
}

impl Rule for Ruleset {
    fn name(&self) -> &'static str {
        match self {
            Ruleset::Classic => Classic.name(),
            Ruleset::Testing => Testing.name(),
        }
    }

    fn next_state(&self, alive: bool, neighbors: u8) -> bool {
        match self {
            Ruleset::Classic => Classic.next_state(alive, neighbors),
            Ruleset::Testing => Testing.next_state(alive, neighbors),
        }
    }
}

/// What one generation step changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Generation {
    pub births: u64,
    pub deaths: u64,
    /// Live cells in the new generation.
    pub population: u64,
}

impl Add for Generation {
    type Output = Generation;

    fn add(self, other: Generation) -> Generation {
        Generation {
            births: self.births + other.births,
            deaths: self.deaths + other.deaths,
            population: self.population + other.population,
        }
    }
}

/// Live cells among the eight wrapped neighbours of `(x, y)`.
///
/// # Errors
///
/// [`GridError::Index`] when `(x, y)` lies outside the grid.
pub fn live_neighbors(grid: &Grid, x: u64, y: u64) -> Result<u8, GridError> {
    grid.index(x, y)?;
    let (width, height) = grid.dims();
    Ok(count_neighbors(grid.cells(), width, height, x as usize, y as usize))
}

fn count_neighbors(current: &[bool], width: usize, height: usize, x: usize, y: usize) -> u8 {
    let mut block = 0u8;
    for dx in -1..=1i64 {
        let nx = wrap_coordinate(x as u64, dx, width as u64) as usize;
        for dy in -1..=1i64 {
            let ny = wrap_coordinate(y as u64, dy, height as u64) as usize;
            block += u8::from(current[nx * height + ny]);
        }
    }
    block - u8::from(current[x * height + y])
}

/// Computes the next generation into the grid's scratch buffer. The current
/// buffer is left untouched; call [`Grid::swap`] to publish the result.
pub fn advance<R: Rule + ?Sized>(grid: &mut Grid, rule: &R) -> Generation {
    let (width, height) = grid.dims();
    let (current, next) = grid.split_buffers();

    next.chunks_mut(height)
        .enumerate()
        .map(|(x, column)| advance_column(current, column, x, width, height, rule))
        .fold(Generation::default(), |total, column| total + column)
}

/// Same as [`advance`], with columns computed on the rayon pool.
pub fn advance_parallel<R: Rule + ?Sized>(grid: &mut Grid, rule: &R) -> Generation {
    let (width, height) = grid.dims();
    let (current, next) = grid.split_buffers();

    next.par_chunks_mut(height)
        .enumerate()
        .map(|(x, column)| advance_column(current, column, x, width, height, rule))
        .reduce(Generation::default, |total, column| total + column)
}

fn advance_column<R: Rule + ?Sized>(
    current: &[bool],
    column: &mut [bool],
    x: usize,
    width: usize,
    height: usize,
    rule: &R,
) -> Generation {
    let mut generation = Generation::default();

    for (y, cell) in column.iter_mut().enumerate() {
        let alive = current[x * height + y];
        let neighbors = count_neighbors(current, width, height, x, y);
        let next = rule.next_state(alive, neighbors);

        match (alive, next) {
            (false, true) => generation.births += 1,
            (true, false) => generation.deaths += 1,
            _ => {}
        }
        generation.population += u64::from(next);
        *cell = next;
    }

    generation
}
