use clap::ValueEnum;
use rand::Rng;
use tracing::debug;

use crate::{error::GridError, grid::Grid, noise::noise};

/// Initial-state generator selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Pattern {
    /// Every cell alive with probability 1/2.
    Random,
    /// A single glider heading towards +x, +y.
    Glider,
    /// The acorn methuselah.
    Acorn,
    /// Alternating live and dead cells.
    Checkerboard,
    /// Coherent noise thresholded by the configured density.
    Noise,
}

impl Pattern {
    pub fn name(self) -> &'static str {
        match self {
            Pattern::Random => "random",
            Pattern::Glider => "glider",
            Pattern::Acorn => "acorn",
            Pattern::Checkerboard => "checkerboard",
            Pattern::Noise => "noise",
        }
    }
}

/// Live cells of the glider, as literal grid coordinates.
pub const GLIDER: &[(u64, u64)] = &[(2, 1), (3, 2), (1, 3), (2, 3), (3, 3)];

/// Live cells of the acorn, as literal grid coordinates.
pub const ACORN: &[(u64, u64)] = &[(2, 1), (4, 2), (1, 3), (2, 3), (5, 3), (6, 3), (7, 3)];

/// Tuning for the noise-threshold generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseSettings {
    /// Bias towards live cells, in `[0, 1]`.
    pub density: f64,
    /// Grid cells per noise lattice unit.
    pub scale: f64,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        NoiseSettings {
            density: 0.5,
            scale: 1.0,
        }
    }
}

/// Populates a grid with `pattern` and seeds the scratch buffer with the
/// result, so both buffers agree before the first generation step.
///
/// # Errors
///
/// [`GridError::Index`] if a literal pattern does not fit the grid.
pub fn populate<R: Rng + ?Sized>(
    grid: &mut Grid,
    pattern: Pattern,
    noise: NoiseSettings,
    rng: &mut R,
) -> Result<(), GridError> {
    match pattern {
        Pattern::Random => uniform_random(grid, rng),
        Pattern::Glider => place(grid, GLIDER)?,
        Pattern::Acorn => place(grid, ACORN)?,
        Pattern::Checkerboard => checkerboard(grid)?,
        Pattern::Noise => noise_threshold(grid, noise)?,
    }
    grid.sync_next();

    debug!(
        pattern = pattern.name(),
        population = grid.population(),
        "populated initial generation"
    );
    Ok(())
}

fn uniform_random<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) {
    for cell in grid.cells_mut() {
        *cell = rng.gen_bool(0.5);
    }
}

/// Clears the grid and switches on the given literal coordinates.
pub fn place(grid: &mut Grid, cells: &[(u64, u64)]) -> Result<(), GridError> {
    grid.clear();
    for &(x, y) in cells {
        grid.set(x, y, true)?;
    }
    Ok(())
}

fn checkerboard(grid: &mut Grid) -> Result<(), GridError> {
    for x in 0..grid.width() {
        for y in 0..grid.height() {
            grid.set(x, y, (x + y) % 2 == 0)?;
        }
    }
    Ok(())
}

fn noise_threshold(grid: &mut Grid, settings: NoiseSettings) -> Result<(), GridError> {
    for x in 0..grid.width() {
        for y in 0..grid.height() {
            let sample = noise(
                ((x as f64 + 0.5) / settings.scale) as f32,
                ((y as f64 + 0.5) / settings.scale) as f32,
            );
            grid.set(x, y, noise_cell(settings.density, sample))?;
        }
    }
    Ok(())
}

/// `round((density + sample) / 2)` read as a live/dead decision.
fn noise_cell(density: f64, sample: f32) -> bool {
    ((density + f64::from(sample)) / 2.0).round() >= 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn every_pattern_leaves_buffers_in_sync() {
        for pattern in Pattern::value_variants() {
            let mut grid = Grid::new(16, 12).unwrap();
            populate(&mut grid, *pattern, NoiseSettings::default(), &mut rng()).unwrap();
            assert_eq!(grid.cells(), grid.next_cells(), "{}", pattern.name());
        }
    }

    #[test]
    fn glider_writes_literal_cells() {
        let mut grid = Grid::new(8, 8).unwrap();
        populate(&mut grid, Pattern::Glider, NoiseSettings::default(), &mut rng()).unwrap();

        let mut live = grid.live_cells();
        live.sort_unstable();
        let mut expected = GLIDER.to_vec();
        expected.sort_unstable();
        assert_eq!(live, expected);
    }

    #[test]
    fn acorn_has_seven_cells() {
        let mut grid = Grid::new(10, 10).unwrap();
        populate(&mut grid, Pattern::Acorn, NoiseSettings::default(), &mut rng()).unwrap();
        assert_eq!(grid.population(), 7);
    }

    #[test]
    fn literal_pattern_on_small_grid_is_an_index_error() {
        let mut grid = Grid::new(3, 3).unwrap();
        let result = populate(&mut grid, Pattern::Glider, NoiseSettings::default(), &mut rng());
        assert!(matches!(result, Err(GridError::Index { .. })));

        let mut grid = Grid::new(6, 6).unwrap();
        let result = populate(&mut grid, Pattern::Acorn, NoiseSettings::default(), &mut rng());
        assert!(matches!(result, Err(GridError::Index { x: 6, .. })));
    }

    #[test]
    fn checkerboard_alternates() {
        let mut grid = Grid::new(4, 3).unwrap();
        populate(&mut grid, Pattern::Checkerboard, NoiseSettings::default(), &mut rng()).unwrap();
        assert!(grid.get(0, 0).unwrap());
        assert!(!grid.get(1, 0).unwrap());
        assert!(!grid.get(0, 1).unwrap());
        assert!(grid.get(1, 1).unwrap());
        assert_eq!(grid.population(), 6);
    }

    #[test]
    fn random_is_reproducible_for_a_seed() {
        let mut a = Grid::new(20, 20).unwrap();
        let mut b = Grid::new(20, 20).unwrap();
        populate(&mut a, Pattern::Random, NoiseSettings::default(), &mut rng()).unwrap();
        populate(&mut b, Pattern::Random, NoiseSettings::default(), &mut rng()).unwrap();
        assert_eq!(a.cells(), b.cells());

        let population = a.population();
        assert!(population > 100 && population < 300, "population {population}");
    }

    #[test]
    fn noise_density_extremes() {
        let full = NoiseSettings {
            density: 1.0,
            scale: 1.0,
        };
        let empty = NoiseSettings {
            density: 0.0,
            scale: 1.0,
        };
        let mut dense = Grid::new(24, 24).unwrap();
        let mut sparse = Grid::new(24, 24).unwrap();
        populate(&mut dense, Pattern::Noise, full, &mut rng()).unwrap();
        populate(&mut sparse, Pattern::Noise, empty, &mut rng()).unwrap();
        assert!(dense.population() > sparse.population());
    }

    #[test]
    fn noise_cell_threshold() {
        assert!(noise_cell(1.0, 0.0));
        assert!(noise_cell(0.5, 0.5));
        assert!(!noise_cell(0.5, 0.4));
        assert!(!noise_cell(0.0, -1.0));
        assert!(!noise_cell(0.0, 0.0));
    }

    #[test]
    fn noise_pattern_is_deterministic() {
        let settings = NoiseSettings {
            density: 0.6,
            scale: 4.0,
        };
        let mut a = Grid::new(30, 30).unwrap();
        let mut b = Grid::new(30, 30).unwrap();
        populate(&mut a, Pattern::Noise, settings, &mut StdRng::seed_from_u64(1)).unwrap();
        populate(&mut b, Pattern::Noise, settings, &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(a.cells(), b.cells());
    }
}
