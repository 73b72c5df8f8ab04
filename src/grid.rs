use crate::error::GridError;

/// Wraps `v + offset` onto the torus `[0, bound)`.
///
/// Works for any sign of `offset`, including offsets larger than `bound`.
/// `bound` must be at least 1.
pub fn wrap_coordinate(v: u64, offset: i64, bound: u64) -> u64 {
    debug_assert!(bound >= 1, "wrap bound must be non-zero");
    (i128::from(v) + i128::from(offset)).rem_euclid(i128::from(bound)) as u64
}

/// Double-buffered toroidal cell array.
///
/// Both buffers are flat and indexed by `x * height + y`, so one column of
/// the grid is a contiguous run of `height` cells. `current` is what readers
/// see; `next` is the scratch target of the rule engine. [`Grid::swap`]
/// exchanges the two in O(1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    current: Vec<bool>,
    next: Vec<bool>,
}

impl Grid {
    /// Allocates a dead `width x height` grid.
    ///
    /// # Errors
    ///
    /// [`GridError::Allocation`] if a dimension is zero, the cell count does
    /// not fit the address space, or the allocator cannot provide the buffers.
    pub fn new(width: u64, height: u64) -> Result<Grid, GridError> {
        let fail = |reason| GridError::Allocation {
            width,
            height,
            reason,
        };

        if width == 0 || height == 0 {
            return Err(fail("dimensions must be at least 1"));
        }
        let w = usize::try_from(width).map_err(|_| fail("width exceeds address space"))?;
        let h = usize::try_from(height).map_err(|_| fail("height exceeds address space"))?;
        let len = w
            .checked_mul(h)
            .filter(|&len| len <= isize::MAX as usize)
            .ok_or_else(|| fail("cell count exceeds address space"))?;

        let current = dead_buffer(len).ok_or_else(|| fail("out of memory"))?;
        let next = dead_buffer(len).ok_or_else(|| fail("out of memory"))?;

        Ok(Grid {
            width: w,
            height: h,
            current,
            next,
        })
    }

    pub fn width(&self) -> u64 {
        self.width as u64
    }

    pub fn height(&self) -> u64 {
        self.height as u64
    }

    /// Reads a cell of the current generation.
    pub fn get(&self, x: u64, y: u64) -> Result<bool, GridError> {
        let index = self.index(x, y)?;
        Ok(self.current[index])
    }

    /// Writes a cell of the current generation. Used by the pattern
    /// generators before the first step.
    pub fn set(&mut self, x: u64, y: u64, alive: bool) -> Result<(), GridError> {
        let index = self.index(x, y)?;
        self.current[index] = alive;
        Ok(())
    }

    /// Reads a cell of the scratch buffer.
    pub fn get_next(&self, x: u64, y: u64) -> Result<bool, GridError> {
        let index = self.index(x, y)?;
        Ok(self.next[index])
    }

    /// Writes a cell of the scratch buffer.
    pub fn set_next(&mut self, x: u64, y: u64, alive: bool) -> Result<(), GridError> {
        let index = self.index(x, y)?;
        self.next[index] = alive;
        Ok(())
    }

    /// Exchanges the roles of the two buffers.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    /// Makes the scratch buffer an exact copy of the current one.
    pub fn sync_next(&mut self) {
        self.next.copy_from_slice(&self.current);
    }

    /// Kills every cell in both buffers.
    pub fn clear(&mut self) {
        self.current.fill(false);
        self.next.fill(false);
    }

    /// Current generation in `x * height + y` order.
    pub fn cells(&self) -> &[bool] {
        &self.current
    }

    /// Scratch buffer in `x * height + y` order.
    pub fn next_cells(&self) -> &[bool] {
        &self.next
    }

    pub fn population(&self) -> u64 {
        self.current.iter().filter(|&&cell| cell).count() as u64
    }

    /// Coordinates of every live cell, column by column.
    pub fn live_cells(&self) -> Vec<(u64, u64)> {
        self.current
            .iter()
            .enumerate()
            .filter(|(_, &alive)| alive)
            .map(|(i, _)| ((i / self.height) as u64, (i % self.height) as u64))
            .collect()
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [bool] {
        &mut self.current
    }

    /// Current buffer for reading and scratch buffer for writing, borrowed
    /// together for one generation step.
    pub(crate) fn split_buffers(&mut self) -> (&[bool], &mut [bool]) {
        (&self.current, &mut self.next)
    }

    pub(crate) fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub(crate) fn index(&self, x: u64, y: u64) -> Result<usize, GridError> {
        if x >= self.width() || y >= self.height() {
            return Err(GridError::Index {
                x,
                y,
                width: self.width(),
                height: self.height(),
            });
        }
        Ok(x as usize * self.height + y as usize)
    }
}

fn dead_buffer(len: usize) -> Option<Vec<bool>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).ok()?;
    buffer.resize(len, false);
    Some(buffer)
}
