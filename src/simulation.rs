//! The fixed-cadence simulation loop.
//!
//! Each tick polls at most one input command, and on every `frame_skip`-th
//! tick either renders and advances the grid (running) or reports the paused
//! status. Between ticks the [`Pacer`] idles out the rest of the tick budget
//! and aborts the run if a tick overran it by far.

use std::{
    io, thread,
    time::{Duration, Instant},
};

use tracing::{debug, info, trace};

use crate::{
    error::{LoopError, PacingError},
    grid::Grid,
    rules::{advance, advance_parallel, Generation, Rule, Ruleset},
};

/// Upper bound on `frame_skip`, the slowest selectable speed.
pub const MAX_FRAME_SKIP: u32 = 1000;

/// Text handed to the status sink on every eligible tick while paused.
pub const PAUSED_STATUS: &str = "--------PAUSED--------";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Running,
    Paused,
    Quit,
}

/// Abstract input decoded by an [`InputSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    TogglePause,
    /// Fewer ticks per generation.
    SpeedUp,
    /// More ticks per generation.
    SpeedDown,
    /// Advance exactly one generation while paused.
    Step,
    Unrecognized(String),
}

/// Mutable session state of the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    pub mode: Mode,
    frame_skip: u32,
    pub tick_counter: u64,
    speed_step: u32,
}

impl RunState {
    pub fn new(frame_skip: u32, speed_step: u32) -> RunState {
        RunState {
            mode: Mode::Running,
            frame_skip: frame_skip.clamp(1, MAX_FRAME_SKIP),
            tick_counter: 0,
            speed_step: speed_step.max(1),
        }
    }

    /// Ticks per generation, never below 1.
    pub fn frame_skip(&self) -> u32 {
        self.frame_skip
    }

    /// Applies a mode or speed command. `Step` and unrecognized keys leave
    /// the state alone.
    pub fn apply(&mut self, command: &Command) {
        match command {
            Command::Quit => self.mode = Mode::Quit,
            Command::TogglePause => {
                self.mode = match self.mode {
                    Mode::Running => Mode::Paused,
                    Mode::Paused => Mode::Running,
                    Mode::Quit => Mode::Quit,
                }
            }
            Command::SpeedUp => {
                self.frame_skip = self.frame_skip.saturating_sub(self.speed_step).max(1);
            }
            Command::SpeedDown => {
                self.frame_skip = self
                    .frame_skip
                    .saturating_add(self.speed_step)
                    .min(MAX_FRAME_SKIP);
            }
            Command::Step | Command::Unrecognized(_) => {}
        }
    }

    /// Whether the current tick simulates (or reports the pause).
    pub fn is_step_tick(&self) -> bool {
        self.tick_counter % u64::from(self.frame_skip) == 0
    }
}

impl Default for RunState {
    fn default() -> Self {
        RunState::new(1, 1)
    }
}

/// Running totals across generations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Current generation number
    pub generation: u64,
    /// Total number of cells created since start
    pub cells_created: u64,
    /// Total number of cells destroyed since start
    pub cells_destroyed: u64,
    /// Current number of living cells
    pub current_population: u64,
}

impl Stats {
    pub fn new(population: u64) -> Stats {
        Stats {
            current_population: population,
            ..Stats::default()
        }
    }

    pub fn record(&mut self, generation: Generation) {
        self.generation += 1;
        self.cells_created += generation.births;
        self.cells_destroyed += generation.deaths;
        self.current_population = generation.population;
    }

    pub fn birth_rate(&self) -> f64 {
        self.cells_created as f64 / self.generation.max(1) as f64
    }

    pub fn death_rate(&self) -> f64 {
        self.cells_destroyed as f64 / self.generation.max(1) as f64
    }
}

/// Read-only view handed to the renderer.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub grid: &'a Grid,
    pub stats: &'a Stats,
    pub run: &'a RunState,
    pub rules: Ruleset,
}

/// Draws the current generation.
pub trait Renderer {
    fn render(&mut self, frame: FrameView<'_>) -> io::Result<()>;
}

/// Non-blocking source of commands.
pub trait InputSource {
    /// Returns the next pending command, or `None` at once if there is none.
    fn poll_command(&mut self) -> io::Result<Option<Command>>;
}

/// Operator-facing status output.
pub trait StatusSink {
    fn status(&mut self, message: &str) -> io::Result<()>;
}

/// Converts elapsed tick time into an idle period, or a stall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    budget: Duration,
    limit: Duration,
}

impl Pacer {
    /// `ticks_per_second` and `stall_multiplier` are raised to at least 1.
    pub fn new(ticks_per_second: u32, stall_multiplier: u32) -> Pacer {
        let budget = Duration::from_secs(1) / ticks_per_second.max(1);
        Pacer {
            budget,
            limit: budget.saturating_mul(stall_multiplier.max(1)),
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// How long to idle after a tick that took `elapsed`.
    ///
    /// # Errors
    ///
    /// [`PacingError::Stall`] when `elapsed` is beyond the stall limit.
    pub fn idle_for(&self, elapsed: Duration) -> Result<Duration, PacingError> {
        if elapsed > self.limit {
            return Err(PacingError::Stall {
                elapsed,
                budget: self.budget,
                limit: self.limit,
            });
        }
        Ok(self.budget.saturating_sub(elapsed))
    }
}

/// Owns the grid and session state for one run.
#[derive(Debug)]
pub struct Simulation {
    grid: Grid,
    rules: Ruleset,
    run: RunState,
    stats: Stats,
    parallel: bool,
}

impl Simulation {
    /// `grid` must already hold its initial generation with both buffers in
    /// sync.
    pub fn new(grid: Grid, rules: Ruleset, run: RunState) -> Simulation {
        let stats = Stats::new(grid.population());
        Simulation {
            grid,
            rules,
            run,
            stats,
            parallel: false,
        }
    }

    /// Computes generations on the rayon pool.
    pub fn with_parallel(mut self, parallel: bool) -> Simulation {
        self.parallel = parallel;
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn run_state(&self) -> &RunState {
        &self.run
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.run.mode == Mode::Quit
    }

    fn frame(&self) -> FrameView<'_> {
        FrameView {
            grid: &self.grid,
            stats: &self.stats,
            run: &self.run,
            rules: self.rules,
        }
    }

    /// Computes the next generation and publishes it.
    pub fn step(&mut self) -> Generation {
        let generation = if self.parallel {
            advance_parallel(&mut self.grid, &self.rules)
        } else {
            advance(&mut self.grid, &self.rules)
        };
        self.grid.swap();
        self.stats.record(generation);

        trace!(
            generation = self.stats.generation,
            births = generation.births,
            deaths = generation.deaths,
            population = generation.population,
            "advanced"
        );
        generation
    }

    /// One iteration of the loop, without pacing.
    pub fn tick<I, O>(&mut self, input: &mut I, output: &mut O) -> io::Result<()>
    where
        I: InputSource + ?Sized,
        O: Renderer + StatusSink + ?Sized,
    {
        if let Some(command) = input.poll_command()? {
            self.handle(&command, output)?;
        }

        if self.run.is_step_tick() {
            match self.run.mode {
                Mode::Running => {
                    output.render(self.frame())?;
                    self.step();
                }
                Mode::Paused => output.status(PAUSED_STATUS)?,
                Mode::Quit => {}
            }
        }

        self.run.tick_counter = self.run.tick_counter.wrapping_add(1);
        Ok(())
    }

    fn handle<O>(&mut self, command: &Command, output: &mut O) -> io::Result<()>
    where
        O: Renderer + ?Sized,
    {
        let before = self.run.mode;
        self.run.apply(command);

        match command {
            Command::Quit => info!(generation = self.stats.generation, "quit requested"),
            Command::TogglePause => {
                info!(from = ?before, to = ?self.run.mode, "toggled pause");
            }
            Command::SpeedUp | Command::SpeedDown => {
                debug!(frame_skip = self.run.frame_skip(), "speed changed");
            }
            Command::Step if self.run.mode == Mode::Paused => {
                self.step();
                output.render(self.frame())?;
            }
            Command::Step => {}
            Command::Unrecognized(key) => debug!(%key, "pressed unbound key"),
        }
        Ok(())
    }

    /// Ticks until quit (or `max_ticks`), idling each tick out to the
    /// pacer's budget.
    ///
    /// # Errors
    ///
    /// Collaborator I/O failures and pacing stalls end the run.
    pub fn run<I, O>(
        &mut self,
        input: &mut I,
        output: &mut O,
        pacer: &Pacer,
        max_ticks: Option<u64>,
    ) -> Result<(), LoopError>
    where
        I: InputSource + ?Sized,
        O: Renderer + StatusSink + ?Sized,
    {
        info!(
            width = self.grid.width(),
            height = self.grid.height(),
            rules = self.rules.name(),
            frame_skip = self.run.frame_skip(),
            budget = ?pacer.budget(),
            "simulation started"
        );

        let mut ticks = 0u64;
        while !self.is_finished() && max_ticks.map_or(true, |limit| ticks < limit) {
            let start = Instant::now();
            self.tick(input, output)?;
            ticks += 1;

            let idle = pacer.idle_for(start.elapsed())?;
            if !idle.is_zero() {
                thread::sleep(idle);
            }
        }

        info!(
            ticks,
            generation = self.stats.generation,
            population = self.stats.current_population,
            "simulation finished"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Script(VecDeque<Command>);

    impl InputSource for Script {
        fn poll_command(&mut self) -> io::Result<Option<Command>> {
            Ok(self.0.pop_front())
        }
    }

    #[derive(Default)]
    struct Recorder {
        frames: Vec<u64>,
        messages: Vec<String>,
    }

    impl Renderer for Recorder {
        fn render(&mut self, frame: FrameView<'_>) -> io::Result<()> {
            self.frames.push(frame.stats.generation);
            Ok(())
        }
    }

    impl StatusSink for Recorder {
        fn status(&mut self, message: &str) -> io::Result<()> {
            self.messages.push(message.to_owned());
            Ok(())
        }
    }

    fn blinker() -> Simulation {
        let mut grid = Grid::new(5, 5).unwrap();
        for x in 1..4 {
            grid.set(x, 2, true).unwrap();
        }
        grid.sync_next();
        Simulation::new(grid, Ruleset::Classic, RunState::default())
    }

    #[test]
    fn toggle_flips_between_running_and_paused() {
        let mut run = RunState::default();
        run.apply(&Command::TogglePause);
        assert_eq!(run.mode, Mode::Paused);
        run.apply(&Command::TogglePause);
        assert_eq!(run.mode, Mode::Running);
    }

    #[test]
    fn quit_is_terminal() {
        let mut run = RunState::default();
        run.apply(&Command::TogglePause);
        run.apply(&Command::Quit);
        assert_eq!(run.mode, Mode::Quit);
        run.apply(&Command::TogglePause);
        assert_eq!(run.mode, Mode::Quit);
    }

    #[test]
    fn speed_up_never_reaches_zero() {
        let mut run = RunState::new(5, 2);
        for _ in 0..100 {
            run.apply(&Command::SpeedUp);
            assert!(run.frame_skip >= 1);
        }
        assert_eq!(run.frame_skip, 1);
        assert!(run.is_step_tick());
    }

    #[test]
    fn speed_down_saturates() {
        let mut run = RunState::new(MAX_FRAME_SKIP - 1, 7);
        run.apply(&Command::SpeedDown);
        run.apply(&Command::SpeedDown);
        assert_eq!(run.frame_skip, MAX_FRAME_SKIP);
    }

    #[test]
    fn zero_frame_skip_is_raised_to_one() {
        assert_eq!(RunState::new(0, 0).frame_skip, 1);
    }

    #[test]
    fn running_tick_renders_then_advances() {
        let mut sim = blinker();
        let mut out = Recorder::default();

        sim.tick(&mut Script::default(), &mut out).unwrap();

        assert_eq!(out.frames, vec![0]);
        assert_eq!(sim.stats().generation, 1);
        assert_eq!(sim.run_state().tick_counter, 1);
        assert!(sim.grid().get(2, 1).unwrap());
        assert!(out.messages.is_empty());
    }

    #[test]
    fn frame_skip_spaces_out_generations() {
        let mut sim = blinker();
        sim.run = RunState::new(3, 1);
        let mut out = Recorder::default();

        for _ in 0..9 {
            sim.tick(&mut Script::default(), &mut out).unwrap();
        }
        assert_eq!(sim.stats().generation, 3);
        assert_eq!(out.frames, vec![0, 1, 2]);
    }

    #[test]
    fn paused_ticks_leave_grid_untouched() {
        let mut sim = blinker();
        let mut input = Script(VecDeque::from([Command::TogglePause]));
        let mut out = Recorder::default();
        let before = sim.grid().clone();

        for _ in 0..10 {
            sim.tick(&mut input, &mut out).unwrap();
        }

        assert_eq!(sim.grid().cells(), before.cells());
        assert_eq!(sim.grid().next_cells(), before.next_cells());
        assert!(out.frames.is_empty());
        assert_eq!(out.messages.len(), 10);
        assert!(out.messages.iter().all(|m| m == PAUSED_STATUS));
    }

    #[test]
    fn step_advances_once_while_paused() {
        let mut sim = blinker();
        let mut input = Script(VecDeque::from([Command::TogglePause, Command::Step]));
        let mut out = Recorder::default();

        for _ in 0..4 {
            sim.tick(&mut input, &mut out).unwrap();
        }
        assert_eq!(sim.stats().generation, 1);
        assert_eq!(out.frames, vec![1]);
    }

    #[test]
    fn step_is_ignored_while_running() {
        let mut sim = blinker();
        let mut input = Script(VecDeque::from([Command::Step]));
        sim.tick(&mut input, &mut Recorder::default()).unwrap();
        assert_eq!(sim.stats().generation, 1);
    }

    #[test]
    fn stats_track_births_and_deaths() {
        let mut sim = blinker();
        sim.step();
        sim.step();
        let stats = sim.stats();
        assert_eq!(stats.generation, 2);
        assert_eq!(stats.cells_created, 4);
        assert_eq!(stats.cells_destroyed, 4);
        assert_eq!(stats.current_population, 3);
        assert_eq!(stats.birth_rate(), 2.0);
    }

    #[test]
    fn run_stops_on_quit() {
        let mut sim = blinker();
        let mut input = Script(VecDeque::from([
            Command::Unrecognized("x".into()),
            Command::Quit,
        ]));
        let pacer = Pacer::new(1000, 100);
        sim.run(&mut input, &mut Recorder::default(), &pacer, None).unwrap();
        assert!(sim.is_finished());
        assert_eq!(sim.stats().generation, 1);
    }

    #[test]
    fn run_honours_tick_limit() {
        let mut sim = blinker();
        let pacer = Pacer::new(1000, 100);
        let mut out = Recorder::default();
        sim.run(&mut Script::default(), &mut out, &pacer, Some(5)).unwrap();
        assert_eq!(sim.run_state().tick_counter, 5);
        assert!(!sim.is_finished());
    }

    #[test]
    fn pacer_idles_out_the_budget() {
        let pacer = Pacer::new(100, 100);
        assert_eq!(pacer.budget(), Duration::from_millis(10));
        assert_eq!(
            pacer.idle_for(Duration::from_millis(4)),
            Ok(Duration::from_millis(6))
        );
        assert_eq!(pacer.idle_for(Duration::from_millis(50)), Ok(Duration::ZERO));
        assert!(pacer.idle_for(Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn pacer_reports_stalls() {
        let pacer = Pacer::new(100, 100);
        let err = pacer.idle_for(Duration::from_millis(1001)).unwrap_err();
        assert_eq!(
            err,
            PacingError::Stall {
                elapsed: Duration::from_millis(1001),
                budget: Duration::from_millis(10),
                limit: Duration::from_secs(1),
            }
        );
    }

    /// Renderer that blocks each frame well past a 1 ms tick budget.
    struct SlowRenderer;

    impl Renderer for SlowRenderer {
        fn render(&mut self, _frame: FrameView<'_>) -> io::Result<()> {
            thread::sleep(Duration::from_millis(20));
            Ok(())
        }
    }

    impl StatusSink for SlowRenderer {
        fn status(&mut self, _message: &str) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn run_aborts_when_a_tick_stalls() {
        let mut sim = blinker();
        let pacer = Pacer::new(1000, 1);

        let err = sim
            .run(&mut Script::default(), &mut SlowRenderer, &pacer, Some(10))
            .unwrap_err();

        match err {
            LoopError::Pacing(PacingError::Stall {
                elapsed,
                budget,
                limit,
            }) => {
                assert_eq!(budget, Duration::from_millis(1));
                assert_eq!(limit, Duration::from_millis(1));
                assert!(elapsed >= Duration::from_millis(20));
            }
            other => panic!("expected a stall, got {other:?}"),
        }
        assert_eq!(sim.run_state().tick_counter, 1);
        assert_eq!(sim.stats().generation, 1);
    }
}
