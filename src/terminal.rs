//! Terminal front end: a ratatui renderer and status line, and crossterm key
//! decoding.

use std::{
    io::{self, Stdout},
    time::Duration,
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use sysinfo::{System, SystemExt};
use tracing::error;

use crate::{
    error::{AppError, TerminalStage},
    grid::Grid,
    rules::Rule,
    simulation::{Command, FrameView, InputSource, Mode, Renderer, StatusSink},
};

const LIVE_CELL: char = '█';
const TITLE: &str = "Game of Life [Space/Esc: Play/Pause | Enter: Step | +/-: Speed | q: Quit]";

/// Text of the statistics panel.
#[derive(Debug, Clone, Default)]
struct Panel {
    generation: u64,
    population: u64,
    cells_created: u64,
    cells_destroyed: u64,
    birth_rate: f64,
    death_rate: f64,
    frame_skip: u32,
    rules: &'static str,
}

/// Full-screen ratatui view of the grid plus a statistics panel.
///
/// Owns the terminal for its lifetime; raw mode and the alternate screen are
/// restored on drop.
pub struct TerminalUi {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    sys: System,
    cell_scale: u16,
    /// Grid text of the last rendered frame, redrawn under status updates.
    cells: String,
    panel: Panel,
    status: String,
}

impl TerminalUi {
    /// Switches the terminal to raw mode on the alternate screen.
    ///
    /// # Errors
    ///
    /// [`AppError::TerminalInit`] naming the setup step that failed.
    pub fn new(cell_scale: u16) -> Result<TerminalUi, AppError> {
        enable_raw_mode().map_err(|source| AppError::TerminalInit {
            stage: TerminalStage::RawMode,
            source,
        })?;

        let mut stdout = io::stdout();
        if let Err(source) = execute!(stdout, EnterAlternateScreen) {
            restore_terminal();
            return Err(AppError::TerminalInit {
                stage: TerminalStage::AlternateScreen,
                source,
            });
        }

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = match Terminal::new(backend) {
            Ok(terminal) => terminal,
            Err(source) => {
                restore_terminal();
                return Err(AppError::TerminalInit {
                    stage: TerminalStage::Backend,
                    source,
                });
            }
        };
        terminal.hide_cursor().ok();

        Ok(TerminalUi {
            terminal,
            sys: System::new(),
            cell_scale: cell_scale.max(1),
            cells: String::new(),
            panel: Panel::default(),
            status: "Running".to_owned(),
        })
    }

    fn draw(&mut self) -> io::Result<()> {
        let cells = &self.cells;
        let panel = &self.panel;
        let status = &self.status;
        let memory = (self.sys.used_memory() / 1024, self.sys.total_memory() / 1024);

        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(75), Constraint::Percentage(25)].as_ref())
                .split(f.size());

            draw_grid(f, cells, chunks[0]);
            draw_stats(f, panel, status, memory, chunks[1]);
        })?;
        Ok(())
    }
}

impl Renderer for TerminalUi {
    fn render(&mut self, frame: FrameView<'_>) -> io::Result<()> {
        let area = self.terminal.size()?;
        let grid_area = Rect {
            width: (u32::from(area.width) * 3 / 4) as u16,
            ..area
        };
        self.cells = grid_text(frame.grid, grid_area, self.cell_scale);

        self.panel = Panel {
            generation: frame.stats.generation,
            population: frame.stats.current_population,
            cells_created: frame.stats.cells_created,
            cells_destroyed: frame.stats.cells_destroyed,
            birth_rate: frame.stats.birth_rate(),
            death_rate: frame.stats.death_rate(),
            frame_skip: frame.run.frame_skip(),
            rules: frame.rules.name(),
        };
        self.status = match frame.run.mode {
            Mode::Running => "Running",
            Mode::Paused => "Paused",
            Mode::Quit => "Quitting",
        }
        .to_owned();

        self.sys.refresh_memory();
        self.draw()
    }
}

impl StatusSink for TerminalUi {
    fn status(&mut self, message: &str) -> io::Result<()> {
        if self.status == message {
            return Ok(());
        }
        self.status = message.to_owned();
        self.draw()
    }
}

impl Drop for TerminalUi {
    fn drop(&mut self) {
        self.terminal.show_cursor().ok();
        if let Err(err) = disable_raw_mode() {
            error!(?err, "failed to disable raw mode");
        }
        if let Err(err) = execute!(self.terminal.backend_mut(), LeaveAlternateScreen) {
            error!(?err, "failed to leave alternate screen");
        }
    }
}

fn restore_terminal() {
    if let Err(err) = disable_raw_mode() {
        error!(?err, "failed to disable raw mode");
    }
    if let Err(err) = execute!(io::stdout(), LeaveAlternateScreen) {
        error!(?err, "failed to leave alternate screen");
    }
}

/// Renders the part of the grid that fits inside a bordered `area`, one
/// `scale`-column block per live cell.
fn grid_text(grid: &Grid, area: Rect, scale: u16) -> String {
    let (width, height) = grid.dims();
    let columns = usize::from(area.width.saturating_sub(2) / scale.max(1)).min(width);
    let rows = usize::from(area.height.saturating_sub(2)).min(height);
    let current = grid.cells();

    let mut cells = String::new();
    for y in 0..rows {
        for x in 0..columns {
            let alive = current[x * height + y];
            let glyph = if alive { LIVE_CELL } else { ' ' };
            cells.extend(std::iter::repeat(glyph).take(usize::from(scale)));
        }
        cells.push('\n');
    }
    cells
}

/// Draws the game grid to the terminal interface.
fn draw_grid(f: &mut Frame, cells: &str, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(TITLE);

    let paragraph = Paragraph::new(cells)
        .style(Style::default().fg(Color::White))
        .block(block);

    f.render_widget(paragraph, area);
}

/// Draws the statistics panel to the terminal interface.
fn draw_stats(f: &mut Frame, panel: &Panel, status: &str, memory: (u64, u64), area: Rect) {
    let (memory_used, memory_total) = memory;

    let stats_text = format!(
        "Statistics:\n\
        Generation: {}\n\
        Current Population: {}\n\
        Cells Created: {}\n\
        Cells Destroyed: {}\n\
        Birth Rate: {:.2}/gen\n\
        Death Rate: {:.2}/gen\n\
        Frame Skip: {}\n\
        Rules: {}\n\
        Memory Usage: {}KB/{:.2}MB\n\
        Status: {}\n",
        panel.generation,
        panel.population,
        panel.cells_created,
        panel.cells_destroyed,
        panel.birth_rate,
        panel.death_rate,
        panel.frame_skip,
        panel.rules,
        memory_used,
        memory_total as f64 / 1024.0,
        status,
    );

    let stats_widget = Paragraph::new(stats_text)
        .block(Block::default().borders(Borders::ALL).title("Statistics"))
        .wrap(Wrap { trim: true });

    f.render_widget(stats_widget, area);
}

/// Keyboard input read from crossterm without blocking.
#[derive(Debug, Default)]
pub struct KeyboardInput;

impl InputSource for KeyboardInput {
    fn poll_command(&mut self) -> io::Result<Option<Command>> {
        if !event::poll(Duration::ZERO)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => Ok(Some(decode_key(key))),
            _ => Ok(None),
        }
    }
}

/// Maps a key press onto a loop command.
pub fn decode_key(key: KeyEvent) -> Command {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Command::Quit,
        KeyCode::Char('q') | KeyCode::Char('Q') => Command::Quit,
        KeyCode::Esc | KeyCode::Char(' ') => Command::TogglePause,
        KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Up => Command::SpeedUp,
        KeyCode::Char('-') | KeyCode::Down => Command::SpeedDown,
        KeyCode::Enter => Command::Step,
        other => Command::Unrecognized(format!("{other:?}")),
    }
}
