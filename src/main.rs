use std::{fs::File, process::ExitCode, sync::Mutex};

use torus_life::{
    build_simulation,
    headless::{HeadlessOutput, ScriptedInput},
    terminal::{KeyboardInput, TerminalUi},
    AppError, Config, Pacer,
};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Main entry point for the Game of Life application.
///
/// # Controls
///
/// * Space / Esc: Play/Pause the simulation
/// * Enter: Step forward one generation (when paused)
/// * + / -: Faster / slower
/// * q: Quit the application
fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let AppError::Cli(cli) = &err {
                cli.print().ok();
            } else {
                error!(%err, "simulator stopped");
                eprintln!("Error: {err}");
            }
            err.into()
        }
    }
}

fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;
    init_tracing(&config)?;

    let mut simulation = build_simulation(&config)?;
    let pacer = Pacer::new(config.ticks_per_second, config.stall_multiplier);

    if config.headless {
        let mut output = HeadlessOutput::default();
        simulation.run(&mut ScriptedInput::default(), &mut output, &pacer, config.max_ticks)?;

        let stats = simulation.stats();
        println!(
            "generation {} population {} created {} destroyed {} frames {}",
            stats.generation,
            stats.current_population,
            stats.cells_created,
            stats.cells_destroyed,
            output.frames
        );
        return Ok(());
    }

    // The UI restores the terminal when dropped, before any error is printed.
    let mut ui = TerminalUi::new(config.cell_scale)?;
    simulation.run(&mut KeyboardInput, &mut ui, &pacer, config.max_ticks)?;
    Ok(())
}

/// Installs the `tracing` subscriber. Logs go to `--log-file` when given,
/// to stderr in headless mode, and nowhere otherwise since the UI owns the
/// screen.
fn init_tracing(config: &Config) -> Result<(), AppError> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(path) = &config.log_file {
        let file = File::create(path).map_err(AppError::LogFile)?;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    } else if config.headless {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .try_init();
    }
    Ok(())
}
