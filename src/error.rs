//! Error taxonomy for the simulator and the mapping of each category onto a
//! process exit code.

use std::{io, process::ExitCode, time::Duration};

use thiserror::Error;

/// Failures raised by [`Grid`](crate::Grid) construction and access.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    /// The grid could not be allocated: a zero dimension, a cell count that
    /// does not fit in memory, or the allocator refused the request.
    #[error("cannot allocate a {width}x{height} grid: {reason}")]
    Allocation {
        width: u64,
        height: u64,
        reason: &'static str,
    },
    /// A coordinate outside `[0, width) x [0, height)` was used.
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    Index {
        x: u64,
        y: u64,
        width: u64,
        height: u64,
    },
}

/// Rejections produced by the strict grid-dimension parser.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DimensionError {
    #[error("empty value")]
    Empty,
    #[error("not a number: {ch:?}; letter {position} in {input}")]
    NotANumber {
        ch: char,
        position: usize,
        input: String,
    },
    #[error("number too large: {input}")]
    TooLarge { input: String },
}

/// The tick overran its budget by so much that the loop is considered stalled.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PacingError {
    #[error("tick took {elapsed:?}, limit is {limit:?} (budget {budget:?})")]
    Stall {
        elapsed: Duration,
        budget: Duration,
        limit: Duration,
    },
}

/// Error that ends the simulation loop.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Pacing(#[from] PacingError),
}

/// Terminal setup step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStage {
    RawMode,
    AlternateScreen,
    Backend,
}

impl std::fmt::Display for TerminalStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            TerminalStage::RawMode => "enable raw mode",
            TerminalStage::AlternateScreen => "enter alternate screen",
            TerminalStage::Backend => "build terminal backend",
        };
        f.write_str(stage)
    }
}

/// Top-level error of a simulator run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Cli(#[from] clap::Error),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("failed to {stage}: {source}")]
    TerminalInit {
        stage: TerminalStage,
        #[source]
        source: io::Error,
    },
    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),
    #[error("time taken too long: {0}")]
    Pacing(#[from] PacingError),
    #[error("cannot open log file: {0}")]
    LogFile(#[source] io::Error),
}

impl From<LoopError> for AppError {
    fn from(err: LoopError) -> Self {
        match err {
            LoopError::Io(err) => AppError::Io(err),
            LoopError::Pacing(err) => AppError::Pacing(err),
        }
    }
}

impl AppError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Cli(err) => cli_exit_code(err.kind()),
            AppError::TerminalInit { stage, .. } => match stage {
                TerminalStage::RawMode => 3,
                TerminalStage::AlternateScreen => 4,
                TerminalStage::Backend => 5,
            },
            AppError::Grid(_) => 6,
            AppError::Io(_) | AppError::LogFile(_) => 7,
            AppError::Pacing(_) => 255,
        }
    }
}

impl From<AppError> for ExitCode {
    fn from(err: AppError) -> Self {
        ExitCode::from(err.exit_code())
    }
}

fn cli_exit_code(kind: clap::error::ErrorKind) -> u8 {
    use clap::error::ErrorKind;

    match kind {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
        ErrorKind::ValueValidation | ErrorKind::InvalidValue => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn exit_codes_are_distinct_per_category() {
        let codes = [
            AppError::Cli(clap::Error::new(ErrorKind::MissingRequiredArgument)).exit_code(),
            AppError::Cli(clap::Error::new(ErrorKind::ValueValidation)).exit_code(),
            AppError::TerminalInit {
                stage: TerminalStage::RawMode,
                source: io::Error::new(io::ErrorKind::Other, "tty"),
            }
            .exit_code(),
            AppError::TerminalInit {
                stage: TerminalStage::AlternateScreen,
                source: io::Error::new(io::ErrorKind::Other, "tty"),
            }
            .exit_code(),
            AppError::TerminalInit {
                stage: TerminalStage::Backend,
                source: io::Error::new(io::ErrorKind::Other, "tty"),
            }
            .exit_code(),
            AppError::Grid(GridError::Allocation {
                width: 0,
                height: 1,
                reason: "zero",
            })
            .exit_code(),
            AppError::Io(io::Error::new(io::ErrorKind::Other, "draw")).exit_code(),
            AppError::Pacing(PacingError::Stall {
                elapsed: Duration::from_secs(2),
                budget: Duration::from_millis(10),
                limit: Duration::from_secs(1),
            })
            .exit_code(),
        ];

        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
        assert!(codes.iter().all(|&code| code != 0));
    }

    #[test]
    fn help_exits_cleanly() {
        let err = AppError::Cli(clap::Error::new(ErrorKind::DisplayHelp));
        assert_eq!(err.exit_code(), 0);
    }
}
