//! Collaborators for running the loop without a terminal.

use std::{collections::VecDeque, io};

use tracing::info;

use crate::simulation::{Command, FrameView, InputSource, Renderer, StatusSink};

/// Replays a fixed list of commands, one per poll, then reports no input.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    commands: VecDeque<Command>,
}

impl ScriptedInput {
    pub fn new(commands: impl IntoIterator<Item = Command>) -> ScriptedInput {
        ScriptedInput {
            commands: commands.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl InputSource for ScriptedInput {
    fn poll_command(&mut self) -> io::Result<Option<Command>> {
        Ok(self.commands.pop_front())
    }
}

/// Output that draws nothing: frames are counted and status lines go to
/// `tracing`, logged once per change.
#[derive(Debug, Clone, Default)]
pub struct HeadlessOutput {
    pub frames: u64,
    pub status_reports: u64,
    /// Population of the last frame handed to the renderer.
    pub last_population: u64,
    pub last_status: Option<String>,
}

impl Renderer for HeadlessOutput {
    fn render(&mut self, frame: FrameView<'_>) -> io::Result<()> {
        self.frames += 1;
        self.last_population = frame.grid.population();
        Ok(())
    }
}

impl StatusSink for HeadlessOutput {
    fn status(&mut self, message: &str) -> io::Result<()> {
        self.status_reports += 1;
        if self.last_status.as_deref() != Some(message) {
            info!(target: "torus_life::status", "{message}");
            self.last_status = Some(message.to_owned());
        }
        Ok(())
    }
}
