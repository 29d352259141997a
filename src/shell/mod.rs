//! Line-oriented terminal front-end
//!
//! The shell owns the foreground thread. Operator input and coordinator
//! notifications both arrive as `ShellEvent`s on one channel, so every
//! change to trigger and status state happens on this thread, in the order
//! events were produced.

pub mod buffer;
pub mod command;

pub use buffer::InputBuffer;
pub use command::{parse_line, Command, Input, HELP};

use crate::audit::{AuditEvent, Coordinator, CoordinatorState, Rate, RunId};
use crate::config::Config;
use crate::{KairosError, Result};
use log::{debug, info, warn};
use std::fmt;
use std::io::{BufRead, Write};
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

/// Everything the foreground loop reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    /// One line typed or pasted by the operator
    Line(String),
    /// Input stream closed
    Eof,
    /// Notification handed off by the coordinator
    Audit(AuditEvent),
}

/// Whether the loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Status line shown to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ready,
    InProgress,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ready => f.write_str("SYSTEM READY"),
            Status::InProgress => f.write_str("AUDIT IN PROGRESS..."),
        }
    }
}

type ClipboardSource = Box<dyn Fn() -> Result<String>>;

/// Terminal shell state
pub struct Shell<W: Write> {
    coordinator: Coordinator,
    backend: &'static str,
    buffer: InputBuffer,
    rate: Rate,
    /// Cleared once a submission is accepted, set again on RunFinished
    trigger_enabled: bool,
    active_run: Option<RunId>,
    status: Status,
    config: Option<Config>,
    clipboard: ClipboardSource,
    out: W,
}

impl<W: Write> Shell<W> {
    pub fn new(coordinator: Coordinator, backend: &'static str, rate: Rate, out: W) -> Self {
        Self {
            coordinator,
            backend,
            buffer: InputBuffer::new(),
            rate,
            trigger_enabled: true,
            active_run: None,
            status: Status::Ready,
            config: None,
            clipboard: Box::new(crate::clipboard::get_from_clipboard),
            out,
        }
    }

    /// Persist `:save` into this configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the clipboard reader used by `:paste`
    pub fn with_clipboard(mut self, source: impl Fn() -> Result<String> + 'static) -> Self {
        self.clipboard = Box::new(source);
        self
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn trigger_enabled(&self) -> bool {
        self.trigger_enabled
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }

    pub fn buffer(&self) -> &InputBuffer {
        &self.buffer
    }

    pub fn coordinator_mut(&mut self) -> &mut Coordinator {
        &mut self.coordinator
    }

    /// Consume the output writer, e.g. to inspect it in tests
    pub fn into_output(self) -> W {
        self.out
    }

    /// Print the banner and help text
    pub fn greet(&mut self) -> Result<()> {
        writeln!(self.out, "KAIROS PROJECT: AUDIO AUDITOR {}", crate::VERSION)?;
        writeln!(self.out, "{}", HELP)?;
        self.print_status()
    }

    /// Drain events until the operator quits or input ends
    pub fn run(&mut self, events: &Receiver<ShellEvent>) -> Result<()> {
        while let Ok(event) = events.recv() {
            if self.handle(event)? == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    /// React to one event
    pub fn handle(&mut self, event: ShellEvent) -> Result<Flow> {
        match event {
            ShellEvent::Line(line) => self.handle_line(&line),
            ShellEvent::Eof => {
                info!("Input closed");
                Ok(Flow::Quit)
            }
            ShellEvent::Audit(event) => {
                self.handle_audit(event)?;
                Ok(Flow::Continue)
            }
        }
    }

    fn handle_line(&mut self, line: &str) -> Result<Flow> {
        let input = match parse_line(line) {
            Ok(input) => input,
            Err(e) => {
                writeln!(self.out, "Input Error: {}", e)?;
                return Ok(Flow::Continue);
            }
        };

        match input {
            Input::Text(text) => self.buffer.push_line(&text),
            Input::Command(command) => return self.handle_command(command),
        }
        Ok(Flow::Continue)
    }

    fn handle_command(&mut self, command: Command) -> Result<Flow> {
        debug!("Command: {:?}", command);
        match command {
            Command::Run => self.trigger()?,
            Command::Rate(wpm) => match Rate::new(wpm) {
                Ok(rate) => {
                    self.rate = rate;
                    writeln!(self.out, "Playback rate set to {}", rate)?;
                }
                Err(e) => writeln!(self.out, "Input Error: {}", e)?,
            },
            Command::Paste => match (self.clipboard)() {
                Ok(text) => {
                    self.buffer.push_block(&text);
                    writeln!(
                        self.out,
                        "Pasted {} chars ({} lines in buffer)",
                        text.len(),
                        self.buffer.line_count()
                    )?;
                }
                Err(e) => writeln!(self.out, "Clipboard Error: {}", e)?,
            },
            Command::Show => {
                write!(self.out, "{}", self.buffer.contents())?;
                writeln!(self.out, "-- {} lines --", self.buffer.line_count())?;
            }
            Command::Clear => {
                self.buffer.clear();
                writeln!(self.out, "Buffer cleared")?;
            }
            Command::Status => self.print_status()?,
            Command::Save => self.save_rate()?,
            Command::Help => writeln!(self.out, "{}", HELP)?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Submit the buffer, unless the trigger is disabled
    fn trigger(&mut self) -> Result<()> {
        if !self.trigger_enabled {
            writeln!(self.out, "Audit in progress, trigger disabled")?;
            return Ok(());
        }

        let text = self.buffer.contents().trim().to_string();
        match self.coordinator.submit(&text, i64::from(self.rate.wpm())) {
            Ok(run) => {
                // Lines already queued behind this one must see the
                // trigger disabled, not race into a Busy rejection
                debug!("Submitted audit {}", run);
                self.active_run = Some(run);
                self.trigger_enabled = false;
                self.status = Status::InProgress;
            }
            Err(KairosError::EmptyInput) => {
                writeln!(self.out, "Logic Error: Input buffer is empty.")?;
            }
            Err(e) => {
                warn!("Audit rejected: {}", e);
                writeln!(self.out, "Audit Error: {}", e)?;
            }
        }
        Ok(())
    }

    fn handle_audit(&mut self, event: AuditEvent) -> Result<()> {
        debug!("Audit notification for run {}", event.run());
        match event {
            AuditEvent::RunStarted { run } => {
                self.active_run = Some(run);
                self.trigger_enabled = false;
                self.status = Status::InProgress;
            }
            AuditEvent::RunFinished { run, error } => {
                if self.active_run != Some(run) {
                    debug!("Finish for run {} while tracking {:?}", run, self.active_run);
                }
                if let Some(error) = error {
                    writeln!(self.out, "AUDIT FAILED: {}", error)?;
                }
                self.active_run = None;
                self.trigger_enabled = true;
                self.status = Status::Ready;
            }
        }
        writeln!(self.out, "{}", self.status)?;
        Ok(())
    }

    fn print_status(&mut self) -> Result<()> {
        let engine = match self.coordinator.state() {
            CoordinatorState::Idle => "idle",
            CoordinatorState::Running => "speaking",
        };
        writeln!(
            self.out,
            "{} | rate {} | {} backend {} | buffer {} lines",
            self.status,
            self.rate,
            self.backend,
            engine,
            self.buffer.line_count()
        )?;
        Ok(())
    }

    fn save_rate(&mut self) -> Result<()> {
        let Some(config) = self.config.as_mut() else {
            writeln!(self.out, "No configuration file in use")?;
            return Ok(());
        };

        config.set("audit", "default_rate", &self.rate.wpm().to_string());
        match config.save() {
            Ok(()) => writeln!(self.out, "Saved default rate to {}", config.path().display())?,
            Err(e) => writeln!(self.out, "Config Error: {}", e)?,
        }
        Ok(())
    }
}

/// Forward stdin lines into the event channel from a detached thread
pub fn spawn_input_reader<R>(input: R, events: Sender<ShellEvent>) -> Result<()>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("kairos-input".to_string())
        .spawn(move || {
            for line in input.lines() {
                match line {
                    Ok(line) => {
                        if events.send(ShellEvent::Line(line)).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read input: {}", e);
                        break;
                    }
                }
            }
            let _ = events.send(ShellEvent::Eof);
        })
        .map_err(KairosError::Io)?;
    Ok(())
}
