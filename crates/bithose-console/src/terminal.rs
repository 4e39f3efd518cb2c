//! Line-oriented operator front-end.
//!
//! The binary reads stdin line by line. [`LineEditor`] turns lines into
//! [`Command`]s (collecting multi-line buffers for `:edit`), and [`Terminal`]
//! applies them to a [`Console`], tracking which pane is active.

use std::io::{self, Write};

use bithose_console_core::logging::targets;

use crate::composer::Preset;
use crate::console::Console;
use crate::error::CommandError;
use crate::frame::{
    InboundFrame, LabelValue, MessageRequest, Request, SubscribeRequest, UnsubscribeRequest,
};
use crate::log::{EntryOrigin, LogEntry};

/// Operator help text.
pub const HELP: &str = "\
commands:
  :pane N       make pane N active
  :subscribe    load the subscribe preset into the active pane
  :subscribe NAME OP VALUE ...
                build a subscribe request (OP is ==, <, <=, > or >=)
  :message      load the message preset into the active pane
  :message BODY [NAME=VALUE ...]
                build a message request
  :unsubscribe UUID
                build an unsubscribe request
  :edit         type a multi-line buffer, end with a line containing only `.`
  :clear        empty the active pane's buffer
  :send         validate and send the active pane's buffer
  :show [N]     print the log and buffer of pane N (default: active)
  :close [N]    close the session of pane N (default: active)
  :help         show this help
  :quit         close every pane and exit
any other line replaces the active pane's buffer with that line";

/// A parsed operator command.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Make the 1-based pane active.
    SelectPane(usize),
    /// Load a preset into the active pane.
    LoadPreset(Preset),
    /// Load a typed request into the active pane.
    LoadRequest(Request),
    /// Start collecting a multi-line buffer.
    BeginEdit,
    /// Replace the active pane's buffer.
    SetText(String),
    /// Empty the active pane's buffer.
    Clear,
    /// Send the active pane's buffer.
    Send,
    /// Print a pane (1-based; `None` for the active one).
    Show(Option<usize>),
    /// Close a pane's session (1-based; `None` for the active one).
    Close(Option<usize>),
    /// Print help.
    Help,
    /// Exit.
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let Some(rest) = trimmed.strip_prefix(':') else {
            return Ok(Some(Self::SetText(line.to_string())));
        };

        let mut words = rest.split_whitespace();
        let name = words.next().unwrap_or_default();
        let arguments: Vec<&str> = words.collect();
        let argument = arguments.first().copied();

        let command = match name {
            "pane" => {
                let argument = argument.ok_or(CommandError::MissingArgument("pane"))?;
                Self::SelectPane(parse_pane_number("pane", argument)?)
            }
            "subscribe" if arguments.is_empty() => Self::LoadPreset(Preset::Subscribe),
            "subscribe" => Self::LoadRequest(parse_subscribe(&arguments)?.into()),
            "message" if arguments.is_empty() => Self::LoadPreset(Preset::Message),
            "message" => Self::LoadRequest(parse_message(&arguments)?.into()),
            "unsubscribe" => {
                let uuid = argument.ok_or(CommandError::MissingArgument("unsubscribe"))?;
                Self::LoadRequest(UnsubscribeRequest::new(uuid).into())
            }
            "edit" => Self::BeginEdit,
            "clear" => Self::Clear,
            "send" => Self::Send,
            "show" => Self::Show(argument.map(|a| parse_pane_number("show", a)).transpose()?),
            "close" => Self::Close(argument.map(|a| parse_pane_number("close", a)).transpose()?),
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn parse_pane_number(command: &'static str, argument: &str) -> Result<usize, CommandError> {
    match argument.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CommandError::InvalidArgument {
            command,
            argument: argument.to_string(),
        }),
    }
}

/// `NAME OP VALUE` triples.
fn parse_subscribe(arguments: &[&str]) -> Result<SubscribeRequest, CommandError> {
    if arguments.len() % 3 != 0 {
        return Err(CommandError::InvalidArgument {
            command: "subscribe",
            argument: arguments.join(" "),
        });
    }
    let builder = arguments
        .chunks_exact(3)
        .fold(SubscribeRequest::builder(), |builder, criterion| {
            builder.criterion(criterion[0], criterion[1], LabelValue::infer(criterion[2]))
        });
    Ok(builder.build()?)
}

/// `BODY` followed by `NAME=VALUE` labels.
fn parse_message(arguments: &[&str]) -> Result<MessageRequest, CommandError> {
    let Some((body, labels)) = arguments.split_first() else {
        return Err(CommandError::MissingArgument("message"));
    };
    labels
        .iter()
        .try_fold(MessageRequest::new(*body), |request, label| {
            match label.split_once('=') {
                Some((name, value)) if !name.is_empty() => {
                    Ok(request.label(name, LabelValue::infer(value)))
                }
                _ => Err(CommandError::InvalidArgument {
                    command: "message",
                    argument: label.to_string(),
                }),
            }
        })
}

/// Turns input lines into commands, buffering `:edit` blocks.
#[derive(Debug, Default)]
pub struct LineEditor {
    editing: Option<String>,
}

impl LineEditor {
    /// Create an editor in command mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an `:edit` block is being collected.
    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Feed one line. Returns a command once one is complete.
    pub fn feed(&mut self, line: &str) -> Result<Option<Command>, CommandError> {
        if self.editing.is_some() {
            if line.trim_end() == "." {
                return Ok(self.editing.take().map(Command::SetText));
            }
            if let Some(buffer) = self.editing.as_mut() {
                buffer.push_str(line);
                buffer.push('\n');
            }
            return Ok(None);
        }

        match Command::parse(line)? {
            Some(Command::BeginEdit) => {
                self.editing = Some(String::new());
                Ok(None)
            }
            other => Ok(other),
        }
    }
}

/// Whether the front-end should keep running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading commands.
    Continue,
    /// Shut down.
    Quit,
}

/// Render one log entry for the terminal.
pub fn format_entry(pane: usize, entry: &LogEntry) -> String {
    let mut line = format!(
        "[{}] #{:<3} {} {:>6}  {}",
        pane + 1,
        entry.sequence(),
        entry.recorded_at().format("%H:%M:%S%.3f"),
        entry.origin().tag(),
        entry.text().trim_end(),
    );
    if entry.origin() == EntryOrigin::RemoteFrame
        && let Some(summary) = InboundFrame::classify(entry.text()).summary()
    {
        line.push_str(&format!("\n[{}]      => {summary}", pane + 1));
    }
    line
}

/// Applies operator commands to a console.
pub struct Terminal<W> {
    console: Console,
    active: usize,
    out: W,
}

impl<W: Write> Terminal<W> {
    /// Wrap `console`, writing command feedback to `out`. Pane 1 starts active.
    pub fn new(console: Console, out: W) -> Self {
        Self {
            console,
            active: 0,
            out,
        }
    }

    /// The console being driven.
    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Zero-based index of the active pane.
    pub fn active(&self) -> usize {
        self.active
    }

    /// The feedback writer.
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Apply one command.
    pub fn execute(&mut self, command: Command) -> io::Result<Flow> {
        tracing::trace!(target: targets::CONSOLE, ?command, active = self.active, "executing command");
        match command {
            Command::SelectPane(n) => match self.pane_index(Some(n)) {
                Ok(index) => {
                    self.active = index;
                    writeln!(self.out, "pane {n} active")?;
                }
                Err(err) => writeln!(self.out, "error: {err}")?,
            },
            Command::LoadPreset(preset) => {
                if let Some(pane) = self.console.pane(self.active) {
                    pane.load_preset(preset);
                    writeln!(self.out, "[{}] loaded {preset} preset", self.active + 1)?;
                }
            }
            Command::LoadRequest(request) => {
                if let Some(pane) = self.console.pane(self.active) {
                    match pane.composer().load_request(&request) {
                        Ok(()) => writeln!(
                            self.out,
                            "[{}] loaded {} request",
                            self.active + 1,
                            request.kind()
                        )?,
                        Err(err) => writeln!(self.out, "error: {err}")?,
                    }
                }
            }
            Command::BeginEdit => {
                writeln!(self.out, "error: :edit is only available from line input")?;
            }
            Command::SetText(text) => {
                if let Some(pane) = self.console.pane(self.active) {
                    pane.composer().set_text(text);
                    writeln!(self.out, "[{}] buffer updated", self.active + 1)?;
                }
            }
            Command::Clear => {
                if let Some(pane) = self.console.pane(self.active) {
                    pane.composer().clear();
                    writeln!(self.out, "[{}] buffer cleared", self.active + 1)?;
                }
            }
            Command::Send => {
                if let Some(pane) = self.console.pane(self.active) {
                    // Failures are logged by the pane itself.
                    let _ = pane.send();
                }
            }
            Command::Show(n) => match self.pane_index(n) {
                Ok(index) => self.show(index)?,
                Err(err) => writeln!(self.out, "error: {err}")?,
            },
            Command::Close(n) => match self.pane_index(n) {
                Ok(index) => {
                    let released = self.console.pane(index).is_some_and(|pane| pane.close());
                    if released {
                        writeln!(self.out, "pane {} closed", index + 1)?;
                    } else {
                        writeln!(self.out, "pane {} was already closed", index + 1)?;
                    }
                }
                Err(err) => writeln!(self.out, "error: {err}")?,
            },
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => {
                self.console.close_all();
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    fn pane_index(&self, number: Option<usize>) -> Result<usize, CommandError> {
        match number {
            None => Ok(self.active),
            Some(n) if (1..=self.console.len()).contains(&n) => Ok(n - 1),
            Some(n) => Err(CommandError::NoSuchPane {
                index: n,
                count: self.console.len(),
            }),
        }
    }

    fn show(&mut self, index: usize) -> io::Result<()> {
        let Some(pane) = self.console.pane(index) else {
            return Ok(());
        };
        writeln!(
            self.out,
            "pane {} ({}, {})",
            index + 1,
            pane.session().url(),
            pane.state()
        )?;
        let lines: Vec<String> = pane
            .log()
            .with_entries(|entries| entries.iter().map(|e| format_entry(index, e)).collect());
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        writeln!(self.out, "buffer:")?;
        writeln!(self.out, "{}", pane.composer().text().trim_end())?;
        Ok(())
    }
}
