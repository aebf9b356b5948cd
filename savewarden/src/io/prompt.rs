//! Interactive prompts for choosing a save and naming a new one.
//!
//! The [`Selector`] and [`Namer`] traits keep the warden loop independent of
//! the terminal. Tests use scripted answers instead of stdin.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::layout::validate_label;

/// One entry of a selection prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub value: String,
}

/// Asks the user to pick one of several choices.
pub trait Selector {
    /// Returns the chosen value, or `None` when the user cancels.
    fn select(&mut self, choices: &[Choice]) -> Result<Option<String>>;
}

/// Asks the user for a label for a new save.
pub trait Namer {
    /// Returns a label free of path separators, or `None` to skip saving.
    fn name(&mut self) -> Result<Option<String>>;
}

/// Line-oriented prompt over any reader/writer pair (stdin/stdout in production).
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Read one line; `None` on end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self.input.read_line(&mut line).context("read prompt input")?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> Selector for TerminalPrompt<R, W> {
    fn select(&mut self, choices: &[Choice]) -> Result<Option<String>> {
        loop {
            writeln!(self.output, "Choose a save to load:").context("write prompt")?;
            for (i, choice) in choices.iter().enumerate() {
                writeln!(self.output, "  {}) {}", i + 1, choice.label).context("write prompt")?;
            }
            write!(self.output, "Number (empty to quit): ").context("write prompt")?;
            self.output.flush().context("flush prompt")?;

            let Some(answer) = self.read_line()? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(None);
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=choices.len()).contains(&n) => {
                    let value = choices[n - 1].value.clone();
                    debug!(value = %value, "save selected");
                    return Ok(Some(value));
                }
                _ => {
                    writeln!(self.output, "Please enter a number between 1 and {}.", choices.len())
                        .context("write prompt")?;
                }
            }
        }
    }
}

impl<R: BufRead, W: Write> Namer for TerminalPrompt<R, W> {
    fn name(&mut self) -> Result<Option<String>> {
        loop {
            write!(
                self.output,
                "Progress changed. Name for a new save (empty to skip): "
            )
            .context("write prompt")?;
            self.output.flush().context("flush prompt")?;

            let Some(answer) = self.read_line()? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(None);
            }
            match validate_label(&answer) {
                Ok(()) => return Ok(Some(answer)),
                Err(reason) => {
                    writeln!(self.output, "Invalid name: {reason}.").context("write prompt")?;
                }
            }
        }
    }
}
