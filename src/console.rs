// src/console.rs
use thiserror::Error;

use crate::config::{FAST_INTERVAL_MS, SLOW_INTERVAL_MS};
use crate::types::UiCommand;

pub const HELP: &str = "\
commands:
  record [label]   start recording, or finish and save the current recording
  predict          start predicting, or finish and send for prediction
  stop             finish the active session
  cancel           discard the active session
  train            retrain the classifier on stored sessions
  drop             delete all stored sessions
  interval <ms>    sampling interval for both sensors
  fast | slow      16 ms / 1000 ms sampling
  status           print the current state
  help             this text
  quit             exit";

/// What the console asked for: something for the engine, or a local action.
#[derive(Clone, Debug, PartialEq)]
pub enum ConsoleAction {
    Engine(UiCommand),
    PrintStatus,
    Help,
    Nothing,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),
    #[error("`interval` needs a positive number of milliseconds")]
    BadInterval,
}

pub fn parse_command(line: &str, default_label: &str) -> Result<ConsoleAction, ParseError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let cmd = match word.to_ascii_lowercase().as_str() {
        "" => return Ok(ConsoleAction::Nothing),
        "record" | "r" => {
            let label = if rest.is_empty() { default_label } else { rest };
            UiCommand::ToggleRecording(label.to_owned())
        }
        "predict" | "p" => UiCommand::TogglePredicting,
        "stop" => UiCommand::Stop { cancel: false },
        "cancel" | "c" => UiCommand::Stop { cancel: true },
        "train" => UiCommand::Train,
        "drop" => UiCommand::DropStore,
        "interval" => {
            let ms = rest.parse::<u32>().map_err(|_| ParseError::BadInterval)?;
            if ms == 0 {
                return Err(ParseError::BadInterval);
            }
            UiCommand::SetInterval(ms)
        }
        "fast" => UiCommand::SetInterval(FAST_INTERVAL_MS),
        "slow" => UiCommand::SetInterval(SLOW_INTERVAL_MS),
        "status" | "s" => return Ok(ConsoleAction::PrintStatus),
        "help" | "?" => return Ok(ConsoleAction::Help),
        "quit" | "exit" | "q" => UiCommand::Shutdown,
        other => return Err(ParseError::Unknown(other.to_owned())),
    };
    Ok(ConsoleAction::Engine(cmd))
}
