//! Parsing of terminal input lines.

use companion_visual::{RenderStyle, Size, UnknownVariant};

pub const HELP: &str = "\
commands:
  <text>                 send a chat message
  /connect               open the connection
  /disconnect            close the connection (no automatic retry)
  /reconnect             reconnect now with a fresh retry budget
  /session <id>          switch to another chat session
  /style <vector|sprite> change render style
  /size <small|medium|large>
  /character [name]      select a character (no name clears it)
  /hide, /show           toggle visibility
  /status                show connection and animation state
  /help                  show this help
  /quit                  exit";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Connect,
    Disconnect,
    Reconnect,
    Session(String),
    Style(RenderStyle),
    Size(Size),
    Character(Option<String>),
    Hide,
    Show,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command: /{0} (try /help)")]
    Unknown(String),

    #[error("/{0} needs an argument")]
    MissingArgument(&'static str),

    #[error(transparent)]
    Invalid(#[from] UnknownVariant),
}

/// Parses a line. Blank lines yield `None`; anything not starting with `/`
/// is chat text.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Send(line.to_string())));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let required = |name: &'static str| {
        if arg.is_empty() {
            Err(CommandError::MissingArgument(name))
        } else {
            Ok(arg)
        }
    };

    let cmd = match name.to_ascii_lowercase().as_str() {
        "connect" => Command::Connect,
        "disconnect" => Command::Disconnect,
        "reconnect" => Command::Reconnect,
        "session" => Command::Session(required("session")?.to_string()),
        "style" => Command::Style(required("style")?.parse()?),
        "size" => Command::Size(required("size")?.parse()?),
        "character" => Command::Character((!arg.is_empty()).then(|| arg.to_string())),
        "hide" => Command::Hide,
        "show" => Command::Show,
        "status" => Command::Status,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(cmd))
}
