//! Special command parsing for the interactive chat loop
//!
//! Slash commands control the session without submitting a turn:
//! opening and creating chats, attaching files, cancelling a stream.

use colored::Colorize;

/// A parsed special command, or `None` for a regular chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Open an existing chat by id
    Open(String),
    /// Create and switch to a new chat
    New,
    /// Queue a file attachment for the next submission
    Attach(String),
    /// Cancel the in-flight stream
    Cancel,
    /// Show session status
    Status,
    /// Show help
    Help,
    /// Leave the chat loop
    Exit,
    /// Unrecognized slash command
    Unknown(String),
    /// Not a special command
    None,
}

/// Parse one input line into a special command
///
/// # Examples
///
/// ```
/// use chatwire::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/quit"), SpecialCommand::Exit);
/// assert_eq!(parse_special_command("hello"), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> SpecialCommand {
    if !input.starts_with('/') {
        return SpecialCommand::None;
    }

    let mut words = input.split_whitespace();
    let command = words.next().unwrap_or("");
    let rest = words.collect::<Vec<_>>().join(" ");

    match command {
        "/open" if !rest.is_empty() => SpecialCommand::Open(rest),
        "/new" => SpecialCommand::New,
        "/attach" if !rest.is_empty() => SpecialCommand::Attach(rest),
        "/cancel" => SpecialCommand::Cancel,
        "/status" => SpecialCommand::Status,
        "/help" => SpecialCommand::Help,
        "/quit" | "/exit" => SpecialCommand::Exit,
        other => SpecialCommand::Unknown(other.to_string()),
    }
}

/// Print the special command reference
pub fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  /open <id>     open an existing chat");
    println!("  /new           create and switch to a new chat");
    println!("  /attach <path> queue a file for the next message");
    println!("  /cancel        cancel the in-flight reply");
    println!("  /status        show session status");
    println!("  /help          show this help");
    println!("  /quit          leave");
    println!();
    println!("Anything else is sent as a chat message.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_input_is_none() {
        assert_eq!(parse_special_command("hello there"), SpecialCommand::None);
    }

    #[test]
    fn test_exit_variants() {
        assert_eq!(parse_special_command("/quit"), SpecialCommand::Exit);
        assert_eq!(parse_special_command("/exit"), SpecialCommand::Exit);
    }

    #[test]
    fn test_open_with_argument() {
        assert_eq!(
            parse_special_command("/open c1"),
            SpecialCommand::Open("c1".to_string())
        );
    }

    #[test]
    fn test_open_without_argument_is_unknown() {
        assert_eq!(
            parse_special_command("/open"),
            SpecialCommand::Unknown("/open".to_string())
        );
    }

    #[test]
    fn test_attach_keeps_path_with_spaces() {
        assert_eq!(
            parse_special_command("/attach my photo.png"),
            SpecialCommand::Attach("my photo.png".to_string())
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_special_command("/bogus"),
            SpecialCommand::Unknown("/bogus".to_string())
        );
    }
}
