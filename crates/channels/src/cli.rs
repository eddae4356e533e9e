//! CLI channel: reads utterances from stdin, one per line.

use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Words that end an interactive session.
const EXIT_COMMANDS: [&str; 5] = ["exit", "quit", "/exit", "/quit", ":q"];

/// Interactive terminal input source. Empty lines are skipped; an exit
/// command closes the stream.
pub struct CliChannel;

impl CliChannel {
    pub fn new() -> Self {
        Self
    }

    /// Spawn the stdin reader and return the line stream.
    pub fn start(&self) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let reader = BufReader::new(io::stdin());
            let mut lines = reader.lines();

            while let Ok(Some(line)) = lines.next_line().await {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                if EXIT_COMMANDS.contains(&line.as_str()) {
                    break;
                }
                if tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        rx
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a line is an exit command.
pub fn is_exit_command(line: &str) -> bool {
    EXIT_COMMANDS.contains(&line.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_commands_recognized() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("  quit  "));
        assert!(is_exit_command(":q"));
        assert!(!is_exit_command("quit the Marketing project"));
    }
}
