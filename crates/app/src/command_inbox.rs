//! Command inbox — validates raw command payloads and queues them for the
//! control loop.
//!
//! The transport delivers every message it receives on the command channel
//! here. Malformed or unknown commands are logged and dropped; valid ones are
//! handed to the loop through a bounded queue so that the subscriber never
//! touches actuator state itself.

use tokio::sync::mpsc;

use thermotrack_domain::command::Command;
use thermotrack_domain::error::CommandError;

/// Sending half of the command queue.
#[derive(Debug, Clone)]
pub struct CommandInbox {
    tx: mpsc::Sender<Command>,
}

/// Create a command queue holding at most `capacity` pending commands.
#[must_use]
pub fn command_channel(capacity: usize) -> (CommandInbox, mpsc::Receiver<Command>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (CommandInbox { tx }, rx)
}

impl CommandInbox {
    /// Parse `payload` and queue the command.
    ///
    /// Returns the queued command, or `None` when the payload was dropped.
    pub fn deliver(&self, payload: &str) -> Option<Command> {
        let command = match Command::from_json(payload) {
            Ok(command) => command,
            Err(CommandError::NotACommand) => {
                tracing::debug!("ignoring message without a cmd field");
                return None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "rejected command");
                return None;
            }
        };
        match self.tx.try_send(command) {
            Ok(()) => {
                tracing::debug!(%command, "command queued");
                Some(command)
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(%command, "command queue full, dropping command");
                None
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(%command, "control loop gone, dropping command");
                None
            }
        }
    }
}
