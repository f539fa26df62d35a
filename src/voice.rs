//! Voice command gate.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::echo::EchoGuard;

/// Why a transcript was not admitted as a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    Echo,
}

/// Filters recognizer transcripts before they reach the game.
#[derive(Debug, Clone)]
pub struct CommandGate {
    echo: Arc<Mutex<EchoGuard>>,
}

impl CommandGate {
    pub fn new(echo: Arc<Mutex<EchoGuard>>) -> Self {
        Self { echo }
    }

    /// Turn a transcript into a game command, unless it is empty or the
    /// recognizer heard the narration.
    pub fn admit(&self, transcript: &str) -> Result<String, Rejection> {
        self.admit_at(transcript, Instant::now())
    }

    pub fn admit_at(&self, transcript: &str, now: Instant) -> Result<String, Rejection> {
        let command = transcript.trim();
        if command.is_empty() {
            return Err(Rejection::Empty);
        }
        if self.echo.lock().is_echo_at(command, now) {
            tracing::debug!(transcript = command, "rejected echo transcript");
            return Err(Rejection::Echo);
        }
        Ok(command.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_commands_and_rejects_echoes() {
        let echo = Arc::new(Mutex::new(EchoGuard::default()));
        let now = Instant::now();
        echo.lock()
            .record_at("A small leaflet is inside the mailbox.", now);
        let gate = CommandGate::new(Arc::clone(&echo));

        assert_eq!(gate.admit_at("  take leaflet ", now), Ok("take leaflet".to_string()));
        assert_eq!(gate.admit_at("small leaflet", now), Err(Rejection::Echo));
        assert_eq!(gate.admit_at("   ", now), Err(Rejection::Empty));
    }
}
