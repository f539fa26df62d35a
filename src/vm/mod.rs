//! The VM side of the display protocol.
//!
//! The interpreter itself is an external collaborator. This module defines
//! what the adapter needs from it ([`VmLink`]) plus two concrete links: one
//! forwarding replies over a channel, and a scripted VM that replays a
//! recorded transcript of VM messages.

mod store;

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub use store::{FileSaveStore, MemorySaveStore, SaveRecord, SaveStore};

use crate::error::VmError;
use crate::protocol::{InputReply, VmMessage};

/// Outgoing half of the VM connection.
pub trait VmLink: Send {
    /// Deliver a reply to the VM.
    fn send(&mut self, reply: InputReply) -> Result<(), VmError>;
    /// Capture the VM's state as an opaque blob.
    fn save_state(&mut self) -> Result<serde_json::Value, VmError>;
    /// Return the VM to a previously captured state.
    fn restore_state(&mut self, blob: &serde_json::Value) -> Result<(), VmError>;
}

/// Forwards replies over an unbounded channel and keeps the state blob in
/// memory.
#[derive(Debug)]
pub struct ChannelLink {
    replies: UnboundedSender<InputReply>,
    state: serde_json::Value,
}

impl ChannelLink {
    pub fn new() -> (Self, UnboundedReceiver<InputReply>) {
        let (replies, receiver) = mpsc::unbounded_channel();
        (
            Self {
                replies,
                state: serde_json::Value::Null,
            },
            receiver,
        )
    }

    /// Set the blob returned by the next `save_state`.
    pub fn set_state(&mut self, state: serde_json::Value) {
        self.state = state;
    }
}

impl VmLink for ChannelLink {
    fn send(&mut self, reply: InputReply) -> Result<(), VmError> {
        self.replies.send(reply).map_err(|_| VmError::Disconnected)
    }

    fn save_state(&mut self) -> Result<serde_json::Value, VmError> {
        Ok(self.state.clone())
    }

    fn restore_state(&mut self, blob: &serde_json::Value) -> Result<(), VmError> {
        self.state = blob.clone();
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Script {
    messages: Vec<VmMessage>,
    position: usize,
    replies: Vec<InputReply>,
}

/// Replays a JSON-lines transcript of VM messages.
///
/// Clones share the same script, so one handle can be given to the adapter
/// as its link while another feeds messages. The state blob is the replay
/// position.
#[derive(Debug, Clone, Default)]
pub struct ScriptedVm {
    script: Arc<Mutex<Script>>,
}

impl ScriptedVm {
    pub fn new(messages: Vec<VmMessage>) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                messages,
                ..Script::default()
            })),
        }
    }

    /// Parse a transcript: one JSON message per line; blank lines and lines
    /// starting with `#` are skipped.
    pub fn parse(transcript: &str) -> Result<Self, VmError> {
        let mut messages = Vec::new();
        for (number, line) in transcript.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let message = serde_json::from_str(line).map_err(|source| VmError::Parse {
                line: number + 1,
                source,
            })?;
            messages.push(message);
        }
        Ok(Self::new(messages))
    }

    pub fn load(path: &Path) -> Result<Self, VmError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Next message of the transcript, if any.
    pub fn next_message(&self) -> Option<VmMessage> {
        let mut script = self.script.lock();
        let message = script.messages.get(script.position).cloned()?;
        script.position += 1;
        Some(message)
    }

    pub fn remaining(&self) -> usize {
        let script = self.script.lock();
        script.messages.len().saturating_sub(script.position)
    }

    /// Every reply received so far.
    pub fn replies(&self) -> Vec<InputReply> {
        self.script.lock().replies.clone()
    }
}

impl VmLink for ScriptedVm {
    fn send(&mut self, reply: InputReply) -> Result<(), VmError> {
        tracing::trace!(kind = reply.kind(), generation = reply.generation(), "scripted VM reply");
        self.script.lock().replies.push(reply);
        Ok(())
    }

    fn save_state(&mut self) -> Result<serde_json::Value, VmError> {
        Ok(serde_json::json!({ "position": self.script.lock().position }))
    }

    fn restore_state(&mut self, blob: &serde_json::Value) -> Result<(), VmError> {
        let position = blob
            .get("position")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| VmError::Restore(format!("no replay position in {blob}")))?;
        let mut script = self.script.lock();
        script.position = (position as usize).min(script.messages.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Metrics;

    const TRANSCRIPT: &str = r#"
# opening turn
{"type":"update","gen":1,"windows":[{"id":1,"type":"buffer"}]}

{"type":"log","message":"hello"}
{"type":"pass"}
"#;

    #[test]
    fn parses_transcript_skipping_comments() {
        let vm = ScriptedVm::parse(TRANSCRIPT).unwrap();
        assert_eq!(vm.remaining(), 3);
        assert!(matches!(vm.next_message(), Some(VmMessage::Update(_))));
        assert!(matches!(vm.next_message(), Some(VmMessage::Log { .. })));
        assert!(matches!(vm.next_message(), Some(VmMessage::Pass)));
        assert!(vm.next_message().is_none());
    }

    #[test]
    fn parse_error_reports_line() {
        let err = ScriptedVm::parse("{\"type\":\"pass\"}\n{oops}\n").unwrap_err();
        assert!(matches!(err, VmError::Parse { line: 2, .. }));
    }

    #[test]
    fn state_blob_is_replay_position() {
        let mut vm = ScriptedVm::parse(TRANSCRIPT).unwrap();
        vm.next_message();
        let blob = vm.save_state().unwrap();
        vm.next_message();
        vm.next_message();
        vm.restore_state(&blob).unwrap();
        assert_eq!(vm.remaining(), 2);
        assert!(vm.restore_state(&serde_json::json!({})).is_err());
    }

    #[test]
    fn clones_share_replies() {
        let vm = ScriptedVm::default();
        let mut link = vm.clone();
        link.send(InputReply::Init {
            generation: 0,
            metrics: Metrics::default(),
        })
        .unwrap();
        assert_eq!(vm.replies().len(), 1);
    }

    #[test]
    fn channel_link_reports_disconnect() {
        let (mut link, receiver) = ChannelLink::new();
        drop(receiver);
        let reply = InputReply::Arrange {
            generation: 1,
            metrics: Metrics::default(),
        };
        assert!(matches!(link.send(reply), Err(VmError::Disconnected)));
    }
}
