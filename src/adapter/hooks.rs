use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Callbacks from the adapter to the narration and UI layers.
pub trait AdapterHooks: Send {
    /// A turn's plain text should be narrated.
    fn narrate(&mut self, text: &str);
    /// A blocking, user-visible message (fatal VM error).
    fn notice(&mut self, message: &str);
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl AdapterHooks for NoHooks {
    fn narrate(&mut self, _text: &str) {}
    fn notice(&mut self, _message: &str) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    Narrate(String),
    Notice(String),
}

/// Forwards hook calls over a channel.
#[derive(Debug)]
pub struct ChannelHooks {
    sender: UnboundedSender<HookEvent>,
}

impl ChannelHooks {
    pub fn new() -> (Self, UnboundedReceiver<HookEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl AdapterHooks for ChannelHooks {
    fn narrate(&mut self, text: &str) {
        if self.sender.send(HookEvent::Narrate(text.to_string())).is_err() {
            tracing::debug!("narrate hook receiver dropped");
        }
    }

    fn notice(&mut self, message: &str) {
        if self.sender.send(HookEvent::Notice(message.to_string())).is_err() {
            tracing::debug!("notice hook receiver dropped");
        }
    }
}
