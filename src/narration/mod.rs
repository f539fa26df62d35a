//! Narration playback: speech engines, sessions and the player loop.

mod event;
mod player;
mod session;
mod speech;

pub use event::NarrationEvent;
pub use player::{NarrationPlayer, PlayerSettings};
pub use session::{PlaybackState, PlaybackStatus};
pub use speech::{ConsoleSpeech, MemorySpeech, SpeechEngine};
