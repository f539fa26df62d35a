//! zvox - narrated, voice-driven display layer for Z-machine interactive fiction
//!
//! The VM is an external collaborator that emits one update per turn. This
//! crate renders those updates into three display zones, splits the text into
//! sentence-sized narration chunks with position markers, plays the chunks
//! through a speech engine with a synchronized highlight, and filters the
//! recognizer's transcripts so narration is not mistaken for a command.

pub mod adapter;
pub mod chunker;
pub mod cli;
pub mod config;
pub mod dom;
pub mod echo;
pub mod error;
pub mod highlight;
pub mod logging;
pub mod narration;
pub mod protocol;
pub mod render;
pub mod screen;
pub mod theme;
pub mod vm;
pub mod voice;

pub use adapter::{AdapterSettings, AdapterTask, DisplayAdapter, DisplaySnapshot};
pub use chunker::{MarkerChunker, NarrationChunk, VoiceRole};
pub use config::Config;
pub use echo::EchoGuard;
pub use narration::{NarrationEvent, NarrationPlayer, PlayerSettings};
pub use screen::{Screen, Zone};
pub use voice::CommandGate;
