//! Wire types exchanged with the Z-machine VM.
//!
//! The VM speaks a GlkOte-style JSON protocol: it emits one message per turn
//! (usually an `update`) and receives input replies tagged with the
//! generation of the request they answer.
//!
//! - [`event`] - messages emitted by the VM (updates, errors, log lines)
//! - [`reply`] - replies sent back to the VM

mod event;
mod reply;

pub use event::{
    ContentEntry, GridLine, InputDescriptor, InputKind, RawRun, Run, SpecialInput, TextBlock,
    UpdateEvent, VmMessage, WindowDescriptor, WindowKind,
};
pub use reply::{InputReply, Metrics};
