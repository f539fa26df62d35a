//! Explicit adapter state. Reset as a whole by `init`.

use std::collections::BTreeMap;

use super::stores::WindowStores;
use crate::protocol::InputKind;
use crate::render::{RenderedWindow, WindowRegistry};

/// An input request awaiting a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputRequest {
    pub kind: InputKind,
    pub window: u32,
    /// Generation the reply must carry
    pub generation: u64,
}

/// A pending file prompt from a save/restore opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePrompt {
    pub generation: u64,
    pub kind: String,
}

/// Restore sub-machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestorePhase {
    #[default]
    Idle,
    /// Restore requested; waits for the first update
    Armed,
    /// First update rendered; restore scheduled or in progress
    Restoring,
    /// Synthetic input sent; the next render is suppressed
    Bootstrapping,
}

#[derive(Debug, Clone, Default)]
pub struct AdapterState {
    pub generation: u64,
    pub registry: WindowRegistry,
    pub input: Option<InputRequest>,
    pub prompt: Option<FilePrompt>,
    /// Input type of the session's first request
    pub intro: Option<InputKind>,
    /// Line-input turns seen this session
    pub line_turns: u32,
    /// Updates processed since `init`
    pub updates: u64,
    pub restore: RestorePhase,
    /// Input window recorded in the restored autosave
    pub restored_window: Option<u32>,
    pub stores: WindowStores,
    /// Last rendering of every window, keyed by window id
    pub rendered: BTreeMap<u32, RenderedWindow>,
    /// Set by a fatal VM error; no further input is accepted
    pub halted: Option<String>,
}

impl AdapterState {
    pub fn input_enabled(&self) -> bool {
        self.input.is_some() && self.halted.is_none()
    }
}
