//! Messages emitted by the VM.
//!
//! Parsing is deliberately forgiving: unknown window types and malformed
//! style runs are accepted and normalized instead of failing the whole turn.

use serde::{Deserialize, Serialize};

/// One message from the VM, tagged by its `type` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VmMessage {
    /// A regular per-turn update
    Update(UpdateEvent),
    /// Unrecoverable VM error
    Error { message: String },
    /// Informational log line from the VM
    Log { message: String },
    /// Non-fatal warning from the VM
    Warning { message: String },
    /// Turn with nothing to display
    Pass,
}

/// Per-turn payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateEvent {
    /// Turn generation; replies must echo the generation of the request they answer
    #[serde(rename = "gen", default)]
    pub generation: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows: Option<Vec<WindowDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ContentEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Vec<InputDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialinput: Option<SpecialInput>,
    /// Explicit per-turn autoplay override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoplay: Option<bool>,
}

impl UpdateEvent {
    /// An update carrying only a generation.
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }
}

/// Window kinds understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    /// Fixed character grid (status line, upper window)
    Grid,
    /// Scrolling text buffer (main window)
    Buffer,
    /// Anything else (graphics, pair windows); ignored by the renderer
    #[serde(other)]
    Other,
}

/// Registry entry for one VM window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowDescriptor {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: WindowKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gridwidth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gridheight: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stylehints: Option<serde_json::Value>,
}

impl WindowDescriptor {
    pub fn grid(id: u32, width: u32, height: u32) -> Self {
        Self {
            id,
            kind: WindowKind::Grid,
            gridwidth: Some(width),
            gridheight: Some(height),
            stylehints: None,
        }
    }

    pub fn buffer(id: u32) -> Self {
        Self {
            id,
            kind: WindowKind::Buffer,
            gridwidth: None,
            gridheight: None,
            stylehints: None,
        }
    }

    /// A grid one row tall is rendered as the status line.
    pub fn is_status_line(&self) -> bool {
        self.kind == WindowKind::Grid && self.gridheight.unwrap_or(1) <= 1
    }
}

/// Content update for one window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub id: u32,
    /// Wipe the window's rendered store before applying this entry
    #[serde(default)]
    pub clear: bool,
    /// Grid windows: changed lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<GridLine>>,
    /// Buffer windows: text blocks (paragraphs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<TextBlock>>,
}

/// One row of a grid window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridLine {
    pub line: u32,
    #[serde(default)]
    pub content: Vec<RawRun>,
}

/// One paragraph of a buffer window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Continue the previous paragraph instead of starting a new one
    #[serde(default)]
    pub append: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<RawRun>>,
}

impl TextBlock {
    /// True when the block carries no visible text (a paragraph spacer).
    pub fn is_blank(&self) -> bool {
        match &self.content {
            None => true,
            Some(runs) => runs.iter().all(|r| r.normalize().text.is_empty()),
        }
    }
}

/// A style run exactly as the VM sent it.
///
/// Three shapes are accepted: a bare string, a `[style, text]` pair, and a
/// `{style, text, fg, bg}` object. Anything else is kept so that it can be
/// normalized to an empty run rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRun {
    Plain(String),
    Pair(String, String),
    Styled {
        #[serde(default)]
        style: Option<String>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        fg: Option<String>,
        #[serde(default)]
        bg: Option<String>,
    },
    Malformed(serde_json::Value),
}

/// Normalized style run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Run {
    pub style: String,
    pub text: String,
    pub fg: Option<String>,
    pub bg: Option<String>,
}

impl Run {
    pub const DEFAULT_STYLE: &'static str = "normal";

    pub fn new(style: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            text: text.into(),
            fg: None,
            bg: None,
        }
    }
}

impl RawRun {
    /// Collapse any accepted shape into a [`Run`].
    pub fn normalize(&self) -> Run {
        match self {
            RawRun::Plain(text) => Run::new(Run::DEFAULT_STYLE, text.clone()),
            RawRun::Pair(style, text) => Run::new(style.clone(), text.clone()),
            RawRun::Styled {
                style,
                text,
                fg,
                bg,
            } => Run {
                style: style.clone().unwrap_or_else(|| Run::DEFAULT_STYLE.to_string()),
                text: text.clone().unwrap_or_default(),
                fg: fg.clone(),
                bg: bg.clone(),
            },
            RawRun::Malformed(value) => {
                tracing::debug!(?value, "ignoring malformed style run");
                Run::new(Run::DEFAULT_STYLE, "")
            }
        }
    }
}

/// Input kinds a window can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Line,
    Char,
}

/// Input request for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDescriptor {
    pub id: u32,
    /// Generation the reply must carry; defaults to the update's generation
    #[serde(rename = "gen", default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
    #[serde(rename = "type")]
    pub kind: InputKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxlen: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,
}

/// File prompt issued by save/restore opcodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialInput {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filemode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filetype: Option<String>,
}
