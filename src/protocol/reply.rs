//! Replies sent from the display adapter to the VM.

use serde::{Deserialize, Serialize};

/// Display metrics reported on `init` and `arrange`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub width: u32,
    pub height: u32,
    #[serde(default = "Metrics::default_char_width")]
    pub charwidth: f32,
    #[serde(default = "Metrics::default_char_height")]
    pub charheight: f32,
}

impl Metrics {
    fn default_char_width() -> f32 {
        8.0
    }

    fn default_char_height() -> f32 {
        16.0
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            width: 640,
            height: 384,
            charwidth: Self::default_char_width(),
            charheight: Self::default_char_height(),
        }
    }
}

/// A reply to the VM. Every variant carries the generation it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputReply {
    Init {
        #[serde(rename = "gen")]
        generation: u64,
        metrics: Metrics,
    },
    Arrange {
        #[serde(rename = "gen")]
        generation: u64,
        metrics: Metrics,
    },
    Line {
        #[serde(rename = "gen")]
        generation: u64,
        window: u32,
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        terminator: Option<String>,
    },
    Char {
        #[serde(rename = "gen")]
        generation: u64,
        window: u32,
        value: String,
    },
    #[serde(rename = "specialresponse")]
    SpecialResponse {
        #[serde(rename = "gen")]
        generation: u64,
        response: String,
        value: Option<String>,
    },
}

impl InputReply {
    /// Generation carried by this reply.
    pub fn generation(&self) -> u64 {
        match self {
            InputReply::Init { generation, .. }
            | InputReply::Arrange { generation, .. }
            | InputReply::Line { generation, .. }
            | InputReply::Char { generation, .. }
            | InputReply::SpecialResponse { generation, .. } => *generation,
        }
    }

    /// Short name of the reply type, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            InputReply::Init { .. } => "init",
            InputReply::Arrange { .. } => "arrange",
            InputReply::Line { .. } => "line",
            InputReply::Char { .. } => "char",
            InputReply::SpecialResponse { .. } => "specialresponse",
        }
    }
}
