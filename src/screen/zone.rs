use serde::{Deserialize, Serialize};

/// The three display regions a turn renders into.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    /// One-row grid: room name, score, moves
    Status,
    /// Multi-row grid: maps, quotations, box art
    Upper,
    /// Scrolling buffer text
    Main,
}

impl Zone {
    /// Every zone, in narration and search order.
    pub const ALL: [Zone; 3] = [Zone::Status, Zone::Upper, Zone::Main];

    pub fn as_str(self) -> &'static str {
        match self {
            Zone::Status => "status",
            Zone::Upper => "upper",
            Zone::Main => "main",
        }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
