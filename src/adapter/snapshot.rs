use serde::{Deserialize, Serialize};

/// Everything needed to put the display back the way it was.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    pub generation: u64,
    #[serde(rename = "inputWindowId")]
    pub input_window_id: Option<u32>,
    #[serde(rename = "statusBarHTML")]
    pub status_bar_html: String,
    #[serde(rename = "upperWindowHTML")]
    pub upper_window_html: String,
    #[serde(rename = "lowerWindowHTML")]
    pub lower_window_html: String,
}
