//! Status line rendering.
//!
//! A one-row grid window is the classic Z-machine status bar: room name on the
//! left, score/moves on the right, padded with runs of spaces. The padding is
//! turned into fields so narration can pause between them instead of reading
//! a wall of spaces.

use once_cell::sync::Lazy;
use regex::Regex;

use super::escape::escape_into;
use super::RenderedWindow;
use crate::protocol::Run;
use crate::screen::Zone;

/// Two or more consecutive spaces separate status fields.
static FIELD_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("valid regex"));

/// Separator spoken between fields; styled as low-weight by the page.
const DELIMITER: &str = ", ";

/// Split a status line into its non-empty fields.
pub fn status_fields(text: &str) -> Vec<String> {
    FIELD_GAP
        .split(text)
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(str::to_string)
        .collect()
}

/// Position class for field `i` of `count`.
fn field_class(i: usize, count: usize) -> &'static str {
    if i == 0 {
        "status-left"
    } else if i + 1 == count {
        "status-right"
    } else {
        "status-center"
    }
}

/// Render the runs of a status-line grid.
pub fn render_status(window: u32, runs: &[Run]) -> RenderedWindow {
    let text: String = runs.iter().map(|r| r.text.as_str()).collect();
    let fields = status_fields(&text);

    let mut html = String::from("<div class=\"status-line\">");
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            html.push_str("<span class=\"status-delim\">");
            html.push_str(DELIMITER);
            html.push_str("</span>");
        }
        html.push_str("<span class=\"");
        html.push_str(field_class(i, fields.len()));
        html.push_str("\">");
        escape_into(field, &mut html);
        html.push_str("</span>");
    }
    html.push_str("</div>");

    RenderedWindow {
        window,
        zone: Zone::Status,
        html,
        plain: fields.join(DELIMITER),
    }
}
