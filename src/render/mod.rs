//! Update rendering: VM content → per-zone HTML and plain text.
//!
//! Rendering is a pure function of the content entries and the window
//! registry. Identical input always yields byte-identical output, which is
//! what lets the chunk cache and the saved display snapshots be trusted.
//!
//! - [`status`] - one-row grids (status bar)
//! - [`grid`] - multi-row grids (upper window)
//! - [`buffer`] - buffer windows (main text)

mod buffer;
mod escape;
mod grid;
mod status;
mod style;

use std::collections::BTreeMap;

use crate::protocol::{ContentEntry, Run, WindowDescriptor, WindowKind};
use crate::screen::Zone;

pub use buffer::{render_buffer, SPACER};
pub use escape::escape_html;
pub use grid::render_grid;
pub use status::{render_status, status_fields};
pub use style::style_class;

/// Window definitions known for the current VM session.
///
/// Windows are added or updated, never removed, for the life of a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowRegistry {
    windows: BTreeMap<u32, WindowDescriptor>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace window definitions.
    pub fn merge(&mut self, defs: &[WindowDescriptor]) {
        for def in defs {
            self.windows.insert(def.id, def.clone());
        }
    }

    pub fn get(&self, id: u32) -> Option<&WindowDescriptor> {
        self.windows.get(&id)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Zone a window renders into, if it is displayable.
    pub fn zone_of(&self, id: u32) -> Option<Zone> {
        let window = self.get(id)?;
        match window.kind {
            WindowKind::Grid if window.is_status_line() => Some(Zone::Status),
            WindowKind::Grid => Some(Zone::Upper),
            WindowKind::Buffer => Some(Zone::Main),
            WindowKind::Other => None,
        }
    }
}

/// Rendered output of a single window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedWindow {
    pub window: u32,
    pub zone: Zone,
    pub html: String,
    pub plain: String,
}

/// Rendered output of one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedTurn {
    pub windows: Vec<RenderedWindow>,
}

impl RenderedTurn {
    /// Combined HTML for a zone, or `None` when nothing rendered into it.
    pub fn zone_html(&self, zone: Zone) -> Option<String> {
        let parts: Vec<&str> = self
            .windows
            .iter()
            .filter(|w| w.zone == zone)
            .map(|w| w.html.as_str())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.concat())
        }
    }

    /// Plain text of the turn in zone order (status, upper, main).
    pub fn plain_text(&self) -> String {
        let mut parts = Vec::new();
        for zone in Zone::ALL {
            for window in self.windows.iter().filter(|w| w.zone == zone) {
                if !window.plain.trim().is_empty() {
                    parts.push(window.plain.as_str());
                }
            }
        }
        parts.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Grid lines of a content entry keyed by line number.
pub fn grid_lines(entry: &ContentEntry) -> BTreeMap<u32, Vec<Run>> {
    entry
        .lines
        .iter()
        .flatten()
        .map(|line| (line.line, line.content.iter().map(|r| r.normalize()).collect()))
        .collect()
}

/// Render one turn's content entries against the window registry.
///
/// Grid entries are expected to carry every row of the window; the adapter
/// merges partial grid updates before calling this.
pub fn render_turn(content: &[ContentEntry], registry: &WindowRegistry) -> RenderedTurn {
    let mut turn = RenderedTurn::default();

    for entry in content {
        let Some(zone) = registry.zone_of(entry.id) else {
            tracing::warn!(window = entry.id, "content for unknown or undisplayable window");
            continue;
        };
        let rendered = match zone {
            Zone::Status => {
                let runs: Vec<Run> = grid_lines(entry).into_values().flatten().collect();
                render_status(entry.id, &runs)
            }
            Zone::Upper => render_grid(entry.id, &grid_lines(entry)),
            Zone::Main => render_buffer(entry.id, entry.text.as_deref().unwrap_or(&[])),
        };
        turn.windows.push(rendered);
    }

    turn
}
