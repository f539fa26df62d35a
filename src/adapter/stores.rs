//! Per-window content stores.
//!
//! Grid windows receive only the lines that changed, so their rows are
//! merged here by line number before rendering. Buffer windows keep the
//! text of the current turn; earlier turns move to scrollback.

use std::collections::BTreeMap;

use crate::protocol::{ContentEntry, GridLine, RawRun, Run, TextBlock, WindowKind};
use crate::render::WindowRegistry;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowStores {
    grids: BTreeMap<u32, BTreeMap<u32, Vec<Run>>>,
    buffers: BTreeMap<u32, Vec<TextBlock>>,
}

/// What merging one update produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Merged {
    /// One complete entry per touched window, ready for rendering
    pub entries: Vec<ContentEntry>,
    /// Buffer windows whose previous text should move to scrollback
    pub retired: Vec<u32>,
    /// Windows whose content asked to be cleared
    pub cleared: Vec<u32>,
}

fn to_raw(run: &Run) -> RawRun {
    RawRun::Styled {
        style: Some(run.style.clone()),
        text: Some(run.text.clone()),
        fg: run.fg.clone(),
        bg: run.bg.clone(),
    }
}

impl WindowStores {
    pub fn merge(&mut self, content: &[ContentEntry], registry: &WindowRegistry) -> Merged {
        let mut merged = Merged::default();
        let mut touched: Vec<u32> = Vec::new();

        for entry in content {
            let Some(window) = registry.get(entry.id) else {
                tracing::warn!(window = entry.id, "content for unknown window");
                continue;
            };
            if entry.clear && !merged.cleared.contains(&entry.id) {
                merged.cleared.push(entry.id);
            }
            match window.kind {
                WindowKind::Grid => {
                    let grid = self.grids.entry(entry.id).or_default();
                    if entry.clear {
                        grid.clear();
                    }
                    let height = window.gridheight.unwrap_or(u32::MAX);
                    for line in entry.lines.iter().flatten() {
                        if line.line >= height {
                            tracing::warn!(window = entry.id, line = line.line, "grid line out of range");
                            continue;
                        }
                        grid.insert(line.line, line.content.iter().map(RawRun::normalize).collect());
                    }
                }
                WindowKind::Buffer => {
                    let buffer = self.buffers.entry(entry.id).or_default();
                    if !touched.contains(&entry.id) {
                        if !entry.clear && !buffer.is_empty() {
                            merged.retired.push(entry.id);
                        }
                        buffer.clear();
                    }
                    buffer.extend(entry.text.iter().flatten().cloned());
                }
                WindowKind::Other => continue,
            }
            if !touched.contains(&entry.id) {
                touched.push(entry.id);
            }
        }

        merged.entries = touched
            .into_iter()
            .map(|id| self.entry_for(id))
            .collect();
        merged
    }

    fn entry_for(&self, id: u32) -> ContentEntry {
        match self.grids.get(&id) {
            Some(grid) => ContentEntry {
                id,
                lines: Some(
                    grid.iter()
                        .map(|(line, runs)| GridLine {
                            line: *line,
                            content: runs.iter().map(to_raw).collect(),
                        })
                        .collect(),
                ),
                ..ContentEntry::default()
            },
            None => ContentEntry {
                id,
                text: self.buffers.get(&id).cloned(),
                ..ContentEntry::default()
            },
        }
    }
}
