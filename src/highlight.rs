//! Chunk highlighting.
//!
//! A chunk's extent is recovered from the markers spliced by the chunker: the
//! chunk's start marker up to its end marker, the next start marker, or the
//! end of the zone. Ranges cover only non-whitespace text, one range per
//! text node.

use crate::dom::{Document, Marker, MarkerKind, NodeId};
use crate::screen::{Screen, Zone};

/// Highlight group used for the narration cursor.
pub const NARRATION_GROUP: &str = "narration";

/// A highlighted span of one text node, in byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub zone: Zone,
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
}

/// Outcome of highlighting one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightReport {
    pub chunk_index: usize,
    pub success: bool,
    pub ranges: usize,
}

fn trimmed_range(text: &str) -> Option<(usize, usize)> {
    let start = text.find(|c: char| !c.is_whitespace())?;
    let end = text.trim_end().len();
    Some((start, end))
}

fn ranges_in(doc: &Document, zone: Zone, index: usize) -> Option<Vec<TextRange>> {
    let nodes = doc.descendants();
    let start_pos = nodes
        .iter()
        .position(|id| doc.marker(*id) == Some(Marker::start(index)))?;

    let mut ranges = Vec::new();
    for id in &nodes[start_pos + 1..] {
        if let Some(marker) = doc.marker(*id) {
            if marker == Marker::end(index) || marker.kind == MarkerKind::Start {
                break;
            }
            continue;
        }
        if let Some((start, end)) = doc.text(*id).and_then(trimmed_range) {
            ranges.push(TextRange {
                zone,
                node: *id,
                start,
                end,
            });
        }
    }
    Some(ranges)
}

/// Ranges covering chunk `index`, searching status, upper, then main.
///
/// Returns an empty list when no zone holds the chunk's start marker.
pub fn resolve(screen: &Screen, index: usize) -> Vec<TextRange> {
    Zone::ALL
        .into_iter()
        .find_map(|zone| ranges_in(screen.document(zone)?, zone, index))
        .unwrap_or_default()
}

/// First non-marker sibling after the chunk's start marker.
fn scroll_target(screen: &Screen, index: usize) -> Option<(Zone, NodeId)> {
    Zone::ALL.into_iter().find_map(|zone| {
        let doc = screen.document(zone)?;
        let marker = doc.find_marker(Marker::start(index))?;
        let mut next = doc.next_sibling(marker);
        while let Some(id) = next {
            if doc.marker(id).is_none() {
                return Some((zone, id));
            }
            next = doc.next_sibling(id);
        }
        doc.parent(marker).map(|parent| (zone, parent))
    })
}

/// Highlight chunk `index`, replacing any previous narration highlight, and
/// bring it into view.
///
/// Without a start marker the highlight is cleared and failure reported.
pub fn apply(screen: &mut Screen, index: usize) -> HighlightReport {
    // Markers only exist once the chunk list has been computed.
    screen.chunks();

    let ranges = resolve(screen, index);
    let report = HighlightReport {
        chunk_index: index,
        success: !ranges.is_empty(),
        ranges: ranges.len(),
    };
    if !report.success {
        tracing::debug!(chunk = index, "no markers for chunk; clearing highlight");
        screen.clear_highlight(NARRATION_GROUP);
        return report;
    }
    screen.set_highlight(NARRATION_GROUP, ranges);

    if let Some((zone, node)) = scroll_target(screen, index) {
        if !screen.viewport().is_fully_visible(zone, node) {
            screen.viewport_mut().scroll_to_center(zone, node);
        }
    }
    report
}

pub fn clear(screen: &mut Screen) {
    screen.clear_highlight(NARRATION_GROUP);
}
