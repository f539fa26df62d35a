//! The live display: three zones, their trees, the chunk cache and the
//! highlight set.
//!
//! The adapter writes zone HTML; the narration player reads chunks and moves
//! the highlight. Every write bumps the revision and drops the chunk cache so
//! a playback loop can notice that the text it was reading has gone away.

mod viewport;
mod zone;

use std::collections::BTreeMap;

pub use viewport::{HeadlessViewport, Viewport, ViewportCall};
pub use zone::Zone;

use crate::chunker::{MarkerChunker, NarrationChunk};
use crate::dom::Document;
use crate::highlight::TextRange;

#[derive(Debug, Clone, Default)]
struct ZoneContent {
    html: String,
    document: Document,
}

pub struct Screen {
    zones: BTreeMap<Zone, ZoneContent>,
    scrollback: Vec<String>,
    narrated: Vec<Zone>,
    chunker: MarkerChunker,
    chunks: Option<Vec<NarrationChunk>>,
    highlights: BTreeMap<String, Vec<TextRange>>,
    revision: u64,
    viewport: Box<dyn Viewport>,
}

impl std::fmt::Debug for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("revision", &self.revision)
            .field("narrated", &self.narrated)
            .field("cached_chunks", &self.chunks.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

impl Screen {
    pub fn new(viewport: impl Viewport + 'static) -> Self {
        Self {
            zones: BTreeMap::new(),
            scrollback: Vec::new(),
            narrated: Zone::ALL.to_vec(),
            chunker: MarkerChunker::default(),
            chunks: None,
            highlights: BTreeMap::new(),
            revision: 0,
            viewport: Box::new(viewport),
        }
    }

    /// Screen without a display, for tests and the CLI.
    pub fn headless() -> Self {
        Self::new(HeadlessViewport::new())
    }

    pub fn with_chunker(mut self, chunker: MarkerChunker) -> Self {
        self.chunker = chunker;
        self.invalidate();
        self
    }

    /// Restrict narration to `zones`; order is always status, upper, main.
    pub fn set_narrated_zones(&mut self, zones: &[Zone]) {
        self.narrated = Zone::ALL
            .into_iter()
            .filter(|z| zones.contains(z))
            .collect();
        self.invalidate();
    }

    pub fn narrated_zones(&self) -> &[Zone] {
        &self.narrated
    }

    /// Content revision; changes on every zone write.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn invalidate(&mut self) {
        self.revision += 1;
        self.chunks = None;
        self.highlights.clear();
        // Drop markers spliced by the previous chunking pass.
        for content in self.zones.values_mut() {
            content.document = Document::parse(&content.html);
        }
    }

    /// Replace a zone's content.
    pub fn write_zone(&mut self, zone: Zone, html: impl Into<String>) {
        let html = html.into();
        tracing::trace!(%zone, bytes = html.len(), "zone write");
        self.zones.insert(
            zone,
            ZoneContent {
                document: Document::parse(&html),
                html,
            },
        );
        self.invalidate();
    }

    /// Clear every zone, the scrollback and the highlight.
    pub fn reset(&mut self) {
        self.zones.clear();
        self.scrollback.clear();
        self.invalidate();
    }

    /// HTML last written to a zone (without chunk markers).
    pub fn zone_html(&self, zone: Zone) -> &str {
        self.zones.get(&zone).map(|c| c.html.as_str()).unwrap_or("")
    }

    /// Current tree of a zone, including any spliced markers.
    pub fn document(&self, zone: Zone) -> Option<&Document> {
        self.zones.get(&zone).map(|c| &c.document)
    }

    /// Mutable access to a zone's tree. Edits here bypass invalidation.
    pub fn document_mut(&mut self, zone: Zone) -> Option<&mut Document> {
        self.zones.get_mut(&zone).map(|c| &mut c.document)
    }

    /// Serialized live tree of a zone.
    pub fn live_html(&self, zone: Zone) -> String {
        self.document(zone).map(Document::to_html).unwrap_or_default()
    }

    /// Move main-zone HTML of an earlier turn into history.
    pub fn push_scrollback(&mut self, html: impl Into<String>) {
        let html = html.into();
        if !html.is_empty() {
            self.scrollback.push(html);
        }
    }

    pub fn scrollback(&self) -> &[String] {
        &self.scrollback
    }

    pub fn clear_scrollback(&mut self) {
        self.scrollback.clear();
    }

    /// Whether the chunk list is currently cached.
    pub fn has_chunks(&self) -> bool {
        self.chunks.is_some()
    }

    /// Chunk list for the current content, computed on first use.
    ///
    /// Computing it also splices markers into the narrated zones' trees.
    pub fn chunks(&mut self) -> &[NarrationChunk] {
        if self.chunks.is_none() {
            let sources: Vec<(Zone, String)> = self
                .narrated
                .iter()
                .filter_map(|zone| self.zones.get(zone).map(|c| (*zone, c.html.clone())))
                .collect();
            let composition = self
                .chunker
                .compose(sources.iter().map(|(zone, html)| (*zone, html.as_str())));
            for (zone, document) in composition.documents {
                if let Some(content) = self.zones.get_mut(&zone) {
                    content.document = document;
                }
            }
            tracing::debug!(chunks = composition.chunks.len(), "chunk cache rebuilt");
            self.chunks = Some(composition.chunks);
        }
        self.chunks.as_deref().unwrap_or_default()
    }

    pub fn chunk(&mut self, index: usize) -> Option<NarrationChunk> {
        self.chunks().get(index).cloned()
    }

    pub fn chunk_count(&mut self) -> usize {
        self.chunks().len()
    }

    /// Normalized plain text of the narrated zones.
    pub fn plain_text(&self) -> String {
        self.narrated
            .iter()
            .map(|zone| self.chunker.plain_text(self.zone_html(*zone)))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Replace a highlight group in one step.
    pub fn set_highlight(&mut self, group: &str, ranges: Vec<TextRange>) {
        if ranges.is_empty() {
            self.highlights.remove(group);
        } else {
            self.highlights.insert(group.to_string(), ranges);
        }
    }

    pub fn clear_highlight(&mut self, group: &str) {
        self.highlights.remove(group);
    }

    pub fn highlight(&self, group: &str) -> &[TextRange] {
        self.highlights.get(group).map(Vec::as_slice).unwrap_or_default()
    }

    /// Text covered by a highlight group, ranges joined by single spaces.
    pub fn highlighted_text(&self, group: &str) -> String {
        self.highlight(group)
            .iter()
            .filter_map(|range| {
                let text = self.document(range.zone)?.text(range.node)?;
                text.get(range.start..range.end)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn viewport(&self) -> &dyn Viewport {
        self.viewport.as_ref()
    }

    pub fn viewport_mut(&mut self) -> &mut dyn Viewport {
        self.viewport.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Marker;

    #[test]
    fn chunks_are_lazy_and_invalidated_by_writes() {
        let mut screen = Screen::headless();
        screen.write_zone(Zone::Main, "One. Two.");
        assert!(!screen.has_chunks());
        assert_eq!(screen.chunk_count(), 2);
        assert!(screen.has_chunks());

        let before = screen.revision();
        screen.write_zone(Zone::Main, "Three.");
        assert!(!screen.has_chunks());
        assert!(screen.revision() > before);
        assert_eq!(screen.chunk(0).map(|c| c.text), Some("Three.".to_string()));
    }

    #[test]
    fn chunking_splices_markers_into_live_tree() {
        let mut screen = Screen::headless();
        screen.write_zone(Zone::Main, "One. Two.");
        assert!(!screen.live_html(Zone::Main).contains("chunk-start"));
        screen.chunks();
        let doc = screen.document(Zone::Main).unwrap();
        assert!(doc.find_marker(Marker::start(1)).is_some());
        assert_eq!(screen.zone_html(Zone::Main), "One. Two.");
    }

    #[test]
    fn excluded_zone_is_not_chunked() {
        let mut screen = Screen::headless();
        screen.write_zone(Zone::Status, "<div class=\"status-line\">Attic</div>");
        screen.write_zone(Zone::Main, "Dusty.");
        screen.set_narrated_zones(&[Zone::Main]);
        let chunks = screen.chunks();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].zone, Zone::Main);
        assert!(screen.document(Zone::Status).unwrap().markers().is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let mut screen = Screen::headless();
        screen.write_zone(Zone::Main, "x");
        screen.push_scrollback("<p>old</p>");
        screen.reset();
        assert_eq!(screen.zone_html(Zone::Main), "");
        assert!(screen.scrollback().is_empty());
        assert_eq!(screen.chunk_count(), 0);
    }

    #[test]
    fn plain_text_joins_zones() {
        let mut screen = Screen::headless();
        screen.write_zone(Zone::Status, "<div>Attic</div>");
        screen.write_zone(Zone::Main, "<p>A  TRAPDOOR.</p>");
        assert_eq!(screen.plain_text(), "Attic A Trapdoor.");
    }
}
