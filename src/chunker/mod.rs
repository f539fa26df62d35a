//! Sentence chunking with exact tree positions.
//!
//! Rendered HTML is split into narration-sized chunks in two stages:
//!
//! 1. A pure planning step ([`MarkerChunker::plan`]): tokenize, find candidate
//!    boundaries, flatten into annotated segments and normalize each segment
//!    for speech.
//! 2. A splicing step ([`ChunkPlan::splice`]): parse the same tokens into a
//!    [`Document`] and thread zero-size start/end markers in at every boundary
//!    that survived as a chunk edge.
//!
//! Boundaries are token positions, never characters in the text, so speech
//! normalization can rewrite a segment freely without losing a boundary.

mod boundary;
mod normalize;
mod segment;
mod splice;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use boundary::{find_boundaries, Boundary, BoundaryRule, InitialsAndTitles, Position, SingleInitial};
pub use normalize::normalize_speech;
pub use segment::{flatten, segments, Segment};
pub use splice::{splice, Cut};

use crate::dom::{tokenize, Document, Token};
use crate::screen::Zone;

/// Who is speaking a chunk. Mapped to a platform voice by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceRole {
    Narrator,
    Status,
    Upper,
}

impl From<Zone> for VoiceRole {
    fn from(zone: Zone) -> Self {
        match zone {
            Zone::Status => VoiceRole::Status,
            Zone::Upper => VoiceRole::Upper,
            Zone::Main => VoiceRole::Narrator,
        }
    }
}

/// One narration unit in the composed, screen-wide chunk list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationChunk {
    pub text: String,
    /// Global index of the end marker that closes this chunk; `None` when the
    /// chunk runs to the end of its zone.
    pub marker_id: Option<usize>,
    pub voice: VoiceRole,
    pub zone: Zone,
}

/// A chunk of a single zone, before composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChunk {
    pub text: String,
    /// Boundary id that trailed this chunk in the source.
    pub boundary: Option<usize>,
}

/// Result of planning one zone's HTML.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    tokens: Vec<Token>,
    boundaries: Vec<Boundary>,
    chunks: Vec<PlannedChunk>,
}

impl ChunkPlan {
    pub fn chunks(&self) -> &[PlannedChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    /// Parse the planned HTML with markers numbered from `offset`.
    pub fn splice(&self, offset: usize) -> Document {
        let cuts: Vec<Cut> = self
            .chunks
            .iter()
            .enumerate()
            .filter_map(|(k, chunk)| {
                let boundary = self.boundaries.get(chunk.boundary?)?;
                Some(Cut {
                    position: boundary.position,
                    chunk: offset + k,
                })
            })
            .collect();
        let first = (!self.chunks.is_empty()).then_some(offset);
        splice(&self.tokens, &cuts, first)
    }
}

/// Screen-wide chunk list plus each zone's marked-up tree.
#[derive(Debug, Clone, Default)]
pub struct Composition {
    pub chunks: Vec<NarrationChunk>,
    pub documents: Vec<(Zone, Document)>,
}

/// Splits HTML into narration chunks.
#[derive(Clone)]
pub struct MarkerChunker {
    rule: Arc<dyn BoundaryRule>,
}

impl Default for MarkerChunker {
    fn default() -> Self {
        Self::new(InitialsAndTitles)
    }
}

impl std::fmt::Debug for MarkerChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerChunker").finish_non_exhaustive()
    }
}

impl MarkerChunker {
    pub fn new(rule: impl BoundaryRule + 'static) -> Self {
        Self {
            rule: Arc::new(rule),
        }
    }

    /// Plan the chunks of one HTML fragment.
    pub fn plan(&self, html: &str) -> ChunkPlan {
        let tokens = tokenize(html);
        let boundaries = find_boundaries(&tokens, self.rule.as_ref());

        let mut chunks: Vec<PlannedChunk> = segments(&tokens, &boundaries)
            .into_iter()
            .filter_map(|segment| {
                let text = normalize_speech(&segment.text);
                (!text.is_empty()).then_some(PlannedChunk {
                    text,
                    boundary: segment.boundary_after,
                })
            })
            .collect();
        if let Some(last) = chunks.last_mut() {
            last.boundary = None;
        }

        tracing::debug!(
            boundaries = boundaries.len(),
            chunks = chunks.len(),
            "planned chunks"
        );
        ChunkPlan {
            tokens,
            boundaries,
            chunks,
        }
    }

    /// Normalized plain text of a fragment, unsegmented.
    pub fn plain_text(&self, html: &str) -> String {
        normalize_speech(&flatten(&tokenize(html)))
    }

    /// Chunk several zones independently and concatenate the results.
    ///
    /// Marker numbering continues across zones so every marker id on the
    /// screen is unique. Zones with no speakable text still get a document.
    pub fn compose<'a>(&self, zones: impl IntoIterator<Item = (Zone, &'a str)>) -> Composition {
        let mut composition = Composition::default();
        for (zone, html) in zones {
            let offset = composition.chunks.len();
            let plan = self.plan(html);
            composition.documents.push((zone, plan.splice(offset)));
            composition
                .chunks
                .extend(plan.chunks.into_iter().enumerate().map(|(k, chunk)| {
                    NarrationChunk {
                        text: chunk.text,
                        marker_id: chunk.boundary.map(|_| offset + k),
                        voice: zone.into(),
                        zone,
                    }
                }));
        }
        composition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Marker;

    fn texts(plan: &ChunkPlan) -> Vec<&str> {
        plan.chunks().iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn dark_room_splits_at_first_period() {
        let chunker = MarkerChunker::default();
        let plan = chunker.plan("You are in a dark room. There is a door to the north.");
        assert_eq!(
            texts(&plan),
            vec!["You are in a dark room.", "There is a door to the north."]
        );
        assert_eq!(plan.chunks()[0].boundary, Some(0));
        assert_eq!(plan.chunks()[1].boundary, None);
    }

    #[test]
    fn title_does_not_split() {
        let plan = MarkerChunker::default().plan("Dr. Smith enters. He nods.");
        assert_eq!(texts(&plan), vec!["Dr. Smith enters.", "He nods."]);
    }

    #[test]
    fn empty_segments_are_dropped() {
        let plan = MarkerChunker::default()
            .plan("<div class=\"spacer\"></div><span>Hi.</span><br><br><div class=\"spacer\"></div>");
        assert_eq!(texts(&plan), vec!["Hi."]);
        assert_eq!(plan.chunks()[0].boundary, None);
    }

    #[test]
    fn joined_chunks_equal_plain_text() {
        let chunker = MarkerChunker::default();
        let html = "<div class=\"buffer-text\"><span class=\"s-header\">WEST OF HOUSE</span><br>\
                    <span class=\"s-normal\">You are standing in an open field. \u{201c}Hello!\u{201d} \
                    says J.R.R. Tolkien. Type Z-O-R-K.</span><br><div class=\"spacer\"></div>\
                    <span class=\"s-normal\">There is a small mailbox here.</span><br></div>";
        let plan = chunker.plan(html);
        assert!(plan.len() >= 4);
        let joined = texts(&plan).join(" ");
        assert_eq!(joined, chunker.plain_text(html));
    }

    #[test]
    fn spliced_document_has_markers_for_every_chunk() {
        let chunker = MarkerChunker::default();
        let plan = chunker.plan("<p>One. Two! Three?</p>");
        let doc = plan.splice(0);
        for k in 0..plan.len() {
            assert!(doc.find_marker(Marker::start(k)).is_some(), "start {k}");
        }
        for k in 0..plan.len() - 1 {
            assert!(doc.find_marker(Marker::end(k)).is_some(), "end {k}");
        }
        assert_eq!(doc.text_content(), "One. Two! Three?");
    }

    #[test]
    fn composition_offsets_marker_ids() {
        let chunker = MarkerChunker::default();
        let composition = chunker.compose([
            (Zone::Status, "<div class=\"status-line\">Cellar</div>"),
            (Zone::Main, "It is dark. You may be eaten."),
        ]);
        let chunks = &composition.chunks;
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].voice, VoiceRole::Status);
        assert_eq!(chunks[0].marker_id, None);
        assert_eq!(chunks[1].marker_id, Some(1));
        assert_eq!(chunks[2].voice, VoiceRole::Narrator);

        let (zone, main) = &composition.documents[1];
        assert_eq!(*zone, Zone::Main);
        assert!(main.find_marker(Marker::start(1)).is_some());
        assert!(main.find_marker(Marker::end(1)).is_some());
        assert!(main.find_marker(Marker::start(2)).is_some());
        assert!(main.find_marker(Marker::start(0)).is_none());
    }

    #[test]
    fn custom_rule_is_used() {
        let chunker = MarkerChunker::new(SingleInitial);
        let plan = chunker.plan("Dr. Smith enters.");
        assert_eq!(texts(&plan), vec!["Dr.", "Smith enters."]);
    }
}
