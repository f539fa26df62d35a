//! Thread chunk markers into a freshly parsed tree.

use super::boundary::Position;
use crate::dom::{Document, Marker, NodeId, NodeKind, Token};

/// A marker pair to insert: end of chunk `chunk`, start of `chunk + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cut {
    pub position: Position,
    pub chunk: usize,
}

/// Parse `tokens` and splice in markers.
///
/// Chunk numbers in `cuts` and `first_chunk` are already global. Cuts whose
/// position no longer maps onto the tree are skipped with a warning; the
/// affected chunk then plays without a highlight.
pub fn splice(tokens: &[Token], cuts: &[Cut], first_chunk: Option<usize>) -> Document {
    let (mut doc, map) = Document::from_tokens(tokens);

    let mut ordered = cuts.to_vec();
    ordered.sort_by(|a, b| b.position.cmp(&a.position));
    for cut in ordered {
        let node = map.get(cut.position.token).copied().flatten();
        let placed = node.and_then(|node| insert_pair(&mut doc, node, cut));
        if placed.is_none() {
            tracing::warn!(chunk = cut.chunk, position = ?cut.position, "could not place chunk marker");
        }
    }

    if let Some(chunk) = first_chunk {
        let root = doc.root();
        doc.prepend_child(root, NodeKind::Marker(Marker::start(chunk)));
    }
    doc
}

fn insert_pair(doc: &mut Document, node: NodeId, cut: Cut) -> Option<()> {
    let end = NodeKind::Marker(Marker::end(cut.chunk));
    let start = NodeKind::Marker(Marker::start(cut.chunk + 1));

    let Some(text) = doc.text(node) else {
        // Tag position: markers go right before the element.
        doc.insert_before(node, end)?;
        doc.insert_before(node, start)?;
        return Some(());
    };

    let offset = cut.position.offset;
    let len = text.len();
    if offset == 0 {
        doc.insert_before(node, end)?;
        doc.insert_before(node, start)?;
    } else {
        if offset < len {
            doc.split_text(node, offset)?;
        } else if offset > len {
            return None;
        }
        let end_id = doc.insert_after(node, end)?;
        doc.insert_after(end_id, start)?;
    }
    Some(())
}
