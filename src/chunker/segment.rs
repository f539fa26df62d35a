//! Flatten tokens into plain-text segments delimited by boundaries.

use super::boundary::Boundary;
use crate::dom::Token;

/// Raw plain text between two boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    /// Boundary that ends this segment; `None` for the trailing segment.
    pub boundary_after: Option<usize>,
}

/// Elements whose close tag ends a line.
const BLOCK_ELEMENTS: &[&str] = &[
    "div", "p", "li", "pre", "blockquote", "tr", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Plain-text contribution of a tag.
fn tag_text(token: &Token) -> &'static str {
    match token {
        Token::Open { name, .. } if name == "br" => "\n",
        Token::Open { .. } if token.has_class("spacer") => "\n",
        Token::Close { name } if BLOCK_ELEMENTS.contains(&name.as_str()) => "\n",
        _ => "",
    }
}

/// Walk the tokens once, cutting a new segment at every boundary.
///
/// `boundaries` must be in document order, as produced by
/// [`find_boundaries`](super::boundary::find_boundaries).
pub fn segments(tokens: &[Token], boundaries: &[Boundary]) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut pending = boundaries.iter().peekable();

    for (index, token) in tokens.iter().enumerate() {
        let mut consumed = 0;
        while let Some(boundary) = pending.next_if(|b| b.position.token == index) {
            if let Token::Text(text) = token {
                let cut = boundary.position.offset.min(text.len());
                current.push_str(text.get(consumed..cut).unwrap_or_default());
                consumed = consumed.max(cut);
            }
            out.push(Segment {
                text: std::mem::take(&mut current),
                boundary_after: Some(boundary.id),
            });
        }
        match token {
            Token::Text(text) => current.push_str(text.get(consumed..).unwrap_or_default()),
            tag => current.push_str(tag_text(tag)),
        }
    }

    out.push(Segment {
        text: current,
        boundary_after: None,
    });
    out
}

/// Flatten tokens to plain text without any segmentation.
pub fn flatten(tokens: &[Token]) -> String {
    segments(tokens, &[]).into_iter().map(|s| s.text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::boundary::{find_boundaries, InitialsAndTitles};
    use crate::dom::tokenize;

    fn split(html: &str) -> Vec<Segment> {
        let tokens = tokenize(html);
        let boundaries = find_boundaries(&tokens, &InitialsAndTitles);
        segments(&tokens, &boundaries)
    }

    #[test]
    fn cuts_inside_text_tokens() {
        let segs = split("One. Two. Three");
        let texts: Vec<&str> = segs.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["One.", " Two.", " Three"]);
        assert_eq!(segs[0].boundary_after, Some(0));
        assert_eq!(segs[1].boundary_after, Some(1));
        assert_eq!(segs[2].boundary_after, None);
    }

    #[test]
    fn cuts_before_tags() {
        let segs = split("<span>Hi there</span><br><br><span>Next</span>");
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].text, "Hi there");
        assert_eq!(segs[1].text, "\n\nNext");
    }

    #[test]
    fn flatten_normalizes_line_breaks() {
        let tokens = tokenize("<div>a</div><div>b<br>c</div>");
        assert_eq!(flatten(&tokens), "a\nb\nc\n");
    }

    #[test]
    fn segments_concatenate_to_flattened_text() {
        let html = "<div class=\"buffer-text\"><span>It is dark. You may be eaten.</span><br>\
                    <div class=\"spacer\"></div><span>Dr. Who?</span><br></div>";
        let tokens = tokenize(html);
        let joined: String = split(html).into_iter().map(|s| s.text).collect();
        assert_eq!(joined, flatten(&tokens));
    }
}
