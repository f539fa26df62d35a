//! Candidate chunk boundaries in tokenized HTML.
//!
//! A boundary is recorded as a position in the token stream rather than as a
//! delimiter spliced into the text, so it survives every later transform
//! untouched and can never collide with game text.

use crate::dom::Token;

/// Location of a boundary: inside text token `token` at byte `offset`, or
/// immediately before tag token `token` (offset 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub token: usize,
    pub offset: usize,
}

/// A candidate boundary. Ids are sequential in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub id: usize,
    pub position: Position,
}

/// Decides whether a period closes an abbreviation rather than a sentence.
///
/// `word` is the run of letters immediately before the period (possibly
/// empty). This is a heuristic by nature, hence a trait.
pub trait BoundaryRule: Send + Sync {
    fn is_abbreviation(&self, word: &str) -> bool;
}

/// Vetoes a period after a single uppercase letter ("J. R. R. Tolkien").
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleInitial;

impl BoundaryRule for SingleInitial {
    fn is_abbreviation(&self, word: &str) -> bool {
        let mut chars = word.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase())
    }
}

/// Honorifics and titles that usually precede a name.
const TITLES: &[&str] = &[
    "Mr", "Mrs", "Ms", "Dr", "St", "Jr", "Sr", "Mt", "Prof", "Capt", "Col", "Gen", "Lt", "Sgt",
    "Rev", "Hon", "Gov", "Pres", "Messrs",
];

/// Default rule: single initials plus common titles ("Dr. Smith").
#[derive(Debug, Clone, Copy, Default)]
pub struct InitialsAndTitles;

impl BoundaryRule for InitialsAndTitles {
    fn is_abbreviation(&self, word: &str) -> bool {
        SingleInitial.is_abbreviation(word) || TITLES.contains(&word)
    }
}

/// Characters that may follow sentence punctuation and still belong to the
/// sentence (closing quotes and brackets).
fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '\u{201d}' | '\u{2019}')
}

/// Elements that act as a line break.
fn is_break(token: &Token) -> bool {
    matches!(token, Token::Open { name, .. } if name == "br") || is_spacer(token)
}

fn is_spacer(token: &Token) -> bool {
    matches!(token, Token::Open { .. }) && token.has_class("spacer")
}

fn is_whitespace_text(token: &Token) -> bool {
    matches!(token, Token::Text(text) if text.trim().is_empty())
}

/// Whether the line break at `index` is followed by another one, ignoring
/// whitespace and closing tags in between.
fn followed_by_break(tokens: &[Token], index: usize) -> bool {
    tokens[index + 1..]
        .iter()
        .find(|t| !is_whitespace_text(t) && !matches!(t, Token::Close { .. }))
        .map(is_break)
        .unwrap_or(false)
}

/// Whether whatever follows the end of text token `index` separates words.
fn separated_after(tokens: &[Token], index: usize) -> bool {
    match tokens.get(index + 1) {
        None => true,
        Some(Token::Text(next)) => next.starts_with(char::is_whitespace),
        Some(_) => true,
    }
}

/// Sentence-end offsets inside one text token.
fn sentence_ends(text: &str, at_end_separated: bool, rule: &dyn BoundaryRule) -> Vec<usize> {
    let mut ends = Vec::new();
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    for (i, &(byte, c)) in chars.iter().enumerate() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        if c == '.' {
            let word_start = chars[..i]
                .iter()
                .rposition(|(_, ch)| !ch.is_alphabetic())
                .map(|p| chars[p].0 + chars[p].1.len_utf8())
                .unwrap_or(0);
            if rule.is_abbreviation(&text[word_start..byte]) {
                continue;
            }
        }
        let mut j = i + 1;
        while j < chars.len() && is_closer(chars[j].1) {
            j += 1;
        }
        let end = chars.get(j).map(|(b, _)| *b).unwrap_or(text.len());
        let separated = match chars.get(j) {
            Some((_, next)) => next.is_whitespace(),
            None => at_end_separated,
        };
        if separated && ends.last() != Some(&end) {
            ends.push(end);
        }
    }
    ends
}

/// Find every candidate boundary in a token stream.
///
/// Candidates are sentence-ending punctuation followed by whitespace, a tag
/// or the end of input (subject to `rule`), a paragraph spacer, and a line
/// break directly followed by another line break.
pub fn find_boundaries(tokens: &[Token], rule: &dyn BoundaryRule) -> Vec<Boundary> {
    let mut positions = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        match token {
            Token::Text(text) => {
                let separated = separated_after(tokens, index);
                for offset in sentence_ends(text, separated, rule) {
                    positions.push(Position {
                        token: index,
                        offset,
                    });
                }
            }
            Token::Open { .. } if is_spacer(token) => {
                positions.push(Position {
                    token: index,
                    offset: 0,
                });
            }
            Token::Open { .. } if is_break(token) && followed_by_break(tokens, index) => {
                positions.push(Position {
                    token: index,
                    offset: 0,
                });
            }
            _ => {}
        }
    }

    positions
        .into_iter()
        .enumerate()
        .map(|(id, position)| Boundary { id, position })
        .collect()
}
