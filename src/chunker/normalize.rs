//! Text normalization for speech synthesis.

use once_cell::sync::Lazy;
use regex::Regex;

static SPELLED_OUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:[A-Za-z]-){2,}[A-Za-z]\b").expect("valid regex"));
static RUN_TOGETHER_INITIALS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z])\.([A-Z])").expect("valid regex"));
static ALL_CAPS_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{2,}\b").expect("valid regex"));

/// Map typographic punctuation (general punctuation block, nbsp) to ASCII.
fn ascii_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{a0}' => out.push(' '),
            '\u{2000}'..='\u{206f}' => match deunicode::deunicode_char(c) {
                Some(ascii) => out.push_str(ascii),
                None => out.push(' '),
            },
            _ => out.push(c),
        }
    }
    out
}

/// Z-O-R-K → ZORK
fn join_spelled_letters(text: &str) -> String {
    SPELLED_OUT
        .replace_all(text, |caps: &regex::Captures| caps[0].replace('-', ""))
        .into_owned()
}

/// J.R.R. → J. R. R.
fn space_initials(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = RUN_TOGETHER_INITIALS
            .replace_all(&current, "$1. $2")
            .into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// WEST OF HOUSE → West Of House, so synthesizers don't spell it out.
fn title_case_caps(text: &str) -> String {
    ALL_CAPS_WORD
        .replace_all(text, |caps: &regex::Captures| {
            let word = &caps[0];
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let mut out = first.to_string();
                    out.push_str(&chars.as_str().to_lowercase());
                    out
                }
                None => String::new(),
            }
        })
        .into_owned()
}

/// Normalize one piece of plain text for speech.
///
/// Applied per segment; none of the rules can move or remove a chunk
/// boundary since boundaries live between segments.
pub fn normalize_speech(text: &str) -> String {
    let text = ascii_punctuation(text);
    let text = join_spelled_letters(&text);
    let text = space_initials(&text);
    let text = collapse_whitespace(&text);
    title_case_caps(&text)
}
