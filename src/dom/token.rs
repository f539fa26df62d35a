//! HTML tokenizer.
//!
//! Handles the subset of HTML the renderer produces plus whatever a restored
//! snapshot may contain: tags with quoted or bare attributes, character
//! references, comments and doctypes (skipped). Malformed markup degrades to
//! text instead of failing.

/// One lexical unit of HTML. Text is stored decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    Open {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    Close {
        name: String,
    },
}

impl Token {
    /// Tag name for open/close tokens.
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Token::Open { name, .. } | Token::Close { name } => Some(name),
            Token::Text(_) => None,
        }
    }

    /// Value of an attribute on an open tag.
    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            Token::Open { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// True if an open tag lists `class` among its classes.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Decode character references in a text or attribute value.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after.find(';').filter(|end| *end <= 10).and_then(|end| {
            let name = &after[..end];
            decode_reference(name).map(|c| (c, end))
        });
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &after[end + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Split HTML into tokens.
pub fn tokenize(html: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut i = 0;
    let bytes = html.as_bytes();

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        let rest = &html[i..];

        // Comments and declarations are skipped entirely.
        let skip_to = if rest.starts_with("<!--") {
            Some(rest.find("-->").map(|e| i + e + 3).unwrap_or(html.len()))
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            Some(rest.find('>').map(|e| i + e + 1).unwrap_or(html.len()))
        } else {
            None
        };
        if let Some(end) = skip_to {
            push_text(&mut tokens, &html[text_start..i]);
            i = end;
            text_start = end;
            continue;
        }

        match parse_tag(rest) {
            Some((token, len)) => {
                push_text(&mut tokens, &html[text_start..i]);
                tokens.push(token);
                i += len;
                text_start = i;
            }
            None => i += 1,
        }
    }
    push_text(&mut tokens, &html[text_start..]);
    tokens
}

fn push_text(tokens: &mut Vec<Token>, raw: &str) {
    if !raw.is_empty() {
        tokens.push(Token::Text(decode_entities(raw)));
    }
}

/// Parse a tag at the start of `s`. Returns the token and its byte length.
fn parse_tag(s: &str) -> Option<(Token, usize)> {
    let end = s.find('>')?;
    let inner = &s[1..end];
    let len = end + 1;

    if let Some(name) = inner.strip_prefix('/') {
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() || !name.chars().all(is_name_char) {
            return None;
        }
        return Some((Token::Close { name }, len));
    }

    let self_closing = inner.ends_with('/');
    let inner = inner.trim_end_matches('/');
    let name_len = inner
        .char_indices()
        .find(|(_, c)| !is_name_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(inner.len());
    if name_len == 0 || !inner.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let name = inner[..name_len].to_ascii_lowercase();
    let attrs = parse_attrs(&inner[name_len..]);
    Some((
        Token::Open {
            name,
            attrs,
            self_closing,
        },
        len,
    ))
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'
}

fn parse_attrs(mut s: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    loop {
        s = s.trim_start();
        if s.is_empty() {
            break;
        }
        let key_len = s
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(s.len());
        if key_len == 0 {
            // Stray '=': skip it.
            s = &s[1..];
            continue;
        }
        let key = s[..key_len].to_ascii_lowercase();
        s = s[key_len..].trim_start();

        let value = if let Some(after_eq) = s.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let quote = after_eq.chars().next().filter(|c| *c == '"' || *c == '\'');
            match quote {
                Some(q) => {
                    let body = &after_eq[1..];
                    let close = body.find(q).unwrap_or(body.len());
                    s = body.get(close + 1..).unwrap_or("");
                    decode_entities(&body[..close])
                }
                None => {
                    let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                    s = &after_eq[end..];
                    decode_entities(&after_eq[..end])
                }
            }
        } else {
            String::new()
        };
        attrs.push((key, value));
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_tags_and_text() {
        let tokens = tokenize("<div class=\"a b\">Hi &amp; bye<br></div>");
        assert_eq!(tokens.len(), 4);
        assert!(tokens[0].has_class("b"));
        assert_eq!(tokens[1], Token::Text("Hi & bye".to_string()));
        assert_eq!(tokens[2].tag_name(), Some("br"));
        assert_eq!(
            tokens[3],
            Token::Close {
                name: "div".to_string()
            }
        );
    }

    #[test]
    fn parses_single_quoted_and_bare_attributes() {
        let tokens = tokenize("<span data-col=3 title='x y' hidden>");
        assert_eq!(tokens[0].attr("data-col"), Some("3"));
        assert_eq!(tokens[0].attr("title"), Some("x y"));
        assert_eq!(tokens[0].attr("hidden"), Some(""));
    }

    #[test]
    fn self_closing_tag() {
        let tokens = tokenize("a<br/>b");
        assert!(matches!(
            &tokens[1],
            Token::Open { name, self_closing: true, .. } if name == "br"
        ));
    }

    #[test]
    fn skips_comments() {
        let tokens = tokenize("a<!-- hidden <b> -->b");
        assert_eq!(
            tokens,
            vec![Token::Text("a".to_string()), Token::Text("b".to_string())]
        );
    }

    #[test]
    fn stray_angle_bracket_is_text() {
        let tokens = tokenize("3 < 4 and 5 > 2");
        assert_eq!(tokens, vec![Token::Text("3 < 4 and 5 > 2".to_string())]);
    }

    #[test]
    fn decodes_numeric_references() {
        assert_eq!(decode_entities("&#65;&#x42;&nbsp;"), "AB\u{a0}");
        assert_eq!(decode_entities("AT&T"), "AT&T");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
    }
}
