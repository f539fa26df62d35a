//! Mapping from VM style names to display classes.

use once_cell::sync::Lazy;
use regex::Regex;

use super::escape::escape_into;
use crate::protocol::Run;

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid regex"));

/// Display class for a VM style name. Unknown styles render as normal text.
pub fn style_class(style: &str) -> &'static str {
    match style {
        "emphasized" => "s-emphasized",
        "preformatted" => "s-preformatted",
        "header" => "s-header",
        "subheader" => "s-subheader",
        "alert" => "s-alert",
        "note" => "s-note",
        "blockquote" => "s-blockquote",
        "input" => "s-input",
        "user1" => "s-user1",
        "user2" => "s-user2",
        _ => "s-normal",
    }
}

fn valid_color(color: &Option<String>) -> Option<&str> {
    color.as_deref().filter(|c| HEX_COLOR.is_match(c))
}

/// Inline color declarations for a run, if it carries valid `#rrggbb` colors.
fn color_style(run: &Run) -> Option<String> {
    let mut decls = Vec::new();
    if let Some(fg) = valid_color(&run.fg) {
        decls.push(format!("color:{}", fg));
    }
    if let Some(bg) = valid_color(&run.bg) {
        decls.push(format!("background-color:{}", bg));
    }
    if decls.is_empty() {
        None
    } else {
        Some(decls.join(";"))
    }
}

/// Append a styled span for `text` using the style of `run`.
///
/// `extra` is appended verbatim to the attribute list (already escaped).
pub fn push_span(out: &mut String, run: &Run, text: &str, extra: Option<&str>) {
    out.push_str("<span class=\"");
    out.push_str(style_class(&run.style));
    out.push('"');
    if let Some(extra) = extra {
        out.push(' ');
        out.push_str(extra);
    }
    if let Some(colors) = color_style(run) {
        out.push_str(" style=\"");
        out.push_str(&colors);
        out.push('"');
    }
    out.push('>');
    escape_into(text, out);
    out.push_str("</span>");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_styles() {
        assert_eq!(style_class("emphasized"), "s-emphasized");
        assert_eq!(style_class("header"), "s-header");
        assert_eq!(style_class("normal"), "s-normal");
    }

    #[test]
    fn unknown_style_is_normal() {
        assert_eq!(style_class("sparkly"), "s-normal");
    }

    #[test]
    fn invalid_colors_are_dropped() {
        let mut run = Run::new("normal", "x");
        run.fg = Some("red; background:url(evil)".to_string());
        run.bg = Some("#00ff00".to_string());
        let mut out = String::new();
        push_span(&mut out, &run, "x", None);
        assert_eq!(
            out,
            "<span class=\"s-normal\" style=\"background-color:#00ff00\">x</span>"
        );
    }
}
