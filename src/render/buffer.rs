//! Buffer window rendering (main story text).

use super::style::push_span;
use super::RenderedWindow;
use crate::protocol::{Run, TextBlock};
use crate::screen::Zone;

/// Markup for a blank paragraph. Spacers are never dropped: they carry the
/// paragraph spacing the game asked for.
pub const SPACER: &str = "<div class=\"spacer\"></div>";

#[derive(Debug)]
enum Line {
    Text(Vec<Run>),
    Blank,
}

/// Break text blocks into display lines, splitting runs on embedded newlines.
fn layout_lines(blocks: &[TextBlock]) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();

    for block in blocks {
        if block.is_blank() {
            if !block.append {
                lines.push(Line::Blank);
            }
            continue;
        }
        if !block.append || !matches!(lines.last(), Some(Line::Text(_))) {
            lines.push(Line::Text(Vec::new()));
        }
        for raw in block.content.iter().flatten() {
            let run = raw.normalize();
            for (i, piece) in run.text.split('\n').enumerate() {
                if i > 0 {
                    lines.push(Line::Text(Vec::new()));
                }
                if piece.is_empty() {
                    continue;
                }
                if let Some(Line::Text(runs)) = lines.last_mut() {
                    runs.push(Run {
                        text: piece.to_string(),
                        ..run.clone()
                    });
                }
            }
        }
    }
    lines
}

/// Render the text blocks of one buffer window update.
pub fn render_buffer(window: u32, blocks: &[TextBlock]) -> RenderedWindow {
    let mut html = String::from("<div class=\"buffer-text\">");
    let mut plain_lines: Vec<String> = Vec::new();

    for line in layout_lines(blocks) {
        match line {
            Line::Blank => {
                html.push_str(SPACER);
                plain_lines.push(String::new());
            }
            Line::Text(runs) => {
                let mut plain = String::new();
                for run in &runs {
                    push_span(&mut html, run, &run.text, None);
                    plain.push_str(&run.text);
                }
                html.push_str("<br>");
                plain_lines.push(plain);
            }
        }
    }
    html.push_str("</div>");

    RenderedWindow {
        window,
        zone: Zone::Main,
        html,
        plain: plain_lines.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RawRun;

    fn block(runs: Vec<RawRun>) -> TextBlock {
        TextBlock {
            append: false,
            content: Some(runs),
        }
    }

    fn plain(text: &str) -> RawRun {
        RawRun::Plain(text.to_string())
    }

    #[test]
    fn renders_paragraph_with_spacer() {
        let blocks = vec![
            block(vec![RawRun::Pair("header".into(), "West of House".into())]),
            block(vec![plain("You are standing in an open field.")]),
            TextBlock::default(),
            block(vec![plain(">")]),
        ];
        let rendered = render_buffer(2, &blocks);
        insta::assert_snapshot!(rendered.html, @r#"<div class="buffer-text"><span class="s-header">West of House</span><br><span class="s-normal">You are standing in an open field.</span><br><div class="spacer"></div><span class="s-normal">&gt;</span><br></div>"#);
        assert_eq!(
            rendered.plain,
            "West of House\nYou are standing in an open field.\n\n>"
        );
    }

    #[test]
    fn embedded_newlines_split_lines() {
        let blocks = vec![block(vec![plain("one\ntwo")])];
        let rendered = render_buffer(2, &blocks);
        assert_eq!(rendered.plain, "one\ntwo");
        assert_eq!(rendered.html.matches("<br>").count(), 2);
    }

    #[test]
    fn append_continues_previous_line() {
        let blocks = vec![
            block(vec![plain("Taken")]),
            TextBlock {
                append: true,
                content: Some(vec![plain(".")]),
            },
        ];
        let rendered = render_buffer(2, &blocks);
        assert_eq!(rendered.plain, "Taken.");
    }

    #[test]
    fn styled_runs_keep_their_class() {
        let blocks = vec![block(vec![
            plain("It is "),
            RawRun::Styled {
                style: Some("emphasized".into()),
                text: Some("dark".into()),
                fg: None,
                bg: None,
            },
            plain("."),
        ])];
        let rendered = render_buffer(2, &blocks);
        assert!(rendered
            .html
            .contains("<span class=\"s-emphasized\">dark</span>"));
        assert_eq!(rendered.plain, "It is dark.");
    }

    #[test]
    fn text_is_escaped() {
        let blocks = vec![block(vec![plain("<script>")])];
        let rendered = render_buffer(2, &blocks);
        assert!(rendered.html.contains("&lt;script&gt;"));
        assert!(!rendered.html.contains("<script>"));
    }
}
