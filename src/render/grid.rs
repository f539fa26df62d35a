//! Multi-row grid rendering (upper window).
//!
//! Upper windows carry quotations, maps and ASCII art whose meaning depends on
//! column alignment, so every run is emitted with its starting column.

use std::collections::BTreeMap;

use unicode_width::UnicodeWidthStr;

use super::style::push_span;
use super::RenderedWindow;
use crate::protocol::Run;
use crate::screen::Zone;

/// A grid row: blank rows are grouped so that spacing survives rendering.
#[derive(Debug, PartialEq, Eq)]
enum Row<'a> {
    Text(Vec<&'a Run>),
    Blank(usize),
}

fn is_blank(runs: &[Run]) -> bool {
    runs.iter().all(|r| r.text.trim().is_empty())
}

/// Group rows, merging consecutive blank rows and dropping blank rows at
/// the top and bottom of the window.
fn classify_rows(lines: &BTreeMap<u32, Vec<Run>>) -> Vec<Row<'_>> {
    let height = lines.keys().next_back().map(|l| l + 1).unwrap_or(0);
    let mut rows: Vec<Row<'_>> = Vec::new();
    for line in 0..height {
        let runs = lines.get(&line).map(Vec::as_slice).unwrap_or(&[]);
        if is_blank(runs) {
            match rows.last_mut() {
                Some(Row::Blank(n)) => *n += 1,
                Some(Row::Text(_)) => rows.push(Row::Blank(1)),
                None => {}
            }
        } else {
            rows.push(Row::Text(runs.iter().collect()));
        }
    }
    if matches!(rows.last(), Some(Row::Blank(_))) {
        rows.pop();
    }
    rows
}

/// Runs of a row with trailing padding removed.
fn trimmed_runs<'a>(runs: &[&'a Run]) -> Vec<(&'a Run, &'a str)> {
    let mut out: Vec<(&'a Run, &'a str)> = runs
        .iter()
        .map(|r| {
            let run: &'a Run = *r;
            (run, run.text.as_str())
        })
        .collect();
    while let Some(&(run, text)) = out.last() {
        out.pop();
        let trimmed = text.trim_end();
        if !trimmed.is_empty() {
            out.push((run, trimmed));
            break;
        }
    }
    out
}

/// Render a multi-row grid. `lines` holds every known row by line number.
pub fn render_grid(window: u32, lines: &BTreeMap<u32, Vec<Run>>) -> RenderedWindow {
    let mut html = String::from("<div class=\"grid-block\">");
    let mut plain_rows: Vec<String> = Vec::new();

    for row in classify_rows(lines) {
        match row {
            Row::Blank(1) => {
                html.push_str("<div class=\"spacer grid-blank\"></div>");
                plain_rows.push(String::new());
            }
            Row::Blank(n) => {
                html.push_str(&format!(
                    "<div class=\"spacer grid-gap\" data-rows=\"{}\"></div>",
                    n
                ));
                plain_rows.extend(std::iter::repeat(String::new()).take(n));
            }
            Row::Text(runs) => {
                html.push_str("<div class=\"grid-row\">");
                let mut col = 0usize;
                let mut plain = String::new();
                for (run, text) in trimmed_runs(&runs) {
                    if !text.is_empty() {
                        let attr = format!("data-col=\"{}\"", col);
                        push_span(&mut html, run, text, Some(&attr));
                    }
                    col += text.width();
                    plain.push_str(text);
                }
                html.push_str("</div>");
                plain_rows.push(plain);
            }
        }
    }
    html.push_str("</div>");

    RenderedWindow {
        window,
        zone: Zone::Upper,
        html,
        plain: plain_rows.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(rows: &[(u32, &str)]) -> BTreeMap<u32, Vec<Run>> {
        rows.iter()
            .map(|(n, text)| (*n, vec![Run::new("normal", *text)]))
            .collect()
    }

    #[test]
    fn runs_carry_their_starting_column() {
        let mut grid = BTreeMap::new();
        grid.insert(
            0,
            vec![Run::new("normal", "  N  "), Run::new("emphasized", "*")],
        );
        let rendered = render_grid(3, &grid);
        assert!(rendered.html.contains("data-col=\"0\">  N  </span>"));
        assert!(rendered.html.contains("data-col=\"5\">*</span>"));
    }

    #[test]
    fn wide_characters_advance_two_columns() {
        let mut grid = BTreeMap::new();
        grid.insert(0, vec![Run::new("normal", "城"), Run::new("normal", "x")]);
        let rendered = render_grid(3, &grid);
        assert!(rendered.html.contains("data-col=\"2\">x</span>"));
    }

    #[test]
    fn blank_rows_are_grouped() {
        let grid = lines(&[
            (0, "\"Quote\""),
            (1, "   "),
            (2, "first"),
            (3, ""),
            (4, " "),
            (5, "   -- Author"),
            (6, "       "),
        ]);
        let rendered = render_grid(3, &grid);
        assert!(rendered.html.contains("<div class=\"spacer grid-blank\"></div>"));
        assert!(rendered
            .html
            .contains("<div class=\"spacer grid-gap\" data-rows=\"2\"></div>"));
        // Trailing blank row dropped.
        assert!(rendered.html.ends_with("</div></div>"));
        assert_eq!(rendered.plain, "\"Quote\"\n\nfirst\n\n\n   -- Author");
    }

    #[test]
    fn leading_blank_rows_are_dropped() {
        let grid = lines(&[(0, "    "), (1, "text")]);
        let rendered = render_grid(3, &grid);
        assert!(!rendered.html.contains("spacer"));
        assert_eq!(rendered.plain, "text");
    }

    #[test]
    fn missing_rows_count_as_blank() {
        let grid = lines(&[(0, "top"), (3, "bottom")]);
        let rendered = render_grid(3, &grid);
        assert!(rendered.html.contains("data-rows=\"2\""));
    }
}
