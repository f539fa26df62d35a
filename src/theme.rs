//! Colors for CLI output.
//!
//! Plain ANSI escapes. Coloring is skipped when stdout is not a terminal so
//! piped output and test assertions see plain text.

/// ANSI foreground colors used by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Cyan,
    Gray,
    DarkGray,
}

impl Color {
    fn code(self) -> &'static str {
        match self {
            Color::Red => "\x1b[31m",
            Color::Green => "\x1b[32m",
            Color::Yellow => "\x1b[33m",
            Color::Cyan => "\x1b[36m",
            Color::Gray => "\x1b[37m",
            Color::DarkGray => "\x1b[90m",
        }
    }
}

const ANSI_RESET: &str = "\x1b[0m";

#[derive(Debug, Clone)]
pub struct Theme {
    pub text_primary: Color,
    pub text_secondary: Color,
    /// Narrated text and prompts
    pub accent: Color,
    pub error: Color,
    pub success: Color,
    enabled: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text_primary: Color::Gray,
            text_secondary: Color::DarkGray,
            accent: Color::Cyan,
            error: Color::Red,
            success: Color::Green,
            enabled: true,
        }
    }
}

impl Theme {
    /// Same colors, but every helper returns the text unchanged.
    pub fn plain() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    fn paint(&self, color: Color, text: &str) -> String {
        if self.enabled {
            format!("{}{}{}", color.code(), text, ANSI_RESET)
        } else {
            text.to_string()
        }
    }

    pub fn primary_text(&self, text: &str) -> String {
        self.paint(self.text_primary, text)
    }

    pub fn secondary_text(&self, text: &str) -> String {
        self.paint(self.text_secondary, text)
    }

    pub fn accent_text(&self, text: &str) -> String {
        self.paint(self.accent, text)
    }

    pub fn error_text(&self, text: &str) -> String {
        self.paint(self.error, text)
    }

    pub fn success_text(&self, text: &str) -> String {
        self.paint(self.success, text)
    }

    /// Green `+ ` prefixed line, for config diffs.
    pub fn added_line(&self, line: &str) -> String {
        self.paint(Color::Green, &format!("+ {line}"))
    }
}

/// Theme for the current process: colored only on a terminal.
pub fn current_theme() -> Theme {
    if atty::is(atty::Stream::Stdout) {
        Theme::default()
    } else {
        Theme::plain()
    }
}
