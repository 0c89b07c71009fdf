//! Styled text spans handed to the terminal writer.
//!
//! A `Span` is the unit every renderer produces: a run of text plus an
//! optional foreground color. Colored spans are bold. Whether color reaches
//! the terminal is decided once by the writer, so renderers always attach
//! their intended color.

use crossterm::style::{Attribute, Color, ContentStyle};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub color: Option<Color>,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Terminal style for this span, `None` when it prints plain.
    pub fn content_style(&self, color_enabled: bool) -> Option<ContentStyle> {
        let color = self.color.filter(|_| color_enabled)?;
        let mut style = ContentStyle::new();
        style.foreground_color = Some(color);
        style.attributes.set(Attribute::Bold);
        Some(style)
    }
}

/// Concatenate span texts without styling.
pub fn plain_text(spans: &[Span]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect()
}
