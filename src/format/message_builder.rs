use std::fmt::Write;

use crate::format::colors::{Color, COLOR};

/// Builds a single IRC line.
///
/// Text written through [`std::fmt::Write`] is considered untrusted: control characters are
/// replaced so that payload content can neither start a new protocol line nor mess with the
/// formatting added by the builder itself.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    text: String,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn build(self) -> String {
        self.text
    }

    /// Writes `text` wrapped in the given color, or as-is without one.
    pub fn color(&mut self, text: &str, color: Option<Color>) {
        match color {
            Some(color) => {
                write!(self.text, "{}{:02}", COLOR, color.code()).unwrap();
                self.write_str(text).unwrap();
                self.text.push(COLOR);
            }
            None => self.write_str(text).unwrap(),
        }
    }

    pub fn tag(&mut self, tag: &str, color: Option<Color>) {
        self.text.push('[');
        self.color(tag, color);
        self.text.push(']');
    }
}

impl std::fmt::Write for MessageBuilder {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        let mut last = 0;
        for (i, c) in s.char_indices() {
            if !c.is_control() {
                continue;
            }

            self.text.push_str(&s[last..i]);
            self.text.push(' ');
            last = i + c.len_utf8();
        }

        if last < s.len() {
            self.text.push_str(&s[last..]);
        }

        Ok(())
    }
}
