use std::collections::HashMap;

use serde::Deserialize;

/// The 16 standard mIRC colors, numbered as clients expect them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    White = 0,
    Black,
    Blue,
    Green,
    Red,
    Brown,
    Purple,
    Orange,
    Yellow,
    LightGreen,
    Cyan,
    LightCyan,
    LightBlue,
    Pink,
    Grey,
    LightGrey,
}

impl Color {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Color control byte. Also ends the colored run when sent without a code.
pub(crate) const COLOR: char = '\x03';

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColorTheme {
    pub repository: Option<Color>,
    pub actions: HashMap<String, Color>,
}

impl ColorTheme {
    pub fn action(&self, action: &str) -> Option<Color> {
        self.actions.get(action).copied()
    }
}

impl Default for ColorTheme {
    fn default() -> Self {
        let actions = [
            ("opened", Color::Green),
            ("closed", Color::Red),
            ("reopened", Color::Orange),
            ("created", Color::LightGreen),
        ]
        .into_iter()
        .map(|(action, color)| (action.to_owned(), color))
        .collect();

        Self {
            repository: Some(Color::Blue),
            actions,
        }
    }
}
