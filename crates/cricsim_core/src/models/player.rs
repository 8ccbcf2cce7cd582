//! Player model and bowling-style classification.
//!
//! Styles are carried as the descriptive strings the frequency tables are
//! keyed by (e.g. "Right arm Fast-medium F", "Legbreak googly S"); a classified
//! bowling style ends in `F` (pace) or `S` (spin) and that trailing letter
//! selects the style bucket used throughout the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse bowling-style bucket: pace (`F`) or spin (`S`).
///
/// Used as the conditioning key for bowling distributions, extras rates and
/// dismissal-mode tables.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum StyleClass {
    #[serde(rename = "F")]
    Fast,
    #[serde(rename = "S")]
    Spin,
}

impl StyleClass {
    /// Classify a descriptive bowling-style string by its trailing letter.
    pub fn from_style(style: &str) -> Option<StyleClass> {
        if style.ends_with('F') {
            Some(StyleClass::Fast)
        } else if style.ends_with('S') {
            Some(StyleClass::Spin)
        } else {
            None
        }
    }

    pub fn code(&self) -> char {
        match self {
            StyleClass::Fast => 'F',
            StyleClass::Spin => 'S',
        }
    }
}

impl fmt::Display for StyleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One member of a starting XI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    /// Free-form role description; a role containing "keeper" marks the
    /// designated wicket-keeper.
    pub role: String,
    pub batting_style: String,
    /// Classified bowling style, if the player bowls at all. `None` means the
    /// player is never eligible to bowl, not even part-time.
    #[serde(default)]
    pub bowling_style: Option<String>,
}

impl Player {
    pub fn is_keeper(&self) -> bool {
        self.role.to_ascii_lowercase().contains("keeper")
    }

    pub fn bowling_class(&self) -> Option<StyleClass> {
        self.bowling_style.as_deref().and_then(StyleClass::from_style)
    }

    /// Whether the player can be pressed into bowling at all.
    pub fn can_bowl(&self) -> bool {
        self.bowling_style.is_some()
    }
}
