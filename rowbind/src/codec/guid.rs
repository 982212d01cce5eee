//! GUID text layouts.
//!
//! Four layouts are read: 32 bare hex digits (`N`), hyphenated 8-4-4-4-12
//! (`D`), and the hyphenated form wrapped in braces (`B`) or parentheses
//! (`P`). The layout is picked from the byte at index 8 and the leading
//! delimiter; GUIDs are always written as lower-case `D`.

use thiserror::Error;
use uuid::Uuid;

/// A textual GUID layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuidLayout {
    /// `00000000000000000000000000000000`
    Digits,
    /// `00000000-0000-0000-0000-000000000000`
    Hyphenated,
    /// `{00000000-0000-0000-0000-000000000000}`
    Braced,
    /// `(00000000-0000-0000-0000-000000000000)`
    Parenthesized,
}

impl GuidLayout {
    /// Exact text length of the layout.
    #[must_use]
    pub const fn text_len(self) -> usize {
        match self {
            Self::Digits => 32,
            Self::Hyphenated => 36,
            Self::Braced | Self::Parenthesized => 38,
        }
    }

    /// Picks the layout of `text` without validating it.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        let bytes = text.as_bytes();
        if bytes.get(8) == Some(&b'-') {
            return Self::Hyphenated;
        }
        match bytes.first() {
            Some(b'{') => Self::Braced,
            Some(b'(') => Self::Parenthesized,
            _ => Self::Digits,
        }
    }

    /// Renders `guid` in this layout.
    #[must_use]
    pub fn format(self, guid: &Uuid) -> String {
        match self {
            Self::Digits => guid.simple().to_string(),
            Self::Hyphenated => guid.hyphenated().to_string(),
            Self::Braced => guid.braced().to_string(),
            Self::Parenthesized => format!("({})", guid.hyphenated()),
        }
    }
}

/// GUID text could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {layout:?} GUID `{text}`")]
pub struct GuidError {
    /// Layout the text was read as.
    pub layout: GuidLayout,
    /// The rejected text.
    pub text: String,
}

/// Parses GUID text in any of the four layouts. Surrounding whitespace is
/// ignored and hex digits may be upper or lower case.
pub fn parse(text: &str) -> Result<Uuid, GuidError> {
    let text = text.trim();
    let layout = GuidLayout::detect(text);
    let fail = || GuidError {
        layout,
        text: text.to_owned(),
    };
    if text.len() != layout.text_len() {
        return Err(fail());
    }

    let core = match layout {
        GuidLayout::Digits | GuidLayout::Hyphenated => text,
        GuidLayout::Braced => text
            .strip_prefix('{')
            .and_then(|t| t.strip_suffix('}'))
            .ok_or_else(fail)?,
        GuidLayout::Parenthesized => text
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .ok_or_else(fail)?,
    };
    if layout != GuidLayout::Digits && GuidLayout::detect(core) != GuidLayout::Hyphenated {
        return Err(fail());
    }
    Uuid::try_parse(core).map_err(|_| fail())
}
