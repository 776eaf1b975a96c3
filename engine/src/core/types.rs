//! Capforge Core Type Definitions
//!
//! Defines fundamental types used throughout the project.
//! Public types derive `specta::Type` for front-end bindings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::warn;

use super::{CoreError, ValidationError};

// =============================================================================
// ID Types
// =============================================================================

/// Template unique identifier (ULID), assigned by the template store
pub type TemplateId = String;

/// Element identifier, unique within one template
pub type ElementId = u32;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

// =============================================================================
// Aspect Ratio
// =============================================================================

/// Canvas aspect ratio of a template
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
pub enum AspectRatio {
    /// Vertical short-form (TikTok, Reels, Shorts)
    #[default]
    #[serde(rename = "9:16")]
    Vertical,
    /// Horizontal
    #[serde(rename = "16:9")]
    Horizontal,
    /// Square
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    /// All supported ratios, in display order
    pub const ALL: [AspectRatio; 3] = [
        AspectRatio::Vertical,
        AspectRatio::Horizontal,
        AspectRatio::Square,
    ];

    /// Returns the `W:H` label used in documents and UI
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Vertical => "9:16",
            AspectRatio::Horizontal => "16:9",
            AspectRatio::Square => "1:1",
        }
    }

    /// Returns (width, height) ratio terms
    pub fn terms(&self) -> (u32, u32) {
        match self {
            AspectRatio::Vertical => (9, 16),
            AspectRatio::Horizontal => (16, 9),
            AspectRatio::Square => (1, 1),
        }
    }

    /// Width divided by height
    pub fn as_f64(&self) -> f64 {
        let (w, h) = self.terms();
        w as f64 / h as f64
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self, AspectRatio::Vertical)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        AspectRatio::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s)
            .ok_or_else(|| CoreError::InvalidAspectRatio(s.to_string()))
    }
}

// =============================================================================
// Input Coercion
// =============================================================================

/// Parses the leading integer of `input` the way a browser `parseInt` does:
/// leading whitespace, an optional sign, then decimal digits. Anything after
/// the digits is ignored (`"12.7s"` parses as 12).
pub fn parse_int_prefix(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits_len == 0 {
        return None;
    }

    // Saturate instead of failing on absurdly long digit runs.
    let magnitude = rest[..digits_len].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Parses a positive integer field from raw user input.
///
/// Zero, negative values and non-numeric input are all rejected, matching the
/// `parseInt(value) || default` idiom the editor inputs follow.
pub fn parse_numeric_input(field: &'static str, input: &str) -> Result<u32, ValidationError> {
    match parse_int_prefix(input) {
        Some(value) if value > 0 => Ok(u32::try_from(value).unwrap_or(u32::MAX)),
        _ => Err(ValidationError::InvalidNumeric {
            field,
            input: input.to_string(),
        }),
    }
}

/// Like [`parse_numeric_input`] but silently falls back to `fallback`.
pub fn numeric_input_or(field: &'static str, input: &str, fallback: u32) -> u32 {
    match parse_numeric_input(field, input) {
        Ok(value) => value,
        Err(e) => {
            warn!("{}; using default {}", e, fallback);
            fallback
        }
    }
}

/// Returns true for `#RGB` or `#RRGGBB` hex strings.
pub fn is_hex_color(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.first() != Some(&b'#') || !(bytes.len() == 4 || bytes.len() == 7) {
        return false;
    }
    bytes[1..].iter().all(|b| b.is_ascii_hexdigit())
}
