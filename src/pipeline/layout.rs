//! Badge text layout: which strings go where, at what size.
//!
//! This stage is pure. It turns an [`AttendeeRecord`] into a list of
//! [`TextLine`]s (text, font size, weight, baseline) relative to the canvas
//! height; [`crate::pipeline::render`] only has to rasterise them.

use crate::config::WrapMode;
use crate::pipeline::extract::AttendeeRecord;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Strings shorter than this many characters are never split.
pub const SPLIT_THRESHOLD: usize = 30;

/// Result of [`split_long_line`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitLine {
    pub first: String,
    pub second: String,
    /// Characters lost because no space was found after the midpoint.
    pub dropped: usize,
}

/// Split a long string in two at the first space at or after its midpoint.
///
/// * fewer than 30 characters → `(s, "")`
/// * otherwise the first space at character index ≥ `len / 2` separates the
///   two lines and is itself removed
/// * with no such space only the first half is kept and the rest is dropped;
///   `dropped` reports how many characters were lost
pub fn split_long_line(s: &str) -> SplitLine {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();

    if len < SPLIT_THRESHOLD {
        return SplitLine {
            first: s.to_string(),
            second: String::new(),
            dropped: 0,
        };
    }

    let mid = len / 2;
    match (mid..len).find(|&i| chars[i] == ' ') {
        Some(pos) => SplitLine {
            first: chars[..pos].iter().collect(),
            second: chars[pos + 1..].iter().collect(),
            dropped: 0,
        },
        None => SplitLine {
            first: chars[..mid].iter().collect(),
            second: String::new(),
            dropped: len - mid,
        },
    }
}

/// Font size, weight and vertical position of one text field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Em size in pixels.
    pub size_px: f32,
    pub bold: bool,
    /// Baseline of the (first) line as a percentage of canvas height.
    pub baseline_pct: f32,
    /// Baseline of the second line when the field is split.
    pub second_baseline_pct: Option<f32>,
}

/// Fixed layout of a badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeTemplate {
    pub background: [u8; 3],
    pub text_color: [u8; 3],
    pub name: TextStyle,
    pub surname: TextStyle,
    pub organization: TextStyle,
    pub role: TextStyle,
    pub wrap: WrapMode,
}

impl Default for BadgeTemplate {
    fn default() -> Self {
        Self::for_wrap_mode(WrapMode::Split)
    }
}

impl BadgeTemplate {
    /// The standard badge layout for the given wrap mode.
    pub fn for_wrap_mode(wrap: WrapMode) -> Self {
        let (organization, role) = match wrap {
            WrapMode::Split => (
                TextStyle {
                    size_px: 60.0,
                    bold: false,
                    baseline_pct: 57.0,
                    second_baseline_pct: Some(63.0),
                },
                TextStyle {
                    size_px: 55.0,
                    bold: false,
                    baseline_pct: 82.0,
                    second_baseline_pct: Some(88.0),
                },
            ),
            WrapMode::SingleLine => (
                TextStyle {
                    size_px: 60.0,
                    bold: false,
                    baseline_pct: 60.0,
                    second_baseline_pct: None,
                },
                TextStyle {
                    size_px: 55.0,
                    bold: false,
                    baseline_pct: 85.0,
                    second_baseline_pct: None,
                },
            ),
        };

        Self {
            background: [0xff, 0xff, 0xff],
            text_color: [0x00, 0x00, 0x00],
            name: TextStyle {
                size_px: 130.0,
                bold: true,
                baseline_pct: 30.0,
                second_baseline_pct: None,
            },
            surname: TextStyle {
                size_px: 90.0,
                bold: true,
                baseline_pct: 45.0,
                second_baseline_pct: None,
            },
            organization,
            role,
            wrap,
        }
    }
}

/// One line of text to draw, horizontally centred at `baseline_y`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub size_px: f32,
    pub bold: bool,
    pub baseline_y: f32,
}

/// Lay out the four fields of `record` on a canvas `height` pixels tall.
///
/// Empty strings are omitted, since drawing them would be a no-op.
pub fn badge_lines(record: &AttendeeRecord, template: &BadgeTemplate, height: u32) -> Vec<TextLine> {
    let at = |pct: f32| height as f32 / 100.0 * pct;
    let mut lines = Vec::with_capacity(6);

    let mut push = |text: String, style: &TextStyle, pct: f32| {
        if !text.is_empty() {
            lines.push(TextLine {
                text,
                size_px: style.size_px,
                bold: style.bold,
                baseline_y: at(pct),
            });
        }
    };

    push(record.name.to_uppercase(), &template.name, template.name.baseline_pct);
    push(
        record.surname.to_uppercase(),
        &template.surname,
        template.surname.baseline_pct,
    );

    for (label, value, style) in [
        ("organization", &record.organization, &template.organization),
        ("role", &record.role, &template.role),
    ] {
        match style.second_baseline_pct {
            Some(second_pct) => {
                let split = split_long_line(value);
                if split.dropped > 0 {
                    warn!(
                        "{} '{}' has no space after its midpoint; {} trailing characters dropped",
                        label, value, split.dropped
                    );
                }
                push(split.first, style, style.baseline_pct);
                push(split.second, style, second_pct);
            }
            None => push(value.clone(), style, style.baseline_pct),
        }
    }

    lines
}
