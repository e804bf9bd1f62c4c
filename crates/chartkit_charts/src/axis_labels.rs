//! Axis label models.
//!
//! Labels are positioned along the axis in [0, 1]; the host lays out its own
//! label delegates from them.

use chartkit_core::Value;
use serde::{Deserialize, Serialize};

use crate::source::ChartDataSource;
use crate::xy::Direction;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelFormat {
    Fixed(usize),
    Compact,
}

impl Default for LabelFormat {
    fn default() -> Self {
        LabelFormat::Fixed(0)
    }
}

impl LabelFormat {
    /// Label text for an item. Non-numeric items print as they are.
    pub fn format(self, value: &Value) -> String {
        match (self, value) {
            (_, Value::Invalid) => String::new(),
            (LabelFormat::Fixed(decimals), Value::Number(v)) => fixed(*v, decimals),
            (LabelFormat::Compact, Value::Number(v)) => compact(*v),
            (_, other) => other.to_string(),
        }
    }
}

const COMPACT_SCALES: [(f64, &str); 3] = [(1e9, "B"), (1e6, "M"), (1e3, "K")];

fn non_finite(v: f64) -> Option<&'static str> {
    if v.is_nan() {
        Some("NaN")
    } else if v.is_infinite() {
        Some(if v > 0.0 { "Inf" } else { "-Inf" })
    } else {
        None
    }
}

/// `decimals` fraction digits; a value that rounds to zero never keeps its sign.
fn fixed(v: f64, decimals: usize) -> String {
    if let Some(text) = non_finite(v) {
        return text.to_string();
    }
    let text = format!("{v:.decimals$}");
    match text.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => text,
    }
}

/// Up to three fraction digits below a thousand, otherwise two digits and a
/// K, M or B suffix.
fn compact(v: f64) -> String {
    if let Some(text) = non_finite(v) {
        return text.to_string();
    }
    let (scaled, suffix, decimals) = COMPACT_SCALES
        .iter()
        .find(|(scale, _)| v.abs() >= *scale)
        .map_or((v, "", 3), |&(scale, suffix)| (v / scale, suffix, 2));
    let text = fixed(scaled, decimals);
    format!("{}{suffix}", strip_fraction_zeros(&text))
}

fn strip_fraction_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AxisLabel {
    pub index: usize,
    /// Position along the axis in [0, 1].
    pub position: f32,
    pub value: Value,
    pub text: String,
}

/// One label per item of `source`, spread evenly along the axis.
pub fn axis_labels(source: &dyn ChartDataSource, direction: Direction, format: LabelFormat) -> Vec<AxisLabel> {
    let count = source.item_count();
    (0..count)
        .map(|index| {
            let t = if count > 1 {
                index as f32 / (count - 1) as f32
            } else {
                0.0
            };
            let position = match direction {
                Direction::ZeroAtStart => t,
                Direction::ZeroAtEnd => 1.0 - t,
            };
            let value = source.item(index as isize);
            AxisLabel {
                index,
                position,
                text: format.format(&value),
                value,
            }
        })
        .collect()
}
