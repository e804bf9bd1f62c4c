//! Dynamically typed item values.
//!
//! Data sources hand out numbers, colors and strings through one type. The
//! ordering used by minimum/maximum queries is explicit: numbers order by
//! [`f64::total_cmp`] and colors are never ordered. Text orders numerically
//! when every item of the reduction parses as a number, otherwise
//! lexicographically. A reduction that meets an unordered pair yields
//! [`Value::Invalid`] rather than guessing.

use std::cmp::Ordering;
use std::fmt;

use crate::geometry::Color;

/// Discriminant of a [`Value`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Invalid,
    Number,
    Color,
    Text,
}

/// A single data item.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Absent item: out of range index, missing data or an underivable aggregate.
    #[default]
    Invalid,
    Number(f64),
    Color(Color),
    Text(String),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Invalid => ValueKind::Invalid,
            Value::Number(_) => ValueKind::Number,
            Value::Color(_) => ValueKind::Color,
            Value::Text(_) => ValueKind::Text,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Value::Invalid)
    }

    /// Numeric view of the value. Text converts when it parses as a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Invalid | Value::Color(_) => None,
        }
    }

    /// Numeric view used by summing code paths, where missing items count as zero.
    pub fn to_f64_or_zero(&self) -> f64 {
        self.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0)
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(c) => Some(*c),
            Value::Text(s) => Color::parse_hex(s.trim()).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Empty value of the same kind, used to pad partially filled buffers.
    pub fn default_like(&self) -> Value {
        match self {
            Value::Invalid => Value::Invalid,
            Value::Number(_) => Value::Number(0.0),
            Value::Color(_) => Value::Color(Color::TRANSPARENT),
            Value::Text(_) => Value::Text(String::new()),
        }
    }

    /// Pairwise order; `None` for unordered pairs.
    ///
    /// Two texts compare numerically when both parse, so this order is not
    /// transitive over a mix of numeric and plain text (`"9" < "10" < "1a" < "9"`).
    /// [`min_of`] and [`max_of`] pick one mode for the whole sequence instead.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Some(a.total_cmp(b)),
            (Value::Text(a), Value::Text(b)) => match (self.as_f64(), other.as_f64()) {
                (Some(x), Some(y)) => Some(x.total_cmp(&y)),
                _ => Some(a.cmp(b)),
            },
            (Value::Number(_), Value::Text(_)) | (Value::Text(_), Value::Number(_)) => {
                match (self.as_f64(), other.as_f64()) {
                    (Some(x), Some(y)) => Some(x.total_cmp(&y)),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<Color> for Value {
    fn from(c: Color) -> Self {
        Value::Color(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Invalid => Ok(()),
            Value::Number(v) => write!(f, "{v}"),
            Value::Color(c) => write!(
                f,
                "#{:02x}{:02x}{:02x}",
                (c.r.clamp(0.0, 1.0) * 255.0).round() as u8,
                (c.g.clamp(0.0, 1.0) * 255.0).round() as u8,
                (c.b.clamp(0.0, 1.0) * 255.0).round() as u8
            ),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Order used when at least one item has no numeric view: numbers among
/// themselves, text lexicographically, anything else unordered.
fn lexical_compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Some(x.total_cmp(y)),
        (Value::Text(x), Value::Text(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn extreme<'a, I>(values: I, keep: Ordering) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    let valid: Vec<&Value> = values.into_iter().filter(|v| v.is_valid()).collect();
    let numeric = valid.iter().all(|v| v.as_f64().is_some());

    let mut best: Option<&Value> = None;
    for v in valid {
        best = match best {
            None => Some(v),
            Some(current) => {
                let ord = if numeric {
                    v.as_f64()
                        .zip(current.as_f64())
                        .map(|(x, y)| x.total_cmp(&y))
                } else {
                    lexical_compare(v, current)
                };
                match ord {
                    Some(ord) if ord == keep => Some(v),
                    Some(_) => Some(current),
                    None => return Value::Invalid,
                }
            }
        };
    }
    match best {
        // A lone color has no meaningful extreme either.
        Some(Value::Color(_)) | None => Value::Invalid,
        Some(v) => v.clone(),
    }
}

/// Smallest valid value, or `Invalid` if there is none or the values are unordered.
pub fn min_of<'a, I>(values: I) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    extreme(values, Ordering::Less)
}

/// Largest valid value, or `Invalid` if there is none or the values are unordered.
pub fn max_of<'a, I>(values: I) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    extreme(values, Ordering::Greater)
}
