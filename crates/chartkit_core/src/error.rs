use thiserror::Error;

/// Failure to parse a `#rrggbb` / `#rrggbbaa` color string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color `{0}` must start with '#'")]
    MissingHash(String),

    #[error("color must have 6 or 8 hex digits, found {0}")]
    Length(usize),

    #[error("invalid hex digits in color: {0}")]
    Digits(String),
}
