use thiserror::Error;

/// Failure to turn a coordinate input into pixels.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("no usable coordinate representation for {0}")]
    Missing(&'static str),
    #[error("malformed box notation '{0}': expected 2 or 4 numbers")]
    Malformed(String),
    #[error("invalid coordinate factors ({0}, {1}): both must be positive")]
    InvalidFactors(f64, f64),
}

/// A key name with no entry in the key table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Unknown key '{name}'. Valid: enter, tab, escape, backspace, delete, space, \
     up/down/left/right, home, end, pageup, pagedown, f1-f24, single characters, \
     or modifiers (ctrl, alt, shift, meta)"
)]
pub struct UnknownKey {
    pub name: String,
}

impl UnknownKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A parsed prediction that cannot be executed as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown action type '{0}'")]
    UnknownAction(String),
    #[error("{action} requires {field}")]
    MissingInput {
        action: &'static str,
        field: &'static str,
    },
}
