use gui_action::{CoordinateError, UnknownKey};
use thiserror::Error;

/// Everything that can go wrong while initializing an operator or executing an action.
///
/// None of these cross the public `do_*` entry points; they are turned into
/// failed [`ExecuteOutput`](crate::ExecuteOutput) / [`ScreenshotOutput`](crate::ScreenshotOutput)
/// values whose message is this error's `Display`.
#[derive(Debug, Error)]
pub enum OperatorError {
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),

    #[error(transparent)]
    UnknownKey(#[from] UnknownKey),

    #[error("{action} requires {field}")]
    MissingInput {
        action: &'static str,
        field: &'static str,
    },

    #[error("invalid {field} '{value}' for {action}")]
    InvalidInput {
        action: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("backend not ready: {0}")]
    BackendNotReady(String),

    #[error("initialization failed: {0}")]
    Initialization(String),

    #[error("unsupported action '{0}'")]
    Unsupported(String),

    #[error("action aborted")]
    Aborted,

    /// Failure reported by the backend itself (browser crash, input subsystem error).
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl OperatorError {
    pub fn missing(action: &'static str, field: &'static str) -> Self {
        OperatorError::MissingInput { action, field }
    }
}

pub type Result<T, E = OperatorError> = std::result::Result<T, E>;
