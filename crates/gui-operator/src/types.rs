//! Values exchanged with the orchestration layer.

use gui_action::{Factors, PredictionParsed, ResolveContext, ScreenContext};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Everything an operator needs to execute one parsed action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteParams {
    /// Raw model text the prediction was parsed from; kept for logging.
    pub prediction: String,
    pub parsed_prediction: PredictionParsed,
    /// Size of the screenshot the model saw. Zero means "use the operator's own context".
    pub screen_width: f64,
    pub screen_height: f64,
    pub scale_factor: f64,
    /// Model grid denominators for box strings.
    pub factors: Factors,
    /// Checked before dispatch and polled by `wait`.
    #[serde(skip)]
    pub abort_signal: Option<CancellationToken>,
}

impl ExecuteParams {
    pub fn new(
        parsed_prediction: PredictionParsed,
        screen: ScreenContext,
        factors: Factors,
    ) -> Self {
        Self {
            prediction: gui_action::serialize(&parsed_prediction),
            parsed_prediction,
            screen_width: screen.width,
            screen_height: screen.height,
            scale_factor: screen.scale_factor,
            factors,
            abort_signal: None,
        }
    }

    pub fn with_abort_signal(mut self, signal: CancellationToken) -> Self {
        self.abort_signal = Some(signal);
        self
    }

    pub fn is_aborted(&self) -> bool {
        self.abort_signal
            .as_ref()
            .map(|s| s.is_cancelled())
            .unwrap_or(false)
    }

    /// Screen the model's coordinates refer to, or `fallback` if none was supplied.
    pub fn screen_context(&self, fallback: ScreenContext) -> ScreenContext {
        if self.screen_width > 0.0 && self.screen_height > 0.0 {
            let scale = if self.scale_factor > 0.0 {
                self.scale_factor
            } else {
                fallback.scale_factor
            };
            ScreenContext::new(self.screen_width, self.screen_height, scale)
        } else {
            fallback
        }
    }

    /// Box strings scale against the caller's screen, normalized coordinates
    /// against `runtime`, the operator's own surface.
    pub fn resolve_context(&self, runtime: ScreenContext) -> ResolveContext {
        ResolveContext::new(self.screen_context(runtime), Some(self.factors))
            .with_runtime(runtime)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecuteStatus {
    Success,
    Failed,
}

impl fmt::Display for ExecuteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecuteStatus::Success => f.write_str("success"),
            ExecuteStatus::Failed => f.write_str("failed"),
        }
    }
}

/// Outcome of one action. Always returned, never thrown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteOutput {
    pub status: ExecuteStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ExecuteOutput {
    pub fn success() -> Self {
        Self {
            status: ExecuteStatus::Success,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: ExecuteStatus::Failed,
            error_message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecuteStatus::Success
    }
}

/// Captured surface. An empty `base64` with success status means capture is
/// unsupported by the backend, not that it failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotOutput {
    pub status: ExecuteStatus,
    pub base64: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub scale_factor: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ScreenshotOutput {
    pub fn captured(base64: String, url: Option<String>, scale_factor: f64) -> Self {
        Self {
            status: ExecuteStatus::Success,
            base64,
            url,
            scale_factor,
            error_message: None,
        }
    }

    pub fn unsupported(scale_factor: f64) -> Self {
        Self::captured(String::new(), None, scale_factor)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: ExecuteStatus::Failed,
            base64: String::new(),
            url: None,
            scale_factor: 1.0,
            error_message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecuteStatus::Success
    }
}

/// Action call syntax an operator understands, for the prompting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorManual {
    #[serde(rename = "ACTION_SPACES")]
    pub action_spaces: Vec<String>,
    #[serde(rename = "EXAMPLES", default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn parse(value: &str) -> Option<ScrollDirection> {
        match value.trim().to_ascii_lowercase().as_str() {
            "up" => Some(ScrollDirection::Up),
            "down" => Some(ScrollDirection::Down),
            "left" => Some(ScrollDirection::Left),
            "right" => Some(ScrollDirection::Right),
            _ => None,
        }
    }

    /// Unit vector in screen axes (y grows downwards).
    pub fn unit(&self) -> (f64, f64) {
        match self {
            ScrollDirection::Up => (0.0, -1.0),
            ScrollDirection::Down => (0.0, 1.0),
            ScrollDirection::Left => (-1.0, 0.0),
            ScrollDirection::Right => (1.0, 0.0),
        }
    }
}
