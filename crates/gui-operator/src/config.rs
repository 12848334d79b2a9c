//! Operator configuration.
//!
//! Defaults suit an unattended headless run. Every value can be overridden from
//! `GUI_OPERATOR_*` environment variables with [`OperatorConfig::from_env`].

use gui_action::ScreenContext;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 800;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub device_scale_factor: f64,
    pub headless: bool,
    /// Browser binary; `None` lets the backend discover one.
    pub chrome_executable: Option<PathBuf>,
    /// Appended after the fixed launch flags.
    pub extra_browser_args: Vec<String>,
    /// Pause between pointer movement and the following press.
    pub settle_delay_ms: u64,
    /// Length of the `wait` action.
    pub wait_duration_ms: u64,
    /// Scroll distance as a share of the viewport dimension.
    pub scroll_ratio: f64,
    /// Wheel ticks per desktop scroll action.
    pub wheel_ticks: i64,
    pub navigation_timeout_ms: u64,
    /// Fail unsupported actions instead of treating them as no-ops.
    pub strict_actions: bool,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            device_scale_factor: 1.0,
            headless: true,
            chrome_executable: None,
            extra_browser_args: Vec::new(),
            settle_delay_ms: 150,
            wait_duration_ms: 5_000,
            scroll_ratio: 0.8,
            wheel_ticks: 5,
            navigation_timeout_ms: 30_000,
            strict_actions: false,
        }
    }
}

fn env_value<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("[config] ignoring {}={:?}: not a valid value", name, raw);
            None
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let raw = env::var(name).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            warn!("[config] ignoring {}={:?}: expected a boolean", name, raw);
            None
        }
    }
}

impl OperatorConfig {
    /// Defaults overridden by any `GUI_OPERATOR_*` variables that parse.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_value("GUI_OPERATOR_VIEWPORT_WIDTH") {
            config.viewport_width = v;
        }
        if let Some(v) = env_value("GUI_OPERATOR_VIEWPORT_HEIGHT") {
            config.viewport_height = v;
        }
        if let Some(v) = env_value("GUI_OPERATOR_SCALE_FACTOR") {
            config.device_scale_factor = v;
        }
        if let Some(v) = env_flag("GUI_OPERATOR_HEADLESS") {
            config.headless = v;
        }
        if let Ok(path) = env::var("GUI_OPERATOR_CHROME_PATH") {
            if !path.trim().is_empty() {
                config.chrome_executable = Some(PathBuf::from(path.trim()));
            }
        }
        if let Some(v) = env_value("GUI_OPERATOR_SETTLE_MS") {
            config.settle_delay_ms = v;
        }
        if let Some(v) = env_value("GUI_OPERATOR_WAIT_MS") {
            config.wait_duration_ms = v;
        }
        if let Some(v) = env_flag("GUI_OPERATOR_STRICT") {
            config.strict_actions = v;
        }
        config
    }

    /// No delays; for tests and replay.
    pub fn immediate() -> Self {
        Self {
            settle_delay_ms: 0,
            wait_duration_ms: 0,
            ..Self::default()
        }
    }

    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    pub fn with_strict_actions(mut self, strict: bool) -> Self {
        self.strict_actions = strict;
        self
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn wait_duration(&self) -> Duration {
        Duration::from_millis(self.wait_duration_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    /// The screen context implied by the configured viewport, in device pixels.
    pub fn screen_context(&self) -> ScreenContext {
        let scale = if self.device_scale_factor > 0.0 {
            self.device_scale_factor
        } else {
            1.0
        };
        ScreenContext::new(
            self.viewport_width as f64 * scale,
            self.viewport_height as f64 * scale,
            scale,
        )
    }
}
