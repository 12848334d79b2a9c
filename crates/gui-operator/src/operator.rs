//! The operator contract shared by the browser and desktop backends.
//!
//! Backends implement the hooks (`initialize`, `screenshot`, `execute`,
//! `cleanup`, `release_backend`). Callers only use the provided entry points:
//! [`Operator::do_screenshot`] and [`Operator::do_execute`] initialize lazily
//! and translate every error into a failed result value.

use crate::config::OperatorConfig;
use crate::errors::{OperatorError, Result};
use crate::lifecycle::Lifecycle;
use crate::types::{
    ExecuteOutput, ExecuteParams, OperatorManual, ScreenshotOutput, ScrollDirection,
};
use async_trait::async_trait;
use gui_action::{
    parse_chord, resolve_end, resolve_start, ActionKind, Key, Point, ResolvedPoint, ScreenContext,
    Target,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[async_trait]
pub trait Operator: Send + Sync {
    /// Component name used as the log prefix, e.g. `browser_operator`.
    fn name(&self) -> &'static str;

    fn supported_actions(&self) -> &'static [ActionKind];

    /// Action templates offered to the model.
    fn manual(&self) -> OperatorManual {
        manual_for(self.supported_actions(), None)
    }

    fn lifecycle(&self) -> &Lifecycle;

    fn config(&self) -> &OperatorConfig;

    /// Current surface size, as last reported by the backend.
    fn screen_context(&self) -> ScreenContext;

    /// Start the backend. Called at most once per successful lifecycle.
    async fn initialize(&self) -> Result<()>;

    async fn screenshot(&self) -> Result<ScreenshotOutput>;

    /// Run one supported, non-terminal action.
    async fn execute(&self, action: ActionKind, params: &ExecuteParams) -> Result<()>;

    /// Release transient resources (a page) and keep the backend alive.
    async fn cleanup(&self) -> Result<()>;

    /// Shut the backend itself down.
    async fn release_backend(&self) -> Result<()>;

    fn supports(&self, action: ActionKind) -> bool {
        self.supported_actions().contains(&action)
    }

    async fn ensure_initialized(&self) -> Result<()> {
        self.lifecycle().ensure(self.initialize()).await
    }

    async fn do_initialize(&self) -> Result<()> {
        info!("[{}] initializing", self.name());
        self.ensure_initialized().await.map_err(|e| {
            error!("[{}] initialization failed: {}", self.name(), e);
            e
        })
    }

    async fn do_screenshot(&self) -> ScreenshotOutput {
        if let Err(e) = self.ensure_initialized().await {
            error!("[{}] screenshot: {}", self.name(), e);
            return ScreenshotOutput::failed(e.to_string());
        }
        match self.screenshot().await {
            Ok(output) => output,
            Err(e) => {
                error!("[{}] screenshot failed: {}", self.name(), e);
                ScreenshotOutput::failed(e.to_string())
            }
        }
    }

    async fn do_execute(&self, params: &ExecuteParams) -> ExecuteOutput {
        let parsed = &params.parsed_prediction;
        debug!(
            "[{}] prediction: {:?}, thought: {:?}",
            self.name(),
            params.prediction,
            parsed.thought
        );

        if let Err(e) = self.ensure_initialized().await {
            error!("[{}] execute: {}", self.name(), e);
            return ExecuteOutput::failed(e.to_string());
        }
        if params.is_aborted() {
            info!("[{}] abort signal set, skipping '{}'", self.name(), parsed.action_type);
            return ExecuteOutput::failed(OperatorError::Aborted.to_string());
        }

        let action = match ActionKind::parse(&parsed.action_type) {
            Some(action) if action.is_terminal() => {
                info!("[{}] terminal action '{}'", self.name(), action);
                return ExecuteOutput::success();
            }
            Some(action) if self.supports(action) => action,
            _ => return self.unsupported(&parsed.action_type),
        };

        info!("[{}] executing {}", self.name(), action);
        match self.execute(action, params).await {
            Ok(()) => ExecuteOutput::success(),
            Err(e) => {
                error!("[{}] {} failed: {}", self.name(), action, e);
                ExecuteOutput::failed(e.to_string())
            }
        }
    }

    /// Result for an action this operator does not implement.
    fn unsupported(&self, action_type: &str) -> ExecuteOutput {
        if self.config().strict_actions {
            warn!("[{}] unsupported action '{}' (strict)", self.name(), action_type);
            ExecuteOutput::failed(OperatorError::Unsupported(action_type.to_string()).to_string())
        } else {
            warn!("[{}] unsupported action '{}', ignoring", self.name(), action_type);
            ExecuteOutput::success()
        }
    }

    /// `cleanup`, then `release_backend`, then back to uninitialized.
    async fn destroy_instance(&self) -> Result<()> {
        info!("[{}] destroying instance", self.name());
        let cleaned = self.cleanup().await;
        if let Err(e) = &cleaned {
            warn!("[{}] cleanup failed during destroy: {}", self.name(), e);
        }
        let released = self.release_backend().await;
        self.lifecycle().reset();
        released.and(cleaned)
    }
}

/// Manual listing the templates of `actions`.
pub fn manual_for(actions: &[ActionKind], examples: Option<Vec<String>>) -> OperatorManual {
    OperatorManual {
        action_spaces: actions
            .iter()
            .map(|action| action.template().to_string())
            .collect(),
        examples,
    }
}

/// Sleep for `duration` unless `signal` fires first.
pub async fn wait_with_abort(duration: Duration, signal: Option<&CancellationToken>) -> Result<()> {
    match signal {
        Some(token) => {
            tokio::select! {
                _ = token.cancelled() => Err(OperatorError::Aborted),
                _ = tokio::time::sleep(duration) => Ok(()),
            }
        }
        None => {
            tokio::time::sleep(duration).await;
            Ok(())
        }
    }
}

/// Logical point of the action's start target.
///
/// `runtime` is the operator's own surface in device pixels. Box strings land on
/// the caller's screen; normalized coordinates land on `runtime`.
pub(crate) fn start_point(params: &ExecuteParams, runtime: ScreenContext) -> Result<Point> {
    let inputs = &params.parsed_prediction.action_inputs;
    let resolved = resolve_start(inputs, &params.resolve_context(runtime))?;
    Ok(logical(params, &Target::start(inputs), runtime, resolved))
}

pub(crate) fn end_point(params: &ExecuteParams, runtime: ScreenContext) -> Result<Point> {
    let inputs = &params.parsed_prediction.action_inputs;
    let resolved = resolve_end(inputs, &params.resolve_context(runtime))?;
    Ok(logical(params, &Target::end(inputs), runtime, resolved))
}

fn logical(
    params: &ExecuteParams,
    target: &Target<'_>,
    runtime: ScreenContext,
    resolved: ResolvedPoint,
) -> Point {
    let screen = if target.is_normalized() {
        runtime
    } else {
        params.screen_context(runtime)
    };
    screen.to_logical(resolved.x, resolved.y)
}

/// Start point when the action names one; `None` when it carries no target.
pub(crate) fn optional_start_point(
    params: &ExecuteParams,
    fallback: ScreenContext,
) -> Result<Option<Point>> {
    if params.parsed_prediction.action_inputs.has_start_target() {
        start_point(params, fallback).map(Some)
    } else {
        Ok(None)
    }
}

/// Keys of the `hotkey` chord, in input order.
pub(crate) fn hotkey_chord(params: &ExecuteParams) -> Result<Vec<Key>> {
    let spec = params
        .parsed_prediction
        .action_inputs
        .hotkey_spec()
        .ok_or(OperatorError::missing("hotkey", "key"))?;
    Ok(parse_chord(spec)?)
}

/// The single key of `press` / `release`.
pub(crate) fn single_key(params: &ExecuteParams, action: &'static str) -> Result<Key> {
    let spec = params
        .parsed_prediction
        .action_inputs
        .key_spec()
        .ok_or(OperatorError::missing(action, "key"))?;
    Ok(Key::parse(spec)?)
}

/// Direction of a `scroll`.
pub(crate) fn scroll_direction(params: &ExecuteParams) -> Result<ScrollDirection> {
    let direction = params
        .parsed_prediction
        .action_inputs
        .direction
        .as_deref()
        .ok_or(OperatorError::missing("scroll", "direction"))?;
    ScrollDirection::parse(direction).ok_or_else(|| OperatorError::InvalidInput {
        action: "scroll",
        field: "direction",
        value: direction.to_string(),
    })
}

pub(crate) fn content<'a>(params: &'a ExecuteParams, action: &'static str) -> Result<&'a str> {
    params
        .parsed_prediction
        .action_inputs
        .content
        .as_deref()
        .ok_or(OperatorError::missing(action, "content"))
}
