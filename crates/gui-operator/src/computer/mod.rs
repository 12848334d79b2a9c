//! Operator that drives the local desktop through OS-level input injection.
//!
//! There is no portable capture primitive here, so [`ComputerOperator`]
//! reports screenshots as successful with an empty payload. Callers treat an
//! empty `base64` as "capture unsupported", not as a failure.

pub mod driver;

#[cfg(feature = "desktop")]
pub mod native;

use crate::config::OperatorConfig;
use crate::errors::{OperatorError, Result};
use crate::lifecycle::Lifecycle;
use crate::operator::{
    content, end_point, hotkey_chord, optional_start_point, scroll_direction, single_key,
    start_point, wait_with_abort, Operator,
};
use crate::text;
use crate::types::{ExecuteParams, MouseButton, ScreenshotOutput};
use async_trait::async_trait;
use driver::InputDriver;
use gui_action::{chord_down_order, chord_up_order, ActionKind, Key, Point, ScreenContext};
use parking_lot::RwLock;
use tracing::{debug, info, instrument};

const SUPPORTED_ACTIONS: &[ActionKind] = &[
    ActionKind::Click,
    ActionKind::DoubleClick,
    ActionKind::RightClick,
    ActionKind::MiddleClick,
    ActionKind::Hover,
    ActionKind::Drag,
    ActionKind::MouseDown,
    ActionKind::MouseUp,
    ActionKind::Hotkey,
    ActionKind::Press,
    ActionKind::Release,
    ActionKind::Type,
    ActionKind::Scroll,
    ActionKind::Wait,
    ActionKind::Finished,
    ActionKind::CallUser,
    ActionKind::UserStop,
];

pub struct ComputerOperator {
    config: OperatorConfig,
    driver: Box<dyn InputDriver>,
    screen: RwLock<ScreenContext>,
    lifecycle: Lifecycle,
}

impl ComputerOperator {
    pub fn new(config: OperatorConfig, driver: impl InputDriver + 'static) -> Self {
        let screen = config.screen_context();
        Self {
            config,
            driver: Box::new(driver),
            screen: RwLock::new(screen),
            lifecycle: Lifecycle::new(),
        }
    }

    /// Operator injecting real mouse and keyboard events.
    #[cfg(feature = "desktop")]
    pub fn native(config: OperatorConfig) -> Self {
        Self::new(config, native::NativeInput)
    }

    async fn click(&self, at: Point, button: MouseButton, count: u32) -> Result<()> {
        self.driver.move_mouse(at.x, at.y).await?;
        tokio::time::sleep(self.config.settle_delay()).await;
        for _ in 0..count {
            self.driver.button_down(button).await?;
            self.driver.button_up(button).await?;
        }
        Ok(())
    }

    async fn press_chord(&self, keys: &[Key]) -> Result<()> {
        for key in chord_down_order(keys) {
            self.driver.key_down(key).await?;
        }
        for key in chord_up_order(keys) {
            self.driver.key_up(key).await?;
        }
        Ok(())
    }

    /// Move to the action's target, if it names one.
    async fn move_to_target(&self, params: &ExecuteParams) -> Result<()> {
        if let Some(at) = optional_start_point(params, self.screen_context())? {
            self.driver.move_mouse(at.x, at.y).await?;
            tokio::time::sleep(self.config.settle_delay()).await;
        }
        Ok(())
    }

    async fn type_text(&self, params: &ExecuteParams) -> Result<()> {
        let typed = text::prepare(content(params, "type")?);
        if !typed.text.is_empty() {
            self.driver.type_text(&typed.text).await?;
        }
        if typed.submit {
            debug!("[computer_operator] submitting with Enter");
            self.press_chord(&[Key::Enter]).await?;
        }
        Ok(())
    }

    async fn scroll(&self, params: &ExecuteParams) -> Result<()> {
        let direction = scroll_direction(params)?;
        self.move_to_target(params).await?;
        let (ux, uy) = direction.unit();
        let ticks = self.config.wheel_ticks;
        self.driver
            .scroll(ux as i64 * ticks, uy as i64 * ticks)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Operator for ComputerOperator {
    fn name(&self) -> &'static str {
        "computer_operator"
    }

    fn supported_actions(&self) -> &'static [ActionKind] {
        SUPPORTED_ACTIONS
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn config(&self) -> &OperatorConfig {
        &self.config
    }

    fn screen_context(&self) -> ScreenContext {
        *self.screen.read()
    }

    #[instrument(skip_all)]
    async fn initialize(&self) -> Result<()> {
        let scale = self.config.screen_context().scale_factor;
        match self.driver.display_size().await {
            Ok(Some((width, height))) => {
                let screen = ScreenContext::new(width * scale, height * scale, scale);
                info!("[computer_operator] display {}x{} @{}", width, height, scale);
                *self.screen.write() = screen;
            }
            Ok(None) => debug!("[computer_operator] display size unknown, using configured size"),
            Err(e) => {
                return Err(OperatorError::Initialization(format!(
                    "input backend unavailable: {e}"
                )))
            }
        }
        Ok(())
    }

    async fn screenshot(&self) -> Result<ScreenshotOutput> {
        debug!("[computer_operator] screenshot not supported on this backend");
        Ok(ScreenshotOutput::unsupported(self.screen_context().scale_factor))
    }

    #[instrument(skip_all, fields(action = %action))]
    async fn execute(&self, action: ActionKind, params: &ExecuteParams) -> Result<()> {
        let screen = self.screen_context();
        match action {
            ActionKind::Click => {
                self.click(start_point(params, screen)?, MouseButton::Left, 1).await
            }
            ActionKind::DoubleClick => {
                self.click(start_point(params, screen)?, MouseButton::Left, 2).await
            }
            ActionKind::RightClick => {
                self.click(start_point(params, screen)?, MouseButton::Right, 1).await
            }
            ActionKind::MiddleClick => {
                self.click(start_point(params, screen)?, MouseButton::Middle, 1).await
            }
            ActionKind::Hover => {
                let at = start_point(params, screen)?;
                self.driver.move_mouse(at.x, at.y).await?;
                Ok(())
            }
            ActionKind::Drag => {
                let from = start_point(params, screen)?;
                let to = end_point(params, screen)?;
                self.driver.move_mouse(from.x, from.y).await?;
                tokio::time::sleep(self.config.settle_delay()).await;
                self.driver.button_down(MouseButton::Left).await?;
                self.driver.move_mouse(to.x, to.y).await?;
                tokio::time::sleep(self.config.settle_delay()).await;
                self.driver.button_up(MouseButton::Left).await?;
                Ok(())
            }
            ActionKind::MouseDown => {
                self.move_to_target(params).await?;
                self.driver.button_down(MouseButton::Left).await?;
                Ok(())
            }
            ActionKind::MouseUp => {
                self.move_to_target(params).await?;
                self.driver.button_up(MouseButton::Left).await?;
                Ok(())
            }
            ActionKind::Hotkey => self.press_chord(&hotkey_chord(params)?).await,
            ActionKind::Press => {
                self.driver.key_down(single_key(params, "press")?).await?;
                Ok(())
            }
            ActionKind::Release => {
                self.driver.key_up(single_key(params, "release")?).await?;
                Ok(())
            }
            ActionKind::Type => self.type_text(params).await,
            ActionKind::Scroll => self.scroll(params).await,
            ActionKind::Wait => {
                wait_with_abort(self.config.wait_duration(), params.abort_signal.as_ref()).await
            }
            other => Err(OperatorError::Unsupported(other.to_string())),
        }
    }

    async fn cleanup(&self) -> Result<()> {
        debug!("[computer_operator] nothing to clean up");
        Ok(())
    }

    async fn release_backend(&self) -> Result<()> {
        debug!("[computer_operator] releasing input backend");
        Ok(())
    }
}
