//! Operator that drives one page of a controllable browser.

pub mod driver;

#[cfg(feature = "chrome")]
pub mod chrome;

use crate::config::OperatorConfig;
use crate::errors::{OperatorError, Result};
use crate::lifecycle::Lifecycle;
use crate::operator::{
    content, end_point, hotkey_chord, manual_for, optional_start_point, scroll_direction,
    start_point, wait_with_abort, Operator,
};
use crate::text;
use crate::types::{ExecuteParams, MouseButton, OperatorManual, ScreenshotOutput};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use driver::{BrowserHandle, BrowserLauncher, LaunchOptions, PageHandle, Viewport, LAUNCH_FLAGS};
use gui_action::{chord_down_order, chord_up_order, ActionKind, Key, Point, ScreenContext};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const SUPPORTED_ACTIONS: &[ActionKind] = &[
    ActionKind::Click,
    ActionKind::DoubleClick,
    ActionKind::RightClick,
    ActionKind::MiddleClick,
    ActionKind::Hover,
    ActionKind::Drag,
    ActionKind::Hotkey,
    ActionKind::Type,
    ActionKind::Scroll,
    ActionKind::Wait,
    ActionKind::Navigate,
    ActionKind::NavigateBack,
    ActionKind::Finished,
    ActionKind::CallUser,
    ActionKind::UserStop,
];

/// Intermediate pointer moves between drag endpoints.
const DRAG_STEPS: u32 = 10;

pub struct BrowserOperator {
    config: OperatorConfig,
    launcher: Box<dyn BrowserLauncher>,
    browser: Mutex<Option<Box<dyn BrowserHandle>>>,
    page: Mutex<Option<Arc<dyn PageHandle>>>,
    screen: RwLock<ScreenContext>,
    lifecycle: Lifecycle,
}

impl BrowserOperator {
    pub fn new(config: OperatorConfig, launcher: impl BrowserLauncher + 'static) -> Self {
        let screen = config.screen_context();
        Self {
            config,
            launcher: Box::new(launcher),
            browser: Mutex::new(None),
            page: Mutex::new(None),
            screen: RwLock::new(screen),
            lifecycle: Lifecycle::new(),
        }
    }

    /// Operator backed by a local Chrome/Chromium over CDP.
    #[cfg(feature = "chrome")]
    pub fn chrome(config: OperatorConfig) -> Self {
        Self::new(config, chrome::ChromeLauncher)
    }

    fn launch_options(&self) -> LaunchOptions {
        let mut args: Vec<String> = LAUNCH_FLAGS.iter().map(|f| f.to_string()).collect();
        args.extend(self.config.extra_browser_args.iter().cloned());
        LaunchOptions {
            headless: self.config.headless,
            executable: self.config.chrome_executable.clone(),
            args,
            viewport: self.viewport(),
            navigation_timeout: self.config.navigation_timeout(),
        }
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            width: self.config.viewport_width,
            height: self.config.viewport_height,
            device_scale_factor: self.config.device_scale_factor,
        }
    }

    async fn page(&self) -> Result<Arc<dyn PageHandle>> {
        self.page
            .lock()
            .await
            .clone()
            .ok_or_else(|| OperatorError::BackendNotReady("no active page".to_string()))
    }

    /// The active page, opening a fresh one on the running browser if cleanup closed it.
    async fn page_or_open(&self) -> Result<Arc<dyn PageHandle>> {
        let mut page = self.page.lock().await;
        if let Some(existing) = page.as_ref() {
            return Ok(existing.clone());
        }
        let browser = self.browser.lock().await;
        let browser = browser
            .as_ref()
            .ok_or_else(|| OperatorError::BackendNotReady("browser not launched".to_string()))?;
        info!("[browser_operator] opening a new page");
        let opened: Arc<dyn PageHandle> = Arc::from(browser.new_page(self.viewport()).await?);
        self.refresh_screen(opened.as_ref()).await;
        *page = Some(opened.clone());
        Ok(opened)
    }

    /// Adopt the viewport the page reports as the screen context, in device pixels.
    async fn refresh_screen(&self, page: &dyn PageHandle) {
        match page.viewport().await {
            Ok(viewport) => {
                let scale = viewport.device_scale_factor;
                let screen = ScreenContext::new(
                    viewport.width as f64 * scale,
                    viewport.height as f64 * scale,
                    scale,
                );
                debug!("[browser_operator] screen context {:?}", screen);
                *self.screen.write() = screen;
            }
            Err(e) => warn!(
                "[browser_operator] could not read viewport, keeping configured size: {}",
                e
            ),
        }
    }

    async fn click(
        &self,
        page: &dyn PageHandle,
        at: Point,
        button: MouseButton,
        count: u32,
    ) -> Result<()> {
        page.mouse_move(at.x, at.y).await?;
        tokio::time::sleep(self.config.settle_delay()).await;
        for click_count in 1..=count {
            page.mouse_down(at.x, at.y, button, click_count).await?;
            page.mouse_up(at.x, at.y, button, click_count).await?;
        }
        Ok(())
    }

    async fn drag(&self, page: &dyn PageHandle, from: Point, to: Point) -> Result<()> {
        page.mouse_move(from.x, from.y).await?;
        tokio::time::sleep(self.config.settle_delay()).await;
        page.mouse_down(from.x, from.y, MouseButton::Left, 1).await?;
        for step in 1..=DRAG_STEPS {
            let t = step as f64 / DRAG_STEPS as f64;
            page.mouse_move(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t)
                .await?;
        }
        page.mouse_up(to.x, to.y, MouseButton::Left, 1).await?;
        Ok(())
    }

    async fn press_chord(&self, page: &dyn PageHandle, keys: &[Key]) -> Result<()> {
        let mut modifiers = 0;
        for key in chord_down_order(keys) {
            modifiers |= key.modifier_bit();
            page.key_down(key, modifiers).await?;
        }
        for key in chord_up_order(keys) {
            modifiers &= !key.modifier_bit();
            page.key_up(key, modifiers).await?;
        }
        Ok(())
    }

    async fn type_text(&self, page: &dyn PageHandle, params: &ExecuteParams) -> Result<()> {
        let typed = text::prepare(content(params, "type")?);
        if !typed.text.is_empty() {
            page.insert_text(&typed.text).await?;
        }
        if typed.submit {
            debug!("[browser_operator] submitting with Enter");
            self.press_chord(page, &[Key::Enter]).await?;
        }
        Ok(())
    }

    async fn scroll(&self, page: &dyn PageHandle, params: &ExecuteParams) -> Result<()> {
        let direction = scroll_direction(params)?;

        let screen = self.screen_context();
        let logical = screen.to_logical(screen.width, screen.height);
        let at = optional_start_point(params, screen)?
            .unwrap_or_else(|| Point::new(logical.x / 2.0, logical.y / 2.0));
        let (ux, uy) = direction.unit();
        let delta_x = ux * logical.x * self.config.scroll_ratio;
        let delta_y = uy * logical.y * self.config.scroll_ratio;

        page.mouse_move(at.x, at.y).await?;
        page.wheel(at.x, at.y, delta_x, delta_y).await?;
        Ok(())
    }

    async fn navigate(&self, params: &ExecuteParams) -> Result<()> {
        let inputs = &params.parsed_prediction.action_inputs;
        let target = inputs
            .url
            .as_deref()
            .or(inputs.content.as_deref())
            .ok_or(OperatorError::missing("navigate", "url"))?;
        let url = normalize_url(target);
        let page = self.page_or_open().await?;
        info!("[browser_operator] navigating to {}", url);
        page.goto(&url).await?;
        self.refresh_screen(page.as_ref()).await;
        Ok(())
    }
}

/// Prefix `https://` when the target has no scheme.
pub fn normalize_url(target: &str) -> String {
    let trimmed = target.trim();
    let has_scheme = trimmed.contains("://")
        || ["about:", "data:", "file:", "chrome:", "javascript:"]
            .iter()
            .any(|scheme| trimmed.starts_with(scheme));
    if has_scheme {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

#[async_trait]
impl Operator for BrowserOperator {
    fn name(&self) -> &'static str {
        "browser_operator"
    }

    fn supported_actions(&self) -> &'static [ActionKind] {
        SUPPORTED_ACTIONS
    }

    fn manual(&self) -> OperatorManual {
        manual_for(
            SUPPORTED_ACTIONS,
            Some(vec![
                "navigate(url='github.com')".to_string(),
                "click(start_box='[412, 88, 560, 120]')".to_string(),
                "type(content='rust async traits\\n')".to_string(),
                "hotkey(key='ctrl shift t')".to_string(),
                "scroll(direction='down')".to_string(),
            ]),
        )
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
        let options = self.launch_options();
        info!(
            "[browser_operator] launching browser (headless: {}, viewport: {}x{})",
            options.headless, options.viewport.width, options.viewport.height
        );
        let mut browser = self
            .launcher
            .launch(&options)
            .await
            .map_err(|e| OperatorError::Initialization(format!("browser launch failed: {e}")))?;

        let page = match browser.new_page(options.viewport).await {
            Ok(page) => Arc::<dyn PageHandle>::from(page),
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    warn!(
                        "[browser_operator] closing browser after failed page open: {}",
                        close_err
                    );
                }
                return Err(OperatorError::Initialization(format!("could not open page: {e}")));
            }
        };
        self.refresh_screen(page.as_ref()).await;

        *self.browser.lock().await = Some(browser);
        *self.page.lock().await = Some(page);
        info!("[browser_operator] browser ready");
        Ok(())
    }

    async fn screenshot(&self) -> Result<ScreenshotOutput> {
        let page = self.page().await?;
        let png = page.screenshot_png().await?;
        let url = match page.url().await {
            Ok(url) => url,
            Err(e) => {
                warn!("[browser_operator] could not read page url: {}", e);
                None
            }
        };
        let scale_factor = self.screen_context().scale_factor;
        debug!("[browser_operator] screenshot {} bytes", png.len());
        Ok(ScreenshotOutput::captured(
            general_purpose::STANDARD.encode(png),
            url,
            scale_factor,
        ))
    }

    #[instrument(skip_all, fields(action = %action))]
    async fn execute(&self, action: ActionKind, params: &ExecuteParams) -> Result<()> {
        if action == ActionKind::Navigate {
            return self.navigate(params).await;
        }
        if action == ActionKind::Wait {
            return wait_with_abort(self.config.wait_duration(), params.abort_signal.as_ref()).await;
        }

        let page = self.page().await?;
        let page = page.as_ref();
        let screen = self.screen_context();
        match action {
            ActionKind::Click => {
                self.click(page, start_point(params, screen)?, MouseButton::Left, 1).await
            }
            ActionKind::DoubleClick => {
                self.click(page, start_point(params, screen)?, MouseButton::Left, 2).await
            }
            ActionKind::RightClick => {
                self.click(page, start_point(params, screen)?, MouseButton::Right, 1).await
            }
            ActionKind::MiddleClick => {
                self.click(page, start_point(params, screen)?, MouseButton::Middle, 1).await
            }
            ActionKind::Hover => {
                let at = start_point(params, screen)?;
                page.mouse_move(at.x, at.y).await?;
                Ok(())
            }
            ActionKind::Drag => {
                let from = start_point(params, screen)?;
                let to = end_point(params, screen)?;
                self.drag(page, from, to).await
            }
            ActionKind::Hotkey => self.press_chord(page, &hotkey_chord(params)?).await,
            ActionKind::Type => self.type_text(page, params).await,
            ActionKind::Scroll => self.scroll(page, params).await,
            ActionKind::NavigateBack => {
                page.go_back().await?;
                Ok(())
            }
            other => Err(OperatorError::Unsupported(other.to_string())),
        }
    }

    async fn cleanup(&self) -> Result<()> {
        if let Some(page) = self.page.lock().await.take() {
            info!("[browser_operator] closing page");
            page.close().await?;
        }
        Ok(())
    }

    async fn release_backend(&self) -> Result<()> {
        if let Some(mut browser) = self.browser.lock().await.take() {
            info!("[browser_operator] closing browser");
            browser.close().await?;
        }
        Ok(())
    }
}
