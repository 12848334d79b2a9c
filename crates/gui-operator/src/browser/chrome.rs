//! Chrome DevTools Protocol backend built on `chromiumoxide`.

use super::driver::{BrowserHandle, BrowserLauncher, LaunchOptions, PageHandle, Viewport};
use crate::types::MouseButton;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, InsertTextParams, MouseButton as CdpMouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::handler::viewport::Viewport as CdpViewport;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use gui_action::Key;
use serde::Deserialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Launches a local Chrome/Chromium.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeLauncher;

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self, options: &LaunchOptions) -> anyhow::Result<Box<dyn BrowserHandle>> {
        let mut builder = BrowserConfig::builder()
            .window_size(options.viewport.width, options.viewport.height)
            .viewport(CdpViewport {
                width: options.viewport.width,
                height: options.viewport.height,
                device_scale_factor: Some(options.viewport.device_scale_factor),
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            })
            .request_timeout(options.navigation_timeout)
            .args(options.args.iter().map(String::as_str));
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &options.executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("invalid browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch browser")?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("[browser_operator] cdp handler stopped: {}", e);
                    break;
                }
            }
        });

        Ok(Box::new(ChromeBrowser {
            browser,
            handler_task,
            navigation_timeout: options.navigation_timeout,
        }))
    }
}

struct ChromeBrowser {
    browser: Browser,
    handler_task: JoinHandle<()>,
    navigation_timeout: Duration,
}

#[async_trait]
impl BrowserHandle for ChromeBrowser {
    async fn new_page(&self, viewport: Viewport) -> anyhow::Result<Box<dyn PageHandle>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to open page")?;
        page.execute(SetDeviceMetricsOverrideParams::new(
            viewport.width as i64,
            viewport.height as i64,
            viewport.device_scale_factor,
            false,
        ))
        .await
        .context("failed to set viewport")?;
        Ok(Box::new(ChromePage {
            page,
            navigation_timeout: self.navigation_timeout,
        }))
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            warn!("[browser_operator] waiting for browser exit: {}", e);
        }
        self.handler_task.abort();
        closed.map(|_| ()).context("failed to close browser")
    }
}

struct ChromePage {
    page: Page,
    navigation_timeout: Duration,
}

#[derive(Deserialize)]
struct ReportedViewport {
    width: f64,
    height: f64,
    scale: f64,
}

fn cdp_button(button: MouseButton) -> CdpMouseButton {
    match button {
        MouseButton::Left => CdpMouseButton::Left,
        MouseButton::Right => CdpMouseButton::Right,
        MouseButton::Middle => CdpMouseButton::Middle,
    }
}

impl ChromePage {
    async fn mouse_event(
        &self,
        kind: DispatchMouseEventType,
        x: f64,
        y: f64,
        button: MouseButton,
        click_count: u32,
    ) -> anyhow::Result<()> {
        let params = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(x)
            .y(y)
            .button(cdp_button(button))
            .click_count(click_count as i64)
            .build()
            .map_err(|e| anyhow!(e))?;
        self.page.execute(params).await?;
        Ok(())
    }

    async fn key_event(
        &self,
        kind: DispatchKeyEventType,
        key: Key,
        modifiers: i64,
    ) -> anyhow::Result<()> {
        let mut builder = DispatchKeyEventParams::builder()
            .r#type(kind.clone())
            .key(key.dom_key())
            .code(key.dom_code())
            .windows_virtual_key_code(key.virtual_key_code())
            .native_virtual_key_code(key.virtual_key_code())
            .modifiers(modifiers);
        // Only plain key-downs carry text; with ctrl/alt/meta held the key is a shortcut.
        if kind == DispatchKeyEventType::KeyDown && modifiers & !8 == 0 {
            if let Some(text) = key.text() {
                builder = builder.text(text);
            }
        }
        let params = builder.build().map_err(|e| anyhow!(e))?;
        self.page.execute(params).await?;
        Ok(())
    }
}

#[async_trait]
impl PageHandle for ChromePage {
    async fn mouse_move(&self, x: f64, y: f64) -> anyhow::Result<()> {
        let params = DispatchMouseEventParams::new(DispatchMouseEventType::MouseMoved, x, y);
        self.page.execute(params).await?;
        Ok(())
    }

    async fn mouse_down(
        &self,
        x: f64,
        y: f64,
        button: MouseButton,
        click_count: u32,
    ) -> anyhow::Result<()> {
        self.mouse_event(DispatchMouseEventType::MousePressed, x, y, button, click_count)
            .await
    }

    async fn mouse_up(
        &self,
        x: f64,
        y: f64,
        button: MouseButton,
        click_count: u32,
    ) -> anyhow::Result<()> {
        self.mouse_event(DispatchMouseEventType::MouseReleased, x, y, button, click_count)
            .await
    }

    async fn wheel(&self, x: f64, y: f64, delta_x: f64, delta_y: f64) -> anyhow::Result<()> {
        let params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseWheel)
            .x(x)
            .y(y)
            .delta_x(delta_x)
            .delta_y(delta_y)
            .build()
            .map_err(|e| anyhow!(e))?;
        self.page.execute(params).await?;
        Ok(())
    }

    async fn key_down(&self, key: Key, modifiers: i64) -> anyhow::Result<()> {
        self.key_event(DispatchKeyEventType::KeyDown, key, modifiers).await
    }

    async fn key_up(&self, key: Key, modifiers: i64) -> anyhow::Result<()> {
        self.key_event(DispatchKeyEventType::KeyUp, key, modifiers).await
    }

    async fn insert_text(&self, text: &str) -> anyhow::Result<()> {
        self.page.execute(InsertTextParams::new(text)).await?;
        Ok(())
    }

    async fn goto(&self, url: &str) -> anyhow::Result<()> {
        let navigation = async {
            self.page.goto(url).await?.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };
        tokio::time::timeout(self.navigation_timeout, navigation)
            .await
            .map_err(|_| anyhow!("navigation to {url} timed out"))?
            .with_context(|| format!("navigation to {url} failed"))
    }

    async fn go_back(&self) -> anyhow::Result<()> {
        self.page
            .evaluate("window.history.back()")
            .await
            .context("history back failed")?;
        if tokio::time::timeout(self.navigation_timeout, self.page.wait_for_navigation())
            .await
            .is_err()
        {
            warn!("[browser_operator] no navigation after history back");
        }
        Ok(())
    }

    async fn screenshot_png(&self) -> anyhow::Result<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page
            .screenshot(params)
            .await
            .context("screenshot failed")
    }

    async fn url(&self) -> anyhow::Result<Option<String>> {
        Ok(self.page.url().await?)
    }

    async fn viewport(&self) -> anyhow::Result<Viewport> {
        let reported: ReportedViewport = self
            .page
            .evaluate(
                "({width: window.innerWidth, height: window.innerHeight, scale: window.devicePixelRatio})",
            )
            .await?
            .into_value()?;
        Ok(Viewport {
            width: reported.width.round() as u32,
            height: reported.height.round() as u32,
            device_scale_factor: reported.scale,
        })
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.page.clone().close().await.context("failed to close page")
    }
}
