//! Seams between the browser operator and a concrete browser.
//!
//! The operator only speaks in pointer, keyboard, navigation and capture
//! primitives; the CDP implementation lives in `chrome.rs` behind the `chrome`
//! feature.

use crate::types::MouseButton;
use async_trait::async_trait;
use gui_action::Key;
use std::path::PathBuf;
use std::time::Duration;

/// Flags every launch carries. Sandboxing is off so the browser starts in
/// unprivileged containers and CI.
pub const LAUNCH_FLAGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--no-first-run",
    "--no-default-browser-check",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaunchOptions {
    pub headless: bool,
    pub executable: Option<PathBuf>,
    /// `LAUNCH_FLAGS` followed by any configured extras.
    pub args: Vec<String>,
    pub viewport: Viewport,
    pub navigation_timeout: Duration,
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> anyhow::Result<Box<dyn BrowserHandle>>;
}

#[async_trait]
pub trait BrowserHandle: Send + Sync {
    /// Open a page sized to `viewport`.
    async fn new_page(&self, viewport: Viewport) -> anyhow::Result<Box<dyn PageHandle>>;

    async fn close(&mut self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait PageHandle: Send + Sync {
    async fn mouse_move(&self, x: f64, y: f64) -> anyhow::Result<()>;

    async fn mouse_down(&self, x: f64, y: f64, button: MouseButton, click_count: u32)
        -> anyhow::Result<()>;

    async fn mouse_up(&self, x: f64, y: f64, button: MouseButton, click_count: u32)
        -> anyhow::Result<()>;

    /// Wheel at `(x, y)` by `(delta_x, delta_y)` CSS pixels.
    async fn wheel(&self, x: f64, y: f64, delta_x: f64, delta_y: f64) -> anyhow::Result<()>;

    /// `modifiers` is the mask of modifier keys currently held.
    async fn key_down(&self, key: Key, modifiers: i64) -> anyhow::Result<()>;

    async fn key_up(&self, key: Key, modifiers: i64) -> anyhow::Result<()>;

    /// Insert text as if typed, without key events per character.
    async fn insert_text(&self, text: &str) -> anyhow::Result<()>;

    /// Navigate and wait until the network is idle.
    async fn goto(&self, url: &str) -> anyhow::Result<()>;

    async fn go_back(&self) -> anyhow::Result<()>;

    /// Full-page PNG bytes.
    async fn screenshot_png(&self) -> anyhow::Result<Vec<u8>>;

    async fn url(&self) -> anyhow::Result<Option<String>>;

    /// Viewport as the page reports it.
    async fn viewport(&self) -> anyhow::Result<Viewport>;

    async fn close(&self) -> anyhow::Result<()>;
}
