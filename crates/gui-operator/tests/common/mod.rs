//! Recording backends shared by the integration tests.

#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use gui_action::{parse_prediction, Factors, Key, ScreenContext};
use gui_operator::{
    BrowserHandle, BrowserLauncher, ExecuteParams, InputDriver, LaunchOptions, MouseButton,
    PageHandle, Viewport,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    NewPage,
    MouseMove(f64, f64),
    MouseDown(MouseButton, u32),
    MouseUp(MouseButton, u32),
    Wheel { dx: f64, dy: f64 },
    KeyDown(Key),
    KeyUp(Key),
    Modifiers(i64),
    Text(String),
    Goto(String),
    GoBack,
    Screenshot,
    ClosePage,
    CloseBrowser,
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
    Scroll(i64, i64),
}

/// Shared log of everything a mock backend was asked to do.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
    launches: Arc<AtomicUsize>,
    display_queries: Arc<AtomicUsize>,
    last_launch: Arc<Mutex<Option<LaunchOptions>>>,
}

impl Recorder {
    pub fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Events other than modifier-mask bookkeeping.
    pub fn input_events(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| !matches!(e, Event::Modifiers(_)))
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// How many times the desktop driver was asked for its display size.
    pub fn display_queries(&self) -> usize {
        self.display_queries.load(Ordering::SeqCst)
    }

    pub fn last_launch(&self) -> Option<LaunchOptions> {
        self.last_launch.lock().unwrap().clone()
    }

    pub fn key_downs(&self) -> Vec<Key> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::KeyDown(k) => Some(k),
                _ => None,
            })
            .collect()
    }

    pub fn key_ups(&self) -> Vec<Key> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::KeyUp(k) => Some(k),
                _ => None,
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct MockLauncher {
    pub recorder: Recorder,
    pub launch_delay: Duration,
    pub fail_launch: Option<String>,
    /// Error every pointer and key operation returns.
    pub fail_input: Option<String>,
    /// What the page reports as its viewport.
    pub reported: Viewport,
}

impl MockLauncher {
    pub fn new(recorder: Recorder) -> Self {
        Self {
            recorder,
            launch_delay: Duration::ZERO,
            fail_launch: None,
            fail_input: None,
            reported: Viewport {
                width: 1280,
                height: 800,
                device_scale_factor: 1.0,
            },
        }
    }
}

#[async_trait]
impl BrowserLauncher for MockLauncher {
    async fn launch(&self, options: &LaunchOptions) -> anyhow::Result<Box<dyn BrowserHandle>> {
        self.recorder.launches.fetch_add(1, Ordering::SeqCst);
        *self.recorder.last_launch.lock().unwrap() = Some(options.clone());
        tokio::time::sleep(self.launch_delay).await;
        if let Some(message) = &self.fail_launch {
            return Err(anyhow!(message.clone()));
        }
        Ok(Box::new(MockBrowser {
            launcher: self.clone(),
        }))
    }
}

struct MockBrowser {
    launcher: MockLauncher,
}

#[async_trait]
impl BrowserHandle for MockBrowser {
    async fn new_page(&self, _viewport: Viewport) -> anyhow::Result<Box<dyn PageHandle>> {
        self.launcher.recorder.push(Event::NewPage);
        Ok(Box::new(MockPage {
            recorder: self.launcher.recorder.clone(),
            fail_input: self.launcher.fail_input.clone(),
            reported: self.launcher.reported,
            url: Mutex::new(None),
        }))
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.launcher.recorder.push(Event::CloseBrowser);
        Ok(())
    }
}

struct MockPage {
    recorder: Recorder,
    fail_input: Option<String>,
    reported: Viewport,
    url: Mutex<Option<String>>,
}

impl MockPage {
    fn input(&self, event: Event) -> anyhow::Result<()> {
        if let Some(message) = &self.fail_input {
            return Err(anyhow!(message.clone()));
        }
        self.recorder.push(event);
        Ok(())
    }
}

#[async_trait]
impl PageHandle for MockPage {
    async fn mouse_move(&self, x: f64, y: f64) -> anyhow::Result<()> {
        self.input(Event::MouseMove(x, y))
    }

    async fn mouse_down(
        &self,
        _x: f64,
        _y: f64,
        button: MouseButton,
        click_count: u32,
    ) -> anyhow::Result<()> {
        self.input(Event::MouseDown(button, click_count))
    }

    async fn mouse_up(
        &self,
        _x: f64,
        _y: f64,
        button: MouseButton,
        click_count: u32,
    ) -> anyhow::Result<()> {
        self.input(Event::MouseUp(button, click_count))
    }

    async fn wheel(&self, _x: f64, _y: f64, delta_x: f64, delta_y: f64) -> anyhow::Result<()> {
        self.input(Event::Wheel {
            dx: delta_x,
            dy: delta_y,
        })
    }

    async fn key_down(&self, key: Key, modifiers: i64) -> anyhow::Result<()> {
        self.input(Event::KeyDown(key))?;
        self.input(Event::Modifiers(modifiers))
    }

    async fn key_up(&self, key: Key, modifiers: i64) -> anyhow::Result<()> {
        self.input(Event::KeyUp(key))?;
        self.input(Event::Modifiers(modifiers))
    }

    async fn insert_text(&self, text: &str) -> anyhow::Result<()> {
        self.input(Event::Text(text.to_string()))
    }

    async fn goto(&self, url: &str) -> anyhow::Result<()> {
        self.recorder.push(Event::Goto(url.to_string()));
        *self.url.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn go_back(&self) -> anyhow::Result<()> {
        self.recorder.push(Event::GoBack);
        Ok(())
    }

    async fn screenshot_png(&self) -> anyhow::Result<Vec<u8>> {
        self.recorder.push(Event::Screenshot);
        Ok(b"\x89PNG".to_vec())
    }

    async fn url(&self) -> anyhow::Result<Option<String>> {
        Ok(self.url.lock().unwrap().clone())
    }

    async fn viewport(&self) -> anyhow::Result<Viewport> {
        Ok(self.reported)
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.recorder.push(Event::ClosePage);
        Ok(())
    }
}

/// Input driver that records instead of injecting.
#[derive(Clone, Default)]
pub struct MockInput {
    pub recorder: Recorder,
    pub display: Option<(f64, f64)>,
}

#[async_trait]
impl InputDriver for MockInput {
    async fn move_mouse(&self, x: f64, y: f64) -> anyhow::Result<()> {
        self.recorder.push(Event::MouseMove(x, y));
        Ok(())
    }

    async fn button_down(&self, button: MouseButton) -> anyhow::Result<()> {
        self.recorder.push(Event::ButtonDown(button));
        Ok(())
    }

    async fn button_up(&self, button: MouseButton) -> anyhow::Result<()> {
        self.recorder.push(Event::ButtonUp(button));
        Ok(())
    }

    async fn key_down(&self, key: Key) -> anyhow::Result<()> {
        self.recorder.push(Event::KeyDown(key));
        Ok(())
    }

    async fn key_up(&self, key: Key) -> anyhow::Result<()> {
        self.recorder.push(Event::KeyUp(key));
        Ok(())
    }

    async fn type_text(&self, text: &str) -> anyhow::Result<()> {
        self.recorder.push(Event::Text(text.to_string()));
        Ok(())
    }

    async fn scroll(&self, dx: i64, dy: i64) -> anyhow::Result<()> {
        self.recorder.push(Event::Scroll(dx, dy));
        Ok(())
    }

    async fn display_size(&self) -> anyhow::Result<Option<(f64, f64)>> {
        self.recorder.display_queries.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(self.display)
    }
}

/// Params for `call` on a 1000x500 screen whose box strings are already pixels.
pub fn pixel_params(call: &str) -> ExecuteParams {
    ExecuteParams::new(
        parse_prediction(call),
        ScreenContext::new(1000.0, 500.0, 1.0),
        Factors(1000.0, 500.0),
    )
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}
