//! Operators that execute model-predicted GUI actions
//!
//! An [`Operator`] owns one backend (a browser page or the local desktop),
//! initializes it lazily and exactly once, and turns parsed predictions from
//! `gui-action` into real pointer and keyboard input. Results always come back
//! as [`ExecuteOutput`] / [`ScreenshotOutput`] values; errors never escape the
//! `do_*` entry points.
//!
//! Backends are selected with cargo features: `chrome` enables the CDP browser
//! backend, `desktop` enables OS-level input injection. Without them the
//! operators run against any [`BrowserLauncher`] / [`InputDriver`] you supply.

pub mod browser;
pub mod computer;
pub mod config;
pub mod errors;
pub mod lifecycle;
pub mod logging;
pub mod operator;
pub mod text;
pub mod types;

pub use browser::driver::{BrowserHandle, BrowserLauncher, LaunchOptions, PageHandle, Viewport};
pub use browser::{normalize_url, BrowserOperator};
pub use computer::driver::InputDriver;
pub use computer::ComputerOperator;
pub use config::OperatorConfig;
pub use errors::{OperatorError, Result};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use logging::init_logging;
pub use operator::{manual_for, wait_with_abort, Operator};
pub use tokio_util::sync::CancellationToken;
pub use types::{
    ExecuteOutput, ExecuteParams, ExecuteStatus, MouseButton, OperatorManual, ScreenshotOutput,
    ScrollDirection,
};

#[cfg(feature = "chrome")]
pub use browser::chrome::ChromeLauncher;
#[cfg(feature = "desktop")]
pub use computer::native::NativeInput;

// Re-export the action model so callers need a single dependency.
pub use gui_action;
