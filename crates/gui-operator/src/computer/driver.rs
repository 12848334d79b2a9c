use crate::types::MouseButton;
use async_trait::async_trait;
use gui_action::Key;

/// OS-level input injection. Coordinates are logical points.
#[async_trait]
pub trait InputDriver: Send + Sync {
    async fn move_mouse(&self, x: f64, y: f64) -> anyhow::Result<()>;

    async fn button_down(&self, button: MouseButton) -> anyhow::Result<()>;

    async fn button_up(&self, button: MouseButton) -> anyhow::Result<()>;

    async fn key_down(&self, key: Key) -> anyhow::Result<()>;

    async fn key_up(&self, key: Key) -> anyhow::Result<()>;

    /// Type literal text at the focused control.
    async fn type_text(&self, text: &str) -> anyhow::Result<()>;

    /// Wheel ticks; positive `dy` scrolls down, positive `dx` scrolls right.
    async fn scroll(&self, dx: i64, dy: i64) -> anyhow::Result<()>;

    /// Logical size of the primary display, when the backend can tell.
    async fn display_size(&self) -> anyhow::Result<Option<(f64, f64)>>;
}
