//! Input injection through `rdev`, with clipboard paste for text the key map
//! cannot express.

use super::driver::InputDriver;
use crate::types::MouseButton;
use anyhow::anyhow;
use arboard::Clipboard;
use async_trait::async_trait;
use gui_action::Key;
use rdev::{simulate, Button, EventType, Key as RdevKey};
use std::time::Duration;
use tracing::debug;

/// Pause after each injected event; some platforms drop events sent back to back.
const EVENT_DELAY: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeInput;

fn send(event: &EventType) -> anyhow::Result<()> {
    simulate(event).map_err(|e| anyhow!("failed to simulate {:?}: {:?}", event, e))
}

fn rdev_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
    }
}

/// Key code for a named key, and whether shift must be held to produce it.
fn rdev_key(key: Key) -> anyhow::Result<(RdevKey, bool)> {
    match key {
        Key::Char(c) => char_key(c).ok_or_else(|| anyhow!("'{c}' has no key code on this backend")),
        Key::F(n) => function_key(n)
            .map(|code| (code, false))
            .ok_or_else(|| anyhow!("F{n} has no key code on this backend")),
        named => Ok((named_key(named)?, false)),
    }
}

fn named_key(key: Key) -> anyhow::Result<RdevKey> {
    let code = match key {
        Key::Ctrl => RdevKey::ControlLeft,
        Key::Alt => RdevKey::Alt,
        Key::Shift => RdevKey::ShiftLeft,
        Key::Meta => RdevKey::MetaLeft,
        Key::Enter => RdevKey::Return,
        Key::Tab => RdevKey::Tab,
        Key::Escape => RdevKey::Escape,
        Key::Backspace => RdevKey::Backspace,
        Key::Delete => RdevKey::Delete,
        Key::Space => RdevKey::Space,
        Key::Insert => RdevKey::Insert,
        Key::Home => RdevKey::Home,
        Key::End => RdevKey::End,
        Key::PageUp => RdevKey::PageUp,
        Key::PageDown => RdevKey::PageDown,
        Key::CapsLock => RdevKey::CapsLock,
        Key::NumLock => RdevKey::NumLock,
        Key::ScrollLock => RdevKey::ScrollLock,
        Key::PrintScreen => RdevKey::PrintScreen,
        Key::Pause => RdevKey::Pause,
        Key::Up => RdevKey::UpArrow,
        Key::Down => RdevKey::DownArrow,
        Key::Left => RdevKey::LeftArrow,
        Key::Right => RdevKey::RightArrow,
        Key::F(_) | Key::Char(_) => return Err(anyhow!("{key:?} is not a named key")),
    };
    Ok(code)
}

fn function_key(n: u8) -> Option<RdevKey> {
    Some(match n {
        1 => RdevKey::F1,
        2 => RdevKey::F2,
        3 => RdevKey::F3,
        4 => RdevKey::F4,
        5 => RdevKey::F5,
        6 => RdevKey::F6,
        7 => RdevKey::F7,
        8 => RdevKey::F8,
        9 => RdevKey::F9,
        10 => RdevKey::F10,
        11 => RdevKey::F11,
        12 => RdevKey::F12,
        _ => return None,
    })
}

/// US-layout key code for a character, and whether shift is needed.
fn char_key(c: char) -> Option<(RdevKey, bool)> {
    if c.is_ascii_uppercase() {
        return char_key(c.to_ascii_lowercase()).map(|(code, _)| (code, true));
    }
    let plain = |code| Some((code, false));
    let shifted = |code| Some((code, true));
    match c {
        'a' => plain(RdevKey::KeyA),
        'b' => plain(RdevKey::KeyB),
        'c' => plain(RdevKey::KeyC),
        'd' => plain(RdevKey::KeyD),
        'e' => plain(RdevKey::KeyE),
        'f' => plain(RdevKey::KeyF),
        'g' => plain(RdevKey::KeyG),
        'h' => plain(RdevKey::KeyH),
        'i' => plain(RdevKey::KeyI),
        'j' => plain(RdevKey::KeyJ),
        'k' => plain(RdevKey::KeyK),
        'l' => plain(RdevKey::KeyL),
        'm' => plain(RdevKey::KeyM),
        'n' => plain(RdevKey::KeyN),
        'o' => plain(RdevKey::KeyO),
        'p' => plain(RdevKey::KeyP),
        'q' => plain(RdevKey::KeyQ),
        'r' => plain(RdevKey::KeyR),
        's' => plain(RdevKey::KeyS),
        't' => plain(RdevKey::KeyT),
        'u' => plain(RdevKey::KeyU),
        'v' => plain(RdevKey::KeyV),
        'w' => plain(RdevKey::KeyW),
        'x' => plain(RdevKey::KeyX),
        'y' => plain(RdevKey::KeyY),
        'z' => plain(RdevKey::KeyZ),
        '0' => plain(RdevKey::Num0),
        '1' => plain(RdevKey::Num1),
        '2' => plain(RdevKey::Num2),
        '3' => plain(RdevKey::Num3),
        '4' => plain(RdevKey::Num4),
        '5' => plain(RdevKey::Num5),
        '6' => plain(RdevKey::Num6),
        '7' => plain(RdevKey::Num7),
        '8' => plain(RdevKey::Num8),
        '9' => plain(RdevKey::Num9),
        ' ' => plain(RdevKey::Space),
        '\n' => plain(RdevKey::Return),
        '\t' => plain(RdevKey::Tab),
        '.' => plain(RdevKey::Dot),
        ',' => plain(RdevKey::Comma),
        '-' => plain(RdevKey::Minus),
        '=' => plain(RdevKey::Equal),
        ';' => plain(RdevKey::SemiColon),
        '\'' => plain(RdevKey::Quote),
        '/' => plain(RdevKey::Slash),
        '\\' => plain(RdevKey::BackSlash),
        '[' => plain(RdevKey::LeftBracket),
        ']' => plain(RdevKey::RightBracket),
        '`' => plain(RdevKey::BackQuote),
        '!' => shifted(RdevKey::Num1),
        '@' => shifted(RdevKey::Num2),
        '#' => shifted(RdevKey::Num3),
        '$' => shifted(RdevKey::Num4),
        '%' => shifted(RdevKey::Num5),
        '^' => shifted(RdevKey::Num6),
        '&' => shifted(RdevKey::Num7),
        '*' => shifted(RdevKey::Num8),
        '(' => shifted(RdevKey::Num9),
        ')' => shifted(RdevKey::Num0),
        '_' => shifted(RdevKey::Minus),
        '+' => shifted(RdevKey::Equal),
        ':' => shifted(RdevKey::SemiColon),
        '"' => shifted(RdevKey::Quote),
        '?' => shifted(RdevKey::Slash),
        '|' => shifted(RdevKey::BackSlash),
        '{' => shifted(RdevKey::LeftBracket),
        '}' => shifted(RdevKey::RightBracket),
        '~' => shifted(RdevKey::BackQuote),
        '<' => shifted(RdevKey::Comma),
        '>' => shifted(RdevKey::Dot),
        _ => None,
    }
}

async fn tap(code: RdevKey) -> anyhow::Result<()> {
    send(&EventType::KeyPress(code))?;
    tokio::time::sleep(EVENT_DELAY).await;
    send(&EventType::KeyRelease(code))?;
    tokio::time::sleep(EVENT_DELAY).await;
    Ok(())
}

fn paste_modifier() -> RdevKey {
    if cfg!(target_os = "macos") {
        RdevKey::MetaLeft
    } else {
        RdevKey::ControlLeft
    }
}

fn set_clipboard(text: &str) -> anyhow::Result<()> {
    let mut clipboard = Clipboard::new().map_err(|e| anyhow!("clipboard unavailable: {e}"))?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| anyhow!("failed to set clipboard: {e}"))
}

#[async_trait]
impl InputDriver for NativeInput {
    async fn move_mouse(&self, x: f64, y: f64) -> anyhow::Result<()> {
        send(&EventType::MouseMove { x, y })?;
        tokio::time::sleep(EVENT_DELAY).await;
        Ok(())
    }

    async fn button_down(&self, button: MouseButton) -> anyhow::Result<()> {
        send(&EventType::ButtonPress(rdev_button(button)))?;
        tokio::time::sleep(EVENT_DELAY).await;
        Ok(())
    }

    async fn button_up(&self, button: MouseButton) -> anyhow::Result<()> {
        send(&EventType::ButtonRelease(rdev_button(button)))?;
        tokio::time::sleep(EVENT_DELAY).await;
        Ok(())
    }

    async fn key_down(&self, key: Key) -> anyhow::Result<()> {
        let (code, shift) = rdev_key(key)?;
        if shift {
            send(&EventType::KeyPress(RdevKey::ShiftLeft))?;
            tokio::time::sleep(EVENT_DELAY).await;
        }
        send(&EventType::KeyPress(code))?;
        tokio::time::sleep(EVENT_DELAY).await;
        Ok(())
    }

    async fn key_up(&self, key: Key) -> anyhow::Result<()> {
        let (code, shift) = rdev_key(key)?;
        send(&EventType::KeyRelease(code))?;
        tokio::time::sleep(EVENT_DELAY).await;
        if shift {
            send(&EventType::KeyRelease(RdevKey::ShiftLeft))?;
            tokio::time::sleep(EVENT_DELAY).await;
        }
        Ok(())
    }

    async fn type_text(&self, text: &str) -> anyhow::Result<()> {
        let keys: Option<Vec<(RdevKey, bool)>> = text.chars().map(char_key).collect();
        let Some(keys) = keys else {
            debug!("[computer_operator] pasting {} chars via clipboard", text.chars().count());
            set_clipboard(text)?;
            let modifier = paste_modifier();
            send(&EventType::KeyPress(modifier))?;
            tokio::time::sleep(EVENT_DELAY).await;
            tap(RdevKey::KeyV).await?;
            send(&EventType::KeyRelease(modifier))?;
            tokio::time::sleep(EVENT_DELAY).await;
            return Ok(());
        };

        for (code, shift) in keys {
            if shift {
                send(&EventType::KeyPress(RdevKey::ShiftLeft))?;
            }
            tap(code).await?;
            if shift {
                send(&EventType::KeyRelease(RdevKey::ShiftLeft))?;
            }
        }
        Ok(())
    }

    async fn scroll(&self, dx: i64, dy: i64) -> anyhow::Result<()> {
        // rdev wheel deltas are positive upwards / leftwards
        send(&EventType::Wheel {
            delta_x: -dx,
            delta_y: -dy,
        })?;
        tokio::time::sleep(EVENT_DELAY).await;
        Ok(())
    }

    async fn display_size(&self) -> anyhow::Result<Option<(f64, f64)>> {
        match rdev::display_size() {
            Ok((width, height)) => Ok(Some((width as f64, height as f64))),
            Err(e) => {
                debug!("[computer_operator] display size unavailable: {:?}", e);
                Ok(None)
            }
        }
    }
}
