//! Key-name table shared by both operators.
//!
//! Models write keys the way humans do: `ctrl`, `Meta+Shift+T`, `esc`, `f5`,
//! `ctrl c`. Every name resolves to exactly one [`Key`] or fails with
//! [`UnknownKey`]; there is no fallback key.

use crate::errors::UnknownKey;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Ctrl,
    Alt,
    Shift,
    Meta,
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    Space,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    CapsLock,
    NumLock,
    ScrollLock,
    PrintScreen,
    Pause,
    Up,
    Down,
    Left,
    Right,
    /// F1 to F24.
    F(u8),
    /// A printable character; ASCII letters are stored lowercase.
    Char(char),
}

impl Key {
    /// Resolve a human key name. Case-insensitive.
    pub fn parse(name: &str) -> Result<Key, UnknownKey> {
        let trimmed = name.trim();
        let lower = trimmed.to_lowercase();

        let key = match lower.as_str() {
            // Modifiers
            "control" | "ctrl" | "ctl" => Key::Ctrl,
            "alt" | "option" | "opt" => Key::Alt,
            "shift" => Key::Shift,
            "meta" | "cmd" | "command" | "win" | "windows" | "super" => Key::Meta,

            // Common special keys
            "enter" | "return" => Key::Enter,
            "tab" => Key::Tab,
            "escape" | "esc" => Key::Escape,
            "backspace" | "back" => Key::Backspace,
            "delete" | "del" => Key::Delete,
            "space" | "spacebar" => Key::Space,
            "insert" | "ins" => Key::Insert,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" | "page_up" | "pgup" => Key::PageUp,
            "pagedown" | "page_down" | "pgdn" | "pgdown" => Key::PageDown,
            "capslock" | "caps" => Key::CapsLock,
            "numlock" => Key::NumLock,
            "scrolllock" => Key::ScrollLock,
            "printscreen" | "prtsc" => Key::PrintScreen,
            "pause" => Key::Pause,
            "plus" => Key::Char('+'),
            "minus" => Key::Char('-'),

            // Arrow keys
            "up" | "arrowup" => Key::Up,
            "down" | "arrowdown" => Key::Down,
            "left" | "arrowleft" => Key::Left,
            "right" | "arrowright" => Key::Right,

            // Function keys
            s if s.starts_with('f') && s.len() >= 2 && s.len() <= 3 => match s[1..].parse::<u8>() {
                Ok(n) if (1..=24).contains(&n) => Key::F(n),
                _ => return Err(UnknownKey::new(trimmed)),
            },

            s if s.chars().count() == 1 => {
                let c = s.chars().next().ok_or_else(|| UnknownKey::new(trimmed))?;
                if c.is_control() {
                    return Err(UnknownKey::new(trimmed));
                }
                Key::Char(c)
            }

            _ => return Err(UnknownKey::new(trimmed)),
        };
        Ok(key)
    }

    pub fn is_modifier(&self) -> bool {
        matches!(self, Key::Ctrl | Key::Alt | Key::Shift | Key::Meta)
    }

    /// Bit in the CDP `modifiers` mask (Alt=1, Ctrl=2, Meta=4, Shift=8).
    pub fn modifier_bit(&self) -> i64 {
        match self {
            Key::Alt => 1,
            Key::Ctrl => 2,
            Key::Meta => 4,
            Key::Shift => 8,
            _ => 0,
        }
    }

    /// DOM `KeyboardEvent.key` value.
    pub fn dom_key(&self) -> String {
        let name = match self {
            Key::Ctrl => "Control",
            Key::Alt => "Alt",
            Key::Shift => "Shift",
            Key::Meta => "Meta",
            Key::Enter => "Enter",
            Key::Tab => "Tab",
            Key::Escape => "Escape",
            Key::Backspace => "Backspace",
            Key::Delete => "Delete",
            Key::Space => " ",
            Key::Insert => "Insert",
            Key::Home => "Home",
            Key::End => "End",
            Key::PageUp => "PageUp",
            Key::PageDown => "PageDown",
            Key::CapsLock => "CapsLock",
            Key::NumLock => "NumLock",
            Key::ScrollLock => "ScrollLock",
            Key::PrintScreen => "PrintScreen",
            Key::Pause => "Pause",
            Key::Up => "ArrowUp",
            Key::Down => "ArrowDown",
            Key::Left => "ArrowLeft",
            Key::Right => "ArrowRight",
            Key::F(n) => return format!("F{n}"),
            Key::Char(c) => return c.to_string(),
        };
        name.to_string()
    }

    /// DOM `KeyboardEvent.code` value (physical key on a US layout).
    pub fn dom_code(&self) -> String {
        let code = match self {
            Key::Ctrl => "ControlLeft",
            Key::Alt => "AltLeft",
            Key::Shift => "ShiftLeft",
            Key::Meta => "MetaLeft",
            Key::Space => "Space",
            Key::F(n) => return format!("F{n}"),
            Key::Char(c) => return char_code(*c).unwrap_or_default(),
            other => return other.dom_key(),
        };
        code.to_string()
    }

    /// Windows virtual key code, also used by CDP key events.
    pub fn virtual_key_code(&self) -> i64 {
        match self {
            Key::Backspace => 8,
            Key::Tab => 9,
            Key::Enter => 13,
            Key::Shift => 16,
            Key::Ctrl => 17,
            Key::Alt => 18,
            Key::Pause => 19,
            Key::CapsLock => 20,
            Key::Escape => 27,
            Key::Space => 32,
            Key::PageUp => 33,
            Key::PageDown => 34,
            Key::End => 35,
            Key::Home => 36,
            Key::Left => 37,
            Key::Up => 38,
            Key::Right => 39,
            Key::Down => 40,
            Key::PrintScreen => 44,
            Key::Insert => 45,
            Key::Delete => 46,
            Key::Meta => 91,
            Key::NumLock => 144,
            Key::ScrollLock => 145,
            Key::F(n) => 111 + *n as i64,
            Key::Char(c) => char_virtual_key_code(*c),
        }
    }

    /// Text a key press inserts, if any.
    pub fn text(&self) -> Option<String> {
        match self {
            Key::Enter => Some("\r".to_string()),
            Key::Space => Some(" ".to_string()),
            Key::Tab => Some("\t".to_string()),
            Key::Char(c) => Some(c.to_string()),
            _ => None,
        }
    }
}

fn char_code(c: char) -> Option<String> {
    if c.is_ascii_alphabetic() {
        return Some(format!("Key{}", c.to_ascii_uppercase()));
    }
    if c.is_ascii_digit() {
        return Some(format!("Digit{c}"));
    }
    let code = match c {
        ';' | ':' => "Semicolon",
        '=' | '+' => "Equal",
        ',' | '<' => "Comma",
        '-' | '_' => "Minus",
        '.' | '>' => "Period",
        '/' | '?' => "Slash",
        '`' | '~' => "Backquote",
        '[' | '{' => "BracketLeft",
        '\\' | '|' => "Backslash",
        ']' | '}' => "BracketRight",
        '\'' | '"' => "Quote",
        _ => return None,
    };
    Some(code.to_string())
}

fn char_virtual_key_code(c: char) -> i64 {
    if c.is_ascii_alphanumeric() {
        return c.to_ascii_uppercase() as i64;
    }
    match c {
        ';' | ':' => 186,
        '=' | '+' => 187,
        ',' | '<' => 188,
        '-' | '_' => 189,
        '.' | '>' => 190,
        '/' | '?' => 191,
        '`' | '~' => 192,
        '[' | '{' => 219,
        '\\' | '|' => 220,
        ']' | '}' => 221,
        '\'' | '"' => 222,
        _ => 0,
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Ctrl => f.write_str("ctrl"),
            Key::Alt => f.write_str("alt"),
            Key::Shift => f.write_str("shift"),
            Key::Meta => f.write_str("meta"),
            Key::Space => f.write_str("space"),
            Key::F(n) => write!(f, "f{n}"),
            Key::Char(c) => write!(f, "{c}"),
            other => f.write_str(&other.dom_key().to_lowercase()),
        }
    }
}

/// Parse a chord such as `ctrl+shift+t` or `ctrl c` into keys in input order.
///
/// A `+` that starts a key and is followed by `+` or the end of input is the
/// plus key itself, so `ctrl++` is ctrl and plus. A separator with no key after
/// it (`ctrl+`) is an error rather than a shorter chord.
pub fn parse_chord(spec: &str) -> Result<Vec<Key>, UnknownKey> {
    let mut keys = Vec::new();
    let mut current = String::new();
    let mut dangling = false;
    let mut chars = spec.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '+' && current.is_empty() && matches!(chars.peek(), None | Some('+')) {
            keys.push(Key::Char('+'));
            dangling = false;
        } else if c == '+' || c.is_whitespace() {
            if !current.is_empty() {
                keys.push(Key::parse(&current)?);
                current.clear();
            }
            if c == '+' {
                dangling = true;
            }
        } else {
            current.push(c);
            dangling = false;
        }
    }
    if !current.is_empty() {
        keys.push(Key::parse(&current)?);
    }
    if dangling || keys.is_empty() {
        return Err(UnknownKey::new(spec));
    }
    Ok(keys)
}

/// Key-down order of a chord: as written.
pub fn chord_down_order(keys: &[Key]) -> Vec<Key> {
    keys.to_vec()
}

/// Key-up order of a chord: reverse of key-down.
pub fn chord_up_order(keys: &[Key]) -> Vec<Key> {
    keys.iter().rev().copied().collect()
}
