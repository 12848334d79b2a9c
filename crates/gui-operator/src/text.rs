//! Handling of the `content` argument of `type`.
//!
//! Models write escapes literally (`\n` as two characters). A trailing newline,
//! literal or real, means "submit": the text before it is typed and the newline
//! becomes a real Enter press.

/// Text to type plus whether Enter should follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedText {
    pub text: String,
    pub submit: bool,
}

/// Replace the two-character escapes `\n`, `\t`, `\r` and `\\` with the real characters.
pub fn unescape(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

pub fn prepare(content: &str) -> TypedText {
    let trimmed = content.trim_end_matches([' ', '\t']);
    let (body, submit) = if let Some(body) = trimmed.strip_suffix("\\n") {
        (body, true)
    } else if let Some(body) = trimmed.strip_suffix('\n') {
        (body, true)
    } else {
        (content, false)
    };
    TypedText {
        text: unescape(body),
        submit,
    }
}
