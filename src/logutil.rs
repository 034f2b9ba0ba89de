//! Logging helpers that keep chat queries and model replies on a single log line.
//!
//! Model replies routinely span dozens of lines with fenced blocks; logging them raw
//! breaks grep-ability of the log file. Everything multi-line goes through
//! [`escape_log`] before it reaches a `log` macro.

/// Default number of characters kept before the ellipsis.
pub const DEFAULT_PREVIEW: usize = 300;

/// Escape a string for single-line logging, capped at [`DEFAULT_PREVIEW`] characters.
///
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
/// - other control characters => `\\xNN`
pub fn escape_log(s: &str) -> String {
    escape_log_with_limit(s, DEFAULT_PREVIEW)
}

/// Same as [`escape_log`] with an explicit character cap.
pub fn escape_log_with_limit(s: &str, max_preview: usize) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(s.len().min(max_preview) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= max_preview {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Strip Minecraft `§x` formatting pairs so decorated chat lines read cleanly in logs.
pub fn strip_formatting(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '§' {
            chars.next();
            continue;
        }
        out.push(ch);
    }
    out
}
