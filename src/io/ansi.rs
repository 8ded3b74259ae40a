//! ANSI escape sequences used by the line editor, the highlighter and
//! diagnostics.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const ITALICS: &str = "\x1b[3m";
pub const UNDERLINE: &str = "\x1b[4m";

pub const GREEN: &str = "\x1b[32m";
pub const MAGENTA: &str = "\x1b[35m";
pub const CYAN: &str = "\x1b[36m";

pub const GREY: &str = "\x1b[90m";
pub const BRIGHT_RED: &str = "\x1b[91m";
pub const BRIGHT_GREEN: &str = "\x1b[92m";
pub const BRIGHT_YELLOW: &str = "\x1b[93m";
pub const BRIGHT_BLUE: &str = "\x1b[94m";
pub const BRIGHT_MAGENTA: &str = "\x1b[95m";
pub const BRIGHT_CYAN: &str = "\x1b[96m";

pub const CLEAR_LINE: &str = "\x1b[2K";
pub const HIDE_CURSOR: &str = "\x1b[?25l";
pub const SHOW_CURSOR: &str = "\x1b[?25h";

pub fn cursor_up(n: usize) -> String {
    if n == 0 { String::new() } else { format!("\x1b[{}A", n) }
}

pub fn cursor_down(n: usize) -> String {
    if n == 0 { String::new() } else { format!("\x1b[{}B", n) }
}

pub fn cursor_right(n: usize) -> String {
    if n == 0 { String::new() } else { format!("\x1b[{}C", n) }
}

/// Remove CSI escape sequences (`ESC [ ... final`) from `s`.
pub fn strip(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // Parameter and intermediate bytes, then one final byte
            for c in chars.by_ref() {
                if ('\x40'..='\x7e').contains(&c) {
                    break;
                }
            }
            continue;
        }
        out.push(ch);
    }
    out
}
