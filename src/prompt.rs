use std::io::{self, Write};
use crate::config::DEFAULT_PROMPT_MULTILINE;
use crate::environment::Environment;
use crate::error::ShellError;
use crate::highlighter::Highlighter;
use crate::history::History;
use crate::io::{ansi, Key, ModeGuard, RawFlags, TerminalDriver};

const IGNORE_START: char = '\x01';
const IGNORE_END: char = '\x02';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptFlags {
    pub interactive: bool,
    pub show_possible_errors: bool,
    pub syntax_highlighting: bool,
}

impl Default for PromptFlags {
    fn default() -> Self {
        PromptFlags {
            interactive: true,
            show_possible_errors: true,
            syntax_highlighting: true,
        }
    }
}

/// A prompt split for drawing: `head` is printed once, `last` on every
/// redraw. Ignore markers are removed from both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptParts {
    pub head: String,
    pub last: String,
    pub visible_len: usize,
}

pub fn split_prompt(prompt: &str) -> PromptParts {
    let (head, last) = match prompt.rfind('\n') {
        Some(idx) => prompt.split_at(idx + 1),
        None => ("", prompt),
    };
    PromptParts {
        head: strip_markers(head),
        last: strip_markers(last),
        visible_len: visible_len(last),
    }
}

/// Characters the terminal will show, skipping `\x01 .. \x02` regions.
pub fn visible_len(line: &str) -> usize {
    let mut skip = false;
    let mut len = 0;
    for ch in line.chars() {
        match ch {
            IGNORE_START => skip = true,
            IGNORE_END => skip = false,
            _ if !skip => len += 1,
            _ => {}
        }
    }
    len
}

pub fn strip_markers(s: &str) -> String {
    s.chars().filter(|&c| c != IGNORE_START && c != IGNORE_END).collect()
}

/// Rows taken by `len` characters starting at column 0.
pub fn rows_used(len: usize, width: usize) -> usize {
    len / width.max(1) + 1
}

/// Row and column of character offset `offset`.
pub fn cursor_position(offset: usize, width: usize) -> (usize, usize) {
    let width = width.max(1);
    (offset / width, offset % width)
}

/// Expand `\u \h \w \ex \e \\` and the `\[ \]` markers in a prompt template.
pub fn expand_template(template: &str, env: &Environment) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('u') => out.push_str(env.get("USER").unwrap_or_default()),
            Some('h') => out.push_str(env.get("HOSTNAME").unwrap_or_default()),
            Some('w') => out.push_str(&working_dir(env)),
            Some('e') if chars.peek() == Some(&'x') => {
                chars.next();
                out.push_str(&env.last_status.to_string());
            }
            Some('e') => out.push('\x1b'),
            Some('[') => out.push(IGNORE_START),
            Some(']') => out.push(IGNORE_END),
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

fn working_dir(env: &Environment) -> String {
    let pwd = env.get("PWD").unwrap_or_default();
    match env.get("HOME").filter(|h| !h.is_empty()) {
        Some(home) => match pwd.strip_prefix(home) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => format!("~{}", rest),
            _ => pwd.to_string(),
        },
        None => pwd.to_string(),
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Where the last render left things, in characters of the edited line.
#[derive(Debug, Clone, Copy, Default)]
struct Drawn {
    len: usize,
    cursor: usize,
    error_line: bool,
}

/// The interactive line editor.
pub struct Prompt {
    pub history: History,
    pub flags: PromptFlags,
    /// Expanded prompt for continuation lines.
    pub continuation: String,
    lines: Vec<String>, // Finished continuation lines
    line: Vec<char>,
    cursor: usize,
}

impl Prompt {
    pub fn new(history: History, flags: PromptFlags) -> Self {
        Prompt {
            history,
            flags,
            continuation: DEFAULT_PROMPT_MULTILINE.to_string(),
            lines: Vec::new(),
            line: Vec::new(),
            cursor: 0,
        }
    }

    /// Edit one input in raw mode and return it once Enter is pressed.
    ///
    /// A line ending in `\` continues on the next row; the rows are joined
    /// with `"; "`. Ctrl+D on an empty line gives `UnexpectedEof`. The
    /// terminal mode is restored however this returns.
    pub fn read_line<T: TerminalDriver>(
        &mut self,
        term: &mut T,
        prompt: &str,
        highlighter: Option<&Highlighter>,
    ) -> io::Result<String> {
        let flags = RawFlags {
            disable_flow_control: self.flags.interactive,
        };
        let mut term = ModeGuard::acquire(term, flags)?;
        self.clear();

        let parts = split_prompt(prompt);
        let mut prompt_line = parts.last;
        let mut prompt_len = parts.visible_len;
        write!(term, "{}", parts.head)?;

        let mut width = usize::from(term.query_size().1);
        let mut drawn: Option<Drawn> = None;

        loop {
            let (text, diagnostic) = self.decorate(highlighter);
            drawn = Some(self.render(
                &mut *term,
                &prompt_line,
                prompt_len,
                width,
                &text,
                diagnostic.as_ref(),
                drawn,
            )?);

            let Some(key) = term.read_key(true)? else {
                continue;
            };

            match key {
                Key::Enter if self.line.last() == Some(&'\\') => {
                    self.line.pop();
                    self.finish_line(&mut *term, prompt_len, width, drawn)?;
                    self.lines.push(self.line.iter().collect());
                    self.line.clear();
                    self.cursor = 0;
                    let parts = split_prompt(&self.continuation);
                    write!(term, "{}", parts.head)?;
                    prompt_line = parts.last;
                    prompt_len = parts.visible_len;
                    drawn = None;
                }
                Key::Enter => break,
                Key::Char(4) if self.line.is_empty() && self.lines.is_empty() => {
                    self.finish_line(&mut *term, prompt_len, width, drawn)?;
                    return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of input"));
                }
                Key::Backspace => self.erase(),
                Key::Left => self.move_left(),
                Key::Right => self.move_right(),
                Key::CtrlLeft => self.move_word_left(),
                Key::CtrlRight => self.move_word_right(),
                Key::Up => {
                    let entry = self.history.up().to_string();
                    self.set_input(&entry);
                }
                Key::Down => {
                    let entry = self.history.down().to_string();
                    self.set_input(&entry);
                }
                Key::Resize => width = usize::from(term.query_size().1),
                key if key.is_printable() => {
                    if let Key::Char(byte) = key {
                        self.insert(char::from(byte));
                    }
                }
                _ => {}
            }
        }

        self.finish_line(&mut *term, prompt_len, width, drawn)?;

        self.lines.push(self.line.iter().collect());
        let input = self.lines.join("; ");
        self.history.add(&input);
        self.clear();
        Ok(input)
    }

    fn clear(&mut self) {
        self.lines.clear();
        self.line.clear();
        self.cursor = 0;
        self.history.to_end();
    }

    pub fn buffer(&self) -> String {
        self.line.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_input(&mut self, input: &str) {
        self.line = input.chars().collect();
        self.cursor = self.line.len();
    }

    pub fn insert(&mut self, ch: char) {
        self.line.insert(self.cursor, ch);
        self.cursor += 1;
    }

    /// Delete the character left of the cursor.
    pub fn erase(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.line.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.line.len());
    }

    /// Skip whitespace, then a run of word characters. Moves at least one
    /// position when not already at the start.
    pub fn move_word_left(&mut self) {
        let start = self.cursor;
        while self.cursor > 0 && self.line[self.cursor - 1].is_whitespace() {
            self.cursor -= 1;
        }
        while self.cursor > 0 && is_word_char(self.line[self.cursor - 1]) {
            self.cursor -= 1;
        }
        if self.cursor == start {
            self.move_left();
        }
    }

    pub fn move_word_right(&mut self) {
        let start = self.cursor;
        let len = self.line.len();
        while self.cursor < len && self.line[self.cursor].is_whitespace() {
            self.cursor += 1;
        }
        while self.cursor < len && is_word_char(self.line[self.cursor]) {
            self.cursor += 1;
        }
        if self.cursor == start {
            self.move_right();
        }
    }

    fn decorate(&self, highlighter: Option<&Highlighter>) -> (String, Option<ShellError>) {
        let line = self.buffer();
        let wanted = self.flags.show_possible_errors || self.flags.syntax_highlighting;
        match highlighter {
            Some(h) if self.flags.interactive && wanted => {
                let out = h.highlight(&line, "stdin");
                let text = if self.flags.syntax_highlighting { out.text } else { line };
                let diagnostic = out.diagnostic.filter(|_| self.flags.show_possible_errors);
                (text, diagnostic)
            }
            _ => (line, None),
        }
    }

    /// Redraw the prompt's last line and the input, plus the possible-error
    /// row under them. Everything the previous render drew is cleared first.
    #[allow(clippy::too_many_arguments)]
    fn render<W: Write>(
        &self,
        out: &mut W,
        prompt_line: &str,
        prompt_len: usize,
        width: usize,
        text: &str,
        diagnostic: Option<&ShellError>,
        prev: Option<Drawn>,
    ) -> io::Result<Drawn> {
        let mut buf = String::from(ansi::HIDE_CURSOR);

        // Back to the top row of the previous render and wipe it
        if let Some(prev) = prev {
            let (cursor_row, _) = cursor_position(prompt_len + prev.cursor, width);
            let rows = rows_used(prompt_len + prev.len, width) + usize::from(prev.error_line);
            buf.push_str(&ansi::cursor_up(cursor_row));
            buf.push('\r');
            for row in 0..rows {
                if row > 0 {
                    buf.push_str(&ansi::cursor_down(1));
                }
                buf.push_str(ansi::CLEAR_LINE);
            }
            buf.push_str(&ansi::cursor_up(rows - 1));
        } else {
            buf.push('\r');
            buf.push_str(ansi::CLEAR_LINE);
        }

        buf.push_str(prompt_line);
        buf.push_str(text);
        buf.push_str(ansi::RESET);

        let total = prompt_len + self.line.len();
        // The terminal holds the cursor on the last column; move it down
        // so the row count below stays true
        if total > 0 && total % width.max(1) == 0 {
            buf.push_str("\r\n");
            buf.push_str(ansi::CLEAR_LINE);
        }
        let rows = rows_used(total, width);
        let mut bottom = rows - 1;

        if let Some(err) = diagnostic {
            let msg: String = format!("Error: {}", err)
                .chars()
                .take(width.saturating_sub(1))
                .collect();
            buf.push_str("\r\n");
            buf.push_str(ansi::CLEAR_LINE);
            buf.push_str(ansi::GREY);
            buf.push_str(&msg);
            buf.push_str(ansi::RESET);
            bottom += 1;
        }

        let (row, col) = cursor_position(prompt_len + self.cursor, width);
        buf.push_str(&ansi::cursor_up(bottom - row));
        buf.push('\r');
        buf.push_str(&ansi::cursor_right(col));
        buf.push_str(ansi::SHOW_CURSOR);

        out.write_all(buf.as_bytes())?;
        out.flush()?;

        Ok(Drawn {
            len: self.line.len(),
            cursor: self.cursor,
            error_line: diagnostic.is_some(),
        })
    }

    /// Leave the current line: drop the error row and put the cursor on a
    /// fresh row under the input.
    fn finish_line<W: Write>(
        &self,
        out: &mut W,
        prompt_len: usize,
        width: usize,
        drawn: Option<Drawn>,
    ) -> io::Result<()> {
        let mut buf = String::new();
        if let Some(drawn) = drawn {
            let (cursor_row, _) = cursor_position(prompt_len + drawn.cursor, width);
            let last_row = rows_used(prompt_len + drawn.len, width) - 1;
            buf.push_str(&ansi::cursor_down(last_row - cursor_row));
            if drawn.error_line {
                buf.push_str(&ansi::cursor_down(1));
                buf.push('\r');
                buf.push_str(ansi::CLEAR_LINE);
                buf.push_str(&ansi::cursor_up(1));
            }
        }
        buf.push_str("\r\n");
        out.write_all(buf.as_bytes())?;
        out.flush()
    }
}
