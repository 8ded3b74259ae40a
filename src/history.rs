use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

/// Committed input lines plus an always-present empty slot at the end,
/// which is what the editor shows before browsing.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<String>,
    idx: usize,
    max_len: usize, // 0 keeps everything
    unsaved: usize, // Entries committed since the last save
}

impl History {
    pub fn new(max_len: usize) -> Self {
        History {
            entries: vec![String::new()],
            idx: 0,
            max_len,
            unsaved: 0,
        }
    }

    /// Load from a history file. A missing file is an empty history.
    pub fn load<P: AsRef<Path>>(path: P, max_len: usize) -> io::Result<Self> {
        let mut history = Self::new(max_len);
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(history),
            Err(e) => return Err(e),
        };

        for line in BufReader::new(file).lines() {
            history.push(&line?);
        }
        history.unsaved = 0;
        Ok(history)
    }

    /// Append the entries committed since the last save.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> io::Result<()> {
        if self.unsaved == 0 {
            return Ok(());
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .mode(0o600)
            .open(path)?;

        let committed = self.entries();
        for line in &committed[committed.len() - self.unsaved..] {
            writeln!(file, "{}", line)?;
        }
        file.flush()?;
        self.unsaved = 0;
        Ok(())
    }

    /// Commit an input line. Blank input is not recorded.
    pub fn add(&mut self, line: &str) {
        if self.push(line) {
            self.unsaved = (self.unsaved + 1).min(self.len());
        }
        self.to_end();
    }

    fn push(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return false;
        }
        if let Some(slot) = self.entries.last_mut() {
            *slot = trimmed.to_string();
        }
        self.entries.push(String::new());

        // Drop the oldest entries past the limit
        if self.max_len > 0 && self.len() > self.max_len {
            let excess = self.len() - self.max_len;
            self.entries.drain(..excess);
        }
        self.idx = self.idx.min(self.entries.len() - 1);
        true
    }

    /// Step towards older entries; stays put at the oldest.
    pub fn up(&mut self) -> &str {
        self.idx = self.idx.saturating_sub(1);
        &self.entries[self.idx]
    }

    /// Step towards newer entries; stays put at the empty slot.
    pub fn down(&mut self) -> &str {
        if self.idx + 1 < self.entries.len() {
            self.idx += 1;
        }
        &self.entries[self.idx]
    }

    pub fn to_end(&mut self) {
        self.idx = self.entries.len() - 1;
    }

    /// Committed entries, oldest first.
    pub fn entries(&self) -> &[String] {
        &self.entries[..self.entries.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(0)
    }
}
