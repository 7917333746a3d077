// src/parser/log_line.rs

use arrayvec::ArrayString;

/// Maximum number of characters traced per line.
pub const LOG_LINE_SIZE: usize = 100;

/// Direction of a traced line.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Direction {
    /// Command data sent to the DCE.
    Out,
    /// Data received from the DCE.
    In,
}

impl Direction {
    const fn marker(&self) -> char {
        match self {
            Direction::Out => '>',
            Direction::In => '<',
        }
    }
}

/// Accumulates the bytes of one line for tracing.
#[derive(Debug)]
pub(crate) struct LogLine {
    line: ArrayString<LOG_LINE_SIZE>,
    truncated: bool,
    dir: Direction,
    enabled: bool,
}

impl LogLine {
    pub fn new(dir: Direction, enabled: bool) -> Self {
        LogLine {
            line: ArrayString::new(),
            truncated: false,
            dir,
            enabled,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.clear();
        }
    }

    /// Appends bytes, replacing non-printable characters with `.`.
    pub fn push(&mut self, data: &[u8]) {
        if !self.enabled {
            return;
        }
        for &b in data {
            let c = if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' };
            if self.line.try_push(c).is_err() {
                self.truncated = true;
                break;
            }
        }
    }

    /// Emits the accumulated line, if any, and starts a new one.
    pub fn flush(&mut self) {
        if !self.line.is_empty() {
            let tail = if self.truncated { "~" } else { "" };
            log::trace!("{} {}{}", self.dir.marker(), self.line, tail);
        }
        self.clear();
    }

    pub fn clear(&mut self) {
        self.line.clear();
        self.truncated = false;
    }

    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        self.line.as_str()
    }

    #[cfg(test)]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}
