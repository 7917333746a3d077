// src/parser/buffer.rs

use super::log_line::{Direction, LogLine};
use crate::common::error::AtError;
use core::fmt::Debug;

#[inline]
pub(crate) fn is_line_break(b: u8) -> bool {
    b == b'\r' || b == b'\n'
}

/// Result of copying line data out of the buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct LineChunk {
    /// Number of bytes copied.
    pub copied: usize,
    /// The end of the line has been reached.
    pub line_end: bool,
}

/// Fixed-capacity input buffer that frames received bytes into lines.
///
/// Unconsumed bytes always start at offset 0. A line is the run of bytes up
/// to the next CR or LF; runs of CR/LF bytes are a single boundary, so blank
/// lines never surface. Consumed line data is mirrored to the trace log.
#[derive(Debug)]
pub(crate) struct LineBuffer<const N: usize> {
    data: [u8; N],
    len: usize,
    log: LogLine,
}

impl<const N: usize> LineBuffer<N> {
    pub fn new(log_enabled: bool) -> Self {
        LineBuffer {
            data: [0; N],
            len: 0,
            log: LogLine::new(Direction::In, log_enabled),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        N - self.len
    }

    /// Buffered, unconsumed bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Free space for the next transport read. Follow with `commit()`.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.len..]
    }

    /// Accounts for `n` bytes received into `spare_mut()`.
    ///
    /// More than the free space is an overflow error, never a silent drop:
    /// the caller has to consume buffered data before reading more.
    pub fn commit<E: Debug>(&mut self, n: usize) -> Result<(), AtError<E>> {
        if n > self.remaining() {
            return Err(AtError::BufferOverflow {
                needed: self.len + n,
                got: N,
            });
        }
        self.len += n;
        Ok(())
    }

    /// Returns the position of the first CR or LF.
    pub fn find_line_break(&self) -> Option<usize> {
        self.as_bytes().iter().position(|b| is_line_break(*b))
    }

    /// Drops the run of CR/LF bytes at the front of the buffer.
    pub fn skip_line_breaks(&mut self) -> usize {
        let n = self.as_bytes().iter().take_while(|b| is_line_break(**b)).count();
        if n > 0 {
            self.log.flush();
            self.drain(n);
        }
        n
    }

    /// Returns the buffered bytes of the current line and whether its end
    /// is already buffered.
    pub fn line(&self) -> (&[u8], bool) {
        match self.find_line_break() {
            Some(pos) => (&self.data[..pos], true),
            None => (self.as_bytes(), false),
        }
    }

    /// Copies up to `out.len()` bytes of the current line into `out`.
    pub fn consume_line(&mut self, out: &mut [u8]) -> LineChunk {
        let (line, complete) = self.line();
        let n = line.len().min(out.len());
        out[..n].copy_from_slice(&line[..n]);
        let line_end = complete && n == line.len();
        self.consume(n);
        if line_end {
            self.log.flush();
        }
        LineChunk { copied: n, line_end }
    }

    /// Drops the buffered bytes of the current line. Returns `true` if the
    /// end of the line has been reached.
    pub fn discard_line(&mut self) -> bool {
        let (line, complete) = self.line();
        let n = line.len();
        self.consume(n);
        if complete {
            self.log.flush();
        }
        complete
    }

    /// Consumes `n` bytes of line data.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.len);
        self.log.push(&self.data[..n]);
        self.drain(n);
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.log.clear();
    }

    pub fn set_log_enabled(&mut self, enabled: bool) {
        self.log.set_enabled(enabled);
    }

    fn drain(&mut self, n: usize) {
        self.data.copy_within(n..self.len, 0);
        self.len -= n;
    }
}
