// src/parser/response.rs

use super::{
    engine::ParserCore,
    handle::{Attachment, Link},
};
use crate::common::{
    error::AtError,
    hal_traits::{AtStream, AtTimer},
    result::AtResult,
    scan::Scanner,
};
use alloc::string::String;
use core::ops::{Deref, DerefMut};

/// Reads the lines of a command response.
///
/// Echo, URC and final result lines never show up here. A reader passed to
/// a URC handler sees only the line of that URC.
///
/// I/O errors and timeouts detach the reader; every further call returns the
/// same error. Parsing errors (`InvalidFormat`) and `EndOfStream` leave it
/// attached.
pub struct AtResponseReader<'p, IF>
where
    IF: AtStream + AtTimer,
{
    attach: Attachment<'p, IF>,
}

impl<'p, IF> AtResponseReader<'p, IF>
where
    IF: AtStream + AtTimer,
{
    fn new(attach: Attachment<'p, IF>) -> Self {
        AtResponseReader { attach }
    }

    pub(crate) fn nested(core: &'p mut ParserCore<IF>) -> Self {
        Self::new(Attachment::Active(Link::new(core, None)))
    }

    /// Returns `true` if there's a response line to read.
    pub fn has_next_line(&mut self) -> Result<bool, AtError<IF::Error>> {
        self.attach.run(|link| {
            let mode = link.mode();
            link.core.has_next_line(link.urcs.as_deref_mut(), mode)
        })
    }

    /// Skips the current line. Returns `false` if there are no more lines.
    pub fn next_line(&mut self) -> Result<bool, AtError<IF::Error>> {
        self.attach.run(|link| {
            let mode = link.mode();
            link.core.next_line(link.urcs.as_deref_mut(), mode)
        })
    }

    /// Reads the current line into `buf` and moves on to the next one.
    ///
    /// Returns the number of bytes read. A line that doesn't fit is
    /// truncated to `buf.len()` bytes and the rest of it is skipped. Returns
    /// `Ok(0)` if there are no more lines.
    pub fn read_line(&mut self, buf: &mut [u8]) -> Result<usize, AtError<IF::Error>> {
        self.attach.run(|link| {
            let mode = link.mode();
            link.core.read_line(link.urcs.as_deref_mut(), mode, buf)
        })
    }

    /// Reads the whole current line into an owned string.
    ///
    /// Returns `Ok(None)` if there are no more lines, and `InvalidFormat` if
    /// the line isn't valid UTF-8 (the line is consumed either way).
    pub fn read_line_string(&mut self) -> Result<Option<String>, AtError<IF::Error>> {
        let line = self.attach.run(|link| {
            let mode = link.mode();
            link.core.read_line_owned(link.urcs.as_deref_mut(), mode)
        })?;
        match line {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| AtError::InvalidFormat),
            None => Ok(None),
        }
    }

    /// Reads the current line and parses it with `f`.
    ///
    /// Fails with `EndOfStream` if there are no more lines, and with
    /// `InvalidFormat` if `f` returns `None`.
    pub fn scan_line<T, F>(&mut self, f: F) -> Result<T, AtError<IF::Error>>
    where
        F: FnOnce(&mut Scanner<'_>) -> Option<T>,
    {
        let line = self.read_line_string()?.ok_or(AtError::EndOfStream)?;
        let mut scanner = Scanner::new(&line);
        f(&mut scanner).ok_or(AtError::InvalidFormat)
    }

    /// Returns the error that detached this reader, if any.
    pub fn error(&self) -> Option<&AtError<IF::Error>> {
        self.attach.error()
    }
}

/// Response of a sent command.
///
/// Dereferences to [`AtResponseReader`] for reading response lines.
/// Dropping a response that hasn't been read to the end skips the rest of
/// it and releases the parser.
pub struct AtResponse<'p, IF>
where
    IF: AtStream + AtTimer,
{
    reader: AtResponseReader<'p, IF>,
}

impl<'p, IF> AtResponse<'p, IF>
where
    IF: AtStream + AtTimer,
{
    pub(crate) fn new(link: Link<'p, IF>) -> Self {
        AtResponse {
            reader: AtResponseReader::new(Attachment::Active(link)),
        }
    }

    pub(crate) fn detached(err: AtError<IF::Error>) -> Self {
        AtResponse {
            reader: AtResponseReader::new(Attachment::Detached(err)),
        }
    }

    /// Skips any remaining response lines and returns the final result code.
    ///
    /// A result other than `AtResult::Ok` is not an error: the command was
    /// processed and the DCE reported how it went.
    pub fn read_result(mut self) -> Result<AtResult, AtError<IF::Error>> {
        self.finish()
    }

    fn finish(&mut self) -> Result<AtResult, AtError<IF::Error>> {
        let res = self.reader.attach.run(|link| link.read_result());
        if let Some(link) = self.reader.attach.take() {
            link.core.finalize(false);
        }
        res
    }
}

impl<'p, IF> Deref for AtResponse<'p, IF>
where
    IF: AtStream + AtTimer,
{
    type Target = AtResponseReader<'p, IF>;

    fn deref(&self) -> &Self::Target {
        &self.reader
    }
}

impl<IF> DerefMut for AtResponse<'_, IF>
where
    IF: AtStream + AtTimer,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.reader
    }
}

impl<IF> Drop for AtResponse<'_, IF>
where
    IF: AtStream + AtTimer,
{
    fn drop(&mut self) {
        if self.reader.attach.is_active() {
            if let Err(e) = self.finish() {
                log::debug!("Unread response dropped: {}", e);
            }
        }
    }
}
