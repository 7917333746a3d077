// src/parser/command.rs

use super::{
    handle::{Attachment, Link},
    response::AtResponse,
};
use crate::common::{
    error::AtError,
    hal_traits::{AtStream, AtTimer},
    result::AtResult,
};
use arrayvec::ArrayString;
use core::fmt;
use core::time::Duration;

/// Size of the stack buffer `printf()` formats into before falling back to
/// a heap allocation.
pub const PRINTF_INIT_BUF_SIZE: usize = 128;

/// An AT command being written.
///
/// Obtained from [`AtParser::command()`](super::AtParser::command). Command
/// data is written to the stream as it is added, so the methods can be
/// chained:
///
/// ```ignore
/// let res = parser
///     .command()
///     .print("AT+CGDCONT=1,\"IP\",")
///     .printf(format_args!("\"{}\"", apn))
///     .exec()?;
/// ```
///
/// The first error detaches the command from the parser; it is then returned
/// by [`send()`](Self::send) or [`exec()`](Self::exec). Dropping a command
/// that hasn't been sent terminates the command line and releases the parser.
pub struct AtCommand<'p, IF>
where
    IF: AtStream + AtTimer,
{
    attach: Attachment<'p, IF>,
}

impl<'p, IF> AtCommand<'p, IF>
where
    IF: AtStream + AtTimer,
{
    pub(crate) fn new(link: Link<'p, IF>) -> Self {
        AtCommand {
            attach: Attachment::Active(link),
        }
    }

    pub(crate) fn detached(err: AtError<IF::Error>) -> Self {
        AtCommand {
            attach: Attachment::Detached(err),
        }
    }

    /// Writes raw command data.
    pub fn write(mut self, data: &[u8]) -> Self {
        let _ = self.attach.run(|link| link.core.write(data));
        self
    }

    /// Writes a string.
    pub fn print(self, s: &str) -> Self {
        self.write(s.as_bytes())
    }

    /// Writes formatted command data.
    pub fn printf(self, args: fmt::Arguments<'_>) -> Self {
        let mut buf = ArrayString::<PRINTF_INIT_BUF_SIZE>::new();
        if fmt::write(&mut buf, args).is_ok() {
            return self.print(&buf);
        }
        let s = alloc::fmt::format(args);
        self.print(&s)
    }

    /// Sets the timeout of this command, replacing the parser's default.
    ///
    /// The timeout covers the whole command, including the time spent
    /// writing it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let _ = self.attach.run(|link| {
            link.core.set_budget(timeout);
            Ok(())
        });
        self
    }

    /// Returns the error that detached this command, if any.
    pub fn error(&self) -> Option<&AtError<IF::Error>> {
        self.attach.error()
    }

    /// Terminates the command line and returns a handle for reading the
    /// response.
    pub fn send(mut self) -> AtResponse<'p, IF> {
        if let Err(e) = self.attach.run(|link| link.core.send_command()) {
            return AtResponse::detached(e);
        }
        match self.attach.take() {
            Some(link) => AtResponse::new(link),
            None => AtResponse::detached(AtError::InvalidState),
        }
    }

    /// Sends the command and reads its final result code, skipping any
    /// response lines.
    pub fn exec(self) -> Result<AtResult, AtError<IF::Error>> {
        self.send().read_result()
    }
}

impl<IF> Drop for AtCommand<'_, IF>
where
    IF: AtStream + AtTimer,
{
    fn drop(&mut self) {
        if let Some(link) = self.attach.take() {
            link.core.reset_command();
        }
    }
}
