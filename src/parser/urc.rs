// src/parser/urc.rs

use super::{classify, response::AtResponseReader, INPUT_BUF_SIZE};
use crate::common::{
    error::AtError,
    hal_traits::{AtStream, AtTimer},
};
use alloc::boxed::Box;

/// Maximum number of URC handlers that can be registered at a time.
pub const MAX_URC_HANDLERS: usize = 16;

/// Result returned by a URC handler.
pub type UrcResult<IF> = Result<(), AtError<<IF as AtStream>::Error>>;

/// Boxed URC handler.
///
/// The handler gets a reader positioned at the beginning of the URC line and
/// the prefix it was registered for. The reader can't see past the end of
/// that line.
pub type UrcHandler<IF> = Box<dyn FnMut(&mut AtResponseReader<'_, IF>, &str) -> UrcResult<IF>>;

pub(crate) struct UrcEntry<IF>
where
    IF: AtStream + AtTimer,
{
    prefix: heapless::String<INPUT_BUF_SIZE>,
    handler: UrcHandler<IF>,
}

impl<IF> UrcEntry<IF>
where
    IF: AtStream + AtTimer,
{
    pub fn prefix(&self) -> &str {
        self.prefix.as_str()
    }

    pub fn call(&mut self, reader: &mut AtResponseReader<'_, IF>) -> UrcResult<IF> {
        let UrcEntry { prefix, handler } = self;
        handler(reader, prefix.as_str())
    }
}

/// URC handlers, one per prefix.
pub(crate) struct UrcTable<IF>
where
    IF: AtStream + AtTimer,
{
    entries: heapless::Vec<UrcEntry<IF>, MAX_URC_HANDLERS>,
}

impl<IF> UrcTable<IF>
where
    IF: AtStream + AtTimer,
{
    pub fn new() -> Self {
        UrcTable { entries: heapless::Vec::new() }
    }

    /// Registers `handler` for `prefix`, replacing any handler already
    /// registered for the same prefix.
    pub fn add(&mut self, prefix: &str, handler: UrcHandler<IF>) -> Result<(), AtError<IF::Error>> {
        if prefix.is_empty() {
            return Err(AtError::InvalidArgument);
        }
        let mut stored = heapless::String::new();
        stored.push_str(prefix).map_err(|_| AtError::InvalidArgument)?;
        self.remove(prefix);
        self.entries
            .push(UrcEntry { prefix: stored, handler })
            .map_err(|_| AtError::NoMemory)
    }

    /// Removes the handler for `prefix`. Does nothing if there is none.
    pub fn remove(&mut self, prefix: &str) {
        if let Some(pos) = self.entries.iter().position(|e| e.prefix() == prefix) {
            self.entries.remove(pos);
        }
    }

    /// Finds the handler with the longest prefix matching the line.
    pub fn find(&self, line: &[u8], complete: bool) -> classify::Match<usize> {
        classify::longest_match(
            line,
            complete,
            false,
            self.entries.iter().enumerate().map(|(i, e)| (e.prefix.as_bytes(), i)),
        )
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut UrcEntry<IF>> {
        self.entries.get_mut(index)
    }
}
