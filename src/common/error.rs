// src/common/error.rs

use core::fmt::Debug;

/// Errors produced by the AT parser and its command/response handles.
///
/// `E` is the error type of the underlying [`AtStream`](super::hal_traits::AtStream).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AtError<E = ()>
where
    E: Debug,
{
    /// Underlying I/O error from the transport.
    #[error("I/O error: {0:?}")]
    Io(E),

    /// The command's timeout budget ran out.
    #[error("Operation timed out")]
    Timeout,

    /// Non-blocking operation (zero timeout) found no data to process.
    #[error("Operation would block")]
    WouldBlock,

    /// Another command is in progress.
    #[error("Parser is busy")]
    Busy,

    /// Operation is not valid in the current state (e.g. the handle is detached).
    #[error("Invalid state")]
    InvalidState,

    /// Invalid argument, e.g. an empty URC prefix or missing stream in the settings.
    #[error("Invalid argument")]
    InvalidArgument,

    /// A command was sent without any command data.
    #[error("Not enough data")]
    NotEnoughData,

    /// A fixed-capacity table is full.
    #[error("Out of memory")]
    NoMemory,

    /// The input buffer filled up before the line could be classified.
    #[error("Buffer overflow: needed {needed}, got {got}")]
    BufferOverflow { needed: usize, got: usize },

    /// A response line could not be parsed.
    #[error("Invalid response format")]
    InvalidFormat,

    /// No more response lines are available.
    #[error("End of stream")]
    EndOfStream,
}

impl<E: Debug> AtError<E> {
    /// Returns `true` for errors that are reported to the caller without
    /// detaching the handle that produced them.
    pub fn is_local(&self) -> bool {
        matches!(self, AtError::InvalidFormat | AtError::EndOfStream)
    }

    /// Maps a non-blocking transport result into the parser's error space.
    ///
    /// `WouldBlock` is not an error at this level: the caller gets `Ok(None)`
    /// and decides whether to wait.
    pub(crate) fn from_nb<T>(res: nb::Result<T, E>) -> Result<Option<T>, Self> {
        match res {
            Ok(v) => Ok(Some(v)),
            Err(nb::Error::WouldBlock) => Ok(None),
            Err(nb::Error::Other(e)) => Err(AtError::Io(e)),
        }
    }
}
