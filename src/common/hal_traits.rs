// src/common/hal_traits.rs

use core::fmt::Debug;
use core::ops::{Add, Sub};
use core::time::Duration;

/// Set of stream readiness events.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct StreamEvents {
    pub readable: bool,
    pub writable: bool,
}

impl StreamEvents {
    pub const NONE: StreamEvents = StreamEvents { readable: false, writable: false };
    pub const READABLE: StreamEvents = StreamEvents { readable: true, writable: false };
    pub const WRITABLE: StreamEvents = StreamEvents { readable: false, writable: true };

    /// Returns `true` if any of the events in `other` are set in `self`.
    #[inline]
    pub const fn intersects(&self, other: StreamEvents) -> bool {
        (self.readable && other.readable) || (self.writable && other.writable)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        !self.readable && !self.writable
    }
}

/// A point in time as seen by the parser's clock.
///
/// Implemented automatically for any type with instant-like arithmetic,
/// including `std::time::Instant`.
pub trait AtInstant: Copy + Ord + Add<Duration, Output = Self> + Sub<Self, Output = Duration> {}

impl<T> AtInstant for T where T: Copy + Ord + Add<Duration, Output = T> + Sub<T, Output = Duration> {}

/// Abstraction for the monotonic clock used to enforce timeouts.
pub trait AtTimer {
    /// Instant type returned by `now()`.
    type Instant: AtInstant;

    /// Returns the current time.
    fn now(&self) -> Self::Instant;
}

/// Abstraction for the byte stream connected to the DCE.
///
/// This can be a UART, a logical channel of a multiplexer, or any other
/// transport. The parser never blocks inside `read()` or `write()`; all
/// waiting happens in `wait_event()`.
pub trait AtStream {
    /// Associated error type for communication errors.
    ///
    /// `Clone` is required because a failed handle keeps returning the error
    /// that detached it.
    type Error: Debug + Clone;

    /// Reads available bytes into `buf` without blocking.
    ///
    /// Returns the number of bytes read. `Ok(0)` and `Err(nb::Error::WouldBlock)`
    /// both mean that no data is available yet.
    fn read(&mut self, buf: &mut [u8]) -> nb::Result<usize, Self::Error>;

    /// Writes as many bytes of `data` as the stream accepts without blocking.
    ///
    /// Returns the number of bytes written. `Ok(0)` and `Err(nb::Error::WouldBlock)`
    /// both mean that the stream cannot accept data right now.
    fn write(&mut self, data: &[u8]) -> nb::Result<usize, Self::Error>;

    /// Waits until one of `events` occurs or `timeout` expires.
    ///
    /// Returns the events that occurred, which may be empty on timeout.
    fn wait_event(&mut self, events: StreamEvents, timeout: Duration) -> Result<StreamEvents, Self::Error>;
}
