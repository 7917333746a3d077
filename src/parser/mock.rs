// src/parser/mock.rs

//! Scripted stream and clock shared by the parser tests.

use crate::common::hal_traits::{AtStream, AtTimer, StreamEvents};
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::ops::{Add, Sub};
use core::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MockInstant(pub u64); // ms

impl Add<Duration> for MockInstant {
    type Output = Self;
    fn add(self, rhs: Duration) -> Self {
        MockInstant(self.0 + rhs.as_millis() as u64)
    }
}

impl Sub for MockInstant {
    type Output = Duration;
    fn sub(self, rhs: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(rhs.0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockIoError;

/// Stream that hands out scripted chunks, one chunk per `read()` call.
///
/// `wait_event()` returns at once if the stream is ready; otherwise the
/// clock jumps forward by the whole timeout.
#[derive(Debug, Default)]
pub struct MockInterface {
    rx: VecDeque<Vec<u8>>,
    pub tx: Vec<u8>,
    pub now_ms: u64,
    /// Max bytes accepted per `write()` call.
    pub write_chunk: Option<usize>,
    /// Bytes accepted before the stream stops being writable.
    pub write_quota: Option<usize>,
    pub fail_reads: bool,
    pub wait_calls: usize,
}

impl MockInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rx(chunks: &[&[u8]]) -> Self {
        let mut iface = Self::new();
        for chunk in chunks {
            iface.push_rx(chunk);
        }
        iface
    }

    pub fn push_rx(&mut self, chunk: &[u8]) {
        self.rx.push_back(chunk.to_vec());
    }

    pub fn rx_is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl AtTimer for MockInterface {
    type Instant = MockInstant;
    fn now(&self) -> MockInstant {
        MockInstant(self.now_ms)
    }
}

impl AtStream for MockInterface {
    type Error = MockIoError;

    fn read(&mut self, buf: &mut [u8]) -> nb::Result<usize, MockIoError> {
        if self.fail_reads {
            return Err(nb::Error::Other(MockIoError));
        }
        let Some(mut chunk) = self.rx.pop_front() else {
            return Err(nb::Error::WouldBlock);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.rx.push_front(chunk.split_off(n));
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> nb::Result<usize, MockIoError> {
        let mut n = self.write_chunk.map_or(data.len(), |max| max.min(data.len()));
        if let Some(quota) = self.write_quota {
            n = n.min(quota);
            self.write_quota = Some(quota - n);
        }
        if n == 0 && !data.is_empty() {
            return Err(nb::Error::WouldBlock);
        }
        self.tx.extend_from_slice(&data[..n]);
        Ok(n)
    }

    fn wait_event(&mut self, events: StreamEvents, timeout: Duration) -> Result<StreamEvents, MockIoError> {
        self.wait_calls += 1;
        let ready = StreamEvents {
            readable: events.readable && !self.rx.is_empty(),
            writable: events.writable && self.write_quota != Some(0),
        };
        if ready.is_empty() {
            self.now_ms += timeout.as_millis() as u64;
        }
        Ok(ready)
    }
}
