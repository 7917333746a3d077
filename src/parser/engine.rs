// src/parser/engine.rs

use super::{
    buffer::LineBuffer,
    classify::{self, Match},
    log_line::{Direction, LogLine},
    response::AtResponseReader,
    status::Status,
    urc::UrcTable,
    CMD_PREFIX_BUF_SIZE, INPUT_BUF_SIZE,
};
use crate::common::{
    config::ParserSettings,
    error::AtError,
    hal_traits::{AtStream, AtTimer, StreamEvents},
    result::{parse_error_code, AtResult, ResultKind},
    timing,
};
use alloc::vec::Vec;
use arrayvec::ArrayVec;
use core::time::Duration;

// Bytes of an extended result code kept for parsing the numeric code.
const RESULT_CODE_TAIL_SIZE: usize = 16;

type CoreResult<T, IF> = Result<T, AtError<<IF as AtStream>::Error>>;

/// Who is driving the input loop.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum ReadMode {
    /// Response reader of a command: results are recognized, URCs dispatched.
    Command,
    /// URC processing between commands: everything but URCs is skipped.
    Idle,
    /// Reader passed to a URC handler: confined to the dispatched line.
    Nested,
}

/// Where the input loop stopped.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Advance {
    /// Positioned inside a response line.
    Line,
    /// No more lines for this reader.
    End,
    /// A URC has been dispatched (idle mode only).
    Urc,
}

/// The parser engine: I/O, buffering and the per-command state.
///
/// The URC table lives outside so that a handler can be called with a reader
/// that borrows the engine while the table itself stays borrowed.
pub(crate) struct ParserCore<IF>
where
    IF: AtStream + AtTimer,
{
    iface: IF,
    settings: ParserSettings,
    buf: LineBuffer<INPUT_BUF_SIZE>,
    // Command bytes physically written to the stream, for echo detection.
    cmd_prefix: ArrayVec<u8, CMD_PREFIX_BUF_SIZE>,
    cmd_log: LogLine,
    status: Status,
    result: Option<AtResult>,
    // Remaining time of the current command (or `process_urc()` call).
    budget: Duration,
    expired: bool,
    term_offs: usize,
}

impl<IF> ParserCore<IF>
where
    IF: AtStream + AtTimer,
{
    pub fn new(iface: IF, settings: ParserSettings) -> Self {
        ParserCore {
            iface,
            settings,
            buf: LineBuffer::new(settings.log_enabled),
            cmd_prefix: ArrayVec::new(),
            cmd_log: LogLine::new(Direction::Out, settings.log_enabled),
            status: Status::initial(),
            result: None,
            budget: Duration::ZERO,
            expired: false,
            term_offs: 0,
        }
    }

    // --- Accessors & Settings ---

    pub fn settings(&self) -> &ParserSettings {
        &self.settings
    }

    pub fn iface(&self) -> &IF {
        &self.iface
    }

    pub fn iface_mut(&mut self) -> &mut IF {
        &mut self.iface
    }

    pub fn set_echo_enabled(&mut self, enabled: bool) {
        // Can't be changed while a command is being processed.
        if self.status.ready {
            self.settings.echo_enabled = enabled;
        }
    }

    pub fn set_log_enabled(&mut self, enabled: bool) {
        self.settings.log_enabled = enabled;
        self.buf.set_log_enabled(enabled);
        self.cmd_log.set_enabled(enabled);
    }

    /// Drops all buffered input and returns to the initial state.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.cmd_prefix.clear();
        self.cmd_log.clear();
        self.status = Status::initial();
        self.result = None;
        self.budget = Duration::ZERO;
        self.expired = false;
        self.term_offs = 0;
    }

    pub fn set_budget(&mut self, timeout: Duration) {
        self.budget = timeout;
        self.expired = false;
    }

    // --- Command Lifecycle ---

    /// Checks out the engine for a new command.
    ///
    /// If the terminator of an abandoned command hasn't been written yet, the
    /// stored command prefix is kept: it is still what the DCE will echo.
    pub fn new_command(&mut self) -> CoreResult<(), IF> {
        if !self.status.ready {
            return Err(AtError::Busy);
        }
        if !self.status.flush_cmd {
            self.cmd_prefix.clear();
        }
        self.cmd_log.clear();
        self.result = None;
        self.set_budget(self.settings.command_timeout);
        self.status.ready = false;
        self.status.write_cmd = true;
        Ok(())
    }

    /// Writes command data. Returns an error unless all of `data` was written.
    pub fn write(&mut self, data: &[u8]) -> CoreResult<(), IF> {
        if !self.status.write_cmd {
            return Err(AtError::InvalidState);
        }
        if self.status.flush_cmd {
            // Terminate the abandoned command line first
            self.flush_terminator()?;
            if self.status.flush_cmd {
                return Err(AtError::WouldBlock);
            }
            self.cmd_prefix.clear();
        }
        let mut written = 0;
        let res = self.write_some(data, &mut written);
        if written > 0 {
            self.status.cmd_not_empty = true;
            let room = self.cmd_prefix.remaining_capacity();
            self.cmd_prefix.extend(data[..written].iter().copied().take(room));
            self.cmd_log.push(&data[..written]);
        }
        res?;
        if written < data.len() {
            return Err(AtError::WouldBlock);
        }
        Ok(())
    }

    /// Ends the command line and switches to reading the response.
    pub fn send_command(&mut self) -> CoreResult<(), IF> {
        if !self.status.write_cmd {
            return Err(AtError::InvalidState);
        }
        if !self.status.cmd_not_empty {
            return Err(AtError::NotEnoughData);
        }
        self.status.write_cmd = false;
        self.status.flush_cmd = true;
        self.term_offs = 0;
        self.status.echo_enabled = self.settings.echo_enabled;
        self.cmd_log.flush();
        self.flush_terminator()?;
        if self.status.flush_cmd {
            return Err(AtError::WouldBlock);
        }
        Ok(())
    }

    /// Abandons a command that hasn't been sent.
    ///
    /// If any command data has been written, the terminator is written as well
    /// so the DCE sees a complete line. Does nothing if the engine is ready.
    pub fn reset_command(&mut self) {
        if self.status.ready {
            return;
        }
        if self.status.write_cmd && self.status.cmd_not_empty {
            log::debug!("Command abandoned before it was sent");
            self.cmd_log.flush();
            self.status.write_cmd = false;
            self.status.flush_cmd = true;
            self.term_offs = 0;
            if let Err(e) = self.flush_terminator() {
                log::warn!("Failed to terminate abandoned command: {:?}", e);
            }
        }
        self.finalize(false);
    }

    /// Returns the engine to READY. Does nothing if it already is.
    ///
    /// After a failure the buffered input is dropped, and a command line that
    /// was cut short is terminated before the next command or URC poll.
    pub fn finalize(&mut self, failed: bool) {
        if self.status.ready {
            return;
        }
        if failed {
            if self.status.write_cmd && self.status.cmd_not_empty {
                self.status.flush_cmd = true;
                self.term_offs = 0;
            }
            self.buf.clear();
        }
        self.cmd_log.flush();
        self.status.release();
        self.status.begin_line();
    }

    // --- Response Reading ---

    pub fn has_next_line(&mut self, urcs: Option<&mut UrcTable<IF>>, mode: ReadMode) -> CoreResult<bool, IF> {
        Ok(self.advance(urcs, mode)? == Advance::Line)
    }

    /// Skips the current line. Returns `false` if there are no more lines.
    pub fn next_line(&mut self, urcs: Option<&mut UrcTable<IF>>, mode: ReadMode) -> CoreResult<bool, IF> {
        if self.advance(urcs, mode)? != Advance::Line {
            return Ok(false);
        }
        self.skip_line()?;
        Ok(true)
    }

    /// Reads the rest of the current line into `out`.
    ///
    /// A line longer than `out` is truncated and its remainder discarded.
    /// Returns 0 if there are no more lines.
    pub fn read_line(&mut self, urcs: Option<&mut UrcTable<IF>>, mode: ReadMode, out: &mut [u8]) -> CoreResult<usize, IF> {
        if self.advance(urcs, mode)? != Advance::Line {
            return Ok(0);
        }
        let mut n = 0;
        loop {
            let chunk = self.buf.consume_line(&mut out[n..]);
            n += chunk.copied;
            if chunk.line_end {
                self.status.end_line();
                break;
            }
            if n == out.len() {
                self.skip_line()?;
                break;
            }
            self.read_more()?;
        }
        Ok(n)
    }

    /// Reads the rest of the current line, however long it is.
    pub fn read_line_owned(&mut self, urcs: Option<&mut UrcTable<IF>>, mode: ReadMode) -> CoreResult<Option<Vec<u8>>, IF> {
        if self.advance(urcs, mode)? != Advance::Line {
            return Ok(None);
        }
        let mut line = Vec::new();
        let mut chunk_buf = [0u8; INPUT_BUF_SIZE];
        loop {
            let chunk = self.buf.consume_line(&mut chunk_buf);
            line.extend_from_slice(&chunk_buf[..chunk.copied]);
            if chunk.line_end {
                self.status.end_line();
                break;
            }
            if chunk.copied < chunk_buf.len() {
                self.read_more()?;
            }
        }
        Ok(Some(line))
    }

    /// Skips everything up to and including the final result code.
    pub fn read_result(&mut self, urcs: &mut UrcTable<IF>) -> CoreResult<AtResult, IF> {
        while self.advance(Some(&mut *urcs), ReadMode::Command)? == Advance::Line {
            self.skip_line()?;
        }
        self.result.ok_or(AtError::InvalidState)
    }

    /// Waits for one URC and dispatches it. Returns the number of URCs
    /// processed (0 or 1).
    pub fn process_urc(&mut self, urcs: &mut UrcTable<IF>, timeout: Duration) -> CoreResult<usize, IF> {
        if !self.status.ready {
            return Err(AtError::Busy);
        }
        self.set_budget(timeout);
        match self.poll_urc(urcs) {
            Ok(n) => Ok(n),
            Err(AtError::WouldBlock) | Err(AtError::Timeout) => Ok(0),
            Err(e) => {
                self.buf.clear();
                self.status.begin_line();
                Err(e)
            }
        }
    }

    fn poll_urc(&mut self, urcs: &mut UrcTable<IF>) -> CoreResult<usize, IF> {
        if self.status.flush_cmd {
            self.flush_terminator()?;
            if self.status.flush_cmd {
                // Non-blocking write didn't complete
                return Ok(0);
            }
            self.cmd_prefix.clear();
        }
        match self.advance(Some(urcs), ReadMode::Idle)? {
            Advance::Urc => Ok(1),
            _ => Ok(0),
        }
    }

    // --- Input Loop ---

    /// Advances the input to the next line the reader should see.
    ///
    /// Echo, URC and final result lines are consumed here; URCs are
    /// dispatched on the way.
    fn advance(&mut self, mut urcs: Option<&mut UrcTable<IF>>, mode: ReadMode) -> CoreResult<Advance, IF> {
        loop {
            if self.status.has_result {
                return Ok(Advance::End);
            }
            if mode == ReadMode::Nested {
                // Never past the end of the dispatched line.
                return Ok(if self.status.in_line() { Advance::Line } else { Advance::End });
            }
            if self.status.line_end {
                self.status.begin_line();
            }
            if self.status.in_line() {
                if mode == ReadMode::Idle {
                    self.skip_line()?;
                    continue;
                }
                return Ok(Advance::Line);
            }
            self.buf.skip_line_breaks();
            if self.buf.is_empty() {
                self.read_more()?;
                continue;
            }

            let (line, complete) = self.buf.line();

            if self.status.echo_pending() {
                match classify::match_echo(line, complete, &self.cmd_prefix, INPUT_BUF_SIZE) {
                    Match::Found(()) => {
                        self.status.has_echo = true;
                        self.skip_line()?;
                        continue;
                    }
                    Match::NeedMore => {
                        self.read_more()?;
                        continue;
                    }
                    Match::None => {}
                }
            }

            if let Some(table) = urcs.as_deref_mut() {
                if !self.status.urc_handler {
                    match table.find(line, complete) {
                        Match::Found(index) => {
                            self.dispatch_urc(table, index)?;
                            if mode == ReadMode::Idle {
                                return Ok(Advance::Urc);
                            }
                            continue;
                        }
                        Match::NeedMore => {
                            self.read_more()?;
                            continue;
                        }
                        Match::None => {}
                    }
                }
            }

            if self.status.echo_pending() {
                log::debug!("Command echo not received");
                self.status.echo_enabled = false;
            }

            if mode == ReadMode::Command {
                match classify::find_result_code(line, complete) {
                    Match::Found((kind, len)) => {
                        self.take_result(kind, len)?;
                        continue;
                    }
                    Match::NeedMore => {
                        self.read_more()?;
                        continue;
                    }
                    Match::None => {}
                }
            }

            if mode == ReadMode::Idle {
                self.skip_line()?;
                continue;
            }
            self.status.enter_line();
            return Ok(Advance::Line);
        }
    }

    fn dispatch_urc(&mut self, urcs: &mut UrcTable<IF>, index: usize) -> CoreResult<(), IF> {
        let Some(entry) = urcs.entry_mut(index) else {
            return Ok(());
        };
        self.status.enter_line();
        self.status.urc_handler = true;
        let res = {
            let mut reader = AtResponseReader::nested(self);
            entry.call(&mut reader)
        };
        self.status.urc_handler = false;
        if let Err(e) = res {
            log::warn!("URC handler for {} failed: {:?}", entry.prefix(), e);
        }
        // The handler may have left part of the line unread
        if !self.status.line_end {
            self.skip_line()?;
        }
        Ok(())
    }

    fn take_result(&mut self, kind: ResultKind, pattern_len: usize) -> CoreResult<(), IF> {
        self.status.enter_line();
        let result = if kind.is_extended() {
            self.buf.consume(pattern_len);
            let mut tail = [0u8; RESULT_CODE_TAIL_SIZE];
            let mut n = 0;
            loop {
                let chunk = self.buf.consume_line(&mut tail[n..]);
                n += chunk.copied;
                if chunk.line_end {
                    break;
                }
                if n == tail.len() {
                    self.skip_line()?;
                    break;
                }
                self.read_more()?;
            }
            kind.with_code(parse_error_code(&tail[..n]))
        } else {
            // Simple results only match complete lines
            self.buf.discard_line();
            kind.with_code(0)
        };
        self.status.end_line();
        self.status.has_result = true;
        self.result = Some(result);
        Ok(())
    }

    /// Drops the rest of the current line.
    fn skip_line(&mut self) -> CoreResult<(), IF> {
        self.status.enter_line();
        while !self.buf.discard_line() {
            self.read_more()?;
        }
        self.status.end_line();
        Ok(())
    }

    // --- Timed I/O ---

    /// Reads at least one byte into the input buffer.
    fn read_more(&mut self) -> CoreResult<usize, IF> {
        if self.buf.is_full() {
            self.buf.clear();
            return Err(AtError::BufferOverflow {
                needed: INPUT_BUF_SIZE + 1,
                got: INPUT_BUF_SIZE,
            });
        }
        loop {
            let n = AtError::from_nb(self.iface.read(self.buf.spare_mut()))?.unwrap_or(0);
            if n > 0 {
                self.buf.commit::<IF::Error>(n)?;
                return Ok(n);
            }
            self.check_budget()?;
            let start = self.iface.now();
            let wait = timing::clamp_wait(self.settings.stream_timeout, self.budget);
            self.iface
                .wait_event(StreamEvents::READABLE, wait)
                .map_err(AtError::Io)?;
            self.spend(start)?;
        }
    }

    /// Writes `data`, adding the number of bytes written to `written`.
    ///
    /// With no time left, writes whatever the stream accepts right away.
    fn write_some(&mut self, data: &[u8], written: &mut usize) -> CoreResult<(), IF> {
        loop {
            if let Some(n) = AtError::from_nb(self.iface.write(&data[*written..]))? {
                *written += n;
            }
            if *written == data.len() {
                return Ok(());
            }
            if self.budget.is_zero() && !self.expired {
                return Ok(());
            }
            self.check_budget()?;
            let start = self.iface.now();
            let wait = timing::clamp_wait(self.settings.stream_timeout, self.budget);
            let events = self
                .iface
                .wait_event(StreamEvents::WRITABLE, wait)
                .map_err(AtError::Io)?;
            self.spend(start)?;
            if !events.intersects(StreamEvents::WRITABLE) {
                return Err(AtError::Timeout);
            }
        }
    }

    /// Writes the part of the command terminator that hasn't been written yet.
    fn flush_terminator(&mut self) -> CoreResult<(), IF> {
        let term = self.settings.terminator.as_bytes();
        let mut written = self.term_offs;
        let res = self.write_some(term, &mut written);
        self.term_offs = written;
        if self.term_offs == term.len() {
            self.status.flush_cmd = false;
            self.term_offs = 0;
        }
        res
    }

    fn check_budget(&self) -> CoreResult<(), IF> {
        if self.expired {
            Err(AtError::Timeout)
        } else if self.budget.is_zero() {
            Err(AtError::WouldBlock)
        } else {
            Ok(())
        }
    }

    /// Charges the time elapsed since `start` to the budget.
    fn spend(&mut self, start: IF::Instant) -> CoreResult<(), IF> {
        let elapsed = self.iface.now() - start;
        if elapsed >= self.budget {
            self.budget = Duration::ZERO;
            self.expired = true;
            return Err(AtError::Timeout);
        }
        self.budget -= elapsed;
        Ok(())
    }

    // --- Test Inspection ---

    #[cfg(test)]
    pub fn is_ready(&self) -> bool {
        self.status.ready
    }

    #[cfg(test)]
    pub fn status(&self) -> &Status {
        &self.status
    }

    #[cfg(test)]
    pub fn cmd_prefix(&self) -> &[u8] {
        &self.cmd_prefix
    }

    #[cfg(test)]
    pub fn budget(&self) -> Duration {
        self.budget
    }
}
