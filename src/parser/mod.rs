// src/parser/mod.rs

//! The AT command parser.
//!
//! One [`AtParser`] drives one stream. A command is written through an
//! [`AtCommand`] handle and its response read through an [`AtResponse`];
//! both borrow the parser, so there's never more than one command in
//! flight. URCs are dispatched to the registered handlers while a response
//! is being read, or between commands via [`AtParser::process_urc()`].

mod buffer;
mod classify;
mod command;
mod engine;
mod handle;
mod log_line;
mod response;
mod status;
mod urc;

#[cfg(test)]
pub(crate) mod mock;

pub use self::command::{AtCommand, PRINTF_INIT_BUF_SIZE};
pub use self::log_line::LOG_LINE_SIZE;
pub use self::response::{AtResponse, AtResponseReader};
pub use self::urc::{UrcHandler, UrcResult, MAX_URC_HANDLERS};

use self::{engine::ParserCore, handle::Link, urc::UrcTable};
use crate::common::{
    config::{AtParserConfig, ParserSettings},
    error::AtError,
    hal_traits::{AtStream, AtTimer},
    result::AtResult,
};
use core::fmt;
use core::time::Duration;
use alloc::boxed::Box;

/// Capacity of the input buffer. Also the maximum length of a URC prefix.
pub const INPUT_BUF_SIZE: usize = 64;

/// Number of command bytes kept for echo detection.
pub const CMD_PREFIX_BUF_SIZE: usize = 32;

const _: () = assert!(CMD_PREFIX_BUF_SIZE <= INPUT_BUF_SIZE);

/// AT command parser.
pub struct AtParser<IF>
where
    IF: AtStream + AtTimer,
{
    core: ParserCore<IF>,
    urcs: UrcTable<IF>,
}

impl<IF> AtParser<IF>
where
    IF: AtStream + AtTimer,
{
    /// Creates a parser. Fails with `InvalidArgument` if the configuration
    /// has no stream or a zero timeout.
    pub fn new(config: AtParserConfig<IF>) -> Result<Self, AtError<IF::Error>> {
        let (stream, settings) = config.validate()?;
        Ok(AtParser {
            core: ParserCore::new(stream, settings),
            urcs: UrcTable::new(),
        })
    }

    /// Starts a new command.
    ///
    /// The returned command is detached with `Busy` if another command is
    /// still in progress (which is only possible if its handle was leaked).
    pub fn command(&mut self) -> AtCommand<'_, IF> {
        let AtParser { core, urcs } = self;
        match core.new_command() {
            Ok(()) => AtCommand::new(Link::new(core, Some(urcs))),
            // Leave the command in progress alone
            Err(e) => AtCommand::detached(e),
        }
    }

    /// Formats and sends a command.
    pub fn send_command(&mut self, args: fmt::Arguments<'_>) -> AtResponse<'_, IF> {
        self.command().printf(args).send()
    }

    pub fn send_command_with_timeout(&mut self, timeout: Duration, args: fmt::Arguments<'_>) -> AtResponse<'_, IF> {
        self.command().timeout(timeout).printf(args).send()
    }

    /// Formats and sends a command, and reads its final result code.
    pub fn exec_command(&mut self, args: fmt::Arguments<'_>) -> Result<AtResult, AtError<IF::Error>> {
        self.command().printf(args).exec()
    }

    pub fn exec_command_with_timeout(
        &mut self,
        timeout: Duration,
        args: fmt::Arguments<'_>,
    ) -> Result<AtResult, AtError<IF::Error>> {
        self.command().timeout(timeout).printf(args).exec()
    }

    /// Registers a handler for URCs starting with `prefix`.
    ///
    /// A handler registered earlier for the same prefix is replaced. If the
    /// prefixes of several handlers match a line, the longest one wins.
    /// Errors returned by the handler are logged and otherwise ignored.
    pub fn add_urc_handler<F>(&mut self, prefix: &str, handler: F) -> Result<(), AtError<IF::Error>>
    where
        F: FnMut(&mut AtResponseReader<'_, IF>, &str) -> UrcResult<IF> + 'static,
    {
        self.urcs.add(prefix, Box::new(handler))
    }

    /// Removes the handler for `prefix`, if there is one.
    pub fn remove_urc_handler(&mut self, prefix: &str) {
        self.urcs.remove(prefix);
    }

    /// Waits up to `timeout` for a URC and dispatches it.
    ///
    /// Returns the number of URCs processed (0 or 1). Lines that aren't URCs
    /// are skipped. A zero timeout only looks at data already available.
    pub fn process_urc(&mut self, timeout: Duration) -> Result<usize, AtError<IF::Error>> {
        self.core.process_urc(&mut self.urcs, timeout)
    }

    /// Drops all buffered input and any pending command state.
    ///
    /// Should be called after the stream has been re-initialized.
    pub fn reset(&mut self) {
        self.core.reset();
    }

    /// Changes whether the DCE is expected to echo commands. Has no effect
    /// while a command is in progress.
    pub fn set_echo_enabled(&mut self, enabled: bool) {
        self.core.set_echo_enabled(enabled);
    }

    pub fn set_log_enabled(&mut self, enabled: bool) {
        self.core.set_log_enabled(enabled);
    }

    /// Returns the current settings.
    pub fn config(&self) -> ParserSettings {
        *self.core.settings()
    }

    pub fn stream(&self) -> &IF {
        self.core.iface()
    }

    pub fn stream_mut(&mut self) -> &mut IF {
        self.core.iface_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{MockInterface, MockIoError};
    use super::*;
    use crate::common::config::CommandTerminator;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Parser = AtParser<MockInterface>;

    fn parser(iface: MockInterface, echo: bool) -> Parser {
        let conf = AtParserConfig::new()
            .stream(iface)
            .echo_enabled(echo)
            .log_enabled(false)
            .command_timeout(Duration::from_secs(10));
        AtParser::new(conf).unwrap()
    }

    /// Collects whatever the handlers report.
    fn recorder<T>() -> Rc<RefCell<Vec<T>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn test_new_rejects_missing_stream() {
        let res = AtParser::new(AtParserConfig::<MockInterface>::new());
        assert!(matches!(res, Err(AtError::InvalidArgument)));
    }

    #[test]
    fn test_terminator_written_once_after_command() {
        let cases = [
            (CommandTerminator::Cr, &b"\r"[..]),
            (CommandTerminator::Lf, &b"\n"[..]),
            (CommandTerminator::CrLf, &b"\r\n"[..]),
        ];
        for (term, bytes) in cases {
            let mut iface = MockInterface::with_rx(&[b"OK\r\n"]);
            iface.write_chunk = Some(1);
            let conf = AtParserConfig::new()
                .stream(iface)
                .command_terminator(term)
                .echo_enabled(false);
            let mut parser = AtParser::new(conf).unwrap();
            assert_eq!(parser.command().print("AT+CSQ").exec(), Ok(AtResult::Ok));
            let tx = &parser.stream().tx;
            assert_eq!(tx.len(), 6 + bytes.len());
            assert!(tx.starts_with(b"AT+CSQ"));
            assert!(tx.ends_with(bytes));
        }
    }

    #[test]
    fn test_exec_times_out_without_response() {
        let mut parser = parser(MockInterface::new(), true);
        let res = parser.command().print("AT").timeout(Duration::from_millis(1500)).exec();
        assert_eq!(res, Err(AtError::Timeout));
        assert!(parser.stream().now_ms <= 1500);

        // The parser is usable again.
        parser.stream_mut().push_rx(b"AT\r\r\nOK\r\n");
        assert_eq!(parser.command().print("AT").exec(), Ok(AtResult::Ok));
    }

    #[test]
    fn test_timeout_spans_several_waits() {
        // Stream timeout shorter than the command timeout: the command still
        // fails only once the whole command budget is spent.
        let conf = AtParserConfig::new()
            .stream(MockInterface::new())
            .stream_timeout(Duration::from_millis(300))
            .command_timeout(Duration::from_millis(1000))
            .echo_enabled(false);
        let mut parser = AtParser::new(conf).unwrap();
        assert_eq!(parser.command().print("AT").exec(), Err(AtError::Timeout));
        assert_eq!(parser.stream().now_ms, 1000);
        assert_eq!(parser.stream().wait_calls, 4);
    }

    #[test]
    fn test_ate0_echo_then_ok() {
        let iface = MockInterface::with_rx(&[b"ATE0\r\r\nOK\r\n"]);
        let mut parser = parser(iface, true);
        let mut resp = parser.command().print("ATE0").send();
        assert_eq!(resp.has_next_line(), Ok(false));
        assert_eq!(resp.read_result(), Ok(AtResult::Ok));
        assert_eq!(parser.stream().tx, b"ATE0\r");
    }

    #[test]
    fn test_echo_split_across_reads() {
        let iface = MockInterface::with_rx(&[b"AT+CG", b"MR\r", b"\r\nEG91\r\n", b"\r\nOK\r\n"]);
        let mut parser = parser(iface, true);
        let mut resp = parser.command().print("AT+CGMR").send();
        assert_eq!(resp.read_line_string(), Ok(Some(String::from("EG91"))));
        assert_eq!(resp.read_result(), Ok(AtResult::Ok));
    }

    #[test]
    fn test_echo_not_mistaken_for_urc() {
        let iface = MockInterface::with_rx(&[b"AT+CREG?\r\r\n+CREG: 0,1\r\n\r\nOK\r\n"]);
        let mut parser = parser(iface, true);
        let calls = recorder::<()>();
        let c = calls.clone();
        parser
            .add_urc_handler("AT+CREG", move |_reader, _prefix| {
                c.borrow_mut().push(());
                Ok(())
            })
            .unwrap();

        let mut resp = parser.command().print("AT+CREG?").send();
        assert_eq!(resp.read_line_string(), Ok(Some(String::from("+CREG: 0,1"))));
        assert_eq!(resp.read_result(), Ok(AtResult::Ok));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_missing_echo_is_tolerated() {
        let iface = MockInterface::with_rx(&[b"+CSQ: 17,99\r\nOK\r\n"]);
        let mut parser = parser(iface, true);
        let mut resp = parser.command().print("AT+CSQ").send();
        let csq = resp.scan_line(|s| {
            s.tag("+CSQ:")?;
            let rssi: u8 = s.int()?;
            s.comma()?;
            Some((rssi, s.int::<u8>()?))
        });
        assert_eq!(csq, Ok((17, 99)));
        assert_eq!(resp.read_result(), Ok(AtResult::Ok));
    }

    #[test]
    fn test_longest_urc_prefix_wins() {
        let iface = MockInterface::with_rx(&[b"+CRE", b"GX: 1\r\n", b"+CREG: 2\r\n"]);
        let mut parser = parser(iface, true);
        let seen = recorder::<String>();
        for prefix in ["+CREG", "+CREGX"] {
            let s = seen.clone();
            parser
                .add_urc_handler(prefix, move |_reader, prefix| {
                    s.borrow_mut().push(String::from(prefix));
                    Ok(())
                })
                .unwrap();
        }
        assert_eq!(parser.process_urc(Duration::from_secs(1)), Ok(1));
        assert_eq!(parser.process_urc(Duration::from_secs(1)), Ok(1));
        assert_eq!(*seen.borrow(), ["+CREGX", "+CREG"]);
    }

    #[test]
    fn test_urc_during_command() {
        let iface = MockInterface::with_rx(&[b"+CREG: 1\r\n", b"OK\r\n"]);
        let mut parser = parser(iface, false);
        let payloads = recorder::<String>();
        let p = payloads.clone();
        parser
            .add_urc_handler("+CREG", move |reader, _prefix| {
                let payload = reader.scan_line(|s| {
                    s.tag("+CREG:")?;
                    s.skip_ws();
                    Some(String::from(s.rest()))
                })?;
                p.borrow_mut().push(payload);
                Ok(())
            })
            .unwrap();
        assert_eq!(parser.command().print("AT+COPS?").exec(), Ok(AtResult::Ok));
        assert_eq!(*payloads.borrow(), ["1"]);
    }

    #[test]
    fn test_urc_between_response_lines() {
        let iface = MockInterface::with_rx(&[b"AT+CSQ\r\r\n+CREG: 5\r\n+CSQ: 20,0\r\n\r\nOK\r\n"]);
        let mut parser = parser(iface, true);
        let stats = recorder::<u8>();
        let st = stats.clone();
        parser
            .add_urc_handler("+CREG", move |reader, _prefix| {
                let stat = reader.scan_line(|s| {
                    s.tag("+CREG:")?;
                    s.int::<u8>()
                })?;
                st.borrow_mut().push(stat);
                Ok(())
            })
            .unwrap();
        let mut resp = parser.command().print("AT+CSQ").send();
        let mut buf = [0u8; 32];
        let n = resp.read_line(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"+CSQ: 20,0");
        assert_eq!(resp.read_result(), Ok(AtResult::Ok));
        assert_eq!(*stats.borrow(), [5]);
    }

    #[test]
    fn test_urc_reader_confined_to_its_line() {
        let iface = MockInterface::with_rx(&[b"+QIURC: \"closed\",0\r\nsecond\r\nOK\r\n"]);
        let mut parser = parser(iface, false);
        let seen = recorder::<(usize, bool)>();
        let s = seen.clone();
        parser
            .add_urc_handler("+QIURC", move |reader, _prefix| {
                let mut buf = [0u8; 64];
                let n = reader.read_line(&mut buf)?;
                let more = reader.has_next_line()?;
                s.borrow_mut().push((n, more));
                Ok(())
            })
            .unwrap();
        let mut resp = parser.command().print("AT").send();
        assert_eq!(resp.read_line_string(), Ok(Some(String::from("second"))));
        assert_eq!(resp.read_result(), Ok(AtResult::Ok));
        assert_eq!(*seen.borrow(), [(18, false)]);
    }

    #[test]
    fn test_urc_handler_error_is_not_propagated() {
        let iface = MockInterface::with_rx(&[b"+CREG: 5\r\nOK\r\n"]);
        let mut parser = parser(iface, false);
        parser
            .add_urc_handler("+CREG", |_reader, _prefix| Err(AtError::InvalidArgument))
            .unwrap();
        assert_eq!(parser.command().print("AT").exec(), Ok(AtResult::Ok));
    }

    #[test]
    fn test_removed_urc_handler_not_called() {
        let iface = MockInterface::with_rx(&[b"+CREG: 5\r\n"]);
        let mut parser = parser(iface, false);
        let calls = recorder::<()>();
        let c = calls.clone();
        parser
            .add_urc_handler("+CREG", move |_reader, _prefix| {
                c.borrow_mut().push(());
                Ok(())
            })
            .unwrap();
        parser.remove_urc_handler("+CREG");
        parser.remove_urc_handler("+CREG");
        assert_eq!(parser.process_urc(Duration::ZERO), Ok(0));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_process_urc_skips_other_lines() {
        let iface = MockInterface::with_rx(&[b"RING\r\nOK\r\n+CREG: 2\r\n"]);
        let mut parser = parser(iface, true);
        let calls = recorder::<()>();
        let c = calls.clone();
        parser
            .add_urc_handler("+CREG", move |_reader, _prefix| {
                c.borrow_mut().push(());
                Ok(())
            })
            .unwrap();
        assert_eq!(parser.process_urc(Duration::ZERO), Ok(1));
        assert_eq!(calls.borrow().len(), 1);
        // Nothing left: non-blocking call returns at once.
        assert_eq!(parser.process_urc(Duration::ZERO), Ok(0));
        assert_eq!(parser.process_urc(Duration::from_millis(200)), Ok(0));
        assert_eq!(parser.stream().now_ms, 200);
    }

    #[test]
    fn test_extended_error_codes() {
        let iface = MockInterface::with_rx(&[b"+CME ERROR: 10\r\n"]);
        let mut parser = parser(iface, false);
        assert_eq!(parser.command().print("AT+CPIN?").exec(), Ok(AtResult::CmeError(10)));

        parser.stream_mut().push_rx(b"+CME ERROR: abc\r\n");
        assert_eq!(parser.command().print("AT+CPIN?").exec(), Ok(AtResult::CmeError(0)));

        parser.stream_mut().push_rx(b"+CMS ER");
        parser.stream_mut().push_rx(b"ROR: 3");
        parser.stream_mut().push_rx(b"05\r\n");
        assert_eq!(parser.command().print("AT+CMGS").exec(), Ok(AtResult::CmsError(305)));
    }

    #[test]
    fn test_other_final_results() {
        let iface = MockInterface::with_rx(&[b"NO CARRIER\r\n", b"ERROR\r\n"]);
        let mut parser = parser(iface, false);
        assert_eq!(parser.command().print("ATD123;").exec(), Ok(AtResult::NoCarrier));
        assert_eq!(parser.command().print("AT+FOO").exec(), Ok(AtResult::Error));
    }

    #[test]
    fn test_read_line_truncates_and_resumes() {
        let iface = MockInterface::with_rx(&[b"+CGMI: Quectel Wireless Solutions\r\n+CGMM: EG91\r\nOK\r\n"]);
        let mut parser = parser(iface, false);
        let mut resp = parser.command().print("AT+CGMI;+CGMM").send();
        let mut buf = [0u8; 8];
        assert_eq!(resp.read_line(&mut buf), Ok(8));
        assert_eq!(&buf, b"+CGMI: Q");
        let mut buf = [0u8; 16];
        let n = resp.read_line(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"+CGMM: EG91");
        assert_eq!(resp.read_line(&mut buf), Ok(0));
        assert_eq!(resp.read_result(), Ok(AtResult::Ok));
    }

    #[test]
    fn test_owned_line_longer_than_input_buffer() {
        let mut line = String::from("+QENG: ");
        for _ in 0..150 {
            line.push('x');
        }
        let mut data = line.clone().into_bytes();
        data.extend_from_slice(b"\r\nOK\r\n");
        let mut parser = parser(MockInterface::with_rx(&[data.as_slice()]), false);
        let mut resp = parser.command().print("AT+QENG").send();
        assert_eq!(resp.read_line_string(), Ok(Some(line)));
        assert_eq!(resp.read_line_string(), Ok(None));
        assert_eq!(resp.read_result(), Ok(AtResult::Ok));
    }

    #[test]
    fn test_long_line_starting_like_result_code() {
        let line = "OK, see you at the station at noon tomorrow, bring the charger and the spare SIM";
        let mut data = line.as_bytes().to_vec();
        data.extend_from_slice(b"\r\nOK\r\n");
        let mut parser = parser(MockInterface::with_rx(&[data.as_slice()]), false);
        let mut resp = parser.command().print("AT+CMGR=1").send();
        assert_eq!(resp.read_line_string(), Ok(Some(String::from(line))));
        assert_eq!(resp.read_result(), Ok(AtResult::Ok));
        assert!(parser.stream().rx_is_empty());
    }

    #[test]
    fn test_next_line_skips_unread_lines() {
        let iface = MockInterface::with_rx(&[b"first\r\nsecond\r\nOK\r\n"]);
        let mut parser = parser(iface, false);
        let mut resp = parser.command().print("AT").send();
        assert_eq!(resp.next_line(), Ok(true));
        assert_eq!(resp.read_line_string(), Ok(Some(String::from("second"))));
        assert_eq!(resp.next_line(), Ok(false));
        assert_eq!(resp.read_result(), Ok(AtResult::Ok));
    }

    #[test]
    fn test_scan_errors_are_local() {
        let iface = MockInterface::with_rx(&[b"+CSQ: x\r\nOK\r\n"]);
        let mut parser = parser(iface, false);
        let mut resp = parser.command().print("AT+CSQ").send();
        let res = resp.scan_line(|s| {
            s.tag("+CSQ:")?;
            s.int::<u8>()
        });
        assert_eq!(res, Err(AtError::InvalidFormat));
        assert!(resp.error().is_none());
        assert_eq!(resp.scan_line(|s| s.int::<u8>()), Err(AtError::EndOfStream));
        assert!(resp.error().is_none());
        assert_eq!(resp.read_result(), Ok(AtResult::Ok));
    }

    #[test]
    fn test_io_error_is_sticky() {
        let mut iface = MockInterface::with_rx(&[b"OK\r\n"]);
        iface.fail_reads = true;
        let mut parser = parser(iface, false);
        let mut resp = parser.command().print("AT").send();
        assert_eq!(resp.has_next_line(), Err(AtError::Io(MockIoError)));
        assert_eq!(resp.read_line_string(), Err(AtError::Io(MockIoError)));
        assert_eq!(resp.error(), Some(&AtError::Io(MockIoError)));
        assert_eq!(resp.read_result(), Err(AtError::Io(MockIoError)));

        parser.stream_mut().fail_reads = false;
        parser.stream_mut().push_rx(b"OK\r\n");
        assert_eq!(parser.command().print("AT").exec(), Ok(AtResult::Ok));
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let mut parser = parser(MockInterface::new(), false);
        assert_eq!(parser.command().send().read_result(), Err(AtError::NotEnoughData));
        assert!(parser.stream().tx.is_empty());
        assert!(parser.core.is_ready());
    }

    #[test]
    fn test_dropped_command_is_terminated_once() {
        let mut parser = parser(MockInterface::new(), false);
        drop(parser.command().print("AT+COPS=?"));
        assert_eq!(parser.stream().tx, b"AT+COPS=?\r");
        assert!(parser.core.is_ready());

        // Releasing again is a no-op.
        parser.core.reset_command();
        parser.core.finalize(true);
        assert_eq!(parser.stream().tx, b"AT+COPS=?\r");

        // A command that never wrote anything isn't terminated at all.
        drop(parser.command());
        assert_eq!(parser.stream().tx, b"AT+COPS=?\r");
        assert!(parser.core.is_ready());
    }

    #[test]
    fn test_dropped_response_is_drained() {
        let iface = MockInterface::with_rx(&[b"+CGSN: 1234\r\nOK\r\n+CREG: 1\r\n"]);
        let mut parser = parser(iface, false);
        drop(parser.command().print("AT+CGSN").send());
        assert!(parser.core.is_ready());

        // The URC after the result is still there.
        let calls = recorder::<()>();
        let c = calls.clone();
        parser
            .add_urc_handler("+CREG", move |_reader, _prefix| {
                c.borrow_mut().push(());
                Ok(())
            })
            .unwrap();
        assert_eq!(parser.process_urc(Duration::ZERO), Ok(1));
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_busy_while_command_leaked() {
        let mut parser = parser(MockInterface::new(), true);
        core::mem::forget(parser.command().print("AT"));
        assert_eq!(parser.command().print("ATI").exec(), Err(AtError::Busy));
        assert_eq!(parser.process_urc(Duration::ZERO), Err(AtError::Busy));
        assert_eq!(parser.stream().tx, b"AT");

        // Echo setting can't change mid-command.
        parser.set_echo_enabled(false);
        assert!(parser.config().echo_enabled);

        parser.reset();
        parser.set_echo_enabled(false);
        assert!(!parser.config().echo_enabled);
        parser.stream_mut().push_rx(b"OK\r\n");
        assert_eq!(parser.command().print("AT").exec(), Ok(AtResult::Ok));
    }

    #[test]
    fn test_abandoned_command_terminated_before_next_one() {
        let mut iface = MockInterface::new();
        iface.write_quota = Some(5);
        let mut parser = parser(iface, true);
        drop(parser.command().print("AT+CO"));

        // The terminator couldn't be written; the stored prefix is still the
        // abandoned command's.
        assert!(parser.core.is_ready());
        assert!(parser.core.status().flush_cmd);
        assert_eq!(parser.core.cmd_prefix(), b"AT+CO");
        assert_eq!(parser.stream().tx, b"AT+CO");

        parser.stream_mut().write_quota = None;
        parser.stream_mut().push_rx(b"AT\r\r\nOK\r\n");
        assert_eq!(parser.command().print("AT").exec(), Ok(AtResult::Ok));
        assert_eq!(parser.stream().tx, b"AT+CO\rAT\r");
        assert!(!parser.core.status().flush_cmd);
    }

    #[test]
    fn test_process_urc_writes_pending_terminator() {
        let mut iface = MockInterface::new();
        iface.write_quota = Some(4);
        let mut parser = parser(iface, true);
        drop(parser.command().print("ATI9"));
        assert!(parser.core.status().flush_cmd);

        parser.stream_mut().write_quota = None;
        assert_eq!(parser.process_urc(Duration::ZERO), Ok(0));
        assert_eq!(parser.stream().tx, b"ATI9\r");
        assert!(!parser.core.status().flush_cmd);
    }

    #[test]
    fn test_printf() {
        let iface = MockInterface::with_rx(&[b"OK\r\n", b"OK\r\n"]);
        let mut parser = parser(iface, false);
        assert_eq!(parser.exec_command(format_args!("AT+CFUN={}", 1)), Ok(AtResult::Ok));
        assert_eq!(parser.stream().tx, b"AT+CFUN=1\r");

        // Too long for the stack buffer.
        let apn: String = core::iter::repeat('a').take(PRINTF_INIT_BUF_SIZE * 2).collect();
        parser.stream_mut().tx.clear();
        let res = parser
            .command()
            .print("AT+CGDCONT=1,\"IP\",")
            .printf(format_args!("\"{}\"", apn))
            .exec();
        assert_eq!(res, Ok(AtResult::Ok));
        let tx = &parser.stream().tx;
        assert_eq!(tx.len(), 18 + apn.len() + 2 + 1);
        assert!(tx.ends_with(b"a\"\r"));
    }

    #[test]
    fn test_command_timeout_override() {
        let mut parser = parser(MockInterface::new(), false);
        let res = parser.exec_command_with_timeout(Duration::from_millis(250), format_args!("AT"));
        assert_eq!(res, Err(AtError::Timeout));
        assert_eq!(parser.stream().now_ms, 250);
    }

    #[test]
    fn test_reset_drops_buffered_input() {
        let iface = MockInterface::with_rx(&[b"garbage without line end"]);
        let mut parser = parser(iface, false);
        assert_eq!(parser.process_urc(Duration::ZERO), Ok(0));
        parser.reset();
        parser.stream_mut().push_rx(b"OK\r\n");
        assert_eq!(parser.command().print("AT").exec(), Ok(AtResult::Ok));
    }
}
