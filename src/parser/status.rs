// src/parser/status.rs

/// Parser state flags.
///
/// The flags are independent: several of them are legitimately set at the
/// same time (e.g. `echo_enabled` and `has_echo` for most of a command's
/// life). `write_cmd` and `flush_cmd` only overlap when a new command starts
/// while the terminator of an abandoned one is still owed; the first write
/// of the new command clears `flush_cmd`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct Status {
    /// No command is in progress.
    pub ready: bool,
    /// Command data is being written.
    pub write_cmd: bool,
    /// The command terminator still has to be written.
    pub flush_cmd: bool,
    /// At least one byte of command data has been written.
    pub cmd_not_empty: bool,
    /// An echo of the command line is expected.
    pub echo_enabled: bool,
    /// The echo has been received.
    pub has_echo: bool,
    /// The next input byte starts a new, not yet classified line.
    pub line_begin: bool,
    /// All data of the current line has been consumed.
    pub line_end: bool,
    /// A final result code has been received.
    pub has_result: bool,
    /// A URC handler is running.
    pub urc_handler: bool,
}

impl Status {
    pub const fn initial() -> Self {
        Status {
            ready: true,
            write_cmd: false,
            flush_cmd: false,
            cmd_not_empty: false,
            echo_enabled: false,
            has_echo: false,
            line_begin: true,
            line_end: false,
            has_result: false,
            urc_handler: false,
        }
    }

    /// An echo is expected but hasn't been seen yet.
    #[inline]
    pub fn echo_pending(&self) -> bool {
        self.echo_enabled && !self.has_echo
    }

    /// Positioned inside a line whose data can still be read.
    #[inline]
    pub fn in_line(&self) -> bool {
        !self.line_begin && !self.line_end
    }

    /// Marks the current line as fully consumed.
    #[inline]
    pub fn end_line(&mut self) {
        self.line_begin = false;
        self.line_end = true;
    }

    /// Moves on to the next, unclassified line.
    #[inline]
    pub fn begin_line(&mut self) {
        self.line_begin = true;
        self.line_end = false;
    }

    /// Enters the data of a classified line.
    #[inline]
    pub fn enter_line(&mut self) {
        self.line_begin = false;
        self.line_end = false;
    }

    /// Clears the per-command flags and returns to READY.
    ///
    /// `flush_cmd` is kept: a terminator owed to the DCE is still owed.
    pub fn release(&mut self) {
        self.ready = true;
        self.write_cmd = false;
        self.cmd_not_empty = false;
        self.echo_enabled = false;
        self.has_echo = false;
        self.has_result = false;
        self.urc_handler = false;
    }
}
