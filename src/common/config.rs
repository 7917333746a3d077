// src/common/config.rs

use super::{error::AtError, hal_traits::AtStream, timing};
use core::time::Duration;

/// Command line terminator.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum CommandTerminator {
    /// `"\r"`, the V.250 default.
    #[default]
    Cr,
    /// `"\n"`.
    Lf,
    /// `"\r\n"`. Not allowed by V.250, but some modems use it.
    CrLf,
}

impl CommandTerminator {
    /// Returns the bytes written after the command data.
    pub const fn as_bytes(&self) -> &'static [u8] {
        match self {
            CommandTerminator::Cr => b"\r",
            CommandTerminator::Lf => b"\n",
            CommandTerminator::CrLf => b"\r\n",
        }
    }
}

/// Parser settings that remain in effect after initialization.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ParserSettings {
    /// Command line terminator.
    pub terminator: CommandTerminator,
    /// Default time budget for a whole command.
    pub command_timeout: Duration,
    /// Inter-byte timeout for stream reads and writes.
    pub stream_timeout: Duration,
    /// Whether the DCE echoes command lines back.
    pub echo_enabled: bool,
    /// Whether command and response lines are traced via `log`.
    pub log_enabled: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        ParserSettings {
            terminator: CommandTerminator::Cr,
            command_timeout: timing::DEFAULT_COMMAND_TIMEOUT,
            stream_timeout: timing::DEFAULT_STREAM_TIMEOUT,
            echo_enabled: true,
            log_enabled: true,
        }
    }
}

/// AT parser configuration.
///
/// All parameters except the stream have defaults:
///
/// ```ignore
/// let conf = AtParserConfig::new()
///     .stream(uart)
///     .command_terminator(CommandTerminator::CrLf)
///     .command_timeout(Duration::from_secs(10));
/// let parser = AtParser::new(conf)?;
/// ```
#[derive(Debug)]
pub struct AtParserConfig<IF> {
    stream: Option<IF>,
    settings: ParserSettings,
}

impl<IF> Default for AtParserConfig<IF> {
    fn default() -> Self {
        Self::new()
    }
}

impl<IF> AtParserConfig<IF> {
    /// Creates a configuration with all parameters set to their defaults.
    pub fn new() -> Self {
        AtParserConfig {
            stream: None,
            settings: ParserSettings::default(),
        }
    }

    /// Sets the stream used for communication with the DCE.
    pub fn stream(mut self, stream: IF) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn command_terminator(mut self, term: CommandTerminator) -> Self {
        self.settings.terminator = term;
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.settings.command_timeout = timeout;
        self
    }

    pub fn stream_timeout(mut self, timeout: Duration) -> Self {
        self.settings.stream_timeout = timeout;
        self
    }

    pub fn echo_enabled(mut self, enabled: bool) -> Self {
        self.settings.echo_enabled = enabled;
        self
    }

    pub fn log_enabled(mut self, enabled: bool) -> Self {
        self.settings.log_enabled = enabled;
        self
    }

    pub fn settings(&self) -> &ParserSettings {
        &self.settings
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }
}

impl<IF: AtStream> AtParserConfig<IF> {
    /// Checks the configuration and splits it into the stream and the settings.
    pub(crate) fn validate(self) -> Result<(IF, ParserSettings), AtError<IF::Error>> {
        if self.settings.command_timeout.is_zero() || self.settings.stream_timeout.is_zero() {
            return Err(AtError::InvalidArgument);
        }
        let stream = self.stream.ok_or(AtError::InvalidArgument)?;
        Ok((stream, self.settings))
    }
}
