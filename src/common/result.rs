// src/common/result.rs

use core::fmt;

/// Final result code of an AT command.
///
/// Anything other than `Ok` is still a successful *parse*: the command ran
/// and the DCE reported an outcome that the caller has to inspect.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AtResult {
    /// `OK`
    Ok,
    /// `ERROR`
    Error,
    /// `BUSY`
    Busy,
    /// `NO ANSWER`
    NoAnswer,
    /// `NO CARRIER`
    NoCarrier,
    /// `NO DIALTONE`
    NoDialtone,
    /// `+CME ERROR: <n>`. The code is 0 if the DCE reported a non-numeric error.
    CmeError(u32),
    /// `+CMS ERROR: <n>`. The code is 0 if the DCE reported a non-numeric error.
    CmsError(u32),
}

impl AtResult {
    #[inline]
    pub const fn is_ok(&self) -> bool {
        matches!(self, AtResult::Ok)
    }

    /// Returns the numeric value of the result code (`OK` is 0).
    pub const fn code(&self) -> i32 {
        match self {
            AtResult::Ok => 0,
            AtResult::Error => 1,
            AtResult::Busy => 2,
            AtResult::NoAnswer => 3,
            AtResult::NoCarrier => 4,
            AtResult::NoDialtone => 5,
            AtResult::CmeError(_) => 6,
            AtResult::CmsError(_) => 7,
        }
    }

    /// Returns the extended error code of `+CME ERROR` and `+CMS ERROR` results.
    pub const fn error_code(&self) -> Option<u32> {
        match self {
            AtResult::CmeError(code) | AtResult::CmsError(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for AtResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtResult::Ok => f.write_str("OK"),
            AtResult::Error => f.write_str("ERROR"),
            AtResult::Busy => f.write_str("BUSY"),
            AtResult::NoAnswer => f.write_str("NO ANSWER"),
            AtResult::NoCarrier => f.write_str("NO CARRIER"),
            AtResult::NoDialtone => f.write_str("NO DIALTONE"),
            AtResult::CmeError(code) => write!(f, "+CME ERROR: {}", code),
            AtResult::CmsError(code) => write!(f, "+CMS ERROR: {}", code),
        }
    }
}

/// Kind of a final result code pattern.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum ResultKind {
    /// The whole line must equal the pattern.
    Simple(AtResult),
    /// The line starts with the pattern and continues with a numeric code.
    CmeError,
    CmsError,
}

impl ResultKind {
    /// Builds the final result from the text that follows an extended pattern.
    pub(crate) fn with_code(self, code: u32) -> AtResult {
        match self {
            ResultKind::Simple(r) => r,
            ResultKind::CmeError => AtResult::CmeError(code),
            ResultKind::CmsError => AtResult::CmsError(code),
        }
    }

    pub(crate) const fn is_extended(&self) -> bool {
        !matches!(self, ResultKind::Simple(_))
    }
}

/// Final result codes recognized at the start of a line.
pub(crate) const RESULT_CODES: [(&[u8], ResultKind); 8] = [
    (b"OK", ResultKind::Simple(AtResult::Ok)),
    (b"ERROR", ResultKind::Simple(AtResult::Error)),
    (b"BUSY", ResultKind::Simple(AtResult::Busy)),
    (b"NO ANSWER", ResultKind::Simple(AtResult::NoAnswer)),
    (b"NO CARRIER", ResultKind::Simple(AtResult::NoCarrier)),
    (b"NO DIALTONE", ResultKind::Simple(AtResult::NoDialtone)),
    (b"+CME ERROR:", ResultKind::CmeError),
    (b"+CMS ERROR:", ResultKind::CmsError),
];

/// Parses the numeric code that follows `+CME ERROR:` / `+CMS ERROR:`.
///
/// Leading whitespace is skipped. A payload that doesn't start with a digit
/// (verbose error text) yields 0.
pub(crate) fn parse_error_code(data: &[u8]) -> u32 {
    let mut code: u32 = 0;
    for &b in data.iter().skip_while(|b| **b == b' ' || **b == b'\t') {
        if !b.is_ascii_digit() {
            break;
        }
        code = code.saturating_mul(10).saturating_add((b - b'0') as u32);
    }
    code
}
