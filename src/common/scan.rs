// src/common/scan.rs

//! Minimal scanner for AT response lines.
//!
//! Response lines follow a few simple shapes (`+CREG: 0,1`, `+COPS: 0,0,"Operator",7`,
//! `+CSQ: 17,99`). `Scanner` walks such a line left to right; every step returns
//! `Option` so a parse routine can be written with `?`:
//!
//! ```ignore
//! let (n, stat) = reader.scan_line(|s| {
//!     s.tag("+CREG:")?;
//!     let n: u8 = s.int()?;
//!     s.comma()?;
//!     Some((n, s.int::<u8>()?))
//! })?;
//! ```

use core::str::FromStr;

/// Cursor over a single response line.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    pub fn new(line: &'a str) -> Self {
        Scanner { rest: line }
    }

    /// Returns the unparsed remainder of the line.
    #[inline]
    pub fn rest(&self) -> &'a str {
        self.rest
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// Skips spaces and tabs.
    pub fn skip_ws(&mut self) -> &mut Self {
        self.rest = self.rest.trim_start_matches([' ', '\t']);
        self
    }

    /// Consumes `tag` (after optional whitespace) or fails.
    pub fn tag(&mut self, tag: &str) -> Option<()> {
        self.skip_ws();
        self.rest = self.rest.strip_prefix(tag)?;
        Some(())
    }

    /// Consumes a single comma separator.
    pub fn comma(&mut self) -> Option<()> {
        self.tag(",")
    }

    /// Parses a decimal integer with an optional sign.
    pub fn int<T: FromStr>(&mut self) -> Option<T> {
        self.skip_ws();
        let bytes = self.rest.as_bytes();
        let mut end = 0;
        if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
            end = 1;
        }
        let digits_start = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end == digits_start {
            return None;
        }
        let value = self.rest[..end].parse().ok()?;
        self.rest = &self.rest[end..];
        Some(value)
    }

    /// Parses a hexadecimal integer (e.g. a `+CREG` location area code).
    pub fn hex(&mut self) -> Option<u32> {
        self.skip_ws();
        let end = self
            .rest
            .find(|c: char| !c.is_ascii_hexdigit())
            .unwrap_or(self.rest.len());
        if end == 0 {
            return None;
        }
        let value = u32::from_str_radix(&self.rest[..end], 16).ok()?;
        self.rest = &self.rest[end..];
        Some(value)
    }

    /// Parses a double-quoted string and returns its contents.
    pub fn quoted(&mut self) -> Option<&'a str> {
        self.tag("\"")?;
        let end = self.rest.find('"')?;
        let value = &self.rest[..end];
        self.rest = &self.rest[end + 1..];
        Some(value)
    }

    /// Returns everything up to the next comma (or the end of the line),
    /// with surrounding whitespace trimmed. The comma itself is not consumed.
    pub fn field(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let end = self.rest.find(',').unwrap_or(self.rest.len());
        let value = self.rest[..end].trim_matches([' ', '\t']);
        self.rest = &self.rest[end..];
        Some(value)
    }
}
