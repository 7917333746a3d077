// src/parser/classify.rs

//! Byte-wise classification of the line at the front of the input buffer.
//!
//! Every test sees the buffered bytes of the current line and whether the end
//! of the line has been received. A test never answers "no match" while a
//! candidate is still possible; it asks for more data instead.

use crate::common::result::{ResultKind, RESULT_CODES};

/// Outcome of a classification test.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Match<T> {
    Found(T),
    NeedMore,
    None,
}

/// Picks the longest candidate that is a prefix of `line`.
///
/// With `whole_line` set, a candidate matches only if it is the entire line,
/// so one shorter than the bytes already buffered is ruled out at once.
/// If a longer candidate could still match once more bytes arrive, the
/// answer is `NeedMore` even when a shorter candidate already matches.
pub(crate) fn longest_match<'c, T, I>(line: &[u8], complete: bool, whole_line: bool, candidates: I) -> Match<T>
where
    I: IntoIterator<Item = (&'c [u8], T)>,
{
    let mut found: Option<(usize, T)> = None;
    let mut pending = 0;
    for (pattern, value) in candidates {
        let n = line.len().min(pattern.len());
        if line[..n] != pattern[..n] {
            continue;
        }
        let matches = if whole_line {
            complete && line.len() == pattern.len()
        } else {
            line.len() >= pattern.len()
        };
        if matches {
            if found.as_ref().map_or(true, |(len, _)| pattern.len() > *len) {
                found = Some((pattern.len(), value));
            }
        } else if !complete && !(whole_line && line.len() > pattern.len()) {
            // Too few bytes to decide about this candidate yet.
            pending = pending.max(pattern.len());
        }
    }
    match found {
        Some((len, _)) if pending > len => Match::NeedMore,
        Some((_, value)) => Match::Found(value),
        None if pending > 0 => Match::NeedMore,
        None => Match::None,
    }
}

/// Tests the line for a final result code.
///
/// Returns the matching table entry and the length of its pattern.
pub(crate) fn find_result_code(line: &[u8], complete: bool) -> Match<(ResultKind, usize)> {
    let simple = longest_match(
        line,
        complete,
        true,
        RESULT_CODES
            .iter()
            .filter(|(_, kind)| !kind.is_extended())
            .map(|(p, kind)| (*p, (*kind, p.len()))),
    );
    let extended = longest_match(
        line,
        complete,
        false,
        RESULT_CODES
            .iter()
            .filter(|(_, kind)| kind.is_extended())
            .map(|(p, kind)| (*p, (*kind, p.len()))),
    );
    match (simple, extended) {
        (Match::Found(r), _) | (_, Match::Found(r)) => Match::Found(r),
        (Match::NeedMore, _) | (_, Match::NeedMore) => Match::NeedMore,
        _ => Match::None,
    }
}

/// Compares the line against the command bytes that were written.
///
/// The comparison window is `min(line, echo, capacity)`; any mismatch inside
/// it is final.
pub(crate) fn match_echo(line: &[u8], complete: bool, echo: &[u8], capacity: usize) -> Match<()> {
    let expected = &echo[..echo.len().min(capacity)];
    if expected.is_empty() {
        return Match::None;
    }
    let n = line.len().min(expected.len());
    if line[..n] != expected[..n] {
        Match::None
    } else if n == expected.len() {
        Match::Found(())
    } else if complete {
        Match::None
    } else {
        Match::NeedMore
    }
}
