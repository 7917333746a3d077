// src/parser/handle.rs

use super::{
    engine::{ParserCore, ReadMode},
    urc::UrcTable,
};
use crate::common::{
    error::AtError,
    hal_traits::{AtStream, AtTimer},
    result::AtResult,
};
use core::mem;

/// Exclusive access to the engine held by a command or response handle.
///
/// A link without a URC table belongs to a reader passed to a URC handler:
/// it only sees the dispatched line and never releases the engine.
pub(crate) struct Link<'p, IF>
where
    IF: AtStream + AtTimer,
{
    pub core: &'p mut ParserCore<IF>,
    pub urcs: Option<&'p mut UrcTable<IF>>,
}

impl<'p, IF> Link<'p, IF>
where
    IF: AtStream + AtTimer,
{
    pub fn new(core: &'p mut ParserCore<IF>, urcs: Option<&'p mut UrcTable<IF>>) -> Self {
        Link { core, urcs }
    }

    #[inline]
    pub fn is_nested(&self) -> bool {
        self.urcs.is_none()
    }

    #[inline]
    pub fn mode(&self) -> ReadMode {
        if self.is_nested() {
            ReadMode::Nested
        } else {
            ReadMode::Command
        }
    }

    pub fn read_result(&mut self) -> Result<AtResult, AtError<IF::Error>> {
        match self.urcs.as_deref_mut() {
            Some(urcs) => self.core.read_result(urcs),
            None => Err(AtError::InvalidState),
        }
    }
}

/// State of a handle: attached to the engine, or detached with the error
/// that every further call returns.
pub(crate) enum Attachment<'p, IF>
where
    IF: AtStream + AtTimer,
{
    Active(Link<'p, IF>),
    Detached(AtError<IF::Error>),
}

impl<'p, IF> Attachment<'p, IF>
where
    IF: AtStream + AtTimer,
{
    /// Runs `op` on the engine.
    ///
    /// The first non-local error detaches the handle; a top-level handle
    /// releases the engine at that point.
    pub fn run<T, F>(&mut self, op: F) -> Result<T, AtError<IF::Error>>
    where
        F: FnOnce(&mut Link<'p, IF>) -> Result<T, AtError<IF::Error>>,
    {
        let link = match self {
            Attachment::Active(link) => link,
            Attachment::Detached(e) => return Err(e.clone()),
        };
        match op(link) {
            Ok(v) => Ok(v),
            Err(e) if e.is_local() => Err(e),
            Err(e) => {
                self.latch(e.clone());
                Err(e)
            }
        }
    }

    pub fn latch(&mut self, err: AtError<IF::Error>) {
        if let Attachment::Active(link) = self {
            if !link.is_nested() {
                match &err {
                    AtError::Io(e) => log::warn!("Command failed: I/O error: {:?}", e),
                    e => log::debug!("Command failed: {}", e),
                }
                link.core.finalize(true);
            }
        }
        *self = Attachment::Detached(err);
    }

    /// Detaches the handle, handing over its link.
    pub fn take(&mut self) -> Option<Link<'p, IF>> {
        match mem::replace(self, Attachment::Detached(AtError::InvalidState)) {
            Attachment::Active(link) => Some(link),
            detached => {
                *self = detached;
                None
            }
        }
    }

    pub fn error(&self) -> Option<&AtError<IF::Error>> {
        match self {
            Attachment::Active(_) => None,
            Attachment::Detached(e) => Some(e),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, Attachment::Active(_))
    }
}
