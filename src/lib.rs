// src/lib.rs

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod common;
pub mod parser;

// Re-export key types for convenience
pub use common::{AtError, AtParserConfig, AtResult, AtStream, AtTimer, CommandTerminator};
pub use parser::{AtCommand, AtParser, AtResponse, AtResponseReader};
