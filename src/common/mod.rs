// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod config;
pub mod error;
pub mod hal_traits;
pub mod result;
pub mod scan;
pub mod timing;

// --- Re-export key types/traits for easier access ---

// From config.rs
pub use config::{AtParserConfig, CommandTerminator, ParserSettings};

// From error.rs
pub use error::AtError;

// From hal_traits.rs
pub use hal_traits::{AtInstant, AtStream, AtTimer, StreamEvents};

// From result.rs
pub use result::AtResult;

// From scan.rs
pub use scan::Scanner;

// From timing.rs (constants - users can access via common::timing::*)
