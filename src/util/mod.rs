//! Utilities: truncation, timeouts, logging setup.

#[cfg(feature = "cli")]
pub mod logging;
pub mod timeout;
pub mod truncate;

pub use truncate::{truncate_chars, truncate_utf8, truncate_with_marker};
