//! Core types for Tiller.

pub mod generation;
pub mod message;
pub mod tool_call;

pub use generation::*;
pub use message::*;
pub use tool_call::*;
