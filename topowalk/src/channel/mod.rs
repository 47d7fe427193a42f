//! Channel layer for pattern matching and PTY operations.
//!
//! This module handles the interactive shell session: pattern-based prompt
//! detection, pager handling and terminal control stripping.

mod buffer;
mod patterns;
mod pty;

pub use buffer::PatternBuffer;
pub use patterns::{DEFAULT_PAGER_PATTERN, compile_prompt_pattern};
pub use pty::PtyChannel;
