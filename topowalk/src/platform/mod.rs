//! Platform definitions for multi-vendor support.
//!
//! A platform describes how a vendor's CLI behaves: its prompt and pager,
//! the strings it prints on a failed command, what to run right after login,
//! and how to recognize it from command output.

mod definition;
mod registry;
pub mod vendors;

pub use definition::{Identification, PlatformDefinition};
pub use registry::PlatformRegistry;
