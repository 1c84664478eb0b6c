//! Library entry for the archive browser components used by the binary and tests.

pub mod browser;
pub mod config;
pub mod linker;
pub mod render;
pub mod router;
pub mod source;
