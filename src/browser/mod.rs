//! Browser module
//!
//! This module holds the interactive side of the archive viewer:
//! - Application context tying routing, fetching and rendering together
//! - UI state and hash-location history
//! - Live search with debounce
//! - Theme preference handling
//! - Command parsing for the terminal browse mode

pub mod app;
pub mod commands;
pub mod search;
pub mod state;
pub mod theme;

pub use app::{App, RouteHandler};
pub use commands::{BrowseCommand, CommandParser, CommandProcessor, Reply};
pub use search::{Debouncer, filter_threads};
pub use state::{Navigator, UiState, View};
pub use theme::{JsonFilePreferenceStore, MemoryPreferenceStore, PreferenceStore, Theme, ThemeManager};
