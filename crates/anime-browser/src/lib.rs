//! Anime search and bookmark client.
//!
//! State lives in one event loop ([`app::App`]) that turns user commands,
//! debounced search input and request completions into store transitions.
//! Views are rendered from published snapshots.

pub mod app;
pub mod bookmarks;
pub mod debounce;
pub mod filters;
pub mod input;
pub mod store;
pub mod view;

pub use app::{App, Command, Route, Snapshot};
pub use bookmarks::{Bookmark, BookmarkSet};
pub use debounce::QueryDebouncer;
pub use filters::FilterState;
pub use store::{Action, AppState, Effect, Store};
