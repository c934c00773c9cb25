pub mod commands;
pub mod store;

pub use store::{SessionStore, StageError, FISH_ICON_COUNT};
