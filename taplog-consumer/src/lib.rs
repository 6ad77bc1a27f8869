pub mod listener;
pub mod render;

pub use listener::{EntryHandler, ListenerHandle, ListenerState, LogListener};
pub use render::console_handler;
