pub mod document_session;
pub mod document_store;
pub mod focus_tracker;
pub mod path_picker;
pub mod shell_bridge;
pub mod window_registry;

pub use document_store::create_document_store;
pub use focus_tracker::DefaultFocusTracker;
pub use shell_bridge::{write_messages, ShellBridge};
pub use window_registry::WindowRegistry;
