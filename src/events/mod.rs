pub mod shell;
pub mod window;

pub use shell::{PickMode, ShellCommand, ShellMessage};
pub use window::{WindowId, WindowNotification};
