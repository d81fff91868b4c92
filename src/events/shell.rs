use super::window::{WindowId, WindowNotification};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Какой путь запрашивает диалог выбора файла
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PickMode {
    Open,
    Save,
}

/// Команда от UI-фронтенда (один JSON-объект на строку)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ShellCommand {
    NewWindow {
        #[serde(default)]
        file_path: Option<PathBuf>,
    },
    EditorReady {
        window_id: WindowId,
    },
    Edit {
        window_id: WindowId,
        contents: String,
    },
    Save {
        window_id: WindowId,
        contents: String,
    },
    OpenRequested {
        window_id: WindowId,
    },
    FlushAndSave {
        window_id: WindowId,
    },
    Focus {
        window_id: WindowId,
    },
    MenuNew,
    MenuOpen,
    MenuSave,
    WindowClosed {
        window_id: WindowId,
    },
    PathPicked {
        request_id: u64,
        #[serde(default)]
        path: Option<PathBuf>,
    },
}

impl ShellCommand {
    /// Команды, которые ждут файловый ввод-вывод или диалог выбора
    pub fn suspends(&self) -> bool {
        matches!(
            self,
            ShellCommand::EditorReady { .. }
                | ShellCommand::Save { .. }
                | ShellCommand::OpenRequested { .. }
                | ShellCommand::MenuOpen
        )
    }

    pub fn window_id(&self) -> Option<&WindowId> {
        match self {
            ShellCommand::EditorReady { window_id }
            | ShellCommand::Edit { window_id, .. }
            | ShellCommand::Save { window_id, .. }
            | ShellCommand::OpenRequested { window_id }
            | ShellCommand::FlushAndSave { window_id }
            | ShellCommand::Focus { window_id }
            | ShellCommand::WindowClosed { window_id } => Some(window_id),
            ShellCommand::NewWindow { .. }
            | ShellCommand::MenuNew
            | ShellCommand::MenuOpen
            | ShellCommand::MenuSave
            | ShellCommand::PathPicked { .. } => None,
        }
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewWindow { file_path } => write!(f, "newWindow({:?})", file_path),
            Self::EditorReady { window_id } => write!(f, "editorReady({})", window_id),
            Self::Edit { window_id, contents } => {
                write!(f, "edit({}, {} bytes)", window_id, contents.len())
            }
            Self::Save { window_id, contents } => {
                write!(f, "save({}, {} bytes)", window_id, contents.len())
            }
            Self::OpenRequested { window_id } => write!(f, "openRequested({})", window_id),
            Self::FlushAndSave { window_id } => write!(f, "flushAndSave({})", window_id),
            Self::Focus { window_id } => write!(f, "focus({})", window_id),
            Self::MenuNew => f.write_str("menuNew"),
            Self::MenuOpen => f.write_str("menuOpen"),
            Self::MenuSave => f.write_str("menuSave"),
            Self::WindowClosed { window_id } => write!(f, "windowClosed({})", window_id),
            Self::PathPicked { request_id, path } => {
                write!(f, "pathPicked(#{}, {:?})", request_id, path)
            }
        }
    }
}

/// Сообщение для UI-фронтенда
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ShellMessage {
    CreateWindow {
        window_id: WindowId,
    },
    Notify {
        window_id: WindowId,
        notification: WindowNotification,
    },
    PickPath {
        request_id: u64,
        window_id: WindowId,
        mode: PickMode,
        title: String,
        filter_name: String,
        extensions: Vec<String>,
    },
    Error {
        window_id: Option<WindowId>,
        message: String,
    },
    /// Закрыто последнее окно, фронтенду пора завершаться
    Quit,
}
