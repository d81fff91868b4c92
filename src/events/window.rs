use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Непрозрачный идентификатор окна, неизменный всё время жизни окна
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(String);

impl WindowId {
    pub fn generate() -> Self {
        Self(format!("win:{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WindowId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for WindowId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Одностороннее уведомление от ядра к окну
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WindowNotification {
    ContentsReplaced { filename: String, contents: String },
    DirtyChanged { dirty: bool },
    FilenameChanged { filename: String },
    /// Попросить окно прислать текущий буфер через save
    FlushRequested,
}

impl WindowNotification {
    pub fn dirty(dirty: bool) -> Self {
        Self::DirtyChanged { dirty }
    }
}

impl fmt::Display for WindowNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContentsReplaced { filename, contents } => {
                write!(f, "contentsReplaced({}, {} bytes)", filename, contents.len())
            }
            Self::DirtyChanged { dirty } => write!(f, "dirtyChanged({})", dirty),
            Self::FilenameChanged { filename } => write!(f, "filenameChanged({})", filename),
            Self::FlushRequested => f.write_str("flushRequested"),
        }
    }
}
