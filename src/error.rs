use crate::events::WindowId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Не удалось прочитать {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Не удалось записать {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Неизвестное окно: {0}")]
    UnknownWindow(WindowId),

    #[error("Окно уже зарегистрировано: {0}")]
    DuplicateId(WindowId),

    #[error("Ошибка протокола: {0}")]
    Protocol(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl EditorError {
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EditorError::FileRead {
            path: path.into(),
            source,
        }
    }

    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EditorError::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Ошибки, которые фронтенд должен показать пользователю (например, в диалоге)
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            EditorError::FileRead { .. } | EditorError::FileWrite { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EditorError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! editor_error {
    (protocol, $($arg:tt)*) => {
        $crate::error::EditorError::Protocol(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::EditorError::Internal(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn file_errors_are_user_facing() {
        let read = EditorError::file_read("a.md", io::Error::from(io::ErrorKind::NotFound));
        let write = EditorError::file_write("a.md", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(read.is_user_facing());
        assert!(write.is_user_facing());
        assert!(read.to_string().starts_with("Не удалось прочитать a.md"));

        let unknown = EditorError::UnknownWindow(WindowId::from("win:gone"));
        assert!(!unknown.is_user_facing());
        assert_eq!(unknown.to_string(), "Неизвестное окно: win:gone");
    }

    #[test]
    fn macro_builds_protocol_error() {
        let err = editor_error!(protocol, "bad line {}", 3);
        assert!(matches!(err, EditorError::Protocol(ref msg) if msg == "bad line 3"));
    }
}
