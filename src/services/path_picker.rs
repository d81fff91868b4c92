use crate::events::{PickMode, WindowId};
use std::path::PathBuf;

/// Что должен показать диалог выбора
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickRequest {
    pub mode: PickMode,
    pub title: String,
    pub filter_name: String,
    pub extensions: Vec<String>,
}

/// Интерактивный выбор файла для открытия или пути для сохранения.
///
/// `None` значит, что пользователь отменил выбор. Это обычный исход, не ошибка.
#[async_trait::async_trait]
pub trait PathPicker: Send + Sync {
    async fn pick(&self, window_id: &WindowId, request: PickRequest) -> Option<PathBuf>;
}
