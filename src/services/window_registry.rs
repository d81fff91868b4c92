use crate::error::{EditorError, Result};
use crate::events::{WindowId, WindowNotification};
use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::{Ref, RefMut};
use dashmap::DashMap;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info};

/// UI-сторона окна: уведомления без ожидания ответа
pub trait WindowHandle: Send + Sync {
    fn notify(&self, notification: WindowNotification);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    /// Файл ещё не выбран
    Unbound,
    /// Файл выбран, содержимое на диске совпадает с буфером
    Clean,
    /// Файл выбран, содержимое на диске отличается от буфера
    Dirty,
}

/// Отложенная сверка с диском. Не больше одной на сессию.
#[derive(Debug)]
pub(crate) struct PendingCheck {
    pub(crate) token: u64,
    pub(crate) deadline: watch::Sender<Instant>,
    pub(crate) handle: JoinHandle<()>,
}

impl PendingCheck {
    pub(crate) fn is_live(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// Учётная запись документа одного открытого окна
pub struct WindowSession {
    id: WindowId,
    window: Arc<dyn WindowHandle>,
    pub(crate) file_path: Option<PathBuf>,
    pub(crate) dirty: bool,
    // Последний буфер от окна, сверка идёт именно с ним
    pub(crate) latest_contents: Option<String>,
    pub(crate) pending_check: Option<PendingCheck>,
    // Растёт при каждой смене буфера (edit, open)
    pub(crate) buffer_seq: u64,
    // Растёт при каждой записи на диск; чтение, начатое раньше, устарело
    pub(crate) disk_generation: u64,
}

impl WindowSession {
    pub fn new(id: WindowId, window: Arc<dyn WindowHandle>, file_path: Option<PathBuf>) -> Self {
        Self {
            id,
            window,
            file_path,
            dirty: false,
            latest_contents: None,
            pending_check: None,
            buffer_seq: 0,
            disk_generation: 0,
        }
    }

    pub fn id(&self) -> &WindowId {
        &self.id
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[cfg(test)]
    pub fn has_pending_check(&self) -> bool {
        self.pending_check.is_some()
    }

    pub fn state(&self) -> SessionState {
        match (&self.file_path, self.dirty) {
            (None, _) => SessionState::Unbound,
            (Some(_), false) => SessionState::Clean,
            (Some(_), true) => SessionState::Dirty,
        }
    }

    pub fn notify(&self, notification: WindowNotification) {
        self.window.notify(notification);
    }
}

impl fmt::Debug for WindowSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowSession")
            .field("id", &self.id)
            .field("file_path", &self.file_path)
            .field("dirty", &self.dirty)
            .field("pending_check", &self.pending_check.as_ref().map(|p| p.token))
            .field("buffer_seq", &self.buffer_seq)
            .field("disk_generation", &self.disk_generation)
            .finish_non_exhaustive()
    }
}

/// Таблица живых сессий окон на весь процесс.
///
/// `get`/`get_mut` для id, которые должны быть живы: промах это ошибка
/// (устаревший или подделанный id), логируется как ошибка. `lookup`/`lookup_mut`
/// для повторного чтения сессии после await, там промах значит, что окно
/// успели закрыть.
#[derive(Debug, Default)]
pub struct WindowRegistry {
    sessions: DashMap<WindowId, WindowSession>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn register(&self, session: WindowSession) -> Result<()> {
        match self.sessions.entry(session.id().clone()) {
            Entry::Occupied(entry) => {
                error!("Коллизия id окна: {}", entry.key());
                Err(EditorError::DuplicateId(entry.key().clone()))
            }
            Entry::Vacant(entry) => {
                info!(
                    "Зарегистрировано окно {} ({})",
                    session.id(),
                    session
                        .file_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "без файла".to_string())
                );
                entry.insert(session);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: &WindowId) -> Result<Ref<'_, WindowId, WindowSession>> {
        self.sessions.get(id).ok_or_else(|| Self::unknown(id))
    }

    pub fn get_mut(&self, id: &WindowId) -> Result<RefMut<'_, WindowId, WindowSession>> {
        self.sessions.get_mut(id).ok_or_else(|| Self::unknown(id))
    }

    pub fn lookup(&self, id: &WindowId) -> Option<Ref<'_, WindowId, WindowSession>> {
        self.sessions.get(id)
    }

    pub fn lookup_mut(&self, id: &WindowId) -> Option<RefMut<'_, WindowId, WindowSession>> {
        self.sessions.get_mut(id)
    }

    /// Удаление уже удалённого id ничего не делает
    pub fn remove(&self, id: &WindowId) -> Option<WindowSession> {
        let removed = self.sessions.remove(id).map(|(_, session)| session);
        if removed.is_some() {
            info!("Удалено окно {}", id);
        }
        removed
    }

    pub fn contains(&self, id: &WindowId) -> bool {
        self.sessions.contains_key(id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ids(&self) -> Vec<WindowId> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    fn unknown(id: &WindowId) -> EditorError {
        error!("Неизвестный id окна: {}", id);
        EditorError::UnknownWindow(id.clone())
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use parking_lot::Mutex;

    /// WindowHandle, запоминающий все уведомления для проверок
    #[derive(Debug, Default)]
    pub struct RecordingWindow {
        received: Mutex<Vec<WindowNotification>>,
    }

    impl RecordingWindow {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn take(&self) -> Vec<WindowNotification> {
            std::mem::take(&mut *self.received.lock())
        }

        pub fn dirty_changes(&self) -> Vec<bool> {
            self.received
                .lock()
                .iter()
                .filter_map(|n| match n {
                    WindowNotification::DirtyChanged { dirty } => Some(*dirty),
                    _ => None,
                })
                .collect()
        }
    }

    impl WindowHandle for RecordingWindow {
        fn notify(&self, notification: WindowNotification) {
            self.received.lock().push(notification);
        }
    }
}
