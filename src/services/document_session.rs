use crate::config::Config;
use crate::debug_if_enabled;
use crate::error::{EditorError, Result};
use crate::events::{PickMode, WindowId, WindowNotification};
use crate::services::document_store::DocumentStore;
use crate::services::path_picker::PathPicker;
use crate::services::window_registry::{
    PendingCheck, SessionState, WindowHandle, WindowRegistry, WindowSession,
};
use crate::utils::{display_filename, resolve_launch_path};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Итог сохранения без ошибки
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    /// Пользователь закрыл диалог, ничего не записано
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: WindowId,
    pub file_path: Option<PathBuf>,
    pub state: SessionState,
    pub dirty: bool,
}

/// Отслеживание изменений по окнам и протокол открытия/сохранения.
///
/// После каждого await сессия заново берётся из реестра; guard реестра
/// никогда не держится через ввод-вывод или диалог.
pub struct DocumentSessions {
    config: Arc<Config>,
    registry: Arc<WindowRegistry>,
    store: Arc<dyn DocumentStore>,
    picker: Arc<dyn PathPicker>,
    next_check: AtomicU64,
}

impl DocumentSessions {
    pub fn new(
        config: Arc<Config>,
        registry: Arc<WindowRegistry>,
        store: Arc<dyn DocumentStore>,
        picker: Arc<dyn PathPicker>,
    ) -> Self {
        info!(
            "Инициализация DocumentSessions (debounce: {}ms)",
            config.editor.debounce_ms
        );

        Self {
            config,
            registry,
            store,
            picker,
            next_check: AtomicU64::new(1),
        }
    }

    pub fn registry(&self) -> &Arc<WindowRegistry> {
        &self.registry
    }

    /// Завести сессию для только что созданного окна.
    ///
    /// Относительный `file_path` разрешается от рабочего каталога.
    pub fn create_window(
        &self,
        window_id: WindowId,
        window: Arc<dyn WindowHandle>,
        file_path: Option<&Path>,
    ) -> Result<()> {
        let file_path = match file_path {
            Some(path) => Some(resolve_launch_path(path, &std::env::current_dir()?)),
            None => None,
        };
        self.registry
            .register(WindowSession::new(window_id, window, file_path))
    }

    /// Редактор окна загрузился: открываем привязанный файл, если он есть
    pub async fn on_window_ready(&self, window_id: &WindowId) -> Result<()> {
        let path = self
            .registry
            .get(window_id)?
            .file_path()
            .map(Path::to_path_buf);

        match path {
            Some(path) => self.open(window_id, &path).await,
            None => {
                debug!("Окно {} готово, документ пустой", window_id);
                Ok(())
            }
        }
    }

    /// Загрузить `path` в окно вместо текущего содержимого.
    ///
    /// Сессия меняется только после успешного чтения.
    pub async fn open(&self, window_id: &WindowId, path: &Path) -> Result<()> {
        self.registry.get(window_id)?;

        let read = self.store.read(path).await;

        let Some(mut session) = self.registry.lookup_mut(window_id) else {
            info!(
                "Окно {} закрыто во время чтения {}, результат отброшен",
                window_id,
                path.display()
            );
            return Ok(());
        };

        let contents = read.map_err(|e| EditorError::file_read(path, e))?;

        // Сверка, запланированная для прежнего буфера, не должна судить о новом
        session.pending_check = None;
        session.buffer_seq += 1;
        session.file_path = Some(path.to_path_buf());
        session.dirty = false;
        session.latest_contents = Some(contents.clone());

        session.notify(WindowNotification::ContentsReplaced {
            filename: display_filename(path),
            contents,
        });
        session.notify(WindowNotification::dirty(false));

        info!("Открыт {} в окне {}", path.display(), window_id);
        Ok(())
    }

    /// В буфере окна теперь `contents`.
    ///
    /// Для сессии с файлом планируется отложенная сверка с диском; новые правки
    /// сдвигают срок той же сверки, а не запускают ещё одну.
    pub fn edit(&self, window_id: &WindowId, contents: String) -> Result<()> {
        let mut session = self.registry.get_mut(window_id)?;
        debug_if_enabled!("Правка в окне {} ({} байт)", window_id, contents.len());

        session.latest_contents = Some(contents);
        session.buffer_seq += 1;

        if session.file_path.is_none() {
            // Буфер без файла грязный с первой правки, фронтенд следит за этим сам
            session.dirty = true;
            return Ok(());
        }

        let deadline = Instant::now() + self.config.debounce();

        if let Some(pending) = session.pending_check.as_ref().filter(|p| p.is_live()) {
            pending.deadline.send_replace(deadline);
            return Ok(());
        }

        let token = self.next_check.fetch_add(1, Ordering::Relaxed);
        let (deadline_tx, deadline_rx) = watch::channel(deadline);
        let handle = tokio::spawn(run_dirty_check(
            Arc::clone(&self.registry),
            Arc::clone(&self.store),
            window_id.clone(),
            token,
            deadline_rx,
        ));

        session.pending_check = Some(PendingCheck {
            token,
            deadline: deadline_tx,
            handle,
        });
        debug_if_enabled!("Запланирована сверка #{} для окна {}", token, window_id);

        Ok(())
    }

    /// Записать `contents` в привязанный файл или сначала спросить путь.
    ///
    /// Неудачная запись не меняет сессию.
    pub async fn save(&self, window_id: &WindowId, contents: String) -> Result<SaveOutcome> {
        let (bound, buffer_seq) = {
            let session = self.registry.get(window_id)?;
            (session.file_path().map(Path::to_path_buf), session.buffer_seq)
        };

        let path = match bound {
            Some(path) => path,
            None => {
                let request = self.config.pick_request(PickMode::Save);
                let Some(path) = self.picker.pick(window_id, request).await else {
                    info!("Сохранение окна {} отменено", window_id);
                    return Ok(SaveOutcome::Cancelled);
                };

                if !self.registry.contains(window_id) {
                    info!(
                        "Окно {} закрыто во время выбора пути, ничего не записано",
                        window_id
                    );
                    return Ok(SaveOutcome::Cancelled);
                }
                path
            }
        };

        self.write(&path, &contents).await?;

        match self.registry.lookup_mut(window_id) {
            Some(mut session) => {
                if commit_save(&mut session, &path, contents, buffer_seq) {
                    session.notify(WindowNotification::FilenameChanged {
                        filename: display_filename(&path),
                    });
                }
            }
            None => info!("Окно {} закрыто во время записи {}", window_id, path.display()),
        }

        info!("Окно {} сохранено в {}", window_id, path.display());
        Ok(SaveOutcome::Saved(path))
    }

    /// Попросить окно прислать живой буфер; ответ придёт как `save`
    pub fn request_save(&self, window_id: &WindowId) -> Result<()> {
        let session = self.registry.get(window_id)?;
        session.notify(WindowNotification::FlushRequested);
        debug!("Запрошен буфер окна {}", window_id);
        Ok(())
    }

    /// Дать пользователю выбрать файл и открыть его в этом окне.
    ///
    /// Возвращает открытый путь или `None`, если диалог отменён.
    pub async fn on_open_requested(&self, window_id: &WindowId) -> Result<Option<PathBuf>> {
        self.registry.get(window_id)?;

        let request = self.config.pick_request(PickMode::Open);
        let Some(path) = self.picker.pick(window_id, request).await else {
            debug!("Открытие в окне {} отменено", window_id);
            return Ok(None);
        };

        if !self.registry.contains(window_id) {
            info!("Окно {} закрыто во время выбора файла", window_id);
            return Ok(None);
        }

        let is_markdown = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.config.is_markdown_extension(ext));
        if !is_markdown {
            warn!("Открывается {}, это не markdown", path.display());
        }

        self.open(window_id, &path).await?;
        Ok(Some(path))
    }

    /// Убрать сессию закрытого окна. Незавершённый ввод-вывод для неё отбрасывается.
    pub fn close_window(&self, window_id: &WindowId) -> bool {
        self.registry.remove(window_id).is_some()
    }

    /// Убрать все сессии (завершение работы)
    pub fn close_all(&self) -> usize {
        self.registry
            .ids()
            .iter()
            .filter(|id| self.close_window(id))
            .count()
    }

    pub fn snapshot(&self, window_id: &WindowId) -> Result<SessionSnapshot> {
        let session = self.registry.get(window_id)?;
        Ok(SessionSnapshot {
            id: session.id().clone(),
            file_path: session.file_path().map(Path::to_path_buf),
            state: session.state(),
            dirty: session.is_dirty(),
        })
    }

    /// Сессии с несохранёнными правками (грязные с файлом или без файла вообще)
    pub fn unsaved(&self) -> Vec<SessionSnapshot> {
        self.registry
            .ids()
            .iter()
            .filter_map(|id| self.snapshot(id).ok())
            .filter(|snapshot| snapshot.dirty)
            .collect()
    }

    async fn write(&self, path: &Path, contents: &str) -> Result<()> {
        self.store
            .write(path, contents)
            .await
            .map_err(|e| EditorError::file_write(path, e))
    }
}

/// Применить к сессии успешную запись `contents` в `path`.
///
/// `buffer_seq` снят до записи. Возвращает `true`, если окно только что
/// получило файл.
fn commit_save(
    session: &mut WindowSession,
    path: &Path,
    contents: String,
    buffer_seq: u64,
) -> bool {
    // Чтения, начатые до записи, видели старый диск
    session.disk_generation += 1;

    if session.file_path().is_some_and(|bound| bound != path) {
        info!(
            "В окне {} уже открыт другой файл, сохранение {} не меняет сессию",
            session.id(),
            path.display()
        );
        return false;
    }
    let newly_bound = session.file_path.is_none();
    session.file_path = Some(path.to_path_buf());

    if session.buffer_seq == buffer_seq {
        session.pending_check = None;
        session.latest_contents = Some(contents);
        session.dirty = false;
    } else {
        // Правки пришли во время записи: буфер новее того, что на диске
        session.dirty = session.latest_contents.as_deref() != Some(contents.as_str());
        debug!(
            "Окно {} менялось во время записи, dirty = {}",
            session.id(),
            session.dirty
        );
    }

    session.notify(WindowNotification::dirty(session.dirty));
    newly_bound
}

/// Задача отложенной сверки: дождаться паузы в правках, сравнить диск с
/// последним буфером, повторить, если правки продолжились, затем снять
/// ожидающую сверку с сессии.
async fn run_dirty_check(
    registry: Arc<WindowRegistry>,
    store: Arc<dyn DocumentStore>,
    window_id: WindowId,
    token: u64,
    mut deadline: watch::Receiver<Instant>,
) {
    loop {
        loop {
            let until = *deadline.borrow_and_update();
            sleep_until(until).await;
            match deadline.has_changed() {
                Ok(true) => continue,
                Ok(false) => break,
                // Сессия закрыта или сверка заменена
                Err(_) => return,
            }
        }

        recheck(&registry, store.as_ref(), &window_id, token).await;

        // ✅ Решается под guard сессии: параллельная правка либо видит эту
        // сверку ещё живой, либо не видит никакой и заводит новую
        let check_again = {
            let Some(mut session) = registry.lookup_mut(&window_id) else {
                return;
            };
            if !owns_pending_check(&session, token) {
                return;
            }
            if deadline.has_changed().unwrap_or(false) {
                true
            } else {
                session.pending_check = None;
                false
            }
        };

        if !check_again {
            return;
        }
        debug_if_enabled!("Во время сверки #{} пришли правки, ждём снова", token);
    }
}

async fn recheck(
    registry: &WindowRegistry,
    store: &dyn DocumentStore,
    window_id: &WindowId,
    token: u64,
) {
    let (path, generation) = match registry.lookup(window_id) {
        Some(session) => match session.file_path() {
            Some(path) => (path.to_path_buf(), session.disk_generation),
            None => return,
        },
        None => return,
    };

    let on_disk = match store.read(&path).await {
        Ok(contents) => contents,
        Err(e) => {
            warn!(
                "Сверка окна {} не смогла прочитать {}: {}",
                window_id,
                path.display(),
                e
            );
            return;
        }
    };

    let Some(mut session) = registry.lookup_mut(window_id) else {
        debug!("Окно {} закрыто во время сверки", window_id);
        return;
    };
    if !owns_pending_check(&session, token) || session.file_path() != Some(path.as_path()) {
        return;
    }
    if session.disk_generation != generation {
        debug!("Файл окна {} перезаписан во время сверки, результат устарел", window_id);
        return;
    }
    let Some(current) = session.latest_contents.as_deref() else {
        return;
    };

    let now_dirty = on_disk.as_bytes() != current.as_bytes();
    if now_dirty != session.dirty {
        session.dirty = now_dirty;
        session.notify(WindowNotification::dirty(now_dirty));
        info!(
            "Окно {} теперь {}",
            window_id,
            if now_dirty { "изменено" } else { "сохранено" }
        );
    }
}

fn owns_pending_check(session: &WindowSession, token: u64) -> bool {
    session
        .pending_check
        .as_ref()
        .is_some_and(|pending| pending.token == token)
}
