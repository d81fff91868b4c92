//! ShellBridge: граница между UI-фронтендом и ядром сессий.
//!
//! Читает по одному JSON-объекту `ShellCommand` на строку и пишет по одному
//! `ShellMessage` на строку. Команды, которые ждут ввод-вывод или диалог,
//! выполняются задачами, чтобы чтение не останавливалось; ответ на диалог
//! приходит позже отдельной командой `pathPicked`.

use crate::config::Config;
use crate::editor_error;
use crate::error::{EditorError, Result};
use crate::events::{ShellCommand, ShellMessage, WindowId, WindowNotification};
use crate::services::document_session::{DocumentSessions, SaveOutcome};
use crate::services::document_store::DocumentStore;
use crate::services::focus_tracker::FocusTracker;
use crate::services::path_picker::{PathPicker, PickRequest};
use crate::services::window_registry::{WindowHandle, WindowRegistry};
use crate::{debug_if_enabled, trace_if_enabled};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

pub type Outbound = mpsc::UnboundedSender<ShellMessage>;

/// Окно, пересылающее уведомления фронтенду
struct BridgeWindow {
    window_id: WindowId,
    outbound: Outbound,
}

impl WindowHandle for BridgeWindow {
    fn notify(&self, notification: WindowNotification) {
        debug_if_enabled!("-> {}: {}", self.window_id, notification);
        let message = ShellMessage::Notify {
            window_id: self.window_id.clone(),
            notification,
        };
        if self.outbound.send(message).is_err() {
            debug!("Фронтенд отключён, уведомление для {} отброшено", self.window_id);
        }
    }
}

/// Запросы диалога, ждущие ответа `pathPicked`
#[derive(Debug, Default)]
struct PendingPicks {
    next_id: AtomicU64,
    waiting: DashMap<u64, oneshot::Sender<Option<PathBuf>>>,
    closed: AtomicBool,
}

impl PendingPicks {
    fn register(&self) -> Option<(u64, oneshot::Receiver<Option<PathBuf>>)> {
        if self.closed.load(Ordering::SeqCst) {
            return None;
        }
        let request_id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = oneshot::channel();
        self.waiting.insert(request_id, tx);
        Some((request_id, rx))
    }

    fn resolve(&self, request_id: u64, path: Option<PathBuf>) -> Result<()> {
        let (_, tx) = self
            .waiting
            .remove(&request_id)
            .ok_or_else(|| editor_error!(protocol, "нет запроса диалога #{}", request_id))?;
        if tx.send(path).is_err() {
            debug!("Запрос диалога #{} уже никто не ждёт", request_id);
        }
        Ok(())
    }

    fn forget(&self, request_id: u64) {
        self.waiting.remove(&request_id);
    }

    /// Отменить всё ожидающее и больше не принимать запросы
    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let count = self.waiting.len();
        self.waiting.clear();
        if count > 0 {
            info!("Отменено запросов диалога: {}", count);
        }
    }
}

/// PathPicker, который просит фронтенд показать системный диалог
struct BridgePicker {
    outbound: Outbound,
    picks: Arc<PendingPicks>,
}

#[async_trait::async_trait]
impl PathPicker for BridgePicker {
    async fn pick(&self, window_id: &WindowId, request: PickRequest) -> Option<PathBuf> {
        let (request_id, answer) = self.picks.register()?;

        let message = ShellMessage::PickPath {
            request_id,
            window_id: window_id.clone(),
            mode: request.mode,
            title: request.title,
            filter_name: request.filter_name,
            extensions: request.extensions,
        };
        if self.outbound.send(message).is_err() {
            self.picks.forget(request_id);
            return None;
        }

        match answer.await {
            Ok(path) => path,
            Err(_) => {
                warn!("Запрос диалога #{} брошен", request_id);
                None
            }
        }
    }
}

pub struct ShellBridge {
    sessions: Arc<DocumentSessions>,
    focus: Arc<dyn FocusTracker>,
    outbound: Outbound,
    picks: Arc<PendingPicks>,
    stop: watch::Sender<bool>,
}

impl ShellBridge {
    pub fn new(
        config: Arc<Config>,
        registry: Arc<WindowRegistry>,
        store: Arc<dyn DocumentStore>,
        focus: Arc<dyn FocusTracker>,
        outbound: Outbound,
    ) -> Self {
        info!("Инициализация ShellBridge");

        let picks = Arc::new(PendingPicks::default());
        let picker = Arc::new(BridgePicker {
            outbound: outbound.clone(),
            picks: Arc::clone(&picks),
        });
        let sessions = Arc::new(DocumentSessions::new(config, registry, store, picker));

        Self {
            sessions,
            focus,
            outbound,
            picks,
            stop: watch::Sender::new(false),
        }
    }

    pub fn sessions(&self) -> &Arc<DocumentSessions> {
        &self.sessions
    }

    /// Завести сессию и попросить фронтенд создать окно
    pub fn open_window(&self, file_path: Option<&Path>) -> Result<WindowId> {
        let window_id = WindowId::generate();
        let handle = Arc::new(BridgeWindow {
            window_id: window_id.clone(),
            outbound: self.outbound.clone(),
        });

        self.sessions
            .create_window(window_id.clone(), handle, file_path)?;
        self.send(ShellMessage::CreateWindow {
            window_id: window_id.clone(),
        });

        Ok(window_id)
    }

    /// Обрабатывать команды, пока не кончится ввод или не вызван `shutdown`
    pub async fn run<R>(self: Arc<Self>, reader: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        info!("ShellBridge запущен, читаем команды");

        let mut lines = reader.lines();
        let mut tasks = JoinSet::new();
        let mut stop = self.stop.subscribe();

        loop {
            let line = tokio::select! {
                biased;
                _ = stop.wait_for(|stopped| *stopped) => {
                    info!("Остановка чтения команд");
                    break;
                }
                line = lines.next_line() => match line? {
                    Some(line) => line,
                    None => {
                        info!("Фронтенд закрыл поток команд");
                        break;
                    }
                },
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            trace_if_enabled!("<- {}", line);

            let command = match serde_json::from_str::<ShellCommand>(line) {
                Ok(command) => command,
                Err(e) => {
                    warn!("Пропущена некорректная команда: {}", e);
                    continue;
                }
            };

            if command.suspends() {
                let bridge = Arc::clone(&self);
                tasks.spawn(async move { bridge.process(command).await });
            } else {
                self.process(command).await;
            }

            while tasks.try_join_next().is_some() {}
        }

        // ✅ Начатые сохранения доводятся до конца, диалоги отменяются
        self.picks.close();

        let outstanding = tasks.len();
        if outstanding > 0 {
            info!("Ожидание {} незавершённых команд", outstanding);
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("Задача команды упала: {}", e);
            }
        }

        Ok(())
    }

    /// Прекратить чтение команд; `run` дождётся начатых команд и вернётся
    pub fn shutdown(&self) {
        self.stop.send_replace(true);
    }

    async fn process(&self, command: ShellCommand) {
        debug_if_enabled!("Обработка {}", command);
        let window_id = command.window_id().cloned();

        if let Err(e) = self.handle(command).await {
            if e.is_user_facing() {
                warn!("{}", e);
            } else {
                error!("{}", e);
            }
            self.send(ShellMessage::Error {
                window_id,
                message: e.to_string(),
            });
        }
    }

    async fn handle(&self, command: ShellCommand) -> Result<()> {
        match command {
            ShellCommand::NewWindow { file_path } => {
                self.open_window(file_path.as_deref())?;
            }
            ShellCommand::MenuNew => {
                self.open_window(None)?;
            }
            ShellCommand::EditorReady { window_id } => {
                self.sessions.on_window_ready(&window_id).await?;
            }
            ShellCommand::Edit {
                window_id,
                contents,
            } => {
                self.sessions.edit(&window_id, contents)?;
            }
            ShellCommand::Save {
                window_id,
                contents,
            } => {
                match self.sessions.save(&window_id, contents).await? {
                    SaveOutcome::Saved(path) => {
                        debug!("Окно {} сохранено в {}", window_id, path.display())
                    }
                    SaveOutcome::Cancelled => debug!("Окно {} не сохранено", window_id),
                }
            }
            ShellCommand::OpenRequested { window_id } => {
                self.sessions.on_open_requested(&window_id).await?;
            }
            ShellCommand::FlushAndSave { window_id } => {
                self.sessions.request_save(&window_id)?;
            }
            ShellCommand::Focus { window_id } => {
                if !self.sessions.registry().contains(&window_id) {
                    return Err(EditorError::UnknownWindow(window_id));
                }
                self.focus.focus(window_id);
            }
            ShellCommand::MenuOpen => match self.focused_window() {
                Some(window_id) => {
                    self.sessions.on_open_requested(&window_id).await?;
                }
                None => debug!("Открытие пропущено: нет активного окна"),
            },
            ShellCommand::MenuSave => match self.focused_window() {
                Some(window_id) => self.sessions.request_save(&window_id)?,
                None => debug!("Сохранение пропущено: нет активного окна"),
            },
            ShellCommand::WindowClosed { window_id } => {
                let closed = self.sessions.close_window(&window_id);
                self.focus.forget(&window_id);
                if closed && self.sessions.registry().is_empty() {
                    info!("Закрыто последнее окно, завершаем работу");
                    self.send(ShellMessage::Quit);
                    self.shutdown();
                }
            }
            ShellCommand::PathPicked { request_id, path } => {
                self.picks.resolve(request_id, path)?;
            }
        }
        Ok(())
    }

    fn focused_window(&self) -> Option<WindowId> {
        self.focus
            .current_window_id()
            .filter(|window_id| self.sessions.registry().contains(window_id))
    }

    fn send(&self, message: ShellMessage) {
        if self.outbound.send(message).is_err() {
            debug!("Фронтенд отключён, сообщение отброшено");
        }
    }
}

/// Сериализовать исходящие сообщения, один JSON-объект на строку
pub async fn write_messages<W>(
    mut messages: mpsc::UnboundedReceiver<ShellMessage>,
    mut writer: W,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = messages.recv().await {
        let mut line = serde_json::to_string(&message)
            .map_err(|e| editor_error!(internal, "не удалось закодировать сообщение: {}", e))?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}
