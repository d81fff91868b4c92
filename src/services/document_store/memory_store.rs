use super::r#trait::DocumentStore;
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Хранилище в памяти для тестов: считает чтения, падает и тормозит по запросу
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: DashMap<PathBuf, String>,
    failing_reads: DashSet<PathBuf>,
    failing_writes: DashSet<PathBuf>,
    read_delay: Mutex<Option<Duration>>,
    write_delay: Mutex<Option<Duration>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, contents: &str) -> Self {
        self.put(path, contents);
        self
    }

    /// Имитирует правку файла другой программой
    pub fn put(&self, path: impl Into<PathBuf>, contents: &str) {
        self.files.insert(path.into(), contents.to_string());
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.get(path.as_ref()).map(|c| c.value().clone())
    }

    pub fn fail_reads(&self, path: impl Into<PathBuf>) {
        self.failing_reads.insert(path.into());
    }

    pub fn heal_reads(&self, path: impl AsRef<Path>) {
        self.failing_reads.remove(path.as_ref());
    }

    pub fn fail_writes(&self, path: impl Into<PathBuf>) {
        self.failing_writes.insert(path.into());
    }

    /// Чтение берёт снимок файла сразу, а отдаёт его через `delay`
    pub fn delay_reads(&self, delay: Duration) {
        *self.read_delay.lock() = Some(delay);
    }

    /// Запись попадает в файл только через `delay`
    pub fn delay_writes(&self, delay: Duration) {
        *self.write_delay.lock() = Some(delay);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, path: &Path) -> io::Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let result = if self.failing_reads.contains(path) {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read locked"))
        } else {
            self.contents(path)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
        };

        let delay = *self.read_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let delay = *self.write_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_writes.contains(path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.put(path, contents);
        Ok(())
    }
}
