use super::r#trait::DocumentStore;
use dashmap::DashMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Читает с диска, записи держит в памяти.
///
/// Чтение пути, записанного в этом запуске, возвращает копию из памяти, так
/// что сохранение и следующая за ним сверка видят одно и то же.
#[derive(Debug, Default)]
pub struct DryRunStore {
    written: DashMap<PathBuf, String>,
}

impl DryRunStore {
    pub fn new() -> Self {
        info!("Режим dry-run: записи документов остаются в памяти");
        Self {
            written: DashMap::new(),
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for DryRunStore {
    async fn read(&self, path: &Path) -> io::Result<String> {
        if let Some(contents) = self.written.get(path) {
            return Ok(contents.value().clone());
        }
        tokio::fs::read_to_string(path).await
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        info!("[DRY RUN] запись {} байт в {}", contents.len(), path.display());
        self.written.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}
