use super::r#trait::DocumentStore;
use crate::trace_if_enabled;
use std::io;
use std::path::Path;

#[derive(Debug, Default)]
pub struct DiskStore;

impl DiskStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl DocumentStore for DiskStore {
    async fn read(&self, path: &Path) -> io::Result<String> {
        trace_if_enabled!("Чтение {}", path.display());
        tokio::fs::read_to_string(path).await
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        trace_if_enabled!("Запись {} байт в {}", contents.len(), path.display());
        tokio::fs::write(path, contents.as_bytes()).await
    }
}
