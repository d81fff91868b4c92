use std::io;
use std::path::Path;
use std::sync::Arc;

/// Текстовое хранилище целых файлов для open, save и фоновой сверки
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Прочитать файл целиком; не-UTF-8 содержимое даёт ошибку `InvalidData`
    async fn read(&self, path: &Path) -> io::Result<String>;

    /// Перезаписать файл содержимым `contents`
    async fn write(&self, path: &Path, contents: &str) -> io::Result<()>;
}

/// Фабричная функция для создания хранилища в зависимости от флага dry_run
pub fn create_document_store(dry_run: bool) -> Arc<dyn DocumentStore> {
    if dry_run {
        Arc::new(super::dry_store::DryRunStore::new())
    } else {
        Arc::new(super::disk_store::DiskStore::new())
    }
}
