//! DocumentStore: единственное место, где ядро трогает файловую систему.
//!
//! Реализации читают файл целиком как UTF-8 и перезаписывают файл целиком.
//! Состояния сессий в них нет, изменения отслеживает DocumentSessions.

mod disk_store;
mod dry_store;
#[cfg(test)]
pub(crate) mod memory_store;
mod r#trait;

pub use self::r#trait::{create_document_store, DocumentStore};
