use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::events::PickMode;
use crate::services::path_picker::PickRequest;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub editor: EditorConfig,
    pub dialogs: DialogConfig,
    // Оптимизационный индекс - не сериализуется, строится после загрузки
    #[serde(skip)]
    extension_set: HashSet<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EditorConfig {
    /// Пауза после последней правки перед сверкой с диском
    pub debounce_ms: u64,
    pub markdown_extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DialogConfig {
    pub open_title: String,
    pub save_title: String,
    pub filter_name: String,
    pub save_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
                filter: "mdpad=info".to_string(),
            },
            editor: EditorConfig {
                debounce_ms: 1000,
                markdown_extensions: [
                    "md", "markdown", "mdown", "mkdn", "mkd", "mdwn", "mkdown", "ron",
                ]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            },
            dialogs: DialogConfig {
                open_title: "Open markdown file".to_string(),
                save_title: "Save new markdown file".to_string(),
                filter_name: "Markdown Files".to_string(),
                save_extensions: vec!["md".to_string()],
            },
            extension_set: HashSet::new(),
        };
        config.build_extension_index();
        config
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("MDPAD_").split("__"));

        let mut config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;
        config.build_extension_index();

        Ok(config)
    }

    pub fn build_extension_index(&mut self) {
        self.extension_set = self
            .editor
            .markdown_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        if self.editor.debounce_ms == 0 {
            anyhow::bail!("editor.debounce_ms должен быть больше 0");
        }

        if self.editor.markdown_extensions.is_empty() {
            anyhow::bail!("editor.markdown_extensions не может быть пустым");
        }

        if self.dialogs.save_extensions.is_empty() {
            anyhow::bail!("dialogs.save_extensions не может быть пустым");
        }

        for (i, ext) in self
            .editor
            .markdown_extensions
            .iter()
            .chain(&self.dialogs.save_extensions)
            .enumerate()
        {
            if ext.trim_start_matches('.').is_empty() {
                anyhow::bail!("Пустое расширение файла в позиции #{}", i + 1);
            }
        }

        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.editor.debounce_ms)
    }

    pub fn is_markdown_extension(&self, ext: &str) -> bool {
        self.extension_set.contains(&ext.to_lowercase())
    }

    /// Запрос диалога для режима `mode` из настроек dialogs
    pub fn pick_request(&self, mode: PickMode) -> PickRequest {
        match mode {
            PickMode::Open => PickRequest {
                mode,
                title: self.dialogs.open_title.clone(),
                filter_name: self.dialogs.filter_name.clone(),
                extensions: self.editor.markdown_extensions.clone(),
            },
            PickMode::Save => PickRequest {
                mode,
                title: self.dialogs.save_title.clone(),
                filter_name: self.dialogs.filter_name.clone(),
                extensions: self.dialogs.save_extensions.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.debounce(), Duration::from_millis(1000));
    }

    #[test]
    fn test_zero_debounce_rejected() {
        let mut config = Config::default();
        config.editor.debounce_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_logging_rejected() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_markdown_extensions() {
        let config = Config::default();
        assert!(config.is_markdown_extension("md"));
        assert!(config.is_markdown_extension("MKD"));
        assert!(config.is_markdown_extension("ron"));
        assert!(!config.is_markdown_extension("txt"));
    }

    #[test]
    fn test_pick_requests() {
        let config = Config::default();

        let open = config.pick_request(PickMode::Open);
        assert_eq!(open.title, "Open markdown file");
        assert_eq!(open.extensions.len(), 8);

        let save = config.pick_request(PickMode::Save);
        assert_eq!(save.title, "Save new markdown file");
        assert_eq!(save.extensions, vec!["md".to_string()]);
    }

    #[test]
    fn test_load_merges_toml_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mdpad.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[editor]\ndebounce_ms = 250\nmarkdown_extensions = [\"md\", \"txt\"]").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.editor.debounce_ms, 250);
        assert!(config.is_markdown_extension("txt"));
        assert_eq!(config.dialogs.filter_name, "Markdown Files");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.editor.debounce_ms, 1000);
    }
}
