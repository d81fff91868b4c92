use std::path::{Path, PathBuf};

/// Имя для заголовка окна: последний компонент пути
pub fn display_filename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Разрешить путь из командной строки относительно рабочего каталога
pub fn resolve_launch_path(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_filename() {
        assert_eq!(display_filename(Path::new("/tmp/notes/a.md")), "a.md");
        assert_eq!(display_filename(Path::new("b.markdown")), "b.markdown");
    }

    #[test]
    fn test_resolve_launch_path() {
        let cwd = Path::new("/home/user");
        assert_eq!(
            resolve_launch_path(Path::new("docs/a.md"), cwd),
            PathBuf::from("/home/user/docs/a.md")
        );
        assert_eq!(
            resolve_launch_path(Path::new("/etc/readme.md"), cwd),
            PathBuf::from("/etc/readme.md")
        );
    }
}
