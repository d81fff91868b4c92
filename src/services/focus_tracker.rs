use crate::events::WindowId;
use parking_lot::RwLock;

/// FocusTracker отвечает на вопрос "какое окно активно" для меню и горячих клавиш.
///
/// Зона ответственности (строго):
/// - Помнить окно, которое фронтенд последним назвал активным.
/// - Забывать его, когда окно закрыто.
/// - НЕ проверять, зарегистрировано ли окно; вызывающие идут через реестр.
pub trait FocusTracker: Send + Sync {
    fn current_window_id(&self) -> Option<WindowId>;
    fn focus(&self, window_id: WindowId);
    fn forget(&self, window_id: &WindowId);
}

/// Реализация по умолчанию, питается командами `focus` от фронтенда
#[derive(Debug, Default)]
pub struct DefaultFocusTracker {
    focused: RwLock<Option<WindowId>>,
}

impl DefaultFocusTracker {
    pub fn new() -> Self {
        Self {
            focused: RwLock::new(None),
        }
    }
}

impl FocusTracker for DefaultFocusTracker {
    fn current_window_id(&self) -> Option<WindowId> {
        self.focused.read().clone()
    }

    fn focus(&self, window_id: WindowId) {
        *self.focused.write() = Some(window_id);
    }

    fn forget(&self, window_id: &WindowId) {
        let mut focused = self.focused.write();
        if focused.as_ref() == Some(window_id) {
            *focused = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_replaces_previous_window() {
        let tracker = DefaultFocusTracker::new();
        assert_eq!(tracker.current_window_id(), None);

        tracker.focus(WindowId::from("win:a"));
        tracker.focus(WindowId::from("win:b"));
        assert_eq!(tracker.current_window_id(), Some(WindowId::from("win:b")));
    }

    #[test]
    fn forget_only_clears_matching_window() {
        let tracker = DefaultFocusTracker::new();
        tracker.focus(WindowId::from("win:a"));

        tracker.forget(&WindowId::from("win:b"));
        assert_eq!(tracker.current_window_id(), Some(WindowId::from("win:a")));

        tracker.forget(&WindowId::from("win:a"));
        assert_eq!(tracker.current_window_id(), None);
    }
}
