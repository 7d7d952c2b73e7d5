//! Main window selection among a process's top-level windows

use capture_types::WindowId;

/// Facts about one top-level window, in enumeration (z) order
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WindowCandidate {
    pub id: WindowId,
    pub visible: bool,
    /// Has an owner window (dialogs, tool palettes)
    pub owned: bool,
    pub titled: bool,
}

/// Pick the main window: visible and unowned, preferring a titled one
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub(crate) fn select_main_window(
    candidates: impl IntoIterator<Item = WindowCandidate>,
) -> Option<WindowId> {
    let mut untitled = None;

    for candidate in candidates {
        if !candidate.visible || candidate.owned {
            continue;
        }
        if candidate.titled {
            return Some(candidate.id);
        }
        untitled.get_or_insert(candidate.id);
    }

    untitled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(id: isize, visible: bool, owned: bool, titled: bool) -> WindowCandidate {
        WindowCandidate {
            id: WindowId(id),
            visible,
            owned,
            titled,
        }
    }

    #[test]
    fn test_owned_dialog_is_skipped() {
        let windows = [window(1, true, true, true), window(2, true, false, true)];
        assert_eq!(select_main_window(windows), Some(WindowId(2)));
    }

    #[test]
    fn test_titled_window_wins_over_untitled() {
        let windows = [window(1, true, false, false), window(2, true, false, true)];
        assert_eq!(select_main_window(windows), Some(WindowId(2)));
    }

    #[test]
    fn test_untitled_unowned_window_is_fallback() {
        let windows = [
            window(1, false, false, true),
            window(2, true, true, true),
            window(3, true, false, false),
        ];
        assert_eq!(select_main_window(windows), Some(WindowId(3)));
    }

    #[test]
    fn test_no_candidate() {
        assert_eq!(select_main_window([window(1, false, false, true)]), None);
        assert_eq!(select_main_window([]), None);
    }
}
