//! Process lookup by name

use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, RefreshKind, System};

use capture_types::ProcessHandle;

/// Case-sensitive process name comparison.
///
/// `query` matches the full process name, or the name without a trailing
/// `.exe` so that `notepad` finds `notepad.exe`.
pub fn process_name_matches(candidate: &str, query: &str) -> bool {
    if candidate == query {
        return true;
    }

    match candidate.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.eq_ignore_ascii_case("exe") => stem == query,
        _ => false,
    }
}

fn process_list() -> System {
    let refresh = RefreshKind::new().with_processes(ProcessRefreshKind::new());
    System::new_with_specifics(refresh)
}

/// Process table holding only `pid`, if it is running
fn single_process(pid: Pid) -> System {
    let mut sys = System::new();
    sys.refresh_processes_specifics(ProcessesToUpdate::Some(&[pid]), true, ProcessRefreshKind::new());
    sys
}

fn is_live(status: ProcessStatus) -> bool {
    !matches!(status, ProcessStatus::Zombie | ProcessStatus::Dead)
}

/// Find the oldest live process whose name matches `name`
pub fn find_process_by_name(name: &str) -> Option<ProcessHandle> {
    let query = name.trim();
    if query.is_empty() {
        return None;
    }

    let sys = process_list();

    sys.processes()
        .values()
        .filter(|process| is_live(process.status()))
        .filter(|process| process_name_matches(&process.name().to_string_lossy(), query))
        .map(|process| {
            ProcessHandle::new(
                process.pid().as_u32(),
                process.name().to_string_lossy().to_string(),
                process.start_time(),
            )
        })
        .min_by_key(|handle| (handle.start_time, handle.pid))
}

/// Check whether `handle` no longer names a running process.
///
/// A pid that was reused by a different program counts as exited.
pub fn process_has_exited(handle: &ProcessHandle) -> bool {
    let pid = Pid::from_u32(handle.pid);
    let sys = single_process(pid);

    match sys.process(pid) {
        Some(process) => {
            !is_live(process.status())
                || process.start_time() != handle.start_time
                || process.name().to_string_lossy() != handle.name.as_str()
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_match_is_exact_and_case_sensitive() {
        assert!(process_name_matches("notepad.exe", "notepad.exe"));
        assert!(process_name_matches("notepad.exe", "notepad"));
        assert!(process_name_matches("Game.EXE", "Game"));
        assert!(process_name_matches("firefox", "firefox"));

        assert!(!process_name_matches("notepad.exe", "Notepad"));
        assert!(!process_name_matches("notepad++.exe", "notepad"));
        assert!(!process_name_matches("note", "notepad"));
        assert!(!process_name_matches(".exe", ""));
        assert!(!process_name_matches("app.bin", "app"));
    }

    #[test]
    fn test_blank_name_finds_nothing() {
        assert!(find_process_by_name("").is_none());
        assert!(find_process_by_name("   ").is_none());
    }

    #[test]
    fn test_missing_process_is_not_found() {
        assert!(find_process_by_name("definitely-not-running-4f1c9a").is_none());
    }

    #[test]
    fn test_vanished_pid_has_exited() {
        let ghost = ProcessHandle::new(u32::MAX - 7, "ghost", 0);
        assert!(process_has_exited(&ghost));
    }

    #[test]
    fn test_exit_check_loads_only_one_process() {
        let me = Pid::from_u32(std::process::id());
        let sys = single_process(me);

        assert!(sys.process(me).is_some());
        assert_eq!(sys.processes().len(), 1);
    }

    #[test]
    fn test_current_process_is_alive() {
        let sys = process_list();
        let me = sys
            .process(Pid::from_u32(std::process::id()))
            .expect("current process listed");
        let handle = ProcessHandle::new(
            std::process::id(),
            me.name().to_string_lossy().to_string(),
            me.start_time(),
        );

        assert!(!process_has_exited(&handle));

        let stale = ProcessHandle {
            start_time: handle.start_time + 1,
            ..handle
        };
        assert!(process_has_exited(&stale));
    }
}
