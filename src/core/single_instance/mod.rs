// ─── Single Instance ───
// One running copy per application id. Later launches learn the PID of the
// running copy and hand it their arguments instead of starting again.

pub mod file_lock;
#[cfg(target_os = "windows")]
pub mod named;
mod reactivate;

use std::path::Path;

use crate::core::error::LauncherResult;

pub use file_lock::FileLockCoordinator;
#[cfg(target_os = "windows")]
pub use named::NamedObjectCoordinator;
pub use reactivate::reactivate_window;

/// Held for as long as this process owns the application id.
pub struct InstanceLock {
    _held: Held,
}

// Guards are only held for their Drop.
#[allow(dead_code)]
enum Held {
    File(file_lock::FileLockGuard),
    #[cfg(target_os = "windows")]
    Named(named::NamedObjectGuard),
}

impl std::fmt::Debug for InstanceLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("InstanceLock")
    }
}

#[derive(Debug)]
pub enum LockOutcome {
    Acquired(InstanceLock),
    /// Another process owns the id.
    HeldBy(u32),
}

pub trait InstanceCoordinator {
    fn acquire(&self, app_id: &str) -> LauncherResult<LockOutcome>;

    /// Bring the running instance's window to the front. Best effort.
    fn reactivate(&self, pid: u32) -> bool {
        reactivate_window(pid)
    }
}

/// Platform strategy: named kernel objects on Windows, a locked file
/// under `temp_dir` elsewhere.
pub fn default_coordinator(temp_dir: &Path) -> Box<dyn InstanceCoordinator> {
    #[cfg(target_os = "windows")]
    {
        let _ = temp_dir;
        Box::new(NamedObjectCoordinator)
    }
    #[cfg(not(target_os = "windows"))]
    {
        Box::new(FileLockCoordinator::new(temp_dir))
    }
}

/// Application id reduced to characters safe in file and object names.
pub fn sanitize_id(app_id: &str) -> String {
    let sanitized: String = app_id
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "app".to_string()
    } else {
        sanitized
    }
}
