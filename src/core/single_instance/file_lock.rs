use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};

use super::{sanitize_id, Held, InstanceCoordinator, InstanceLock, LockOutcome};

const PID_READ_ATTEMPTS: u32 = 10;
const PID_READ_DELAY: Duration = Duration::from_millis(20);

#[derive(Debug, Serialize, Deserialize)]
struct LockPayload {
    pid: u32,
    timestamp: i64,
}

/// Advisory exclusive lock on `<dir>/<app id>.lock`.
#[derive(Debug, Clone)]
pub struct FileLockCoordinator {
    dir: PathBuf,
}

impl FileLockCoordinator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn lock_path(&self, app_id: &str) -> PathBuf {
        self.dir.join(format!("{}.lock", sanitize_id(app_id)))
    }
}

impl InstanceCoordinator for FileLockCoordinator {
    fn acquire(&self, app_id: &str) -> LauncherResult<LockOutcome> {
        let path = self.lock_path(app_id);
        std::fs::create_dir_all(&self.dir).map_err(|source| LauncherError::io(&self.dir, source))?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LauncherError::io(&path, source))?;

        match fs2::FileExt::try_lock_exclusive(&file) {
            Ok(()) => {
                publish_pid(&mut file, &path)?;
                info!("Acquired single instance lock {:?}", path);
                Ok(LockOutcome::Acquired(InstanceLock {
                    _held: Held::File(FileLockGuard { file, path }),
                }))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock
                || e.raw_os_error() == fs2::lock_contended_error().raw_os_error() =>
            {
                let pid = wait_for_pid(&mut file).ok_or_else(|| LauncherError::LockFailed {
                    app_id: app_id.to_string(),
                    message: format!("lock {:?} is held but no PID was published", path),
                })?;
                info!("Application already running as PID {}", pid);
                Ok(LockOutcome::HeldBy(pid))
            }
            Err(source) => Err(LauncherError::io(&path, source)),
        }
    }
}

fn publish_pid(file: &mut File, path: &Path) -> LauncherResult<()> {
    let payload = serde_json::to_string(&LockPayload {
        pid: std::process::id(),
        timestamp: Utc::now().timestamp(),
    })?;

    file.set_len(0)
        .and_then(|_| file.seek(SeekFrom::Start(0)))
        .and_then(|_| file.write_all(payload.as_bytes()))
        .and_then(|_| file.flush())
        .map_err(|source| LauncherError::io(path, source))
}

/// The winner may not have written its PID yet; poll briefly.
fn wait_for_pid(file: &mut File) -> Option<u32> {
    for attempt in 1..=PID_READ_ATTEMPTS {
        if let Some(pid) = read_pid(file) {
            return Some(pid);
        }
        debug!("Lock owner PID not published yet (attempt {})", attempt);
        std::thread::sleep(PID_READ_DELAY);
    }
    None
}

fn read_pid(file: &mut File) -> Option<u32> {
    let mut content = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut content).ok()?;
    parse_pid(&content)
}

/// JSON payload, or a bare integer from older launchers.
fn parse_pid(content: &str) -> Option<u32> {
    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    serde_json::from_str::<LockPayload>(content)
        .map(|payload| payload.pid)
        .ok()
        .or_else(|| content.parse().ok())
}

pub(crate) struct FileLockGuard {
    file: File,
    path: PathBuf,
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        // The file stays: removing it would let a waiter lock a stale inode.
        if let Err(source) = fs2::FileExt::unlock(&self.file) {
            warn!("Failed to release lock {:?}: {}", self.path, source);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_payload_formats() {
        assert_eq!(parse_pid(r#"{"pid":42,"timestamp":1700000000}"#), Some(42));
        assert_eq!(parse_pid("1234\n"), Some(1234));
        assert_eq!(parse_pid(""), None);
        assert_eq!(parse_pid("garbage"), None);
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn second_acquire_reports_owner_pid() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = FileLockCoordinator::new(dir.path());

        let first = coordinator.acquire("com.example.Demo").unwrap();
        assert!(matches!(first, LockOutcome::Acquired(_)));

        match coordinator.acquire("com.example.Demo").unwrap() {
            LockOutcome::HeldBy(pid) => assert_eq!(pid, std::process::id()),
            other => panic!("expected HeldBy, got {:?}", other),
        }

        drop(first);
        assert!(matches!(
            coordinator.acquire("com.example.Demo").unwrap(),
            LockOutcome::Acquired(_)
        ));
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn lock_file_holds_json_payload() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = FileLockCoordinator::new(dir.path());
        let _lock = coordinator.acquire("demo").unwrap();

        let content = std::fs::read_to_string(coordinator.lock_path("demo")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["pid"].as_u64(), Some(u64::from(std::process::id())));
        assert!(value["timestamp"].as_i64().unwrap() > 0);
    }
}
