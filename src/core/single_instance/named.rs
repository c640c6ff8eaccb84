// Named mutex plus a named mapping publishing the owner's PID.

use tracing::{debug, info};
use windows::core::PCWSTR;
use windows::Win32::Foundation::{
    CloseHandle, GetLastError, ERROR_ALREADY_EXISTS, HANDLE, INVALID_HANDLE_VALUE,
};
use windows::Win32::System::Memory::{
    CreateFileMappingW, MapViewOfFile, OpenFileMappingW, UnmapViewOfFile, FILE_MAP_ALL_ACCESS,
    FILE_MAP_READ, MEMORY_MAPPED_VIEW_ADDRESS, PAGE_READWRITE,
};
use windows::Win32::System::Threading::CreateMutexW;

use crate::core::error::{LauncherError, LauncherResult};

use super::{sanitize_id, Held, InstanceCoordinator, InstanceLock, LockOutcome};

const PID_SIZE: usize = std::mem::size_of::<u32>();
const PID_READ_ATTEMPTS: u32 = 10;
const PID_READ_DELAY: std::time::Duration = std::time::Duration::from_millis(20);

fn to_wide(s: &str) -> Vec<u16> {
    let mut wide: Vec<u16> = s.encode_utf16().collect();
    wide.push(0);
    wide
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NamedObjectCoordinator;

impl NamedObjectCoordinator {
    pub fn mutex_name(app_id: &str) -> String {
        format!("Local\\{}.mutex", sanitize_id(app_id))
    }

    pub fn mapping_name(app_id: &str) -> String {
        format!("Local\\{}.pid", sanitize_id(app_id))
    }
}

impl InstanceCoordinator for NamedObjectCoordinator {
    fn acquire(&self, app_id: &str) -> LauncherResult<LockOutcome> {
        let lock_failed = |message: String| LauncherError::LockFailed {
            app_id: app_id.to_string(),
            message,
        };

        let mutex_name = to_wide(&Self::mutex_name(app_id));
        let mutex = unsafe { CreateMutexW(None, true, PCWSTR(mutex_name.as_ptr())) }
            .map_err(|e| lock_failed(format!("CreateMutexW failed: {}", e.message())))?;
        let already_exists = unsafe { GetLastError() } == ERROR_ALREADY_EXISTS;

        let mapping_name = to_wide(&Self::mapping_name(app_id));

        if already_exists {
            unsafe {
                let _ = CloseHandle(mutex);
            }
            let pid = wait_for_pid(&mapping_name)
                .ok_or_else(|| lock_failed("running instance did not publish its PID".into()))?;
            info!("Application already running as PID {}", pid);
            return Ok(LockOutcome::HeldBy(pid));
        }

        let mapping = match unsafe {
            CreateFileMappingW(
                INVALID_HANDLE_VALUE,
                None,
                PAGE_READWRITE,
                0,
                PID_SIZE as u32,
                PCWSTR(mapping_name.as_ptr()),
            )
        } {
            Ok(mapping) => mapping,
            Err(e) => {
                unsafe {
                    let _ = CloseHandle(mutex);
                }
                return Err(lock_failed(format!("CreateFileMappingW failed: {}", e.message())));
            }
        };

        let view = unsafe { MapViewOfFile(mapping, FILE_MAP_ALL_ACCESS, 0, 0, PID_SIZE) };
        let guard = NamedObjectGuard {
            mutex,
            mapping,
            view,
        };
        if view.Value.is_null() {
            return Err(lock_failed("MapViewOfFile failed".into()));
        }
        unsafe {
            std::ptr::write_unaligned(view.Value as *mut u32, std::process::id());
        }

        info!("Acquired single instance mutex for {}", app_id);
        Ok(LockOutcome::Acquired(InstanceLock {
            _held: Held::Named(guard),
        }))
    }
}

fn read_pid(mapping_name: &[u16]) -> Option<u32> {
    let mapping =
        unsafe { OpenFileMappingW(FILE_MAP_READ.0, false, PCWSTR(mapping_name.as_ptr())) }.ok()?;
    let view = unsafe { MapViewOfFile(mapping, FILE_MAP_READ, 0, 0, PID_SIZE) };
    let pid = if view.Value.is_null() {
        None
    } else {
        let pid = unsafe { std::ptr::read_unaligned(view.Value as *const u32) };
        unsafe {
            let _ = UnmapViewOfFile(view);
        }
        Some(pid).filter(|pid| *pid != 0)
    };
    unsafe {
        let _ = CloseHandle(mapping);
    }
    pid
}

fn wait_for_pid(mapping_name: &[u16]) -> Option<u32> {
    for attempt in 1..=PID_READ_ATTEMPTS {
        if let Some(pid) = read_pid(mapping_name) {
            return Some(pid);
        }
        debug!("Instance PID not published yet (attempt {})", attempt);
        std::thread::sleep(PID_READ_DELAY);
    }
    None
}

pub(crate) struct NamedObjectGuard {
    mutex: HANDLE,
    mapping: HANDLE,
    view: MEMORY_MAPPED_VIEW_ADDRESS,
}

impl Drop for NamedObjectGuard {
    fn drop(&mut self) {
        unsafe {
            if !self.view.Value.is_null() {
                let _ = UnmapViewOfFile(self.view);
            }
            let _ = CloseHandle(self.mapping);
            let _ = CloseHandle(self.mutex);
        }
    }
}
