use std::path::PathBuf;

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

use super::cli::lossy_args;
use super::paths::{default_user_data_dir, PackageLayout};

/// Facts about the host and the launcher process, gathered once at startup.
#[derive(Debug, Clone)]
pub struct BootEnvironment {
    pub layout: PackageLayout,
    /// Root for per-application user data (`~/.local`, `%APPDATA%`, ...).
    pub user_data_dir: PathBuf,
    /// Directory holding single-instance lock files.
    pub temp_dir: PathBuf,
    pub physical_memory_mb: u64,
    /// `JAVA_HOME`, used when no runtime is bundled or configured.
    pub java_home: Option<PathBuf>,
    /// Process arguments without `argv[0]`.
    pub args: Vec<String>,
}

impl BootEnvironment {
    pub fn detect() -> LauncherResult<Self> {
        let launcher_path = std::env::current_exe().map_err(|source| LauncherError::Io {
            path: PathBuf::from("<current executable>"),
            source,
        })?;
        let layout = PackageLayout::from_launcher(&launcher_path)?;

        let java_home = std::env::var_os("JAVA_HOME")
            .map(PathBuf::from)
            .filter(|path| !path.as_os_str().is_empty());

        let env = Self {
            layout,
            user_data_dir: default_user_data_dir(),
            temp_dir: std::env::temp_dir(),
            physical_memory_mb: physical_memory_mb(),
            java_home,
            args: lossy_args(std::env::args_os().skip(1)),
        };
        debug!(
            "Boot environment: user_data_dir={:?} memory={}MB java_home={:?}",
            env.user_data_dir, env.physical_memory_mb, env.java_home
        );
        Ok(env)
    }
}

/// Total physical memory of the host in megabytes.
pub fn physical_memory_mb() -> u64 {
    let mut system = sysinfo::System::new();
    system.refresh_memory();
    system.total_memory() / (1024 * 1024)
}
