use std::path::PathBuf;

use crate::core::config::OrderedMap;
use crate::core::launch::LaunchPlan;
use crate::core::macros::{MacroTable, MacroToken};

use super::paths::safe_path_str;

/// Smallest initial heap handed to the JVM under the automatic policy.
pub const MIN_HEAP_FLOOR_MB: u64 = 256;

/// Heap sizing policy selected by `app.memory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryPolicy {
    /// Heap left to the JVM defaults or to explicit JVM options.
    Manual { size_mb: u64 },
    /// Maximum heap set to the host's physical memory.
    Auto { size_mb: u64 },
}

impl MemoryPolicy {
    /// `(max, min)` heap sizes in megabytes, only under `Auto`.
    pub fn heap_sizes(&self) -> Option<(u64, u64)> {
        match *self {
            MemoryPolicy::Auto { size_mb } => Some((size_mb, size_mb.min(MIN_HEAP_FLOOR_MB))),
            MemoryPolicy::Manual { .. } => None,
        }
    }
}

/// Which Java runtime the launcher will hand control to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSelection {
    /// Runtime shipped inside the package rather than found on the system.
    pub bundled: bool,
    pub home: Option<PathBuf>,
    /// Launcher support library (`libjli`) inside `home`.
    pub library: Option<PathBuf>,
}

/// Everything resolved from the package config at startup.
///
/// Built once by [`resolve`](super::resolver::resolve) and never mutated;
/// re-resolution produces a fresh value. Handing control to the runtime
/// consumes it through [`BootConfig::into_launch_plan`].
#[derive(Debug, Clone)]
pub struct BootConfig {
    pub config_file: PathBuf,
    pub launcher_path: PathBuf,
    pub package_dir: PathBuf,
    pub app_dir: PathBuf,
    pub launcher_dir: PathBuf,
    pub app_data_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub overrides_file: PathBuf,

    pub app_name: String,
    pub app_id: String,
    pub version: String,

    pub main_jar: String,
    pub main_class: String,
    pub main_module: String,
    pub classpath: String,
    pub module_path: String,

    /// `JVMOptions` lines in file order.
    pub jvm_args: OrderedMap<String>,
    /// `JVMUserOptions` defaults the user may override.
    pub user_arg_defaults: OrderedMap<String>,
    pub appcds_jvm_args: OrderedMap<String>,
    pub appcds_generate_jvm_args: OrderedMap<String>,
    /// Raw `app.appcds` value.
    pub appcds_mode: Option<String>,
    /// Cache file path, possibly containing macros.
    pub appcds_cache: Option<String>,

    pub memory: MemoryPolicy,
    pub runtime: RuntimeSelection,
    pub splash: Option<String>,
    pub single_instance: bool,
    pub activation_class: String,
    pub debug_port: Option<String>,

    /// Arguments forwarded to the application's main method.
    pub args: Vec<String>,
}

impl BootConfig {
    /// Build the macro table from the resolved directories.
    pub fn macro_table(&self) -> MacroTable {
        let mut macros = MacroTable::new();
        macros.register(MacroToken::PackageDir, safe_path_str(&self.package_dir));
        macros.register(MacroToken::AppDir, safe_path_str(&self.app_dir));
        macros.register(MacroToken::LauncherDir, safe_path_str(&self.launcher_dir));
        macros.register(MacroToken::AppDataDir, safe_path_str(&self.app_data_dir));
        macros.register(MacroToken::CacheDir, safe_path_str(&self.cache_dir));
        if let Some(home) = &self.runtime.home {
            macros.register(MacroToken::JreHome, safe_path_str(home));
        }
        if let Some(library) = &self.runtime.library {
            macros.register(MacroToken::JvmLibFile, safe_path_str(library));
        }
        macros
    }

    /// Expanded AppCDS cache file, if the package ships AppCDS support.
    pub fn appcds_cache_file(&self, macros: &MacroTable) -> Option<PathBuf> {
        self.appcds_cache
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| PathBuf::from(macros.expand(raw)))
    }

    pub fn has_main_module(&self) -> bool {
        !self.main_module.trim().is_empty()
    }

    /// Release the boot-only state, keeping what the runtime hand-off needs.
    pub fn into_launch_plan(self, options: Vec<String>) -> LaunchPlan {
        LaunchPlan {
            program: safe_path_str(&self.launcher_path),
            options,
            working_dir: self.app_dir,
            runtime: self.runtime,
        }
    }
}
