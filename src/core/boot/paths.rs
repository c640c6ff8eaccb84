// ─── Package Paths ───
// Where the launcher, the app payload, the bundled runtime and per-user data
// live for each platform.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

const CONFIG_EXTENSION: &str = "cfg";
const OVERRIDES_DIR: &str = "packager";
const OVERRIDES_FILE: &str = "jvmuserargs.cfg";
const CACHE_DIR: &str = "cache";

/// Directory layout of an installed package, derived from the launcher path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLayout {
    launcher_path: PathBuf,
    launcher_dir: PathBuf,
    package_dir: PathBuf,
    app_dir: PathBuf,
    runtime_dir: PathBuf,
}

impl PackageLayout {
    /// Layout for a launcher executable at `launcher_path`.
    ///
    /// - Linux/Windows: `<package>/<launcher>`, `<package>/app`, `<package>/runtime`
    /// - macOS: `Contents/MacOS/<launcher>`, `Contents/Java`, `Contents/PlugIns/Java.runtime`
    pub fn from_launcher(launcher_path: &Path) -> LauncherResult<Self> {
        let launcher_dir = launcher_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                LauncherError::Other(format!("Launcher path has no parent: {:?}", launcher_path))
            })?;

        let layout = if cfg!(target_os = "macos") {
            let package_dir = launcher_dir
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| launcher_dir.clone());
            Self {
                launcher_path: launcher_path.to_path_buf(),
                app_dir: package_dir.join("Java"),
                runtime_dir: package_dir.join("PlugIns").join("Java.runtime"),
                launcher_dir,
                package_dir,
            }
        } else {
            Self {
                launcher_path: launcher_path.to_path_buf(),
                app_dir: launcher_dir.join("app"),
                runtime_dir: launcher_dir.join("runtime"),
                package_dir: launcher_dir.clone(),
                launcher_dir,
            }
        };

        debug!("Package layout: {:?}", layout);
        Ok(layout)
    }

    pub fn launcher_path(&self) -> &Path {
        &self.launcher_path
    }

    pub fn launcher_dir(&self) -> &Path {
        &self.launcher_dir
    }

    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    pub fn runtime_dir(&self) -> &Path {
        &self.runtime_dir
    }

    /// Launcher file name without extension, e.g. `Demo` for `Demo.exe`.
    pub fn launcher_name(&self) -> String {
        self.launcher_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// `<app dir>/<launcher name>.cfg`
    pub fn config_file(&self) -> PathBuf {
        self.app_dir
            .join(format!("{}.{}", self.launcher_name(), CONFIG_EXTENSION))
    }
}

/// Root under which per-application user data directories are created.
pub fn default_user_data_dir() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::home_dir()
            .map(|home| home.join(".local"))
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        dirs::data_dir().unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Per-user data directory of one application.
pub fn app_data_dir(user_data_dir: &Path, app_id: &str) -> PathBuf {
    user_data_dir.join(app_id)
}

pub fn cache_dir(app_data_dir: &Path) -> PathBuf {
    app_data_dir.join(CACHE_DIR)
}

/// Location of the per-user JVM argument overrides.
pub fn overrides_file(app_data_dir: &Path) -> PathBuf {
    app_data_dir.join(OVERRIDES_DIR).join(OVERRIDES_FILE)
}

/// Platform-specific Java classpath separator.
pub fn classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

/// Rewrite a path list to use the platform separator. Both `;` and `:` are
/// accepted; `:` is left alone on Windows where it belongs to drive letters.
pub fn normalize_path_list(raw: &str) -> String {
    raw.split(|ch: char| ch == ';' || (ch == ':' && !cfg!(target_os = "windows")))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect::<Vec<_>>()
        .join(classpath_separator())
}

/// Flip directory separators to the host convention.
pub fn fix_path_separators(raw: &str) -> String {
    if cfg!(target_os = "windows") {
        raw.replace('/', "\\")
    } else {
        raw.replace('\\', "/")
    }
}

/// Convert path to string, dropping the `\\?\` prefix on Windows since the
/// JVM does not understand extended-length paths in its options.
pub fn safe_path_str(path: &Path) -> String {
    let text = path.to_string_lossy().to_string();

    #[cfg(target_os = "windows")]
    {
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}

// ── Runtime discovery ───────────────────────────────

fn java_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

/// File name of the launcher support library exporting `JLI_Launch`.
pub fn jli_library_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "jli.dll"
    } else if cfg!(target_os = "macos") {
        "libjli.dylib"
    } else {
        "libjli.so"
    }
}

fn runtime_library_candidates(home: &Path) -> Vec<PathBuf> {
    let name = jli_library_name();
    let mac_home = home.join("Contents").join("Home");
    vec![
        home.join("bin").join(name),
        home.join("lib").join(name),
        home.join("lib").join("jli").join(name),
        home.join("lib").join(std::env::consts::ARCH).join("jli").join(name),
        mac_home.join("lib").join(name),
        mac_home.join("lib").join("jli").join(name),
        home.join("Contents").join("MacOS").join(name),
    ]
}

/// Find the launcher library inside a runtime home.
pub fn locate_runtime_library(home: &Path) -> Option<PathBuf> {
    if let Some(found) = runtime_library_candidates(home)
        .into_iter()
        .find(|candidate| candidate.is_file())
    {
        return Some(found);
    }
    find_file_recursive(home, jli_library_name())
}

/// Find the `java` executable inside a runtime home.
pub fn locate_java_binary(home: &Path) -> Option<PathBuf> {
    let primary = home.join("bin").join(java_exe());
    if primary.is_file() {
        return Some(primary);
    }

    let mac_layout = home
        .join("Contents")
        .join("Home")
        .join("bin")
        .join(java_exe());
    if mac_layout.is_file() {
        return Some(mac_layout);
    }

    find_file_recursive(home, java_exe())
}

fn find_file_recursive(root: &Path, file_name: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(root).ok()?;
    let mut subdirs = Vec::new();

    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_file() {
            if path.file_name().and_then(|n| n.to_str()) == Some(file_name) {
                return Some(path);
            }
        } else if file_type.is_dir() {
            subdirs.push(path);
        }
    }

    subdirs.sort();
    subdirs
        .iter()
        .find_map(|dir| find_file_recursive(dir, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_places_config_next_to_app_payload() {
        let launcher = if cfg!(target_os = "macos") {
            PathBuf::from("/Applications/Demo.app/Contents/MacOS/Demo")
        } else {
            PathBuf::from("/opt/demo/Demo")
        };
        let layout = PackageLayout::from_launcher(&launcher).unwrap();

        assert_eq!(layout.launcher_name(), "Demo");
        assert!(layout.config_file().ends_with("Demo.cfg"));
        assert_eq!(layout.config_file().parent(), Some(layout.app_dir()));
    }

    #[test]
    fn path_lists_use_platform_separator() {
        let sep = classpath_separator();
        assert_eq!(
            normalize_path_list("a.jar;b.jar; ;c.jar"),
            format!("a.jar{sep}b.jar{sep}c.jar")
        );
        if !cfg!(target_os = "windows") {
            assert_eq!(normalize_path_list("a.jar:b.jar"), "a.jar:b.jar");
        }
    }

    #[test]
    fn runtime_library_is_found_in_nested_layouts() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("runtime");
        let nested = home.join("lib").join("odd").join("place");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join(jli_library_name()), b"").unwrap();

        assert_eq!(
            locate_runtime_library(&home),
            Some(nested.join(jli_library_name()))
        );

        let direct = home.join("lib").join(jli_library_name());
        std::fs::write(&direct, b"").unwrap();
        assert_eq!(locate_runtime_library(&home), Some(direct));
    }

    #[test]
    fn java_binary_prefers_bin_directory() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        assert_eq!(locate_java_binary(dir.path()), None);

        std::fs::write(bin.join(java_exe()), b"").unwrap();
        assert_eq!(locate_java_binary(dir.path()), Some(bin.join(java_exe())));
    }
}
