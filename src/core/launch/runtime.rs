// ─── Runtime Hosts ───
// Hands the rendered option list to a Java runtime, either in process through
// the launcher library or by spawning the `java` executable.

use std::ffi::{c_char, c_int, CString};
use std::path::{Path, PathBuf};
use std::process::Command;

use libloading::{Library, Symbol};
use tracing::{debug, info, warn};

use crate::core::boot::config::RuntimeSelection;
use crate::core::boot::paths::locate_java_binary;
use crate::core::error::{LauncherError, LauncherResult};

const JLI_LAUNCH_SYMBOL: &[u8] = b"JLI_Launch\0";
const LAUNCHER_NAME: &str = "java";

/// `JLI_Launch` from the runtime's launcher library.
type JliLaunchFn = unsafe extern "C" fn(
    argc: c_int,
    argv: *mut *mut c_char,
    jargc: c_int,
    jargv: *const *const c_char,
    appclassc: c_int,
    appclassv: *const *const c_char,
    fullversion: *const c_char,
    dotversion: *const c_char,
    pname: *const c_char,
    lname: *const c_char,
    javaargs: u8,
    cpwildcard: u8,
    javaw: u8,
    ergo: c_int,
) -> c_int;

/// A loaded runtime able to run the application to completion.
pub trait RuntimeHost {
    /// Run with `options` and return the exit code. `program` is reported
    /// as `argv[0]`.
    fn launch(&self, program: &str, options: &[String]) -> LauncherResult<i32>;
}

pub trait RuntimeLoader {
    fn load(&self, runtime: &RuntimeSelection) -> LauncherResult<Box<dyn RuntimeHost>>;
}

// ── In-process ──────────────────────────────────────

pub struct JliRuntime {
    path: PathBuf,
    launch_fn: JliLaunchFn,
    // Keeps `launch_fn` valid.
    _library: Library,
}

impl JliRuntime {
    pub fn load(path: &Path) -> LauncherResult<Self> {
        let library = unsafe { Library::new(path) }.map_err(|e| LauncherError::RuntimeLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let launch_fn = {
            let symbol: Symbol<JliLaunchFn> =
                unsafe { library.get(JLI_LAUNCH_SYMBOL) }.map_err(|e| {
                    LauncherError::RuntimeLoad {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    }
                })?;
            *symbol
        };

        debug!("Loaded launcher library {:?}", path);
        Ok(Self {
            path: path.to_path_buf(),
            launch_fn,
            _library: library,
        })
    }
}

impl RuntimeHost for JliRuntime {
    fn launch(&self, program: &str, options: &[String]) -> LauncherResult<i32> {
        let to_c = |text: &str| {
            CString::new(text).map_err(|_| LauncherError::RuntimeLoad {
                path: self.path.clone(),
                message: format!("argument contains a NUL byte: {:?}", text),
            })
        };

        let mut owned = Vec::with_capacity(options.len() + 1);
        owned.push(to_c(program)?);
        for option in options {
            owned.push(to_c(option)?);
        }
        let mut argv: Vec<*mut c_char> = owned
            .iter()
            .map(|arg| arg.as_ptr() as *mut c_char)
            .collect();
        argv.push(std::ptr::null_mut());

        let empty = to_c("")?;
        let name = to_c(LAUNCHER_NAME)?;
        let argc = c_int::try_from(owned.len())
            .map_err(|_| LauncherError::Internal("too many launch options".into()))?;

        info!("Starting runtime in process via {:?}", self.path);
        let code = unsafe {
            (self.launch_fn)(
                argc,
                argv.as_mut_ptr(),
                0,
                std::ptr::null(),
                0,
                std::ptr::null(),
                empty.as_ptr(),
                empty.as_ptr(),
                name.as_ptr(),
                name.as_ptr(),
                0,
                1,
                u8::from(cfg!(target_os = "windows")),
                0,
            )
        };
        Ok(code)
    }
}

// ── Child process ───────────────────────────────────

/// Runs `bin/java` and waits for it.
#[derive(Debug, Clone)]
pub struct ProcessRuntime {
    java: PathBuf,
}

impl ProcessRuntime {
    pub fn new(java: impl Into<PathBuf>) -> Self {
        Self { java: java.into() }
    }
}

impl RuntimeHost for ProcessRuntime {
    fn launch(&self, _program: &str, options: &[String]) -> LauncherResult<i32> {
        info!("Starting runtime process {:?}", self.java);
        let status = Command::new(&self.java)
            .args(options)
            .status()
            .map_err(|source| LauncherError::io(&self.java, source))?;
        Ok(status.code().unwrap_or(1))
    }
}

// ── Selection ───────────────────────────────────────

/// Launcher library first, the `java` executable second.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRuntimeLoader;

impl RuntimeLoader for DefaultRuntimeLoader {
    fn load(&self, runtime: &RuntimeSelection) -> LauncherResult<Box<dyn RuntimeHost>> {
        let Some(home) = runtime.home.as_deref() else {
            return Err(LauncherError::RuntimeNotFound(PathBuf::new()));
        };

        let mut library_error = None;
        if let Some(library) = runtime.library.as_deref() {
            match JliRuntime::load(library) {
                Ok(host) => return Ok(Box::new(host)),
                Err(e) => {
                    warn!("{}", e);
                    library_error = Some(e);
                }
            }
        }

        if let Some(java) = locate_java_binary(home) {
            return Ok(Box::new(ProcessRuntime::new(java)));
        }

        Err(library_error.unwrap_or_else(|| LauncherError::RuntimeNotFound(home.to_path_buf())))
    }
}
