use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the bootstrapper.
/// Every fallible module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Configuration ───────────────────────────────────
    #[error("Configuration file not found: {0:?}")]
    ConfigNotFound(PathBuf),

    #[error("No main class or main module configured in {0:?}")]
    MissingEntryPoint(PathBuf),

    // ── AppCDS ──────────────────────────────────────────
    #[error("AppCDS cache file not found: {path:?}")]
    AppCdsCacheMissing { path: PathBuf },

    // ── Runtime ─────────────────────────────────────────
    #[error("No Java runtime found (looked in {0:?})")]
    RuntimeNotFound(PathBuf),

    #[error("Failed to load Java runtime {path:?}: {message}")]
    RuntimeLoad { path: PathBuf, message: String },

    // ── Single instance ─────────────────────────────────
    #[error("Single instance lock failed for '{app_id}': {message}")]
    LockFailed { app_id: String, message: String },

    // ── Serialization ───────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    // ── Generic ─────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    /// Wrap an IO error with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code reported for a fatal error.
    pub fn exit_code(&self) -> i32 {
        match self {
            LauncherError::ConfigNotFound(_) | LauncherError::MissingEntryPoint(_) => 2,
            LauncherError::AppCdsCacheMissing { .. } => 3,
            LauncherError::RuntimeNotFound(_) | LauncherError::RuntimeLoad { .. } => 4,
            _ => 1,
        }
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
