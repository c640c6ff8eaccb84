// ─── AppCDS ───
// Class data sharing cache: mode selection, generation in a child launcher
// process and the pre-launch check.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::core::boot::cli::{LauncherFlags, CHILD_FLAG, GENERATE_CACHE_FLAG};
use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCdsState {
    Uninitialized,
    Disabled,
    Enabled,
    Auto,
    GenerateCache,
}

impl fmt::Display for AppCdsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppCdsState::Uninitialized => "uninitialized",
            AppCdsState::Disabled => "disabled",
            AppCdsState::Enabled => "enabled",
            AppCdsState::Auto => "auto",
            AppCdsState::GenerateCache => "generatecache",
        };
        f.write_str(name)
    }
}

/// Result of [`AppCdsCoordinator::ensure_cache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// The cache file exists.
    Ready,
    /// Generation did not produce a cache; the launch continues without it.
    FellBack,
    /// Not in `Auto` mode, or running as a child.
    NotApplicable,
}

/// Produces the cache file out of process.
pub trait CacheGenerator {
    fn generate(&self, cache_file: &Path) -> LauncherResult<()>;
}

/// Re-runs the launcher executable in cache generation mode and waits.
#[derive(Debug, Clone)]
pub struct ChildProcessGenerator {
    executable: PathBuf,
}

impl ChildProcessGenerator {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

impl CacheGenerator for ChildProcessGenerator {
    fn generate(&self, cache_file: &Path) -> LauncherResult<()> {
        info!("Generating AppCDS cache {:?}", cache_file);
        let status = Command::new(&self.executable)
            .args([GENERATE_CACHE_FLAG, CHILD_FLAG])
            .status()
            .map_err(|source| LauncherError::io(&self.executable, source))?;

        if !status.success() {
            warn!("AppCDS cache generation exited with {}", status);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppCdsCoordinator {
    configured: AppCdsState,
    effective: AppCdsState,
    cache_file: Option<PathBuf>,
    is_child: bool,
}

impl Default for AppCdsCoordinator {
    fn default() -> Self {
        Self {
            configured: AppCdsState::Uninitialized,
            effective: AppCdsState::Uninitialized,
            cache_file: None,
            is_child: false,
        }
    }
}

impl AppCdsCoordinator {
    /// Pick the startup state. Command-line flags win over `app.appcds`;
    /// without a cache file nothing but `Disabled` makes sense.
    pub fn initialize(
        flags: &LauncherFlags,
        mode: Option<&str>,
        cache_file: Option<PathBuf>,
    ) -> Self {
        let state = match (&cache_file, mode) {
            (None, _) => {
                if flags.generate_cache {
                    warn!("{} given but no AppCDS cache is configured", GENERATE_CACHE_FLAG);
                }
                AppCdsState::Disabled
            }
            _ if flags.generate_cache => AppCdsState::GenerateCache,
            _ if flags.appcds_off => AppCdsState::Disabled,
            (Some(_), mode) => parse_mode(mode),
        };

        debug!("AppCDS state: {} (cache {:?})", state, cache_file);
        Self {
            configured: state,
            effective: state,
            cache_file,
            is_child: flags.child,
        }
    }

    /// State the launch proceeds with, after any fallback.
    pub fn state(&self) -> AppCdsState {
        self.effective
    }

    /// State selected at startup.
    pub fn configured_state(&self) -> AppCdsState {
        self.configured
    }

    pub fn cache_file(&self) -> Option<&Path> {
        self.cache_file.as_deref()
    }

    fn cache_exists(&self) -> bool {
        self.cache_file.as_deref().is_some_and(Path::is_file)
    }

    /// Make room for a fresh cache: create its directory, drop a stale file.
    pub fn prepare_generation(&self) -> LauncherResult<()> {
        if self.effective != AppCdsState::GenerateCache {
            return Ok(());
        }
        let Some(cache_file) = self.cache_file.as_deref() else {
            return Ok(());
        };

        if let Some(dir) = cache_file.parent() {
            std::fs::create_dir_all(dir).map_err(|source| LauncherError::io(dir, source))?;
        }
        if cache_file.exists() {
            debug!("Removing stale AppCDS cache {:?}", cache_file);
            std::fs::remove_file(cache_file)
                .map_err(|source| LauncherError::io(cache_file, source))?;
        }
        Ok(())
    }

    /// In `Auto` mode make sure the cache exists, generating it once.
    /// A failed generation switches the runtime view to `Disabled`.
    pub fn ensure_cache(&mut self, generator: &dyn CacheGenerator) -> CacheOutcome {
        if self.effective != AppCdsState::Auto || self.is_child {
            return CacheOutcome::NotApplicable;
        }
        let Some(cache_file) = self.cache_file.clone() else {
            return CacheOutcome::NotApplicable;
        };
        if self.cache_exists() {
            return CacheOutcome::Ready;
        }

        if let Err(e) = generator.generate(&cache_file) {
            warn!("AppCDS cache generation failed: {}", e);
        }

        if self.cache_exists() {
            info!("AppCDS cache ready at {:?}", cache_file);
            CacheOutcome::Ready
        } else {
            warn!("AppCDS cache {:?} still missing, continuing without it", cache_file);
            self.effective = AppCdsState::Disabled;
            CacheOutcome::FellBack
        }
    }

    /// Last check before the runtime starts.
    pub fn validate(&self) -> LauncherResult<()> {
        match self.effective {
            AppCdsState::Enabled | AppCdsState::Auto => match self.cache_file.as_deref() {
                Some(path) if path.is_file() => Ok(()),
                Some(path) => Err(LauncherError::AppCdsCacheMissing {
                    path: path.to_path_buf(),
                }),
                None => Err(LauncherError::AppCdsCacheMissing {
                    path: PathBuf::new(),
                }),
            },
            AppCdsState::Disabled | AppCdsState::GenerateCache => Ok(()),
            AppCdsState::Uninitialized => Err(LauncherError::Internal(
                "AppCDS validation before initialization".into(),
            )),
        }
    }
}

fn parse_mode(mode: Option<&str>) -> AppCdsState {
    let Some(raw) = mode else {
        return AppCdsState::Auto;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "auto" => AppCdsState::Auto,
        "true" | "enabled" | "on" => AppCdsState::Enabled,
        "false" | "disabled" | "off" => AppCdsState::Disabled,
        other => {
            warn!("Unknown app.appcds value '{}', using auto", other);
            AppCdsState::Auto
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::boot::cli::APPCDS_OFF_FLAG;
    use std::cell::Cell;

    struct WritingGenerator {
        write: bool,
        calls: Cell<usize>,
    }

    impl CacheGenerator for WritingGenerator {
        fn generate(&self, cache_file: &Path) -> LauncherResult<()> {
            self.calls.set(self.calls.get() + 1);
            if self.write {
                std::fs::create_dir_all(cache_file.parent().unwrap()).unwrap();
                std::fs::write(cache_file, b"jsa").unwrap();
            }
            Ok(())
        }
    }

    fn flags(args: &[&str]) -> LauncherFlags {
        LauncherFlags::parse(args.iter().copied())
    }

    #[test]
    fn state_selection() {
        let cache = Some(PathBuf::from("/tmp/demo.jsa"));
        let state = |args: &[&str], mode: Option<&str>, cache: Option<PathBuf>| {
            AppCdsCoordinator::initialize(&flags(args), mode, cache).state()
        };

        assert_eq!(state(&[], None, cache.clone()), AppCdsState::Auto);
        assert_eq!(state(&[], Some("enabled"), cache.clone()), AppCdsState::Enabled);
        assert_eq!(state(&[], Some("off"), cache.clone()), AppCdsState::Disabled);
        assert_eq!(state(&[APPCDS_OFF_FLAG], Some("true"), cache.clone()), AppCdsState::Disabled);
        assert_eq!(
            state(&[GENERATE_CACHE_FLAG], Some("false"), cache.clone()),
            AppCdsState::GenerateCache
        );
        assert_eq!(state(&[GENERATE_CACHE_FLAG], None, None), AppCdsState::Disabled);
    }

    #[test]
    fn auto_falls_back_when_generation_produces_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache").join("demo.jsa");
        let mut appcds = AppCdsCoordinator::initialize(&flags(&[]), None, Some(cache));
        let generator = WritingGenerator {
            write: false,
            calls: Cell::new(0),
        };

        assert_eq!(appcds.ensure_cache(&generator), CacheOutcome::FellBack);
        assert_eq!(generator.calls.get(), 1);
        assert_eq!(appcds.state(), AppCdsState::Disabled);
        assert_eq!(appcds.configured_state(), AppCdsState::Auto);
        appcds.validate().unwrap();
    }

    #[test]
    fn auto_uses_generated_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache").join("demo.jsa");
        let mut appcds = AppCdsCoordinator::initialize(&flags(&[]), Some("auto"), Some(cache));
        let generator = WritingGenerator {
            write: true,
            calls: Cell::new(0),
        };

        assert_eq!(appcds.ensure_cache(&generator), CacheOutcome::Ready);
        assert_eq!(appcds.ensure_cache(&generator), CacheOutcome::Ready);
        assert_eq!(generator.calls.get(), 1);
        assert_eq!(appcds.state(), AppCdsState::Auto);
        appcds.validate().unwrap();
    }

    #[test]
    fn child_never_spawns_generation() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("demo.jsa");
        let mut appcds = AppCdsCoordinator::initialize(&flags(&[CHILD_FLAG]), None, Some(cache));
        let generator = WritingGenerator {
            write: true,
            calls: Cell::new(0),
        };

        assert_eq!(appcds.ensure_cache(&generator), CacheOutcome::NotApplicable);
        assert_eq!(generator.calls.get(), 0);
    }

    #[test]
    fn enabled_without_cache_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("missing.jsa");
        let appcds = AppCdsCoordinator::initialize(&flags(&[]), Some("true"), Some(cache.clone()));

        match appcds.validate() {
            Err(LauncherError::AppCdsCacheMissing { path }) => assert_eq!(path, cache),
            other => panic!("unexpected validation result: {:?}", other),
        }
        assert!(matches!(
            AppCdsCoordinator::default().validate(),
            Err(LauncherError::Internal(_))
        ));
    }

    #[test]
    fn generation_mode_clears_stale_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache").join("demo.jsa");
        std::fs::create_dir_all(cache.parent().unwrap()).unwrap();
        std::fs::write(&cache, b"old").unwrap();

        let generate = flags(&[GENERATE_CACHE_FLAG]);
        let appcds = AppCdsCoordinator::initialize(&generate, None, Some(cache.clone()));
        appcds.prepare_generation().unwrap();
        assert!(!cache.exists());
        assert!(cache.parent().unwrap().is_dir());
        appcds.validate().unwrap();
    }
}
