// ─── Bootstrapper ───
// Startup sequence: config, single instance, AppCDS, user arguments,
// option list, runtime hand-off.

pub mod cli;
pub mod config;
pub mod environment;
pub mod paths;
pub mod report;
pub mod resolver;

use std::path::Path;

use tracing::{debug, info, warn};

use crate::core::appcds::{AppCdsCoordinator, CacheGenerator, CacheOutcome};
use crate::core::config::{ConfigDocument, IniDocument};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::{build_activation_options, build_launch_options, RuntimeLoader};
use crate::core::macros::MacroTable;
use crate::core::single_instance::{InstanceCoordinator, LockOutcome};
use crate::core::user_args::{JvmUserArgs, LegacyPreferences};

pub use cli::LauncherFlags;
pub use config::{BootConfig, MemoryPolicy, RuntimeSelection};
pub use environment::BootEnvironment;
pub use report::report_fatal;

/// Collaborators with side effects outside this process.
pub struct BootServices<'a> {
    pub runtime_loader: &'a dyn RuntimeLoader,
    pub cache_generator: &'a dyn CacheGenerator,
    pub legacy_preferences: &'a dyn LegacyPreferences,
    pub instance_coordinator: &'a dyn InstanceCoordinator,
}

pub struct Bootstrapper {
    env: BootEnvironment,
    flags: LauncherFlags,
}

impl Bootstrapper {
    pub fn new(env: BootEnvironment) -> Self {
        let flags = LauncherFlags::parse(env.args.iter().cloned());
        Self { env, flags }
    }

    /// Run the launch to completion and return the runtime's exit code.
    pub fn run(&self, services: &BootServices<'_>) -> LauncherResult<i32> {
        let config_path = self.env.layout.config_file();
        let mut config = self.resolve(&config_path)?;
        info!("Launching {} {} ({})", config.app_name, config.version, config.app_id);
        let mut macros = config.macro_table();

        let _instance_lock = if config.single_instance && !self.flags.child {
            match services.instance_coordinator.acquire(&config.app_id)? {
                LockOutcome::Acquired(lock) => Some(lock),
                LockOutcome::HeldBy(pid) => {
                    return self.notify_running_instance(config, &macros, pid, services);
                }
            }
        } else {
            None
        };

        let mut appcds = AppCdsCoordinator::initialize(
            &self.flags,
            config.appcds_mode.as_deref(),
            config.appcds_cache_file(&macros),
        );
        appcds.prepare_generation()?;
        if appcds.ensure_cache(services.cache_generator) == CacheOutcome::FellBack {
            info!("Re-resolving boot config without AppCDS");
            config = self.resolve(&config_path)?;
            macros = config.macro_table();
        }

        let mut user_args = JvmUserArgs::load(&config, services.legacy_preferences);
        let options = build_launch_options(
            &config,
            user_args.merged(),
            appcds.state(),
            self.flags.debug,
        );
        appcds.validate()?;

        let rendered = options.render(&macros);
        let host = services.runtime_loader.load(&config.runtime)?;
        let plan = config.into_launch_plan(rendered);

        if self.flags.debug {
            info!("Launch command: {}", plan.command_line());
        } else {
            debug!("Launch command: {}", plan.command_line());
        }

        if let Err(e) = std::env::set_current_dir(&plan.working_dir) {
            warn!("Could not enter app directory {:?}: {}", plan.working_dir, e);
        }

        let code = host.launch(&plan.program, &plan.options)?;
        info!("Runtime exited with code {}", code);
        Ok(code)
    }

    fn resolve(&self, config_path: &Path) -> LauncherResult<BootConfig> {
        let (doc, found) = load_config(config_path);
        resolver::resolve(&doc, &self.env, &self.flags, config_path).map_err(|e| match e {
            LauncherError::MissingEntryPoint(_) if !found => {
                LauncherError::ConfigNotFound(config_path.to_path_buf())
            }
            other => other,
        })
    }

    /// Hand this launch's arguments to the running instance, then stop.
    fn notify_running_instance(
        &self,
        config: BootConfig,
        macros: &MacroTable,
        pid: u32,
        services: &BootServices<'_>,
    ) -> LauncherResult<i32> {
        info!("Forwarding arguments to running instance {}", pid);
        let options = build_activation_options(&config, pid).render(macros);
        let host = services.runtime_loader.load(&config.runtime)?;
        let plan = config.into_launch_plan(options);
        debug!("Activation command: {}", plan.command_line());

        let code = host.launch(&plan.program, &plan.options)?;
        if code != 0 {
            warn!("Activation exited with code {}", code);
        }
        if !services.instance_coordinator.reactivate(pid) {
            debug!("Running instance {} was not brought to front", pid);
        }
        Ok(0)
    }
}

/// Canonical sectioned view of the package config, empty when unreadable.
fn load_config(path: &Path) -> (IniDocument, bool) {
    match ConfigDocument::load(path) {
        Some(doc) => {
            if matches!(doc, ConfigDocument::Flat(_)) {
                info!("Migrating legacy config format {:?}", path);
            }
            (doc.into_sectioned(), true)
        }
        None => {
            warn!("Config file {:?} not found", path);
            (IniDocument::new(), false)
        }
    }
}
